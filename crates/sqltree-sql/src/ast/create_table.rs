//! CREATE TABLE nodes: column definitions, constraints, indexes and the
//! merged option bags.
//!
//! Repeatable attribute productions (column attributes, index options,
//! table options) merge left to right, so when an option is declared
//! twice the later occurrence wins.

use crate::ast::common::RelationFactor;
use crate::ast::data_type::DataType;
use crate::ast::expression::{ColumnReference, Expression};
use crate::ast::partition::Partition;
use crate::ast::select::{SelectBody, SortDirection};
use crate::cst::Span;
use serde::{Deserialize, Serialize};

/// `CREATE TABLE`, covering the element-list, `LIKE` and `AS SELECT` forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTable {
    pub table: RelationFactor,
    #[serde(default)]
    pub temporary: bool,
    #[serde(default)]
    pub if_not_exists: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<TableElement>,
    pub table_options: Option<TableOptions>,
    pub partition: Option<Partition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_groups: Vec<ColumnGroupElement>,
    pub as_select: Option<SelectBody>,
    /// `CREATE TABLE t LIKE other`.
    pub like_table: Option<RelationFactor>,
    #[serde(default)]
    pub span: Span,
}

impl CreateTable {
    pub fn new(table: RelationFactor) -> Self {
        Self {
            table,
            temporary: false,
            if_not_exists: false,
            elements: Vec::new(),
            table_options: None,
            partition: None,
            column_groups: Vec::new(),
            as_select: None,
            like_table: None,
            span: Span::default(),
        }
    }
}

/// One entry of the CREATE TABLE element list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableElement {
    Column(ColumnDefinition),
    Constraint(OutOfLineConstraint),
    Index(OutOfLineIndex),
}

/// A column definition, shared by CREATE TABLE and the ALTER TABLE
/// add/modify/change actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub column: ColumnReference,
    pub data_type: Option<DataType>,
    pub attributes: Option<ColumnAttributes>,
    /// `FIRST` / `BEFORE col` / `AFTER col`, ALTER TABLE forms only.
    pub location: Option<ColumnLocation>,
    #[serde(default)]
    pub span: Span,
}

impl ColumnDefinition {
    pub fn new(column: ColumnReference, data_type: Option<DataType>) -> Self {
        Self {
            column,
            data_type,
            attributes: None,
            location: None,
            span: Span::default(),
        }
    }
}

/// Merged bag of column attributes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnAttributes {
    /// `Some(false)` for NOT NULL, `Some(true)` for explicit NULL.
    pub nullable: Option<bool>,
    pub default_value: Option<Expression>,
    pub on_update: Option<Expression>,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub unique_key: bool,
    #[serde(default)]
    pub primary_key: bool,
    pub comment: Option<String>,
    pub collation: Option<String>,
    pub generate_option: Option<GenerateOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<InlineConstraint>,
    #[serde(default)]
    pub span: Span,
}

impl ColumnAttributes {
    /// Fold `later` onto `self`; scalar fields from `later` win when set,
    /// flags accumulate and constraint lists append in source order.
    pub fn merge(mut self, later: ColumnAttributes) -> ColumnAttributes {
        if later.nullable.is_some() {
            self.nullable = later.nullable;
        }
        if later.default_value.is_some() {
            self.default_value = later.default_value;
        }
        if later.on_update.is_some() {
            self.on_update = later.on_update;
        }
        self.auto_increment |= later.auto_increment;
        self.unique_key |= later.unique_key;
        self.primary_key |= later.primary_key;
        if later.comment.is_some() {
            self.comment = later.comment;
        }
        if later.collation.is_some() {
            self.collation = later.collation;
        }
        if later.generate_option.is_some() {
            self.generate_option = later.generate_option;
        }
        self.constraints.extend(later.constraints);
        self
    }
}

/// `GENERATED ALWAYS AS (expr) [VIRTUAL | STORED]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOption {
    pub expr: Expression,
    pub kind: Option<GenerateKind>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerateKind {
    Virtual,
    Stored,
}

/// Placement of a column in ALTER TABLE add/modify/change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnLocation {
    First,
    Before(String),
    After(String),
}

/// A constraint written inline with a column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineConstraint {
    pub name: Option<String>,
    pub kind: InlineConstraintKind,
    pub state: Option<ConstraintState>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InlineConstraintKind {
    Check(Expression),
    References(ForeignReference),
}

/// `[NOT] ENFORCED`; `None` on the constraint means neither was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintState {
    pub enforced: bool,
}

/// A table-level constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutOfLineConstraint {
    pub name: Option<String>,
    pub kind: OutOfLineConstraintKind,
    pub state: Option<ConstraintState>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfLineConstraintKind {
    PrimaryKey {
        columns: Vec<SortColumn>,
        index_options: Option<IndexOptions>,
    },
    Unique {
        index_name: Option<String>,
        columns: Vec<SortColumn>,
        index_options: Option<IndexOptions>,
    },
    ForeignKey {
        index_name: Option<String>,
        columns: Vec<SortColumn>,
        reference: ForeignReference,
    },
    Check(Expression),
}

/// A table-level secondary index element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutOfLineIndex {
    pub name: Option<String>,
    pub columns: Vec<SortColumn>,
    pub index_options: Option<IndexOptions>,
    #[serde(default)]
    pub fulltext: bool,
    #[serde(default)]
    pub spatial: bool,
    #[serde(default)]
    pub span: Span,
}

/// One key part: a plain column, a prefixed column or a functional key
/// expression, with an optional direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortColumn {
    pub column: Option<ColumnReference>,
    /// Functional key part; populated exactly when `column` is empty.
    pub expr: Option<Expression>,
    /// Prefix length, `col(10)`.
    pub length: Option<u32>,
    pub direction: Option<SortDirection>,
    #[serde(default)]
    pub span: Span,
}

impl SortColumn {
    pub fn column(column: ColumnReference) -> Self {
        Self {
            column: Some(column),
            expr: None,
            length: None,
            direction: None,
            span: Span::default(),
        }
    }

    pub fn expr(expr: Expression) -> Self {
        Self {
            column: None,
            expr: Some(expr),
            length: None,
            direction: None,
            span: Span::default(),
        }
    }
}

/// Merged bag of index options.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexOptions {
    /// `USING BTREE` / `USING HASH`.
    pub using: Option<String>,
    pub key_block_size: Option<u64>,
    pub comment: Option<String>,
    pub visible: Option<bool>,
    /// `Some(true)` for GLOBAL, `Some(false)` for LOCAL.
    pub global: Option<bool>,
    #[serde(default)]
    pub span: Span,
}

impl IndexOptions {
    /// Fold `later` onto `self`, later occurrences winning.
    pub fn merge(mut self, later: IndexOptions) -> IndexOptions {
        if later.using.is_some() {
            self.using = later.using;
        }
        if later.key_block_size.is_some() {
            self.key_block_size = later.key_block_size;
        }
        if later.comment.is_some() {
            self.comment = later.comment;
        }
        if later.visible.is_some() {
            self.visible = later.visible;
        }
        if later.global.is_some() {
            self.global = later.global;
        }
        self
    }
}

/// `MATCH` clause of a foreign key reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchOption {
    Simple,
    Full,
    Partial,
}

/// Referential action of `ON DELETE` / `ON UPDATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnOption {
    Restrict,
    Cascade,
    SetNull,
    NoAction,
    SetDefault,
}

/// `REFERENCES` target of a foreign key.
///
/// `on_delete` / `on_update` stay `None` when the clause was omitted,
/// which is distinct from an explicit `NO ACTION`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignReference {
    pub table: RelationFactor,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnReference>,
    pub match_option: Option<MatchOption>,
    pub on_delete: Option<OnOption>,
    pub on_update: Option<OnOption>,
    #[serde(default)]
    pub span: Span,
}

impl ForeignReference {
    pub fn new(table: RelationFactor, columns: Vec<ColumnReference>) -> Self {
        Self {
            table,
            columns,
            match_option: None,
            on_delete: None,
            on_update: None,
            span: Span::default(),
        }
    }
}

/// One element of a `WITH COLUMN GROUP (...)` clause.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnGroupElement {
    #[serde(default)]
    pub all_columns: bool,
    #[serde(default)]
    pub each_column: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
}

/// Merged bag of table options.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableOptions {
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
    pub auto_increment: Option<u64>,
    pub row_format: Option<String>,
    pub key_block_size: Option<u64>,
    pub compression: Option<String>,
    #[serde(default)]
    pub span: Span,
}

impl TableOptions {
    /// Fold `later` onto `self`, later occurrences winning.
    pub fn merge(mut self, later: TableOptions) -> TableOptions {
        if later.engine.is_some() {
            self.engine = later.engine;
        }
        if later.charset.is_some() {
            self.charset = later.charset;
        }
        if later.collation.is_some() {
            self.collation = later.collation;
        }
        if later.comment.is_some() {
            self.comment = later.comment;
        }
        if later.auto_increment.is_some() {
            self.auto_increment = later.auto_increment;
        }
        if later.row_format.is_some() {
            self.row_format = later.row_format;
        }
        if later.key_block_size.is_some() {
            self.key_block_size = later.key_block_size;
        }
        if later.compression.is_some() {
            self.compression = later.compression;
        }
        self
    }
}
