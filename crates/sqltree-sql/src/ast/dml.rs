//! DML statement nodes: INSERT, UPDATE, DELETE.

use crate::ast::common::RelationFactor;
use crate::ast::expression::{ColumnReference, Expression};
use crate::ast::select::{FromReference, Limit, OrderBy, PartitionUsage, SelectBody};
use crate::cst::Span;
use serde::{Deserialize, Serialize};

/// `column = value` in SET lists and ON DUPLICATE KEY UPDATE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub column: ColumnReference,
    pub value: Expression,
    #[serde(default)]
    pub span: Span,
}

impl Assignment {
    pub fn new(column: ColumnReference, value: Expression) -> Self {
        Self { column, value, span: Span::default() }
    }
}

/// `INSERT` / `REPLACE`, in the VALUES, SET and query forms.
///
/// Exactly one of `rows`, `assignments` or `select` is populated; the
/// other two stay empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insert {
    pub table: RelationFactor,
    pub partition_usage: Option<PartitionUsage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnReference>,
    /// VALUES rows, outer list in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<Vec<Expression>>,
    /// `INSERT ... SET` assignments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignments: Vec<Assignment>,
    pub select: Option<SelectBody>,
    #[serde(default)]
    pub replace: bool,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_duplicate: Vec<Assignment>,
    #[serde(default)]
    pub span: Span,
}

impl Insert {
    pub fn new(table: RelationFactor) -> Self {
        Self {
            table,
            partition_usage: None,
            columns: Vec::new(),
            rows: Vec::new(),
            assignments: Vec::new(),
            select: None,
            replace: false,
            ignore: false,
            on_duplicate: Vec::new(),
            span: Span::default(),
        }
    }
}

/// Single- or multi-table `UPDATE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub tables: Vec<FromReference>,
    pub assignments: Vec<Assignment>,
    pub where_clause: Option<Expression>,
    /// Single-table form only.
    pub order_by: Option<OrderBy>,
    /// Single-table form only.
    pub limit: Option<Limit>,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub span: Span,
}

/// Single- or multi-table `DELETE`.
///
/// `targets` is empty in the single-table form; the multi-table forms
/// populate it with the relations whose rows are removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delete {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<RelationWithStar>,
    pub froms: Vec<FromReference>,
    pub where_clause: Option<Expression>,
    /// Single-table form only.
    pub order_by: Option<OrderBy>,
    /// Single-table form only.
    pub limit: Option<Limit>,
    #[serde(default)]
    pub span: Span,
}

/// A delete target, optionally written with a trailing `.*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationWithStar {
    pub factor: RelationFactor,
    #[serde(default)]
    pub star: bool,
    #[serde(default)]
    pub span: Span,
}

impl RelationWithStar {
    pub fn new(factor: RelationFactor, star: bool) -> Self {
        Self { factor, star, span: Span::default() }
    }
}
