//! Query block nodes
//!
//! [`SelectBody`] models one query block; set operations chain blocks
//! through [`RelatedSelectBody`] so `A UNION B UNION C` reads left to
//! right along the `related` links. Trailing ORDER BY / LIMIT of a set
//! operation belong to the last block in the chain.

use crate::ast::common::RelationFactor;
use crate::ast::expression::{ColumnReference, Expression};
use crate::cst::Span;
use serde::{Deserialize, Serialize};

/// One query block, possibly heading a set-operation chain.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectBody {
    /// Common table expressions, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub with: Vec<WithTable>,
    #[serde(default)]
    pub recursive: bool,
    /// Raw query option keywords (`DISTINCT`, `SQL_CALC_FOUND_ROWS`, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_options: Vec<String>,
    pub projections: Vec<Projection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub froms: Vec<FromReference>,
    pub where_clause: Option<Expression>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<Expression>,
    #[serde(default)]
    pub with_rollup: bool,
    pub having: Option<Expression>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub windows: Vec<NamedWindow>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<Limit>,
    /// Rows of a `VALUES` table clause; a block is either projection-based
    /// or values-based, never both.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Vec<Expression>>,
    /// Next block of a set-operation chain, when present.
    pub related: Option<Box<RelatedSelectBody>>,
    #[serde(default)]
    pub span: Span,
}

impl SelectBody {
    pub fn new(projections: Vec<Projection>) -> Self {
        Self { projections, ..Self::default() }
    }

    /// The last block of the set-operation chain rooted here. Trailing
    /// ORDER BY and LIMIT clauses attach to this block.
    pub fn last_body_mut(&mut self) -> &mut SelectBody {
        let mut body = self;
        while body.related.is_some() {
            // Two-phase borrow keeps the borrow checker satisfied.
            body = match body.related {
                Some(ref mut related) => &mut related.select,
                None => unreachable!(),
            };
        }
        body
    }

    /// Append a further block to the end of the set-operation chain.
    pub fn attach_related(&mut self, relation: RelationType, select: SelectBody) {
        let last = self.last_body_mut();
        last.related = Some(Box::new(RelatedSelectBody {
            relation,
            select,
            span: Span::default(),
        }));
    }
}

/// One link of a set-operation chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedSelectBody {
    pub relation: RelationType,
    pub select: SelectBody,
    #[serde(default)]
    pub span: Span,
}

/// Set operation joining two query blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    Union,
    UnionAll,
    Except,
    ExceptAll,
    Intersect,
    IntersectAll,
    Minus,
}

/// One common table expression of a WITH clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithTable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    pub select: SelectBody,
    #[serde(default)]
    pub span: Span,
}

/// One projected item of the select list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Empty exactly for the bare `*` projection.
    pub expr: Option<Expression>,
    pub label: Option<String>,
    #[serde(default)]
    pub star: bool,
    #[serde(default)]
    pub span: Span,
}

impl Projection {
    pub fn new(expr: Expression, label: Option<String>) -> Self {
        Self { expr: Some(expr), label, star: false, span: Span::default() }
    }

    /// The bare `*` projection.
    pub fn star() -> Self {
        Self { expr: None, label: None, star: true, span: Span::default() }
    }
}

/// One item of the FROM clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FromReference {
    Name(NameReference),
    Expression(ExpressionReference),
    Join(Box<JoinReference>),
    /// ODBC `{ OJ ... }` block.
    Brace(Box<BraceBlock>),
}

impl FromReference {
    pub fn span(&self) -> Span {
        match self {
            FromReference::Name(r) => r.span,
            FromReference::Expression(r) => r.span,
            FromReference::Join(r) => r.span,
            FromReference::Brace(r) => r.span,
        }
    }
}

/// A named relation in the FROM clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameReference {
    pub factor: RelationFactor,
    pub alias: Option<String>,
    pub partition_usage: Option<PartitionUsage>,
    pub flashback_usage: Option<FlashbackUsage>,
    #[serde(default)]
    pub span: Span,
}

impl NameReference {
    pub fn new(factor: RelationFactor) -> Self {
        Self {
            factor,
            alias: None,
            partition_usage: None,
            flashback_usage: None,
            span: Span::default(),
        }
    }
}

/// A derived table or table function in the FROM clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionReference {
    pub target: ExpressionReferenceTarget,
    pub alias: Option<String>,
    /// Column aliases of the derived table, when declared.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionReferenceTarget {
    Select(Box<SelectBody>),
    /// Table functions and other scalar sources.
    Expr(Box<Expression>),
}

/// `PARTITION (p0, p1, ...)` after a table name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionUsage {
    pub names: Vec<String>,
    #[serde(default)]
    pub span: Span,
}

/// `AS OF SNAPSHOT <expr>` after a table name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashbackUsage {
    pub value: Expression,
    #[serde(default)]
    pub span: Span,
}

/// A joined pair of FROM items. Chains of joins build left-deep, so the
/// earliest join in source order sits innermost on the `left` spine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinReference {
    pub left: FromReference,
    pub right: FromReference,
    pub join_type: JoinType,
    pub condition: Option<JoinCondition>,
    #[serde(default)]
    pub span: Span,
}

/// Join flavor, with OUTER and NATURAL folded in rather than flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinType {
    Inner,
    Cross,
    StraightJoin,
    FullOuter,
    LeftOuter,
    RightOuter,
    NaturalInner,
    NaturalFullOuter,
    NaturalLeftOuter,
    NaturalRightOuter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinCondition {
    On(Expression),
    Using(Vec<ColumnReference>),
}

/// ODBC escape block wrapping a FROM item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BraceBlock {
    pub name: String,
    pub inner: FromReference,
    #[serde(default)]
    pub span: Span,
}

/// `ORDER BY` clause; also reused by ordered-set aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub sort_keys: Vec<SortKey>,
    #[serde(default)]
    pub span: Span,
}

impl OrderBy {
    pub fn new(sort_keys: Vec<SortKey>) -> Self {
        Self { sort_keys, span: Span::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub expr: Expression,
    /// `None` when the direction keyword was omitted.
    pub direction: Option<SortDirection>,
    #[serde(default)]
    pub span: Span,
}

impl SortKey {
    pub fn new(expr: Expression, direction: Option<SortDirection>) -> Self {
        Self { expr, direction, span: Span::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// `LIMIT <count> [OFFSET <offset>]`, either operand expression-valued.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Limit {
    pub limit: Option<Expression>,
    pub offset: Option<Expression>,
    #[serde(default)]
    pub span: Span,
}

/// One entry of a `WINDOW` clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedWindow {
    pub name: String,
    pub spec: WindowSpec,
    #[serde(default)]
    pub span: Span,
}

/// An inline or named window specification.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowSpec {
    /// Base window name, when this spec refines a named window.
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partition_by: Vec<Expression>,
    pub order_by: Option<OrderBy>,
    pub frame: Option<WindowFrame>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowFrame {
    pub unit: WindowFrameUnit,
    pub start: WindowBound,
    /// `None` for the single-bound frame form.
    pub end: Option<WindowBound>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindowFrameUnit {
    Rows,
    Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowBound {
    CurrentRow,
    UnboundedPreceding,
    UnboundedFollowing,
    Preceding(Expression),
    Following(Expression),
}
