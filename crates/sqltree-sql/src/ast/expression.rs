//! Expression nodes
//!
//! [`Expression`] is the recursive value type for everything that can stand
//! in scalar position: literals, column references, compound (unary/binary)
//! forms, function and window calls, CASE, collections, intervals and
//! scalar subqueries. Non-trivial variants box their payload to keep the
//! enum small.

use crate::ast::data_type::DataType;
use crate::ast::select::{OrderBy, SelectBody, WindowSpec};
use crate::ast::Operator;
use crate::cst::Span;
use serde::{Deserialize, Serialize};

/// Any scalar-position SQL expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    /// A literal kept as its raw source text (numbers, strings, hex,
    /// charset-introduced literals, date literals, user variables).
    Const(ConstExpr),
    Bool(BoolValue),
    Null(NullExpr),
    /// The `DEFAULT` keyword standing in value position.
    Default(DefaultExpr),
    ColumnRef(ColumnReference),
    Compound(Box<CompoundExpression>),
    FunctionCall(Box<FunctionCall>),
    WindowFunction(Box<WindowFunction>),
    Case(Box<CaseWhen>),
    Collection(CollectionExpression),
    Interval(Box<IntervalExpression>),
    FullText(Box<FullTextSearch>),
    SubQuery(Box<SelectBody>),
    /// ODBC-style brace block `{ name expr }`.
    Brace(Box<BraceExpr>),
}

impl Expression {
    /// Literal expression from raw source text.
    pub fn literal(text: impl Into<String>) -> Self {
        Expression::Const(ConstExpr::new(text))
    }

    /// Bare (unqualified) column reference.
    pub fn column(name: impl Into<String>) -> Self {
        Expression::ColumnRef(ColumnReference::new(None, None, name))
    }

    /// Binary compound expression.
    pub fn binary(left: Expression, right: Expression, operator: Operator) -> Self {
        Expression::Compound(Box::new(CompoundExpression {
            left,
            right: Some(right),
            operator,
            span: Span::default(),
        }))
    }

    /// Unary compound expression (`right` stays empty).
    pub fn unary(operand: Expression, operator: Operator) -> Self {
        Expression::Compound(Box::new(CompoundExpression {
            left: operand,
            right: None,
            operator,
            span: Span::default(),
        }))
    }

    /// The source span of this node.
    pub fn span(&self) -> Span {
        match self {
            Expression::Const(e) => e.span,
            Expression::Bool(e) => e.span,
            Expression::Null(e) => e.span,
            Expression::Default(e) => e.span,
            Expression::ColumnRef(e) => e.span,
            Expression::Compound(e) => e.span,
            Expression::FunctionCall(e) => e.span,
            Expression::WindowFunction(e) => e.span,
            Expression::Case(e) => e.span,
            Expression::Collection(e) => e.span,
            Expression::Interval(e) => e.span,
            Expression::FullText(e) => e.span,
            Expression::SubQuery(e) => e.span,
            Expression::Brace(e) => e.span,
        }
    }
}

/// A literal, carried as raw source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstExpr {
    pub value: String,
    #[serde(default)]
    pub span: Span,
}

impl ConstExpr {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into(), span: Span::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoolValue {
    pub value: bool,
    #[serde(default)]
    pub span: Span,
}

impl BoolValue {
    pub fn new(value: bool) -> Self {
        Self { value, span: Span::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NullExpr {
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DefaultExpr {
    #[serde(default)]
    pub span: Span,
}

/// A possibly qualified column reference.
///
/// Invariant: `schema` is only populated when `relation` is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnReference {
    pub schema: Option<String>,
    pub relation: Option<String>,
    pub column: String,
    /// Trailing `@var` marker, when the grammar allows one.
    pub user_variable: Option<String>,
    #[serde(default)]
    pub span: Span,
}

impl ColumnReference {
    pub fn new(
        schema: Option<String>,
        relation: Option<String>,
        column: impl Into<String>,
    ) -> Self {
        debug_assert!(schema.is_none() || relation.is_some());
        Self {
            schema,
            relation,
            column: column.into(),
            user_variable: None,
            span: Span::default(),
        }
    }
}

/// A unary or binary operator application.
///
/// Invariant: binary operator productions always populate `right`;
/// `right == None` is exclusively the unary form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundExpression {
    pub left: Expression,
    pub right: Option<Expression>,
    pub operator: Operator,
    #[serde(default)]
    pub span: Span,
}

/// One positional argument of a function call, plus the typed options the
/// keyword forms attach to it (a CAST target type, a TRIM mode, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionParam {
    pub expr: Expression,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FunctionOption>,
}

impl FunctionParam {
    pub fn new(expr: Expression) -> Self {
        Self { expr, options: Vec::new() }
    }

    pub fn with_option(mut self, option: FunctionOption) -> Self {
        self.options.push(option);
        self
    }
}

/// Typed options carried by function calls and their parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionOption {
    Expr(Expression),
    DataType(DataType),
    OrderBy(OrderBy),
    JsonOn(JsonOnOption),
}

/// An ordinary (non-windowed) function call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub params: Vec<FunctionParam>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FunctionOption>,
    #[serde(default)]
    pub span: Span,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, params: Vec<FunctionParam>) -> Self {
        Self {
            name: name.into(),
            params,
            options: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn with_option(mut self, option: FunctionOption) -> Self {
        self.options.push(option);
        self
    }
}

/// A function call with an attached window specification, including the
/// ordered-set forms (`GROUP_CONCAT`, `LISTAGG`) which additionally carry
/// an ORDER BY and separator among their options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowFunction {
    pub name: String,
    pub params: Vec<FunctionParam>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FunctionOption>,
    pub window: WindowSpec,
    #[serde(default)]
    pub span: Span,
}

/// `CASE [value] WHEN ... THEN ... [ELSE ...] END`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseWhen {
    pub case_value: Option<Expression>,
    pub when_clauses: Vec<WhenClause>,
    pub case_default: Option<Expression>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhenClause {
    pub when: Expression,
    pub then: Expression,
    #[serde(default)]
    pub span: Span,
}

/// An ordered expression list (`(a, b, c)`, string literal lists, IN lists).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionExpression {
    pub items: Vec<Expression>,
    #[serde(default)]
    pub span: Span,
}

impl CollectionExpression {
    pub fn new(items: Vec<Expression>) -> Self {
        Self { items, span: Span::default() }
    }
}

/// `INTERVAL <value> <unit>`. The unit keyword is kept as literal text
/// because its evaluation is engine specific.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalExpression {
    pub value: Expression,
    pub unit: String,
    #[serde(default)]
    pub span: Span,
}

impl IntervalExpression {
    pub fn new(value: Expression, unit: impl Into<String>) -> Self {
        Self { value, unit: unit.into(), span: Span::default() }
    }
}

/// `MATCH (cols) AGAINST ('pattern' [mode])`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullTextSearch {
    pub columns: Vec<ColumnReference>,
    pub against: String,
    pub search_mode: Option<TextSearchMode>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextSearchMode {
    BooleanMode,
    NaturalLanguageMode,
}

/// JSON_VALUE `ON EMPTY` / `ON ERROR` responses.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JsonOnOption {
    pub on_empty: Option<Expression>,
    pub on_error: Option<Expression>,
    #[serde(default)]
    pub span: Span,
}

/// `{ name expr }` passthrough block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BraceExpr {
    pub name: String,
    pub inner: Expression,
    #[serde(default)]
    pub span: Span,
}
