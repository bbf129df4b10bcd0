//! Concrete syntax tree input contract
//!
//! The grammar/lexer front-end that feeds this crate is an external
//! collaborator; what it hands over is a rule-tagged [`CstNode`] per matched
//! production, holding its child productions and terminal [`Token`]s in
//! source order. Builders never parse text here; they only inspect which
//! optional children are present, in which positions, and with what literal
//! text.
//!
//! The same type doubles as the fixture builder for the test suite: the
//! `with_node`/`with_token` methods assemble exactly the shapes the grammar
//! contract describes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A region of the original SQL source, carried for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    /// Starting byte offset
    pub start: usize,
    /// Ending byte offset (exclusive)
    pub end: usize,
    /// Line number (1-based, 0 when unknown)
    pub line: usize,
    /// Column number (1-based, 0 when unknown)
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self { start, end, line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(f, "line {}, column {}", self.line, self.column)
        } else {
            write!(f, "bytes {}..{}", self.start, self.end)
        }
    }
}

/// Terminal token kinds the builders discriminate on.
///
/// Only tokens whose *presence* steers disambiguation need a dedicated kind;
/// free-form terminals (names, literals) carry their kind plus the raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    // Free-form terminals
    Identifier,
    StringValue,
    IntNum,
    DecimalNum,
    BoolValue,
    UserVariable,
    ReservedKeyword,

    // Punctuation and operator symbols
    Plus,
    Dash,
    Star,
    Slash,
    Percent,
    Caret,
    Tilde,
    Ampersand,
    Pipe,
    Bang,
    Dot,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    CompEq,
    CompNe,
    CompGe,
    CompGt,
    CompLe,
    CompLt,
    CompNseq,
    Cnnop,
    AndOp,
    ShiftLeft,
    ShiftRight,
    JsonExtract,
    JsonExtractUnquoted,

    // Logical / predicate keywords
    And,
    Or,
    Xor,
    Not,
    Is,
    In,
    Between,
    Like,
    Regexp,
    Member,
    Of,
    Escape,
    Exists,
    Null,
    Unknown,

    // Expression keywords
    Binary,
    Row,
    Case,
    When,
    Then,
    Else,
    End,
    Cast,
    Convert,
    Using,
    Position,
    Trim,
    Leading,
    Trailing,
    Both,
    GetFormat,
    DateAdd,
    DateSub,
    AddDate,
    SubDate,
    TimestampAdd,
    TimestampDiff,
    Extract,
    GroupConcat,
    Listagg,
    Separator,
    WeightString,
    Character,
    JsonValue,
    Truncate,
    Ascii,
    Error,
    Interval,
    Check,
    Now,
    Sysdate,
    Curdate,
    CurrentDate,
    Curtime,
    CurrentTime,
    CurrentTimestamp,
    UtcTimestamp,
    UtcTime,
    UtcDate,
    Match,
    Against,
    Boolean,
    Natural,
    Language,
    Mode,
    Default,
    Distinct,
    All,
    Unique,

    // Query keywords
    Select,
    From,
    Where,
    Having,
    Group,
    By,
    Rollup,
    Order,
    Asc,
    Desc,
    Limit,
    Offset,
    Union,
    Intersect,
    MinusSet,
    Except,
    With,
    Recursive,
    As,
    Dual,
    Window,
    Partition,
    Rows,
    Range,
    Preceding,
    Following,
    Current,
    Unbounded,
    Nulls,
    First,
    Last,
    Respect,
    Ignore,
    NthValue,

    // Join keywords
    Join,
    Inner,
    Cross,
    StraightJoin,
    Left,
    Right,
    Full,
    Outer,
    Lateral,
    On,
    Oj,
    Snapshot,

    // DML keywords
    Insert,
    Replace,
    Into,
    Values,
    Value,
    Set,
    Duplicate,
    Key,
    Update,
    Delete,

    // DDL keywords
    Create,
    Table,
    Temporary,
    If,
    Drop,
    Rename,
    To,
    Alter,
    Add,
    Modify,
    Change,
    Column,
    Before,
    After,
    Primary,
    Foreign,
    References,
    Constraint,
    Index,
    Fulltext,
    Spatial,
    Generated,
    Always,
    Virtual,
    Stored,
    AutoIncrement,
    Comment,
    Collate,
    Charset,
    Srid,
    Id,
    SkipIndex,
    Enforced,
    Cascade,
    Restrict,
    Action,
    No,
    Simple,
    Partial,
    Columns,
    Each,

    // Index / table options
    Global,
    Local,
    Visible,
    Invisible,
    Btree,
    Hash,
    KeyBlockSize,
    Parallel,
    Noparallel,
    Engine,
    RowFormat,
    Compression,
    BlockSize,
    Tablespace,
    Read,
    Only,
    Write,

    // Partitioning
    Partitions,
    Subpartition,
    Subpartitions,
    List,
    Less,
    Than,
    Maxvalue,
    Template,

    // Materialized views
    Materialized,
    View,
    Refresh,
    Complete,
    Fast,
    Force,
    Never,
    Demand,
    Commit,
    Start,
    Next,
    Enable,
    Disable,
    Query,
    Rewrite,
    Computation,
}

/// One terminal from the token stream, as matched into the CST.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self { kind, text: text.into(), span }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind, self.text)
    }
}

/// Grammar productions this layer consumes. One CST node corresponds to one
/// matched production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    // Expressions
    Expr,
    BoolPri,
    Predicate,
    BitExpr,
    SimpleExpr,
    ExprConst,
    Literal,
    NumberLiteral,
    ComplexStringLiteral,
    StringValList,
    InExpr,
    ExprList,
    CaseExpr,
    WhenClauseList,
    WhenClause,
    CaseDefault,
    SimpleFuncExpr,
    ComplexFuncExpr,
    WindowFunctionExpr,
    DateParams,
    TimestampParams,
    DateUnit,
    SubstrParams,
    ParameterizedTrim,
    GetFormatUnit,
    WsNweights,
    JsonValueExpr,
    JsonOnResponse,
    OnEmpty,
    OnError,
    SignedLiteral,
    NowOrSignedLiteral,
    CurTimestampFunc,
    SysdateFunc,
    CurTimeFunc,
    CurDateFunc,
    UtcTimestampFunc,
    UtcTimeFunc,
    UtcDateFunc,
    SysIntervalFunc,

    // Identifiers and names
    ColumnRef,
    ColumnDefinitionRef,
    RelationName,
    FunctionName,
    ColumnName,
    ColumnLabel,
    RelationFactor,
    NormalRelationFactor,
    DotRelationFactor,
    MysqlReservedKeyword,
    CharsetName,
    Collation,
    CollationName,
    ConstraintName,
    IndexName,
    NameList,

    // Data types
    DataType,
    CastDataType,
    CharacterTypeI,
    TextTypeI,
    BinaryTypeI,
    BlobTypeI,
    BitTypeI,
    BoolTypeI,
    IntTypeI,
    FloatTypeI,
    NumberTypeI,
    DatetimeTypeI,
    DateYearTypeI,
    JsonTypeI,
    CollectionTypeI,
    StringLengthI,
    PrecisionIntNum,
    DataTypePrecision,
    StringList,
    TextString,

    // From references
    TableReference,
    TableFactor,
    TblName,
    JoinedTable,
    TableSubquery,
    TableSubqueryAlias,
    AliasNameList,
    ColumnAliasName,
    InnerJoinType,
    OuterJoinType,
    NaturalJoinType,
    JoinCondition,
    UsePartition,
    UseFlashback,
    ColumnList,

    // Select
    SelectNoParens,
    SelectWithParens,
    SelectClause,
    SimpleSelect,
    NoTableSelect,
    SelectClauseSet,
    SelectClauseSetLeft,
    SelectClauseSetRight,
    SelectClauseSetWithOrderAndLimit,
    SimpleSelectWithOrderAndLimit,
    NoTableSelectWithOrderAndLimit,
    SelectWithParensWithOrderAndLimit,
    SetType,
    SetTypeOther,
    SetExpressionOption,
    WithClause,
    WithList,
    CommonTableExpr,
    SelectExprList,
    Projection,
    FromList,
    TableReferences,
    GroupbyClause,
    SortListForGroupBy,
    SortKeyForGroupBy,
    OrderBy,
    SortList,
    SortKey,
    LimitClause,
    LimitExpr,
    QueryExpressionOptionList,
    QueryExpressionOption,
    NamedWindows,
    NamedWindow,
    GeneralizedWindowClause,
    WinPartition,
    WinOrder,
    WinWindow,
    WinInterval,
    WinBounding,
    WinFunFirstLastParams,
    RespectOrIgnore,
    FirstOrLast,
    TableValuesClause,
    TableValuesClauseWithOrderByAndLimit,
    ValuesRowList,
    RowValue,
    InsertVals,
    ExprOrDefault,

    // DML statements
    InsertStmt,
    SingleTableInsert,
    InsertTableClause,
    ValuesClause,
    UpdateStmt,
    UpdateAsgnList,
    UpdateAsgnFactor,
    DeleteStmt,
    MultiDeleteTable,
    RelationWithStarList,
    RelationWithStar,

    // DDL statements
    CreateTableStmt,
    TableElementList,
    TableElement,
    ColumnDefinition,
    OutOfLineConstraint,
    OutOfLineIndex,
    OutOfLinePrimaryIndex,
    OutOfLineUniqueIndex,
    ReferencesClause,
    MatchAction,
    ReferenceOption,
    ReferenceAction,
    OptReferenceOptionList,
    CheckState,
    OptConstraintName,
    SortColumnList,
    SortColumnKey,
    IndexUsingAlgorithm,
    OptIndexOptions,
    IndexOption,
    OptColumnAttributeList,
    ColumnAttribute,
    OptGeneratedColumnAttributeList,
    GeneratedColumnAttribute,
    OptGeneratedOptionList,
    OptSkipIndexTypeList,
    SkipIndexType,
    WithColumnGroup,
    ColumnGroupList,
    ColumnGroupElement,
    TableOptionList,
    TableOption,
    ParallelOption,
    VisibilityOption,
    AlterTableStmt,
    AlterTableAction,
    AlterColumnOption,
    AlterColumnBehavior,
    AlterIndexOption,
    AlterConstraintOption,
    AlterPartitionOption,
    AlterColumnGroupOption,
    ColumnDefinitionList,
    DropTableStmt,
    TableList,
    RenameTableStmt,
    RenameTableAction,
    TruncateTableStmt,
    CreateIndexStmt,
    DropIndexStmt,
    CreateMviewStmt,
    MviewRefreshClause,
    MvRefreshInterval,

    // Partitions
    PartitionOption,
    HashPartitionOption,
    KeyPartitionOption,
    RangePartitionOption,
    ListPartitionOption,
    SubpartitionOption,
    SubpartitionTemplateOption,
    SubpartitionIndividualOption,
    HashPartitionList,
    HashPartitionElement,
    RangePartitionList,
    RangePartitionElement,
    ListPartitionList,
    ListPartitionElement,
    SubpartitionList,
    HashSubpartitionElement,
    RangeSubpartitionElement,
    ListSubpartitionElement,
    RangePartitionExpr,
    RangeExprList,
    ListPartitionExpr,
    PartitionName,
    PartitionCount,
    SubpartitionCount,
}

/// One ordered child of a CST node: either a nested production or a terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CstChild {
    Node(CstNode),
    Token(Token),
}

/// A rule-tagged node of the concrete syntax tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CstNode {
    pub rule: Rule,
    pub children: Vec<CstChild>,
    pub span: Span,
}

impl CstNode {
    pub fn new(rule: Rule) -> Self {
        Self { rule, children: Vec::new(), span: Span::default() }
    }

    /// Fixture builder: append a child production.
    pub fn with_node(mut self, child: CstNode) -> Self {
        self.children.push(CstChild::Node(child));
        self
    }

    /// Fixture builder: append a terminal.
    pub fn with_token(mut self, kind: TokenKind, text: impl Into<String>) -> Self {
        self.children.push(CstChild::Token(Token::new(kind, text, Span::default())));
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// First child production with the given rule, if present.
    pub fn find(&self, rule: Rule) -> Option<&CstNode> {
        self.nth(rule, 0)
    }

    /// `n`-th (0-based) child production with the given rule.
    pub fn nth(&self, rule: Rule, n: usize) -> Option<&CstNode> {
        self.children
            .iter()
            .filter_map(|c| match c {
                CstChild::Node(node) if node.rule == rule => Some(node),
                _ => None,
            })
            .nth(n)
    }

    /// All child productions with the given rule, in source order.
    pub fn find_all(&self, rule: Rule) -> Vec<&CstNode> {
        self.children
            .iter()
            .filter_map(|c| match c {
                CstChild::Node(node) if node.rule == rule => Some(node),
                _ => None,
            })
            .collect()
    }

    /// First terminal child with the given kind, if present.
    pub fn token(&self, kind: TokenKind) -> Option<&Token> {
        self.children.iter().find_map(|c| match c {
            CstChild::Token(t) if t.kind == kind => Some(t),
            _ => None,
        })
    }

    /// All terminal children with the given kind, in source order.
    pub fn tokens(&self, kind: TokenKind) -> Vec<&Token> {
        self.children
            .iter()
            .filter_map(|c| match c {
                CstChild::Token(t) if t.kind == kind => Some(t),
                _ => None,
            })
            .collect()
    }

    /// Presence check for a terminal kind.
    pub fn has(&self, kind: TokenKind) -> bool {
        self.token(kind).is_some()
    }

    /// Text of the first terminal with the given kind.
    pub fn token_text(&self, kind: TokenKind) -> Option<&str> {
        self.token(kind).map(|t| t.text.as_str())
    }

    /// Child index of the `n`-th occurrence of a rule, for positional
    /// disambiguation (e.g. LIKE ... ESCAPE operand ordering).
    pub fn position_of(&self, rule: Rule, n: usize) -> Option<usize> {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, CstChild::Node(node) if node.rule == rule))
            .map(|(i, _)| i)
            .nth(n)
    }

    /// All terminal children in order, regardless of kind.
    pub fn all_tokens(&self) -> Vec<&Token> {
        self.children
            .iter()
            .filter_map(|c| match c {
                CstChild::Token(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    /// Leading terminals up to the first nested production. Type names like
    /// `CHARACTER VARYING` arrive as several leading keywords.
    pub fn leading_tokens(&self) -> Vec<&Token> {
        let mut out = Vec::new();
        for c in &self.children {
            match c {
                CstChild::Token(t) => out.push(t),
                CstChild::Node(_) => break,
            }
        }
        out
    }

    /// Literal source text of this production: every terminal below this
    /// node, in order, joined by single spaces. Used where the grammar
    /// defers semantics and the AST keeps raw text.
    pub fn text(&self) -> String {
        let mut parts = Vec::new();
        self.collect_text(&mut parts);
        parts.join(" ")
    }

    fn collect_text(&self, parts: &mut Vec<String>) {
        for c in &self.children {
            match c {
                CstChild::Token(t) => parts.push(t.text.clone()),
                CstChild::Node(n) => n.collect_text(parts),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_and_nth_respect_source_order() {
        let node = CstNode::new(Rule::Expr)
            .with_node(CstNode::new(Rule::BitExpr).with_token(TokenKind::IntNum, "1"))
            .with_token(TokenKind::Plus, "+")
            .with_node(CstNode::new(Rule::BitExpr).with_token(TokenKind::IntNum, "2"));
        assert_eq!(node.find_all(Rule::BitExpr).len(), 2);
        assert_eq!(node.nth(Rule::BitExpr, 1).unwrap().text(), "2");
        assert_eq!(node.position_of(Rule::BitExpr, 1), Some(2));
    }

    #[test]
    fn text_joins_terminals_in_order() {
        let node = CstNode::new(Rule::DateUnit)
            .with_token(TokenKind::Identifier, "DAY");
        assert_eq!(node.text(), "DAY");
    }

    #[test]
    fn leading_tokens_stop_at_first_production() {
        let node = CstNode::new(Rule::CharacterTypeI)
            .with_token(TokenKind::Character, "CHARACTER")
            .with_token(TokenKind::Identifier, "VARYING")
            .with_node(CstNode::new(Rule::StringLengthI));
        let lead: Vec<_> = node.leading_tokens().iter().map(|t| t.text.clone()).collect();
        assert_eq!(lead, vec!["CHARACTER", "VARYING"]);
    }
}
