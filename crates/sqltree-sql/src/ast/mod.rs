//! AST node types
//!
//! The dialect-neutral tree this crate produces. Every node is immutable
//! once built, owns its children exclusively and carries a [`Span`] for
//! diagnostics; spans never participate in semantic decisions.
//!
//! [`Span`]: crate::cst::Span

pub mod alter_table;
pub mod common;
pub mod create_table;
pub mod data_type;
pub mod ddl;
pub mod dml;
pub mod expression;
pub mod operator;
pub mod partition;
pub mod select;
pub mod statement;

pub use alter_table::{AlterTable, AlterTableAction, AlterTableActionKind};
pub use common::RelationFactor;
pub use create_table::{
    ColumnAttributes, ColumnDefinition, ColumnGroupElement, ColumnLocation, ConstraintState,
    CreateTable, ForeignReference, GenerateKind, GenerateOption, IndexOptions, InlineConstraint,
    InlineConstraintKind, MatchOption, OnOption, OutOfLineConstraint, OutOfLineConstraintKind,
    OutOfLineIndex, SortColumn, TableElement, TableOptions,
};
pub use data_type::{CharacterType, CollectionType, DataType, GeneralType, NumberType, TimestampType};
pub use ddl::{
    CreateIndex, CreateMaterializedView, DropBehavior, DropIndex, DropTable,
    MaterializedViewRefresh, RefreshInterval, RefreshMode, RefreshOn, RenameAction, RenameTable,
    TruncateTable,
};
pub use dml::{Assignment, Delete, Insert, RelationWithStar, Update};
pub use expression::{
    BoolValue, BraceExpr, CaseWhen, CollectionExpression, ColumnReference, CompoundExpression,
    ConstExpr, Expression, FullTextSearch, FunctionCall, FunctionOption, FunctionParam,
    IntervalExpression, JsonOnOption, TextSearchMode, WhenClause, WindowFunction,
};
pub use operator::Operator;
pub use partition::{
    Partition, PartitionElement, PartitionElementKind, PartitionStrategy, PartitionTargets,
    PartitionValue, SubPartitionElement, SubPartitionOption,
};
pub use select::{
    BraceBlock, ExpressionReference, ExpressionReferenceTarget, FlashbackUsage, FromReference,
    JoinCondition, JoinReference, JoinType, Limit, NamedWindow, NameReference, OrderBy,
    PartitionUsage, Projection, RelatedSelectBody, RelationType, SelectBody, SortDirection,
    SortKey, WindowBound, WindowFrame, WindowFrameUnit, WithTable,
};
pub use statement::Statement;
