//! ALTER TABLE nodes.

use crate::ast::common::RelationFactor;
use crate::ast::create_table::{
    ColumnDefinition, OutOfLineConstraint, OutOfLineIndex, TableOptions,
};
use crate::ast::ddl::DropBehavior;
use crate::ast::expression::Expression;
use crate::ast::partition::PartitionElement;
use crate::cst::Span;
use serde::{Deserialize, Serialize};

/// `ALTER TABLE`, one action per comma-separated clause, in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterTable {
    pub table: RelationFactor,
    pub actions: Vec<AlterTableAction>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterTableAction {
    pub kind: AlterTableActionKind,
    #[serde(default)]
    pub span: Span,
}

impl AlterTableAction {
    pub fn new(kind: AlterTableActionKind) -> Self {
        Self { kind, span: Span::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlterTableActionKind {
    /// `ADD [COLUMN]`, single definition or parenthesized group.
    AddColumns(Vec<ColumnDefinition>),
    DropColumn {
        column: String,
        behavior: Option<DropBehavior>,
    },
    ModifyColumn(ColumnDefinition),
    ChangeColumn {
        old_name: String,
        definition: ColumnDefinition,
    },
    AlterColumnSetDefault {
        column: String,
        default_value: Expression,
    },
    AlterColumnDropDefault {
        column: String,
    },
    AddConstraint(OutOfLineConstraint),
    AddIndex(OutOfLineIndex),
    DropPrimaryKey,
    DropIndex {
        name: String,
    },
    DropForeignKey {
        name: String,
    },
    DropConstraint {
        names: Vec<String>,
    },
    RenameTo(RelationFactor),
    RenameIndex {
        from: String,
        to: String,
    },
    RenameColumn {
        from: String,
        to: String,
    },
    AlterIndexVisibility {
        name: String,
        visible: bool,
    },
    SetTableOptions(TableOptions),
    AddPartition(Vec<PartitionElement>),
    DropPartition(Vec<String>),
    TruncatePartition(Vec<String>),
}
