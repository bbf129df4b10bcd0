//! Table partitioning nodes.

use crate::ast::expression::Expression;
use crate::cst::Span;
use serde::{Deserialize, Serialize};

/// `PARTITION BY` clause of CREATE TABLE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub strategy: PartitionStrategy,
    pub targets: Option<PartitionTargets>,
    /// `PARTITIONS n`.
    pub partition_count: Option<u64>,
    pub subpartition: Option<SubPartitionOption>,
    /// Explicit partition definitions, in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<PartitionElement>,
    #[serde(default)]
    pub span: Span,
}

impl Partition {
    pub fn new(strategy: PartitionStrategy, targets: Option<PartitionTargets>) -> Self {
        Self {
            strategy,
            targets,
            partition_count: None,
            subpartition: None,
            elements: Vec::new(),
            span: Span::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartitionStrategy {
    Hash,
    Key,
    Range,
    RangeColumns,
    List,
    ListColumns,
}

/// What the table is partitioned over: an expression for HASH / RANGE /
/// LIST, a column list for KEY and the COLUMNS strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionTargets {
    Expr(Expression),
    Columns(Vec<String>),
}

/// One `PARTITION p...` definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionElement {
    pub name: Option<String>,
    pub kind: PartitionElementKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subpartitions: Vec<SubPartitionElement>,
    #[serde(default)]
    pub span: Span,
}

impl PartitionElement {
    pub fn new(name: Option<String>, kind: PartitionElementKind) -> Self {
        Self {
            name,
            kind,
            subpartitions: Vec::new(),
            span: Span::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionElementKind {
    /// HASH / KEY partitions carry no value spec.
    Hash,
    /// `VALUES LESS THAN (...)`.
    Range(Vec<PartitionValue>),
    /// `VALUES IN (...)`.
    List(Vec<PartitionValue>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionValue {
    Expr(Expression),
    MaxValue,
    Default,
}

/// `SUBPARTITION BY` clause nested under a partition option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubPartitionOption {
    pub strategy: PartitionStrategy,
    pub targets: Option<PartitionTargets>,
    /// `SUBPARTITIONS n`.
    pub subpartition_count: Option<u64>,
    /// `SUBPARTITION TEMPLATE (...)` definitions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<SubPartitionElement>,
    #[serde(default)]
    pub span: Span,
}

/// One `SUBPARTITION sp...` definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubPartitionElement {
    pub name: Option<String>,
    pub kind: PartitionElementKind,
    #[serde(default)]
    pub span: Span,
}
