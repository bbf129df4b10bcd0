//! Remaining DDL statement nodes: indexes, drops, renames, truncate and
//! materialized views.

use crate::ast::common::RelationFactor;
use crate::ast::create_table::{IndexOptions, SortColumn, TableOptions};
use crate::ast::partition::Partition;
use crate::ast::select::SelectBody;
use crate::cst::Span;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DropBehavior {
    Cascade,
    Restrict,
}

/// `CREATE [UNIQUE | FULLTEXT | SPATIAL] INDEX ... ON table (...)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIndex {
    pub index: RelationFactor,
    pub table: RelationFactor,
    #[serde(default)]
    pub if_not_exists: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub fulltext: bool,
    #[serde(default)]
    pub spatial: bool,
    pub columns: Vec<SortColumn>,
    pub index_options: Option<IndexOptions>,
    pub partition: Option<Partition>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropIndex {
    pub index: RelationFactor,
    pub table: RelationFactor,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropTable {
    pub tables: Vec<RelationFactor>,
    #[serde(default)]
    pub temporary: bool,
    #[serde(default)]
    pub if_exists: bool,
    pub behavior: Option<DropBehavior>,
    #[serde(default)]
    pub materialized: bool,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruncateTable {
    pub table: RelationFactor,
    #[serde(default)]
    pub span: Span,
}

/// `RENAME TABLE a TO b [, c TO d ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameTable {
    pub actions: Vec<RenameAction>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameAction {
    pub from: RelationFactor,
    pub to: RelationFactor,
    #[serde(default)]
    pub span: Span,
}

/// `CREATE MATERIALIZED VIEW ... AS select`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMaterializedView {
    pub view: RelationFactor,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    pub table_options: Option<TableOptions>,
    pub partition: Option<Partition>,
    pub refresh: Option<MaterializedViewRefresh>,
    /// `ENABLE` / `DISABLE QUERY REWRITE`.
    pub query_rewrite: Option<bool>,
    /// `ENABLE` / `DISABLE ON QUERY COMPUTATION`.
    pub query_computation: Option<bool>,
    pub select: SelectBody,
    #[serde(default)]
    pub span: Span,
}

/// `REFRESH [COMPLETE | FAST | FORCE] [ON ...] [START WITH ...] [NEXT ...]`,
/// or `NEVER REFRESH`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterializedViewRefresh {
    pub mode: RefreshMode,
    pub on: Option<RefreshOn>,
    /// Start-time expression, kept as literal source text. Its evaluation
    /// is engine specific, so it is never re-parsed here.
    pub start_with: Option<String>,
    pub next: Option<RefreshInterval>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefreshMode {
    Complete,
    Fast,
    Force,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefreshOn {
    Demand,
    Commit,
}

/// `NEXT <n> <unit>` refresh schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshInterval {
    pub value: u64,
    /// Unit keyword exactly as written, e.g. `DAY`.
    pub unit: String,
    #[serde(default)]
    pub span: Span,
}
