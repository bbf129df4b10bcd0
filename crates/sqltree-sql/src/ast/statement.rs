//! Top-level statement wrapper.

use crate::ast::alter_table::AlterTable;
use crate::ast::create_table::CreateTable;
use crate::ast::ddl::{
    CreateIndex, CreateMaterializedView, DropIndex, DropTable, RenameTable, TruncateTable,
};
use crate::ast::dml::{Delete, Insert, Update};
use crate::ast::select::SelectBody;
use crate::cst::Span;
use serde::{Deserialize, Serialize};

/// Any statement this crate can build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statement {
    Select(Box<SelectBody>),
    Insert(Box<Insert>),
    Update(Box<Update>),
    Delete(Box<Delete>),
    CreateTable(Box<CreateTable>),
    AlterTable(Box<AlterTable>),
    DropTable(DropTable),
    RenameTable(RenameTable),
    TruncateTable(TruncateTable),
    CreateIndex(Box<CreateIndex>),
    DropIndex(DropIndex),
    CreateMaterializedView(Box<CreateMaterializedView>),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Select(s) => s.span,
            Statement::Insert(s) => s.span,
            Statement::Update(s) => s.span,
            Statement::Delete(s) => s.span,
            Statement::CreateTable(s) => s.span,
            Statement::AlterTable(s) => s.span,
            Statement::DropTable(s) => s.span,
            Statement::RenameTable(s) => s.span,
            Statement::TruncateTable(s) => s.span,
            Statement::CreateIndex(s) => s.span,
            Statement::DropIndex(s) => s.span,
            Statement::CreateMaterializedView(s) => s.span,
        }
    }
}
