//! Statement builders
//!
//! Each submodule owns one layer of the bottom-up construction pass.
//! Builders are pure: a CST node in, an owned AST node (or an error) out.
//! Recursion depth is bounded so a pathologically nested input fails with
//! a clean error instead of exhausting the stack.

pub mod data_type;
pub mod ddl;
pub mod dml;
pub mod expression;
pub mod from_reference;
pub mod identifier;
pub mod partition;
pub mod select;
pub mod table_element;

use crate::ast::Statement;
use crate::cst::{CstNode, Rule, Span};
use crate::error::{Error, Result};
use tracing::debug;

/// Maximum nesting depth a single build will follow.
pub const MAX_BUILD_DEPTH: usize = 128;

/// Remaining-depth ticket threaded through recursive builders.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Depth(usize);

impl Depth {
    /// One level deeper, or an error once the cap is reached.
    pub(crate) fn descend(self, span: Span) -> Result<Depth> {
        if self.0 >= MAX_BUILD_DEPTH {
            return Err(Error::unsupported(
                format!("statement nesting deeper than {MAX_BUILD_DEPTH} levels"),
                span,
            ));
        }
        Ok(Depth(self.0 + 1))
    }
}

/// Build a top-level [`Statement`] from the root production of a parse.
pub fn build_statement(node: &CstNode) -> Result<Statement> {
    debug!(rule = ?node.rule, "building statement");
    let depth = Depth::default();
    match node.rule {
        Rule::SelectNoParens
        | Rule::SelectWithParens
        | Rule::SelectClause
        | Rule::SimpleSelect
        | Rule::NoTableSelect
        | Rule::SelectClauseSet
        | Rule::TableValuesClause
        | Rule::TableValuesClauseWithOrderByAndLimit => {
            Ok(Statement::Select(Box::new(select::build_select(node, depth)?)))
        }
        Rule::InsertStmt => Ok(Statement::Insert(Box::new(dml::build_insert(node, depth)?))),
        Rule::UpdateStmt => Ok(Statement::Update(Box::new(dml::build_update(node, depth)?))),
        Rule::DeleteStmt => Ok(Statement::Delete(Box::new(dml::build_delete(node, depth)?))),
        Rule::CreateTableStmt => Ok(Statement::CreateTable(Box::new(ddl::build_create_table(
            node, depth,
        )?))),
        Rule::AlterTableStmt => Ok(Statement::AlterTable(Box::new(ddl::build_alter_table(
            node, depth,
        )?))),
        Rule::DropTableStmt => Ok(Statement::DropTable(ddl::build_drop_table(node)?)),
        Rule::RenameTableStmt => Ok(Statement::RenameTable(ddl::build_rename_table(node)?)),
        Rule::TruncateTableStmt => Ok(Statement::TruncateTable(ddl::build_truncate_table(node)?)),
        Rule::CreateIndexStmt => Ok(Statement::CreateIndex(Box::new(ddl::build_create_index(
            node, depth,
        )?))),
        Rule::DropIndexStmt => Ok(Statement::DropIndex(ddl::build_drop_index(node)?)),
        Rule::CreateMviewStmt => Ok(Statement::CreateMaterializedView(Box::new(
            ddl::build_create_mview(node, depth)?,
        ))),
        other => Err(Error::unsupported(
            format!("statement production {other:?} is not supported"),
            node.span,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::TokenKind;

    #[test]
    fn unknown_root_production_is_rejected() {
        let node = CstNode::new(Rule::Expr).with_token(TokenKind::IntNum, "1");
        let err = build_statement(&node).unwrap_err();
        assert!(matches!(err, Error::UnsupportedConstruct { .. }));
    }

    #[test]
    fn depth_ticket_fails_past_the_cap() {
        let mut depth = Depth::default();
        for _ in 0..MAX_BUILD_DEPTH {
            depth = depth.descend(Span::default()).unwrap();
        }
        assert!(depth.descend(Span::default()).is_err());
    }
}
