//! Shared CST fixture helpers for the integration tests.

#![allow(dead_code)]

use sqltree_sql::{CstNode, Rule, TokenKind};

/// A literal wrapped in the full expression production chain.
pub fn expr_of(text: &str) -> CstNode {
    CstNode::new(Rule::Expr).with_node(
        CstNode::new(Rule::BoolPri).with_node(CstNode::new(Rule::Predicate).with_node(bit(text))),
    )
}

pub fn bit(text: &str) -> CstNode {
    CstNode::new(Rule::BitExpr).with_node(
        CstNode::new(Rule::SimpleExpr)
            .with_node(CstNode::new(Rule::Literal).with_token(TokenKind::IntNum, text)),
    )
}

/// A dotted identifier chain, e.g. `&["s", "t", "c"]` for `s.t.c`.
pub fn column_ref(parts: &[&str]) -> CstNode {
    let mut node = CstNode::new(Rule::ColumnRef);
    for part in parts {
        node = node.with_token(TokenKind::Identifier, *part);
    }
    node
}

pub fn projection_of(text: &str) -> CstNode {
    CstNode::new(Rule::Projection).with_node(expr_of(text))
}

/// A one-projection query block. The marker literal identifies the block
/// in assertions.
pub fn simple_select(marker: &str) -> CstNode {
    CstNode::new(Rule::SimpleSelect)
        .with_node(CstNode::new(Rule::SelectExprList).with_node(projection_of(marker)))
}

pub fn relation(name: &str) -> CstNode {
    CstNode::new(Rule::RelationFactor).with_node(
        CstNode::new(Rule::NormalRelationFactor).with_token(TokenKind::Identifier, name),
    )
}

pub fn tbl(name: &str) -> CstNode {
    CstNode::new(Rule::TblName).with_node(relation(name))
}

pub fn int_column(name: &str) -> CstNode {
    CstNode::new(Rule::ColumnDefinition)
        .with_node(CstNode::new(Rule::ColumnDefinitionRef).with_token(TokenKind::Identifier, name))
        .with_node(
            CstNode::new(Rule::DataType)
                .with_node(CstNode::new(Rule::IntTypeI).with_token(TokenKind::Identifier, "INT")),
        )
}

pub fn sort_columns(names: &[&str]) -> CstNode {
    let mut list = CstNode::new(Rule::SortColumnList);
    for name in names {
        list = list
            .with_node(CstNode::new(Rule::SortColumnKey).with_token(TokenKind::Identifier, *name));
    }
    list
}

pub fn assignment(column: &str, value: &str) -> CstNode {
    CstNode::new(Rule::UpdateAsgnFactor)
        .with_node(column_ref(&[column]))
        .with_node(expr_of(value))
}
