//! FROM clause builders.
//!
//! Join chains arrive already nested from the grammar; recursing left
//! first keeps the tree left-deep, so the earliest join in source order
//! ends up innermost on the left spine.

use crate::ast::select::{
    BraceBlock, ExpressionReference, ExpressionReferenceTarget, FlashbackUsage, FromReference,
    JoinCondition, JoinReference, JoinType, NameReference, PartitionUsage,
};
use crate::builder::{expression, identifier, select, Depth};
use crate::cst::{CstChild, CstNode, Rule, TokenKind};
use crate::error::{Error, Result};

/// Build one FROM clause item.
pub fn build_from_reference(node: &CstNode) -> Result<FromReference> {
    from_reference(node, Depth::default())
}

pub(crate) fn from_reference(node: &CstNode, depth: Depth) -> Result<FromReference> {
    let depth = depth.descend(node.span)?;
    match node.rule {
        Rule::TableReference | Rule::TableFactor => {
            if node.has(TokenKind::LBrace) {
                return brace_block(node, depth);
            }
            match first_node(node) {
                Some(inner) => from_reference(inner, depth),
                None => Err(Error::structural("empty table reference", node.span)),
            }
        }
        Rule::TblName => name_reference(node, depth),
        Rule::JoinedTable => joined_table(node, depth),
        Rule::TableSubquery | Rule::TableSubqueryAlias => table_subquery(node, depth),
        other => Err(Error::structural(
            format!("production {other:?} is not a table reference"),
            node.span,
        )),
    }
}

/// Flatten a `table_references` list into source order.
pub(crate) fn table_references(node: &CstNode, depth: Depth) -> Result<Vec<FromReference>> {
    let mut out = Vec::new();
    for child in node.children.iter() {
        let CstChild::Node(child) = child else { continue };
        match child.rule {
            Rule::TableReferences | Rule::FromList => {
                out.extend(table_references(child, depth)?)
            }
            _ => out.push(from_reference(child, depth)?),
        }
    }
    if out.is_empty() {
        return Err(Error::structural("empty FROM list", node.span));
    }
    Ok(out)
}

fn first_node(node: &CstNode) -> Option<&CstNode> {
    node.children.iter().find_map(|c| match c {
        CstChild::Node(n) => Some(n),
        _ => None,
    })
}

fn alias_of(node: &CstNode) -> Option<String> {
    node.find(Rule::ColumnLabel)
        .map(|n| n.text())
        .or_else(|| node.token_text(TokenKind::Identifier).map(str::to_string))
}

fn name_reference(node: &CstNode, depth: Depth) -> Result<FromReference> {
    let factor_node = node
        .find(Rule::RelationFactor)
        .or_else(|| node.find(Rule::NormalRelationFactor))
        .ok_or_else(|| Error::structural("table name without a relation factor", node.span))?;
    let mut reference = NameReference::new(identifier::relation_factor(factor_node)?);
    reference.alias = alias_of(node);
    if let Some(partition_node) = node.find(Rule::UsePartition) {
        let names = partition_node
            .find(Rule::NameList)
            .map(identifier::name_list)
            .transpose()?
            .unwrap_or_default();
        reference.partition_usage = Some(PartitionUsage {
            names,
            span: partition_node.span,
        });
    }
    if let Some(flashback_node) = node.find(Rule::UseFlashback) {
        let value_node = first_node(flashback_node).ok_or_else(|| {
            Error::structural("flashback clause without an expression", flashback_node.span)
        })?;
        reference.flashback_usage = Some(FlashbackUsage {
            value: expression::expr(value_node, depth)?,
            span: flashback_node.span,
        });
    }
    reference.span = node.span;
    Ok(FromReference::Name(reference))
}

fn table_subquery(node: &CstNode, depth: Depth) -> Result<FromReference> {
    let select_node = node
        .find(Rule::SelectWithParens)
        .or_else(|| node.find(Rule::SelectNoParens))
        .ok_or_else(|| Error::structural("derived table without a subquery", node.span))?;
    let body = select::build_select(select_node, depth)?;
    let columns = node
        .find(Rule::AliasNameList)
        .map(column_alias_names)
        .unwrap_or_default();
    Ok(FromReference::Expression(ExpressionReference {
        target: ExpressionReferenceTarget::Select(Box::new(body)),
        alias: alias_of(node),
        columns,
        span: node.span,
    }))
}

fn column_alias_names(node: &CstNode) -> Vec<String> {
    let mut out = Vec::new();
    for child in node.find_all(Rule::ColumnAliasName) {
        out.push(child.text());
    }
    if out.is_empty() {
        out.extend(node.tokens(TokenKind::Identifier).iter().map(|t| t.text.clone()));
    }
    out
}

fn join_type(node: &CstNode) -> Result<JoinType> {
    if let Some(natural) = node.find(Rule::NaturalJoinType) {
        return Ok(if natural.has(TokenKind::Full) {
            JoinType::NaturalFullOuter
        } else if natural.has(TokenKind::Left) {
            JoinType::NaturalLeftOuter
        } else if natural.has(TokenKind::Right) {
            JoinType::NaturalRightOuter
        } else {
            JoinType::NaturalInner
        });
    }
    if let Some(outer) = node.find(Rule::OuterJoinType) {
        if outer.has(TokenKind::Full) {
            return Ok(JoinType::FullOuter);
        }
        if outer.has(TokenKind::Left) {
            return Ok(JoinType::LeftOuter);
        }
        if outer.has(TokenKind::Right) {
            return Ok(JoinType::RightOuter);
        }
        return Err(Error::structural("outer join without a direction", node.span));
    }
    if let Some(inner) = node.find(Rule::InnerJoinType) {
        if inner.has(TokenKind::Cross) {
            return Ok(JoinType::Cross);
        }
        if inner.has(TokenKind::StraightJoin) {
            return Ok(JoinType::StraightJoin);
        }
        return Ok(JoinType::Inner);
    }
    // Bare `JOIN` keyword.
    if node.has(TokenKind::StraightJoin) {
        return Ok(JoinType::StraightJoin);
    }
    Ok(JoinType::Inner)
}

fn joined_table(node: &CstNode, depth: Depth) -> Result<FromReference> {
    let mut operands = Vec::new();
    for child in node.children.iter() {
        let CstChild::Node(child) = child else { continue };
        if matches!(
            child.rule,
            Rule::TableReference
                | Rule::TableFactor
                | Rule::TblName
                | Rule::JoinedTable
                | Rule::TableSubquery
                | Rule::TableSubqueryAlias
        ) {
            operands.push(child);
        }
    }
    let (left, right) = match operands.as_slice() {
        [left, right] => (*left, *right),
        _ => {
            return Err(Error::structural(
                "joined table without two operands",
                node.span,
            ))
        }
    };

    let condition = match node.find(Rule::JoinCondition) {
        Some(cond) => Some(join_condition(cond, depth)?),
        None => None,
    };

    Ok(FromReference::Join(Box::new(JoinReference {
        left: from_reference(left, depth)?,
        right: from_reference(right, depth)?,
        join_type: join_type(node)?,
        condition,
        span: node.span,
    })))
}

fn join_condition(node: &CstNode, depth: Depth) -> Result<JoinCondition> {
    if node.has(TokenKind::Using) {
        let columns = node
            .find(Rule::ColumnList)
            .map(identifier::column_list)
            .transpose()?
            .unwrap_or_default();
        if columns.is_empty() {
            return Err(Error::structural("USING without columns", node.span));
        }
        return Ok(JoinCondition::Using(columns));
    }
    let predicate = first_node(node)
        .ok_or_else(|| Error::structural("ON without a predicate", node.span))?;
    Ok(JoinCondition::On(expression::expr(predicate, depth)?))
}

fn brace_block(node: &CstNode, depth: Depth) -> Result<FromReference> {
    let name = node
        .token(TokenKind::Oj)
        .map(|t| t.text.to_uppercase())
        .or_else(|| node.token_text(TokenKind::Identifier).map(str::to_uppercase))
        .ok_or_else(|| Error::structural("brace block without a name", node.span))?;
    let inner = first_node(node)
        .ok_or_else(|| Error::structural("brace block without a table reference", node.span))?;
    Ok(FromReference::Brace(Box::new(BraceBlock {
        name,
        inner: from_reference(inner, depth)?,
        span: node.span,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tbl(name: &str) -> CstNode {
        CstNode::new(Rule::TblName).with_node(
            CstNode::new(Rule::RelationFactor).with_node(
                CstNode::new(Rule::NormalRelationFactor).with_token(TokenKind::Identifier, name),
            ),
        )
    }

    fn relation_name(reference: &FromReference) -> &str {
        match reference {
            FromReference::Name(n) => &n.factor.relation,
            other => panic!("expected name reference, got {other:?}"),
        }
    }

    #[test]
    fn table_name_with_alias_and_partition() {
        let node = tbl("orders")
            .with_node(
                CstNode::new(Rule::UsePartition).with_node(
                    CstNode::new(Rule::NameList).with_token(TokenKind::Identifier, "p0"),
                ),
            )
            .with_token(TokenKind::Identifier, "o");
        match build_from_reference(&node).unwrap() {
            FromReference::Name(n) => {
                assert_eq!(n.factor.relation, "orders");
                assert_eq!(n.alias.as_deref(), Some("o"));
                assert_eq!(n.partition_usage.unwrap().names, vec!["p0"]);
            }
            other => panic!("expected name reference, got {other:?}"),
        }
    }

    #[test]
    fn outer_keyword_folds_into_the_join_type() {
        let node = CstNode::new(Rule::JoinedTable)
            .with_node(tbl("a"))
            .with_node(
                CstNode::new(Rule::OuterJoinType)
                    .with_token(TokenKind::Left, "LEFT")
                    .with_token(TokenKind::Outer, "OUTER"),
            )
            .with_node(tbl("b"));
        match build_from_reference(&node).unwrap() {
            FromReference::Join(j) => assert_eq!(j.join_type, JoinType::LeftOuter),
            other => panic!("expected join, got {other:?}"),
        }
    }

    #[test]
    fn nested_joins_stay_left_deep() {
        let inner = CstNode::new(Rule::JoinedTable)
            .with_node(tbl("a"))
            .with_node(CstNode::new(Rule::InnerJoinType))
            .with_node(tbl("b"));
        let node = CstNode::new(Rule::JoinedTable)
            .with_node(inner)
            .with_node(CstNode::new(Rule::InnerJoinType))
            .with_node(tbl("c"));
        match build_from_reference(&node).unwrap() {
            FromReference::Join(outer) => {
                assert_eq!(relation_name(&outer.right), "c");
                match &outer.left {
                    FromReference::Join(inner) => {
                        assert_eq!(relation_name(&inner.left), "a");
                        assert_eq!(relation_name(&inner.right), "b");
                    }
                    other => panic!("expected nested join on the left, got {other:?}"),
                }
            }
            other => panic!("expected join, got {other:?}"),
        }
    }

    #[test]
    fn using_condition_collects_columns() {
        let node = CstNode::new(Rule::JoinedTable)
            .with_node(tbl("a"))
            .with_node(CstNode::new(Rule::InnerJoinType))
            .with_node(tbl("b"))
            .with_node(
                CstNode::new(Rule::JoinCondition)
                    .with_token(TokenKind::Using, "USING")
                    .with_node(
                        CstNode::new(Rule::ColumnList)
                            .with_token(TokenKind::Identifier, "id")
                            .with_token(TokenKind::Identifier, "ts"),
                    ),
            );
        match build_from_reference(&node).unwrap() {
            FromReference::Join(j) => match j.condition.unwrap() {
                JoinCondition::Using(cols) => assert_eq!(cols.len(), 2),
                other => panic!("expected USING, got {other:?}"),
            },
            other => panic!("expected join, got {other:?}"),
        }
    }
}
