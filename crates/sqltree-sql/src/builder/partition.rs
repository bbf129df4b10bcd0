//! PARTITION BY builders.
//!
//! The strategy productions share one shape: a target (expression or
//! column list), an optional count, an optional subpartition option and
//! an optional explicit definition list. RANGE and LIST double as their
//! COLUMNS variants, told apart by the COLUMNS keyword.

use crate::ast::partition::{
    Partition, PartitionElement, PartitionElementKind, PartitionStrategy, PartitionTargets,
    PartitionValue, SubPartitionElement, SubPartitionOption,
};
use crate::builder::{expression, identifier, Depth};
use crate::cst::{CstChild, CstNode, Rule, TokenKind};
use crate::error::{Error, Result};

/// Build a `PARTITION BY` clause.
pub fn build_partition(node: &CstNode) -> Result<Partition> {
    partition_option(node, Depth::default())
}

pub(crate) fn partition_option(node: &CstNode, depth: Depth) -> Result<Partition> {
    let depth = depth.descend(node.span)?;
    let body = if node.rule == Rule::PartitionOption {
        first_node(node).ok_or_else(|| Error::structural("empty partition option", node.span))?
    } else {
        node
    };

    let strategy = match body.rule {
        Rule::HashPartitionOption => PartitionStrategy::Hash,
        Rule::KeyPartitionOption => PartitionStrategy::Key,
        Rule::RangePartitionOption => {
            if body.has(TokenKind::Columns) {
                PartitionStrategy::RangeColumns
            } else {
                PartitionStrategy::Range
            }
        }
        Rule::ListPartitionOption => {
            if body.has(TokenKind::Columns) {
                PartitionStrategy::ListColumns
            } else {
                PartitionStrategy::List
            }
        }
        other => {
            return Err(Error::structural(
                format!("production {other:?} is not a partition option"),
                body.span,
            ))
        }
    };

    let mut partition = Partition::new(strategy, targets_of(body, strategy, depth)?);
    partition.partition_count = count_of(body, Rule::PartitionCount)?;
    partition.subpartition = body
        .find(Rule::SubpartitionOption)
        .map(|n| subpartition_option(n, depth))
        .transpose()?;
    for list_rule in [
        Rule::HashPartitionList,
        Rule::RangePartitionList,
        Rule::ListPartitionList,
    ] {
        if let Some(list) = body.find(list_rule) {
            partition.elements = partition_list(list, depth)?;
        }
    }
    partition.span = node.span;
    Ok(partition)
}

fn first_node(node: &CstNode) -> Option<&CstNode> {
    node.children.iter().find_map(|c| match c {
        CstChild::Node(n) => Some(n),
        _ => None,
    })
}

fn targets_of(
    node: &CstNode,
    strategy: PartitionStrategy,
    depth: Depth,
) -> Result<Option<PartitionTargets>> {
    let columns = matches!(
        strategy,
        PartitionStrategy::Key | PartitionStrategy::RangeColumns | PartitionStrategy::ListColumns
    );
    if columns {
        let names = node
            .find(Rule::NameList)
            .or_else(|| node.find(Rule::ColumnList))
            .map(identifier::name_list)
            .transpose()?;
        return Ok(names.map(PartitionTargets::Columns));
    }
    node.find(Rule::Expr)
        .or_else(|| node.find(Rule::BitExpr))
        .map(|n| Ok(PartitionTargets::Expr(expression::expr(n, depth)?)))
        .transpose()
}

fn count_of(node: &CstNode, rule: Rule) -> Result<Option<u64>> {
    let Some(count) = node.find(rule) else {
        return Ok(None);
    };
    let token = count
        .token(TokenKind::IntNum)
        .ok_or_else(|| Error::structural("partition count without a number", count.span))?;
    token
        .text
        .parse::<u64>()
        .map(Some)
        .map_err(|_| Error::structural(format!("invalid partition count `{}`", token.text), token.span))
}

fn subpartition_option(node: &CstNode, depth: Depth) -> Result<SubPartitionOption> {
    let body = node
        .find(Rule::SubpartitionTemplateOption)
        .or_else(|| node.find(Rule::SubpartitionIndividualOption))
        .unwrap_or(node);
    let strategy = if body.has(TokenKind::Key) {
        PartitionStrategy::Key
    } else if body.has(TokenKind::Range) {
        if body.has(TokenKind::Columns) {
            PartitionStrategy::RangeColumns
        } else {
            PartitionStrategy::Range
        }
    } else if body.has(TokenKind::List) {
        if body.has(TokenKind::Columns) {
            PartitionStrategy::ListColumns
        } else {
            PartitionStrategy::List
        }
    } else {
        PartitionStrategy::Hash
    };

    let templates = match body.find(Rule::SubpartitionList) {
        Some(list) => subpartition_list(list, depth)?,
        None => Vec::new(),
    };

    Ok(SubPartitionOption {
        strategy,
        targets: targets_of(body, strategy, depth)?,
        subpartition_count: count_of(body, Rule::SubpartitionCount)?,
        templates,
        span: node.span,
    })
}

pub(crate) fn partition_list(node: &CstNode, depth: Depth) -> Result<Vec<PartitionElement>> {
    let mut out = Vec::new();
    for child in node.children.iter() {
        let CstChild::Node(child) = child else { continue };
        match child.rule {
            Rule::HashPartitionList | Rule::RangePartitionList | Rule::ListPartitionList => {
                out.extend(partition_list(child, depth)?)
            }
            Rule::HashPartitionElement
            | Rule::RangePartitionElement
            | Rule::ListPartitionElement => out.push(partition_element(child, depth)?),
            _ => {}
        }
    }
    Ok(out)
}

fn partition_element(node: &CstNode, depth: Depth) -> Result<PartitionElement> {
    let kind = match node.rule {
        Rule::HashPartitionElement | Rule::HashSubpartitionElement => PartitionElementKind::Hash,
        Rule::RangePartitionElement | Rule::RangeSubpartitionElement => {
            PartitionElementKind::Range(range_values(node, depth)?)
        }
        Rule::ListPartitionElement | Rule::ListSubpartitionElement => {
            PartitionElementKind::List(list_values(node, depth)?)
        }
        other => {
            return Err(Error::structural(
                format!("production {other:?} is not a partition element"),
                node.span,
            ))
        }
    };
    let mut element = PartitionElement::new(partition_name(node), kind);
    if let Some(list) = node.find(Rule::SubpartitionList) {
        element.subpartitions = subpartition_list(list, depth)?;
    }
    element.span = node.span;
    Ok(element)
}

fn subpartition_list(node: &CstNode, depth: Depth) -> Result<Vec<SubPartitionElement>> {
    let mut out = Vec::new();
    for child in node.children.iter() {
        let CstChild::Node(child) = child else { continue };
        match child.rule {
            Rule::SubpartitionList => out.extend(subpartition_list(child, depth)?),
            Rule::HashSubpartitionElement
            | Rule::RangeSubpartitionElement
            | Rule::ListSubpartitionElement => {
                let element = partition_element(child, depth)?;
                out.push(SubPartitionElement {
                    name: element.name,
                    kind: element.kind,
                    span: element.span,
                });
            }
            _ => {}
        }
    }
    Ok(out)
}

fn partition_name(node: &CstNode) -> Option<String> {
    node.find(Rule::PartitionName)
        .map(|n| n.text())
        .or_else(|| node.token_text(TokenKind::Identifier).map(str::to_string))
}

/// `VALUES LESS THAN` accepts MAXVALUE in any value position.
fn range_values(node: &CstNode, depth: Depth) -> Result<Vec<PartitionValue>> {
    let spec = node
        .find(Rule::RangePartitionExpr)
        .ok_or_else(|| Error::structural("range partition without VALUES LESS THAN", node.span))?;
    let list = spec.find(Rule::RangeExprList).unwrap_or(spec);
    let mut out = Vec::new();
    for child in list.children.iter() {
        match child {
            CstChild::Node(child) => out.push(PartitionValue::Expr(expression::expr(child, depth)?)),
            CstChild::Token(token) if token.kind == TokenKind::Maxvalue => {
                out.push(PartitionValue::MaxValue)
            }
            _ => {}
        }
    }
    if out.is_empty() {
        return Err(Error::structural("empty range partition values", spec.span));
    }
    Ok(out)
}

/// `VALUES IN` accepts DEFAULT as the sole catch-all entry.
fn list_values(node: &CstNode, depth: Depth) -> Result<Vec<PartitionValue>> {
    let spec = node
        .find(Rule::ListPartitionExpr)
        .ok_or_else(|| Error::structural("list partition without VALUES IN", node.span))?;
    if spec.has(TokenKind::Default) {
        return Ok(vec![PartitionValue::Default]);
    }
    let values = spec
        .find(Rule::ExprList)
        .map(|n| expression::expr_list(n, depth))
        .transpose()?
        .unwrap_or_default();
    if values.is_empty() {
        return Err(Error::structural("empty list partition values", spec.span));
    }
    Ok(values.into_iter().map(PartitionValue::Expr).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(text: &str) -> CstNode {
        CstNode::new(Rule::Expr).with_node(
            CstNode::new(Rule::BoolPri).with_node(
                CstNode::new(Rule::Predicate).with_node(
                    CstNode::new(Rule::BitExpr).with_node(
                        CstNode::new(Rule::SimpleExpr).with_node(
                            CstNode::new(Rule::Literal).with_token(TokenKind::IntNum, text),
                        ),
                    ),
                ),
            ),
        )
    }

    #[test]
    fn hash_partition_with_count() {
        let node = CstNode::new(Rule::PartitionOption).with_node(
            CstNode::new(Rule::HashPartitionOption)
                .with_token(TokenKind::Hash, "HASH")
                .with_node(literal("7"))
                .with_node(
                    CstNode::new(Rule::PartitionCount).with_token(TokenKind::IntNum, "4"),
                ),
        );
        let partition = build_partition(&node).unwrap();
        assert_eq!(partition.strategy, PartitionStrategy::Hash);
        assert_eq!(partition.partition_count, Some(4));
        assert!(matches!(partition.targets, Some(PartitionTargets::Expr(_))));
    }

    #[test]
    fn range_columns_collects_names_and_maxvalue() {
        let element = CstNode::new(Rule::RangePartitionElement)
            .with_node(CstNode::new(Rule::PartitionName).with_token(TokenKind::Identifier, "p0"))
            .with_node(
                CstNode::new(Rule::RangePartitionExpr).with_node(
                    CstNode::new(Rule::RangeExprList)
                        .with_node(literal("10"))
                        .with_token(TokenKind::Maxvalue, "MAXVALUE"),
                ),
            );
        let node = CstNode::new(Rule::RangePartitionOption)
            .with_token(TokenKind::Range, "RANGE")
            .with_token(TokenKind::Columns, "COLUMNS")
            .with_node(
                CstNode::new(Rule::NameList)
                    .with_token(TokenKind::Identifier, "a")
                    .with_token(TokenKind::Identifier, "b"),
            )
            .with_node(CstNode::new(Rule::RangePartitionList).with_node(element));
        let partition = build_partition(&node).unwrap();
        assert_eq!(partition.strategy, PartitionStrategy::RangeColumns);
        match partition.targets.unwrap() {
            PartitionTargets::Columns(names) => assert_eq!(names, vec!["a", "b"]),
            other => panic!("expected columns, got {other:?}"),
        }
        let element = &partition.elements[0];
        assert_eq!(element.name.as_deref(), Some("p0"));
        match &element.kind {
            PartitionElementKind::Range(values) => {
                assert_eq!(values.len(), 2);
                assert_eq!(values[1], PartitionValue::MaxValue);
            }
            other => panic!("expected range values, got {other:?}"),
        }
    }

    #[test]
    fn list_default_is_the_sole_value() {
        let element = CstNode::new(Rule::ListPartitionElement)
            .with_node(CstNode::new(Rule::PartitionName).with_token(TokenKind::Identifier, "rest"))
            .with_node(
                CstNode::new(Rule::ListPartitionExpr).with_token(TokenKind::Default, "DEFAULT"),
            );
        let node = CstNode::new(Rule::ListPartitionOption)
            .with_token(TokenKind::List, "LIST")
            .with_node(literal("1"))
            .with_node(CstNode::new(Rule::ListPartitionList).with_node(element));
        let partition = build_partition(&node).unwrap();
        match &partition.elements[0].kind {
            PartitionElementKind::List(values) => {
                assert_eq!(values, &vec![PartitionValue::Default])
            }
            other => panic!("expected list values, got {other:?}"),
        }
    }

    #[test]
    fn subpartition_template_carries_elements() {
        let template = CstNode::new(Rule::SubpartitionTemplateOption)
            .with_token(TokenKind::Hash, "HASH")
            .with_node(literal("3"))
            .with_node(
                CstNode::new(Rule::SubpartitionList).with_node(
                    CstNode::new(Rule::HashSubpartitionElement).with_node(
                        CstNode::new(Rule::PartitionName).with_token(TokenKind::Identifier, "sp0"),
                    ),
                ),
            );
        let node = CstNode::new(Rule::RangePartitionOption)
            .with_token(TokenKind::Range, "RANGE")
            .with_node(literal("1"))
            .with_node(CstNode::new(Rule::SubpartitionOption).with_node(template));
        let partition = build_partition(&node).unwrap();
        let sub = partition.subpartition.unwrap();
        assert_eq!(sub.strategy, PartitionStrategy::Hash);
        assert_eq!(sub.templates.len(), 1);
        assert_eq!(sub.templates[0].name.as_deref(), Some("sp0"));
    }
}
