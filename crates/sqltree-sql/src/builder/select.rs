//! Query block builders.
//!
//! Set operations arrive left-nested from the grammar. The left side is
//! built first and the right side appended to the end of its `related`
//! chain, so `A UNION B UNION C` reads left to right. A trailing ORDER BY
//! or LIMIT after a set operation belongs to the last block of the chain.

use crate::ast::select::{
    Limit, NamedWindow, OrderBy, Projection, RelationType, SelectBody, SortDirection, SortKey,
    WithTable,
};
use crate::builder::{expression, from_reference, identifier, Depth};
use crate::cst::{CstChild, CstNode, Rule, TokenKind};
use crate::error::{Error, Result};
use tracing::debug;

/// Build a [`SelectBody`] from any select-layer production.
pub fn build_select_body(node: &CstNode) -> Result<SelectBody> {
    build_select(node, Depth::default())
}

pub(crate) fn build_select(node: &CstNode, depth: Depth) -> Result<SelectBody> {
    let depth = depth.descend(node.span)?;
    match node.rule {
        Rule::SelectWithParens | Rule::SelectClause | Rule::SelectClauseSetLeft
        | Rule::SelectClauseSetRight => match first_node(node) {
            Some(inner) => build_select(inner, depth),
            None => Err(Error::structural("empty select wrapper", node.span)),
        },
        Rule::SelectNoParens
        | Rule::SimpleSelectWithOrderAndLimit
        | Rule::NoTableSelectWithOrderAndLimit
        | Rule::SelectClauseSetWithOrderAndLimit
        | Rule::SelectWithParensWithOrderAndLimit
        | Rule::TableValuesClauseWithOrderByAndLimit => body_with_clauses(node, depth),
        Rule::SimpleSelect | Rule::NoTableSelect => simple_select(node, depth),
        Rule::SelectClauseSet => clause_set(node, depth),
        Rule::TableValuesClause => values_clause(node, depth),
        other => Err(Error::structural(
            format!("production {other:?} is not a query block"),
            node.span,
        )),
    }
}

fn first_node(node: &CstNode) -> Option<&CstNode> {
    node.children.iter().find_map(|c| match c {
        CstChild::Node(n) => Some(n),
        _ => None,
    })
}

fn is_body_rule(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::SelectClause
            | Rule::SimpleSelect
            | Rule::NoTableSelect
            | Rule::SelectClauseSet
            | Rule::SelectWithParens
            | Rule::SelectNoParens
            | Rule::TableValuesClause
            | Rule::SimpleSelectWithOrderAndLimit
            | Rule::NoTableSelectWithOrderAndLimit
            | Rule::SelectClauseSetWithOrderAndLimit
            | Rule::SelectWithParensWithOrderAndLimit
            | Rule::TableValuesClauseWithOrderByAndLimit
    )
}

/// A body production plus its optional WITH, ORDER BY and LIMIT clauses.
fn body_with_clauses(node: &CstNode, depth: Depth) -> Result<SelectBody> {
    let body_node = node
        .children
        .iter()
        .find_map(|c| match c {
            CstChild::Node(n) if is_body_rule(n.rule) => Some(n),
            _ => None,
        })
        .ok_or_else(|| Error::structural("select without a query block", node.span))?;
    let mut body = build_select(body_node, depth)?;

    if let Some(with_node) = node.find(Rule::WithClause) {
        let (tables, recursive) = with_clause(with_node, depth)?;
        body.with = tables;
        body.recursive = recursive;
    }
    // Trailing clauses of a set operation belong to its last block.
    if let Some(order_node) = node.find(Rule::OrderBy) {
        body.last_body_mut().order_by = Some(build_order_by(order_node, depth)?);
    }
    if let Some(limit_node) = node.find(Rule::LimitClause) {
        body.last_body_mut().limit = Some(build_limit(limit_node, depth)?);
    }
    if body.span == crate::cst::Span::default() {
        body.span = node.span;
    }
    Ok(body)
}

fn simple_select(node: &CstNode, depth: Depth) -> Result<SelectBody> {
    debug!(rule = ?node.rule, "building query block");
    let mut body = SelectBody { span: node.span, ..SelectBody::default() };

    if let Some(options) = node.find(Rule::QueryExpressionOptionList) {
        for option in options.find_all(Rule::QueryExpressionOption) {
            body.query_options.push(option.text().to_uppercase());
        }
        for token in options.all_tokens() {
            body.query_options.push(token.text.to_uppercase());
        }
    }
    if node.has(TokenKind::Distinct) {
        body.query_options.push("DISTINCT".to_string());
    }

    let projection_list = node
        .find(Rule::SelectExprList)
        .ok_or_else(|| Error::structural("select without a projection list", node.span))?;
    for projection_node in projection_list.find_all(Rule::Projection) {
        body.projections.push(projection(projection_node, depth)?);
    }
    if body.projections.is_empty() {
        return Err(Error::structural("empty projection list", node.span));
    }

    if let Some(from_node) = node
        .find(Rule::FromList)
        .or_else(|| node.find(Rule::TableReferences))
    {
        body.froms = from_reference::table_references(from_node, depth)?;
    }

    // WHERE and HAVING both hold a bare `expr`; the slots fill in clause
    // order, so a lone expression follows whichever keyword is present.
    let conditions = node.find_all(Rule::Expr);
    let has_where = node.has(TokenKind::Where);
    let has_having = node.has(TokenKind::Having);
    match (has_where, has_having, conditions.as_slice()) {
        (true, true, [where_node, having_node, ..]) => {
            body.where_clause = Some(expression::expr(where_node, depth)?);
            body.having = Some(expression::expr(having_node, depth)?);
        }
        (true, false, [where_node, ..]) => {
            body.where_clause = Some(expression::expr(where_node, depth)?);
        }
        (false, true, [having_node, ..]) => {
            body.having = Some(expression::expr(having_node, depth)?);
        }
        (false, false, _) => {}
        _ => {
            return Err(Error::structural(
                "WHERE/HAVING keyword without its expression",
                node.span,
            ))
        }
    }

    if let Some(group_node) = node.find(Rule::GroupbyClause) {
        body.group_by = group_by_exprs(group_node, depth)?;
        body.with_rollup = group_node.has(TokenKind::Rollup);
    }

    if let Some(windows_node) = node.find(Rule::NamedWindows) {
        for window_node in windows_node.find_all(Rule::NamedWindow) {
            body.windows.push(named_window(window_node, depth)?);
        }
    }

    Ok(body)
}

fn group_by_exprs(node: &CstNode, depth: Depth) -> Result<Vec<crate::ast::Expression>> {
    let list = node.find(Rule::SortListForGroupBy).unwrap_or(node);
    let mut out = Vec::new();
    for key in list.find_all(Rule::SortKeyForGroupBy) {
        let operand = first_node(key)
            .ok_or_else(|| Error::structural("GROUP BY key without an expression", key.span))?;
        out.push(expression::expr(operand, depth)?);
    }
    if out.is_empty() {
        // Bare expression list form.
        for child in list.children.iter() {
            if let CstChild::Node(n) = child {
                out.push(expression::expr(n, depth)?);
            }
        }
    }
    Ok(out)
}

fn named_window(node: &CstNode, depth: Depth) -> Result<NamedWindow> {
    let name = node
        .token_text(TokenKind::Identifier)
        .ok_or_else(|| Error::structural("named window without a name", node.span))?
        .to_string();
    let spec_node = node
        .find(Rule::GeneralizedWindowClause)
        .ok_or_else(|| Error::structural("named window without a specification", node.span))?;
    Ok(NamedWindow {
        name,
        spec: expression::window_spec(spec_node, depth)?,
        span: node.span,
    })
}

fn set_relation(node: &CstNode) -> Result<RelationType> {
    let set_node = node
        .find(Rule::SetType)
        .or_else(|| node.find(Rule::SetTypeOther))
        .unwrap_or(node);
    let all = set_node.has(TokenKind::All)
        || set_node
            .find(Rule::SetExpressionOption)
            .map(|n| n.has(TokenKind::All))
            .unwrap_or(false);
    if set_node.has(TokenKind::Union) {
        return Ok(if all { RelationType::UnionAll } else { RelationType::Union });
    }
    if set_node.has(TokenKind::Except) {
        return Ok(if all { RelationType::ExceptAll } else { RelationType::Except });
    }
    if set_node.has(TokenKind::Intersect) {
        return Ok(if all { RelationType::IntersectAll } else { RelationType::Intersect });
    }
    if set_node.has(TokenKind::MinusSet) {
        return Ok(RelationType::Minus);
    }
    Err(Error::structural("set operation without an operator", node.span))
}

fn clause_set(node: &CstNode, depth: Depth) -> Result<SelectBody> {
    let left_node = node
        .find(Rule::SelectClauseSetLeft)
        .or_else(|| node.find(Rule::SelectClauseSet))
        .ok_or_else(|| Error::structural("set operation without a left side", node.span))?;
    let right_node = node
        .find(Rule::SelectClauseSetRight)
        .ok_or_else(|| Error::structural("set operation without a right side", node.span))?;
    let relation = set_relation(node)?;
    let mut left = build_select(left_node, depth)?;
    let right = build_select(right_node, depth)?;
    left.attach_related(relation, right);
    Ok(left)
}

fn values_clause(node: &CstNode, depth: Depth) -> Result<SelectBody> {
    let list = node.find(Rule::ValuesRowList).unwrap_or(node);
    let mut rows = Vec::new();
    for row_node in list.find_all(Rule::RowValue) {
        rows.push(row_values(row_node, depth)?);
    }
    if rows.is_empty() {
        return Err(Error::structural("VALUES without rows", node.span));
    }
    Ok(SelectBody {
        values: rows,
        span: node.span,
        ..SelectBody::default()
    })
}

/// One `VALUES` row: each slot an expression or the DEFAULT keyword.
pub(crate) fn row_values(node: &CstNode, depth: Depth) -> Result<Vec<crate::ast::Expression>> {
    let body = node.find(Rule::InsertVals).unwrap_or(node);
    let mut out = Vec::new();
    for child in body.children.iter() {
        let CstChild::Node(child) = child else { continue };
        match child.rule {
            Rule::InsertVals => out.extend(row_values(child, depth)?),
            Rule::ExprList => out.extend(expression::expr_list(child, depth)?),
            _ => out.push(expression::expr(child, depth)?),
        }
    }
    Ok(out)
}

fn projection(node: &CstNode, depth: Depth) -> Result<Projection> {
    if node.has(TokenKind::Star) && first_node(node).is_none() {
        let mut p = Projection::star();
        p.span = node.span;
        return Ok(p);
    }
    let expr_node = first_node(node)
        .ok_or_else(|| Error::structural("projection without an expression", node.span))?;
    let label = node
        .find(Rule::ColumnLabel)
        .map(|n| n.text())
        .or_else(|| node.token_text(TokenKind::Identifier).map(str::to_string))
        .or_else(|| node.token_text(TokenKind::StringValue).map(str::to_string));
    let mut p = Projection::new(expression::expr(expr_node, depth)?, label);
    p.span = node.span;
    Ok(p)
}

fn with_clause(node: &CstNode, depth: Depth) -> Result<(Vec<WithTable>, bool)> {
    let recursive = node.has(TokenKind::Recursive);
    let list = node.find(Rule::WithList).unwrap_or(node);
    let mut tables = Vec::new();
    for cte in list.find_all(Rule::CommonTableExpr) {
        let name = cte
            .token_text(TokenKind::Identifier)
            .ok_or_else(|| Error::structural("common table expression without a name", cte.span))?
            .to_string();
        let columns = cte
            .find(Rule::NameList)
            .or_else(|| cte.find(Rule::AliasNameList))
            .map(identifier::name_list)
            .transpose()?
            .unwrap_or_default();
        let select_node = cte
            .find(Rule::SelectWithParens)
            .or_else(|| cte.find(Rule::SelectNoParens))
            .ok_or_else(|| Error::structural("common table expression without a body", cte.span))?;
        tables.push(WithTable {
            name,
            columns,
            select: build_select(select_node, depth)?,
            span: cte.span,
        });
    }
    if tables.is_empty() {
        return Err(Error::structural("WITH clause without tables", node.span));
    }
    Ok((tables, recursive))
}

/// Build an ORDER BY clause; also used by ordered-set aggregates.
pub(crate) fn build_order_by(node: &CstNode, depth: Depth) -> Result<OrderBy> {
    let list = node.find(Rule::SortList).unwrap_or(node);
    let mut sort_keys = Vec::new();
    for key in list.find_all(Rule::SortKey) {
        let operand = first_node(key)
            .ok_or_else(|| Error::structural("sort key without an expression", key.span))?;
        let direction = if key.has(TokenKind::Desc) {
            Some(SortDirection::Desc)
        } else if key.has(TokenKind::Asc) {
            Some(SortDirection::Asc)
        } else {
            None
        };
        let mut sort_key = SortKey::new(expression::expr(operand, depth)?, direction);
        sort_key.span = key.span;
        sort_keys.push(sort_key);
    }
    if sort_keys.is_empty() {
        return Err(Error::structural("ORDER BY without sort keys", node.span));
    }
    Ok(OrderBy { sort_keys, span: node.span })
}

/// Build a LIMIT clause. `LIMIT a, b` reads offset-then-count while
/// `LIMIT b OFFSET a` reads count-then-offset.
pub(crate) fn build_limit(node: &CstNode, depth: Depth) -> Result<Limit> {
    let mut operands = Vec::new();
    for child in node.find_all(Rule::LimitExpr) {
        let value = match first_node(child) {
            Some(n) => expression::expr(n, depth)?,
            None => {
                let token = child
                    .token(TokenKind::IntNum)
                    .or_else(|| child.token(TokenKind::UserVariable))
                    .ok_or_else(|| Error::structural("limit operand without a value", child.span))?;
                crate::ast::Expression::literal(token.text.clone())
            }
        };
        operands.push(value);
    }
    let mut operands = operands.into_iter();
    let limit = match (operands.next(), operands.next()) {
        (Some(count), None) => Limit {
            limit: Some(count),
            offset: None,
            span: node.span,
        },
        (Some(first), Some(second)) if node.has(TokenKind::Offset) => Limit {
            limit: Some(first),
            offset: Some(second),
            span: node.span,
        },
        (Some(first), Some(second)) => Limit {
            limit: Some(second),
            offset: Some(first),
            span: node.span,
        },
        _ => return Err(Error::structural("LIMIT without operands", node.span)),
    };
    Ok(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expression;

    fn bit(text: &str) -> CstNode {
        CstNode::new(Rule::BitExpr).with_node(
            CstNode::new(Rule::SimpleExpr).with_node(
                CstNode::new(Rule::Literal).with_token(TokenKind::IntNum, text),
            ),
        )
    }

    fn expr_of(text: &str) -> CstNode {
        CstNode::new(Rule::Expr).with_node(
            CstNode::new(Rule::BoolPri).with_node(
                CstNode::new(Rule::Predicate).with_node(bit(text)),
            ),
        )
    }

    fn projection_of(text: &str) -> CstNode {
        CstNode::new(Rule::Projection).with_node(expr_of(text))
    }

    fn simple_select_node(marker: &str) -> CstNode {
        CstNode::new(Rule::SimpleSelect).with_node(
            CstNode::new(Rule::SelectExprList).with_node(projection_of(marker)),
        )
    }

    fn first_projection_text(body: &SelectBody) -> &str {
        match body.projections[0].expr.as_ref().unwrap() {
            Expression::Const(c) => &c.value,
            other => panic!("expected literal projection, got {other:?}"),
        }
    }

    #[test]
    fn where_and_having_fill_their_slots_in_order() {
        let node = simple_select_node("1")
            .with_token(TokenKind::Where, "WHERE")
            .with_node(expr_of("10"))
            .with_token(TokenKind::Having, "HAVING")
            .with_node(expr_of("20"));
        let body = build_select_body(&node).unwrap();
        match (body.where_clause.unwrap(), body.having.unwrap()) {
            (Expression::Const(w), Expression::Const(h)) => {
                assert_eq!(w.value, "10");
                assert_eq!(h.value, "20");
            }
            other => panic!("expected literals, got {other:?}"),
        }
    }

    #[test]
    fn lone_expression_follows_the_having_keyword() {
        let node = simple_select_node("1")
            .with_token(TokenKind::Having, "HAVING")
            .with_node(expr_of("20"));
        let body = build_select_body(&node).unwrap();
        assert!(body.where_clause.is_none());
        assert!(body.having.is_some());
    }

    #[test]
    fn chained_unions_read_left_to_right() {
        let inner = CstNode::new(Rule::SelectClauseSet)
            .with_node(CstNode::new(Rule::SelectClauseSetLeft).with_node(simple_select_node("a")))
            .with_node(CstNode::new(Rule::SetType).with_token(TokenKind::Union, "UNION"))
            .with_node(CstNode::new(Rule::SelectClauseSetRight).with_node(simple_select_node("b")));
        let node = CstNode::new(Rule::SelectClauseSet)
            .with_node(CstNode::new(Rule::SelectClauseSetLeft).with_node(inner))
            .with_node(
                CstNode::new(Rule::SetType)
                    .with_token(TokenKind::Union, "UNION")
                    .with_token(TokenKind::All, "ALL"),
            )
            .with_node(CstNode::new(Rule::SelectClauseSetRight).with_node(simple_select_node("c")));
        let body = build_select_body(&node).unwrap();
        assert_eq!(first_projection_text(&body), "a");
        let second = body.related.as_ref().unwrap();
        assert_eq!(second.relation, RelationType::Union);
        assert_eq!(first_projection_text(&second.select), "b");
        let third = second.select.related.as_ref().unwrap();
        assert_eq!(third.relation, RelationType::UnionAll);
        assert_eq!(first_projection_text(&third.select), "c");
        assert!(third.select.related.is_none());
    }

    #[test]
    fn trailing_order_by_attaches_to_the_last_set_operand() {
        let set = CstNode::new(Rule::SelectClauseSet)
            .with_node(CstNode::new(Rule::SelectClauseSetLeft).with_node(simple_select_node("a")))
            .with_node(CstNode::new(Rule::SetType).with_token(TokenKind::Union, "UNION"))
            .with_node(CstNode::new(Rule::SelectClauseSetRight).with_node(simple_select_node("b")));
        let node = CstNode::new(Rule::SelectNoParens)
            .with_node(set)
            .with_node(
                CstNode::new(Rule::OrderBy).with_node(
                    CstNode::new(Rule::SortList).with_node(
                        CstNode::new(Rule::SortKey)
                            .with_node(expr_of("1"))
                            .with_token(TokenKind::Desc, "DESC"),
                    ),
                ),
            );
        let body = build_select_body(&node).unwrap();
        assert!(body.order_by.is_none());
        let last = body.related.as_ref().unwrap();
        let order = last.select.order_by.as_ref().unwrap();
        assert_eq!(order.sort_keys[0].direction, Some(SortDirection::Desc));
    }

    #[test]
    fn comma_limit_reads_offset_then_count() {
        let node = CstNode::new(Rule::LimitClause)
            .with_node(CstNode::new(Rule::LimitExpr).with_token(TokenKind::IntNum, "5"))
            .with_token(TokenKind::Comma, ",")
            .with_node(CstNode::new(Rule::LimitExpr).with_token(TokenKind::IntNum, "10"));
        let limit = build_limit(&node, Depth::default()).unwrap();
        match (limit.limit.unwrap(), limit.offset.unwrap()) {
            (Expression::Const(count), Expression::Const(offset)) => {
                assert_eq!(count.value, "10");
                assert_eq!(offset.value, "5");
            }
            other => panic!("expected literals, got {other:?}"),
        }
    }

    #[test]
    fn offset_keyword_limit_reads_count_then_offset() {
        let node = CstNode::new(Rule::LimitClause)
            .with_node(CstNode::new(Rule::LimitExpr).with_token(TokenKind::IntNum, "10"))
            .with_token(TokenKind::Offset, "OFFSET")
            .with_node(CstNode::new(Rule::LimitExpr).with_token(TokenKind::IntNum, "5"));
        let limit = build_limit(&node, Depth::default()).unwrap();
        match (limit.limit.unwrap(), limit.offset.unwrap()) {
            (Expression::Const(count), Expression::Const(offset)) => {
                assert_eq!(count.value, "10");
                assert_eq!(offset.value, "5");
            }
            other => panic!("expected literals, got {other:?}"),
        }
    }

    #[test]
    fn values_rows_build_in_source_order() {
        let row = |a: &str, b: &str| {
            CstNode::new(Rule::RowValue).with_node(
                CstNode::new(Rule::InsertVals)
                    .with_node(expr_of(a))
                    .with_node(expr_of(b)),
            )
        };
        let node = CstNode::new(Rule::TableValuesClause).with_node(
            CstNode::new(Rule::ValuesRowList)
                .with_node(row("1", "2"))
                .with_node(row("3", "4")),
        );
        let body = build_select_body(&node).unwrap();
        assert_eq!(body.values.len(), 2);
        assert_eq!(body.values[1].len(), 2);
    }

    #[test]
    fn with_clause_lands_on_the_top_body() {
        let cte = CstNode::new(Rule::CommonTableExpr)
            .with_token(TokenKind::Identifier, "t")
            .with_node(
                CstNode::new(Rule::SelectWithParens).with_node(simple_select_node("1")),
            );
        let node = CstNode::new(Rule::SelectNoParens)
            .with_node(
                CstNode::new(Rule::WithClause)
                    .with_token(TokenKind::Recursive, "RECURSIVE")
                    .with_node(CstNode::new(Rule::WithList).with_node(cte)),
            )
            .with_node(simple_select_node("2"));
        let body = build_select_body(&node).unwrap();
        assert!(body.recursive);
        assert_eq!(body.with.len(), 1);
        assert_eq!(body.with[0].name, "t");
    }
}
