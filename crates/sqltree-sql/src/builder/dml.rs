//! INSERT, UPDATE and DELETE builders.

use crate::ast::dml::{Assignment, Delete, Insert, RelationWithStar, Update};
use crate::ast::select::PartitionUsage;
use crate::builder::{expression, from_reference, identifier, select, Depth};
use crate::cst::{CstChild, CstNode, Rule, TokenKind};
use crate::error::{Error, Result};
use tracing::debug;

pub(crate) fn build_insert(node: &CstNode, depth: Depth) -> Result<Insert> {
    debug!("building INSERT");
    let depth = depth.descend(node.span)?;
    let body = node.find(Rule::SingleTableInsert).unwrap_or(node);

    let table_clause = body.find(Rule::InsertTableClause).unwrap_or(body);
    let factor_node = table_clause
        .find(Rule::RelationFactor)
        .or_else(|| table_clause.find(Rule::NormalRelationFactor))
        .ok_or_else(|| Error::structural("INSERT without a target table", node.span))?;
    let mut insert = Insert::new(identifier::relation_factor(factor_node)?);
    insert.replace = node.has(TokenKind::Replace);
    insert.ignore = node.has(TokenKind::Ignore) || body.has(TokenKind::Ignore);

    if let Some(partition_node) = table_clause.find(Rule::UsePartition) {
        let names = partition_node
            .find(Rule::NameList)
            .map(identifier::name_list)
            .transpose()?
            .unwrap_or_default();
        insert.partition_usage = Some(PartitionUsage {
            names,
            span: partition_node.span,
        });
    }
    if let Some(columns_node) = table_clause.find(Rule::ColumnList) {
        insert.columns = identifier::column_list(columns_node)?;
    }

    if let Some(values_node) = body.find(Rule::ValuesClause) {
        if let Some(select_node) = values_node
            .find(Rule::SelectNoParens)
            .or_else(|| values_node.find(Rule::SelectWithParens))
        {
            insert.select = Some(select::build_select(select_node, depth)?);
        } else {
            let list = values_node.find(Rule::ValuesRowList).unwrap_or(values_node);
            for row_node in list.find_all(Rule::RowValue) {
                insert.rows.push(select::row_values(row_node, depth)?);
            }
            for row_node in list.find_all(Rule::InsertVals) {
                insert.rows.push(select::row_values(row_node, depth)?);
            }
            if insert.rows.is_empty() {
                return Err(Error::structural("VALUES clause without rows", values_node.span));
            }
        }
    } else if let Some(select_node) = body
        .find(Rule::SelectNoParens)
        .or_else(|| body.find(Rule::SelectWithParens))
    {
        insert.select = Some(select::build_select(select_node, depth)?);
    }

    // With ON DUPLICATE KEY UPDATE present, the final assignment list is
    // the duplicate handler; an earlier one is the `INSERT ... SET` form.
    let mut assignment_lists = body.find_all(Rule::UpdateAsgnList);
    if !std::ptr::eq(body, node) {
        assignment_lists.extend(node.find_all(Rule::UpdateAsgnList));
    }
    let has_duplicate = node.has(TokenKind::Duplicate) || body.has(TokenKind::Duplicate);
    if has_duplicate {
        let last = assignment_lists
            .pop()
            .ok_or_else(|| Error::structural("ON DUPLICATE KEY UPDATE without assignments", node.span))?;
        insert.on_duplicate = assignment_list(last, depth)?;
    }
    if let Some(first) = assignment_lists.first() {
        insert.assignments = assignment_list(first, depth)?;
    }

    if insert.rows.is_empty() && insert.select.is_none() && insert.assignments.is_empty() {
        return Err(Error::structural("INSERT without a value source", node.span));
    }

    insert.span = node.span;
    Ok(insert)
}

/// Flatten an `update_asgn_list` into source order.
fn assignment_list(node: &CstNode, depth: Depth) -> Result<Vec<Assignment>> {
    let mut out = Vec::new();
    for child in node.children.iter() {
        let CstChild::Node(child) = child else { continue };
        match child.rule {
            Rule::UpdateAsgnList => out.extend(assignment_list(child, depth)?),
            Rule::UpdateAsgnFactor => out.push(assignment(child, depth)?),
            _ => {}
        }
    }
    if out.is_empty() {
        return Err(Error::structural("empty assignment list", node.span));
    }
    Ok(out)
}

fn assignment(node: &CstNode, depth: Depth) -> Result<Assignment> {
    let column_node = node
        .find(Rule::ColumnRef)
        .or_else(|| node.find(Rule::ColumnDefinitionRef))
        .ok_or_else(|| Error::structural("assignment without a column", node.span))?;
    let value_node = node
        .find(Rule::ExprOrDefault)
        .or_else(|| node.find(Rule::Expr))
        .ok_or_else(|| Error::structural("assignment without a value", node.span))?;
    let mut out = Assignment::new(
        identifier::column_ref(column_node)?,
        expression::expr(value_node, depth)?,
    );
    out.span = node.span;
    Ok(out)
}

pub(crate) fn build_update(node: &CstNode, depth: Depth) -> Result<Update> {
    debug!("building UPDATE");
    let depth = depth.descend(node.span)?;
    let tables_node = node
        .find(Rule::TableReferences)
        .or_else(|| node.find(Rule::FromList))
        .ok_or_else(|| Error::structural("UPDATE without target tables", node.span))?;
    let assignments_node = node
        .find(Rule::UpdateAsgnList)
        .ok_or_else(|| Error::structural("UPDATE without assignments", node.span))?;

    let where_clause = if node.has(TokenKind::Where) {
        let condition = node
            .find(Rule::Expr)
            .ok_or_else(|| Error::structural("WHERE keyword without its expression", node.span))?;
        Some(expression::expr(condition, depth)?)
    } else {
        None
    };

    Ok(Update {
        tables: from_reference::table_references(tables_node, depth)?,
        assignments: assignment_list(assignments_node, depth)?,
        where_clause,
        order_by: node
            .find(Rule::OrderBy)
            .map(|n| select::build_order_by(n, depth))
            .transpose()?,
        limit: node
            .find(Rule::LimitClause)
            .map(|n| select::build_limit(n, depth))
            .transpose()?,
        ignore: node.has(TokenKind::Ignore),
        span: node.span,
    })
}

pub(crate) fn build_delete(node: &CstNode, depth: Depth) -> Result<Delete> {
    debug!("building DELETE");
    let depth = depth.descend(node.span)?;
    let mut delete = Delete {
        targets: Vec::new(),
        froms: Vec::new(),
        where_clause: None,
        order_by: None,
        limit: None,
        span: node.span,
    };

    if let Some(multi) = node.find(Rule::MultiDeleteTable) {
        let targets_node = multi
            .find(Rule::RelationWithStarList)
            .ok_or_else(|| Error::structural("multi-table DELETE without targets", multi.span))?;
        delete.targets = relation_with_star_list(targets_node)?;
        let froms_node = multi
            .find(Rule::TableReferences)
            .or_else(|| node.find(Rule::TableReferences))
            .ok_or_else(|| Error::structural("multi-table DELETE without a FROM list", multi.span))?;
        delete.froms = from_reference::table_references(froms_node, depth)?;
    } else {
        let from_node = node
            .find(Rule::TableFactor)
            .or_else(|| node.find(Rule::TblName))
            .or_else(|| node.find(Rule::TableReferences))
            .ok_or_else(|| Error::structural("DELETE without a table", node.span))?;
        delete.froms = match from_node.rule {
            Rule::TableReferences => from_reference::table_references(from_node, depth)?,
            _ => vec![from_reference::from_reference(from_node, depth)?],
        };
    }

    if node.has(TokenKind::Where) {
        let condition = node
            .find(Rule::Expr)
            .ok_or_else(|| Error::structural("WHERE keyword without its expression", node.span))?;
        delete.where_clause = Some(expression::expr(condition, depth)?);
    }
    delete.order_by = node
        .find(Rule::OrderBy)
        .map(|n| select::build_order_by(n, depth))
        .transpose()?;
    delete.limit = node
        .find(Rule::LimitClause)
        .map(|n| select::build_limit(n, depth))
        .transpose()?;

    Ok(delete)
}

fn relation_with_star_list(node: &CstNode) -> Result<Vec<RelationWithStar>> {
    let mut out = Vec::new();
    for child in node.children.iter() {
        let CstChild::Node(child) = child else { continue };
        match child.rule {
            Rule::RelationWithStarList => out.extend(relation_with_star_list(child)?),
            Rule::RelationWithStar => {
                let factor_node = child
                    .find(Rule::RelationFactor)
                    .or_else(|| child.find(Rule::NormalRelationFactor))
                    .ok_or_else(|| {
                        Error::structural("delete target without a relation", child.span)
                    })?;
                let mut target = RelationWithStar::new(
                    identifier::relation_factor(factor_node)?,
                    child.has(TokenKind::Star),
                );
                target.span = child.span;
                out.push(target);
            }
            _ => {}
        }
    }
    if out.is_empty() {
        return Err(Error::structural("empty delete target list", node.span));
    }
    Ok(out)
}
