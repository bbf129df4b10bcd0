//! DDL statement composers.
//!
//! These are thin relative to the element builders they call: each one
//! locates the clause productions on the statement node and hands them
//! to the column, constraint, index and partition builders.

use crate::ast::alter_table::{AlterTable, AlterTableAction, AlterTableActionKind};
use crate::ast::common::RelationFactor;
use crate::ast::create_table::{CreateTable, TableElement};
use crate::ast::ddl::{
    CreateIndex, CreateMaterializedView, DropBehavior, DropIndex, DropTable,
    MaterializedViewRefresh, RefreshInterval, RefreshMode, RefreshOn, RenameAction, RenameTable,
    TruncateTable,
};
use crate::builder::{expression, identifier, partition, select, table_element, Depth};
use crate::cst::{CstChild, CstNode, Rule, TokenKind};
use crate::error::{Error, Result};
use tracing::debug;

fn first_node(node: &CstNode) -> Option<&CstNode> {
    node.children.iter().find_map(|c| match c {
        CstChild::Node(n) => Some(n),
        _ => None,
    })
}

fn relation_factors(node: &CstNode) -> Vec<&CstNode> {
    node.children
        .iter()
        .filter_map(|c| match c {
            CstChild::Node(n)
                if matches!(n.rule, Rule::RelationFactor | Rule::NormalRelationFactor) =>
            {
                Some(n)
            }
            _ => None,
        })
        .collect()
}

fn required_relation(node: &CstNode, what: &str) -> Result<RelationFactor> {
    let factor = node
        .find(Rule::RelationFactor)
        .or_else(|| node.find(Rule::NormalRelationFactor))
        .ok_or_else(|| Error::structural(format!("{what} without a table name"), node.span))?;
    identifier::relation_factor(factor)
}

fn select_child<'a>(node: &'a CstNode) -> Option<&'a CstNode> {
    node.find(Rule::SelectWithParens)
        .or_else(|| node.find(Rule::SelectNoParens))
        .or_else(|| node.find(Rule::SelectClause))
        .or_else(|| node.find(Rule::SelectClauseSet))
        .or_else(|| node.find(Rule::SimpleSelect))
        .or_else(|| node.find(Rule::NoTableSelect))
}

pub(crate) fn build_create_table(node: &CstNode, depth: Depth) -> Result<CreateTable> {
    debug!(?node.span, "building CREATE TABLE");
    let depth = depth.descend(node.span)?;
    let factors = relation_factors(node);
    let table = factors
        .first()
        .map(|n| identifier::relation_factor(n))
        .transpose()?
        .ok_or_else(|| Error::structural("CREATE TABLE without a table name", node.span))?;

    let mut statement = CreateTable::new(table);
    statement.temporary = node.has(TokenKind::Temporary);
    statement.if_not_exists = node.has(TokenKind::If);

    if let Some(list) = node.find(Rule::TableElementList) {
        statement.elements = table_element_list(list, depth)?;
    }
    if let Some(options) = node.find(Rule::TableOptionList) {
        statement.table_options = Some(table_element::table_option_list(options)?);
    }
    if let Some(option) = node.find(Rule::PartitionOption) {
        statement.partition = Some(partition::partition_option(option, depth)?);
    }
    if let Some(groups) = node.find(Rule::WithColumnGroup) {
        statement.column_groups = table_element::column_group_elements(groups)?;
    }
    if let Some(query) = select_child(node) {
        statement.as_select = Some(select::build_select(query, depth)?);
    }
    if node.has(TokenKind::Like) {
        statement.like_table = factors
            .get(1)
            .map(|n| identifier::relation_factor(n))
            .transpose()?;
        if statement.like_table.is_none() {
            return Err(Error::structural("LIKE without a source table", node.span));
        }
    }
    statement.span = node.span;
    Ok(statement)
}

fn table_element_list(node: &CstNode, depth: Depth) -> Result<Vec<TableElement>> {
    let mut out = Vec::new();
    for child in node.children.iter() {
        let CstChild::Node(child) = child else { continue };
        match child.rule {
            Rule::TableElementList => out.extend(table_element_list(child, depth)?),
            _ => out.push(table_element::table_element(child, depth)?),
        }
    }
    if out.is_empty() {
        return Err(Error::structural("empty table element list", node.span));
    }
    Ok(out)
}

pub(crate) fn build_alter_table(node: &CstNode, depth: Depth) -> Result<AlterTable> {
    debug!(?node.span, "building ALTER TABLE");
    let depth = depth.descend(node.span)?;
    let table = required_relation(node, "ALTER TABLE")?;
    let mut actions = Vec::new();
    for action in node.find_all(Rule::AlterTableAction) {
        actions.push(alter_table_action(action, depth)?);
    }
    if actions.is_empty() {
        return Err(Error::structural("ALTER TABLE without actions", node.span));
    }
    Ok(AlterTable {
        table,
        actions,
        span: node.span,
    })
}

fn alter_table_action(node: &CstNode, depth: Depth) -> Result<AlterTableAction> {
    let body = first_node(node).filter(|n| {
        matches!(
            n.rule,
            Rule::AlterColumnOption
                | Rule::AlterIndexOption
                | Rule::AlterConstraintOption
                | Rule::AlterPartitionOption
                | Rule::AlterColumnGroupOption
                | Rule::RenameTableAction
                | Rule::TableOptionList
        )
    });
    let body = body.unwrap_or(node);
    let kind = match body.rule {
        Rule::AlterColumnOption => alter_column_option(body, depth)?,
        Rule::AlterIndexOption => alter_index_option(body, depth)?,
        Rule::AlterConstraintOption => alter_constraint_option(body, depth)?,
        Rule::AlterPartitionOption => alter_partition_option(body, depth)?,
        Rule::TableOptionList => {
            AlterTableActionKind::SetTableOptions(table_element::table_option_list(body)?)
        }
        Rule::RenameTableAction => {
            AlterTableActionKind::RenameTo(required_relation(body, "RENAME")?)
        }
        Rule::AlterColumnGroupOption => {
            return Err(Error::unsupported(
                "altering column groups is not supported",
                body.span,
            ))
        }
        _ if body.has(TokenKind::Rename) => {
            AlterTableActionKind::RenameTo(required_relation(body, "RENAME")?)
        }
        _ => {
            return Err(Error::structural(
                "alter action with no recognized alternative",
                node.span,
            ))
        }
    };
    Ok(AlterTableAction {
        kind,
        span: node.span,
    })
}

fn column_name_of(node: &CstNode) -> Result<String> {
    if let Some(reference) = node
        .find(Rule::ColumnDefinitionRef)
        .or_else(|| node.find(Rule::ColumnRef))
        .or_else(|| node.find(Rule::ColumnName))
    {
        if reference.rule == Rule::ColumnName {
            return reference
                .token_text(TokenKind::Identifier)
                .map(str::to_string)
                .ok_or_else(|| Error::structural("column name without an identifier", reference.span));
        }
        return Ok(identifier::column_ref(reference)?.column);
    }
    node.token_text(TokenKind::Identifier)
        .map(str::to_string)
        .ok_or_else(|| Error::structural("action without a column name", node.span))
}

fn drop_behavior(node: &CstNode) -> Option<DropBehavior> {
    if node.has(TokenKind::Cascade) {
        Some(DropBehavior::Cascade)
    } else if node.has(TokenKind::Restrict) {
        Some(DropBehavior::Restrict)
    } else {
        None
    }
}

fn alter_column_option(node: &CstNode, depth: Depth) -> Result<AlterTableActionKind> {
    if node.has(TokenKind::Add) {
        let mut definitions = Vec::new();
        if let Some(list) = node.find(Rule::ColumnDefinitionList) {
            for definition in list.find_all(Rule::ColumnDefinition) {
                definitions.push(table_element::column_definition(definition, depth)?);
            }
        } else if let Some(definition) = node.find(Rule::ColumnDefinition) {
            definitions.push(table_element::column_definition(definition, depth)?);
        }
        if definitions.is_empty() {
            return Err(Error::structural("ADD COLUMN without definitions", node.span));
        }
        return Ok(AlterTableActionKind::AddColumns(definitions));
    }
    if node.has(TokenKind::Drop) {
        return Ok(AlterTableActionKind::DropColumn {
            column: column_name_of(node)?,
            behavior: drop_behavior(node),
        });
    }
    if node.has(TokenKind::Modify) {
        let definition = node
            .find(Rule::ColumnDefinition)
            .ok_or_else(|| Error::structural("MODIFY without a column definition", node.span))?;
        return Ok(AlterTableActionKind::ModifyColumn(
            table_element::column_definition(definition, depth)?,
        ));
    }
    if node.has(TokenKind::Change) {
        let definition = node
            .find(Rule::ColumnDefinition)
            .ok_or_else(|| Error::structural("CHANGE without a column definition", node.span))?;
        return Ok(AlterTableActionKind::ChangeColumn {
            old_name: column_name_of(node)?,
            definition: table_element::column_definition(definition, depth)?,
        });
    }
    if node.has(TokenKind::Rename) {
        let names: Vec<&str> = node
            .tokens(TokenKind::Identifier)
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        if let [from, to] = names.as_slice() {
            return Ok(AlterTableActionKind::RenameColumn {
                from: (*from).to_string(),
                to: (*to).to_string(),
            });
        }
        return Err(Error::structural("RENAME COLUMN without both names", node.span));
    }
    if let Some(behavior) = node.find(Rule::AlterColumnBehavior) {
        let column = column_name_of(node)?;
        if behavior.has(TokenKind::Drop) {
            return Ok(AlterTableActionKind::AlterColumnDropDefault { column });
        }
        let value = first_node(behavior)
            .ok_or_else(|| Error::structural("SET DEFAULT without a value", behavior.span))?;
        return Ok(AlterTableActionKind::AlterColumnSetDefault {
            column,
            default_value: expression::expr(value, depth)?,
        });
    }
    Err(Error::structural(
        "column action with no recognized alternative",
        node.span,
    ))
}

fn index_name_of(node: &CstNode) -> Result<String> {
    node.find(Rule::IndexName)
        .map(|n| n.text())
        .or_else(|| node.token_text(TokenKind::Identifier).map(str::to_string))
        .ok_or_else(|| Error::structural("action without an index name", node.span))
}

fn alter_index_option(node: &CstNode, depth: Depth) -> Result<AlterTableActionKind> {
    if node.has(TokenKind::Primary) && node.has(TokenKind::Drop) {
        return Ok(AlterTableActionKind::DropPrimaryKey);
    }
    if node.has(TokenKind::Add) {
        if let Some(index) = node.find(Rule::OutOfLineIndex) {
            return Ok(AlterTableActionKind::AddIndex(
                table_element::out_of_line_index(index, depth)?,
            ));
        }
        if let Some(constraint) = node
            .find(Rule::OutOfLinePrimaryIndex)
            .or_else(|| node.find(Rule::OutOfLineUniqueIndex))
            .or_else(|| node.find(Rule::OutOfLineConstraint))
        {
            return Ok(AlterTableActionKind::AddConstraint(
                table_element::out_of_line_constraint(constraint, depth)?,
            ));
        }
        return Err(Error::structural("ADD without an index definition", node.span));
    }
    if node.has(TokenKind::Drop) {
        return Ok(AlterTableActionKind::DropIndex {
            name: index_name_of(node)?,
        });
    }
    if node.has(TokenKind::Rename) {
        let names: Vec<String> = node
            .find_all(Rule::IndexName)
            .into_iter()
            .map(|n| n.text())
            .collect();
        if let [from, to] = names.as_slice() {
            return Ok(AlterTableActionKind::RenameIndex {
                from: from.clone(),
                to: to.clone(),
            });
        }
        return Err(Error::structural("RENAME INDEX without both names", node.span));
    }
    if node.has(TokenKind::Visible) || node.has(TokenKind::Invisible) {
        return Ok(AlterTableActionKind::AlterIndexVisibility {
            name: index_name_of(node)?,
            visible: node.has(TokenKind::Visible),
        });
    }
    Err(Error::structural(
        "index action with no recognized alternative",
        node.span,
    ))
}

fn alter_constraint_option(node: &CstNode, depth: Depth) -> Result<AlterTableActionKind> {
    if node.has(TokenKind::Add) {
        let constraint = first_node(node)
            .ok_or_else(|| Error::structural("ADD CONSTRAINT without a definition", node.span))?;
        return Ok(AlterTableActionKind::AddConstraint(
            table_element::out_of_line_constraint(constraint, depth)?,
        ));
    }
    if node.has(TokenKind::Foreign) {
        let name = node
            .find(Rule::IndexName)
            .map(|n| n.text())
            .or_else(|| node.token_text(TokenKind::Identifier).map(str::to_string))
            .ok_or_else(|| Error::structural("DROP FOREIGN KEY without a name", node.span))?;
        return Ok(AlterTableActionKind::DropForeignKey { name });
    }
    if node.has(TokenKind::Drop) {
        let names = match node.find(Rule::NameList) {
            Some(list) => identifier::name_list(list)?,
            None => node
                .token_text(TokenKind::Identifier)
                .map(|n| vec![n.to_string()])
                .unwrap_or_default(),
        };
        if names.is_empty() {
            return Err(Error::structural("DROP CONSTRAINT without names", node.span));
        }
        return Ok(AlterTableActionKind::DropConstraint { names });
    }
    Err(Error::structural(
        "constraint action with no recognized alternative",
        node.span,
    ))
}

fn alter_partition_option(node: &CstNode, depth: Depth) -> Result<AlterTableActionKind> {
    if node.has(TokenKind::Add) {
        for list_rule in [
            Rule::HashPartitionList,
            Rule::RangePartitionList,
            Rule::ListPartitionList,
        ] {
            if let Some(list) = node.find(list_rule) {
                return Ok(AlterTableActionKind::AddPartition(partition::partition_list(
                    list, depth,
                )?));
            }
        }
        return Err(Error::structural("ADD PARTITION without definitions", node.span));
    }
    let names = match node.find(Rule::NameList) {
        Some(list) => identifier::name_list(list)?,
        None => node
            .tokens(TokenKind::Identifier)
            .iter()
            .map(|t| t.text.clone())
            .collect(),
    };
    if names.is_empty() {
        return Err(Error::structural("partition action without names", node.span));
    }
    if node.has(TokenKind::Drop) {
        return Ok(AlterTableActionKind::DropPartition(names));
    }
    if node.has(TokenKind::Truncate) {
        return Ok(AlterTableActionKind::TruncatePartition(names));
    }
    Err(Error::structural(
        "partition action with no recognized alternative",
        node.span,
    ))
}

pub(crate) fn build_drop_table(node: &CstNode) -> Result<DropTable> {
    let list = node.find(Rule::TableList).unwrap_or(node);
    let mut tables = Vec::new();
    for factor in relation_factors(list) {
        tables.push(identifier::relation_factor(factor)?);
    }
    if tables.is_empty() {
        return Err(Error::structural("DROP TABLE without tables", node.span));
    }
    Ok(DropTable {
        tables,
        temporary: node.has(TokenKind::Temporary),
        if_exists: node.has(TokenKind::If),
        behavior: drop_behavior(node),
        materialized: node.has(TokenKind::Materialized),
        span: node.span,
    })
}

pub(crate) fn build_rename_table(node: &CstNode) -> Result<RenameTable> {
    let mut actions = Vec::new();
    for action in node.find_all(Rule::RenameTableAction) {
        let factors = relation_factors(action);
        let [from, to] = factors.as_slice() else {
            return Err(Error::structural(
                "rename action without both table names",
                action.span,
            ));
        };
        actions.push(RenameAction {
            from: identifier::relation_factor(from)?,
            to: identifier::relation_factor(to)?,
            span: action.span,
        });
    }
    if actions.is_empty() {
        return Err(Error::structural("RENAME TABLE without actions", node.span));
    }
    Ok(RenameTable {
        actions,
        span: node.span,
    })
}

pub(crate) fn build_truncate_table(node: &CstNode) -> Result<TruncateTable> {
    Ok(TruncateTable {
        table: required_relation(node, "TRUNCATE TABLE")?,
        span: node.span,
    })
}

pub(crate) fn build_create_index(node: &CstNode, depth: Depth) -> Result<CreateIndex> {
    debug!(?node.span, "building CREATE INDEX");
    let depth = depth.descend(node.span)?;
    let index = node
        .find(Rule::IndexName)
        .map(|n| Ok(RelationFactor::bare(n.text())))
        .unwrap_or_else(|| {
            Err(Error::structural("CREATE INDEX without an index name", node.span))
        })?;
    let table = required_relation(node, "CREATE INDEX")?;
    let columns = node
        .find(Rule::SortColumnList)
        .map(|list| table_element::sort_column_list(list, depth))
        .transpose()?
        .ok_or_else(|| Error::structural("CREATE INDEX without key columns", node.span))?;
    Ok(CreateIndex {
        index,
        table,
        if_not_exists: node.has(TokenKind::If),
        unique: node.has(TokenKind::Unique),
        fulltext: node.has(TokenKind::Fulltext),
        spatial: node.has(TokenKind::Spatial),
        columns,
        index_options: table_element::index_options_of(node)?,
        partition: node
            .find(Rule::PartitionOption)
            .map(|n| partition::partition_option(n, depth))
            .transpose()?,
        span: node.span,
    })
}

pub(crate) fn build_drop_index(node: &CstNode) -> Result<DropIndex> {
    let index = node
        .find(Rule::IndexName)
        .map(|n| n.text())
        .or_else(|| node.token_text(TokenKind::Identifier).map(str::to_string))
        .ok_or_else(|| Error::structural("DROP INDEX without an index name", node.span))?;
    Ok(DropIndex {
        index: RelationFactor::bare(index),
        table: required_relation(node, "DROP INDEX")?,
        span: node.span,
    })
}

pub(crate) fn build_create_mview(node: &CstNode, depth: Depth) -> Result<CreateMaterializedView> {
    debug!(?node.span, "building CREATE MATERIALIZED VIEW");
    let depth = depth.descend(node.span)?;
    let view = required_relation(node, "CREATE MATERIALIZED VIEW")?;
    let select_node = select_child(node).ok_or_else(|| {
        Error::structural("CREATE MATERIALIZED VIEW without a query", node.span)
    })?;
    let columns = node
        .find(Rule::ColumnList)
        .map(identifier::column_list)
        .transpose()?
        .map(|cols| cols.into_iter().map(|c| c.column).collect())
        .unwrap_or_default();

    let (query_rewrite, query_computation) = mview_toggles(node);

    Ok(CreateMaterializedView {
        view,
        columns,
        table_options: node
            .find(Rule::TableOptionList)
            .map(table_element::table_option_list)
            .transpose()?,
        partition: node
            .find(Rule::PartitionOption)
            .map(|n| partition::partition_option(n, depth))
            .transpose()?,
        refresh: node
            .find(Rule::MviewRefreshClause)
            .map(refresh_clause)
            .transpose()?,
        query_rewrite,
        query_computation,
        select: select::build_select(select_node, depth)?,
        span: node.span,
    })
}

/// `ENABLE`/`DISABLE QUERY REWRITE` and `ENABLE`/`DISABLE ON QUERY
/// COMPUTATION` may both appear; the toggle keyword preceding each clause
/// decides its value.
fn mview_toggles(node: &CstNode) -> (Option<bool>, Option<bool>) {
    let mut rewrite = None;
    let mut computation = None;
    let mut enabled = None;
    for token in node.all_tokens() {
        match token.kind {
            TokenKind::Enable => enabled = Some(true),
            TokenKind::Disable => enabled = Some(false),
            TokenKind::Rewrite => rewrite = enabled,
            TokenKind::Computation => computation = enabled,
            _ => {}
        }
    }
    (rewrite, computation)
}

fn refresh_clause(node: &CstNode) -> Result<MaterializedViewRefresh> {
    let mode = if node.has(TokenKind::Never) {
        RefreshMode::Never
    } else if node.has(TokenKind::Complete) {
        RefreshMode::Complete
    } else if node.has(TokenKind::Fast) {
        RefreshMode::Fast
    } else if node.has(TokenKind::Force) {
        RefreshMode::Force
    } else {
        return Err(Error::structural("refresh clause without a mode", node.span));
    };

    let on = if node.has(TokenKind::Demand) {
        Some(RefreshOn::Demand)
    } else if node.has(TokenKind::Commit) {
        Some(RefreshOn::Commit)
    } else {
        None
    };

    let mut start_with = None;
    let mut next = None;
    if let Some(interval) = node.find(Rule::MvRefreshInterval) {
        // The start expression stays literal text; only NEXT is decomposed.
        if interval.has(TokenKind::Start) {
            let value = first_node(interval)
                .filter(|n| n.rule != Rule::DateUnit)
                .ok_or_else(|| {
                    Error::structural("START WITH without an expression", interval.span)
                })?;
            start_with = Some(value.text());
        }
        if interval.has(TokenKind::Next) {
            next = Some(refresh_interval(interval)?);
        }
    }

    Ok(MaterializedViewRefresh {
        mode,
        on,
        start_with,
        next,
        span: node.span,
    })
}

fn refresh_interval(node: &CstNode) -> Result<RefreshInterval> {
    let count = node
        .token(TokenKind::IntNum)
        .ok_or_else(|| Error::structural("NEXT interval without a count", node.span))?;
    let value = count
        .text
        .parse::<u64>()
        .map_err(|_| Error::structural(format!("invalid interval count `{}`", count.text), count.span))?;
    let unit = node
        .find(Rule::DateUnit)
        .map(|n| n.text())
        .or_else(|| node.token_text(TokenKind::Identifier).map(str::to_string))
        .ok_or_else(|| Error::structural("NEXT interval without a unit", node.span))?;
    Ok(RefreshInterval {
        value,
        unit,
        span: node.span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::create_table::OutOfLineConstraintKind;
    use crate::ast::partition::PartitionStrategy;

    fn relation(name: &str) -> CstNode {
        CstNode::new(Rule::RelationFactor).with_node(
            CstNode::new(Rule::NormalRelationFactor).with_token(TokenKind::Identifier, name),
        )
    }

    fn int_column(name: &str) -> CstNode {
        CstNode::new(Rule::ColumnDefinition)
            .with_node(
                CstNode::new(Rule::ColumnDefinitionRef).with_token(TokenKind::Identifier, name),
            )
            .with_node(
                CstNode::new(Rule::DataType).with_node(
                    CstNode::new(Rule::IntTypeI).with_token(TokenKind::Identifier, "INT"),
                ),
            )
    }

    fn simple_select() -> CstNode {
        CstNode::new(Rule::SimpleSelect).with_node(
            CstNode::new(Rule::SelectExprList).with_node(
                CstNode::new(Rule::Projection).with_node(
                    CstNode::new(Rule::Expr).with_node(
                        CstNode::new(Rule::BoolPri).with_node(
                            CstNode::new(Rule::Predicate).with_node(
                                CstNode::new(Rule::BitExpr).with_node(
                                    CstNode::new(Rule::SimpleExpr).with_node(
                                        CstNode::new(Rule::Literal)
                                            .with_token(TokenKind::IntNum, "1"),
                                    ),
                                ),
                            ),
                        ),
                    ),
                ),
            ),
        )
    }

    #[test]
    fn create_table_collects_elements_and_options() {
        let node = CstNode::new(Rule::CreateTableStmt)
            .with_token(TokenKind::If, "IF")
            .with_node(relation("t"))
            .with_node(
                CstNode::new(Rule::TableElementList)
                    .with_node(int_column("a"))
                    .with_node(int_column("b")),
            )
            .with_node(
                CstNode::new(Rule::TableOptionList).with_node(
                    CstNode::new(Rule::TableOption)
                        .with_token(TokenKind::Engine, "ENGINE")
                        .with_token(TokenKind::Identifier, "InnoDB"),
                ),
            );
        let statement = build_create_table(&node, Depth::default()).unwrap();
        assert!(statement.if_not_exists);
        assert_eq!(statement.table.relation, "t");
        assert_eq!(statement.elements.len(), 2);
        assert_eq!(
            statement.table_options.unwrap().engine.as_deref(),
            Some("InnoDB")
        );
    }

    #[test]
    fn alter_table_actions_keep_source_order() {
        let node = CstNode::new(Rule::AlterTableStmt)
            .with_node(relation("t"))
            .with_node(
                CstNode::new(Rule::AlterTableAction).with_node(
                    CstNode::new(Rule::AlterColumnOption)
                        .with_token(TokenKind::Add, "ADD")
                        .with_node(int_column("c")),
                ),
            )
            .with_node(
                CstNode::new(Rule::AlterTableAction).with_node(
                    CstNode::new(Rule::AlterColumnOption)
                        .with_token(TokenKind::Drop, "DROP")
                        .with_node(
                            CstNode::new(Rule::ColumnName).with_token(TokenKind::Identifier, "old"),
                        )
                        .with_token(TokenKind::Cascade, "CASCADE"),
                ),
            );
        let statement = build_alter_table(&node, Depth::default()).unwrap();
        assert_eq!(statement.actions.len(), 2);
        assert!(matches!(
            statement.actions[0].kind,
            AlterTableActionKind::AddColumns(ref defs) if defs.len() == 1
        ));
        match &statement.actions[1].kind {
            AlterTableActionKind::DropColumn { column, behavior } => {
                assert_eq!(column, "old");
                assert_eq!(*behavior, Some(DropBehavior::Cascade));
            }
            other => panic!("expected drop column, got {other:?}"),
        }
    }

    #[test]
    fn alter_constraint_add_builds_out_of_line() {
        let constraint = CstNode::new(Rule::OutOfLinePrimaryIndex)
            .with_token(TokenKind::Primary, "PRIMARY")
            .with_token(TokenKind::Key, "KEY")
            .with_node(
                CstNode::new(Rule::SortColumnList).with_node(
                    CstNode::new(Rule::SortColumnKey).with_token(TokenKind::Identifier, "id"),
                ),
            );
        let node = CstNode::new(Rule::AlterTableStmt)
            .with_node(relation("t"))
            .with_node(
                CstNode::new(Rule::AlterTableAction).with_node(
                    CstNode::new(Rule::AlterConstraintOption)
                        .with_token(TokenKind::Add, "ADD")
                        .with_node(constraint),
                ),
            );
        let statement = build_alter_table(&node, Depth::default()).unwrap();
        match &statement.actions[0].kind {
            AlterTableActionKind::AddConstraint(constraint) => {
                assert!(matches!(
                    constraint.kind,
                    OutOfLineConstraintKind::PrimaryKey { .. }
                ));
            }
            other => panic!("expected add constraint, got {other:?}"),
        }
    }

    #[test]
    fn drop_table_list_and_flags() {
        let node = CstNode::new(Rule::DropTableStmt)
            .with_token(TokenKind::If, "IF")
            .with_node(
                CstNode::new(Rule::TableList)
                    .with_node(relation("a"))
                    .with_node(relation("b")),
            )
            .with_token(TokenKind::Restrict, "RESTRICT");
        let statement = build_drop_table(&node).unwrap();
        assert!(statement.if_exists);
        assert_eq!(statement.tables.len(), 2);
        assert_eq!(statement.behavior, Some(DropBehavior::Restrict));
    }

    #[test]
    fn rename_table_requires_both_names() {
        let node = CstNode::new(Rule::RenameTableStmt)
            .with_node(CstNode::new(Rule::RenameTableAction).with_node(relation("only_one")));
        assert!(matches!(
            build_rename_table(&node).unwrap_err(),
            Error::StructuralInconsistency { .. }
        ));
    }

    #[test]
    fn create_index_with_partition() {
        let node = CstNode::new(Rule::CreateIndexStmt)
            .with_token(TokenKind::Unique, "UNIQUE")
            .with_node(CstNode::new(Rule::IndexName).with_token(TokenKind::Identifier, "idx_a"))
            .with_node(relation("t"))
            .with_node(
                CstNode::new(Rule::SortColumnList).with_node(
                    CstNode::new(Rule::SortColumnKey).with_token(TokenKind::Identifier, "a"),
                ),
            )
            .with_node(
                CstNode::new(Rule::PartitionOption).with_node(
                    CstNode::new(Rule::HashPartitionOption).with_token(TokenKind::Hash, "HASH"),
                ),
            );
        let statement = build_create_index(&node, Depth::default()).unwrap();
        assert!(statement.unique);
        assert_eq!(statement.index.relation, "idx_a");
        assert_eq!(
            statement.partition.unwrap().strategy,
            PartitionStrategy::Hash
        );
    }

    #[test]
    fn mview_refresh_keeps_start_text_and_decomposes_next() {
        let interval = CstNode::new(Rule::MvRefreshInterval)
            .with_token(TokenKind::Start, "START")
            .with_token(TokenKind::With, "WITH")
            .with_node(
                CstNode::new(Rule::Expr).with_node(
                    CstNode::new(Rule::SimpleExpr).with_token(TokenKind::Sysdate, "sysdate()"),
                ),
            )
            .with_token(TokenKind::Next, "NEXT")
            .with_token(TokenKind::IntNum, "1")
            .with_node(CstNode::new(Rule::DateUnit).with_token(TokenKind::Identifier, "DAY"));
        let refresh = CstNode::new(Rule::MviewRefreshClause)
            .with_token(TokenKind::Fast, "FAST")
            .with_token(TokenKind::On, "ON")
            .with_token(TokenKind::Demand, "DEMAND")
            .with_node(interval);
        let node = CstNode::new(Rule::CreateMviewStmt)
            .with_node(relation("mv"))
            .with_node(refresh)
            .with_token(TokenKind::Enable, "ENABLE")
            .with_token(TokenKind::Query, "QUERY")
            .with_token(TokenKind::Rewrite, "REWRITE")
            .with_node(simple_select());
        let statement = build_create_mview(&node, Depth::default()).unwrap();
        assert_eq!(statement.query_rewrite, Some(true));
        assert_eq!(statement.query_computation, None);
        let refresh = statement.refresh.unwrap();
        assert_eq!(refresh.mode, RefreshMode::Fast);
        assert_eq!(refresh.on, Some(RefreshOn::Demand));
        assert_eq!(refresh.start_with.as_deref(), Some("sysdate()"));
        let next = refresh.next.unwrap();
        assert_eq!(next.value, 1);
        assert_eq!(next.unit, "DAY");
    }
}
