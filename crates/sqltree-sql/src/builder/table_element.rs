//! CREATE TABLE element builders: column definitions, constraints,
//! indexes and the merged option bags.
//!
//! Attribute productions repeat freely in the grammar; each one builds a
//! sparse bag and the bags fold left to right, so a later occurrence of
//! the same option wins.

use crate::ast::create_table::{
    ColumnAttributes, ColumnDefinition, ColumnGroupElement, ColumnLocation, ConstraintState,
    ForeignReference, GenerateKind, GenerateOption, IndexOptions, InlineConstraint,
    InlineConstraintKind, MatchOption, OnOption, OutOfLineConstraint, OutOfLineConstraintKind,
    OutOfLineIndex, SortColumn, TableElement, TableOptions,
};
use crate::ast::expression::ColumnReference;
use crate::ast::select::SortDirection;
use crate::builder::{data_type, expression, identifier, Depth};
use crate::cst::{CstChild, CstNode, Rule, Span, TokenKind};
use crate::error::{Error, Result};

/// Build one entry of a CREATE TABLE element list.
pub fn build_table_element(node: &CstNode) -> Result<TableElement> {
    table_element(node, Depth::default())
}

pub(crate) fn table_element(node: &CstNode, depth: Depth) -> Result<TableElement> {
    let depth = depth.descend(node.span)?;
    let body = if node.rule == Rule::TableElement {
        first_node(node).ok_or_else(|| Error::structural("empty table element", node.span))?
    } else {
        node
    };
    match body.rule {
        Rule::ColumnDefinition => Ok(TableElement::Column(column_definition(body, depth)?)),
        Rule::OutOfLineConstraint | Rule::OutOfLinePrimaryIndex | Rule::OutOfLineUniqueIndex => {
            Ok(TableElement::Constraint(out_of_line_constraint(body, depth)?))
        }
        Rule::OutOfLineIndex => Ok(TableElement::Index(out_of_line_index(body, depth)?)),
        other => Err(Error::structural(
            format!("production {other:?} is not a table element"),
            body.span,
        )),
    }
}

fn first_node(node: &CstNode) -> Option<&CstNode> {
    node.children.iter().find_map(|c| match c {
        CstChild::Node(n) => Some(n),
        _ => None,
    })
}

fn parse_u64(text: &str, span: Span) -> Result<u64> {
    text.parse::<u64>()
        .map_err(|_| Error::structural(format!("invalid integer option `{text}`"), span))
}

fn parse_u32(text: &str, span: Span) -> Result<u32> {
    text.parse::<u32>()
        .map_err(|_| Error::structural(format!("invalid integer option `{text}`"), span))
}

fn constraint_name(node: &CstNode) -> Option<String> {
    node.find(Rule::OptConstraintName)
        .and_then(|n| n.find(Rule::ConstraintName))
        .or_else(|| node.find(Rule::ConstraintName))
        .map(|n| n.text())
}

fn constraint_state(node: &CstNode) -> Option<ConstraintState> {
    let state = node.find(Rule::CheckState)?;
    Some(ConstraintState {
        enforced: !state.has(TokenKind::Not),
    })
}

/// Build a column definition, shared with the ALTER TABLE column actions.
pub(crate) fn column_definition(node: &CstNode, depth: Depth) -> Result<ColumnDefinition> {
    let column_node = node
        .find(Rule::ColumnDefinitionRef)
        .or_else(|| node.find(Rule::ColumnRef))
        .or_else(|| node.find(Rule::ColumnName))
        .ok_or_else(|| Error::structural("column definition without a name", node.span))?;
    let column = if column_node.rule == Rule::ColumnName {
        let name = column_node
            .token_text(TokenKind::Identifier)
            .ok_or_else(|| Error::structural("column name without an identifier", column_node.span))?;
        ColumnReference::new(None, None, name)
    } else {
        identifier::column_ref(column_node)?
    };

    let data_type = node
        .find(Rule::DataType)
        .map(data_type::build_data_type)
        .transpose()?;

    let mut attributes: Option<ColumnAttributes> = None;
    for list_rule in [
        Rule::OptColumnAttributeList,
        Rule::OptGeneratedColumnAttributeList,
    ] {
        if let Some(list) = node.find(list_rule) {
            let folded = column_attribute_list(list, depth)?;
            attributes = Some(match attributes.take() {
                Some(existing) => existing.merge(folded),
                None => folded,
            });
        }
    }

    // `GENERATED ALWAYS AS (expr)` can sit directly on the definition.
    if node.has(TokenKind::Generated) || node.has(TokenKind::As) {
        if let Some(expr_node) = node.find(Rule::Expr).or_else(|| node.find(Rule::BitExpr)) {
            let option = GenerateOption {
                expr: expression::expr(expr_node, depth)?,
                kind: generate_kind(node),
                span: node.span,
            };
            let mut bag = attributes.take().unwrap_or_default();
            bag.generate_option = Some(option);
            attributes = Some(bag);
        }
    }

    let location = if node.has(TokenKind::First) {
        Some(ColumnLocation::First)
    } else if node.has(TokenKind::Before) {
        Some(ColumnLocation::Before(anchor_column(node)?))
    } else if node.has(TokenKind::After) {
        Some(ColumnLocation::After(anchor_column(node)?))
    } else {
        None
    };

    let mut definition = ColumnDefinition::new(column, data_type);
    definition.attributes = attributes;
    definition.location = location;
    definition.span = node.span;
    Ok(definition)
}

fn anchor_column(node: &CstNode) -> Result<String> {
    node.token_text(TokenKind::Identifier)
        .map(str::to_string)
        .ok_or_else(|| Error::structural("column placement without an anchor column", node.span))
}

fn generate_kind(node: &CstNode) -> Option<GenerateKind> {
    if node.has(TokenKind::Stored) {
        Some(GenerateKind::Stored)
    } else if node.has(TokenKind::Virtual) {
        Some(GenerateKind::Virtual)
    } else {
        None
    }
}

fn column_attribute_list(node: &CstNode, depth: Depth) -> Result<ColumnAttributes> {
    let mut folded = ColumnAttributes::default();
    for child in node.children.iter() {
        let CstChild::Node(child) = child else { continue };
        match child.rule {
            Rule::OptColumnAttributeList | Rule::OptGeneratedColumnAttributeList => {
                folded = folded.merge(column_attribute_list(child, depth)?);
            }
            Rule::ColumnAttribute | Rule::GeneratedColumnAttribute => {
                folded = folded.merge(column_attribute(child, depth)?);
            }
            _ => {}
        }
    }
    Ok(folded)
}

fn column_attribute(node: &CstNode, depth: Depth) -> Result<ColumnAttributes> {
    let mut bag = ColumnAttributes::default();
    bag.span = node.span;

    if node.has(TokenKind::Null) {
        bag.nullable = Some(!node.has(TokenKind::Not));
        return Ok(bag);
    }
    if node.has(TokenKind::Default) {
        let value = first_node(node)
            .ok_or_else(|| Error::structural("DEFAULT attribute without a value", node.span))?;
        bag.default_value = Some(expression::expr(value, depth)?);
        return Ok(bag);
    }
    if node.has(TokenKind::On) && node.has(TokenKind::Update) {
        let value = first_node(node)
            .ok_or_else(|| Error::structural("ON UPDATE attribute without a value", node.span))?;
        bag.on_update = Some(expression::expr(value, depth)?);
        return Ok(bag);
    }
    if node.has(TokenKind::AutoIncrement) {
        bag.auto_increment = true;
        return Ok(bag);
    }
    if node.has(TokenKind::Unique) {
        bag.unique_key = true;
        return Ok(bag);
    }
    if node.has(TokenKind::Primary) || node.has(TokenKind::Key) {
        bag.primary_key = true;
        return Ok(bag);
    }
    if node.has(TokenKind::Comment) {
        bag.comment = node.token_text(TokenKind::StringValue).map(str::to_string);
        return Ok(bag);
    }
    if node.has(TokenKind::Collate) {
        bag.collation = node
            .find(Rule::CollationName)
            .map(|n| n.text())
            .or_else(|| node.token_text(TokenKind::Identifier).map(str::to_string))
            .or_else(|| node.token_text(TokenKind::StringValue).map(str::to_string));
        return Ok(bag);
    }
    if node.has(TokenKind::Check) {
        let value = first_node(node)
            .ok_or_else(|| Error::structural("CHECK attribute without an expression", node.span))?;
        bag.constraints.push(InlineConstraint {
            name: constraint_name(node),
            kind: InlineConstraintKind::Check(expression::expr(value, depth)?),
            state: constraint_state(node),
            span: node.span,
        });
        return Ok(bag);
    }
    if let Some(references) = node.find(Rule::ReferencesClause) {
        bag.constraints.push(InlineConstraint {
            name: constraint_name(node),
            kind: InlineConstraintKind::References(references_clause(references, depth)?),
            state: constraint_state(node),
            span: node.span,
        });
        return Ok(bag);
    }
    if node.has(TokenKind::Generated) || node.has(TokenKind::As) {
        let value = first_node(node)
            .ok_or_else(|| Error::structural("generated attribute without an expression", node.span))?;
        bag.generate_option = Some(GenerateOption {
            expr: expression::expr(value, depth)?,
            kind: generate_kind(node),
            span: node.span,
        });
        return Ok(bag);
    }
    // Attributes this layer does not track (SRID, SKIP INDEX, column id)
    // fold in as empty bags.
    Ok(bag)
}

pub(crate) fn out_of_line_constraint(node: &CstNode, depth: Depth) -> Result<OutOfLineConstraint> {
    match node.rule {
        Rule::OutOfLinePrimaryIndex => {
            return Ok(OutOfLineConstraint {
                name: constraint_name(node),
                kind: OutOfLineConstraintKind::PrimaryKey {
                    columns: sort_columns_of(node, depth)?,
                    index_options: index_options_of(node)?,
                },
                state: constraint_state(node),
                span: node.span,
            })
        }
        Rule::OutOfLineUniqueIndex => {
            return Ok(OutOfLineConstraint {
                name: constraint_name(node),
                kind: OutOfLineConstraintKind::Unique {
                    index_name: index_name_of(node),
                    columns: sort_columns_of(node, depth)?,
                    index_options: index_options_of(node)?,
                },
                state: constraint_state(node),
                span: node.span,
            })
        }
        _ => {}
    }

    // `out_of_line_constraint` wraps one concrete alternative, with the
    // optional CONSTRAINT name and state on the wrapper.
    if let Some(inner) = node
        .find(Rule::OutOfLinePrimaryIndex)
        .or_else(|| node.find(Rule::OutOfLineUniqueIndex))
    {
        let mut constraint = out_of_line_constraint(inner, depth)?;
        if constraint.name.is_none() {
            constraint.name = constraint_name(node);
        }
        if constraint.state.is_none() {
            constraint.state = constraint_state(node);
        }
        return Ok(constraint);
    }

    if node.has(TokenKind::Foreign) {
        let references = node
            .find(Rule::ReferencesClause)
            .ok_or_else(|| Error::structural("FOREIGN KEY without a references clause", node.span))?;
        return Ok(OutOfLineConstraint {
            name: constraint_name(node),
            kind: OutOfLineConstraintKind::ForeignKey {
                index_name: index_name_of(node),
                columns: sort_columns_of(node, depth)?,
                reference: references_clause(references, depth)?,
            },
            state: constraint_state(node),
            span: node.span,
        });
    }

    if node.has(TokenKind::Check) {
        let value = node
            .find(Rule::Expr)
            .or_else(|| first_node(node))
            .ok_or_else(|| Error::structural("CHECK constraint without an expression", node.span))?;
        return Ok(OutOfLineConstraint {
            name: constraint_name(node),
            kind: OutOfLineConstraintKind::Check(expression::expr(value, depth)?),
            state: constraint_state(node),
            span: node.span,
        });
    }

    Err(Error::structural(
        "constraint production with no recognized alternative",
        node.span,
    ))
}

fn index_name_of(node: &CstNode) -> Option<String> {
    node.find(Rule::IndexName)
        .map(|n| n.text())
        .filter(|s| !s.is_empty())
}

fn sort_columns_of(node: &CstNode, depth: Depth) -> Result<Vec<SortColumn>> {
    if let Some(list) = node.find(Rule::SortColumnList) {
        return sort_column_list(list, depth);
    }
    // Plain `(col, col)` form, used by foreign keys.
    if let Some(list) = node.find(Rule::ColumnList) {
        return Ok(identifier::column_list(list)?
            .into_iter()
            .map(SortColumn::column)
            .collect());
    }
    Err(Error::structural("key definition without columns", node.span))
}

pub(crate) fn sort_column_list(node: &CstNode, depth: Depth) -> Result<Vec<SortColumn>> {
    let mut out = Vec::new();
    for child in node.children.iter() {
        let CstChild::Node(child) = child else { continue };
        match child.rule {
            Rule::SortColumnList => out.extend(sort_column_list(child, depth)?),
            Rule::SortColumnKey => out.push(sort_column(child, depth)?),
            _ => {}
        }
    }
    if out.is_empty() {
        return Err(Error::structural("empty key column list", node.span));
    }
    Ok(out)
}

fn sort_column(node: &CstNode, depth: Depth) -> Result<SortColumn> {
    let direction = if node.has(TokenKind::Desc) {
        Some(SortDirection::Desc)
    } else if node.has(TokenKind::Asc) {
        Some(SortDirection::Asc)
    } else {
        None
    };
    let length = node
        .token(TokenKind::IntNum)
        .map(|t| parse_u32(&t.text, t.span))
        .transpose()?;

    let mut key = if let Some(name) = node.token_text(TokenKind::Identifier) {
        SortColumn::column(ColumnReference::new(None, None, name))
    } else if let Some(column_node) = node
        .find(Rule::ColumnRef)
        .or_else(|| node.find(Rule::ColumnName))
    {
        SortColumn::column(identifier::column_ref(column_node)?)
    } else if let Some(expr_node) = first_node(node) {
        SortColumn::expr(expression::expr(expr_node, depth)?)
    } else {
        return Err(Error::structural("key part without a column or expression", node.span));
    };
    key.length = length;
    key.direction = direction;
    key.span = node.span;
    Ok(key)
}

pub(crate) fn out_of_line_index(node: &CstNode, depth: Depth) -> Result<OutOfLineIndex> {
    Ok(OutOfLineIndex {
        name: index_name_of(node).or_else(|| {
            node.token_text(TokenKind::Identifier).map(str::to_string)
        }),
        columns: sort_columns_of(node, depth)?,
        index_options: index_options_of(node)?,
        fulltext: node.has(TokenKind::Fulltext),
        spatial: node.has(TokenKind::Spatial),
        span: node.span,
    })
}

pub(crate) fn index_options_of(node: &CstNode) -> Result<Option<IndexOptions>> {
    let mut folded: Option<IndexOptions> = None;
    if let Some(using) = node.find(Rule::IndexUsingAlgorithm) {
        let mut bag = IndexOptions::default();
        bag.using = Some(index_algorithm(using));
        folded = Some(bag);
    }
    if let Some(list) = node.find(Rule::OptIndexOptions) {
        let bag = index_option_list(list)?;
        folded = Some(match folded.take() {
            Some(existing) => existing.merge(bag),
            None => bag,
        });
    }
    Ok(folded)
}

fn index_algorithm(node: &CstNode) -> String {
    if node.has(TokenKind::Hash) {
        "HASH".to_string()
    } else {
        "BTREE".to_string()
    }
}

pub(crate) fn index_option_list(node: &CstNode) -> Result<IndexOptions> {
    let mut folded = IndexOptions::default();
    folded.span = node.span;
    for child in node.children.iter() {
        let CstChild::Node(child) = child else { continue };
        match child.rule {
            Rule::OptIndexOptions => folded = folded.merge(index_option_list(child)?),
            Rule::IndexOption => folded = folded.merge(index_option(child)?),
            Rule::IndexUsingAlgorithm => {
                let mut bag = IndexOptions::default();
                bag.using = Some(index_algorithm(child));
                folded = folded.merge(bag);
            }
            _ => {}
        }
    }
    Ok(folded)
}

fn index_option(node: &CstNode) -> Result<IndexOptions> {
    let mut bag = IndexOptions::default();
    bag.span = node.span;
    if node.has(TokenKind::Global) {
        bag.global = Some(true);
    } else if node.has(TokenKind::Local) {
        bag.global = Some(false);
    } else if node.has(TokenKind::Visible) {
        bag.visible = Some(true);
    } else if node.has(TokenKind::Invisible) {
        bag.visible = Some(false);
    } else if node.has(TokenKind::Comment) {
        bag.comment = node.token_text(TokenKind::StringValue).map(str::to_string);
    } else if node.has(TokenKind::KeyBlockSize) || node.has(TokenKind::BlockSize) {
        bag.key_block_size = node
            .token(TokenKind::IntNum)
            .map(|t| parse_u64(&t.text, t.span))
            .transpose()?;
    } else if let Some(using) = node.find(Rule::IndexUsingAlgorithm) {
        bag.using = Some(index_algorithm(using));
    } else if node.has(TokenKind::Using) {
        bag.using = Some(index_algorithm(node));
    }
    Ok(bag)
}

pub(crate) fn references_clause(node: &CstNode, depth: Depth) -> Result<ForeignReference> {
    let _ = depth;
    let factor_node = node
        .find(Rule::RelationFactor)
        .or_else(|| node.find(Rule::NormalRelationFactor))
        .ok_or_else(|| Error::structural("REFERENCES without a target table", node.span))?;
    let columns = node
        .find(Rule::ColumnList)
        .map(identifier::column_list)
        .transpose()?
        .unwrap_or_default();
    let mut reference =
        ForeignReference::new(identifier::relation_factor(factor_node)?, columns);

    if let Some(match_node) = node.find(Rule::MatchAction) {
        reference.match_option = Some(if match_node.has(TokenKind::Full) {
            MatchOption::Full
        } else if match_node.has(TokenKind::Partial) {
            MatchOption::Partial
        } else {
            MatchOption::Simple
        });
    }

    let option_list = node.find(Rule::OptReferenceOptionList).unwrap_or(node);
    for option in option_list.find_all(Rule::ReferenceOption) {
        let action = reference_action(option)?;
        // An omitted clause stays `None`; only an explicit clause sets the
        // action, including an explicit NO ACTION.
        if option.has(TokenKind::Delete) {
            reference.on_delete = Some(action);
        } else if option.has(TokenKind::Update) {
            reference.on_update = Some(action);
        } else {
            return Err(Error::structural(
                "reference option without DELETE or UPDATE",
                option.span,
            ));
        }
    }

    reference.span = node.span;
    Ok(reference)
}

fn reference_action(node: &CstNode) -> Result<OnOption> {
    let body = node.find(Rule::ReferenceAction).unwrap_or(node);
    if body.has(TokenKind::Cascade) {
        Ok(OnOption::Cascade)
    } else if body.has(TokenKind::Restrict) {
        Ok(OnOption::Restrict)
    } else if body.has(TokenKind::No) {
        Ok(OnOption::NoAction)
    } else if body.has(TokenKind::Set) && body.has(TokenKind::Null) {
        Ok(OnOption::SetNull)
    } else if body.has(TokenKind::Set) && body.has(TokenKind::Default) {
        Ok(OnOption::SetDefault)
    } else {
        Err(Error::structural("reference option without an action", body.span))
    }
}

/// Fold a `table_option_list` left to right.
pub(crate) fn table_option_list(node: &CstNode) -> Result<TableOptions> {
    let mut folded = TableOptions::default();
    folded.span = node.span;
    for child in node.children.iter() {
        let CstChild::Node(child) = child else { continue };
        match child.rule {
            Rule::TableOptionList => folded = folded.merge(table_option_list(child)?),
            Rule::TableOption => folded = folded.merge(table_option(child)?),
            _ => {}
        }
    }
    Ok(folded)
}

fn option_text(node: &CstNode) -> Option<String> {
    node.token_text(TokenKind::Identifier)
        .or_else(|| node.token_text(TokenKind::StringValue))
        .map(str::to_string)
}

fn table_option(node: &CstNode) -> Result<TableOptions> {
    let mut bag = TableOptions::default();
    bag.span = node.span;
    if node.has(TokenKind::Engine) {
        bag.engine = option_text(node);
    } else if node.has(TokenKind::Charset) {
        bag.charset = node
            .find(Rule::CharsetName)
            .and_then(|n| n.token_text(TokenKind::Identifier).map(str::to_string))
            .or_else(|| option_text(node));
    } else if node.has(TokenKind::Collate) {
        bag.collation = node
            .find(Rule::CollationName)
            .map(|n| n.text())
            .or_else(|| option_text(node));
    } else if node.has(TokenKind::Comment) {
        bag.comment = node.token_text(TokenKind::StringValue).map(str::to_string);
    } else if node.has(TokenKind::AutoIncrement) {
        bag.auto_increment = node
            .token(TokenKind::IntNum)
            .map(|t| parse_u64(&t.text, t.span))
            .transpose()?;
    } else if node.has(TokenKind::RowFormat) {
        bag.row_format = option_text(node);
    } else if node.has(TokenKind::KeyBlockSize) || node.has(TokenKind::BlockSize) {
        bag.key_block_size = node
            .token(TokenKind::IntNum)
            .map(|t| parse_u64(&t.text, t.span))
            .transpose()?;
    } else if node.has(TokenKind::Compression) {
        bag.compression = node.token_text(TokenKind::StringValue).map(str::to_string);
    }
    Ok(bag)
}

/// Build the elements of a `WITH COLUMN GROUP (...)` clause.
pub(crate) fn column_group_elements(node: &CstNode) -> Result<Vec<ColumnGroupElement>> {
    let list = node.find(Rule::ColumnGroupList).unwrap_or(node);
    let mut out = Vec::new();
    for child in list.find_all(Rule::ColumnGroupElement) {
        let mut element = ColumnGroupElement::default();
        if child.has(TokenKind::All) {
            element.all_columns = true;
        } else if child.has(TokenKind::Each) {
            element.each_column = true;
        } else if let Some(names) = child.find(Rule::NameList) {
            element.columns = identifier::name_list(names)?;
        } else {
            return Err(Error::unsupported(
                "column group element without a grouping form",
                child.span,
            ));
        }
        out.push(element);
    }
    if out.is_empty() {
        return Err(Error::structural("column group clause without elements", node.span));
    }
    Ok(out)
}
