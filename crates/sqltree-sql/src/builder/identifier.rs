//! Identifier and name builders.
//!
//! Qualified names arrive as a flat run of identifier terminals separated
//! by dots, so resolution counts from the right: the last identifier is
//! the most specific part, the one before it the relation, the one before
//! that the schema. When several terminal kinds could stand for the
//! column, a plain identifier wins over `*`, which wins over a reserved
//! keyword used as a name.

use crate::ast::common::RelationFactor;
use crate::ast::expression::ColumnReference;
use crate::cst::{CstNode, Rule, TokenKind};
use crate::error::{Error, Result};

/// Build a column reference from a `column_ref` production.
pub fn column_ref(node: &CstNode) -> Result<ColumnReference> {
    let idents: Vec<&str> = node
        .tokens(TokenKind::Identifier)
        .iter()
        .map(|t| t.text.as_str())
        .collect();
    let star = node.has(TokenKind::Star);
    let reserved = node.token_text(TokenKind::ReservedKeyword);

    let (schema, relation, column) = if star {
        // `t.*` / `db.t.*`: every identifier qualifies the star.
        let relation = idents.last().map(|s| s.to_string());
        let schema = idents
            .len()
            .checked_sub(2)
            .and_then(|i| idents.get(i))
            .map(|s| s.to_string());
        (schema, relation, "*".to_string())
    } else if let Some((column, qualifiers)) = idents.split_last() {
        let relation = qualifiers.last().map(|s| s.to_string());
        let schema = qualifiers
            .len()
            .checked_sub(2)
            .and_then(|i| qualifiers.get(i))
            .map(|s| s.to_string());
        (schema, relation, column.to_string())
    } else if let Some(keyword) = reserved {
        (None, None, keyword.to_string())
    } else {
        return Err(Error::structural(
            "column reference carries no identifier, star or keyword",
            node.span,
        ));
    };

    let mut reference = ColumnReference::new(schema, relation, column);
    reference.user_variable = node.token_text(TokenKind::UserVariable).map(str::to_string);
    reference.span = node.span;
    Ok(reference)
}

/// Build a relation factor (schema-qualified table name) from any of the
/// relation factor productions.
pub fn relation_factor(node: &CstNode) -> Result<RelationFactor> {
    // `relation_factor` wraps one of the concrete alternatives.
    if let Some(inner) = node
        .find(Rule::NormalRelationFactor)
        .or_else(|| node.find(Rule::DotRelationFactor))
    {
        return relation_factor(inner);
    }

    let idents = node.tokens(TokenKind::Identifier);
    let (schema, relation) = match idents.as_slice() {
        [] => {
            return Err(Error::structural(
                "relation factor carries no identifier",
                node.span,
            ))
        }
        [relation] => (None, relation.text.clone()),
        // Rightmost identifier names the relation, the one before it the
        // schema. `.name` (dot form) arrives with one identifier only.
        [.., schema, relation] => (Some(schema.text.clone()), relation.text.clone()),
    };

    let mut factor = RelationFactor::new(schema, relation);
    factor.user_variable = node.token_text(TokenKind::UserVariable).map(str::to_string);
    factor.span = node.span;
    Ok(factor)
}

/// Flatten a (possibly right-recursive) `name_list` into source order.
pub fn name_list(node: &CstNode) -> Result<Vec<String>> {
    let mut names = match node.find(Rule::NameList) {
        Some(inner) => name_list(inner)?,
        None => Vec::new(),
    };
    for token in node.tokens(TokenKind::Identifier) {
        names.push(token.text.clone());
    }
    if names.is_empty() {
        return Err(Error::structural("empty name list", node.span));
    }
    Ok(names)
}

/// Build the column references of a `column_list` production.
pub fn column_list(node: &CstNode) -> Result<Vec<ColumnReference>> {
    let refs = node.find_all(Rule::ColumnRef);
    if !refs.is_empty() {
        return refs.into_iter().map(column_ref).collect();
    }
    // Bare identifier form.
    let columns: Vec<ColumnReference> = node
        .tokens(TokenKind::Identifier)
        .iter()
        .map(|t| {
            let mut c = ColumnReference::new(None, None, t.text.clone());
            c.span = t.span;
            c
        })
        .collect();
    if columns.is_empty() {
        return Err(Error::structural("empty column list", node.span));
    }
    Ok(columns)
}
