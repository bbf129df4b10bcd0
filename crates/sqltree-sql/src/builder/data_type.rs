//! Data type builders.
//!
//! A `data_type` production wraps exactly one family-specific alternative.
//! The family rules share a shape: the type name arrives as the leading
//! keyword terminals, numeric arguments as nested precision productions
//! and modifiers (charset, collation, BINARY, signedness) as trailing
//! terminals.

use crate::ast::data_type::{
    CharacterType, CollectionType, DataType, GeneralType, NumberType, TimestampType,
};
use crate::cst::{CstNode, Rule, Span, TokenKind};
use crate::error::{Error, Result};
use rust_decimal::Decimal;

/// Build a [`DataType`] from a `data_type` or `cast_data_type` production.
pub fn build_data_type(node: &CstNode) -> Result<DataType> {
    if matches!(node.rule, Rule::DataType | Rule::CastDataType) {
        if let Some(inner) = first_child_node(node) {
            return build_data_type(inner);
        }
        // `CAST(x AS SIGNED [INTEGER])` has no family production; the
        // keyword terminals themselves form the type name.
        if node.rule == Rule::CastDataType {
            return keyword_cast_target(node);
        }
        return Err(Error::structural("data type wrapper has no alternative", node.span));
    }
    match node.rule {
        Rule::CharacterTypeI | Rule::TextTypeI => character_type(node),
        Rule::IntTypeI | Rule::FloatTypeI | Rule::NumberTypeI => number_type(node),
        Rule::DatetimeTypeI => datetime_type(node),
        Rule::CollectionTypeI => collection_type(node),
        Rule::BinaryTypeI
        | Rule::BlobTypeI
        | Rule::BitTypeI
        | Rule::BoolTypeI
        | Rule::DateYearTypeI
        | Rule::JsonTypeI => general_type(node),
        other => Err(Error::unsupported(
            format!("data type production {other:?} is not supported"),
            node.span,
        )),
    }
}

fn first_child_node(node: &CstNode) -> Option<&CstNode> {
    node.children.iter().find_map(|c| match c {
        crate::cst::CstChild::Node(n) => Some(n),
        _ => None,
    })
}

fn keyword_cast_target(node: &CstNode) -> Result<DataType> {
    let words: Vec<String> = node
        .all_tokens()
        .iter()
        .map(|t| t.text.to_uppercase())
        .collect();
    if words.is_empty() {
        return Err(Error::structural("data type wrapper has no alternative", node.span));
    }
    let mut t = GeneralType::new(words.join(" "), Vec::new());
    t.span = node.span;
    Ok(DataType::General(t))
}

/// Multi-keyword type names (`CHARACTER VARYING`, `DOUBLE PRECISION`)
/// arrive as consecutive leading terminals.
fn type_name(node: &CstNode) -> Result<String> {
    let words: Vec<String> = node
        .leading_tokens()
        .iter()
        .filter(|t| !is_modifier_word(&t.text))
        .map(|t| t.text.to_uppercase())
        .collect();
    if words.is_empty() {
        return Err(Error::structural("type production has no name keyword", node.span));
    }
    Ok(words.join(" "))
}

fn is_modifier_word(text: &str) -> bool {
    text.eq_ignore_ascii_case("SIGNED")
        || text.eq_ignore_ascii_case("UNSIGNED")
        || text.eq_ignore_ascii_case("ZEROFILL")
}

fn has_word(node: &CstNode, word: &str) -> bool {
    node.all_tokens()
        .iter()
        .any(|t| t.text.eq_ignore_ascii_case(word))
}

fn parse_decimal(text: &str, span: Span) -> Result<Decimal> {
    text.parse::<Decimal>()
        .map_err(|_| Error::structural(format!("invalid numeric argument `{text}`"), span))
}

/// First integer argument below a precision/length production, if any.
fn numeric_arg(node: &CstNode, rule: Rule) -> Result<Option<Decimal>> {
    let Some(inner) = node.find(rule) else {
        return Ok(None);
    };
    let token = inner
        .token(TokenKind::IntNum)
        .or_else(|| inner.token(TokenKind::DecimalNum))
        .ok_or_else(|| Error::structural("length production without a number", inner.span))?;
    parse_decimal(&token.text, token.span).map(Some)
}

/// Precision and scale of a `data_type_precision` production: one number
/// is precision only, two are precision then scale.
fn precision_and_scale(node: &CstNode) -> Result<(Option<Decimal>, Option<Decimal>)> {
    let Some(inner) = node.find(Rule::DataTypePrecision) else {
        let precision = numeric_arg(node, Rule::PrecisionIntNum)?;
        return Ok((precision, None));
    };
    let mut numbers = Vec::new();
    for token in inner.all_tokens() {
        if matches!(token.kind, TokenKind::IntNum | TokenKind::DecimalNum) {
            numbers.push(parse_decimal(&token.text, token.span)?);
        }
    }
    for nested in inner.find_all(Rule::PrecisionIntNum) {
        if let Some(token) = nested.token(TokenKind::IntNum) {
            numbers.push(parse_decimal(&token.text, token.span)?);
        }
    }
    let mut numbers = numbers.into_iter();
    Ok((numbers.next(), numbers.next()))
}

fn charset_of(node: &CstNode) -> Option<String> {
    node.find(Rule::CharsetName)
        .and_then(|n| n.token_text(TokenKind::Identifier).map(str::to_string))
}

fn collation_of(node: &CstNode) -> Option<String> {
    node.find(Rule::Collation)
        .or_else(|| node.find(Rule::CollationName))
        .and_then(|n| n.token_text(TokenKind::Identifier).map(str::to_string))
}

fn character_type(node: &CstNode) -> Result<DataType> {
    let mut t = CharacterType::new(type_name(node)?, numeric_arg(node, Rule::StringLengthI)?);
    t.charset = charset_of(node);
    t.collation = collation_of(node);
    t.binary = node.has(TokenKind::Binary);
    t.span = node.span;
    Ok(DataType::Character(t))
}

fn number_type(node: &CstNode) -> Result<DataType> {
    let (precision, scale) = precision_and_scale(node)?;
    let mut t = NumberType::new(type_name(node)?, precision, scale);
    if has_word(node, "UNSIGNED") {
        t.signed = Some(false);
    } else if has_word(node, "SIGNED") {
        t.signed = Some(true);
    }
    t.zero_fill = has_word(node, "ZEROFILL");
    t.span = node.span;
    Ok(DataType::Number(t))
}

fn datetime_type(node: &CstNode) -> Result<DataType> {
    let name = type_name(node)?;
    let (precision, _) = precision_and_scale(node)?;
    if name == "TIMESTAMP" {
        let mut t = TimestampType::new(precision);
        t.with_time_zone = has_word(node, "TIME") && has_word(node, "ZONE") && !has_word(node, "LOCAL");
        t.with_local_time_zone = has_word(node, "LOCAL");
        t.span = node.span;
        return Ok(DataType::Timestamp(t));
    }
    let args = precision.map(|p| p.to_string()).into_iter().collect();
    let mut t = GeneralType::new(name, args);
    t.span = node.span;
    Ok(DataType::General(t))
}

fn general_type(node: &CstNode) -> Result<DataType> {
    let mut args = Vec::new();
    if let Some(length) = numeric_arg(node, Rule::StringLengthI)? {
        args.push(length.to_string());
    }
    if let Some(precision) = numeric_arg(node, Rule::PrecisionIntNum)? {
        args.push(precision.to_string());
    }
    let mut t = GeneralType::new(type_name(node)?, args);
    t.span = node.span;
    Ok(DataType::General(t))
}

fn collection_type(node: &CstNode) -> Result<DataType> {
    let values = match node.find(Rule::StringList) {
        Some(list) => string_list(list),
        None => Vec::new(),
    };
    let mut t = CollectionType::new(type_name(node)?, values);
    t.charset = charset_of(node);
    t.collation = collation_of(node);
    t.binary = node.has(TokenKind::Binary);
    t.span = node.span;
    Ok(DataType::Collection(t))
}

fn string_list(node: &CstNode) -> Vec<String> {
    let mut out: Vec<String> = node
        .find_all(Rule::TextString)
        .iter()
        .filter_map(|n| n.token_text(TokenKind::StringValue).map(str::to_string))
        .collect();
    if out.is_empty() {
        out = node
            .tokens(TokenKind::StringValue)
            .iter()
            .map(|t| t.text.clone())
            .collect();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varchar_with_length_and_charset() {
        let node = CstNode::new(Rule::DataType).with_node(
            CstNode::new(Rule::CharacterTypeI)
                .with_token(TokenKind::Identifier, "VARCHAR")
                .with_node(CstNode::new(Rule::StringLengthI).with_token(TokenKind::IntNum, "255"))
                .with_node(CstNode::new(Rule::CharsetName).with_token(TokenKind::Identifier, "utf8mb4")),
        );
        match build_data_type(&node).unwrap() {
            DataType::Character(t) => {
                assert_eq!(t.name, "VARCHAR");
                assert_eq!(t.length, Some(Decimal::from(255)));
                assert_eq!(t.charset.as_deref(), Some("utf8mb4"));
            }
            other => panic!("expected character type, got {other:?}"),
        }
    }

    #[test]
    fn decimal_precision_and_scale_are_exact() {
        let node = CstNode::new(Rule::NumberTypeI)
            .with_token(TokenKind::Identifier, "DECIMAL")
            .with_node(
                CstNode::new(Rule::DataTypePrecision)
                    .with_token(TokenKind::IntNum, "10")
                    .with_token(TokenKind::IntNum, "2"),
            );
        match build_data_type(&node).unwrap() {
            DataType::Number(t) => {
                assert_eq!(t.precision, Some(Decimal::from(10)));
                assert_eq!(t.scale, Some(Decimal::from(2)));
                assert_eq!(t.signed, None);
            }
            other => panic!("expected number type, got {other:?}"),
        }
    }

    #[test]
    fn keyword_only_cast_target_becomes_a_general_type() {
        let node = CstNode::new(Rule::CastDataType)
            .with_token(TokenKind::Identifier, "UNSIGNED")
            .with_token(TokenKind::Identifier, "INTEGER");
        match build_data_type(&node).unwrap() {
            DataType::General(t) => {
                assert_eq!(t.name, "UNSIGNED INTEGER");
                assert!(t.args.is_empty());
            }
            other => panic!("expected general type, got {other:?}"),
        }
    }

    #[test]
    fn empty_data_type_wrapper_is_rejected() {
        match build_data_type(&CstNode::new(Rule::DataType)) {
            Err(Error::StructuralInconsistency { .. }) => {}
            other => panic!("expected a structural error, got {other:?}"),
        }
    }

    #[test]
    fn unsigned_int_sets_signedness_without_polluting_the_name() {
        let node = CstNode::new(Rule::IntTypeI)
            .with_token(TokenKind::Identifier, "INT")
            .with_token(TokenKind::Identifier, "UNSIGNED");
        match build_data_type(&node).unwrap() {
            DataType::Number(t) => {
                assert_eq!(t.name, "INT");
                assert_eq!(t.signed, Some(false));
            }
            other => panic!("expected number type, got {other:?}"),
        }
    }

    #[test]
    fn timestamp_gets_its_own_shape() {
        let node = CstNode::new(Rule::DatetimeTypeI)
            .with_token(TokenKind::Identifier, "TIMESTAMP")
            .with_node(CstNode::new(Rule::PrecisionIntNum).with_token(TokenKind::IntNum, "6"));
        match build_data_type(&node).unwrap() {
            DataType::Timestamp(t) => assert_eq!(t.precision, Some(Decimal::from(6))),
            other => panic!("expected timestamp type, got {other:?}"),
        }
    }

    #[test]
    fn datetime_stays_general_with_precision_argument() {
        let node = CstNode::new(Rule::DatetimeTypeI)
            .with_token(TokenKind::Identifier, "DATETIME")
            .with_node(CstNode::new(Rule::PrecisionIntNum).with_token(TokenKind::IntNum, "3"));
        match build_data_type(&node).unwrap() {
            DataType::General(t) => {
                assert_eq!(t.name, "DATETIME");
                assert_eq!(t.args, vec!["3"]);
            }
            other => panic!("expected general type, got {other:?}"),
        }
    }

    #[test]
    fn enum_collects_values_in_order() {
        let node = CstNode::new(Rule::CollectionTypeI)
            .with_token(TokenKind::Identifier, "ENUM")
            .with_node(
                CstNode::new(Rule::StringList)
                    .with_token(TokenKind::StringValue, "a")
                    .with_token(TokenKind::StringValue, "b"),
            );
        match build_data_type(&node).unwrap() {
            DataType::Collection(t) => assert_eq!(t.values, vec!["a", "b"]),
            other => panic!("expected collection type, got {other:?}"),
        }
    }

    #[test]
    fn multi_word_type_name_joins_leading_keywords() {
        let node = CstNode::new(Rule::CharacterTypeI)
            .with_token(TokenKind::Character, "CHARACTER")
            .with_token(TokenKind::Identifier, "VARYING")
            .with_node(CstNode::new(Rule::StringLengthI).with_token(TokenKind::IntNum, "10"));
        assert_eq!(build_data_type(&node).unwrap().name(), "CHARACTER VARYING");
    }

    #[test]
    fn bad_numeric_argument_is_structural() {
        let node = CstNode::new(Rule::CharacterTypeI)
            .with_token(TokenKind::Identifier, "VARCHAR")
            .with_node(CstNode::new(Rule::StringLengthI).with_token(TokenKind::IntNum, "nope"));
        assert!(matches!(
            build_data_type(&node).unwrap_err(),
            Error::StructuralInconsistency { .. }
        ));
    }
}
