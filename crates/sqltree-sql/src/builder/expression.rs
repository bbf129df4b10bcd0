//! Expression builders.
//!
//! The grammar layers expressions as `expr` (logical), `bool_pri`
//! (IS / comparison), `predicate` (IN / BETWEEN / LIKE / REGEXP /
//! MEMBER OF), `bit_expr` (arithmetic) and `simple_expr` (everything
//! atomic). Each layer passes through to the next when it adds nothing,
//! so a bare literal arrives wrapped in the whole tower.

use crate::ast::expression::{
    BoolValue, BraceExpr, CaseWhen, CollectionExpression, ConstExpr, Expression,
    FullTextSearch, FunctionCall, FunctionOption, FunctionParam, IntervalExpression, JsonOnOption,
    NullExpr, TextSearchMode, WhenClause, WindowFunction,
};
use crate::ast::select::{WindowBound, WindowFrame, WindowFrameUnit, WindowSpec};
use crate::ast::Operator;
use crate::builder::{identifier, select, Depth};
use crate::cst::{CstChild, CstNode, Rule, TokenKind};
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Canonical spellings for the keyword time functions, keyed by the token
/// the lexer hands over. Unlisted spellings keep their source text.
static TIME_FUNC_NAMES: Lazy<HashMap<TokenKind, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (TokenKind::Now, "NOW"),
        (TokenKind::Sysdate, "SYSDATE"),
        (TokenKind::Curdate, "CURDATE"),
        (TokenKind::CurrentDate, "CURRENT_DATE"),
        (TokenKind::Curtime, "CURTIME"),
        (TokenKind::CurrentTime, "CURRENT_TIME"),
        (TokenKind::CurrentTimestamp, "CURRENT_TIMESTAMP"),
        (TokenKind::UtcTimestamp, "UTC_TIMESTAMP"),
        (TokenKind::UtcTime, "UTC_TIME"),
        (TokenKind::UtcDate, "UTC_DATE"),
    ])
});

/// Build an [`Expression`] from any expression-layer production.
pub fn build_expression(node: &CstNode) -> Result<Expression> {
    expr(node, Depth::default())
}

pub(crate) fn expr(node: &CstNode, depth: Depth) -> Result<Expression> {
    let depth = depth.descend(node.span)?;
    match node.rule {
        Rule::Expr => logical_expr(node, depth),
        Rule::BoolPri => bool_pri(node, depth),
        Rule::Predicate => predicate(node, depth),
        Rule::BitExpr => bit_expr(node, depth),
        Rule::SimpleExpr => simple_expr(node, depth),
        Rule::ExprConst
        | Rule::Literal
        | Rule::NumberLiteral
        | Rule::ComplexStringLiteral
        | Rule::SignedLiteral
        | Rule::NowOrSignedLiteral => literal(node, depth),
        Rule::ExprOrDefault => expr_or_default(node, depth),
        Rule::ColumnRef => Ok(Expression::ColumnRef(identifier::column_ref(node)?)),
        Rule::CaseExpr => case_expr(node, depth),
        Rule::SimpleFuncExpr => simple_func(node, depth),
        Rule::ComplexFuncExpr => complex_func(node, depth),
        Rule::WindowFunctionExpr => window_func(node, depth),
        Rule::SelectWithParens | Rule::SelectNoParens => subquery(node, depth),
        Rule::CurTimestampFunc
        | Rule::SysdateFunc
        | Rule::CurTimeFunc
        | Rule::CurDateFunc
        | Rule::UtcTimestampFunc
        | Rule::UtcTimeFunc
        | Rule::UtcDateFunc => time_func(node),
        Rule::InExpr => in_expr(node, depth),
        Rule::ExprList => {
            let items = expr_list(node, depth)?;
            Ok(collection_or_single(items, node))
        }
        other => Err(Error::structural(
            format!("production {other:?} is not an expression"),
            node.span,
        )),
    }
}

fn child_nodes(node: &CstNode) -> Vec<&CstNode> {
    node.children
        .iter()
        .filter_map(|c| match c {
            CstChild::Node(n) => Some(n),
            _ => None,
        })
        .collect()
}

/// Flatten a (possibly nested) `expr_list` in source order.
pub(crate) fn expr_list(node: &CstNode, depth: Depth) -> Result<Vec<Expression>> {
    let mut out = Vec::new();
    for child in child_nodes(node) {
        if child.rule == Rule::ExprList {
            out.extend(expr_list(child, depth)?);
        } else {
            out.push(expr(child, depth)?);
        }
    }
    Ok(out)
}

fn collection_or_single(mut items: Vec<Expression>, node: &CstNode) -> Expression {
    if items.len() == 1 {
        if let Some(single) = items.pop() {
            return single;
        }
    }
    let mut collection = CollectionExpression::new(items);
    collection.span = node.span;
    Expression::Collection(collection)
}

fn subquery(node: &CstNode, depth: Depth) -> Result<Expression> {
    Ok(Expression::SubQuery(Box::new(select::build_select(
        node, depth,
    )?)))
}

fn with_span(mut e: Expression, node: &CstNode) -> Expression {
    if let Expression::Compound(ref mut c) = e {
        c.span = node.span;
    }
    e
}

fn logical_expr(node: &CstNode, depth: Depth) -> Result<Expression> {
    let nodes = child_nodes(node);

    // `@var := expr`
    if let Some(var) = node.token(TokenKind::UserVariable) {
        if let Some(value) = node.find(Rule::Expr) {
            let left = Expression::Const(ConstExpr::new(var.text.clone()));
            return Ok(with_span(
                Expression::binary(left, expr(value, depth)?, Operator::SetVar),
                node,
            ));
        }
    }

    let operands = node.find_all(Rule::Expr);
    if node.has(TokenKind::Not) && operands.len() == 1 {
        return Ok(with_span(
            Expression::unary(expr(operands[0], depth)?, Operator::Not),
            node,
        ));
    }
    if operands.len() == 2 {
        let operator = if node.has(TokenKind::And) || node.has(TokenKind::AndOp) {
            Operator::And
        } else if node.has(TokenKind::Or) || node.has(TokenKind::Cnnop) {
            Operator::Or
        } else if node.has(TokenKind::Xor) {
            Operator::Xor
        } else {
            return Err(Error::structural(
                "two expression operands without a logical operator",
                node.span,
            ));
        };
        return Ok(with_span(
            Expression::binary(expr(operands[0], depth)?, expr(operands[1], depth)?, operator),
            node,
        ));
    }
    if operands.len() == 1 {
        // Parenthesized passthrough.
        return expr(operands[0], depth);
    }
    match nodes.first() {
        Some(first) => expr(first, depth),
        None => Err(Error::structural("expr production has no operand", node.span)),
    }
}

fn comparison_operator(node: &CstNode) -> Option<Operator> {
    const COMPARISONS: [(TokenKind, Operator); 7] = [
        (TokenKind::CompEq, Operator::Eq),
        (TokenKind::CompNe, Operator::Ne),
        (TokenKind::CompGe, Operator::Ge),
        (TokenKind::CompGt, Operator::Gt),
        (TokenKind::CompLe, Operator::Le),
        (TokenKind::CompLt, Operator::Lt),
        (TokenKind::CompNseq, Operator::Nseq),
    ];
    COMPARISONS
        .iter()
        .find(|(kind, _)| node.has(*kind))
        .map(|(_, op)| *op)
}

fn bool_pri(node: &CstNode, depth: Depth) -> Result<Expression> {
    let nodes = child_nodes(node);

    // `bool_pri IS [NOT] NULL | TRUE | FALSE | UNKNOWN`
    if node.has(TokenKind::Is) {
        let left = nodes
            .first()
            .ok_or_else(|| Error::structural("IS form without an operand", node.span))?;
        let right = if node.has(TokenKind::Null) {
            Expression::Null(NullExpr { span: node.span })
        } else if let Some(value) = node.token(TokenKind::BoolValue) {
            Expression::Bool(BoolValue::new(value.text.eq_ignore_ascii_case("TRUE")))
        } else if node.has(TokenKind::Unknown) {
            Expression::literal("UNKNOWN")
        } else {
            return Err(Error::structural("IS form without a right side", node.span));
        };
        let operator = if node.has(TokenKind::Not) {
            Operator::Ne
        } else {
            Operator::Eq
        };
        return Ok(with_span(
            Expression::binary(expr(left, depth)?, right, operator),
            node,
        ));
    }

    if let Some(operator) = comparison_operator(node) {
        let (left, right) = match nodes.as_slice() {
            [left, right, ..] => (left, right),
            _ => {
                return Err(Error::structural(
                    "comparison without two operands",
                    node.span,
                ))
            }
        };
        return Ok(with_span(
            Expression::binary(expr(left, depth)?, expr(right, depth)?, operator),
            node,
        ));
    }

    if nodes.len() > 1 {
        return Err(Error::structural(
            "two comparison operands without an operator",
            node.span,
        ));
    }
    match nodes.first() {
        Some(first) => expr(first, depth),
        None => Err(Error::structural("bool_pri production has no operand", node.span)),
    }
}

fn predicate(node: &CstNode, depth: Depth) -> Result<Expression> {
    let nodes = child_nodes(node);
    let negated = node.has(TokenKind::Not);
    let left = nodes
        .first()
        .ok_or_else(|| Error::structural("predicate without a left operand", node.span))?;

    if node.has(TokenKind::In) && !node.has(TokenKind::Member) {
        let operator = if negated { Operator::NotIn } else { Operator::In };
        let right_node = node
            .find(Rule::InExpr)
            .or_else(|| nodes.get(1).copied())
            .ok_or_else(|| Error::structural("IN without a value set", node.span))?;
        return Ok(with_span(
            Expression::binary(expr(left, depth)?, expr(right_node, depth)?, operator),
            node,
        ));
    }

    if node.has(TokenKind::Between) {
        let (low, high) = match nodes.as_slice() {
            [_, low, high, ..] => (low, high),
            _ => return Err(Error::structural("BETWEEN without both bounds", node.span)),
        };
        let operator = if negated { Operator::NotBetween } else { Operator::Between };
        let range = Expression::binary(expr(low, depth)?, expr(high, depth)?, Operator::And);
        return Ok(with_span(
            Expression::binary(expr(left, depth)?, range, operator),
            node,
        ));
    }

    if node.has(TokenKind::Like) {
        // The pattern and the ESCAPE text each arrive as a `simple_expr`
        // or a `string_val_list`; whichever alternative sits at the
        // smaller child index is the pattern.
        let mut operands = nodes
            .iter()
            .filter(|n| matches!(n.rule, Rule::SimpleExpr | Rule::StringValList));
        let pattern = operands
            .next()
            .ok_or_else(|| Error::structural("LIKE without a pattern", node.span))?;
        let escape = operands.next();
        let right = match escape {
            Some(escape) => Expression::binary(
                like_operand(pattern, depth)?,
                like_operand(escape, depth)?,
                Operator::Escape,
            ),
            None => like_operand(pattern, depth)?,
        };
        let operator = if negated { Operator::NotLike } else { Operator::Like };
        return Ok(with_span(
            Expression::binary(expr(left, depth)?, right, operator),
            node,
        ));
    }

    if node.has(TokenKind::Regexp) {
        let right = nodes
            .get(1)
            .ok_or_else(|| Error::structural("REGEXP without a pattern", node.span))?;
        let operator = if negated { Operator::NotRegexp } else { Operator::Regexp };
        return Ok(with_span(
            Expression::binary(expr(left, depth)?, expr(right, depth)?, operator),
            node,
        ));
    }

    if node.has(TokenKind::Member) {
        let right = nodes
            .get(1)
            .ok_or_else(|| Error::structural("MEMBER OF without a target", node.span))?;
        let operator = if negated { Operator::NotMemberOf } else { Operator::MemberOf };
        return Ok(with_span(
            Expression::binary(expr(left, depth)?, expr(right, depth)?, operator),
            node,
        ));
    }

    if nodes.len() > 1 {
        return Err(Error::structural(
            "predicate with two operands but no recognized operator",
            node.span,
        ));
    }
    expr(left, depth)
}

/// A LIKE operand: a `simple_expr`, or a `string_val_list` of adjacent
/// string literals built as a collection.
fn like_operand(node: &CstNode, depth: Depth) -> Result<Expression> {
    if node.rule != Rule::StringValList {
        return expr(node, depth);
    }
    let items: Vec<Expression> = node
        .tokens(TokenKind::StringValue)
        .iter()
        .map(|t| {
            let mut c = ConstExpr::new(t.text.clone());
            c.span = t.span;
            Expression::Const(c)
        })
        .collect();
    if items.is_empty() {
        return Err(Error::structural("string list without string values", node.span));
    }
    Ok(collection_or_single(items, node))
}

fn in_expr(node: &CstNode, depth: Depth) -> Result<Expression> {
    if let Some(select_node) = node.find(Rule::SelectWithParens) {
        return subquery(select_node, depth);
    }
    let items = match node.find(Rule::ExprList) {
        Some(list) => expr_list(list, depth)?,
        None => child_nodes(node)
            .into_iter()
            .map(|n| expr(n, depth))
            .collect::<Result<_>>()?,
    };
    let mut collection = CollectionExpression::new(items);
    collection.span = node.span;
    Ok(Expression::Collection(collection))
}

fn arithmetic_operator(node: &CstNode) -> Option<Operator> {
    const ARITHMETIC: [(TokenKind, Operator); 10] = [
        (TokenKind::Plus, Operator::Add),
        (TokenKind::Dash, Operator::Sub),
        (TokenKind::Star, Operator::Mul),
        (TokenKind::Slash, Operator::Div),
        (TokenKind::Percent, Operator::Mod),
        (TokenKind::Caret, Operator::BitXor),
        (TokenKind::Ampersand, Operator::BitAnd),
        (TokenKind::Pipe, Operator::BitOr),
        (TokenKind::ShiftLeft, Operator::ShiftLeft),
        (TokenKind::ShiftRight, Operator::ShiftRight),
    ];
    ARITHMETIC
        .iter()
        .find(|(kind, _)| node.has(*kind))
        .map(|(_, op)| *op)
}

fn interval_operand(node: &CstNode, depth: Depth) -> Result<Expression> {
    let value = node
        .find(Rule::Expr)
        .or_else(|| node.find(Rule::BitExpr))
        .ok_or_else(|| Error::structural("INTERVAL without a value", node.span))?;
    let unit = node
        .find(Rule::DateUnit)
        .map(|n| n.text())
        .ok_or_else(|| Error::structural("INTERVAL without a unit", node.span))?;
    let mut interval = IntervalExpression::new(expr(value, depth)?, unit);
    interval.span = node.span;
    Ok(Expression::Interval(Box::new(interval)))
}

fn bit_expr(node: &CstNode, depth: Depth) -> Result<Expression> {
    // `INTERVAL v unit + date` and `date + INTERVAL v unit` normalize to
    // the date operand on the left, the interval on the right.
    if node.has(TokenKind::Interval) {
        let operator = arithmetic_operator(node).ok_or_else(|| {
            Error::structural("interval arithmetic without an operator", node.span)
        })?;
        let other = node
            .find(Rule::BitExpr)
            .ok_or_else(|| Error::structural("interval arithmetic without a date operand", node.span))?;
        let interval = interval_operand(node, depth)?;
        return Ok(with_span(
            Expression::binary(expr(other, depth)?, interval, operator),
            node,
        ));
    }

    let operands = node.find_all(Rule::BitExpr);
    if operands.len() == 2 {
        let operator = arithmetic_operator(node).ok_or_else(|| {
            Error::structural("two bit_expr operands without an operator", node.span)
        })?;
        return Ok(with_span(
            Expression::binary(expr(operands[0], depth)?, expr(operands[1], depth)?, operator),
            node,
        ));
    }

    match child_nodes(node).first() {
        Some(first) => expr(first, depth),
        None => Err(Error::structural("bit_expr production has no operand", node.span)),
    }
}

fn simple_expr(node: &CstNode, depth: Depth) -> Result<Expression> {
    let nodes = child_nodes(node);

    if node.has(TokenKind::Exists) {
        let select_node = node
            .find(Rule::SelectWithParens)
            .ok_or_else(|| Error::structural("EXISTS without a subquery", node.span))?;
        return Ok(with_span(
            Expression::unary(subquery(select_node, depth)?, Operator::Exists),
            node,
        ));
    }

    // Prefix forms: the operator terminal leads the production.
    if let Some(first) = node.leading_tokens().first() {
        let operator = match first.kind {
            TokenKind::Dash => Some(Operator::Sub),
            TokenKind::Plus => Some(Operator::Add),
            TokenKind::Tilde => Some(Operator::BitNot),
            TokenKind::Bang | TokenKind::Not => Some(Operator::Not),
            TokenKind::Binary => Some(Operator::Binary),
            _ => None,
        };
        if let Some(operator) = operator {
            let operand = nodes.first().ok_or_else(|| {
                Error::structural("prefix operator without an operand", node.span)
            })?;
            return Ok(with_span(
                Expression::unary(expr(operand, depth)?, operator),
                node,
            ));
        }
    }

    if node.has(TokenKind::LBrace) {
        let name = node
            .token_text(TokenKind::Identifier)
            .ok_or_else(|| Error::structural("brace expression without a name", node.span))?
            .to_string();
        let inner = nodes
            .first()
            .ok_or_else(|| Error::structural("brace expression without a body", node.span))?;
        return Ok(Expression::Brace(Box::new(BraceExpr {
            name,
            inner: expr(inner, depth)?,
            span: node.span,
        })));
    }

    if node.has(TokenKind::Match) {
        return fulltext(node, depth);
    }

    // `INTERVAL v unit` standing alone in value position.
    if node.has(TokenKind::Interval) {
        return interval_operand(node, depth);
    }

    if node.has(TokenKind::Row) {
        let list = node
            .find(Rule::ExprList)
            .ok_or_else(|| Error::structural("ROW without an element list", node.span))?;
        let mut collection = CollectionExpression::new(expr_list(list, depth)?);
        collection.span = node.span;
        return Ok(Expression::Collection(collection));
    }

    if let Some(list) = node.find(Rule::ExprList) {
        return Ok(collection_or_single(expr_list(list, depth)?, node));
    }

    if let Some(var) = node.token(TokenKind::UserVariable) {
        if nodes.is_empty() {
            let mut c = ConstExpr::new(var.text.clone());
            c.span = var.span;
            return Ok(Expression::Const(c));
        }
    }

    match nodes.first() {
        Some(first) => expr(first, depth),
        None => Err(Error::structural("simple_expr production has no operand", node.span)),
    }
}

fn fulltext(node: &CstNode, depth: Depth) -> Result<Expression> {
    let _ = depth;
    let columns = node
        .find(Rule::ColumnList)
        .map(identifier::column_list)
        .transpose()?
        .unwrap_or_else(|| {
            node.find_all(Rule::ColumnRef)
                .into_iter()
                .filter_map(|n| identifier::column_ref(n).ok())
                .collect()
        });
    if columns.is_empty() {
        return Err(Error::structural("MATCH without columns", node.span));
    }
    let against = node
        .token_text(TokenKind::StringValue)
        .ok_or_else(|| Error::structural("AGAINST without a pattern", node.span))?
        .to_string();
    let search_mode = if node.has(TokenKind::Boolean) {
        Some(TextSearchMode::BooleanMode)
    } else if node.has(TokenKind::Natural) {
        Some(TextSearchMode::NaturalLanguageMode)
    } else {
        None
    };
    Ok(Expression::FullText(Box::new(FullTextSearch {
        columns,
        against,
        search_mode,
        span: node.span,
    })))
}

fn literal(node: &CstNode, depth: Depth) -> Result<Expression> {
    if node.has(TokenKind::Null) {
        return Ok(Expression::Null(NullExpr { span: node.span }));
    }
    if let Some(value) = node.token(TokenKind::BoolValue) {
        let mut b = BoolValue::new(value.text.eq_ignore_ascii_case("TRUE"));
        b.span = node.span;
        return Ok(Expression::Bool(b));
    }
    // `DEFAULT now()` style attributes route the function through here.
    if let Some(func) = child_nodes(node)
        .into_iter()
        .find(|n| !matches!(n.rule, Rule::Literal | Rule::NumberLiteral))
    {
        return expr(func, depth);
    }
    if let Some(inner) = node.find(Rule::Literal).or_else(|| node.find(Rule::NumberLiteral)) {
        // Signed literal: keep the sign in the raw text.
        if node.has(TokenKind::Dash) {
            let mut c = ConstExpr::new(format!("-{}", inner.text()));
            c.span = node.span;
            return Ok(Expression::Const(c));
        }
        return literal(inner, depth);
    }
    let mut c = ConstExpr::new(node.text());
    c.span = node.span;
    Ok(Expression::Const(c))
}

fn expr_or_default(node: &CstNode, depth: Depth) -> Result<Expression> {
    if node.has(TokenKind::Default) && child_nodes(node).is_empty() {
        return Ok(Expression::Default(crate::ast::expression::DefaultExpr {
            span: node.span,
        }));
    }
    match child_nodes(node).first() {
        Some(first) => expr(first, depth),
        None => Err(Error::structural("value slot without an expression", node.span)),
    }
}

fn case_expr(node: &CstNode, depth: Depth) -> Result<Expression> {
    let case_value = node.find(Rule::Expr).map(|n| expr(n, depth)).transpose()?;
    let when_nodes = match node.find(Rule::WhenClauseList) {
        Some(list) => list.find_all(Rule::WhenClause),
        None => node.find_all(Rule::WhenClause),
    };
    let mut when_clauses = Vec::with_capacity(when_nodes.len());
    for when_node in when_nodes {
        let parts = child_nodes(when_node);
        let (when, then) = match parts.as_slice() {
            [when, then, ..] => (when, then),
            _ => {
                return Err(Error::structural(
                    "WHEN clause without both operands",
                    when_node.span,
                ))
            }
        };
        when_clauses.push(WhenClause {
            when: expr(when, depth)?,
            then: expr(then, depth)?,
            span: when_node.span,
        });
    }
    if when_clauses.is_empty() {
        return Err(Error::structural("CASE without WHEN clauses", node.span));
    }
    let case_default = node
        .find(Rule::CaseDefault)
        .and_then(|n| child_nodes(n).first().copied())
        .map(|n| expr(n, depth))
        .transpose()?;
    Ok(Expression::Case(Box::new(CaseWhen {
        case_value,
        when_clauses,
        case_default,
        span: node.span,
    })))
}

fn function_name(node: &CstNode) -> Result<String> {
    if let Some(name_node) = node.find(Rule::FunctionName) {
        return Ok(name_node.text());
    }
    if let Some(token) = node.leading_tokens().first() {
        return Ok(token.text.to_uppercase());
    }
    Err(Error::structural("function call without a name", node.span))
}

fn quantifier_options(node: &CstNode) -> Vec<FunctionOption> {
    let mut options = Vec::new();
    if node.has(TokenKind::Distinct) {
        options.push(FunctionOption::Expr(Expression::literal("DISTINCT")));
    }
    if node.has(TokenKind::All) {
        options.push(FunctionOption::Expr(Expression::literal("ALL")));
    }
    if node.has(TokenKind::Unique) {
        options.push(FunctionOption::Expr(Expression::literal("UNIQUE")));
    }
    options
}

fn function_params(node: &CstNode, depth: Depth) -> Result<Vec<FunctionParam>> {
    let items = match node.find(Rule::ExprList) {
        Some(list) => expr_list(list, depth)?,
        None => {
            let mut items = Vec::new();
            for child in child_nodes(node) {
                if matches!(
                    child.rule,
                    Rule::Expr | Rule::BitExpr | Rule::SimpleExpr | Rule::Predicate | Rule::BoolPri
                ) {
                    items.push(expr(child, depth)?);
                }
            }
            items
        }
    };
    Ok(items.into_iter().map(FunctionParam::new).collect())
}

fn simple_func(node: &CstNode, depth: Depth) -> Result<Expression> {
    let name = function_name(node)?;
    let mut params = function_params(node, depth)?;
    // `COUNT(*)` and friends: the star is the whole argument.
    if params.is_empty() && node.has(TokenKind::Star) {
        params.push(FunctionParam::new(Expression::column("*")));
    }
    let mut call = FunctionCall::new(name, params);
    call.options = quantifier_options(node);
    call.span = node.span;
    Ok(Expression::FunctionCall(Box::new(call)))
}

fn time_func(node: &CstNode) -> Result<Expression> {
    let name = node
        .all_tokens()
        .first()
        .map(|t| {
            TIME_FUNC_NAMES
                .get(&t.kind)
                .map(|canonical| (*canonical).to_string())
                .unwrap_or_else(|| t.text.to_uppercase())
        })
        .ok_or_else(|| Error::structural("time function without a name", node.span))?;
    let params = node
        .token(TokenKind::IntNum)
        .map(|t| vec![FunctionParam::new(Expression::literal(t.text.clone()))])
        .unwrap_or_default();
    let mut call = FunctionCall::new(name, params);
    call.span = node.span;
    Ok(Expression::FunctionCall(Box::new(call)))
}

fn complex_func(node: &CstNode, depth: Depth) -> Result<Expression> {
    let span = node.span;
    let head = node
        .leading_tokens()
        .first()
        .map(|t| (t.kind, t.text.to_uppercase()));
    let Some((kind, name)) = head else {
        // Wrapped alternative (`json_value_expr`, time functions, ...).
        return match child_nodes(node).first() {
            Some(first) => expr(first, depth),
            None => Err(Error::structural("empty complex function production", span)),
        };
    };

    match kind {
        TokenKind::Cast | TokenKind::Convert => {
            let operand = child_nodes(node)
                .into_iter()
                .find(|n| !matches!(n.rule, Rule::CastDataType | Rule::DataType))
                .ok_or_else(|| Error::structural("CAST without an operand", span))?;
            let mut param = FunctionParam::new(expr(operand, depth)?);
            if let Some(type_node) = node
                .find(Rule::CastDataType)
                .or_else(|| node.find(Rule::DataType))
            {
                param = param.with_option(FunctionOption::DataType(
                    crate::builder::data_type::build_data_type(type_node)?,
                ));
            } else if node.has(TokenKind::Using) {
                // `CONVERT(expr USING charset)`
                let charset = node
                    .find(Rule::CharsetName)
                    .map(|n| n.text())
                    .or_else(|| node.token_text(TokenKind::Identifier).map(str::to_string))
                    .ok_or_else(|| Error::structural("CONVERT USING without a charset", span))?;
                param = param.with_option(FunctionOption::Expr(Expression::literal(charset)));
            } else {
                return Err(Error::structural("CONVERT without a target", span));
            }
            let mut call = FunctionCall::new(name, vec![param]);
            call.span = span;
            Ok(Expression::FunctionCall(Box::new(call)))
        }
        TokenKind::Position => {
            let mut call = FunctionCall::new(name, function_params(node, depth)?);
            call.span = span;
            Ok(Expression::FunctionCall(Box::new(call)))
        }
        TokenKind::Trim => trim_func(node, depth),
        TokenKind::DateAdd | TokenKind::DateSub | TokenKind::AddDate | TokenKind::SubDate => {
            let params_node = node
                .find(Rule::DateParams)
                .ok_or_else(|| Error::structural("date arithmetic without parameters", span))?;
            let parts = child_nodes(params_node);
            let date = parts
                .first()
                .filter(|n| n.rule != Rule::DateUnit)
                .ok_or_else(|| Error::structural("date arithmetic without a date", span))?;
            let interval = interval_operand(params_node, depth)?;
            let mut call = FunctionCall::new(
                name,
                vec![
                    FunctionParam::new(expr(date, depth)?),
                    FunctionParam::new(interval),
                ],
            );
            call.span = span;
            Ok(Expression::FunctionCall(Box::new(call)))
        }
        TokenKind::TimestampAdd | TokenKind::TimestampDiff => {
            let params_node = node
                .find(Rule::TimestampParams)
                .ok_or_else(|| Error::structural("timestamp arithmetic without parameters", span))?;
            let unit = params_node
                .find(Rule::DateUnit)
                .map(|n| n.text())
                .ok_or_else(|| Error::structural("timestamp arithmetic without a unit", span))?;
            let mut params = vec![FunctionParam::new(Expression::literal(unit))];
            for child in child_nodes(params_node) {
                if child.rule != Rule::DateUnit {
                    params.push(FunctionParam::new(expr(child, depth)?));
                }
            }
            let mut call = FunctionCall::new(name, params);
            call.span = span;
            Ok(Expression::FunctionCall(Box::new(call)))
        }
        TokenKind::Extract => {
            let unit = node
                .find(Rule::DateUnit)
                .map(|n| n.text())
                .ok_or_else(|| Error::structural("EXTRACT without a unit", span))?;
            let operand = child_nodes(node)
                .into_iter()
                .find(|n| n.rule != Rule::DateUnit)
                .ok_or_else(|| Error::structural("EXTRACT without an operand", span))?;
            let mut call = FunctionCall::new(
                name,
                vec![
                    FunctionParam::new(Expression::literal(unit)),
                    FunctionParam::new(expr(operand, depth)?),
                ],
            );
            call.span = span;
            Ok(Expression::FunctionCall(Box::new(call)))
        }
        TokenKind::GetFormat => {
            let unit = node
                .find(Rule::GetFormatUnit)
                .map(|n| n.text())
                .ok_or_else(|| Error::structural("GET_FORMAT without a unit", span))?;
            let mut params = vec![FunctionParam::new(Expression::literal(unit))];
            params.extend(function_params(node, depth)?);
            let mut call = FunctionCall::new(name, params);
            call.span = span;
            Ok(Expression::FunctionCall(Box::new(call)))
        }
        TokenKind::WeightString => {
            let mut call = FunctionCall::new(name, function_params(node, depth)?);
            if let Some(weights) = node.find(Rule::WsNweights) {
                call.options
                    .push(FunctionOption::Expr(Expression::literal(weights.text())));
            }
            call.span = span;
            Ok(Expression::FunctionCall(Box::new(call)))
        }
        TokenKind::GroupConcat | TokenKind::Listagg => ordered_aggregate(node, depth, name),
        TokenKind::JsonValue => json_value(node, depth),
        _ => {
            let mut call = FunctionCall::new(name, function_params(node, depth)?);
            call.options = quantifier_options(node);
            call.span = span;
            Ok(Expression::FunctionCall(Box::new(call)))
        }
    }
}

fn trim_func(node: &CstNode, depth: Depth) -> Result<Expression> {
    let body = node.find(Rule::ParameterizedTrim).unwrap_or(node);
    let mut call = FunctionCall::new("TRIM", function_params(body, depth)?);
    for (kind, text) in [
        (TokenKind::Both, "BOTH"),
        (TokenKind::Leading, "LEADING"),
        (TokenKind::Trailing, "TRAILING"),
    ] {
        if body.has(kind) || node.has(kind) {
            call.options.push(FunctionOption::Expr(Expression::literal(text)));
        }
    }
    call.span = node.span;
    Ok(Expression::FunctionCall(Box::new(call)))
}

/// `GROUP_CONCAT` / `LISTAGG` without an OVER clause: the internal ORDER BY
/// and separator travel as options.
fn ordered_aggregate(node: &CstNode, depth: Depth, name: String) -> Result<Expression> {
    let mut call = FunctionCall::new(name, function_params(node, depth)?);
    call.options = quantifier_options(node);
    if let Some(order_node) = node.find(Rule::OrderBy) {
        call.options.push(FunctionOption::OrderBy(select::build_order_by(
            order_node, depth,
        )?));
    }
    if node.has(TokenKind::Separator) {
        let separator = node
            .token_text(TokenKind::StringValue)
            .ok_or_else(|| Error::structural("SEPARATOR without a string", node.span))?;
        call.options
            .push(FunctionOption::Expr(Expression::literal(separator)));
    }
    call.span = node.span;
    Ok(Expression::FunctionCall(Box::new(call)))
}

fn json_value(node: &CstNode, depth: Depth) -> Result<Expression> {
    let body = node.find(Rule::JsonValueExpr).unwrap_or(node);
    let mut call = FunctionCall::new("JSON_VALUE", function_params(body, depth)?);
    if let Some(type_node) = body
        .find(Rule::CastDataType)
        .or_else(|| body.find(Rule::DataType))
    {
        call.options.push(FunctionOption::DataType(
            crate::builder::data_type::build_data_type(type_node)?,
        ));
    }
    let mut on = JsonOnOption::default();
    if let Some(response) = body.find(Rule::JsonOnResponse) {
        if let Some(empty) = response.find(Rule::OnEmpty) {
            on.on_empty = child_nodes(empty)
                .first()
                .map(|n| expr(n, depth))
                .transpose()?;
        }
        if let Some(error) = response.find(Rule::OnError) {
            on.on_error = child_nodes(error)
                .first()
                .map(|n| expr(n, depth))
                .transpose()?;
        }
        on.span = response.span;
        call.options.push(FunctionOption::JsonOn(on));
    }
    call.span = node.span;
    Ok(Expression::FunctionCall(Box::new(call)))
}

fn window_func(node: &CstNode, depth: Depth) -> Result<Expression> {
    let name = function_name(node)?;
    let mut params = function_params(node, depth)?;
    if params.is_empty() && node.has(TokenKind::Star) {
        params.push(FunctionParam::new(Expression::column("*")));
    }
    let mut options = quantifier_options(node);
    if let Some(order_node) = node.find(Rule::OrderBy) {
        options.push(FunctionOption::OrderBy(select::build_order_by(
            order_node, depth,
        )?));
    }
    if node.has(TokenKind::Separator) {
        if let Some(separator) = node.token_text(TokenKind::StringValue) {
            options.push(FunctionOption::Expr(Expression::literal(separator)));
        }
    }
    if let Some(params_node) = node.find(Rule::WinFunFirstLastParams) {
        options.extend(null_treatment_options(params_node));
    }
    options.extend(null_treatment_options(node));

    let spec_node = node
        .find(Rule::GeneralizedWindowClause)
        .ok_or_else(|| Error::structural("window function without an OVER clause", node.span))?;
    let window = window_spec(spec_node, depth)?;

    Ok(Expression::WindowFunction(Box::new(WindowFunction {
        name,
        params,
        options,
        window,
        span: node.span,
    })))
}

fn null_treatment_options(node: &CstNode) -> Vec<FunctionOption> {
    let mut options = Vec::new();
    if let Some(ri) = node.find(Rule::RespectOrIgnore) {
        let text = if ri.has(TokenKind::Ignore) {
            "IGNORE NULLS"
        } else {
            "RESPECT NULLS"
        };
        options.push(FunctionOption::Expr(Expression::literal(text)));
    }
    if let Some(fl) = node.find(Rule::FirstOrLast) {
        let text = if fl.has(TokenKind::Last) {
            "FROM LAST"
        } else {
            "FROM FIRST"
        };
        options.push(FunctionOption::Expr(Expression::literal(text)));
    }
    options
}

/// Build a window specification from a `generalized_window_clause`.
pub(crate) fn window_spec(node: &CstNode, depth: Depth) -> Result<WindowSpec> {
    let mut spec = WindowSpec {
        name: node.token_text(TokenKind::Identifier).map(str::to_string),
        span: node.span,
        ..WindowSpec::default()
    };
    if let Some(partition) = node.find(Rule::WinPartition) {
        spec.partition_by = match partition.find(Rule::ExprList) {
            Some(list) => expr_list(list, depth)?,
            None => child_nodes(partition)
                .into_iter()
                .map(|n| expr(n, depth))
                .collect::<Result<_>>()?,
        };
    }
    if let Some(order) = node.find(Rule::WinOrder) {
        let order_node = order.find(Rule::OrderBy).unwrap_or(order);
        spec.order_by = Some(select::build_order_by(order_node, depth)?);
    }
    if let Some(frame_node) = node.find(Rule::WinWindow) {
        spec.frame = Some(window_frame(frame_node, depth)?);
    }
    Ok(spec)
}

fn window_frame(node: &CstNode, depth: Depth) -> Result<WindowFrame> {
    let unit = if node.has(TokenKind::Rows) {
        WindowFrameUnit::Rows
    } else if node.has(TokenKind::Range) {
        WindowFrameUnit::Range
    } else {
        return Err(Error::structural("window frame without ROWS or RANGE", node.span));
    };
    let body = node.find(Rule::WinInterval).unwrap_or(node);
    let bounds = body.find_all(Rule::WinBounding);
    let mut iter = bounds.into_iter();
    let start = match iter.next() {
        Some(b) => window_bound(b, depth)?,
        None => return Err(Error::structural("window frame without a bound", node.span)),
    };
    let end = iter.next().map(|b| window_bound(b, depth)).transpose()?;
    Ok(WindowFrame { unit, start, end, span: node.span })
}

fn window_bound(node: &CstNode, depth: Depth) -> Result<WindowBound> {
    if node.has(TokenKind::Current) {
        return Ok(WindowBound::CurrentRow);
    }
    let following = node.has(TokenKind::Following);
    if node.has(TokenKind::Unbounded) {
        return Ok(if following {
            WindowBound::UnboundedFollowing
        } else {
            WindowBound::UnboundedPreceding
        });
    }
    let operand = child_nodes(node)
        .first()
        .copied()
        .ok_or_else(|| Error::structural("window bound without an offset", node.span))?;
    let offset = expr(operand, depth)?;
    Ok(if following {
        WindowBound::Following(offset)
    } else {
        WindowBound::Preceding(offset)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::expression::CompoundExpression;

    fn lit(text: &str) -> CstNode {
        CstNode::new(Rule::Literal).with_token(TokenKind::IntNum, text)
    }

    fn simple(text: &str) -> CstNode {
        CstNode::new(Rule::SimpleExpr)
            .with_node(CstNode::new(Rule::Literal).with_token(TokenKind::StringValue, text))
    }

    fn bit(text: &str) -> CstNode {
        CstNode::new(Rule::BitExpr).with_node(
            CstNode::new(Rule::SimpleExpr).with_node(lit(text)),
        )
    }

    fn unwrap_compound(e: Expression) -> CompoundExpression {
        match e {
            Expression::Compound(c) => *c,
            other => panic!("expected compound expression, got {other:?}"),
        }
    }

    fn const_text(e: &Expression) -> &str {
        match e {
            Expression::Const(c) => &c.value,
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn literal_tower_collapses_to_a_const() {
        let node = CstNode::new(Rule::Expr).with_node(
            CstNode::new(Rule::BoolPri).with_node(
                CstNode::new(Rule::Predicate).with_node(bit("42")),
            ),
        );
        assert_eq!(const_text(&build_expression(&node).unwrap()), "42");
    }

    #[test]
    fn addition_builds_a_binary_compound() {
        let node = CstNode::new(Rule::BitExpr)
            .with_node(bit("1"))
            .with_token(TokenKind::Plus, "+")
            .with_node(bit("2"));
        let c = unwrap_compound(build_expression(&node).unwrap());
        assert_eq!(c.operator, Operator::Add);
        assert_eq!(const_text(&c.left), "1");
        assert_eq!(const_text(c.right.as_ref().unwrap()), "2");
    }

    #[test]
    fn is_not_null_becomes_ne_null() {
        let node = CstNode::new(Rule::BoolPri)
            .with_node(CstNode::new(Rule::Predicate).with_node(bit("c")))
            .with_token(TokenKind::Is, "IS")
            .with_token(TokenKind::Not, "NOT")
            .with_token(TokenKind::Null, "NULL");
        let c = unwrap_compound(build_expression(&node).unwrap());
        assert_eq!(c.operator, Operator::Ne);
        assert!(matches!(c.right, Some(Expression::Null(_))));
    }

    #[test]
    fn between_folds_bounds_into_an_and_range() {
        let node = CstNode::new(Rule::Predicate)
            .with_node(bit("x"))
            .with_token(TokenKind::Between, "BETWEEN")
            .with_node(bit("1"))
            .with_token(TokenKind::And, "AND")
            .with_node(CstNode::new(Rule::Predicate).with_node(bit("9")));
        let c = unwrap_compound(build_expression(&node).unwrap());
        assert_eq!(c.operator, Operator::Between);
        let range = unwrap_compound(c.right.unwrap());
        assert_eq!(range.operator, Operator::And);
        assert_eq!(const_text(&range.left), "1");
    }

    #[test]
    fn like_escape_uses_child_position_not_arrival_order() {
        let node = CstNode::new(Rule::Predicate)
            .with_node(bit("name"))
            .with_token(TokenKind::Like, "LIKE")
            .with_node(simple("a%"))
            .with_token(TokenKind::Escape, "ESCAPE")
            .with_node(simple("!"));
        let c = unwrap_compound(build_expression(&node).unwrap());
        assert_eq!(c.operator, Operator::Like);
        let escape = unwrap_compound(c.right.unwrap());
        assert_eq!(escape.operator, Operator::Escape);
        assert_eq!(const_text(&escape.left), "a%");
        assert_eq!(const_text(escape.right.as_ref().unwrap()), "!");
    }

    #[test]
    fn like_string_list_pattern_keeps_the_escape_operand() {
        let pattern = CstNode::new(Rule::StringValList)
            .with_token(TokenKind::StringValue, "a%")
            .with_token(TokenKind::StringValue, "b%");
        let node = CstNode::new(Rule::Predicate)
            .with_node(bit("name"))
            .with_token(TokenKind::Like, "LIKE")
            .with_node(pattern)
            .with_token(TokenKind::Escape, "ESCAPE")
            .with_node(simple("!"));
        let c = unwrap_compound(build_expression(&node).unwrap());
        assert_eq!(c.operator, Operator::Like);
        let escape = unwrap_compound(c.right.unwrap());
        assert_eq!(escape.operator, Operator::Escape);
        match &escape.left {
            Expression::Collection(list) => {
                assert_eq!(list.items.len(), 2);
                assert_eq!(const_text(&list.items[0]), "a%");
            }
            other => panic!("expected string list pattern, got {other:?}"),
        }
        assert_eq!(const_text(escape.right.as_ref().unwrap()), "!");
    }

    #[test]
    fn not_in_list_builds_a_collection() {
        let node = CstNode::new(Rule::Predicate)
            .with_node(bit("x"))
            .with_token(TokenKind::Not, "NOT")
            .with_token(TokenKind::In, "IN")
            .with_node(
                CstNode::new(Rule::InExpr).with_node(
                    CstNode::new(Rule::ExprList)
                        .with_node(bit("1"))
                        .with_node(bit("2")),
                ),
            );
        let c = unwrap_compound(build_expression(&node).unwrap());
        assert_eq!(c.operator, Operator::NotIn);
        match c.right.unwrap() {
            Expression::Collection(items) => assert_eq!(items.items.len(), 2),
            other => panic!("expected collection, got {other:?}"),
        }
    }

    #[test]
    fn leading_interval_swaps_onto_the_right() {
        // `INTERVAL 1 DAY + d` arrives with the interval parts first.
        let node = CstNode::new(Rule::BitExpr)
            .with_token(TokenKind::Interval, "INTERVAL")
            .with_node(CstNode::new(Rule::Expr).with_node(
                CstNode::new(Rule::BoolPri).with_node(
                    CstNode::new(Rule::Predicate).with_node(bit("1")),
                ),
            ))
            .with_node(CstNode::new(Rule::DateUnit).with_token(TokenKind::Identifier, "DAY"))
            .with_token(TokenKind::Plus, "+")
            .with_node(bit("d"));
        let c = unwrap_compound(build_expression(&node).unwrap());
        assert_eq!(c.operator, Operator::Add);
        assert_eq!(const_text(&c.left), "d");
        match c.right.unwrap() {
            Expression::Interval(i) => assert_eq!(i.unit, "DAY"),
            other => panic!("expected interval on the right, got {other:?}"),
        }
    }

    #[test]
    fn count_star_with_distinct_option() {
        let node = CstNode::new(Rule::SimpleFuncExpr)
            .with_node(CstNode::new(Rule::FunctionName).with_token(TokenKind::Identifier, "COUNT"))
            .with_token(TokenKind::Distinct, "DISTINCT")
            .with_token(TokenKind::Star, "*");
        match build_expression(&node).unwrap() {
            Expression::FunctionCall(call) => {
                assert_eq!(call.name, "COUNT");
                assert_eq!(call.params.len(), 1);
                assert_eq!(call.options.len(), 1);
            }
            other => panic!("expected function call, got {other:?}"),
        }
    }

    #[test]
    fn cast_carries_the_target_type_as_an_option() {
        let node = CstNode::new(Rule::ComplexFuncExpr)
            .with_token(TokenKind::Cast, "CAST")
            .with_node(CstNode::new(Rule::Expr).with_node(
                CstNode::new(Rule::BoolPri).with_node(
                    CstNode::new(Rule::Predicate).with_node(bit("x")),
                ),
            ))
            .with_node(CstNode::new(Rule::CastDataType).with_node(
                CstNode::new(Rule::CharacterTypeI).with_token(TokenKind::Identifier, "CHAR"),
            ));
        match build_expression(&node).unwrap() {
            Expression::FunctionCall(call) => {
                assert_eq!(call.name, "CAST");
                assert!(matches!(
                    call.params[0].options.as_slice(),
                    [FunctionOption::DataType(_)]
                ));
            }
            other => panic!("expected function call, got {other:?}"),
        }
    }

    #[test]
    fn case_collects_when_clauses_and_default() {
        let when = CstNode::new(Rule::WhenClause)
            .with_node(bit("1"))
            .with_node(bit("2"));
        let node = CstNode::new(Rule::CaseExpr)
            .with_node(CstNode::new(Rule::WhenClauseList).with_node(when))
            .with_node(CstNode::new(Rule::CaseDefault).with_node(bit("0")));
        match build_expression(&node).unwrap() {
            Expression::Case(case) => {
                assert_eq!(case.when_clauses.len(), 1);
                assert!(case.case_value.is_none());
                assert_eq!(const_text(case.case_default.as_ref().unwrap()), "0");
            }
            other => panic!("expected CASE, got {other:?}"),
        }
    }

    #[test]
    fn window_function_requires_an_over_clause() {
        let node = CstNode::new(Rule::WindowFunctionExpr)
            .with_node(CstNode::new(Rule::FunctionName).with_token(TokenKind::Identifier, "RANK"));
        assert!(matches!(
            build_expression(&node).unwrap_err(),
            Error::StructuralInconsistency { .. }
        ));
    }

    #[test]
    fn window_frame_bounds_build_in_order() {
        let spec = CstNode::new(Rule::GeneralizedWindowClause).with_node(
            CstNode::new(Rule::WinWindow)
                .with_token(TokenKind::Rows, "ROWS")
                .with_node(
                    CstNode::new(Rule::WinBounding)
                        .with_token(TokenKind::Unbounded, "UNBOUNDED")
                        .with_token(TokenKind::Preceding, "PRECEDING"),
                )
                .with_node(
                    CstNode::new(Rule::WinBounding)
                        .with_token(TokenKind::Current, "CURRENT")
                        .with_token(TokenKind::Row, "ROW"),
                ),
        );
        let node = CstNode::new(Rule::WindowFunctionExpr)
            .with_node(CstNode::new(Rule::FunctionName).with_token(TokenKind::Identifier, "SUM"))
            .with_node(bit("x"))
            .with_node(spec);
        match build_expression(&node).unwrap() {
            Expression::WindowFunction(w) => {
                let frame = w.window.frame.unwrap();
                assert_eq!(frame.unit, WindowFrameUnit::Rows);
                assert!(matches!(frame.start, WindowBound::UnboundedPreceding));
                assert!(matches!(frame.end, Some(WindowBound::CurrentRow)));
            }
            other => panic!("expected window function, got {other:?}"),
        }
    }

    #[test]
    fn deep_nesting_fails_cleanly() {
        let mut node = CstNode::new(Rule::Expr).with_node(
            CstNode::new(Rule::BoolPri).with_node(
                CstNode::new(Rule::Predicate).with_node(bit("1")),
            ),
        );
        for _ in 0..200 {
            node = CstNode::new(Rule::Expr).with_node(node);
        }
        assert!(matches!(
            build_expression(&node).unwrap_err(),
            Error::UnsupportedConstruct { .. }
        ));
    }
}
