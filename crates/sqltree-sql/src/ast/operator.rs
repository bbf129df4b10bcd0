//! Operators attached to compound expressions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every operator a [`CompoundExpression`] can carry. Negated predicate
/// forms are their own variants so a built expression never needs a
/// separate negation flag.
///
/// [`CompoundExpression`]: crate::ast::expression::CompoundExpression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    // Comparison
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
    Nseq,

    // Logical
    And,
    Or,
    Xor,
    Not,

    // Arithmetic / bitwise
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    ShiftLeft,
    ShiftRight,
    Concat,

    // Predicates
    In,
    NotIn,
    Between,
    NotBetween,
    Like,
    NotLike,
    Regexp,
    NotRegexp,
    MemberOf,
    NotMemberOf,
    Escape,
    Exists,

    // Prefix / special forms
    Binary,
    SetVar,
    JsonExtract,
    JsonExtractUnquoted,
}

impl Operator {
    /// Whether this operator only ever appears in unary position.
    pub fn is_unary(&self) -> bool {
        matches!(
            self,
            Operator::Not | Operator::BitNot | Operator::Binary | Operator::Exists
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Ge => ">=",
            Operator::Gt => ">",
            Operator::Le => "<=",
            Operator::Lt => "<",
            Operator::Nseq => "<=>",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Xor => "XOR",
            Operator::Not => "NOT",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::BitNot => "~",
            Operator::ShiftLeft => "<<",
            Operator::ShiftRight => ">>",
            Operator::Concat => "||",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Between => "BETWEEN",
            Operator::NotBetween => "NOT BETWEEN",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::Regexp => "REGEXP",
            Operator::NotRegexp => "NOT REGEXP",
            Operator::MemberOf => "MEMBER OF",
            Operator::NotMemberOf => "NOT MEMBER OF",
            Operator::Escape => "ESCAPE",
            Operator::Exists => "EXISTS",
            Operator::Binary => "BINARY",
            Operator::SetVar => ":=",
            Operator::JsonExtract => "->",
            Operator::JsonExtractUnquoted => "->>",
        };
        f.write_str(text)
    }
}
