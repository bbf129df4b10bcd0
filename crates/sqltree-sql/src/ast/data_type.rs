//! Data type nodes
//!
//! Numeric arguments (length, precision, scale) are exact decimals parsed
//! from the declared source text, never floats.

use crate::cst::Span;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A declared column or cast-target type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Families with no dedicated structure: binary/blob, bit, bool,
    /// date/year, geometry, JSON, `SIGNED/UNSIGNED [INTEGER]` cast targets.
    General(GeneralType),
    Character(CharacterType),
    Number(NumberType),
    Timestamp(TimestampType),
    /// `ENUM(...)` / `SET(...)`
    Collection(CollectionType),
}

impl DataType {
    /// The declared type name, as it appeared in source.
    pub fn name(&self) -> &str {
        match self {
            DataType::General(t) => &t.name,
            DataType::Character(t) => &t.name,
            DataType::Number(t) => &t.name,
            DataType::Timestamp(_) => "TIMESTAMP",
            DataType::Collection(t) => &t.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            DataType::General(t) => t.span,
            DataType::Character(t) => t.span,
            DataType::Number(t) => t.span,
            DataType::Timestamp(t) => t.span,
            DataType::Collection(t) => t.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default)]
    pub span: Span,
}

impl GeneralType {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self { name: name.into(), args, span: Span::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterType {
    pub name: String,
    pub length: Option<Decimal>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    #[serde(default)]
    pub binary: bool,
    #[serde(default)]
    pub span: Span,
}

impl CharacterType {
    pub fn new(name: impl Into<String>, length: Option<Decimal>) -> Self {
        Self {
            name: name.into(),
            length,
            charset: None,
            collation: None,
            binary: false,
            span: Span::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberType {
    pub name: String,
    pub precision: Option<Decimal>,
    pub scale: Option<Decimal>,
    /// `None` when neither SIGNED nor UNSIGNED was declared.
    pub signed: Option<bool>,
    #[serde(default)]
    pub zero_fill: bool,
    #[serde(default)]
    pub span: Span,
}

impl NumberType {
    pub fn new(
        name: impl Into<String>,
        precision: Option<Decimal>,
        scale: Option<Decimal>,
    ) -> Self {
        Self {
            name: name.into(),
            precision,
            scale,
            signed: None,
            zero_fill: false,
            span: Span::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampType {
    pub precision: Option<Decimal>,
    #[serde(default)]
    pub with_time_zone: bool,
    #[serde(default)]
    pub with_local_time_zone: bool,
    #[serde(default)]
    pub span: Span,
}

impl TimestampType {
    pub fn new(precision: Option<Decimal>) -> Self {
        Self {
            precision,
            with_time_zone: false,
            with_local_time_zone: false,
            span: Span::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionType {
    pub name: String,
    /// The declared value list, in source order, raw text.
    pub values: Vec<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    #[serde(default)]
    pub binary: bool,
    #[serde(default)]
    pub span: Span,
}

impl CollectionType {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
            charset: None,
            collation: None,
            binary: false,
            span: Span::default(),
        }
    }
}
