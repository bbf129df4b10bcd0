//! Nodes shared across statement families.

use crate::cst::Span;
use serde::{Deserialize, Serialize};

/// A possibly schema-qualified relation (table, view, index target).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationFactor {
    pub schema: Option<String>,
    pub relation: String,
    /// Trailing `@var` marker, when the grammar allows one.
    pub user_variable: Option<String>,
    #[serde(default)]
    pub span: Span,
}

impl RelationFactor {
    pub fn new(schema: Option<String>, relation: impl Into<String>) -> Self {
        Self {
            schema,
            relation: relation.into(),
            user_variable: None,
            span: Span::default(),
        }
    }

    /// Unqualified relation name.
    pub fn bare(relation: impl Into<String>) -> Self {
        Self::new(None, relation)
    }
}
