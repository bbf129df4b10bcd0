//! sqltree-sql - SQL statement construction library
//!
//! This library turns the concrete syntax tree produced by an external
//! grammar front-end into a dialect-neutral abstract syntax tree (AST)
//! for SQL statements.
//!
//! # Architecture
//!
//! Construction is a single bottom-up pass over rule-tagged CST nodes:
//! 1. **Component builders** - data types, identifiers, expressions,
//!    FROM references, table elements, partitions
//! 2. **Statement composers** - SELECT, DML and DDL assembly on top of
//!    the component builders
//!
//! Builders are pure functions from a CST node to an owned AST node;
//! the only side effect anywhere is diagnostic logging.

pub mod ast;
pub mod builder;
pub mod cst;
pub mod error;

pub use ast::Statement;
pub use builder::build_statement;
pub use cst::{CstChild, CstNode, Rule, Span, Token, TokenKind};
pub use error::{Error, Result};
