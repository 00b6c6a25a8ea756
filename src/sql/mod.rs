//! SQL generation.
//!
//! Query plans are rendered through a small typed builder:
//!
//! - [`query`] - SELECT query builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - Formatting rules; only the canonical dialect ships here
//! - [`render`] - QueryPlan to Query to SQL text

pub mod dialect;
pub mod expr;
pub mod query;
pub mod render;
pub mod token;

#[cfg(test)]
pub mod test_utils;

pub use dialect::{Canonical, SqlDialect};
pub use expr::{
    avg, count, count_distinct, date_trunc, func, lit_bool, lit_float, lit_int, lit_null,
    lit_str, max, min, sum, table_col, BinaryOperator, Expr, ExprExt, Literal,
};
pub use query::{Join, JoinType, OrderByExpr, Query, SelectExpr, SortDir, TableRef};
pub use render::{plan_to_query, render, render_with};
pub use token::{Token, TokenStream};
