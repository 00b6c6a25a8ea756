//! SQL dialect formatting rules.
//!
//! The crate emits one canonical dialect: ANSI double-quoted identifiers,
//! single-quoted strings and `LIMIT n`. Downstream transpilers implement
//! [`SqlDialect`] to change how the same token stream serializes.
//!
//! ```ignore
//! use joinwise::sql::{Canonical, SqlDialect};
//!
//! assert_eq!(Canonical.quote_identifier("order"), "\"order\"");
//! ```

use super::token::{Token, TokenStream};

/// Defines how SQL tokens are rendered.
///
/// The default implementations follow ANSI SQL.
pub trait SqlDialect: std::fmt::Debug + Send + Sync {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    /// Quote an identifier (table, column, alias).
    fn quote_identifier(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Quote a string literal with `''` escaping.
    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    fn format_bool(&self, b: bool) -> &'static str {
        if b {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    /// Format a float literal. Non-finite values have no SQL spelling and
    /// render as NULL.
    fn format_float(&self, f: f64) -> String {
        if !f.is_finite() {
            return "NULL".into();
        }
        let mut buffer = ryu::Buffer::new();
        buffer.format_finite(f).to_string()
    }

    /// Emit the row limit clause.
    fn emit_limit(&self, limit: u64) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Limit).space().push(Token::LitUint(limit));
        ts
    }

    /// Rename a function for this dialect, if needed.
    fn remap_function(&self, _name: &str) -> Option<&'static str> {
        None
    }
}

/// The canonical dialect the planner emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Canonical;

impl SqlDialect for Canonical {
    fn name(&self) -> &'static str {
        "canonical"
    }
}
