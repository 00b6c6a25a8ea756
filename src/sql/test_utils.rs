//! Test utilities for SQL emission validation.
//!
//! Emitted SQL is round-tripped through sqlparser-rs to prove it parses.

use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// Validates that a SQL string parses as exactly one statement.
///
/// # Example
///
/// ```ignore
/// use crate::sql::test_utils::validate_sql;
///
/// validate_sql("SELECT * FROM users").unwrap();
/// ```
pub fn validate_sql(sql: &str) -> Result<(), String> {
    let statements = Parser::parse_sql(&GenericDialect {}, sql)
        .map_err(|e| format!("Invalid SQL: {}\nSQL: {}", e, sql))?;
    match statements.len() {
        1 => Ok(()),
        n => Err(format!("Expected one statement, got {}\nSQL: {}", n, sql)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_sql() {
        validate_sql("SELECT * FROM users").unwrap();
        validate_sql("SELECT \"a\".\"b\" FROM \"a\" WHERE \"a\".\"b\" LIKE 'x!%' ESCAPE '!'")
            .unwrap();
    }

    #[test]
    fn test_validate_invalid_sql() {
        assert!(validate_sql("SELEC * FORM users").is_err());
    }
}
