//! Identifier validation for the CRUD helpers
//!
//! Table and column names are interpolated into statement text (values are
//! always bound), so they are restricted to plain identifiers.

use crate::error::DbToolError;

const MAX_IDENTIFIER_LEN: usize = 64;

/// Validate a table or column identifier
///
/// ## Rules
///
/// - **Parts**: optionally qualified once, `schema.table`
/// - **Length**: 1-64 characters per part
/// - **Characters**: only `[a-zA-Z0-9_]`
/// - **Start character**: letter or underscore
///
/// ## Example
///
/// ```rust
/// use envdb_tools::validate::validate_identifier;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// validate_identifier("users")?;
/// validate_identifier("public.user_accounts")?;
/// validate_identifier("_private")?;
///
/// # assert!(validate_identifier("users; DROP TABLE users").is_err());
/// # assert!(validate_identifier("users)").is_err());
/// # assert!(validate_identifier("123table").is_err());
/// # assert!(validate_identifier("a.b.c").is_err());
/// # Ok(())
/// # }
/// ```
pub fn validate_identifier(name: &str) -> Result<(), DbToolError> {
    if name.is_empty() {
        return Err(DbToolError::InvalidArgument(
            "Identifier cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 {
        return Err(DbToolError::InvalidArgument(format!(
            "Identifier '{}' has too many qualifiers (max one '.')",
            name
        )));
    }

    for part in parts {
        validate_part(name, part)?;
    }

    Ok(())
}

fn validate_part(full: &str, part: &str) -> Result<(), DbToolError> {
    if part.is_empty() {
        return Err(DbToolError::InvalidArgument(format!(
            "Invalid identifier: '{}' has an empty part",
            full
        )));
    }

    if part.len() > MAX_IDENTIFIER_LEN {
        return Err(DbToolError::InvalidArgument(format!(
            "Identifier too long: {} characters (max {})",
            part.len(),
            MAX_IDENTIFIER_LEN
        )));
    }

    if !part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DbToolError::InvalidArgument(format!(
            "Invalid identifier: '{}'. Only alphanumeric and underscore allowed",
            full
        )));
    }

    if let Some(first_char) = part.chars().next()
        && first_char.is_ascii_digit()
    {
        return Err(DbToolError::InvalidArgument(format!(
            "Identifier cannot start with digit: '{}'",
            full
        )));
    }

    Ok(())
}

/// Validate a column name used to derive a parameter name
///
/// Columns are never schema-qualified.
pub fn validate_column(name: &str) -> Result<(), DbToolError> {
    if name.contains('.') {
        return Err(DbToolError::InvalidArgument(format!(
            "Column name cannot be qualified: '{}'",
            name
        )));
    }
    validate_identifier(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_and_qualified() {
        for ok in ["t", "users", "User_Accounts2", "_x", "dbo.orders"] {
            assert!(validate_identifier(ok).is_ok(), "{}", ok);
        }
    }

    #[test]
    fn test_rejects_injection_shapes() {
        for bad in [
            "",
            "users; DROP TABLE users",
            "users--",
            "a b",
            "\"quoted\"",
            "9lives",
            "x.",
            ".x",
            "a.b.c",
        ] {
            assert!(validate_identifier(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_length_limit_per_part() {
        let long = "a".repeat(65);
        assert!(validate_identifier(&long).is_err());
        let max = "a".repeat(64);
        assert!(validate_identifier(&format!("{}.{}", max, max)).is_ok());
    }

    #[test]
    fn test_column_cannot_be_qualified() {
        assert!(validate_column("name").is_ok());
        assert!(validate_column("t.name").is_err());
    }
}
