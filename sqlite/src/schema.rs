//! SQL schema generation with customizable table prefixes.
//!
//! Card metadata lives in a single `{prefix}cards` table keyed by
//! `(format, name)`. The prefix lets several isolated card sets (e.g. `prod_`,
//! `test_`) share one SQLite file.
//!
//! Prefixes must contain only alphanumeric characters and underscores; they
//! are interpolated into SQL text and never bound as parameters.

use crate::error::{Result, SqliteError};

/// Validates that a table prefix contains only alphanumeric characters and underscores.
pub(crate) fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(SqliteError::InvalidPrefix(prefix.to_string()));
    }
    if !prefix.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(SqliteError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

/// Generates the SQL creating the card table and its indexes.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidPrefix`] if the prefix contains characters
/// other than alphanumerics and underscores, or if it is empty.
pub fn generate_schema_sql(prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;

    let sql = format!(
        r#"
CREATE TABLE IF NOT EXISTS {prefix}cards (
    format TEXT NOT NULL,
    name TEXT NOT NULL,
    type TEXT NOT NULL DEFAULT 'unknown',
    subtype TEXT NOT NULL DEFAULT 'unknown',
    color TEXT NOT NULL DEFAULT 'unknown',
    PRIMARY KEY (format, name)
);

CREATE INDEX IF NOT EXISTS idx_{prefix}cards_type ON {prefix}cards(format, type);
"#,
        prefix = prefix
    );

    Ok(sql)
}

/// Generates SQL to drop the card table.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidPrefix`] if the prefix is invalid.
pub fn generate_drop_sql(prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;
    Ok(format!("DROP TABLE IF EXISTS {prefix}cards;\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_prefix() {
        assert!(validate_prefix("ds_").is_ok());
        assert!(validate_prefix("test123").is_ok());
        assert!(validate_prefix("A_B_C").is_ok());
    }

    #[test]
    fn test_invalid_prefix() {
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("drop;--").is_err());
        assert!(validate_prefix("hello world").is_err());
        assert!(validate_prefix("test-prefix").is_err());
    }

    #[test]
    fn test_generate_schema_sql() {
        let sql = generate_schema_sql("ds_").unwrap();
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS ds_cards"));
        assert!(sql.contains("PRIMARY KEY (format, name)"));
        assert!(sql.contains("idx_ds_cards_type"));
    }

    #[test]
    fn test_generate_drop_sql() {
        assert_eq!(generate_drop_sql("ds_").unwrap(), "DROP TABLE IF EXISTS ds_cards;\n");
        assert!(generate_drop_sql("").is_err());
    }

    #[test]
    fn test_primary_key_rejects_duplicates() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(&generate_schema_sql("t_").unwrap()).unwrap();
        conn.execute(
            "INSERT INTO t_cards (format, name, type, subtype, color) VALUES ('premodern', 'Mountain', 'Land', 'Basic', 'C')",
            [],
        )
        .unwrap();
        assert!(conn
            .execute("INSERT INTO t_cards (format, name) VALUES ('premodern', 'Mountain')", [])
            .is_err());
        // Same name in another format is a different card.
        assert!(conn
            .execute("INSERT INTO t_cards (format, name) VALUES ('old_school', 'Mountain')", [])
            .is_ok());
    }
}
