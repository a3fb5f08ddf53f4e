//! Local SQLite store backing the database tool server.
//!
//! The schema is split between fixed default tables (key-value store,
//! notes, table registry) and tables users create dynamically through
//! conversation. User-created tables are tracked in the registry so they
//! can be listed with their original schema text.

mod sqlite;

pub use sqlite::SqliteStore;

/// Default tables created on open. Reserved: they cannot be created or
/// dropped through the table tools.
pub const RESERVED_TABLES: &[&str] = &["key_value_store", "notes", "table_registry", "sqlite_master"];

/// A stored note.
#[derive(Debug, Clone)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub tags: Option<String>,
}

/// One column from a table schema.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub primary_key: bool,
}

/// Result of a row-returning query.
#[derive(Debug, Clone)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl QueryOutput {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Check whether a name is usable as a table name: a letter followed by
/// letters, digits, and underscores.
pub fn valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Check whether a table name is one of the protected defaults.
pub fn is_reserved_table(name: &str) -> bool {
    RESERVED_TABLES.contains(&name.to_lowercase().as_str())
}

/// Check whether a SQL statement is read-only.
///
/// Tokenizes the statement and rejects any mutating keyword, so a column
/// named `created_at` does not trip the `create` check.
pub fn is_read_only_query(query: &str) -> bool {
    const MUTATING: &[&str] = &[
        "insert", "update", "delete", "drop", "alter", "truncate", "create", "grant", "replace",
        "attach", "pragma", "vacuum",
    ];

    query
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .filter(|token| !token.is_empty())
        .all(|token| !MUTATING.contains(&token.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_table_name() {
        assert!(valid_table_name("books"));
        assert!(valid_table_name("my_table_2"));
        assert!(!valid_table_name("2fast"));
        assert!(!valid_table_name("bad-name"));
        assert!(!valid_table_name(""));
        assert!(!valid_table_name("books; drop table notes"));
    }

    #[test]
    fn test_reserved_tables() {
        assert!(is_reserved_table("notes"));
        assert!(is_reserved_table("Key_Value_Store"));
        assert!(!is_reserved_table("books"));
    }

    #[test]
    fn test_read_only_query_guard() {
        assert!(is_read_only_query("SELECT * FROM users WHERE age > 25"));
        assert!(is_read_only_query(
            "SELECT created_at, updated_at FROM notes ORDER BY created_at"
        ));
        assert!(!is_read_only_query("INSERT INTO users VALUES (1)"));
        assert!(!is_read_only_query("DROP TABLE users"));
        assert!(!is_read_only_query("select 1; delete from notes"));
    }
}
