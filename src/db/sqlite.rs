//! SQLite store implementation.

use super::{is_read_only_query, is_reserved_table, valid_table_name, ColumnInfo, Note, QueryOutput};
use crate::error::{Result, VettError};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

/// SQLite-backed store for the database tool server.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        Self::create_default_tables(&conn)?;

        info!("Opened database store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::create_default_tables(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn create_default_tables(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS key_value_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                tags TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS table_registry (
                table_name TEXT PRIMARY KEY,
                schema TEXT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| VettError::Config(format!("Failed to acquire database lock: {}", e)))
    }

    // === Key-value operations ===

    /// Store a value, returning true if an existing key was updated.
    #[instrument(skip(self, value))]
    pub fn store_value(&self, key: &str, value: &str) -> Result<bool> {
        let conn = self.conn()?;

        let exists: bool = conn
            .query_row(
                "SELECT 1 FROM key_value_store WHERE key = ?1",
                params![key],
                |_| Ok(()),
            )
            .map(|_| true)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(false),
                other => Err(other),
            })?;

        if exists {
            conn.execute(
                "UPDATE key_value_store SET value = ?1, updated_at = CURRENT_TIMESTAMP WHERE key = ?2",
                params![value, key],
            )?;
        } else {
            conn.execute(
                "INSERT INTO key_value_store (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }

        debug!("Stored value for key '{}'", key);
        Ok(exists)
    }

    /// Retrieve a value by key.
    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;

        let result = conn.query_row(
            "SELECT value FROM key_value_store WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all stored keys, sorted.
    pub fn list_keys(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare("SELECT key FROM key_value_store ORDER BY key")?;
        let keys = stmt.query_map([], |row| row.get(0))?;

        Ok(keys.filter_map(|k| k.ok()).collect())
    }

    // === Notes operations ===

    /// Add a note and return its id.
    #[instrument(skip(self, content))]
    pub fn add_note(&self, title: &str, content: &str, tags: &str) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO notes (title, content, tags) VALUES (?1, ?2, ?3)",
            params![title, content, tags],
        )?;

        let id = conn.last_insert_rowid();
        debug!("Added note {} '{}'", id, title);
        Ok(id)
    }

    /// Retrieve a note by id.
    pub fn get_note(&self, note_id: i64) -> Result<Option<Note>> {
        let conn = self.conn()?;

        let result = conn.query_row(
            "SELECT id, title, content, tags FROM notes WHERE id = ?1",
            params![note_id],
            |row| {
                let tags: Option<String> = row.get(3)?;
                Ok(Note {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    content: row.get(2)?,
                    tags: tags.filter(|t| !t.is_empty()),
                })
            },
        );

        match result {
            Ok(note) => Ok(Some(note)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Search notes by title, content, or tags. Returns (id, title) pairs.
    pub fn search_notes(&self, query: &str) -> Result<Vec<(i64, String)>> {
        let conn = self.conn()?;

        let pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(
            "SELECT id, title FROM notes WHERE title LIKE ?1 OR content LIKE ?1 OR tags LIKE ?1",
        )?;
        let rows = stmt.query_map(params![pattern], |row| Ok((row.get(0)?, row.get(1)?)))?;

        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // === Table operations ===

    /// Check whether a table exists.
    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let conn = self.conn()?;
        Self::table_exists_on(&conn, table_name)
    }

    fn table_exists_on(conn: &Connection, table_name: &str) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Create a user table with the given schema text and register it.
    #[instrument(skip(self, schema))]
    pub fn create_table(&self, table_name: &str, schema: &str) -> Result<()> {
        if !valid_table_name(table_name) {
            return Err(VettError::InvalidInput(format!(
                "Invalid table name '{}'. Table names must start with a letter and contain only letters, numbers, and underscores.",
                table_name
            )));
        }
        if is_reserved_table(table_name) {
            return Err(VettError::InvalidInput(format!(
                "Cannot create table '{}'. This name is reserved.",
                table_name
            )));
        }

        let conn = self.conn()?;

        if Self::table_exists_on(&conn, table_name)? {
            return Err(VettError::InvalidInput(format!(
                "Table '{}' already exists.",
                table_name
            )));
        }

        conn.execute(&format!("CREATE TABLE {} ({})", table_name, schema), [])?;
        conn.execute(
            "INSERT INTO table_registry (table_name, schema) VALUES (?1, ?2)",
            params![table_name, schema],
        )?;

        info!("Created table '{}'", table_name);
        Ok(())
    }

    /// List all user-visible tables (system tables filtered out).
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;

        Ok(names
            .filter_map(|n| n.ok())
            .filter(|name| !name.starts_with("sqlite_"))
            .collect())
    }

    /// Get the column layout of a table, or None if it does not exist.
    pub fn describe_table(&self, table_name: &str) -> Result<Option<Vec<ColumnInfo>>> {
        if !valid_table_name(table_name) {
            return Ok(None);
        }

        let conn = self.conn()?;

        if !Self::table_exists_on(&conn, table_name)? {
            return Ok(None);
        }

        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table_name))?;
        let columns = stmt.query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get(1)?,
                data_type: row.get(2)?,
                primary_key: row.get::<_, i64>(5)? != 0,
            })
        })?;

        Ok(Some(columns.filter_map(|c| c.ok()).collect()))
    }

    /// Drop a user table and remove it from the registry.
    #[instrument(skip(self))]
    pub fn delete_table(&self, table_name: &str) -> Result<()> {
        if is_reserved_table(table_name) {
            return Err(VettError::InvalidInput(format!(
                "Cannot delete table '{}'. This is a system table.",
                table_name
            )));
        }
        if !valid_table_name(table_name) {
            return Err(VettError::InvalidInput(format!(
                "Invalid table name '{}'.",
                table_name
            )));
        }

        let conn = self.conn()?;

        if !Self::table_exists_on(&conn, table_name)? {
            return Err(VettError::InvalidInput(format!(
                "Table '{}' does not exist.",
                table_name
            )));
        }

        conn.execute(&format!("DROP TABLE {}", table_name), [])?;
        conn.execute(
            "DELETE FROM table_registry WHERE table_name = ?1",
            params![table_name],
        )?;

        info!("Dropped table '{}'", table_name);
        Ok(())
    }

    // === Record operations ===

    /// Insert a record, returning the new rowid.
    ///
    /// Fields and values are raw SQL fragments supplied by the caller,
    /// matching the conversational tool contract.
    pub fn insert_record(&self, table_name: &str, fields: &str, values: &str) -> Result<i64> {
        let conn = self.require_table(table_name)?;

        conn.execute(
            &format!("INSERT INTO {} ({}) VALUES ({})", table_name, fields, values),
            [],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Update records, returning the number of rows affected.
    pub fn update_records(
        &self,
        table_name: &str,
        set_clause: &str,
        where_clause: &str,
    ) -> Result<usize> {
        let conn = self.require_table(table_name)?;

        let affected = conn.execute(
            &format!(
                "UPDATE {} SET {} WHERE {}",
                table_name, set_clause, where_clause
            ),
            [],
        )?;

        Ok(affected)
    }

    /// Delete records, returning the number of rows affected.
    pub fn delete_records(&self, table_name: &str, where_clause: &str) -> Result<usize> {
        let conn = self.require_table(table_name)?;

        let affected = conn.execute(
            &format!("DELETE FROM {} WHERE {}", table_name, where_clause),
            [],
        )?;

        Ok(affected)
    }

    /// Query a table with optional conditions and a row limit.
    pub fn query_table(
        &self,
        table_name: &str,
        conditions: &str,
        limit: usize,
    ) -> Result<QueryOutput> {
        let conn = self.require_table(table_name)?;

        let mut query = format!("SELECT * FROM {}", table_name);
        if !conditions.trim().is_empty() {
            query.push_str(&format!(" WHERE {}", conditions));
        }
        query.push_str(&format!(" LIMIT {}", limit));

        Self::run_select(&conn, &query)
    }

    /// Execute an arbitrary read-only query.
    pub fn execute_read_only(&self, query: &str) -> Result<QueryOutput> {
        if !is_read_only_query(query) {
            return Err(VettError::InvalidInput(
                "For security reasons, this tool only allows SELECT queries".to_string(),
            ));
        }

        let conn = self.conn()?;
        Self::run_select(&conn, query)
    }

    fn require_table(&self, table_name: &str) -> Result<MutexGuard<'_, Connection>> {
        if !valid_table_name(table_name) {
            return Err(VettError::InvalidInput(format!(
                "Invalid table name '{}'.",
                table_name
            )));
        }

        let conn = self.conn()?;
        if !Self::table_exists_on(&conn, table_name)? {
            return Err(VettError::InvalidInput(format!(
                "Table '{}' does not exist.",
                table_name
            )));
        }
        Ok(conn)
    }

    fn run_select(conn: &Connection, query: &str) -> Result<QueryOutput> {
        let mut stmt = conn.prepare(query)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let column_count = columns.len();

        let mut rows = Vec::new();
        let mut raw = stmt.query([])?;
        while let Some(row) = raw.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(value_to_string(row.get_ref(i)?));
            }
            rows.push(values);
        }

        debug!("Query returned {} row(s)", rows.len());
        Ok(QueryOutput { columns, rows })
    }
}

/// Render one SQL value as display text.
fn value_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_value_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();

        let updated = store.store_value("favorite_color", "blue").unwrap();
        assert!(!updated);
        assert_eq!(
            store.get_value("favorite_color").unwrap(),
            Some("blue".to_string())
        );

        let updated = store.store_value("favorite_color", "green").unwrap();
        assert!(updated);
        assert_eq!(
            store.get_value("favorite_color").unwrap(),
            Some("green".to_string())
        );

        assert_eq!(store.get_value("missing").unwrap(), None);
        assert_eq!(store.list_keys().unwrap(), vec!["favorite_color"]);
    }

    #[test]
    fn test_notes() {
        let store = SqliteStore::in_memory().unwrap();

        let id = store
            .add_note("Rust tips", "Prefer borrowing over cloning", "rust,tips")
            .unwrap();

        let note = store.get_note(id).unwrap().unwrap();
        assert_eq!(note.title, "Rust tips");
        assert_eq!(note.tags.as_deref(), Some("rust,tips"));

        assert!(store.get_note(9999).unwrap().is_none());

        let hits = store.search_notes("borrowing").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].1, "Rust tips");

        assert!(store.search_notes("golang").unwrap().is_empty());
    }

    #[test]
    fn test_table_lifecycle() {
        let store = SqliteStore::in_memory().unwrap();

        store
            .create_table("books", "id INTEGER PRIMARY KEY, title TEXT, author TEXT")
            .unwrap();

        let tables = store.list_tables().unwrap();
        assert!(tables.contains(&"books".to_string()));
        assert!(tables.contains(&"table_registry".to_string()));

        let columns = store.describe_table("books").unwrap().unwrap();
        assert_eq!(columns.len(), 3);
        assert!(columns[0].primary_key);
        assert_eq!(columns[1].name, "title");

        // Duplicate creation fails
        assert!(store.create_table("books", "id INTEGER").is_err());

        store.delete_table("books").unwrap();
        assert!(!store.table_exists("books").unwrap());
        assert!(store.describe_table("books").unwrap().is_none());
    }

    #[test]
    fn test_reserved_and_invalid_table_names() {
        let store = SqliteStore::in_memory().unwrap();

        assert!(store.create_table("notes", "id INTEGER").is_err());
        assert!(store.create_table("2fast", "id INTEGER").is_err());
        assert!(store
            .create_table("books; DROP TABLE notes", "id INTEGER")
            .is_err());
        assert!(store.delete_table("key_value_store").is_err());
    }

    #[test]
    fn test_record_operations() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .create_table("users", "id INTEGER PRIMARY KEY, name TEXT, age INTEGER")
            .unwrap();

        let id = store
            .insert_record("users", "name,age", "'Kari',34")
            .unwrap();
        assert_eq!(id, 1);
        store
            .insert_record("users", "name,age", "'Ola',28")
            .unwrap();

        let output = store.query_table("users", "age > 30", 10).unwrap();
        assert_eq!(output.rows.len(), 1);
        assert_eq!(output.rows[0][1], "Kari");

        let affected = store
            .update_records("users", "age = 35", "name = 'Kari'")
            .unwrap();
        assert_eq!(affected, 1);

        let affected = store.delete_records("users", "age < 30").unwrap();
        assert_eq!(affected, 1);

        let output = store.query_table("users", "", 10).unwrap();
        assert_eq!(output.rows.len(), 1);

        // Unknown table surfaces as an error
        assert!(store.query_table("ghosts", "", 10).is_err());
    }

    #[test]
    fn test_read_only_query() {
        let store = SqliteStore::in_memory().unwrap();
        store.add_note("a", "b", "").unwrap();

        let output = store
            .execute_read_only("SELECT title, created_at FROM notes")
            .unwrap();
        assert_eq!(output.columns[0], "title");
        assert_eq!(output.rows.len(), 1);

        assert!(store.execute_read_only("DELETE FROM notes").is_err());
        assert!(store
            .execute_read_only("INSERT INTO notes (title, content) VALUES ('x', 'y')")
            .is_err());
    }

    #[test]
    fn test_file_backed_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assistant.db");

        {
            let store = SqliteStore::new(&path).unwrap();
            store.store_value("k", "v").unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(store.get_value("k").unwrap(), Some("v".to_string()));
    }
}
