//! Local database tool server.
//!
//! Exposes the [`SqliteStore`] as conversational tools: a key-value store,
//! a notes collection, and dynamic table management. Everything returns
//! readable text because the consumer is a language model, not a program.

use super::{arg_i64, arg_str, arg_u64, ToolServer};
use crate::db::{QueryOutput, SqliteStore};
use crate::error::Result;
use crate::mcp::protocol::{Tool, ToolCallResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use tracing::debug;

const SERVER_NAME: &str = "database";

/// Default row limit for table queries.
const DEFAULT_QUERY_LIMIT: u64 = 10;

/// Results longer than this are cut off in `execute_safe_query`.
const MAX_RESULT_CHARS: usize = 1500;

/// Tool server backed by the local SQLite store.
pub struct DatabaseServer {
    store: SqliteStore,
}

impl DatabaseServer {
    /// Open the server against a database file.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            store: SqliteStore::new(path)?,
        })
    }

    #[cfg(test)]
    fn in_memory() -> Result<Self> {
        Ok(Self {
            store: SqliteStore::in_memory()?,
        })
    }

    // === Key-value tools ===

    fn tool_store_value(&self, args: &Option<Value>) -> ToolCallResult {
        let Some(key) = arg_str(args, "key") else {
            return ToolCallResult::error("Missing 'key' argument".to_string());
        };
        let Some(value) = arg_str(args, "value") else {
            return ToolCallResult::error("Missing 'value' argument".to_string());
        };

        match self.store.store_value(key, value) {
            Ok(true) => ToolCallResult::text(format!("Updated value for key '{}'", key)),
            Ok(false) => ToolCallResult::text(format!("Stored new value for key '{}'", key)),
            Err(e) => ToolCallResult::error(format!("Error storing value: {}", e)),
        }
    }

    fn tool_get_value(&self, args: &Option<Value>) -> ToolCallResult {
        let Some(key) = arg_str(args, "key") else {
            return ToolCallResult::error("Missing 'key' argument".to_string());
        };

        match self.store.get_value(key) {
            Ok(Some(value)) => ToolCallResult::text(value),
            Ok(None) => ToolCallResult::text(format!("No value found for key '{}'", key)),
            Err(e) => ToolCallResult::error(format!("Error retrieving value: {}", e)),
        }
    }

    fn tool_list_keys(&self) -> ToolCallResult {
        match self.store.list_keys() {
            Ok(keys) if keys.is_empty() => {
                ToolCallResult::text("No keys found in the database".to_string())
            }
            Ok(keys) => ToolCallResult::text(format!("Available keys: {}", keys.join(", "))),
            Err(e) => ToolCallResult::error(format!("Error listing keys: {}", e)),
        }
    }

    // === Notes tools ===

    fn tool_add_note(&self, args: &Option<Value>) -> ToolCallResult {
        let Some(title) = arg_str(args, "title") else {
            return ToolCallResult::error("Missing 'title' argument".to_string());
        };
        let Some(content) = arg_str(args, "content") else {
            return ToolCallResult::error("Missing 'content' argument".to_string());
        };
        let tags = arg_str(args, "tags").unwrap_or("");

        match self.store.add_note(title, content, tags) {
            Ok(id) => ToolCallResult::text(format!("Added note with ID {}", id)),
            Err(e) => ToolCallResult::error(format!("Error adding note: {}", e)),
        }
    }

    fn tool_get_note(&self, args: &Option<Value>) -> ToolCallResult {
        let Some(note_id) = arg_i64(args, "note_id") else {
            return ToolCallResult::error("Missing 'note_id' argument".to_string());
        };

        match self.store.get_note(note_id) {
            Ok(Some(note)) => {
                let mut text = format!("Title: {}\nContent: {}", note.title, note.content);
                if let Some(tags) = &note.tags {
                    text.push_str(&format!("\nTags: {}", tags));
                }
                ToolCallResult::text(text)
            }
            Ok(None) => ToolCallResult::text(format!("No note found with ID {}", note_id)),
            Err(e) => ToolCallResult::error(format!("Error retrieving note: {}", e)),
        }
    }

    fn tool_search_notes(&self, args: &Option<Value>) -> ToolCallResult {
        let Some(query) = arg_str(args, "query") else {
            return ToolCallResult::error("Missing 'query' argument".to_string());
        };

        match self.store.search_notes(query) {
            Ok(hits) if hits.is_empty() => {
                ToolCallResult::text(format!("No notes found matching '{}'", query))
            }
            Ok(hits) => {
                let listing = hits
                    .iter()
                    .map(|(id, title)| format!("ID: {} - Title: {}", id, title))
                    .collect::<Vec<_>>()
                    .join("\n");
                ToolCallResult::text(format!("Found notes:\n{}", listing))
            }
            Err(e) => ToolCallResult::error(format!("Error searching notes: {}", e)),
        }
    }

    // === Table tools ===

    fn tool_create_table(&self, args: &Option<Value>) -> ToolCallResult {
        let Some(table_name) = arg_str(args, "table_name") else {
            return ToolCallResult::error("Missing 'table_name' argument".to_string());
        };
        let Some(schema) = arg_str(args, "schema") else {
            return ToolCallResult::error("Missing 'schema' argument".to_string());
        };

        match self.store.create_table(table_name, schema) {
            Ok(()) => {
                ToolCallResult::text(format!("Successfully created table '{}'.", table_name))
            }
            Err(e) => ToolCallResult::error(format!("Error creating table: {}", e)),
        }
    }

    fn tool_list_tables(&self) -> ToolCallResult {
        match self.store.list_tables() {
            Ok(tables) if tables.is_empty() => {
                ToolCallResult::text("No tables found in the database".to_string())
            }
            Ok(tables) => {
                ToolCallResult::text(format!("Available tables: {}", tables.join(", ")))
            }
            Err(e) => ToolCallResult::error(format!("Error listing tables: {}", e)),
        }
    }

    fn tool_describe_table(&self, args: &Option<Value>) -> ToolCallResult {
        let Some(table_name) = arg_str(args, "table_name") else {
            return ToolCallResult::error("Missing 'table_name' argument".to_string());
        };

        match self.store.describe_table(table_name) {
            Ok(Some(columns)) => {
                let listing = columns
                    .iter()
                    .map(|col| {
                        format!(
                            "{} ({}){}",
                            col.name,
                            col.data_type,
                            if col.primary_key { " PRIMARY KEY" } else { "" }
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                ToolCallResult::text(format!("Schema for table '{}':\n{}", table_name, listing))
            }
            Ok(None) => {
                ToolCallResult::text(format!("Table '{}' does not exist.", table_name))
            }
            Err(e) => ToolCallResult::error(format!("Error describing table: {}", e)),
        }
    }

    fn tool_delete_table(&self, args: &Option<Value>) -> ToolCallResult {
        let Some(table_name) = arg_str(args, "table_name") else {
            return ToolCallResult::error("Missing 'table_name' argument".to_string());
        };

        match self.store.delete_table(table_name) {
            Ok(()) => {
                ToolCallResult::text(format!("Successfully deleted table '{}'.", table_name))
            }
            Err(e) => ToolCallResult::error(format!("Error deleting table: {}", e)),
        }
    }

    // === Record tools ===

    fn tool_insert_record(&self, args: &Option<Value>) -> ToolCallResult {
        let Some(table_name) = arg_str(args, "table_name") else {
            return ToolCallResult::error("Missing 'table_name' argument".to_string());
        };
        let Some(fields) = arg_str(args, "fields") else {
            return ToolCallResult::error("Missing 'fields' argument".to_string());
        };
        let Some(values) = arg_str(args, "values") else {
            return ToolCallResult::error("Missing 'values' argument".to_string());
        };

        match self.store.insert_record(table_name, fields, values) {
            Ok(id) => ToolCallResult::text(format!(
                "Successfully inserted record into '{}' with ID {}.",
                table_name, id
            )),
            Err(e) => ToolCallResult::error(format!("Error inserting record: {}", e)),
        }
    }

    fn tool_update_record(&self, args: &Option<Value>) -> ToolCallResult {
        let Some(table_name) = arg_str(args, "table_name") else {
            return ToolCallResult::error("Missing 'table_name' argument".to_string());
        };
        let Some(set_clause) = arg_str(args, "set_clause") else {
            return ToolCallResult::error("Missing 'set_clause' argument".to_string());
        };
        let Some(where_clause) = arg_str(args, "where_clause") else {
            return ToolCallResult::error("Missing 'where_clause' argument".to_string());
        };

        match self.store.update_records(table_name, set_clause, where_clause) {
            Ok(affected) => ToolCallResult::text(format!(
                "Successfully updated {} record(s) in '{}'.",
                affected, table_name
            )),
            Err(e) => ToolCallResult::error(format!("Error updating records: {}", e)),
        }
    }

    fn tool_delete_records(&self, args: &Option<Value>) -> ToolCallResult {
        let Some(table_name) = arg_str(args, "table_name") else {
            return ToolCallResult::error("Missing 'table_name' argument".to_string());
        };
        let Some(where_clause) = arg_str(args, "where_clause") else {
            return ToolCallResult::error("Missing 'where_clause' argument".to_string());
        };

        match self.store.delete_records(table_name, where_clause) {
            Ok(affected) => ToolCallResult::text(format!(
                "Successfully deleted {} record(s) from '{}'.",
                affected, table_name
            )),
            Err(e) => ToolCallResult::error(format!("Error deleting records: {}", e)),
        }
    }

    fn tool_query_table(&self, args: &Option<Value>) -> ToolCallResult {
        let Some(table_name) = arg_str(args, "table_name") else {
            return ToolCallResult::error("Missing 'table_name' argument".to_string());
        };
        let conditions = arg_str(args, "conditions").unwrap_or("");
        let limit = arg_u64(args, "limit").unwrap_or(DEFAULT_QUERY_LIMIT) as usize;

        debug!("Querying table {}", table_name);

        match self.store.query_table(table_name, conditions, limit) {
            Ok(output) if output.is_empty() => {
                let suffix = if conditions.trim().is_empty() {
                    String::new()
                } else {
                    format!(" with condition: {}", conditions)
                };
                ToolCallResult::text(format!(
                    "No records found in '{}'{}",
                    table_name, suffix
                ))
            }
            Ok(output) => {
                let mut text = format!(
                    "Results from '{}':\n{}",
                    table_name,
                    format_query_output(&output)
                );
                if output.rows.len() == limit {
                    text.push_str(&format!(
                        "\n\n(Showing {} records. There may be more.)",
                        limit
                    ));
                }
                ToolCallResult::text(text)
            }
            Err(e) => ToolCallResult::error(format!("Error querying table: {}", e)),
        }
    }

    fn tool_execute_safe_query(&self, args: &Option<Value>) -> ToolCallResult {
        let Some(query) = arg_str(args, "query") else {
            return ToolCallResult::error("Missing 'query' argument".to_string());
        };

        debug!("Executing safe query");

        match self.store.execute_read_only(query) {
            Ok(output) if output.is_empty() => ToolCallResult::text(
                "Query executed successfully, but returned no results".to_string(),
            ),
            Ok(output) => {
                let mut text = format_query_output(&output);
                if text.len() > MAX_RESULT_CHARS {
                    let cut = floor_char_boundary(&text, MAX_RESULT_CHARS);
                    text.truncate(cut);
                    text.push_str("...\n(Results truncated)");
                }
                ToolCallResult::text(text)
            }
            Err(e) => ToolCallResult::error(format!("Error executing query: {}", e)),
        }
    }
}

#[async_trait]
impl ToolServer for DatabaseServer {
    fn name(&self) -> &str {
        SERVER_NAME
    }

    fn tools(&self) -> Vec<Tool> {
        vec![
            tool(
                "store_value",
                "Store a value with the given key in the database.",
                json!({
                    "type": "object",
                    "properties": {
                        "key": {"type": "string", "description": "The key to store under"},
                        "value": {"type": "string", "description": "The value to store"}
                    },
                    "required": ["key", "value"]
                }),
            ),
            tool(
                "get_value",
                "Retrieve a value for the given key from the database.",
                json!({
                    "type": "object",
                    "properties": {
                        "key": {"type": "string", "description": "The key to look up"}
                    },
                    "required": ["key"]
                }),
            ),
            tool(
                "list_keys",
                "List all available keys in the database.",
                json!({"type": "object", "properties": {}}),
            ),
            tool(
                "add_note",
                "Add a new note to the database.",
                json!({
                    "type": "object",
                    "properties": {
                        "title": {"type": "string", "description": "Note title"},
                        "content": {"type": "string", "description": "Note content"},
                        "tags": {"type": "string", "description": "Comma-separated tags (optional)"}
                    },
                    "required": ["title", "content"]
                }),
            ),
            tool(
                "get_note",
                "Retrieve a note by its ID.",
                json!({
                    "type": "object",
                    "properties": {
                        "note_id": {"type": "integer", "description": "The note ID"}
                    },
                    "required": ["note_id"]
                }),
            ),
            tool(
                "search_notes",
                "Search for notes by title, content, or tags.",
                json!({
                    "type": "object",
                    "properties": {
                        "query": {"type": "string", "description": "Text to search for"}
                    },
                    "required": ["query"]
                }),
            ),
            tool(
                "create_table",
                "Create a new table in the database with the specified schema. \
                 The schema describes the columns and their types, for example: \
                 \"id INTEGER PRIMARY KEY, name TEXT, age INTEGER, email TEXT UNIQUE\"",
                json!({
                    "type": "object",
                    "properties": {
                        "table_name": {"type": "string", "description": "Name of the new table"},
                        "schema": {"type": "string", "description": "Column definitions"}
                    },
                    "required": ["table_name", "schema"]
                }),
            ),
            tool(
                "list_tables",
                "List all tables in the database.",
                json!({"type": "object", "properties": {}}),
            ),
            tool(
                "describe_table",
                "Get the schema of a specific table.",
                json!({
                    "type": "object",
                    "properties": {
                        "table_name": {"type": "string", "description": "Name of the table"}
                    },
                    "required": ["table_name"]
                }),
            ),
            tool(
                "insert_record",
                "Insert a record into a table. fields is a comma-separated list of \
                 column names; values is a comma-separated list of values, with string \
                 values quoted. Example: fields \"name,age\", values \"'John Doe',30\"",
                json!({
                    "type": "object",
                    "properties": {
                        "table_name": {"type": "string", "description": "Name of the table"},
                        "fields": {"type": "string", "description": "Comma-separated column names"},
                        "values": {"type": "string", "description": "Comma-separated values"}
                    },
                    "required": ["table_name", "fields", "values"]
                }),
            ),
            tool(
                "query_table",
                "Query records from a table with optional conditions. Example: \
                 table_name \"users\", conditions \"age > 25\", limit 5",
                json!({
                    "type": "object",
                    "properties": {
                        "table_name": {"type": "string", "description": "Name of the table to query"},
                        "conditions": {
                            "type": "string",
                            "description": "WHERE clause conditions (without the 'WHERE' keyword)"
                        },
                        "limit": {
                            "type": "integer",
                            "description": "Maximum number of records to return (default: 10)"
                        }
                    },
                    "required": ["table_name"]
                }),
            ),
            tool(
                "update_record",
                "Update records in a table. Example: set_clause \"age=31, status='active'\", \
                 where_clause \"name='John Doe'\"",
                json!({
                    "type": "object",
                    "properties": {
                        "table_name": {"type": "string", "description": "Name of the table"},
                        "set_clause": {
                            "type": "string",
                            "description": "Comma-separated column=value assignments"
                        },
                        "where_clause": {
                            "type": "string",
                            "description": "Condition selecting which records to update"
                        }
                    },
                    "required": ["table_name", "set_clause", "where_clause"]
                }),
            ),
            tool(
                "delete_records",
                "Delete records from a table. Example: where_clause \"status='inactive'\"",
                json!({
                    "type": "object",
                    "properties": {
                        "table_name": {"type": "string", "description": "Name of the table"},
                        "where_clause": {
                            "type": "string",
                            "description": "Condition selecting which records to delete"
                        }
                    },
                    "required": ["table_name", "where_clause"]
                }),
            ),
            tool(
                "delete_table",
                "Delete a table from the database.",
                json!({
                    "type": "object",
                    "properties": {
                        "table_name": {"type": "string", "description": "Name of the table to delete"}
                    },
                    "required": ["table_name"]
                }),
            ),
            tool(
                "execute_safe_query",
                "Execute a read-only SQL query. Example: \
                 \"SELECT * FROM users WHERE age > 25 ORDER BY name LIMIT 10\"",
                json!({
                    "type": "object",
                    "properties": {
                        "query": {"type": "string", "description": "The SELECT query to execute"}
                    },
                    "required": ["query"]
                }),
            ),
        ]
    }

    async fn call(&self, name: &str, args: Option<Value>) -> ToolCallResult {
        match name {
            "store_value" => self.tool_store_value(&args),
            "get_value" => self.tool_get_value(&args),
            "list_keys" => self.tool_list_keys(),
            "add_note" => self.tool_add_note(&args),
            "get_note" => self.tool_get_note(&args),
            "search_notes" => self.tool_search_notes(&args),
            "create_table" => self.tool_create_table(&args),
            "list_tables" => self.tool_list_tables(),
            "describe_table" => self.tool_describe_table(&args),
            "insert_record" => self.tool_insert_record(&args),
            "query_table" => self.tool_query_table(&args),
            "update_record" => self.tool_update_record(&args),
            "delete_records" => self.tool_delete_records(&args),
            "delete_table" => self.tool_delete_table(&args),
            "execute_safe_query" => self.tool_execute_safe_query(&args),
            _ => ToolCallResult::error(format!("Unknown tool: {}", name)),
        }
    }
}

fn tool(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

/// Format rows as a pipe-separated text table.
fn format_query_output(output: &QueryOutput) -> String {
    let header = output.columns.join(" | ");
    let mut lines = vec![header.clone(), "-".repeat(header.len())];

    for row in &output.rows {
        lines.push(row.join(" | "));
    }

    lines.join("\n")
}

/// Largest index <= max that falls on a char boundary.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut idx = max;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn call(server: &DatabaseServer, name: &str, args: Value) -> ToolCallResult {
        server.call(name, Some(args)).await
    }

    #[tokio::test]
    async fn test_key_value_tools() {
        let server = DatabaseServer::in_memory().unwrap();

        let result = call(&server, "store_value", json!({"key": "city", "value": "Oslo"})).await;
        assert_eq!(result.joined_text(), "Stored new value for key 'city'");

        let result = call(&server, "store_value", json!({"key": "city", "value": "Bergen"})).await;
        assert_eq!(result.joined_text(), "Updated value for key 'city'");

        let result = call(&server, "get_value", json!({"key": "city"})).await;
        assert_eq!(result.joined_text(), "Bergen");

        let result = call(&server, "get_value", json!({"key": "nope"})).await;
        assert_eq!(result.joined_text(), "No value found for key 'nope'");

        let result = call(&server, "list_keys", json!({})).await;
        assert_eq!(result.joined_text(), "Available keys: city");
    }

    #[tokio::test]
    async fn test_note_tools() {
        let server = DatabaseServer::in_memory().unwrap();

        let result = call(
            &server,
            "add_note",
            json!({"title": "Shopping", "content": "Milk, bread", "tags": "errands"}),
        )
        .await;
        assert_eq!(result.joined_text(), "Added note with ID 1");

        let result = call(&server, "get_note", json!({"note_id": 1})).await;
        let text = result.joined_text();
        assert!(text.contains("Title: Shopping"));
        assert!(text.contains("Tags: errands"));

        let result = call(&server, "get_note", json!({"note_id": 42})).await;
        assert_eq!(result.joined_text(), "No note found with ID 42");

        let result = call(&server, "search_notes", json!({"query": "bread"})).await;
        assert!(result.joined_text().starts_with("Found notes:"));
        assert!(result.joined_text().contains("ID: 1 - Title: Shopping"));

        let result = call(&server, "search_notes", json!({"query": "xyzzy"})).await;
        assert_eq!(result.joined_text(), "No notes found matching 'xyzzy'");
    }

    #[tokio::test]
    async fn test_table_tools() {
        let server = DatabaseServer::in_memory().unwrap();

        let result = call(
            &server,
            "create_table",
            json!({"table_name": "books", "schema": "id INTEGER PRIMARY KEY, title TEXT"}),
        )
        .await;
        assert_eq!(result.joined_text(), "Successfully created table 'books'.");

        let result = call(&server, "list_tables", json!({})).await;
        assert!(result.joined_text().contains("books"));

        let result = call(&server, "describe_table", json!({"table_name": "books"})).await;
        let text = result.joined_text();
        assert!(text.starts_with("Schema for table 'books':"));
        assert!(text.contains("id (INTEGER) PRIMARY KEY"));
        assert!(text.contains("title (TEXT)"));

        let result = call(&server, "describe_table", json!({"table_name": "ghosts"})).await;
        assert_eq!(result.joined_text(), "Table 'ghosts' does not exist.");

        // Reserved names are protected
        let result = call(
            &server,
            "create_table",
            json!({"table_name": "notes", "schema": "id INTEGER"}),
        )
        .await;
        assert_eq!(result.is_error, Some(true));

        let result = call(&server, "delete_table", json!({"table_name": "books"})).await;
        assert_eq!(result.joined_text(), "Successfully deleted table 'books'.");
    }

    #[tokio::test]
    async fn test_record_tools() {
        let server = DatabaseServer::in_memory().unwrap();
        call(
            &server,
            "create_table",
            json!({"table_name": "users", "schema": "id INTEGER PRIMARY KEY, name TEXT, age INTEGER"}),
        )
        .await;

        let result = call(
            &server,
            "insert_record",
            json!({"table_name": "users", "fields": "name,age", "values": "'Kari',34"}),
        )
        .await;
        assert_eq!(
            result.joined_text(),
            "Successfully inserted record into 'users' with ID 1."
        );

        let result = call(
            &server,
            "query_table",
            json!({"table_name": "users", "conditions": "age > 30"}),
        )
        .await;
        let text = result.joined_text();
        assert!(text.starts_with("Results from 'users':"));
        assert!(text.contains("id | name | age"));
        assert!(text.contains("1 | Kari | 34"));

        let result = call(
            &server,
            "query_table",
            json!({"table_name": "users", "conditions": "age > 99"}),
        )
        .await;
        assert_eq!(
            result.joined_text(),
            "No records found in 'users' with condition: age > 99"
        );

        let result = call(
            &server,
            "update_record",
            json!({"table_name": "users", "set_clause": "age=35", "where_clause": "name='Kari'"}),
        )
        .await;
        assert_eq!(
            result.joined_text(),
            "Successfully updated 1 record(s) in 'users'."
        );

        let result = call(
            &server,
            "delete_records",
            json!({"table_name": "users", "where_clause": "age > 30"}),
        )
        .await;
        assert_eq!(
            result.joined_text(),
            "Successfully deleted 1 record(s) from 'users'."
        );
    }

    #[tokio::test]
    async fn test_query_table_limit_note() {
        let server = DatabaseServer::in_memory().unwrap();
        call(
            &server,
            "create_table",
            json!({"table_name": "nums", "schema": "n INTEGER"}),
        )
        .await;
        for i in 0..3 {
            call(
                &server,
                "insert_record",
                json!({"table_name": "nums", "fields": "n", "values": i.to_string()}),
            )
            .await;
        }

        let result = call(
            &server,
            "query_table",
            json!({"table_name": "nums", "limit": 2}),
        )
        .await;
        assert!(result
            .joined_text()
            .contains("(Showing 2 records. There may be more.)"));
    }

    #[tokio::test]
    async fn test_execute_safe_query() {
        let server = DatabaseServer::in_memory().unwrap();
        call(
            &server,
            "add_note",
            json!({"title": "a", "content": "b"}),
        )
        .await;

        let result = call(
            &server,
            "execute_safe_query",
            json!({"query": "SELECT title FROM notes"}),
        )
        .await;
        let text = result.joined_text();
        assert!(text.starts_with("title\n"));
        assert!(text.contains("\na"));

        let result = call(
            &server,
            "execute_safe_query",
            json!({"query": "SELECT title FROM notes WHERE title = 'zzz'"}),
        )
        .await;
        assert_eq!(
            result.joined_text(),
            "Query executed successfully, but returned no results"
        );

        let result = call(
            &server,
            "execute_safe_query",
            json!({"query": "DELETE FROM notes"}),
        )
        .await;
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_missing_arguments() {
        let server = DatabaseServer::in_memory().unwrap();

        let result = server.call("store_value", None).await;
        assert_eq!(result.is_error, Some(true));

        let result = server.call("no_such_tool", None).await;
        assert_eq!(result.is_error, Some(true));
        assert!(result.joined_text().contains("Unknown tool"));
    }

    #[test]
    fn test_format_query_output() {
        let output = QueryOutput {
            columns: vec!["id".to_string(), "name".to_string()],
            rows: vec![vec!["1".to_string(), "Kari".to_string()]],
        };

        let text = format_query_output(&output);
        assert_eq!(text, "id | name\n---------\n1 | Kari");
    }
}
