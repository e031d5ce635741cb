//! Database handle for OakDB
//!
//! A [`Database`] is a named collection of tables backed by a directory on
//! disk, one JSON document per table. Table names are case-insensitive on
//! lookup but preserved as declared.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::catalog::{Column, Schema};
use crate::error::{Error, Result};
use crate::executor::{self, QueryResult};
use crate::storage::disk;
use crate::storage::table::Table;

/// A database: a directory of persisted tables
#[derive(Debug)]
pub struct Database {
    dir: PathBuf,
    /// Tables keyed by lowercased name; declared spelling lives in the table
    tables: HashMap<String, Table>,
}

impl Database {
    /// Open a database directory, creating it if needed and loading every
    /// persisted table document found inside.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let mut tables = HashMap::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let table = Table::load_from(&path)?;
            tables.insert(table.name().to_lowercase(), table);
        }

        info!(dir = %dir.display(), tables = tables.len(), "database opened");
        Ok(Self { dir, tables })
    }

    /// Close the database. Every committed mutation is already durable, so
    /// this simply consumes the handle.
    pub fn close(self) {}

    /// Parse and execute a single SQL statement
    pub fn execute(&mut self, sql: &str) -> Result<QueryResult> {
        executor::execute(self, sql)
    }

    /// Create a table and persist its (empty) document
    pub fn create_table(&mut self, name: &str, columns: Vec<Column>) -> Result<()> {
        let lookup_key = name.to_lowercase();
        if self.tables.contains_key(&lookup_key) {
            return Err(Error::TableAlreadyExists(name.to_string()));
        }

        let schema = Schema::from_columns(name, columns)?;
        let mut table = Table::new(name, schema);
        table.set_dir(self.dir.clone());
        table.persist()?;

        info!(table = name, "table created");
        self.tables.insert(lookup_key, table);
        Ok(())
    }

    /// Drop a table and remove its persisted document
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        let table = self
            .tables
            .remove(&name.to_lowercase())
            .ok_or_else(|| Error::TableNotFound(name.to_string()))?;
        disk::remove_table_file(&self.dir, table.name())?;
        info!(table = table.name(), "table dropped");
        Ok(())
    }

    /// Look up a table by name (case-insensitive)
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(&name.to_lowercase())
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Mutable table lookup (case-insensitive)
    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(&name.to_lowercase())
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Declared table names, sorted
    pub fn list_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .values()
            .map(|t| t.name().to_string())
            .collect();
        names.sort();
        names
    }

    /// The schema of a table
    pub fn schema(&self, name: &str) -> Result<&Schema> {
        Ok(self.table(name)?.schema())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnType;
    use crate::storage::table::Row;
    use crate::storage::value::Value;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("id", ColumnType::Integer).primary_key(true),
            Column::new("name", ColumnType::Text).not_null(true),
        ]
    }

    #[test]
    fn test_create_list_drop() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::open(dir.path()).unwrap();

        db.create_table("Users", columns()).unwrap();
        assert_eq!(db.list_tables(), vec!["Users".to_string()]);
        assert!(dir.path().join("Users.json").exists());

        // case-insensitive lookup, declared case preserved
        assert!(db.table("users").is_ok());
        assert!(db.table("USERS").is_ok());
        let err = db.create_table("USERS", columns()).unwrap_err();
        assert!(matches!(err, Error::TableAlreadyExists(_)));

        db.drop_table("users").unwrap();
        assert!(db.list_tables().is_empty());
        assert!(!dir.path().join("Users.json").exists());
    }

    #[test]
    fn test_drop_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::open(dir.path()).unwrap();
        assert!(matches!(
            db.drop_table("nope"),
            Err(Error::TableNotFound(_))
        ));
    }

    #[test]
    fn test_reopen_restores_tables_rows_and_row_ids() {
        let dir = tempfile::tempdir().unwrap();

        {
            let mut db = Database::open(dir.path()).unwrap();
            db.create_table("users", columns()).unwrap();
            let table = db.table_mut("users").unwrap();
            table
                .insert(
                    Row::new()
                        .with("id", Value::Integer(1))
                        .with("name", Value::from("Alice")),
                )
                .unwrap();
            table
                .insert(
                    Row::new()
                        .with("id", Value::Integer(2))
                        .with("name", Value::from("Bob")),
                )
                .unwrap();
            db.close();
        }

        let mut db = Database::open(dir.path()).unwrap();
        let table = db.table("users").unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.row(1).unwrap().get("name"),
            Some(&Value::from("Alice"))
        );

        // indexes were rebuilt on load
        let index = table.index("id").unwrap();
        assert_eq!(
            index.find_equal(&crate::storage::value::Key(Value::Integer(2))),
            vec![2]
        );

        // next row id continues past the persisted maximum
        let table = db.table_mut("users").unwrap();
        let id = table
            .insert(
                Row::new()
                    .with("id", Value::Integer(3))
                    .with("name", Value::from("Carol")),
            )
            .unwrap();
        assert_eq!(id, 3);
    }

    #[test]
    fn test_corrupt_document_refuses_to_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        assert!(matches!(Database::open(dir.path()), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_persisted_document_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::open(dir.path()).unwrap();
        db.create_table("users", columns()).unwrap();
        db.table_mut("users")
            .unwrap()
            .insert(
                Row::new()
                    .with("id", Value::Integer(1))
                    .with("name", Value::from("Alice")),
            )
            .unwrap();

        let written = fs::read_to_string(dir.path().join("users.json")).unwrap();
        let reloaded = Table::load_from(&dir.path().join("users.json")).unwrap();
        reloaded.save_to(dir.path()).unwrap();
        let rewritten = fs::read_to_string(dir.path().join("users.json")).unwrap();
        assert_eq!(written, rewritten);
    }
}
