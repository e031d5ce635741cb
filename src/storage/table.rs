//! Row storage and constraint enforcement for OakDB
//!
//! A [`Table`] owns its rows, its schema, and the B-Tree indexes over its
//! columns, updating the indexes in lockstep with every mutation. All
//! constraint checks happen before any state changes, so a failed statement
//! leaves the table untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::btree::BTree;
use super::disk;
use super::value::{Key, RowId, Value};
use crate::catalog::{Column, ColumnType, Schema};
use crate::error::{Error, Result};

/// A row: mapping from column name to value. Every declared column is
/// present once the row has been stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    values: BTreeMap<String, Value>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, column: impl Into<String>, value: Value) -> Self {
        self.set(column, value);
        self
    }

    /// Set a column's value
    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        self.values.insert(column.into(), value);
    }

    /// Get a column's value
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Column names present in this row
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|s| s.as_str())
    }
}

/// A table: schema, row store keyed by row id, and secondary indexes
#[derive(Debug)]
pub struct Table {
    name: String,
    schema: Schema,
    rows: BTreeMap<RowId, Row>,
    /// Index per column name, maintained in lockstep with `rows`
    indexes: BTreeMap<String, BTree>,
    next_row_id: RowId,
    /// Database directory; `None` for in-memory tables (tests)
    dir: Option<PathBuf>,
}

impl Table {
    /// Create an empty table. Primary-key and unique columns are indexed
    /// immediately.
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        let mut table = Self {
            name: name.into(),
            schema,
            rows: BTreeMap::new(),
            indexes: BTreeMap::new(),
            next_row_id: 1,
            dir: None,
        };
        let indexed: Vec<String> = table
            .schema
            .columns()
            .iter()
            .filter(|c| c.indexed())
            .map(|c| c.name.clone())
            .collect();
        for col in indexed {
            table.indexes.insert(col, BTree::new());
        }
        table
    }

    /// Declared table name (case preserved)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The table's schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of stored rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get a row by id
    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.rows.get(&id)
    }

    /// Ordered sequence over `(row id, row)`, row ids ascending
    pub fn scan(&self) -> impl Iterator<Item = (RowId, &Row)> {
        self.rows.iter().map(|(&id, row)| (id, row))
    }

    /// The index over `column`, if one exists
    pub fn index(&self, column: &str) -> Option<&BTree> {
        self.indexes.get(column)
    }

    /// Attach the directory this table persists into
    pub(crate) fn set_dir(&mut self, dir: PathBuf) {
        self.dir = Some(dir);
    }

    /// Build and register an index over `column`, populated from existing
    /// rows. Idempotent.
    pub fn create_column_index(&mut self, column: &str) -> Result<()> {
        if !self.schema.has_column(column) {
            return Err(Error::ColumnNotFound(
                column.to_string(),
                self.name.clone(),
            ));
        }
        if self.indexes.contains_key(column) {
            return Ok(());
        }

        let mut index = BTree::new();
        for (&id, row) in &self.rows {
            index.insert(Key(row.get(column).cloned().unwrap_or(Value::Null)), id);
        }
        self.indexes.insert(column.to_string(), index);
        Ok(())
    }

    /// Insert a row, returning its assigned row id.
    ///
    /// Missing columns become NULL. Values are type-checked (integers widen
    /// into FLOAT columns), NOT NULL and uniqueness are enforced, and every
    /// index is updated before the table persists.
    pub fn insert(&mut self, mut row: Row) -> Result<RowId> {
        for col in row.columns() {
            if !self.schema.has_column(col) {
                return Err(Error::UnknownColumn(col.to_string(), self.name.clone()));
            }
        }

        let mut checked = Row::new();
        for col in self.schema.columns() {
            let value = row.values.remove(&col.name).unwrap_or(Value::Null);
            let value = coerce(col, value)?;
            if value.is_null() && col.not_null {
                return Err(Error::NullNotAllowed(col.name.clone()));
            }
            checked.set(col.name.clone(), value);
        }

        for col in self.schema.columns().iter().filter(|c| c.unique) {
            let value = checked.get(&col.name).expect("row is complete");
            if value.is_null() {
                continue;
            }
            if let Some(index) = self.indexes.get(&col.name) {
                if index.contains(&Key(value.clone())) {
                    return Err(unique_violation(col, value));
                }
            }
        }

        let row_id = self.next_row_id;
        self.next_row_id += 1;
        for (col, index) in self.indexes.iter_mut() {
            index.insert(Key(checked.get(col).cloned().unwrap_or(Value::Null)), row_id);
        }
        self.rows.insert(row_id, checked);
        self.persist()?;
        Ok(row_id)
    }

    /// Apply `assignments` to the rows named by `ids`, all-or-nothing.
    ///
    /// Every proposed row is validated as if re-inserted before any row or
    /// index changes; uniqueness is judged against the final state, so a
    /// colliding value outside the batch or repeated within it rejects the
    /// whole update. Returns the number of rows updated.
    pub fn update_rows(
        &mut self,
        ids: &[RowId],
        assignments: &[(String, Value)],
    ) -> Result<usize> {
        let mut coerced: Vec<(String, Value)> = Vec::with_capacity(assignments.len());
        for (name, value) in assignments {
            let col = self
                .schema
                .column(name)
                .ok_or_else(|| Error::UnknownColumn(name.clone(), self.name.clone()))?;
            let value = coerce(col, value.clone())?;
            if value.is_null() && col.not_null {
                return Err(Error::NullNotAllowed(col.name.clone()));
            }
            coerced.push((name.clone(), value));
        }

        let mut proposed: Vec<(RowId, Row)> = Vec::new();
        for &id in ids {
            let old = match self.rows.get(&id) {
                Some(row) => row,
                None => continue,
            };
            let mut new_row = old.clone();
            for (name, value) in &coerced {
                new_row.set(name.clone(), value.clone());
            }
            proposed.push((id, new_row));
        }

        let in_batch: BTreeSet<RowId> = proposed.iter().map(|(id, _)| *id).collect();
        for col in self.schema.columns().iter().filter(|c| c.unique) {
            let index = match self.indexes.get(&col.name) {
                Some(index) => index,
                None => continue,
            };
            let mut seen: BTreeSet<Key> = BTreeSet::new();
            for (_, new_row) in &proposed {
                let value = new_row.get(&col.name).cloned().unwrap_or(Value::Null);
                if value.is_null() {
                    continue;
                }
                let key = Key(value);
                let collides_outside = index
                    .find_equal(&key)
                    .iter()
                    .any(|rid| !in_batch.contains(rid));
                if collides_outside || !seen.insert(key.clone()) {
                    return Err(unique_violation(col, &key.0));
                }
            }
        }

        let count = proposed.len();
        for (id, new_row) in proposed {
            let old = self.rows.get(&id).expect("matched above");
            let mut index_moves = Vec::new();
            for col in self.indexes.keys() {
                let old_value = old.get(col).cloned().unwrap_or(Value::Null);
                let new_value = new_row.get(col).cloned().unwrap_or(Value::Null);
                if old_value != new_value {
                    index_moves.push((col.clone(), old_value, new_value));
                }
            }
            for (col, old_value, new_value) in index_moves {
                let index = self.indexes.get_mut(&col).expect("known index");
                index.remove(&Key(old_value), id);
                index.insert(Key(new_value), id);
            }
            self.rows.insert(id, new_row);
        }

        if count > 0 {
            self.persist()?;
        }
        Ok(count)
    }

    /// Remove the rows named by `ids` from the store and every index.
    /// Returns the number of rows removed.
    pub fn delete_rows(&mut self, ids: &[RowId]) -> Result<usize> {
        let mut count = 0;
        for &id in ids {
            let row = match self.rows.remove(&id) {
                Some(row) => row,
                None => continue,
            };
            for (col, index) in self.indexes.iter_mut() {
                index.remove(&Key(row.get(col).cloned().unwrap_or(Value::Null)), id);
            }
            count += 1;
        }
        if count > 0 {
            self.persist()?;
        }
        Ok(count)
    }

    // ========== Persistence ==========

    /// Rewrite the table's document if a directory is attached
    pub(crate) fn persist(&self) -> Result<()> {
        if let Some(dir) = &self.dir {
            self.save_to(dir)?;
        }
        Ok(())
    }

    /// Write the full table document atomically into `dir`
    pub fn save_to(&self, dir: &Path) -> Result<()> {
        let doc = disk::TableDocumentRef {
            schema: self.schema.columns(),
            rows: &self.rows,
        };
        let json = serde_json::to_string_pretty(&doc)
            .map_err(|e| Error::StorageError(e.to_string()))?;
        disk::write_atomic(&disk::table_file(dir, &self.name), &json)?;
        debug!(table = %self.name, rows = self.rows.len(), "persisted table document");
        Ok(())
    }

    /// Reconstruct a table from its document. Indexes are rebuilt by
    /// replaying rows in row-id order; the next row id becomes one past the
    /// maximum persisted id.
    pub fn load_from(path: &Path) -> Result<Table> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::Corrupt(path.display().to_string()))?
            .to_string();
        let text = fs::read_to_string(path)?;
        let doc: disk::TableDocument =
            serde_json::from_str(&text).map_err(|_| Error::Corrupt(name.clone()))?;

        let schema = Schema::from_columns(&name, doc.schema)?;
        let mut table = Table::new(name, schema);
        table.dir = path.parent().map(|p| p.to_path_buf());

        for (&id, row) in &doc.rows {
            for (col, index) in table.indexes.iter_mut() {
                index.insert(Key(row.get(col).cloned().unwrap_or(Value::Null)), id);
            }
        }
        table.next_row_id = doc.rows.keys().max().map_or(1, |max| max + 1);
        table.rows = doc.rows;
        Ok(table)
    }
}

/// Check a value against a column's type, widening INTEGER into FLOAT
fn coerce(col: &Column, value: Value) -> Result<Value> {
    match (value, col.column_type) {
        (Value::Null, _) => Ok(Value::Null),
        (Value::Integer(i), ColumnType::Integer) => Ok(Value::Integer(i)),
        (Value::Integer(i), ColumnType::Float) => Ok(Value::Float(i as f64)),
        (Value::Float(f), ColumnType::Float) => Ok(Value::Float(f)),
        (Value::Text(s), ColumnType::Text) => Ok(Value::Text(s)),
        (Value::Boolean(b), ColumnType::Boolean) => Ok(Value::Boolean(b)),
        (value, expected) => Err(Error::TypeMismatch {
            column: col.name.clone(),
            expected: expected.to_string(),
            found: value.type_name().to_string(),
        }),
    }
}

fn unique_violation(col: &Column, value: &Value) -> Error {
    if col.primary_key {
        Error::PrimaryKeyViolation {
            column: col.name.clone(),
            value: value.to_string(),
        }
    } else {
        Error::UniqueViolation {
            column: col.name.clone(),
            value: value.to_string(),
        }
    }
}
