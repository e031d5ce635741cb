//! On-disk document layout for OakDB tables
//!
//! Each table persists to one self-describing JSON document under the
//! database directory. The writer is atomic: the document is written to
//! `<table>.json.tmp`, flushed, then renamed over `<table>.json`, so a
//! reader never observes a partial document.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::table::Row;
use super::value::RowId;
use crate::catalog::Column;
use crate::error::Result;

/// Serializable view of a table, borrowed from the live structures
#[derive(Serialize)]
pub(crate) struct TableDocumentRef<'a> {
    pub schema: &'a [Column],
    pub rows: &'a BTreeMap<RowId, Row>,
}

/// Owned table document as parsed back from disk
#[derive(Deserialize)]
pub(crate) struct TableDocument {
    pub schema: Vec<Column>,
    pub rows: BTreeMap<RowId, Row>,
}

/// Path of a table's document within a database directory
pub(crate) fn table_file(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.json", name))
}

/// Write `contents` to `path` atomically: temp file, flush, rename
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = File::create(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Remove a table's document if present
pub(crate) fn remove_table_file(dir: &Path, name: &str) -> Result<()> {
    let path = table_file(dir, name);
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}
