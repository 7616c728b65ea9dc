//! Purpose: The record store: owns the table, runs CRUD, persists every mutation.
//! Exports: `RecordStore`, `DeleteOutcome`, `ModifyOutcome`, `SkippedColumn`, `SkipReason`.
//! Role: Only entry point for mutation; in-memory and on-disk state converge
//! after every successful call.
//! Invariants: Ids are unique among live rows and strictly increasing for the
//! life of the process.
//! Invariants: Failed validation mutates nothing and never touches storage.
//! Invariants: A failed save leaves the in-memory table as the sole source of
//! truth; no retry is attempted.
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use libc::{EACCES, EPERM};
use serde::Serialize;

use crate::core::cell::Cell;
use crate::core::codec;
use crate::core::error::{Error, ErrorKind};
use crate::core::schema::{ColumnKind, Schema};
use crate::core::table::{RecordTable, Row};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    UnknownColumn,
    GeneratedId,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SkippedColumn {
    pub column: String,
    pub reason: SkipReason,
}

/// Result of a criteria deletion: how many rows went away and which
/// criteria named columns outside the schema.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DeleteOutcome {
    pub removed: usize,
    pub skipped: Vec<SkippedColumn>,
}

/// Result of a modify: which columns were assigned and which were skipped.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ModifyOutcome {
    pub updated: Vec<String>,
    pub skipped: Vec<SkippedColumn>,
}

#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    table: RecordTable,
    next_id: i64,
    created: bool,
}

impl RecordStore {
    /// Open the store at `path`. An absent file becomes a fresh empty table
    /// persisted immediately; a present file is loaded under a shared lock
    /// with every cell re-coerced to its column kind.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let schema = Schema::product_orders();
        if path.exists() {
            let table = load(&path, &schema)?;
            let next_id = table.max_id().unwrap_or(0) + 1;
            tracing::debug!(path = %path.display(), rows = table.len(), "loaded record store");
            Ok(Self {
                path,
                table,
                next_id,
                created: false,
            })
        } else {
            let store = Self {
                path,
                table: RecordTable::new(schema),
                next_id: 1,
                created: true,
            };
            store.save()?;
            tracing::info!(path = %store.path.display(), "created new store file");
            Ok(store)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when `open` built the file fresh rather than loading it.
    pub fn created(&self) -> bool {
        self.created
    }

    pub fn table(&self) -> &RecordTable {
        &self.table
    }

    /// Append one entry. `values` carries the data columns in schema order;
    /// the id is generated. A save failure is returned after the row is
    /// already in memory; callers must treat saved state as stale.
    pub fn add_entry(&mut self, values: &[String]) -> Result<i64, Error> {
        let expected = self.table.schema().data_column_count();
        if values.len() != expected {
            return Err(Error::new(ErrorKind::Validation)
                .with_message(format!(
                    "entry has {} values, schema has {expected} data columns",
                    values.len()
                ))
                .with_hint("Supply one value per data column, in schema order."));
        }

        let id = self.next_id;
        let mut cells = Vec::with_capacity(self.table.schema().len());
        let mut next_value = 0usize;
        for column in self.table.schema().columns() {
            match column.kind() {
                ColumnKind::Id => cells.push(Cell::Int(id)),
                kind => {
                    let raw = values.get(next_value).map(String::as_str).unwrap_or_default();
                    next_value += 1;
                    cells.push(Cell::coerce(raw, kind));
                }
            }
        }
        self.table.push(Row::new(cells));
        self.next_id += 1;
        self.save()?;
        tracing::debug!(id, rows = self.table.len(), "added entry");
        Ok(id)
    }

    /// Remove the entry with the given id. The vector compaction in
    /// `retain` re-establishes the contiguous positional index.
    pub fn delete_entry(&mut self, id: i64) -> Result<usize, Error> {
        let Some(id_idx) = self.table.schema().id_index() else {
            return Err(Error::new(ErrorKind::Internal).with_message("schema has no id column"));
        };
        if self.table.position_of_id(id).is_none() {
            return Err(Error::new(ErrorKind::NotFound)
                .with_message("no entry with that id")
                .with_id(id));
        }
        let removed = self.table.retain(|row| row.cell(id_idx).as_id() != Some(id));
        self.save()?;
        tracing::debug!(id, removed, "deleted entry");
        Ok(removed)
    }

    /// Remove every row matching each criterion in turn. Criteria are
    /// applied sequentially to the survivors of the previous one, which for
    /// equality filters is the same as a conjunction. Unknown columns are
    /// reported in the outcome and never abort the call.
    pub fn delete_where(&mut self, criteria: &[(String, String)]) -> Result<DeleteOutcome, Error> {
        let mut outcome = DeleteOutcome::default();
        for (column, raw) in criteria {
            let Some(idx) = self.table.schema().index_of(column) else {
                outcome.skipped.push(SkippedColumn {
                    column: column.clone(),
                    reason: SkipReason::UnknownColumn,
                });
                continue;
            };
            let target = Cell::coerce(raw, self.table.schema().columns()[idx].kind());
            outcome.removed += self.table.retain(|row| *row.cell(idx) != target);
        }
        self.save()?;
        tracing::debug!(removed = outcome.removed, "deleted entries by criteria");
        Ok(outcome)
    }

    /// Apply column updates to the entry with the given id. Unknown columns
    /// and the generated id column are skipped with a report; the remaining
    /// updates still apply. Persists once after the loop.
    pub fn modify_entry(
        &mut self,
        id: i64,
        updates: &[(String, String)],
    ) -> Result<ModifyOutcome, Error> {
        let Some(position) = self.table.position_of_id(id) else {
            return Err(Error::new(ErrorKind::NotFound)
                .with_message("no entry with that id")
                .with_id(id));
        };

        let mut outcome = ModifyOutcome::default();
        let mut assignments = Vec::new();
        for (column, raw) in updates {
            match self.table.schema().index_of(column) {
                None => outcome.skipped.push(SkippedColumn {
                    column: column.clone(),
                    reason: SkipReason::UnknownColumn,
                }),
                Some(idx) if self.table.schema().columns()[idx].kind() == ColumnKind::Id => {
                    outcome.skipped.push(SkippedColumn {
                        column: column.clone(),
                        reason: SkipReason::GeneratedId,
                    });
                }
                Some(idx) => {
                    let kind = self.table.schema().columns()[idx].kind();
                    assignments.push((idx, Cell::coerce(raw, kind)));
                    outcome.updated.push(column.clone());
                }
            }
        }
        for (idx, cell) in assignments {
            self.table.row_mut(position).set_cell(idx, cell);
        }
        self.save()?;
        tracing::debug!(id, updated = outcome.updated.len(), "modified entry");
        Ok(outcome)
    }

    /// Rewrite the whole storage file under an exclusive lock. A file held
    /// by another process fails the call once; no retry, no backoff.
    pub fn save(&self) -> Result<(), Error> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to open storage file for writing")
                    .with_path(&self.path)
                    .with_source(err)
            })?;
        FileExt::try_lock_exclusive(&file).map_err(|err| {
            Error::new(lock_error_kind(&err))
                .with_message("storage file is locked by another process")
                .with_hint("Close the other program using the file and retry the operation.")
                .with_path(&self.path)
                .with_source(err)
        })?;
        let _guard = FileLock { file: &file };

        file.set_len(0).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to truncate storage file")
                .with_path(&self.path)
                .with_source(err)
        })?;
        let mut writer = BufWriter::new(&file);
        codec::encode_to(&mut writer, &self.table).map_err(|err| err.with_path(&self.path))?;
        writer.flush().map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to flush storage file")
                .with_path(&self.path)
                .with_source(err)
        })?;
        Ok(())
    }
}

struct FileLock<'a> {
    file: &'a File,
}

impl Drop for FileLock<'_> {
    fn drop(&mut self) {
        let _ = FileExt::unlock(self.file);
    }
}

fn load(path: &Path, schema: &Schema) -> Result<RecordTable, Error> {
    let file = File::open(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to open storage file")
            .with_path(path)
            .with_source(err)
    })?;
    FileExt::try_lock_shared(&file).map_err(|err| {
        Error::new(lock_error_kind(&err))
            .with_message("storage file is locked by another process")
            .with_hint("Close the other program using the file and retry.")
            .with_path(path)
            .with_source(err)
    })?;
    let _guard = FileLock { file: &file };
    codec::decode_from(BufReader::new(&file), schema).map_err(|err| err.with_path(path))
}

fn lock_error_kind(err: &io::Error) -> ErrorKind {
    let errno = err.raw_os_error().unwrap_or_default();
    if errno == EACCES || errno == EPERM {
        return ErrorKind::Permission;
    }
    match err.kind() {
        io::ErrorKind::WouldBlock => ErrorKind::Busy,
        io::ErrorKind::PermissionDenied => ErrorKind::Permission,
        _ => ErrorKind::Io,
    }
}
