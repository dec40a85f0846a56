use crate::domain::model::Row;
use crate::domain::ports::{OpenedTable, RawRow, TableSink, TableSource};
use crate::utils::error::{EtlError, Result};
use std::sync::{Arc, Mutex};

/// Table held in memory. Handy for tests and for callers that already
/// parsed their data.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    columns: Vec<String>,
    rows: Vec<RawRow>,
    fail_after: Option<usize>,
}

impl MemorySource {
    pub fn new<I, S>(columns: I, rows: Vec<RawRow>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: "memory".to_string(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
            fail_after: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Yields `rows` rows and then a read error.
    pub fn failing_after(mut self, rows: usize) -> Self {
        self.fail_after = Some(rows);
        self
    }
}

impl TableSource for MemorySource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn open(&self) -> Result<OpenedTable<'_>> {
        let limit = self.fail_after.unwrap_or(self.rows.len());
        let rows = self.rows.iter().take(limit).cloned().map(Ok);
        let failure = self.fail_after.map(|_| {
            Err(EtlError::FileIoError {
                path: self.name.clone(),
                source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated table"),
            })
        });

        Ok(OpenedTable {
            columns: self.columns.clone(),
            rows: Box::new(rows.chain(failure)),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WrittenTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Records every table written to it. Clones share the same storage.
#[derive(Debug, Clone)]
pub struct MemorySink {
    name: String,
    tables: Arc<Mutex<Vec<WrittenTable>>>,
    fail: bool,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    /// Every write fails with an IO error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn tables(&self) -> Vec<WrittenTable> {
        self.tables
            .lock()
            .map(|tables| tables.clone())
            .unwrap_or_default()
    }
}

impl TableSink for MemorySink {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn write_table(&self, columns: &[String], rows: &[Row]) -> Result<usize> {
        if self.fail {
            return Err(EtlError::FileIoError {
                path: self.name.clone(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only sink"),
            });
        }

        let table = WrittenTable {
            columns: columns.to_vec(),
            rows: rows.iter().map(|row| row.values().to_vec()).collect(),
        };
        let mut tables = self.tables.lock().map_err(|_| EtlError::TaskFailed {
            message: format!("{} storage is poisoned", self.name),
        })?;
        tables.push(table);
        Ok(rows.len())
    }
}
