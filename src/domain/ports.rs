use crate::domain::model::{FilterResult, Row};
use crate::utils::error::Result;

/// Cell values of one data row, in header order. Empty cells are `None`.
pub type RawRow = Vec<Option<String>>;

pub struct OpenedTable<'a> {
    pub columns: Vec<String>,
    pub rows: Box<dyn Iterator<Item = Result<RawRow>> + 'a>,
}

/// Physical reader of a tabular file. Every `open` starts from the first
/// data row; implementations must not share a cursor between calls.
pub trait TableSource: Send + Sync {
    fn name(&self) -> String;
    fn open(&self) -> Result<OpenedTable<'_>>;
}

/// Physical writer. Either the full table is written or nothing is.
pub trait TableSink: Send + Sync {
    fn name(&self) -> String;
    fn write_table(&self, columns: &[String], rows: &[Row]) -> Result<usize>;
}

/// Yes/no gate asked once per run before anything is written.
pub trait ExportConfirmation: Send {
    fn confirm(&self, result: &FilterResult, destination: &str) -> bool;
}

impl ExportConfirmation for bool {
    fn confirm(&self, _result: &FilterResult, _destination: &str) -> bool {
        *self
    }
}

impl<T: ExportConfirmation + ?Sized> ExportConfirmation for Box<T> {
    fn confirm(&self, result: &FilterResult, destination: &str) -> bool {
        (**self).confirm(result, destination)
    }
}
