pub mod accumulator;
pub mod background;
pub mod calendar;
pub mod etl;
pub mod exporter;
pub mod filter;
pub mod pipeline;
pub mod reader;
pub mod validator;

pub use crate::domain::model::{
    Batch, DateRange, FieldValidator, FilterConfig, FilterResult, FilterStats, HolidaySet, Row,
    Schema,
};
pub use crate::domain::ports::{ExportConfirmation, OpenedTable, RawRow, TableSink, TableSource};
pub use crate::utils::error::Result;
