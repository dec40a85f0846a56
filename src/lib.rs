pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{CsvSink, CsvSource, MemorySink, MemorySource};
pub use config::settings::AuditSettings;
pub use core::{
    background::{BackgroundRunner, RunHandle},
    etl::{EtlEngine, RunSummary},
    exporter::{ExportOutcome, Exporter},
    pipeline::AuditPipeline,
    reader::ReaderOptions,
};
pub use domain::model::{DateRange, FieldValidator, FilterConfig, FilterResult, HolidaySet};
pub use utils::error::{EtlError, Result};
