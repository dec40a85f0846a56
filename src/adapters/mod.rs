// Adapters layer: concrete table readers and writers behind the domain ports.

pub mod csv_table;
pub mod memory;

pub use csv_table::{CsvSink, CsvSource};
pub use memory::{MemorySink, MemorySource};
