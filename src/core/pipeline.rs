use crate::core::accumulator::Accumulator;
use crate::core::filter::filter_batch;
use crate::core::reader::{ChunkedReader, ReaderOptions};
use crate::core::{FilterConfig, FilterResult, Result, TableSource};

/// One source plus the immutable configuration of a run. `run` can be
/// called repeatedly; each call reads the source from the start.
pub struct AuditPipeline<S: TableSource> {
    source: S,
    filter: FilterConfig,
    reader: ReaderOptions,
}

impl<S: TableSource> AuditPipeline<S> {
    pub fn new(source: S, filter: FilterConfig, reader: ReaderOptions) -> Self {
        Self {
            source,
            filter,
            reader,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn filter_config(&self) -> &FilterConfig {
        &self.filter
    }

    pub fn reader_options(&self) -> &ReaderOptions {
        &self.reader
    }

    pub fn batches(&self) -> Result<ChunkedReader<'_>> {
        ChunkedReader::open(&self.source, &self.reader)
    }

    /// Opens the source and checks the header without reading any row.
    pub fn check_source(&self) -> Result<Vec<String>> {
        let reader = self.batches()?;
        Ok(reader.schema().columns().to_vec())
    }

    pub fn run(&self) -> Result<FilterResult> {
        tracing::info!("📥 Reading {} in batches of {}", self.source.name(), self.reader.batch_size);

        let mut reader = self.batches()?;
        let schema = reader.schema().clone();
        let mut accumulator = Accumulator::new();

        for batch in &mut reader {
            let batch = batch?;
            let index = batch.index;
            let filtered = filter_batch(batch, &self.filter);
            tracing::debug!(
                "Batch {}: {} rows read, {} kept",
                index,
                filtered.stats.rows_read,
                filtered.stats.kept
            );
            accumulator.push(filtered);
        }

        let result = accumulator.finish(&schema);
        if result.stats.null_dates > 0 {
            tracing::warn!(
                "{} rows had an empty or unreadable '{}' and were excluded",
                result.stats.null_dates,
                self.filter.date_column
            );
        }
        tracing::info!(
            "🔎 {} of {} rows fall on non-working days ({} batches)",
            result.count(),
            result.stats.rows_read,
            result.batches
        );

        Ok(result)
    }
}
