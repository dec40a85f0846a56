use crate::core::{Batch, RawRow, Result, Row, Schema, TableSource};
use crate::domain::model::DEFAULT_BATCH_SIZE;
use crate::utils::error::EtlError;
use crate::utils::validation::validate_positive_number;
use std::sync::Arc;

// 批次很大時不要一次預先配置整批
const MAX_PREALLOCATED_ROWS: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    pub batch_size: usize,
    /// Columns that must exist in the header, in output order when
    /// `only_required_columns` is set.
    pub required_columns: Vec<String>,
    pub only_required_columns: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            required_columns: Vec::new(),
            only_required_columns: false,
        }
    }
}

impl ReaderOptions {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Self::default()
        }
    }

    /// Adds a required column, ignoring duplicates.
    pub fn require(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        if !self.required_columns.contains(&column) {
            self.required_columns.push(column);
        }
        self
    }

    pub fn only_required(mut self, only: bool) -> Self {
        self.only_required_columns = only;
        self
    }
}

/// Lazily cuts a source into batches of at most `batch_size` rows. Only the
/// batch being built is held in memory; the underlying source is read row
/// by row.
pub struct ChunkedReader<'a> {
    rows: Box<dyn Iterator<Item = Result<RawRow>> + 'a>,
    schema: Arc<Schema>,
    projection: Option<Vec<usize>>,
    batch_size: usize,
    next_index: usize,
    finished: bool,
}

impl<'a> ChunkedReader<'a> {
    /// Opens the source from its first row. Header problems are reported
    /// here, before any batch is produced.
    pub fn open<S: TableSource + ?Sized>(source: &'a S, options: &ReaderOptions) -> Result<Self> {
        validate_positive_number("reader.batch_size", options.batch_size, 1)?;

        let table = source.open()?;

        let mut indices = Vec::with_capacity(options.required_columns.len());
        for column in &options.required_columns {
            let idx = table
                .columns
                .iter()
                .position(|c| c == column)
                .ok_or_else(|| EtlError::MissingColumnError {
                    column: column.clone(),
                    source_name: source.name(),
                })?;
            indices.push(idx);
        }

        let (schema, projection) = if options.only_required_columns {
            (Schema::new(options.required_columns.clone()), Some(indices))
        } else {
            (Schema::new(table.columns), None)
        };

        tracing::debug!(
            "Opened {} with {} columns, batch size {}",
            source.name(),
            schema.len(),
            options.batch_size
        );

        Ok(Self {
            rows: table.rows,
            schema: Arc::new(schema),
            projection,
            batch_size: options.batch_size,
            next_index: 0,
            finished: false,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn to_row(&self, raw: RawRow) -> Row {
        let values = match &self.projection {
            Some(indices) => indices
                .iter()
                .map(|&idx| raw.get(idx).cloned().flatten())
                .collect(),
            None => raw,
        };
        Row::new(Arc::clone(&self.schema), values)
    }
}

impl Iterator for ChunkedReader<'_> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut rows = Vec::with_capacity(self.batch_size.min(MAX_PREALLOCATED_ROWS));
        while rows.len() < self.batch_size {
            match self.rows.next() {
                Some(Ok(raw)) => rows.push(self.to_row(raw)),
                Some(Err(e)) => {
                    // 讀取錯誤後不再產生任何批次
                    self.finished = true;
                    return Some(Err(e));
                }
                None => {
                    self.finished = true;
                    break;
                }
            }
        }

        if rows.is_empty() {
            return None;
        }

        let batch = Batch {
            index: self.next_index,
            schema: Arc::clone(&self.schema),
            rows,
        };
        self.next_index += 1;
        Some(Ok(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemorySource;

    fn source(rows: usize) -> MemorySource {
        MemorySource::new(
            vec!["id", "start_date", "user", "ip"],
            (0..rows)
                .map(|i| {
                    vec![
                        Some(i.to_string()),
                        Some("2019-01-05".to_string()),
                        Some(format!("user{}", i)),
                        None,
                    ]
                })
                .collect(),
        )
    }

    fn ids(batches: &[Batch]) -> Vec<String> {
        batches
            .iter()
            .flat_map(|b| b.rows.iter())
            .map(|r| r.get("id").unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_batches_cover_every_row_in_order() {
        let source = source(7);
        let options = ReaderOptions::new(3).require("start_date");
        let batches: Vec<Batch> = ChunkedReader::open(&source, &options)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(batches.iter().map(Batch::len).collect::<Vec<_>>(), vec![3, 3, 1]);
        assert_eq!(batches.iter().map(|b| b.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(ids(&batches), (0..7).map(|i| i.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_empty_batch() {
        let source = source(4);
        let reader = ChunkedReader::open(&source, &ReaderOptions::new(2)).unwrap();
        assert_eq!(reader.count(), 2);
    }

    #[test]
    fn test_empty_source_yields_no_batches() {
        let source = source(0);
        let mut reader = ChunkedReader::open(&source, &ReaderOptions::new(10)).unwrap();
        assert!(reader.next().is_none());
        assert_eq!(reader.schema().len(), 4);
    }

    #[test]
    fn test_missing_required_column_fails_before_reading() {
        let source = source(3);
        let options = ReaderOptions::new(10).require("start_date").require("Usuario");
        let err = ChunkedReader::open(&source, &options).err().unwrap();

        match err {
            EtlError::MissingColumnError { column, .. } => assert_eq!(column, "Usuario"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let source = source(3);
        assert!(ChunkedReader::open(&source, &ReaderOptions::new(0)).is_err());
    }

    #[test]
    fn test_reader_is_restartable() {
        let source = source(5);
        let options = ReaderOptions::new(2);

        let first: Vec<Batch> = ChunkedReader::open(&source, &options)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        let second: Vec<Batch> = ChunkedReader::open(&source, &options)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn test_projection_keeps_required_columns_in_given_order() {
        let source = source(2);
        let options = ReaderOptions::new(10)
            .require("user")
            .require("start_date")
            .require("user")
            .only_required(true);
        let batch = ChunkedReader::open(&source, &options)
            .unwrap()
            .next()
            .unwrap()
            .unwrap();

        assert_eq!(batch.schema.columns(), ["user", "start_date"]);
        assert_eq!(
            batch.rows[1].values(),
            [Some("user1".to_string()), Some("2019-01-05".to_string())]
        );
    }

    #[test]
    fn test_read_error_stops_the_sequence() {
        let source = MemorySource::new(vec!["start_date"], vec![vec![Some("2019-01-05".into())]])
            .failing_after(1);
        let mut reader = ChunkedReader::open(&source, &ReaderOptions::new(5)).unwrap();

        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }
}
