use crate::core::filter::FilteredBatch;
use crate::core::{FilterResult, FilterStats, Row, Schema};

/// Appends filtered batches in the order they are pushed. No dedup, no
/// sorting.
#[derive(Debug, Default)]
pub struct Accumulator {
    rows: Vec<Row>,
    stats: FilterStats,
    batches: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, batch: FilteredBatch) {
        debug_assert_eq!(batch.index, self.batches, "batches must arrive in source order");
        self.stats.merge(&batch.stats);
        self.rows.extend(batch.rows);
        self.batches += 1;
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn finish(self, schema: &Schema) -> FilterResult {
        FilterResult {
            columns: schema.columns().to_vec(),
            rows: self.rows,
            stats: self.stats,
            batches: self.batches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn filtered(index: usize, schema: &Arc<Schema>, ids: &[&str], read: u64) -> FilteredBatch {
        FilteredBatch {
            index,
            rows: ids
                .iter()
                .map(|id| Row::new(Arc::clone(schema), vec![Some(id.to_string())]))
                .collect(),
            stats: FilterStats {
                rows_read: read,
                kept: ids.len() as u64,
                dropped_by_calendar: read - ids.len() as u64,
                ..FilterStats::default()
            },
        }
    }

    #[test]
    fn test_preserves_batch_and_row_order() {
        let schema = Arc::new(Schema::new(vec!["id".into()]));
        let mut acc = Accumulator::new();
        acc.push(filtered(0, &schema, &["b", "a"], 3));
        acc.push(filtered(1, &schema, &[], 2));
        acc.push(filtered(2, &schema, &["c", "a"], 2));

        let result = acc.finish(&schema);
        let ids: Vec<&str> = result.rows.iter().map(|r| r.get("id").unwrap()).collect();

        assert_eq!(ids, vec!["b", "a", "c", "a"]);
        assert_eq!(result.count(), 4);
        assert_eq!(result.batches, 3);
        assert_eq!(result.stats.rows_read, 7);
        assert_eq!(result.stats.dropped_by_calendar, 3);
        assert_eq!(result.columns, vec!["id".to_string()]);
    }

    #[test]
    fn test_empty_accumulator_keeps_columns() {
        let schema = Schema::new(vec!["start_date".into(), "user".into()]);
        let result = Accumulator::new().finish(&schema);

        assert!(result.is_empty());
        assert_eq!(result.columns.len(), 2);
    }
}
