use crate::core::calendar::{is_non_working, parse_date};
use crate::core::validator::passes_all;
use crate::core::{Batch, FilterConfig, FilterStats, Row};

#[derive(Debug, Clone)]
pub struct FilteredBatch {
    pub index: usize,
    pub rows: Vec<Row>,
    pub stats: FilterStats,
}

/// Keeps the rows of one batch that survive, in this order: date range,
/// non-working-day check, field validators. A row without a readable date
/// is dropped by the range step when a range is set, and by the calendar
/// step otherwise.
pub fn filter_batch(batch: Batch, config: &FilterConfig) -> FilteredBatch {
    let date_idx = batch.schema.index_of(&config.date_column);
    let mut stats = FilterStats {
        rows_read: batch.len() as u64,
        ..FilterStats::default()
    };
    let mut kept = Vec::new();

    for row in batch.rows {
        let date = date_idx.and_then(|idx| row.value(idx)).and_then(parse_date);
        if date.is_none() {
            stats.null_dates += 1;
        }

        if let Some(range) = &config.range {
            if !date.is_some_and(|d| range.contains(d)) {
                stats.dropped_by_range += 1;
                continue;
            }
        }

        if !is_non_working(date, &config.holidays) {
            stats.dropped_by_calendar += 1;
            continue;
        }

        if !passes_all(&row, &config.validators) {
            stats.dropped_by_validator += 1;
            continue;
        }

        kept.push(row);
    }

    stats.kept = kept.len() as u64;
    FilteredBatch {
        index: batch.index,
        rows: kept,
        stats,
    }
}

/// Surviving rows only.
pub fn filter(batch: Batch, config: &FilterConfig) -> Vec<Row> {
    filter_batch(batch, config).rows
}
