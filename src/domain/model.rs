use crate::utils::error::{EtlError, Result};
use crate::utils::validation::parse_config_date;
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_DATE_COLUMN: &str = "start_date";
pub const DEFAULT_USER_COLUMN: &str = "user";
pub const DEFAULT_BATCH_SIZE: usize = 50_000;

/// Column names of a table, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// One source record. Empty cells are `None`; every value is carried
/// through untouched, including the original date text.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    schema: Arc<Schema>,
    values: Vec<Option<String>>,
}

impl Row {
    pub fn new(schema: Arc<Schema>, values: Vec<Option<String>>) -> Self {
        Self { schema, values }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.schema
            .index_of(column)
            .and_then(|idx| self.value(idx))
    }

    pub fn value(&self, idx: usize) -> Option<&str> {
        self.values.get(idx).and_then(|v| v.as_deref())
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}

#[derive(Debug, Clone)]
pub struct Batch {
    /// Zero-based position of the batch in the source.
    pub index: usize,
    pub schema: Arc<Schema>,
    pub rows: Vec<Row>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidaySet {
    dates: BTreeSet<NaiveDate>,
}

const PRESET_2019: [&str; 10] = [
    "2019-01-01",
    "2019-02-24",
    "2019-03-29",
    "2019-05-01",
    "2019-06-20",
    "2019-07-09",
    "2019-08-17",
    "2019-10-12",
    "2019-11-02",
    "2019-12-25",
];

impl HolidaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dates<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    /// Parses `YYYY-MM-DD` texts. Any bad entry rejects the whole list.
    pub fn parse_list<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let dates = entries
            .iter()
            .map(|entry| parse_config_date("holidays", entry.as_ref()))
            .collect::<Result<BTreeSet<_>>>()?;
        Ok(Self { dates })
    }

    /// One date per line; blank lines and `#` comments are skipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| EtlError::FileIoError {
            path: path.display().to_string(),
            source,
        })?;

        let entries: Vec<&str> = content
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default().trim())
            .filter(|line| !line.is_empty())
            .collect();

        Self::parse_list(entries.as_slice())
    }

    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "2019" => Self::parse_list(&PRESET_2019[..]),
            other => Err(EtlError::InvalidConfigValueError {
                field: "holiday_preset".to_string(),
                value: other.to_string(),
                reason: "Known presets: 2019".to_string(),
            }),
        }
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.dates.contains(date)
    }

    pub fn extend(&mut self, other: HolidaySet) {
        self.dates.extend(other.dates);
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(EtlError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Both bounds or neither; a single bound is rejected instead of being
    /// silently ignored.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Option<Self>> {
        let start = start.map(str::trim).filter(|s| !s.is_empty());
        let end = end.map(str::trim).filter(|s| !s.is_empty());

        match (start, end) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => {
                let start = parse_config_date("filter.start", start)?;
                let end = parse_config_date("filter.end", end)?;
                Self::new(start, end).map(Some)
            }
            (Some(_), None) => Err(EtlError::MissingConfigError {
                field: "filter.end".to_string(),
            }),
            (None, Some(_)) => Err(EtlError::MissingConfigError {
                field: "filter.start".to_string(),
            }),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A `(column, pattern)` check, compiled once per run.
#[derive(Debug, Clone)]
pub struct FieldValidator {
    column: String,
    pattern: Regex,
}

impl FieldValidator {
    pub fn new(column: impl Into<String>, pattern: &str) -> Result<Self> {
        let column = column.into();
        let pattern = Regex::new(pattern).map_err(|e| EtlError::InvalidPattern {
            column: column.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { column, pattern })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub date_column: String,
    pub holidays: HolidaySet,
    pub range: Option<DateRange>,
    pub validators: Vec<FieldValidator>,
}

impl FilterConfig {
    pub fn new(holidays: HolidaySet) -> Self {
        Self {
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            holidays,
            range: None,
            validators: Vec::new(),
        }
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_validator(mut self, validator: FieldValidator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn with_date_column(mut self, column: impl Into<String>) -> Self {
        self.date_column = column.into();
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub rows_read: u64,
    pub null_dates: u64,
    pub dropped_by_range: u64,
    pub dropped_by_calendar: u64,
    pub dropped_by_validator: u64,
    pub kept: u64,
}

impl FilterStats {
    pub fn merge(&mut self, other: &FilterStats) {
        self.rows_read += other.rows_read;
        self.null_dates += other.null_dates;
        self.dropped_by_range += other.dropped_by_range;
        self.dropped_by_calendar += other.dropped_by_calendar;
        self.dropped_by_validator += other.dropped_by_validator;
        self.kept += other.kept;
    }
}

/// Rows that survived every filter, in source order.
#[derive(Debug, Clone)]
pub struct FilterResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub stats: FilterStats,
    pub batches: usize,
}

impl FilterResult {
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn preview(&self, limit: usize) -> &[Row] {
        &self.rows[..self.rows.len().min(limit)]
    }
}
