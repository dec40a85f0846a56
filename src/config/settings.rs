use crate::adapters::{CsvSink, CsvSource};
use crate::config::toml_config::{TomlConfig, ValidatorSpec};
use crate::core::etl::EtlEngine;
use crate::core::exporter::{Exporter, DEFAULT_OUTPUT_FILE};
use crate::core::pipeline::AuditPipeline;
use crate::core::reader::ReaderOptions;
use crate::domain::model::{
    DateRange, FieldValidator, FilterConfig, HolidaySet, DEFAULT_BATCH_SIZE, DEFAULT_DATE_COLUMN,
    DEFAULT_USER_COLUMN,
};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_path, validate_positive_number,
    Validate,
};
use std::fs;
use std::path::Path;

pub const DEFAULT_INPUT_FILE: &str = "bd_automatas.csv";
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

const TABLE_EXTENSIONS: [&str; 3] = ["csv", "tsv", "txt"];

/// Everything one run needs, after the TOML file and command line flags
/// have been merged.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditSettings {
    pub input_path: String,
    pub input_delimiter: Option<char>,
    pub output_path: String,
    pub output_delimiter: Option<char>,
    pub date_column: String,
    pub user_column: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub holidays: Vec<String>,
    pub holiday_file: Option<String>,
    pub holiday_preset: Option<String>,
    pub validators: Vec<ValidatorSpec>,
    pub batch_size: usize,
    pub only_required_columns: bool,
    pub auto_confirm: bool,
    pub preview_rows: usize,
    pub monitor: bool,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            input_path: DEFAULT_INPUT_FILE.to_string(),
            input_delimiter: None,
            output_path: DEFAULT_OUTPUT_FILE.to_string(),
            output_delimiter: None,
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            user_column: DEFAULT_USER_COLUMN.to_string(),
            start: None,
            end: None,
            holidays: Vec::new(),
            holiday_file: None,
            holiday_preset: None,
            validators: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            only_required_columns: false,
            auto_confirm: false,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            monitor: false,
        }
    }
}

fn delimiter_byte(field: &str, delimiter: char) -> Result<u8> {
    if delimiter.is_ascii() && delimiter != '"' && delimiter != '\n' && delimiter != '\r' {
        Ok(delimiter as u8)
    } else {
        Err(EtlError::InvalidConfigValueError {
            field: field.to_string(),
            value: delimiter.escape_default().to_string(),
            reason: "Delimiter must be a single ASCII character other than quote or newline"
                .to_string(),
        })
    }
}

/// Compares resolved locations. The output may not exist yet, so its parent
/// directory is resolved and the file name joined back on.
fn same_file(input: &Path, output: &Path) -> bool {
    let Ok(input) = fs::canonicalize(input) else {
        return false;
    };
    let parent = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    match (fs::canonicalize(parent), output.file_name()) {
        (Ok(parent), Some(name)) => parent.join(name) == input,
        _ => false,
    }
}

impl AuditSettings {
    pub fn from_toml(config: &TomlConfig) -> Self {
        let defaults = Self::default();
        Self {
            input_path: config.source.path.clone().unwrap_or(defaults.input_path),
            input_delimiter: config.source.delimiter,
            output_path: config.export.output_path.clone().unwrap_or(defaults.output_path),
            output_delimiter: config.export.delimiter,
            date_column: config.columns.start_date.clone().unwrap_or(defaults.date_column),
            user_column: config.columns.user.clone().unwrap_or(defaults.user_column),
            start: config.filter.start.clone(),
            end: config.filter.end.clone(),
            holidays: config.filter.holidays.clone(),
            holiday_file: config.filter.holiday_file.clone(),
            holiday_preset: config.filter.holiday_preset.clone(),
            validators: config.filter.validators.clone(),
            batch_size: config.reader.batch_size.unwrap_or(defaults.batch_size),
            only_required_columns: config.reader.only_required_columns.unwrap_or(false),
            auto_confirm: config.export.auto_confirm.unwrap_or(false),
            preview_rows: config.export.preview_rows.unwrap_or(defaults.preview_rows),
            monitor: config.monitoring_enabled(),
        }
    }

    /// Union of the inline list, the holiday file and the preset.
    pub fn holiday_set(&self) -> Result<HolidaySet> {
        let mut holidays = HolidaySet::parse_list(self.holidays.as_slice())?;
        if let Some(file) = &self.holiday_file {
            holidays.extend(HolidaySet::from_file(file)?);
        }
        if let Some(preset) = &self.holiday_preset {
            holidays.extend(HolidaySet::preset(preset)?);
        }
        if holidays.is_empty() {
            tracing::warn!("No holidays configured; only weekends count as non-working days");
        }
        Ok(holidays)
    }

    pub fn date_range(&self) -> Result<Option<DateRange>> {
        DateRange::parse(self.start.as_deref(), self.end.as_deref())
    }

    pub fn filter_config(&self) -> Result<FilterConfig> {
        let mut config = FilterConfig::new(self.holiday_set()?).with_date_column(&self.date_column);
        if let Some(range) = self.date_range()? {
            config = config.with_range(range);
        }
        for spec in &self.validators {
            config = config.with_validator(FieldValidator::new(&spec.column, &spec.pattern)?);
        }
        Ok(config)
    }

    /// Date and user columns first, then every validated column.
    pub fn reader_options(&self) -> ReaderOptions {
        let options = ReaderOptions::new(self.batch_size)
            .require(&self.date_column)
            .require(&self.user_column)
            .only_required(self.only_required_columns);
        self.validators
            .iter()
            .fold(options, |options, spec| options.require(&spec.column))
    }

    pub fn source(&self) -> Result<CsvSource> {
        let source = CsvSource::new(&self.input_path);
        match self.input_delimiter {
            Some(d) => Ok(source.with_delimiter(delimiter_byte("source.delimiter", d)?)),
            None => Ok(source),
        }
    }

    pub fn sink(&self) -> Result<CsvSink> {
        let sink = CsvSink::new(&self.output_path);
        match self.output_delimiter {
            Some(d) => Ok(sink.with_delimiter(delimiter_byte("export.delimiter", d)?)),
            None => Ok(sink),
        }
    }

    pub fn build_engine(&self) -> Result<EtlEngine<CsvSource, CsvSink>> {
        let pipeline = AuditPipeline::new(self.source()?, self.filter_config()?, self.reader_options());
        Ok(EtlEngine::new_with_monitoring(
            pipeline,
            Exporter::new(self.sink()?),
            self.monitor,
        ))
    }
}

impl Validate for AuditSettings {
    fn validate(&self) -> Result<()> {
        validate_path("source.path", &self.input_path)?;
        validate_file_extension("source.path", &self.input_path, &TABLE_EXTENSIONS)?;
        validate_path("export.output_path", &self.output_path)?;
        validate_file_extension("export.output_path", &self.output_path, &TABLE_EXTENSIONS)?;
        validate_non_empty_string("columns.start_date", &self.date_column)?;
        validate_non_empty_string("columns.user", &self.user_column)?;
        validate_positive_number("reader.batch_size", self.batch_size, 1)?;

        if !Path::new(&self.input_path).is_file() {
            return Err(EtlError::SourceNotFound {
                path: self.input_path.clone(),
            });
        }

        if same_file(Path::new(&self.input_path), Path::new(&self.output_path)) {
            return Err(EtlError::InvalidConfigValueError {
                field: "export.output_path".to_string(),
                value: self.output_path.clone(),
                reason: "Output would overwrite the input file".to_string(),
            });
        }

        // 會編譯所有 pattern 並解析日期與假日
        self.filter_config()?;
        self.source()?;
        self.sink()?;
        Ok(())
    }
}
