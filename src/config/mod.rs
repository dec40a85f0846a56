pub mod cli;
pub mod settings;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::config::settings::AuditSettings;
#[cfg(feature = "cli")]
use crate::config::toml_config::{TomlConfig, ValidatorSpec};
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "nonworkday-etl")]
#[command(about = "Export connections that started on weekends or holidays")]
pub struct CliConfig {
    /// TOML configuration file; flags below override its values
    #[arg(short, long)]
    pub config: Option<String>,

    /// Connection log to read (CSV or TSV)
    #[arg(short, long)]
    pub input: Option<String>,

    /// File to write the matching connections to
    #[arg(short, long)]
    pub output: Option<String>,

    /// First day of the range, YYYY-MM-DD (requires --end)
    #[arg(long)]
    pub start: Option<String>,

    /// Last day of the range, YYYY-MM-DD (requires --start)
    #[arg(long)]
    pub end: Option<String>,

    /// Ask for the date range on the terminal
    #[arg(long)]
    pub ask_range: bool,

    /// Holiday dates, comma separated
    #[arg(long, value_delimiter = ',')]
    pub holidays: Vec<String>,

    /// File with one holiday date per line
    #[arg(long)]
    pub holiday_file: Option<String>,

    /// Built-in holiday list (2019)
    #[arg(long)]
    pub holiday_preset: Option<String>,

    /// Field check as COLUMN=PATTERN, may be repeated
    #[arg(long = "validate", value_name = "COLUMN=PATTERN")]
    pub validators: Vec<String>,

    /// Rows per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long)]
    pub date_column: Option<String>,

    #[arg(long)]
    pub user_column: Option<String>,

    /// Input delimiter, defaults from the file extension
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Keep only the date, user and validated columns
    #[arg(long)]
    pub only_required_columns: bool,

    /// Rows shown before asking to export
    #[arg(long)]
    pub preview_rows: Option<usize>,

    /// Export without asking
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Check configuration and input header, then exit
    #[arg(long)]
    pub dry_run: bool,

    /// Log CPU and memory usage per phase
    #[arg(long)]
    pub monitor: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the TOML file when given and applies the flags on top.
    pub fn resolve(&self) -> Result<AuditSettings> {
        let mut settings = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                AuditSettings::from_toml(&TomlConfig::from_file(path)?)
            }
            None => AuditSettings::default(),
        };

        if let Some(input) = &self.input {
            settings.input_path = input.clone();
        }
        if let Some(output) = &self.output {
            settings.output_path = output.clone();
        }
        if self.start.is_some() || self.end.is_some() {
            settings.start = self.start.clone();
            settings.end = self.end.clone();
        }
        settings.holidays.extend(self.holidays.iter().cloned());
        if let Some(file) = &self.holiday_file {
            settings.holiday_file = Some(file.clone());
        }
        if let Some(preset) = &self.holiday_preset {
            settings.holiday_preset = Some(preset.clone());
        }
        for flag in &self.validators {
            settings.validators.push(ValidatorSpec::parse(flag)?);
        }
        if let Some(batch_size) = self.batch_size {
            settings.batch_size = batch_size;
        }
        if let Some(column) = &self.date_column {
            settings.date_column = column.clone();
        }
        if let Some(column) = &self.user_column {
            settings.user_column = column.clone();
        }
        if let Some(delimiter) = self.delimiter {
            settings.input_delimiter = Some(delimiter);
        }
        if let Some(rows) = self.preview_rows {
            settings.preview_rows = rows;
        }
        settings.only_required_columns |= self.only_required_columns;
        settings.auto_confirm |= self.yes;
        settings.monitor |= self.monitor;

        Ok(settings)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_flags() {
        let cli = CliConfig::parse_from([
            "nonworkday-etl",
            "--input",
            "log.csv",
            "--start",
            "2019-06-01",
            "--end",
            "2019-06-30",
            "--holidays",
            "2019-06-17,2019-06-20",
            "--validate",
            "user=^[A-Za-z0-9_]+$",
            "--batch-size",
            "100",
            "-y",
        ]);

        let settings = cli.resolve().unwrap();
        assert_eq!(settings.input_path, "log.csv");
        assert_eq!(settings.holidays, vec!["2019-06-17", "2019-06-20"]);
        assert_eq!(settings.validators[0].pattern, "^[A-Za-z0-9_]+$");
        assert_eq!(settings.batch_size, 100);
        assert!(settings.auto_confirm);
    }

    #[test]
    fn test_flags_override_toml_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"
[source]
path = "from_file.csv"

[filter]
start = "2019-01-01"
end = "2019-12-31"
holidays = ["2019-01-01"]

[reader]
batch_size = 10
"#,
        )
        .unwrap();

        let cli = CliConfig {
            config: Some(file.path().display().to_string()),
            input: Some("from_flag.csv".to_string()),
            holidays: vec!["2019-05-01".to_string()],
            ..CliConfig::default()
        };

        let settings = cli.resolve().unwrap();
        assert_eq!(settings.input_path, "from_flag.csv");
        assert_eq!(settings.start.as_deref(), Some("2019-01-01"));
        assert_eq!(settings.holidays, vec!["2019-01-01", "2019-05-01"]);
        assert_eq!(settings.batch_size, 10);
    }

    #[test]
    fn test_bad_validator_flag() {
        let cli = CliConfig {
            validators: vec!["no-equals".to_string()],
            ..CliConfig::default()
        };
        assert!(cli.resolve().is_err());
    }
}
