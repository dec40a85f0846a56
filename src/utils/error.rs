use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Failed to read '{path}': {source}")]
    ReadError {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    WriteError {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("IO error on '{path}': {source}")]
    FileIoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Source file not found: {path}")]
    SourceNotFound { path: String },

    #[error("Required column '{column}' is missing from {source_name}")]
    MissingColumnError { column: String, source_name: String },

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("Invalid pattern for column '{column}': {message}")]
    InvalidPattern { column: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("A run for {key} is already in progress")]
    RunInProgress { key: String },

    #[error("Background task failed: {message}")]
    TaskFailed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Io,
    Runtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn config(message: impl Into<String>) -> Self {
        EtlError::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::SourceNotFound { .. }
            | EtlError::MissingColumnError { .. }
            | EtlError::InvalidDateRange { .. }
            | EtlError::InvalidPattern { .. }
            | EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::ReadError { .. }
            | EtlError::WriteError { .. }
            | EtlError::FileIoError { .. } => ErrorCategory::Io,
            EtlError::RunInProgress { .. } | EtlError::TaskFailed { .. } => ErrorCategory::Runtime,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 另一個執行結束後即可重試
            EtlError::RunInProgress { .. } => ErrorSeverity::Medium,
            EtlError::TaskFailed { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::SourceNotFound { path } => {
                format!("Check that '{}' exists or pass --input with the right path", path)
            }
            EtlError::MissingColumnError { column, .. } => format!(
                "Make sure the header row contains '{}' or rename it with --date-column / --user-column",
                column
            ),
            EtlError::InvalidDateRange { .. } => {
                "Swap --start and --end so the start date comes first".to_string()
            }
            EtlError::InvalidPattern { .. } => {
                "Fix the regular expression passed to --validate".to_string()
            }
            EtlError::ReadError { path, .. } => {
                format!("Verify that '{}' is a readable, well-formed delimited file", path)
            }
            EtlError::WriteError { path, .. } | EtlError::FileIoError { path, .. } => {
                format!("Check permissions and free space for '{}'", path)
            }
            EtlError::RunInProgress { .. } => {
                "Wait for the running audit to finish before starting another one".to_string()
            }
            EtlError::TaskFailed { .. } => "Re-run with --verbose and report the log".to_string(),
            _ => "Review the configuration file and command line flags".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Io => format!("File access problem: {}", self),
            ErrorCategory::Runtime => format!("Run aborted: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
