use crate::utils::error::{EtlError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub source: SourceConfig,
    pub columns: ColumnsConfig,
    pub reader: ReaderConfig,
    pub filter: FilterSection,
    pub export: ExportConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub path: Option<String>,
    pub delimiter: Option<char>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    pub start_date: Option<String>,
    pub user: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub batch_size: Option<usize>,
    pub only_required_columns: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSection {
    pub start: Option<String>,
    pub end: Option<String>,
    pub holidays: Vec<String>,
    pub holiday_file: Option<String>,
    pub holiday_preset: Option<String>,
    pub validators: Vec<ValidatorSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSpec {
    pub column: String,
    pub pattern: String,
}

impl ValidatorSpec {
    /// Parses the `column=pattern` form used on the command line. Only the
    /// first `=` separates, so patterns may contain `=`.
    pub fn parse(flag: &str) -> Result<Self> {
        match flag.split_once('=') {
            Some((column, pattern)) if !column.trim().is_empty() => Ok(Self {
                column: column.trim().to_string(),
                pattern: pattern.to_string(),
            }),
            _ => Err(EtlError::InvalidConfigValueError {
                field: "validate".to_string(),
                value: flag.to_string(),
                reason: "Expected COLUMN=PATTERN".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_path: Option<String>,
    pub delimiter: Option<char>,
    pub auto_confirm: Option<bool>,
    pub preview_rows: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| EtlError::FileIoError {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${AUDIT_INPUT})；未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::config(e.to_string()))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}
