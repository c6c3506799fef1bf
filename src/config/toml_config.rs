use crate::core::filter::DEFAULT_CUTOFF_MONTHS;
use crate::core::summary::MalformedDatePolicy;
use crate::utils::error::{CompareError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://www.ratemyprofessors.com/graphql";
pub const DEFAULT_AUTHORIZATION: &str = "Basic dGVzdDp0ZXN0";

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("literal regex"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareConfig {
    pub school: SchoolConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    pub load: LoadConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolConfig {
    pub id: String,
    pub departments: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub endpoint: Option<String>,
    pub authorization: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Ratings requested per page.
    pub page_size: Option<usize>,
    /// Teachers requested per search page.
    pub teacher_page_size: Option<usize>,
    pub concurrent_requests: Option<usize>,
    pub max_pages: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    pub cutoff_months: Option<u32>,
    pub on_malformed_date: Option<MalformedDatePolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<String>,
}

impl CompareConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CompareError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| CompareError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${RMP_AUTH})，找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("school.id", &self.school.id)?;

        if self.school.departments.is_empty() {
            return Err(CompareError::MissingConfigError {
                field: "school.departments".to_string(),
            });
        }
        for department in &self.school.departments {
            validation::validate_non_empty_string("school.departments", department)?;
        }

        validation::validate_url("source.endpoint", self.endpoint())?;
        validation::validate_path("load.output_path", &self.load.output_path)?;

        validation::validate_range("extract.page_size", self.page_size(), 1, 1000)?;
        validation::validate_range("extract.teacher_page_size", self.teacher_page_size(), 1, 1000)?;
        validation::validate_positive_number(
            "extract.concurrent_requests",
            self.concurrent_requests(),
            1,
        )?;
        validation::validate_positive_number("extract.max_pages", self.max_pages(), 1)?;
        validation::validate_positive_number(
            "filter.cutoff_months",
            self.cutoff_months() as usize,
            1,
        )?;

        if self.load.output_formats.is_empty() {
            return Err(CompareError::MissingConfigError {
                field: "load.output_formats".to_string(),
            });
        }
        validation::validate_one_of("load.output_formats", &self.load.output_formats, &["json", "csv"])?;

        if let Some(format) = self.logging.as_ref().and_then(|l| l.format.as_deref()) {
            validation::validate_one_of("logging.format", &[format.to_string()], &["compact", "json"])?;
        }

        Ok(())
    }

    pub fn departments(&self) -> &[String] {
        &self.school.departments
    }

    pub fn endpoint(&self) -> &str {
        self.source.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn authorization(&self) -> &str {
        self.source
            .authorization
            .as_deref()
            .unwrap_or(DEFAULT_AUTHORIZATION)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_seconds.unwrap_or(30))
    }

    pub fn retry_attempts(&self) -> u32 {
        self.source.retry_attempts.unwrap_or(2)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.source.retry_delay_seconds.unwrap_or(1))
    }

    pub fn page_size(&self) -> usize {
        self.extract.page_size.unwrap_or(200)
    }

    pub fn teacher_page_size(&self) -> usize {
        self.extract.teacher_page_size.unwrap_or(500)
    }

    pub fn concurrent_requests(&self) -> usize {
        self.extract.concurrent_requests.unwrap_or(5)
    }

    pub fn max_pages(&self) -> usize {
        self.extract.max_pages.unwrap_or(50)
    }

    pub fn cutoff_months(&self) -> u32 {
        self.filter.cutoff_months.unwrap_or(DEFAULT_CUTOFF_MONTHS)
    }

    pub fn malformed_date_policy(&self) -> MalformedDatePolicy {
        self.filter.on_malformed_date.unwrap_or_default()
    }

    pub fn output_path(&self) -> &str {
        &self.load.output_path
    }

    pub fn wants_format(&self, format: &str) -> bool {
        self.load.output_formats.iter().any(|f| f == format)
    }

    /// Archive name when compression is on.
    pub fn archive_name(&self) -> Option<&str> {
        self.load
            .compression
            .as_ref()
            .filter(|c| c.enabled)
            .map(|c| c.filename.as_deref().unwrap_or("course_report.zip"))
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .map(|f| f == "json")
            .unwrap_or(false)
    }
}

impl Validate for CompareConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
