use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("GraphQL error: {message}")]
    GraphQlError { message: String },

    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Malformed review date '{value}': {reason}")]
    MalformedDate { value: String, reason: String },

    #[error("Fetch task failed: {message}")]
    TaskError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl CompareError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CompareError::ApiError(_)
            | CompareError::GraphQlError { .. }
            | CompareError::UnexpectedStatus { .. } => ErrorCategory::Network,
            CompareError::CsvError(_)
            | CompareError::SerializationError(_)
            | CompareError::MalformedDate { .. } => ErrorCategory::Data,
            CompareError::ConfigValidationError { .. }
            | CompareError::InvalidConfigValueError { .. }
            | CompareError::MissingConfigError { .. } => ErrorCategory::Configuration,
            CompareError::ZipError(_)
            | CompareError::IoError(_)
            | CompareError::TaskError { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CompareError::ApiError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            CompareError::UnexpectedStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CompareError::ApiError(_) | CompareError::UnexpectedStatus { .. } => {
                format!("Could not reach the review API: {}", self)
            }
            CompareError::GraphQlError { message } => {
                format!("The review API rejected the query: {}", message)
            }
            CompareError::MalformedDate { value, .. } => {
                format!("A review carried an unreadable date ({})", value)
            }
            CompareError::ConfigValidationError { .. }
            | CompareError::InvalidConfigValueError { .. }
            | CompareError::MissingConfigError { .. } => {
                format!("Configuration problem: {}", self)
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check network access and the source endpoint, or raise source.retry_attempts"
            }
            ErrorCategory::Data => match self {
                CompareError::MalformedDate { .. } => {
                    "Set filter.on_malformed_date = \"skip\" to ignore unreadable reviews"
                }
                _ => "The API response shape may have changed; rerun with --verbose",
            },
            ErrorCategory::Configuration => "Fix the configuration file and run again",
            ErrorCategory::System => "Check that the output path exists and is writable",
        }
    }
}

pub type Result<T> = std::result::Result<T, CompareError>;
