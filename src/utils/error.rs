use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Malformed markup: {message}")]
    MalformedMarkup { message: String },

    #[error("Template must contain a <g> group with id=\"{id}\" (ids found: {})", format_ids(.available))]
    PlaceholderNotFound { id: String, available: Vec<String> },

    #[error("Malformed QR graphic: {message}")]
    MalformedQrGraphic { message: String },

    #[error("QR generation failed for payload '{payload}': {message}")]
    GeneratorFailure { payload: String, message: String },

    #[error("Row {row}: missing required field '{field}'")]
    MissingFieldError { row: usize, field: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

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
}

fn format_ids(ids: &[String]) -> String {
    if ids.is_empty() {
        "none".to_string()
    } else {
        ids.join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Template,
    Record,
    Io,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BatchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BatchError::PlaceholderNotFound { .. } => ErrorCategory::Template,
            BatchError::MalformedMarkup { .. }
            | BatchError::MalformedQrGraphic { .. }
            | BatchError::GeneratorFailure { .. }
            | BatchError::MissingFieldError { .. } => ErrorCategory::Record,
            BatchError::CsvError(_) | BatchError::IoError(_) => ErrorCategory::Io,
            BatchError::ConfigError { .. }
            | BatchError::ConfigValidationError { .. }
            | BatchError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Record => ErrorSeverity::Medium,
            ErrorCategory::Template | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    /// 單筆記錄失敗時批次繼續執行
    pub fn is_record_level(&self) -> bool {
        self.category() == ErrorCategory::Record
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            BatchError::PlaceholderNotFound { .. } => {
                "Add <g id=\"qrcode\"> (optionally with a <rect>) to the template, or pass --group-id"
            }
            BatchError::MalformedMarkup { .. } => "Check that the SVG file is well-formed XML",
            BatchError::MalformedQrGraphic { .. } => {
                "The QR generator returned an SVG without a viewBox; check the generator options"
            }
            BatchError::GeneratorFailure { .. } => {
                "The payload may be too long for a QR code at the chosen error-correction level"
            }
            BatchError::MissingFieldError { .. } => {
                "Check the CSV header names or pass --payload-field / --id-field"
            }
            BatchError::CsvError(_) => "Make sure the CSV file has a header row and consistent columns",
            BatchError::IoError(_) => "Check that the paths exist and are readable/writable",
            BatchError::ConfigError { .. }
            | BatchError::ConfigValidationError { .. }
            | BatchError::InvalidConfigValueError { .. } => "Review the configuration values",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BatchError::PlaceholderNotFound { id, available } => format!(
                "The template has no QR placeholder group '{}'. Groups with ids: {}",
                id,
                format_ids(available)
            ),
            BatchError::IoError(e) => format!("File operation failed: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BatchError>;
