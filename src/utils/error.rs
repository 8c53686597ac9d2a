use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Invalid input for '{field}' ({value}): {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration: {field}")]
    MissingConfig { field: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    #[error("Narrative analysis failed: {message}")]
    Analysis { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Provider,
    Analysis,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ChartError {
    pub fn invalid(field: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        ChartError::InvalidInput {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        ChartError::Provider {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ChartError::InvalidInput { .. } => ErrorCategory::Input,
            ChartError::MissingConfig { .. } | ChartError::Config { .. } => {
                ErrorCategory::Configuration
            }
            ChartError::Provider { .. } => ErrorCategory::Provider,
            ChartError::Analysis { .. } | ChartError::Http(_) => ErrorCategory::Analysis,
            ChartError::Io(_) | ChartError::Serialization(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 分析失敗不影響命盤本身
            ErrorCategory::Analysis => ErrorSeverity::Low,
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Provider => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Check the birth date format (YYYY-MM-DD), hour 0-23, minute 0-59 and longitude",
            ErrorCategory::Configuration => "Check the TOML configuration file and referenced environment variables",
            ErrorCategory::Provider => "Make sure the snapshot covers this birth date, time slot and focus date",
            ErrorCategory::Analysis => "Try the analysis again later; the chart itself is unaffected",
            ErrorCategory::System => "Check file paths and permissions",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("排盘失败，请检查输入格式 (calculation failed, check input format): {}", self),
            ErrorCategory::Analysis => "AI 分析失败，请稍后再试 (AI analysis failed, try again later)".to_string(),
            _ => format!("排盘失败 (calculation failed): {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChartError>;
