use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("CliError: {0}")]
    Cli(#[from] CliError),
    #[error("ApiError: {0}")]
    Api(#[from] ApiError),
    #[error("CacheError: {0}")]
    Cache(#[from] CacheFetchError),
    #[error("ConfigError: {0}")]
    Config(#[from] ConfigError),
    #[error("AuthError: {0}")]
    Auth(#[from] AuthError),
    #[error("StorageError: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

/// Errors produced by the HTTP adapter and the typed API modules.
///
/// Cloneable so a single in-flight request can hand the same failure to every
/// reader waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error calling {endpoint}: {message}")]
    Network { endpoint: String, message: String },
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64, endpoint: String },
    #[error("HTTP error: {status} {body}")]
    Http {
        status: u16,
        endpoint: String,
        body: String,
    },
    #[error("Validation failed: {message}")]
    Validation {
        status: u16,
        endpoint: String,
        message: String,
    },
    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl ApiError {
    /// HTTP status attached to the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } | ApiError::Validation { status, .. } if *status > 0 => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            ApiError::Network { endpoint, .. }
            | ApiError::Timeout { endpoint, .. }
            | ApiError::Http { endpoint, .. }
            | ApiError::Validation { endpoint, .. }
            | ApiError::Decode { endpoint, .. } => endpoint,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

/// A fetch failure surfaced through a cache read.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("query {key} failed: {source}")]
pub struct CacheFetchError {
    pub key: String,
    #[source]
    pub source: ApiError,
}

impl CacheFetchError {
    pub fn new(key: impl Into<String>, source: ApiError) -> Self {
        Self {
            key: key.into(),
            source,
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not logged in")]
    NotAuthenticated,
    #[error("Login failed: Invalid credentials")]
    InvalidCredentials,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Keyring error: {0}")]
    KeyringError(String),
    #[error("File I/O error at {path}: {source}")]
    FileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("Session data is corrupted: {message}")]
    SessionCorrupted { message: String },
    #[error("Configuration parse error: {message}")]
    ConfigParseError { message: String },
    #[error("Configuration directory not found")]
    ConfigDirNotFound,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("API URL is not configured")]
    MissingApiUrl,
    #[error("Invalid configuration value for '{field}': {value}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl ErrorSeverity {
    pub fn emoji(&self) -> &'static str {
        match self {
            ErrorSeverity::Critical => "🚨",
            ErrorSeverity::High => "❌",
            ErrorSeverity::Medium => "⚠️",
            ErrorSeverity::Low => "ℹ️",
        }
    }
}

impl AppError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Cli(_) => ErrorSeverity::Medium,
            AppError::Api(api_error) | AppError::Cache(CacheFetchError { source: api_error, .. }) => {
                match api_error {
                    ApiError::Http { status, .. } if *status >= 500 => ErrorSeverity::High,
                    e if e.is_unauthorized() => ErrorSeverity::High,
                    ApiError::Validation { .. } => ErrorSeverity::Low,
                    _ => ErrorSeverity::Medium,
                }
            }
            AppError::Config(_) => ErrorSeverity::High,
            AppError::Auth(_) => ErrorSeverity::High,
            AppError::Storage(_) => ErrorSeverity::Medium,
        }
    }

    pub fn display_friendly(&self) -> String {
        match self {
            AppError::Auth(AuthError::InvalidCredentials) => "Invalid credentials".to_string(),
            AppError::Auth(AuthError::NotAuthenticated) => "You are not logged in".to_string(),
            AppError::Api(ApiError::Validation { message, .. }) => message.clone(),
            AppError::Api(ApiError::Network { .. }) => {
                "Could not reach the GoDrive server".to_string()
            }
            AppError::Config(ConfigError::MissingApiUrl) => {
                "GoDrive API URL is not configured".to_string()
            }
            _ => format!("{}", self),
        }
    }

    pub fn troubleshooting_hint(&self) -> Option<String> {
        match self {
            AppError::Auth(_) => Some("'godrive auth login' to sign in again".to_string()),
            AppError::Api(e) | AppError::Cache(CacheFetchError { source: e, .. })
                if e.is_unauthorized() =>
            {
                Some("Session expired: 'godrive auth login' to sign in again".to_string())
            }
            AppError::Config(ConfigError::MissingApiUrl) => Some(
                "'godrive config set api_url <url>' or set GODRIVE_API_URL".to_string(),
            ),
            AppError::Api(ApiError::Timeout { .. } | ApiError::Network { .. })
            | AppError::Cache(CacheFetchError {
                source: ApiError::Timeout { .. } | ApiError::Network { .. },
                ..
            }) => {
                Some("Check your internet connection and try again".to_string())
            }
            _ => None,
        }
    }
}
