//! Error handling for keyspace

use thiserror::Error;

/// Main error type for keyspace
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyspaceError {
    #[error("Charset is empty")]
    EmptyCharset,

    #[error("Length must be at least 1")]
    ZeroLength,

    #[error("Charset contains duplicate symbol '{symbol}'")]
    DuplicateSymbol { symbol: char },

    #[error("Invalid location {location}: valid range is [1, {max}]")]
    InvalidLocation { location: String, max: String },

    #[error("Invalid value '{value}': {message}")]
    InvalidValue { value: String, message: String },

    #[error("Invalid range: cannot sample from [0, {n})")]
    InvalidRange { n: usize },

    #[error("Entropy source failure: {message}")]
    EntropySourceFailure { message: String },

    #[error("Number of words cannot be less than {min}")]
    NumWordsInvalid { min: usize },

    #[error("Dictionary has {found} usable words, at least {min} are required")]
    DictionaryTooSmall { found: usize, min: usize },

    #[error("Word length range {min}..={max} is invalid")]
    WordLengthInvalid { min: usize, max: usize },

    #[error("Requirements error: {message}")]
    Requirements { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    #[error("Parse error: {message}")]
    Parse {
        message: String,
        content: Option<String>,
    },

    #[error("CLI error: {message}")]
    Cli { message: String },
}

impl KeyspaceError {
    /// Create an invalid location error
    pub fn invalid_location(location: impl ToString, max: impl ToString) -> Self {
        Self::InvalidLocation {
            location: location.to_string(),
            max: max.to_string(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create an invalid range error
    pub fn invalid_range(n: usize) -> Self {
        Self::InvalidRange { n }
    }

    /// Create an entropy source error
    pub fn entropy(message: impl Into<String>) -> Self {
        Self::EntropySourceFailure {
            message: message.into(),
        }
    }

    /// Create a requirements error
    pub fn requirements(message: impl Into<String>) -> Self {
        Self::Requirements {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an IO error
    pub fn io(message: impl Into<String>, path: Option<String>) -> Self {
        Self::Io {
            message: message.into(),
            path,
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>, content: Option<String>) -> Self {
        Self::Parse {
            message: message.into(),
            content,
        }
    }

    /// Create a CLI error
    pub fn cli(message: impl Into<String>) -> Self {
        Self::Cli {
            message: message.into(),
        }
    }

    /// Whether the error comes from the environment rather than from the caller
    pub fn is_environmental(&self) -> bool {
        matches!(self, Self::EntropySourceFailure { .. } | Self::Io { .. })
    }

    /// Get user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyCharset => {
                "❌ The charset is empty\n💡 Pass at least one symbol with --charset".to_string()
            }
            Self::ZeroLength => {
                "❌ The length is zero\n💡 Pass a positive value with --length".to_string()
            }
            Self::DuplicateSymbol { symbol } => {
                format!("❌ The charset repeats '{}'\n💡 Every symbol may appear only once", symbol)
            }
            Self::InvalidLocation { location, max } => {
                format!("❌ Location {} is outside the space\n💡 Valid locations are 1 through {}", location, max)
            }
            Self::InvalidValue { value, message } => {
                format!("❌ '{}' is not part of the space: {}\n💡 Use only charset symbols and the exact length", value, message)
            }
            Self::InvalidRange { n } => {
                format!("❌ Cannot draw a random value below {}\n💡 The range must hold at least two values", n)
            }
            Self::EntropySourceFailure { message } => {
                format!("❌ The secure random source failed: {}\n💡 No password was produced; check the operating system entropy source", message)
            }
            Self::NumWordsInvalid { min } => {
                format!("❌ Too few words requested\n💡 A passphrase needs at least {} words", min)
            }
            Self::DictionaryTooSmall { found, min } => {
                format!("❌ Only {} dictionary words fit the word-length range\n💡 Use a dictionary with at least {} words or widen the range", found, min)
            }
            Self::WordLengthInvalid { min, max } => {
                format!("❌ Word length range {}..={} is empty\n💡 The minimum must be at least 1 and not above the maximum", min, max)
            }
            Self::Requirements { message } => {
                format!("❌ Unsatisfiable rules: {}\n💡 Relax the minimums or widen the charset", message)
            }
            Self::Config { message } => {
                format!("❌ Configuration problem: {}\n💡 Check your .env file or configuration", message)
            }
            Self::Io { message, path } => {
                let path_info = path.as_ref().map_or(String::new(), |p| format!(" ({})", p));
                format!("❌ File error{}: {}\n💡 Check file permissions and paths", path_info, message)
            }
            Self::Parse { message, .. } => {
                format!("❌ Parse error: {}\n💡 Check the file is valid JSON", message)
            }
            Self::Cli { message } => {
                format!("❌ Command error: {}\n💡 Use --help for usage information", message)
            }
        }
    }
}

impl From<rand::Error> for KeyspaceError {
    fn from(err: rand::Error) -> Self {
        Self::entropy(err.to_string())
    }
}

impl From<serde_json::Error> for KeyspaceError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string(), None)
    }
}

impl From<std::io::Error> for KeyspaceError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string(), None)
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, KeyspaceError>;

/// Helper macros for common error patterns
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::KeyspaceError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::KeyspaceError::config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! requirements_error {
    ($msg:expr) => {
        $crate::error::KeyspaceError::requirements($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::KeyspaceError::requirements(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_location_message() {
        let err = KeyspaceError::invalid_location(101, 100);
        assert_eq!(err.to_string(), "Invalid location 101: valid range is [1, 100]");
        assert!(err.user_message().contains("1 through 100"));
    }

    #[test]
    fn test_environmental() {
        assert!(KeyspaceError::entropy("gone").is_environmental());
        assert!(!KeyspaceError::invalid_range(1).is_environmental());
        assert!(!KeyspaceError::ZeroLength.is_environmental());
    }

    #[test]
    fn test_macros() {
        let err = config_error!("bad {}", "value");
        assert_eq!(err, KeyspaceError::config("bad value"));
        let err = requirements_error!("too many");
        assert!(err.to_string().contains("too many"));
    }
}
