use std::fmt;
use std::path::PathBuf;

/// Stable error codes, one per way loading can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InputNotFound,
    InputReadFailed,
    InvalidInput,
    ConfigReadFailed,
    ConfigParseError,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InputNotFound => "E1001",
            Self::InputReadFailed => "E1002",
            Self::InvalidInput => "E1003",
            Self::ConfigReadFailed => "E2001",
            Self::ConfigParseError => "E2002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InputNotFound => "Input file not found",
            Self::InputReadFailed => "Input file could not be read",
            Self::InvalidInput => "Input is not a valid unit/edge document",
            Self::ConfigReadFailed => "Config file could not be read",
            Self::ConfigParseError => "Config file parse error",
        }
    }

    /// What the user can do about it, when there is something to do.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InputNotFound => Some("Check the input path, or pass `-` to read from stdin."),
            Self::InputReadFailed => Some("Check file permissions and retry."),
            Self::InvalidInput => Some(
                "Expected {\"units\": [...], \"edges\": [[dependent, dependency], ...]}.",
            ),
            Self::ConfigReadFailed => Some("Check permissions on .strata/config.toml."),
            Self::ConfigParseError => Some("Fix syntax in .strata/config.toml and retry."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised while loading analysis input or configuration.
///
/// Analysis findings (unresolved references, self-loops, cycles) are never
/// errors; they are part of the report.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading an input document failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path that was being read (`-` for stdin).
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input document is not valid JSON or does not match the schema.
    #[error("invalid analysis input: {source}")]
    InvalidInput {
        #[from]
        source: serde_json::Error,
    },

    /// Reading a config file failed.
    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config file is not valid TOML or has the wrong shape.
    #[error("failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Error {
    /// Return the machine-readable error code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorCode::InputNotFound
            }
            Self::Io { .. } => ErrorCode::InputReadFailed,
            Self::InvalidInput { .. } => ErrorCode::InvalidInput,
            Self::ConfigRead { .. } => ErrorCode::ConfigReadFailed,
            Self::ConfigParse { .. } => ErrorCode::ConfigParseError,
        }
    }
}

/// Convenience alias for results produced by this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::{Error, ErrorCode};
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::InputNotFound,
            ErrorCode::InputReadFailed,
            ErrorCode::InvalidInput,
            ErrorCode::ConfigReadFailed,
            ErrorCode::ConfigParseError,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::InvalidInput.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn missing_file_maps_to_not_found_code() {
        let err = Error::Io {
            path: PathBuf::from("nope.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.code(), ErrorCode::InputNotFound);
        assert!(err.to_string().contains("nope.json"));
    }

    #[test]
    fn json_errors_convert_into_invalid_input() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = source.into();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }
}
