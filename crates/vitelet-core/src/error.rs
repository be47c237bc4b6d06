use std::path::PathBuf;
use thiserror::Error;

/// Core error type for vitelet operations outside request handling.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Dev server error codes.
pub mod codes {
    pub const DEV_FILE_NOT_FOUND: &str = "DEV_FILE_NOT_FOUND";
    pub const DEV_OUTSIDE_ROOT: &str = "DEV_OUTSIDE_ROOT";
    pub const DEV_MANIFEST_NOT_FOUND: &str = "DEV_MANIFEST_NOT_FOUND";
    pub const DEV_ENTRY_FIELD_MISSING: &str = "DEV_ENTRY_FIELD_MISSING";
    pub const DEV_PARSE_FAILURE: &str = "DEV_PARSE_FAILURE";
    pub const DEV_COMPILE_FAILURE: &str = "DEV_COMPILE_FAILURE";
    pub const DEV_UNSUPPORTED_EXTENSION: &str = "DEV_UNSUPPORTED_EXTENSION";
    pub const DEV_UNSUPPORTED_VARIANT: &str = "DEV_UNSUPPORTED_VARIANT";
}

/// Failure while serving a single module request.
///
/// Every variant becomes a 404 with an empty body at the HTTP layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DevError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Path escapes the project root: {path}")]
    OutsideRoot { path: String },

    #[error("Manifest for package '{package}' not found at {path}")]
    ManifestNotFound { package: String, path: PathBuf },

    #[error("Package '{package}' has no string \"{field}\" field in its manifest")]
    EntryFieldMissing { package: String, field: String },

    #[error("Failed to parse {path}: {message}")]
    ParseFailure { path: String, message: String },

    #[error("Failed to compile {path}: {message}")]
    CompileFailure { path: String, message: String },

    #[error("Unsupported file type: {path}")]
    UnsupportedExtension { path: String },

    #[error("Unsupported module variant '{variant}' for {path}")]
    UnsupportedVariant { path: String, variant: String },
}

impl DevError {
    /// Stable error code, used in logs.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => codes::DEV_FILE_NOT_FOUND,
            Self::OutsideRoot { .. } => codes::DEV_OUTSIDE_ROOT,
            Self::ManifestNotFound { .. } => codes::DEV_MANIFEST_NOT_FOUND,
            Self::EntryFieldMissing { .. } => codes::DEV_ENTRY_FIELD_MISSING,
            Self::ParseFailure { .. } => codes::DEV_PARSE_FAILURE,
            Self::CompileFailure { .. } => codes::DEV_COMPILE_FAILURE,
            Self::UnsupportedExtension { .. } => codes::DEV_UNSUPPORTED_EXTENSION,
            Self::UnsupportedVariant { .. } => codes::DEV_UNSUPPORTED_VARIANT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_error_codes() {
        let err = DevError::FileNotFound {
            path: "/missing.js".into(),
        };
        assert_eq!(err.code(), codes::DEV_FILE_NOT_FOUND);
        assert_eq!(err.to_string(), "File not found: /missing.js");

        let err = DevError::EntryFieldMissing {
            package: "vue".into(),
            field: "module".into(),
        };
        assert_eq!(err.code(), "DEV_ENTRY_FIELD_MISSING");
        assert!(err.to_string().contains("\"module\""));
    }

    #[test]
    fn test_config_parse_error_display() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::ConfigParse {
            path: PathBuf::from("vitelet.json"),
            source,
        };
        assert!(err.to_string().starts_with("Failed to parse config at vitelet.json"));
    }
}
