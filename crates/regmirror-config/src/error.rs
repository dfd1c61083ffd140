// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration error types.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use regmirror_core::AddressError;

/// A Result type with [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// ConfigError
// =============================================================================

/// Errors produced while loading or validating configuration.
///
/// All of these are fatal at startup; the daemon refuses to run with a
/// document it cannot fully resolve.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// Reading the file failed.
    #[error("failed to read configuration file '{path}': {source}")]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The document could not be parsed.
    #[error("failed to parse configuration file '{path}': {message}")]
    Parse {
        /// Path to the file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Deserialization failed without file context.
    #[error("configuration error: {message}")]
    Serialization {
        /// Parser message.
        message: String,
    },

    /// A field failed validation.
    #[error("validation failed for '{field}': {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// Why it was rejected.
        message: String,
    },

    /// A register reference could not be resolved.
    #[error("invalid register reference: {0}")]
    Address(#[from] AddressError),

    /// The file extension names no supported format.
    #[error("unsupported configuration format: {extension}")]
    UnsupportedFormat {
        /// The offending extension.
        extension: String,
    },

    /// An environment-variable override carried an unusable value.
    #[error("invalid environment override '{variable}': {message}")]
    InvalidEnvVar {
        /// The variable name.
        variable: String,
        /// Why it was rejected.
        message: String,
    },
}

impl ConfigError {
    /// Creates a file-not-found error.
    pub fn file_not_found(path: impl AsRef<Path>) -> Self {
        Self::FileNotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Creates an I/O error.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a parse error.
    pub fn parse(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an unsupported-format error.
    pub fn unsupported_format(extension: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            extension: extension.into(),
        }
    }

    /// Creates an invalid-environment-variable error.
    pub fn invalid_env_var(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            variable: variable.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_field() {
        let err = ConfigError::validation("PollMs", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "validation failed for 'PollMs': must be at least 1"
        );
    }

    #[test]
    fn address_errors_convert() {
        let err: ConfigError = AddressError::unknown_area("X").into();
        assert!(err.to_string().contains("unknown memory area tag 'X'"));
    }
}
