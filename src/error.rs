//! Error types for the GAN loss library

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Tensor shapes violate the caller contract of an operation
    #[error("Shape mismatch in {context}: expected {expected}, got {got}")]
    ShapeMismatch {
        context: &'static str,
        expected: String,
        got: String,
    },

    /// Hyperparameter outside its valid range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Discriminator result lacks a field the caller needs
    #[error("Discriminator output is missing `{0}`")]
    MissingOutput(&'static str),

    /// Error raised by libtorch (device mismatch, autograd failure, ...)
    #[error("Tensor engine error: {0}")]
    Engine(#[from] tch::TchError),

    /// TOML deserialization error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a shape mismatch error from anything printable
    pub fn shape(
        context: &'static str,
        expected: impl std::fmt::Display,
        got: impl std::fmt::Debug,
    ) -> Self {
        Error::ShapeMismatch {
            context,
            expected: expected.to_string(),
            got: format!("{:?}", got),
        }
    }

    /// Whether the error signals a broken caller contract rather than an engine failure
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::ShapeMismatch { .. } | Error::InvalidConfig(_) | Error::MissingOutput(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_error_message() {
        let err = Error::shape("remove_diag", "square matrix", vec![2i64, 3]);
        assert_eq!(
            err.to_string(),
            "Shape mismatch in remove_diag: expected square matrix, got [2, 3]"
        );
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_config_error_is_contract_violation() {
        let err = Error::InvalidConfig("temperature must be > 0".to_string());
        assert!(err.is_contract_violation());
        assert!(err.to_string().contains("temperature"));
    }
}
