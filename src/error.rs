//! Common error type and alias.
use std::path::PathBuf;

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Image backend error: {0}")]
    ImageBackend(String),

    #[error("Caption backend error: {0}")]
    CaptionBackend(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Publishing error: {0}")]
    Publishing(String),

    #[error("Image hosting error: {0}")]
    Hosting(String),

    #[error("Image file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 2,
            AppError::InvalidInput(_) | AppError::FileNotFound(_) => 3,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::Config("missing".into()).exit_code(), 2);
        assert_eq!(AppError::InvalidInput("empty prompt".into()).exit_code(), 3);
        assert_eq!(AppError::FileNotFound(PathBuf::from("a.png")).exit_code(), 3);
        assert_eq!(AppError::Publishing("status 500".into()).exit_code(), 1);
    }

    #[test]
    fn test_file_not_found_message() {
        let error = AppError::FileNotFound(PathBuf::from("output/missing.png"));
        assert_eq!(error.to_string(), "Image file not found: output/missing.png");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: AppError = io.into();
        assert!(matches!(error, AppError::Io(_)));
        assert_eq!(error.exit_code(), 1);
    }
}
