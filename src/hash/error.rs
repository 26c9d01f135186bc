// Centralized error handling module
// Error types carry the path and operation that failed

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the hash utility
/// Every message ends with a suggestion line for the user
#[derive(Debug, Error)]
pub enum HashUtilityError {
    /// File system errors with context
    #[error("File not found: {}\nSuggestion: Check that the file path is correct and the file exists", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Directory not found: {}\nSuggestion: Check that the directory path is correct and the directory exists", .path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied while {operation} {}\nSuggestion: Check file permissions or run with appropriate privileges", .path.display())]
    PermissionDenied { path: PathBuf, operation: String },

    #[error("I/O error while {operation}{}: {source}\nSuggestion: Check file permissions and that the path is a regular file", display_opt(.path))]
    IoError {
        path: Option<PathBuf>,
        operation: String,
        #[source]
        source: io::Error,
    },

    /// Hash computation errors
    #[error("Unsupported hash algorithm: {algorithm}\nSuggestion: Use one of md5, sha1, sha256, sha512")]
    UnsupportedAlgorithm { algorithm: String },

    /// Root path validation errors
    #[error("Invalid path {}: {reason}\nSuggestion: Pass an existing file or directory", .path.display())]
    InvalidPath { path: PathBuf, reason: String },

    /// CLI errors
    #[error("Invalid arguments: {message}\nSuggestion: Run with --help to see usage information")]
    InvalidArguments { message: String },
}

fn display_opt(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" {}", p.display()),
        None => String::new(),
    }
}

impl HashUtilityError {
    /// Create an error from an io::Error with context about the operation and optional path
    pub fn from_io_error(err: io::Error, operation: &str, path: Option<PathBuf>) -> Self {
        match (err.kind(), path) {
            (io::ErrorKind::NotFound, Some(p)) => {
                if operation.contains("directory") {
                    HashUtilityError::DirectoryNotFound { path: p }
                } else {
                    HashUtilityError::FileNotFound { path: p }
                }
            }
            (io::ErrorKind::PermissionDenied, Some(p)) => HashUtilityError::PermissionDenied {
                path: p,
                operation: operation.to_string(),
            },
            (_, path) => HashUtilityError::IoError {
                path,
                operation: operation.to_string(),
                source: err,
            },
        }
    }

    /// The path this error refers to, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            HashUtilityError::FileNotFound { path }
            | HashUtilityError::DirectoryNotFound { path }
            | HashUtilityError::PermissionDenied { path, .. }
            | HashUtilityError::InvalidPath { path, .. } => Some(path),
            HashUtilityError::IoError { path, .. } => path.as_ref(),
            _ => None,
        }
    }

    /// The reader of our output went away (e.g. piped into `head`)
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, HashUtilityError::IoError { source, .. } if source.kind() == io::ErrorKind::BrokenPipe)
    }

    /// First line of the message, without the suggestion
    pub fn summary(&self) -> String {
        let message = self.to_string();
        match message.split_once('\n') {
            Some((first, _)) => first.to_string(),
            None => message,
        }
    }
}

impl From<io::Error> for HashUtilityError {
    fn from(err: io::Error) -> Self {
        HashUtilityError::from_io_error(err, "unknown operation", None)
    }
}
