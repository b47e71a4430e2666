//! Error types for the jobprov core.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering graph building, the Turtle codec, storage, identity lookup,
//! report submission, and configuration.

use std::path::PathBuf;

/// Top-level error type for the jobprov core library.
#[derive(Debug, thiserror::Error)]
pub enum ProvenanceError {
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProvenanceError {
    /// True when the graph was captured but the registry did not acknowledge it.
    ///
    /// Such failures are safe to retry by resubmitting the persisted activity.
    /// Everything else means provenance was never captured.
    pub fn is_submission_failure(&self) -> bool {
        matches!(self, ProvenanceError::Report(_))
    }
}

/// Errors raised while assembling a provenance graph.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Job {job_id} has no activity record '{file}' in storage")]
    MissingActivityRecord { job_id: u64, file: String },
}

/// Errors from parsing or interpreting Turtle text.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Syntax error at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Unsupported construct at {line}:{column}: {construct}")]
    Unsupported {
        line: usize,
        column: usize,
        construct: String,
    },

    #[error("Undeclared prefix '{prefix}' at {line}:{column}")]
    UndeclaredPrefix {
        prefix: String,
        line: usize,
        column: usize,
    },

    #[error("Cannot resolve IRI '{iri}': {reason}")]
    BadIri { iri: String, reason: String },

    #[error("Activity <{uri}> not found in graph")]
    ActivityNotFound { uri: String },

    #[error("Activity file is not valid UTF-8")]
    InvalidUtf8,
}

/// Errors from the cloud storage and file staging collaborators.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("No storage service registered with id '{id}'")]
    ServiceNotFound { id: String },

    #[error("File '{key}' not found for job {job_id}")]
    FileNotFound { job_id: u64, key: String },

    #[error("Upload of {path} failed: {message}")]
    UploadFailed { path: PathBuf, message: String },

    #[error("Storage backend error: {message}")]
    Backend { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the identity collaborator.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Identity lookup failed for '{user}': {message}")]
    LookupFailed { user: String, message: String },
}

/// Errors from report submission to a provenance registry.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Registry rejected report with HTTP {status}")]
    Rejected { status: u16 },

    #[error("Registry request failed: {message}")]
    Transport { message: String },

    #[error("Failed to create HTTP client: {message}")]
    Client { message: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

/// A type alias for results using the top-level `ProvenanceError`.
pub type Result<T> = std::result::Result<T, ProvenanceError>;
