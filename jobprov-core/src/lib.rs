//! # Jobprov Core
//!
//! Core library for job provenance capture.
//! Provides the RDF graph model, a Turtle codec, PROV-O activity and entity
//! mapping, the provenance service that builds and stores job activities,
//! PROMS report submission, collaborator traits, and configuration.

pub mod config;
pub mod error;
pub mod graph;
pub mod identity;
pub mod job;
pub mod model;
pub mod report;
pub mod service;
pub mod storage;
pub mod turtle;
pub mod uri;
pub mod vocab;

// Re-export commonly used types at the crate root.
pub use config::{ProvenanceConfig, load_config, load_config_file};
pub use error::{
    BuildError, CodecError, ConfigError, IdentityError, ProvenanceError, ReportError, Result,
    StorageError,
};
pub use graph::{Graph, GraphBuilder, Literal, Statement, Term, Timestamp};
pub use identity::{IdentityResolver, StaticIdentityResolver};
pub use job::{CloudFileInformation, Download, FileInformation, Job, Solution, UserIdentity};
pub use model::{Activity, Entity, EntitySet};
pub use report::{HttpReporter, RecordingReporter, Report, ReportKind, ReportSink};
pub use service::{CompletedJob, ProvenanceService};
pub use storage::{CloudStorage, FileStaging, InMemoryCloudStorage, LocalDirStorage, LocalFileStaging};
pub use uri::{build_activity_uri, build_output_uri};
