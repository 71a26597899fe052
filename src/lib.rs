pub mod analysis;
pub mod config;
pub mod csv_export;
pub mod db;
pub mod error;
pub mod exporter;
pub mod models;
pub mod services;
pub mod storage;
pub mod types;

pub use config::Config;
pub use db::{Db, Registry};
pub use error::{ExportError, ExportResult, IndexError, RegistryError, StorageError};
pub use exporter::{Collaborators, OutputExporter};
pub use storage::{FsObjectStore, MemoryObjectStore, ObjectStore};
pub use types::{ArtifactRecord, ExportOptions, ExportSummary, IndexDocument, SourceMetadata};

/// Install the `tracing` subscriber used by the binaries (`RUST_LOG`, default `info`).
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
