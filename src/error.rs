use thiserror::Error;

/// Failure writing an artifact to object storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid object path: {0}")]
    InvalidPath(String),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("registry lock poisoned")]
    LockPoisoned,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("search service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid endpoint: {0}")]
    Endpoint(String),
    #[error("authorization failed: {0}")]
    Auth(String),
}

/// Terminal error of one export run. Carries enough context to tell which
/// step failed; `page` is `None` for document-level artifacts.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("malformed analysis result: {reason}")]
    MalformedResult { reason: String },

    #[error("storage write failed for document {document_id} ({output_type}, page {page:?}): {source}")]
    StorageWrite {
        document_id: String,
        page: Option<usize>,
        output_type: String,
        #[source]
        source: StorageError,
    },

    #[error("registry write failed for document {document_id} ({output_type}, page {page:?}): {source}")]
    RegistryWrite {
        document_id: String,
        page: Option<usize>,
        output_type: String,
        #[source]
        source: RegistryError,
    },

    #[error("indexing failed for document {document_id} ({artifact_path}, page {page}): {source}")]
    Indexing {
        document_id: String,
        page: usize,
        artifact_path: String,
        #[source]
        source: IndexError,
    },

    #[error("csv serialization failed for document {document_id} ({output_type}): {source}")]
    Csv {
        document_id: String,
        page: Option<usize>,
        output_type: String,
        #[source]
        source: csv::Error,
    },

    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResult {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedResult { .. } => "MALFORMED_RESULT",
            Self::StorageWrite { .. } => "STORAGE_WRITE",
            Self::RegistryWrite { .. } => "REGISTRY_WRITE",
            Self::Indexing { .. } => "INDEXING",
            Self::Csv { .. } => "CSV_SERIALIZATION",
            Self::Json(_) => "JSON_SERIALIZATION",
        }
    }

    /// Page the failing step belonged to, if any.
    pub fn page(&self) -> Option<usize> {
        match self {
            Self::StorageWrite { page, .. }
            | Self::RegistryWrite { page, .. }
            | Self::Csv { page, .. } => *page,
            Self::Indexing { page, .. } => Some(*page),
            _ => None,
        }
    }
}

pub type ExportResult<T> = Result<T, ExportError>;
