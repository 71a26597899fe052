use crate::analysis::parse_document;
use crate::config::DEFAULT_STORAGE_URL_BASE;
use crate::csv_export;
use crate::db::Registry;
use crate::error::{ExportError, ExportResult, IndexError};
use crate::models::{Document, Page};
use crate::services::metadata::short_file_name;
use crate::services::search_index::DEFAULT_INDEX_NAME;
use crate::services::{MetadataExtractor, SearchIndex};
use crate::storage::ObjectStore;
use crate::types::{ArtifactKind, ArtifactRecord, ExportOptions, ExportSummary, IndexDocument};
use serde_json::Value;

/// External systems an export run writes to.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub store: &'a dyn ObjectStore,
    pub registry: &'a dyn Registry,
    pub search: &'a dyn SearchIndex,
    pub metadata: &'a dyn MetadataExtractor,
}

/// Writes every derived artifact of one analyzed document and indexes its
/// page text. Artifacts live under `<object_name>-analysis/<document_id>/`.
pub struct OutputExporter<'a> {
    document_id: String,
    response: Value,
    bucket: String,
    object_name: String,
    options: ExportOptions,
    output_path: String,
    document: Document,
    index_name: String,
    storage_url_base: String,
    collaborators: Collaborators<'a>,
}

impl<'a> OutputExporter<'a> {
    /// Parses `response` eagerly; fails if it is non-empty but has no blocks.
    pub fn new(
        document_id: impl Into<String>,
        response: Value,
        bucket: impl Into<String>,
        object_name: impl Into<String>,
        options: ExportOptions,
        collaborators: Collaborators<'a>,
    ) -> ExportResult<Self> {
        let document_id = document_id.into();
        let object_name = object_name.into();
        let document = parse_document(&response)?;
        let output_path = format!("{}-analysis/{}/", object_name, document_id);
        Ok(Self {
            document_id,
            response,
            bucket: bucket.into(),
            object_name,
            options,
            output_path,
            document,
            index_name: DEFAULT_INDEX_NAME.to_string(),
            storage_url_base: DEFAULT_STORAGE_URL_BASE.to_string(),
            collaborators,
        })
    }

    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = index_name.into();
        self
    }

    /// Base for the public object URL; `{bucket}` is substituted.
    pub fn with_storage_url_base(mut self, base: impl Into<String>) -> Self {
        self.storage_url_base = base.into();
        self
    }

    pub fn output_path(&self) -> &str {
        &self.output_path
    }

    pub fn run(&self) -> ExportResult<ExportSummary> {
        let _span = tracing::info_span!("export", document_id = %self.document_id).entered();

        let mut summary = ExportSummary {
            document_id: self.document_id.clone(),
            pages: self.document.pages.len(),
            ..ExportSummary::default()
        };

        if self.document.is_empty() {
            tracing::info!(
                blocks = self.document.block_count,
                "analysis result has no pages, nothing to export"
            );
            return Ok(summary);
        }

        let response = serde_json::to_vec(&self.response)?;
        self.write_artifact(ArtifactKind::Response, &response, &mut summary)?;

        tracing::info!("Total Pages in Document: {}", self.document.pages.len());

        for page in &self.document.pages {
            self.export_page(page, &mut summary)?;
        }

        tracing::info!(
            artifacts = summary.artifacts.len(),
            indexed = summary.indexed,
            "export finished"
        );
        Ok(summary)
    }

    fn export_page(&self, page: &Page, summary: &mut ExportSummary) -> ExportResult<()> {
        let p = page.number;

        let blocks = serde_json::to_vec(&page.blocks)?;
        self.write_artifact(ArtifactKind::PageResponse(p), &blocks, summary)?;

        let text = page.text_in_reading_order();
        let text_path = self.write_artifact(ArtifactKind::PageText(p), text.as_bytes(), summary)?;

        let mut deferred = None;
        match self.index_document(&self.bucket, &text_path, &text) {
            Ok(true) => summary.indexed += 1,
            Ok(false) => {}
            Err(source) => {
                let err = ExportError::Indexing {
                    document_id: self.document_id.clone(),
                    page: p,
                    artifact_path: text_path.clone(),
                    source,
                };
                if !self.options.defer_index_errors {
                    return Err(err);
                }
                tracing::warn!(page = p, error = %err, "indexing failed, finishing page before reporting");
                deferred = Some(err);
            }
        }

        if self.options.forms {
            let kind = ArtifactKind::PageForms(p);
            let csv = csv_export::forms_csv(&page.form_fields).map_err(|source| self.csv_error(kind, source))?;
            self.write_artifact(kind, &csv, summary)?;
        }

        if self.options.tables {
            let kind = ArtifactKind::PageTables(p);
            let csv = csv_export::tables_csv(&page.tables).map_err(|source| self.csv_error(kind, source))?;
            self.write_artifact(kind, &csv, summary)?;
        }

        match deferred {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Index one page of text under the artifact's storage path. Returns
    /// `false` when there was nothing to index.
    pub fn index_document(&self, bucket: &str, artifact_path: &str, text: &str) -> Result<bool, IndexError> {
        if text.is_empty() {
            tracing::debug!(artifact_path, "empty page text, not indexed");
            return Ok(false);
        }
        let document = self.index_body(bucket, text);
        self.collaborators
            .search
            .index(&self.index_name, artifact_path, &document)?;
        tracing::debug!(artifact_path, claim_id = %document.claim_id, "Indexed document");
        Ok(true)
    }

    pub fn index_body(&self, bucket: &str, text: &str) -> IndexDocument {
        let meta = self.collaborators.metadata.extract(&self.object_name);
        IndexDocument {
            name: self.object_name.clone(),
            bucket: bucket.to_string(),
            content: text.to_string(),
            claim_id: meta.claim_id,
            date: meta.date,
            url: self.public_url(bucket),
            filename: short_file_name(&self.object_name).to_string(),
        }
    }

    fn public_url(&self, bucket: &str) -> String {
        let base = self.storage_url_base.replace("{bucket}", bucket);
        format!("{}/{}", base.trim_end_matches('/'), self.object_name)
    }

    fn write_artifact(
        &self,
        kind: ArtifactKind,
        bytes: &[u8],
        summary: &mut ExportSummary,
    ) -> ExportResult<String> {
        let path = format!("{}{}", self.output_path, kind.file_name());
        let output_type = kind.output_type();

        self.collaborators
            .store
            .put(&self.bucket, &path, bytes)
            .map_err(|source| ExportError::StorageWrite {
                document_id: self.document_id.clone(),
                page: kind.page(),
                output_type: output_type.clone(),
                source,
            })?;

        let record = ArtifactRecord::new(self.document_id.clone(), output_type, path.clone());
        self.collaborators
            .registry
            .put(&record)
            .map_err(|source| ExportError::RegistryWrite {
                document_id: self.document_id.clone(),
                page: kind.page(),
                output_type: record.output_type.clone(),
                source,
            })?;

        tracing::debug!(output_type = %record.output_type, path = %path, bytes = bytes.len(), "wrote artifact");
        summary.artifacts.push(record);
        Ok(path)
    }

    fn csv_error(&self, kind: ArtifactKind, source: csv::Error) -> ExportError {
        ExportError::Csv {
            document_id: self.document_id.clone(),
            page: kind.page(),
            output_type: kind.output_type(),
            source,
        }
    }
}
