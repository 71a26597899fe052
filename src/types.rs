use serde::{Deserialize, Serialize};

/// Where one artifact of a document was written. Unique per
/// (document_id, output_type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    pub document_id: String,
    pub output_type: String,
    pub output_path: String,
}

impl ArtifactRecord {
    pub fn new(
        document_id: impl Into<String>,
        output_type: impl Into<String>,
        output_path: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            output_type: output_type.into(),
            output_path: output_path.into(),
        }
    }
}

/// Registry labels and file names of the artifacts produced per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Response,
    PageResponse(usize),
    PageText(usize),
    PageForms(usize),
    PageTables(usize),
}

impl ArtifactKind {
    pub fn output_type(&self) -> String {
        match self {
            Self::Response => "Response".to_string(),
            Self::PageResponse(p) => format!("page-{}-Response", p),
            Self::PageText(p) => format!("page-{}-Text", p),
            Self::PageForms(p) => format!("page-{}-Forms", p),
            Self::PageTables(p) => format!("page-{}-Tables", p),
        }
    }

    pub fn file_name(&self) -> String {
        match self {
            Self::Response => "response.json".to_string(),
            Self::PageResponse(p) => format!("page-{}-response.json", p),
            Self::PageText(p) => format!("page-{}-text.txt", p),
            Self::PageForms(p) => format!("page-{}-forms.csv", p),
            Self::PageTables(p) => format!("page-{}-tables.csv", p),
        }
    }

    pub fn page(&self) -> Option<usize> {
        match self {
            Self::Response => None,
            Self::PageResponse(p) | Self::PageText(p) | Self::PageForms(p) | Self::PageTables(p) => {
                Some(*p)
            }
        }
    }
}

/// Claim id and date derived from a source object name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub claim_id: String,
    pub date: String,
}

/// Body sent to the search service for one page of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub name: String,
    pub bucket: String,
    pub content: String,
    #[serde(rename = "claimid")]
    pub claim_id: String,
    pub date: String,
    pub url: String,
    pub filename: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub forms: bool,
    pub tables: bool,
    /// Finish the page's remaining writes before surfacing an indexing failure.
    pub defer_index_errors: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub document_id: String,
    pub pages: usize,
    pub artifacts: Vec<ArtifactRecord>,
    pub indexed: usize,
}
