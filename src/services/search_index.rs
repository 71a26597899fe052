use crate::error::IndexError;
use crate::types::IndexDocument;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use std::time::Duration;

pub const DEFAULT_INDEX_NAME: &str = "textract";

pub trait SearchIndex {
    /// Create or replace `doc_id` in `index_name`.
    fn index(&self, index_name: &str, doc_id: &str, document: &IndexDocument) -> Result<(), IndexError>;
}

/// Authorizes outgoing search requests. Credentials are supplied by the
/// caller; signing schemes beyond these live outside the crate.
pub trait RequestAuth: Send + Sync {
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, IndexError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl RequestAuth for NoAuth {
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, IndexError> {
        Ok(request)
    }
}

#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    header: String,
    scheme: Option<String>,
    key: String,
}

impl ApiKeyAuth {
    /// `Authorization: ApiKey <key>`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            header: "Authorization".to_string(),
            scheme: Some("ApiKey".to_string()),
            key: key.into(),
        }
    }

    /// Raw key in a custom header, e.g. `x-api-key`.
    pub fn with_header(header: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            scheme: None,
            key: key.into(),
        }
    }
}

impl RequestAuth for ApiKeyAuth {
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, IndexError> {
        if self.key.trim().is_empty() {
            return Err(IndexError::Auth("empty API key".to_string()));
        }
        let value = match &self.scheme {
            Some(scheme) => format!("{} {}", scheme, self.key),
            None => self.key.clone(),
        };
        Ok(request.header(self.header.as_str(), value))
    }
}

#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: Option<String>,
}

impl RequestAuth for BasicAuth {
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, IndexError> {
        Ok(request.basic_auth(&self.username, self.password.as_ref()))
    }
}

/// Document-store search service reached over HTTP
/// (`PUT {endpoint}/{index}/_doc/{id}`).
pub struct HttpSearchIndex {
    client: Client,
    endpoint: Url,
    auth: Box<dyn RequestAuth>,
}

impl HttpSearchIndex {
    pub fn new(
        endpoint: &str,
        auth: Box<dyn RequestAuth>,
        timeout: Duration,
    ) -> Result<Self, IndexError> {
        let endpoint = Url::parse(endpoint.trim_end_matches('/'))
            .map_err(|e| IndexError::Endpoint(format!("{}: {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(IndexError::Endpoint(endpoint.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            auth,
        })
    }

    /// Document URL; the id is percent-encoded as a single path segment.
    pub fn document_url(&self, index_name: &str, doc_id: &str) -> Result<Url, IndexError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| IndexError::Endpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend([index_name, "_doc", doc_id]);
        Ok(url)
    }
}

impl SearchIndex for HttpSearchIndex {
    fn index(&self, index_name: &str, doc_id: &str, document: &IndexDocument) -> Result<(), IndexError> {
        let url = self.document_url(index_name, doc_id)?;
        let request = self.auth.authorize(self.client.put(url).json(document))?;
        let response = request.send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(IndexError::Status {
                status: status.as_u16(),
                body,
            });
        }
        tracing::debug!(target: "search_index", index_name, doc_id, %status, "indexed document");
        Ok(())
    }
}

/// Accepts every document and sends nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSearchIndex;

impl SearchIndex for NoopSearchIndex {
    fn index(&self, index_name: &str, doc_id: &str, _document: &IndexDocument) -> Result<(), IndexError> {
        tracing::debug!(target: "search_index", index_name, doc_id, "indexing disabled, skipped");
        Ok(())
    }
}
