//! REST API client for the video generation endpoints.
//!
//! Wraps the `/videos` HTTP API (create, retrieve, list, delete, and
//! content download) using [`reqwest`]. Every job payload that comes
//! back is run through the normalizer before it reaches the caller.

use std::io::Write;
use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vidgen_core::error::CoreError;
use vidgen_core::job_status::StatusFilter;
use vidgen_core::types::JobId;
use vidgen_core::video_request::CreateVideoRequest;

use crate::config::ClientConfig;
use crate::download::{drain_stream, partial_path, DownloadVariant};
use crate::normalize::{normalize, JobRecord};
use crate::payload::RawJobPayload;

/// Default number of jobs requested per listing page.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// The job operations the rest of the crate depends on.
///
/// [`VideoApi`] is the HTTP implementation; tests substitute scripted
/// in-memory implementations.
#[async_trait]
pub trait VideoJobs: Send + Sync {
    /// Submit a new render job.
    async fn create(&self, request: &CreateVideoRequest) -> Result<JobRecord, VideoApiError>;

    /// Fetch the current state of a job.
    async fn retrieve(&self, id: &str) -> Result<JobRecord, VideoApiError>;

    /// Fetch one page of jobs.
    async fn list(&self, query: &ListQuery) -> Result<Page, VideoApiError>;

    /// Permanently delete a job and its media.
    async fn delete(&self, id: &str) -> Result<DeleteAck, VideoApiError>;

    /// Download a rendition of a finished job into memory.
    async fn download_content(
        &self,
        id: &str,
        variant: Option<DownloadVariant>,
    ) -> Result<Vec<u8>, VideoApiError>;
}

/// HTTP client for the video generation API.
pub struct VideoApi {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl std::fmt::Debug for VideoApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoApi")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Sort order for job listings, by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(CoreError::Validation(format!(
                "Sort order must be 'asc' or 'desc', got: '{other}'"
            ))),
        }
    }
}

/// Parameters for `GET /videos`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub limit: u32,
    pub order: SortOrder,
    /// Return jobs after this id (the previous page's cursor).
    pub after: Option<JobId>,
    pub status: StatusFilter,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            order: SortOrder::Desc,
            after: None,
            status: StatusFilter::All,
        }
    }
}

/// Query string form of [`ListQuery`].
#[derive(Serialize)]
struct ListParams<'a> {
    limit: u32,
    order: SortOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    after: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'static str>,
}

impl<'a> From<&'a ListQuery> for ListParams<'a> {
    fn from(query: &'a ListQuery) -> Self {
        Self {
            limit: query.limit,
            order: query.order,
            after: query.after.as_deref().filter(|a| !a.is_empty()),
            status: query.status.api_value(),
        }
    }
}

/// One page of normalized jobs.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<JobRecord>,
    /// Server's signal that more pages exist; `false` when absent.
    pub has_more: bool,
    /// Id of the last item on the page, used as the `after` cursor.
    ///
    /// Best effort: this assumes the service orders ids stably under
    /// `after` pagination.
    pub next_cursor: Option<JobId>,
}

impl Page {
    /// Build a page from a list response body (`{"data": [...], "has_more": bool}`).
    pub fn from_value(value: Value) -> Self {
        let mut fields = RawJobPayload::from(value).into_fields();
        let has_more = fields
            .get("has_more")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let items: Vec<JobRecord> = match fields.remove("data") {
            Some(Value::Array(data)) => data.into_iter().map(normalize).collect(),
            _ => Vec::new(),
        };
        let next_cursor = items.last().and_then(|item| item.id.clone());

        Self {
            items,
            has_more,
            next_cursor,
        }
    }
}

/// Response body of `DELETE /videos/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteAck {
    pub id: String,
    pub object: String,
    pub deleted: bool,
}

/// Errors from the video REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum VideoApiError {
    /// The client configuration is unusable (e.g. no API key).
    #[error(transparent)]
    Config(#[from] CoreError),

    /// The HTTP request itself failed (network, DNS, TLS, timeout, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Video API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A create call succeeded but no job id could be derived.
    #[error("No video id returned from create. Raw: {payload}")]
    MissingId { payload: Value },

    /// The caller's download sink rejected a chunk.
    #[error("Download sink failed: {0}")]
    Sink(#[from] std::io::Error),
}

impl VideoApi {
    /// Create an API client from configuration.
    ///
    /// Fails without touching the network when the API key is missing.
    pub fn new(config: &ClientConfig) -> Result<Self, VideoApiError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Self::with_client(client, config)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    ///
    /// Applies the same credential check as [`VideoApi::new`].
    pub fn with_client(
        client: reqwest::Client,
        config: &ClientConfig,
    ) -> Result<Self, VideoApiError> {
        config.validate()?;
        Ok(Self {
            client,
            api_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Stream a rendition of a finished job into `sink`, chunk by chunk.
    ///
    /// Returns the total number of bytes handed to the sink.
    pub async fn download_to_sink<F>(
        &self,
        id: &str,
        variant: Option<DownloadVariant>,
        sink: F,
    ) -> Result<u64, VideoApiError>
    where
        F: FnMut(&[u8]) -> std::io::Result<()> + Send,
    {
        let response = self.content_request(id, variant).send().await?;
        let response = Self::ensure_success(response).await?;
        let total = drain_stream(response.bytes_stream(), sink).await?;

        tracing::info!(job_id = %id, bytes = total, "Video content downloaded");
        Ok(total)
    }

    /// Download a rendition to `path`, returning the number of bytes written.
    ///
    /// Bytes go to a `.part` file next to `path`, which is renamed over
    /// `path` only once the whole body has arrived. A failed request or
    /// an interrupted stream leaves any existing file at `path` untouched.
    pub async fn download_to_file(
        &self,
        id: &str,
        variant: Option<DownloadVariant>,
        path: &Path,
    ) -> Result<u64, VideoApiError> {
        let partial = partial_path(path);
        match self.download_into(id, variant, &partial).await {
            Ok(total) => {
                tokio::fs::rename(&partial, path).await?;
                tracing::info!(
                    job_id = %id,
                    bytes = total,
                    path = %path.display(),
                    "Video content saved",
                );
                Ok(total)
            }
            Err(e) => {
                // The partial file may not exist yet.
                let _ = tokio::fs::remove_file(&partial).await;
                Err(e)
            }
        }
    }

    // ---- private helpers ----

    fn videos_url(&self) -> String {
        format!("{}/videos", self.api_url)
    }

    fn video_url(&self, id: &str) -> String {
        format!("{}/videos/{}", self.api_url, id)
    }

    /// The status is checked before `partial` is created.
    async fn download_into(
        &self,
        id: &str,
        variant: Option<DownloadVariant>,
        partial: &Path,
    ) -> Result<u64, VideoApiError> {
        let response = self.content_request(id, variant).send().await?;
        let response = Self::ensure_success(response).await?;

        let mut file = std::fs::File::create(partial)?;
        let total = drain_stream(response.bytes_stream(), |chunk| file.write_all(chunk)).await?;
        file.flush()?;
        Ok(total)
    }

    fn content_request(
        &self,
        id: &str,
        variant: Option<DownloadVariant>,
    ) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .get(format!("{}/content", self.video_url(id)))
            .bearer_auth(&self.api_key);
        if let Some(variant) = variant {
            builder = builder.query(&[("variant", variant.as_str())]);
        }
        builder
    }

    /// JSON body, or multipart when a reference image is attached.
    fn create_request(
        &self,
        request: &CreateVideoRequest,
    ) -> Result<reqwest::RequestBuilder, VideoApiError> {
        let builder = self.client.post(self.videos_url()).bearer_auth(&self.api_key);
        let prompt = request.prompt.trim().to_string();

        let builder = match &request.input_reference {
            Some(reference) => {
                let image = multipart::Part::bytes(reference.bytes.clone())
                    .file_name(reference.file_name.clone())
                    .mime_str(reference.mime_type())?;
                let form = multipart::Form::new()
                    .text("prompt", prompt)
                    .text("model", request.model.clone())
                    .text("seconds", request.seconds.to_string())
                    .text("size", request.size.clone())
                    .part("input_reference", image);
                builder.multipart(form)
            }
            None => builder.json(&serde_json::json!({
                "prompt": prompt,
                "model": request.model,
                "seconds": request.seconds.to_string(),
                "size": request.size,
            })),
        };
        Ok(builder)
    }

    /// Pass 2xx responses through. Anything else becomes a
    /// [`VideoApiError::ApiError`] carrying the service's error body, which
    /// usually explains a rejected prompt or an unknown job id.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, VideoApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = match response.text().await {
            Ok(text) => text,
            Err(_) => "<unreadable body>".to_string(),
        };
        Err(VideoApiError::ApiError {
            status: status.as_u16(),
            body,
        })
    }

    /// Decode a JSON job, page, or delete body after the status check.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, VideoApiError> {
        Ok(Self::ensure_success(response).await?.json::<T>().await?)
    }
}

#[async_trait]
impl VideoJobs for VideoApi {
    async fn create(&self, request: &CreateVideoRequest) -> Result<JobRecord, VideoApiError> {
        request.validate()?;

        let response = self.create_request(request)?.send().await?;
        let value: Value = Self::parse_response(response).await?;
        let record = normalize(RawJobPayload::typed_or_mapping(value));

        let Some(id) = record.id() else {
            return Err(VideoApiError::MissingId {
                payload: record.raw_json(),
            });
        };

        tracing::info!(
            job_id = %id,
            model = %request.model,
            size = %request.size,
            seconds = request.seconds,
            "Video job submitted",
        );
        Ok(record)
    }

    async fn retrieve(&self, id: &str) -> Result<JobRecord, VideoApiError> {
        let response = self
            .client
            .get(self.video_url(id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let value: Value = Self::parse_response(response).await?;
        Ok(normalize(value))
    }

    async fn list(&self, query: &ListQuery) -> Result<Page, VideoApiError> {
        let response = self
            .client
            .get(self.videos_url())
            .bearer_auth(&self.api_key)
            .query(&ListParams::from(query))
            .send()
            .await?;

        let value: Value = Self::parse_response(response).await?;
        Ok(Page::from_value(value))
    }

    async fn delete(&self, id: &str) -> Result<DeleteAck, VideoApiError> {
        let response = self
            .client
            .delete(self.video_url(id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let ack: DeleteAck = Self::parse_response(response).await?;
        tracing::info!(job_id = %id, deleted = ack.deleted, "Video job deleted");
        Ok(ack)
    }

    async fn download_content(
        &self,
        id: &str,
        variant: Option<DownloadVariant>,
    ) -> Result<Vec<u8>, VideoApiError> {
        let response = self.content_request(id, variant).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
