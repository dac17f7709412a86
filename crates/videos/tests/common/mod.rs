#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use vidgen_core::video_request::CreateVideoRequest;
use vidgen_videos::api::{DeleteAck, ListQuery, Page, VideoApiError, VideoJobs};
use vidgen_videos::download::DownloadVariant;
use vidgen_videos::normalize::{normalize, JobRecord};

/// In-memory [`VideoJobs`] that replays scripted responses in order.
///
/// Each operation has its own queue. An operation called with an empty
/// queue fails with a 500 `ApiError`, so a test that polls more often
/// than expected fails loudly instead of hanging.
#[derive(Default)]
pub struct ScriptedJobs {
    creates: Mutex<VecDeque<Result<Value, VideoApiError>>>,
    retrieves: Mutex<VecDeque<Result<Value, VideoApiError>>>,
    pages: Mutex<VecDeque<Value>>,
    downloads: Mutex<VecDeque<Result<Vec<u8>, VideoApiError>>>,
    queries: Mutex<Vec<ListQuery>>,
    deleted: Mutex<Vec<String>>,
    create_calls: AtomicUsize,
    retrieve_calls: AtomicUsize,
}

impl ScriptedJobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_create(self, payload: Value) -> Self {
        self.creates.lock().unwrap().push_back(Ok(payload));
        self
    }

    pub fn on_retrieve(self, payload: Value) -> Self {
        self.retrieves.lock().unwrap().push_back(Ok(payload));
        self
    }

    pub fn on_retrieve_error(self, error: VideoApiError) -> Self {
        self.retrieves.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn on_list(self, body: Value) -> Self {
        self.pages.lock().unwrap().push_back(body);
        self
    }

    pub fn on_download(self, result: Result<Vec<u8>, VideoApiError>) -> Self {
        self.downloads.lock().unwrap().push_back(result);
        self
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn retrieve_calls(&self) -> usize {
        self.retrieve_calls.load(Ordering::SeqCst)
    }

    /// Every listing query received so far, in order.
    pub fn queries(&self) -> Vec<ListQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

fn exhausted(operation: &str) -> VideoApiError {
    VideoApiError::ApiError {
        status: 500,
        body: format!("no scripted response left for {operation}"),
    }
}

#[async_trait]
impl VideoJobs for ScriptedJobs {
    async fn create(&self, request: &CreateVideoRequest) -> Result<JobRecord, VideoApiError> {
        request.validate()?;
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.creates.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(exhausted("create"))).map(normalize)
    }

    async fn retrieve(&self, _id: &str) -> Result<JobRecord, VideoApiError> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.retrieves.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(exhausted("retrieve"))).map(normalize)
    }

    async fn list(&self, query: &ListQuery) -> Result<Page, VideoApiError> {
        self.queries.lock().unwrap().push(query.clone());
        let next = self.pages.lock().unwrap().pop_front();
        next.map(Page::from_value).ok_or_else(|| exhausted("list"))
    }

    async fn delete(&self, id: &str) -> Result<DeleteAck, VideoApiError> {
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(DeleteAck {
            id: id.to_string(),
            object: "video.deleted".to_string(),
            deleted: true,
        })
    }

    async fn download_content(
        &self,
        _id: &str,
        _variant: Option<DownloadVariant>,
    ) -> Result<Vec<u8>, VideoApiError> {
        let next = self.downloads.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(exhausted("download")))
    }
}

/// A job payload in the given state.
pub fn job(id: &str, status: &str, progress: u8) -> Value {
    serde_json::json!({
        "id": id,
        "object": "video",
        "status": status,
        "progress": progress,
        "model": "sora-2",
        "size": "1280x720",
        "seconds": "8",
        "created_at": 1_741_600_000,
    })
}

/// Serve exactly one HTTP response on a local port and return the API
/// root to point a client at.
pub async fn serve_once(status: &'static str, body: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request: Vec<u8> = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let head = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(body).await.unwrap();
        let _ = socket.shutdown().await;
    });

    format!("http://{addr}/v1")
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("vidgen-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
