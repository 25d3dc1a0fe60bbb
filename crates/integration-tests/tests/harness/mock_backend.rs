//! Mock chat-completions backend for integration tests
//!
//! Replies are scripted per path and every request is recorded so tests can
//! inspect what the adapter actually sent.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use futures_util::{StreamExt, stream};
use tokio_util::sync::CancellationToken;

/// Canned reply for one path
#[derive(Debug, Clone)]
pub enum Reply {
    /// JSON body with the given status
    Json { status: StatusCode, body: serde_json::Value },
    /// Raw text body with the given status
    Text { status: StatusCode, body: String },
    /// Chunked body, one write per entry with `delay` before each
    Chunks { chunks: Vec<String>, delay: Duration },
    /// Chunked body that stops writing without closing
    ChunksThenStall { chunks: Vec<String> },
    /// Never answers
    Hang,
}

impl Reply {
    pub fn ok(body: serde_json::Value) -> Self {
        Self::Json {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn status(status: StatusCode, body: &str) -> Self {
        Self::Text {
            status,
            body: body.to_owned(),
        }
    }

    pub fn chunks<I, T>(chunks: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::Chunks {
            chunks: chunks.into_iter().map(Into::into).collect(),
            delay: Duration::from_millis(20),
        }
    }
}

/// A request the mock received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

#[derive(Default)]
struct MockState {
    replies: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Mock backend listening on a random local port
pub struct MockBackend {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

impl MockBackend {
    /// Start the mock server, returning immediately
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(MockState::default());

        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as a provider
    ///
    /// The provider appends `/chat/completions` to it
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Absolute URL of `path` on the mock
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Script the reply for `path`
    pub fn reply(&self, path: &str, reply: Reply) -> &Self {
        self.state.replies.lock().unwrap().insert(path.to_owned(), reply);
        self
    }

    /// Script the reply for the default completions endpoint
    pub fn reply_completions(&self, reply: Reply) -> &Self {
        self.reply("/api/chat/completions", reply)
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// The only request received, panicking if there were zero or several
    pub fn single_request(&self) -> RecordedRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one upstream request");
        requests.into_iter().next().unwrap()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle(State(state): State<Arc<MockState>>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let path = uri.path().to_owned();
    let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    state.requests.lock().unwrap().push(RecordedRequest {
        path: path.clone(),
        headers,
        body,
    });

    let reply = state.replies.lock().unwrap().get(&path).cloned();
    match reply {
        None => StatusCode::NOT_FOUND.into_response(),
        Some(Reply::Json { status, body }) => (status, axum::Json(body)).into_response(),
        Some(Reply::Text { status, body }) => (status, body).into_response(),
        Some(Reply::Chunks { chunks, delay }) => {
            let body = stream::iter(chunks).then(move |chunk| async move {
                tokio::time::sleep(delay).await;
                Ok::<_, Infallible>(Bytes::from(chunk))
            });
            Response::new(Body::from_stream(body))
        }
        Some(Reply::ChunksThenStall { chunks }) => {
            let body = stream::iter(chunks)
                .map(|chunk| Ok::<_, Infallible>(Bytes::from(chunk)))
                .chain(stream::pending());
            Response::new(Body::from_stream(body))
        }
        Some(Reply::Hang) => std::future::pending::<Response>().await,
    }
}
