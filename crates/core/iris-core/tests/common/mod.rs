//! Mock chat service for integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use iris_core::ApiSettings;
use std::net::SocketAddr;
use futures_util::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// How the mock answers `/rag/query`
#[derive(Clone)]
pub enum QueryReply {
    /// Status plus the body split into network chunks
    Chunks(StatusCode, Vec<String>),
    /// Some chunks, then the body stream fails and the connection drops
    Broken(Vec<String>),
    /// Chunks sent one by one with a pause before each
    Paced(Vec<String>, Duration),
    /// Some chunks, then the body never produces anything again
    Stalled(Vec<String>),
}

/// Sets the flag once the response body has been dropped
struct BodyDropped(Arc<AtomicBool>);

impl Drop for BodyDropped {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// State for the mock chat service
pub struct MockChatState {
    /// Status returned by `/rag/health`
    pub health_status: StatusCode,
    /// Delay before `/rag/health` answers
    pub health_delay: Duration,
    /// Reply of `/rag/query`
    pub reply: QueryReply,
    /// JSON bodies received on `/rag/query`
    pub requests: RwLock<Vec<serde_json::Value>>,
    /// Set when the server drops a `Stalled` body, i.e. the client went away
    pub body_dropped: Arc<AtomicBool>,
}

impl MockChatState {
    /// Healthy service streaming the given records, one network chunk each
    pub fn streaming(records: &[&str]) -> Self {
        Self::with_chunks(records.iter().map(|r| format!("{}\n", r)).collect())
    }

    /// Healthy service streaming raw body chunks
    pub fn with_chunks(chunks: Vec<String>) -> Self {
        Self {
            health_status: StatusCode::OK,
            health_delay: Duration::ZERO,
            reply: QueryReply::Chunks(StatusCode::OK, chunks),
            requests: RwLock::new(Vec::new()),
            body_dropped: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Start the mock service on an ephemeral port
pub async fn start_mock_chat_service(state: MockChatState) -> (SocketAddr, Arc<MockChatState>) {
    let state = Arc::new(state);

    let app = Router::new()
        .route("/rag/health", get(mock_health))
        .route("/rag/query", post(mock_query))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

/// API settings pointing at a mock service
pub fn api_settings(addr: SocketAddr) -> ApiSettings {
    ApiSettings::new(format!("http://{}", addr), "rag")
}

/// Address nothing listens on
pub async fn unused_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

async fn mock_health(State(state): State<Arc<MockChatState>>) -> impl IntoResponse {
    if !state.health_delay.is_zero() {
        tokio::time::sleep(state.health_delay).await;
    }
    (state.health_status, "ok")
}

async fn mock_query(
    State(state): State<Arc<MockChatState>>,
    Json(request): Json<serde_json::Value>,
) -> Response {
    state.requests.write().await.push(request);

    match state.reply.clone() {
        QueryReply::Chunks(status, chunks) => {
            let stream = futures_util::stream::iter(chunks.into_iter().map(Ok::<_, std::io::Error>));
            (status, Body::from_stream(stream)).into_response()
        }
        QueryReply::Broken(chunks) => {
            let items = chunks
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                ))));
            Body::from_stream(futures_util::stream::iter(items)).into_response()
        }
        QueryReply::Paced(chunks, pause) => {
            let stream = futures_util::stream::iter(chunks).then(move |chunk| async move {
                tokio::time::sleep(pause).await;
                Ok::<_, std::io::Error>(chunk)
            });
            Body::from_stream(stream).into_response()
        }
        QueryReply::Stalled(chunks) => {
            let guard = BodyDropped(state.body_dropped.clone());
            let stream = futures_util::stream::iter(chunks)
                .chain(futures_util::stream::pending())
                .map(move |chunk| {
                    let _alive = &guard;
                    Ok::<_, std::io::Error>(chunk)
                });
            Body::from_stream(stream).into_response()
        }
    }
}
