//! Chat service transport
//!
//! [`ChatService`] talks to the RAG backend over HTTP: a short health check
//! and a streaming query whose newline-delimited JSON body is turned into a
//! [`TextStream`] of deltas.

use crate::config::{ApiSettings, Endpoints};
use crate::streaming::{create_text_stream, parse_content_line, LineDecoder, StreamHandler, TextStream};
use crate::{IrisError, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Buffered deltas between the body reader and the consumer
const STREAM_BUFFER: usize = 32;

/// Backend able to answer chat questions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Check whether the service is up. Never fails; problems yield `false`.
    async fn health_check(&self) -> bool;

    /// Send a question on behalf of a role and stream back the answer deltas
    async fn send_message(&self, question: &str, user_role: &str) -> Result<TextStream>;
}

/// Request body of the query endpoint
#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    question: &'a str,
    user_role: &'a str,
}

/// HTTP client for the chat service
///
/// The configured request timeout bounds connecting and each read of the
/// response body, not the whole answer. An answer that keeps streaming is
/// never cut off; a stalled one is.
#[derive(Debug, Clone)]
pub struct ChatService {
    client: Client,
    endpoints: Endpoints,
    health_timeout: Duration,
}

impl ChatService {
    /// Create a client from the API settings
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(300))
            .tcp_keepalive(Duration::from_secs(60))
            .connect_timeout(settings.request_timeout)
            .read_timeout(settings.request_timeout)
            .build()
            .map_err(|e| IrisError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoints: settings.endpoints.clone(),
            health_timeout: settings.health_timeout,
        })
    }

    /// Endpoints this client talks to
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn transport_error(e: impl std::fmt::Display) -> IrisError {
        let msg = format!("Failed to communicate with chat service: {}", e);
        tracing::error!(target: "api", "{}", msg);
        IrisError::api(msg)
    }
}

#[async_trait]
impl ChatBackend for ChatService {
    async fn health_check(&self) -> bool {
        let endpoint = &self.endpoints.health;
        tracing::info!(target: "api", "Checking health at {}", endpoint);

        match self
            .client
            .get(endpoint)
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(response) => {
                let is_healthy = response.status() == StatusCode::OK;
                tracing::info!(
                    target: "api",
                    "Health check status: {} ({})",
                    if is_healthy { "healthy" } else { "unhealthy" },
                    response.status()
                );
                is_healthy
            }
            Err(e) => {
                tracing::error!(target: "api", "Health check failed: {}", e);
                false
            }
        }
    }

    async fn send_message(&self, question: &str, user_role: &str) -> Result<TextStream> {
        let endpoint = &self.endpoints.chat;
        let start = Instant::now();
        tracing::debug!(target: "api", "POST {} as role '{}'", endpoint, user_role);

        let response = self
            .client
            .post(endpoint)
            .json(&QueryRequest { question, user_role })
            .send()
            .await
            .map_err(Self::transport_error)?
            .error_for_status()
            .map_err(Self::transport_error)?;

        let (tx, rx) = create_text_stream(STREAM_BUFFER);

        tokio::spawn(async move {
            let mut handler = StreamHandler::new(tx);
            let mut decoder = LineDecoder::new();
            let mut body = response.bytes_stream();

            loop {
                let next = tokio::select! {
                    _ = handler.closed() => {
                        tracing::debug!(target: "api", "Stream consumer went away; closing response");
                        return;
                    }
                    next = body.next() => next,
                };
                let Some(next) = next else {
                    break;
                };
                let bytes = match next {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = handler.send_error(Self::transport_error(e)).await;
                        return;
                    }
                };
                for line in decoder.push(&bytes) {
                    if let Some(content) = parse_content_line(&line) {
                        if handler.send_chunk(content).await.is_err() {
                            tracing::debug!(target: "api", "Stream consumer went away; closing response");
                            return;
                        }
                    }
                }
            }

            if let Some(content) = decoder.finish().as_deref().and_then(parse_content_line) {
                if handler.send_chunk(content).await.is_err() {
                    return;
                }
            }

            tracing::info!(
                target: "api",
                "Request completed in {:.2} seconds ({} chunks)",
                start.elapsed().as_secs_f64(),
                handler.chunks_sent()
            );
        });

        Ok(rx)
    }
}
