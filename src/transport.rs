// src/transport.rs
//! HTTP fetch client: one timed GET per call, returning status + body.
//!
//! Collectors only see the `Transport` trait, so tests swap in `MockTransport`
//! and count network calls without opening sockets.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::Barrier;

use crate::error::FetchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            timeout,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError>;
}

/// Production transport backed by a shared `reqwest::Client`.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        let mut builder = self.client.get(&request.url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Transport(format!("reading body: {e}")))?;

        Ok(HttpResponse { status, body })
    }
}

// --- Test helper ---

/// Scripted reply for `MockTransport`.
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(HttpResponse),
    TransportError(String),
}

/// Replays queued replies in order, then repeats the fallback.
/// Records every request it receives.
///
/// A gated mock holds each request in flight until `parties` requests have
/// arrived, so concurrent fetches really overlap.
pub struct MockTransport {
    queue: Mutex<VecDeque<MockReply>>,
    fallback: MockReply,
    gate: Option<Arc<Barrier>>,
    pub calls: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new(fallback: MockReply) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback,
            gate: None,
            calls: Mutex::new(vec![]),
        }
    }

    pub fn gated(mut self, parties: usize) -> Self {
        self.gate = Some(Arc::new(Barrier::new(parties)));
        self
    }

    /// Always answers 200 with `body`.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(MockReply::Response(HttpResponse::ok(body)))
    }

    /// Always answers with `status` and an empty body.
    pub fn status(status: u16) -> Self {
        Self::new(MockReply::Response(HttpResponse {
            status,
            body: String::new(),
        }))
    }

    pub fn push(&self, reply: MockReply) {
        self.queue.lock().unwrap().push_back(reply);
    }

    pub fn push_ok(&self, body: impl Into<String>) {
        self.push(MockReply::Response(HttpResponse::ok(body)));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        self.calls.lock().unwrap().push(request.clone());
        let reply = self
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        match reply {
            MockReply::Response(r) => Ok(r),
            MockReply::TransportError(msg) => Err(FetchError::Transport(msg)),
        }
    }
}
