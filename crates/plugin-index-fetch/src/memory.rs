//! In-memory fetcher for tests and offline use.

use crate::{FetchError, HttpFetch};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

enum Response {
    Body(Vec<u8>),
    Status(u16),
}

/// Serves canned bodies by exact URL and records every request.
///
/// URLs without a route answer [`FetchError::NotFound`].
#[derive(Default)]
pub struct MemoryFetcher {
    routes: HashMap<String, Response>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `url`.
    pub fn add(&mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> &mut Self {
        self.routes.insert(url.into(), Response::Body(body.into()));
        self
    }

    /// Serve `value` as JSON at `url`.
    pub fn add_json(&mut self, url: impl Into<String>, value: &serde_json::Value) -> &mut Self {
        self.add(url, value.to_string())
    }

    /// Answer `url` with an HTTP error status.
    pub fn add_status(&mut self, url: impl Into<String>, status: u16) -> &mut Self {
        self.routes.insert(url.into(), Response::Status(status));
        self
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl HttpFetch for MemoryFetcher {
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.to_string());

        match self.routes.get(url) {
            Some(Response::Body(body)) => Ok(body.clone()),
            Some(Response::Status(404)) | None => Err(FetchError::NotFound(url.to_string())),
            Some(Response::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
        }
    }
}
