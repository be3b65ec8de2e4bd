#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Duration;
use draftdata::cache::HttpCache;
use draftdata::session::{CachedSession, Transport, TransportResponse};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

type Handler = Box<dyn Fn(&Url, usize) -> anyhow::Result<TransportResponse> + Send + Sync>;

/// A scripted stand-in for the network. The handler receives the request URL
/// and the zero-based call index, so tests can both route by URL and vary
/// behavior across calls.
pub struct FakeTransport {
    handler: Handler,
    calls: AtomicUsize,
}

impl FakeTransport {
    pub fn new(
        handler: impl Fn(&Url, usize) -> anyhow::Result<TransportResponse> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &Url) -> anyhow::Result<TransportResponse> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        (self.handler)(url, index)
    }
}

pub fn ok_json(body: &serde_json::Value) -> TransportResponse {
    TransportResponse {
        status: 200,
        cache_control: None,
        body: body.to_string(),
    }
}

pub fn ok_text(body: &str) -> TransportResponse {
    TransportResponse {
        status: 200,
        cache_control: None,
        body: body.to_string(),
    }
}

pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("draftdata-test-{}", uuid::Uuid::new_v4()))
}

pub fn session_at(
    transport: Arc<FakeTransport>,
    dir: PathBuf,
    retention: Duration,
) -> CachedSession {
    CachedSession::new(transport, HttpCache::new(dir, retention, true))
}

pub fn session(transport: Arc<FakeTransport>) -> CachedSession {
    session_at(transport, scratch_dir(), Duration::days(180))
}
