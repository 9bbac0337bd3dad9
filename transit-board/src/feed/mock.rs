//! Mock feed source for testing without API access.
//!
//! Serves fixed feed messages as if they had just been fetched, and counts
//! how often it was asked. An optional delay stands in for a slow upstream.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use gtfs_realtime::FeedMessage;
use prost::Message;
use tokio::sync::RwLock;

use super::FeedSource;
use super::error::FeedError;

/// Feed source that serves in-memory messages.
#[derive(Clone, Default)]
pub struct MockFeedSource {
    messages: Arc<RwLock<Vec<FeedMessage>>>,
    failure: Arc<RwLock<Option<u16>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    fetches: Arc<AtomicUsize>,
}

impl MockFeedSource {
    /// Create a mock that serves the given messages on every fetch.
    pub fn new(messages: Vec<FeedMessage>) -> Self {
        Self {
            messages: Arc::new(RwLock::new(messages)),
            ..Default::default()
        }
    }

    /// Load every `.pb` file in a directory, in file name order.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, FeedError> {
        let dir = dir.as_ref();
        let file_error = |path: &Path, message: String| FeedError::File {
            path: path.display().to_string(),
            message,
        };

        let entries = std::fs::read_dir(dir).map_err(|e| file_error(dir, e.to_string()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| file_error(dir, e.to_string()))?.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("pb") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut messages = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes =
                std::fs::read(&path).map_err(|e| file_error(path.as_path(), e.to_string()))?;
            let message = FeedMessage::decode(bytes.as_slice())
                .map_err(|e| file_error(path.as_path(), e.to_string()))?;
            messages.push(message);
        }

        Ok(Self::new(messages))
    }

    /// Replace the messages served from now on.
    pub async fn set_messages(&self, messages: Vec<FeedMessage>) {
        *self.messages.write().await = messages;
    }

    /// Make every fetch fail with the given HTTP status, or succeed again with `None`.
    pub async fn fail_with_status(&self, status: Option<u16>) {
        *self.failure.write().await = status;
    }

    /// Make every fetch take `delay` before answering.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write().await = delay;
    }

    /// Number of fetches served so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl FeedSource for MockFeedSource {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<FeedMessage>, FeedError>> + Send {
        async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);

            let delay = *self.delay.read().await;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if let Some(status) = *self.failure.read().await {
                return Err(FeedError::Api {
                    url: "mock://feed".to_string(),
                    status,
                    message: "mock failure".to_string(),
                });
            }

            Ok(self.messages.read().await.clone())
        }
    }
}
