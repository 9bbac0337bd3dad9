//! Real-time feed HTTP client.
//!
//! Fetches every configured GTFS-realtime endpoint with the agency API key
//! and decodes each body into a `FeedMessage`. Requests run concurrently,
//! bounded by a semaphore, each with its own timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use gtfs_realtime::FeedMessage;
use prost::Message;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::FeedSource;
use super::error::FeedError;

/// Base URL of the NYCT subway GTFS-realtime feeds.
pub const NYCT_FEED_BASE_URL: &str =
    "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs";

/// NYCT feed group suffixes; each feed covers a subset of routes.
pub const NYCT_FEED_GROUPS: &[&str] = &[
    "",      // 1234567S
    "-ace",  // A C E H FS
    "-bdfm", // B D F M
    "-g",    // G
    "-jz",   // J Z
    "-nqrw", // N Q R W
    "-l",    // L
    "-si",   // Staten Island Railway
];

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Default maximum concurrent feed requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The full list of NYCT subway feed URLs.
pub fn nyct_feed_urls() -> Vec<String> {
    NYCT_FEED_GROUPS
        .iter()
        .map(|group| format!("{NYCT_FEED_BASE_URL}{group}"))
        .collect()
}

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// API key sent in the `x-api-key` header
    pub api_key: String,
    /// Feed URLs fetched on every refresh
    pub endpoints: Vec<String>,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Per-request timeout
    pub timeout: Duration,
}

impl FeedConfig {
    /// Create a new config with the given API key and the NYCT subway feeds.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoints: nyct_feed_urls(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replace the feed URLs.
    pub fn with_endpoints(mut self, endpoints: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// GTFS-realtime feed client.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    endpoints: Arc<[String]>,
    semaphore: Arc<Semaphore>,
}

impl FeedClient {
    /// Create a new feed client with the given configuration.
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let mut headers = HeaderMap::new();

        let mut api_key =
            HeaderValue::from_str(&config.api_key).map_err(|_| FeedError::InvalidApiKey)?;
        api_key.set_sensitive(true);
        headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            endpoints: config.endpoints.into(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// Fetch and decode one feed.
    ///
    /// Returns `Ok(None)` when the body does not decode or the request times
    /// out; the caller should skip this feed for the current cycle. Any other
    /// failure, including a non-success status, is an error.
    pub async fn fetch_feed(&self, url: &str) -> Result<Option<FeedMessage>, FeedError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| FeedError::Closed)?;

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!(%url, "feed request timed out; skipping feed");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FeedError::Unauthorized {
                url: url.to_string(),
            });
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FeedError::RateLimited {
                url: url.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Api {
                url: url.to_string(),
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => {
                warn!(%url, "feed body timed out; skipping feed");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        match FeedMessage::decode(body) {
            Ok(message) => {
                debug!(%url, entities = message.entity.len(), "decoded feed");
                Ok(Some(message))
            }
            Err(e) => {
                warn!(%url, error = %e, "feed did not decode; skipping feed");
                Ok(None)
            }
        }
    }

    /// Fetch every configured feed, dropping the ones that soft-failed.
    ///
    /// Messages come back in endpoint order. The first hard failure is
    /// returned as the error for the whole call.
    pub async fn fetch_all_feeds(&self) -> Result<Vec<FeedMessage>, FeedError> {
        let results = join_all(self.endpoints.iter().map(|url| self.fetch_feed(url))).await;

        let mut messages = Vec::with_capacity(results.len());
        for result in results {
            if let Some(message) = result? {
                messages.push(message);
            }
        }

        Ok(messages)
    }
}

impl FeedSource for FeedClient {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<FeedMessage>, FeedError>> + Send {
        self.fetch_all_feeds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::get;
    use gtfs_realtime::{FeedEntity, FeedHeader, TripDescriptor, TripUpdate};

    const KEY: &str = "test-key";

    fn sample_message() -> FeedMessage {
        FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "2.0".to_string(),
                ..Default::default()
            },
            entity: vec![FeedEntity {
                id: "1".to_string(),
                trip_update: Some(TripUpdate {
                    trip: TripDescriptor {
                        route_id: Some("6".to_string()),
                        ..Default::default()
                    },
                    ..Default::default()
                }),
                ..Default::default()
            }],
        }
    }

    async fn authorized(headers: AxumHeaders) -> Result<Vec<u8>, StatusCode> {
        match headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
            Some(KEY) => Ok(sample_message().encode_to_vec()),
            _ => Err(StatusCode::FORBIDDEN),
        }
    }

    /// Serve a router on an ephemeral local port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn feed_server() -> String {
        let router = Router::new()
            .route("/good", get(authorized))
            .route("/garbled", get(|| async { b"not a protobuf".to_vec() }))
            .route("/empty", get(|| async { Vec::<u8>::new() }))
            .route("/down", get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }))
            .route("/limited", get(|| async { StatusCode::TOO_MANY_REQUESTS }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    sample_message().encode_to_vec()
                }),
            );
        serve(router).await
    }

    fn client(base: &str, paths: &[&str]) -> FeedClient {
        let config = FeedConfig::new(KEY)
            .with_endpoints(paths.iter().map(|p| format!("{base}{p}")))
            .with_timeout(Duration::from_millis(500));
        FeedClient::new(config).unwrap()
    }

    #[test]
    fn config_builder() {
        let config = FeedConfig::new("key")
            .with_endpoints(["http://localhost/a", "http://localhost/b"])
            .with_max_concurrent(2)
            .with_timeout(Duration::from_secs(3));

        assert_eq!(config.api_key, "key");
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.max_concurrent, 2);
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn config_defaults() {
        let config = FeedConfig::new("key");

        assert_eq!(config.endpoints.len(), NYCT_FEED_GROUPS.len());
        assert_eq!(config.endpoints[0], NYCT_FEED_BASE_URL);
        assert!(config.endpoints[1].ends_with("nyct%2Fgtfs-ace"));
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn rejects_unprintable_key() {
        let result = FeedClient::new(FeedConfig::new("bad\nkey"));
        assert!(matches!(result, Err(FeedError::InvalidApiKey)));
    }

    #[tokio::test]
    async fn decodes_feed_with_api_key() {
        let base = feed_server().await;
        let client = client(&base, &["/good"]);

        let message = client.fetch_feed(&format!("{base}/good")).await.unwrap().unwrap();
        assert_eq!(message, sample_message());
    }

    #[tokio::test]
    async fn wrong_key_is_unauthorized() {
        let base = feed_server().await;
        let config = FeedConfig::new("wrong").with_endpoints([format!("{base}/good")]);
        let client = FeedClient::new(config).unwrap();

        let result = client.fetch_all_feeds().await;
        assert!(matches!(result, Err(FeedError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn garbled_feed_is_skipped() {
        let base = feed_server().await;
        let client = client(&base, &["/garbled", "/good"]);

        let messages = client.fetch_all_feeds().await.unwrap();
        assert_eq!(messages, vec![sample_message()]);
    }

    #[tokio::test]
    async fn empty_body_decodes_to_empty_feed() {
        let base = feed_server().await;
        let client = client(&base, &["/empty"]);

        let messages = client.fetch_all_feeds().await.unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].entity.is_empty());
    }

    #[tokio::test]
    async fn slow_feed_is_skipped() {
        let base = feed_server().await;
        let client = client(&base, &["/slow", "/good"]);

        let messages = client.fetch_all_feeds().await.unwrap();
        assert_eq!(messages, vec![sample_message()]);
    }

    #[tokio::test]
    async fn bad_status_fails_whole_fetch() {
        let base = feed_server().await;
        let client = client(&base, &["/good", "/down"]);

        match client.fetch_all_feeds().await {
            Err(FeedError::Api {
                status, message, ..
            }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_limit_is_reported() {
        let base = feed_server().await;
        let client = client(&base, &["/limited"]);

        let result = client.fetch_all_feeds().await;
        assert!(matches!(result, Err(FeedError::RateLimited { .. })));
    }
}
