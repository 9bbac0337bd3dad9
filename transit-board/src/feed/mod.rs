//! GTFS-realtime feeds.
//!
//! This module fetches the agency's protobuf trip-update feeds and merges
//! them into an [`Arrivals`](crate::arrivals::Arrivals) model.
//!
//! Key characteristics of the feeds:
//! - Each feed covers a group of routes; a refresh fetches all of them
//! - A trip update lists its remaining stops in order, so the last one
//!   is the trip's destination
//! - Times are absolute Unix seconds

mod client;
mod error;
mod merge;
mod mock;

use std::future::Future;

pub use client::{FeedClient, FeedConfig, NYCT_FEED_BASE_URL, NYCT_FEED_GROUPS, nyct_feed_urls};
pub use error::FeedError;
pub use gtfs_realtime::FeedMessage;
pub use merge::{MergeReport, merge_feed};
pub use mock::MockFeedSource;

/// Anything that can produce one decoded message per configured feed.
///
/// A feed that cannot be decoded or times out is left out of the result;
/// an error means the whole cycle should be abandoned.
pub trait FeedSource: Send + Sync {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<FeedMessage>, FeedError>> + Send;
}
