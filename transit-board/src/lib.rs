//! Real-time transit arrival boards.
//!
//! Loads a static catalog of stations, platforms and routes, periodically
//! merges GTFS-realtime trip updates into it, and answers: "what are the
//! next trains at this station?"

pub mod arrivals;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod feed;
pub mod refresh;
pub mod service;
pub mod web;
