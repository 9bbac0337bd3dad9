//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::arrivals::Arrival;
use crate::service::{Board, DEFAULT_ARRIVAL_COUNT};

/// Most arrivals a single request may ask for.
pub const MAX_ARRIVAL_COUNT: usize = 50;

/// Query string for arrival boards.
#[derive(Debug, Default, Deserialize)]
pub struct ArrivalsQuery {
    /// Number of arrivals (defaults to 3, capped at 50)
    pub n: Option<usize>,
}

impl ArrivalsQuery {
    pub fn count(&self) -> usize {
        self.n.unwrap_or(DEFAULT_ARRIVAL_COUNT).min(MAX_ARRIVAL_COUNT)
    }
}

/// Query string for arrivals by station name.
#[derive(Debug, Deserialize)]
pub struct ArrivalsByNameQuery {
    /// Station display name
    pub station: String,

    /// Number of arrivals
    pub n: Option<usize>,
}

impl ArrivalsByNameQuery {
    pub fn count(&self) -> usize {
        ArrivalsQuery { n: self.n }.count()
    }
}

/// Query string for station lookup.
#[derive(Debug, Deserialize)]
pub struct StationLookupRequest {
    pub name: String,
}

/// Every station name.
#[derive(Debug, Serialize, Deserialize)]
pub struct StationListResponse {
    pub stations: Vec<String>,
}

/// A station id and name.
#[derive(Debug, Serialize, Deserialize)]
pub struct StationResult {
    pub id: String,
    pub name: String,
}

/// An arrival board.
#[derive(Debug, Serialize, Deserialize)]
pub struct BoardResponse {
    /// The station or platform queried
    pub station: StationResult,

    /// RFC 3339 time of the data, null before the first refresh
    pub refreshed_at: Option<String>,

    pub arrivals: Vec<ArrivalResult>,
}

impl From<Board> for BoardResponse {
    fn from(board: Board) -> Self {
        Self {
            station: StationResult {
                id: board.id,
                name: board.name,
            },
            refreshed_at: board.refreshed_at.map(|t| t.to_rfc3339()),
            arrivals: board.arrivals.iter().map(ArrivalResult::from_arrival).collect(),
        }
    }
}

/// One row of an arrival board.
#[derive(Debug, Serialize, Deserialize)]
pub struct ArrivalResult {
    /// Seconds until arrival, never negative
    pub countdown_secs: i64,
    pub eta_minutes: i64,

    /// Display label, e.g. "4m"
    pub eta_label: String,

    pub route_id: String,
    pub route_name: String,

    /// Route background color as `RRGGBB`
    pub route_color: String,
    pub route_text_color: String,

    pub stop_id: String,
    pub stop_name: String,
    pub destination_id: String,
    pub destination_name: String,

    /// Unix seconds
    pub predicted_time: i64,
}

impl ArrivalResult {
    pub fn from_arrival(arrival: &Arrival) -> Self {
        let trip = &arrival.trip;
        Self {
            countdown_secs: arrival.countdown_secs,
            eta_minutes: arrival.eta_minutes(),
            eta_label: arrival.eta_label(),
            route_id: trip.route_id.clone(),
            route_name: trip.route_name.clone(),
            route_color: trip.route_color.to_string(),
            route_text_color: trip.route_text_color.to_string(),
            stop_id: trip.stop_id.clone(),
            stop_name: trip.stop_name.clone(),
            destination_id: trip.destination_id.clone(),
            destination_name: trip.destination_name.clone(),
            predicted_time: trip.predicted_time,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
