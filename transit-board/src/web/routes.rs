//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use tracing::{debug, warn};

use crate::domain::LookupError;
use crate::feed::FeedSource;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<S: FeedSource + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stations", get(list_stations::<S>))
        .route("/api/stations/lookup", get(lookup_station::<S>))
        .route("/api/stations/:id/arrivals", get(station_arrivals::<S>))
        .route("/api/arrivals", get(arrivals_by_name::<S>))
        .route("/api/stops/:id/arrivals", get(stop_arrivals::<S>))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// All station names, sorted.
async fn list_stations<S: FeedSource>(State(state): State<AppState<S>>) -> Json<StationListResponse> {
    Json(StationListResponse {
        stations: state.transit.station_names(),
    })
}

/// Resolve a station name to its id.
async fn lookup_station<S: FeedSource>(
    State(state): State<AppState<S>>,
    Query(req): Query<StationLookupRequest>,
) -> Result<Json<StationResult>, AppError> {
    let name = non_blank(&req.name, "name")?;
    let id = state.transit.station_id(name)?;

    Ok(Json(StationResult {
        id: id.to_string(),
        name: name.to_string(),
    }))
}

/// Upcoming arrivals at a station by id.
async fn station_arrivals<S: FeedSource>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Query(query): Query<ArrivalsQuery>,
) -> Result<Json<BoardResponse>, AppError> {
    let board = state
        .transit
        .upcoming_by_id(&id, query.count(), Utc::now())
        .await?;

    Ok(Json(board.into()))
}

/// Upcoming arrivals at a station by display name.
async fn arrivals_by_name<S: FeedSource>(
    State(state): State<AppState<S>>,
    Query(query): Query<ArrivalsByNameQuery>,
) -> Result<Json<BoardResponse>, AppError> {
    let name = non_blank(&query.station, "station")?;
    let board = state
        .transit
        .upcoming_by_name(name, query.count(), Utc::now())
        .await?;

    Ok(Json(board.into()))
}

/// Upcoming arrivals at a single platform.
async fn stop_arrivals<S: FeedSource>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Query(query): Query<ArrivalsQuery>,
) -> Result<Json<BoardResponse>, AppError> {
    let board = state
        .transit
        .upcoming_at_stop(&id, query.count(), Utc::now())
        .await?;

    Ok(Json(board.into()))
}

fn non_blank<'a>(value: &'a str, param: &str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest {
            message: format!("Missing {param}"),
        });
    }
    Ok(value)
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
}

impl From<LookupError> for AppError {
    fn from(e: LookupError) -> Self {
        AppError::NotFound {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
        };

        if status == StatusCode::NOT_FOUND {
            debug!(%status, %message, "lookup failed");
        } else {
            warn!(%status, %message, "rejected request");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
