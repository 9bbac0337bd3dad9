//! Domain types for the transit arrival board.
//!
//! Static entities (`Route`, `Station`, `Stop`) are built once from the
//! agency's reference data. `TripUpdate` values are rebuilt every refresh
//! cycle and live in sorted `TripList`s. Entities refer to each other by id,
//! never by pointer; the catalog resolves ids when a view is needed.

mod error;
mod ids;
mod route;
mod station;
mod trip;

pub use error::LookupError;
pub use ids::{RouteId, StationId, StopId};
pub use route::{InvalidRouteColor, Route, RouteColor};
pub use station::{Station, Stop};
pub use trip::{GRACE_WINDOW_SECS, TripList, TripUpdate, by_predicted_time};
