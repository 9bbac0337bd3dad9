//! Stations and the platforms (stops) that belong to them.

use super::{StationId, StopId};

/// A named transit complex, the unit exposed to arrival queries.
///
/// Stations own their platforms by id; the `Stop` records themselves live
/// in the catalog's stop map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    stops: Vec<StopId>,
}

impl Station {
    /// Create a station with no platforms yet.
    pub fn new(id: StationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            stops: Vec::new(),
        }
    }

    /// Register a platform as belonging to this station.
    pub fn add_stop(&mut self, stop: StopId) {
        if !self.stops.contains(&stop) {
            self.stops.push(stop);
        }
    }

    /// Platforms of this station, in reference-data order.
    pub fn stops(&self) -> &[StopId] {
        &self.stops
    }

    /// Whether the given platform belongs to this station.
    pub fn has_stop(&self, stop: &str) -> bool {
        self.stops.iter().any(|s| s.as_str() == stop)
    }
}

/// A physical platform within a station.
///
/// Stop names are not unique (every platform of "51 St" is called "51 St"),
/// so stops are only ever looked up by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    /// The owning station.
    pub station: StationId,
}

impl Stop {
    pub fn new(id: StopId, name: impl Into<String>, station: StationId) -> Self {
        Self {
            id,
            name: name.into(),
            station,
        }
    }
}
