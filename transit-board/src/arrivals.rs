//! Arrival predictions for every station and platform.
//!
//! `Arrivals` holds one sorted [`TripList`] per station and per platform for
//! the current refresh cycle. Inserting into a platform always inserts into
//! its parent station too, so the two views never disagree. A published
//! `Arrivals` is immutable; the refresh cycle builds the next one and swaps
//! it in whole.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::catalog::Catalog;
use crate::domain::{LookupError, RouteColor, Station, StationId, StopId, TripList, TripUpdate};

/// Sorted predictions keyed by station and by platform.
#[derive(Debug, Clone, Default)]
pub struct Arrivals {
    stations: HashMap<StationId, TripList>,
    stops: HashMap<StopId, TripList>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl Arrivals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a prediction into its platform and the platform's station.
    ///
    /// Fails if the platform is not in the catalog; nothing is inserted then.
    pub fn insert(&mut self, catalog: &Catalog, update: TripUpdate) -> Result<(), LookupError> {
        let stop = catalog
            .stop(update.stop.as_str())
            .ok_or_else(|| LookupError::UnknownStop(update.stop.to_string()))?;

        self.stations
            .entry(stop.station.clone())
            .or_default()
            .insert(update.clone());
        self.stops.entry(stop.id.clone()).or_default().insert(update);

        Ok(())
    }

    /// Drop every prediction on every station and platform.
    pub fn clear(&mut self) {
        self.stations.values_mut().for_each(TripList::clear);
        self.stops.values_mut().for_each(TripList::clear);
    }

    /// Drop the predictions of one station and all of its platforms.
    pub fn clear_station(&mut self, station: &Station) {
        if let Some(list) = self.stations.get_mut(&station.id) {
            list.clear();
        }
        for stop in station.stops() {
            if let Some(list) = self.stops.get_mut(stop) {
                list.clear();
            }
        }
    }

    /// Record when this set of predictions was completed.
    pub fn mark_refreshed(&mut self, at: DateTime<Utc>) {
        self.refreshed_at = Some(at);
    }

    /// When the predictions were last rebuilt, `None` if never.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Predictions at a station, sorted by time.
    pub fn station_trips(&self, station: &str) -> &[TripUpdate] {
        self.stations
            .get(station)
            .map(TripList::as_slice)
            .unwrap_or(&[])
    }

    /// Predictions at a platform, sorted by time.
    pub fn stop_trips(&self, stop: &str) -> &[TripUpdate] {
        self.stops.get(stop).map(TripList::as_slice).unwrap_or(&[])
    }

    /// Up to `n` upcoming predictions at a station with countdowns.
    pub fn upcoming_at_station(&self, station: &str, now: i64, n: usize) -> Vec<(i64, &TripUpdate)> {
        self.stations
            .get(station)
            .map(|list| list.upcoming(now, n))
            .unwrap_or_default()
    }

    /// Up to `n` upcoming predictions at a platform with countdowns.
    pub fn upcoming_at_stop(&self, stop: &str, now: i64, n: usize) -> Vec<(i64, &TripUpdate)> {
        self.stops
            .get(stop)
            .map(|list| list.upcoming(now, n))
            .unwrap_or_default()
    }

    /// Total predictions across all stations.
    pub fn len(&self) -> usize {
        self.stations.values().map(TripList::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A trip update with its names and colors resolved for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripUpdateView {
    pub route_id: String,
    pub route_name: String,
    pub route_color: RouteColor,
    pub route_text_color: RouteColor,
    pub stop_id: String,
    pub stop_name: String,
    pub destination_id: String,
    pub destination_name: String,
    pub predicted_time: i64,
}

impl TripUpdateView {
    /// Resolve a trip update against the catalog.
    ///
    /// Unknown routes and stops fall back to their raw ids and the default
    /// route colors; a destination outside the catalog is common (the trip's
    /// last stop can be a platform the reference data lacks).
    pub fn resolve(update: &TripUpdate, catalog: &Catalog) -> Self {
        let route = catalog.route(update.route.as_str());
        let stop_name = |id: &StopId| {
            catalog
                .stop(id.as_str())
                .map(|stop| stop.name.clone())
                .unwrap_or_else(|| id.to_string())
        };

        Self {
            route_id: update.route.to_string(),
            route_name: route
                .map(|r| r.short_name.clone())
                .unwrap_or_else(|| update.route.to_string()),
            route_color: route.map_or(RouteColor::BLACK, |r| r.color),
            route_text_color: route.map_or(RouteColor::WHITE, |r| r.text_color),
            stop_id: update.stop.to_string(),
            stop_name: stop_name(&update.stop),
            destination_id: update.destination.to_string(),
            destination_name: stop_name(&update.destination),
            predicted_time: update.predicted_time,
        }
    }
}

/// One row of an arrival board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrival {
    /// Seconds until the predicted time, never negative.
    pub countdown_secs: i64,
    pub trip: TripUpdateView,
}

impl Arrival {
    pub fn new(countdown_secs: i64, update: &TripUpdate, catalog: &Catalog) -> Self {
        Self {
            countdown_secs,
            trip: TripUpdateView::resolve(update, catalog),
        }
    }

    /// Whole minutes until arrival, rounded down.
    pub fn eta_minutes(&self) -> i64 {
        self.countdown_secs / 60
    }

    /// Short label such as "4m".
    pub fn eta_label(&self) -> String {
        format!("{}m", self.eta_minutes())
    }
}
