//! Merging decoded feed messages into the arrivals model.
//!
//! Each trip update in a feed becomes one `TripUpdate` per stop time update,
//! all sharing the trip's route and destination (the stop of its last stop
//! time update). Merging never fails: anything that cannot be placed is
//! counted in the returned [`MergeReport`] and skipped.

use std::ops::AddAssign;

use gtfs_realtime::trip_descriptor::ScheduleRelationship;
use gtfs_realtime::trip_update::StopTimeUpdate;
use gtfs_realtime::{FeedMessage, TripDescriptor};
use tracing::debug;

use crate::arrivals::Arrivals;
use crate::catalog::Catalog;
use crate::domain::{RouteId, StopId, TripUpdate};

/// What happened to the contents of one or more feeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Predictions inserted into a platform and its station.
    pub inserted: usize,
    /// Predictions whose stop id is missing from the catalog (or the feed).
    pub unknown_stops: usize,
    /// Predictions with neither an arrival nor a departure time.
    pub untimed: usize,
    /// Trips skipped because they were canceled or deleted.
    pub canceled_trips: usize,
    /// Trips skipped because they had no stop time updates, or their last
    /// one names no stop to use as the destination.
    pub empty_trips: usize,
}

impl AddAssign for MergeReport {
    fn add_assign(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.unknown_stops += other.unknown_stops;
        self.untimed += other.untimed;
        self.canceled_trips += other.canceled_trips;
        self.empty_trips += other.empty_trips;
    }
}

/// Merge every trip update of one feed message into `arrivals`.
///
/// Does not clear anything first; merging several feeds into the same
/// `Arrivals` accumulates them.
pub fn merge_feed(
    catalog: &Catalog,
    arrivals: &mut Arrivals,
    message: &FeedMessage,
) -> MergeReport {
    let mut report = MergeReport::default();

    for entity in &message.entity {
        if let Some(trip_update) = &entity.trip_update {
            report += merge_trip(
                catalog,
                arrivals,
                &trip_update.trip,
                &trip_update.stop_time_update,
            );
        }
    }

    report
}

fn merge_trip(
    catalog: &Catalog,
    arrivals: &mut Arrivals,
    trip: &TripDescriptor,
    stop_times: &[StopTimeUpdate],
) -> MergeReport {
    let mut report = MergeReport::default();

    if is_canceled(trip) {
        debug!(trip_id = ?trip.trip_id, "skipping canceled trip");
        report.canceled_trips += 1;
        return report;
    }

    // The destination is the stop of the last update
    let Some(destination) = stop_times.last().and_then(|s| s.stop_id.as_deref()) else {
        debug!(trip_id = ?trip.trip_id, "trip has no destination stop");
        report.empty_trips += 1;
        return report;
    };
    let destination = StopId::new(destination);
    let route = RouteId::new(trip.route_id.as_deref().unwrap_or_default());

    for stop_time in stop_times {
        let Some(stop_id) = stop_time.stop_id.as_deref() else {
            report.unknown_stops += 1;
            continue;
        };

        let Some(predicted_time) = predicted_time(stop_time) else {
            debug!(%stop_id, trip_id = ?trip.trip_id, "stop time update has no time");
            report.untimed += 1;
            continue;
        };

        let update = TripUpdate::new(
            route.clone(),
            StopId::new(stop_id),
            destination.clone(),
            predicted_time,
        );

        match arrivals.insert(catalog, update) {
            Ok(()) => report.inserted += 1,
            Err(e) => {
                debug!(%stop_id, error = %e, "dropping prediction for stop missing from catalog");
                report.unknown_stops += 1;
            }
        }
    }

    report
}

/// Canceled and deleted trips contribute no predictions.
fn is_canceled(trip: &TripDescriptor) -> bool {
    trip.schedule_relationship.is_some_and(|r| {
        r == ScheduleRelationship::Canceled as i32 || r == ScheduleRelationship::Deleted as i32
    })
}

/// Arrival time, falling back to departure time.
fn predicted_time(stop_time: &StopTimeUpdate) -> Option<i64> {
    let arrival = stop_time.arrival.as_ref().and_then(|event| event.time);
    let departure = stop_time.departure.as_ref().and_then(|event| event.time);
    arrival.or(departure)
}
