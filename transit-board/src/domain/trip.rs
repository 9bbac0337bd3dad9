//! Trip updates and the chronologically sorted lists that hold them.

use std::cmp::Ordering;

use super::{RouteId, StopId};

/// How far into the past a prediction stays visible, in seconds.
///
/// Trains that have just arrived or departed keep showing for a minute
/// instead of vanishing the instant their predicted time passes.
pub const GRACE_WINDOW_SECS: i64 = 60;

/// One predicted arrival of one trip at one stop.
///
/// Produced once per refresh cycle and never mutated. Names and colors are
/// resolved against the catalog when a query builds its view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripUpdate {
    /// Route the trip runs on.
    pub route: RouteId,
    /// Platform this prediction applies to.
    pub stop: StopId,
    /// Last stop of the trip, shown as the destination.
    pub destination: StopId,
    /// Predicted time, seconds since the Unix epoch.
    pub predicted_time: i64,
}

impl TripUpdate {
    pub fn new(route: RouteId, stop: StopId, destination: StopId, predicted_time: i64) -> Self {
        Self {
            route,
            stop,
            destination,
            predicted_time,
        }
    }

    /// Seconds from `now` until the predicted time, never negative.
    pub fn countdown(&self, now: i64) -> i64 {
        (self.predicted_time - now).max(0)
    }
}

/// Ordering used for every sorted trip list: predicted time only.
///
/// Updates with equal times compare equal; their relative order is
/// whatever insertion produced.
pub fn by_predicted_time(a: &TripUpdate, b: &TripUpdate) -> Ordering {
    a.predicted_time.cmp(&b.predicted_time)
}

/// A list of trip updates kept sorted ascending by predicted time.
///
/// The only way in is [`TripList::insert`], which places each update at its
/// sorted position, so the list is never re-sorted in bulk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripList(Vec<TripUpdate>);

impl TripList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert after any existing updates with the same or an earlier time.
    pub fn insert(&mut self, update: TripUpdate) {
        let idx = self
            .0
            .partition_point(|existing| by_predicted_time(existing, &update) != Ordering::Greater);
        self.0.insert(idx, update);
    }

    /// Drop every update.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[TripUpdate] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TripUpdate> {
        self.0.iter()
    }

    /// Index of the first update still inside the grace window at `now`.
    ///
    /// The boundary is `now - GRACE_WINDOW_SECS`; the first update strictly
    /// later than the boundary is eligible, one exactly at the boundary is not.
    pub fn window_start(&self, now: i64) -> usize {
        let boundary = now - GRACE_WINDOW_SECS;
        self.0.partition_point(|update| update.predicted_time <= boundary)
    }

    /// Up to `n` upcoming updates paired with their countdown in seconds.
    pub fn upcoming(&self, now: i64, n: usize) -> Vec<(i64, &TripUpdate)> {
        self.0[self.window_start(now)..]
            .iter()
            .take(n)
            .map(|update| (update.countdown(now), update))
            .collect()
    }
}

impl<'a> IntoIterator for &'a TripList {
    type Item = &'a TripUpdate;
    type IntoIter = std::slice::Iter<'a, TripUpdate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
