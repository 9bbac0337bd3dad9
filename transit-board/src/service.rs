//! The query service: throttled refresh cycles plus arrival boards.
//!
//! A refresh cycle fetches every feed, then clears the working model, merges
//! all feeds into it and publishes a copy as the new snapshot. Cycles are
//! serialized by the working model's mutex. Queries only ever read a
//! published snapshot, so they never see a half-cleared model and can run
//! concurrently with a refresh.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::arrivals::{Arrival, Arrivals};
use crate::catalog::Catalog;
use crate::domain::{LookupError, StationId};
use crate::feed::{FeedError, FeedSource, MergeReport, merge_feed};
use crate::refresh::RefreshThrottle;

/// Number of arrivals returned when the caller doesn't say.
pub const DEFAULT_ARRIVAL_COUNT: usize = 3;

/// Upcoming arrivals at one station or platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Station or platform id
    pub id: String,
    /// Station or platform name
    pub name: String,
    /// When the snapshot the board was read from was built
    pub refreshed_at: Option<DateTime<Utc>>,
    pub arrivals: Vec<Arrival>,
}

/// Shared catalog, feed source and arrival snapshot.
pub struct TransitService<S> {
    catalog: Arc<Catalog>,
    source: S,
    throttle: Mutex<RefreshThrottle>,
    working: AsyncMutex<Arrivals>,
    snapshot: RwLock<Arc<Arrivals>>,
}

impl<S: FeedSource> TransitService<S> {
    /// Create a service with an empty snapshot; the first query refreshes.
    pub fn new(catalog: Arc<Catalog>, source: S, refresh_interval: Duration) -> Self {
        Self {
            catalog,
            source,
            throttle: Mutex::new(RefreshThrottle::new(refresh_interval)),
            working: AsyncMutex::new(Arrivals::new()),
            snapshot: RwLock::new(Arc::new(Arrivals::new())),
        }
    }

    /// Every station name, sorted.
    pub fn station_names(&self) -> Vec<String> {
        self.catalog
            .station_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Look up a station id by its display name.
    pub fn station_id(&self, name: &str) -> Result<&StationId, LookupError> {
        self.catalog.station_id(name)
    }

    /// The most recently published arrivals.
    pub async fn snapshot(&self) -> Arc<Arrivals> {
        self.snapshot.read().await.clone()
    }

    /// Run a refresh cycle if the throttle allows one.
    ///
    /// The throttle is checked against the monotonic clock; `now` only stamps
    /// the published snapshot. Returns `Ok(None)` when throttled.
    pub async fn refresh_if_due(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<MergeReport>, FeedError> {
        let due = self
            .throttle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_begin(Instant::now());

        if !due {
            return Ok(None);
        }

        self.refresh(now).await.map(Some)
    }

    /// Run a refresh cycle unconditionally and restart the throttle interval.
    ///
    /// Queries arriving within an interval of this call read its snapshot
    /// instead of fetching again.
    pub async fn refresh_scheduled(&self, now: DateTime<Utc>) -> Result<MergeReport, FeedError> {
        self.throttle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(Instant::now());

        self.refresh(now).await
    }

    /// Run a refresh cycle now, ignoring the throttle.
    ///
    /// On error nothing is published and the previous snapshot stays.
    pub async fn refresh(&self, now: DateTime<Utc>) -> Result<MergeReport, FeedError> {
        let mut working = self.working.lock().await;

        let messages = self.source.fetch_all().await?;

        working.clear();
        let mut report = MergeReport::default();
        for message in &messages {
            report += merge_feed(&self.catalog, &mut working, message);
        }
        working.mark_refreshed(now);

        *self.snapshot.write().await = Arc::new(working.clone());

        info!(
            feeds = messages.len(),
            inserted = report.inserted,
            unknown_stops = report.unknown_stops,
            canceled_trips = report.canceled_trips,
            empty_trips = report.empty_trips,
            untimed = report.untimed,
            "refreshed arrivals"
        );

        Ok(report)
    }

    /// Refresh if due; failures are logged and the old snapshot is served.
    async fn refresh_for_query(&self, now: DateTime<Utc>) {
        if let Err(e) = self.refresh_if_due(now).await {
            error!(error = %e, "refresh failed; serving previous arrivals");
        }
    }

    /// Up to `n` upcoming arrivals at a station, by id.
    pub async fn upcoming_by_id(
        &self,
        station_id: &str,
        n: usize,
        now: DateTime<Utc>,
    ) -> Result<Board, LookupError> {
        let station = self
            .catalog
            .station(station_id)
            .ok_or_else(|| LookupError::UnknownStation(station_id.to_string()))?;

        self.refresh_for_query(now).await;

        let snapshot = self.snapshot().await;
        let arrivals = snapshot
            .upcoming_at_station(station.id.as_str(), now.timestamp(), n)
            .into_iter()
            .map(|(countdown, update)| Arrival::new(countdown, update, &self.catalog))
            .collect();

        Ok(Board {
            id: station.id.to_string(),
            name: station.name.clone(),
            refreshed_at: snapshot.refreshed_at(),
            arrivals,
        })
    }

    /// Up to `n` upcoming arrivals at a station, by display name.
    pub async fn upcoming_by_name(
        &self,
        name: &str,
        n: usize,
        now: DateTime<Utc>,
    ) -> Result<Board, LookupError> {
        let station_id = self.catalog.station_id(name)?;
        self.upcoming_by_id(station_id.as_str(), n, now).await
    }

    /// Up to `n` upcoming arrivals at one platform.
    pub async fn upcoming_at_stop(
        &self,
        stop_id: &str,
        n: usize,
        now: DateTime<Utc>,
    ) -> Result<Board, LookupError> {
        let stop = self
            .catalog
            .stop(stop_id)
            .ok_or_else(|| LookupError::UnknownStop(stop_id.to_string()))?;

        self.refresh_for_query(now).await;

        let snapshot = self.snapshot().await;
        let arrivals = snapshot
            .upcoming_at_stop(stop.id.as_str(), now.timestamp(), n)
            .into_iter()
            .map(|(countdown, update)| Arrival::new(countdown, update, &self.catalog))
            .collect();

        Ok(Board {
            id: stop.id.to_string(),
            name: stop.name.clone(),
            refreshed_at: snapshot.refreshed_at(),
            arrivals,
        })
    }
}

/// Periodically refresh in the background so queries find a warm snapshot.
///
/// Every tick refreshes and restarts the query throttle, so queries between
/// ticks never fetch. Runs until the task is dropped.
pub async fn run_background_refresh<S: FeedSource>(
    service: Arc<TransitService<S>>,
    every: Duration,
) {
    let mut interval = tokio::time::interval(every.max(Duration::from_secs(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        match service.refresh_scheduled(Utc::now()).await {
            Ok(report) => info!(inserted = report.inserted, "background refresh complete"),
            Err(e) => warn!(error = %e, "background refresh failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{RouteRow, StopRow};
    use crate::feed::{FeedMessage, MockFeedSource};
    use gtfs_realtime::trip_update::{StopTimeEvent, StopTimeUpdate};
    use gtfs_realtime::{FeedEntity, TripDescriptor, TripUpdate as FeedTripUpdate};

    const INTERVAL: Duration = Duration::from_secs(60);

    fn catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::from_rows(
                vec![
                    StopRow::station("S1", "51 St"),
                    StopRow::platform("P1", "51 St platform A", "S1"),
                    StopRow::platform("P1S", "51 St platform B", "S1"),
                    StopRow::station("S2", "Grand Central-42 St"),
                    StopRow::platform("P2", "Grand Central-42 St", "S2"),
                ],
                vec![RouteRow::new("R1", "6").with_colors("00933C", "FFFFFF")],
            )
            .unwrap(),
        )
    }

    fn feed(trips: &[&[(&str, i64)]]) -> FeedMessage {
        let entity = trips
            .iter()
            .enumerate()
            .map(|(i, stops)| FeedEntity {
                id: i.to_string(),
                trip_update: Some(FeedTripUpdate {
                    trip: TripDescriptor {
                        route_id: Some("R1".to_string()),
                        ..Default::default()
                    },
                    stop_time_update: stops
                        .iter()
                        .map(|(stop, time)| StopTimeUpdate {
                            stop_id: Some(stop.to_string()),
                            arrival: Some(StopTimeEvent {
                                time: Some(*time),
                                ..Default::default()
                            }),
                            ..Default::default()
                        })
                        .collect(),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .collect();

        FeedMessage {
            entity,
            ..Default::default()
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn times(board: &Board) -> Vec<(i64, i64)> {
        board
            .arrivals
            .iter()
            .map(|a| (a.countdown_secs, a.trip.predicted_time))
            .collect()
    }

    #[tokio::test]
    async fn throttled_query_reuses_first_cycle() {
        let mock = MockFeedSource::new(vec![feed(&[&[("P1", 1_100), ("P2", 1_400)]])]);
        let service = TransitService::new(catalog(), mock.clone(), INTERVAL);

        let first = service.upcoming_by_id("S1", 3, at(1_000)).await.unwrap();
        assert_eq!(mock.fetch_count(), 1);

        mock.set_messages(vec![feed(&[&[("P1", 1_200)]])]).await;
        let second = service.upcoming_by_id("S1", 3, at(1_010)).await.unwrap();

        assert_eq!(mock.fetch_count(), 1);
        assert_eq!(times(&first), vec![(100, 1_100)]);
        assert_eq!(times(&second), vec![(90, 1_100)]);
        assert_eq!(second.refreshed_at, Some(at(1_000)));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_after_interval_replaces_everything() {
        let mock = MockFeedSource::new(vec![feed(&[&[("P1", 1_100)]])]);
        let service = TransitService::new(catalog(), mock.clone(), INTERVAL);
        service.upcoming_by_id("S1", 3, at(1_000)).await.unwrap();

        tokio::time::advance(INTERVAL).await;
        mock.set_messages(vec![feed(&[&[("P1S", 1_300)]])]).await;
        let board = service.upcoming_by_id("S1", 3, at(1_060)).await.unwrap();

        assert_eq!(mock.fetch_count(), 2);
        assert_eq!(times(&board), vec![(240, 1_300)]);
        assert!(service.snapshot().await.stop_trips("P1").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_previous_snapshot() {
        let mock = MockFeedSource::new(vec![feed(&[&[("P1", 1_100)]])]);
        let service = TransitService::new(catalog(), mock.clone(), INTERVAL);
        service.upcoming_by_id("S1", 3, at(1_000)).await.unwrap();

        tokio::time::advance(INTERVAL).await;
        mock.fail_with_status(Some(503)).await;
        let board = service.upcoming_by_id("S1", 3, at(1_100)).await.unwrap();

        assert_eq!(mock.fetch_count(), 2);
        assert_eq!(times(&board), vec![(0, 1_100)]);
        assert_eq!(board.refreshed_at, Some(at(1_000)));
    }

    #[tokio::test(start_paused = true)]
    async fn wall_clock_going_backwards_does_not_stall_refresh() {
        let mock = MockFeedSource::new(vec![feed(&[&[("P1", 1_100)]])]);
        let service = TransitService::new(catalog(), mock.clone(), INTERVAL);
        service.upcoming_by_id("S1", 3, at(1_000)).await.unwrap();

        tokio::time::advance(INTERVAL).await;
        let board = service.upcoming_by_id("S1", 3, at(500)).await.unwrap();

        assert_eq!(mock.fetch_count(), 2);
        assert_eq!(board.refreshed_at, Some(at(500)));
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_queries_share_one_refresh() {
        let mock = MockFeedSource::new(vec![feed(&[&[("P1", 1_100)]])]);
        let service = TransitService::new(catalog(), mock.clone(), INTERVAL);
        service.upcoming_by_id("S1", 3, at(1_000)).await.unwrap();

        tokio::time::advance(INTERVAL).await;
        mock.set_messages(vec![feed(&[&[("P1", 1_200)]])]).await;
        mock.set_delay(Some(Duration::from_secs(5))).await;

        let start = Instant::now();
        let service = &service;
        let query = || async move {
            let board = service.upcoming_by_id("S1", 3, at(1_060)).await.unwrap();
            (start.elapsed(), times(&board))
        };
        let (a, b) = tokio::join!(query(), query());
        let mut results = vec![a, b];
        results.sort();

        // One caller waits on the slow fetch, the other reads the old snapshot
        assert_eq!(mock.fetch_count(), 2);
        assert_eq!(
            results,
            vec![
                (Duration::ZERO, vec![(40, 1_100)]),
                (Duration::from_secs(5), vec![(140, 1_200)]),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn background_refresh_runs_every_interval() {
        let mock = MockFeedSource::new(vec![feed(&[&[("P1", 1_100)]])]);
        let service = Arc::new(TransitService::new(catalog(), mock.clone(), INTERVAL));

        let task = tokio::spawn(run_background_refresh(Arc::clone(&service), INTERVAL));
        tokio::time::sleep(INTERVAL * 3 + Duration::from_secs(1)).await;

        // Ticks at 0, 60, 120 and 180 seconds
        assert_eq!(mock.fetch_count(), 4);

        service.upcoming_by_id("S1", 3, at(1_000)).await.unwrap();
        assert_eq!(mock.fetch_count(), 4);

        task.abort();
    }

    #[tokio::test]
    async fn direct_refresh_reports_errors() {
        let mock = MockFeedSource::default();
        mock.fail_with_status(Some(500)).await;
        let service = TransitService::new(catalog(), mock, INTERVAL);

        assert!(matches!(
            service.refresh(at(0)).await,
            Err(FeedError::Api { status: 500, .. })
        ));
        assert!(service.snapshot().await.refreshed_at().is_none());
    }

    #[tokio::test]
    async fn feeds_are_merged_cumulatively() {
        let mock = MockFeedSource::new(vec![
            feed(&[&[("P1", 1_300)]]),
            feed(&[&[("P1S", 1_100)], &[("P1", 1_200)]]),
        ]);
        let service = TransitService::new(catalog(), mock, INTERVAL);

        let report = service.refresh(at(1_000)).await.unwrap();
        assert_eq!(report.inserted, 3);

        let board = service.upcoming_by_id("S1", 5, at(1_000)).await.unwrap();
        assert_eq!(
            times(&board),
            vec![(100, 1_100), (200, 1_200), (300, 1_300)]
        );
    }

    #[tokio::test]
    async fn lookup_by_name() {
        let mock = MockFeedSource::new(vec![feed(&[&[("P1", 1_100), ("P2", 1_400)]])]);
        let service = TransitService::new(catalog(), mock, INTERVAL);

        let board = service.upcoming_by_name("51 St", 1, at(1_000)).await.unwrap();
        assert_eq!(board.id, "S1");
        assert_eq!(board.name, "51 St");

        let arrival = &board.arrivals[0];
        assert_eq!(arrival.trip.route_name, "6");
        assert_eq!(arrival.trip.route_color.to_string(), "00933C");
        assert_eq!(arrival.trip.destination_name, "Grand Central-42 St");
        assert_eq!(arrival.eta_label(), "1m");
    }

    #[tokio::test]
    async fn unknown_station_is_a_lookup_error() {
        let mock = MockFeedSource::default();
        let service = TransitService::new(catalog(), mock.clone(), INTERVAL);

        assert_eq!(
            service.upcoming_by_name("Nowhere", 3, at(0)).await,
            Err(LookupError::UnknownStationName("Nowhere".into()))
        );
        assert_eq!(
            service.upcoming_by_id("S9", 3, at(0)).await,
            Err(LookupError::UnknownStation("S9".into()))
        );
        assert_eq!(
            service.upcoming_at_stop("P9", 3, at(0)).await,
            Err(LookupError::UnknownStop("P9".into()))
        );
        assert_eq!(mock.fetch_count(), 0);
    }

    #[tokio::test]
    async fn per_platform_board() {
        let mock = MockFeedSource::new(vec![feed(&[&[("P1", 1_100)], &[("P1S", 1_050)]])]);
        let service = TransitService::new(catalog(), mock, INTERVAL);

        let board = service.upcoming_at_stop("P1S", 3, at(1_000)).await.unwrap();

        assert_eq!(board.name, "51 St platform B");
        assert_eq!(times(&board), vec![(50, 1_050)]);
    }

    #[tokio::test]
    async fn grace_window_keeps_recent_departures() {
        let mock = MockFeedSource::new(vec![feed(&[&[("P1", 100)], &[("P1", 200)], &[("P1", 300)]])]);
        let service = TransitService::new(catalog(), mock, INTERVAL);

        let board = service.upcoming_by_id("S1", 2, at(250)).await.unwrap();

        assert_eq!(times(&board), vec![(0, 200), (50, 300)]);
    }

    #[test]
    fn station_names_are_sorted() {
        let service = TransitService::new(catalog(), MockFeedSource::default(), INTERVAL);

        assert_eq!(service.station_names(), vec!["51 St", "Grand Central-42 St"]);
        assert_eq!(service.station_id("51 St").unwrap().as_str(), "S1");
    }
}
