//! Static catalog of stations, platforms and routes.
//!
//! Built once at startup from the agency's `stops.txt` and `routes.txt` and
//! shared read-only for the life of the process. Besides the three id maps it
//! keeps a station name → id index, the only name-based lookup (platform
//! names repeat across a station, so platforms are looked up by id only).

mod error;
mod loader;
mod rows;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::domain::{LookupError, Route, RouteId, Station, StationId, Stop, StopId};

pub use error::CatalogError;
pub use loader::{ROUTES_FILE, STOPS_FILE, read_table, read_tables};
pub use rows::{LocationType, RouteRow, StopRow};

/// Stations, stops and routes keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    stations: HashMap<StationId, Station>,
    stops: HashMap<StopId, Stop>,
    routes: HashMap<RouteId, Route>,
    station_ids_by_name: HashMap<String, StationId>,
}

impl Catalog {
    /// Load the catalog from a directory holding `stops.txt` and `routes.txt`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let (stops, routes) = read_tables(dir)?;
        let catalog = Self::from_rows(stops, routes)?;

        info!(
            dir = %dir.display(),
            stations = catalog.stations.len(),
            stops = catalog.stops.len(),
            routes = catalog.routes.len(),
            "loaded static catalog"
        );

        Ok(catalog)
    }

    /// Build the catalog from already-parsed rows.
    ///
    /// Station rows are processed before platform rows, so row order in the
    /// stops table does not matter. A platform with a blank parent becomes a
    /// one-platform station of its own.
    pub fn from_rows(
        stop_rows: impl IntoIterator<Item = StopRow>,
        route_rows: impl IntoIterator<Item = RouteRow>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Catalog::default();

        let mut platforms = Vec::new();
        for row in stop_rows {
            match row.location_type() {
                LocationType::Station => {
                    let station = Station::new(StationId::new(&row.stop_id), row.stop_name);
                    catalog.add_station(station)?;
                }
                LocationType::Platform => platforms.push(row),
                LocationType::Other(kind) => {
                    debug!(stop_id = %row.stop_id, location_type = kind, "ignoring non-platform location");
                }
            }
        }

        for row in platforms {
            let stop_id = StopId::new(&row.stop_id);

            let station_id = match row.parent() {
                Some(parent) => {
                    let station = catalog.stations.get_mut(parent).ok_or_else(|| {
                        CatalogError::UnknownParent {
                            stop: row.stop_id.clone(),
                            parent: parent.to_string(),
                        }
                    })?;
                    station.add_stop(stop_id.clone());
                    station.id.clone()
                }
                None => {
                    let mut station = Station::new(StationId::new(&row.stop_id), &row.stop_name);
                    station.add_stop(stop_id.clone());
                    let id = station.id.clone();
                    catalog.add_station(station)?;
                    id
                }
            };

            match catalog.stops.entry(stop_id) {
                Entry::Occupied(entry) => {
                    return Err(CatalogError::DuplicateId {
                        kind: "stop",
                        id: entry.key().to_string(),
                    });
                }
                Entry::Vacant(entry) => {
                    let stop = Stop::new(entry.key().clone(), row.stop_name, station_id);
                    entry.insert(stop);
                }
            }
        }

        for row in route_rows {
            let route = Route::new(
                RouteId::new(&row.route_id),
                row.display_name(),
                row.route_color.as_deref(),
                row.route_text_color.as_deref(),
            );

            match catalog.routes.entry(route.id.clone()) {
                Entry::Occupied(entry) => {
                    return Err(CatalogError::DuplicateId {
                        kind: "route",
                        id: entry.key().to_string(),
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(route);
                }
            }
        }

        Ok(catalog)
    }

    fn add_station(&mut self, station: Station) -> Result<(), CatalogError> {
        if self.stations.contains_key(&station.id) {
            return Err(CatalogError::DuplicateId {
                kind: "station",
                id: station.id.to_string(),
            });
        }

        match self.station_ids_by_name.entry(station.name.clone()) {
            Entry::Occupied(entry) => {
                warn!(
                    name = %station.name,
                    kept = %entry.get(),
                    ignored = %station.id,
                    "duplicate station name; only the first is reachable by name"
                );
            }
            Entry::Vacant(entry) => {
                entry.insert(station.id.clone());
            }
        }

        self.stations.insert(station.id.clone(), station);
        Ok(())
    }

    /// Look up a station by id.
    pub fn station(&self, id: &str) -> Option<&Station> {
        self.stations.get(id)
    }

    /// Look up a platform by id.
    pub fn stop(&self, id: &str) -> Option<&Stop> {
        self.stops.get(id)
    }

    /// Look up a route by id.
    pub fn route(&self, id: &str) -> Option<&Route> {
        self.routes.get(id)
    }

    /// Resolve a station display name to its id.
    pub fn station_id(&self, name: &str) -> Result<&StationId, LookupError> {
        self.station_ids_by_name
            .get(name)
            .ok_or_else(|| LookupError::UnknownStationName(name.to_string()))
    }

    /// Every station display name reachable through [`Catalog::station_id`], sorted.
    pub fn station_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.station_ids_by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }
}
