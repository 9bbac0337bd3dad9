//! Raw rows of the static reference tables.
//!
//! Column names follow the GTFS `stops.txt` and `routes.txt` reference.
//! Columns we do not use (coordinates, URLs, sort orders) are ignored.

use serde::Deserialize;

/// What kind of location a `stops.txt` row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationType {
    /// A platform (`0` or empty).
    Platform,
    /// A parent station (`1`).
    Station,
    /// Entrances, generic nodes and boarding areas (`2`-`4`).
    Other(u8),
}

impl From<Option<u8>> for LocationType {
    fn from(value: Option<u8>) -> Self {
        match value {
            None | Some(0) => LocationType::Platform,
            Some(1) => LocationType::Station,
            Some(other) => LocationType::Other(other),
        }
    }
}

/// One row of `stops.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StopRow {
    pub stop_id: String,
    #[serde(default)]
    pub stop_name: String,
    #[serde(default)]
    pub location_type: Option<u8>,
    #[serde(default)]
    pub parent_station: Option<String>,
}

impl StopRow {
    /// A parent station row.
    pub fn station(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            stop_id: id.into(),
            stop_name: name.into(),
            location_type: Some(1),
            parent_station: None,
        }
    }

    /// A platform row belonging to `parent`.
    pub fn platform(
        id: impl Into<String>,
        name: impl Into<String>,
        parent: impl Into<String>,
    ) -> Self {
        Self {
            stop_id: id.into(),
            stop_name: name.into(),
            location_type: Some(0),
            parent_station: Some(parent.into()),
        }
    }

    pub fn location_type(&self) -> LocationType {
        LocationType::from(self.location_type)
    }

    /// The parent station id, if the row names one.
    pub fn parent(&self) -> Option<&str> {
        self.parent_station
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// One row of `routes.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteRow {
    pub route_id: String,
    #[serde(default)]
    pub route_short_name: Option<String>,
    #[serde(default)]
    pub route_long_name: Option<String>,
    #[serde(default)]
    pub route_color: Option<String>,
    #[serde(default)]
    pub route_text_color: Option<String>,
}

impl RouteRow {
    pub fn new(id: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            route_id: id.into(),
            route_short_name: Some(short_name.into()),
            route_long_name: None,
            route_color: None,
            route_text_color: None,
        }
    }

    pub fn with_colors(mut self, color: &str, text_color: &str) -> Self {
        self.route_color = Some(color.to_string());
        self.route_text_color = Some(text_color.to_string());
        self
    }

    /// Name to display: short name, else long name, else the id.
    pub fn display_name(&self) -> &str {
        [&self.route_short_name, &self.route_long_name]
            .into_iter()
            .flatten()
            .map(|name| name.trim())
            .find(|name| !name.is_empty())
            .unwrap_or(&self.route_id)
    }
}
