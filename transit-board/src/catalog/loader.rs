//! Reads the reference tables from a local cache directory.

use std::path::Path;

use serde::de::DeserializeOwned;

use super::error::CatalogError;
use super::rows::{RouteRow, StopRow};

/// Stops table file name.
pub const STOPS_FILE: &str = "stops.txt";

/// Routes table file name.
pub const ROUTES_FILE: &str = "routes.txt";

/// Read `stops.txt` and `routes.txt` from `dir`.
pub fn read_tables(dir: &Path) -> Result<(Vec<StopRow>, Vec<RouteRow>), CatalogError> {
    let stops = read_table(&dir.join(STOPS_FILE))?;
    let routes = read_table(&dir.join(ROUTES_FILE))?;
    Ok((stops, routes))
}

/// Deserialize every row of a headered CSV file.
pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CatalogError> {
    let to_error = |source| CatalogError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(to_error)?;

    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(to_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_gtfs_columns() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(STOPS_FILE),
            "stop_id,stop_name,stop_lat,stop_lon,location_type,parent_station\n\
             630,51 St,40.757107,-73.97192,1,\n\
             630N,51 St,40.757107,-73.97192,,630\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(ROUTES_FILE),
            "agency_id,route_id,route_short_name,route_long_name,route_type,route_color,route_text_color\n\
             MTA NYCT,6,6,Lexington Avenue Local,1,00933C,\n",
        )
        .unwrap();

        let (stops, routes) = read_tables(dir.path()).unwrap();

        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0], StopRow::station("630", "51 St"));
        assert_eq!(stops[1].location_type, None);
        assert_eq!(stops[1].parent(), Some("630"));

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].display_name(), "6");
        assert_eq!(routes[0].route_color.as_deref(), Some("00933C"));
        assert_eq!(routes[0].route_text_color, None);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = read_tables(dir.path()).unwrap_err();

        assert!(matches!(err, CatalogError::Csv { .. }));
        assert!(err.to_string().contains(STOPS_FILE));
    }

    #[test]
    fn malformed_row_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STOPS_FILE);
        std::fs::write(&path, "stop_id,stop_name,location_type\n630,51 St,station\n").unwrap();

        let result: Result<Vec<StopRow>, _> = read_table(&path);
        assert!(result.is_err());
    }
}
