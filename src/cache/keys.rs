use crate::domain::geo::Coordinates;

/// Coordinates rounded to five decimal places (about 1.1 m), e.g. `12.97160,77.59460`.
pub fn coordinate_key(point: Coordinates) -> String {
    format!("{:.5},{:.5}", point.lat, point.lon)
}

/// Case- and whitespace-insensitive key for a free-text place name.
pub fn search_key(name: &str) -> String {
    name.trim().to_lowercase()
}
