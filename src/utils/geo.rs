// src/utils/geo.rs
use geo::{point, GeodesicDistance};

/// Geodesic (WGS-84 ellipsoid) distance between two coordinates, in kilometers.
pub fn geodesic_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let p1 = point!(x: lon1, y: lat1);
    let p2 = point!(x: lon2, y: lat2);
    p1.geodesic_distance(&p2) / 1000.0
}
