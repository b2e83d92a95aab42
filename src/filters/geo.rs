//! Great-circle helpers for the `near` filter

/// Mean Earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two (lat, lng) points in degrees.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lng2) = (to.0.to_radians(), to.1.to_radians());
    let d_lat = lat2 - lat1;
    let d_lng = lng2 - lng1;

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Lat/lng box enclosing the circle, as `(min_lat, max_lat, min_lng, max_lng)`.
///
/// Coarse on purpose: remote backends filter on the box, the exact distance is
/// checked afterwards.
pub fn bounding_box(lat: f64, lng: f64, radius_km: f64) -> (f64, f64, f64, f64) {
    let d_lat = (radius_km / EARTH_RADIUS_KM).to_degrees();
    let cos_lat = lat.to_radians().cos().abs().max(1e-6);
    let d_lng = (radius_km / (EARTH_RADIUS_KM * cos_lat)).to_degrees().min(180.0);

    (
        (lat - d_lat).max(-90.0),
        (lat + d_lat).min(90.0),
        (lng - d_lng).max(-180.0),
        (lng + d_lng).min(180.0),
    )
}
