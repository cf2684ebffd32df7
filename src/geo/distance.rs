/// Mean Earth radius used by the spherical model.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two points given in degrees.
///
/// Spherical Earth, so expect errors up to ~0.5% against an ellipsoid. Good
/// enough to decide whether a device moved more than a few meters.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();
    EARTH_RADIUS_M * c
}
