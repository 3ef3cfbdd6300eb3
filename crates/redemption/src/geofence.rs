// Rust guideline compliant 2026-10-12

//! Circular geofence around a store position.

use domain::Coordinate;

/// Mean Earth radius used by the haversine formula, in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Default allowed redemption radius, in metres.
pub const DEFAULT_RADIUS_M: f64 = 1_000.0;

/// Result of checking a reported position against a geofence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FenceStatus {
    /// Within `radius_m` of the store (boundary included).
    InRange {
        /// Great-circle distance to the store.
        distance_m: f64,
    },
    /// Farther than `radius_m` from the store.
    OutOfRange {
        /// Great-circle distance to the store.
        distance_m: f64,
    },
    /// No position was reported, or the reported one is not usable.
    NoLocation,
}

/// Great-circle distance between two positions (haversine), in metres.
#[must_use]
pub fn distance_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let half_d_lat = (b.latitude - a.latitude).to_radians() / 2.0;
    let half_d_lng = (b.longitude - a.longitude).to_radians() / 2.0;

    let h = half_d_lat.sin().powi(2) + lat_a.cos() * lat_b.cos() * half_d_lng.sin().powi(2);
    // Rounding can push h marginally above 1 for antipodal points.
    2.0 * EARTH_RADIUS_M * h.min(1.0).sqrt().asin()
}

/// Classify `reported` against a fence of `radius_m` centred on `store`.
#[must_use]
pub fn check_fence(reported: Option<Coordinate>, store: Coordinate, radius_m: f64) -> FenceStatus {
    let Some(reported) = reported.filter(Coordinate::is_usable) else {
        return FenceStatus::NoLocation;
    };
    let distance_m = distance_m(reported, store);
    if distance_m <= radius_m {
        FenceStatus::InRange { distance_m }
    } else {
        FenceStatus::OutOfRange { distance_m }
    }
}
