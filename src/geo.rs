//! Great-circle distance and per-mode travel-time estimation.
//!
//! No road network is modeled (see spec Non-goals): travel time is a simple
//! multiplier of great-circle distance by transport mode, per the parameter
//! table in section 4.G.

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A point on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Coordinates { lat, lng }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Walking,
    Transit,
    Driving,
}

impl TransportMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "walking" => Some(TransportMode::Walking),
            "transit" => Some(TransportMode::Transit),
            "driving" => Some(TransportMode::Driving),
            _ => None,
        }
    }
}

/// Haversine great-circle distance in metres.
pub fn haversine_distance_m(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_M * c
}

/// Travel time in minutes for a great-circle distance under a given mode,
/// clamped to the mode's `[min, max]` range. Negative or zero distances
/// clamp to the mode's minimum.
pub fn travel_time_minutes(distance_m: f64, mode: TransportMode, config: &crate::config::PlannerConfig) -> f64 {
    let params = config.transport_params(mode);
    if distance_m <= 0.0 {
        return params.min_minutes;
    }
    let distance_km = distance_m / 1000.0;
    let raw = 60.0 * distance_km * params.detour_factor / params.base_speed_kmh;
    raw.clamp(params.min_minutes, params.max_minutes)
}

/// Symmetric `n x n` distance matrix (metres), zero diagonal.
pub fn distance_matrix(points: &[Coordinates]) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = haversine_distance_m(points[i], points[j]);
            matrix[i][j] = d;
            matrix[j][i] = d;
        }
    }
    matrix
}

/// Symmetric `n x n` travel-time matrix (minutes), zero diagonal.
pub fn time_matrix(
    points: &[Coordinates],
    mode: TransportMode,
    config: &crate::config::PlannerConfig,
) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = haversine_distance_m(points[i], points[j]);
            let t = travel_time_minutes(d, mode, config);
            matrix[i][j] = t;
            matrix[j][i] = t;
        }
    }
    matrix
}

/// Centroid (arithmetic mean) of a set of points. Returns `(0, 0)` for an
/// empty slice — callers at synthesis time fall back further to a global
/// centroid before this ever triggers in practice.
pub fn centroid(points: &[Coordinates]) -> Coordinates {
    if points.is_empty() {
        return Coordinates::new(0.0, 0.0);
    }
    let n = points.len() as f64;
    let (sum_lat, sum_lng) = points
        .iter()
        .fold((0.0, 0.0), |(slat, slng), p| (slat + p.lat, slng + p.lng));
    Coordinates::new(sum_lat / n, sum_lng / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;

    #[test]
    fn distance_to_self_is_zero() {
        let p = Coordinates::new(48.8566, 2.3522);
        assert_eq!(haversine_distance_m(p, p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinates::new(48.8566, 2.3522);
        let b = Coordinates::new(51.5074, -0.1278);
        assert!((haversine_distance_m(a, b) - haversine_distance_m(b, a)).abs() < 1e-6);
    }

    #[test]
    fn antipodal_equator_points_are_half_circumference() {
        let a = Coordinates::new(0.0, 0.0);
        let b = Coordinates::new(0.0, 180.0);
        let expected = std::f64::consts::PI * EARTH_RADIUS_M;
        assert!((haversine_distance_m(a, b) - expected).abs() < 1.0);
    }

    #[test]
    fn paris_to_new_york_is_roughly_right() {
        let paris = Coordinates::new(48.8566, 2.3522);
        let nyc = Coordinates::new(40.7128, -74.0060);
        let d_km = haversine_distance_m(paris, nyc) / 1000.0;
        assert!((5800.0..5900.0).contains(&d_km), "got {d_km} km");
    }

    #[test]
    fn travel_time_clamps_to_minimum_for_nonpositive_distance() {
        let config = PlannerConfig::default();
        assert_eq!(
            travel_time_minutes(0.0, TransportMode::Walking, &config),
            config.walking.min_minutes
        );
        assert_eq!(
            travel_time_minutes(-5.0, TransportMode::Driving, &config),
            config.driving.min_minutes
        );
    }

    #[test]
    fn travel_time_is_monotone_in_distance() {
        let config = PlannerConfig::default();
        let short = travel_time_minutes(500.0, TransportMode::Transit, &config);
        let long = travel_time_minutes(5000.0, TransportMode::Transit, &config);
        assert!(long >= short);
    }

    #[test]
    fn travel_time_respects_max_clamp() {
        let config = PlannerConfig::default();
        let t = travel_time_minutes(10_000_000.0, TransportMode::Driving, &config);
        assert_eq!(t, config.driving.max_minutes);
    }

    #[test]
    fn distance_matrix_has_zero_diagonal_and_is_symmetric() {
        let points = vec![
            Coordinates::new(0.0, 0.0),
            Coordinates::new(1.0, 1.0),
            Coordinates::new(2.0, -1.0),
        ];
        let m = distance_matrix(&points);
        for i in 0..3 {
            assert_eq!(m[i][i], 0.0);
        }
        assert_eq!(m[0][1], m[1][0]);
        assert_eq!(m[0][2], m[2][0]);
    }

    #[test]
    fn centroid_of_empty_is_origin() {
        assert_eq!(centroid(&[]), Coordinates::new(0.0, 0.0));
    }

    #[test]
    fn centroid_of_symmetric_points_is_midpoint() {
        let points = vec![Coordinates::new(0.0, 0.0), Coordinates::new(2.0, 4.0)];
        let c = centroid(&points);
        assert_eq!(c, Coordinates::new(1.0, 2.0));
    }

    #[test]
    fn transport_mode_parses_case_insensitively() {
        assert_eq!(TransportMode::parse("Driving"), Some(TransportMode::Driving));
        assert_eq!(TransportMode::parse("bogus"), None);
    }
}
