use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::polyline::PolyLine;
use crate::pt::Pt2D;
use crate::{EARTH_RADIUS_M, MERCATOR_SCALE};

/// A point in spherical (EPSG:4326) space. Longitude is x, latitude is y.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> LonLat {
        LonLat { lon, lat }
    }

    /// Haversine distance in meters.
    pub fn gps_dist_meters(self, other: LonLat) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Web-Mercator projection into Euclidean meters.
    pub fn to_pt2d(self) -> Pt2D {
        let x = self.lon * MERCATOR_SCALE / 180.0;
        let y = ((90.0 + self.lat) * PI / 360.0).tan().ln() / (PI / 180.0) * MERCATOR_SCALE / 180.0;
        Pt2D::new(x, y)
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LonLat({}, {})", self.lon, self.lat)
    }
}

/// An ordered sequence of at least two spherical points. All distances are
/// haversine meters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GpsPolyLine {
    pts: Vec<LonLat>,
}

impl GpsPolyLine {
    pub fn new(pts: Vec<LonLat>) -> GpsPolyLine {
        assert!(pts.len() >= 2, "a polyline needs at least 2 points");
        GpsPolyLine { pts }
    }

    pub fn points(&self) -> &Vec<LonLat> {
        &self.pts
    }

    pub fn first_pt(&self) -> LonLat {
        self.pts[0]
    }

    pub fn last_pt(&self) -> LonLat {
        *self.pts.last().unwrap()
    }

    pub fn reversed(&self) -> GpsPolyLine {
        let mut pts = self.pts.clone();
        pts.reverse();
        GpsPolyLine::new(pts)
    }

    pub fn length_meters(&self) -> f64 {
        self.pts
            .windows(2)
            .map(|pair| pair[0].gps_dist_meters(pair[1]))
            .sum()
    }

    pub fn to_euclidean(&self) -> PolyLine {
        PolyLine::new(self.pts.iter().map(|pt| pt.to_pt2d()).collect())
    }

    /// The point at haversine distance `dist` along the line, clamped to the
    /// endpoints outside `[0, length]`. Interpolation within a segment is
    /// linear in lon/lat, which is fine at road-segment scale.
    pub fn dist_along(&self, dist: f64) -> LonLat {
        if dist <= 0.0 {
            return self.first_pt();
        }
        let mut dist_left = dist;
        for pair in self.pts.windows(2) {
            let len = pair[0].gps_dist_meters(pair[1]);
            if dist_left <= len && len > 0.0 {
                let fraction = dist_left / len;
                return LonLat::new(
                    (1.0 - fraction) * pair[0].lon + fraction * pair[1].lon,
                    (1.0 - fraction) * pair[0].lat + fraction * pair[1].lat,
                );
            }
            dist_left -= len;
        }
        self.last_pt()
    }

    /// The sub-polyline between distances `start` and `end` along the line.
    /// The first and last points are interpolated exactly; interior vertices
    /// strictly between the two distances are preserved.
    pub fn slice(&self, start: f64, end: f64) -> GpsPolyLine {
        let start = start.max(0.0);
        let end = end.min(self.length_meters());

        let mut result = vec![self.dist_along(start)];
        let mut total = 0.0;
        for pair in self.pts.windows(2) {
            total += pair[0].gps_dist_meters(pair[1]);
            if total > start && total < end {
                result.push(pair[1]);
            }
        }
        result.push(self.dist_along(end));
        GpsPolyLine::new(result)
    }

    /// `n` points at equal haversine spacing, including both endpoints.
    pub fn equidistant_points(&self, n: usize) -> Vec<LonLat> {
        assert!(n >= 2);
        let total = self.length_meters();
        let mut result = Vec::with_capacity(n);
        result.push(self.first_pt());
        for i in 1..n - 1 {
            result.push(self.dist_along(total * (i as f64) / ((n - 1) as f64)));
        }
        result.push(self.last_pt());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mercator_round_trip() {
        let pt = LonLat::new(37.6417350769043, 55.751849391735284);
        let back = pt.to_pt2d().to_lonlat();
        assert!((back.lon - pt.lon).abs() < 1e-9);
        assert!((back.lat - pt.lat).abs() < 1e-9);
    }

    #[test]
    fn haversine_reference_value() {
        let p1 = LonLat::new(37.6417350769043, 55.751849391735284);
        let p2 = LonLat::new(37.668514251708984, 55.73261980350401);
        let dist = p1.gps_dist_meters(p2);
        assert!((dist - 2716.93).abs() < 1.0, "got {}", dist);
    }

    #[test]
    fn substring_identity() {
        let line = GpsPolyLine::new(vec![
            LonLat::new(37.64, 55.75),
            LonLat::new(37.65, 55.75),
            LonLat::new(37.66, 55.76),
        ]);
        let full = line.slice(0.0, line.length_meters());
        for (a, b) in line.points().iter().zip(full.points().iter()) {
            assert!((a.lon - b.lon).abs() < 1e-6);
            assert!((a.lat - b.lat).abs() < 1e-6);
        }
    }

    #[test]
    fn substring_interpolates_endpoints() {
        let line = GpsPolyLine::new(vec![LonLat::new(37.64, 55.75), LonLat::new(37.66, 55.75)]);
        let total = line.length_meters();
        let cut = line.slice(10.0, total - 10.0);
        assert!((cut.length_meters() - (total - 20.0)).abs() < 0.01);
        assert_eq!(cut.points().len(), 2);
    }

    #[test]
    fn equidistant_points_spacing() {
        let line = GpsPolyLine::new(vec![LonLat::new(37.64, 55.75), LonLat::new(37.66, 55.75)]);
        let pts = line.equidistant_points(5);
        assert_eq!(pts.len(), 5);
        let step = pts[0].gps_dist_meters(pts[1]);
        for pair in pts.windows(2) {
            assert!((pair[0].gps_dist_meters(pair[1]) - step).abs() < 0.01);
        }
    }
}
