use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{LonLat, MERCATOR_SCALE};

/// A point in Euclidean (EPSG:3857) space. x/y are meters at the equator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pt2D {
    pub x: f64,
    pub y: f64,
}

impl Pt2D {
    pub fn new(x: f64, y: f64) -> Pt2D {
        Pt2D { x, y }
    }

    /// Exact inverse of `LonLat::to_pt2d`.
    pub fn to_lonlat(self) -> LonLat {
        let lon = self.x * 180.0 / MERCATOR_SCALE;
        let lat = (self.y * PI / MERCATOR_SCALE).exp().atan() * 360.0 / PI - 90.0;
        LonLat::new(lon, lat)
    }

    pub fn dist(self, other: Pt2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl fmt::Display for Pt2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pt2D({}, {})", self.x, self.y)
    }
}
