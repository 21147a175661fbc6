//! Geometry kernel for the network construction pipeline. Everything is
//! hand-rolled over two coordinate spaces: `LonLat` (EPSG:4326) for anything
//! whose length must agree with OSM consumers, and `Pt2D` (EPSG:3857 metres)
//! for offsetting, cutting and angle arithmetic.

mod gps;
mod polyline;
mod pt;
mod wkt;

pub use crate::gps::{GpsPolyLine, LonLat};
pub use crate::polyline::{angle_between_lines, line_intersection, PolyLine};
pub use crate::pt::Pt2D;
pub use crate::wkt::{wkt_linestring, wkt_point};

/// Great-circle earth radius, in meters. The odd value is deliberate; lengths
/// downstream are only stable if every consumer agrees on it.
pub const EARTH_RADIUS_M: f64 = 6_370_986.884258304;

/// Web-Mercator half-circumference used by the EPSG:3857 projection.
pub const MERCATOR_SCALE: f64 = 20_037_508.34;

/// Offsets smaller than this are treated as "no offset at all".
pub const EPSILON_OFFSET: f64 = 1e-2;
