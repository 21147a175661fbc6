use crate::gps::{GpsPolyLine, LonLat};

/// WKT representation of a polyline, in lon/lat order.
pub fn wkt_linestring(line: &GpsPolyLine) -> String {
    let pts: Vec<String> = line
        .points()
        .iter()
        .map(|pt| format!("{} {}", pt.lon, pt.lat))
        .collect();
    format!("LINESTRING({})", pts.join(","))
}

/// WKT representation of a point, in lon/lat order.
pub fn wkt_point(pt: LonLat) -> String {
    format!("POINT({} {})", pt.lon, pt.lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linestring_format() {
        let line = GpsPolyLine::new(vec![LonLat::new(37.5, 55.5), LonLat::new(37.6, 55.6)]);
        assert_eq!(wkt_linestring(&line), "LINESTRING(37.5 55.5,37.6 55.6)");
    }
}
