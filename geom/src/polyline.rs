use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::gps::GpsPolyLine;
use crate::pt::Pt2D;

/// An ordered sequence of at least two Euclidean points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolyLine {
    pts: Vec<Pt2D>,
}

impl PolyLine {
    pub fn new(pts: Vec<Pt2D>) -> PolyLine {
        assert!(pts.len() >= 2, "a polyline needs at least 2 points");
        PolyLine { pts }
    }

    pub fn points(&self) -> &Vec<Pt2D> {
        &self.pts
    }

    pub fn first_pt(&self) -> Pt2D {
        self.pts[0]
    }

    pub fn last_pt(&self) -> Pt2D {
        *self.pts.last().unwrap()
    }

    pub fn reversed(&self) -> PolyLine {
        let mut pts = self.pts.clone();
        pts.reverse();
        PolyLine::new(pts)
    }

    pub fn length(&self) -> f64 {
        self.pts.windows(2).map(|pair| pair[0].dist(pair[1])).sum()
    }

    pub fn to_gps(&self) -> GpsPolyLine {
        GpsPolyLine::new(self.pts.iter().map(|pt| pt.to_lonlat()).collect())
    }

    /// The atan2 direction of the chord from the first point to the last one.
    pub fn chord_angle(&self) -> f64 {
        let first = self.first_pt();
        let last = self.last_pt();
        (last.y - first.y).atan2(last.x - first.x)
    }

    /// A parallel polyline offset `width` meters to the right of the travel
    /// direction (negative widths go left). Each segment is translated along
    /// its right normal; consecutive offset segments are re-joined by
    /// infinite-line intersection. Parallel neighbours keep the later
    /// segment's start point. A 2-point line is just translated.
    pub fn shift_right(&self, width: f64) -> PolyLine {
        let mut segments: Vec<(Pt2D, Pt2D)> = Vec::new();
        for pair in self.pts.windows(2) {
            let (p1, p2) = (pair[0], pair[1]);
            let len = p1.dist(p2);
            if len == 0.0 {
                continue;
            }
            // Right normal of the direction vector
            let nx = (p2.y - p1.y) / len;
            let ny = -(p2.x - p1.x) / len;
            segments.push((
                Pt2D::new(p1.x + nx * width, p1.y + ny * width),
                Pt2D::new(p2.x + nx * width, p2.y + ny * width),
            ));
        }
        if segments.is_empty() {
            // Fully degenerate input; hand the caller its own points back.
            return self.clone();
        }

        let mut result = vec![segments[0].0];
        for window in segments.windows(2) {
            let (s1, s2) = (window[0], window[1]);
            match line_intersection(s1.0, s1.1, s2.0, s2.1) {
                Some(pt) => result.push(pt),
                None => result.push(s2.0),
            }
        }
        result.push(segments.last().unwrap().1);
        if result.len() < 2 {
            result.push(segments[0].1);
        }
        PolyLine::new(result)
    }
}

/// Intersection of the two infinite lines through (p1, p2) and (p3, p4).
/// `None` iff the determinant is exactly zero (the lines are parallel).
pub fn line_intersection(p1: Pt2D, p2: Pt2D, p3: Pt2D, p4: Pt2D) -> Option<Pt2D> {
    let a1 = p2.y - p1.y;
    let b1 = p1.x - p2.x;
    let c1 = a1 * p1.x + b1 * p1.y;
    let a2 = p4.y - p3.y;
    let b2 = p3.x - p4.x;
    let c2 = a2 * p3.x + b2 * p3.y;

    let det = a1 * b2 - a2 * b1;
    if det == 0.0 {
        return None;
    }
    Some(Pt2D::new(
        (b2 * c1 - b1 * c2) / det,
        (a1 * c2 - a2 * c1) / det,
    ))
}

/// Signed angle in `[-π, π]` of `b`'s chord relative to `a`'s chord.
/// Positive means `b` heads to the left of `a`.
pub fn angle_between_lines(a: &PolyLine, b: &PolyLine) -> f64 {
    let mut angle = b.chord_angle() - a.chord_angle();
    if angle < -PI {
        angle += 2.0 * PI;
    }
    if angle > PI {
        angle -= 2.0 * PI;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_simple_segment() {
        // Heading east; right is -y
        let line = PolyLine::new(vec![Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0)]);
        let shifted = line.shift_right(2.0);
        assert_eq!(shifted.points()[0], Pt2D::new(0.0, -2.0));
        assert_eq!(shifted.points()[1], Pt2D::new(10.0, -2.0));
    }

    #[test]
    fn shift_right_angle_bend() {
        let line = PolyLine::new(vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(10.0, 0.0),
            Pt2D::new(10.0, 10.0),
        ]);
        let shifted = line.shift_right(1.0);
        assert_eq!(shifted.points().len(), 3);
        assert_eq!(shifted.points()[0], Pt2D::new(0.0, -1.0));
        // The joint is the intersection of the two offset segments
        assert_eq!(shifted.points()[1], Pt2D::new(11.0, -1.0));
        assert_eq!(shifted.points()[2], Pt2D::new(11.0, 10.0));
    }

    #[test]
    fn shift_collinear_segments() {
        let line = PolyLine::new(vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(5.0, 0.0),
            Pt2D::new(10.0, 0.0),
        ]);
        let shifted = line.shift_right(1.0);
        // Parallel joint falls back to the later segment's start point
        assert_eq!(shifted.points()[1], Pt2D::new(5.0, -1.0));
    }

    #[test]
    fn parallel_lines_dont_intersect() {
        assert_eq!(
            line_intersection(
                Pt2D::new(0.0, 0.0),
                Pt2D::new(1.0, 0.0),
                Pt2D::new(0.0, 1.0),
                Pt2D::new(1.0, 1.0)
            ),
            None
        );
    }

    #[test]
    fn angle_signs() {
        let east = PolyLine::new(vec![Pt2D::new(0.0, 0.0), Pt2D::new(1.0, 0.0)]);
        let north = PolyLine::new(vec![Pt2D::new(0.0, 0.0), Pt2D::new(0.0, 1.0)]);
        let south = PolyLine::new(vec![Pt2D::new(0.0, 0.0), Pt2D::new(0.0, -1.0)]);
        assert!(angle_between_lines(&east, &north) > 0.0);
        assert!(angle_between_lines(&east, &south) < 0.0);
        assert!((angle_between_lines(&east, &east)).abs() < 1e-12);
    }
}
