use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of a node at the edge of the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryType {
    None,
    IncomeOnly,
    OutcomeOnly,
    /// A dead-end served by a bidirectional pair: traffic both enters and
    /// leaves the network here.
    IncomeOutcome,
}

impl fmt::Display for BoundaryType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            BoundaryType::None => "none",
            BoundaryType::IncomeOnly => "income_only",
            BoundaryType::OutcomeOnly => "outcome_only",
            BoundaryType::IncomeOutcome => "income_outcome",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityType {
    None,
    Poi,
    Link,
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ActivityType::None => "none",
            ActivityType::Poi => "poi",
            ActivityType::Link => "link",
        };
        write!(f, "{}", s)
    }
}

/// What a microscopic cell edge does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellType {
    Forward,
    LaneChange,
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CellType::Forward => write!(f, "forward"),
            CellType::LaneChange => write!(f, "lane_change"),
        }
    }
}

/// Width of one traffic lane, in meters.
pub const LANE_WIDTH: f64 = 3.5;
/// Extra offset for a separated bike lane.
pub const BIKE_LANE_WIDTH: f64 = 0.5;
/// Extra offset for a separated walk lane.
pub const WALK_LANE_WIDTH: f64 = 0.5;
/// Nominal microscopic cell length.
pub const CELL_LENGTH: f64 = 4.5;
/// Breakpoints closer than this collapse into one.
pub const RESOLUTION: f64 = 5.0;
/// Cut length at a short-circuited link end.
pub const SHORTCUT_CUT_LEN: f64 = 0.1;
/// The smallest piece of link that must survive cutting.
pub const MIN_CUT_LEN: f64 = 2.0;

/// Cut length budget by lane count, clamped at 25 m.
pub fn cut_len_by_lanes(lanes: usize) -> f64 {
    match lanes {
        0 => 2.0,
        1 => 8.0,
        2 => 12.0,
        3 => 14.0,
        4 => 16.0,
        5 => 18.0,
        6 => 20.0,
        7 => 22.0,
        8 => 24.0,
        _ => 25.0,
    }
}
