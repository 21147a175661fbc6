use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

use geom::{GpsPolyLine, PolyLine};
use raw_net::{osm, AgentType, ControlType};

use crate::ids::{MacroLinkID, MacroNodeID, MovementID};

/// How far back from the link ends the connector geometry starts, in meters.
const INDENTATION: f64 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementType {
    Thru,
    Right,
    Left,
    UTurn,
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            MovementType::Thru => "thru",
            MovementType::Right => "right",
            MovementType::Left => "left",
            MovementType::UTurn => "uturn",
        };
        write!(f, "{}", s)
    }
}

/// Compass direction of the approach × turn primitive, e.g. SBT is a
/// southbound through movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementCompositeType {
    None,
    SBT,
    SBR,
    SBL,
    SBU,
    EBT,
    EBR,
    EBL,
    EBU,
    NBT,
    NBR,
    NBL,
    NBU,
    WBT,
    WBR,
    WBL,
    WBU,
}

impl fmt::Display for MovementCompositeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            MovementCompositeType::None => "undefined",
            MovementCompositeType::SBT => "SBT",
            MovementCompositeType::SBR => "SBR",
            MovementCompositeType::SBL => "SBL",
            MovementCompositeType::SBU => "SBU",
            MovementCompositeType::EBT => "EBT",
            MovementCompositeType::EBR => "EBR",
            MovementCompositeType::EBL => "EBL",
            MovementCompositeType::EBU => "EBU",
            MovementCompositeType::NBT => "NBT",
            MovementCompositeType::NBR => "NBR",
            MovementCompositeType::NBL => "NBL",
            MovementCompositeType::NBU => "NBU",
            MovementCompositeType::WBT => "WBT",
            MovementCompositeType::WBR => "WBR",
            MovementCompositeType::WBL => "WBL",
            MovementCompositeType::WBU => "WBU",
        };
        write!(f, "{}", s)
    }
}

/// An allowed turning manoeuvre at a macroscopic node, with income and
/// outcome lane ranges. Sequence ids are 0-based positions; lane numbers are
/// 1-based with lane-change padding applied.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementID,
    pub node_id: MacroNodeID,
    pub osm_node_id: osm::NodeID,
    pub incoming_link: MacroLinkID,
    pub outgoing_link: MacroLinkID,
    pub from_osm_node_id: osm::NodeID,
    pub to_osm_node_id: osm::NodeID,

    pub income_lane_seq: (usize, usize),
    pub outcome_lane_seq: (usize, usize),
    pub income_lane_start: i32,
    pub income_lane_end: i32,
    pub outcome_lane_start: i32,
    pub outcome_lane_end: i32,
    pub lanes_num: usize,

    pub composite_type: MovementCompositeType,
    pub movement_type: MovementType,
    pub control_type: ControlType,
    pub allowed_agents: Vec<AgentType>,
    pub geom: GpsPolyLine,
}

/// Classifies the manoeuvre from the two Euclidean chords. The approach
/// direction comes from the incoming chord's atan2 quadrant; the turn comes
/// from the signed angle between the chords.
pub fn classify_movement(
    incoming: &PolyLine,
    outgoing: &PolyLine,
) -> (MovementCompositeType, MovementType) {
    let angle1 = incoming.chord_angle();
    let direction = if (-0.75 * PI..-0.25 * PI).contains(&angle1) {
        "SB"
    } else if (-0.25 * PI..0.25 * PI).contains(&angle1) {
        "EB"
    } else if (0.25 * PI..0.75 * PI).contains(&angle1) {
        "NB"
    } else {
        "WB"
    };

    // Angle of the chord from the incoming end to the outgoing end, relative
    // to the approach
    let first = incoming.last_pt();
    let last = outgoing.last_pt();
    let angle2 = (last.y - first.y).atan2(last.x - first.x);
    let mut diff = angle2 - angle1;
    if diff < -PI {
        diff += 2.0 * PI;
    }
    if diff > PI {
        diff -= 2.0 * PI;
    }

    let movement_type = if (-0.25 * PI..=0.25 * PI).contains(&diff) {
        MovementType::Thru
    } else if diff < -0.25 * PI {
        MovementType::Right
    } else if diff <= 0.75 * PI {
        MovementType::Left
    } else {
        MovementType::UTurn
    };

    let composite = composite_of(direction, movement_type);
    (composite, movement_type)
}

fn composite_of(direction: &str, movement: MovementType) -> MovementCompositeType {
    use MovementCompositeType::*;
    match (direction, movement) {
        ("SB", MovementType::Thru) => SBT,
        ("SB", MovementType::Right) => SBR,
        ("SB", MovementType::Left) => SBL,
        ("SB", MovementType::UTurn) => SBU,
        ("EB", MovementType::Thru) => EBT,
        ("EB", MovementType::Right) => EBR,
        ("EB", MovementType::Left) => EBL,
        ("EB", MovementType::UTurn) => EBU,
        ("NB", MovementType::Thru) => NBT,
        ("NB", MovementType::Right) => NBR,
        ("NB", MovementType::Left) => NBL,
        ("NB", MovementType::UTurn) => NBU,
        ("WB", MovementType::Thru) => WBT,
        ("WB", MovementType::Right) => WBR,
        ("WB", MovementType::Left) => WBL,
        ("WB", MovementType::UTurn) => WBU,
        _ => unreachable!("direction prefix {} is not a compass quadrant", direction),
    }
}

/// A straight line from a point 8 m back from the incoming end to a point
/// 8 m past the outgoing start, each clamped to half the link length.
pub fn movement_geometry(incoming: &GpsPolyLine, outgoing: &GpsPolyLine) -> GpsPolyLine {
    let len1 = incoming.length_meters();
    let indent1 = if len1 <= INDENTATION { len1 / 2.0 } else { INDENTATION };
    let pt1 = incoming.dist_along(len1 - indent1);

    let len2 = outgoing.length_meters();
    let indent2 = if len2 <= INDENTATION { len2 / 2.0 } else { INDENTATION };
    let pt2 = outgoing.dist_along(indent2);

    GpsPolyLine::new(vec![pt1, pt2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use geom::Pt2D;

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> PolyLine {
        PolyLine::new(vec![Pt2D::new(x1, y1), Pt2D::new(x2, y2)])
    }

    #[test]
    fn eastbound_through() {
        let incoming = line(0.0, 0.0, 10.0, 0.0);
        let outgoing = line(10.0, 0.0, 20.0, 0.0);
        let (composite, movement) = classify_movement(&incoming, &outgoing);
        assert_eq!(movement, MovementType::Thru);
        assert_eq!(composite, MovementCompositeType::EBT);
    }

    #[test]
    fn eastbound_left_turn() {
        let incoming = line(0.0, 0.0, 10.0, 0.0);
        let outgoing = line(10.0, 0.0, 10.0, 10.0);
        let (composite, movement) = classify_movement(&incoming, &outgoing);
        assert_eq!(movement, MovementType::Left);
        assert_eq!(composite, MovementCompositeType::EBL);
    }

    #[test]
    fn eastbound_right_turn() {
        let incoming = line(0.0, 0.0, 10.0, 0.0);
        let outgoing = line(10.0, 0.0, 10.0, -10.0);
        let (composite, movement) = classify_movement(&incoming, &outgoing);
        assert_eq!(movement, MovementType::Right);
        assert_eq!(composite, MovementCompositeType::EBR);
    }

    #[test]
    fn northbound_u_turn() {
        // Turning around onto the left-hand carriageway
        let incoming = line(0.0, 0.0, 0.0, 10.0);
        let outgoing = line(-0.5, 10.0, -0.5, 0.0);
        let (composite, movement) = classify_movement(&incoming, &outgoing);
        assert_eq!(movement, MovementType::UTurn);
        assert_eq!(composite, MovementCompositeType::NBU);
    }
}
