use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use geom::{GpsPolyLine, LonLat, PolyLine, Pt2D};
use raw_net::{osm, AgentType, ControlType, LinkClass, LinkType};

use crate::ids::{MacroLinkID, MacroNodeID, MesoLinkID, MovementID};
use crate::movement::Movement;
use crate::types::{
    cut_len_by_lanes, ActivityType, BoundaryType, MIN_CUT_LEN, RESOLUTION, SHORTCUT_CUT_LEN,
};

/// A true intersection (or network boundary) of the planning-level graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MacroNode {
    pub id: MacroNodeID,
    pub osm_node_id: osm::NodeID,
    pub name: String,
    pub osm_highway: String,
    pub loc: LonLat,
    pub loc_euclidean: Pt2D,
    pub control_type: ControlType,
    pub boundary_type: BoundaryType,
    pub activity_type: ActivityType,
    pub activity_link_type: LinkType,
    pub zone_id: i64,
    pub intersection_id: i64,
    pub poi_id: i64,
    pub incoming_links: Vec<MacroLinkID>,
    pub outgoing_links: Vec<MacroLinkID>,

    pub movements: Vec<MovementID>,
    /// Cleared when the intersection is a pure merge/diverge that gets
    /// short-circuited instead of receiving connector links.
    pub movement_is_needed: bool,
}

impl MacroNode {
    pub fn new(id: MacroNodeID, raw: &raw_net::RawNode) -> MacroNode {
        MacroNode {
            id,
            osm_node_id: raw.id,
            name: raw.name.clone(),
            osm_highway: raw.highway.clone(),
            loc: raw.loc,
            loc_euclidean: raw.loc.to_pt2d(),
            control_type: raw.control_type,
            boundary_type: BoundaryType::None,
            activity_type: ActivityType::None,
            activity_link_type: LinkType::Undefined,
            zone_id: -1,
            intersection_id: -1,
            poi_id: -1,
            incoming_links: Vec::new(),
            outgoing_links: Vec::new(),
            movements: Vec::new(),
            movement_is_needed: true,
        }
    }
}

/// One directed carriageway segment between two macroscopic nodes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MacroLink {
    pub id: MacroLinkID,
    pub source_node: MacroNodeID,
    pub target_node: MacroNodeID,
    pub source_osm_node_id: osm::NodeID,
    pub target_osm_node_id: osm::NodeID,
    pub osm_way_id: osm::WayID,
    pub name: String,
    pub link_class: LinkClass,
    pub link_type: LinkType,
    pub is_link: bool,
    pub control_type: ControlType,
    pub allowed_agents: Vec<AgentType>,
    pub was_bidirectional: bool,

    pub geom: GpsPolyLine,
    pub geom_euclidean: PolyLine,
    pub length_meters: f64,

    pub lanes: usize,
    pub free_speed: f64,
    pub max_speed: f64,
    pub capacity: i64,

    /// Positions along the link (in meters) where the lane composition may
    /// change. `lanes_list.len() == breakpoints.len() - 1`.
    pub breakpoints: Vec<f64>,
    pub lanes_list: Vec<usize>,
    pub lanes_change: Vec<(i32, i32)>,

    // Mesoscopic bookkeeping, filled by the mesoscopic builder
    pub lanes_list_cut: Vec<usize>,
    pub lanes_change_cut: Vec<(i32, i32)>,
    pub geom_offset: GpsPolyLine,
    pub geom_euclidean_offset: PolyLine,
    pub geom_offset_cut: Vec<GpsPolyLine>,
    pub length_meters_offset: f64,
    pub downstream_shortcut: bool,
    pub upstream_shortcut: bool,
    pub downstream_is_target: bool,
    pub upstream_is_target: bool,
    pub upstream_cut_len: f64,
    pub downstream_cut_len: f64,
    pub meso_links: Vec<MesoLinkID>,
}

impl MacroLink {
    /// Lane count at the upstream end.
    pub fn lanes_in(&self) -> usize {
        self.lanes_list[0]
    }

    /// Lane count at the downstream end.
    pub fn lanes_out(&self) -> usize {
        *self.lanes_list.last().unwrap()
    }

    pub fn max_lanes(&self) -> usize {
        self.lanes_list.iter().copied().max().unwrap_or(self.lanes)
    }

    /// 1-based lane numbers at the upstream end, with lane-change padding.
    pub fn incoming_lane_indices(&self) -> Vec<i32> {
        let (left, right) = self.lanes_change[0];
        lane_indices(self.lanes, left, right)
    }

    /// 1-based lane numbers at the downstream end.
    pub fn outgoing_lane_indices(&self) -> Vec<i32> {
        let (left, right) = *self.lanes_change.last().unwrap();
        lane_indices(self.lanes, left, right)
    }

    /// Seeds the breakpoint table: [0, length], deduplicated to the 5 m
    /// resolution, and a uniform lane count per sub-segment.
    pub fn prepare_lane_table(&mut self) {
        self.breakpoints = if self.length_meters <= RESOLUTION {
            vec![0.0, self.length_meters]
        } else {
            let mut pending = vec![0.0, self.length_meters];
            let mut kept = Vec::new();
            while !pending.is_empty() {
                let target = pending[0];
                kept.push(target);
                pending.retain(|point| *point < target - RESOLUTION || *point > target + RESOLUTION);
            }
            kept.sort_by(|a, b| a.partial_cmp(b).unwrap());
            kept
        };

        self.lanes_list = vec![self.lanes; self.breakpoints.len() - 1];
        self.lanes_change = vec![(0, 0); self.breakpoints.len() - 1];
    }

    /// Decides how much to trim from each end to make room for connector
    /// geometry, driven by the shortcut flags and the lane-count budget.
    pub fn calc_cut_len(&mut self) {
        let bp = &self.breakpoints;
        let upstream_max_cut = (bp[1] - bp[0] - 3.0).max(SHORTCUT_CUT_LEN);
        let downstream_max_cut = (bp[bp.len() - 1] - bp[bp.len() - 2] - 3.0).max(SHORTCUT_CUT_LEN);
        let length = self.length_meters_offset;

        if self.upstream_shortcut && self.downstream_shortcut {
            let total = 2.0 * SHORTCUT_CUT_LEN * MIN_CUT_LEN;
            if length > total {
                self.upstream_cut_len = SHORTCUT_CUT_LEN;
                self.downstream_cut_len = SHORTCUT_CUT_LEN;
            } else {
                self.upstream_cut_len = (length / total) * SHORTCUT_CUT_LEN;
                self.downstream_cut_len = self.upstream_cut_len;
            }
        } else if self.upstream_shortcut {
            match self.fitting_cut(length, downstream_max_cut, SHORTCUT_CUT_LEN) {
                Some(cut) => {
                    self.upstream_cut_len = SHORTCUT_CUT_LEN;
                    self.downstream_cut_len = cut;
                }
                None => {
                    let downstream = downstream_max_cut.min(cut_len_by_lanes(0));
                    let total = downstream + SHORTCUT_CUT_LEN + MIN_CUT_LEN;
                    self.upstream_cut_len = (length / total) * SHORTCUT_CUT_LEN;
                    self.downstream_cut_len = (length / total) * downstream;
                }
            }
        } else if self.downstream_shortcut {
            match self.fitting_cut(length, upstream_max_cut, SHORTCUT_CUT_LEN) {
                Some(cut) => {
                    self.upstream_cut_len = cut;
                    self.downstream_cut_len = SHORTCUT_CUT_LEN;
                }
                None => {
                    let upstream = upstream_max_cut.min(cut_len_by_lanes(0));
                    let total = upstream + SHORTCUT_CUT_LEN + MIN_CUT_LEN;
                    self.upstream_cut_len = (length / total) * upstream;
                    self.downstream_cut_len = (length / total) * SHORTCUT_CUT_LEN;
                }
            }
        } else {
            let mut found = None;
            for lanes in (0..=self.lanes_out()).rev() {
                let budget = cut_len_by_lanes(lanes);
                let up = upstream_max_cut.min(budget);
                let down = downstream_max_cut.min(budget);
                if length > up + down + MIN_CUT_LEN {
                    found = Some((up, down));
                    break;
                }
            }
            match found {
                Some((up, down)) => {
                    self.upstream_cut_len = up;
                    self.downstream_cut_len = down;
                }
                None => {
                    let up = upstream_max_cut.min(cut_len_by_lanes(0));
                    let down = downstream_max_cut.min(cut_len_by_lanes(0));
                    let total = up + down + MIN_CUT_LEN;
                    self.upstream_cut_len = (length / total) * up;
                    self.downstream_cut_len = (length / total) * down;
                }
            }
        }
    }

    /// Largest lane-budget cut on the free end that still leaves the minimum
    /// piece of link, when the other end only takes the shortcut sliver.
    fn fitting_cut(&self, length: f64, max_cut: f64, fixed_end: f64) -> Option<f64> {
        for lanes in (0..=self.lanes_out()).rev() {
            let cut = max_cut.min(cut_len_by_lanes(lanes));
            if length > cut + fixed_end + MIN_CUT_LEN {
                return Some(cut);
            }
        }
        None
    }

    /// Applies the cut lengths: trims the offset geometry and slices it per
    /// sub-segment.
    pub fn perform_cut(&mut self) {
        let mut cut_points = self.breakpoints.clone();
        self.lanes_list_cut = self.lanes_list.clone();
        self.lanes_change_cut = self.lanes_change.clone();

        cut_points[0] = self.upstream_cut_len;
        let last = cut_points.len() - 1;
        cut_points[last] = self.length_meters_offset - self.downstream_cut_len;

        self.geom_offset_cut = Vec::with_capacity(self.lanes_list_cut.len());
        for i in 0..self.lanes_list_cut.len() {
            self.geom_offset_cut
                .push(self.geom_offset.slice(cut_points[i], cut_points[i + 1]));
        }
    }
}

/// 1-based lane numbers for a segment with `lanes` through lanes and the
/// given (left, right) lane-change padding. Extra left lanes get numbers
/// below 1, extra right lanes continue past `lanes`; negative padding trims.
pub fn lane_indices(lanes: usize, change_left: i32, change_right: i32) -> Vec<i32> {
    let mut indices: Vec<i32> = (1..=lanes as i32).collect();
    if change_left < 0 {
        indices.drain(0..(-change_left) as usize);
    } else if change_left > 0 {
        let mut left: Vec<i32> = (0..change_left).map(|i| -change_left + i).collect();
        left.extend(indices);
        indices = left;
    }
    if change_right < 0 {
        indices.truncate(indices.len() - (-change_right) as usize);
    } else if change_right > 0 {
        indices.extend((0..change_right).map(|i| lanes as i32 + 1 + i));
    }
    indices
}

/// The planning-level graph: one directed link per carriageway segment,
/// nodes at true intersections, turning movements at the nodes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MacroNetwork {
    pub nodes: BTreeMap<MacroNodeID, MacroNode>,
    pub links: BTreeMap<MacroLinkID, MacroLink>,
    pub movements: BTreeMap<MovementID, Movement>,
}

impl MacroNetwork {
    pub fn new() -> MacroNetwork {
        MacroNetwork {
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
            movements: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_indices_plain() {
        assert_eq!(lane_indices(3, 0, 0), vec![1, 2, 3]);
    }

    #[test]
    fn lane_indices_padding() {
        assert_eq!(lane_indices(2, 1, 0), vec![-1, 1, 2]);
        assert_eq!(lane_indices(2, 0, 1), vec![1, 2, 3]);
        assert_eq!(lane_indices(3, -1, 0), vec![2, 3]);
        assert_eq!(lane_indices(3, 0, -1), vec![1, 2]);
    }

    #[test]
    fn cut_len_table_clamps() {
        assert_eq!(cut_len_by_lanes(0), 2.0);
        assert_eq!(cut_len_by_lanes(1), 8.0);
        assert_eq!(cut_len_by_lanes(8), 24.0);
        assert_eq!(cut_len_by_lanes(9), 25.0);
        assert_eq!(cut_len_by_lanes(50), 25.0);
    }
}
