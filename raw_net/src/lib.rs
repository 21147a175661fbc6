//! Typed raw model of an OSM extract: ways with flattened tags, nodes with
//! use counts, and turn-restriction triples. This is the input format of the
//! macroscopic builder; it only lives until that builder finishes.

#[macro_use]
extern crate log;

use std::collections::BTreeMap;

pub mod access;
mod node;
pub mod osm;
mod restriction;
mod tags;
mod types;
mod way;

pub use crate::node::RawNode;
pub use crate::restriction::{Restriction, RestrictionKind, RestrictionMember};
pub use crate::tags::Tags;
pub use crate::types::{
    default_capacity, default_lanes, default_speed, is_negligible_highway, is_poi_highway,
    is_poi_railway, is_reversible_oneway, is_roundabout_junction, link_type_by_highway,
    oneway_default, AgentType, ControlType, LinkClass, LinkType,
};
pub use crate::way::RawWay;

use netutil::Counter;

/// Everything the reader extracted, before network construction.
pub struct RawExtract {
    pub ways: Vec<RawWay>,
    pub nodes: BTreeMap<osm::NodeID, RawNode>,
    pub restrictions: Vec<Restriction>,
}

impl RawExtract {
    /// Filters the ways down to driveable road topology, classifies them,
    /// counts node uses, marks crossings and pure cycles. After this, the
    /// remaining ways are exactly the macroscopic builder's input.
    pub fn prepare(&mut self, allowed_agents: &[AgentType]) {
        let mut retained: Vec<RawWay> = Vec::new();
        for way in self.ways.drain(..) {
            let mut way = way;
            if way.is_poi() {
                continue;
            }
            if way.node_ids.len() < 2 {
                continue;
            }
            if way.is_highway() {
                if types::is_poi_highway(&way.highway) {
                    continue;
                }
                if !way.area.is_empty() && way.area != "no" {
                    continue;
                }
                if types::is_negligible_highway(&way.highway) {
                    continue;
                }
                let (link_type, is_link) = match types::link_type_by_highway(&way.highway) {
                    Some(pair) => pair,
                    None => {
                        warn!(
                            "Unhandled `highway` tag value: '{}'. Way ID: '{}'",
                            way.highway, way.id
                        );
                        continue;
                    }
                };
                way.link_type = link_type;
                way.is_link = is_link;
                way.link_class = LinkClass::Highway;
                if way.oneway_default {
                    way.oneway = types::oneway_default(link_type);
                }

                way.allowed_agents = access::allowed_agents(&way)
                    .into_iter()
                    .filter(|agent| allowed_agents.contains(agent))
                    .collect();
                if way.allowed_agents.is_empty() {
                    continue;
                }
            } else if way.is_railway() || way.is_aeroway() {
                // Rail and aero topology is tagged through but not built
                continue;
            } else {
                continue;
            }

            if way.is_reversed {
                way.node_ids.reverse();
            }
            if way.node_ids[0] == *way.node_ids.last().unwrap() {
                way.is_cycle = true;
            }
            retained.push(way);
        }
        self.ways = retained;

        self.count_node_uses();
        self.mark_crossings();
        self.mark_pure_cycles();
    }

    /// Way endpoints count twice, so a node used only as the endpoint of a
    /// single way still crosses the use_count >= 2 threshold and becomes a
    /// network boundary.
    fn count_node_uses(&mut self) {
        let mut counter: Counter<osm::NodeID> = Counter::new();
        for way in &self.ways {
            for (idx, node_id) in way.node_ids.iter().enumerate() {
                let amount = if idx == 0 || idx == way.node_ids.len() - 1 {
                    2
                } else {
                    1
                };
                counter.add(*node_id, amount);
            }
        }
        for (node_id, count) in counter.iter() {
            if let Some(node) = self.nodes.get_mut(node_id) {
                node.use_count = *count;
            }
        }
    }

    fn mark_crossings(&mut self) {
        for node in self.nodes.values_mut() {
            if node.use_count >= 2 || node.control_type == ControlType::Signal {
                node.is_crossing = true;
            }
        }
    }

    fn mark_pure_cycles(&mut self) {
        for way in &mut self.ways {
            if !way.is_cycle {
                continue;
            }
            way.is_pure_cycle = true;
            // Only interior nodes matter; the shared endpoint is always a
            // crossing by the double-count rule.
            for node_id in &way.node_ids[1..way.node_ids.len() - 1] {
                if self.nodes.get(node_id).map(|n| n.is_crossing).unwrap_or(false) {
                    way.is_pure_cycle = false;
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geom::LonLat;

    fn node(id: i64, lon: f64, lat: f64) -> (osm::NodeID, RawNode) {
        let id = osm::NodeID(id);
        (id, RawNode::new(id, LonLat::new(lon, lat), String::new(), String::new()))
    }

    fn extract(ways: Vec<RawWay>, nodes: Vec<(osm::NodeID, RawNode)>) -> RawExtract {
        RawExtract {
            ways,
            nodes: nodes.into_iter().collect(),
            restrictions: Vec::new(),
        }
    }

    #[test]
    fn endpoint_of_single_way_is_crossing() {
        let way = RawWay::from_tags(
            osm::WayID(1),
            vec![osm::NodeID(1), osm::NodeID(2), osm::NodeID(3)],
            &Tags::from_pairs(&[("highway", "residential")]),
        );
        let mut raw = extract(
            vec![way],
            vec![node(1, 0.0, 0.0), node(2, 0.001, 0.0), node(3, 0.002, 0.0)],
        );
        raw.prepare(&[AgentType::Auto]);
        assert!(raw.nodes[&osm::NodeID(1)].is_crossing);
        assert!(!raw.nodes[&osm::NodeID(2)].is_crossing);
        assert!(raw.nodes[&osm::NodeID(3)].is_crossing);
    }

    #[test]
    fn pure_cycle_is_marked() {
        let way = RawWay::from_tags(
            osm::WayID(1),
            vec![osm::NodeID(1), osm::NodeID(2), osm::NodeID(3), osm::NodeID(1)],
            &Tags::from_pairs(&[("highway", "residential")]),
        );
        let mut raw = extract(
            vec![way],
            vec![node(1, 0.0, 0.0), node(2, 0.001, 0.0), node(3, 0.001, 0.001)],
        );
        raw.prepare(&[AgentType::Auto]);
        assert!(raw.ways[0].is_pure_cycle);
    }

    #[test]
    fn cycle_with_interior_crossing_is_kept() {
        let cycle = RawWay::from_tags(
            osm::WayID(1),
            vec![osm::NodeID(1), osm::NodeID(2), osm::NodeID(3), osm::NodeID(1)],
            &Tags::from_pairs(&[("highway", "residential")]),
        );
        let stub = RawWay::from_tags(
            osm::WayID(2),
            vec![osm::NodeID(2), osm::NodeID(4)],
            &Tags::from_pairs(&[("highway", "residential")]),
        );
        let mut raw = extract(
            vec![cycle, stub],
            vec![
                node(1, 0.0, 0.0),
                node(2, 0.001, 0.0),
                node(3, 0.001, 0.001),
                node(4, 0.002, 0.0),
            ],
        );
        raw.prepare(&[AgentType::Auto]);
        assert!(!raw.ways[0].is_pure_cycle);
    }

    #[test]
    fn unknown_highway_is_skipped() {
        let way = RawWay::from_tags(
            osm::WayID(1),
            vec![osm::NodeID(1), osm::NodeID(2)],
            &Tags::from_pairs(&[("highway", "busway")]),
        );
        let mut raw = extract(vec![way], vec![node(1, 0.0, 0.0), node(2, 0.001, 0.0)]);
        raw.prepare(&[AgentType::Auto]);
        assert!(raw.ways.is_empty());
    }
}
