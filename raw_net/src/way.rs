use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::node::RawNode;
use crate::osm::{NodeID, WayID};
use crate::tags::Tags;
use crate::types::{is_reversible_oneway, is_roundabout_junction, AgentType, LinkClass, LinkType};

static LANES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static KMH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+\.?\d*) km/h").unwrap());
static MPH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+\.?\d*) mph").unwrap());

/// An OSM way with its tags flattened into typed fields. Everything numeric
/// uses -1 for "not tagged".
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawWay {
    pub id: WayID,
    pub node_ids: Vec<NodeID>,

    // Flattened tags
    pub name: String,
    pub highway: String,
    pub railway: String,
    pub aeroway: String,
    pub junction: String,
    pub area: String,
    pub motor_vehicle: String,
    pub motorcar: String,
    pub service: String,
    pub foot: String,
    pub bicycle: String,
    pub building: String,
    pub amenity: String,
    pub leisure: String,
    pub access: String,

    pub lanes: i32,
    pub lanes_forward: i32,
    pub lanes_backward: i32,
    /// Numeric literal from `maxspeed`, with no unit conversion applied.
    pub max_speed: f64,

    pub oneway: bool,
    /// True when `oneway` was neither tagged nor implied by `junction`.
    pub oneway_default: bool,
    /// True for `oneway=-1`; the node order is reversed during preparation.
    pub is_reversed: bool,

    // Filled during preparation
    pub link_type: LinkType,
    pub link_class: LinkClass,
    pub is_link: bool,
    pub allowed_agents: Vec<AgentType>,
    pub is_cycle: bool,
    pub is_pure_cycle: bool,
}

impl RawWay {
    pub fn from_tags(id: WayID, node_ids: Vec<NodeID>, tags: &Tags) -> RawWay {
        let mut way = RawWay {
            id,
            node_ids,
            name: tags.find("name").to_string(),
            highway: tags.find("highway").to_string(),
            railway: tags.find("railway").to_string(),
            aeroway: tags.find("aeroway").to_string(),
            junction: tags.find("junction").to_string(),
            area: tags.find("area").to_string(),
            motor_vehicle: tags.find("motor_vehicle").to_string(),
            motorcar: tags.find("motorcar").to_string(),
            service: tags.find("service").to_string(),
            foot: tags.find("foot").to_string(),
            bicycle: tags.find("bicycle").to_string(),
            building: tags.find("building").to_string(),
            amenity: tags.find("amenity").to_string(),
            leisure: tags.find("leisure").to_string(),
            access: tags.find("access").to_string(),
            lanes: parse_lanes(tags.find("lanes"), id, "lanes"),
            lanes_forward: parse_lanes(tags.find("lanes:forward"), id, "lanes:forward"),
            lanes_backward: parse_lanes(tags.find("lanes:backward"), id, "lanes:backward"),
            max_speed: parse_maxspeed(tags.find("maxspeed")),
            oneway: false,
            oneway_default: false,
            is_reversed: false,
            link_type: LinkType::Undefined,
            link_class: LinkClass::Highway,
            is_link: false,
            allowed_agents: Vec::new(),
            is_cycle: false,
            is_pure_cycle: false,
        };
        way.resolve_oneway(tags.find("oneway"));
        way
    }

    fn resolve_oneway(&mut self, value: &str) {
        match value {
            "yes" | "1" => {
                self.oneway = true;
            }
            "no" | "0" => {
                self.oneway = false;
            }
            "-1" => {
                self.oneway = true;
                self.is_reversed = true;
            }
            "" => {
                if is_roundabout_junction(&self.junction) {
                    self.oneway = true;
                } else {
                    self.oneway = false;
                    self.oneway_default = true;
                }
            }
            other => {
                if is_reversible_oneway(other) {
                    // Time-conditional direction; treated as bidirectional
                    self.oneway = false;
                } else {
                    log::warn!("Unhandled `oneway` tag value '{}'. Way ID: '{}'", other, self.id);
                }
            }
        }
    }

    pub fn is_poi(&self) -> bool {
        !self.building.is_empty() || !self.amenity.is_empty() || !self.leisure.is_empty()
    }

    pub fn is_highway(&self) -> bool {
        !self.highway.is_empty()
    }

    pub fn is_railway(&self) -> bool {
        !self.railway.is_empty()
    }

    pub fn is_aeroway(&self) -> bool {
        !self.aeroway.is_empty()
    }

    /// Splits the node list at crossing nodes. Every segment starts and ends
    /// on a crossing; pieces shorter than 2 nodes are discarded.
    pub fn segments(&self, nodes: &BTreeMap<NodeID, RawNode>) -> Vec<Vec<NodeID>> {
        let mut segments = Vec::new();
        let mut current: Vec<NodeID> = Vec::new();
        for (idx, node_id) in self.node_ids.iter().enumerate() {
            current.push(*node_id);
            let is_crossing = nodes.get(node_id).map(|n| n.is_crossing).unwrap_or(false);
            if idx > 0 && is_crossing {
                segments.push(std::mem::take(&mut current));
                current.push(*node_id);
            }
        }
        if current.len() >= 2 {
            segments.push(current);
        }
        segments.retain(|segment| segment.len() >= 2);
        segments
    }
}

fn parse_lanes(value: &str, id: WayID, key: &str) -> i32 {
    if value.is_empty() {
        return -1;
    }
    match LANES_RE.find(value) {
        Some(m) => m.as_str().parse::<i32>().unwrap_or(-1),
        None => {
            log::warn!(
                "Provided `{}` tag value should contain an integer. Got '{}'. Way ID: '{}'",
                key,
                value,
                id
            );
            -1
        }
    }
}

fn parse_maxspeed(value: &str) -> f64 {
    if value.is_empty() {
        return -1.0;
    }
    // The numeric literal is preserved as-is: mph values are NOT converted to
    // km/h, consumers interpret the unit from context.
    if let Some(caps) = KMH_RE.captures(value) {
        return caps[1].parse::<f64>().unwrap_or(-1.0);
    }
    if let Some(caps) = MPH_RE.captures(value) {
        return caps[1].parse::<f64>().unwrap_or(-1.0);
    }
    -1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn way(pairs: &[(&str, &str)]) -> RawWay {
        RawWay::from_tags(WayID(1), Vec::new(), &Tags::from_pairs(pairs))
    }

    #[test]
    fn lanes_first_numeric_run() {
        assert_eq!(way(&[("highway", "primary"), ("lanes", "4")]).lanes, 4);
        assert_eq!(way(&[("highway", "primary"), ("lanes", "2; 3")]).lanes, 2);
        assert_eq!(way(&[("highway", "primary"), ("lanes", "narrow")]).lanes, -1);
        assert_eq!(way(&[("highway", "primary")]).lanes, -1);
    }

    #[test]
    fn maxspeed_keeps_numeric_literal() {
        assert_eq!(way(&[("maxspeed", "60 km/h")]).max_speed, 60.0);
        // mph literal is preserved, not converted
        assert_eq!(way(&[("maxspeed", "35 mph")]).max_speed, 35.0);
        assert_eq!(way(&[("maxspeed", "fast")]).max_speed, -1.0);
    }

    #[test]
    fn oneway_resolution() {
        assert!(way(&[("oneway", "yes")]).oneway);
        assert!(way(&[("oneway", "1")]).oneway);
        assert!(!way(&[("oneway", "no")]).oneway);

        let reversed = way(&[("oneway", "-1")]);
        assert!(reversed.oneway);
        assert!(reversed.is_reversed);

        let roundabout = way(&[("junction", "roundabout")]);
        assert!(roundabout.oneway);
        assert!(!roundabout.oneway_default);

        let untagged = way(&[("highway", "primary")]);
        assert!(!untagged.oneway);
        assert!(untagged.oneway_default);

        let reversible = way(&[("oneway", "reversible")]);
        assert!(!reversible.oneway);
    }
}
