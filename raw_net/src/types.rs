use std::fmt;

use serde::{Deserialize, Serialize};

/// A traffic class whose admissibility is decided per link from OSM access
/// tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgentType {
    Auto,
    Bike,
    Walk,
}

impl AgentType {
    pub const ALL: [AgentType; 3] = [AgentType::Auto, AgentType::Bike, AgentType::Walk];

    pub fn parse(value: &str) -> Option<AgentType> {
        match value {
            "auto" => Some(AgentType::Auto),
            "bike" => Some(AgentType::Bike),
            "walk" => Some(AgentType::Walk),
            _ => None,
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AgentType::Auto => write!(f, "auto"),
            AgentType::Bike => write!(f, "bike"),
            AgentType::Walk => write!(f, "walk"),
        }
    }
}

/// Whether a node is under traffic-light control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ControlType {
    NotSignal,
    Signal,
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ControlType::NotSignal => write!(f, "common"),
            ControlType::Signal => write!(f, "signal"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LinkClass {
    Highway,
    Railway,
    Aeroway,
}

impl fmt::Display for LinkClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LinkClass::Highway => write!(f, "highway"),
            LinkClass::Railway => write!(f, "railway"),
            LinkClass::Aeroway => write!(f, "aeroway"),
        }
    }
}

/// Functional class of a carriageway, reduced from the OSM `highway` value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LinkType {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    LivingStreet,
    Service,
    Cycleway,
    Footway,
    Track,
    Unclassified,
    Connector,
    Railway,
    Aeroway,
    Undefined,
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            LinkType::Motorway => "motorway",
            LinkType::Trunk => "trunk",
            LinkType::Primary => "primary",
            LinkType::Secondary => "secondary",
            LinkType::Tertiary => "tertiary",
            LinkType::Residential => "residential",
            LinkType::LivingStreet => "living_street",
            LinkType::Service => "service",
            LinkType::Cycleway => "cycleway",
            LinkType::Footway => "footway",
            LinkType::Track => "track",
            LinkType::Unclassified => "unclassified",
            LinkType::Connector => "connector",
            LinkType::Railway => "railway",
            LinkType::Aeroway => "aeroway",
            LinkType::Undefined => "undefined",
        };
        write!(f, "{}", s)
    }
}

/// Default number of lanes per carriageway when OSM doesn't say.
pub fn default_lanes(lt: LinkType) -> usize {
    match lt {
        LinkType::Motorway => 4,
        LinkType::Trunk | LinkType::Primary => 3,
        LinkType::Secondary | LinkType::Tertiary | LinkType::Connector => 2,
        _ => 1,
    }
}

/// Default free speed in km/h.
pub fn default_speed(lt: LinkType) -> f64 {
    match lt {
        LinkType::Motorway | LinkType::Connector => 120.0,
        LinkType::Trunk => 100.0,
        LinkType::Primary => 80.0,
        LinkType::Secondary => 60.0,
        LinkType::Tertiary => 40.0,
        LinkType::Cycleway | LinkType::Footway => 5.0,
        _ => 30.0,
    }
}

/// Default capacity in vehicles per hour.
pub fn default_capacity(lt: LinkType) -> i64 {
    match lt {
        LinkType::Motorway => 2300,
        LinkType::Trunk => 2200,
        LinkType::Primary => 1800,
        LinkType::Secondary => 1600,
        LinkType::Tertiary => 1200,
        LinkType::Residential => 1000,
        LinkType::Connector => 9999,
        _ => 800,
    }
}

/// Whether ways of this class default to oneway when the tag is missing.
pub fn oneway_default(lt: LinkType) -> bool {
    matches!(
        lt,
        LinkType::Cycleway | LinkType::Footway | LinkType::Track | LinkType::Railway | LinkType::Aeroway
    )
}

/// A recognised OSM `highway` value mapped to (link type, is a link road).
pub fn link_type_by_highway(highway: &str) -> Option<(LinkType, bool)> {
    match highway {
        "motorway" => Some((LinkType::Motorway, false)),
        "motorway_link" => Some((LinkType::Motorway, true)),
        "trunk" => Some((LinkType::Trunk, false)),
        "trunk_link" => Some((LinkType::Trunk, true)),
        "primary" => Some((LinkType::Primary, false)),
        "primary_link" => Some((LinkType::Primary, true)),
        "secondary" => Some((LinkType::Secondary, false)),
        "secondary_link" => Some((LinkType::Secondary, true)),
        "tertiary" => Some((LinkType::Tertiary, false)),
        "tertiary_link" => Some((LinkType::Tertiary, true)),
        "residential" => Some((LinkType::Residential, false)),
        "residential_link" => Some((LinkType::Residential, true)),
        "living_street" => Some((LinkType::LivingStreet, false)),
        "service" | "services" => Some((LinkType::Service, false)),
        "cycleway" => Some((LinkType::Cycleway, false)),
        "footway" | "pedestrian" | "steps" => Some((LinkType::Footway, false)),
        "track" => Some((LinkType::Track, false)),
        "unclassified" => Some((LinkType::Unclassified, false)),
        _ => None,
    }
}

/// Highway values that never become road topology.
pub fn is_negligible_highway(highway: &str) -> bool {
    matches!(
        highway,
        "path"
            | "construction"
            | "proposed"
            | "raceway"
            | "bridleway"
            | "rest_area"
            | "su"
            | "road"
            | "abandoned"
            | "planned"
            | "trailhead"
            | "stairs"
            | "dismantled"
            | "disused"
            | "razed"
            | "access"
            | "corridor"
            | "stop"
    )
}

/// Highway values that describe a point of interest rather than a road.
pub fn is_poi_highway(highway: &str) -> bool {
    matches!(highway, "bus_stop" | "platform")
}

pub fn is_poi_railway(railway: &str) -> bool {
    matches!(
        railway,
        "depot" | "workshop" | "halt" | "interlocking" | "junction" | "spur_junction" | "terminal" | "platform"
    )
}

/// `junction` values that imply oneway circulation.
pub fn is_roundabout_junction(junction: &str) -> bool {
    matches!(junction, "roundabout" | "circular")
}

/// `oneway` values that depend on time conditions; treated as bidirectional.
pub fn is_reversible_oneway(value: &str) -> bool {
    matches!(value, "reversible" | "alternating")
}
