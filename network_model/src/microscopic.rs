use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use geom::{GpsPolyLine, LonLat, Pt2D};
use raw_net::{AgentType, ControlType, LinkType};

use crate::ids::{MacroLinkID, MacroNodeID, MesoLinkID, MicroLinkID, MicroNodeID};
use crate::movement::MovementCompositeType;
use crate::types::{BoundaryType, CellType};

/// Lane number of a separated bike lane.
pub const BIKE_LANE_ID: i32 = -1;
/// Lane number of a separated walk lane.
pub const WALK_LANE_ID: i32 = -2;

/// A cell boundary on one lane stripe of a mesoscopic link.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MicroNode {
    pub id: MicroNodeID,
    pub loc: LonLat,
    pub loc_euclidean: Pt2D,
    pub meso_link_id: MesoLinkID,
    /// 1..N for driving lanes, -1 for bike, -2 for walk.
    pub lane_id: i32,
    pub is_link_upstream_target_node: bool,
    pub is_link_downstream_target_node: bool,
    pub zone_id: i64,
    pub boundary_type: BoundaryType,
    pub incoming_links: Vec<MicroLinkID>,
    pub outgoing_links: Vec<MicroLinkID>,
}

/// A fixed-length cell edge: forward along a lane, or changing to an
/// adjacent lane.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MicroLink {
    pub id: MicroLinkID,
    pub source_node: MicroNodeID,
    pub target_node: MicroNodeID,
    pub geom: GpsPolyLine,
    pub length_meters: f64,
    pub cell_type: CellType,
    pub meso_link_id: MesoLinkID,
    pub macro_link_id: Option<MacroLinkID>,
    /// Set for connector cells: the intersection they cross.
    pub macro_node_id: Option<MacroNodeID>,
    pub lane_id: i32,
    pub meso_link_type: LinkType,
    pub control_type: ControlType,
    /// Non-NONE only on the first cell of a movement connector.
    pub movement_composite_type: MovementCompositeType,
    pub is_first_movement: bool,
    pub free_speed: f64,
    pub capacity: i64,
    pub additional_travel_cost: f64,
    pub allowed_agents: Vec<AgentType>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MicroNetwork {
    pub nodes: BTreeMap<MicroNodeID, MicroNode>,
    pub links: BTreeMap<MicroLinkID, MicroLink>,
    pub next_node_id: i64,
    pub next_link_id: i64,
}

impl MicroNetwork {
    pub fn new() -> MicroNetwork {
        MicroNetwork {
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
            next_node_id: 0,
            next_link_id: 0,
        }
    }
}
