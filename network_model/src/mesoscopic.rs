use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use geom::{GpsPolyLine, LonLat, PolyLine, Pt2D};
use raw_net::{AgentType, ControlType, LinkType};

use crate::ids::{MacroLinkID, MacroNodeID, MesoLinkID, MesoNodeID, MicroNodeID, MovementID};
use crate::movement::MovementCompositeType;
use crate::types::BoundaryType;

/// Endpoint of a mesoscopic link. Anchored either to a macroscopic node (the
/// ends of a chain) or to an interior point on a cut macroscopic link.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MesoNode {
    pub id: MesoNodeID,
    pub loc: LonLat,
    pub loc_euclidean: Pt2D,
    pub macro_node_id: Option<MacroNodeID>,
    pub macro_link_id: Option<MacroLinkID>,
    pub zone_id: i64,
    pub activity_link_type: LinkType,
    pub boundary_type: BoundaryType,
    pub incoming_links: Vec<MesoLinkID>,
    pub outgoing_links: Vec<MesoLinkID>,
}

/// A sub-segment of a macroscopic link, or a turning-movement connector
/// between two chains.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MesoLink {
    pub id: MesoLinkID,
    pub source_node: MesoNodeID,
    pub target_node: MesoNodeID,
    pub lanes: usize,
    pub lanes_change: (i32, i32),
    pub geom: GpsPolyLine,
    pub geom_euclidean: PolyLine,
    pub length_meters: f64,

    /// `None` exactly for connectors.
    pub macro_link_id: Option<MacroLinkID>,
    /// The owning intersection; set only for connectors.
    pub macro_node_id: Option<MacroNodeID>,
    pub is_connection: bool,

    pub movement_id: Option<MovementID>,
    pub movement_composite_type: MovementCompositeType,
    pub movement_link_income: Option<MesoLinkID>,
    pub movement_link_outcome: Option<MesoLinkID>,
    /// 0-based first lane of the movement on the income link.
    pub movement_income_lane_start: usize,
    /// 0-based first lane of the movement on the outcome link.
    pub movement_outcome_lane_start: usize,

    pub control_type: ControlType,
    pub link_type: LinkType,
    pub free_speed: f64,
    pub capacity: i64,
    pub allowed_agents: Vec<AgentType>,

    /// Microscopic bookkeeping: node chains per lane, filled by the
    /// microscopic builder.
    pub micro_nodes_per_lane: Vec<Vec<MicroNodeID>>,
    pub micro_nodes_bike: Vec<MicroNodeID>,
    pub micro_nodes_walk: Vec<MicroNodeID>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MesoNetwork {
    pub nodes: BTreeMap<MesoNodeID, MesoNode>,
    pub links: BTreeMap<MesoLinkID, MesoLink>,
    /// How many mesoscopic nodes each macroscopic node has expanded into;
    /// drives the `macro_id * 100 + counter` id scheme.
    pub expanded_nodes: BTreeMap<MacroNodeID, i64>,
    pub next_link_id: i64,
}

impl MesoNetwork {
    pub fn new() -> MesoNetwork {
        MesoNetwork {
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
            expanded_nodes: BTreeMap::new(),
            next_link_id: 0,
        }
    }

    /// Issues the next mesoscopic node id anchored at the given macroscopic
    /// node.
    pub fn next_node_id(&mut self, anchor: MacroNodeID) -> MesoNodeID {
        let counter = self.expanded_nodes.entry(anchor).or_insert(0);
        let id = MesoNodeID(anchor.0 * 100 + *counter);
        *counter += 1;
        id
    }
}
