//! The three-layer traffic network: macroscopic links with turning
//! movements, the mesoscopic offset/cut graph with movement connectors, and
//! the microscopic cell graph. Layers reference each other by id only.

#[macro_use]
extern crate log;

mod error;
pub mod export;
mod ids;
mod macroscopic;
pub mod make;
mod mesoscopic;
mod microscopic;
pub mod movement;
mod types;

pub use crate::error::NetError;
pub use crate::ids::{
    MacroLinkID, MacroNodeID, MesoLinkID, MesoNodeID, MicroLinkID, MicroNodeID, MovementID,
};
pub use crate::macroscopic::{lane_indices, MacroLink, MacroNetwork, MacroNode};
pub use crate::mesoscopic::{MesoLink, MesoNetwork, MesoNode};
pub use crate::microscopic::{MicroLink, MicroNetwork, MicroNode, BIKE_LANE_ID, WALK_LANE_ID};
pub use crate::movement::{Movement, MovementCompositeType, MovementType};
pub use crate::types::{ActivityType, BoundaryType, CellType};

/// The finished product of the pipeline.
pub struct LayeredNetwork {
    pub macro_net: MacroNetwork,
    pub meso_net: MesoNetwork,
    pub micro_net: MicroNetwork,
}

impl LayeredNetwork {
    /// Orphan detection: links whose endpoints are gone indicate a builder
    /// bug, nodes that nothing references are merely untidy. Both warn.
    pub fn warn_orphans(&self) {
        for link in self.meso_net.links.values() {
            if !self.meso_net.nodes.contains_key(&link.source_node)
                || !self.meso_net.nodes.contains_key(&link.target_node)
            {
                warn!("Mesoscopic link {} references a deleted node", link.id);
            }
        }
        for link in self.micro_net.links.values() {
            if !self.micro_net.nodes.contains_key(&link.source_node)
                || !self.micro_net.nodes.contains_key(&link.target_node)
            {
                warn!("Microscopic link {} references a deleted node", link.id);
            }
        }
    }
}
