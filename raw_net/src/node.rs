use serde::{Deserialize, Serialize};

use geom::LonLat;

use crate::osm::NodeID;
use crate::types::ControlType;

/// An OSM node touched by at least one retained way.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawNode {
    pub id: NodeID,
    pub loc: LonLat,
    pub name: String,
    pub highway: String,
    pub control_type: ControlType,
    /// How many way traversals touch this node; way endpoints count twice.
    pub use_count: usize,
    pub is_crossing: bool,
}

impl RawNode {
    pub fn new(id: NodeID, loc: LonLat, name: String, highway: String) -> RawNode {
        let control_type = if highway == "traffic_signals" {
            ControlType::Signal
        } else {
            ControlType::NotSignal
        };
        RawNode {
            id,
            loc,
            name,
            highway,
            control_type,
            use_count: 0,
            is_crossing: false,
        }
    }
}
