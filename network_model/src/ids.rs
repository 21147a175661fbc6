//! Opaque ids for every output kind. Each layer issues its own ids from a
//! single monotonic counter, and the newtypes keep them from being mixed up
//! across layers.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! network_id {
    ($name:ident) => {
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

network_id!(MacroNodeID);
network_id!(MacroLinkID);
network_id!(MesoNodeID);
network_id!(MesoLinkID);
network_id!(MicroNodeID);
network_id!(MicroLinkID);
network_id!(MovementID);
