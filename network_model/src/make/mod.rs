//! Construction of the three network layers from the prepared raw extract.

mod activity;
mod connections;
mod links;
mod mesoscopic;
mod microscopic;
mod movements;

use anyhow::Result;
use netutil::Timer;
use raw_net::RawExtract;

use crate::LayeredNetwork;

pub use self::microscopic::MicroOptions;

/// Runs the whole pipeline: macroscopic links and movements, the offset/cut
/// mesoscopic graph with connectors, and the microscopic cell graph.
pub fn build_network(
    raw: &RawExtract,
    micro_opts: &MicroOptions,
    timer: &mut Timer,
) -> Result<LayeredNetwork> {
    let mut macro_net = links::build_macro_network(raw, timer)?;
    movements::generate_movements(&mut macro_net, &raw.restrictions, timer)?;
    activity::assign_activity_and_boundary(&mut macro_net)?;

    let mut meso_net = mesoscopic::build_meso_network(&mut macro_net, timer)?;
    let micro_net = microscopic::build_micro_network(&macro_net, &mut meso_net, micro_opts, timer)?;

    let network = LayeredNetwork {
        macro_net,
        meso_net,
        micro_net,
    };
    network.warn_orphans();
    Ok(network)
}
