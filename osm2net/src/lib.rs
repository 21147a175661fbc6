//! Converts an OSM extract into the three-layer traffic network and writes
//! the CSV tables.

#[macro_use]
extern crate log;

mod reader;

use anyhow::Result;

use netutil::Timer;
use network_model::make::{build_network, MicroOptions};
use network_model::LayeredNetwork;
use raw_net::AgentType;

pub use crate::reader::read_osm;

pub struct Options {
    pub osm_input: String,
    pub output: String,
    /// Ways are kept iff their own agent set intersects this one.
    pub allowed_agents: Vec<AgentType>,
    pub separate_bike_walk_lanes: bool,
}

impl Options {
    pub fn new(osm_input: String, output: String) -> Options {
        Options {
            osm_input,
            output,
            allowed_agents: vec![AgentType::Auto],
            separate_bike_walk_lanes: false,
        }
    }
}

pub fn convert(opts: &Options, timer: &mut Timer) -> Result<LayeredNetwork> {
    let mut raw = reader::read_osm(&opts.osm_input, timer)?;

    timer.start("prepare raw model");
    raw.prepare(&opts.allowed_agents);
    timer.stop("prepare raw model");
    info!(
        "Raw model: {} ways, {} nodes, {} restrictions",
        raw.ways.len(),
        raw.nodes.len(),
        raw.restrictions.len()
    );

    let micro_opts = MicroOptions {
        separate_bike_walk_lanes: opts.separate_bike_walk_lanes,
    };
    build_network(&raw, &micro_opts, timer)
}
