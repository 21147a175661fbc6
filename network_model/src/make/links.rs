//! Macroscopic nodes and links from the prepared raw extract: walk each
//! retained way, split it at crossing nodes, and issue one directed link per
//! segment (two for bidirectional ways).

use std::collections::BTreeMap;

use anyhow::Result;
use geom::GpsPolyLine;
use netutil::Timer;
use raw_net::{
    default_capacity, default_lanes, default_speed, osm, ControlType, RawExtract, RawNode, RawWay,
};

use crate::error::NetError;
use crate::ids::{MacroLinkID, MacroNodeID};
use crate::macroscopic::{MacroLink, MacroNetwork, MacroNode};

#[derive(Clone, Copy, PartialEq)]
enum Direction {
    Forward,
    Backward,
}

pub fn build_macro_network(raw: &RawExtract, timer: &mut Timer) -> Result<MacroNetwork> {
    timer.start("build macroscopic network");
    let mut net = MacroNetwork::new();
    let mut next_node_id = 0;
    let mut next_link_id = 0;
    let mut observed: BTreeMap<osm::NodeID, MacroNodeID> = BTreeMap::new();

    timer.start_iter("split ways into links", raw.ways.len());
    for way in &raw.ways {
        timer.next();
        if way.is_pure_cycle {
            continue;
        }
        for segment in way.segments(&raw.nodes) {
            let source = issue_node(&mut net, &mut observed, &mut next_node_id, segment[0], raw)?;
            let target = issue_node(
                &mut net,
                &mut observed,
                &mut next_node_id,
                *segment.last().unwrap(),
                raw,
            )?;

            let segment_nodes: Vec<&RawNode> = segment
                .iter()
                .map(|id| {
                    raw.nodes
                        .get(id)
                        .ok_or_else(|| NetError::DanglingReference(format!("node {} of way {}", id, way.id)))
                })
                .collect::<Result<_, _>>()?;

            let forward = make_link(
                MacroLinkID(next_link_id),
                source,
                target,
                way,
                &segment_nodes,
                Direction::Forward,
            );
            next_link_id += 1;
            attach(&mut net, forward);

            if !way.oneway {
                let backward = make_link(
                    MacroLinkID(next_link_id),
                    target,
                    source,
                    way,
                    &segment_nodes,
                    Direction::Backward,
                );
                next_link_id += 1;
                attach(&mut net, backward);
            }
        }
    }

    for link in net.links.values_mut() {
        link.prepare_lane_table();
    }

    timer.stop("build macroscopic network");
    Ok(net)
}

fn issue_node(
    net: &mut MacroNetwork,
    observed: &mut BTreeMap<osm::NodeID, MacroNodeID>,
    next_id: &mut i64,
    osm_id: osm::NodeID,
    raw: &RawExtract,
) -> Result<MacroNodeID, NetError> {
    if let Some(id) = observed.get(&osm_id) {
        return Ok(*id);
    }
    let raw_node = raw
        .nodes
        .get(&osm_id)
        .ok_or_else(|| NetError::DanglingReference(format!("node {}", osm_id)))?;
    let id = MacroNodeID(*next_id);
    *next_id += 1;
    net.nodes.insert(id, MacroNode::new(id, raw_node));
    observed.insert(osm_id, id);
    Ok(id)
}

fn attach(net: &mut MacroNetwork, link: MacroLink) {
    net.nodes
        .get_mut(&link.source_node)
        .unwrap()
        .outgoing_links
        .push(link.id);
    net.nodes
        .get_mut(&link.target_node)
        .unwrap()
        .incoming_links
        .push(link.id);
    net.links.insert(link.id, link);
}

fn make_link(
    id: MacroLinkID,
    source: MacroNodeID,
    target: MacroNodeID,
    way: &RawWay,
    segment_nodes: &[&RawNode],
    direction: Direction,
) -> MacroLink {
    let lanes = derive_lanes(way, direction);

    let (free_speed, max_speed) = if way.max_speed >= 0.0 {
        (way.max_speed, way.max_speed)
    } else {
        let speed = default_speed(way.link_type);
        (speed, speed)
    };

    // A segment is under signal control if any interior node carries a
    // traffic signal; the endpoints belong to the intersections.
    let mut control_type = ControlType::NotSignal;
    for node in &segment_nodes[1..segment_nodes.len() - 1] {
        if node.control_type == ControlType::Signal {
            control_type = ControlType::Signal;
        }
    }

    let mut pts: Vec<geom::LonLat> = segment_nodes.iter().map(|n| n.loc).collect();
    if direction == Direction::Backward {
        pts.reverse();
    }
    let geom = GpsPolyLine::new(pts);
    let geom_euclidean = geom.to_euclidean();
    let length_meters = geom.length_meters();

    let (source_osm, target_osm) = match direction {
        Direction::Forward => (segment_nodes[0].id, segment_nodes.last().unwrap().id),
        Direction::Backward => (segment_nodes.last().unwrap().id, segment_nodes[0].id),
    };

    MacroLink {
        id,
        source_node: source,
        target_node: target,
        source_osm_node_id: source_osm,
        target_osm_node_id: target_osm,
        osm_way_id: way.id,
        name: way.name.clone(),
        link_class: way.link_class,
        link_type: way.link_type,
        is_link: way.is_link,
        control_type,
        allowed_agents: way.allowed_agents.clone(),
        was_bidirectional: !way.oneway,
        geom_offset: geom.clone(),
        geom_euclidean_offset: geom_euclidean.clone(),
        geom,
        geom_euclidean,
        length_meters,
        lanes,
        free_speed,
        max_speed,
        capacity: default_capacity(way.link_type),
        breakpoints: Vec::new(),
        lanes_list: Vec::new(),
        lanes_change: Vec::new(),
        lanes_list_cut: Vec::new(),
        lanes_change_cut: Vec::new(),
        geom_offset_cut: Vec::new(),
        length_meters_offset: length_meters,
        downstream_shortcut: false,
        upstream_shortcut: false,
        downstream_is_target: false,
        upstream_is_target: false,
        upstream_cut_len: 0.0,
        downstream_cut_len: 0.0,
        meso_links: Vec::new(),
    }
}

fn derive_lanes(way: &RawWay, direction: Direction) -> usize {
    let lanes = if way.oneway {
        way.lanes
    } else {
        match direction {
            Direction::Forward => {
                if way.lanes_forward > 0 {
                    way.lanes_forward
                } else if way.lanes > 0 {
                    (way.lanes as f64 / 2.0).ceil() as i32
                } else {
                    -1
                }
            }
            Direction::Backward => {
                if way.lanes_backward > 0 {
                    way.lanes_backward
                } else if way.lanes > 0 {
                    (way.lanes as f64 / 2.0).ceil() as i32
                } else {
                    -1
                }
            }
        }
    };
    if lanes > 0 {
        lanes as usize
    } else {
        default_lanes(way.link_type)
    }
}
