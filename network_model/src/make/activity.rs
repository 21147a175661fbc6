//! Node classification after links and movements exist: the dominant link
//! type around each node, its boundary role, and zone seeding for boundary
//! nodes.

use std::collections::BTreeMap;

use anyhow::Result;
use raw_net::LinkType;

use crate::error::NetError;
use crate::ids::MacroNodeID;
use crate::macroscopic::MacroNetwork;
use crate::types::{ActivityType, BoundaryType};

pub fn assign_activity_and_boundary(net: &mut MacroNetwork) -> Result<()> {
    let mut link_type_counts: BTreeMap<MacroNodeID, BTreeMap<LinkType, usize>> = BTreeMap::new();
    for link in net.links.values() {
        for node_id in [link.source_node, link.target_node] {
            if !net.nodes.contains_key(&node_id) {
                return Err(NetError::InconsistentTopology(format!(
                    "link {} references missing node {}",
                    link.id, node_id
                ))
                .into());
            }
            *link_type_counts
                .entry(node_id)
                .or_default()
                .entry(link.link_type)
                .or_insert(0) += 1;
        }
    }

    for (node_id, node) in net.nodes.iter_mut() {
        if node.poi_id > -1 {
            node.activity_type = ActivityType::Poi;
            node.activity_link_type = LinkType::Undefined;
            continue;
        }
        if let Some(counts) = link_type_counts.get(node_id) {
            let (link_type, _) = counts
                .iter()
                .max_by_key(|(_, count)| **count)
                .expect("a counted node has at least one link");
            node.activity_type = ActivityType::Link;
            node.activity_link_type = *link_type;
        } else {
            node.activity_type = ActivityType::None;
            node.activity_link_type = LinkType::Undefined;
        }
    }

    // Boundary roles need the link endpoints, so a separate pass
    let mut boundaries: BTreeMap<MacroNodeID, BoundaryType> = BTreeMap::new();
    for (node_id, node) in &net.nodes {
        if node.activity_type == ActivityType::Poi {
            continue;
        }
        let boundary = if node.outgoing_links.is_empty() {
            BoundaryType::IncomeOnly
        } else if node.incoming_links.is_empty() {
            BoundaryType::OutcomeOnly
        } else if node.incoming_links.len() == 1 && node.outgoing_links.len() == 1 {
            let incoming = &net.links[&node.incoming_links[0]];
            let outgoing = &net.links[&node.outgoing_links[0]];
            // A dead-end stub of a bidirectional pair
            if incoming.source_node == outgoing.target_node {
                BoundaryType::IncomeOutcome
            } else {
                BoundaryType::None
            }
        } else {
            BoundaryType::None
        };
        boundaries.insert(*node_id, boundary);
    }
    for (node_id, boundary) in boundaries {
        let node = net.nodes.get_mut(&node_id).unwrap();
        node.boundary_type = boundary;
        if boundary != BoundaryType::None {
            node.zone_id = node_id.0;
        }
    }

    Ok(())
}
