//! Turning-movement generation at every macroscopic node, with turn
//! restrictions applied before lanes are distributed.

use anyhow::Result;
use netutil::{MultiMap, Timer};
use raw_net::{osm, Restriction, RestrictionKind};

use crate::ids::{MacroNodeID, MovementID};
use crate::macroscopic::{MacroLink, MacroNetwork};
use crate::make::connections::{diverge_connections, merge_connections, ConnectionSpan};
use crate::movement::{classify_movement, movement_geometry, Movement};

pub fn generate_movements(
    net: &mut MacroNetwork,
    restrictions: &[Restriction],
    timer: &mut Timer,
) -> Result<()> {
    timer.start("generate movements");

    // Restrictions resolve through their via node; anything else is
    // unsupported and skipped up front.
    let mut by_via: MultiMap<i64, usize> = MultiMap::new();
    for (idx, restriction) in restrictions.iter().enumerate() {
        if restriction.via.kind != RestrictionKind::Node {
            warn!(
                "Restriction '{}' via a {:?} is not supported; skipping it",
                restriction.category, restriction.via.kind
            );
            continue;
        }
        if restriction.from.kind != RestrictionKind::Way || restriction.to.kind != RestrictionKind::Way
        {
            warn!(
                "Restriction '{}' with non-way from/to members; skipping it",
                restriction.category
            );
            continue;
        }
        by_via.insert(restriction.via.id, idx);
    }

    let node_ids: Vec<MacroNodeID> = net.nodes.keys().copied().collect();
    let mut next_movement_id = 0;

    for node_id in node_ids {
        let movements = movements_for_node(net, node_id, restrictions, &by_via, &mut next_movement_id);
        let node = net.nodes.get_mut(&node_id).unwrap();
        for movement in movements {
            node.movements.push(movement.id);
            net.movements.insert(movement.id, movement);
        }
    }

    timer.stop("generate movements");
    Ok(())
}

fn movements_for_node(
    net: &MacroNetwork,
    node_id: MacroNodeID,
    restrictions: &[Restriction],
    by_via: &MultiMap<i64, usize>,
    next_movement_id: &mut i64,
) -> Vec<Movement> {
    let node = &net.nodes[&node_id];
    if node.incoming_links.is_empty() || node.outgoing_links.is_empty() {
        return Vec::new();
    }

    let mut result = Vec::new();

    if node.outgoing_links.len() == 1 {
        // Merge: all incoming links share the sole outgoing one
        let outgoing = &net.links[&node.outgoing_links[0]];
        let incoming: Vec<&MacroLink> = node
            .incoming_links
            .iter()
            .map(|id| &net.links[id])
            .filter(|link| link.source_node != outgoing.target_node)
            .filter(|link| {
                turn_allowed(restrictions, by_via, node.osm_node_id, link.osm_way_id, outgoing.osm_way_id)
            })
            .collect();
        if incoming.is_empty() {
            return result;
        }

        let spans = merge_connections(outgoing, &incoming);
        for (link, span) in incoming.iter().zip(spans.iter()) {
            if let Some(movement) =
                build_movement(node_id, net, link, outgoing, *span, next_movement_id)
            {
                result.push(movement);
            }
        }
    } else {
        // Diverge / intersection: each incoming link fans out on its own
        for incoming_id in &node.incoming_links {
            let incoming = &net.links[incoming_id];
            let outgoing: Vec<&MacroLink> = node
                .outgoing_links
                .iter()
                .map(|id| &net.links[id])
                .filter(|link| incoming.source_node != link.target_node)
                .filter(|link| {
                    turn_allowed(
                        restrictions,
                        by_via,
                        node.osm_node_id,
                        incoming.osm_way_id,
                        link.osm_way_id,
                    )
                })
                .collect();
            if outgoing.is_empty() {
                continue;
            }

            let spans = diverge_connections(incoming, &outgoing);
            for (link, span) in outgoing.iter().zip(spans.iter()) {
                if let Some(movement) =
                    build_movement(node_id, net, incoming, link, *span, next_movement_id)
                {
                    result.push(movement);
                }
            }
        }
    }
    result
}

/// Whether the (from, to) turn through this node survives the restriction
/// set: `only_*` whitelists a single target, `no_*` blacklists one pair.
fn turn_allowed(
    restrictions: &[Restriction],
    by_via: &MultiMap<i64, usize>,
    via: osm::NodeID,
    from_way: osm::WayID,
    to_way: osm::WayID,
) -> bool {
    for idx in by_via.get(&via.0) {
        let restriction = &restrictions[*idx];
        if restriction.from.id != from_way.0 {
            continue;
        }
        if restriction.is_mandatory() {
            if restriction.to.id != to_way.0 {
                return false;
            }
        } else if restriction.to.id == to_way.0 {
            return false;
        }
    }
    true
}

fn build_movement(
    node_id: MacroNodeID,
    net: &MacroNetwork,
    incoming: &MacroLink,
    outgoing: &MacroLink,
    span: ConnectionSpan,
    next_movement_id: &mut i64,
) -> Option<Movement> {
    let income_indices = incoming.outgoing_lane_indices();
    let outcome_indices = outgoing.incoming_lane_indices();

    let (income_start, income_end) = span.income;
    let (outcome_start, outcome_end) = span.outcome;
    if income_start < 0 || outcome_start < 0 || income_end < income_start || outcome_end < outcome_start
    {
        warn!(
            "Movement {} -> {} got an empty or negative lane span; skipping it",
            incoming.id, outgoing.id
        );
        return None;
    }
    if income_end as usize >= income_indices.len() || outcome_end as usize >= outcome_indices.len() {
        warn!(
            "Movement {} -> {} lane span exceeds the lane table; skipping it",
            incoming.id, outgoing.id
        );
        return None;
    }

    let node = &net.nodes[&node_id];
    let (composite_type, movement_type) =
        classify_movement(&incoming.geom_euclidean, &outgoing.geom_euclidean);

    let movement = Movement {
        id: MovementID(*next_movement_id),
        node_id,
        osm_node_id: node.osm_node_id,
        incoming_link: incoming.id,
        outgoing_link: outgoing.id,
        from_osm_node_id: incoming.source_osm_node_id,
        to_osm_node_id: outgoing.target_osm_node_id,
        income_lane_seq: (income_start as usize, income_end as usize),
        outcome_lane_seq: (outcome_start as usize, outcome_end as usize),
        income_lane_start: income_indices[income_start as usize],
        income_lane_end: income_indices[income_end as usize],
        outcome_lane_start: outcome_indices[outcome_start as usize],
        outcome_lane_end: outcome_indices[outcome_end as usize],
        lanes_num: (income_end - income_start + 1) as usize,
        composite_type,
        movement_type,
        control_type: node.control_type,
        allowed_agents: incoming.allowed_agents.clone(),
        geom: movement_geometry(&incoming.geom, &outgoing.geom),
    };
    *next_movement_id += 1;
    Some(movement)
}
