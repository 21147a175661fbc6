//! Mesoscopic layer: offset the bidirectional pairs apart, trim every link's
//! ends to make room for turning geometry, chain the remaining sub-segments
//! into meso links, and wire intersections with movement connectors (or
//! collapse them entirely when they're pure merges/diverges).

use anyhow::Result;
use netutil::Timer;
use raw_net::ControlType;

use crate::error::NetError;
use crate::ids::{MacroLinkID, MacroNodeID, MesoLinkID, MesoNodeID};
use crate::macroscopic::MacroNetwork;
use crate::mesoscopic::{MesoLink, MesoNetwork, MesoNode};
use crate::movement::{Movement, MovementCompositeType};
use crate::types::{BoundaryType, LANE_WIDTH};

pub fn build_meso_network(macro_net: &mut MacroNetwork, timer: &mut Timer) -> Result<MesoNetwork> {
    timer.start("build mesoscopic network");

    offset_reverse_pairs(macro_net);
    analyze_shortcuts(macro_net);
    for link in macro_net.links.values_mut() {
        link.calc_cut_len();
        link.perform_cut();
    }

    let mut meso = MesoNetwork::new();
    generate_links(&mut meso, macro_net)?;
    classify_boundaries(&mut meso, macro_net);
    connect_movements(&mut meso, macro_net)?;

    timer.stop("build mesoscopic network");
    Ok(meso)
}

/// Finds links whose Euclidean geometry is exactly the reverse of another's
/// and pushes each of them to its own right-hand side, so the two
/// carriageways stop overlapping.
fn offset_reverse_pairs(macro_net: &mut MacroNetwork) {
    let ids: Vec<MacroLinkID> = macro_net.links.keys().copied().collect();
    let mut needs_offset = vec![false; ids.len()];
    for i in 0..ids.len() {
        if needs_offset[i] {
            continue;
        }
        let reversed = macro_net.links[&ids[i]].geom_euclidean.reversed();
        for j in i + 1..ids.len() {
            if macro_net.links[&ids[j]].geom_euclidean == reversed {
                needs_offset[i] = true;
                needs_offset[j] = true;
                break;
            }
        }
    }

    for (idx, id) in ids.iter().enumerate() {
        let link = macro_net.links.get_mut(id).unwrap();
        if needs_offset[idx] {
            let half_lanes = (link.max_lanes() as f64 / 2.0).ceil();
            let distance = 2.0 * (half_lanes + 0.5) * LANE_WIDTH;
            link.geom_euclidean_offset = link.geom_euclidean.shift_right(distance);
            link.geom_offset = link.geom_euclidean_offset.to_gps();
        }
        // Offsetting changed the length; keep breakpoints as fractions of it
        let new_length = (link.geom_offset.length_meters() * 100.0).round() / 100.0;
        for bp in link.breakpoints.iter_mut() {
            *bp = (*bp / link.length_meters) * new_length;
        }
        link.length_meters_offset = new_length;
    }
}

/// A non-signalised node whose movements all target distinct links on its
/// single-link side doesn't need connector geometry at all; flag the links
/// so the cut step only trims a sliver and the intersection gets collapsed.
fn analyze_shortcuts(macro_net: &mut MacroNetwork) {
    struct Shortcut {
        node: MacroNodeID,
        downstream_target: Option<MacroLinkID>,
        upstream_links: Vec<MacroLinkID>,
        upstream_target: Option<MacroLinkID>,
        downstream_links: Vec<MacroLinkID>,
    }

    let mut shortcuts = Vec::new();
    for (node_id, node) in &macro_net.nodes {
        if node.control_type == ControlType::Signal {
            continue;
        }
        if node.incoming_links.len() == 1 && !node.outgoing_links.is_empty() {
            let mut seen = Vec::new();
            let mut duplicated = false;
            for movement_id in &node.movements {
                let target = macro_net.movements[movement_id].outgoing_link;
                if seen.contains(&target) {
                    duplicated = true;
                    break;
                }
                seen.push(target);
            }
            if !duplicated {
                shortcuts.push(Shortcut {
                    node: *node_id,
                    downstream_target: Some(node.incoming_links[0]),
                    upstream_links: node.outgoing_links.clone(),
                    upstream_target: None,
                    downstream_links: Vec::new(),
                });
            }
        } else if node.outgoing_links.len() == 1 && !node.incoming_links.is_empty() {
            let mut seen = Vec::new();
            let mut duplicated = false;
            for movement_id in &node.movements {
                let source = macro_net.movements[movement_id].incoming_link;
                if seen.contains(&source) {
                    duplicated = true;
                    break;
                }
                seen.push(source);
            }
            if !duplicated {
                shortcuts.push(Shortcut {
                    node: *node_id,
                    downstream_target: None,
                    upstream_links: Vec::new(),
                    upstream_target: Some(node.outgoing_links[0]),
                    downstream_links: node.incoming_links.clone(),
                });
            }
        }
    }

    for shortcut in shortcuts {
        macro_net
            .nodes
            .get_mut(&shortcut.node)
            .unwrap()
            .movement_is_needed = false;
        if let Some(id) = shortcut.downstream_target {
            let link = macro_net.links.get_mut(&id).unwrap();
            link.downstream_shortcut = true;
            link.downstream_is_target = true;
        }
        for id in shortcut.upstream_links {
            macro_net.links.get_mut(&id).unwrap().upstream_shortcut = true;
        }
        if let Some(id) = shortcut.upstream_target {
            let link = macro_net.links.get_mut(&id).unwrap();
            link.upstream_shortcut = true;
            link.upstream_is_target = true;
        }
        for id in shortcut.downstream_links {
            macro_net.links.get_mut(&id).unwrap().downstream_shortcut = true;
        }
    }
}

/// Chains every macroscopic link's cut sub-segments into meso nodes and
/// links. The first node of a chain carries the macro source identity, the
/// last one the macro target identity; interior nodes belong to the link.
fn generate_links(meso: &mut MesoNetwork, macro_net: &mut MacroNetwork) -> Result<()> {
    let link_ids: Vec<MacroLinkID> = macro_net.links.keys().copied().collect();

    for link_id in link_ids {
        let link = &macro_net.links[&link_id];
        let source_id = link.source_node;
        let target_id = link.target_node;
        let segments = link.geom_offset_cut.clone();
        let lanes_list = link.lanes_list_cut.clone();
        let lanes_change = link.lanes_change_cut.clone();

        let source = macro_net
            .nodes
            .get(&source_id)
            .ok_or_else(|| NetError::InconsistentTopology(format!("source node {} of link {}", source_id, link_id)))?;
        let target = macro_net
            .nodes
            .get(&target_id)
            .ok_or_else(|| NetError::InconsistentTopology(format!("target node {} of link {}", target_id, link_id)))?;
        let (source_zone, source_activity) = (source.zone_id, source.activity_link_type);
        let (target_zone, target_activity) = (target.zone_id, target.activity_link_type);
        let inherit = {
            let link = &macro_net.links[&link_id];
            (
                link.link_type,
                link.free_speed,
                link.capacity,
                link.allowed_agents.clone(),
            )
        };

        let up_id = meso.next_node_id(source_id);
        let first_pt = segments[0].first_pt();
        meso.nodes.insert(
            up_id,
            MesoNode {
                id: up_id,
                loc: first_pt,
                loc_euclidean: first_pt.to_pt2d(),
                macro_node_id: Some(source_id),
                macro_link_id: None,
                zone_id: source_zone,
                activity_link_type: source_activity,
                boundary_type: BoundaryType::None,
                incoming_links: Vec::new(),
                outgoing_links: Vec::new(),
            },
        );

        let mut chain = Vec::new();
        let mut upstream = up_id;
        for (idx, segment) in segments.iter().enumerate() {
            let is_last = idx == segments.len() - 1;
            let down_id = meso.next_node_id(target_id);
            let last_pt = segment.last_pt();
            let mut down = MesoNode {
                id: down_id,
                loc: last_pt,
                loc_euclidean: last_pt.to_pt2d(),
                macro_node_id: None,
                macro_link_id: Some(link_id),
                zone_id: -1,
                activity_link_type: raw_net::LinkType::Undefined,
                boundary_type: BoundaryType::None,
                incoming_links: Vec::new(),
                outgoing_links: Vec::new(),
            };
            if is_last {
                down.macro_node_id = Some(target_id);
                down.macro_link_id = None;
                down.zone_id = target_zone;
                down.activity_link_type = target_activity;
            }
            meso.nodes.insert(down_id, down);

            let meso_link_id = MesoLinkID(meso.next_link_id);
            meso.next_link_id += 1;
            let geom_euclidean = segment.to_euclidean();
            let meso_link = MesoLink {
                id: meso_link_id,
                source_node: upstream,
                target_node: down_id,
                lanes: lanes_list[idx],
                lanes_change: lanes_change[idx],
                length_meters: segment.length_meters(),
                geom: segment.clone(),
                geom_euclidean,
                macro_link_id: Some(link_id),
                macro_node_id: None,
                is_connection: false,
                movement_id: None,
                movement_composite_type: MovementCompositeType::None,
                movement_link_income: None,
                movement_link_outcome: None,
                movement_income_lane_start: 0,
                movement_outcome_lane_start: 0,
                control_type: ControlType::NotSignal,
                link_type: inherit.0,
                free_speed: inherit.1,
                capacity: inherit.2,
                allowed_agents: inherit.3.clone(),
                micro_nodes_per_lane: Vec::new(),
                micro_nodes_bike: Vec::new(),
                micro_nodes_walk: Vec::new(),
            };

            meso.nodes.get_mut(&upstream).unwrap().outgoing_links.push(meso_link_id);
            meso.nodes.get_mut(&down_id).unwrap().incoming_links.push(meso_link_id);
            meso.links.insert(meso_link_id, meso_link);
            chain.push(meso_link_id);
            upstream = down_id;
        }

        macro_net.links.get_mut(&link_id).unwrap().meso_links = chain;
    }
    Ok(())
}

fn classify_boundaries(meso: &mut MesoNetwork, macro_net: &MacroNetwork) {
    for node in meso.nodes.values_mut() {
        match (node.macro_node_id, node.macro_link_id) {
            (None, None) => {
                warn!(
                    "Suspicious mesoscopic node {}: neither macroscopic node nor link is set",
                    node.id
                );
                node.boundary_type = BoundaryType::None;
            }
            (None, Some(_)) => {
                node.boundary_type = BoundaryType::None;
            }
            (Some(macro_node_id), _) => {
                let macro_node = &macro_net.nodes[&macro_node_id];
                if macro_node.boundary_type == BoundaryType::IncomeOutcome {
                    node.boundary_type = if !node.incoming_links.is_empty() {
                        BoundaryType::IncomeOnly
                    } else {
                        BoundaryType::OutcomeOnly
                    };
                } else {
                    node.boundary_type = macro_node.boundary_type;
                }
            }
        }
    }
}

/// Maps a movement's 1-based lane numbers onto 0-based lane positions of the
/// two mesoscopic links it joins. `None` means the movement is inconsistent
/// with the lane tables and gets skipped (with a warning).
pub(crate) fn movement_lane_spans(
    movement: &Movement,
    income: &MesoLink,
    outcome: &MesoLink,
) -> Option<(usize, usize, usize)> {
    let income_lanes: Vec<i32> = (movement.income_lane_start..=movement.income_lane_end).collect();
    let outcome_lanes: Vec<i32> = (movement.outcome_lane_start..=movement.outcome_lane_end).collect();

    if income_lanes.is_empty() || income_lanes.len() != outcome_lanes.len() {
        warn!(
            "Income and outcome lane count mismatch for movement {}: {} vs {}; skipping it",
            movement.id,
            income_lanes.len(),
            outcome_lanes.len()
        );
        return None;
    }
    // Lane 0 is an unused sentinel in the 1-based numbering
    if income_lanes.contains(&0) || outcome_lanes.contains(&0) {
        warn!("Movement {} references sentinel lane 0; skipping it", movement.id);
        return None;
    }

    let adjust = |lane: i32, change_left: i32| -> i32 {
        let mut idx = change_left + lane;
        if lane >= 0 {
            idx -= 1;
        }
        idx
    };
    let income_start = adjust(income_lanes[0], income.lanes_change.0);
    let income_end = adjust(*income_lanes.last().unwrap(), income.lanes_change.0);
    let outcome_start = adjust(outcome_lanes[0], outcome.lanes_change.0);
    let outcome_end = adjust(*outcome_lanes.last().unwrap(), outcome.lanes_change.0);

    if income_start < 0 || outcome_start < 0 {
        warn!("Movement {} got a negative lane index; skipping it", movement.id);
        return None;
    }
    if income_end > income.lanes as i32 - 1 || outcome_end > outcome.lanes as i32 - 1 {
        warn!(
            "Movement {} lane index exceeds the mesoscopic lane count; skipping it",
            movement.id
        );
        return None;
    }

    Some((income_start as usize, outcome_start as usize, income_lanes.len()))
}

/// Builds one connector meso link per movement at intersections that keep
/// their movements, and collapses the ones that don't.
fn connect_movements(meso: &mut MesoNetwork, macro_net: &MacroNetwork) -> Result<()> {
    for node in macro_net.nodes.values() {
        for movement_id in &node.movements {
            let movement = &macro_net.movements[movement_id];
            let income_macro = macro_net.links.get(&movement.incoming_link).ok_or_else(|| {
                NetError::InconsistentTopology(format!("incoming link {} of movement {}", movement.incoming_link, movement_id))
            })?;
            let outcome_macro = macro_net.links.get(&movement.outgoing_link).ok_or_else(|| {
                NetError::InconsistentTopology(format!("outgoing link {} of movement {}", movement.outgoing_link, movement_id))
            })?;

            let income_meso_id = *income_macro.meso_links.last().ok_or_else(|| {
                NetError::InconsistentTopology(format!("link {} has no mesoscopic chain", income_macro.id))
            })?;
            let outcome_meso_id = *outcome_macro.meso_links.first().ok_or_else(|| {
                NetError::InconsistentTopology(format!("link {} has no mesoscopic chain", outcome_macro.id))
            })?;

            let spans = {
                let income_meso = &meso.links[&income_meso_id];
                let outcome_meso = &meso.links[&outcome_meso_id];
                movement_lane_spans(movement, income_meso, outcome_meso)
            };
            let Some((income_lane_start, outcome_lane_start, lanes)) = spans else {
                continue;
            };

            if node.movement_is_needed {
                let (source_node, geom_start, inherit) = {
                    let income_meso = &meso.links[&income_meso_id];
                    (
                        income_meso.target_node,
                        income_meso.geom.last_pt(),
                        (
                            income_meso.link_type,
                            income_meso.free_speed,
                            income_meso.capacity,
                            income_meso.allowed_agents.clone(),
                        ),
                    )
                };
                let (target_node, geom_end) = {
                    let outcome_meso = &meso.links[&outcome_meso_id];
                    (outcome_meso.source_node, outcome_meso.geom.first_pt())
                };

                let geom = geom::GpsPolyLine::new(vec![geom_start, geom_end]);
                let connector_id = MesoLinkID(meso.next_link_id);
                meso.next_link_id += 1;
                let connector = MesoLink {
                    id: connector_id,
                    source_node,
                    target_node,
                    lanes,
                    lanes_change: (0, 0),
                    length_meters: geom.length_meters(),
                    geom_euclidean: geom.to_euclidean(),
                    geom,
                    macro_link_id: None,
                    macro_node_id: Some(node.id),
                    is_connection: true,
                    movement_id: Some(*movement_id),
                    movement_composite_type: movement.composite_type,
                    movement_link_income: Some(income_meso_id),
                    movement_link_outcome: Some(outcome_meso_id),
                    movement_income_lane_start: income_lane_start,
                    movement_outcome_lane_start: outcome_lane_start,
                    control_type: node.control_type,
                    link_type: inherit.0,
                    free_speed: inherit.1,
                    capacity: inherit.2,
                    allowed_agents: inherit.3,
                    micro_nodes_per_lane: Vec::new(),
                    micro_nodes_bike: Vec::new(),
                    micro_nodes_walk: Vec::new(),
                };

                meso.nodes
                    .get_mut(&connector.source_node)
                    .unwrap()
                    .outgoing_links
                    .push(connector_id);
                meso.nodes
                    .get_mut(&connector.target_node)
                    .unwrap()
                    .incoming_links
                    .push(connector_id);
                meso.links.insert(connector_id, connector);
            } else {
                let income_survives = node.incoming_links.len() == 1;
                short_circuit_merge(meso, income_survives, income_meso_id, outcome_meso_id);
            }
        }
    }
    Ok(())
}

/// Collapses a merge/diverge intersection: the two adjacent meso links are
/// joined end-to-end by rewriting one endpoint, and the orphaned meso node
/// disappears.
fn short_circuit_merge(
    meso: &mut MesoNetwork,
    income_survives: bool,
    income_id: MesoLinkID,
    outcome_id: MesoLinkID,
) {
    let (survivor, orphan) = if income_survives {
        (
            meso.links[&income_id].target_node,
            meso.links[&outcome_id].source_node,
        )
    } else {
        (
            meso.links[&outcome_id].source_node,
            meso.links[&income_id].target_node,
        )
    };
    if survivor == orphan {
        return;
    }

    let orphan_node = match meso.nodes.remove(&orphan) {
        Some(node) => node,
        None => return,
    };

    for link_id in &orphan_node.outgoing_links {
        if let Some(link) = meso.links.get_mut(link_id) {
            link.source_node = survivor;
        }
    }
    for link_id in &orphan_node.incoming_links {
        if let Some(link) = meso.links.get_mut(link_id) {
            link.target_node = survivor;
        }
    }
    let survivor_node = meso.nodes.get_mut(&survivor).unwrap();
    survivor_node.outgoing_links.extend(orphan_node.outgoing_links);
    survivor_node.incoming_links.extend(orphan_node.incoming_links);
}
