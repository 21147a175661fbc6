//! Microscopic layer: every lane of every meso link becomes a chain of
//! fixed-length cells, with lane-change edges sideways, connector chains
//! across intersections, and duplicate nodes removed where chains meet.

use anyhow::Result;
use geom::GpsPolyLine;
use netutil::Timer;
use raw_net::AgentType;

use crate::error::NetError;
use crate::ids::{MesoLinkID, MicroLinkID, MicroNodeID};
use crate::macroscopic::{lane_indices, MacroNetwork};
use crate::make::mesoscopic::movement_lane_spans;
use crate::mesoscopic::MesoNetwork;
use crate::microscopic::{MicroLink, MicroNetwork, MicroNode, BIKE_LANE_ID, WALK_LANE_ID};
use crate::movement::MovementCompositeType;
use crate::types::{BoundaryType, CellType, BIKE_LANE_WIDTH, CELL_LENGTH, LANE_WIDTH, WALK_LANE_WIDTH};

pub struct MicroOptions {
    /// Generate separated bike/walk chains on links that admit those agents
    /// alongside autos.
    pub separate_bike_walk_lanes: bool,
}

pub fn build_micro_network(
    macro_net: &MacroNetwork,
    meso_net: &mut MesoNetwork,
    opts: &MicroOptions,
    timer: &mut Timer,
) -> Result<MicroNetwork> {
    timer.start("build microscopic network");
    let mut micro = MicroNetwork::new();

    create_lane_nodes(&mut micro, macro_net, meso_net, opts)?;
    stitch_chains(&mut micro, macro_net, meso_net);
    mark_chain_ends(&mut micro, macro_net, meso_net);
    create_lane_links(&mut micro, meso_net);
    expand_connectors(&mut micro, meso_net)?;
    fix_short_circuit_gaps(&mut micro, macro_net, meso_net)?;
    assign_boundaries(&mut micro, meso_net);

    timer.stop("build microscopic network");
    Ok(micro)
}

fn new_node(
    micro: &mut MicroNetwork,
    loc: geom::LonLat,
    meso_link_id: MesoLinkID,
    lane_id: i32,
) -> MicroNodeID {
    let id = MicroNodeID(micro.next_node_id);
    micro.next_node_id += 1;
    micro.nodes.insert(
        id,
        MicroNode {
            id,
            loc,
            loc_euclidean: loc.to_pt2d(),
            meso_link_id,
            lane_id,
            is_link_upstream_target_node: false,
            is_link_downstream_target_node: false,
            zone_id: -1,
            boundary_type: BoundaryType::None,
            incoming_links: Vec::new(),
            outgoing_links: Vec::new(),
        },
    );
    id
}

/// Interpolated cell-boundary nodes for every lane stripe of every
/// non-connector meso link.
fn create_lane_nodes(
    micro: &mut MicroNetwork,
    macro_net: &MacroNetwork,
    meso_net: &mut MesoNetwork,
    opts: &MicroOptions,
) -> Result<()> {
    for macro_link in macro_net.links.values() {
        let original_lanes = *macro_link
            .lanes_list
            .first()
            .ok_or_else(|| NetError::InconsistentTopology(format!("link {} has no lane table", macro_link.id)))?;

        for meso_id in &macro_link.meso_links {
            let meso_link = meso_net.links.get_mut(meso_id).ok_or_else(|| {
                NetError::InconsistentTopology(format!("meso link {} of link {}", meso_id, macro_link.id))
            })?;
            let left_change = meso_link.lanes_change.0;
            let lanes_between = -(original_lanes as f64 / 2.0 - 0.5 + left_change as f64);
            let cells = cell_count(meso_link.length_meters);

            let mut per_lane = Vec::with_capacity(meso_link.lanes);
            for lane in 0..meso_link.lanes {
                let offset = (lanes_between + lane as f64) * LANE_WIDTH;
                let lane_geom = offset_lane(&meso_link.geom_euclidean, offset);
                let ids: Vec<MicroNodeID> = lane_geom
                    .equidistant_points(cells + 1)
                    .into_iter()
                    .map(|pt| new_node(micro, pt, *meso_id, lane as i32 + 1))
                    .collect();
                per_lane.push(ids);
            }
            meso_link.micro_nodes_per_lane = per_lane;

            if opts.separate_bike_walk_lanes {
                let rightmost = (lanes_between + meso_link.lanes as f64 - 1.0) * LANE_WIDTH;
                let mixed_auto = meso_link.allowed_agents.contains(&AgentType::Auto);
                if mixed_auto && meso_link.allowed_agents.contains(&AgentType::Bike) {
                    let lane_geom = offset_lane(&meso_link.geom_euclidean, rightmost + BIKE_LANE_WIDTH);
                    meso_link.micro_nodes_bike = lane_geom
                        .equidistant_points(cells + 1)
                        .into_iter()
                        .map(|pt| new_node(micro, pt, *meso_id, BIKE_LANE_ID))
                        .collect();
                }
                if mixed_auto && meso_link.allowed_agents.contains(&AgentType::Walk) {
                    let lane_geom = offset_lane(
                        &meso_link.geom_euclidean,
                        rightmost + BIKE_LANE_WIDTH + WALK_LANE_WIDTH,
                    );
                    meso_link.micro_nodes_walk = lane_geom
                        .equidistant_points(cells + 1)
                        .into_iter()
                        .map(|pt| new_node(micro, pt, *meso_id, WALK_LANE_ID))
                        .collect();
                }
            }
        }
    }
    Ok(())
}

fn cell_count(length_meters: f64) -> usize {
    ((length_meters / CELL_LENGTH).round() as usize).max(1)
}

fn offset_lane(center: &geom::PolyLine, offset: f64) -> GpsPolyLine {
    if offset.abs() < geom::EPSILON_OFFSET {
        center.to_gps()
    } else {
        center.shift_right(offset).to_gps()
    }
}

/// At the joint between two consecutive sub-segments of the same macro link,
/// each lane's tail node is replaced by the successor's head node, so the
/// chains connect without a zero-length cell.
fn stitch_chains(micro: &mut MicroNetwork, macro_net: &MacroNetwork, meso_net: &mut MesoNetwork) {
    for macro_link in macro_net.links.values() {
        for pair in macro_link.meso_links.windows(2) {
            let (u_id, v_id) = (pair[0], pair[1]);

            // Lanes pair up by their 1-based lane number; the lane-change
            // padding shifts the origin on either side.
            let (u_lanes, u_change) = {
                let u = &meso_net.links[&u_id];
                (u.lanes, u.lanes_change)
            };
            let (v_lanes, v_change) = {
                let v = &meso_net.links[&v_id];
                (v.lanes, v.lanes_change)
            };
            let u_numbers = lane_indices(macro_link.lanes, u_change.0, u_change.1);
            let v_numbers = lane_indices(macro_link.lanes, v_change.0, v_change.1);

            for (u_lane, number) in u_numbers.iter().enumerate().take(u_lanes) {
                let Some(v_lane) = v_numbers.iter().position(|n| n == number) else {
                    continue;
                };
                if v_lane >= v_lanes {
                    continue;
                }
                let head = meso_net.links[&v_id].micro_nodes_per_lane[v_lane][0];
                let u_link = meso_net.links.get_mut(&u_id).unwrap();
                let tail_slot = u_link.micro_nodes_per_lane[u_lane].len() - 1;
                let tail = u_link.micro_nodes_per_lane[u_lane][tail_slot];
                u_link.micro_nodes_per_lane[u_lane][tail_slot] = head;
                micro.nodes.remove(&tail);
            }

            // Bike and walk chains stitch the same way
            let bike_head = meso_net.links[&v_id].micro_nodes_bike.first().copied();
            if let Some(head) = bike_head {
                let u_link = meso_net.links.get_mut(&u_id).unwrap();
                if let Some(tail) = u_link.micro_nodes_bike.last().copied() {
                    *u_link.micro_nodes_bike.last_mut().unwrap() = head;
                    micro.nodes.remove(&tail);
                }
            }
            let walk_head = meso_net.links[&v_id].micro_nodes_walk.first().copied();
            if let Some(head) = walk_head {
                let u_link = meso_net.links.get_mut(&u_id).unwrap();
                if let Some(tail) = u_link.micro_nodes_walk.last().copied() {
                    *u_link.micro_nodes_walk.last_mut().unwrap() = head;
                    micro.nodes.remove(&tail);
                }
            }
        }
    }
}

/// The outermost micro nodes of each macro link inherit the macro node's
/// zone and get flagged as the link's upstream/downstream targets.
fn mark_chain_ends(micro: &mut MicroNetwork, macro_net: &MacroNetwork, meso_net: &MesoNetwork) {
    for macro_link in macro_net.links.values() {
        let Some(first_meso) = macro_link.meso_links.first() else {
            continue;
        };
        let last_meso = macro_link.meso_links.last().unwrap();

        let source_zone = macro_net.nodes[&macro_link.source_node].zone_id;
        let target_zone = macro_net.nodes[&macro_link.target_node].zone_id;

        let first = &meso_net.links[first_meso];
        for chain in first
            .micro_nodes_per_lane
            .iter()
            .chain([&first.micro_nodes_bike, &first.micro_nodes_walk])
        {
            if let Some(head) = chain.first() {
                if let Some(node) = micro.nodes.get_mut(head) {
                    node.is_link_upstream_target_node = true;
                    node.zone_id = source_zone;
                }
            }
        }
        let last = &meso_net.links[last_meso];
        for chain in last
            .micro_nodes_per_lane
            .iter()
            .chain([&last.micro_nodes_bike, &last.micro_nodes_walk])
        {
            if let Some(tail) = chain.last() {
                if let Some(node) = micro.nodes.get_mut(tail) {
                    node.is_link_downstream_target_node = true;
                    node.zone_id = target_zone;
                }
            }
        }
    }
}

struct CellSpec {
    cell_type: CellType,
    lane_id: i32,
    agents_override: Option<Vec<AgentType>>,
    is_first_movement: bool,
}

fn new_link(
    micro: &mut MicroNetwork,
    meso_net: &MesoNetwork,
    meso_id: MesoLinkID,
    source: MicroNodeID,
    target: MicroNodeID,
    spec: CellSpec,
) -> MicroLinkID {
    let meso_link = &meso_net.links[&meso_id];
    let geom = GpsPolyLine::new(vec![micro.nodes[&source].loc, micro.nodes[&target].loc]);
    let id = MicroLinkID(micro.next_link_id);
    micro.next_link_id += 1;

    let movement_composite_type = if spec.is_first_movement {
        meso_link.movement_composite_type
    } else {
        MovementCompositeType::None
    };
    let link = MicroLink {
        id,
        source_node: source,
        target_node: target,
        length_meters: geom.length_meters(),
        geom,
        cell_type: spec.cell_type,
        meso_link_id: meso_id,
        macro_link_id: meso_link.macro_link_id,
        macro_node_id: meso_link.macro_node_id,
        lane_id: spec.lane_id,
        meso_link_type: meso_link.link_type,
        control_type: meso_link.control_type,
        movement_composite_type,
        is_first_movement: spec.is_first_movement,
        free_speed: meso_link.free_speed,
        capacity: meso_link.capacity,
        additional_travel_cost: 0.0,
        allowed_agents: spec
            .agents_override
            .unwrap_or_else(|| meso_link.allowed_agents.clone()),
    };
    micro.nodes.get_mut(&source).unwrap().outgoing_links.push(id);
    micro.nodes.get_mut(&target).unwrap().incoming_links.push(id);
    micro.links.insert(id, link);
    id
}

/// Forward cells along every lane, lane-change cells to both neighbours, and
/// forward-only bike/walk chains.
fn create_lane_links(micro: &mut MicroNetwork, meso_net: &mut MesoNetwork) {
    let meso_ids: Vec<MesoLinkID> = meso_net.links.keys().copied().collect();
    for meso_id in meso_ids {
        let meso_link = &meso_net.links[&meso_id];
        if meso_link.is_connection {
            continue;
        }
        let per_lane = meso_link.micro_nodes_per_lane.clone();
        let bike = meso_link.micro_nodes_bike.clone();
        let walk = meso_link.micro_nodes_walk.clone();

        for (lane, chain) in per_lane.iter().enumerate() {
            let lane_id = lane as i32 + 1;
            for j in 0..chain.len().saturating_sub(1) {
                new_link(
                    micro,
                    meso_net,
                    meso_id,
                    chain[j],
                    chain[j + 1],
                    CellSpec {
                        cell_type: CellType::Forward,
                        lane_id,
                        agents_override: None,
                        is_first_movement: false,
                    },
                );
                // Changing into the right-hand neighbour lane
                if lane + 1 < per_lane.len() {
                    new_link(
                        micro,
                        meso_net,
                        meso_id,
                        chain[j],
                        per_lane[lane + 1][j + 1],
                        CellSpec {
                            cell_type: CellType::LaneChange,
                            lane_id,
                            agents_override: None,
                            is_first_movement: false,
                        },
                    );
                }
                // Changing into the left-hand neighbour lane
                if lane > 0 {
                    new_link(
                        micro,
                        meso_net,
                        meso_id,
                        chain[j],
                        per_lane[lane - 1][j + 1],
                        CellSpec {
                            cell_type: CellType::LaneChange,
                            lane_id,
                            agents_override: None,
                            is_first_movement: false,
                        },
                    );
                }
            }
        }

        for (chain, lane_id, agent) in [
            (&bike, BIKE_LANE_ID, AgentType::Bike),
            (&walk, WALK_LANE_ID, AgentType::Walk),
        ] {
            for j in 0..chain.len().saturating_sub(1) {
                new_link(
                    micro,
                    meso_net,
                    meso_id,
                    chain[j],
                    chain[j + 1],
                    CellSpec {
                        cell_type: CellType::Forward,
                        lane_id,
                        agents_override: Some(vec![agent]),
                        is_first_movement: false,
                    },
                );
            }
        }
    }
}

/// Each movement connector becomes one forward cell chain per lane, from the
/// income lane's tail to the outcome lane's head. Only the first cell
/// carries the movement composite type.
fn expand_connectors(micro: &mut MicroNetwork, meso_net: &mut MesoNetwork) -> Result<()> {
    let connector_ids: Vec<MesoLinkID> = meso_net
        .links
        .iter()
        .filter(|(_, link)| link.is_connection)
        .map(|(id, _)| *id)
        .collect();

    for connector_id in connector_ids {
        let connector = &meso_net.links[&connector_id];
        let lanes = connector.lanes;
        let income_id = connector.movement_link_income.ok_or_else(|| {
            NetError::InconsistentTopology(format!("connector {} has no income link", connector_id))
        })?;
        let outcome_id = connector.movement_link_outcome.ok_or_else(|| {
            NetError::InconsistentTopology(format!("connector {} has no outcome link", connector_id))
        })?;
        let income_start = connector.movement_income_lane_start;
        let outcome_start = connector.movement_outcome_lane_start;
        let cells = cell_count(connector.length_meters);

        let mut chains = Vec::with_capacity(lanes);
        for lane in 0..lanes {
            let income = &meso_net.links[&income_id];
            let outcome = &meso_net.links[&outcome_id];
            let income_lane = income_start + lane;
            let outcome_lane = outcome_start + lane;
            if income_lane >= income.micro_nodes_per_lane.len()
                || outcome_lane >= outcome.micro_nodes_per_lane.len()
            {
                warn!(
                    "Connector {} lane {} falls outside its meso links; skipping the lane",
                    connector_id, lane
                );
                continue;
            }
            let tail = *income.micro_nodes_per_lane[income_lane].last().unwrap();
            let head = outcome.micro_nodes_per_lane[outcome_lane][0];

            let tail_loc = micro.nodes[&tail].loc;
            let head_loc = micro.nodes[&head].loc;

            let mut chain = vec![tail];
            if cells > 1 {
                let line = GpsPolyLine::new(vec![tail_loc, head_loc]);
                for pt in line.equidistant_points(cells + 1).into_iter().skip(1).take(cells - 1) {
                    chain.push(new_node(micro, pt, connector_id, lane as i32 + 1));
                }
            }
            chain.push(head);

            for j in 0..chain.len() - 1 {
                new_link(
                    micro,
                    meso_net,
                    connector_id,
                    chain[j],
                    chain[j + 1],
                    CellSpec {
                        cell_type: CellType::Forward,
                        lane_id: lane as i32 + 1,
                        agents_override: None,
                        is_first_movement: j == 0,
                    },
                );
            }
            chains.push(chain);
        }
        meso_net.links.get_mut(&connector_id).unwrap().micro_nodes_per_lane = chains;
    }
    Ok(())
}

/// Short-circuited intersections at the microscopic level: the income lane
/// tail and the outcome lane head become one node, on whichever side
/// survived the mesoscopic merge.
fn fix_short_circuit_gaps(
    micro: &mut MicroNetwork,
    macro_net: &MacroNetwork,
    meso_net: &mut MesoNetwork,
) -> Result<()> {
    for node in macro_net.nodes.values() {
        if node.movement_is_needed {
            continue;
        }
        let income_survives = node.incoming_links.len() == 1;
        for movement_id in &node.movements {
            let movement = &macro_net.movements[movement_id];
            let income_meso_id = *macro_net.links[&movement.incoming_link]
                .meso_links
                .last()
                .ok_or_else(|| {
                    NetError::InconsistentTopology(format!(
                        "link {} has no mesoscopic chain",
                        movement.incoming_link
                    ))
                })?;
            let outcome_meso_id = *macro_net.links[&movement.outgoing_link]
                .meso_links
                .first()
                .ok_or_else(|| {
                    NetError::InconsistentTopology(format!(
                        "link {} has no mesoscopic chain",
                        movement.outgoing_link
                    ))
                })?;

            let spans = {
                let income = &meso_net.links[&income_meso_id];
                let outcome = &meso_net.links[&outcome_meso_id];
                movement_lane_spans(movement, income, outcome)
            };
            let Some((income_start, outcome_start, lanes)) = spans else {
                continue;
            };

            for lane in 0..lanes {
                let income_lane = income_start + lane;
                let outcome_lane = outcome_start + lane;
                {
                    let income = &meso_net.links[&income_meso_id];
                    let outcome = &meso_net.links[&outcome_meso_id];
                    if income_lane >= income.micro_nodes_per_lane.len()
                        || outcome_lane >= outcome.micro_nodes_per_lane.len()
                    {
                        warn!(
                            "Movement {} lane {} falls outside its meso links; skipping the lane",
                            movement_id, lane
                        );
                        continue;
                    }
                }
                let tail = *meso_net.links[&income_meso_id].micro_nodes_per_lane[income_lane]
                    .last()
                    .unwrap();
                let head = meso_net.links[&outcome_meso_id].micro_nodes_per_lane[outcome_lane][0];
                if tail == head {
                    continue;
                }

                if income_survives {
                    // The outcome head's outgoing cells re-root at the tail
                    let Some(orphan) = micro.nodes.remove(&head) else {
                        continue;
                    };
                    for link_id in &orphan.outgoing_links {
                        let target = micro.links[link_id].target_node;
                        let link = micro.links.get_mut(link_id).unwrap();
                        link.source_node = tail;
                        link.geom = GpsPolyLine::new(vec![
                            micro.nodes[&tail].loc,
                            micro.nodes[&target].loc,
                        ]);
                        link.length_meters = link.geom.length_meters();
                        micro.nodes.get_mut(&tail).unwrap().outgoing_links.push(*link_id);
                    }
                    meso_net
                        .links
                        .get_mut(&outcome_meso_id)
                        .unwrap()
                        .micro_nodes_per_lane[outcome_lane][0] = tail;
                } else {
                    // The income tail's incoming cells re-target at the head
                    let Some(orphan) = micro.nodes.remove(&tail) else {
                        continue;
                    };
                    for link_id in &orphan.incoming_links {
                        let source = micro.links[link_id].source_node;
                        let link = micro.links.get_mut(link_id).unwrap();
                        link.target_node = head;
                        link.geom = GpsPolyLine::new(vec![
                            micro.nodes[&source].loc,
                            micro.nodes[&head].loc,
                        ]);
                        link.length_meters = link.geom.length_meters();
                        micro.nodes.get_mut(&head).unwrap().incoming_links.push(*link_id);
                    }
                    let income = meso_net.links.get_mut(&income_meso_id).unwrap();
                    let slot = income.micro_nodes_per_lane[income_lane].len() - 1;
                    income.micro_nodes_per_lane[income_lane][slot] = head;
                }
            }
        }
    }
    Ok(())
}

/// Upstream-target nodes inherit the meso source node's boundary type,
/// downstream-target nodes the meso target node's.
fn assign_boundaries(micro: &mut MicroNetwork, meso_net: &MesoNetwork) {
    for node in micro.nodes.values_mut() {
        let Some(meso_link) = meso_net.links.get(&node.meso_link_id) else {
            continue;
        };
        if node.is_link_upstream_target_node {
            if let Some(meso_node) = meso_net.nodes.get(&meso_link.source_node) {
                node.boundary_type = meso_node.boundary_type;
            }
        } else if node.is_link_downstream_target_node {
            if let Some(meso_node) = meso_net.nodes.get(&meso_link.target_node) {
                node.boundary_type = meso_node.boundary_type;
            }
        }
    }
}
