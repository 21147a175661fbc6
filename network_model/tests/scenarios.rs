//! End-to-end pipeline scenarios over tiny synthetic road networks.

use std::collections::BTreeMap;

use geom::LonLat;
use netutil::Timer;
use network_model::make::{build_network, MicroOptions};
use network_model::{CellType, LayeredNetwork, MovementType};
use raw_net::{osm, AgentType, ControlType, RawExtract, RawNode, RawWay, Restriction, RestrictionKind, RestrictionMember, Tags};

fn node(id: i64, lon: f64, lat: f64) -> (osm::NodeID, RawNode) {
    let id = osm::NodeID(id);
    (
        id,
        RawNode::new(id, LonLat::new(lon, lat), String::new(), String::new()),
    )
}

fn signal_node(id: i64, lon: f64, lat: f64) -> (osm::NodeID, RawNode) {
    let id = osm::NodeID(id);
    (
        id,
        RawNode::new(
            id,
            LonLat::new(lon, lat),
            String::new(),
            "traffic_signals".to_string(),
        ),
    )
}

fn way(id: i64, nodes: &[i64], tags: &[(&str, &str)]) -> RawWay {
    RawWay::from_tags(
        osm::WayID(id),
        nodes.iter().map(|n| osm::NodeID(*n)).collect(),
        &Tags::from_pairs(tags),
    )
}

fn build(
    ways: Vec<RawWay>,
    nodes: Vec<(osm::NodeID, RawNode)>,
    restrictions: Vec<Restriction>,
) -> LayeredNetwork {
    let mut raw = RawExtract {
        ways,
        nodes: nodes.into_iter().collect::<BTreeMap<_, _>>(),
        restrictions,
    };
    raw.prepare(&[AgentType::Auto]);
    let mut timer = Timer::new("test build");
    build_network(
        &raw,
        &MicroOptions {
            separate_bike_walk_lanes: false,
        },
        &mut timer,
    )
    .unwrap()
}

fn restriction(category: &str, from_way: i64, via_node: i64, to_way: i64) -> Restriction {
    Restriction {
        category: category.to_string(),
        from: RestrictionMember {
            id: from_way,
            kind: RestrictionKind::Way,
        },
        to: RestrictionMember {
            id: to_way,
            kind: RestrictionKind::Way,
        },
        via: RestrictionMember {
            id: via_node,
            kind: RestrictionKind::Node,
        },
    }
}

/// Scenario: a plain two-way street between two nodes, `lanes=4`.
#[test]
fn two_way_straight_street() {
    let network = build(
        vec![way(
            1,
            &[1, 2],
            &[("highway", "secondary"), ("lanes", "4")],
        )],
        vec![node(1, 37.600, 55.700), node(2, 37.602, 55.700)],
        Vec::new(),
    );

    let links: Vec<_> = network.macro_net.links.values().collect();
    assert_eq!(links.len(), 2);
    let expected_length =
        LonLat::new(37.600, 55.700).gps_dist_meters(LonLat::new(37.602, 55.700));
    for link in &links {
        assert_eq!(link.lanes, 2);
        assert!((link.length_meters - expected_length).abs() < 0.01);
        assert!(link.was_bidirectional);
    }
    // Degree-1 endpoints generate no turning movements
    assert!(network.macro_net.movements.is_empty());

    // The pair was offset apart; the meso geometry differs from the original
    for link in &links {
        assert_ne!(
            link.geom_offset.points()[0],
            link.geom.points()[0],
            "bidirectional pair must be offset"
        );
    }

    // One meso link per direction, no connectors
    assert_eq!(network.meso_net.links.len(), 2);
    assert!(network.meso_net.links.values().all(|l| !l.is_connection));

    // Cells: every lane of every meso link is discretised to ~4.5 m
    for meso in network.meso_net.links.values() {
        let cells = ((meso.length_meters / 4.5).round() as usize).max(1);
        assert_eq!(meso.micro_nodes_per_lane.len(), 2);
        for chain in &meso.micro_nodes_per_lane {
            assert_eq!(chain.len(), cells + 1);
        }
    }
    // Forward cells stay near the nominal length
    for link in network.micro_net.links.values() {
        if link.cell_type == CellType::Forward && link.macro_node_id.is_none() {
            assert!(link.length_meters <= 4.5 * 1.5 + 1e-6);
        }
    }
}

/// Scenario: a T-intersection with three bidirectional legs.
#[test]
fn t_intersection_movements() {
    let network = build(
        vec![
            way(1, &[1, 2], &[("highway", "residential")]),
            way(2, &[2, 3], &[("highway", "residential")]),
            way(3, &[2, 4], &[("highway", "residential")]),
        ],
        vec![
            node(1, 37.598, 55.700),
            node(2, 37.600, 55.700),
            node(3, 37.602, 55.700),
            node(4, 37.600, 55.698),
        ],
        Vec::new(),
    );

    // Each of the 3 incoming legs turns onto the 2 other legs
    assert_eq!(network.macro_net.movements.len(), 6);
    let types: Vec<MovementType> = network
        .macro_net
        .movements
        .values()
        .map(|m| m.movement_type)
        .collect();
    assert!(types.contains(&MovementType::Thru));
    assert!(types.contains(&MovementType::Left));
    assert!(types.contains(&MovementType::Right));

    // One connector meso link per movement
    let connectors: Vec<_> = network
        .meso_net
        .links
        .values()
        .filter(|l| l.is_connection)
        .collect();
    assert_eq!(connectors.len(), 6);
    for connector in &connectors {
        assert!(connector.macro_link_id.is_none());
        assert!(connector.movement_id.is_some());
        // Both endpoints already belong to adjacent non-connector links
        let source = &network.meso_net.nodes[&connector.source_node];
        let target = &network.meso_net.nodes[&connector.target_node];
        assert!(source.incoming_links.iter().any(|l| *l != connector.id));
        assert!(target.outgoing_links.iter().any(|l| *l != connector.id));
    }

    // Movement lane ranges are sane
    for movement in network.macro_net.movements.values() {
        assert!(movement.income_lane_seq.1 >= movement.income_lane_seq.0);
        assert!(movement.outcome_lane_seq.1 >= movement.outcome_lane_seq.0);
        assert_eq!(
            movement.lanes_num,
            movement.income_lane_seq.1 - movement.income_lane_seq.0 + 1
        );
    }

    // Exactly one first-movement cell per connector lane chain
    for connector in &connectors {
        let first_cells = network
            .micro_net
            .links
            .values()
            .filter(|l| l.meso_link_id == connector.id && l.is_first_movement)
            .count();
        assert_eq!(first_cells, connector.lanes);
    }

    // Meso chains keep their macroscopic anchors
    for macro_link in network.macro_net.links.values() {
        let first = &network.meso_net.links[macro_link.meso_links.first().unwrap()];
        let last = &network.meso_net.links[macro_link.meso_links.last().unwrap()];
        let first_node = &network.meso_net.nodes[&first.source_node];
        let last_node = &network.meso_net.nodes[&last.target_node];
        assert_eq!(first_node.macro_node_id, Some(macro_link.source_node));
        assert_eq!(last_node.macro_node_id, Some(macro_link.target_node));
    }
}

/// Scenario: two oneway links merging into one; the intersection is
/// short-circuited instead of getting connectors.
#[test]
fn oneway_merge_short_circuits() {
    let network = build(
        vec![
            way(1, &[1, 3], &[("highway", "primary"), ("oneway", "yes")]),
            way(2, &[2, 3], &[("highway", "primary"), ("oneway", "yes")]),
            way(3, &[3, 4], &[("highway", "primary"), ("oneway", "yes")]),
        ],
        vec![
            node(1, 37.598, 55.701),
            node(2, 37.598, 55.699),
            node(3, 37.600, 55.700),
            node(4, 37.602, 55.700),
        ],
        Vec::new(),
    );

    assert_eq!(network.macro_net.links.len(), 3);
    let merge_node = network
        .macro_net
        .nodes
        .values()
        .find(|n| n.incoming_links.len() == 2)
        .unwrap();
    assert!(!merge_node.movement_is_needed);
    assert_eq!(network.macro_net.movements.len(), 2);

    // No connector meso links exist
    assert!(network.meso_net.links.values().all(|l| !l.is_connection));

    // Both income chains collapse onto the outgoing chain's head node
    let outgoing_macro = network
        .macro_net
        .links
        .values()
        .find(|l| l.source_node == merge_node.id)
        .unwrap();
    let outgoing_meso = &network.meso_net.links[outgoing_macro.meso_links.first().unwrap()];
    let head = &network.meso_net.nodes[&outgoing_meso.source_node];
    assert_eq!(head.incoming_links.len(), 2);
    assert_eq!(head.outgoing_links.len(), 1);

    // Microscopic chains flow through: each income lane tail IS the
    // outgoing lane head, and it has onward cells
    for macro_link in network
        .macro_net
        .links
        .values()
        .filter(|l| l.target_node == merge_node.id)
    {
        let income_meso = &network.meso_net.links[macro_link.meso_links.last().unwrap()];
        for chain in &income_meso.micro_nodes_per_lane {
            let tail = chain.last().unwrap();
            let tail_node = &network.micro_net.nodes[tail];
            assert!(
                !tail_node.outgoing_links.is_empty(),
                "merged lane tail must keep flowing"
            );
        }
    }
}

/// Scenario: a roundabout implies oneway circulation, and its interior
/// nodes are all short-circuited pass-throughs.
#[test]
fn roundabout_is_oneway_and_short_circuited() {
    let network = build(
        vec![
            way(
                1,
                &[1, 2, 3, 4, 1],
                &[("highway", "residential"), ("junction", "roundabout")],
            ),
            way(2, &[5, 1], &[("highway", "residential"), ("oneway", "yes")]),
            way(3, &[3, 6], &[("highway", "residential"), ("oneway", "yes")]),
        ],
        vec![
            node(1, 37.6000, 55.7000),
            node(2, 37.6005, 55.7003),
            node(3, 37.6010, 55.7000),
            node(4, 37.6005, 55.6997),
            node(5, 37.5990, 55.7000),
            node(6, 37.6020, 55.7000),
        ],
        Vec::new(),
    );

    // The ring splits at its two attachment points (the other ring nodes
    // see only one way), so: 2 ring segments + 2 approaches, all oneway
    assert_eq!(network.macro_net.links.len(), 4);
    assert!(network.macro_net.links.values().all(|l| !l.was_bidirectional));

    // Both junction nodes are pure merges/diverges and get short-circuited
    for macro_node in network.macro_net.nodes.values() {
        if !macro_node.movements.is_empty() {
            assert!(!macro_node.movement_is_needed);
        }
    }
    assert!(network.meso_net.links.values().all(|l| !l.is_connection));
}

/// Scenario: an `only_left_turn` restriction keeps just the whitelisted
/// movement; a `no_left_turn` drops exactly the blacklisted one.
#[test]
fn turn_restrictions_filter_movements() {
    let ways = || {
        vec![
            way(1, &[1, 2], &[("highway", "residential")]),
            way(2, &[2, 3], &[("highway", "residential")]),
            way(3, &[2, 4], &[("highway", "residential")]),
        ]
    };
    let nodes = || {
        vec![
            node(1, 37.598, 55.700),
            node(2, 37.600, 55.700),
            node(3, 37.602, 55.700),
            node(4, 37.600, 55.702),
        ]
    };

    let unrestricted = build(ways(), nodes(), Vec::new());
    assert_eq!(unrestricted.macro_net.movements.len(), 6);

    // Only the left turn from way 1 onto way 3 survives for that approach
    let only_left = build(ways(), nodes(), vec![restriction("only_left_turn", 1, 2, 3)]);
    assert_eq!(only_left.macro_net.movements.len(), 5);
    let from_way1: Vec<_> = only_left
        .macro_net
        .movements
        .values()
        .filter(|m| {
            only_left.macro_net.links[&m.incoming_link].osm_way_id == osm::WayID(1)
                && m.node_id.0 == only_left.macro_net.links[&m.incoming_link].target_node.0
        })
        .collect();
    for movement in &from_way1 {
        assert_eq!(
            only_left.macro_net.links[&movement.outgoing_link].osm_way_id,
            osm::WayID(3)
        );
    }

    // The blacklisted pair disappears, everything else stays
    let no_left = build(ways(), nodes(), vec![restriction("no_left_turn", 1, 2, 3)]);
    assert_eq!(no_left.macro_net.movements.len(), 5);
    assert!(!no_left.macro_net.movements.values().any(|m| {
        no_left.macro_net.links[&m.incoming_link].osm_way_id == osm::WayID(1)
            && no_left.macro_net.links[&m.outgoing_link].osm_way_id == osm::WayID(3)
    }));
}

/// Scenario: a signalised intersection keeps its movements regardless of
/// degree, and the connectors carry the signal control type.
#[test]
fn signalised_intersection_keeps_connectors() {
    let network = build(
        vec![
            way(1, &[1, 2], &[("highway", "secondary"), ("oneway", "yes")]),
            way(2, &[2, 3], &[("highway", "secondary"), ("oneway", "yes")]),
        ],
        vec![
            node(1, 37.598, 55.700),
            signal_node(2, 37.600, 55.700),
            node(3, 37.602, 55.700),
        ],
        Vec::new(),
    );

    let junction = network
        .macro_net
        .nodes
        .values()
        .find(|n| n.control_type == ControlType::Signal)
        .unwrap();
    // A pure pass-through would normally be short-circuited; the signal
    // forbids that
    assert!(junction.movement_is_needed);

    let connectors: Vec<_> = network
        .meso_net
        .links
        .values()
        .filter(|l| l.is_connection)
        .collect();
    assert_eq!(connectors.len(), 1);
    for connector in connectors {
        assert_eq!(connector.control_type, ControlType::Signal);
    }
    for movement in network.macro_net.movements.values() {
        assert_eq!(movement.control_type, ControlType::Signal);
    }
}
