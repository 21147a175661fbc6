//! The OSM reader boundary. The pipeline wants three passes over the file
//! (ways, then nodes, then restriction relations); `osm-xml` hands us the
//! whole document at once, so the passes run over the memoised document in
//! id order, which also keeps downstream id issuance deterministic.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};

use geom::LonLat;
use netutil::Timer;
use raw_net::{osm, RawExtract, RawNode, RawWay, Restriction, RestrictionKind, RestrictionMember, Tags};

pub fn read_osm(path: &str, timer: &mut Timer) -> Result<RawExtract> {
    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some("osm") | Some("xml") => {}
        Some("pbf") => bail!("{}: .pbf input needs an external reader; re-export as .osm XML", path),
        _ => bail!("{}: unrecognized file extension", path),
    }

    timer.start("read OSM");
    let file = File::open(path).with_context(|| format!("can't open {}", path))?;
    let doc = osm_xml::OSM::parse(BufReader::new(file))
        .map_err(|err| anyhow::anyhow!("OSM parsing failed for {}: {:?}", path, err))?;
    info!(
        "OSM document has {} nodes, {} ways, {} relations",
        doc.nodes.len(),
        doc.ways.len(),
        doc.relations.len()
    );

    // Pass 1: ways. Remember which nodes they touch so pass 2 can drop
    // everything isolated.
    let mut ways = Vec::new();
    let mut nodes_seen: BTreeSet<i64> = BTreeSet::new();
    let sorted_ways: BTreeMap<i64, &osm_xml::Way> = doc.ways.values().map(|w| (w.id, w)).collect();
    for way in sorted_ways.values() {
        let mut node_ids = Vec::with_capacity(way.nodes.len());
        let mut valid = true;
        for node_ref in &way.nodes {
            match node_ref {
                osm_xml::UnresolvedReference::Node(id) => {
                    node_ids.push(osm::NodeID(*id));
                    nodes_seen.insert(*id);
                }
                _ => {
                    valid = false;
                }
            }
        }
        if !valid {
            // Nested way/relation references inside a way
            continue;
        }
        ways.push(RawWay::from_tags(osm::WayID(way.id), node_ids, &tags_of(&way.tags)));
    }

    // Pass 2: nodes touched by at least one way
    let mut nodes: BTreeMap<osm::NodeID, RawNode> = BTreeMap::new();
    let sorted_nodes: BTreeMap<i64, &osm_xml::Node> = doc.nodes.values().map(|n| (n.id, n)).collect();
    for node in sorted_nodes.values() {
        if !nodes_seen.contains(&node.id) {
            continue;
        }
        let tags = tags_of(&node.tags);
        nodes.insert(
            osm::NodeID(node.id),
            RawNode::new(
                osm::NodeID(node.id),
                LonLat::new(node.lon, node.lat),
                tags.find("name").to_string(),
                tags.find("highway").to_string(),
            ),
        );
    }

    // Pass 3: turn-restriction relations
    let mut restrictions = Vec::new();
    let mut skipped_member_count = 0;
    let mut unknown_roles = 0;
    let sorted_relations: BTreeMap<i64, &osm_xml::Relation> =
        doc.relations.values().map(|r| (r.id, r)).collect();
    for relation in sorted_relations.values() {
        let tags = tags_of(&relation.tags);
        let Some(category) = tags.get("restriction") else {
            continue;
        };
        if relation.members.len() != 3 {
            skipped_member_count += 1;
            continue;
        }

        let mut from = None;
        let mut to = None;
        let mut via = None;
        let mut ok = true;
        for member in &relation.members {
            let (reference, role) = match member {
                osm_xml::Member::Node(reference, role) => (reference, role),
                osm_xml::Member::Way(reference, role) => (reference, role),
                osm_xml::Member::Relation(reference, role) => (reference, role),
            };
            let resolved = member_of(reference);
            match role.as_str() {
                "from" => from = Some(resolved),
                "to" => to = Some(resolved),
                "via" => via = Some(resolved),
                _ => {
                    unknown_roles += 1;
                    ok = false;
                }
            }
        }
        match (ok, from, to, via) {
            (true, Some(from), Some(to), Some(via)) => {
                restrictions.push(Restriction {
                    category: category.to_string(),
                    from,
                    to,
                    via,
                });
            }
            _ => {
                warn!("Restriction relation {} has unusable members; skipping it", relation.id);
            }
        }
    }
    if skipped_member_count > 0 {
        warn!(
            "Skipped {} restriction relations without exactly 3 members",
            skipped_member_count
        );
    }
    if unknown_roles > 0 {
        warn!(
            "Met {} restriction members with roles other than from/to/via",
            unknown_roles
        );
    }

    timer.stop("read OSM");
    Ok(RawExtract {
        ways,
        nodes,
        restrictions,
    })
}

fn tags_of(raw_tags: &[osm_xml::Tag]) -> Tags {
    Tags::new(
        raw_tags
            .iter()
            .map(|tag| (tag.key.clone(), tag.val.clone()))
            .collect(),
    )
}

fn member_of(reference: &osm_xml::UnresolvedReference) -> RestrictionMember {
    match reference {
        osm_xml::UnresolvedReference::Node(id) => RestrictionMember {
            id: *id,
            kind: RestrictionKind::Node,
        },
        osm_xml::UnresolvedReference::Way(id) => RestrictionMember {
            id: *id,
            kind: RestrictionKind::Way,
        },
        osm_xml::UnresolvedReference::Relation(id) => RestrictionMember {
            id: *id,
            kind: RestrictionKind::Relation,
        },
    }
}
