//! Whole-pipeline smoke test over a tiny inline .osm extract.

use std::fs;

use netutil::Timer;
use osm2net::{convert, Options};

const EXTRACT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="handmade">
  <node id="1" lat="55.700" lon="37.598"/>
  <node id="2" lat="55.700" lon="37.600"/>
  <node id="3" lat="55.700" lon="37.602"/>
  <node id="4" lat="55.698" lon="37.600"/>
  <way id="10">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="highway" v="residential"/>
  </way>
  <way id="11">
    <nd ref="2"/>
    <nd ref="3"/>
    <tag k="highway" v="residential"/>
  </way>
  <way id="12">
    <nd ref="2"/>
    <nd ref="4"/>
    <tag k="highway" v="residential"/>
  </way>
</osm>
"#;

#[test]
fn converts_a_tiny_extract() {
    let dir = std::env::temp_dir().join("osm2net_smoke");
    fs::create_dir_all(&dir).unwrap();
    let osm_path = dir.join("tiny.osm");
    fs::write(&osm_path, EXTRACT).unwrap();
    let output = dir.join("tiny.csv");

    let opts = Options::new(
        osm_path.to_str().unwrap().to_string(),
        output.to_str().unwrap().to_string(),
    );
    let mut timer = Timer::new("smoke");
    let network = convert(&opts, &mut timer).unwrap();

    // 3 bidirectional ways = 6 directed links around one T-intersection
    assert_eq!(network.macro_net.links.len(), 6);
    assert_eq!(network.macro_net.nodes.len(), 4);
    assert_eq!(network.macro_net.movements.len(), 6);
    assert!(!network.meso_net.links.is_empty());
    assert!(!network.micro_net.links.is_empty());

    network.export_csv(output.to_str().unwrap()).unwrap();
    for table in [
        "tiny_macro_nodes.csv",
        "tiny_macro_links.csv",
        "tiny_movement.csv",
        "tiny_meso_nodes.csv",
        "tiny_meso_links.csv",
        "tiny_micro_nodes.csv",
        "tiny_micro_links.csv",
    ] {
        let contents = fs::read_to_string(dir.join(table)).unwrap();
        assert!(contents.lines().count() > 1, "{} is empty", table);
    }
}
