//! Semicolon-delimited CSV export of all seven tables. Geometry goes out as
//! WKT in lon/lat order; absent numeric slots are -1.

use anyhow::{Context, Result};
use csv::WriterBuilder;

use geom::{wkt_linestring, GpsPolyLine};
use raw_net::AgentType;

use crate::{LayeredNetwork, MacroNetwork, MesoNetwork, MicroNetwork};

/// Strips a trailing `.csv` so `net.csv` produces `net_macro_nodes.csv` etc.
fn base_name(output: &str) -> &str {
    output.strip_suffix(".csv").unwrap_or(output)
}

fn agents_column(agents: &[AgentType]) -> String {
    let names: Vec<String> = agents.iter().map(|a| a.to_string()).collect();
    names.join(",")
}

fn float(value: f64) -> String {
    format!("{:.6}", value)
}

fn opt_id(id: Option<impl std::fmt::Display>) -> String {
    match id {
        Some(id) => id.to_string(),
        None => "-1".to_string(),
    }
}

fn geom_column(geom: &GpsPolyLine) -> String {
    wkt_linestring(geom)
}

impl LayeredNetwork {
    /// Writes all seven tables next to each other under the given base path.
    pub fn export_csv(&self, output: &str) -> Result<()> {
        self.macro_net.export_csv(output)?;
        self.meso_net.export_csv(output)?;
        self.micro_net.export_csv(output)?;
        Ok(())
    }
}

impl MacroNetwork {
    pub fn export_csv(&self, output: &str) -> Result<()> {
        let base = base_name(output);
        self.export_nodes(&format!("{}_macro_nodes.csv", base))?;
        self.export_links(&format!("{}_macro_links.csv", base))?;
        self.export_movements(&format!("{}_movement.csv", base))?;
        Ok(())
    }

    fn export_nodes(&self, path: &str) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(b';')
            .from_path(path)
            .with_context(|| format!("can't create {}", path))?;
        writer.write_record([
            "id",
            "osm_node_id",
            "control_type",
            "boundary_type",
            "activity_type",
            "activity_link_type",
            "zone_id",
            "intersection_id",
            "poi_id",
            "osm_highway",
            "name",
            "longitude",
            "latitude",
        ])?;
        for node in self.nodes.values() {
            writer.write_record([
                node.id.to_string(),
                node.osm_node_id.to_string(),
                node.control_type.to_string(),
                node.boundary_type.to_string(),
                node.activity_type.to_string(),
                node.activity_link_type.to_string(),
                node.zone_id.to_string(),
                node.intersection_id.to_string(),
                node.poi_id.to_string(),
                node.osm_highway.clone(),
                node.name.clone(),
                float(node.loc.lon),
                float(node.loc.lat),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn export_links(&self, path: &str) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(b';')
            .from_path(path)
            .with_context(|| format!("can't create {}", path))?;
        writer.write_record([
            "id",
            "source_node",
            "target_node",
            "osm_way_id",
            "link_class",
            "is_link",
            "link_type",
            "control_type",
            "allowed_agent_types",
            "was_bidirectional",
            "lanes",
            "max_speed",
            "free_speed",
            "capacity",
            "length_meters",
            "name",
            "geom",
        ])?;
        for link in self.links.values() {
            writer.write_record([
                link.id.to_string(),
                link.source_node.to_string(),
                link.target_node.to_string(),
                link.osm_way_id.to_string(),
                link.link_class.to_string(),
                link.is_link.to_string(),
                link.link_type.to_string(),
                link.control_type.to_string(),
                agents_column(&link.allowed_agents),
                link.was_bidirectional.to_string(),
                link.lanes.to_string(),
                float(link.max_speed),
                float(link.free_speed),
                link.capacity.to_string(),
                float(link.length_meters),
                link.name.clone(),
                geom_column(&link.geom),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn export_movements(&self, path: &str) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(b';')
            .from_path(path)
            .with_context(|| format!("can't create {}", path))?;
        writer.write_record([
            "id",
            "node_id",
            "osm_node_id",
            "name",
            "in_link_id",
            "in_lane_start",
            "in_lane_end",
            "out_link_id",
            "out_lane_start",
            "out_lane_end",
            "lanes_num",
            "from_osm_node_id",
            "to_osm_node_id",
            "type",
            "penalty",
            "capacity",
            "control_type",
            "movement_composite_type",
            "volume",
            "free_speed",
            "allowed_agent_types",
            "geom",
        ])?;
        for movement in self.movements.values() {
            writer.write_record([
                movement.id.to_string(),
                movement.node_id.to_string(),
                movement.osm_node_id.to_string(),
                "-".to_string(),
                movement.incoming_link.to_string(),
                movement.income_lane_start.to_string(),
                movement.income_lane_end.to_string(),
                movement.outgoing_link.to_string(),
                movement.outcome_lane_start.to_string(),
                movement.outcome_lane_end.to_string(),
                movement.lanes_num.to_string(),
                movement.from_osm_node_id.to_string(),
                movement.to_osm_node_id.to_string(),
                movement.movement_type.to_string(),
                "-1".to_string(),
                "-1".to_string(),
                movement.control_type.to_string(),
                movement.composite_type.to_string(),
                "-1".to_string(),
                "-1".to_string(),
                agents_column(&movement.allowed_agents),
                geom_column(&movement.geom),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl MesoNetwork {
    pub fn export_csv(&self, output: &str) -> Result<()> {
        let base = base_name(output);
        self.export_nodes(&format!("{}_meso_nodes.csv", base))?;
        self.export_links(&format!("{}_meso_links.csv", base))?;
        Ok(())
    }

    fn export_nodes(&self, path: &str) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(b';')
            .from_path(path)
            .with_context(|| format!("can't create {}", path))?;
        writer.write_record([
            "id",
            "zone_id",
            "macro_node_id",
            "macro_link_id",
            "activity_link_type",
            "boundary_type",
            "longitude",
            "latitude",
        ])?;
        for node in self.nodes.values() {
            writer.write_record([
                node.id.to_string(),
                node.zone_id.to_string(),
                opt_id(node.macro_node_id),
                opt_id(node.macro_link_id),
                node.activity_link_type.to_string(),
                node.boundary_type.to_string(),
                float(node.loc.lon),
                float(node.loc.lat),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn export_links(&self, path: &str) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(b';')
            .from_path(path)
            .with_context(|| format!("can't create {}", path))?;
        writer.write_record([
            "id",
            "source_node",
            "target_node",
            "macro_node_id",
            "macro_link_id",
            "link_type",
            "control_type",
            "movement_composite_type",
            "allowed_agent_types",
            "lanes",
            "free_speed",
            "capacity",
            "length_meters",
            "geom",
        ])?;
        for link in self.links.values() {
            writer.write_record([
                link.id.to_string(),
                link.source_node.to_string(),
                link.target_node.to_string(),
                opt_id(link.macro_node_id),
                opt_id(link.macro_link_id),
                link.link_type.to_string(),
                link.control_type.to_string(),
                link.movement_composite_type.to_string(),
                agents_column(&link.allowed_agents),
                link.lanes.to_string(),
                float(link.free_speed),
                link.capacity.to_string(),
                float(link.length_meters),
                geom_column(&link.geom),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl MicroNetwork {
    pub fn export_csv(&self, output: &str) -> Result<()> {
        let base = base_name(output);
        self.export_nodes(&format!("{}_micro_nodes.csv", base))?;
        self.export_links(&format!("{}_micro_links.csv", base))?;
        Ok(())
    }

    fn export_nodes(&self, path: &str) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(b';')
            .from_path(path)
            .with_context(|| format!("can't create {}", path))?;
        writer.write_record([
            "id",
            "zone_id",
            "meso_link_id",
            "lane_number",
            "boundary_type",
            "longitude",
            "latitude",
        ])?;
        for node in self.nodes.values() {
            writer.write_record([
                node.id.to_string(),
                node.zone_id.to_string(),
                node.meso_link_id.to_string(),
                node.lane_id.to_string(),
                node.boundary_type.to_string(),
                float(node.loc.lon),
                float(node.loc.lat),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn export_links(&self, path: &str) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(b';')
            .from_path(path)
            .with_context(|| format!("can't create {}", path))?;
        writer.write_record([
            "id",
            "source_node",
            "target_node",
            "meso_link_id",
            "macro_link_id",
            "macro_node_id",
            "cell_type",
            "lane_number",
            "meso_link_type",
            "control_type",
            "movement_composite_type",
            "free_speed",
            "capacity",
            "additional_travel_cost",
            "allowed_agent_types",
            "length_meters",
            "geom",
        ])?;
        for link in self.links.values() {
            writer.write_record([
                link.id.to_string(),
                link.source_node.to_string(),
                link.target_node.to_string(),
                link.meso_link_id.to_string(),
                opt_id(link.macro_link_id),
                opt_id(link.macro_node_id),
                link.cell_type.to_string(),
                link.lane_id.to_string(),
                link.meso_link_type.to_string(),
                link.control_type.to_string(),
                link.movement_composite_type.to_string(),
                float(link.free_speed),
                link.capacity.to_string(),
                float(link.additional_travel_cost),
                agents_column(&link.allowed_agents),
                float(link.length_meters),
                geom_column(&link.geom),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}
