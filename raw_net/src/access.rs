//! Per-agent access decisions from OSM access tags. An include match forces
//! acceptance, an exclude match forces rejection, and the default is to
//! accept.

use crate::types::AgentType;
use crate::way::RawWay;

fn include_matches(agent: AgentType, way: &RawWay) -> bool {
    match agent {
        AgentType::Auto => way.motor_vehicle == "yes" || way.motorcar == "yes",
        AgentType::Bike => way.bicycle == "yes",
        AgentType::Walk => way.foot == "yes",
    }
}

fn exclude_matches(agent: AgentType, way: &RawWay) -> bool {
    match agent {
        AgentType::Auto => {
            matches!(
                way.highway.as_str(),
                "cycleway"
                    | "footway"
                    | "pedestrian"
                    | "steps"
                    | "track"
                    | "corridor"
                    | "elevator"
                    | "escalator"
                    | "service"
                    | "living_street"
            ) || way.motor_vehicle == "no"
                || way.motorcar == "no"
                || way.access == "private"
                || matches!(
                    way.service.as_str(),
                    "parking" | "parking_aisle" | "driveway" | "private" | "emergency_access"
                )
        }
        AgentType::Bike => {
            matches!(
                way.highway.as_str(),
                "footway" | "steps" | "corridor" | "elevator" | "escalator" | "motor" | "motorway" | "motorway_link"
            ) || way.bicycle == "no"
                || way.service == "private"
                || way.access == "private"
        }
        AgentType::Walk => {
            matches!(
                way.highway.as_str(),
                "cycleway" | "motor" | "motorway" | "motorway_link"
            ) || way.foot == "no"
                || way.service == "private"
                || way.access == "private"
        }
    }
}

/// All agent types this way admits.
pub fn allowed_agents(way: &RawWay) -> Vec<AgentType> {
    AgentType::ALL
        .iter()
        .copied()
        .filter(|&agent| include_matches(agent, way) || !exclude_matches(agent, way))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osm::WayID;
    use crate::tags::Tags;

    fn way(pairs: &[(&str, &str)]) -> RawWay {
        RawWay::from_tags(WayID(1), Vec::new(), &Tags::from_pairs(pairs))
    }

    #[test]
    fn plain_road_allows_everyone() {
        let w = way(&[("highway", "residential")]);
        assert_eq!(
            allowed_agents(&w),
            vec![AgentType::Auto, AgentType::Bike, AgentType::Walk]
        );
    }

    #[test]
    fn motorway_excludes_bike_and_walk() {
        let w = way(&[("highway", "motorway")]);
        assert_eq!(allowed_agents(&w), vec![AgentType::Auto]);
    }

    #[test]
    fn include_overrides_exclude() {
        // service roads normally exclude autos, but motor_vehicle=yes wins
        let w = way(&[("highway", "service"), ("motor_vehicle", "yes")]);
        assert!(allowed_agents(&w).contains(&AgentType::Auto));
    }

    #[test]
    fn private_access_excludes_all() {
        let w = way(&[("highway", "residential"), ("access", "private")]);
        assert!(allowed_agents(&w).is_empty());
    }
}
