//! Brute-force neighbor queries over the tick snapshot
//!
//! Agent counts are bounded by the registry capacity, so a linear scan is
//! cheaper than maintaining a spatial index between ticks.

use avoidance_common::{COINCIDENT_EPSILON, height_bands_overlap, sqr};
use std::cmp::Ordering;

use crate::config::MOVING_SPEED_EPSILON;
use crate::snapshot::{Agent, Obstacle};

/// An obstacle within scan range of an agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyObstacle {
    /// Squared planar distance between the two centers
    pub distance_sq: f32,
    /// Index in the tick's obstacle array
    pub obstacle_index: usize,
}

/// Another agent within scan range of an agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyAgent {
    /// Squared planar distance between the two centers
    pub distance_sq: f32,
    /// Index in the tick's agent array
    pub agent_index: usize,
    /// Whether the other agent wants to move this tick
    pub moving: bool,
}

/// Collects the obstacles near `agent` into `out`, in obstacle array order
pub fn find_nearby_obstacles(
    agent: &Agent,
    obstacles: &[Obstacle],
    range: f32,
    out: &mut Vec<NearbyObstacle>,
) {
    out.clear();

    let position = agent.planar_position();
    for (obstacle_index, obstacle) in obstacles.iter().enumerate() {
        let distance_sq = position.distance_squared(obstacle.planar_position());
        if distance_sq >= sqr(range + obstacle.radius) {
            continue;
        }
        if !height_bands_overlap(
            agent.position.y,
            agent.height,
            obstacle.position.y,
            obstacle.height,
        ) {
            continue;
        }

        out.push(NearbyObstacle {
            distance_sq,
            obstacle_index,
        });
    }
}

/// Collects the agents near `agents[agent_index]` into `out`, nearest first
pub fn find_nearby_agents(
    agent_index: usize,
    agents: &[Agent],
    range: f32,
    out: &mut Vec<NearbyAgent>,
) {
    out.clear();

    let Some(agent) = agents.get(agent_index) else {
        return;
    };

    // Scanning both sides of the agent skips the self-comparison
    let (before, rest) = agents.split_at(agent_index);
    let after = &rest[1..];

    for (other_index, other) in before
        .iter()
        .enumerate()
        .chain(after.iter().enumerate().map(|(i, a)| (agent_index + 1 + i, a)))
    {
        if let Some(nearby) = nearby_agent(agent, other, other_index, range) {
            out.push(nearby);
        }
    }

    out.sort_by(|a, b| {
        a.distance_sq
            .partial_cmp(&b.distance_sq)
            .unwrap_or(Ordering::Equal)
    });
}

fn nearby_agent(agent: &Agent, other: &Agent, other_index: usize, range: f32) -> Option<NearbyAgent> {
    let distance_sq = agent
        .planar_position()
        .distance_squared(other.planar_position());

    if distance_sq >= sqr(range + other.radius) {
        return None;
    }

    // Agents occasionally end up stacked on the exact same spot; no usable
    // constraint exists between them, so they ignore each other.
    // TODO: find out which movement path produces the stacked positions.
    if distance_sq < sqr(COINCIDENT_EPSILON) {
        return None;
    }

    if !height_bands_overlap(agent.position.y, agent.height, other.position.y, other.height) {
        return None;
    }

    Some(NearbyAgent {
        distance_sq,
        agent_index: other_index,
        moving: other.desired_velocity.length_squared() > sqr(MOVING_SPEED_EPSILON),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::AgentParams;
    use glam::Vec3;

    fn agent_at(index: usize, x: f32, y: f32, z: f32, desired: Vec3) -> Agent {
        Agent::from_params(
            index,
            &AgentParams {
                position: Vec3::new(x, y, z),
                desired_velocity: desired,
                radius: 0.5,
                height: 2.0,
                ..Default::default()
            },
        )
    }

    fn obstacle_at(x: f32, y: f32, z: f32, radius: f32) -> Obstacle {
        Obstacle {
            position: Vec3::new(x, y, z),
            radius,
            height: 2.0,
        }
    }

    #[test]
    fn test_agents_sorted_and_self_excluded() {
        let agents = vec![
            agent_at(0, 5.0, 0.0, 0.0, Vec3::X),
            agent_at(1, 0.0, 0.0, 0.0, Vec3::X),
            agent_at(2, 2.0, 0.0, 0.0, Vec3::ZERO),
            agent_at(3, 0.0, 0.0, 1.0, Vec3::X),
        ];
        let mut out = Vec::new();
        find_nearby_agents(1, &agents, 10.0, &mut out);

        let order: Vec<_> = out.iter().map(|n| n.agent_index).collect();
        assert_eq!(order, vec![3, 2, 0]);
        assert!(out[0].moving);
        assert!(!out[1].moving);
        assert!((out[1].distance_sq - 4.0).abs() < 1.0e-6);
    }

    #[test]
    fn test_agents_out_of_range_or_band_skipped() {
        let agents = vec![
            agent_at(0, 0.0, 0.0, 0.0, Vec3::X),
            agent_at(1, 20.0, 0.0, 0.0, Vec3::X),
            agent_at(2, 1.0, 5.0, 0.0, Vec3::X),
            agent_at(3, 10.2, 0.0, 0.0, Vec3::X),
        ];
        let mut out = Vec::new();
        find_nearby_agents(0, &agents, 10.0, &mut out);

        // 10.2 < range + radius keeps agent 3; agent 2 is a floor above
        let order: Vec<_> = out.iter().map(|n| n.agent_index).collect();
        assert_eq!(order, vec![3]);
    }

    #[test]
    fn test_coincident_agents_ignore_each_other() {
        let agents = vec![
            agent_at(0, 1.0, 0.0, 1.0, Vec3::X),
            agent_at(1, 1.0, 0.0, 1.0, Vec3::X),
        ];
        let mut out = Vec::new();
        find_nearby_agents(0, &agents, 10.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_invalid_index_yields_nothing() {
        let agents = vec![agent_at(0, 0.0, 0.0, 0.0, Vec3::X)];
        let mut out = vec![NearbyAgent {
            distance_sq: 1.0,
            agent_index: 0,
            moving: true,
        }];
        find_nearby_agents(4, &agents, 10.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_obstacles_in_array_order() {
        let agent = agent_at(0, 0.0, 0.0, 0.0, Vec3::X);
        let obstacles = vec![
            obstacle_at(6.0, 0.0, 0.0, 1.0),
            obstacle_at(2.0, 0.0, 0.0, 1.0),
            obstacle_at(0.0, 3.0, 2.0, 1.0),
            obstacle_at(10.5, 0.0, 0.0, 1.0),
            obstacle_at(12.0, 0.0, 0.0, 1.0),
        ];
        let mut out = Vec::new();
        find_nearby_obstacles(&agent, &obstacles, 10.0, &mut out);

        let order: Vec<_> = out.iter().map(|n| n.obstacle_index).collect();
        assert_eq!(order, vec![0, 1, 3]);
    }
}
