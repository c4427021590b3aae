//! Tick-scoped agent and obstacle records
//!
//! At the start of every tick the registered handles are turned into dense
//! arrays of plain values. Indices into these arrays are only meaningful for
//! the tick that produced them.

use avoidance_common::planar;
use glam::{Vec2, Vec3};

use crate::actor::{ActorHandle, ActorWorld, AgentParams, NavigationBinding, ObstacleParams, Treatment};

/// An agent taking part in the current tick
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    /// Dense index in the tick's agent array
    pub index: usize,
    /// Feet position (Y-up)
    pub position: Vec3,
    /// Current planar velocity
    pub current_velocity: Vec2,
    /// Desired planar velocity
    pub desired_velocity: Vec2,
    /// Footprint radius
    pub radius: f32,
    /// Vertical extent above `position`
    pub height: f32,
    /// Maximum speed
    pub max_speed: f32,
    /// Navigation mesh binding
    pub navigation: NavigationBinding,
}

impl Agent {
    /// Builds the tick record for agent `index`
    pub fn from_params(index: usize, params: &AgentParams) -> Self {
        Self {
            index,
            position: params.position,
            current_velocity: planar(params.current_velocity),
            desired_velocity: planar(params.desired_velocity),
            radius: params.radius,
            height: params.height,
            max_speed: params.max_speed,
            navigation: params.navigation,
        }
    }

    /// Position on the navigable plane
    #[inline]
    pub fn planar_position(&self) -> Vec2 {
        planar(self.position)
    }
}

/// A hard obstacle taking part in the current tick
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    /// Base position (Y-up)
    pub position: Vec3,
    /// Footprint radius
    pub radius: f32,
    /// Vertical extent above `position`
    pub height: f32,
}

impl Obstacle {
    /// Builds the tick record from obstacle parameters
    pub fn from_params(params: &ObstacleParams) -> Self {
        Self {
            position: params.position,
            radius: params.radius,
            height: params.height,
        }
    }

    /// Treats a stationary agent as an obstacle occupying its footprint
    pub fn from_agent(agent: &Agent) -> Self {
        Self {
            position: agent.position,
            radius: agent.radius,
            height: agent.height,
        }
    }

    /// Position on the navigable plane
    #[inline]
    pub fn planar_position(&self) -> Vec2 {
        planar(self.position)
    }
}

/// Dense per-tick arrays built from the registry
#[derive(Debug, Default)]
pub struct TickSnapshot {
    /// Agents avoiding others this tick
    pub agents: Vec<Agent>,
    /// Handle of each agent, parallel to `agents`
    pub agent_handles: Vec<ActorHandle>,
    /// Obstacles this tick
    pub obstacles: Vec<Obstacle>,
}

impl TickSnapshot {
    /// Creates an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the snapshot by asking `world` how each handle is treated.
    ///
    /// At most `max_agents` agents are taken; further agents are skipped.
    pub fn build<W: ActorWorld + ?Sized>(
        &mut self,
        handles: &[ActorHandle],
        world: &W,
        max_agents: usize,
    ) {
        self.clear();

        for &handle in handles {
            match world.treatment(handle) {
                Some(Treatment::Agent(params)) => {
                    if self.agents.len() >= max_agents {
                        log::warn!(
                            "Skipping agent {}: {} agents already in this tick",
                            handle.id(),
                            max_agents
                        );
                        continue;
                    }
                    let index = self.agents.len();
                    self.agents.push(Agent::from_params(index, &params));
                    self.agent_handles.push(handle);
                }
                Some(Treatment::Obstacle(params)) => {
                    self.obstacles.push(Obstacle::from_params(&params));
                }
                None => {}
            }
        }
    }

    /// Removes all records, keeping the allocations
    pub fn clear(&mut self) {
        self.agents.clear();
        self.agent_handles.clear();
        self.obstacles.clear();
    }

    /// Removes all records and releases the allocations
    pub fn release(&mut self) {
        self.agents = Vec::new();
        self.agent_handles = Vec::new();
        self.obstacles = Vec::new();
    }

    /// Index of the agent registered under `handle`, if it is in this tick
    pub fn agent_index(&self, handle: ActorHandle) -> Option<usize> {
        self.agent_handles.iter().position(|&h| h == handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapWorld {
        actors: HashMap<ActorHandle, Treatment>,
    }

    impl ActorWorld for MapWorld {
        fn treatment(&self, handle: ActorHandle) -> Option<Treatment> {
            self.actors.get(&handle).cloned()
        }

        fn apply_computed_velocity(&mut self, _handle: ActorHandle, _velocity: Vec2, _dt: f32) {}
    }

    #[test]
    fn test_build_splits_agents_and_obstacles() {
        let mut actors = HashMap::new();
        actors.insert(
            ActorHandle::new(1),
            Treatment::Agent(AgentParams {
                position: Vec3::new(1.0, 0.0, 2.0),
                desired_velocity: Vec3::new(1.0, 5.0, 0.0),
                ..Default::default()
            }),
        );
        actors.insert(
            ActorHandle::new(2),
            Treatment::Obstacle(ObstacleParams::default()),
        );
        let world = MapWorld { actors };

        let handles = [ActorHandle::new(1), ActorHandle::new(2), ActorHandle::new(3)];
        let mut snapshot = TickSnapshot::new();
        snapshot.build(&handles, &world, 10);

        assert_eq!(snapshot.agents.len(), 1);
        assert_eq!(snapshot.obstacles.len(), 1);
        assert_eq!(snapshot.agent_handles, vec![ActorHandle::new(1)]);
        assert_eq!(snapshot.agents[0].planar_position(), Vec2::new(1.0, 2.0));
        // The vertical component never reaches the planar solve
        assert_eq!(snapshot.agents[0].desired_velocity, Vec2::new(1.0, 0.0));
        assert_eq!(snapshot.agent_index(ActorHandle::new(1)), Some(0));
        assert_eq!(snapshot.agent_index(ActorHandle::new(2)), None);
    }

    #[test]
    fn test_build_caps_agent_count() {
        let mut actors = HashMap::new();
        for id in 1..=5 {
            actors.insert(ActorHandle::new(id), Treatment::Agent(AgentParams::default()));
        }
        let world = MapWorld { actors };
        let handles: Vec<_> = (1..=5).map(ActorHandle::new).collect();

        let mut snapshot = TickSnapshot::new();
        snapshot.build(&handles, &world, 3);
        assert_eq!(snapshot.agents.len(), 3);
        assert_eq!(snapshot.agents[2].index, 2);
    }
}
