//! Reciprocal collision avoidance for agents on a navigable plane
//!
//! Every tick the solver takes a snapshot of the registered actors, builds
//! half-plane velocity constraints for each agent from its neighbors, clips
//! the agent's speed disc with them, and picks the admissible velocity
//! closest to what the agent wanted. Candidates can be checked against a
//! navigation mesh before they are accepted.
//!
//! # Features
//!
//! - **Reciprocal avoidance**: moving agents share the correction, obstacles
//!   and standing agents do not
//! - **Height bands**: actors on different floors ignore each other
//! - **Graceful fallback**: shorter horizons and fewer neighbors before an
//!   agent is left on its desired velocity
//! - **Bounded memory**: the feasible region lives in a fixed inline buffer
//!
//! # Example
//!
//! ```rust,ignore
//! use avoidance::{ActorHandle, AvoidanceConfig, CollisionAvoidanceSystem, NoClamp};
//!
//! let mut system = CollisionAvoidanceSystem::new();
//! system.register(ActorHandle::new(1))?;
//! system.register(ActorHandle::new(2))?;
//!
//! // `world` implements `ActorWorld` and receives the computed velocities
//! let config = AvoidanceConfig::default();
//! let stats = system.update(&mut world, &config, &NoClamp, delta_time)?;
//! ```

pub mod actor;
pub mod candidates;
pub mod clamp;
pub mod config;
pub mod constraints;
mod debug_draw;
pub mod feasible_area;
pub mod neighbors;
pub mod registry;
pub mod snapshot;
pub mod system;
pub mod walls;

mod avoidance_scenario_tests;

pub use actor::{
    ActorHandle, ActorWorld, AgentParams, NavAgentTypeId, NavigationBinding, ObstacleParams,
    Treatment,
};
pub use candidates::{Candidate, compute_candidates, find_first_walkable_velocity};
pub use clamp::{MeshId, NavMeshRaycast, NavMeshVelocityClamp, NoClamp, RayHit, VelocityClamp};
pub use config::*;
pub use constraints::{ConstraintGenerator, ConstraintKind, ConstraintLine};
pub use feasible_area::{FeasibleArea, FeasiblePolygon};
pub use neighbors::{NearbyAgent, NearbyObstacle, find_nearby_agents, find_nearby_obstacles};
pub use registry::ActorRegistry;
pub use snapshot::{Agent, Obstacle, TickSnapshot};
pub use system::{CollisionAvoidanceSystem, SolveOutcome, SolveRecord, TickStats};
pub use walls::{WallSegment, WallSegments};

pub use avoidance_common::{Error, Result};
