//! Interface to the long-lived actors that take part in avoidance
//!
//! The solver never owns actor state. It keeps opaque [`ActorHandle`]s in its
//! registry and asks an [`ActorWorld`] once per tick how each handle should be
//! treated, then hands the computed velocities back through the same world.

use glam::{Vec2, Vec3};

/// Opaque reference to an actor owned by the surrounding game code.
///
/// Handle `0` is reserved as the null handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorHandle(u64);

impl ActorHandle {
    /// The null handle, never accepted by the registry
    pub const NULL: ActorHandle = ActorHandle(0);

    /// Creates a handle from a raw id
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id of the handle
    pub const fn id(&self) -> u64 {
        self.0
    }

    /// Checks whether this is the null handle
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }
}

/// Navigation agent type used to pick the mesh an agent walks on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct NavAgentTypeId(pub u32);

/// How an agent is bound to the navigation subsystem.
///
/// Only consumed by the navmesh velocity clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct NavigationBinding {
    /// Navigation mesh type of the agent
    pub agent_type: NavAgentTypeId,
    /// Opaque query filter token understood by the navigation subsystem
    pub query_filter: u64,
}

/// Parameters of an actor avoiding others this tick
#[derive(Debug, Clone, PartialEq)]
pub struct AgentParams {
    /// Feet position (Y-up)
    pub position: Vec3,
    /// Velocity the agent is currently moving with
    pub current_velocity: Vec3,
    /// Velocity the agent would like to move with
    pub desired_velocity: Vec3,
    /// Footprint radius
    pub radius: f32,
    /// Vertical extent above `position`
    pub height: f32,
    /// Maximum speed
    pub max_speed: f32,
    /// Navigation mesh binding
    pub navigation: NavigationBinding,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            current_velocity: Vec3::ZERO,
            desired_velocity: Vec3::ZERO,
            radius: 0.4,
            height: 2.0,
            max_speed: 4.0,
            navigation: NavigationBinding::default(),
        }
    }
}

/// Parameters of an actor treated as a hard obstacle this tick
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleParams {
    /// Base position (Y-up)
    pub position: Vec3,
    /// Footprint radius
    pub radius: f32,
    /// Vertical extent above `position`
    pub height: f32,
}

impl Default for ObstacleParams {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            radius: 0.5,
            height: 2.0,
        }
    }
}

/// How a registered actor takes part in this tick
#[derive(Debug, Clone, PartialEq)]
pub enum Treatment {
    /// Actively avoids others and receives a computed velocity
    Agent(AgentParams),
    /// Static footprint that others must avoid
    Obstacle(ObstacleParams),
}

/// The owner of the actors behind the registered handles
pub trait ActorWorld {
    /// How `handle` is treated this tick; `None` leaves it out of the tick
    fn treatment(&self, handle: ActorHandle) -> Option<Treatment>;

    /// Hands the computed planar velocity of an agent back to its owner
    fn apply_computed_velocity(&mut self, handle: ActorHandle, velocity: Vec2, dt: f32);

    /// Human readable name used by the debug pass
    fn debug_name(&self, handle: ActorHandle) -> String {
        format!("actor#{}", handle.id())
    }
}
