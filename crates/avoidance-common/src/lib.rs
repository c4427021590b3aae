//! Common utilities and data structures used by the collision avoidance solver

pub mod debug;
mod geometry;
mod math;
mod polygon;

pub use geometry::*;
pub use math::*;
pub use polygon::*;

/// Represents a 2D velocity or planar position
pub type Vec2 = glam::Vec2;

/// Represents a 3D position
pub type Vec3 = glam::Vec3;

/// Error types for the library
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid actor handle")]
    InvalidHandle,

    #[error("registry cannot be modified while a tick is being solved")]
    UpdateInProgress,

    #[error("no tick in progress")]
    TickNotStarted,

    #[error("registry capacity of {capacity} actors exceeded")]
    CapacityExceeded { capacity: usize },

    #[error("{constraints} constraints exceed the feasible area capacity of {capacity} vertices")]
    FeasibleAreaOverflow { constraints: usize, capacity: usize },

    #[error("polygon vertex capacity of {capacity} exceeded")]
    PolygonCapacity { capacity: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for avoidance operations
pub type Result<T> = std::result::Result<T, Error>;
