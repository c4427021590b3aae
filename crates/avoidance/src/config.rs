//! Solver configuration
//!
//! Every option is a read-only input to a tick; the solver never mutates it.

use avoidance_common::{Error, Result};

/// Maximum number of vertices of a feasible velocity region
pub const FEASIBLE_AREA_MAX_VERTEX_COUNT: usize = 64;

/// Vertices reserved when sizing the registry.
///
/// An agent never constrains itself, so a full registry yields at most
/// `MAX_REGISTERED_ACTORS - 1` lines, which the four-vertex starting square
/// still fits.
pub const FEASIBLE_AREA_RESERVED_VERTICES: usize = 3;

/// Vertices of the square a feasible region starts from
pub const FEASIBLE_AREA_BOUNDS_VERTEX_COUNT: usize = 4;

/// Constraint lines a feasible region can take; each clip adds at most one
/// vertex
pub const MAX_FEASIBLE_AREA_CONSTRAINTS: usize =
    FEASIBLE_AREA_MAX_VERTEX_COUNT - FEASIBLE_AREA_BOUNDS_VERTEX_COUNT;

/// Maximum number of registered actors (agents and obstacles together)
pub const MAX_REGISTERED_ACTORS: usize =
    FEASIBLE_AREA_MAX_VERTEX_COUNT - FEASIBLE_AREA_RESERVED_VERTICES;

/// Time-horizon scale of the primary solve
pub const PRIMARY_TIME_HORIZON_SCALE: f32 = 1.0;

/// Minimum speed a clamped candidate needs to be accepted as walkable
pub const MIN_WALKABLE_SPEED: f32 = 0.01;

/// Desired speed above which an agent counts as moving
pub const MOVING_SPEED_EPSILON: f32 = 1.0e-4;

/// Weight applied to the squared distance when shrinking obstacle horizons
pub const OBSTACLE_HORIZON_DISTANCE_WEIGHT: f32 = 0.01;

/// Lower bound of the obstacle time-horizon scale
pub const MIN_OBSTACLE_HORIZON_SCALE: f32 = 0.25;

const DEFAULT_SCAN_RANGE: f32 = 10.0;
const DEFAULT_MIN_SPEED: f32 = 0.2;
const DEFAULT_AGENT_TIME_HORIZON: f32 = 2.5;
const DEFAULT_OBSTACLE_TIME_HORIZON: f32 = 1.5;
const DEFAULT_TIME_STEP: f32 = 0.1;
const DEFAULT_CONSIDER_COUNT: usize = 8;
const DEFAULT_DEGRADED_TIME_HORIZON_SCALE: f32 = 0.25;

/// Configuration for the collision avoidance solver
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct AvoidanceConfig {
    /// Master switch; when off every agent keeps its desired velocity
    pub enabled: bool,
    /// Range in which neighbors are considered
    pub scan_range: f32,
    /// Candidates at or below this speed are discarded
    pub min_speed: f32,
    /// Look-ahead used against other agents
    pub agent_time_horizon: f32,
    /// Look-ahead used against obstacles
    pub obstacle_time_horizon: f32,
    /// Simulation step used for overlap separation and navmesh clamping
    pub time_step: f32,
    /// Whether candidates are clamped against the navigation mesh
    pub clamp_velocities_with_navmesh: bool,
    /// Maximum number of nearby agents turned into constraints
    pub consider_count: usize,
    /// Time-horizon scale used by the degraded retry loop
    pub degraded_time_horizon_scale: f32,
    /// Whether the debug visualization pass draws anything
    pub debug_draw: bool,
    /// Restricts detailed drawing (constraints, feasible area) to one agent
    pub debug_draw_agent_name: Option<String>,
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scan_range: DEFAULT_SCAN_RANGE,
            min_speed: DEFAULT_MIN_SPEED,
            agent_time_horizon: DEFAULT_AGENT_TIME_HORIZON,
            obstacle_time_horizon: DEFAULT_OBSTACLE_TIME_HORIZON,
            time_step: DEFAULT_TIME_STEP,
            clamp_velocities_with_navmesh: false,
            consider_count: DEFAULT_CONSIDER_COUNT,
            degraded_time_horizon_scale: DEFAULT_DEGRADED_TIME_HORIZON_SCALE,
            debug_draw: false,
            debug_draw_agent_name: None,
        }
    }
}

impl AvoidanceConfig {
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_scan_range(mut self, scan_range: f32) -> Self {
        self.scan_range = scan_range;
        self
    }

    pub fn with_min_speed(mut self, min_speed: f32) -> Self {
        self.min_speed = min_speed;
        self
    }

    pub fn with_agent_time_horizon(mut self, agent_time_horizon: f32) -> Self {
        self.agent_time_horizon = agent_time_horizon;
        self
    }

    pub fn with_obstacle_time_horizon(mut self, obstacle_time_horizon: f32) -> Self {
        self.obstacle_time_horizon = obstacle_time_horizon;
        self
    }

    pub fn with_time_step(mut self, time_step: f32) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn with_navmesh_clamp(mut self, clamp: bool) -> Self {
        self.clamp_velocities_with_navmesh = clamp;
        self
    }

    pub fn with_consider_count(mut self, consider_count: usize) -> Self {
        self.consider_count = consider_count;
        self
    }

    pub fn with_degraded_time_horizon_scale(mut self, scale: f32) -> Self {
        self.degraded_time_horizon_scale = scale;
        self
    }

    pub fn with_debug_draw(mut self, debug_draw: bool, agent_name: Option<String>) -> Self {
        self.debug_draw = debug_draw;
        self.debug_draw_agent_name = agent_name;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f32) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidConfig(format!("{name} must be positive, got {value}")))
            }
        }

        fn non_negative(name: &str, value: f32) -> Result<()> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidConfig(format!("{name} must not be negative, got {value}")))
            }
        }

        non_negative("scan_range", self.scan_range)?;
        non_negative("min_speed", self.min_speed)?;
        positive("agent_time_horizon", self.agent_time_horizon)?;
        positive("obstacle_time_horizon", self.obstacle_time_horizon)?;
        positive("time_step", self.time_step)?;
        positive("degraded_time_horizon_scale", self.degraded_time_horizon_scale)?;

        if self.consider_count == 0 {
            return Err(Error::InvalidConfig(
                "consider_count must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Checks whether detailed debug drawing applies to the agent called `name`
    pub fn debug_draws_agent(&self, name: &str) -> bool {
        self.debug_draw
            && self
                .debug_draw_agent_name
                .as_deref()
                .is_none_or(|filter| filter == name)
    }
}
