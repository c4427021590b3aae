//! Half-plane velocity constraints
//!
//! Every nearby obstacle and every considered nearby agent contributes one
//! directed line in velocity space. Velocities on the left of all lines are
//! free of collisions within the relevant time horizon.
//!
//! Moving agents share the avoidance effort: each takes half of the
//! correction. Obstacles, and agents standing still, take no part in it, so
//! the avoiding agent carries the full correction.

use avoidance_common::{COINCIDENT_EPSILON, Line2, left_of, sqr};
use glam::Vec2;

use crate::config::{AvoidanceConfig, MIN_OBSTACLE_HORIZON_SCALE, OBSTACLE_HORIZON_DISTANCE_WEIGHT};
use crate::neighbors::{NearbyAgent, NearbyObstacle};
use crate::snapshot::{Agent, Obstacle};

/// Share of the correction an agent takes when the other agent also avoids
pub const RECIPROCAL_EFFORT: f32 = 0.5;

/// Share of the correction an agent takes when it avoids alone
pub const UNILATERAL_EFFORT: f32 = 1.0;

/// What produced a constraint line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// A tick obstacle
    Obstacle,
    /// Another agent, moving or standing still
    Agent,
}

/// A half-plane constraint tagged with its origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintLine {
    /// Directed line; admissible velocities lie on its left
    pub line: Line2,
    /// Index of the originating obstacle or agent in the tick arrays
    pub object_index: usize,
    /// Kind of the originating object
    pub kind: ConstraintKind,
}

/// Time horizon used against an obstacle at `distance_sq`.
///
/// The scale grows with distance but is held between
/// [`MIN_OBSTACLE_HORIZON_SCALE`] and `time_horizon_scale`, so far obstacles
/// never get a runaway horizon and touching ones never a vanishing one.
pub fn obstacle_time_horizon(distance_sq: f32, time_horizon_scale: f32, config: &AvoidanceConfig) -> f32 {
    let scale = (OBSTACLE_HORIZON_DISTANCE_WEIGHT * distance_sq)
        .max(MIN_OBSTACLE_HORIZON_SCALE)
        .min(time_horizon_scale);
    config.obstacle_time_horizon * scale
}

/// Builds the half-plane that keeps `agent` clear of a static obstacle
pub fn obstacle_constraint_line(
    agent: &Agent,
    obstacle: &Obstacle,
    time_horizon_scale: f32,
    config: &AvoidanceConfig,
) -> Line2 {
    let relative_position = obstacle.planar_position() - agent.planar_position();
    let distance_sq = relative_position.length_squared();
    let radii = agent.radius + obstacle.radius;
    let inv_horizon = 1.0 / obstacle_time_horizon(distance_sq, time_horizon_scale, config);

    if distance_sq > sqr(radii) {
        let velocity = agent.desired_velocity;
        let (direction, correction) =
            velocity_obstacle_correction(relative_position, velocity, radii, inv_horizon);
        return Line2::new(velocity + correction, direction);
    }

    if distance_sq > sqr(COINCIDENT_EPSILON) {
        let distance = distance_sq.sqrt();
        return separation_line(
            relative_position / distance,
            (radii - distance) * inv_horizon,
        );
    }

    // Coincident: assume the obstacle lies where the agent is heading
    let toward = agent.current_velocity.try_normalize().unwrap_or(Vec2::X);
    separation_line(toward, radii * inv_horizon)
}

/// Builds the half-plane that keeps `agent` clear of another agent.
///
/// With `reciprocal` the agent takes half of the correction and relies on the
/// other agent to take the rest.
pub fn agent_constraint_line(
    agent: &Agent,
    other: &Agent,
    reciprocal: bool,
    time_horizon_scale: f32,
    config: &AvoidanceConfig,
) -> Line2 {
    let relative_position = other.planar_position() - agent.planar_position();
    let relative_velocity = agent.current_velocity - other.current_velocity;
    let distance_sq = relative_position.length_squared();
    let radii = agent.radius + other.radius;

    let (direction, correction) = if distance_sq > sqr(radii) {
        let inv_horizon = 1.0 / (config.agent_time_horizon * time_horizon_scale);
        velocity_obstacle_correction(relative_position, relative_velocity, radii, inv_horizon)
    } else {
        // Already overlapping: resolve within a single time step
        let inv_time_step = 1.0 / config.time_step;
        let w = relative_velocity - inv_time_step * relative_position;
        let w_length = w.length();

        let unit_w = if w_length > COINCIDENT_EPSILON {
            w / w_length
        } else if distance_sq > sqr(COINCIDENT_EPSILON) {
            -relative_position / distance_sq.sqrt()
        } else {
            -agent.current_velocity.try_normalize().unwrap_or(Vec2::X)
        };

        (
            Vec2::new(unit_w.y, -unit_w.x),
            (radii * inv_time_step - w_length) * unit_w,
        )
    };

    let effort = if reciprocal {
        RECIPROCAL_EFFORT
    } else {
        UNILATERAL_EFFORT
    };

    Line2::new(agent.current_velocity + effort * correction, direction)
}

/// Closest point on the truncated velocity-obstacle cone.
///
/// Returns the boundary direction at that point and the vector `u` from
/// `relative_velocity` to it.
fn velocity_obstacle_correction(
    relative_position: Vec2,
    relative_velocity: Vec2,
    radii: f32,
    inv_horizon: f32,
) -> (Vec2, Vec2) {
    let distance_sq = relative_position.length_squared();
    let radii_sq = sqr(radii);

    // Vector from the cutoff center to the relative velocity
    let w = relative_velocity - inv_horizon * relative_position;
    let w_length_sq = w.length_squared();
    let dot = w.dot(relative_position);

    if dot < 0.0 && sqr(dot) > radii_sq * w_length_sq {
        // Closest to the cutoff arc
        let w_length = w_length_sq.sqrt();
        let unit_w = w / w_length;
        let direction = Vec2::new(unit_w.y, -unit_w.x);
        return (direction, (radii * inv_horizon - w_length) * unit_w);
    }

    // Closest to one of the legs
    let leg = (distance_sq - radii_sq).sqrt();
    let direction = if left_of(relative_position, w) > 0.0 {
        Vec2::new(
            relative_position.x * leg - relative_position.y * radii,
            relative_position.x * radii + relative_position.y * leg,
        ) / distance_sq
    } else {
        -Vec2::new(
            relative_position.x * leg + relative_position.y * radii,
            -relative_position.x * radii + relative_position.y * leg,
        ) / distance_sq
    };

    let correction = relative_velocity.dot(direction) * direction - relative_velocity;
    (direction, correction)
}

/// Half-plane of velocities moving away from `toward` at `speed` or more
fn separation_line(toward: Vec2, speed: f32) -> Line2 {
    Line2::new(-toward * speed, toward.perp())
}

/// Turns the neighborhood of one agent into constraint lines
#[derive(Debug, Clone, Copy)]
pub struct ConstraintGenerator<'a> {
    /// Agents of the current tick
    pub agents: &'a [Agent],
    /// Obstacles of the current tick
    pub obstacles: &'a [Obstacle],
    /// Solver configuration
    pub config: &'a AvoidanceConfig,
}

impl<'a> ConstraintGenerator<'a> {
    /// Creates a generator over the tick arrays
    pub fn new(agents: &'a [Agent], obstacles: &'a [Obstacle], config: &'a AvoidanceConfig) -> Self {
        Self {
            agents,
            obstacles,
            config,
        }
    }

    /// Fills `out` with obstacle constraints followed by agent constraints.
    ///
    /// Only the first `consider_count` entries of `nearby_agents` are used;
    /// they are expected nearest first, so the agent constraints end with the
    /// furthest considered agent. Returns the number of obstacle constraints.
    pub fn generate(
        &self,
        agent: &Agent,
        nearby_obstacles: &[NearbyObstacle],
        nearby_agents: &[NearbyAgent],
        consider_count: usize,
        time_horizon_scale: f32,
        out: &mut Vec<ConstraintLine>,
    ) -> usize {
        out.clear();

        for nearby in nearby_obstacles {
            let obstacle = &self.obstacles[nearby.obstacle_index];
            out.push(ConstraintLine {
                line: obstacle_constraint_line(agent, obstacle, time_horizon_scale, self.config),
                object_index: nearby.obstacle_index,
                kind: ConstraintKind::Obstacle,
            });
        }
        let obstacle_count = out.len();

        for nearby in nearby_agents.iter().take(consider_count) {
            let other = &self.agents[nearby.agent_index];
            let line = if nearby.moving {
                agent_constraint_line(agent, other, true, time_horizon_scale, self.config)
            } else {
                let obstacle = Obstacle::from_agent(other);
                obstacle_constraint_line(agent, &obstacle, time_horizon_scale, self.config)
            };
            out.push(ConstraintLine {
                line,
                object_index: nearby.agent_index,
                kind: ConstraintKind::Agent,
            });
        }

        obstacle_count
    }
}
