//! Avoidance-specific visualization palettes
//!
//! Colors shared by every debug pass so that constraint kinds and solve
//! outcomes read the same in any renderer.

use super::Color;

/// Colors for the half-plane constraints of an agent
#[derive(Debug, Clone, Copy)]
pub struct ConstraintColors;

impl ConstraintColors {
    /// Constraint generated by a static obstacle
    pub const OBSTACLE: Color = Color::ORANGE;

    /// Constraint generated by another agent
    pub const AGENT: Color = Color::CYAN;

    /// Outline of the feasible velocity region
    pub const FEASIBLE_AREA: Color = Color::GREEN;

    /// Max-speed circle
    pub const SPEED_LIMIT: Color = Color::GRAY;
}

/// Colors for agents and obstacles in the tick snapshot
#[derive(Debug, Clone, Copy)]
pub struct ActorColors;

impl ActorColors {
    /// Agent footprint
    pub const AGENT: Color = Color::BLUE;

    /// Obstacle footprint
    pub const OBSTACLE: Color = Color::RED;

    /// Desired velocity arrow
    pub const DESIRED_VELOCITY: Color = Color::YELLOW;

    /// Label text
    pub const LABEL: Color = Color::WHITE;
}

/// Colors for the chosen velocity, by how it was found
#[derive(Debug, Clone, Copy)]
pub struct OutcomeColors;

impl OutcomeColors {
    /// Found by the primary solve
    pub const PRIMARY: Color = Color::GREEN;

    /// Found by the degraded retry loop
    pub const DEGRADED: Color = Color::ORANGE;

    /// Nothing found, desired velocity kept
    pub const EXHAUSTED: Color = Color::RED;

    /// Avoidance switched off
    pub const DISABLED: Color = Color::GRAY;
}
