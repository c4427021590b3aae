//! Debug visualization of the last tick
//!
//! Runs after a tick over the same snapshot the solver used and never feeds
//! anything back into it. Velocity-space shapes (constraint lines, feasible
//! regions) are drawn around the agent they belong to.

use avoidance_common::debug::{ActorColors, Color, ConstraintColors, DebugDraw, OutcomeColors};
use avoidance_common::from_planar;
use glam::{Vec2, Vec3};

use crate::actor::ActorWorld;
use crate::config::{AvoidanceConfig, PRIMARY_TIME_HORIZON_SCALE};
use crate::constraints::{ConstraintGenerator, ConstraintKind};
use crate::feasible_area::FeasibleArea;
use crate::neighbors::{find_nearby_agents, find_nearby_obstacles};
use crate::snapshot::Agent;
use crate::system::{CollisionAvoidanceSystem, SolveOutcome};

/// Height above the feet at which velocity-space shapes are drawn
const DRAW_LIFT: f32 = 0.1;

fn point(position: Vec3, offset: Vec2) -> [f32; 3] {
    (position + from_planar(offset, DRAW_LIFT)).to_array()
}

fn outcome_color(outcome: SolveOutcome) -> Color {
    match outcome {
        SolveOutcome::Primary => OutcomeColors::PRIMARY,
        SolveOutcome::Degraded { .. } => OutcomeColors::DEGRADED,
        SolveOutcome::Exhausted => OutcomeColors::EXHAUSTED,
        SolveOutcome::Disabled => OutcomeColors::DISABLED,
    }
}

impl CollisionAvoidanceSystem {
    /// Draws the last tick into `draw`.
    ///
    /// Every agent and obstacle is drawn with its velocities. Agents passing
    /// the configured name filter also get their primary-pass constraints
    /// and feasible region. Draws nothing unless `config.debug_draw` is set.
    pub fn debug_draw<W: ActorWorld + ?Sized>(
        &self,
        world: &W,
        config: &AvoidanceConfig,
        draw: &mut DebugDraw,
    ) {
        if !config.debug_draw {
            return;
        }

        let snapshot = self.snapshot();

        for obstacle in &snapshot.obstacles {
            draw.circle(obstacle.position.to_array(), obstacle.radius, ActorColors::OBSTACLE);
        }

        for (agent, &handle) in snapshot.agents.iter().zip(&snapshot.agent_handles) {
            draw.circle(agent.position.to_array(), agent.radius, ActorColors::AGENT);
            draw.arrow(
                agent.position.to_array(),
                point(agent.position, agent.desired_velocity),
                ActorColors::DESIRED_VELOCITY,
            );

            let outcome = self.solve_record(handle).map(|r| r.outcome);
            if let (Some(outcome), Some(&velocity)) = (outcome, self.velocities().get(agent.index)) {
                draw.arrow(
                    agent.position.to_array(),
                    point(agent.position, velocity),
                    outcome_color(outcome),
                );
            }

            let name = world.debug_name(handle);
            if config.debug_draws_agent(&name) {
                self.draw_agent_constraints(agent, config, draw);
            }
            draw.text(point(agent.position, Vec2::ZERO), name, ActorColors::LABEL);
        }
    }

    fn draw_agent_constraints(&self, agent: &Agent, config: &AvoidanceConfig, draw: &mut DebugDraw) {
        let snapshot = self.snapshot();

        let mut nearby_obstacles = Vec::new();
        let mut nearby_agents = Vec::new();
        find_nearby_obstacles(agent, &snapshot.obstacles, config.scan_range, &mut nearby_obstacles);
        find_nearby_agents(agent.index, &snapshot.agents, config.scan_range, &mut nearby_agents);

        let mut lines = Vec::new();
        ConstraintGenerator::new(&snapshot.agents, &snapshot.obstacles, config).generate(
            agent,
            &nearby_obstacles,
            &nearby_agents,
            config.consider_count,
            PRIMARY_TIME_HORIZON_SCALE,
            &mut lines,
        );

        let extent = 1.0 + agent.max_speed;
        for constraint in &lines {
            let color = match constraint.kind {
                ConstraintKind::Obstacle => ConstraintColors::OBSTACLE,
                ConstraintKind::Agent => ConstraintColors::AGENT,
            };
            let direction = constraint.line.direction.normalize_or_zero() * extent;
            draw.line(
                point(agent.position, constraint.line.point - direction),
                point(agent.position, constraint.line.point + direction),
                color,
            );
        }

        draw.circle(
            point(agent.position, Vec2::ZERO),
            agent.max_speed,
            ConstraintColors::SPEED_LIMIT,
        );

        let mut area = FeasibleArea::new();
        if area.build(&lines, agent.max_speed).is_ok() && !area.is_empty() {
            let outline: Vec<_> = area
                .vertices()
                .iter()
                .map(|&v| point(agent.position, v))
                .collect();
            draw.polygon(&outline, ConstraintColors::FEASIBLE_AREA);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{ActorHandle, AgentParams, ObstacleParams, Treatment};
    use crate::clamp::NoClamp;
    use avoidance_common::Result;

    struct PairWorld;

    impl ActorWorld for PairWorld {
        fn treatment(&self, handle: ActorHandle) -> Option<Treatment> {
            match handle.id() {
                1 => Some(Treatment::Agent(AgentParams {
                    desired_velocity: Vec3::new(1.0, 0.0, 0.0),
                    current_velocity: Vec3::new(1.0, 0.0, 0.0),
                    ..Default::default()
                })),
                2 => Some(Treatment::Obstacle(ObstacleParams {
                    position: Vec3::new(3.0, 0.0, 0.0),
                    ..Default::default()
                })),
                _ => None,
            }
        }

        fn apply_computed_velocity(&mut self, _handle: ActorHandle, _velocity: Vec2, _dt: f32) {}

        fn debug_name(&self, handle: ActorHandle) -> String {
            format!("walker{}", handle.id())
        }
    }

    fn solved_system() -> Result<CollisionAvoidanceSystem> {
        let mut system = CollisionAvoidanceSystem::new();
        system.register(ActorHandle::new(1))?;
        system.register(ActorHandle::new(2))?;
        system.update(&mut PairWorld, &AvoidanceConfig::default(), &NoClamp, 0.1)?;
        Ok(system)
    }

    #[test]
    fn test_disabled_draws_nothing() -> Result<()> {
        let system = solved_system()?;
        let mut draw = DebugDraw::new();
        system.debug_draw(&PairWorld, &AvoidanceConfig::default(), &mut draw);
        assert!(draw.is_empty());
        Ok(())
    }

    #[test]
    fn test_filtered_agent_gets_constraints() -> Result<()> {
        let system = solved_system()?;

        let mut overview = DebugDraw::new();
        let config = AvoidanceConfig::default().with_debug_draw(true, Some("nobody".to_string()));
        system.debug_draw(&PairWorld, &config, &mut overview);
        assert_eq!(overview.circles.len(), 2);
        assert_eq!(overview.arrows.len(), 2);
        assert!(overview.lines.is_empty());
        assert_eq!(overview.text.len(), 1);

        let mut detailed = DebugDraw::new();
        let config = AvoidanceConfig::default().with_debug_draw(true, Some("walker1".to_string()));
        system.debug_draw(&PairWorld, &config, &mut detailed);
        // Speed limit circle on top of the overview
        assert_eq!(detailed.circles.len(), 3);
        // One constraint line plus the feasible polygon outline
        assert!(detailed.lines.len() > 1);
        assert!(detailed.lines.iter().any(|l| l.color == ConstraintColors::OBSTACLE));
        Ok(())
    }
}
