//! Per-tick collision avoidance orchestration
//!
//! A tick runs in three steps. [`CollisionAvoidanceSystem::begin_tick`] locks
//! the registry and snapshots every registered actor,
//! [`CollisionAvoidanceSystem::solve_tick`] computes one velocity per agent,
//! and [`CollisionAvoidanceSystem::finish_tick`] hands the velocities back and
//! unlocks the registry. [`CollisionAvoidanceSystem::update`] runs all three.
//!
//! Each agent goes through a fixed fallback sequence: a primary solve with
//! full time horizons, then a degraded solve with shortened horizons that
//! drops the furthest considered agents one by one, and finally its desired
//! velocity unchanged when nothing else works.

use avoidance_common::{Error, Result, sqr};
use glam::Vec2;
use std::time::Duration;
use web_time::Instant;

use crate::actor::{ActorHandle, ActorWorld};
use crate::candidates::{Candidate, compute_candidates, find_first_walkable_velocity};
use crate::clamp::VelocityClamp;
use crate::config::{AvoidanceConfig, PRIMARY_TIME_HORIZON_SCALE};
use crate::constraints::{ConstraintGenerator, ConstraintLine};
use crate::feasible_area::FeasibleArea;
use crate::neighbors::{NearbyAgent, NearbyObstacle, find_nearby_agents, find_nearby_obstacles};
use crate::registry::ActorRegistry;
use crate::snapshot::{Agent, TickSnapshot};

/// How an agent's velocity was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    /// Found with full time horizons and all considered agents
    Primary,
    /// Found with shortened horizons after dropping the furthest agents
    Degraded {
        /// Number of agent constraints dropped
        dropped: usize,
    },
    /// Nothing acceptable was found; the desired velocity is used
    Exhausted,
    /// Avoidance is switched off; the desired velocity is used
    Disabled,
}

/// Result of solving one agent during the last tick
#[derive(Debug, Clone, PartialEq)]
pub struct SolveRecord {
    /// Handle of the agent
    pub handle: ActorHandle,
    /// Velocity the agent asked for
    pub desired_velocity: Vec2,
    /// Velocity handed back to the agent
    pub velocity: Vec2,
    /// How `velocity` was obtained
    pub outcome: SolveOutcome,
    /// Iterations of the degraded retry loop (zero if it did not run)
    pub iterations: usize,
    /// Obstacle constraints in the final attempt
    pub obstacle_constraints: usize,
    /// Agent constraints in the final attempt
    pub agent_constraints: usize,
}

/// Summary of the last tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickStats {
    /// Agents solved
    pub agents: usize,
    /// Obstacles avoided
    pub obstacles: usize,
    /// Agents solved by the primary pass
    pub primary: usize,
    /// Agents solved by the degraded retry loop
    pub degraded: usize,
    /// Agents left with their desired velocity
    pub exhausted: usize,
    /// Agents skipped because avoidance is off
    pub disabled: usize,
    /// Wall time spent in [`CollisionAvoidanceSystem::solve_tick`]
    pub solve_time: Duration,
}

impl TickStats {
    fn count(&mut self, outcome: SolveOutcome) {
        match outcome {
            SolveOutcome::Primary => self.primary += 1,
            SolveOutcome::Degraded { .. } => self.degraded += 1,
            SolveOutcome::Exhausted => self.exhausted += 1,
            SolveOutcome::Disabled => self.disabled += 1,
        }
    }
}

/// Scratch buffers reused by every agent solve
#[derive(Debug, Default)]
struct SolverBuffers {
    nearby_obstacles: Vec<NearbyObstacle>,
    nearby_agents: Vec<NearbyAgent>,
    lines: Vec<ConstraintLine>,
    candidates: Vec<Candidate>,
    feasible: FeasibleArea,
}

impl SolverBuffers {
    /// Best walkable velocity under the first `line_count` constraint lines
    fn find_velocity<C: VelocityClamp + ?Sized>(
        &mut self,
        line_count: usize,
        agent: &Agent,
        clamp: &C,
        config: &AvoidanceConfig,
    ) -> Option<Vec2> {
        // An overflowing region is logged by the builder and treated as empty
        self.feasible
            .build(&self.lines[..line_count], agent.max_speed)
            .ok()?;

        compute_candidates(
            self.feasible.vertices(),
            agent.desired_velocity,
            agent.max_speed,
            config.min_speed,
            &mut self.candidates,
        );

        find_first_walkable_velocity(&self.candidates, agent, clamp, config)
    }

    fn clear(&mut self) {
        self.nearby_obstacles.clear();
        self.nearby_agents.clear();
        self.lines.clear();
        self.candidates.clear();
        self.feasible.clear();
    }

    fn release(&mut self) {
        *self = Self::default();
    }
}

struct AgentSolution {
    velocity: Vec2,
    outcome: SolveOutcome,
    iterations: usize,
    obstacle_constraints: usize,
    agent_constraints: usize,
}

/// Runs the fallback sequence for one agent
fn solve_agent<C: VelocityClamp + ?Sized>(
    agent: &Agent,
    snapshot: &TickSnapshot,
    config: &AvoidanceConfig,
    clamp: &C,
    buffers: &mut SolverBuffers,
) -> AgentSolution {
    find_nearby_obstacles(
        agent,
        &snapshot.obstacles,
        config.scan_range,
        &mut buffers.nearby_obstacles,
    );
    find_nearby_agents(
        agent.index,
        &snapshot.agents,
        config.scan_range,
        &mut buffers.nearby_agents,
    );

    let generator = ConstraintGenerator::new(&snapshot.agents, &snapshot.obstacles, config);
    let consider = config.consider_count.min(buffers.nearby_agents.len());

    let obstacle_count = generator.generate(
        agent,
        &buffers.nearby_obstacles,
        &buffers.nearby_agents,
        consider,
        PRIMARY_TIME_HORIZON_SCALE,
        &mut buffers.lines,
    );

    if let Some(velocity) = buffers.find_velocity(obstacle_count + consider, agent, clamp, config) {
        return AgentSolution {
            velocity,
            outcome: SolveOutcome::Primary,
            iterations: 0,
            obstacle_constraints: obstacle_count,
            agent_constraints: consider,
        };
    }

    log::trace!(
        "Agent {}: primary solve failed with {} obstacle and {} agent constraints",
        agent.index,
        obstacle_count,
        consider
    );

    let obstacle_count = generator.generate(
        agent,
        &buffers.nearby_obstacles,
        &buffers.nearby_agents,
        consider,
        config.degraded_time_horizon_scale,
        &mut buffers.lines,
    );

    let mut considered = consider;
    let mut iterations = 0;

    loop {
        iterations += 1;

        if let Some(velocity) =
            buffers.find_velocity(obstacle_count + considered, agent, clamp, config)
        {
            return AgentSolution {
                velocity,
                outcome: SolveOutcome::Degraded {
                    dropped: consider - considered,
                },
                iterations,
                obstacle_constraints: obstacle_count,
                agent_constraints: considered,
            };
        }

        if considered == 0 {
            break;
        }

        // Agent lines follow the nearby order, so the last one is the furthest
        let furthest = buffers.nearby_agents[considered - 1];
        let other = &snapshot.agents[furthest.agent_index];
        if furthest.distance_sq < sqr(2.0 * agent.radius + other.radius) {
            log::trace!(
                "Agent {}: furthest considered agent {} is too close to drop",
                agent.index,
                furthest.agent_index
            );
            break;
        }

        considered -= 1;
        log::trace!(
            "Agent {}: dropping agent {}, {} left",
            agent.index,
            furthest.agent_index,
            considered
        );
    }

    log::trace!(
        "Agent {}: no walkable velocity after {} retries, keeping desired velocity",
        agent.index,
        iterations
    );

    AgentSolution {
        velocity: agent.desired_velocity,
        outcome: SolveOutcome::Exhausted,
        iterations,
        obstacle_constraints: obstacle_count,
        agent_constraints: considered,
    }
}

/// Collision avoidance for a bounded set of registered actors
#[derive(Debug, Default)]
pub struct CollisionAvoidanceSystem {
    registry: ActorRegistry,
    snapshot: TickSnapshot,
    /// Output velocity per tick agent
    velocities: Vec<Vec2>,
    records: Vec<SolveRecord>,
    buffers: SolverBuffers,
    stats: TickStats,
}

impl CollisionAvoidanceSystem {
    /// Creates a system with the default registry capacity
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a system whose registry holds at most `capacity` actors
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: ActorRegistry::with_capacity(capacity),
            ..Default::default()
        }
    }

    /// Registers an actor
    pub fn register(&mut self, handle: ActorHandle) -> Result<()> {
        self.registry.register(handle)
    }

    /// Unregisters an actor; returns `false` if it was not registered
    pub fn unregister(&mut self, handle: ActorHandle) -> Result<bool> {
        self.registry.unregister(handle)
    }

    /// Number of registered actors
    pub fn registered_count(&self) -> usize {
        self.registry.len()
    }

    /// Checks whether `handle` is registered
    pub fn is_registered(&self, handle: ActorHandle) -> bool {
        self.registry.contains(handle)
    }

    /// Maximum number of registered actors
    pub fn capacity(&self) -> usize {
        self.registry.capacity()
    }

    /// Checks whether a tick is in progress
    pub fn is_updating(&self) -> bool {
        self.registry.is_updating()
    }

    /// Registered actors in registration order
    pub fn handles(&self) -> &[ActorHandle] {
        self.registry.handles()
    }

    /// Starts a tick: locks the registry and snapshots every actor.
    ///
    /// Until the tick is solved every agent's output is its desired velocity.
    pub fn begin_tick<W: ActorWorld + ?Sized>(&mut self, world: &W) -> Result<()> {
        if self.registry.is_updating() {
            log::warn!("Tick started while another tick is in progress");
            return Err(Error::UpdateInProgress);
        }

        self.registry.set_updating(true);
        self.snapshot
            .build(self.registry.handles(), world, self.registry.capacity());

        self.velocities.clear();
        self.velocities
            .extend(self.snapshot.agents.iter().map(|a| a.desired_velocity));
        self.records.clear();

        self.stats = TickStats {
            agents: self.snapshot.agents.len(),
            obstacles: self.snapshot.obstacles.len(),
            ..Default::default()
        };

        Ok(())
    }

    /// Computes the velocity of every agent of the current tick
    pub fn solve_tick<C: VelocityClamp + ?Sized>(
        &mut self,
        config: &AvoidanceConfig,
        clamp: &C,
    ) -> Result<()> {
        if !self.registry.is_updating() {
            return Err(Error::TickNotStarted);
        }
        config.validate()?;

        let start = Instant::now();
        self.records.clear();
        self.stats.primary = 0;
        self.stats.degraded = 0;
        self.stats.exhausted = 0;
        self.stats.disabled = 0;

        for (agent, &handle) in self.snapshot.agents.iter().zip(&self.snapshot.agent_handles) {
            let solution = if config.enabled {
                solve_agent(agent, &self.snapshot, config, clamp, &mut self.buffers)
            } else {
                AgentSolution {
                    velocity: agent.desired_velocity,
                    outcome: SolveOutcome::Disabled,
                    iterations: 0,
                    obstacle_constraints: 0,
                    agent_constraints: 0,
                }
            };

            self.velocities[agent.index] = solution.velocity;
            self.stats.count(solution.outcome);
            self.records.push(SolveRecord {
                handle,
                desired_velocity: agent.desired_velocity,
                velocity: solution.velocity,
                outcome: solution.outcome,
                iterations: solution.iterations,
                obstacle_constraints: solution.obstacle_constraints,
                agent_constraints: solution.agent_constraints,
            });
        }

        self.stats.solve_time = start.elapsed();

        log::debug!(
            "Solved {} agents against {} obstacles in {:?}: {} primary, {} degraded, {} exhausted, {} disabled",
            self.stats.agents,
            self.stats.obstacles,
            self.stats.solve_time,
            self.stats.primary,
            self.stats.degraded,
            self.stats.exhausted,
            self.stats.disabled
        );

        Ok(())
    }

    /// Hands every agent its velocity and unlocks the registry
    pub fn finish_tick<W: ActorWorld + ?Sized>(&mut self, world: &mut W, dt: f32) -> Result<()> {
        if !self.registry.is_updating() {
            return Err(Error::TickNotStarted);
        }

        for (&handle, &velocity) in self.snapshot.agent_handles.iter().zip(&self.velocities) {
            world.apply_computed_velocity(handle, velocity, dt);
        }

        self.registry.set_updating(false);
        Ok(())
    }

    /// Runs a complete tick
    pub fn update<W: ActorWorld + ?Sized, C: VelocityClamp + ?Sized>(
        &mut self,
        world: &mut W,
        config: &AvoidanceConfig,
        clamp: &C,
        dt: f32,
    ) -> Result<&TickStats> {
        config.validate()?;
        self.begin_tick(world)?;

        if let Err(e) = self.solve_tick(config, clamp) {
            self.registry.set_updating(false);
            return Err(e);
        }

        self.finish_tick(world, dt)?;
        Ok(&self.stats)
    }

    /// Drops all tick state, keeping the registered actors.
    ///
    /// With `unload` the scratch memory is released as well.
    pub fn reset(&mut self, unload: bool) {
        if self.registry.is_updating() {
            log::warn!("Reset during a tick; the tick is abandoned");
            self.registry.set_updating(false);
        }

        if unload {
            self.snapshot.release();
            self.velocities = Vec::new();
            self.records = Vec::new();
            self.buffers.release();
        } else {
            self.snapshot.clear();
            self.velocities.clear();
            self.records.clear();
            self.buffers.clear();
        }

        self.stats = TickStats::default();
    }

    /// Velocity computed for `handle` in the last tick
    pub fn avoidance_velocity(&self, handle: ActorHandle) -> Option<Vec2> {
        self.snapshot
            .agent_index(handle)
            .and_then(|index| self.velocities.get(index).copied())
    }

    /// Solve record of `handle` in the last tick
    pub fn solve_record(&self, handle: ActorHandle) -> Option<&SolveRecord> {
        self.records.iter().find(|r| r.handle == handle)
    }

    /// Solve records of the last tick, in agent order
    pub fn records(&self) -> &[SolveRecord] {
        &self.records
    }

    /// Summary of the last tick
    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Agents and obstacles of the last tick
    pub fn snapshot(&self) -> &TickSnapshot {
        &self.snapshot
    }

    /// Output velocities of the last tick, parallel to the snapshot agents
    pub fn velocities(&self) -> &[Vec2] {
        &self.velocities
    }
}
