//! JSON scenario files and the world they describe

use anyhow::{Context, Result, bail};
use avoidance::{
    ActorHandle, ActorWorld, AgentParams, AvoidanceConfig, NavigationBinding, ObstacleParams,
    Treatment, WallSegment, WallSegments,
};
use avoidance_common::planar;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Distance under which an agent counts as arrived
const ARRIVAL_DISTANCE: f32 = 0.05;

fn default_radius() -> f32 {
    0.4
}

fn default_height() -> f32 {
    2.0
}

fn default_max_speed() -> f32 {
    4.0
}

/// An agent walking towards a goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioAgent {
    pub name: String,
    pub position: [f32; 3],
    pub goal: [f32; 3],
    #[serde(default = "default_radius")]
    pub radius: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
}

/// A static obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioObstacle {
    pub name: String,
    pub position: [f32; 3],
    #[serde(default = "default_radius")]
    pub radius: f32,
    #[serde(default = "default_height")]
    pub height: f32,
}

/// Contents of a scenario file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: AvoidanceConfig,
    #[serde(default)]
    pub agents: Vec<ScenarioAgent>,
    #[serde(default)]
    pub obstacles: Vec<ScenarioObstacle>,
    /// Wall segments as `[[x, z], [x, z]]`
    #[serde(default)]
    pub walls: Vec<[[f32; 2]; 2]>,
    /// Walkable rectangle as `[[min_x, min_z], [max_x, max_z]]`
    #[serde(default)]
    pub bounds: Option<[[f32; 2]; 2]>,
}

impl Scenario {
    /// Loads and checks a scenario file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
        let scenario: Scenario = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse scenario file: {}", path.display()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        self.config.validate().context("Invalid avoidance configuration")?;

        for agent in &self.agents {
            if agent.radius <= 0.0 || agent.height <= 0.0 || agent.max_speed <= 0.0 {
                bail!("Agent '{}' needs a positive radius, height and max speed", agent.name);
            }
        }
        for obstacle in &self.obstacles {
            if obstacle.radius <= 0.0 || obstacle.height <= 0.0 {
                bail!("Obstacle '{}' needs a positive radius and height", obstacle.name);
            }
        }
        Ok(())
    }

    /// Small example with two agents swapping places around a pillar
    pub fn example() -> Self {
        Self {
            config: AvoidanceConfig::default(),
            agents: vec![
                ScenarioAgent {
                    name: "left".to_string(),
                    position: [-5.0, 0.0, 0.0],
                    goal: [5.0, 0.0, 0.0],
                    radius: default_radius(),
                    height: default_height(),
                    max_speed: 2.0,
                },
                ScenarioAgent {
                    name: "right".to_string(),
                    position: [5.0, 0.0, 0.2],
                    goal: [-5.0, 0.0, 0.2],
                    radius: default_radius(),
                    height: default_height(),
                    max_speed: 2.0,
                },
            ],
            obstacles: vec![ScenarioObstacle {
                name: "pillar".to_string(),
                position: [0.0, 0.0, 2.0],
                radius: 0.8,
                height: 3.0,
            }],
            walls: vec![[[-8.0, 3.5], [8.0, 3.5]]],
            bounds: Some([[-10.0, -10.0], [10.0, 10.0]]),
        }
    }

    /// Walls and bounds for the navmesh clamp
    pub fn wall_segments(&self) -> WallSegments {
        let mut walls = match self.bounds {
            Some([min, max]) => WallSegments::new().with_bounds(Vec2::from(min), Vec2::from(max)),
            None => WallSegments::new(),
        };
        for [start, end] in &self.walls {
            walls.add_wall(WallSegment::new(Vec2::from(*start), Vec2::from(*end)));
        }
        walls
    }
}

#[derive(Debug, Clone)]
enum Body {
    Agent {
        goal: Vec3,
        radius: f32,
        height: f32,
        max_speed: f32,
        velocity: Vec2,
    },
    Obstacle {
        radius: f32,
        height: f32,
    },
}

#[derive(Debug, Clone)]
struct Actor {
    name: String,
    position: Vec3,
    body: Body,
}

/// Actors of a scenario; handle `n` refers to the actor at index `n - 1`
#[derive(Debug, Clone)]
pub struct ScenarioWorld {
    actors: Vec<Actor>,
    time_step: f32,
}

impl ScenarioWorld {
    /// Builds the world described by `scenario`
    pub fn new(scenario: &Scenario) -> Self {
        let agents = scenario.agents.iter().map(|a| Actor {
            name: a.name.clone(),
            position: Vec3::from(a.position),
            body: Body::Agent {
                goal: Vec3::from(a.goal),
                radius: a.radius,
                height: a.height,
                max_speed: a.max_speed,
                velocity: Vec2::ZERO,
            },
        });
        let obstacles = scenario.obstacles.iter().map(|o| Actor {
            name: o.name.clone(),
            position: Vec3::from(o.position),
            body: Body::Obstacle {
                radius: o.radius,
                height: o.height,
            },
        });

        Self {
            actors: agents.chain(obstacles).collect(),
            time_step: scenario.config.time_step,
        }
    }

    /// Handles of every actor
    pub fn handles(&self) -> impl Iterator<Item = ActorHandle> + '_ {
        (1..=self.actors.len() as u64).map(ActorHandle::new)
    }

    fn actor(&self, handle: ActorHandle) -> Option<&Actor> {
        let index = usize::try_from(handle.id()).ok()?.checked_sub(1)?;
        self.actors.get(index)
    }

    fn actor_mut(&mut self, handle: ActorHandle) -> Option<&mut Actor> {
        let index = usize::try_from(handle.id()).ok()?.checked_sub(1)?;
        self.actors.get_mut(index)
    }

    /// Name and position of `handle`
    pub fn describe(&self, handle: ActorHandle) -> Option<(&str, Vec3)> {
        self.actor(handle).map(|a| (a.name.as_str(), a.position))
    }

    /// Checks whether every agent reached its goal
    pub fn all_arrived(&self) -> bool {
        self.actors.iter().all(|actor| match &actor.body {
            Body::Agent { goal, .. } => {
                planar(*goal - actor.position).length() <= ARRIVAL_DISTANCE
            }
            Body::Obstacle { .. } => true,
        })
    }

    /// Velocity that heads straight for the goal without overshooting it
    fn desired_velocity(position: Vec3, goal: Vec3, max_speed: f32, time_step: f32) -> Vec2 {
        let to_goal = planar(goal - position);
        let distance = to_goal.length();
        if distance <= ARRIVAL_DISTANCE {
            return Vec2::ZERO;
        }
        let speed = max_speed.min(distance / time_step);
        to_goal / distance * speed
    }
}

impl ActorWorld for ScenarioWorld {
    fn treatment(&self, handle: ActorHandle) -> Option<Treatment> {
        let actor = self.actor(handle)?;
        let treatment = match &actor.body {
            Body::Agent {
                goal,
                radius,
                height,
                max_speed,
                velocity,
            } => {
                let desired =
                    Self::desired_velocity(actor.position, *goal, *max_speed, self.time_step);
                Treatment::Agent(AgentParams {
                    position: actor.position,
                    current_velocity: Vec3::new(velocity.x, 0.0, velocity.y),
                    desired_velocity: Vec3::new(desired.x, 0.0, desired.y),
                    radius: *radius,
                    height: *height,
                    max_speed: *max_speed,
                    navigation: NavigationBinding::default(),
                })
            }
            Body::Obstacle { radius, height } => Treatment::Obstacle(ObstacleParams {
                position: actor.position,
                radius: *radius,
                height: *height,
            }),
        };
        Some(treatment)
    }

    fn apply_computed_velocity(&mut self, handle: ActorHandle, velocity: Vec2, dt: f32) {
        let Some(actor) = self.actor_mut(handle) else {
            log::warn!("Velocity for unknown actor {}", handle.id());
            return;
        };
        if let Body::Agent { velocity: current, .. } = &mut actor.body {
            *current = velocity;
            actor.position.x += velocity.x * dt;
            actor.position.z += velocity.y * dt;
        }
    }

    fn debug_name(&self, handle: ActorHandle) -> String {
        self.actor(handle)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| format!("actor#{}", handle.id()))
    }
}
