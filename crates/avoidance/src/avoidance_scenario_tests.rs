//! End-to-end scenarios for the collision avoidance system
//!
//! These tests drive complete ticks and verify that:
//! - Unobstructed agents keep their desired velocity
//! - Head-on agents split the avoidance effort evenly
//! - Overlapping agents are pushed apart
//! - The fallback sequence shrinks monotonically and terminates

#[cfg(test)]
mod tests {
    use crate::{
        ActorHandle, ActorWorld, AgentParams, AvoidanceConfig, CollisionAvoidanceSystem,
        ConstraintGenerator, ConstraintKind, Error, MAX_REGISTERED_ACTORS, NavigationBinding,
        NoClamp, ObstacleParams, Result, SolveOutcome, Treatment, VelocityClamp,
        find_nearby_agents, find_nearby_obstacles,
    };
    use glam::{Vec2, Vec3};
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct ScenarioWorld {
        actors: BTreeMap<ActorHandle, Treatment>,
        applied: BTreeMap<ActorHandle, Vec2>,
    }

    impl ScenarioWorld {
        fn add_agent(&mut self, id: u64, position: Vec2, velocity: Vec2, max_speed: f32) -> ActorHandle {
            let handle = ActorHandle::new(id);
            self.actors.insert(
                handle,
                Treatment::Agent(AgentParams {
                    position: Vec3::new(position.x, 0.0, position.y),
                    current_velocity: Vec3::new(velocity.x, 0.0, velocity.y),
                    desired_velocity: Vec3::new(velocity.x, 0.0, velocity.y),
                    radius: 0.5,
                    height: 2.0,
                    max_speed,
                    navigation: NavigationBinding::default(),
                }),
            );
            handle
        }

        fn add_obstacle(&mut self, id: u64, position: Vec2, radius: f32) -> ActorHandle {
            let handle = ActorHandle::new(id);
            self.actors.insert(
                handle,
                Treatment::Obstacle(ObstacleParams {
                    position: Vec3::new(position.x, 0.0, position.y),
                    radius,
                    height: 2.0,
                }),
            );
            handle
        }

        fn system(&self) -> Result<CollisionAvoidanceSystem> {
            let mut system = CollisionAvoidanceSystem::new();
            for &handle in self.actors.keys() {
                system.register(handle)?;
            }
            Ok(system)
        }

        fn applied(&self, handle: ActorHandle) -> Vec2 {
            self.applied.get(&handle).copied().unwrap_or(Vec2::NAN)
        }
    }

    impl ActorWorld for ScenarioWorld {
        fn treatment(&self, handle: ActorHandle) -> Option<Treatment> {
            self.actors.get(&handle).cloned()
        }

        fn apply_computed_velocity(&mut self, handle: ActorHandle, velocity: Vec2, _dt: f32) {
            self.applied.insert(handle, velocity);
        }
    }

    /// Rejects every candidate
    struct BlockEverything;

    impl VelocityClamp for BlockEverything {
        fn clamp_velocity(
            &self,
            _binding: &NavigationBinding,
            _position: Vec3,
            _current_velocity: Vec2,
            _candidate: Vec2,
            _time_step: f32,
        ) -> Vec2 {
            Vec2::ZERO
        }
    }

    /// Only lets through candidates close to one velocity
    struct OnlyNear(Vec2);

    impl VelocityClamp for OnlyNear {
        fn clamp_velocity(
            &self,
            _binding: &NavigationBinding,
            _position: Vec3,
            _current_velocity: Vec2,
            candidate: Vec2,
            _time_step: f32,
        ) -> Vec2 {
            if candidate.distance(self.0) <= 0.05 {
                candidate
            } else {
                Vec2::ZERO
            }
        }
    }

    #[test]
    fn test_single_agent_keeps_desired_velocity() -> Result<()> {
        let mut world = ScenarioWorld::default();
        let agent = world.add_agent(1, Vec2::ZERO, Vec2::new(1.5, 0.5), 2.0);

        let mut system = world.system()?;
        system.update(&mut world, &AvoidanceConfig::default(), &NoClamp, 0.1)?;

        assert_eq!(world.applied(agent), Vec2::new(1.5, 0.5));
        assert!(system
            .solve_record(agent)
            .is_some_and(|r| r.outcome == SolveOutcome::Primary && r.agent_constraints == 0));
        Ok(())
    }

    #[test]
    fn test_head_on_agents_deflect_symmetrically() -> Result<()> {
        let mut world = ScenarioWorld::default();
        let a = world.add_agent(1, Vec2::new(-1.5, 0.0), Vec2::new(1.0, 0.0), 2.0);
        let b = world.add_agent(2, Vec2::new(1.5, 0.0), Vec2::new(-1.0, 0.0), 2.0);

        let mut system = world.system()?;
        let stats = system.update(&mut world, &AvoidanceConfig::default(), &NoClamp, 0.1)?;
        assert_eq!(stats.primary, 2);

        let va = world.applied(a);
        let vb = world.applied(b);

        // Each turns to its own right, by the same amount
        assert!(va.y < -0.1);
        assert!(vb.y > 0.1);
        assert!((va + vb).length() < 1.0e-3);
        assert!((va.y.abs() - vb.y.abs()).abs() < 1.0e-3);
        assert!(va.x > 0.0 && vb.x < 0.0);
        Ok(())
    }

    #[test]
    fn test_overlapping_obstacle_pushes_agent_back() -> Result<()> {
        let mut world = ScenarioWorld::default();
        let agent = world.add_agent(1, Vec2::ZERO, Vec2::new(1.0, 0.0), 2.0);
        world.add_obstacle(2, Vec2::new(0.8, 0.0), 0.5);

        let mut system = world.system()?;
        system.update(&mut world, &AvoidanceConfig::default(), &NoClamp, 0.1)?;

        // Overlap of 0.2 resolved within the shortest obstacle horizon keeps
        // the agent at x <= -0.2 / (1.5 * 0.25); it backs off at full speed
        let v = world.applied(agent);
        let separation = 0.2 / (1.5 * 0.25);
        assert!(v.x < 0.0);
        assert!(v.x <= -separation + 1.0e-3);
        assert!((v.length() - 2.0).abs() < 1.0e-3);
        assert_eq!(
            system.solve_record(agent).map(|r| r.outcome),
            Some(SolveOutcome::Primary)
        );
        Ok(())
    }

    #[test]
    fn test_desired_speed_above_limit_is_capped() -> Result<()> {
        let mut world = ScenarioWorld::default();
        let agent = world.add_agent(1, Vec2::ZERO, Vec2::new(10.0, 0.0), 5.0);

        let mut system = world.system()?;
        system.update(&mut world, &AvoidanceConfig::default(), &NoClamp, 0.1)?;

        let v = world.applied(agent);
        assert!(v.length() <= 5.0 + 1.0e-4);
        assert!((v - Vec2::new(5.0, 0.0)).length() < 1.0e-4);
        Ok(())
    }

    #[test]
    fn test_consider_count_caps_agent_constraints() -> Result<()> {
        let mut world = ScenarioWorld::default();
        world.add_agent(1, Vec2::ZERO, Vec2::new(1.0, 0.0), 2.0);
        for k in 1..=9u64 {
            let angle = k as f32 * 40.0_f32.to_radians();
            let distance = 1.5 + 0.5 * k as f32;
            let position = Vec2::new(angle.cos(), angle.sin()) * distance;
            world.add_agent(1 + k, position, Vec2::ZERO, 2.0);
        }

        let mut system = world.system()?;
        system.begin_tick(&world)?;

        let config = AvoidanceConfig::default();
        let snapshot = system.snapshot();
        let subject = &snapshot.agents[0];

        let mut nearby_obstacles = Vec::new();
        let mut nearby_agents = Vec::new();
        find_nearby_obstacles(subject, &snapshot.obstacles, config.scan_range, &mut nearby_obstacles);
        find_nearby_agents(0, &snapshot.agents, config.scan_range, &mut nearby_agents);
        assert_eq!(nearby_agents.len(), 9);

        let mut lines = Vec::new();
        let obstacle_count = ConstraintGenerator::new(&snapshot.agents, &snapshot.obstacles, &config)
            .generate(
                subject,
                &nearby_obstacles,
                &nearby_agents,
                config.consider_count,
                1.0,
                &mut lines,
            );

        assert_eq!(obstacle_count, 0);
        assert_eq!(lines.len(), 8);
        assert!(lines.iter().all(|l| l.kind == ConstraintKind::Agent));

        // The furthest agent, index 9, is left out
        assert!(lines.iter().all(|l| l.object_index != 9));

        // Standing neighbors leave the way ahead open, so the first pass
        // succeeds with the capped constraint set
        system.solve_tick(&config, &NoClamp)?;
        let record = system.records()[0].clone();
        assert_eq!(record.outcome, SolveOutcome::Primary);
        assert_eq!(record.agent_constraints, 8);
        assert_eq!(record.obstacle_constraints, 0);
        assert!((record.velocity - Vec2::new(1.0, 0.0)).length() < 1.0e-5);
        Ok(())
    }

    #[test]
    fn test_fallback_terminates_on_desired_velocity() -> Result<()> {
        let mut world = ScenarioWorld::default();
        let subject = world.add_agent(1, Vec2::ZERO, Vec2::new(1.0, 0.0), 2.0);
        world.add_agent(2, Vec2::new(0.0, 3.0), Vec2::new(0.0, -1.0), 2.0);
        world.add_agent(3, Vec2::new(-4.0, 0.0), Vec2::new(1.0, 0.0), 2.0);
        world.add_agent(4, Vec2::new(0.0, -5.0), Vec2::new(0.0, 1.0), 2.0);

        let config = AvoidanceConfig::default().with_navmesh_clamp(true);
        let mut system = world.system()?;
        let stats = system.update(&mut world, &config, &BlockEverything, 0.1)?;
        assert_eq!(stats.exhausted, 4);

        let Some(record) = system.solve_record(subject) else {
            panic!("subject was not solved");
        };
        assert_eq!(record.outcome, SolveOutcome::Exhausted);
        // One attempt per considered agent plus the one without any
        assert_eq!(record.iterations, 3 + 1);
        assert_eq!(record.agent_constraints, 0);
        assert_eq!(world.applied(subject), Vec2::new(1.0, 0.0));

        for record in system.records() {
            assert!(record.iterations <= config.consider_count + 1);
            assert_eq!(record.velocity, record.desired_velocity);
        }
        Ok(())
    }

    #[test]
    fn test_fallback_stops_at_overlapping_neighbor() -> Result<()> {
        let mut world = ScenarioWorld::default();
        let subject = world.add_agent(1, Vec2::ZERO, Vec2::new(1.0, 0.0), 2.0);
        world.add_agent(2, Vec2::new(1.2, 0.0), Vec2::new(-1.0, 0.0), 2.0);

        let config = AvoidanceConfig::default().with_navmesh_clamp(true);
        let mut system = world.system()?;
        system.update(&mut world, &config, &BlockEverything, 0.1)?;

        // The only neighbor is too close to be dropped
        let record = system.solve_record(subject).cloned();
        assert!(record.is_some_and(|r| r.iterations == 1 && r.agent_constraints == 1));
        Ok(())
    }

    #[test]
    fn test_degraded_pass_drops_furthest_agent() -> Result<()> {
        let mut world = ScenarioWorld::default();
        let desired = Vec2::new(1.0, 0.0);
        let subject = world.add_agent(1, Vec2::ZERO, desired, 2.0);
        // Standing next to the path without blocking it
        world.add_agent(2, Vec2::new(0.0, -1.8), Vec2::ZERO, 2.0);
        // Rushing straight at the subject
        world.add_agent(3, Vec2::new(2.0, 0.0), Vec2::new(-3.0, 0.0), 4.0);

        let config = AvoidanceConfig::default().with_navmesh_clamp(true);
        let mut system = world.system()?;
        system.update(&mut world, &config, &OnlyNear(desired), 0.1)?;

        let record = system.solve_record(subject).cloned();
        assert!(record.is_some_and(|r| {
            r.outcome == SolveOutcome::Degraded { dropped: 1 }
                && r.iterations == 2
                && r.agent_constraints == 1
        }));
        assert_eq!(world.applied(subject), desired);
        Ok(())
    }

    #[test]
    fn test_chosen_speed_stays_within_limit() -> Result<()> {
        let mut world = ScenarioWorld::default();
        let count = 12;
        for k in 0..count {
            let angle = k as f32 / count as f32 * std::f32::consts::TAU;
            let position = Vec2::new(angle.cos(), angle.sin()) * 4.0;
            world.add_agent(k as u64 + 1, position, -position.normalize() * 1.5, 1.5);
        }

        let mut system = world.system()?;
        system.update(&mut world, &AvoidanceConfig::default(), &NoClamp, 0.1)?;

        for record in system.records() {
            if matches!(
                record.outcome,
                SolveOutcome::Primary | SolveOutcome::Degraded { .. }
            ) {
                assert!(record.velocity.length() <= 1.5 + 1.0e-3);
            }
        }
        Ok(())
    }

    #[test]
    fn test_agents_on_different_floors_ignore_each_other() -> Result<()> {
        let mut world = ScenarioWorld::default();
        let a = world.add_agent(1, Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0), 2.0);
        let b = ActorHandle::new(2);
        world.actors.insert(
            b,
            Treatment::Agent(AgentParams {
                position: Vec3::new(1.0, 4.0, 0.0),
                current_velocity: Vec3::new(-1.0, 0.0, 0.0),
                desired_velocity: Vec3::new(-1.0, 0.0, 0.0),
                radius: 0.5,
                height: 2.0,
                max_speed: 2.0,
                navigation: NavigationBinding::default(),
            }),
        );

        let mut system = world.system()?;
        system.update(&mut world, &AvoidanceConfig::default(), &NoClamp, 0.1)?;

        assert_eq!(world.applied(a), Vec2::new(1.0, 0.0));
        assert_eq!(world.applied(b), Vec2::new(-1.0, 0.0));
        Ok(())
    }

    #[test]
    fn test_registration_limit_and_tick_lock() -> Result<()> {
        let mut system = CollisionAvoidanceSystem::new();
        for id in 1..=MAX_REGISTERED_ACTORS as u64 {
            system.register(ActorHandle::new(id))?;
        }

        for id in 100..103 {
            assert_eq!(
                system.register(ActorHandle::new(id)),
                Err(Error::CapacityExceeded {
                    capacity: MAX_REGISTERED_ACTORS
                })
            );
        }

        system.unregister(ActorHandle::new(1))?;
        let world = ScenarioWorld::default();
        system.begin_tick(&world)?;
        assert_eq!(
            system.register(ActorHandle::new(100)),
            Err(Error::UpdateInProgress)
        );
        Ok(())
    }
}
