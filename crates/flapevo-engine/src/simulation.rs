use std::time::Duration;

use flapevo_network::NeuralNetwork;
use rand::Rng;

use crate::{Agent, DeathCause, Obstacle, ObstacleField, SimulationError, WorldConfig};

/// Network output at or above which an agent flaps.
pub const FLAP_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum StepOutcome {
    /// At least one agent is still alive.
    Running,
    /// Every agent is dead; the state will not advance until it is respawned.
    Extinct,
}

/// World state of one generation: the population, the obstacle field and the
/// per-generation counters.
///
/// Rendering layers only need the read accessors ([`Self::agents`],
/// [`Self::obstacles`], [`Self::score`], [`Self::elapsed`]); the only external
/// mutation besides [`Self::step`] is [`Self::flap_override`].
#[derive(Debug, Clone)]
pub struct SimulationState {
    config: WorldConfig,
    agents: Vec<Agent>,
    field: ObstacleField,
    score: usize,
    ticks: u64,
    dead: usize,
    extinct: bool,
    last_override: Option<u64>,
}

impl SimulationState {
    /// Spawns one agent per network and lays out the obstacle field.
    pub fn new<R>(config: WorldConfig, networks: Vec<NeuralNetwork>, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let agents = networks
            .into_iter()
            .map(|network| Agent::spawn(network, &config.spawn))
            .collect();
        let field = ObstacleField::new(&config.obstacles, &config.physics, rng);
        Self {
            config,
            agents,
            field,
            score: 0,
            ticks: 0,
            dead: 0,
            extinct: false,
            last_override: None,
        }
    }

    /// Starts a new generation: agent `i` respawns with `networks[i]` and the
    /// obstacle field returns to its canonical layout.
    ///
    /// # Panics
    ///
    /// Panics if the number of networks differs from the population size.
    pub fn respawn<R>(&mut self, networks: Vec<NeuralNetwork>, keep_fitness: bool, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        assert_eq!(networks.len(), self.agents.len());
        for (agent, network) in self.agents.iter_mut().zip(networks) {
            agent.respawn(network, &self.config.spawn, keep_fitness);
        }
        self.field.reset(rng);
        self.score = 0;
        self.ticks = 0;
        self.dead = 0;
        self.extinct = false;
        self.last_override = None;
    }

    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn obstacles(&self) -> impl ExactSizeIterator<Item = &Obstacle> + '_ {
        self.field.iter()
    }

    #[must_use]
    pub fn field(&self) -> &ObstacleField {
        &self.field
    }

    /// Most obstacles passed by a single agent in this generation.
    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    /// Ticks since the generation started.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated time since the generation started, at the configured tick rate.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        const NANOS_PER_SEC: u64 = 1_000_000_000;
        let tps = u64::from(self.config.physics.ticks_per_second.max(1));
        let secs = self.ticks / tps;
        let nanos = (self.ticks % tps) * NANOS_PER_SEC / tps;
        // nanos < NANOS_PER_SEC always fits in u32
        Duration::new(secs, u32::try_from(nanos).unwrap_or(0))
    }

    #[must_use]
    pub fn dead_count(&self) -> usize {
        self.dead
    }

    #[must_use]
    pub fn is_extinct(&self) -> bool {
        self.extinct
    }

    /// Agent with the highest fitness (the first one on ties).
    #[must_use]
    pub fn best_agent(&self) -> Option<&Agent> {
        self.agents.iter().reduce(|best, agent| {
            if agent.fitness() > best.fitness() {
                agent
            } else {
                best
            }
        })
    }

    /// Forces agent `index` to flap, as a human player would.
    ///
    /// Takes effect at most once per tick; returns `false` when it had no
    /// effect (repeated call within the tick, dead or unknown agent,
    /// extinct population).
    pub fn flap_override(&mut self, index: usize) -> bool {
        if self.extinct || self.last_override == Some(self.ticks) {
            return false;
        }
        let flap_velocity = self.config.physics.flap_velocity;
        let Some(agent) = self.agents.get_mut(index).filter(|a| a.is_alive()) else {
            return false;
        };
        agent.flap(flap_velocity);
        self.last_override = Some(self.ticks);
        true
    }

    /// Kills every agent still alive without penalty, ending the generation.
    pub fn cut_off(&mut self) {
        for agent in &mut self.agents {
            agent.kill(DeathCause::Timeout, 0.0);
        }
        self.dead = self.agents.len();
        self.extinct = true;
    }

    /// Advances the world by one tick.
    ///
    /// 1. Every live agent moves, may die at the screen boundary, earns its
    ///    survival and passage rewards, senses and decides whether to flap.
    /// 2. Obstacles scroll and recycle.
    /// 3. Collisions between live agents and obstacles are resolved.
    /// 4. The population is declared extinct once every agent is dead.
    pub fn step<R>(&mut self, rng: &mut R) -> Result<StepOutcome, SimulationError>
    where
        R: Rng + ?Sized,
    {
        if self.extinct {
            return Ok(StepOutcome::Extinct);
        }

        self.update_agents()?;
        self.field.advance(self.config.physics.scroll_speed, rng);
        self.resolve_collisions();
        self.ticks += 1;

        self.dead = self.agents.iter().filter(|a| !a.is_alive()).count();
        if self.dead == self.agents.len() {
            self.extinct = true;
            return Ok(StepOutcome::Extinct);
        }
        Ok(StepOutcome::Running)
    }

    fn update_agents(&mut self) -> Result<(), SimulationError> {
        let Self {
            config,
            agents,
            field,
            score,
            ..
        } = self;
        let physics = &config.physics;
        let rewards = &config.rewards;

        for (index, agent) in agents.iter_mut().enumerate() {
            if !agent.is_alive() {
                continue;
            }

            agent.integrate(physics);
            let cause = if agent.y() <= 0.0 {
                Some(DeathCause::Ceiling)
            } else if agent.y() >= physics.screen_height + physics.floor_margin {
                Some(DeathCause::Floor)
            } else {
                None
            };
            if let Some(cause) = cause {
                agent.kill(cause, rewards.boundary_penalty);
                tracing::debug!(agent = index, %cause, fitness = agent.fitness(), "agent died");
                continue;
            }

            agent.add_fitness(rewards.survival_reward);

            for obstacle in field.iter() {
                if agent.leading_edge() > obstacle.trailing_edge()
                    && agent.credit_passage(obstacle.serial(), rewards.pass_reward)
                {
                    *score = usize::max(*score, agent.obstacles_passed());
                }
            }

            let nearest = field.nearest_ahead(agent.trailing_edge());
            let sensors = config.sensors.sense(agent, nearest, physics);
            let decision = agent
                .network()
                .predict(&sensors)
                .map_err(|source| SimulationError { agent: index, source })?;
            if decision >= FLAP_THRESHOLD {
                agent.flap(physics.flap_velocity);
            }
        }
        Ok(())
    }

    fn resolve_collisions(&mut self) {
        let scale = self.config.rewards.collision_penalty_scale;
        for obstacle in self.field.iter() {
            for (index, agent) in self.agents.iter_mut().enumerate() {
                if !agent.is_alive() || !obstacle.collides_with(agent) {
                    continue;
                }
                let penalty = scale * (agent.y() - obstacle.gap_center()).abs();
                agent.kill(DeathCause::Obstacle, penalty);
                tracing::debug!(agent = index, cause = %DeathCause::Obstacle, fitness = agent.fitness(), "agent died");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn field_mut(&mut self) -> &mut ObstacleField {
        &mut self.field
    }
}

#[cfg(test)]
mod tests {
    use flapevo_network::{Matrix, Topology};
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::SensorSet;

    /// Network whose output is fixed above (`flap`) or below 0.5.
    fn fixed_network(inputs: usize, flap: bool) -> NeuralNetwork {
        let topology = Topology::new(inputs, 2, 1).unwrap();
        let w2 = if flap { 1.0 } else { -1.0 };
        NeuralNetwork::from_weights(
            topology,
            Matrix::from_fn(inputs, 2, |_, _| 0.0),
            Matrix::from_fn(2, 1, |_, _| w2),
        )
        .unwrap()
    }

    fn state(networks: Vec<NeuralNetwork>) -> (SimulationState, Pcg32) {
        let mut rng = Pcg32::seed_from_u64(42);
        let state = SimulationState::new(WorldConfig::default(), networks, &mut rng);
        (state, rng)
    }

    #[test]
    fn test_falling_agent_dies_at_floor() {
        let (mut state, mut rng) = state(vec![fixed_network(5, false)]);

        // y after t ticks: 300 + 0.75 * t(t-1)/2 until v reaches 7.5 at t = 10,
        // then +7.5 per tick; y first reaches 615 at t = 48.
        for tick in 1..48 {
            assert!(state.step(&mut rng).unwrap().is_running(), "tick {tick}");
        }
        assert_eq!(state.agents()[0].y(), 611.25);

        assert!(state.step(&mut rng).unwrap().is_extinct());
        let agent = &state.agents()[0];
        assert_eq!(agent.death_cause(), Some(DeathCause::Floor));
        assert_eq!(agent.fitness(), 47.0 * 0.5 - 50.0);
        assert_eq!(state.ticks(), 48);
        assert_eq!(state.dead_count(), 1);
    }

    #[test]
    fn test_flapping_agent_dies_at_ceiling() {
        let (mut state, mut rng) = state(vec![fixed_network(5, true)]);
        let mut ticks = 0;
        while state.step(&mut rng).unwrap().is_running() {
            ticks += 1;
            assert!(ticks < 100);
        }
        assert_eq!(state.agents()[0].death_cause(), Some(DeathCause::Ceiling));
    }

    #[test]
    fn test_extinct_state_does_not_advance() {
        let (mut state, mut rng) = state(vec![fixed_network(5, false)]);
        state.cut_off();
        let before: Vec<f32> = state.obstacles().map(Obstacle::x).collect();
        assert!(state.step(&mut rng).unwrap().is_extinct());
        let after: Vec<f32> = state.obstacles().map(Obstacle::x).collect();
        assert_eq!(before, after);
        assert_eq!(state.ticks(), 0);
        assert_eq!(state.agents()[0].death_cause(), Some(DeathCause::Timeout));
        assert_eq!(state.agents()[0].fitness(), 0.0);
    }

    #[test]
    fn test_dead_agents_are_frozen() {
        let (mut state, mut rng) = state(vec![fixed_network(5, false), fixed_network(5, true)]);
        while state.agents()[1].is_alive() {
            state.step(&mut rng).unwrap();
        }
        let frozen = state.agents()[1].clone();
        assert!(state.step(&mut rng).unwrap().is_running());
        assert_eq!(state.agents()[1].y(), frozen.y());
        assert_eq!(state.agents()[1].velocity(), frozen.velocity());
        assert_eq!(state.agents()[1].fitness(), frozen.fitness());
        assert_eq!(state.dead_count(), 1);
    }

    #[test]
    fn test_obstacle_collision_penalty() {
        let (mut state, mut rng) = state(vec![fixed_network(5, false)]);
        {
            let obstacle = &mut state.field_mut().obstacles_mut()[0];
            *obstacle = Obstacle {
                serial: obstacle.serial,
                x: 20.0,
                gap_top: 50.0,
                width: 70.0,
                gap_height: 200.0,
            };
        }
        // agent at y = 300 overlaps the bottom block (gap ends at 250)
        assert!(state.step(&mut rng).unwrap().is_extinct());
        let agent = &state.agents()[0];
        assert_eq!(agent.death_cause(), Some(DeathCause::Obstacle));
        // first tick: y stays 300, +0.5 survival, penalty 0.1 * |300 - 150|
        assert!((agent.fitness() - (0.5 - 15.0)).abs() < 1e-4);
    }

    #[test]
    fn test_passage_credited_once() {
        let (mut state, mut rng) = state(vec![fixed_network(5, false)]);
        {
            let obstacle = &mut state.field_mut().obstacles_mut()[0];
            // trailing edge at 49.5: already passed by the leading edge (50)
            obstacle.x = -20.5;
            obstacle.gap_top = 200.0;
        }
        state.step(&mut rng).unwrap();
        state.step(&mut rng).unwrap();
        let agent = &state.agents()[0];
        assert_eq!(agent.obstacles_passed(), 1);
        assert_eq!(agent.fitness(), 100.0 + 2.0 * 0.5);
        assert_eq!(state.score(), 1);
    }

    #[test]
    fn test_flap_override_once_per_tick() {
        let (mut state, mut rng) = state(vec![fixed_network(5, false), fixed_network(5, false)]);
        assert!(state.flap_override(0));
        assert!(!state.flap_override(0));
        assert!(!state.flap_override(7));
        assert_eq!(state.agents()[0].velocity(), -9.0);
        assert_eq!(state.agents()[1].velocity(), 0.0);

        state.step(&mut rng).unwrap();
        assert_eq!(state.agents()[0].y(), 291.0);
        assert!(state.flap_override(0));
    }

    #[test]
    fn test_sensor_mismatch_is_reported() {
        let mut rng = Pcg32::seed_from_u64(1);
        let config = WorldConfig {
            sensors: SensorSet::Relative,
            ..WorldConfig::default()
        };
        let mut state = SimulationState::new(config, vec![fixed_network(5, false)], &mut rng);
        let err = state.step(&mut rng).unwrap_err();
        assert_eq!(err.agent, 0);
        assert_eq!((err.source.expected, err.source.actual), (5, 4));
    }

    #[test]
    fn test_respawn_resets_world() {
        let (mut state, mut rng) = state(vec![fixed_network(5, false)]);
        while state.step(&mut rng).unwrap().is_running() {}
        state.respawn(vec![fixed_network(5, true)], false, &mut rng);

        assert!(!state.is_extinct());
        assert_eq!(state.ticks(), 0);
        assert_eq!(state.score(), 0);
        let agent = &state.agents()[0];
        assert!(agent.is_alive());
        assert_eq!((agent.y(), agent.velocity(), agent.fitness()), (300.0, 0.0, 0.0));
        let xs: Vec<f32> = state.obstacles().map(Obstacle::x).collect();
        assert_eq!(xs, vec![500.0, 800.0, 1100.0]);
    }

    #[test]
    fn test_elapsed() {
        let (mut state, mut rng) = state(vec![fixed_network(5, true)]);
        for _ in 0..3 {
            state.step(&mut rng).unwrap();
        }
        assert_eq!(state.elapsed(), Duration::from_nanos(50_000_000));
    }
}
