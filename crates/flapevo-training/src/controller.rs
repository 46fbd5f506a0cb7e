use std::collections::VecDeque;

use flapevo_engine::{Agent, SimulationState, StepOutcome};
use flapevo_network::{NeuralNetwork, Topology};
use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::{ControllerError, TrainingConfig, genetic::PopulationEvolver};

/// Number of [`GenerationSummary`] entries kept by [`GenerationController::history`].
pub const HISTORY_LIMIT: usize = 1000;

/// Fitness and score figures of one completed generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationSummary {
    /// 0-based index of the generation that ended.
    pub generation: u64,
    pub ticks: u64,
    pub best_fitness: f32,
    pub worst_fitness: f32,
    pub mean_fitness: f32,
    /// Most obstacles passed by a single agent during the generation.
    pub score: usize,
    /// Best score over every generation so far, this one included.
    pub high_score: usize,
    /// The generation hit `max_ticks_per_generation` with agents still alive.
    pub timed_out: bool,
}

/// Best network seen at the end of any completed generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Champion {
    pub generation: u64,
    pub fitness: f32,
    pub network: NeuralNetwork,
}

#[derive(Debug, Clone, PartialEq, derive_more::IsVariant)]
pub enum TickOutcome {
    Running,
    /// The population died out; the next generation has already been spawned.
    GenerationCompleted(GenerationSummary),
}

/// Owns the population and runs generation after generation.
///
/// Each [`tick`](Self::tick) advances the world once. When the whole
/// population is dead, the same call ranks it, breeds the next generation,
/// respawns every agent slot with its new network and rebuilds the obstacle
/// field, so callers never observe an extinct state.
///
/// Generation and high-score bookkeeping only changes inside that reset.
#[derive(Debug, Clone)]
pub struct GenerationController {
    config: TrainingConfig,
    topology: Topology,
    rng: Pcg32,
    state: SimulationState,
    generation: u64,
    high_score: usize,
    history: VecDeque<GenerationSummary>,
    champion: Option<Champion>,
}

impl GenerationController {
    /// Validates `config` and spawns a population of random networks.
    pub fn new(config: TrainingConfig) -> Result<Self, ControllerError> {
        config.validate()?;
        let topology = config.topology()?;
        let mut rng = seeded_rng(config.seed);
        let networks = (0..config.population_size)
            .map(|_| NeuralNetwork::random(topology, &mut rng))
            .collect();
        Ok(Self::build(config, topology, rng, networks))
    }

    /// Validates `config` and spawns the population with the given networks,
    /// one per agent slot.
    pub fn with_networks(
        config: TrainingConfig,
        networks: Vec<NeuralNetwork>,
    ) -> Result<Self, ControllerError> {
        config.validate()?;
        let topology = config.topology()?;
        if networks.len() != config.population_size {
            return Err(ControllerError::PopulationSize {
                expected: config.population_size,
                actual: networks.len(),
            });
        }
        if let Some(index) = networks.iter().position(|n| n.topology() != topology) {
            return Err(ControllerError::NetworkTopology { index });
        }
        let rng = seeded_rng(config.seed);
        Ok(Self::build(config, topology, rng, networks))
    }

    fn build(
        config: TrainingConfig,
        topology: Topology,
        mut rng: Pcg32,
        networks: Vec<NeuralNetwork>,
    ) -> Self {
        let state = SimulationState::new(config.world.clone(), networks, &mut rng);
        Self {
            config,
            topology,
            rng,
            state,
            generation: 0,
            high_score: 0,
            history: VecDeque::new(),
            champion: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Read-only view of the running generation.
    #[must_use]
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Number of generations completed so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn high_score(&self) -> usize {
        self.high_score
    }

    /// Summaries of the most recent generations, oldest first.
    #[must_use]
    pub fn history(&self) -> &VecDeque<GenerationSummary> {
        &self.history
    }

    /// Agent with the highest fitness in the current population.
    #[must_use]
    pub fn best_agent(&self) -> Option<&Agent> {
        self.state.best_agent()
    }

    /// Fittest agent's network over every completed generation (the earliest
    /// one on ties).
    #[must_use]
    pub fn champion(&self) -> Option<&Champion> {
        self.champion.as_ref()
    }

    /// Makes the piloted agent flap. Returns `false` if no agent is piloted
    /// or the override had no effect.
    pub fn flap_override(&mut self) -> bool {
        self.config
            .piloted_agent
            .is_some_and(|index| self.state.flap_override(index))
    }

    /// Advances the world by one tick, starting the next generation if the
    /// population died out during it.
    pub fn tick(&mut self) -> Result<TickOutcome, ControllerError> {
        let mut outcome = self.state.step(&mut self.rng)?;

        let mut timed_out = false;
        if outcome.is_running()
            && self
                .config
                .max_ticks_per_generation
                .is_some_and(|max| self.state.ticks() >= max)
        {
            tracing::warn!(
                generation = self.generation,
                ticks = self.state.ticks(),
                alive = self.state.agents().len() - self.state.dead_count(),
                "generation cut off by tick limit"
            );
            self.state.cut_off();
            timed_out = true;
            outcome = StepOutcome::Extinct;
        }

        match outcome {
            StepOutcome::Running => Ok(TickOutcome::Running),
            StepOutcome::Extinct => Ok(TickOutcome::GenerationCompleted(
                self.complete_generation(timed_out)?,
            )),
        }
    }

    /// Ticks until `count` more generations have completed and returns their
    /// summaries.
    pub fn run_generations(
        &mut self,
        count: u64,
    ) -> Result<Vec<GenerationSummary>, ControllerError> {
        let mut summaries = vec![];
        while (summaries.len() as u64) < count {
            if let TickOutcome::GenerationCompleted(summary) = self.tick()? {
                summaries.push(summary);
            }
        }
        Ok(summaries)
    }

    fn evolver(&self) -> PopulationEvolver {
        let evolution = &self.config.evolution;
        PopulationEvolver {
            topology: self.topology,
            elite_fraction: evolution.elite_fraction,
            mutation_rate: evolution.mutation.rate(self.generation + 1),
            mutation_sigma: evolution.mutation_sigma,
            second_layer: evolution.second_layer,
            mutate_second_layer: evolution.mutate_second_layer,
        }
    }

    fn complete_generation(
        &mut self,
        timed_out: bool,
    ) -> Result<GenerationSummary, ControllerError> {
        let evolver = self.evolver();
        let agents = self.state.agents();

        self.high_score = usize::max(self.high_score, self.state.score());
        let (best_fitness, worst_fitness, mean_fitness) = fitness_stats(agents);
        let summary = GenerationSummary {
            generation: self.generation,
            ticks: self.state.ticks(),
            best_fitness,
            worst_fitness,
            mean_fitness,
            score: self.state.score(),
            high_score: self.high_score,
            timed_out,
        };
        tracing::info!(
            generation = summary.generation,
            ticks = summary.ticks,
            best_fitness = summary.best_fitness,
            worst_fitness = summary.worst_fitness,
            mean_fitness = summary.mean_fitness,
            score = summary.score,
            high_score = summary.high_score,
            "generation completed"
        );

        let improved = self.state.best_agent().filter(|best| {
            self.champion
                .as_ref()
                .is_none_or(|champion| best.fitness() > champion.fitness)
        });
        if let Some(best) = improved {
            self.champion = Some(Champion {
                generation: self.generation,
                fitness: best.fitness(),
                network: best.network().clone(),
            });
        }

        let networks = evolver.evolve(agents, &mut self.rng)?;
        self.state
            .respawn(networks, self.config.fitness_carries_over, &mut self.rng);
        self.generation += 1;

        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(summary);
        Ok(summary)
    }
}

fn seeded_rng(seed: Option<u64>) -> Pcg32 {
    match seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_rng(&mut rand::rng()),
    }
}

/// `(best, worst, mean)` fitness of a non-empty population.
fn fitness_stats(agents: &[Agent]) -> (f32, f32, f32) {
    let mut best = f32::NEG_INFINITY;
    let mut worst = f32::INFINITY;
    let mut sum = 0.0;
    for agent in agents {
        best = f32::max(best, agent.fitness());
        worst = f32::min(worst, agent.fitness());
        sum += agent.fitness();
    }
    #[expect(clippy::cast_precision_loss)]
    let mean = sum / agents.len() as f32;
    (best, worst, mean)
}
