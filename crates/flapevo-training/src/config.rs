use flapevo_engine::{SensorSet, WorldConfig};
use flapevo_network::Topology;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Named parameter sets reproducing the two classic trainer setups.
#[derive(
    Default,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::FromStr,
    derive_more::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// 30 agents, five sensors, decaying mutation, fitness reset every
    /// generation and a re-randomized output layer for every child.
    #[default]
    #[display("classic")]
    Classic,
    /// 50 agents, four relative sensors, constant mutation, fitness reset
    /// every generation and both layers crossed over.
    #[display("steady")]
    Steady,
}

impl Preset {
    #[must_use]
    pub fn config(self) -> TrainingConfig {
        match self {
            Self::Classic => TrainingConfig {
                population_size: 30,
                hidden_size: 8,
                world: WorldConfig::default(),
                evolution: EvolutionConfig {
                    elite_fraction: 0.3,
                    mutation: MutationPolicy::Decaying { base_rate: 0.1 },
                    mutation_sigma: 0.1,
                    second_layer: SecondLayerPolicy::Randomize,
                    mutate_second_layer: false,
                },
                fitness_carries_over: false,
                piloted_agent: None,
                max_ticks_per_generation: None,
                seed: None,
            },
            Self::Steady => TrainingConfig {
                population_size: 50,
                hidden_size: 8,
                world: WorldConfig {
                    sensors: SensorSet::Relative,
                    ..WorldConfig::default()
                },
                evolution: EvolutionConfig {
                    elite_fraction: 0.3,
                    mutation: MutationPolicy::Constant { rate: 0.05 },
                    mutation_sigma: 0.1,
                    second_layer: SecondLayerPolicy::Crossover,
                    mutate_second_layer: false,
                },
                fitness_carries_over: false,
                piloted_agent: None,
                max_ticks_per_generation: None,
                seed: None,
            },
        }
    }
}

/// Every parameter of a training run.
///
/// Missing fields fall back to the [`Preset::Classic`] values when
/// deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub population_size: usize,
    /// Neurons in the hidden layer. The input layer size follows from
    /// `world.sensors` and the output layer is a single flap neuron.
    pub hidden_size: usize,
    pub world: WorldConfig,
    pub evolution: EvolutionConfig,
    /// Whether an agent slot keeps its accumulated fitness when the next
    /// generation spawns.
    pub fitness_carries_over: bool,
    /// Agent slot that [`GenerationController::flap_override`](crate::GenerationController::flap_override)
    /// acts on.
    pub piloted_agent: Option<usize>,
    /// Generations still running after this many ticks are cut off.
    pub max_ticks_per_generation: Option<u64>,
    /// RNG seed; drawn from the thread RNG when absent.
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Preset::default().config()
    }
}

impl TrainingConfig {
    /// Network shape every agent uses.
    pub fn topology(&self) -> Result<Topology, ConfigError> {
        Topology::new(self.world.sensors.count(), self.hidden_size, 1).map_err(ConfigError::Topology)
    }

    /// Checks every invariant the simulation and the evolution engine rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        self.topology()?;

        let physics = &self.world.physics;
        positive("physics.screen_width", physics.screen_width)?;
        positive("physics.screen_height", physics.screen_height)?;
        positive("physics.gravity", physics.gravity)?;
        finite("physics.flap_velocity", physics.flap_velocity)?;
        positive("physics.max_fall_speed", physics.max_fall_speed)?;
        positive("physics.scroll_speed", physics.scroll_speed)?;
        finite("physics.floor_margin", physics.floor_margin)?;
        if physics.ticks_per_second == 0 {
            return Err(ConfigError::NonPositive {
                name: "physics.ticks_per_second",
                value: 0.0,
            });
        }

        let obstacles = &self.world.obstacles;
        if obstacles.count == 0 {
            return Err(ConfigError::NoObstacles);
        }
        positive("obstacles.width", obstacles.width)?;
        positive("obstacles.gap_height", obstacles.gap_height)?;
        positive("obstacles.spacing", obstacles.spacing)?;
        finite("obstacles.first_x", obstacles.first_x)?;
        finite("obstacles.gap_margin", obstacles.gap_margin)?;
        if obstacles.gap_margin < 0.0
            || obstacles.gap_height + 2.0 * obstacles.gap_margin > physics.screen_height
        {
            return Err(ConfigError::GapDoesNotFit {
                gap_height: obstacles.gap_height,
                gap_margin: obstacles.gap_margin,
                screen_height: physics.screen_height,
            });
        }

        let spawn = &self.world.spawn;
        finite("spawn.x", spawn.x)?;
        finite("spawn.y", spawn.y)?;
        positive("spawn.size", spawn.size)?;

        let rewards = &self.world.rewards;
        finite("rewards.survival_reward", rewards.survival_reward)?;
        finite("rewards.pass_reward", rewards.pass_reward)?;
        finite("rewards.boundary_penalty", rewards.boundary_penalty)?;
        finite("rewards.collision_penalty_scale", rewards.collision_penalty_scale)?;

        self.evolution.validate()?;

        if let Some(index) = self.piloted_agent.filter(|&i| i >= self.population_size) {
            return Err(ConfigError::PilotedAgentOutOfRange {
                index,
                population_size: self.population_size,
            });
        }
        Ok(())
    }
}

/// Parameters of the genetic algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Share of the ranked population used as breeding stock, in `(0, 1]`.
    pub elite_fraction: f32,
    pub mutation: MutationPolicy,
    /// Standard deviation of the Gaussian mutation noise.
    pub mutation_sigma: f32,
    pub second_layer: SecondLayerPolicy,
    /// Also mutate the hidden-to-output weights.
    pub mutate_second_layer: bool,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            elite_fraction: 0.3,
            mutation: MutationPolicy::default(),
            mutation_sigma: 0.1,
            second_layer: SecondLayerPolicy::default(),
            mutate_second_layer: false,
        }
    }
}

impl EvolutionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.elite_fraction > 0.0 && self.elite_fraction <= 1.0) {
            return Err(ConfigError::EliteFraction {
                value: self.elite_fraction,
            });
        }
        let rate = match self.mutation {
            MutationPolicy::Constant { rate } => rate,
            MutationPolicy::Decaying { base_rate } => base_rate,
        };
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::MutationRate { value: rate });
        }
        if !(self.mutation_sigma.is_finite() && self.mutation_sigma >= 0.0) {
            return Err(ConfigError::MutationSigma {
                value: self.mutation_sigma,
            });
        }
        Ok(())
    }
}

/// Per-gene mutation probability over the course of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MutationPolicy {
    Constant { rate: f32 },
    /// `base_rate / (generation + 1)` where `generation` counts completed
    /// generations, so the first breeding already halves `base_rate`.
    Decaying { base_rate: f32 },
}

impl Default for MutationPolicy {
    fn default() -> Self {
        Self::Decaying { base_rate: 0.1 }
    }
}

impl MutationPolicy {
    /// Mutation probability for children bred once `generation` generations
    /// have completed.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn rate(self, generation: u64) -> f32 {
        match self {
            Self::Constant { rate } => rate,
            Self::Decaying { base_rate } => base_rate / (generation as f32 + 1.0),
        }
    }
}

/// How a child's hidden-to-output weights are produced.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecondLayerPolicy {
    /// Uniform per-gene crossover, same as the first layer.
    #[default]
    Crossover,
    /// Copied wholesale from the first parent.
    InheritFirstParent,
    /// Fresh uniform weights in `[-1, 1]`.
    Randomize,
}

fn finite(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { name, value })
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}
