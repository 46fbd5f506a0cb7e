//! Neuroevolution of flap controllers.
//!
//! This crate closes the loop between the world simulated by
//! [`flapevo_engine`] and the networks of [`flapevo_network`]: a population of
//! agents flies until every agent has died, the fitness each agent collected
//! scores its network, and a genetic algorithm breeds the networks of the
//! next generation.
//!
//! # How Training Works
//!
//! 1. **Seeding** - Every agent slot gets a network with uniform random weights
//! 2. **Simulation** - Agents fly through the obstacle course, one tick at a time,
//!    collecting fitness for surviving and for passing obstacles
//! 3. **Extinction** - Once every agent is dead the generation is over
//! 4. **Evolution** - The best agents breed the next networks (see [`genetic`])
//! 5. **Respawn** - Every slot respawns with its new network on a fresh course
//!
//! # Architecture
//!
//! ```text
//! GenerationController
//!     ↓ ticks
//! SimulationState (flapevo-engine)
//!     ↓ queries
//! NeuralNetwork (flapevo-network)
//!
//! GenerationController
//!     ↓ on extinction
//! PopulationEvolver
//!     ↓ produces
//! next generation's networks
//! ```
//!
//! # Configuration
//!
//! [`TrainingConfig`] holds every parameter of a run. [`Preset`] provides two
//! ready-made configurations, `classic` and `steady`.
//!
//! # Example
//!
//! ```
//! use flapevo_training::{GenerationController, Preset, TrainingConfig};
//!
//! let config = TrainingConfig {
//!     seed: Some(42),
//!     max_ticks_per_generation: Some(2_000),
//!     ..Preset::Classic.config()
//! };
//! let mut controller = GenerationController::new(config).unwrap();
//! let summaries = controller.run_generations(3).unwrap();
//!
//! assert_eq!(controller.generation(), 3);
//! assert_eq!(summaries.len(), 3);
//! assert!(controller.best_agent().is_some());
//! ```

use flapevo_engine::SimulationError;
use flapevo_network::TopologyError;

pub use self::{
    config::{EvolutionConfig, MutationPolicy, Preset, SecondLayerPolicy, TrainingConfig},
    controller::{Champion, GenerationController, GenerationSummary, HISTORY_LIMIT, TickOutcome},
};

mod config;
mod controller;
pub mod genetic;
pub mod weights;

/// A [`TrainingConfig`] that cannot be run.
#[derive(
    Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error, derive_more::IsVariant,
)]
pub enum ConfigError {
    #[display("population size must be positive")]
    EmptyPopulation,
    #[display("invalid network topology: {_0}")]
    Topology(TopologyError),
    #[display("at least one obstacle is required")]
    NoObstacles,
    #[display("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f32 },
    #[display("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[display(
        "an obstacle gap of {gap_height} with margin {gap_margin} does not fit a screen of height {screen_height}"
    )]
    GapDoesNotFit {
        gap_height: f32,
        gap_margin: f32,
        screen_height: f32,
    },
    #[display("elite fraction must be in (0, 1], got {value}")]
    EliteFraction { value: f32 },
    #[display("mutation rate must be in [0, 1], got {value}")]
    MutationRate { value: f32 },
    #[display("mutation sigma must be finite and non-negative, got {value}")]
    MutationSigma { value: f32 },
    #[display("piloted agent {index} is out of range for a population of {population_size}")]
    PilotedAgentOutOfRange { index: usize, population_size: usize },
}

/// [`genetic::PopulationEvolver::evolve`] was given a population it cannot breed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    derive_more::Display,
    derive_more::Error,
    derive_more::IsVariant,
)]
pub enum EvolveError {
    #[display("cannot evolve an empty population")]
    EmptyPopulation,
    #[display("network of agent {index} does not match the population topology")]
    TopologyMismatch { index: usize },
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    derive_more::Display,
    derive_more::Error,
    derive_more::From,
    derive_more::IsVariant,
)]
pub enum ControllerError {
    #[display("invalid training configuration: {_0}")]
    Config(ConfigError),
    #[display("simulation failed: {_0}")]
    Simulation(SimulationError),
    #[display("evolution failed: {_0}")]
    Evolve(EvolveError),
    #[display("expected {expected} networks, got {actual}")]
    #[from(ignore)]
    PopulationSize { expected: usize, actual: usize },
    #[display("network {index} does not match the configured topology")]
    #[from(ignore)]
    NetworkTopology { index: usize },
}
