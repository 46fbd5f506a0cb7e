//! Deterministic side-scrolling world in which a population of agents tries
//! to fly through gaps in scrolling obstacles.
//!
//! The world is advanced one fixed tick at a time by [`SimulationState::step`].
//! All randomness (only the vertical position of obstacle gaps) comes from the
//! RNG handed to each call, so a seeded RNG reproduces a run exactly.
//!
//! Each agent is steered by its own [`flapevo_network::NeuralNetwork`]: the
//! agent's [`Sensors`] are fed to the network every tick and the agent flaps
//! when the output reaches [`FLAP_THRESHOLD`].

pub use self::{
    agent::{Agent, DeathCause},
    config::{ObstacleConfig, PhysicsConfig, RewardConfig, SpawnConfig, WorldConfig},
    obstacle::{Obstacle, ObstacleField},
    sensor::{MAX_SENSORS, SensorSet, Sensors},
    simulation::{FLAP_THRESHOLD, SimulationState, StepOutcome},
};

use flapevo_network::InputShapeError;

mod agent;
mod config;
mod obstacle;
mod sensor;
mod simulation;

/// An agent's network could not consume the sensor vector of the world.
///
/// This happens when the network input size differs from
/// [`SensorSet::count`] of the configured sensor set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("network of agent {agent} rejected its sensors: {source}")]
pub struct SimulationError {
    pub agent: usize,
    pub source: InputShapeError,
}
