use chrono::{DateTime, Utc};
use flapevo_network::NeuralNetwork;
use flapevo_training::{GenerationSummary, TrainingConfig};
use serde::Serialize;

/// Final report of a training run.
///
/// Written once at the end of `train`; the run cannot be resumed from it.
#[derive(Debug, Clone, Serialize)]
pub struct TrainedModel {
    /// Preset name or configuration file the run was started from.
    pub preset: String,
    pub trained_at: DateTime<Utc>,
    pub generations: u64,
    pub high_score: usize,
    /// Fitness of the best agent over all completed generations.
    pub fitness: f32,
    pub config: TrainingConfig,
    pub network: NeuralNetwork,
    pub last_generation: Option<GenerationSummary>,
}
