//! Fixed-topology feed-forward networks used as agent controllers.
//!
//! Every network in this crate has exactly one hidden layer, no bias terms and
//! sigmoid activations on both the hidden and the output layer:
//!
//! ```text
//! inputs ──weights1──▶ sigmoid ──weights2──▶ sigmoid ──▶ outputs
//! (input_size)        (hidden_size)         (output_size)
//! ```
//!
//! Networks are pure functions of their weights: [`NeuralNetwork::predict`]
//! keeps no state between calls, so any number of agents can query their own
//! networks independently.
//!
//! The weight layout is fixed at construction. Genetic operators in the
//! training crate rewrite weight *values* through [`NeuralNetwork::weights1_mut`]
//! and [`NeuralNetwork::weights2_mut`], but never the dimensions.
//!
//! # Example
//!
//! ```
//! use flapevo_network::{NeuralNetwork, Topology};
//!
//! let topology = Topology::new(5, 8, 1).unwrap();
//! let network = NeuralNetwork::random(topology, &mut rand::rng());
//!
//! let p = network.predict(&[0.0, 120.0, -40.0, 160.0, 300.0]).unwrap();
//! assert!(p > 0.0 && p < 1.0);
//!
//! // Wrong feature count is rejected
//! assert!(network.predict(&[1.0, 2.0]).is_err());
//! ```

pub use self::{
    activation::{SIGMOID_MAX, SIGMOID_MIN, sigmoid},
    matrix::Matrix,
    network::{NeuralNetwork, Topology},
};

mod activation;
mod matrix;
mod network;

/// A layer size of zero was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display(
    "network layer sizes must be positive (input: {input_size}, hidden: {hidden_size}, output: {output_size})"
)]
pub struct TopologyError {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
}

/// `predict` was given a feature vector whose length differs from the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("expected {expected} network inputs, got {actual}")]
pub struct InputShapeError {
    pub expected: usize,
    pub actual: usize,
}

/// Explicit weights do not fit the topology they were paired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display(
    "layer {layer} weights must be {expected_rows}x{expected_cols}, got {rows}x{cols}"
)]
pub struct ShapeMismatchError {
    pub layer: usize,
    pub expected_rows: usize,
    pub expected_cols: usize,
    pub rows: usize,
    pub cols: usize,
}
