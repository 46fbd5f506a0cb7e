use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{InputShapeError, Matrix, ShapeMismatchError, TopologyError, sigmoid};

/// Layer sizes of a single-hidden-layer network.
///
/// All three sizes are guaranteed to be positive; this holds for values built
/// with [`Topology::new`] and for deserialized values alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTopology")]
pub struct Topology {
    input_size: usize,
    hidden_size: usize,
    output_size: usize,
}

#[derive(Deserialize)]
struct RawTopology {
    input_size: usize,
    hidden_size: usize,
    output_size: usize,
}

impl TryFrom<RawTopology> for Topology {
    type Error = TopologyError;

    fn try_from(raw: RawTopology) -> Result<Self, Self::Error> {
        Self::new(raw.input_size, raw.hidden_size, raw.output_size)
    }
}

impl Topology {
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
    ) -> Result<Self, TopologyError> {
        if input_size == 0 || hidden_size == 0 || output_size == 0 {
            return Err(TopologyError {
                input_size,
                hidden_size,
                output_size,
            });
        }
        Ok(Self {
            input_size,
            hidden_size,
            output_size,
        })
    }

    #[must_use]
    pub const fn input_size(&self) -> usize {
        self.input_size
    }

    #[must_use]
    pub const fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    #[must_use]
    pub const fn output_size(&self) -> usize {
        self.output_size
    }

    /// Total number of weights across both layers.
    #[must_use]
    pub const fn weight_count(&self) -> usize {
        self.input_size * self.hidden_size + self.hidden_size * self.output_size
    }
}

/// Feed-forward network: `input → hidden → output`, sigmoid everywhere, no biases.
///
/// `weights1` is `input_size × hidden_size` and `weights2` is
/// `hidden_size × output_size`, both row-major. Hidden unit `j` receives
/// column `j` of `weights1`; output unit `k` receives column `k` of `weights2`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeuralNetwork {
    topology: Topology,
    weights1: Matrix,
    weights2: Matrix,
}

impl NeuralNetwork {
    /// Creates a network with every weight drawn uniformly from `[-1.0, 1.0]`.
    pub fn random<R>(topology: Topology, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let weights1 = Matrix::random(topology.input_size, topology.hidden_size, rng);
        let weights2 = Matrix::random(topology.hidden_size, topology.output_size, rng);
        Self {
            topology,
            weights1,
            weights2,
        }
    }

    /// Creates a network from explicit weight matrices.
    ///
    /// # Examples
    ///
    /// ```
    /// use flapevo_network::{Matrix, NeuralNetwork, Topology};
    ///
    /// // A network that never crosses 0.5: zero input weights, negative output weights.
    /// let topology = Topology::new(2, 3, 1).unwrap();
    /// let network = NeuralNetwork::from_weights(
    ///     topology,
    ///     Matrix::from_fn(2, 3, |_, _| 0.0),
    ///     Matrix::from_fn(3, 1, |_, _| -1.0),
    /// )
    /// .unwrap();
    /// assert!(network.predict(&[100.0, -100.0]).unwrap() < 0.5);
    /// ```
    pub fn from_weights(
        topology: Topology,
        weights1: Matrix,
        weights2: Matrix,
    ) -> Result<Self, ShapeMismatchError> {
        check_shape(1, &weights1, topology.input_size, topology.hidden_size)?;
        check_shape(2, &weights2, topology.hidden_size, topology.output_size)?;
        Ok(Self {
            topology,
            weights1,
            weights2,
        })
    }

    #[must_use]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    #[must_use]
    pub fn weights1(&self) -> &Matrix {
        &self.weights1
    }

    #[must_use]
    pub fn weights2(&self) -> &Matrix {
        &self.weights2
    }

    pub fn weights1_mut(&mut self) -> &mut [f32] {
        self.weights1.values_mut()
    }

    pub fn weights2_mut(&mut self) -> &mut [f32] {
        self.weights2.values_mut()
    }

    /// Runs a forward pass and returns every output activation.
    pub fn forward(&self, inputs: &[f32]) -> Result<Vec<f32>, InputShapeError> {
        if inputs.len() != self.topology.input_size {
            return Err(InputShapeError {
                expected: self.topology.input_size,
                actual: inputs.len(),
            });
        }
        let hidden = self.weights1.transform(inputs, sigmoid);
        Ok(self.weights2.transform(&hidden, sigmoid))
    }

    /// Runs a forward pass and returns the first output activation.
    ///
    /// The result always lies strictly inside `(0, 1)`.
    pub fn predict(&self, inputs: &[f32]) -> Result<f32, InputShapeError> {
        let outputs = self.forward(inputs)?;
        // output_size >= 1 is a Topology invariant
        Ok(outputs[0])
    }
}

fn check_shape(
    layer: usize,
    matrix: &Matrix,
    rows: usize,
    cols: usize,
) -> Result<(), ShapeMismatchError> {
    if matrix.rows() == rows && matrix.cols() == cols {
        return Ok(());
    }
    Err(ShapeMismatchError {
        layer,
        expected_rows: rows,
        expected_cols: cols,
        rows: matrix.rows(),
        cols: matrix.cols(),
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn constant_network(input: usize, hidden: usize, w1: f32, w2: f32) -> NeuralNetwork {
        let topology = Topology::new(input, hidden, 1).unwrap();
        NeuralNetwork::from_weights(
            topology,
            Matrix::from_fn(input, hidden, |_, _| w1),
            Matrix::from_fn(hidden, 1, |_, _| w2),
        )
        .unwrap()
    }

    #[test]
    fn test_topology_rejects_zero() {
        assert!(Topology::new(0, 8, 1).is_err());
        assert!(Topology::new(5, 0, 1).is_err());
        assert!(Topology::new(5, 8, 0).is_err());
        assert_eq!(Topology::new(5, 8, 1).unwrap().weight_count(), 48);
    }

    #[test]
    fn test_topology_deserialize_validates() {
        let ok: Topology =
            serde_json::from_str(r#"{"input_size":5,"hidden_size":8,"output_size":1}"#).unwrap();
        assert_eq!(ok.hidden_size(), 8);

        let err = serde_json::from_str::<Topology>(
            r#"{"input_size":5,"hidden_size":0,"output_size":1}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_from_weights_shape_mismatch() {
        let topology = Topology::new(2, 3, 1).unwrap();
        let err = NeuralNetwork::from_weights(
            topology,
            Matrix::from_fn(3, 2, |_, _| 0.0),
            Matrix::from_fn(3, 1, |_, _| 0.0),
        )
        .unwrap_err();
        assert_eq!(err.layer, 1);
        assert_eq!((err.expected_rows, err.expected_cols), (2, 3));

        let err = NeuralNetwork::from_weights(
            topology,
            Matrix::from_fn(2, 3, |_, _| 0.0),
            Matrix::from_fn(3, 2, |_, _| 0.0),
        )
        .unwrap_err();
        assert_eq!(err.layer, 2);
    }

    #[test]
    fn test_predict_known_value() {
        // zero input weights: every hidden unit is sigmoid(0) = 0.5
        // output = sigmoid(4 * 0.5 * 1.0) = sigmoid(2.0)
        let network = constant_network(3, 4, 0.0, 1.0);
        let p = network.predict(&[10.0, -3.0, 7.0]).unwrap();
        assert!((p - sigmoid(2.0)).abs() < 1e-6);
    }

    #[test]
    fn test_predict_wrong_length() {
        let network = constant_network(3, 4, 0.5, 0.5);
        assert_eq!(
            network.predict(&[1.0, 2.0]),
            Err(InputShapeError {
                expected: 3,
                actual: 2
            })
        );
        assert!(network.predict(&[1.0, 2.0, 3.0, 4.0]).is_err());
    }

    #[test]
    fn test_forward_multiple_outputs() {
        let topology = Topology::new(2, 2, 3).unwrap();
        let network = NeuralNetwork::random(topology, &mut Pcg32::seed_from_u64(1));
        let out = network.forward(&[0.3, -0.7]).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(network.predict(&[0.3, -0.7]).unwrap(), out[0]);
    }

    #[test]
    fn test_weights_mut_keeps_shape() {
        let mut network = constant_network(5, 8, 0.0, 0.0);
        network.weights1_mut()[0] = 0.25;
        network.weights2_mut()[7] = -0.25;
        assert_eq!(network.weights1().get(0, 0), 0.25);
        assert_eq!(network.weights2().get(7, 0), -0.25);
        assert_eq!(network.weights1().rows(), 5);
        assert_eq!(network.weights2().cols(), 1);
    }

    proptest! {
        #[test]
        fn prop_random_dimensions_and_range(
            input in 1..12usize,
            hidden in 1..12usize,
            output in 1..4usize,
            seed in any::<u64>(),
        ) {
            let topology = Topology::new(input, hidden, output).unwrap();
            let network = NeuralNetwork::random(topology, &mut Pcg32::seed_from_u64(seed));
            prop_assert_eq!(network.weights1().rows(), input);
            prop_assert_eq!(network.weights1().cols(), hidden);
            prop_assert_eq!(network.weights2().rows(), hidden);
            prop_assert_eq!(network.weights2().cols(), output);
            prop_assert!(network.weights1().values().iter().all(|w| (-1.0..=1.0).contains(w)));
            prop_assert!(network.weights2().values().iter().all(|w| (-1.0..=1.0).contains(w)));
        }

        #[test]
        fn prop_predict_open_interval_and_deterministic(
            inputs in prop::collection::vec(-1.0e6f32..1.0e6, 5),
            seed in any::<u64>(),
        ) {
            let topology = Topology::new(5, 8, 1).unwrap();
            let network = NeuralNetwork::random(topology, &mut Pcg32::seed_from_u64(seed));
            let a = network.predict(&inputs).unwrap();
            let b = network.predict(&inputs).unwrap();
            prop_assert!(a > 0.0 && a < 1.0);
            prop_assert_eq!(a.to_bits(), b.to_bits());
        }
    }
}
