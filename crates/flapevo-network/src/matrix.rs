use rand::Rng;
use serde::Serialize;

/// Dense row-major `f32` matrix with fixed dimensions.
///
/// Element `(row, col)` lives at `values[row * cols + col]`. The dimensions are
/// fixed at construction; only the values can be changed afterwards, through
/// [`Matrix::values_mut`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl Matrix {
    /// Creates a matrix by calling `f(row, col)` for every element.
    ///
    /// # Examples
    ///
    /// ```
    /// use flapevo_network::Matrix;
    ///
    /// let m = Matrix::from_fn(2, 3, |r, c| (r * 10 + c) as f32);
    /// assert_eq!(m.get(1, 2), 12.0);
    /// assert_eq!(m.values(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
    /// ```
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f32,
    {
        let mut values = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                values.push(f(r, c));
            }
        }
        Self { rows, cols, values }
    }

    /// Creates a matrix with every element drawn uniformly from `[-1.0, 1.0]`.
    pub fn random<R>(rows: usize, cols: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::from_fn(rows, cols, |_, _| rng.random_range(-1.0..=1.0))
    }

    /// Wraps row-major `values`, or returns `None` if the length is not `rows * cols`.
    #[must_use]
    pub fn from_values(rows: usize, cols: usize, values: Vec<f32>) -> Option<Self> {
        (values.len() == rows * cols).then_some(Self { rows, cols, values })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the element at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the position is out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        assert!(row < self.rows && col < self.cols);
        self.values[row * self.cols + col]
    }

    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Mutable access to the values; the slice length cannot change the shape.
    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// Computes `inputs · M` followed by `activation` on each column sum.
    ///
    /// `inputs` must have `rows` elements (checked by the caller).
    pub(crate) fn transform<F>(&self, inputs: &[f32], activation: F) -> Vec<f32>
    where
        F: Fn(f32) -> f32,
    {
        debug_assert_eq!(inputs.len(), self.rows);
        (0..self.cols)
            .map(|c| {
                let sum = inputs
                    .iter()
                    .enumerate()
                    .map(|(r, x)| x * self.values[r * self.cols + c])
                    .sum::<f32>();
                activation(sum)
            })
            .collect()
    }
}
