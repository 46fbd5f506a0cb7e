//! Weight vector operators used by the genetic algorithm.
//!
//! The operators work on flat `f32` slices, i.e. on the row-major storage of
//! one weight matrix ([`flapevo_network::Matrix::values`]). They never change
//! the length of a vector, so a child always keeps its parents' topology.
//!
//! # Operations
//!
//! - **Initialization**: [`random`] draws fresh genes uniformly from `[-1, 1]`
//! - **Crossover**: [`uniform_crossover`] copies each gene from one of two parents
//! - **Mutation**: [`mutate`] adds scaled Gaussian noise to a random subset of genes
//!
//! Crossover is a per-gene *choice*, never a blend: every gene of a child is
//! bit-for-bit equal to the gene of one of its parents at the same index.

use rand::Rng;
use rand_distr::Normal;

/// Creates a weight vector by applying a function to each index.
///
/// # Examples
///
/// ```
/// use flapevo_training::weights;
///
/// let weights = weights::from_fn(|i| i as f32 * 0.5, 4);
/// assert_eq!(weights, vec![0.0, 0.5, 1.0, 1.5]);
/// ```
pub fn from_fn<F>(mut f: F, len: usize) -> Vec<f32>
where
    F: FnMut(usize) -> f32,
{
    let mut values = Vec::with_capacity(len);
    for i in 0..len {
        values.push(f(i));
    }
    values
}

/// Generates `len` weights uniformly distributed in `[-1.0, 1.0]`.
pub fn random<R>(rng: &mut R, len: usize) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    from_fn(|_| rng.random_range(-1.0..=1.0), len)
}

/// Uniform crossover between two parent weight vectors.
///
/// Each gene of the child is copied from `p1` or from `p2` with probability
/// 0.5, independently of every other gene.
///
/// # Panics
///
/// Panics if parent vectors have different lengths.
///
/// # Examples
///
/// ```
/// use flapevo_training::weights;
///
/// let p1 = [1.0, 2.0, 3.0, 4.0];
/// let p2 = [-1.0, -2.0, -3.0, -4.0];
/// let child = weights::uniform_crossover(&p1, &p2, &mut rand::rng());
/// for (i, w) in child.iter().enumerate() {
///     assert!(*w == p1[i] || *w == p2[i]);
/// }
/// ```
pub fn uniform_crossover<R>(p1: &[f32], p2: &[f32], rng: &mut R) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    assert_eq!(p1.len(), p2.len());
    from_fn(
        |i| if rng.random_bool(0.5) { p1[i] } else { p2[i] },
        p1.len(),
    )
}

/// Applies Gaussian mutation to a weight vector in-place.
///
/// Each weight is perturbed with probability `rate` by noise drawn from
/// `N(0, sigma)`.
/// `rate` is clamped to `[0, 1]`; with `rate == 0` the vector is left exactly
/// as it was.
///
/// Weights are not clamped after mutation: repeated mutation may drift them
/// outside the `[-1, 1]` range they were initialized in.
///
/// # Panics
///
/// Panics if `sigma` is negative or NaN.
pub fn mutate<R>(weights: &mut [f32], sigma: f32, rate: f32, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let rate = f64::from(rate.clamp(0.0, 1.0));
    if rate == 0.0 {
        return;
    }
    let normal = Normal::new(0.0, sigma).expect("sigma must be non-negative");
    for w in weights {
        if rng.random_bool(rate) {
            *w += rng.sample(normal);
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_random_range() {
        let mut rng = Pcg32::seed_from_u64(0);
        let weights = random(&mut rng, 1000);
        assert_eq!(weights.len(), 1000);
        assert!(weights.iter().all(|w| (-1.0..=1.0).contains(w)));
    }

    #[test]
    fn test_crossover_mixes_both_parents() {
        let mut rng = Pcg32::seed_from_u64(4);
        let p1 = vec![1.0; 200];
        let p2 = vec![2.0; 200];
        let child = uniform_crossover(&p1, &p2, &mut rng);
        let from_p1 = child.iter().filter(|w| **w == 1.0).count();
        assert!((60..=140).contains(&from_p1), "{from_p1}");
    }

    #[test]
    fn test_mutate_rate_zero_is_noop() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut weights = random(&mut rng, 64);
        let before = weights.clone();
        mutate(&mut weights, 10.0, 0.0, &mut rng);
        assert_eq!(weights, before);
    }

    #[test]
    fn test_mutate_zero_sigma_keeps_weights() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut weights = random(&mut rng, 32);
        let before = weights.clone();
        mutate(&mut weights, 0.0, 1.0, &mut rng);
        assert_eq!(weights, before);
    }

    #[test]
    #[should_panic(expected = "sigma must be non-negative")]
    fn test_mutate_rejects_negative_sigma() {
        mutate(&mut [0.0; 4], -1.0, 0.5, &mut Pcg32::seed_from_u64(0));
    }

    #[test]
    fn test_mutate_rate_one_changes_every_gene() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut weights = vec![0.0; 64];
        mutate(&mut weights, 0.1, 1.0, &mut rng);
        assert!(weights.iter().all(|w| *w != 0.0));
        assert!(weights.iter().all(|w| w.abs() < 1.0));
    }

    proptest! {
        #[test]
        fn crossover_genes_come_from_a_parent(
            pair in (1usize..64).prop_flat_map(|len| (
                prop::collection::vec(-10.0f32..10.0, len),
                prop::collection::vec(-10.0f32..10.0, len),
            )),
            seed in any::<u64>(),
        ) {
            let (p1, p2) = pair;
            let mut rng = Pcg32::seed_from_u64(seed);
            let child = uniform_crossover(&p1, &p2, &mut rng);
            prop_assert_eq!(child.len(), p1.len());
            for (i, w) in child.iter().enumerate() {
                prop_assert!(w.to_bits() == p1[i].to_bits() || w.to_bits() == p2[i].to_bits());
            }
        }
    }
}
