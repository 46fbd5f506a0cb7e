//! Genetic algorithm producing the next generation of agent networks.
//!
//! A generation ends when every agent has died; each agent's fitness then
//! scores the network it carried. [`PopulationEvolver::evolve`] turns that
//! scored population into a fresh set of networks, one per agent slot.
//!
//! # Algorithm
//!
//! 1. **Rank** - Sort agents by fitness, best first. The sort is stable, so
//!    agents with equal fitness keep their slot order and a seeded run stays
//!    reproducible.
//! 2. **Elite Selection** - The top `⌈n × elite_fraction⌉` agents (at least
//!    one) form the breeding stock. Nothing outside the elite ever breeds.
//! 3. **Parent Selection** - For every child, two parents are drawn uniformly
//!    from the elite. With more than one elite member the second draw is
//!    repeated until it differs from the first, so a child only has a single
//!    parent when the elite is a single agent.
//! 4. **Crossover** - The input-to-hidden weights are recombined with
//!    [`weights::uniform_crossover`]. The hidden-to-output weights follow the
//!    configured [`SecondLayerPolicy`].
//! 5. **Mutation** - [`weights::mutate`] perturbs the input-to-hidden weights
//!    (and the hidden-to-output weights if enabled) with Gaussian noise.
//!
//! Elite networks are not copied unchanged into the next generation: every
//! slot receives a recombined child. Output order carries no meaning; the
//! controller hands child `i` to agent slot `i`.
//!
//! # Example
//!
//! ```
//! use flapevo_engine::{Agent, SpawnConfig};
//! use flapevo_network::{NeuralNetwork, Topology};
//! use flapevo_training::{SecondLayerPolicy, genetic::PopulationEvolver};
//!
//! let mut rng = rand::rng();
//! let topology = Topology::new(5, 8, 1).unwrap();
//! let population: Vec<Agent> = (0..10)
//!     .map(|_| Agent::spawn(NeuralNetwork::random(topology, &mut rng), &SpawnConfig::default()))
//!     .collect();
//!
//! let evolver = PopulationEvolver {
//!     topology,
//!     elite_fraction: 0.3,
//!     mutation_rate: 0.1,
//!     mutation_sigma: 0.1,
//!     second_layer: SecondLayerPolicy::Crossover,
//!     mutate_second_layer: false,
//! };
//! let children = evolver.evolve(&population, &mut rng).unwrap();
//! assert_eq!(children.len(), 10);
//! assert_eq!(evolver.elite_count(10), 3);
//! ```

use flapevo_engine::Agent;
use flapevo_network::{NeuralNetwork, Topology};
use rand::Rng;

use crate::{EvolveError, SecondLayerPolicy, weights};

/// Controls how one generation is bred from the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationEvolver {
    /// Topology every network of the population must have.
    pub topology: Topology,
    /// Share of the ranked population used as breeding stock.
    pub elite_fraction: f32,
    /// Probability of mutating each weight.
    pub mutation_rate: f32,
    /// Standard deviation of the Gaussian mutation noise; must be non-negative.
    pub mutation_sigma: f32,
    pub second_layer: SecondLayerPolicy,
    /// Whether hidden-to-output weights are mutated too.
    pub mutate_second_layer: bool,
}

impl PopulationEvolver {
    /// Number of elite agents for a population of `population_size`.
    ///
    /// Always at least 1 and never more than the population itself (for a
    /// non-empty population).
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn elite_count(&self, population_size: usize) -> usize {
        let count = (population_size as f32 * self.elite_fraction).ceil() as usize;
        count.clamp(1, population_size.max(1))
    }

    /// Breeds one child network per agent of `population`.
    pub fn evolve<R>(
        &self,
        population: &[Agent],
        rng: &mut R,
    ) -> Result<Vec<NeuralNetwork>, EvolveError>
    where
        R: Rng + ?Sized,
    {
        if population.is_empty() {
            return Err(EvolveError::EmptyPopulation);
        }
        if let Some(index) = population
            .iter()
            .position(|agent| agent.network().topology() != self.topology)
        {
            return Err(EvolveError::TopologyMismatch { index });
        }

        let ranking = rank(population);
        let elite = &ranking[..self.elite_count(population.len())];

        let children = (0..population.len())
            .map(|_| {
                let (a, b) = select_parents(elite, rng);
                self.breed(population[a].network(), population[b].network(), rng)
            })
            .collect();
        Ok(children)
    }

    fn breed<R>(&self, p1: &NeuralNetwork, p2: &NeuralNetwork, rng: &mut R) -> NeuralNetwork
    where
        R: Rng + ?Sized,
    {
        let mut child = p1.clone();

        let w1 = weights::uniform_crossover(p1.weights1().values(), p2.weights1().values(), rng);
        child.weights1_mut().copy_from_slice(&w1);

        match self.second_layer {
            SecondLayerPolicy::Crossover => {
                let w2 =
                    weights::uniform_crossover(p1.weights2().values(), p2.weights2().values(), rng);
                child.weights2_mut().copy_from_slice(&w2);
            }
            SecondLayerPolicy::InheritFirstParent => {}
            SecondLayerPolicy::Randomize => {
                let w2 = weights::random(rng, child.weights2_mut().len());
                child.weights2_mut().copy_from_slice(&w2);
            }
        }

        weights::mutate(
            child.weights1_mut(),
            self.mutation_sigma,
            self.mutation_rate,
            rng,
        );
        if self.mutate_second_layer {
            weights::mutate(
                child.weights2_mut(),
                self.mutation_sigma,
                self.mutation_rate,
                rng,
            );
        }
        child
    }
}

/// Slot indices of `population` ordered by fitness, best first.
///
/// Ties keep slot order.
#[must_use]
pub fn rank(population: &[Agent]) -> Vec<usize> {
    let mut ranking: Vec<usize> = (0..population.len()).collect();
    ranking.sort_by(|&a, &b| population[b].fitness().total_cmp(&population[a].fitness()));
    ranking
}

/// Draws two parents from a non-empty elite, distinct whenever possible.
fn select_parents<R>(elite: &[usize], rng: &mut R) -> (usize, usize)
where
    R: Rng + ?Sized,
{
    let first = rng.random_range(0..elite.len());
    let mut second = rng.random_range(0..elite.len());
    while elite.len() > 1 && second == first {
        second = rng.random_range(0..elite.len());
    }
    (elite[first], elite[second])
}
