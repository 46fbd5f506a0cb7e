use flapevo_network::NeuralNetwork;
use serde::Serialize;

use crate::{PhysicsConfig, SpawnConfig};

/// Why an agent stopped participating in the current generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display, derive_more::IsVariant)]
pub enum DeathCause {
    /// Flew above the top of the screen.
    #[display("ceiling")]
    Ceiling,
    /// Fell below the bottom of the screen.
    #[display("floor")]
    Floor,
    /// Hit an obstacle outside its gap.
    #[display("obstacle")]
    Obstacle,
    /// Still alive when the generation was cut off.
    #[display("timeout")]
    Timeout,
}

/// A simulated flyer: a circle with vertical motion and its own network.
///
/// Agents never move horizontally; obstacles scroll towards them instead.
#[derive(Debug, Clone)]
pub struct Agent {
    x: f32,
    y: f32,
    velocity: f32,
    size: f32,
    fitness: f32,
    death: Option<DeathCause>,
    obstacles_passed: usize,
    last_credited: Option<u64>,
    network: NeuralNetwork,
}

impl Agent {
    /// Creates a live agent at the spawn point with zero velocity and fitness.
    #[must_use]
    pub fn spawn(network: NeuralNetwork, spawn: &SpawnConfig) -> Self {
        Self {
            x: spawn.x,
            y: spawn.y,
            velocity: 0.0,
            size: spawn.size,
            fitness: 0.0,
            death: None,
            obstacles_passed: 0,
            last_credited: None,
            network,
        }
    }

    /// Puts the agent back at the spawn point with a new network.
    ///
    /// The previous network is dropped. Fitness is kept when `keep_fitness`
    /// is set, otherwise it restarts at zero.
    pub fn respawn(&mut self, network: NeuralNetwork, spawn: &SpawnConfig, keep_fitness: bool) {
        let fitness = if keep_fitness { self.fitness } else { 0.0 };
        *self = Self {
            fitness,
            ..Self::spawn(network, spawn)
        };
    }

    #[must_use]
    pub fn x(&self) -> f32 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> f32 {
        self.y
    }

    #[must_use]
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Radius.
    #[must_use]
    pub fn size(&self) -> f32 {
        self.size
    }

    #[must_use]
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.death.is_none()
    }

    #[must_use]
    pub fn death_cause(&self) -> Option<DeathCause> {
        self.death
    }

    /// Obstacles credited to this agent since it last spawned.
    #[must_use]
    pub fn obstacles_passed(&self) -> usize {
        self.obstacles_passed
    }

    #[must_use]
    pub fn network(&self) -> &NeuralNetwork {
        &self.network
    }

    /// Rightmost point of the agent.
    #[must_use]
    pub fn leading_edge(&self) -> f32 {
        self.x + self.size
    }

    /// Leftmost point of the agent.
    #[must_use]
    pub fn trailing_edge(&self) -> f32 {
        self.x - self.size
    }

    #[must_use]
    pub fn top(&self) -> f32 {
        self.y - self.size
    }

    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.size
    }

    pub fn add_fitness(&mut self, amount: f32) {
        self.fitness += amount;
    }

    /// Moves by the current velocity, then applies gravity unless already at
    /// terminal speed. Upward speed is never capped.
    pub(crate) fn integrate(&mut self, physics: &PhysicsConfig) {
        self.y += self.velocity;
        if self.velocity < physics.max_fall_speed {
            self.velocity += physics.gravity;
        }
    }

    pub(crate) fn flap(&mut self, velocity: f32) {
        self.velocity = velocity;
    }

    /// Marks the agent dead and subtracts `penalty` from its fitness.
    ///
    /// Returns `false` and changes nothing if the agent was already dead.
    pub fn kill(&mut self, cause: DeathCause, penalty: f32) -> bool {
        if self.death.is_some() {
            return false;
        }
        self.death = Some(cause);
        self.fitness -= penalty;
        true
    }

    /// Credits the obstacle with the given serial, unless it (or a newer one)
    /// has already been credited.
    pub(crate) fn credit_passage(&mut self, serial: u64, reward: f32) -> bool {
        if self.last_credited.is_some_and(|last| last >= serial) {
            return false;
        }
        self.last_credited = Some(serial);
        self.obstacles_passed += 1;
        self.fitness += reward;
        true
    }
}

#[cfg(test)]
mod tests {
    use flapevo_network::{Matrix, Topology};

    use super::*;

    fn agent() -> Agent {
        let topology = Topology::new(1, 1, 1).unwrap();
        let network = NeuralNetwork::from_weights(
            topology,
            Matrix::from_fn(1, 1, |_, _| 0.0),
            Matrix::from_fn(1, 1, |_, _| 0.0),
        )
        .unwrap();
        Agent::spawn(network, &SpawnConfig::default())
    }

    #[test]
    fn test_spawn_defaults() {
        let agent = agent();
        assert_eq!((agent.x(), agent.y()), (30.0, 300.0));
        assert_eq!(agent.velocity(), 0.0);
        assert_eq!(agent.size(), 20.0);
        assert!(agent.is_alive());
        assert_eq!(agent.leading_edge(), 50.0);
        assert_eq!(agent.trailing_edge(), 10.0);
    }

    #[test]
    fn test_integrate_caps_fall_speed_only() {
        let physics = PhysicsConfig::default();
        let mut agent = agent();
        for _ in 0..100 {
            agent.integrate(&physics);
        }
        assert_eq!(agent.velocity(), physics.max_fall_speed);

        agent.flap(physics.flap_velocity);
        agent.integrate(&physics);
        assert_eq!(agent.velocity(), physics.flap_velocity + physics.gravity);
    }

    #[test]
    fn test_kill_is_idempotent() {
        let mut agent = agent();
        assert!(agent.kill(DeathCause::Floor, 50.0));
        assert!(!agent.kill(DeathCause::Obstacle, 50.0));
        assert_eq!(agent.fitness(), -50.0);
        assert_eq!(agent.death_cause(), Some(DeathCause::Floor));
    }

    #[test]
    fn test_credit_passage_once_per_obstacle() {
        let mut agent = agent();
        assert!(agent.credit_passage(4, 100.0));
        assert!(!agent.credit_passage(4, 100.0));
        assert!(!agent.credit_passage(3, 100.0));
        assert!(agent.credit_passage(5, 100.0));
        assert_eq!(agent.obstacles_passed(), 2);
        assert_eq!(agent.fitness(), 200.0);
    }

    #[test]
    fn test_respawn_fitness_policy() {
        let spawn = SpawnConfig::default();
        let mut agent = agent();
        agent.add_fitness(12.5);
        agent.kill(DeathCause::Ceiling, 2.5);

        let network = agent.network().clone();
        agent.respawn(network.clone(), &spawn, true);
        assert!(agent.is_alive());
        assert_eq!(agent.fitness(), 10.0);
        assert_eq!(agent.obstacles_passed(), 0);

        agent.respawn(network, &spawn, false);
        assert_eq!(agent.fitness(), 0.0);
        assert_eq!(agent.y(), spawn.y);
    }
}
