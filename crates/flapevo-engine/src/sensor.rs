use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::{Agent, Obstacle, PhysicsConfig};

/// Upper bound on the number of features any [`SensorSet`] produces.
pub const MAX_SENSORS: usize = 5;

/// Feature vector fed to an agent's network.
pub type Sensors = ArrayVec<f32, MAX_SENSORS>;

/// Which environment features an agent perceives.
///
/// | Feature | `Full` | `Relative` |
/// |---------|:------:|:----------:|
/// | vertical velocity | ✓ | ✓ |
/// | horizontal distance to the nearest obstacle | ✓ | ✓ |
/// | `gap_top - y` | ✓ | ✓ |
/// | `gap_bottom - y` | ✓ | ✓ |
/// | absolute height `y` | ✓ | |
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorSet {
    #[default]
    Full,
    Relative,
}

impl SensorSet {
    /// Number of features produced, i.e. the network input size this set requires.
    #[must_use]
    pub const fn count(self) -> usize {
        match self {
            Self::Full => 5,
            Self::Relative => 4,
        }
    }

    /// Builds the feature vector for `agent` looking at `obstacle`.
    ///
    /// Without an obstacle ahead the agent sees a passage spanning the whole
    /// screen at the right boundary.
    #[must_use]
    pub fn sense(self, agent: &Agent, obstacle: Option<&Obstacle>, physics: &PhysicsConfig) -> Sensors {
        let (obstacle_x, gap_top, gap_bottom) = obstacle.map_or(
            (physics.screen_width, 0.0, physics.screen_height),
            |o| (o.x(), o.gap_top(), o.gap_bottom()),
        );

        let mut sensors = Sensors::new();
        sensors.push(agent.velocity());
        sensors.push(obstacle_x - agent.x());
        sensors.push(gap_top - agent.y());
        sensors.push(gap_bottom - agent.y());
        if self == Self::Full {
            sensors.push(agent.y());
        }
        debug_assert_eq!(sensors.len(), self.count());
        sensors
    }
}

#[cfg(test)]
mod tests {
    use flapevo_network::{Matrix, NeuralNetwork, Topology};
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::{ObstacleConfig, ObstacleField, SpawnConfig};

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
    fn test_full_and_relative() {
        let physics = PhysicsConfig::default();
        let field = ObstacleField::new(
            &ObstacleConfig::default(),
            &physics,
            &mut Pcg32::seed_from_u64(2),
        );
        let obstacle = field.iter().next().unwrap();
        let agent = agent();

        let full = SensorSet::Full.sense(&agent, Some(obstacle), &physics);
        assert_eq!(full.len(), SensorSet::Full.count());
        assert_eq!(full[0], 0.0);
        assert_eq!(full[1], 470.0);
        assert_eq!(full[2], obstacle.gap_top() - 300.0);
        assert_eq!(full[3], obstacle.gap_bottom() - 300.0);
        assert_eq!(full[4], 300.0);

        let relative = SensorSet::Relative.sense(&agent, Some(obstacle), &physics);
        assert_eq!(relative.as_slice(), &full[..4]);
    }

    #[test]
    fn test_no_obstacle_sees_open_screen() {
        let physics = PhysicsConfig::default();
        let sensors = SensorSet::Relative.sense(&agent(), None, &physics);
        assert_eq!(sensors.as_slice(), &[0.0, 770.0, -300.0, 300.0]);
    }
}
