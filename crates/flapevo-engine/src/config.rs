use serde::{Deserialize, Serialize};

use crate::SensorSet;

/// Every constant the simulation step reads.
///
/// The defaults reproduce the original side-scroller: an 800×600 screen,
/// three obstacles 300 px apart with 200 px gaps, gravity 0.75 px/tick² and a
/// flap impulse of -9 px/tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub physics: PhysicsConfig,
    pub obstacles: ObstacleConfig,
    pub spawn: SpawnConfig,
    pub rewards: RewardConfig,
    pub sensors: SensorSet,
}

/// Screen geometry and per-tick motion constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub screen_width: f32,
    pub screen_height: f32,
    /// Added to an agent's velocity each tick while it is below `max_fall_speed`.
    pub gravity: f32,
    /// Velocity assigned on a flap (negative is upwards).
    pub flap_velocity: f32,
    /// Gravity stops accelerating an agent once its velocity reaches this value.
    pub max_fall_speed: f32,
    /// Leftward obstacle displacement per tick.
    pub scroll_speed: f32,
    /// Agents die once `y >= screen_height + floor_margin`.
    pub floor_margin: f32,
    /// Tick rate the physics constants were tuned for; only used to report elapsed time.
    pub ticks_per_second: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            screen_width: 800.0,
            screen_height: 600.0,
            gravity: 0.75,
            flap_velocity: -9.0,
            max_fall_speed: 7.5,
            scroll_speed: 1.5,
            floor_margin: 15.0,
            ticks_per_second: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    /// Number of obstacles alive at any time.
    pub count: usize,
    pub width: f32,
    /// Vertical size of the passage.
    pub gap_height: f32,
    /// Horizontal distance between consecutive obstacles.
    pub spacing: f32,
    /// `x` of the first obstacle in the canonical layout.
    pub first_x: f32,
    /// Minimum distance kept between the gap and the top/bottom of the screen.
    pub gap_margin: f32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            count: 3,
            width: 70.0,
            gap_height: 200.0,
            spacing: 300.0,
            first_x: 500.0,
            gap_margin: 50.0,
        }
    }
}

/// Where and how large agents are when a generation starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub x: f32,
    pub y: f32,
    /// Agent radius.
    pub size: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            x: 30.0,
            y: 300.0,
            size: 20.0,
        }
    }
}

/// Fitness shaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Added every tick an agent stays alive.
    pub survival_reward: f32,
    /// Added once per obstacle an agent gets past.
    pub pass_reward: f32,
    /// Subtracted when an agent leaves the screen vertically.
    pub boundary_penalty: f32,
    /// On obstacle collision, `scale * |y - gap_center|` is subtracted.
    pub collision_penalty_scale: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            survival_reward: 0.5,
            pass_reward: 100.0,
            boundary_penalty: 50.0,
            collision_penalty_scale: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: WorldConfig =
            serde_json::from_str(r#"{"physics":{"gravity":0.5},"sensors":"relative"}"#).unwrap();
        assert_eq!(config.physics.gravity, 0.5);
        assert_eq!(config.physics.screen_height, 600.0);
        assert_eq!(config.obstacles, ObstacleConfig::default());
        assert_eq!(config.sensors, SensorSet::Relative);
    }
}
