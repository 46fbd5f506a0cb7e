use std::collections::VecDeque;

use rand::Rng;
use serde::Serialize;

use crate::{Agent, ObstacleConfig, PhysicsConfig};

/// A vertical wall with a single passage.
///
/// The blocked regions are `[0, gap_top)` and `(gap_bottom, screen_height]`;
/// the passage spans `gap_top..=gap_bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Obstacle {
    pub(crate) serial: u64,
    pub(crate) x: f32,
    pub(crate) gap_top: f32,
    pub(crate) width: f32,
    pub(crate) gap_height: f32,
}

impl Obstacle {
    /// Identifier that grows every time an obstacle is spawned or recycled.
    #[must_use]
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Left edge.
    #[must_use]
    pub fn x(&self) -> f32 {
        self.x
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Right edge.
    #[must_use]
    pub fn trailing_edge(&self) -> f32 {
        self.x + self.width
    }

    #[must_use]
    pub fn gap_top(&self) -> f32 {
        self.gap_top
    }

    #[must_use]
    pub fn gap_bottom(&self) -> f32 {
        self.gap_top + self.gap_height
    }

    #[must_use]
    pub fn gap_center(&self) -> f32 {
        self.gap_top + self.gap_height / 2.0
    }

    #[must_use]
    pub fn overlaps_horizontally(&self, agent: &Agent) -> bool {
        agent.leading_edge() > self.x && agent.trailing_edge() < self.trailing_edge()
    }

    /// `true` if the agent overlaps the obstacle horizontally and reaches into
    /// the blocked region above or below the gap.
    #[must_use]
    pub fn collides_with(&self, agent: &Agent) -> bool {
        self.overlaps_horizontally(agent)
            && (agent.top() < self.gap_top || agent.bottom() > self.gap_bottom())
    }
}

/// Fixed-size queue of obstacles scrolling from right to left.
///
/// Obstacles are ordered by `x`; the front of the queue is the leftmost one.
/// Once the front obstacle has scrolled completely off screen it is moved to
/// the back with a fresh gap, so the field never grows or shrinks.
#[derive(Debug, Clone)]
pub struct ObstacleField {
    config: ObstacleConfig,
    screen_width: f32,
    screen_height: f32,
    obstacles: VecDeque<Obstacle>,
    next_serial: u64,
}

impl ObstacleField {
    /// Creates a field in its canonical layout.
    pub fn new<R>(config: &ObstacleConfig, physics: &PhysicsConfig, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut field = Self {
            config: config.clone(),
            screen_width: physics.screen_width,
            screen_height: physics.screen_height,
            obstacles: VecDeque::with_capacity(config.count),
            next_serial: 0,
        };
        field.reset(rng);
        field
    }

    /// Restores the canonical layout: `count` obstacles spaced evenly from
    /// `first_x`, each with a freshly drawn gap.
    pub fn reset<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        self.obstacles.clear();
        let mut x = self.config.first_x;
        for _ in 0..self.config.count {
            let obstacle = self.make_obstacle(x, rng);
            self.obstacles.push_back(obstacle);
            x += self.config.spacing;
        }
    }

    /// Scrolls every obstacle left by `distance` and recycles the ones that
    /// left the screen. Returns the number of recycled obstacles.
    pub fn advance<R>(&mut self, distance: f32, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        for obstacle in &mut self.obstacles {
            obstacle.x -= distance;
        }

        let mut recycled = 0;
        while self
            .obstacles
            .front()
            .is_some_and(|o| o.x < -self.config.width)
        {
            self.obstacles.pop_front();
            let x = self.obstacles.back().map_or(self.screen_width, |last| {
                f32::max(self.screen_width, last.x + self.config.spacing)
            });
            let obstacle = self.make_obstacle(x, rng);
            tracing::debug!(serial = obstacle.serial, x, gap_top = obstacle.gap_top, "obstacle recycled");
            self.obstacles.push_back(obstacle);
            recycled += 1;
            // a single obstacle would otherwise be recycled forever
            if recycled == self.obstacles.len() {
                break;
            }
        }
        recycled
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Obstacle> + '_ {
        self.obstacles.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// First obstacle whose trailing edge is still to the right of `x`.
    #[must_use]
    pub fn nearest_ahead(&self, x: f32) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.trailing_edge() > x)
    }

    /// Range `gap_top` is drawn from.
    #[must_use]
    pub fn gap_top_range(&self) -> (f32, f32) {
        let low = self.config.gap_margin;
        let high = self.screen_height - self.config.gap_height - self.config.gap_margin;
        (low, high)
    }

    fn make_obstacle<R>(&mut self, x: f32, rng: &mut R) -> Obstacle
    where
        R: Rng + ?Sized,
    {
        let (low, high) = self.gap_top_range();
        let gap_top = if high > low {
            rng.random_range(low..=high)
        } else {
            low
        };
        let serial = self.next_serial;
        self.next_serial += 1;
        Obstacle {
            serial,
            x,
            gap_top,
            width: self.config.width,
            gap_height: self.config.gap_height,
        }
    }

    #[cfg(test)]
    pub(crate) fn obstacles_mut(&mut self) -> &mut VecDeque<Obstacle> {
        &mut self.obstacles
    }
}
