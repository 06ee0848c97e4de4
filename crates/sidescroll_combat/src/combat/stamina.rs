//! Stamina: budget for moving and attacking during a turn.
//!
//! Ходьба стоит `STAMINA_SCALE` за единицу расстояния, удар: процент от max.
//! Регенерации нет: stamina восполняется целиком в начале хода.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Stamina per unit of distance walked.
pub const STAMINA_SCALE: f32 = 3.0;

/// Below this the turn ends.
pub const EXHAUSTION_EPSILON: f32 = 0.1;

pub fn movement_cost(distance: f32) -> f32 {
    distance.abs() * STAMINA_SCALE
}

/// Farthest distance the remaining stamina pays for.
pub fn max_move_distance(stamina: f32) -> f32 {
    stamina.max(0.0) / STAMINA_SCALE
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct Stamina {
    pub current: f32,
    pub max: f32,
}

impl Default for Stamina {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Stamina {
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self { current: max, max }
    }

    /// Current stamina as a percentage of max (0 when max is 0).
    pub fn percent(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        self.current / self.max * 100.0
    }

    pub fn can_afford_percent(&self, cost_percent: f32) -> bool {
        self.percent() >= cost_percent
    }

    /// Removes up to `amount`, never going below zero. Returns what was drained.
    pub fn drain(&mut self, amount: f32) -> f32 {
        let drained = amount.max(0.0).min(self.current);
        self.current -= drained;
        drained
    }

    pub fn drain_percent(&mut self, percent: f32) -> f32 {
        self.drain(self.max * percent / 100.0)
    }

    pub fn refill(&mut self) {
        self.current = self.max;
    }

    pub fn set_max(&mut self, max: f32) {
        self.max = max.max(0.0);
        self.current = self.current.min(self.max);
    }

    pub fn is_exhausted(&self) -> bool {
        self.current <= EXHAUSTION_EPSILON
    }
}
