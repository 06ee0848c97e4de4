//! Combat positioning on top of `Mover`: range checks, point-blank spots,
//! wall clamping, knockback.

use super::obstacles::{ObstacleKind, ObstacleQuery};
use super::Mover;

/// Gap kept between a collider edge and a wall.
pub const MIN_WALL_GAP: f32 = 0.2;
/// Gap between two colliders at point-blank range.
pub const MIN_APPROACH_GAP: f32 = 0.1;
pub const KNOCKBACK_SPEED: f32 = 6.0;

pub trait CombatMover {
    /// Near edge of this collider to `other`'s position is within `margin`.
    fn in_range(&self, other: &Mover, margin: f32) -> bool;

    /// Spot right in front of `self`, on `other`'s side, where `other` stands
    /// touching distance away.
    fn point_blank(&self, other: &Mover) -> f32;

    /// `target` pulled back in front of the nearest wall between `from` and it.
    fn wall_adjusted(&self, target: f32, from: f32, obstacles: &dyn ObstacleQuery) -> f32;

    fn knockback(&mut self, leftward: bool, magnitude: f32, obstacles: &dyn ObstacleQuery);
}

impl CombatMover for Mover {
    fn in_range(&self, other: &Mover, margin: f32) -> bool {
        let edge = if Mover::move_will_be_left(self.position(), other.position()) {
            self.position() - self.half_width()
        } else {
            self.position() + self.half_width()
        };
        (other.position() - edge).abs() <= margin
    }

    fn point_blank(&self, other: &Mover) -> f32 {
        let offset = self.half_width() + MIN_APPROACH_GAP + other.half_width();
        // совпадающие позиции: спот справа
        if Mover::move_will_be_left(other.position(), self.position()) {
            self.position() + offset
        } else {
            self.position() - offset
        }
    }

    fn wall_adjusted(&self, target: f32, from: f32, obstacles: &dyn ObstacleQuery) -> f32 {
        let origin = self.position();
        let leftward = Mover::move_will_be_left(from, target);
        let distance = (from - target).abs() + self.half_width();

        let nearest = obstacles
            .raycast(origin, leftward, distance)
            .into_iter()
            .filter(|hit| hit.kind == ObstacleKind::Wall)
            .min_by(|a, b| {
                (a.position - origin)
                    .abs()
                    .total_cmp(&(b.position - origin).abs())
            });

        match nearest {
            Some(hit) if leftward => hit.position + self.half_width() + MIN_WALL_GAP,
            Some(hit) => hit.position - self.half_width() - MIN_WALL_GAP,
            None => target,
        }
    }

    fn knockback(&mut self, leftward: bool, magnitude: f32, obstacles: &dyn ObstacleQuery) {
        let origin = self.position();
        let end = if leftward {
            origin - magnitude
        } else {
            origin + magnitude
        };
        let clamped = self.wall_adjusted(end, origin, obstacles);
        self.set_speed(KNOCKBACK_SPEED);
        self.move_to(clamped);
    }
}
