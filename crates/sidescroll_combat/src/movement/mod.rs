//! Movement domain: point-to-point motion on the world axis.
//!
//! `Mover` хранит позицию, цель и скорость; интеграция идёт в FixedUpdate.
//! Контроллеры только задают цели (`move_to`, `stop`, knockback) и читают
//! состояние, сами позицию не двигают.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::logger;

pub mod combat_mover;
pub mod obstacles;

pub use combat_mover::{CombatMover, KNOCKBACK_SPEED, MIN_APPROACH_GAP, MIN_WALL_GAP};
pub use obstacles::{NoObstacles, Obstacle, ObstacleHit, ObstacleKind, ObstacleQuery, Obstacles};

/// Distance below which a move counts as already complete.
const ARRIVAL_EPSILON: f32 = 1e-4;

/// Default collider half-width for combatants.
pub const DEFAULT_HALF_WIDTH: f32 = 0.5;

/// Ordering label for movement integration inside FixedUpdate.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Mover integration
    Movement,
    /// Turn state machines (read integrated positions)
    Turns,
}

/// Movement plugin
pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Mover>()
            .configure_sets(
                FixedUpdate,
                (SimulationSet::Movement, SimulationSet::Turns).chain(),
            )
            .add_systems(FixedUpdate, integrate_movers.in_set(SimulationSet::Movement));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn from_leftward(leftward: bool) -> Self {
        if leftward {
            Facing::Left
        } else {
            Facing::Right
        }
    }

    pub fn is_left(self) -> bool {
        self == Facing::Left
    }
}

/// 1D mover: position, target, speed, facing.
///
/// Direction of a move is fixed when it is issued (`move_to`), and arrival is
/// detected by reaching or crossing the target, after which the mover snaps
/// exactly onto it.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Mover {
    position: f32,
    speed: f32,
    velocity: f32,
    target: f32,
    start: f32,
    moving: bool,
    moving_left: bool,
    half_width: f32,
    facing: Facing,
    auto_facing_locked: bool,
    sprites_default_left: bool,
}

impl Default for Mover {
    fn default() -> Self {
        Self::new(0.0, DEFAULT_HALF_WIDTH)
    }
}

impl Mover {
    pub fn new(position: f32, half_width: f32) -> Self {
        Self {
            position,
            speed: 0.0,
            velocity: 0.0,
            target: position,
            start: position,
            moving: false,
            moving_left: false,
            half_width: half_width.max(0.0),
            facing: Facing::Right,
            auto_facing_locked: false,
            sprites_default_left: false,
        }
    }

    /// Sprite art drawn facing left (flip rules invert).
    pub fn with_sprites_default_left(mut self, default_left: bool) -> Self {
        self.sprites_default_left = default_left;
        self
    }

    /// `start >= end` counts as leftward (zero-length moves included).
    pub fn move_will_be_left(start: f32, end: f32) -> bool {
        start >= end
    }

    pub fn within(position: f32, left: f32, right: f32) -> bool {
        position >= left && position <= right
    }

    /// Travel time for a move at `speed` (0 when the move cannot run).
    pub fn move_time(start: f32, end: f32, speed: f32) -> f32 {
        if speed <= 0.0 {
            return 0.0;
        }
        (end - start).abs() / speed
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn move_start(&self) -> f32 {
        self.start
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn is_moving_left(&self) -> bool {
        self.moving_left
    }

    pub fn half_width(&self) -> f32 {
        self.half_width
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn is_auto_facing_locked(&self) -> bool {
        self.auto_facing_locked
    }

    /// Whether the renderer should mirror the sprite for the current facing.
    pub fn sprite_flipped(&self) -> bool {
        self.facing.is_left() != self.sprites_default_left
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn move_to(&mut self, x: f32) {
        self.moving_left = self.position > x;
        self.start = self.position;
        self.target = x;
        self.moving = true;

        if (x - self.position).abs() <= ARRIVAL_EPSILON {
            self.position = x;
            self.stop();
            return;
        }

        if self.speed <= 0.0 {
            logger::log_warning(&format!(
                "⚠️ move_to({:.2}) with speed {:.2}: snapping to target",
                x, self.speed
            ));
            self.position = x;
            self.stop();
            return;
        }

        let direction = if self.moving_left { -1.0 } else { 1.0 };
        self.velocity = direction * self.speed;
        self.apply_auto_facing();
    }

    /// Stops in place. The start-of-move position is kept for cost accounting.
    pub fn stop(&mut self) {
        self.target = self.position;
        self.moving = false;
        self.velocity = 0.0;
    }

    /// Moves to `x` instantly (respawn, setup).
    pub fn teleport(&mut self, x: f32) {
        self.position = x;
        self.start = x;
        self.stop();
    }

    pub fn tick(&mut self, dt: f32) {
        if !self.moving {
            return;
        }

        let remaining = (self.target - self.position).abs();
        let step = self.speed * dt.max(0.0);
        if remaining <= step + ARRIVAL_EPSILON || self.crossed_target() {
            self.position = self.target;
            self.stop();
            return;
        }

        let direction = if self.moving_left { -1.0 } else { 1.0 };
        self.velocity = direction * self.speed;
        self.position += direction * step;
        self.apply_auto_facing();
    }

    /// Full duration of the current move, measured from its start.
    pub fn time_remaining(&self) -> f32 {
        if !self.moving {
            return 0.0;
        }
        Self::move_time(self.start, self.target, self.speed)
    }

    pub fn face(&mut self, facing: Facing) {
        self.facing = facing;
    }

    pub fn face_toward(&mut self, x: f32) {
        self.facing = Facing::from_leftward(Self::move_will_be_left(self.position, x));
    }

    pub fn set_auto_facing_locked(&mut self, locked: bool) {
        self.auto_facing_locked = locked;
    }

    fn crossed_target(&self) -> bool {
        if self.moving_left {
            self.position < self.target
        } else {
            self.position > self.target
        }
    }

    fn apply_auto_facing(&mut self) {
        if !self.auto_facing_locked && self.velocity != 0.0 {
            self.facing = Facing::from_leftward(self.velocity < 0.0);
        }
    }
}

/// System: integrate every moving Mover with the fixed timestep.
pub fn integrate_movers(mut movers: Query<&mut Mover>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for mut mover in movers.iter_mut() {
        if mover.is_moving() {
            mover.tick(delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_snaps_to_target() {
        let mut mover = Mover::new(0.0, 0.5);
        mover.set_speed(4.0);
        mover.move_to(1.0);

        assert!(mover.is_moving());
        assert!((mover.time_remaining() - 0.25).abs() < 1e-6);

        mover.tick(0.1);
        assert!((mover.position() - 0.4).abs() < 1e-5);
        assert_eq!(mover.velocity(), 4.0);

        mover.tick(0.1);
        mover.tick(0.1);
        assert_eq!(mover.position(), 1.0);
        assert!(!mover.is_moving());
        assert_eq!(mover.velocity(), 0.0);
        assert_eq!(mover.time_remaining(), 0.0);
    }

    #[test]
    fn test_zero_length_move_resolves_immediately() {
        let mut mover = Mover::new(2.0, 0.5);
        mover.set_speed(3.0);
        mover.move_to(2.0);

        assert!(!mover.is_moving());
        assert_eq!(mover.target(), 2.0);
        assert_eq!(mover.move_start(), 2.0);
    }

    #[test]
    fn test_non_positive_speed_snaps() {
        let mut mover = Mover::new(0.0, 0.5);
        mover.move_to(-3.0);

        assert!(!mover.is_moving());
        assert_eq!(mover.position(), -3.0);
    }

    #[test]
    fn test_stop_keeps_move_start() {
        let mut mover = Mover::new(5.0, 0.5);
        mover.set_speed(2.0);
        mover.move_to(0.0);
        mover.tick(0.5);
        mover.stop();

        assert_eq!(mover.move_start(), 5.0);
        assert_eq!(mover.target(), mover.position());
        assert!((mover.position() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_facing_follows_velocity_unless_locked() {
        let mut mover = Mover::new(0.0, 0.5).with_sprites_default_left(true);
        mover.set_speed(1.0);
        mover.move_to(-2.0);
        assert_eq!(mover.facing(), Facing::Left);
        // спрайт нарисован влево: при взгляде влево не зеркалим
        assert!(!mover.sprite_flipped());

        mover.set_auto_facing_locked(true);
        mover.move_to(3.0);
        mover.tick(0.1);
        assert_eq!(mover.facing(), Facing::Left);

        mover.face_toward(10.0);
        assert_eq!(mover.facing(), Facing::Right);
        assert!(mover.sprite_flipped());
    }

    #[test]
    fn test_move_will_be_left_includes_zero_length() {
        assert!(Mover::move_will_be_left(1.0, 1.0));
        assert!(Mover::move_will_be_left(2.0, 1.0));
        assert!(!Mover::move_will_be_left(1.0, 2.0));
        assert!(Mover::within(1.0, 0.0, 1.0));
        assert!(!Mover::within(1.1, 0.0, 1.0));
    }
}
