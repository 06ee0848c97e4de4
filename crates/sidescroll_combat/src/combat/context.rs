//! Per-tick collaborators handed to controllers, and the trait both
//! controllers share with the ECS systems.

use bevy::prelude::*;
use rand_chacha::ChaCha8Rng;

use super::arbiter::CombatArbiter;
use super::events::AnimationCue;
use crate::movement::{Mover, ObstacleQuery};

/// Everything a controller may touch outside its own entity during a tick.
pub struct CombatContext<'a> {
    pub actor: Entity,
    pub arbiter: &'a mut dyn CombatArbiter,
    pub obstacles: &'a dyn ObstacleQuery,
    pub rng: &'a mut ChaCha8Rng,
    pub cues: &'a mut Vec<AnimationCue>,
}

impl CombatContext<'_> {
    pub fn cue(&mut self, name: &'static str, duration: f32) {
        self.cues.push(AnimationCue::new(self.actor, name, duration));
    }
}

/// Shared surface of the enemy and player controllers.
pub trait CombatActor {
    fn is_in_combat(&self) -> bool;
    fn is_turn_active(&self) -> bool;
    fn state_label(&self) -> &'static str;
    fn has_active_sequence(&self) -> bool;

    /// Runs due timed steps. `real_dt` is wall-clock time.
    fn advance_sequences(
        &mut self,
        real_dt: f32,
        mover: &mut Mover,
        actor: Entity,
        cues: &mut Vec<AnimationCue>,
    );

    /// Facing toward the opponent and base loop cue.
    fn update_presentation(
        &mut self,
        mover: &mut Mover,
        opponent_x: Option<f32>,
        actor: Entity,
        cues: &mut Vec<AnimationCue>,
    );

    fn exit_combat(&mut self, mover: &mut Mover);
}
