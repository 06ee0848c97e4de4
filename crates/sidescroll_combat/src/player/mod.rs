//! Player combat: turn state machine, reactions, weapon config.

use bevy::prelude::*;

pub mod actions;
pub mod combat;
pub mod config;


pub use actions::COUNTER_RANGE_EFFECTIVENESS;
pub use combat::{
    EnemySide, PlayerCombatController, PlayerCombatState, PlayerStep, PresentationParams,
};
pub use config::{PlayerCombatConfig, Weapon};

use crate::movement::{Mover, DEFAULT_HALF_WIDTH};

/// Spawns the player combatant.
pub fn spawn_player(world: &mut World, position: f32, config: PlayerCombatConfig) -> Entity {
    let mover = Mover::new(position, DEFAULT_HALF_WIDTH)
        .with_sprites_default_left(config.sprites_default_left);

    world
        .spawn((mover, PlayerCombatController::new(config)))
        .id()
}
