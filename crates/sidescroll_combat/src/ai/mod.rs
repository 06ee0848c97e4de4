//! Enemy combat AI.

use bevy::prelude::*;

pub mod config;
pub mod enemy_combat;


pub use config::EnemyCombatConfig;
pub use enemy_combat::{
    EnemyCombatController, EnemyCombatState, EnemyStep, PlayerSide, StrikePlan,
    MIN_FOLLOWTHROUGH_CUE, ROLL_CATCH_OFFSET,
};

use crate::combat::Stamina;
use crate::movement::{Mover, DEFAULT_HALF_WIDTH};

/// Spawns an enemy combatant; its spawn point becomes the respawn point.
pub fn spawn_enemy(world: &mut World, position: f32, config: EnemyCombatConfig) -> Entity {
    let mover = Mover::new(position, DEFAULT_HALF_WIDTH)
        .with_sprites_default_left(config.sprites_default_left);
    let stamina = Stamina::new(config.max_stamina);
    let mut controller = EnemyCombatController::new(config);
    controller.set_home_position(position);

    world.spawn((mover, stamina, controller)).id()
}
