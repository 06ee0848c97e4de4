//! Turn ticks (FixedUpdate, after mover integration).

use bevy::prelude::*;

use crate::ai::{EnemyCombatController, PlayerSide};
use crate::combat::{AnimationCue, CombatActor, CombatArbiter, CombatContext, Stamina};
use crate::movement::{Mover, Obstacles};
use crate::player::{EnemySide, PlayerCombatController};
use crate::{logger, DeterministicRng};

/// System: tick every turn-active enemy against the player.
pub fn enemy_turn_tick<A: CombatArbiter + Resource>(
    mut enemies: Query<
        (Entity, &mut EnemyCombatController, &mut Mover, &mut Stamina),
        Without<PlayerCombatController>,
    >,
    mut players: Query<
        (Entity, &mut PlayerCombatController, &mut Mover),
        Without<EnemyCombatController>,
    >,
    mut arbiter: ResMut<A>,
    obstacles: Res<Obstacles>,
    mut rng: ResMut<DeterministicRng>,
    mut cue_events: EventWriter<AnimationCue>,
) {
    let Ok((player_entity, mut player_combat, mut player_mover)) = players.single_mut() else {
        return;
    };

    let mut cues = Vec::new();
    for (entity, mut enemy, mut mover, mut stamina) in enemies.iter_mut() {
        if !enemy.is_turn_active() {
            continue;
        }

        let mut ctx = CombatContext {
            actor: entity,
            arbiter: &mut *arbiter,
            obstacles: &*obstacles,
            rng: &mut rng.rng,
            cues: &mut cues,
        };
        let player = PlayerSide {
            entity: player_entity,
            mover: &mut *player_mover,
            combat: &mut *player_combat,
        };

        if let Err(err) = enemy.tick(&mut mover, &mut stamina, player, &mut ctx) {
            logger::log_error(&format!("❌ Enemy {:?} turn tick failed: {}", entity, err));
        }
    }

    cue_events.write_batch(cues);
}

/// System: tick the turn-active player against its current target.
pub fn player_turn_tick<A: CombatArbiter + Resource>(
    mut players: Query<
        (Entity, &mut PlayerCombatController, &mut Mover),
        Without<EnemyCombatController>,
    >,
    mut enemies: Query<&mut Mover, (With<EnemyCombatController>, Without<PlayerCombatController>)>,
    mut arbiter: ResMut<A>,
    obstacles: Res<Obstacles>,
    mut rng: ResMut<DeterministicRng>,
    mut cue_events: EventWriter<AnimationCue>,
) {
    let mut cues = Vec::new();

    for (entity, mut player, mut mover) in players.iter_mut() {
        if !player.is_turn_active() {
            continue;
        }

        let Some(target) = arbiter.opponent_of(entity) else {
            logger::log_warning("⚠️ Player turn without a target");
            continue;
        };
        let Ok(mut enemy_mover) = enemies.get_mut(target) else {
            logger::log_warning(&format!("⚠️ Player target {:?} has no mover", target));
            continue;
        };

        let mut ctx = CombatContext {
            actor: entity,
            arbiter: &mut *arbiter,
            obstacles: &*obstacles,
            rng: &mut rng.rng,
            cues: &mut cues,
        };
        let enemy = EnemySide {
            entity: target,
            mover: &mut *enemy_mover,
        };

        if let Err(err) = player.tick(&mut mover, enemy, &mut ctx) {
            logger::log_error(&format!("❌ Player turn tick failed: {}", err));
        }
    }

    cue_events.write_batch(cues);
}
