//! Real-time sequences and presentation cues (Update).

use bevy::prelude::*;

use crate::ai::EnemyCombatController;
use crate::combat::{AnimationCue, CombatActor, CombatArbiter};
use crate::movement::Mover;
use crate::player::PlayerCombatController;

/// System: advance timed sub-sequences by wall-clock time.
pub fn run_timed_sequences(
    time: Res<Time<Real>>,
    mut enemies: Query<
        (Entity, &mut EnemyCombatController, &mut Mover),
        Without<PlayerCombatController>,
    >,
    mut players: Query<
        (Entity, &mut PlayerCombatController, &mut Mover),
        Without<EnemyCombatController>,
    >,
    mut cue_events: EventWriter<AnimationCue>,
) {
    let real_dt = time.delta_secs();
    let mut cues = Vec::new();

    for (entity, mut enemy, mut mover) in enemies.iter_mut() {
        advance_actor(&mut *enemy, &mut mover, entity, real_dt, &mut cues);
    }
    for (entity, mut player, mut mover) in players.iter_mut() {
        advance_actor(&mut *player, &mut mover, entity, real_dt, &mut cues);
    }

    cue_events.write_batch(cues);
}

fn advance_actor<C: CombatActor>(
    actor: &mut C,
    mover: &mut Mover,
    entity: Entity,
    real_dt: f32,
    cues: &mut Vec<AnimationCue>,
) {
    if actor.has_active_sequence() {
        actor.advance_sequences(real_dt, mover, entity, cues);
    }
}

/// System: face opponents and keep base loops (idle / run) playing.
pub fn update_combat_presentation<A: CombatArbiter + Resource>(
    arbiter: Res<A>,
    mut enemies: Query<
        (Entity, &mut EnemyCombatController, &mut Mover),
        Without<PlayerCombatController>,
    >,
    mut players: Query<
        (Entity, &mut PlayerCombatController, &mut Mover),
        Without<EnemyCombatController>,
    >,
    mut cue_events: EventWriter<AnimationCue>,
) {
    let player_x = players.iter().next().map(|(_, _, mover)| mover.position());
    let enemy_positions: Vec<(Entity, f32)> = enemies
        .iter()
        .map(|(entity, _, mover)| (entity, mover.position()))
        .collect();

    let mut cues = Vec::new();
    for (entity, mut enemy, mut mover) in enemies.iter_mut() {
        enemy.update_presentation(&mut mover, player_x, entity, &mut cues);
    }
    for (entity, mut player, mut mover) in players.iter_mut() {
        let opponent_x = arbiter.opponent_of(entity).and_then(|target| {
            enemy_positions
                .iter()
                .find(|(enemy, _)| *enemy == target)
                .map(|(_, x)| *x)
        });
        player.update_presentation(&mut mover, opponent_x, entity, &mut cues);
    }

    cue_events.write_batch(cues);
}
