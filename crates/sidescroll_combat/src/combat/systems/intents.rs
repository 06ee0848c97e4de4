//! Intent handlers (Update): combat entry/exit, turn start, roll, counter.

use bevy::ecs::error::BevyError;
use bevy::prelude::*;

use crate::ai::EnemyCombatController;
use crate::combat::{
    AnimationCue, CombatActor, CombatArbiter, CombatContext, CounterIntent, EnterCombat, Evasion,
    EvasionPerformed, LeaveCombat, RollIntent, Stamina, StartTurn,
};
use crate::error::CombatError;
use crate::movement::{Mover, Obstacles};
use crate::player::PlayerCombatController;
use crate::{logger, DeterministicRng};

/// System: initialize every combatant. Fails fast when the arbiter or an
/// opponent is not wired up.
pub fn handle_enter_combat<A: CombatArbiter + Resource>(
    mut events: EventReader<EnterCombat>,
    arbiter: Option<Res<A>>,
    mut enemies: Query<
        (Entity, &mut EnemyCombatController, &mut Mover, &mut Stamina),
        Without<PlayerCombatController>,
    >,
    mut players: Query<
        (Entity, &mut PlayerCombatController, &mut Mover),
        Without<EnemyCombatController>,
    >,
) -> Result<(), BevyError> {
    if events.is_empty() {
        return Ok(());
    }
    events.clear();

    let Some(arbiter) = arbiter else {
        return Err(CombatError::MissingCollaborator("combat arbiter").into());
    };

    for (entity, mut enemy, mut mover, mut stamina) in enemies.iter_mut() {
        enemy.initialize_for_combat(entity, &mut mover, &mut stamina, &*arbiter)?;
    }
    for (entity, mut player, mut mover) in players.iter_mut() {
        player.initialize_for_combat(entity, &mut mover, &*arbiter)?;
    }

    logger::log_info("⚔️ Combat started");
    Ok(())
}

pub fn handle_leave_combat(
    mut events: EventReader<LeaveCombat>,
    mut enemies: Query<(&mut EnemyCombatController, &mut Mover), Without<PlayerCombatController>>,
    mut players: Query<(&mut PlayerCombatController, &mut Mover), Without<EnemyCombatController>>,
) {
    if events.is_empty() {
        return;
    }
    events.clear();

    for (mut enemy, mut mover) in enemies.iter_mut() {
        enemy.exit_combat(&mut mover);
    }
    for (mut player, mut mover) in players.iter_mut() {
        player.exit_combat(&mut mover);
    }
    logger::log_info("🏳️ Combat ended");
}

pub fn handle_start_turn<A: CombatArbiter + Resource>(
    mut events: EventReader<StartTurn>,
    arbiter: Res<A>,
    mut enemies: Query<(&mut EnemyCombatController, &mut Stamina), Without<PlayerCombatController>>,
    mut players: Query<&mut PlayerCombatController, Without<EnemyCombatController>>,
) {
    for event in events.read() {
        if let Ok((mut enemy, mut stamina)) = enemies.get_mut(event.actor) {
            enemy.start_turn(&mut stamina);
        } else if let Ok(mut player) = players.get_mut(event.actor) {
            player.start_turn(&*arbiter);
        } else {
            logger::log_warning(&format!("⚠️ StartTurn for non-combatant {:?}", event.actor));
        }
    }
}

/// System: perform rolls and announce where they stop.
pub fn handle_roll_intents<A: CombatArbiter + Resource>(
    mut intents: EventReader<RollIntent>,
    mut players: Query<(&mut PlayerCombatController, &mut Mover), Without<EnemyCombatController>>,
    mut arbiter: ResMut<A>,
    obstacles: Res<Obstacles>,
    mut rng: ResMut<DeterministicRng>,
    mut evasions: EventWriter<EvasionPerformed>,
    mut cue_events: EventWriter<AnimationCue>,
) {
    let mut cues = Vec::new();

    for intent in intents.read() {
        let Ok((mut player, mut mover)) = players.get_mut(intent.actor) else {
            logger::log_warning(&format!("⚠️ RollIntent for non-player {:?}", intent.actor));
            continue;
        };

        let mut ctx = CombatContext {
            actor: intent.actor,
            arbiter: &mut *arbiter,
            obstacles: &*obstacles,
            rng: &mut rng.rng,
            cues: &mut cues,
        };
        if let Some(evasion) = player.roll(&mut mover, intent.leftward, intent.success_rate, &mut ctx)
        {
            evasions.write(EvasionPerformed {
                evader: intent.actor,
                stop_position: evasion.stop_position,
                leftward: evasion.leftward,
            });
        }
    }

    cue_events.write_batch(cues);
}

/// System: let the active attacker re-aim at a roll's stop point.
pub fn apply_roll_catch(
    mut evasions: EventReader<EvasionPerformed>,
    mut enemies: Query<(&mut EnemyCombatController, &mut Mover), Without<PlayerCombatController>>,
    obstacles: Res<Obstacles>,
) {
    for event in evasions.read() {
        let evasion = Evasion {
            stop_position: event.stop_position,
            leftward: event.leftward,
        };
        for (mut enemy, mut mover) in enemies.iter_mut() {
            if enemy.is_turn_active() {
                enemy.adjust_to_evasion(&mut mover, evasion, &*obstacles);
            }
        }
    }
}

pub fn handle_counter_intents(
    mut intents: EventReader<CounterIntent>,
    mut players: Query<&mut PlayerCombatController>,
) {
    for intent in intents.read() {
        match players.get_mut(intent.actor) {
            Ok(mut player) => player.start_counter(),
            Err(_) => {
                logger::log_warning(&format!("⚠️ CounterIntent for non-player {:?}", intent.actor))
            }
        }
    }
}
