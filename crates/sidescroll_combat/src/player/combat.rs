//! Player turn state machine.
//!
//! Standby → Evaluate → (Moving → Evaluate)* → AttackWindup → MoveToAttack →
//! EnemyKnockbackWait → Evaluate ... пока комбо не закончится или удар не
//! промахнётся. Вне своего хода игрок стоит в Standby и только реагирует
//! (roll, block, knockdown, см. `actions`).

use std::sync::Arc;

use bevy::prelude::*;
use rand::Rng;

use super::config::PlayerCombatConfig;
use crate::combat::damage::player_attack_damage;
use crate::combat::sequence::{windup_cue_timing, SequenceSlot, TimedSequence};
use crate::combat::{
    ActionCommandKind, ActionCommandSpec, AnimationCue, AttackDefinition, CombatActor,
    CombatArbiter, CombatContext, CombatTrigger, ComboHit, ScreenShake, TurnEndReason,
};
use crate::error::CombatError;
use crate::logger;
use crate::movement::{CombatMover, Mover};

const RUN_CUE_SPEED: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum PlayerCombatState {
    #[default]
    Standby,
    Evaluate,
    Moving,
    AttackWindup,
    MoveToAttack,
    EnemyKnockbackWait,
}

impl PlayerCombatState {
    pub fn label(self) -> &'static str {
        match self {
            PlayerCombatState::Standby => "Standby",
            PlayerCombatState::Evaluate => "Evaluate",
            PlayerCombatState::Moving => "Moving",
            PlayerCombatState::AttackWindup => "AttackWindup",
            PlayerCombatState::MoveToAttack => "MoveToAttack",
            PlayerCombatState::EnemyKnockbackWait => "EnemyKnockbackWait",
        }
    }
}

/// Renderer-facing flags (which layers are visible, whether base loops play).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationParams {
    pub lock_default_anims: bool,
    pub show_weapon: bool,
    pub show_shield: bool,
}

impl PresentationParams {
    pub const COMBAT_READY: Self = Self::new(false, true, true);
    pub const WINDUP: Self = Self::new(true, true, false);
    pub const ROLL: Self = Self::new(true, false, false);
    pub const BLOCK: Self = Self::new(true, false, true);
    pub const KNOCKDOWN: Self = Self::new(true, false, false);
    pub const DEATH: Self = Self::new(true, false, false);
    pub const OUT_OF_COMBAT: Self = Self::new(false, false, false);

    const fn new(lock_default_anims: bool, show_weapon: bool, show_shield: bool) -> Self {
        Self {
            lock_default_anims,
            show_weapon,
            show_shield,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerStep {
    WindupCue { duration: f32 },
    Strike,
    /// Back to combat-ready presentation, all locks released.
    Restore,
}

/// The targeted enemy as seen from the player's turn.
pub struct EnemySide<'a> {
    pub entity: Entity,
    pub mover: &'a mut Mover,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct PendingStrike {
    pub end: f32,
    pub speed: f32,
}

#[derive(Component, Debug)]
#[require(Mover)]
pub struct PlayerCombatController {
    pub(super) config: PlayerCombatConfig,
    pub(super) state: PlayerCombatState,
    pub(super) in_combat: bool,
    pub(super) turn_active: bool,
    pub(super) current_attack: Option<Arc<AttackDefinition>>,
    pub(super) combo_index: usize,
    pub(super) range_effectiveness: f32,
    pub(super) params: PresentationParams,
    pub(super) flip_locked: bool,
    pub(super) hard_knockdown: bool,
    pub(super) pending_strike: Option<PendingStrike>,
    pub(super) base_loop: Option<&'static str>,
    pub(super) sequences: SequenceSlot<PlayerStep>,
}

impl PlayerCombatController {
    pub fn new(config: PlayerCombatConfig) -> Self {
        Self {
            config,
            state: PlayerCombatState::Standby,
            in_combat: false,
            turn_active: false,
            current_attack: None,
            combo_index: 0,
            range_effectiveness: 1.0,
            params: PresentationParams::OUT_OF_COMBAT,
            flip_locked: false,
            hard_knockdown: false,
            pending_strike: None,
            base_loop: None,
            sequences: SequenceSlot::default(),
        }
    }

    pub fn config(&self) -> &PlayerCombatConfig {
        &self.config
    }

    pub fn state(&self) -> PlayerCombatState {
        self.state
    }

    pub fn combo_index(&self) -> usize {
        self.combo_index
    }

    pub fn current_attack(&self) -> Option<&Arc<AttackDefinition>> {
        self.current_attack.as_ref()
    }

    pub fn range_effectiveness(&self) -> f32 {
        self.range_effectiveness
    }

    pub fn presentation(&self) -> PresentationParams {
        self.params
    }

    pub fn is_flip_locked(&self) -> bool {
        self.flip_locked
    }

    pub fn in_hard_knockdown(&self) -> bool {
        self.hard_knockdown
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub fn initialize_for_combat(
        &mut self,
        actor: Entity,
        me: &mut Mover,
        arbiter: &dyn CombatArbiter,
    ) -> Result<(), CombatError> {
        arbiter
            .opponent_of(actor)
            .ok_or(CombatError::MissingCollaborator("player target"))?;
        self.config.validate()?;
        if self.config.weapon.startup_range < me.half_width() {
            return Err(CombatError::Configuration(format!(
                "weapon `{}` startup range {:.2} is shorter than the player half-width {:.2}",
                self.config.weapon.name,
                self.config.weapon.startup_range,
                me.half_width()
            )));
        }

        self.sequences.cancel();
        self.state = PlayerCombatState::Standby;
        self.in_combat = true;
        self.turn_active = false;
        self.current_attack = None;
        self.combo_index = 0;
        self.range_effectiveness = 1.0;
        self.params = PresentationParams::COMBAT_READY;
        self.flip_locked = false;
        self.hard_knockdown = false;
        self.pending_strike = None;
        self.base_loop = None;

        me.set_auto_facing_locked(true);
        me.stop();
        logger::log(&format!("⚔️ Player {:?} entered combat at {:.2}", actor, me.position()));
        Ok(())
    }

    pub fn start_turn(&mut self, arbiter: &dyn CombatArbiter) {
        if !self.in_combat {
            logger::log_warning("⚠️ start_turn on a player that is not in combat");
            return;
        }
        self.current_attack = Some(self.config.weapon.attack.clone());
        self.combo_index = 0;
        self.range_effectiveness = arbiter.range_effectiveness().clamp(0.0, 1.0);
        self.state = PlayerCombatState::Evaluate;
        self.turn_active = true;
        logger::log(&format!(
            "🎯 Player turn started (range effectiveness {:.2})",
            self.range_effectiveness
        ));
    }

    // ========================================================================
    // Turn tick
    // ========================================================================

    pub fn tick(
        &mut self,
        me: &mut Mover,
        mut enemy: EnemySide<'_>,
        ctx: &mut CombatContext<'_>,
    ) -> Result<(), CombatError> {
        if !self.in_combat || !self.turn_active {
            return Ok(());
        }

        match self.state {
            PlayerCombatState::Standby => Ok(()),
            PlayerCombatState::Evaluate => self.evaluate(me, &mut enemy, ctx),
            PlayerCombatState::Moving => {
                if self.target_in_range(me, enemy.mover) {
                    me.stop();
                    self.state = PlayerCombatState::Evaluate;
                    Ok(())
                } else if !me.is_moving() {
                    self.tick_arrived_out_of_range(me, &mut enemy, ctx)
                } else {
                    Ok(())
                }
            }
            PlayerCombatState::AttackWindup => {
                if !self.sequences.is_active() {
                    logger::log_warning("⚠️ Player windup lost its sequence, re-evaluating");
                    self.state = PlayerCombatState::Evaluate;
                }
                Ok(())
            }
            PlayerCombatState::MoveToAttack => self.tick_strike(me, &mut enemy, ctx),
            PlayerCombatState::EnemyKnockbackWait => {
                if !enemy.mover.is_moving() {
                    self.state = PlayerCombatState::Evaluate;
                }
                Ok(())
            }
        }
    }

    pub fn target_in_range(&self, me: &Mover, enemy: &Mover) -> bool {
        me.in_range(enemy, self.config.weapon.startup_range)
    }

    /// Walk ended but the edge check never passed (a step jumped over the
    /// range window). Standing on the target strikes from here, otherwise the
    /// target moved and the approach is planned again.
    fn tick_arrived_out_of_range(
        &mut self,
        me: &mut Mover,
        enemy: &mut EnemySide<'_>,
        ctx: &mut CombatContext<'_>,
    ) -> Result<(), CombatError> {
        let reach = me.half_width() + self.config.weapon.startup_range;
        let centre_gap = (enemy.mover.position() - me.position()).abs();
        if centre_gap > reach {
            self.state = PlayerCombatState::Evaluate;
            return Ok(());
        }

        let Some(attack) = self.current_attack.clone() else {
            self.state = PlayerCombatState::Evaluate;
            return Ok(());
        };
        logger::log_warning(&format!(
            "⚠️ Player overshot the range window ({:.2} from target), striking anyway",
            centre_gap
        ));
        self.launch_strike(&attack, me, enemy.mover, ctx)
    }

    fn evaluate(
        &mut self,
        me: &mut Mover,
        enemy: &mut EnemySide<'_>,
        ctx: &mut CombatContext<'_>,
    ) -> Result<(), CombatError> {
        if ctx.arbiter.combat_won() {
            self.finish_turn(ctx, TurnEndReason::Victory);
            return Ok(());
        }

        let Some(attack) = self.current_attack.clone() else {
            logger::log_warning("⚠️ Player turn without an attack, ending it");
            self.finish_turn(ctx, TurnEndReason::ComboFinished);
            return Ok(());
        };

        if self.combo_index >= attack.combo_len() {
            ctx.arbiter
                .notify_combat_event(CombatTrigger::PlayerCompletedFullCombo);
            self.finish_turn(ctx, TurnEndReason::ComboFinished);
            return Ok(());
        }

        if self.target_in_range(me, enemy.mover) {
            self.launch_strike(&attack, me, enemy.mover, ctx)
        } else {
            me.set_speed(self.config.move_speed);
            me.move_to(enemy.mover.position());
            self.state = PlayerCombatState::Moving;
            Ok(())
        }
    }

    fn launch_strike(
        &mut self,
        attack: &AttackDefinition,
        me: &mut Mover,
        enemy: &Mover,
        ctx: &mut CombatContext<'_>,
    ) -> Result<(), CombatError> {
        let hit = attack.hit(self.combo_index)?;
        let origin = me.position();
        let end = me.wall_adjusted(enemy.point_blank(me), origin, ctx.obstacles);
        let speed = self.config.move_speed * hit.speed_multiplier;

        ctx.arbiter.clear_action_command();
        ctx.arbiter.request_action_command(ActionCommandSpec {
            issuer: ctx.actor,
            kind: ActionCommandKind::PlayerPhysicalAttack,
            move_time: Mover::move_time(origin, end, speed),
            windup: hit.windup,
            defender_on_left: Mover::move_will_be_left(origin, enemy.position()),
            hidden_time: hit.hidden_time,
            direction: hit.direction,
        });

        self.params = PresentationParams::WINDUP;
        self.flip_locked = true;
        self.pending_strike = Some(PendingStrike { end, speed });

        let (cue_delay, cue_duration) = windup_cue_timing(hit.windup);
        self.sequences.start(
            TimedSequence::new("player_windup")
                .then_at(
                    cue_delay,
                    PlayerStep::WindupCue {
                        duration: cue_duration,
                    },
                )
                .then_at(hit.windup, PlayerStep::Strike),
        );
        self.state = PlayerCombatState::AttackWindup;

        logger::log(&format!(
            "⚡ Player winds up {} #{} ({:.2} → {:.2})",
            attack.name, self.combo_index, origin, end
        ));
        Ok(())
    }

    fn release_strike(&mut self, me: &mut Mover, actor: Entity, cues: &mut Vec<AnimationCue>) {
        if self.state != PlayerCombatState::AttackWindup {
            return;
        }
        let Some(strike) = self.pending_strike.take() else {
            logger::log_warning("⚠️ Player windup finished without a strike");
            self.state = PlayerCombatState::Evaluate;
            return;
        };

        me.set_speed(strike.speed);
        me.move_to(strike.end);
        cues.push(AnimationCue::new(actor, "attack", me.time_remaining()));
        self.state = PlayerCombatState::MoveToAttack;
    }

    fn tick_strike(
        &mut self,
        me: &mut Mover,
        enemy: &mut EnemySide<'_>,
        ctx: &mut CombatContext<'_>,
    ) -> Result<(), CombatError> {
        if me.is_moving() {
            return Ok(());
        }

        self.sequences.start(
            TimedSequence::new("player_followthrough")
                .then_at(self.config.followthrough_settle, PlayerStep::Restore),
        );

        let result = ctx.arbiter.last_action_command();
        if !result.success {
            ctx.arbiter
                .notify_combat_event(CombatTrigger::PlayerMissedAttack);
            self.finish_turn(ctx, TurnEndReason::AttackMissed);
            return Ok(());
        }

        let Some(attack) = self.current_attack.clone() else {
            self.finish_turn(ctx, TurnEndReason::ComboFinished);
            return Ok(());
        };
        let hit = attack.hit(self.combo_index)?;
        self.strike_enemy(hit, result.success_rate, me, enemy, ctx);
        self.combo_index += 1;

        self.state = if ctx.arbiter.combat_won() {
            PlayerCombatState::Evaluate
        } else {
            PlayerCombatState::EnemyKnockbackWait
        };
        Ok(())
    }

    fn strike_enemy(
        &self,
        hit: &ComboHit,
        success_rate: f32,
        me: &Mover,
        enemy: &mut EnemySide<'_>,
        ctx: &mut CombatContext<'_>,
    ) {
        let enemy_left = Mover::move_will_be_left(me.position(), enemy.mover.position());
        enemy
            .mover
            .knockback(enemy_left, self.config.enemy_knockback, ctx.obstacles);

        let jitter: i32 = ctx.rng.gen_range(-1..1);
        let amount = player_attack_damage(
            self.config.weapon.base_damage,
            hit.damage_multiplier,
            self.range_effectiveness,
            success_rate,
            jitter,
        );
        ctx.arbiter.change_health(enemy.entity, -amount);
        ctx.arbiter.report_screen_shake(ScreenShake::Light);

        logger::log(&format!(
            "🗡️ Player hit {:?} for {} ({:.0}%)",
            enemy.entity, amount, success_rate
        ));
    }

    fn finish_turn(&mut self, ctx: &mut CombatContext<'_>, reason: TurnEndReason) {
        self.turn_active = false;
        self.state = PlayerCombatState::Standby;
        self.pending_strike = None;
        ctx.arbiter.notify_turn_ended(ctx.actor, reason);
        logger::log(&format!("🏁 Player turn ended: {:?}", reason));
    }
}

impl CombatActor for PlayerCombatController {
    fn is_in_combat(&self) -> bool {
        self.in_combat
    }

    fn is_turn_active(&self) -> bool {
        self.turn_active
    }

    fn state_label(&self) -> &'static str {
        self.state.label()
    }

    fn has_active_sequence(&self) -> bool {
        self.sequences.is_active()
    }

    fn advance_sequences(
        &mut self,
        real_dt: f32,
        mover: &mut Mover,
        actor: Entity,
        cues: &mut Vec<AnimationCue>,
    ) {
        for (id, step) in self.sequences.advance(real_dt) {
            if !self.sequences.is_current(id) {
                continue;
            }
            match step {
                PlayerStep::WindupCue { duration } => {
                    cues.push(AnimationCue::new(actor, "windup", duration));
                }
                PlayerStep::Strike => self.release_strike(mover, actor, cues),
                PlayerStep::Restore => self.restore_defaults(),
            }
        }
    }

    fn update_presentation(
        &mut self,
        mover: &mut Mover,
        opponent_x: Option<f32>,
        actor: Entity,
        cues: &mut Vec<AnimationCue>,
    ) {
        if !self.in_combat {
            return;
        }
        if !self.flip_locked {
            if let Some(x) = opponent_x {
                mover.face_toward(x);
            }
        }

        if self.params.lock_default_anims {
            self.base_loop = None;
            return;
        }
        let wanted = if mover.velocity().abs() > RUN_CUE_SPEED {
            "combat_run"
        } else {
            "combat_idle"
        };
        if self.base_loop != Some(wanted) {
            self.base_loop = Some(wanted);
            cues.push(AnimationCue::looping(actor, wanted));
        }
    }

    fn exit_combat(&mut self, mover: &mut Mover) {
        self.sequences.cancel();
        self.state = PlayerCombatState::Standby;
        self.in_combat = false;
        self.turn_active = false;
        self.current_attack = None;
        self.combo_index = 0;
        self.pending_strike = None;
        self.hard_knockdown = false;
        self.flip_locked = false;
        self.base_loop = None;
        self.params = PresentationParams::OUT_OF_COMBAT;
        mover.set_auto_facing_locked(false);
        mover.stop();
        logger::log("🚪 Player left combat");
    }
}
