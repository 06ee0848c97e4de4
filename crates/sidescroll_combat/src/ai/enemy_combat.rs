//! Enemy turn state machine.
//!
//! Evaluate → (Moving → Evaluate)* → AttackWindup → MovingToAttack →
//! PlayerKnockbackWait → Evaluate → ... пока stamina не кончится или arbiter
//! не заберёт ход (контратака, смерть игрока, побег).
//!
//! Windup и followthrough идут через `SequenceSlot` в реальном времени;
//! остальное тикает вместе с движением.

use std::sync::Arc;

use bevy::prelude::*;
use rand_chacha::ChaCha8Rng;

use super::config::EnemyCombatConfig;
use crate::combat::damage::{self, enemy_hit_damage, GUARD_BREAK_DAMAGE_MULTIPLIER};
use crate::combat::sequence::{windup_cue_timing, SequenceSlot, TimedSequence};
use crate::combat::stamina::{max_move_distance, movement_cost};
use crate::combat::{
    pick_weighted, ActionCommandKind, ActionCommandResult, ActionCommandSpec, AnimationCue,
    ApproachStyle, AttackDefinition, CombatActor, CombatArbiter, CombatContext, CombatTrigger,
    ComboHit, DefensiveResponse, Evasion, ScreenShake, Stamina, StatusType, TurnEndReason,
};
use crate::error::CombatError;
use crate::logger;
use crate::movement::{CombatMover, Mover, ObstacleQuery};
use crate::player::PlayerCombatController;

/// How far in front of a caught evader the strike lands.
pub const ROLL_CATCH_OFFSET: f32 = 1.0;
pub const MIN_FOLLOWTHROUGH_CUE: f32 = 0.2;
/// Extra distance planned past the exact range boundary.
const APPROACH_SLACK: f32 = 0.05;
const RUN_CUE_SPEED: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum EnemyCombatState {
    #[default]
    Evaluate,
    Moving,
    AttackWindup,
    MovingToAttack,
    PlayerKnockbackWait,
}

impl EnemyCombatState {
    pub fn label(self) -> &'static str {
        match self {
            EnemyCombatState::Evaluate => "Evaluate",
            EnemyCombatState::Moving => "Moving",
            EnemyCombatState::AttackWindup => "AttackWindup",
            EnemyCombatState::MovingToAttack => "MovingToAttack",
            EnemyCombatState::PlayerKnockbackWait => "PlayerKnockbackWait",
        }
    }
}

/// Strike geometry fixed at windup launch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrikePlan {
    pub left_bound: f32,
    pub right_bound: f32,
    pub start: f32,
    pub end: f32,
    pub leftward: bool,
    pub speed: f32,
    pub opponent_in_range: bool,
    /// Re-aimed at a caught evader.
    pub redirected: bool,
}

impl StrikePlan {
    pub fn contains(&self, x: f32) -> bool {
        Mover::within(x, self.left_bound, self.right_bound)
    }

    /// Corridor end in the direction of travel.
    pub fn far_bound(&self) -> f32 {
        if self.leftward {
            self.left_bound
        } else {
            self.right_bound
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyStep {
    WindupCue { duration: f32 },
    Strike,
    ReleaseLocks,
}

/// The player as seen from an enemy turn.
pub struct PlayerSide<'a> {
    pub entity: Entity,
    pub mover: &'a mut Mover,
    pub combat: &'a mut PlayerCombatController,
}

enum Readiness {
    Ready,
    OutOfStamina,
    OutOfPosition,
}

#[derive(Component, Debug)]
#[require(Mover, Stamina)]
pub struct EnemyCombatController {
    config: EnemyCombatConfig,
    state: EnemyCombatState,
    in_combat: bool,
    turn_active: bool,
    current_attack: Option<Arc<AttackDefinition>>,
    combo_index: usize,
    /// Committed since the current attack was picked (across turns): walked
    /// plus wall-clamped distance.
    distance_traveled: f32,
    current_move_distance: f32,
    /// Cost of the move in progress, charged on stop.
    current_move_cost: f32,
    strike: Option<StrikePlan>,
    anim_locked: bool,
    flip_locked: bool,
    base_loop: Option<&'static str>,
    home_position: Option<f32>,
    sequences: SequenceSlot<EnemyStep>,
}

impl EnemyCombatController {
    pub fn new(config: EnemyCombatConfig) -> Self {
        Self {
            config,
            state: EnemyCombatState::Evaluate,
            in_combat: false,
            turn_active: false,
            current_attack: None,
            combo_index: 0,
            distance_traveled: 0.0,
            current_move_distance: 0.0,
            current_move_cost: 0.0,
            strike: None,
            anim_locked: false,
            flip_locked: false,
            base_loop: None,
            home_position: None,
            sequences: SequenceSlot::default(),
        }
    }

    pub fn config(&self) -> &EnemyCombatConfig {
        &self.config
    }

    pub fn state(&self) -> EnemyCombatState {
        self.state
    }

    pub fn combo_index(&self) -> usize {
        self.combo_index
    }

    pub fn current_attack(&self) -> Option<&Arc<AttackDefinition>> {
        self.current_attack.as_ref()
    }

    pub fn strike_plan(&self) -> Option<&StrikePlan> {
        self.strike.as_ref()
    }

    pub fn distance_traveled(&self) -> f32 {
        self.distance_traveled
    }

    pub fn is_anim_locked(&self) -> bool {
        self.anim_locked
    }

    pub fn is_flip_locked(&self) -> bool {
        self.flip_locked
    }

    pub fn home_position(&self) -> Option<f32> {
        self.home_position
    }

    pub fn set_home_position(&mut self, x: f32) {
        self.home_position = Some(x);
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub fn initialize_for_combat(
        &mut self,
        actor: Entity,
        me: &mut Mover,
        stamina: &mut Stamina,
        arbiter: &dyn CombatArbiter,
    ) -> Result<(), CombatError> {
        arbiter
            .opponent_of(actor)
            .ok_or(CombatError::MissingCollaborator("enemy opponent"))?;
        self.config.validate()?;

        if self.home_position.is_none() {
            self.home_position = Some(me.position());
        }
        self.reset_turn_state();
        self.in_combat = true;

        stamina.set_max(self.config.max_stamina);
        stamina.refill();
        me.set_speed(self.config.move_speed);
        me.set_auto_facing_locked(true);
        me.stop();

        logger::log(&format!(
            "⚔️ Enemy {:?} entered combat at {:.2}",
            actor,
            me.position()
        ));
        Ok(())
    }

    pub fn start_turn(&mut self, stamina: &mut Stamina) {
        if !self.in_combat {
            logger::log_warning("⚠️ start_turn on an enemy that is not in combat");
            return;
        }
        stamina.refill();
        self.state = EnemyCombatState::Evaluate;
        self.turn_active = true;
        // пройденное копится до смены атаки, между ходами не сбрасываем
        self.current_move_distance = self.distance_traveled;
        self.current_move_cost = 0.0;
        logger::log(&format!(
            "🎯 Enemy turn started (stamina {:.1})",
            stamina.current
        ));
    }

    /// Overrides the next attack (scripted fights, tutorials).
    pub fn pick_specific_attack(&mut self, attack: Arc<AttackDefinition>) -> Result<(), CombatError> {
        attack.validate()?;
        logger::log(&format!("🗡️ Enemy attack forced: {}", attack.name));
        self.current_attack = Some(attack);
        self.reset_attack_progress();
        Ok(())
    }

    /// Back to the spawn point, out of combat, stamina full.
    pub fn respawn(&mut self, me: &mut Mover, stamina: &mut Stamina) {
        if let Some(home) = self.home_position {
            me.teleport(home);
        }
        stamina.refill();
        self.reset_turn_state();
        self.in_combat = false;
        me.set_auto_facing_locked(false);
    }

    pub fn on_defeated(&mut self, actor: Entity, me: &mut Mover, cues: &mut Vec<AnimationCue>) {
        self.reset_turn_state();
        self.in_combat = false;
        me.stop();
        cues.push(AnimationCue::looping(actor, "death"));
        logger::log_info(&format!("💀 Enemy {:?} defeated", actor));
    }

    /// Tutorial rewind: stamina back, turn dropped, still in combat.
    pub fn tutorial_reset(&mut self, me: &mut Mover, stamina: &mut Stamina) {
        stamina.refill();
        self.reset_turn_state();
        me.stop();
    }

    fn reset_turn_state(&mut self) {
        self.sequences.cancel();
        self.state = EnemyCombatState::Evaluate;
        self.turn_active = false;
        self.current_attack = None;
        self.reset_attack_progress();
        self.strike = None;
        self.anim_locked = false;
        self.flip_locked = false;
        self.base_loop = None;
    }

    fn reset_attack_progress(&mut self) {
        self.combo_index = 0;
        self.distance_traveled = 0.0;
        self.current_move_distance = 0.0;
        self.current_move_cost = 0.0;
    }

    // ========================================================================
    // Turn tick
    // ========================================================================

    pub fn tick(
        &mut self,
        me: &mut Mover,
        stamina: &mut Stamina,
        mut player: PlayerSide<'_>,
        ctx: &mut CombatContext<'_>,
    ) -> Result<(), CombatError> {
        if !self.in_combat || !self.turn_active {
            return Ok(());
        }

        match self.state {
            EnemyCombatState::Evaluate => self.evaluate(me, stamina, &mut player, ctx),
            EnemyCombatState::Moving => self.tick_moving(me, stamina, player.mover),
            EnemyCombatState::AttackWindup => {
                if !self.sequences.is_active() {
                    logger::log_warning("⚠️ Enemy windup lost its sequence, re-evaluating");
                    self.state = EnemyCombatState::Evaluate;
                }
                Ok(())
            }
            EnemyCombatState::MovingToAttack => self.tick_strike(me, &mut player, ctx),
            EnemyCombatState::PlayerKnockbackWait => {
                if !player.mover.is_moving() && !player.combat.in_hard_knockdown() {
                    self.state = EnemyCombatState::Evaluate;
                }
                Ok(())
            }
        }
    }

    /// Whether the current combo step could launch right now.
    pub fn can_attack(
        &self,
        me: &Mover,
        stamina: &Stamina,
        opponent: &Mover,
    ) -> Result<bool, CombatError> {
        let Some(attack) = &self.current_attack else {
            return Ok(false);
        };
        let hit = attack.hit(self.combo_index)?;
        Ok(matches!(
            self.readiness(attack, hit, me, stamina, opponent),
            Readiness::Ready
        ))
    }

    fn evaluate(
        &mut self,
        me: &mut Mover,
        stamina: &mut Stamina,
        player: &mut PlayerSide<'_>,
        ctx: &mut CombatContext<'_>,
    ) -> Result<(), CombatError> {
        if let Some(reason) = interrupt_reason(&*ctx.arbiter) {
            self.yield_turn(ctx, reason);
            return Ok(());
        }
        if stamina.is_exhausted() {
            self.end_turn(ctx, TurnEndReason::StaminaExhausted);
            return Ok(());
        }

        let attack = self.resolve_attack(ctx.rng)?;
        let hit = attack.hit(self.combo_index)?;

        match self.readiness(&attack, hit, me, stamina, player.mover) {
            Readiness::Ready => self.launch_strike(&attack, me, stamina, player.mover, ctx),
            Readiness::OutOfStamina => {
                logger::log(&format!(
                    "😮‍💨 Enemy can't pay {:.0}% for {} ({:.0}% left)",
                    hit.stamina_cost_percent,
                    attack.name,
                    stamina.percent()
                ));
                self.end_turn(ctx, TurnEndReason::StaminaExhausted);
                Ok(())
            }
            Readiness::OutOfPosition => {
                self.reposition(&attack, hit, me, stamina, player.mover, ctx.obstacles);
                Ok(())
            }
        }
    }

    fn readiness(
        &self,
        attack: &AttackDefinition,
        hit: &ComboHit,
        me: &Mover,
        stamina: &Stamina,
        opponent: &Mover,
    ) -> Readiness {
        if !stamina.can_afford_percent(hit.stamina_cost_percent) {
            return Readiness::OutOfStamina;
        }
        let positioned = match attack.approach {
            ApproachStyle::Chase => me.in_range(opponent, hit.range),
            ApproachStyle::Retreat {
                distance_requirement,
            } => self.current_move_distance >= distance_requirement,
        };
        if positioned {
            Readiness::Ready
        } else {
            Readiness::OutOfPosition
        }
    }

    /// Current attack, or a fresh weighted pick if there is none or its combo
    /// is used up.
    fn resolve_attack(&mut self, rng: &mut ChaCha8Rng) -> Result<Arc<AttackDefinition>, CombatError> {
        if let Some(attack) = &self.current_attack {
            if self.combo_index < attack.combo_len() {
                return Ok(attack.clone());
            }
            logger::log(&format!("🔁 Combo {} finished, picking again", attack.name));
        }

        self.current_attack = None;
        self.reset_attack_progress();
        let attack = pick_weighted(&self.config.attack_options, rng)?;
        logger::log(&format!(
            "🗡️ Enemy picked {} ({} hits)",
            attack.name,
            attack.combo_len()
        ));
        self.current_attack = Some(attack.clone());
        Ok(attack)
    }

    fn advance_combo(&mut self, rng: &mut ChaCha8Rng) -> Result<(), CombatError> {
        self.combo_index += 1;
        let exhausted = self
            .current_attack
            .as_ref()
            .map_or(true, |attack| self.combo_index >= attack.combo_len());
        if exhausted {
            self.resolve_attack(rng)?;
        }
        Ok(())
    }

    // ========================================================================
    // Movement
    // ========================================================================

    /// Where this move should end, before wall clamping.
    fn approach_target(
        &self,
        attack: &AttackDefinition,
        hit: &ComboHit,
        me: &Mover,
        stamina: &Stamina,
        opponent: &Mover,
    ) -> f32 {
        let origin = me.position();
        let reach = max_move_distance(stamina.current);
        let opponent_left = Mover::move_will_be_left(origin, opponent.position());

        match attack.approach {
            ApproachStyle::Chase => {
                let edge_gap = (opponent.position() - origin).abs() - me.half_width();
                let step = ((edge_gap - hit.range).max(0.0) + APPROACH_SLACK).min(reach);
                if opponent_left {
                    origin - step
                } else {
                    origin + step
                }
            }
            ApproachStyle::Retreat {
                distance_requirement,
            } => {
                let missing = (distance_requirement - self.current_move_distance).max(0.0);
                let step = (missing + APPROACH_SLACK).min(reach);
                if opponent_left {
                    origin + step
                } else {
                    origin - step
                }
            }
        }
    }

    fn reposition(
        &mut self,
        attack: &AttackDefinition,
        hit: &ComboHit,
        me: &mut Mover,
        stamina: &mut Stamina,
        opponent: &Mover,
        obstacles: &dyn ObstacleQuery,
    ) {
        let origin = me.position();
        let planned = self.approach_target(attack, hit, me, stamina, opponent);
        let adjusted = me.wall_adjusted(planned, origin, obstacles);

        // упёрлись в стену: недошедшее расстояние списываем и засчитываем
        let lost = (planned - adjusted).abs();
        if lost > f32::EPSILON {
            stamina.drain(movement_cost(lost));
            self.distance_traveled += lost;
            logger::log(&format!(
                "🧱 Enemy move clamped {:.2} → {:.2} (lost {:.2})",
                planned, adjusted, lost
            ));
        }

        me.set_speed(self.config.move_speed);
        me.move_to(adjusted);
        self.current_move_cost = 0.0;
        self.current_move_distance = self.distance_traveled;
        self.state = EnemyCombatState::Moving;
    }

    fn tick_moving(
        &mut self,
        me: &mut Mover,
        stamina: &mut Stamina,
        opponent: &Mover,
    ) -> Result<(), CombatError> {
        let moved = (me.move_start() - me.position()).abs();
        self.current_move_cost = movement_cost(moved);
        self.current_move_distance = self.distance_traveled + moved;

        if !me.is_moving() {
            self.commit_move(stamina);
            return Ok(());
        }

        let ready = match &self.current_attack {
            Some(attack) => {
                let hit = attack.hit(self.combo_index)?;
                matches!(
                    self.readiness(attack, hit, me, stamina, opponent),
                    Readiness::Ready
                )
            }
            None => true,
        };
        if ready {
            me.stop();
            self.commit_move(stamina);
        }
        Ok(())
    }

    fn commit_move(&mut self, stamina: &mut Stamina) {
        stamina.drain(self.current_move_cost);
        self.distance_traveled = self.current_move_distance;
        self.current_move_cost = 0.0;
        self.state = EnemyCombatState::Evaluate;
    }

    // ========================================================================
    // Strike
    // ========================================================================

    fn launch_strike(
        &mut self,
        attack: &AttackDefinition,
        me: &mut Mover,
        stamina: &mut Stamina,
        opponent: &Mover,
        ctx: &mut CombatContext<'_>,
    ) -> Result<(), CombatError> {
        let hit = attack.hit(self.combo_index)?;
        ctx.arbiter.clear_action_command();
        stamina.drain_percent(hit.stamina_cost_percent);

        let origin = me.position();
        let leftward = Mover::move_will_be_left(origin, opponent.position());
        let opponent_in_range = match attack.approach {
            ApproachStyle::Chase => true,
            ApproachStyle::Retreat { .. } => me.in_range(opponent, hit.range),
        };
        let end = if opponent_in_range {
            opponent.point_blank(me)
        } else if leftward {
            origin - hit.range
        } else {
            origin + hit.range
        };
        let end = me.wall_adjusted(end, origin, ctx.obstacles);

        let (left_bound, right_bound) = if leftward {
            (origin - hit.range, origin)
        } else {
            (origin, origin + hit.range)
        };
        let plan = StrikePlan {
            left_bound,
            right_bound,
            start: origin,
            end,
            leftward,
            speed: hit.speed_multiplier * self.config.move_speed,
            opponent_in_range,
            redirected: false,
        };
        self.strike = Some(plan);

        if opponent_in_range {
            let kind = if hit.is_heavy() {
                ActionCommandKind::EnemyHeavyAttack
            } else {
                ActionCommandKind::EnemyStandardAttack
            };
            ctx.arbiter.request_action_command(ActionCommandSpec {
                issuer: ctx.actor,
                kind,
                move_time: Mover::move_time(origin, end, plan.speed),
                windup: hit.windup,
                defender_on_left: leftward,
                hidden_time: hit.hidden_time,
                direction: hit.direction,
            });
        }

        self.anim_locked = true;
        self.flip_locked = true;
        let (cue_delay, cue_duration) = windup_cue_timing(hit.windup);
        self.sequences.start(
            TimedSequence::new("enemy_windup")
                .then_at(
                    cue_delay,
                    EnemyStep::WindupCue {
                        duration: cue_duration,
                    },
                )
                .then_at(hit.windup, EnemyStep::Strike),
        );
        self.state = EnemyCombatState::AttackWindup;

        logger::log(&format!(
            "⚡ Enemy winds up {} #{} ({:.2} → {:.2}, in range: {})",
            attack.name, self.combo_index, origin, end, opponent_in_range
        ));
        Ok(())
    }

    fn release_strike(&mut self, me: &mut Mover, actor: Entity, cues: &mut Vec<AnimationCue>) {
        if self.state != EnemyCombatState::AttackWindup {
            return;
        }
        let Some(plan) = self.strike else {
            logger::log_warning("⚠️ Enemy windup finished without a strike plan");
            self.state = EnemyCombatState::Evaluate;
            return;
        };

        me.set_speed(plan.speed);
        me.move_to(plan.end);
        self.state = EnemyCombatState::MovingToAttack;

        let followthrough = me.time_remaining().max(MIN_FOLLOWTHROUGH_CUE);
        cues.push(AnimationCue::new(actor, "followthrough", followthrough));
        self.sequences.start(
            TimedSequence::new("enemy_followthrough").then_at(followthrough, EnemyStep::ReleaseLocks),
        );
    }

    fn tick_strike(
        &mut self,
        me: &mut Mover,
        player: &mut PlayerSide<'_>,
        ctx: &mut CombatContext<'_>,
    ) -> Result<(), CombatError> {
        if me.is_moving() {
            return Ok(());
        }

        let (Some(attack), Some(plan)) = (self.current_attack.clone(), self.strike) else {
            logger::log_warning("⚠️ Enemy strike arrived without attack data");
            self.state = EnemyCombatState::Evaluate;
            return Ok(());
        };

        if plan.opponent_in_range {
            let hit = attack.hit(self.combo_index)?;
            self.resolve_hit(hit, &plan, me, player, ctx);
        } else {
            logger::log("💨 Enemy strike whiffed (opponent out of range)");
        }

        self.strike = None;
        self.advance_combo(ctx.rng)?;
        self.state = EnemyCombatState::PlayerKnockbackWait;
        Ok(())
    }

    /// Re-aims a planned or in-flight strike after the player rolls.
    ///
    /// Returns the new endpoint, or `None` when no strike is pending.
    pub fn adjust_to_evasion(
        &mut self,
        me: &mut Mover,
        evasion: Evasion,
        obstacles: &dyn ObstacleQuery,
    ) -> Option<f32> {
        if !self.turn_active {
            return None;
        }
        let in_flight = match self.state {
            EnemyCombatState::AttackWindup => false,
            EnemyCombatState::MovingToAttack => true,
            _ => return None,
        };
        let plan = self.strike.as_mut()?;

        let caught = plan.contains(evasion.stop_position) && plan.leftward == evasion.leftward;
        let target = if !caught {
            plan.far_bound()
        } else if plan.leftward {
            evasion.stop_position + ROLL_CATCH_OFFSET
        } else {
            evasion.stop_position - ROLL_CATCH_OFFSET
        };
        let end = me.wall_adjusted(target, plan.start, obstacles);

        plan.end = end;
        plan.redirected = caught;
        if in_flight {
            me.move_to(end);
        }

        logger::log(&format!(
            "🔀 Enemy strike re-aimed to {:.2} (roll stop {:.2}, caught: {})",
            end, evasion.stop_position, caught
        ));
        Some(end)
    }

    // ========================================================================
    // Hit resolution
    // ========================================================================

    fn resolve_hit(
        &self,
        hit: &ComboHit,
        plan: &StrikePlan,
        me: &Mover,
        player: &mut PlayerSide<'_>,
        ctx: &mut CombatContext<'_>,
    ) {
        let result = ctx.arbiter.last_action_command();
        let player_left = Mover::move_will_be_left(me.position(), player.mover.position());

        if result.success && !plan.redirected {
            match result.response {
                DefensiveResponse::Blocked => self.resolve_block(hit, &result, player_left, player, ctx),
                DefensiveResponse::Evaded => logger::log("💨 Player evaded the strike"),
                DefensiveResponse::None => self.damage_player(hit, 1.0, player_left, player, ctx),
            }
        } else {
            self.damage_player(hit, 1.0, player_left, player, ctx);
        }
    }

    fn resolve_block(
        &self,
        hit: &ComboHit,
        result: &ActionCommandResult,
        player_left: bool,
        player: &mut PlayerSide<'_>,
        ctx: &mut CombatContext<'_>,
    ) {
        let base_fill = ctx.arbiter.block_counter_fill();
        let defender_stamina = ctx.arbiter.player_stamina();
        let arbiter = &*ctx.arbiter;
        let resolution = damage::resolve_block(
            self.config.stamina_damage,
            hit.block_damage_multiplier,
            result,
            base_fill,
            defender_stamina,
            |fill| arbiter.counter_would_trigger(fill),
        );

        if resolution.guard_break {
            logger::log(&format!(
                "💥 Guard broken ({:.1} stamina vs {:.1} damage)",
                defender_stamina, resolution.stamina_damage
            ));
            ctx.arbiter.change_stamina(-defender_stamina);
            ctx.arbiter.notify_combat_event(CombatTrigger::GuardBroken);
            self.damage_player(hit, GUARD_BREAK_DAMAGE_MULTIPLIER, player_left, player, ctx);
            return;
        }

        player.mover.knockback(
            player_left,
            hit.knockback * resolution.knockback_scale,
            ctx.obstacles,
        );
        player.combat.play_block(player.entity, ctx.cues);
        ctx.arbiter.change_stamina(-resolution.stamina_damage);
        ctx.arbiter.fill_counter_meter(resolution.counter_fill);
        ctx.arbiter.report_screen_shake(ScreenShake::Light);
        self.deal_status(
            &hit.through_block_statuses,
            self.config.status_damage_through_block,
            ctx,
        );
        ctx.arbiter.notify_combat_event(CombatTrigger::AttackBlocked);

        logger::log(&format!(
            "🛡️ Blocked: -{:.1} stamina, counter +{:.1}{}",
            resolution.stamina_damage,
            resolution.counter_fill,
            if result.perfect { " (perfect)" } else { "" }
        ));
    }

    fn damage_player(
        &self,
        hit: &ComboHit,
        extra_multiplier: f32,
        player_left: bool,
        player: &mut PlayerSide<'_>,
        ctx: &mut CombatContext<'_>,
    ) {
        let (knockback_multiplier, shake) = if hit.is_heavy() {
            (2.0, ScreenShake::Heavy)
        } else {
            (1.0, ScreenShake::Medium)
        };

        player.mover.knockback(
            player_left,
            hit.knockback * knockback_multiplier,
            ctx.obstacles,
        );
        let amount = enemy_hit_damage(self.config.physical_damage, hit.damage_multiplier, extra_multiplier);
        ctx.arbiter.change_health(player.entity, -amount);
        ctx.arbiter.report_screen_shake(shake);

        if hit.is_heavy() {
            player
                .combat
                .trigger_hard_knockdown(player.mover, player.entity, ctx.cues);
        }
        self.deal_status(&hit.statuses, self.config.status_damage, ctx);

        logger::log(&format!("🩸 Player hit for {} damage", amount));
    }

    fn deal_status(&self, statuses: &[StatusType], amount: f32, ctx: &mut CombatContext<'_>) {
        for status in statuses {
            ctx.arbiter.report_status_damage(*status, amount);
        }
    }

    // ========================================================================
    // Turn hand-off
    // ========================================================================

    /// Normal end of turn (stamina spent).
    fn end_turn(&mut self, ctx: &mut CombatContext<'_>, reason: TurnEndReason) {
        self.turn_active = false;
        self.state = EnemyCombatState::Evaluate;
        ctx.arbiter.notify_turn_ended(ctx.actor, reason);
        ctx.arbiter.notify_combat_event(CombatTrigger::EnemyTurnEnded);
        logger::log(&format!("🏁 Enemy turn ended: {:?}", reason));
    }

    /// Arbiter took the turn away.
    fn yield_turn(&mut self, ctx: &mut CombatContext<'_>, reason: TurnEndReason) {
        self.turn_active = false;
        self.state = EnemyCombatState::Evaluate;
        ctx.arbiter.notify_turn_ended(ctx.actor, reason);
        logger::log(&format!("⏸️ Enemy yields turn: {:?}", reason));
    }
}

fn interrupt_reason(arbiter: &dyn CombatArbiter) -> Option<TurnEndReason> {
    if arbiter.counter_activated() {
        Some(TurnEndReason::CounterActivated)
    } else if arbiter.player_dead() {
        Some(TurnEndReason::PlayerDefeated)
    } else if arbiter.player_out_of_bounds() {
        Some(TurnEndReason::PlayerEscaped)
    } else {
        None
    }
}

impl CombatActor for EnemyCombatController {
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
                EnemyStep::WindupCue { duration } => {
                    cues.push(AnimationCue::new(actor, "windup", duration));
                }
                EnemyStep::Strike => self.release_strike(mover, actor, cues),
                EnemyStep::ReleaseLocks => {
                    self.anim_locked = false;
                    self.flip_locked = false;
                }
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

        if self.anim_locked {
            self.base_loop = None;
            return;
        }
        let wanted = if mover.velocity().abs() > RUN_CUE_SPEED {
            "run"
        } else {
            "idle"
        };
        if self.base_loop != Some(wanted) {
            self.base_loop = Some(wanted);
            cues.push(AnimationCue::looping(actor, wanted));
        }
    }

    fn exit_combat(&mut self, mover: &mut Mover) {
        self.reset_turn_state();
        self.in_combat = false;
        mover.set_auto_facing_locked(false);
        mover.stop();
        logger::log("🚪 Enemy left combat");
    }
}
