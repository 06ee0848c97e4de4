//! Player reactions outside the turn loop: roll, counter, block, knockdown,
//! death.

use bevy::prelude::*;

use super::combat::{PlayerCombatController, PlayerCombatState, PlayerStep, PresentationParams};
use crate::combat::sequence::TimedSequence;
use crate::combat::{AnimationCue, CombatContext, CombatTrigger, Evasion};
use crate::logger;
use crate::movement::{CombatMover, Facing, Mover};

/// Range effectiveness granted to a counter combo.
pub const COUNTER_RANGE_EFFECTIVENESS: f32 = 1.0;

impl PlayerCombatController {
    /// Evasive roll scaled by the action command rate.
    ///
    /// Returns where the roll will stop (for roll catching), or `None` if the
    /// player is knocked down and cannot roll.
    pub fn roll(
        &mut self,
        me: &mut Mover,
        leftward: bool,
        success_rate: f32,
        ctx: &mut CombatContext<'_>,
    ) -> Option<Evasion> {
        if self.hard_knockdown {
            logger::log("🚫 Roll refused: player is knocked down");
            return None;
        }

        let origin = me.position();
        let distance = self.config.base_roll_distance * success_rate.clamp(0.0, 100.0) / 100.0;
        let end = if leftward {
            origin - distance
        } else {
            origin + distance
        };
        let end = me.wall_adjusted(end, origin, ctx.obstacles);

        me.set_speed(self.config.roll_speed);
        me.move_to(end);
        me.face(Facing::from_leftward(leftward));
        self.flip_locked = true;
        self.params = PresentationParams::ROLL;

        let duration = me.time_remaining();
        ctx.cue("roll", duration);
        self.sequences
            .start(TimedSequence::new("player_roll").then_at(duration, PlayerStep::Restore));
        ctx.arbiter.notify_combat_event(CombatTrigger::PlayerRolled);

        logger::log(&format!(
            "🤸 Player rolls {} to {:.2} ({:.0}%)",
            if leftward { "left" } else { "right" },
            me.target(),
            success_rate
        ));
        Some(Evasion {
            stop_position: me.target(),
            leftward,
        })
    }

    /// Counter meter fired: take over with the counter combo.
    pub fn start_counter(&mut self) {
        if !self.in_combat {
            logger::log_warning("⚠️ Counter requested outside combat");
            return;
        }
        self.interrupt_sequence();
        self.current_attack = Some(self.config.weapon.counter_combo.clone());
        self.combo_index = 0;
        self.range_effectiveness = COUNTER_RANGE_EFFECTIVENESS;
        self.pending_strike = None;
        self.state = PlayerCombatState::Evaluate;
        self.turn_active = true;
        logger::log_info("🔄 Counter attack!");
    }

    /// Heavy hit landed: default animations locked until the stagger plays out.
    pub fn trigger_hard_knockdown(
        &mut self,
        me: &Mover,
        actor: Entity,
        cues: &mut Vec<AnimationCue>,
    ) {
        let stagger = me.time_remaining().max(self.config.hard_knockdown_min);
        self.hard_knockdown = true;
        self.params = PresentationParams::KNOCKDOWN;

        cues.push(AnimationCue::new(actor, "knockdown", stagger));
        self.sequences.start(
            TimedSequence::new("player_knockdown")
                .then_at(stagger + self.config.hard_knockdown_tail, PlayerStep::Restore),
        );
        logger::log(&format!("🤕 Player knocked down for {:.2}s", stagger));
    }

    pub fn play_block(&mut self, actor: Entity, cues: &mut Vec<AnimationCue>) {
        let duration = self.config.block_cue_duration;
        self.params = PresentationParams::BLOCK;
        cues.push(AnimationCue::new(actor, "block", duration));
        self.sequences
            .start(TimedSequence::new("player_block").then_at(duration, PlayerStep::Restore));
    }

    pub fn play_death(&mut self, actor: Entity, me: &mut Mover, cues: &mut Vec<AnimationCue>) {
        self.sequences.cancel();
        self.turn_active = false;
        self.state = PlayerCombatState::Standby;
        self.params = PresentationParams::DEATH;
        self.flip_locked = true;
        me.stop();
        cues.push(AnimationCue::looping(actor, "death"));
        logger::log_info("💀 Player died");
    }

    /// Tutorial rewind: drop the turn, keep combat.
    pub fn tutorial_reset(&mut self, me: &mut Mover) {
        self.interrupt_sequence();
        self.state = PlayerCombatState::Standby;
        self.turn_active = false;
        self.pending_strike = None;
        me.stop();
    }

    /// Cancels the running sequence and releases whatever it was holding.
    pub(super) fn interrupt_sequence(&mut self) {
        if self.sequences.cancel().is_some() {
            self.restore_defaults();
        }
    }

    pub(super) fn restore_defaults(&mut self) {
        self.params = PresentationParams::COMBAT_READY;
        self.flip_locked = false;
        self.hard_knockdown = false;
    }
}
