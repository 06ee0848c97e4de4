//! Damage rules: health damage for both sides and block resolution.

use super::action_command::ActionCommandResult;

/// Health multiplier when a block collapses.
pub const GUARD_BREAK_DAMAGE_MULTIPLIER: f32 = 1.2;
pub const PERFECT_BLOCK_KNOCKBACK_SCALE: f32 = 0.5;
pub const PERFECT_BLOCK_COUNTER_SCALE: f32 = 2.0;
/// Knockback scale when the block fills the counter meter.
pub const COUNTER_READY_KNOCKBACK_SCALE: f32 = 0.2;

fn round_to_tenth(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

/// Stamina the defender loses on a block. Worse timing costs up to 3x.
pub fn block_stamina_damage(raw: f32, block_damage_multiplier: f32, success_rate: f32) -> f32 {
    let timing_penalty = 1.0 + (1.0 - success_rate / 100.0) * 2.0;
    round_to_tenth(raw / 10.0 * block_damage_multiplier * timing_penalty)
}

pub fn enemy_hit_damage(base: f32, hit_multiplier: f32, extra_multiplier: f32) -> i32 {
    (base * hit_multiplier * extra_multiplier).round() as i32
}

/// Player strike damage. `jitter` is drawn from {-1, 0}; never below 1.
pub fn player_attack_damage(
    weapon_base: f32,
    hit_multiplier: f32,
    range_effectiveness: f32,
    success_rate: f32,
    jitter: i32,
) -> i32 {
    let raw = (weapon_base * hit_multiplier * range_effectiveness).round() + jitter as f32;
    let scaled = (raw * success_rate / 100.0).round();
    if scaled < 1.0 {
        1
    } else {
        scaled as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockResolution {
    pub stamina_damage: f32,
    pub knockback_scale: f32,
    pub counter_fill: f32,
    /// Defender could not pay the stamina damage.
    pub guard_break: bool,
}

/// Outcome of a successful block. `counter_would_trigger` is asked with the
/// final meter gain.
pub fn resolve_block(
    raw_stamina_damage: f32,
    block_damage_multiplier: f32,
    result: &ActionCommandResult,
    base_counter_fill: f32,
    defender_stamina: f32,
    counter_would_trigger: impl FnOnce(f32) -> bool,
) -> BlockResolution {
    let mut stamina_damage =
        block_stamina_damage(raw_stamina_damage, block_damage_multiplier, result.success_rate);
    let mut knockback_scale = 1.0;
    let mut counter_fill = base_counter_fill;

    if result.perfect {
        stamina_damage = 0.0;
        knockback_scale = PERFECT_BLOCK_KNOCKBACK_SCALE;
        counter_fill *= PERFECT_BLOCK_COUNTER_SCALE;
    }
    if counter_would_trigger(counter_fill) {
        knockback_scale = COUNTER_READY_KNOCKBACK_SCALE;
    }

    BlockResolution {
        stamina_damage,
        knockback_scale,
        counter_fill,
        guard_break: defender_stamina < stamina_damage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_stamina_damage_rounds_to_tenth() {
        // raw 5, block x1.2, 80% → 0.5 * 1.2 * 1.4 = 0.84
        let damage = block_stamina_damage(5.0, 1.2, 80.0);
        assert!((damage - 0.8).abs() < 1e-6);

        let clean = block_stamina_damage(10.0, 1.0, 100.0);
        assert!((clean - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_player_attack_damage() {
        // 20 * 1.0 * 1.0 = 20, jitter 0, 100%
        assert_eq!(player_attack_damage(20.0, 1.0, 1.0, 100.0, 0), 20);
        assert_eq!(player_attack_damage(20.0, 1.0, 1.0, 100.0, -1), 19);
        assert_eq!(player_attack_damage(20.0, 1.0, 0.5, 50.0, 0), 5);
        assert_eq!(player_attack_damage(1.0, 0.1, 0.1, 10.0, -1), 1);
    }

    #[test]
    fn test_enemy_hit_damage() {
        assert_eq!(enemy_hit_damage(10.0, 1.0, 1.0), 10);
        assert_eq!(enemy_hit_damage(10.0, 1.0, GUARD_BREAK_DAMAGE_MULTIPLIER), 12);
        assert_eq!(enemy_hit_damage(7.0, 1.5, 1.0), 11);
    }

    #[test]
    fn test_resolve_block_outcomes() {
        let normal = resolve_block(5.0, 1.2, &ActionCommandResult::blocked(80.0), 2.0, 10.0, |_| false);
        assert!((normal.stamina_damage - 0.8).abs() < 1e-6);
        assert_eq!(normal.knockback_scale, 1.0);
        assert_eq!(normal.counter_fill, 2.0);
        assert!(!normal.guard_break);

        let perfect = resolve_block(5.0, 1.2, &ActionCommandResult::perfect_block(), 2.0, 0.0, |_| false);
        assert_eq!(perfect.stamina_damage, 0.0);
        assert_eq!(perfect.knockback_scale, PERFECT_BLOCK_KNOCKBACK_SCALE);
        assert_eq!(perfect.counter_fill, 4.0);
        assert!(!perfect.guard_break);

        let counter = resolve_block(5.0, 1.2, &ActionCommandResult::blocked(80.0), 2.0, 10.0, |fill| fill >= 2.0);
        assert_eq!(counter.knockback_scale, COUNTER_READY_KNOCKBACK_SCALE);

        let broken = resolve_block(5.0, 1.2, &ActionCommandResult::blocked(80.0), 2.0, 0.5, |_| false);
        assert!(broken.guard_break);
    }
}
