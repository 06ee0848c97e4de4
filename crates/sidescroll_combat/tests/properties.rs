//! Property-based тесты (proptest)
//!
//! Инварианты, которые должны выполняться для любых входов:
//! - Mover: доезжает ровно до цели за `time_remaining`, не проскакивает
//! - Стены: коллайдер на поправленной цели не пересекает стену
//! - Стамина: стоимость пути и дальность хода взаимно обратны
//! - Урон: игрок всегда наносит хотя бы 1

use proptest::prelude::*;
use sidescroll_combat::combat::damage::{block_stamina_damage, player_attack_damage};
use sidescroll_combat::combat::stamina::{max_move_distance, movement_cost};
use sidescroll_combat::*;

// ============================================================
// Mover
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_mover_arrives_exactly(
        start in -50.0f32..50.0,
        target in -50.0f32..50.0,
        speed in 0.5f32..20.0,
        dt in 0.005f32..0.1,
    ) {
        let mut mover = Mover::new(start, 0.5);
        mover.set_speed(speed);
        mover.move_to(target);

        let steps = (mover.time_remaining() / dt).ceil() as usize + 2;
        let (low, high) = (start.min(target), start.max(target));
        for _ in 0..steps {
            mover.tick(dt);
            prop_assert!(mover.position() >= low - 1e-3 && mover.position() <= high + 1e-3);
        }

        prop_assert!(!mover.is_moving());
        prop_assert_eq!(mover.position(), target);
        prop_assert_eq!(mover.velocity(), 0.0);
    }

    #[test]
    fn prop_wall_adjusted_stays_inside_arena(
        origin in -5.0f32..5.0,
        target in -20.0f32..20.0,
        half_width in 0.0f32..1.0,
    ) {
        let arena = Obstacles::arena(-10.0, 10.0);
        let mover = Mover::new(origin, half_width);
        let adjusted = mover.wall_adjusted(target, origin, &arena);

        // коллайдер не заходит в стену
        let limit = 10.0 - half_width;
        prop_assert!(adjusted >= -limit - 1e-4 && adjusted <= limit + 1e-4);
        // поправка только укорачивает путь, направление то же
        prop_assert!((adjusted - origin).abs() <= (target - origin).abs() + 1e-4);
        prop_assert!((adjusted - origin) * (target - origin) >= -1e-4);
    }
}

// ============================================================
// Stamina / damage
// ============================================================

proptest! {
    #[test]
    fn prop_move_cost_inverts_reach(stamina in 0.0f32..500.0) {
        let reach = max_move_distance(stamina);
        prop_assert!((movement_cost(reach) - stamina).abs() < 1e-2);
    }

    #[test]
    fn prop_player_damage_at_least_one(
        base in 0.0f32..100.0,
        multiplier in 0.0f32..3.0,
        effectiveness in 0.0f32..=1.0,
        rate in 0.0f32..=100.0,
        jitter in -1i32..1,
    ) {
        prop_assert!(player_attack_damage(base, multiplier, effectiveness, rate, jitter) >= 1);
    }

    #[test]
    fn prop_block_damage_grows_with_worse_timing(
        raw in 0.0f32..50.0,
        multiplier in 0.0f32..3.0,
        rate in 0.0f32..=100.0,
    ) {
        let perfect = block_stamina_damage(raw, multiplier, 100.0);
        let sloppy = block_stamina_damage(raw, multiplier, rate);
        prop_assert!(sloppy + 1e-4 >= perfect);
        prop_assert!(sloppy >= 0.0);
    }
}
