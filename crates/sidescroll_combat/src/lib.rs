//! Sidescroll Combat Core
//!
//! Turn-based melee combat on a single world axis, run as a headless Bevy ECS
//! simulation.
//!
//! Layers:
//! - `movement`: 1D movers, combat positioning helpers, obstacle queries
//! - `combat`: attack data, damage rules, timed sequences, arbiter interface,
//!   ECS plugin and systems
//! - `ai`: enemy turn state machine
//! - `player`: player turn state machine plus roll / counter / knockdown
//! - `headless`: in-process arbiter and turn driver for the binary and tests
//!
//! The combat arbiter (turn order, action-command input, health bars) lives
//! outside the core and is injected as a Bevy resource type parameter.

use std::marker::PhantomData;
use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub mod ai;
pub mod combat;
pub mod error;
pub mod headless;
pub mod logger;
pub mod movement;
pub mod player;

pub use ai::{EnemyCombatConfig, EnemyCombatController, EnemyCombatState, PlayerSide};
pub use combat::{
    ActionCommandResult, ActionCommandSpec, AnimationCue, ApproachStyle, AttackDefinition,
    AttackDirection, AttackOption, CombatActor, CombatArbiter, CombatContext, CombatPhase,
    CombatPlugin, CombatTrigger, ComboHit, CounterIntent, DefensiveResponse, EnterCombat,
    EvasionPerformed, LeaveCombat, RollIntent, ScreenShake, Stamina, StartTurn, StatusType,
    TurnEndReason,
};
pub use error::CombatError;
pub use headless::{HeadlessArbiter, HeadlessPlugin};
pub use logger::{log, log_error, log_info, log_warning};
pub use movement::{CombatMover, Facing, Mover, MovementPlugin, ObstacleKind, Obstacles};
pub use player::{PlayerCombatConfig, PlayerCombatController, PlayerCombatState, Weapon};

/// Simulation tick rate (movement integration + turn state machines).
pub const FIXED_HZ: f64 = 60.0;

/// Главный plugin симуляции (movement + combat), параметризован типом arbiter'а.
pub struct SimulationPlugin<A> {
    _arbiter: PhantomData<fn() -> A>,
}

impl<A> Default for SimulationPlugin<A> {
    fn default() -> Self {
        Self {
            _arbiter: PhantomData,
        }
    }
}

impl<A: CombatArbiter + Resource> Plugin for SimulationPlugin<A> {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(FIXED_HZ))
            .add_plugins((MovementPlugin, CombatPlugin::<A>::default()));

        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }
    }
}

/// Детерминистичный RNG resource (seeded): attack selection, damage jitter.
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Creates a minimal headless App.
///
/// Time advances by exactly one fixed step per `app.update()`, so a run is a
/// pure function of the seed and the spawned world.
pub fn create_headless_app(seed: u64) -> App {
    logger::init_logger();

    let step = Duration::from_secs_f64(1.0 / FIXED_HZ);
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(FIXED_HZ))
        .insert_resource(TimeUpdateStrategy::ManualDuration(step));

    app
}

/// Snapshot of one component type, sorted by entity index (determinism checks).
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
