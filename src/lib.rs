//! Gear optimization engine
//!
//! Given a player, an opaque monster, an equipment pool, and a set of
//! constraints, produces an eleven-slot loadout maximizing DPS, hit
//! chance, or max hit, along with its cost and search metadata. The
//! damage calculator itself, the catalog's ultimate data source, and
//! the transport used to run this off a host's main thread are all
//! consumed interfaces, not implemented here.

pub mod budget;
pub mod catalog;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod greedy;
pub mod orchestrator;
pub mod player;
pub mod price;
pub mod progress;
pub mod requirements;
pub mod sets;
pub mod weapon;
pub mod worker;

pub use catalog::{
    category, AmmoCoupling, AmmoKind, CombatBonuses, CombatStyle, EquipmentPiece, ItemRef, ItemVars, MiscBonuses, Slot,
};
pub use error::{OptimizerError, Result};
pub use evaluator::{DpsCalculator, DpsMetrics, EvaluatedItem, Objective};
pub use orchestrator::{optimize, Constraints, Meta, Metrics, OptimizerContext, OptimizerOptions, OptimizerResult};
pub use player::{AttackStyle, Player, PlayerLoadout, Skill, Skills};
pub use price::PriceStore;
pub use progress::{CurrentBest, Phase, ProgressEvent, ProgressTracker};
pub use requirements::RequirementStore;
