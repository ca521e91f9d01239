//! Equipment catalog module
//!
//! Defines the equippable item model and the pure filter predicates used
//! to narrow a catalog pool down to the candidates worth evaluating for
//! a given slot, combat style, budget, and skill set.

mod filters;
mod item;

pub use filters::{
    filter_by_blacklist, filter_by_budget, filter_by_combat_style, filter_by_skill_requirements,
    filter_by_slot, CombatStyle,
};
pub use item::{
    category, AmmoCoupling, AmmoKind, CombatBonuses, EquipmentPiece, ItemRef, ItemVars,
    MiscBonuses, Slot,
};
