//! Catalog filters
//!
//! Four (plus budget) pure predicates, composable in any order, that
//! narrow an item pool down to plausible candidates. None of these
//! mutate their input; all preserve input ordering so that downstream
//! tie-breaks stay stable (`spec.md` §4.1, §9 "Score ordering is
//! stable").

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::item::{EquipmentPiece, ItemRef, Slot};
use crate::price::PriceStore;
use crate::requirements::RequirementStore;
use crate::Skills;

/// The three style groups used for filtering and for `optimize`'s
/// `combat_style` option. Distinct from `AttackStyle`, which tracks the
/// player's specific active style (stab/slash/crush/ranged/magic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatStyle {
    Melee,
    Ranged,
    Magic,
}

/// Retain only items in `slot`.
pub fn filter_by_slot(slot: Slot, pool: &[ItemRef]) -> Vec<ItemRef> {
    pool.iter().filter(|p| p.slot == slot).cloned().collect()
}

/// Retain items with no offensive bonuses at all (neutral/defensive
/// pieces) or a positive offensive contribution relevant to `style`.
pub fn filter_by_combat_style(style: CombatStyle, pool: &[ItemRef]) -> Vec<ItemRef> {
    pool.iter()
        .filter(|p| !p.has_offensive_bonus() || relevant_to_style(style, p))
        .cloned()
        .collect()
}

fn relevant_to_style(style: CombatStyle, p: &EquipmentPiece) -> bool {
    let o = &p.offensive;
    let m = &p.bonuses;
    match style {
        CombatStyle::Melee => o.stab > 0 || o.slash > 0 || o.crush > 0 || m.strength > 0,
        CombatStyle::Ranged => o.ranged > 0 || m.ranged_strength > 0,
        CombatStyle::Magic => o.magic > 0 || m.magic_strength > 0,
    }
}

/// Exclude any item whose id is in `ids`.
pub fn filter_by_blacklist(ids: &HashSet<u32>, pool: &[ItemRef]) -> Vec<ItemRef> {
    if ids.is_empty() {
        return pool.to_vec();
    }
    pool.iter().filter(|p| !ids.contains(&p.id)).cloned().collect()
}

/// Retain items whose effective price is within `cap`. Unknown prices
/// are retained unless `exclude_unknown_price` is set.
pub fn filter_by_budget(
    cap: u64,
    pool: &[ItemRef],
    store: &PriceStore,
    owned: &HashSet<u32>,
    exclude_unknown_price: bool,
) -> Vec<ItemRef> {
    pool.iter()
        .filter(|p| store.within_budget(p.id, cap, owned.contains(&p.id), exclude_unknown_price))
        .cloned()
        .collect()
}

/// Retain items with no recorded requirement, or whose every required
/// skill level is at most the player's corresponding skill.
pub fn filter_by_skill_requirements(
    skills: &Skills,
    pool: &[ItemRef],
    store: &RequirementStore,
) -> Vec<ItemRef> {
    pool.iter()
        .filter(|p| store.meets_requirements(p.id, skills))
        .cloned()
        .collect()
}
