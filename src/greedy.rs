//! Per-slot greedy optimizer
//!
//! Once the weapon (and shield/ammo) context is locked, the remaining
//! eight slots are filled one at a time, each against the fully fixed
//! context built up so far (`spec.md` §4.5).

use std::collections::HashMap;

use crate::catalog::{ItemRef, Slot};
use crate::evaluator::{pick_best, DpsCalculator, Objective};
use crate::player::Player;

/// Fixed slot fill order: higher-impact slots resolve against more
/// settled context. Weapon, shield, and ammo are excluded — those are
/// handled by weapon coupling before this runs.
pub const SLOT_ORDER: [Slot; 8] = [
    Slot::Neck,
    Slot::Ring,
    Slot::Cape,
    Slot::Head,
    Slot::Body,
    Slot::Legs,
    Slot::Hands,
    Slot::Feet,
];

/// Per-slot outcome: the chosen item (or `None` if no candidate fit or
/// the pool was empty) and how many candidates were evaluated.
#[derive(Debug, Clone, Default)]
pub struct SlotFillReport {
    pub evaluations: usize,
}

/// Fill every slot in `order` greedily, holding the rest of the loadout
/// fixed at each step. `pools` maps each slot to its pre-filtered
/// candidate pool (already passed through style/blacklist/skill/budget
/// filters). `on_progress`, if given, is called with the running
/// evaluation count after each slot so a caller can throttle
/// intermediate progress events (`EngineConfig::progress_emit_every_n_candidates`).
pub fn fill_remaining_slots<M: Sync>(
    player: &Player,
    monster: &M,
    pools: &HashMap<Slot, Vec<ItemRef>>,
    order: &[Slot],
    calculator: &dyn (DpsCalculator<M> + Sync),
    objective: Objective,
    parallel_threshold: usize,
    mut on_progress: Option<&mut dyn FnMut(usize)>,
) -> anyhow::Result<(Player, SlotFillReport)> {
    let mut current = player.clone();
    let mut report = SlotFillReport::default();

    for &slot in order {
        let empty = Vec::new();
        let pool = pools.get(&slot).unwrap_or(&empty);
        if pool.is_empty() {
            // No candidates: leave the slot empty, zero-score result.
            continue;
        }
        let picked = pick_best(&current, monster, slot, pool, calculator, objective, parallel_threshold)?;
        report.evaluations += pool.len();
        if let Some(cb) = on_progress.as_mut() {
            cb(report.evaluations);
        }
        if let Some((_, evaluated)) = picked {
            current = current.with_equipped(slot, evaluated.item);
        }
    }

    Ok((current, report))
}
