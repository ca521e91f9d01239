//! Budget feasibility
//!
//! Computes a loadout's net/full cost and, if it exceeds a cap,
//! iteratively downgrades the slot with the smallest score-loss-per-GP
//! ratio until the total fits or no further progress can be made
//! (`spec.md` §4.7).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{ItemRef, Slot};
use crate::evaluator::{evaluate_item, DpsCalculator, Objective};
use crate::player::Player;
use crate::price::PriceStore;

/// Cost breakdown for an assembled loadout. `total`/`per_slot` are net
/// (owned/untradeable/unknown priced at 0); `full_total`/`per_slot_full`
/// ignore ownership.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub total: u64,
    pub full_total: u64,
    pub owned_savings: u64,
    pub per_slot: HashMap<Slot, u64>,
    pub per_slot_full: HashMap<Slot, u64>,
}

/// `calculate_loadout_cost` (`spec.md` §4.7 step 1). Unknown prices
/// contribute 0, same as owned/untradeable items — the caller has no
/// basis to charge for a price it doesn't know.
pub fn calculate_loadout_cost(loadout: &crate::player::PlayerLoadout, owned: &HashSet<u32>, store: &PriceStore) -> CostBreakdown {
    let mut per_slot = HashMap::new();
    let mut per_slot_full = HashMap::new();
    let mut total = 0u64;
    let mut full_total = 0u64;

    for (slot, item) in loadout.occupied() {
        let net = store.effective_price(item.id, owned.contains(&item.id)).unwrap_or(0);
        let full = store.get_price(item.id).unwrap_or(0);
        per_slot.insert(slot, net);
        per_slot_full.insert(slot, full);
        total += net;
        full_total += full;
    }

    CostBreakdown {
        total,
        full_total,
        owned_savings: full_total.saturating_sub(total),
        per_slot,
        per_slot_full,
    }
}

/// Tie-break order when two downgrade candidates have equal ratio:
/// non-weapon, non-body slots first (`spec.md` §4.7 step 3).
pub const DOWNGRADE_SLOT_ORDER: [Slot; 11] = [
    Slot::Ring,
    Slot::Neck,
    Slot::Cape,
    Slot::Ammo,
    Slot::Hands,
    Slot::Feet,
    Slot::Head,
    Slot::Legs,
    Slot::Shield,
    Slot::Body,
    Slot::Weapon,
];

fn downgrade_priority(slot: Slot) -> usize {
    DOWNGRADE_SLOT_ORDER
        .iter()
        .position(|&s| s == slot)
        .expect("DOWNGRADE_SLOT_ORDER covers all eleven slots")
}

/// Result of a budget feasibility pass.
#[derive(Debug, Clone)]
pub struct BudgetOutcome {
    pub player: Player,
    pub cost: CostBreakdown,
    pub evaluations: usize,
}

/// Run the downgrade loop (`spec.md` §4.7). `pools` supplies, per slot,
/// the candidates already passed through style/blacklist/skill
/// filtering (pre-budget) so a downgrade can find a cheaper in-style
/// alternative. If `max_budget` is `None` or the loadout already fits,
/// this is a no-op beyond computing the cost.
pub fn run_budget_feasibility<M: Sync>(
    player: &Player,
    monster: &M,
    max_budget: Option<u64>,
    owned: &HashSet<u32>,
    pools: &HashMap<Slot, Vec<ItemRef>>,
    store: &PriceStore,
    calculator: &dyn (DpsCalculator<M> + Sync),
    objective: Objective,
) -> anyhow::Result<BudgetOutcome> {
    let mut current = player.clone();
    let mut cost = calculate_loadout_cost(&current.loadout, owned, store);
    let mut evaluations = 0usize;

    let Some(cap) = max_budget else {
        return Ok(BudgetOutcome { player: current, cost, evaluations });
    };

    while cost.total > cap {
        let mut best_choice: Option<(Slot, Option<ItemRef>, f64)> = None;

        for (&slot, pool) in pools.iter() {
            let Some(current_item) = current.loadout.get(slot).cloned() else { continue };
            let current_cost = *cost.per_slot.get(&slot).unwrap_or(&0);
            if current_cost == 0 {
                continue;
            }

            let current_eval = evaluate_item(&current, monster, slot, Some(current_item.clone()), calculator, objective)?;
            evaluations += 1;

            let budget_for_slot = cap.saturating_sub(cost.total - current_cost);

            let empty_eval = evaluate_item(&current, monster, slot, None, calculator, objective)?;
            evaluations += 1;
            let mut best_alt: Option<(Option<ItemRef>, f64, u64)> = Some((None, empty_eval.score, 0));

            for alt in pool {
                if alt.id == current_item.id {
                    continue;
                }
                let alt_cost = store.effective_price(alt.id, owned.contains(&alt.id)).unwrap_or(0);
                if alt_cost >= current_cost || alt_cost > budget_for_slot {
                    continue;
                }
                let alt_eval = evaluate_item(&current, monster, slot, Some(alt.clone()), calculator, objective)?;
                evaluations += 1;
                match &best_alt {
                    Some((_, best_score, _)) if *best_score >= alt_eval.score => {}
                    _ => best_alt = Some((Some(alt.clone()), alt_eval.score, alt_cost)),
                }
            }

            let (alt_item, alt_score, alt_cost) = best_alt.expect("empty alternative is always present");
            let cost_saved = current_cost - alt_cost;
            if cost_saved == 0 {
                continue;
            }
            let score_loss = current_eval.score - alt_score;
            let ratio = score_loss / cost_saved as f64;

            let replace = match &best_choice {
                None => true,
                Some((best_slot, _, best_ratio)) => {
                    ratio < *best_ratio || (ratio == *best_ratio && downgrade_priority(slot) < downgrade_priority(*best_slot))
                }
            };
            if replace {
                best_choice = Some((slot, alt_item, ratio));
            }
        }

        match best_choice {
            None => {
                tracing::warn!(total = cost.total, cap, "budget downgrade stalled: no affordable alternative left");
                break;
            }
            Some((slot, alt_item, ratio)) => {
                let new_item_id = alt_item.as_ref().map(|i| i.id);
                tracing::debug!(?slot, ratio, ?new_item_id, "budget: accepted downgrade");
                current = current.with_equipped(slot, alt_item);
                cost = calculate_loadout_cost(&current.loadout, owned, store);
            }
        }
    }

    Ok(BudgetOutcome { player: current, cost, evaluations })
}
