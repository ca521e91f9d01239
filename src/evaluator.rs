//! Item evaluator
//!
//! Given a base player, a slot, and a candidate item, builds a derived
//! player, recomputes aggregates, and invokes the external DPS
//! calculator. This is the single point where the engine crosses into
//! "out of scope" territory (`spec.md` §4.3).

use serde::{Deserialize, Serialize};

use crate::catalog::{ItemRef, Slot};
use crate::player::Player;

/// The three selectable optimization objectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[default]
    Dps,
    Accuracy,
    MaxHit,
}

/// Damage metrics returned by the external calculator for a single
/// player/monster pairing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DpsMetrics {
    pub dps: f64,
    /// Probability a single attack lands a non-zero hit, in `[0, 1]`.
    pub hit_chance: f64,
    pub max_hit: u32,
}

impl DpsMetrics {
    /// Project out the metric named by `objective`.
    pub fn score(&self, objective: Objective) -> f64 {
        match objective {
            Objective::Dps => self.dps,
            Objective::Accuracy => self.hit_chance,
            Objective::MaxHit => self.max_hit as f64,
        }
    }
}

/// External damage calculator boundary, generic over the host's
/// monster representation. The engine treats the monster as opaque and
/// only ever passes it straight through.
pub trait DpsCalculator<M> {
    fn evaluate_dps(&self, player: &Player, monster: &M) -> anyhow::Result<DpsMetrics>;
}

/// Result of evaluating one candidate in one slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatedItem {
    pub item: Option<ItemRef>,
    pub dps: f64,
    pub hit_chance: f64,
    pub max_hit: u32,
    pub score: f64,
}

/// Build a derived player with `candidate` placed in `slot`, recompute
/// aggregates, and score it against `monster` via `calculator`
/// (`spec.md` §4.3 steps 1-5).
pub fn evaluate_item<M>(
    player: &Player,
    monster: &M,
    slot: Slot,
    candidate: Option<ItemRef>,
    calculator: &dyn DpsCalculator<M>,
    objective: Objective,
) -> anyhow::Result<EvaluatedItem> {
    let mut derived = player.with_equipped(slot, candidate.clone());
    // Force aggregate recomputation; the calculator is expected to read
    // `derived.loadout`'s cached aggregates rather than recomputing its
    // own view of equipped stats.
    let _ = derived.loadout.aggregates();

    let metrics = calculator.evaluate_dps(&derived, monster)?;
    Ok(EvaluatedItem {
        item: candidate,
        dps: metrics.dps,
        hit_chance: metrics.hit_chance,
        max_hit: metrics.max_hit,
        score: metrics.score(objective),
    })
}

/// Evaluate every candidate in `pool` for `slot` against the current
/// `player` context and return the highest-scoring one.
///
/// Evaluations run in parallel via `rayon` when the pool is at least
/// `parallel_threshold` long — each evaluation is a pure function of
/// (fixed context, candidate), so no shared mutable state is touched
/// (`spec.md` §5). `parallel_threshold` is a caller-supplied tuning knob
/// (`EngineConfig::parallel_threshold`) rather than a hardcoded
/// constant, so a host can trade off per-call overhead against core
/// count. Ties break by catalog order: `rayon`'s `max_by`-equivalent
/// would pick the *last* max, so we track the best-so-far by index
/// ourselves to keep the first-in-pool winner.
pub fn pick_best<M: Sync>(
    player: &Player,
    monster: &M,
    slot: Slot,
    pool: &[ItemRef],
    calculator: &dyn (DpsCalculator<M> + Sync),
    objective: Objective,
    parallel_threshold: usize,
) -> anyhow::Result<Option<(usize, EvaluatedItem)>> {
    let evaluate_at = |i: usize| -> anyhow::Result<EvaluatedItem> {
        evaluate_item(player, monster, slot, Some(pool[i].clone()), calculator, objective)
    };

    let evaluated: Vec<anyhow::Result<EvaluatedItem>> = if pool.len() >= parallel_threshold.max(1) {
        use rayon::prelude::*;
        (0..pool.len()).into_par_iter().map(evaluate_at).collect()
    } else {
        (0..pool.len()).map(evaluate_at).collect()
    };

    let mut best: Option<(usize, EvaluatedItem)> = None;
    for (i, result) in evaluated.into_iter().enumerate() {
        let evaluated = result?;
        match &best {
            Some((_, current)) if current.score >= evaluated.score => {}
            _ => best = Some((i, evaluated)),
        }
    }
    Ok(best)
}

/// `evaluate_item`'s DPS score minus a baseline (the player's current
/// DPS, or a caller-supplied override). Used to rank candidates by
/// marginal contribution rather than absolute score.
pub fn evaluate_item_delta<M>(
    player: &Player,
    monster: &M,
    slot: Slot,
    candidate: Option<ItemRef>,
    calculator: &dyn DpsCalculator<M>,
    baseline: Option<f64>,
) -> anyhow::Result<f64> {
    let evaluated = evaluate_item(player, monster, slot, candidate, calculator, Objective::Dps)?;
    let baseline = match baseline {
        Some(b) => b,
        None => calculator.evaluate_dps(player, monster)?.dps,
    };
    Ok(evaluated.dps - baseline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CombatBonuses, EquipmentPiece, ItemVars, MiscBonuses};
    use crate::player::{AttackStyle, Skills};
    use std::sync::Arc;

    /// Calculator stub: DPS is just the sum of strength + stab-offensive
    /// bonuses, scaled down. Enough to exercise evaluator wiring.
    struct StubCalculator;
    impl DpsCalculator<()> for StubCalculator {
        fn evaluate_dps(&self, player: &Player, _monster: &()) -> anyhow::Result<DpsMetrics> {
            let agg = player.loadout.aggregates_ref();
            let dps = (agg.offensive.stab + agg.bonuses.strength) as f64 / 10.0;
            Ok(DpsMetrics {
                dps,
                hit_chance: 0.5,
                max_hit: (agg.bonuses.strength.max(0)) as u32,
            })
        }
    }

    fn weapon(stab: i32, strength: i32) -> ItemRef {
        Arc::new(EquipmentPiece {
            id: 10,
            name: "Dagger".into(),
            version: None,
            category: None,
            slot: Slot::Weapon,
            is_two_handed: false,
            speed: 4,
            offensive: CombatBonuses { stab, ..Default::default() },
            defensive: CombatBonuses::default(),
            bonuses: MiscBonuses { strength, ..Default::default() },
            ammo_kind: None,
            ammo_tier: None,
            ammo_coupling: None,
            item_vars: ItemVars::default(),
        })
    }

    #[test]
    fn evaluate_item_scores_by_objective() {
        let player = Player::new(Skills::maxed(), AttackStyle::Stab);
        let calc = StubCalculator;
        let evaluated = evaluate_item(
            &player,
            &(),
            Slot::Weapon,
            Some(weapon(20, 20)),
            &calc,
            Objective::Dps,
        )
        .unwrap();
        assert_eq!(evaluated.dps, 4.0);
        assert_eq!(evaluated.score, 4.0);
    }

    #[test]
    fn evaluate_item_delta_against_baseline() {
        let player = Player::new(Skills::maxed(), AttackStyle::Stab);
        let calc = StubCalculator;
        let delta = evaluate_item_delta(&player, &(), Slot::Weapon, Some(weapon(20, 20)), &calc, Some(0.0))
            .unwrap();
        assert_eq!(delta, 4.0);
    }
}
