//! Orchestrator
//!
//! `optimize` drives the eight-phase pipeline: filter the catalog,
//! couple the weapon/shield/ammo, greedily fill the rest, compare
//! against set-bonus loadouts, enforce the budget, and assemble the
//! final result (`spec.md` §4.8).

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::budget::{self, CostBreakdown};
use crate::catalog::{
    filter_by_blacklist, filter_by_budget, filter_by_combat_style, filter_by_skill_requirements, filter_by_slot,
    CombatStyle, ItemRef, Slot,
};
use crate::config::EngineConfig;
use crate::error::{OptimizerError, Result};
use crate::evaluator::{DpsCalculator, DpsMetrics, Objective};
use crate::greedy;
use crate::player::{Player, Skills};
use crate::price::PriceStore;
use crate::progress::{CurrentBest, Phase, ProgressCallback, ProgressEvent, ProgressTracker};
use crate::requirements::RequirementStore;
use crate::sets;
use crate::weapon;

/// Budget/ownership/blacklist/skill-enforcement constraints for one run
/// (`spec.md` §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Constraints {
    pub max_budget: Option<u64>,
    #[serde(default)]
    pub owned_items: HashSet<u32>,
    #[serde(default)]
    pub blacklisted_items: HashSet<u32>,
    #[serde(default)]
    pub enforce_skill_requirements: bool,
    pub player_skills: Option<Skills>,
}

/// Everything `optimize` needs besides the player/monster/options: the
/// item pool and the two read-only stores it consults, the external
/// damage calculator, and tuning knobs. Bundled so `optimize`'s own
/// signature stays close to `spec.md` §6's `optimize(player, monster,
/// options)` shape.
pub struct OptimizerContext<'a, M> {
    pub catalog: &'a [ItemRef],
    pub price_store: &'a PriceStore,
    pub requirement_store: &'a RequirementStore,
    pub calculator: &'a (dyn DpsCalculator<M> + Sync),
    pub config: &'a EngineConfig,
}

/// Caller-supplied options for one `optimize` call.
pub struct OptimizerOptions<'a> {
    pub combat_style: Option<CombatStyle>,
    pub objective: Objective,
    pub constraints: Constraints,
    pub on_progress: Option<&'a mut ProgressCallback<'a>>,
}

impl<'a> Default for OptimizerOptions<'a> {
    fn default() -> Self {
        Self {
            combat_style: None,
            objective: Objective::default(),
            constraints: Constraints::default(),
            on_progress: None,
        }
    }
}

/// The projected scoring metrics in the result's stable JSON shape —
/// `accuracy`, not `hit_chance` (`spec.md` §6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Metrics {
    pub dps: f64,
    pub accuracy: f64,
    pub max_hit: u32,
}

impl From<DpsMetrics> for Metrics {
    fn from(m: DpsMetrics) -> Self {
        Self { dps: m.dps, accuracy: m.hit_chance, max_hit: m.max_hit }
    }
}

/// Search metadata: total candidate evaluations and wall-clock time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Meta {
    pub evaluations: usize,
    pub time_ms: f64,
}

/// `optimize`'s stable result shape (`spec.md` §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerResult {
    pub equipment: HashMap<Slot, Option<ItemRef>>,
    pub metrics: Metrics,
    pub cost: CostBreakdown,
    pub meta: Meta,
}

fn equipment_view(player: &Player) -> HashMap<Slot, Option<ItemRef>> {
    Slot::ALL.into_iter().map(|slot| (slot, player.loadout.get(slot).cloned())).collect()
}

fn score_player<M>(player: &mut Player, monster: &M, calculator: &dyn (DpsCalculator<M> + Sync), objective: Objective) -> Result<(DpsMetrics, f64)> {
    let _ = player.loadout.aggregates();
    let metrics = calculator.evaluate_dps(player, monster).map_err(OptimizerError::CalculatorFailure)?;
    let score = metrics.score(objective);
    Ok((metrics, score))
}

/// Drive the full pipeline for one request (`spec.md` §4.8).
pub fn optimize<M: Sync>(player: &Player, monster: &M, ctx: &OptimizerContext<'_, M>, mut options: OptimizerOptions<'_>) -> Result<OptimizerResult> {
    let start = Instant::now();
    let mut evaluations = 0usize;
    let mut tracker = ProgressTracker::new(options.on_progress.take());

    // 1. initializing
    tracing::debug!("optimize: initializing");
    if options.constraints.enforce_skill_requirements && options.constraints.player_skills.is_none() {
        return Err(OptimizerError::InvalidInput(
            "enforce_skill_requirements=true requires player_skills".to_string(),
        ));
    }
    tracker.emit(ProgressEvent::new(Phase::Initializing, 0, None));

    let combat_style = options.combat_style.unwrap_or_else(|| player.default_combat_style());

    // 2. filtering
    tracing::debug!(?combat_style, "optimize: filtering catalog");
    let mut pool = ctx.catalog.to_vec();
    pool = filter_by_blacklist(&options.constraints.blacklisted_items, &pool);
    pool = filter_by_combat_style(combat_style, &pool);
    if options.constraints.enforce_skill_requirements {
        if let Some(skills) = &options.constraints.player_skills {
            pool = filter_by_skill_requirements(skills, &pool, ctx.requirement_store);
        }
    }
    tracing::debug!(candidates = pool.len(), "optimize: filtered catalog");
    tracker.emit(ProgressEvent::new(Phase::Filtering, 10, None));

    let weapon_pool = filter_by_slot(Slot::Weapon, &pool);
    let shield_pool = filter_by_slot(Slot::Shield, &pool);
    let ammo_pool = filter_by_slot(Slot::Ammo, &pool);
    let dart_pool = weapon::filter_darts(&pool);

    // 3. weapons
    tracing::debug!("optimize: coupling weapon and shield");
    let coupling = weapon::choose_weapon_and_shield(
        player,
        monster,
        &weapon_pool,
        &shield_pool,
        ctx.calculator,
        options.objective,
        ctx.config.parallel_threshold,
    )
    .map_err(OptimizerError::CalculatorFailure)?;
    evaluations += coupling.evaluations;
    let mut working = player.with_equipped(Slot::Weapon, coupling.weapon.clone());
    if coupling.shield.is_some() {
        working = working.with_equipped(Slot::Shield, coupling.shield.clone());
    }
    tracker.emit(ProgressEvent::new(Phase::Weapons, 25, None));

    // 4. ammunition
    tracing::debug!("optimize: resolving ammunition/dart");
    if let Some(weapon_item) = working.loadout.weapon().cloned() {
        if weapon::is_blowpipe(&weapon_item) {
            let dart_result = weapon::find_best_dart(
                &working,
                monster,
                &weapon_item,
                &dart_pool,
                &options.constraints.blacklisted_items,
                ctx.calculator,
                options.objective,
                ctx.config.parallel_threshold,
            )
            .map_err(OptimizerError::CalculatorFailure)?;
            evaluations += dart_result.evaluations;
            working = working.with_equipped(Slot::Weapon, dart_result.weapon.or(Some(weapon_item)));
        } else if weapon::weapon_requires_ammo(&weapon_item) {
            let ammo_result = weapon::find_best_ammo(
                &working,
                monster,
                &weapon_item,
                &ammo_pool,
                &options.constraints.blacklisted_items,
                ctx.calculator,
                options.objective,
                ctx.config.parallel_threshold,
            )
            .map_err(OptimizerError::CalculatorFailure)?;
            evaluations += ammo_result.evaluations;
            working = working.with_equipped(Slot::Ammo, ammo_result.ammo);
        }
    }
    tracker.emit(ProgressEvent::new(Phase::Ammunition, 35, None));

    // 5. slots
    tracing::debug!("optimize: greedy-filling remaining slots");
    let mut remaining_pools: HashMap<Slot, Vec<ItemRef>> = HashMap::new();
    for &slot in &ctx.config.slot_fill_order {
        let mut slot_pool = filter_by_slot(slot, &pool);
        if let Some(cap) = options.constraints.max_budget {
            slot_pool = filter_by_budget(cap, &slot_pool, ctx.price_store, &options.constraints.owned_items, false);
        }
        remaining_pools.insert(slot, slot_pool);
    }
    let total_slot_candidates: usize = remaining_pools.values().map(|p| p.len()).sum();
    let emit_every = ctx.config.progress_emit_every_n_candidates.max(1);
    let mut on_slot_progress = |done: usize| {
        if done % emit_every != 0 {
            return;
        }
        let fraction = if total_slot_candidates == 0 { 1.0 } else { done as f64 / total_slot_candidates as f64 };
        let percent = 35 + ((fraction.clamp(0.0, 1.0) * 20.0) as u8);
        tracker.emit(ProgressEvent::new(Phase::Slots, percent, None));
    };
    let (mut working, slot_report) = greedy::fill_remaining_slots(
        &working,
        monster,
        &remaining_pools,
        &ctx.config.slot_fill_order,
        ctx.calculator,
        options.objective,
        ctx.config.parallel_threshold,
        Some(&mut on_slot_progress),
    )
    .map_err(OptimizerError::CalculatorFailure)?;
    evaluations += slot_report.evaluations;
    tracker.emit(ProgressEvent::new(Phase::Slots, 55, None));

    // 6. set_bonuses
    tracing::debug!("optimize: comparing against set-bonus loadouts");
    let (_, greedy_score) = score_player(&mut working, monster, ctx.calculator, options.objective)?;
    let best_set = sets::find_best_set_loadout(
        &working,
        monster,
        combat_style,
        &pool,
        &weapon_pool,
        &shield_pool,
        &ammo_pool,
        &dart_pool,
        &options.constraints,
        ctx.calculator,
        options.objective,
        ctx.config.parallel_threshold,
        greedy_score,
    )
    .map_err(OptimizerError::CalculatorFailure)?;
    if let Some(set_eval) = best_set {
        tracing::debug!(set_type = ?set_eval.set_type, "optimize: set-bonus loadout beats greedy fill");
        working = set_eval.equipment;
    }
    tracker.emit(ProgressEvent::new(Phase::SetBonuses, 70, None));

    // 7. budget
    tracing::debug!(max_budget = ?options.constraints.max_budget, "optimize: enforcing budget");
    let mut budget_pools: HashMap<Slot, Vec<ItemRef>> = remaining_pools;
    budget_pools.insert(Slot::Weapon, weapon_pool);
    budget_pools.insert(Slot::Shield, shield_pool);
    budget_pools.insert(Slot::Ammo, ammo_pool);
    let budget_outcome = budget::run_budget_feasibility(
        &working,
        monster,
        options.constraints.max_budget,
        &options.constraints.owned_items,
        &budget_pools,
        ctx.price_store,
        ctx.calculator,
        options.objective,
    )
    .map_err(OptimizerError::CalculatorFailure)?;
    evaluations += budget_outcome.evaluations;
    let mut working = budget_outcome.player;
    tracker.emit(ProgressEvent::new(Phase::Budget, 90, None));

    // 8. complete
    let (final_metrics, _) = score_player(&mut working, monster, ctx.calculator, options.objective)?;
    let cost = budget_outcome.cost;
    let result = OptimizerResult {
        equipment: equipment_view(&working),
        metrics: final_metrics.into(),
        cost,
        meta: Meta { evaluations, time_ms: start.elapsed().as_secs_f64() * 1000.0 },
    };
    tracing::info!(
        evaluations,
        time_ms = result.meta.time_ms,
        dps = final_metrics.dps,
        "optimize: complete"
    );
    tracker.emit(ProgressEvent::new(
        Phase::Complete,
        100,
        Some(CurrentBest { equipment: working, metrics: final_metrics }),
    ));

    Ok(result)
}
