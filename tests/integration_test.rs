//! Black-box suite exercising the invariants and seed scenarios from
//! `spec.md` §8 against the fixture catalog in `tests/fixtures/mod.rs`.

mod fixtures;

use std::collections::HashSet;

use pretty_assertions::assert_eq;

use fixtures::{
    build_catalog, non_blowpipe_weapon_ids, one_handed_weapon_ids, player_with_whip, DummyMonster, TotalCalculator,
    ABYSSAL_WHIP, TOXIC_BLOWPIPE,
};
use gear_optimizer::config::EngineConfig;
use gear_optimizer::price::PriceStore;
use gear_optimizer::requirements::RequirementStore;
use gear_optimizer::weapon::{ammo_valid_for_weapon, weapon_requires_ammo};
use gear_optimizer::{CombatStyle, Constraints, DpsCalculator, OptimizerContext, OptimizerOptions, Slot};

fn context<'a>(
    catalog: &'a [gear_optimizer::ItemRef],
    price_store: &'a PriceStore,
    requirement_store: &'a RequirementStore,
    calculator: &'a TotalCalculator,
    config: &'a EngineConfig,
) -> OptimizerContext<'a, DummyMonster> {
    OptimizerContext { catalog, price_store, requirement_store, calculator, config }
}

/// S1 — a melee upgrade from a bare whip strictly increases DPS and
/// does real search work.
#[test]
fn s1_melee_upgrade_beats_baseline() {
    let catalog = build_catalog();
    let price_store = PriceStore::new();
    let requirement_store = RequirementStore::new();
    let calculator = TotalCalculator;
    let config = EngineConfig::default();
    let ctx = context(&catalog, &price_store, &requirement_store, &calculator, &config);

    let baseline = player_with_whip();
    let baseline_dps = calculator.evaluate_dps(&baseline, &DummyMonster).unwrap().dps;

    let mut options = OptimizerOptions::default();
    options.combat_style = Some(CombatStyle::Melee);
    let result = gear_optimizer::optimize(&baseline, &DummyMonster, &ctx, options).unwrap();

    let chosen_weapon = result.equipment.get(&Slot::Weapon).unwrap().as_ref().unwrap();
    let o = (chosen_weapon.offensive.stab, chosen_weapon.offensive.slash, chosen_weapon.offensive.crush);
    assert!(o.0 > 0 || o.1 > 0 || o.2 > 0 || chosen_weapon.bonuses.strength > 0);
    assert!(result.metrics.dps > baseline_dps);
    assert!(result.meta.evaluations > 100, "evaluations = {}", result.meta.evaluations);
}

/// S2 — blacklisting every one-handed weapon forces a two-hander with
/// no shield.
#[test]
fn s2_two_handed_dominates_when_one_handers_are_blacklisted() {
    let catalog = build_catalog();
    let price_store = PriceStore::new();
    let requirement_store = RequirementStore::new();
    let calculator = TotalCalculator;
    let config = EngineConfig::default();
    let ctx = context(&catalog, &price_store, &requirement_store, &calculator, &config);

    let player = player_with_whip();
    let mut options = OptimizerOptions::default();
    options.combat_style = Some(CombatStyle::Melee);
    options.constraints.blacklisted_items = one_handed_weapon_ids().into_iter().collect();

    let result = gear_optimizer::optimize(&player, &DummyMonster, &ctx, options).unwrap();
    let weapon = result.equipment.get(&Slot::Weapon).unwrap().as_ref().unwrap();
    assert!(weapon.is_two_handed);
    assert!(result.equipment.get(&Slot::Shield).unwrap().is_none());
}

/// S3 — a ranged run either picks an ammo-requiring weapon with valid
/// matched ammo, or leaves the ammo slot empty.
#[test]
fn s3_ranged_ammo_coupling_is_consistent() {
    let catalog = build_catalog();
    let price_store = PriceStore::new();
    let requirement_store = RequirementStore::new();
    let calculator = TotalCalculator;
    let config = EngineConfig::default();
    let ctx = context(&catalog, &price_store, &requirement_store, &calculator, &config);

    let player = player_with_whip();
    let mut options = OptimizerOptions::default();
    options.combat_style = Some(CombatStyle::Ranged);
    let result = gear_optimizer::optimize(&player, &DummyMonster, &ctx, options).unwrap();

    let weapon = result.equipment.get(&Slot::Weapon).unwrap().as_ref();
    let ammo = result.equipment.get(&Slot::Ammo).unwrap().as_ref();
    if let Some(weapon) = weapon {
        if weapon_requires_ammo(weapon) {
            let ammo = ammo.expect("ammo-requiring weapon must have ammo equipped");
            assert!(ammo_valid_for_weapon(weapon, ammo));
        } else {
            assert!(ammo.is_none() || weapon.id != TOXIC_BLOWPIPE);
        }
    }
}

/// S4 — forcing the blowpipe inlines a dart and picking a weaker dart
/// strictly lowers DPS.
#[test]
fn s4_blowpipe_inlines_a_dart_and_tier_matters() {
    let catalog = build_catalog();
    let price_store = PriceStore::new();
    let requirement_store = RequirementStore::new();
    let calculator = TotalCalculator;
    let config = EngineConfig::default();
    let ctx = context(&catalog, &price_store, &requirement_store, &calculator, &config);

    let player = player_with_whip();
    let mut options = OptimizerOptions::default();
    options.combat_style = Some(CombatStyle::Ranged);
    options.constraints.blacklisted_items = non_blowpipe_weapon_ids().into_iter().collect();

    let result = gear_optimizer::optimize(&player, &DummyMonster, &ctx, options).unwrap();
    let weapon = result.equipment.get(&Slot::Weapon).unwrap().as_ref().unwrap();
    assert_eq!(weapon.id, TOXIC_BLOWPIPE);
    assert!(result.equipment.get(&Slot::Ammo).unwrap().is_none());
    let dart_id = weapon.item_vars.dart_id.expect("blowpipe must inline a dart id");

    // Dragon dart outscores bronze dart (fixtures.rs), so the optimizer
    // must have picked it, and the folded-in ranged bonus reflects that.
    assert_eq!(dart_id, fixtures::DRAGON_DART);
    let dragon_tier_ranged = weapon.offensive.ranged;

    // Re-run with the dragon dart itself blacklisted: only the weaker
    // bronze dart remains, and its folded-in bonus is strictly lower.
    let mut weaker_options = OptimizerOptions::default();
    weaker_options.combat_style = Some(CombatStyle::Ranged);
    weaker_options.constraints.blacklisted_items =
        non_blowpipe_weapon_ids().into_iter().chain(std::iter::once(fixtures::DRAGON_DART)).collect();
    let weaker_result = gear_optimizer::optimize(&player, &DummyMonster, &ctx, weaker_options).unwrap();
    let weaker_weapon = weaker_result.equipment.get(&Slot::Weapon).unwrap().as_ref().unwrap();
    assert_eq!(weaker_weapon.item_vars.dart_id, Some(fixtures::BRONZE_DART));
    assert!(weaker_weapon.offensive.ranged < dragon_tier_ranged);
}

/// S5 — a tight budget never exceeds the cap and never beats the
/// unconstrained DPS.
#[test]
fn s5_budget_downgrade_respects_cap() {
    let catalog = build_catalog();
    let price_store = PriceStore::new();
    for item in &catalog {
        price_store.set_price(item.id, Some((item.id as u64) * 1_000), Some(true));
    }
    let requirement_store = RequirementStore::new();
    let calculator = TotalCalculator;
    let config = EngineConfig::default();
    let ctx = context(&catalog, &price_store, &requirement_store, &calculator, &config);

    let player = player_with_whip();
    let mut options = OptimizerOptions::default();
    options.combat_style = Some(CombatStyle::Melee);
    let unconstrained = gear_optimizer::optimize(&player, &DummyMonster, &ctx, options).unwrap();
    let cap = unconstrained.cost.total / 10;

    let mut tight_options = OptimizerOptions::default();
    tight_options.combat_style = Some(CombatStyle::Melee);
    tight_options.constraints.max_budget = Some(cap);
    let tight = gear_optimizer::optimize(&player, &DummyMonster, &ctx, tight_options).unwrap();

    assert!(tight.cost.total <= cap);
    assert!(tight.metrics.dps <= unconstrained.metrics.dps);
}

/// S6 — an owned item with a zero budget is still selected and costs
/// nothing.
#[test]
fn s6_owned_item_is_free_under_zero_budget() {
    let catalog = build_catalog();
    let price_store = PriceStore::new();
    for item in &catalog {
        price_store.set_price(item.id, Some((item.id as u64) * 1_000), Some(true));
    }
    let requirement_store = RequirementStore::new();
    let calculator = TotalCalculator;
    let config = EngineConfig::default();
    let ctx = context(&catalog, &price_store, &requirement_store, &calculator, &config);

    let player = player_with_whip();
    let mut options = OptimizerOptions::default();
    options.combat_style = Some(CombatStyle::Melee);
    let unconstrained = gear_optimizer::optimize(&player, &DummyMonster, &ctx, options).unwrap();
    let best_weapon_id = unconstrained.equipment.get(&Slot::Weapon).unwrap().as_ref().unwrap().id;

    let mut options = OptimizerOptions::default();
    options.combat_style = Some(CombatStyle::Melee);
    options.constraints.owned_items = HashSet::from([best_weapon_id]);
    options.constraints.max_budget = Some(0);
    let result = gear_optimizer::optimize(&player, &DummyMonster, &ctx, options).unwrap();

    let weapon = result.equipment.get(&Slot::Weapon).unwrap().as_ref().unwrap();
    assert_eq!(weapon.id, best_weapon_id);
    assert_eq!(*result.cost.per_slot.get(&Slot::Weapon).unwrap(), 0);
}

/// Invariant 1 — every result carries exactly eleven slot keys.
#[test]
fn invariant_equipment_has_all_eleven_slots() {
    let catalog = build_catalog();
    let price_store = PriceStore::new();
    let requirement_store = RequirementStore::new();
    let calculator = TotalCalculator;
    let config = EngineConfig::default();
    let ctx = context(&catalog, &price_store, &requirement_store, &calculator, &config);

    let player = player_with_whip();
    let result = gear_optimizer::optimize(&player, &DummyMonster, &ctx, OptimizerOptions::default()).unwrap();
    assert_eq!(result.equipment.len(), Slot::COUNT);
}

/// Invariant 5 — no blacklisted item appears anywhere in the result.
#[test]
fn invariant_blacklisted_items_never_appear() {
    let catalog = build_catalog();
    let price_store = PriceStore::new();
    let requirement_store = RequirementStore::new();
    let calculator = TotalCalculator;
    let config = EngineConfig::default();
    let ctx = context(&catalog, &price_store, &requirement_store, &calculator, &config);

    let player = player_with_whip();
    let mut options = OptimizerOptions::default();
    options.combat_style = Some(CombatStyle::Melee);
    options.constraints.blacklisted_items = HashSet::from([fixtures::ABYSSAL_WHIP, fixtures::DRAGON_SCIMITAR]);

    let result = gear_optimizer::optimize(&player, &DummyMonster, &ctx, options).unwrap();
    for item in result.equipment.values().flatten() {
        assert_ne!(item.id, ABYSSAL_WHIP);
        assert_ne!(item.id, fixtures::DRAGON_SCIMITAR);
    }
}

/// Invariant 10 — repeating the same optimization yields the same
/// equipment and metrics.
#[test]
fn invariant_optimize_is_deterministic() {
    let catalog = build_catalog();
    let price_store = PriceStore::new();
    let requirement_store = RequirementStore::new();
    let calculator = TotalCalculator;
    let config = EngineConfig::default();
    let ctx = context(&catalog, &price_store, &requirement_store, &calculator, &config);

    let player = player_with_whip();
    let run = || {
        let mut options = OptimizerOptions::default();
        options.combat_style = Some(CombatStyle::Melee);
        gear_optimizer::optimize(&player, &DummyMonster, &ctx, options).unwrap()
    };
    let first = run();
    let second = run();

    for slot in Slot::ALL {
        let a = first.equipment.get(&slot).unwrap().as_ref().map(|i| i.id);
        let b = second.equipment.get(&slot).unwrap().as_ref().map(|i| i.id);
        assert_eq!(a, b, "slot {slot} diverged between runs");
    }
    assert_eq!(first.metrics.dps, second.metrics.dps);
}

/// Invariant 13 — blacklisting every candidate for a slot leaves it
/// empty rather than erroring.
#[test]
fn invariant_blacklisting_every_candidate_leaves_slot_empty() {
    let catalog = build_catalog();
    let price_store = PriceStore::new();
    let requirement_store = RequirementStore::new();
    let calculator = TotalCalculator;
    let config = EngineConfig::default();
    let ctx = context(&catalog, &price_store, &requirement_store, &calculator, &config);

    let player = player_with_whip();
    let ring_ids: Vec<u32> = catalog.iter().filter(|i| i.slot == Slot::Ring).map(|i| i.id).collect();
    let mut options = OptimizerOptions::default();
    options.combat_style = Some(CombatStyle::Melee);
    options.constraints.blacklisted_items = ring_ids.into_iter().collect();

    let result = gear_optimizer::optimize(&player, &DummyMonster, &ctx, options).unwrap();
    assert!(result.equipment.get(&Slot::Ring).unwrap().is_none());
}

/// Invariant 14 — a very large budget matches the unconstrained
/// result.
#[test]
fn invariant_very_large_budget_matches_unconstrained() {
    let catalog = build_catalog();
    let price_store = PriceStore::new();
    for item in &catalog {
        price_store.set_price(item.id, Some((item.id as u64) * 100), Some(true));
    }
    let requirement_store = RequirementStore::new();
    let calculator = TotalCalculator;
    let config = EngineConfig::default();
    let ctx = context(&catalog, &price_store, &requirement_store, &calculator, &config);

    let player = player_with_whip();
    let mut options = OptimizerOptions::default();
    options.combat_style = Some(CombatStyle::Melee);
    let unconstrained = gear_optimizer::optimize(&player, &DummyMonster, &ctx, options).unwrap();

    let mut options = OptimizerOptions::default();
    options.combat_style = Some(CombatStyle::Melee);
    options.constraints.max_budget = Some(u64::MAX);
    let large_budget = gear_optimizer::optimize(&player, &DummyMonster, &ctx, options).unwrap();

    assert_eq!(unconstrained.metrics.dps, large_budget.metrics.dps);
    assert_eq!(unconstrained.cost.total, large_budget.cost.total);
}

/// Invariant 8 — progress events are monotonic and terminate with one
/// `complete` event at 100.
#[test]
fn invariant_progress_is_monotonic_and_terminates_at_complete() {
    let catalog = build_catalog();
    let price_store = PriceStore::new();
    let requirement_store = RequirementStore::new();
    let calculator = TotalCalculator;
    let config = EngineConfig::default();
    let ctx = context(&catalog, &price_store, &requirement_store, &calculator, &config);

    let player = player_with_whip();
    let mut events = Vec::new();
    {
        let mut sink = |event: gear_optimizer::ProgressEvent| events.push(event);
        let mut options = OptimizerOptions::default();
        options.combat_style = Some(CombatStyle::Melee);
        options.on_progress = Some(&mut sink);
        gear_optimizer::optimize(&player, &DummyMonster, &ctx, options).unwrap();
    }

    assert!(!events.is_empty());
    let mut last = 0u8;
    for event in &events {
        assert!(event.progress >= last);
        last = event.progress;
    }
    let final_event = events.last().unwrap();
    assert_eq!(final_event.progress, 100);
    assert_eq!(final_event.phase, gear_optimizer::Phase::Complete);
}

/// Invariant 2 — a two-handed weapon always leaves the shield slot
/// empty, even without a forcing blacklist.
#[test]
fn invariant_two_handed_weapon_implies_no_shield() {
    let catalog = build_catalog();
    let price_store = PriceStore::new();
    let requirement_store = RequirementStore::new();
    let calculator = TotalCalculator;
    let config = EngineConfig::default();
    let ctx = context(&catalog, &price_store, &requirement_store, &calculator, &config);

    let player = player_with_whip();
    let result = gear_optimizer::optimize(&player, &DummyMonster, &ctx, OptimizerOptions::default()).unwrap();
    let weapon = result.equipment.get(&Slot::Weapon).unwrap().as_ref();
    if let Some(weapon) = weapon {
        if weapon.is_two_handed {
            assert!(result.equipment.get(&Slot::Shield).unwrap().is_none());
        }
    }
}

/// Invariant validating `enforce_skill_requirements` without
/// `player_skills` is rejected as an input error, not silently ignored.
#[test]
fn enforce_skill_requirements_without_skills_is_invalid_input() {
    let catalog = build_catalog();
    let price_store = PriceStore::new();
    let requirement_store = RequirementStore::new();
    let calculator = TotalCalculator;
    let config = EngineConfig::default();
    let ctx = context(&catalog, &price_store, &requirement_store, &calculator, &config);

    let player = player_with_whip();
    let mut options = OptimizerOptions::default();
    options.constraints.enforce_skill_requirements = true;
    let result = gear_optimizer::optimize(&player, &DummyMonster, &ctx, options);
    assert!(matches!(result, Err(gear_optimizer::OptimizerError::InvalidInput(_))));
}
