//! Set-bonus engine
//!
//! A fixed registry of named multi-slot equipment sets, each locking
//! several slots at once for an effect beyond the sum of their raw
//! stats. Modeled as data records rather than polymorphic types, with
//! the two eligibility refinements (obsidian needs a TzHaar weapon,
//! inquisitor needs the crush attack style) living next to their
//! descriptors (`spec.md` §4.6, §9).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{filter_by_blacklist, CombatStyle, ItemRef, Slot};
use crate::evaluator::{DpsCalculator, DpsMetrics, Objective};
use crate::greedy::{fill_remaining_slots, SLOT_ORDER};
use crate::player::{AttackStyle, Player};
use crate::weapon::{
    choose_weapon_and_shield, find_best_ammo, find_best_dart, is_blowpipe, is_tzhaar_weapon, weapon_requires_ammo,
};
use crate::Constraints;

/// The seven named sets the registry knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetType {
    VoidMelee,
    VoidRanged,
    VoidMagic,
    EliteVoidRanged,
    EliteVoidMagic,
    Inquisitor,
    Obsidian,
}

/// A named multi-slot set: which slots it locks, which piece names
/// satisfy each slot, and the style it applies to.
#[derive(Debug, Clone)]
pub struct SetDefinition {
    pub set_type: SetType,
    pub name: &'static str,
    pub combat_style: CombatStyle,
    pub pieces: &'static [(Slot, &'static [&'static str])],
    pub bonus: &'static str,
}

macro_rules! set_def {
    ($set_type:expr, $name:expr, $style:expr, $pieces:expr, $bonus:expr) => {
        SetDefinition {
            set_type: $set_type,
            name: $name,
            combat_style: $style,
            pieces: $pieces,
            bonus: $bonus,
        }
    };
}

const VOID_KNIGHT_BODY: &[&str] = &["Void knight top"];
const VOID_KNIGHT_LEGS: &[&str] = &["Void knight robe"];
const VOID_KNIGHT_GLOVES: &[&str] = &["Void knight gloves"];
const ELITE_VOID_BODY: &[&str] = &["Elite void top"];
const ELITE_VOID_LEGS: &[&str] = &["Elite void robe"];

static REGISTRY: &[SetDefinition] = &[
    set_def!(
        SetType::VoidMelee,
        "Void melee",
        CombatStyle::Melee,
        &[
            (Slot::Head, &["Void melee helm"]),
            (Slot::Body, VOID_KNIGHT_BODY),
            (Slot::Legs, VOID_KNIGHT_LEGS),
            (Slot::Hands, VOID_KNIGHT_GLOVES),
        ],
        "10% melee accuracy and damage"
    ),
    set_def!(
        SetType::VoidRanged,
        "Void ranged",
        CombatStyle::Ranged,
        &[
            (Slot::Head, &["Void ranger helm"]),
            (Slot::Body, VOID_KNIGHT_BODY),
            (Slot::Legs, VOID_KNIGHT_LEGS),
            (Slot::Hands, VOID_KNIGHT_GLOVES),
        ],
        "10% ranged accuracy and damage"
    ),
    set_def!(
        SetType::VoidMagic,
        "Void magic",
        CombatStyle::Magic,
        &[
            (Slot::Head, &["Void mage helm"]),
            (Slot::Body, VOID_KNIGHT_BODY),
            (Slot::Legs, VOID_KNIGHT_LEGS),
            (Slot::Hands, VOID_KNIGHT_GLOVES),
        ],
        "45% magic damage"
    ),
    set_def!(
        SetType::EliteVoidRanged,
        "Elite void ranged",
        CombatStyle::Ranged,
        &[
            (Slot::Head, &["Void ranger helm"]),
            (Slot::Body, ELITE_VOID_BODY),
            (Slot::Legs, ELITE_VOID_LEGS),
            (Slot::Hands, VOID_KNIGHT_GLOVES),
        ],
        "12.5% ranged accuracy and damage"
    ),
    set_def!(
        SetType::EliteVoidMagic,
        "Elite void magic",
        CombatStyle::Magic,
        &[
            (Slot::Head, &["Void mage helm"]),
            (Slot::Body, ELITE_VOID_BODY),
            (Slot::Legs, ELITE_VOID_LEGS),
            (Slot::Hands, VOID_KNIGHT_GLOVES),
        ],
        "50% magic damage"
    ),
    set_def!(
        SetType::Inquisitor,
        "Inquisitor's armour",
        CombatStyle::Melee,
        &[
            (Slot::Head, &["Inquisitor's great helm"]),
            (Slot::Body, &["Inquisitor's hauberk"]),
            (Slot::Legs, &["Inquisitor's plateskirt"]),
        ],
        "up to 2.5% crush accuracy and damage per piece"
    ),
    set_def!(
        SetType::Obsidian,
        "Obsidian armour",
        CombatStyle::Melee,
        &[
            (Slot::Head, &["Obsidian helm"]),
            (Slot::Body, &["Obsidian platebody"]),
            (Slot::Legs, &["Obsidian platelegs"]),
        ],
        "10% melee accuracy and damage with a TzHaar weapon"
    ),
];

/// Look up a set's static descriptor.
pub fn set_bonus_definition(set_type: SetType) -> &'static SetDefinition {
    REGISTRY
        .iter()
        .find(|d| d.set_type == set_type)
        .expect("every SetType has a registry entry")
}

/// All sets that apply to `style`, in registry order (first available
/// wins on equal score — `spec.md` §9 open question).
pub fn set_bonuses_for_style(style: CombatStyle) -> Vec<&'static SetDefinition> {
    REGISTRY.iter().filter(|d| d.combat_style == style).collect()
}

/// Per-slot detection outcome for one set.
#[derive(Debug, Clone)]
pub struct SetDetection {
    pub set_type: SetType,
    pub available: bool,
    pub can_equip: bool,
    pub pieces_by_slot: HashMap<Slot, ItemRef>,
    pub missing_pieces: Vec<Slot>,
}

/// For each slot the set locks, try to find any matching, non-blacklisted
/// piece in `pool` (`spec.md` §4.6). `can_equip` additionally requires
/// skill requirements to be met when `constraints.enforce_skill_requirements`
/// is set.
pub fn detect_set_bonus(set_type: SetType, pool: &[ItemRef], constraints: &Constraints) -> SetDetection {
    let def = set_bonus_definition(set_type);
    let pool = filter_by_blacklist(&constraints.blacklisted_items, pool);

    let mut pieces_by_slot = HashMap::new();
    let mut missing_pieces = Vec::new();

    for &(slot, names) in def.pieces {
        let found = pool.iter().find(|item| item.slot == slot && names.contains(&item.name.as_str()));
        match found {
            Some(item) => {
                pieces_by_slot.insert(slot, item.clone());
            }
            None => missing_pieces.push(slot),
        }
    }

    let available = missing_pieces.is_empty();
    let can_equip = available
        && (!constraints.enforce_skill_requirements
            || pieces_by_slot.values().all(|item| {
                constraints
                    .player_skills
                    .as_ref()
                    .map(|skills| crate::requirements::RequirementStore::global().meets_requirements(item.id, skills))
                    .unwrap_or(true)
            }));

    SetDetection {
        set_type,
        available,
        can_equip,
        pieces_by_slot,
        missing_pieces,
    }
}

/// Detect every registered set against `pool`, optionally restricted to
/// sets matching `style`.
pub fn detect_all_set_bonuses(
    pool: &[ItemRef],
    style: Option<CombatStyle>,
    constraints: &Constraints,
) -> Vec<SetDetection> {
    REGISTRY
        .iter()
        .filter(|d| style.map(|s| d.combat_style == s).unwrap_or(true))
        .map(|d| detect_set_bonus(d.set_type, pool, constraints))
        .collect()
}

/// Only the sets that are fully available and equippable.
pub fn available_set_bonuses(pool: &[ItemRef], style: Option<CombatStyle>, constraints: &Constraints) -> Vec<SetDetection> {
    detect_all_set_bonuses(pool, style, constraints)
        .into_iter()
        .filter(|d| d.available && d.can_equip)
        .collect()
}

/// A reason a detected set can't actually be used in this run.
fn eligibility_refinement_reason(
    set_type: SetType,
    player: &Player,
    weapons_after_constraints: &[ItemRef],
) -> Option<String> {
    match set_type {
        SetType::Obsidian => {
            if weapons_after_constraints.iter().any(|w| is_tzhaar_weapon(w)) {
                None
            } else {
                Some("no TzHaar-family weapon available".to_string())
            }
        }
        SetType::Inquisitor => {
            if player.style == AttackStyle::Crush {
                None
            } else {
                Some("Inquisitor set requires crush attack style".to_string())
            }
        }
        _ => None,
    }
}

/// Build the partial, set-locked loadout for an available set, or
/// `None` if it isn't available.
pub fn build_set_loadout(set_type: SetType, pool: &[ItemRef], constraints: &Constraints) -> Option<HashMap<Slot, ItemRef>> {
    let detection = detect_set_bonus(set_type, pool, constraints);
    if detection.available && detection.can_equip {
        Some(detection.pieces_by_slot)
    } else {
        None
    }
}

/// Full evaluation of one set loadout against a player/monster pair.
#[derive(Debug, Clone)]
pub struct SetEvaluation {
    pub set_type: SetType,
    pub equipment: Player,
    pub metrics: DpsMetrics,
    pub score: f64,
    pub is_valid: bool,
    pub invalid_reason: Option<String>,
}

/// Evaluate one named set: lock its slots, fill the rest via weapon
/// coupling + greedy, and score the result (`spec.md` §4.6).
#[allow(clippy::too_many_arguments)]
pub fn evaluate_set_loadout<M: Sync>(
    set_type: SetType,
    player: &Player,
    monster: &M,
    pool: &[ItemRef],
    weapons: &[ItemRef],
    shields: &[ItemRef],
    ammo_pool: &[ItemRef],
    dart_pool: &[ItemRef],
    constraints: &Constraints,
    calculator: &dyn (DpsCalculator<M> + Sync),
    objective: Objective,
    parallel_threshold: usize,
) -> anyhow::Result<SetEvaluation> {
    let detection = detect_set_bonus(set_type, pool, constraints);
    if !detection.available {
        return Ok(invalid_evaluation(
            set_type,
            player.clone(),
            format!("missing pieces for slots: {:?}", detection.missing_pieces),
        ));
    }
    if !detection.can_equip {
        return Ok(invalid_evaluation(
            set_type,
            player.clone(),
            "skill requirements not met for one or more set pieces".to_string(),
        ));
    }
    if let Some(reason) = eligibility_refinement_reason(set_type, player, weapons) {
        return Ok(invalid_evaluation(set_type, player.clone(), reason));
    }

    let mut locked = player.clone();
    for (&slot, item) in &detection.pieces_by_slot {
        locked = locked.with_equipped(slot, Some(item.clone()));
    }

    let locked_slots: HashSet<Slot> = detection.pieces_by_slot.keys().copied().collect();

    // Weapon slot: apply coupling unless the set itself locks it.
    if !locked_slots.contains(&Slot::Weapon) {
        let coupling =
            choose_weapon_and_shield(&locked, monster, weapons, shields, calculator, objective, parallel_threshold)?;
        locked = locked.with_equipped(Slot::Weapon, coupling.weapon.clone());
        if !locked_slots.contains(&Slot::Shield) {
            locked = locked.with_equipped(Slot::Shield, coupling.shield.clone());
        }
    }

    // Ammo/dart: apply the same rules against the final weapon as the
    // weapons phase, unless set-locked (`spec.md` §4.4, invariant 3).
    if !locked_slots.contains(&Slot::Ammo) {
        if let Some(weapon) = locked.loadout.weapon().cloned() {
            if is_blowpipe(&weapon) {
                let dart_result = find_best_dart(
                    &locked,
                    monster,
                    &weapon,
                    dart_pool,
                    &constraints.blacklisted_items,
                    calculator,
                    objective,
                    parallel_threshold,
                )?;
                locked = locked.with_equipped(Slot::Weapon, dart_result.weapon.or(Some(weapon)));
            } else if weapon_requires_ammo(&weapon) {
                let ammo_result = find_best_ammo(
                    &locked,
                    monster,
                    &weapon,
                    ammo_pool,
                    &constraints.blacklisted_items,
                    calculator,
                    objective,
                    parallel_threshold,
                )?;
                locked = locked.with_equipped(Slot::Ammo, ammo_result.ammo);
            }
        }
    }

    // Remaining non-locked, non-weapon/shield/ammo slots via greedy.
    let remaining_order: Vec<Slot> = SLOT_ORDER.into_iter().filter(|s| !locked_slots.contains(s)).collect();
    let mut pools_by_slot: HashMap<Slot, Vec<ItemRef>> = HashMap::new();
    for &slot in &remaining_order {
        pools_by_slot.insert(slot, crate::catalog::filter_by_slot(slot, pool));
    }
    let (mut filled, _) = fill_remaining_slots(
        &locked,
        monster,
        &pools_by_slot,
        &remaining_order,
        calculator,
        objective,
        parallel_threshold,
        None,
    )?;
    let _ = filled.loadout.aggregates();
    let metrics = calculator.evaluate_dps(&filled, monster)?;
    let score = metrics.score(objective);

    Ok(SetEvaluation {
        set_type,
        equipment: filled,
        metrics,
        score,
        is_valid: true,
        invalid_reason: None,
    })
}

fn invalid_evaluation(set_type: SetType, player: Player, reason: String) -> SetEvaluation {
    SetEvaluation {
        set_type,
        equipment: player,
        metrics: DpsMetrics {
            dps: 0.0,
            hit_chance: 0.0,
            max_hit: 0,
        },
        score: f64::MIN,
        is_valid: false,
        invalid_reason: Some(reason),
    }
}

/// Evaluate every set applicable to `style` and return the
/// highest-scoring one that strictly beats `greedy_score`, or `None`.
#[allow(clippy::too_many_arguments)]
pub fn find_best_set_loadout<M: Sync>(
    player: &Player,
    monster: &M,
    style: CombatStyle,
    pool: &[ItemRef],
    weapons: &[ItemRef],
    shields: &[ItemRef],
    ammo_pool: &[ItemRef],
    dart_pool: &[ItemRef],
    constraints: &Constraints,
    calculator: &dyn (DpsCalculator<M> + Sync),
    objective: Objective,
    parallel_threshold: usize,
    greedy_score: f64,
) -> anyhow::Result<Option<SetEvaluation>> {
    let mut best: Option<SetEvaluation> = None;
    for def in set_bonuses_for_style(style) {
        let evaluation = evaluate_set_loadout(
            def.set_type,
            player,
            monster,
            pool,
            weapons,
            shields,
            ammo_pool,
            dart_pool,
            constraints,
            calculator,
            objective,
            parallel_threshold,
        )?;
        if !evaluation.is_valid {
            continue;
        }
        if evaluation.score <= greedy_score {
            continue;
        }
        match &best {
            Some(current) if current.score >= evaluation.score => {}
            _ => best = Some(evaluation),
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CombatBonuses, EquipmentPiece, ItemVars, MiscBonuses};
    use crate::player::Skills;
    use std::sync::Arc;

    fn piece(id: u32, slot: Slot, name: &str) -> ItemRef {
        Arc::new(EquipmentPiece {
            id,
            name: name.into(),
            version: None,
            category: None,
            slot,
            is_two_handed: false,
            speed: 0,
            offensive: CombatBonuses::default(),
            defensive: CombatBonuses::default(),
            bonuses: MiscBonuses { strength: 5, ..Default::default() },
            ammo_kind: None,
            ammo_tier: None,
            ammo_coupling: None,
            item_vars: ItemVars::default(),
        })
    }

    fn void_melee_pool() -> Vec<ItemRef> {
        vec![
            piece(1, Slot::Head, "Void melee helm"),
            piece(2, Slot::Body, "Void knight top"),
            piece(3, Slot::Legs, "Void knight robe"),
            piece(4, Slot::Hands, "Void knight gloves"),
        ]
    }

    #[test]
    fn detect_set_bonus_finds_all_pieces() {
        let pool = void_melee_pool();
        let constraints = Constraints::default();
        let detection = detect_set_bonus(SetType::VoidMelee, &pool, &constraints);
        assert!(detection.available);
        assert!(detection.can_equip);
        assert_eq!(detection.pieces_by_slot.len(), 4);
    }

    #[test]
    fn detect_set_bonus_reports_missing_pieces() {
        let mut pool = void_melee_pool();
        pool.truncate(2);
        let constraints = Constraints::default();
        let detection = detect_set_bonus(SetType::VoidMelee, &pool, &constraints);
        assert!(!detection.available);
        assert_eq!(detection.missing_pieces.len(), 2);
    }

    #[test]
    fn blacklisting_a_set_piece_makes_it_unavailable() {
        let pool = void_melee_pool();
        let mut constraints = Constraints::default();
        constraints.blacklisted_items.insert(1);
        let detection = detect_set_bonus(SetType::VoidMelee, &pool, &constraints);
        assert!(!detection.available);
        assert!(detection.missing_pieces.contains(&Slot::Head));
    }

    #[test]
    fn inquisitor_rejected_without_crush_style() {
        let player = Player::new(Skills::maxed(), AttackStyle::Slash);
        let reason = eligibility_refinement_reason(SetType::Inquisitor, &player, &[]);
        assert_eq!(reason, Some("Inquisitor set requires crush attack style".to_string()));
    }

    #[test]
    fn inquisitor_allowed_with_crush_style() {
        let player = Player::new(Skills::maxed(), AttackStyle::Crush);
        let reason = eligibility_refinement_reason(SetType::Inquisitor, &player, &[]);
        assert_eq!(reason, None);
    }

    #[test]
    fn obsidian_rejected_without_tzhaar_weapon() {
        let player = Player::new(Skills::maxed(), AttackStyle::Crush);
        let reason = eligibility_refinement_reason(SetType::Obsidian, &player, &[]);
        assert!(reason.unwrap().contains("TzHaar"));
    }
}
