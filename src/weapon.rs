//! Weapon coupling
//!
//! Two-handed-vs-shield branching, ammunition validity/selection,
//! blowpipe dart inlining, and powered-staff detection (`spec.md`
//! §4.4). This is deliberately a branch evaluated *before* the per-slot
//! greedy loop, not a nested greedy step, because the choice changes
//! which slots remain to fill (`spec.md` §9).

use crate::catalog::{category, AmmoKind, EquipmentPiece, ItemRef, Slot};
use crate::evaluator::{pick_best, DpsCalculator, EvaluatedItem, Objective};
use crate::player::Player;

/// Item identities detected as blowpipes. A dart-firing blowpipe holds
/// its dart inline via `item_vars.dart_id` instead of using the ammo
/// slot (`spec.md` §4.4).
pub const BLOWPIPE_NAMES: &[&str] = &["Toxic blowpipe", "Blowpipe"];

pub fn is_blowpipe(weapon: &EquipmentPiece) -> bool {
    BLOWPIPE_NAMES.contains(&weapon.name.as_str())
}

/// Powered staves supply their own attack and force the wielder's style
/// to magic (`spec.md` §4.4).
pub fn is_powered_staff(weapon: &EquipmentPiece) -> bool {
    weapon.has_category(category::POWERED_STAFF)
}

/// TzHaar-family weapons, needed for the obsidian set's eligibility
/// refinement (`spec.md` §4.6).
pub fn is_tzhaar_weapon(weapon: &EquipmentPiece) -> bool {
    weapon.has_category(category::TZHAAR_WEAPON)
}

/// Darts are catalogued separately from ordinary weapons/ammo; callers
/// pass the dart pool explicitly to [`find_best_dart`]. This helper
/// narrows a mixed pool down to items tagged as darts.
pub fn filter_darts(pool: &[ItemRef]) -> Vec<ItemRef> {
    pool.iter().filter(|p| p.has_category(category::DART)).cloned().collect()
}

pub fn weapon_requires_ammo(weapon: &EquipmentPiece) -> bool {
    weapon.ammo_coupling.as_ref().map(|c| c.required).unwrap_or(false)
}

/// Whether `ammo`'s kind is accepted by `weapon` and its tier doesn't
/// exceed the weapon's cap.
pub fn ammo_valid_for_weapon(weapon: &EquipmentPiece, ammo: &EquipmentPiece) -> bool {
    let Some(coupling) = &weapon.ammo_coupling else {
        return false;
    };
    let Some(ammo_kind) = ammo.ammo_kind else {
        return false;
    };
    if !coupling.accepted_ammo_kinds.contains(&ammo_kind) {
        return false;
    }
    match (coupling.max_ammo_tier, ammo.ammo_tier) {
        (Some(max), Some(tier)) => tier <= max,
        (Some(_), None) => false,
        (None, _) => true,
    }
}

/// The outcome of a 2H-vs-1H+shield, ammo, or dart sub-search.
#[derive(Debug, Clone)]
pub struct CouplingResult {
    pub weapon: Option<ItemRef>,
    pub shield: Option<ItemRef>,
    pub ammo: Option<ItemRef>,
    pub evaluated: EvaluatedItem,
    pub evaluations: usize,
}

/// Choose between the best two-handed weapon (shield slot left empty)
/// and the best one-handed-weapon + shield pairing.
///
/// Ties prefer 2H, "fewer moving parts" (`spec.md` §4.4).
pub fn choose_weapon_and_shield<M: Sync>(
    player: &Player,
    monster: &M,
    weapons: &[ItemRef],
    shields: &[ItemRef],
    calculator: &dyn (DpsCalculator<M> + Sync),
    objective: Objective,
    parallel_threshold: usize,
) -> anyhow::Result<CouplingResult> {
    let (two_handed, one_handed): (Vec<ItemRef>, Vec<ItemRef>) =
        weapons.iter().cloned().partition(|w| w.is_two_handed);

    let mut evaluations = 0usize;

    let best_2h = pick_best(player, monster, Slot::Weapon, &two_handed, calculator, objective, parallel_threshold)?;
    evaluations += two_handed.len();

    // For each 1H weapon, equip it first, then pick the best shield with
    // that weapon held fixed in context.
    let mut best_1h_pair: Option<(ItemRef, Option<ItemRef>, EvaluatedItem)> = None;
    for weapon in &one_handed {
        let with_weapon = player.with_equipped(Slot::Weapon, Some(weapon.clone()));
        let best_shield =
            pick_best(&with_weapon, monster, Slot::Shield, shields, calculator, objective, parallel_threshold)?;
        evaluations += shields.len().max(1);

        let candidate = match best_shield {
            Some((_, evaluated)) => (weapon.clone(), evaluated.item.clone(), evaluated),
            None => {
                let evaluated = crate::evaluator::evaluate_item(
                    &with_weapon,
                    monster,
                    Slot::Shield,
                    None,
                    calculator,
                    objective,
                )?;
                (weapon.clone(), None, evaluated)
            }
        };

        match &best_1h_pair {
            Some((_, _, current)) if current.score >= candidate.2.score => {}
            _ => best_1h_pair = Some(candidate),
        }
    }

    let chosen = match (best_2h, best_1h_pair) {
        (Some((_, two_handed_eval)), Some((one_weapon, one_shield, one_eval))) => {
            if two_handed_eval.score >= one_eval.score {
                CouplingResult {
                    weapon: two_handed_eval.item.clone(),
                    shield: None,
                    ammo: None,
                    evaluated: two_handed_eval,
                    evaluations,
                }
            } else {
                CouplingResult {
                    weapon: Some(one_weapon),
                    shield: one_shield,
                    ammo: None,
                    evaluated: one_eval,
                    evaluations,
                }
            }
        }
        (Some((_, two_handed_eval)), None) => CouplingResult {
            weapon: two_handed_eval.item.clone(),
            shield: None,
            ammo: None,
            evaluated: two_handed_eval,
            evaluations,
        },
        (None, Some((one_weapon, one_shield, one_eval))) => CouplingResult {
            weapon: Some(one_weapon),
            shield: one_shield,
            ammo: None,
            evaluated: one_eval,
            evaluations,
        },
        (None, None) => {
            let evaluated =
                crate::evaluator::evaluate_item(player, monster, Slot::Weapon, None, calculator, objective)?;
            CouplingResult {
                weapon: None,
                shield: None,
                ammo: None,
                evaluated,
                evaluations,
            }
        }
    };

    Ok(chosen)
}

/// Filter `ammo_pool` to ammo valid for `weapon`, apply the blacklist,
/// and evaluate each with the weapon equipped (`spec.md` §4.4).
pub fn find_best_ammo<M: Sync>(
    player: &Player,
    monster: &M,
    weapon: &EquipmentPiece,
    ammo_pool: &[ItemRef],
    blacklist: &std::collections::HashSet<u32>,
    calculator: &dyn (DpsCalculator<M> + Sync),
    objective: Objective,
    parallel_threshold: usize,
) -> anyhow::Result<CouplingResult> {
    let valid: Vec<ItemRef> = ammo_pool
        .iter()
        .filter(|ammo| ammo_valid_for_weapon(weapon, ammo) && !blacklist.contains(&ammo.id))
        .cloned()
        .collect();

    let picked = pick_best(player, monster, Slot::Ammo, &valid, calculator, objective, parallel_threshold)?;
    let evaluations = valid.len();
    match picked {
        Some((_, evaluated)) => Ok(CouplingResult {
            weapon: None,
            shield: None,
            ammo: evaluated.item.clone(),
            evaluated,
            evaluations,
        }),
        None => {
            let evaluated = crate::evaluator::evaluate_item(player, monster, Slot::Ammo, None, calculator, objective)?;
            Ok(CouplingResult {
                weapon: None,
                shield: None,
                ammo: None,
                evaluated,
                evaluations,
            })
        }
    }
}

/// Enumerate valid darts, inline each into a fresh blowpipe clone, and
/// return the top scorer (`spec.md` §4.4). The returned weapon already
/// carries the chosen dart in `item_vars.dart_id`; the ammo slot stays
/// empty.
pub fn find_best_dart<M: Sync>(
    player: &Player,
    monster: &M,
    blowpipe: &ItemRef,
    darts: &[ItemRef],
    blacklist: &std::collections::HashSet<u32>,
    calculator: &dyn (DpsCalculator<M> + Sync),
    objective: Objective,
    parallel_threshold: usize,
) -> anyhow::Result<CouplingResult> {
    let candidates: Vec<ItemRef> = darts
        .iter()
        .filter(|d| !blacklist.contains(&d.id))
        .map(|dart| inline_dart(blowpipe, dart))
        .collect();

    let picked = pick_best(player, monster, Slot::Weapon, &candidates, calculator, objective, parallel_threshold)?;
    let evaluations = candidates.len();
    match picked {
        Some((_, evaluated)) => Ok(CouplingResult {
            weapon: evaluated.item.clone(),
            shield: None,
            ammo: None,
            evaluated,
            evaluations,
        }),
        None => {
            let evaluated = crate::evaluator::evaluate_item(
                player,
                monster,
                Slot::Weapon,
                Some(blowpipe.clone()),
                calculator,
                objective,
            )?;
            Ok(CouplingResult {
                weapon: Some(blowpipe.clone()),
                shield: None,
                ammo: None,
                evaluated,
                evaluations,
            })
        }
    }
}

/// Clone `blowpipe` with `dart`'s id inlined into `item_vars`, folding
/// in the dart's strength bonuses so evaluation sees the combined stats.
fn inline_dart(blowpipe: &ItemRef, dart: &ItemRef) -> ItemRef {
    let mut piece = (**blowpipe).clone();
    piece.item_vars.dart_id = Some(dart.id);
    piece.offensive.ranged += dart.offensive.ranged;
    piece.bonuses.ranged_strength += dart.bonuses.ranged_strength;
    std::sync::Arc::new(piece)
}
