//! Shared fixture catalog and calculator for the black-box integration
//! suite. Not a real game database — just enough items to exercise
//! every pipeline phase (`spec.md` §8).

use std::sync::Arc;

use gear_optimizer::{AmmoCoupling, AmmoKind, CombatBonuses, EquipmentPiece, ItemRef, ItemVars, MiscBonuses, Slot};
use gear_optimizer::{DpsCalculator, DpsMetrics, Player};

pub struct DummyMonster;

/// Scores a loadout as the flat sum of every offensive/misc bonus.
/// Good enough to give every candidate a distinct, comparable score
/// without modeling a real combat formula the engine doesn't own.
pub struct TotalCalculator;

impl DpsCalculator<DummyMonster> for TotalCalculator {
    fn evaluate_dps(&self, player: &Player, _monster: &DummyMonster) -> anyhow::Result<DpsMetrics> {
        let agg = player.loadout.aggregates_ref();
        let total = agg.offensive.stab
            + agg.offensive.slash
            + agg.offensive.crush
            + agg.offensive.ranged
            + agg.offensive.magic
            + agg.bonuses.strength
            + agg.bonuses.ranged_strength
            + agg.bonuses.magic_strength;
        Ok(DpsMetrics {
            dps: total as f64,
            hit_chance: 0.65,
            max_hit: (agg.bonuses.strength.max(0) as u32) + 1,
        })
    }
}

pub const ABYSSAL_WHIP: u32 = 1;
pub const DRAGON_SCIMITAR: u32 = 2;
pub const SOULREAPER_AXE: u32 = 3;
pub const BRONZE_SWORD: u32 = 4;
pub const RUNE_CROSSBOW: u32 = 5;
pub const TOXIC_BLOWPIPE: u32 = 6;

pub const DRAGONFIRE_SHIELD: u32 = 10;
pub const AVERNIC_DEFENDER: u32 = 11;

pub const ADAMANT_BOLTS: u32 = 20;
pub const RUNE_BOLTS: u32 = 21;
pub const DRAGON_BOLTS: u32 = 22; // tier above the crossbow's cap

pub const DRAGON_DART: u32 = 30;
pub const BRONZE_DART: u32 = 31;

fn weapon(id: u32, name: &str, two_handed: bool, stab: i32, slash: i32, strength: i32) -> ItemRef {
    Arc::new(EquipmentPiece {
        id,
        name: name.to_string(),
        version: None,
        category: None,
        slot: Slot::Weapon,
        is_two_handed: two_handed,
        speed: 4,
        offensive: CombatBonuses { stab, slash, ..Default::default() },
        defensive: CombatBonuses::default(),
        bonuses: MiscBonuses { strength, ..Default::default() },
        ammo_kind: None,
        ammo_tier: None,
        ammo_coupling: None,
        item_vars: ItemVars::default(),
    })
}

fn shield(id: u32, name: &str, defence: i32) -> ItemRef {
    Arc::new(EquipmentPiece {
        id,
        name: name.to_string(),
        version: None,
        category: None,
        slot: Slot::Shield,
        is_two_handed: false,
        speed: 0,
        offensive: CombatBonuses::default(),
        defensive: CombatBonuses { stab: defence, slash: defence, crush: defence, ..Default::default() },
        bonuses: MiscBonuses { strength: defence / 2, ..Default::default() },
        ammo_kind: None,
        ammo_tier: None,
        ammo_coupling: None,
        item_vars: ItemVars::default(),
    })
}

fn bolt(id: u32, name: &str, tier: u32, ranged: i32, ranged_strength: i32) -> ItemRef {
    Arc::new(EquipmentPiece {
        id,
        name: name.to_string(),
        version: None,
        category: None,
        slot: Slot::Ammo,
        is_two_handed: false,
        speed: 0,
        offensive: CombatBonuses { ranged, ..Default::default() },
        defensive: CombatBonuses::default(),
        bonuses: MiscBonuses { ranged_strength, ..Default::default() },
        ammo_kind: Some(AmmoKind::Bolt),
        ammo_tier: Some(tier),
        ammo_coupling: None,
        item_vars: ItemVars::default(),
    })
}

fn dart(id: u32, name: &str, ranged: i32, ranged_strength: i32) -> ItemRef {
    Arc::new(EquipmentPiece {
        id,
        name: name.to_string(),
        version: None,
        category: Some(gear_optimizer::category::DART.to_string()),
        slot: Slot::Weapon,
        is_two_handed: false,
        speed: 0,
        offensive: CombatBonuses { ranged, ..Default::default() },
        defensive: CombatBonuses::default(),
        bonuses: MiscBonuses { ranged_strength, ..Default::default() },
        ammo_kind: None,
        ammo_tier: None,
        ammo_coupling: None,
        item_vars: ItemVars::default(),
    })
}

/// Filler pieces for the eight non-weapon/shield/ammo slots, enough of
/// them to push `meta.evaluations` well past S1's `> 100` floor.
fn filler(id: u32, slot: Slot, strength: i32, ranged_strength: i32) -> ItemRef {
    Arc::new(EquipmentPiece {
        id,
        name: format!("filler-{id}"),
        version: None,
        category: None,
        slot,
        is_two_handed: false,
        speed: 0,
        offensive: CombatBonuses::default(),
        defensive: CombatBonuses::default(),
        bonuses: MiscBonuses { strength, ranged_strength, ..Default::default() },
        ammo_kind: None,
        ammo_tier: None,
        ammo_coupling: None,
        item_vars: ItemVars::default(),
    })
}

pub fn named_weapons() -> Vec<ItemRef> {
    vec![
        weapon(ABYSSAL_WHIP, "Abyssal whip", false, 0, 82, 82),
        weapon(DRAGON_SCIMITAR, "Dragon scimitar", false, 0, 67, 66),
        weapon(SOULREAPER_AXE, "Soulreaper axe", true, 0, 125, 120),
        weapon(BRONZE_SWORD, "Bronze sword", false, 5, 0, 5),
        Arc::new(EquipmentPiece {
            id: RUNE_CROSSBOW,
            name: "Rune crossbow".into(),
            version: None,
            category: None,
            slot: Slot::Weapon,
            is_two_handed: false,
            speed: 5,
            offensive: CombatBonuses::default(),
            defensive: CombatBonuses::default(),
            bonuses: MiscBonuses::default(),
            ammo_kind: None,
            ammo_tier: None,
            ammo_coupling: Some(AmmoCoupling {
                required: true,
                accepted_ammo_kinds: vec![AmmoKind::Bolt],
                max_ammo_tier: Some(5),
            }),
            item_vars: ItemVars::default(),
        }),
        Arc::new(EquipmentPiece {
            id: TOXIC_BLOWPIPE,
            name: "Toxic blowpipe".into(),
            version: None,
            category: None,
            slot: Slot::Weapon,
            is_two_handed: false,
            speed: 3,
            offensive: CombatBonuses::default(),
            defensive: CombatBonuses::default(),
            bonuses: MiscBonuses::default(),
            ammo_kind: None,
            ammo_tier: None,
            ammo_coupling: None,
            item_vars: ItemVars::default(),
        }),
    ]
}

/// The full fixture catalog: named weapons/shields/ammo/darts plus
/// filler pieces for every other slot.
pub fn build_catalog() -> Vec<ItemRef> {
    let mut items = named_weapons();
    items.push(shield(DRAGONFIRE_SHIELD, "Dragonfire shield", 30));
    items.push(shield(AVERNIC_DEFENDER, "Avernic defender", 40));
    items.push(bolt(ADAMANT_BOLTS, "Adamant bolts", 3, 25, 25));
    items.push(bolt(RUNE_BOLTS, "Rune bolts", 5, 35, 35));
    items.push(bolt(DRAGON_BOLTS, "Dragon bolts", 9, 60, 60));
    items.push(dart(DRAGON_DART, "Dragon dart", 20, 20));
    items.push(dart(BRONZE_DART, "Bronze dart", 5, 5));

    let filler_slots = [Slot::Neck, Slot::Ring, Slot::Cape, Slot::Head, Slot::Body, Slot::Legs, Slot::Hands, Slot::Feet];
    let mut next_id = 100;
    for &slot in &filler_slots {
        for step in 1..=6 {
            items.push(filler(next_id, slot, step * 3, step * 3));
            next_id += 1;
        }
    }
    items
}

pub fn one_handed_weapon_ids() -> Vec<u32> {
    named_weapons().into_iter().filter(|w| !w.is_two_handed).map(|w| w.id).collect()
}

pub fn non_blowpipe_weapon_ids() -> Vec<u32> {
    named_weapons().into_iter().filter(|w| w.id != TOXIC_BLOWPIPE).map(|w| w.id).collect()
}

pub fn player_with_whip() -> Player {
    use gear_optimizer::{AttackStyle, Skills};
    Player::new(Skills::maxed(), AttackStyle::Slash)
        .with_equipped(Slot::Weapon, named_weapons().into_iter().find(|w| w.id == ABYSSAL_WHIP))
}
