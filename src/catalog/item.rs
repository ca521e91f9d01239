//! Equipment item definitions
//!
//! Mirrors the stat layout of `spec.md` §3's `EquipmentPiece`: eleven
//! mutually exclusive slots, offensive/defensive combat bonuses, and a
//! small set of miscellaneous bonuses (strength, ranged strength, magic
//! strength, prayer).

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Shared, reference-counted handle to a catalog item.
///
/// Catalog items are immutable once loaded; evaluation works on fresh
/// derived players rather than mutating items in place, so cloning a
/// handle is just a refcount bump (`spec.md` §3, "Ownership").
pub type ItemRef = Arc<EquipmentPiece>;

/// The eleven equipment slots. Authoritative: a piece only ever
/// participates in its own slot's catalog (`spec.md` §3 invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    Head,
    Cape,
    Neck,
    Ammo,
    Weapon,
    Body,
    Shield,
    Legs,
    Hands,
    Feet,
    Ring,
}

impl Slot {
    /// All eleven slots in a stable, arbitrary-but-fixed order.
    pub const ALL: [Slot; 11] = [
        Slot::Head,
        Slot::Cape,
        Slot::Neck,
        Slot::Ammo,
        Slot::Weapon,
        Slot::Body,
        Slot::Shield,
        Slot::Legs,
        Slot::Hands,
        Slot::Feet,
        Slot::Ring,
    ];

    /// Total number of equipment slots.
    pub const COUNT: usize = 11;

    /// Index into a fixed-size `[T; Slot::COUNT]` array.
    pub fn index(self) -> usize {
        match self {
            Slot::Head => 0,
            Slot::Cape => 1,
            Slot::Neck => 2,
            Slot::Ammo => 3,
            Slot::Weapon => 4,
            Slot::Body => 5,
            Slot::Shield => 6,
            Slot::Legs => 7,
            Slot::Hands => 8,
            Slot::Feet => 9,
            Slot::Ring => 10,
        }
    }

    /// Lowercase slot name, used for serialization keys and log output.
    pub fn name(self) -> &'static str {
        match self {
            Slot::Head => "head",
            Slot::Cape => "cape",
            Slot::Neck => "neck",
            Slot::Ammo => "ammo",
            Slot::Weapon => "weapon",
            Slot::Body => "body",
            Slot::Shield => "shield",
            Slot::Legs => "legs",
            Slot::Hands => "hands",
            Slot::Feet => "feet",
            Slot::Ring => "ring",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Offensive or defensive combat bonuses across the five attack/defence
/// types. Signed: some items (e.g. anti-dragon shields) carry negative
/// bonuses in a given style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatBonuses {
    pub stab: i32,
    pub slash: i32,
    pub crush: i32,
    pub ranged: i32,
    pub magic: i32,
}

/// Non-accuracy/defence bonuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiscBonuses {
    pub strength: i32,
    pub ranged_strength: i32,
    pub magic_strength: i32,
    pub prayer: i32,
}

/// Ammunition kind, used to match ammo against a weapon's accepted set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmmoKind {
    Arrow,
    Bolt,
    Javelin,
    ThrownKnife,
    ThrownAxe,
    Dart,
    Rune,
}

/// A weapon's ammunition coupling descriptor, supplied by the catalog
/// (`spec.md` §4.4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmmoCoupling {
    /// Whether the weapon cannot fire without ammunition equipped.
    pub required: bool,
    /// Ammo kinds this weapon can fire.
    pub accepted_ammo_kinds: Vec<AmmoKind>,
    /// Highest ammo tier this weapon can fire (e.g. a rune crossbow's
    /// cap excludes dragon bolts). `None` means no cap.
    pub max_ammo_tier: Option<u32>,
}

/// Opaque per-item configuration. Reserved for state that doesn't fit
/// the structured stat fields above — in practice, a blowpipe's inlined
/// dart identity (`spec.md` §4.4).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemVars {
    pub dart_id: Option<u32>,
    #[serde(default)]
    pub extra: HashMap<String, String>,
}

/// Well-known category tags used for identity checks that the spec
/// describes as "detected by item identity (a small named set)".
pub mod category {
    pub const POWERED_STAFF: &str = "powered_staff";
    pub const TZHAAR_WEAPON: &str = "tzhaar_weapon";
    pub const DART: &str = "dart";
}

/// An equippable item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentPiece {
    pub id: u32,
    pub name: String,
    pub version: Option<String>,
    pub category: Option<String>,
    pub slot: Slot,
    pub is_two_handed: bool,
    /// Attack interval in game ticks. >0 for real weapons, 0 for
    /// non-weapon slots.
    pub speed: u8,
    pub offensive: CombatBonuses,
    pub defensive: CombatBonuses,
    pub bonuses: MiscBonuses,
    /// Ammo kind this piece provides, if it's an ammunition item.
    pub ammo_kind: Option<AmmoKind>,
    /// Ammo tier, used against a weapon's `max_ammo_tier` cap.
    pub ammo_tier: Option<u32>,
    /// Ammo coupling descriptor, present on weapons only.
    pub ammo_coupling: Option<AmmoCoupling>,
    pub item_vars: ItemVars,
}

impl EquipmentPiece {
    /// True if `category` matches the given tag.
    pub fn has_category(&self, tag: &str) -> bool {
        self.category.as_deref() == Some(tag)
    }

    /// Whether this piece carries any positive offensive contribution at
    /// all (used by `filter_by_combat_style` to retain neutral items).
    pub fn has_offensive_bonus(&self) -> bool {
        let o = &self.offensive;
        let m = &self.bonuses;
        o.stab > 0
            || o.slash > 0
            || o.crush > 0
            || o.ranged > 0
            || o.magic > 0
            || m.strength > 0
            || m.ranged_strength > 0
            || m.magic_strength > 0
    }
}
