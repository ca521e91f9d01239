//! Player module
//!
//! Skills, active combat style, and the equipment loadout with its
//! derived aggregate stats. Grounded on the teacher's `game/player.rs`
//! `Skills` type and `game/equipment.rs`'s cached-bonuses pattern, cut
//! down to what the optimizer actually reads (no XP tracking, no
//! persistence round-trip).

use serde::{Deserialize, Serialize};

use crate::catalog::{CombatBonuses, CombatStyle, ItemRef, MiscBonuses, Slot};

/// Combat skills relevant to equipment requirements and style bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Skill {
    Attack = 0,
    Strength = 1,
    Defence = 2,
    Ranged = 3,
    Magic = 4,
    Prayer = 5,
    Hitpoints = 6,
}

impl Skill {
    pub const COUNT: usize = 7;

    fn index(self) -> usize {
        self as usize
    }
}

/// Fixed-size skill-level table, indexed by [`Skill`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills(pub [u8; Skill::COUNT]);

impl Default for Skills {
    fn default() -> Self {
        Skills([1; Skill::COUNT])
    }
}

impl Skills {
    pub fn new(levels: [u8; Skill::COUNT]) -> Self {
        Skills(levels)
    }

    /// All skills at 99, a common "maxed account" fixture.
    pub fn maxed() -> Self {
        Skills([99; Skill::COUNT])
    }

    pub fn level(&self, skill: Skill) -> u8 {
        self.0[skill.index()]
    }

    pub fn set_level(&mut self, skill: Skill, level: u8) {
        self.0[skill.index()] = level;
    }
}

/// The player's active attack style. Distinct from [`CombatStyle`],
/// which groups these five into melee/ranged/magic for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackStyle {
    Stab,
    Slash,
    Crush,
    Ranged,
    Magic,
}

impl AttackStyle {
    /// Default `combat_style` derivation for `optimize`'s options
    /// (`spec.md` §6): stab/slash/crush → melee, ranged → ranged,
    /// magic → magic, anything else → melee.
    pub fn combat_style(self) -> CombatStyle {
        match self {
            AttackStyle::Stab | AttackStyle::Slash | AttackStyle::Crush => CombatStyle::Melee,
            AttackStyle::Ranged => CombatStyle::Ranged,
            AttackStyle::Magic => CombatStyle::Magic,
        }
    }
}

/// Aggregate offensive/defensive/misc bonuses and effective attack
/// speed, recomputed whenever the loadout changes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Aggregates {
    pub offensive: CombatBonuses,
    pub defensive: CombatBonuses,
    pub bonuses: MiscBonuses,
    /// Effective attack interval in ticks; 0 if no weapon is equipped.
    pub attack_speed: u8,
}

/// Full eleven-slot equipment assignment, with cached aggregates.
///
/// Mirrors the teacher's `Equipment` struct in `game/equipment.rs`: a
/// fixed-size slot array plus a dirty-flagged bonus cache, recomputed
/// lazily rather than on every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerLoadout {
    slots: [Option<ItemRef>; Slot::COUNT],
    #[serde(skip)]
    cached: Option<Aggregates>,
}

impl Default for PlayerLoadout {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerLoadout {
    pub fn new() -> Self {
        Self {
            slots: Default::default(),
            cached: None,
        }
    }

    pub fn get(&self, slot: Slot) -> Option<&ItemRef> {
        self.slots[slot.index()].as_ref()
    }

    pub fn weapon(&self) -> Option<&ItemRef> {
        self.get(Slot::Weapon)
    }

    pub fn shield(&self) -> Option<&ItemRef> {
        self.get(Slot::Shield)
    }

    pub fn is_two_handed(&self) -> bool {
        self.weapon().map(|w| w.is_two_handed).unwrap_or(false)
    }

    /// Place (or clear, with `None`) an item in `slot`, invalidating the
    /// aggregate cache.
    pub fn set(&mut self, slot: Slot, item: Option<ItemRef>) {
        self.slots[slot.index()] = item;
        self.cached = None;
    }

    /// Returns a copy with `slot` replaced, leaving `self` untouched —
    /// the derived-player pattern from `spec.md` §9.
    pub fn with_slot(&self, slot: Slot, item: Option<ItemRef>) -> Self {
        let mut next = self.clone();
        next.set(slot, item);
        next
    }

    /// Every occupied slot, in `Slot::ALL` order.
    pub fn occupied(&self) -> impl Iterator<Item = (Slot, &ItemRef)> {
        Slot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|item| (slot, item)))
    }

    /// Recompute (or return the cached) aggregate stats.
    pub fn aggregates(&mut self) -> Aggregates {
        if let Some(cached) = self.cached {
            return cached;
        }
        let mut agg = Aggregates::default();
        for (_, item) in self.occupied() {
            agg.offensive.stab += item.offensive.stab;
            agg.offensive.slash += item.offensive.slash;
            agg.offensive.crush += item.offensive.crush;
            agg.offensive.ranged += item.offensive.ranged;
            agg.offensive.magic += item.offensive.magic;
            agg.defensive.stab += item.defensive.stab;
            agg.defensive.slash += item.defensive.slash;
            agg.defensive.crush += item.defensive.crush;
            agg.defensive.ranged += item.defensive.ranged;
            agg.defensive.magic += item.defensive.magic;
            agg.bonuses.strength += item.bonuses.strength;
            agg.bonuses.ranged_strength += item.bonuses.ranged_strength;
            agg.bonuses.magic_strength += item.bonuses.magic_strength;
            agg.bonuses.prayer += item.bonuses.prayer;
        }
        agg.attack_speed = self.weapon().map(|w| w.speed).unwrap_or(0);
        self.cached = Some(agg);
        agg
    }

    /// Read-only aggregate access that doesn't require `&mut self`,
    /// recomputing every call. Prefer [`Self::aggregates`] in hot paths.
    pub fn aggregates_ref(&self) -> Aggregates {
        let mut copy = self.clone();
        copy.aggregates()
    }
}

/// A player: skills, active style, optional spell, and loadout.
///
/// The engine never mutates a caller's `Player`; every evaluation works
/// against a derived copy (`spec.md` §3 "Lifecycle").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub skills: Skills,
    pub style: AttackStyle,
    pub spell: Option<String>,
    pub loadout: PlayerLoadout,
}

impl Player {
    pub fn new(skills: Skills, style: AttackStyle) -> Self {
        Self {
            skills,
            style,
            spell: None,
            loadout: PlayerLoadout::new(),
        }
    }

    /// The `combat_style` group `optimize` defaults to when the caller
    /// doesn't specify one.
    pub fn default_combat_style(&self) -> CombatStyle {
        self.style.combat_style()
    }

    /// Returns a derived copy with `item` placed in `slot`.
    ///
    /// Ammunition is cleared when the weapon is a blowpipe (the dart is
    /// inlined into the blowpipe's `item_vars` instead) or a powered
    /// staff, and a powered staff forces the style to magic and clears
    /// any spell selection (`spec.md` §4.3 steps 1-2).
    pub fn with_equipped(&self, slot: Slot, item: Option<ItemRef>) -> Player {
        let mut next = self.clone();
        next.loadout.set(slot, item);

        if slot == Slot::Weapon {
            if let Some(weapon) = next.loadout.weapon().cloned() {
                if crate::weapon::is_blowpipe(&weapon) || crate::weapon::is_powered_staff(&weapon) {
                    next.loadout.set(Slot::Ammo, None);
                }
                if crate::weapon::is_powered_staff(&weapon) {
                    next.style = AttackStyle::Magic;
                    next.spell = None;
                }
            }
        }
        next
    }
}
