//! Demo binary
//!
//! Builds a small in-memory catalog and player, runs `optimize` against
//! a stub damage calculator, and logs the chosen loadout. Exists to
//! exercise the crate end-to-end outside of the test suite.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use gear_optimizer::{
    optimize, AmmoCoupling, AmmoKind, AttackStyle, CombatBonuses, CombatStyle, Constraints, DpsCalculator, DpsMetrics,
    EquipmentPiece, ItemRef, ItemVars, MiscBonuses, Objective, OptimizerContext, OptimizerOptions, Player, Skills, Slot,
};
use gear_optimizer::config::EngineConfig;
use gear_optimizer::price::PriceStore;
use gear_optimizer::requirements::RequirementStore;

/// A flat DPS model: accuracy from offensive-vs-defence margin, damage
/// from strength bonus. Stands in for a real combat formula, which the
/// engine treats as an opaque collaborator.
struct DemoCalculator;

impl DpsCalculator<DemoMonster> for DemoCalculator {
    fn evaluate_dps(&self, player: &Player, monster: &DemoMonster) -> anyhow::Result<DpsMetrics> {
        let agg = player.loadout.aggregates_ref();
        let accuracy_roll = agg.offensive.slash + agg.offensive.stab + agg.offensive.crush;
        let hit_chance = (accuracy_roll as f64 / (accuracy_roll as f64 + monster.defence as f64 + 1.0)).clamp(0.0, 1.0);
        let max_hit = ((agg.bonuses.strength.max(0) as f64) * 0.15) as u32 + 1;
        let attack_speed = agg.attack_speed.max(1) as f64;
        let dps = hit_chance * (max_hit as f64 / 2.0) / (attack_speed * 0.6);
        Ok(DpsMetrics { dps, hit_chance, max_hit })
    }
}

struct DemoMonster {
    defence: i32,
}

fn sample_catalog() -> Vec<ItemRef> {
    let weapon = |id, name: &str, stab, speed| {
        Arc::new(EquipmentPiece {
            id,
            name: name.to_string(),
            version: None,
            category: None,
            slot: Slot::Weapon,
            is_two_handed: false,
            speed,
            offensive: CombatBonuses { stab, ..Default::default() },
            defensive: CombatBonuses::default(),
            bonuses: MiscBonuses { strength: stab, ..Default::default() },
            ammo_kind: None,
            ammo_tier: None,
            ammo_coupling: None,
            item_vars: ItemVars::default(),
        }) as ItemRef
    };

    let crossbow = Arc::new(EquipmentPiece {
        id: 10,
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
    });

    let bolts = Arc::new(EquipmentPiece {
        id: 11,
        name: "Adamant bolts".into(),
        version: None,
        category: None,
        slot: Slot::Ammo,
        is_two_handed: false,
        speed: 0,
        offensive: CombatBonuses { ranged: 30, ..Default::default() },
        defensive: CombatBonuses::default(),
        bonuses: MiscBonuses { ranged_strength: 30, ..Default::default() },
        ammo_kind: Some(AmmoKind::Bolt),
        ammo_tier: Some(3),
        ammo_coupling: None,
        item_vars: ItemVars::default(),
    });

    let helm = Arc::new(EquipmentPiece {
        id: 20,
        name: "Rune full helm".into(),
        version: None,
        category: None,
        slot: Slot::Head,
        is_two_handed: false,
        speed: 0,
        offensive: CombatBonuses::default(),
        defensive: CombatBonuses { stab: 10, slash: 10, crush: 10, ..Default::default() },
        bonuses: MiscBonuses::default(),
        ammo_kind: None,
        ammo_tier: None,
        ammo_coupling: None,
        item_vars: ItemVars::default(),
    });

    vec![weapon(1, "Bronze sword", 5, 4), weapon(2, "Rune scimitar", 45, 4), crossbow, bolts, helm]
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let catalog = sample_catalog();
    let player = Player::new(Skills::maxed(), AttackStyle::Slash);
    let monster = DemoMonster { defence: 50 };

    let config = EngineConfig::default();
    let price_store = PriceStore::new();
    let requirement_store = RequirementStore::new();
    let calculator = DemoCalculator;

    let ctx = OptimizerContext {
        catalog: &catalog,
        price_store: &price_store,
        requirement_store: &requirement_store,
        calculator: &calculator,
        config: &config,
    };

    let mut options = OptimizerOptions::default();
    options.combat_style = Some(CombatStyle::Melee);
    options.objective = Objective::Dps;
    options.constraints = Constraints::default();

    let result = optimize(&player, &monster, &ctx, options)?;

    info!("optimized loadout in {:.2}ms ({} evaluations)", result.meta.time_ms, result.meta.evaluations);
    info!(
        "dps={:.2} accuracy={:.2} max_hit={}",
        result.metrics.dps, result.metrics.accuracy, result.metrics.max_hit
    );
    for slot in Slot::ALL {
        if let Some(Some(item)) = result.equipment.get(&slot) {
            info!("{slot}: {} (id {})", item.name, item.id);
        }
    }
    info!("cost: {} gp ({} owned savings)", result.cost.total, result.cost.owned_savings);

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,gear_optimizer=debug"));
    fmt().with_env_filter(filter).with_target(true).with_level(true).init();
}
