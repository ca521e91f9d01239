//! Engine configuration
//!
//! Tunable knobs that don't belong in `OptimizerOptions` because they
//! govern *how* the engine searches, not *what* it's asked to
//! optimize. Grounded on the teacher's `config.rs` `ServerConfig::load`
//! pattern: TOML file with serde defaults, optional environment
//! overrides, then validation.

use std::collections::HashSet;
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::Slot;

fn default_slot_fill_order() -> Vec<Slot> {
    crate::greedy::SLOT_ORDER.to_vec()
}

fn default_downgrade_slot_order() -> Vec<Slot> {
    crate::budget::DOWNGRADE_SLOT_ORDER.to_vec()
}

fn default_progress_emit_every_n_candidates() -> usize {
    25
}

fn default_parallel_threshold() -> usize {
    8
}

fn default_use_mid_price() -> bool {
    true
}

/// Engine-wide tuning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Order the per-slot greedy optimizer visits the eight non-weapon/
    /// shield/ammo slots in.
    #[serde(default = "default_slot_fill_order")]
    pub slot_fill_order: Vec<Slot>,

    /// Tie-break order for the budget downgrade loop.
    #[serde(default = "default_downgrade_slot_order")]
    pub downgrade_slot_order: Vec<Slot>,

    /// Emit an intermediate `slots`-phase progress event after this
    /// many candidate evaluations (`spec.md` §4.9: "intermediate events
    /// may fire per slot").
    #[serde(default = "default_progress_emit_every_n_candidates")]
    pub progress_emit_every_n_candidates: usize,

    /// Pool size at or above which `pick_best` parallelizes candidate
    /// evaluation via `rayon`.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,

    /// Whether `PriceStore::fetch_and_load` averages high/low quotes.
    #[serde(default = "default_use_mid_price")]
    pub use_mid_price: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            slot_fill_order: default_slot_fill_order(),
            downgrade_slot_order: default_downgrade_slot_order(),
            progress_emit_every_n_candidates: default_progress_emit_every_n_candidates(),
            parallel_threshold: default_parallel_threshold(),
            use_mid_price: default_use_mid_price(),
        }
    }
}

impl EngineConfig {
    /// Load from `GEAR_OPTIMIZER_CONFIG` (or `config/engine.toml` if
    /// unset); falls back to defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let config_path = env::var("GEAR_OPTIMIZER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/engine.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read config file: {}", config_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("failed to parse config file: {}", config_path.display()))?
        } else {
            tracing::warn!("config file not found at {}, using defaults", config_path.display());
            Self::default()
        };

        config.config_path = Some(config_path);
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let unique: HashSet<Slot> = self.slot_fill_order.iter().copied().collect();
        if unique.len() != self.slot_fill_order.len() {
            anyhow::bail!("slot_fill_order contains duplicate slots");
        }
        for forbidden in [Slot::Weapon, Slot::Shield, Slot::Ammo] {
            if self.slot_fill_order.contains(&forbidden) {
                anyhow::bail!("slot_fill_order must not include {forbidden} (handled by weapon coupling)");
            }
        }

        let downgrade_unique: HashSet<Slot> = self.downgrade_slot_order.iter().copied().collect();
        if downgrade_unique.len() != Slot::COUNT || self.downgrade_slot_order.len() != Slot::COUNT {
            anyhow::bail!("downgrade_slot_order must list each of the eleven slots exactly once");
        }

        if self.parallel_threshold == 0 {
            anyhow::bail!("parallel_threshold must be at least 1");
        }

        Ok(())
    }
}
