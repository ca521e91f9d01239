//! Skill requirement store
//!
//! Item id → skill-level minima, and the player-meets predicate. Same
//! singleton-over-`DashMap` shape as [`crate::price::PriceStore`].

use std::collections::HashMap;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::player::{Skill, Skills};

/// Process-wide skill requirement store.
pub struct RequirementStore {
    requirements: DashMap<u32, Vec<(Skill, u8)>>,
}

impl Default for RequirementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RequirementStore {
    pub fn new() -> Self {
        Self {
            requirements: DashMap::new(),
        }
    }

    pub fn global() -> &'static RequirementStore {
        static INSTANCE: Lazy<RequirementStore> = Lazy::new(RequirementStore::new);
        &INSTANCE
    }

    pub fn set_requirement(&self, id: u32, requirement: Vec<(Skill, u8)>) {
        self.requirements.insert(id, requirement);
    }

    pub fn set_requirements(&self, entries: &HashMap<u32, Vec<(Skill, u8)>>) {
        for (&id, req) in entries {
            self.set_requirement(id, req.clone());
        }
    }

    pub fn clear(&self) {
        self.requirements.clear();
    }

    /// Items with no recorded requirement always pass; otherwise every
    /// required skill level must be at most the player's corresponding
    /// skill.
    pub fn meets_requirements(&self, id: u32, skills: &Skills) -> bool {
        match self.requirements.get(&id) {
            None => true,
            Some(reqs) => reqs.iter().all(|&(skill, level)| skills.level(skill) >= level),
        }
    }
}
