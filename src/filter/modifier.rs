//! Modifier condition filter
//!
//! Restricts a remap to (or away from) chords that include a configured
//! modifier group. Unlike the stuck filter, extra held modifiers still count
//! as a match.

use log::debug;

use super::{parse_modifier_groups, RemapFilter};
use crate::modifier::{ActiveModifiers, ModifierSet};

/// How held modifiers relate to the configured groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierMatch {
    /// Remap only while one of the groups is held
    Only,
    /// Remap only while none of the groups is held
    Not,
}

pub struct ModifierFilter {
    filter_type: u32,
    mode: ModifierMatch,
    targets: Vec<ModifierSet>,
}

impl ModifierFilter {
    pub fn new(filter_type: u32, mode: ModifierMatch) -> Self {
        Self {
            filter_type,
            mode,
            targets: Vec::new(),
        }
    }

    pub fn mode(&self) -> ModifierMatch {
        self.mode
    }

    pub fn targets(&self) -> &[ModifierSet] {
        &self.targets
    }
}

impl RemapFilter for ModifierFilter {
    fn filter_type(&self) -> u32 {
        self.filter_type
    }

    fn initialize(&mut self, vec: &[u32]) {
        self.targets = parse_modifier_groups(vec);
        debug!(
            "modifier filter: {:?} with {} groups",
            self.mode,
            self.targets.len()
        );
    }

    fn is_blocked(&mut self, active: &ActiveModifiers) -> bool {
        if self.targets.is_empty() {
            return false;
        }

        let held = self.targets.iter().any(|target| target.is_held_in(active));
        match self.mode {
            ModifierMatch::Only => !held,
            ModifierMatch::Not => held,
        }
    }
}
