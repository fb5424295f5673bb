//! Stuck-modifier filter
//!
//! A remap that substitutes one modifier for another can lose the release
//! of the substituted key, leaving it held in software after the physical
//! key is up. Each configured target is a combination that only shows up in
//! that state; while the held modifiers are exactly one of them, remapping is
//! suppressed.
//!
//! Matching is strict set equality: a superset of a target may be a
//! legitimate chord and must pass.

use log::{debug, trace};

use super::{parse_modifier_groups, RemapFilter};
use crate::modifier::{ActiveModifiers, ModifierSet};

pub struct ModifierStuckFilter {
    filter_type: u32,
    targets: Vec<ModifierSet>,
}

impl ModifierStuckFilter {
    pub fn new(filter_type: u32) -> Self {
        Self {
            filter_type,
            targets: Vec::new(),
        }
    }

    pub fn targets(&self) -> &[ModifierSet] {
        &self.targets
    }

    /// First target equal to the held modifiers
    pub fn matching_target(&self, active: &ActiveModifiers) -> Option<&ModifierSet> {
        self.targets
            .iter()
            .find(|target| target.matches_exactly(active))
    }
}

impl RemapFilter for ModifierStuckFilter {
    fn filter_type(&self) -> u32 {
        self.filter_type
    }

    fn initialize(&mut self, vec: &[u32]) {
        self.targets = parse_modifier_groups(vec);
        debug!("stuck filter: {} targets configured", self.targets.len());
    }

    fn is_blocked(&mut self, active: &ActiveModifiers) -> bool {
        match self.matching_target(active) {
            Some(target) => {
                trace!("stuck filter: held modifiers match {}", target);
                true
            }
            None => false,
        }
    }

    fn is_stuck_guard(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FILTER_TYPE_MODIFIER_STUCK;
    use crate::filter::encode_modifier_groups;
    use crate::modifier::ModifierFlag::{self, *};
    use crate::modifier::ModifierMask;

    fn filter_with(groups: &[&[ModifierFlag]]) -> ModifierStuckFilter {
        let mut filter = ModifierStuckFilter::new(FILTER_TYPE_MODIFIER_STUCK);
        filter.initialize(&encode_modifier_groups(groups.iter().copied()));
        filter
    }

    fn active(flags: &[ModifierFlag]) -> ActiveModifiers {
        ActiveModifiers::from_flags(flags)
    }

    #[test]
    fn test_exact_match_blocks() {
        let mut filter = filter_with(&[&[LeftControl, LeftShift]]);
        assert!(filter.is_blocked(&active(&[LeftControl, LeftShift])));
        assert!(filter.is_blocked(&active(&[LeftShift, LeftControl])));
    }

    #[test]
    fn test_subset_and_superset_pass() {
        let mut filter = filter_with(&[&[LeftControl, LeftShift]]);
        assert!(!filter.is_blocked(&active(&[LeftControl])));
        assert!(!filter.is_blocked(&active(&[LeftControl, LeftShift, LeftOption])));
        assert!(!filter.is_blocked(&active(&[])));
    }

    #[test]
    fn test_any_target_blocks() {
        let mut filter = filter_with(&[&[LeftControl, LeftShift], &[RightCommand]]);
        assert!(filter.is_blocked(&active(&[RightCommand])));
        assert!(filter.is_blocked(&active(&[LeftShift, LeftControl])));
        assert!(!filter.is_blocked(&active(&[RightCommand, LeftShift])));
    }

    #[test]
    fn test_empty_targets_never_block() {
        let mut filter = ModifierStuckFilter::new(FILTER_TYPE_MODIFIER_STUCK);
        assert!(!filter.is_blocked(&active(&[])));
        filter.initialize(&[]);
        for flag in ModifierFlag::ALL {
            assert!(!filter.is_blocked(&active(&[flag])));
        }
        assert!(!filter.is_blocked(&active(&ModifierFlag::ALL)));
    }

    #[test]
    fn test_every_mask_against_one_target() {
        let mut filter = filter_with(&[&[LeftControl, LeftShift]]);
        let mut empty = ModifierStuckFilter::new(FILTER_TYPE_MODIFIER_STUCK);
        empty.initialize(&[]);
        let target = (LeftControl.mask() | LeftShift.mask()).bits();

        for bits in 0..(1u32 << ModifierFlag::ALL.len()) {
            let held = ActiveModifiers::from_mask(ModifierMask::from_bits_retain(bits));
            assert_eq!(filter.is_blocked(&held), bits == target, "mask 0x{:03x}", bits);
            assert!(!empty.is_blocked(&held), "mask 0x{:03x}", bits);
        }
    }

    #[test]
    fn test_duplicate_flags_normalized() {
        let mut filter = filter_with(&[&[LeftShift, LeftShift, Fn]]);
        assert_eq!(filter.targets()[0].flags(), &[LeftShift, Fn]);
        assert!(filter.is_blocked(&active(&[Fn, LeftShift])));
    }

    #[test]
    fn test_reinitialize_replaces() {
        let mut filter = filter_with(&[&[LeftControl]]);
        filter.initialize(&encode_modifier_groups([&[RightShift][..]]));
        assert_eq!(filter.targets().len(), 1);
        assert!(!filter.is_blocked(&active(&[LeftControl])));
        assert!(filter.is_blocked(&active(&[RightShift])));
    }

    #[test]
    fn test_type_tag_is_kept() {
        let filter = ModifierStuckFilter::new(77);
        assert_eq!(filter.filter_type(), 77);
    }
}
