//! Held-modifier tracking
//!
//! Counts press/release events per modifier role so that two physical keys
//! mapped onto the same role keep it held until both are released.

use log::{debug, trace};

use super::flag::{ActiveModifiers, ModifierFlag, ModifierMask};

/// Held state of every modifier role
#[derive(Debug, Clone, Default)]
pub struct FlagStatus {
    /// Press count per role, indexed by `ModifierFlag::index`
    counts: [u32; ModifierFlag::ALL.len()],
    /// Toggled lock keys
    locked: ModifierMask,
}

impl FlagStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one modifier key event
    pub fn update(&mut self, flag: ModifierFlag, pressed: bool) {
        if flag.is_lock() {
            if pressed {
                self.locked.toggle(flag.mask());
            }
            return;
        }

        let count = &mut self.counts[flag.index()];
        if pressed {
            *count = count.saturating_add(1);
        } else if *count == 0 {
            // Release without a press: the press was consumed upstream
            trace!("flag status: unmatched release of {}", flag);
        } else {
            *count -= 1;
        }
    }

    pub fn is_on(&self, flag: ModifierFlag) -> bool {
        if flag.is_lock() {
            self.locked.contains(flag.mask())
        } else {
            self.counts[flag.index()] > 0
        }
    }

    /// Snapshot handed to the filters for the current event
    pub fn active(&self) -> ActiveModifiers {
        ModifierFlag::ALL
            .iter()
            .copied()
            .filter(|flag| self.is_on(*flag))
            .collect()
    }

    /// Release every held modifier (lock state is kept)
    pub fn reset(&mut self) {
        debug!("flag status: reset (held={:?})", self.active().mask());
        self.counts = [0; ModifierFlag::ALL.len()];
    }
}
