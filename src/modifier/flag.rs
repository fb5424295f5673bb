//! Modifier identifiers and sets
//!
//! `ModifierFlag` names one modifier key role. Each flag owns one bit of
//! `ModifierMask`, so set comparisons reduce to a single integer compare.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Bit set of modifier roles
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModifierMask: u32 {
        const CAPS_LOCK = 0x0001;
        const LEFT_SHIFT = 0x0002;
        const RIGHT_SHIFT = 0x0004;
        const LEFT_CONTROL = 0x0008;
        const RIGHT_CONTROL = 0x0010;
        const LEFT_OPTION = 0x0020;
        const RIGHT_OPTION = 0x0040;
        const LEFT_COMMAND = 0x0080;
        const RIGHT_COMMAND = 0x0100;
        const FN = 0x0200;
    }
}

impl Default for ModifierMask {
    fn default() -> Self {
        ModifierMask::empty()
    }
}

/// One modifier key role
///
/// The discriminant is the raw value used in configuration buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum ModifierFlag {
    CapsLock = 0x0001,
    LeftShift = 0x0002,
    RightShift = 0x0004,
    LeftControl = 0x0008,
    RightControl = 0x0010,
    #[serde(alias = "left_alt")]
    LeftOption = 0x0020,
    #[serde(alias = "right_alt")]
    RightOption = 0x0040,
    #[serde(alias = "left_super")]
    LeftCommand = 0x0080,
    #[serde(alias = "right_super")]
    RightCommand = 0x0100,
    Fn = 0x0200,
}

impl ModifierFlag {
    /// Every modifier role, in bit order
    pub const ALL: [ModifierFlag; 10] = [
        ModifierFlag::CapsLock,
        ModifierFlag::LeftShift,
        ModifierFlag::RightShift,
        ModifierFlag::LeftControl,
        ModifierFlag::RightControl,
        ModifierFlag::LeftOption,
        ModifierFlag::RightOption,
        ModifierFlag::LeftCommand,
        ModifierFlag::RightCommand,
        ModifierFlag::Fn,
    ];

    /// Raw configuration value
    #[inline]
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// Look up a flag from its raw configuration value
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|flag| flag.raw() == raw)
    }

    /// Position of this flag in `ALL`
    #[inline]
    pub const fn index(self) -> usize {
        (self as u32).trailing_zeros() as usize
    }

    #[inline]
    pub const fn mask(self) -> ModifierMask {
        ModifierMask::from_bits_retain(self as u32)
    }

    /// Check if this is a lock key (toggles on press instead of tracking hold)
    #[inline]
    pub const fn is_lock(self) -> bool {
        matches!(self, ModifierFlag::CapsLock)
    }

    pub const fn name(self) -> &'static str {
        match self {
            ModifierFlag::CapsLock => "caps_lock",
            ModifierFlag::LeftShift => "left_shift",
            ModifierFlag::RightShift => "right_shift",
            ModifierFlag::LeftControl => "left_control",
            ModifierFlag::RightControl => "right_control",
            ModifierFlag::LeftOption => "left_option",
            ModifierFlag::RightOption => "right_option",
            ModifierFlag::LeftCommand => "left_command",
            ModifierFlag::RightCommand => "right_command",
            ModifierFlag::Fn => "fn",
        }
    }
}

impl fmt::Display for ModifierFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One configured modifier combination
///
/// Flags keep their configured order; duplicates are dropped on construction.
/// Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifierSet {
    flags: Vec<ModifierFlag>,
    mask: ModifierMask,
}

impl ModifierSet {
    pub fn new<I: IntoIterator<Item = ModifierFlag>>(flags: I) -> Self {
        let mut mask = ModifierMask::empty();
        let mut ordered = Vec::new();
        for flag in flags {
            if !mask.contains(flag.mask()) {
                mask.insert(flag.mask());
                ordered.push(flag);
            }
        }
        Self {
            flags: ordered,
            mask,
        }
    }

    pub fn flags(&self) -> &[ModifierFlag] {
        &self.flags
    }

    pub fn mask(&self) -> ModifierMask {
        self.mask
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Same elements as the active modifiers, no extras, no omissions
    #[inline]
    pub fn matches_exactly(&self, active: &ActiveModifiers) -> bool {
        self.mask == active.mask()
    }

    /// Every flag of this set is held (extra held modifiers allowed)
    #[inline]
    pub fn is_held_in(&self, active: &ActiveModifiers) -> bool {
        active.mask().contains(self.mask)
    }
}

impl fmt::Display for ModifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, flag) in self.flags.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{}", flag)?;
        }
        Ok(())
    }
}

/// Modifiers held while the current event is processed
///
/// Built by the caller for every event and handed to the filters,
/// which never store it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveModifiers {
    mask: ModifierMask,
}

impl ActiveModifiers {
    pub const fn none() -> Self {
        Self {
            mask: ModifierMask::empty(),
        }
    }

    pub fn from_flags(flags: &[ModifierFlag]) -> Self {
        flags.iter().copied().collect()
    }

    pub const fn from_mask(mask: ModifierMask) -> Self {
        Self { mask }
    }

    #[inline]
    pub fn mask(&self) -> ModifierMask {
        self.mask
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    pub fn contains(&self, flag: ModifierFlag) -> bool {
        self.mask.contains(flag.mask())
    }

    /// Held flags in bit order
    pub fn iter(&self) -> impl Iterator<Item = ModifierFlag> + '_ {
        ModifierFlag::ALL
            .iter()
            .copied()
            .filter(move |flag| self.contains(*flag))
    }
}

impl FromIterator<ModifierFlag> for ActiveModifiers {
    fn from_iter<I: IntoIterator<Item = ModifierFlag>>(iter: I) -> Self {
        let mut mask = ModifierMask::empty();
        for flag in iter {
            mask.insert(flag.mask());
        }
        Self { mask }
    }
}
