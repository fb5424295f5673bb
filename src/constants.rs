//! Global constants for modguard
//!
//! Consolidates filter type tags, configuration buffer datatypes
//! and timing defaults to eliminate magic numbers throughout the codebase.

// ============================================================================
// Filter Type Tags
// ============================================================================

/// Block unless one of the listed modifier groups is held
pub const FILTER_TYPE_MODIFIER_ONLY: u32 = 1;

/// Block while one of the listed modifier groups is held
pub const FILTER_TYPE_MODIFIER_NOT: u32 = 2;

/// Block while the held modifiers exactly match a stuck combination
pub const FILTER_TYPE_MODIFIER_STUCK: u32 = 3;

// ============================================================================
// Configuration Buffer Datatypes
// ============================================================================

/// Keycode entry (not consumed by modifier filters)
pub const DATATYPE_KEYCODE: u32 = 1;

/// Modifier flag entry: value is a raw `ModifierFlag`
pub const DATATYPE_MODIFIERFLAG: u32 = 2;

/// Closes the current modifier group; value is ignored
pub const DATATYPE_MODIFIERFLAGS_END: u32 = 3;

// ============================================================================
// Timing Constants
// ============================================================================

/// Default delay before stuck modifiers are forcibly released (milliseconds)
pub const DEFAULT_RECOVERY_TIMEOUT_MS: u64 = 1000;
