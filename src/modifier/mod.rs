//! Modifier state
//!
//! Value types describing modifier keys:
//! - `ModifierFlag` / `ModifierMask`: one role / a bit set of roles
//! - `ModifierSet`: a configured combination
//! - `ActiveModifiers`: what is held while the current event is processed
//! - `FlagStatus`: press/release tracking that produces `ActiveModifiers`

pub mod flag;
pub mod status;

pub use flag::{ActiveModifiers, ModifierFlag, ModifierMask, ModifierSet};
pub use status::FlagStatus;
