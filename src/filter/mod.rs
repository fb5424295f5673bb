//! Remap filters
//!
//! A filter vetoes remapping of the current event.
//! - `ModifierStuckFilter`: held modifiers exactly match a stuck combination
//! - `ModifierFilter`: held modifiers include (or exclude) a configured group
//!
//! Filters are configured from flattened `(datatype, value)` buffers produced
//! by the configuration loader, then queried once per event.

pub mod modifier;
pub mod stuck;

pub use modifier::{ModifierFilter, ModifierMatch};
pub use stuck::ModifierStuckFilter;

use log::{trace, warn};

use crate::constants::{DATATYPE_KEYCODE, DATATYPE_MODIFIERFLAG, DATATYPE_MODIFIERFLAGS_END};
use crate::modifier::{ActiveModifiers, ModifierFlag, ModifierSet};

/// Common interface of every filter variant
pub trait RemapFilter {
    /// Type tag assigned at construction (opaque to the filter)
    fn filter_type(&self) -> u32;

    /// Load configuration, replacing any previous one
    ///
    /// The buffer is only borrowed for the duration of the call.
    fn initialize(&mut self, vec: &[u32]);

    /// Should the current event skip remapping?
    fn is_blocked(&mut self, active: &ActiveModifiers) -> bool;

    /// Does a block from this filter mean the held modifiers are stuck?
    ///
    /// Only such blocks may trigger a forced modifier release.
    fn is_stuck_guard(&self) -> bool {
        false
    }
}

/// Rebuild modifier groups from a flattened configuration buffer
///
/// Groups are closed by `DATATYPE_MODIFIERFLAGS_END`. A trailing open group
/// is kept, empty groups are dropped, and an unpaired last word is ignored.
pub fn parse_modifier_groups(vec: &[u32]) -> Vec<ModifierSet> {
    let mut groups = Vec::new();
    let mut current: Vec<ModifierFlag> = Vec::new();

    for pair in vec.chunks_exact(2) {
        let (datatype, value) = (pair[0], pair[1]);
        match datatype {
            DATATYPE_MODIFIERFLAG => match ModifierFlag::from_raw(value) {
                Some(flag) => current.push(flag),
                None => warn!("filter: unknown modifier flag 0x{:x}", value),
            },
            DATATYPE_MODIFIERFLAGS_END => close_group(&mut groups, &mut current),
            DATATYPE_KEYCODE => trace!("filter: ignoring keycode {}", value),
            _ => warn!("filter: unknown datatype {} (value={})", datatype, value),
        }
    }
    close_group(&mut groups, &mut current);

    if vec.len() % 2 != 0 {
        warn!("filter: ignoring unpaired trailing word in config buffer");
    }

    groups
}

fn close_group(groups: &mut Vec<ModifierSet>, current: &mut Vec<ModifierFlag>) {
    if current.is_empty() {
        return;
    }
    groups.push(ModifierSet::new(current.drain(..)));
}

/// Flatten modifier groups into the buffer layout `parse_modifier_groups` reads
pub fn encode_modifier_groups<'a, I>(groups: I) -> Vec<u32>
where
    I: IntoIterator<Item = &'a [ModifierFlag]>,
{
    let mut vec = Vec::new();
    for group in groups {
        for flag in group {
            vec.push(DATATYPE_MODIFIERFLAG);
            vec.push(flag.raw());
        }
        vec.push(DATATYPE_MODIFIERFLAGS_END);
        vec.push(0);
    }
    vec
}
