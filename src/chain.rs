//! Filter chain
//!
//! Ordered set of filters applied to every event. Any single filter can veto
//! the remap; evaluation stops at the first veto.

use log::{debug, trace};

use crate::config::{Config, FilterEntry};
use crate::filter::RemapFilter;
use crate::modifier::ActiveModifiers;

#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn RemapFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every configured filter, in configuration order
    pub fn from_config(config: &Config) -> Self {
        Self::from_entries(&config.filters)
    }

    pub fn from_entries(entries: &[FilterEntry]) -> Self {
        let mut chain = Self::new();
        for entry in entries {
            chain.push(entry.build());
        }
        debug!("filter chain: {} filters", chain.len());
        chain
    }

    pub fn push(&mut self, filter: Box<dyn RemapFilter>) {
        self.filters.push(filter);
    }

    /// Should the current event skip remapping?
    pub fn is_blocked(&mut self, active: &ActiveModifiers) -> bool {
        for filter in self.filters.iter_mut() {
            if filter.is_blocked(active) {
                trace!("filter chain: blocked by type {}", filter.filter_type());
                return true;
            }
        }
        false
    }

    /// Do the held modifiers match a stuck combination?
    ///
    /// Asks only the stuck guards; blocks from other filters describe a
    /// legitimate chord and never count as stuck.
    pub fn is_stuck(&mut self, active: &ActiveModifiers) -> bool {
        self.filters
            .iter_mut()
            .filter(|filter| filter.is_stuck_guard())
            .any(|filter| filter.is_blocked(active))
    }

    /// Type tags of the filters, in evaluation order
    pub fn filter_types(&self) -> Vec<u32> {
        self.filters.iter().map(|f| f.filter_type()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }
}
