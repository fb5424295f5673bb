//! modguard - keyboard remap filter chain with stuck-modifier guard
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │        Host driver (raw key events)      │
//! ├──────────────────────────────────────────┤
//! │  FlagStatus  →  ActiveModifiers          │
//! │                       ↓                  │
//! │  FilterChain (stuck / only / not)        │
//! │                       ↓ stuck?           │
//! │  StuckRecovery  →  TimerWrapper          │
//! │                       ↓                  │
//! │              WorkLoop (EventLoop)        │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Everything runs on the host's single event thread: no locks, no
//! blocking calls, and no panics on the event path.

pub mod chain;
pub mod config;
pub mod constants;
pub mod filter;
pub mod modifier;
pub mod recovery;
pub mod timer;

pub use chain::FilterChain;
pub use config::{Config, ConfigError, FilterEntry, RecoveryConfig};
pub use filter::{ModifierFilter, ModifierMatch, ModifierStuckFilter, RemapFilter};
pub use modifier::{ActiveModifiers, FlagStatus, ModifierFlag, ModifierMask, ModifierSet};
pub use recovery::StuckRecovery;
pub use timer::{EventLoop, LoopError, TimerEventSource, TimerWrapper, WorkLoop};
