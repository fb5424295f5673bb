//! Configuration file management
//!
//! Loads TOML configuration files describing the filter chain and
//! stuck-modifier recovery.
//! Default config path: ~/.config/modguard/config.toml
//!
//! Each filter entry is compiled into the flattened `(datatype, value)`
//! buffer the filters are initialized from.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::constants::{
    DEFAULT_RECOVERY_TIMEOUT_MS, FILTER_TYPE_MODIFIER_NOT, FILTER_TYPE_MODIFIER_ONLY,
    FILTER_TYPE_MODIFIER_STUCK,
};
use crate::filter::{
    encode_modifier_groups, ModifierFilter, ModifierMatch, ModifierStuckFilter, RemapFilter,
};
use crate::modifier::ModifierFlag;

/// Semantic problems in an otherwise well-formed config file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("filter #{filter} ({kind}): modifier group #{group} is empty")]
    EmptyGroup {
        filter: usize,
        kind: &'static str,
        group: usize,
    },
    #[error("filter #{filter} ({kind}): no modifier groups configured")]
    NoGroups { filter: usize, kind: &'static str },
    #[error("recovery.timeout_ms must be greater than zero")]
    ZeroTimeout,
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stuck-modifier recovery settings
    pub recovery: RecoveryConfig,
    /// Filter chain, in evaluation order
    pub filters: Vec<FilterEntry>,
}

/// Stuck-modifier recovery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Release held modifiers when a stuck combination persists
    pub enabled: bool,
    /// Delay before the release in milliseconds (default: 1000)
    pub timeout_ms: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: DEFAULT_RECOVERY_TIMEOUT_MS,
        }
    }
}

impl RecoveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// One filter of the chain
///
/// Each group can be a single modifier ("fn") or a chord
/// (["left_control", "left_shift"]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterEntry {
    /// Block while held modifiers are exactly one of the targets
    ModifierStuck {
        #[serde(deserialize_with = "deserialize_groups")]
        targets: Vec<Vec<ModifierFlag>>,
    },
    /// Block unless one of the groups is held
    ModifierOnly {
        #[serde(deserialize_with = "deserialize_groups")]
        modifiers: Vec<Vec<ModifierFlag>>,
    },
    /// Block while one of the groups is held
    ModifierNot {
        #[serde(deserialize_with = "deserialize_groups")]
        modifiers: Vec<Vec<ModifierFlag>>,
    },
}

/// Group deserializer: accepts a modifier name or an array of groups,
/// where each group is a modifier name or an array of names
fn deserialize_groups<'de, D>(deserializer: D) -> Result<Vec<Vec<ModifierFlag>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Group {
        Single(ModifierFlag),
        Chord(Vec<ModifierFlag>),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Groups {
        Single(ModifierFlag),
        List(Vec<Group>),
    }

    let groups = match Groups::deserialize(deserializer)? {
        Groups::Single(flag) => vec![vec![flag]],
        Groups::List(list) => list
            .into_iter()
            .map(|group| match group {
                Group::Single(flag) => vec![flag],
                Group::Chord(flags) => flags,
            })
            .collect(),
    };
    Ok(groups)
}

impl FilterEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            FilterEntry::ModifierStuck { .. } => "modifier_stuck",
            FilterEntry::ModifierOnly { .. } => "modifier_only",
            FilterEntry::ModifierNot { .. } => "modifier_not",
        }
    }

    pub fn filter_type(&self) -> u32 {
        match self {
            FilterEntry::ModifierStuck { .. } => FILTER_TYPE_MODIFIER_STUCK,
            FilterEntry::ModifierOnly { .. } => FILTER_TYPE_MODIFIER_ONLY,
            FilterEntry::ModifierNot { .. } => FILTER_TYPE_MODIFIER_NOT,
        }
    }

    pub fn groups(&self) -> &[Vec<ModifierFlag>] {
        match self {
            FilterEntry::ModifierStuck { targets } => targets,
            FilterEntry::ModifierOnly { modifiers } | FilterEntry::ModifierNot { modifiers } => {
                modifiers
            }
        }
    }

    /// Flattened configuration buffer for `RemapFilter::initialize`
    pub fn to_buffer(&self) -> Vec<u32> {
        encode_modifier_groups(self.groups().iter().map(|g| g.as_slice()))
    }

    /// Construct and initialize the filter
    pub fn build(&self) -> Box<dyn RemapFilter> {
        let mut filter: Box<dyn RemapFilter> = match self {
            FilterEntry::ModifierStuck { .. } => {
                Box::new(ModifierStuckFilter::new(self.filter_type()))
            }
            FilterEntry::ModifierOnly { .. } => {
                Box::new(ModifierFilter::new(self.filter_type(), ModifierMatch::Only))
            }
            FilterEntry::ModifierNot { .. } => {
                Box::new(ModifierFilter::new(self.filter_type(), ModifierMatch::Not))
            }
        };
        filter.initialize(&self.to_buffer());
        filter
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recovery: RecoveryConfig::default(),
            filters: Vec::new(),
        }
    }
}

impl Config {
    /// System-wide config file path
    const SYSTEM_CONFIG_PATH: &'static str = "/etc/modguard/config.toml";

    /// Get the path that would be used for loading config
    /// Returns None if using built-in defaults
    pub fn config_path() -> Option<PathBuf> {
        // 1. MODGUARD_CONFIG environment variable
        if let Ok(path) = std::env::var("MODGUARD_CONFIG") {
            let p = Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
        }

        // 2. User config: ~/.config/modguard/config.toml
        if let Some(config_path) = default_config_path() {
            if config_path.exists() {
                return Some(config_path);
            }
        }

        // 3. System config: /etc/modguard/config.toml
        let system_config = Path::new(Self::SYSTEM_CONFIG_PATH);
        if system_config.exists() {
            return Some(system_config.to_path_buf());
        }

        None
    }

    /// Load configuration with priority:
    /// 1. MODGUARD_CONFIG environment variable
    /// 2. ~/.config/modguard/config.toml (user config)
    /// 3. /etc/modguard/config.toml (system config)
    /// 4. Built-in defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config {}: {:#}", path.display(), e);
                }
            }
        }
        info!("Using built-in default config");
        Self::default()
    }

    /// Load and validate settings from specified path
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.recovery.enabled && self.recovery.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        for (i, entry) in self.filters.iter().enumerate() {
            let groups = entry.groups();
            if groups.is_empty() {
                return Err(ConfigError::NoGroups {
                    filter: i,
                    kind: entry.kind(),
                });
            }
            if let Some(group) = groups.iter().position(|g| g.is_empty()) {
                return Err(ConfigError::EmptyGroup {
                    filter: i,
                    kind: entry.kind(),
                    group,
                });
            }
        }
        Ok(())
    }
}

/// Get default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("modguard").join("config.toml"))
}
