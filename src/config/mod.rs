//! Configuration module for Listing-Sync
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use listing_sync::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("listing-sync.toml")).unwrap();
//! println!("Freshness window: {}h", config.scheduler.freshness_hours);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, EnumeratorConfig, ExtractorConfig, HostRuleEntry, SchedulerConfig, ScraperConfig,
    SourceEntry, StorageConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
