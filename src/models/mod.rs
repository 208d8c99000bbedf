// src/models/mod.rs

//! Domain models for the harvester.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod post;
mod record;

// Re-export all public types
pub use config::{
    AuthConfig, Config, HttpConfig, PathsConfig, RateLimitConfig, parse_url_list,
};
pub use post::{MediaKind, MediaPost};
pub use record::{COLUMNS, DatasetRecord, Outcome, RESOURCE_SLOTS};
