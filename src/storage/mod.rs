//! Durable stores for harvest progress and results.
//!
//! ## Layout
//!
//! ```text
//! {working dir}/
//! ├── cache.txt             # Processed identifiers, one per line (append-only)
//! ├── data.csv              # Dataset, fixed header + one row per processed URL
//! └── media/                # Written by the media archiver
//!     └── {identifier}/
//!         └── {file name}
//! ```
//!
//! Both stores are opened in append mode by a single writer; every write is
//! synced before the call returns.

pub mod cache;
pub mod dataset;

pub use cache::CacheStore;
pub use dataset::DatasetStore;
