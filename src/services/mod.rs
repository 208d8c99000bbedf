//! Service layer for the harvester.
//!
//! This module contains the collaborators the pipeline drives:
//! - Post metadata resolution (`PostResolver`, `InstagramResolver`)
//! - Raw media download (`BlobFetcher`, `HttpFetcher`)
//! - Per-post media storage (`MediaArchiver`)
//! - Client identity (`Session`)

mod archiver;
mod fetcher;
mod resolver;
mod session;

pub use archiver::MediaArchiver;
pub use fetcher::{BlobFetcher, FetchError, HttpFetcher};
pub use resolver::{
    API_BASE, InstagramResolver, PostResolver, ResolveError, media_pk_from_code, parse_media_info,
};
pub use session::Session;
