//! Pipeline entry points.
//!
//! - `run_harvest`: Process the configured URL list end to end
//! - `inspect`: Report progress counters without processing anything

pub mod harvest;
pub mod rate_limit;

use std::sync::Arc;

use crate::error::Result;
use crate::models::Config;
use crate::services::{HttpFetcher, InstagramResolver, MediaArchiver, Session};
use crate::storage::{CacheStore, DatasetStore};
use crate::utils::http;

pub use harvest::{HarvestSummary, Harvester};
pub use rate_limit::RateLimiter;

/// Build the production harvester for a configuration.
pub async fn build_harvester(config: &Config) -> Result<Harvester> {
    let session = Session::from_config(&config.http, &config.auth);

    let api_client = http::create_session_client(&config.http, &session)?;
    let media_client = http::create_async_client(&config.http)?;

    log::info!("Loading cache from {}...", config.paths.cache_file.display());
    let cache = CacheStore::load(&config.paths.cache_file).await?;

    log::info!("Loading dataset at {}...", config.paths.dataset_file.display());
    let dataset = DatasetStore::open(&config.paths.dataset_file).await?;

    let archiver = MediaArchiver::new(
        &config.paths.media_dir,
        Arc::new(HttpFetcher::new(media_client)),
    );

    Ok(Harvester::new(
        cache,
        dataset,
        archiver,
        Arc::new(InstagramResolver::new(api_client)),
        RateLimiter::new(&config.rate_limit),
        session,
    ))
}

/// Run the harvest over the configured URL list.
pub async fn run_harvest(config: &Config) -> Result<HarvestSummary> {
    let urls = config.url_list()?;
    let mut harvester = build_harvester(config).await?;
    harvester.run(&urls).await
}

/// Progress counters for the configured URL list and stores.
///
/// Missing stores are created empty, as on a first run.
pub async fn inspect(config: &Config) -> Result<(HarvestSummary, usize)> {
    let urls = config.url_list()?;
    let cache = CacheStore::load(&config.paths.cache_file).await?;
    let dataset = DatasetStore::open(&config.paths.dataset_file).await?;

    let plan = HarvestSummary::plan(&urls, &cache);
    let rows = dataset.read_rows()?.len();
    Ok((plan, rows))
}
