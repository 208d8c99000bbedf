// src/pipeline/harvest.rs

//! Harvest orchestration.
//!
//! Each URL moves through one of these paths, strictly in list order:
//!
//! ```text
//! Pending ─ cached ──────────────────────────────────────────▶ Skipped
//! Pending ─ resolved ─▶ media fetched ─▶ recorded ─▶ cached  (OK)
//! Pending ─ login wall ───────────────▶ recorded ─▶ cached  (LOGIN_REQUIRED)
//! Pending ─ unexpected failure ─────────────────────────────▶ Failed (retried next run)
//! ```
//!
//! The cache is only written after the dataset row is on disk, so a crash
//! can at worst repeat the item that was in flight.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{DatasetRecord, Outcome};
use crate::pipeline::rate_limit::{RateLimiter, pause};
use crate::services::{MediaArchiver, PostResolver, ResolveError, Session};
use crate::storage::{CacheStore, DatasetStore};
use crate::utils::url::post_identifier;

/// Counters for one harvest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    /// URLs in the list, duplicates included
    pub total: usize,
    /// Distinct post identifiers in the list
    pub unique: usize,
    /// Distinct identifiers already cached when the run started
    pub already_cached: usize,
    /// Distinct identifiers left to process when the run started
    pub to_process: usize,
    pub recorded: usize,
    pub login_required: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl HarvestSummary {
    /// Count the work ahead without processing anything.
    pub fn plan(urls: &[String], cache: &CacheStore) -> Self {
        let unique: HashSet<String> = urls.iter().filter_map(|u| post_identifier(u)).collect();
        let already_cached = unique.iter().filter(|id| cache.contains(id)).count();

        Self {
            total: urls.len(),
            unique: unique.len(),
            already_cached,
            to_process: unique.len() - already_cached,
            ..Self::default()
        }
    }

    /// Items that reached the dataset in this run.
    pub fn processed(&self) -> usize {
        self.recorded + self.login_required
    }
}

/// Result of processing a single uncached URL.
#[derive(Debug)]
enum ItemOutcome {
    Recorded(Outcome),
    Failed(ResolveError),
}

/// Sequential harvest driver.
pub struct Harvester {
    cache: CacheStore,
    dataset: DatasetStore,
    archiver: MediaArchiver,
    resolver: Arc<dyn PostResolver>,
    limiter: RateLimiter,
    session: Session,
}

impl Harvester {
    pub fn new(
        cache: CacheStore,
        dataset: DatasetStore,
        archiver: MediaArchiver,
        resolver: Arc<dyn PostResolver>,
        limiter: RateLimiter,
        session: Session,
    ) -> Self {
        Self {
            cache,
            dataset,
            archiver,
            resolver,
            limiter,
            session,
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn dataset(&self) -> &DatasetStore {
        &self.dataset
    }

    /// Process every URL in order.
    ///
    /// Only persistence failures end the run early.
    pub async fn run(&mut self, urls: &[String]) -> Result<HarvestSummary> {
        let mut summary = HarvestSummary::plan(urls, &self.cache);

        log::info!(
            "Found {} url(s) ({} unique). Already processed {} url(s), need to process {} more.",
            summary.total,
            summary.unique,
            summary.already_cached,
            summary.to_process
        );
        if self.session.is_authenticated() {
            log::info!("Using authenticated session");
        } else {
            log::info!("No session configured, requests are anonymous");
        }

        for url in urls {
            let Some(id) = post_identifier(url) else {
                log::error!("Cannot derive a post identifier from {url}, skipping");
                summary.failed += 1;
                continue;
            };

            if self.cache.contains(&id) {
                summary.skipped += 1;
                continue;
            }

            match self.process(url, &id).await? {
                ItemOutcome::Recorded(outcome) => {
                    match outcome {
                        Outcome::Ok => summary.recorded += 1,
                        Outcome::LoginRequired => summary.login_required += 1,
                    }

                    let delay = self.limiter.inter_request_delay();
                    log::info!(
                        "{} URL processed ({}). Waiting {:.1} second(s) till next request...",
                        progress(summary.processed(), summary.to_process),
                        outcome,
                        delay.as_secs_f64()
                    );
                    pause(delay).await;
                }
                ItemOutcome::Failed(e) => {
                    summary.failed += 1;

                    let delay = self.limiter.error_penalty_delay();
                    log::error!(
                        "Unexpected error while fetching data for {}: {} - {}. \
                         Skipping this URL and waiting {:.1} second(s)...",
                        url,
                        e.kind(),
                        e,
                        delay.as_secs_f64()
                    );
                    pause(delay).await;
                }
            }
        }

        log::info!(
            "Harvest finished: {} recorded, {} login required, {} failed, {} skipped",
            summary.recorded,
            summary.login_required,
            summary.failed,
            summary.skipped
        );

        Ok(summary)
    }

    /// Resolve, archive and record one URL.
    async fn process(&mut self, url: &str, id: &str) -> Result<ItemOutcome> {
        log::info!("Gathering data ({url})...");

        let record = match self.resolver.resolve(url).await {
            Ok(post) => {
                let mut record = DatasetRecord::from_post(url, post);
                let media_path = self.archive(id, &record).await?;
                record.media_path = media_path;
                record
            }
            Err(ResolveError::LoginRequired) => {
                log::info!("Post {url} is private or requires login, recording and moving on");
                DatasetRecord::login_required(url)
            }
            Err(e) => return Ok(ItemOutcome::Failed(e)),
        };

        self.dataset.append(&record).await?;
        self.cache.append(id).await?;

        Ok(ItemOutcome::Recorded(record.outcome))
    }

    /// Download every locator of a record; returns the post directory if any
    /// download succeeded.
    async fn archive(&self, id: &str, record: &DatasetRecord) -> Result<Option<PathBuf>> {
        let mut media_path = None;

        for (index, locator) in record.media_locators().into_iter().enumerate() {
            if let Some(dir) = self
                .archiver
                .download(id, locator, self.session.identity(), index + 1)
                .await?
            {
                media_path = Some(dir);
            }
        }

        Ok(media_path)
    }
}

/// `(<pct>% - <done>/<total>)` with the percentage rounded to 4 decimals.
fn progress(done: usize, total: usize) -> String {
    let pct = if total == 0 {
        100.0
    } else {
        ((done as f64 / total as f64) * 100.0 * 10_000.0).round() / 10_000.0
    };
    format!("({pct}% - {done}/{total})")
}
