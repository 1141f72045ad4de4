//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop, including:
//! - Choosing the next collection job from the work ledger
//! - Fetching one listing page, with a single retry at the following page
//! - Queuing sub-collections and recording hashes for leaf items
//! - Advancing or retiring the job
//! - Stopping cleanly between jobs when interrupted

use crate::config::{Config, CrawlerConfig};
use crate::crawler::{ArchiveApi, HttpArchive};
use crate::state::Resolution;
use crate::storage::{HashRecorder, Job, SqliteHashStore, SqliteLedger, WorkLedger};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Pages between progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// Counters for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Listing pages that returned entries and were fully processed
    pub pages_processed: u64,
    /// Collections whose listing ran dry
    pub collections_completed: u64,
    /// Collections retired after a failed fetch
    pub collections_failed: u64,
    /// Sub-collections newly queued
    pub collections_discovered: u64,
    /// Leaf items whose hashes were stored
    pub items_recorded: u64,
    /// Entries skipped because metadata could not be fetched or recorded
    pub items_skipped: u64,
    /// Hash rows stored
    pub hashes_recorded: u64,
}

/// What a single iteration of the crawl loop did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The ledger had no active jobs
    Idle,

    /// A page was processed and the job moved to the next page
    Advanced {
        collection: String,
        page: u32,
        entries: usize,
    },

    /// The listing returned no entries and the job was retired
    Exhausted { collection: String },

    /// The page could not be fetched and the job was retired
    Failed { collection: String, reason: String },
}

/// Main crawler coordinator structure
pub struct Coordinator<A, L = SqliteLedger, R = SqliteHashStore> {
    config: CrawlerConfig,
    archive: A,
    ledger: L,
    recorder: R,
    summary: CrawlSummary,
}

impl Coordinator<HttpArchive> {
    /// Opens both databases and the archive client described by `config`
    ///
    /// Any store that fails to initialize aborts startup.
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let ledger = SqliteLedger::new(Path::new(&config.output.ledger_path))?;
        let recorder = SqliteHashStore::new(Path::new(&config.output.hashes_path))?;
        let archive = HttpArchive::new(&config.archive)?;

        tracing::info!(
            "Opened ledger {} ({} active jobs) and hash store {}",
            config.output.ledger_path,
            ledger.len(),
            config.output.hashes_path
        );

        Ok(Self::new(config.crawler.clone(), archive, ledger, recorder))
    }
}

impl<A, L, R> Coordinator<A, L, R>
where
    A: ArchiveApi,
    L: WorkLedger,
    R: HashRecorder,
{
    /// Creates a new coordinator instance
    pub fn new(config: CrawlerConfig, archive: A, ledger: L, recorder: R) -> Self {
        Self {
            config,
            archive,
            ledger,
            recorder,
            summary: CrawlSummary::default(),
        }
    }

    /// Queues the given collections
    ///
    /// Collections that are already active or already resolved are ignored.
    ///
    /// # Returns
    ///
    /// The number of new jobs
    pub fn seed<I, S>(&mut self, collections: I) -> crate::Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for name in collections {
            let name = name.as_ref();
            if self.ledger.add(name)? {
                added += 1;
            } else {
                tracing::info!("Not queuing {}: already active or resolved", name);
            }
        }
        Ok(added)
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    pub fn summary(&self) -> &CrawlSummary {
        &self.summary
    }

    /// Runs the crawl loop until the ledger is empty or `stop` is set
    ///
    /// `stop` is only checked between jobs, so a page that has started is
    /// always processed in full before the loop returns.
    pub async fn run(&mut self, stop: &AtomicBool) -> crate::Result<CrawlSummary> {
        tracing::info!("Starting crawl with {} active jobs", self.ledger.len());
        let start_time = Instant::now();

        loop {
            if stop.load(Ordering::Acquire) {
                tracing::info!("Interrupted; shut down safely");
                break;
            }

            if self.ledger.is_empty() {
                tracing::info!("Work ledger is empty, crawl complete");
                break;
            }

            if let StepOutcome::Advanced { .. } = self.step().await? {
                if self.summary.pages_processed % PROGRESS_INTERVAL == 0 {
                    tracing::info!(
                        "Progress: {} pages, {} items recorded, {} active jobs",
                        self.summary.pages_processed,
                        self.summary.items_recorded,
                        self.ledger.len()
                    );
                }
            }
        }

        let summary = self.summary.clone();
        tracing::info!(
            "Crawl stopped after {:?}: {} pages, {} collections completed, {} failed, \
             {} discovered, {} items recorded ({} hashes), {} skipped",
            start_time.elapsed(),
            summary.pages_processed,
            summary.collections_completed,
            summary.collections_failed,
            summary.collections_discovered,
            summary.items_recorded,
            summary.hashes_recorded,
            summary.items_skipped
        );

        Ok(summary)
    }

    /// Runs one iteration of the crawl loop against the next job
    ///
    /// Ledger failures are returned as errors; everything that goes wrong with
    /// the archive is absorbed into the outcome or logged.
    pub async fn step(&mut self) -> crate::Result<StepOutcome> {
        if self.ledger.is_empty() {
            return Ok(StepOutcome::Idle);
        }

        let mut job = self.ledger.next()?;
        tracing::debug!("Processing {} page {}", job.collection, job.page);

        let batch_size = self.config.batch_size;
        let first_attempt = self
            .archive
            .fetch_page(&job.collection, batch_size, job.page)
            .await;

        let entries = match first_attempt {
            Ok(entries) => entries,
            Err(first) => {
                if !self.config.retry_next_page {
                    return self.retire(job, Resolution::Failed(first.to_string()));
                }

                tracing::warn!(
                    "{} page {}: {}; retrying at page {}",
                    job.collection,
                    job.page,
                    first,
                    job.page + 1
                );
                job.page += 1;

                let retry = self
                    .archive
                    .fetch_page(&job.collection, batch_size, job.page)
                    .await;
                match retry {
                    Ok(entries) => {
                        self.ledger.increment(&job.collection)?;
                        entries
                    }
                    Err(e) => return self.retire(job, Resolution::Failed(e.to_string())),
                }
            }
        };

        if entries.is_empty() {
            return self.retire(job, Resolution::Exhausted);
        }

        for entry in &entries {
            self.process_entry(&job, entry).await?;
        }

        self.ledger.increment(&job.collection)?;
        self.summary.pages_processed += 1;

        Ok(StepOutcome::Advanced {
            collection: job.collection,
            page: job.page,
            entries: entries.len(),
        })
    }

    /// Moves a job to the done log with its terminal outcome
    fn retire(&mut self, job: Job, resolution: Resolution) -> crate::Result<StepOutcome> {
        self.ledger.remove(&job, resolution.to_reason())?;

        if resolution.is_success() {
            self.summary.collections_completed += 1;
            tracing::info!("Finished {} at page {}", job.collection, job.page);
            return Ok(StepOutcome::Exhausted {
                collection: job.collection,
            });
        }

        self.summary.collections_failed += 1;
        tracing::warn!("Removed {} due to error {}", job.collection, resolution.to_reason());
        Ok(StepOutcome::Failed {
            collection: job.collection,
            reason: resolution.to_reason().to_string(),
        })
    }

    /// Handles one listing entry: queue it or record its hashes
    async fn process_entry(&mut self, job: &Job, entry: &str) -> crate::Result<()> {
        tokio::time::sleep(self.config.item_delay()).await;

        let kind = match self.archive.fetch_kind(entry).await {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!("{} page {}: skipping {}: {}", job.collection, job.page, entry, e);
                self.summary.items_skipped += 1;
                return Ok(());
            }
        };

        if kind.is_collection() {
            if self.ledger.add(entry)? {
                self.summary.collections_discovered += 1;
                tracing::debug!("Queued sub-collection {} from {}", entry, job.collection);
            }
            return Ok(());
        }

        let files = match self.archive.fetch_files(entry).await {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!("{} page {}: skipping {}: {}", job.collection, job.page, entry, e);
                self.summary.items_skipped += 1;
                return Ok(());
            }
        };

        match self.recorder.record(entry, &files) {
            Ok(inserted) => {
                self.summary.items_recorded += 1;
                self.summary.hashes_recorded += inserted as u64;
            }
            Err(e) => {
                tracing::warn!("In item {}: {}", entry, e);
                self.summary.items_skipped += 1;
            }
        }

        Ok(())
    }
}

/// Runs the main crawl operation
///
/// Opens the stores named in `config`, queues `seeds`, and crawls until the
/// ledger is empty or `stop` is set.
///
/// # Example
///
/// ```no_run
/// use archive_hasher::config::Config;
/// use archive_hasher::crawler::run_crawl;
/// use std::sync::atomic::AtomicBool;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stop = AtomicBool::new(false);
/// let summary = run_crawl(&Config::default(), &["some-collection"], &stop).await?;
/// println!("{} items recorded", summary.items_recorded);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl<S: AsRef<str>>(
    config: &Config,
    seeds: &[S],
    stop: &AtomicBool,
) -> crate::Result<CrawlSummary> {
    let mut coordinator = Coordinator::from_config(config)?;
    let added = coordinator.seed(seeds)?;
    tracing::info!("Queued {} of {} seed collections", added, seeds.len());
    coordinator.run(stop).await
}
