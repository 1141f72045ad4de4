//! Statistics generation from the crawl databases
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from both storage layers.

use crate::storage::{DoneRecord, HashRecorder, Job, WorkLedger};

/// Number of active jobs listed individually
const JOBS_SHOWN: usize = 20;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Active jobs in scheduling order
    pub active_jobs: Vec<Job>,

    /// Collections in the done log
    pub done_collections: u64,

    /// Done records with a failure reason
    pub failed_collections: Vec<DoneRecord>,

    /// Leaf items with at least one recorded hash
    pub recorded_items: u64,

    /// Total hash rows
    pub recorded_hashes: u64,
}

impl CrawlStatistics {
    /// Collections scanned to the end
    pub fn completed_collections(&self) -> u64 {
        self.done_collections.saturating_sub(self.failed_collections.len() as u64)
    }
}

/// Loads statistics from both stores
///
/// # Arguments
///
/// * `ledger` - The work ledger to query
/// * `recorder` - The hash store to query
pub fn load_statistics(
    ledger: &dyn WorkLedger,
    recorder: &dyn HashRecorder,
) -> crate::Result<CrawlStatistics> {
    let active_jobs = ledger.jobs()?;
    let done_collections = ledger.done_count()?;
    let failed_collections = ledger.failed_records()?;
    let recorded_items = recorder.item_count()?;
    let recorded_hashes = recorder.hash_count()?;

    Ok(CrawlStatistics {
        active_jobs,
        done_collections,
        failed_collections,
        recorded_items,
        recorded_hashes,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Work Ledger:");
    println!("  Active jobs: {}", stats.active_jobs.len());
    println!("  Completed collections: {}", stats.completed_collections());
    println!("  Failed collections: {}", stats.failed_collections.len());
    println!();

    if !stats.active_jobs.is_empty() {
        println!("Next Jobs:");
        for job in stats.active_jobs.iter().take(JOBS_SHOWN) {
            println!("  {} (page {})", job.collection, job.page);
        }
        if stats.active_jobs.len() > JOBS_SHOWN {
            println!("  ... and {} more", stats.active_jobs.len() - JOBS_SHOWN);
        }
        println!();
    }

    if !stats.failed_collections.is_empty() {
        println!("Failed Collections:");
        for record in &stats.failed_collections {
            println!(
                "  {} at page {} ({}): {}",
                record.collection,
                record.page,
                record.resolved_at,
                record.resolution()
            );
        }
        println!();
    }

    println!("Hashes:");
    println!("  Recorded items: {}", stats.recorded_items);
    println!("  Recorded hashes: {}", stats.recorded_hashes);

    let per_item = if stats.recorded_items > 0 {
        stats.recorded_hashes as f64 / stats.recorded_items as f64
    } else {
        0.0
    };
    println!("  Hashes per item: {:.1}", per_item);
}
