//! Batch visits: drain a site list with a pool of workers.
//!
//! Loads a JSON array of URLs, optionally samples it, then lets N workers
//! snapshot one site each into numbered directories under the data root.
//! A failed visit is retried with the site's directory wiped in between so
//! stale partial state never survives into the next attempt.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use rand::seq::SliceRandom;
use tracing::{info, warn};

use crate::capture::{visit, Output, VisitOptions};
use crate::{Error, Result};

/// Attempts per site before the batch run gives up.
const MAX_ATTEMPTS: u32 = 5;

/// Options for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Number of concurrent workers.
    pub workers: usize,
    /// Visit only a random sample of this many sites.
    pub trial: Option<usize>,
    /// Root directory for per-site snapshot directories.
    pub data_dir: PathBuf,
    /// Per-visit options.
    pub visit: VisitOptions,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: 8,
            trial: None,
            data_dir: PathBuf::from("data"),
            visit: VisitOptions::default(),
        }
    }
}

/// Outcome of a batch run.
#[derive(Debug)]
pub struct BatchReport {
    /// Sites visited.
    pub sites: usize,
    /// Retry attempts made across all sites.
    pub retries: u32,
}

/// Load a site list: a JSON array of URL strings.
pub fn load_sites(path: &Path) -> Result<Vec<String>> {
    let data = std::fs::read_to_string(path)?;
    let sites: Vec<String> = serde_json::from_str(&data)?;
    Ok(sites)
}

/// Take a random sample of `n` sites (all of them if `n` is larger).
fn sample(mut sites: Vec<String>, n: usize) -> Vec<String> {
    sites.shuffle(&mut rand::rng());
    sites.truncate(n);
    sites
}

/// Per-site snapshot directory, named by the site's list position.
fn site_dir(data_dir: &Path, ix: usize) -> PathBuf {
    data_dir.join(format!("{ix:04}"))
}

/// Visit every site in the list. The first site to exhaust its attempts
/// fails the whole run.
pub async fn run(sites_file: &Path, options: &BatchOptions) -> Result<BatchReport> {
    let mut sites = load_sites(sites_file)?;
    if let Some(n) = options.trial {
        sites = sample(sites, n);
    }
    if sites.is_empty() {
        return Err(Error::Config("site list is empty".into()));
    }

    info!("batch: {} sites, {} workers", sites.len(), options.workers);

    let jobs: Arc<Vec<String>> = Arc::new(sites);
    let cursor = Arc::new(AtomicUsize::new(0));
    let retries = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::new();
    for _ in 0..options.workers.max(1) {
        let jobs = Arc::clone(&jobs);
        let cursor = Arc::clone(&cursor);
        let retries = Arc::clone(&retries);
        let options = options.clone();
        handles.push(tokio::spawn(async move {
            loop {
                let ix = cursor.fetch_add(1, Ordering::Relaxed);
                let Some(url) = jobs.get(ix) else { break };
                retries.fetch_add(visit_site(url, ix, &options).await?, Ordering::Relaxed);
            }
            Ok::<(), Error>(())
        }));
    }

    for handle in handles {
        handle
            .await
            .map_err(|e| Error::Worker(e.to_string()))??;
    }

    Ok(BatchReport {
        sites: jobs.len(),
        retries: retries.load(Ordering::Relaxed),
    })
}

/// Snapshot one site with retries. Returns the number of retries used.
async fn visit_site(url: &str, ix: usize, options: &BatchOptions) -> Result<u32> {
    let dir = site_dir(&options.data_dir, ix);
    let output = Output::Archive(dir.clone());

    let mut attempt = 0;
    let mut retries = 0;
    loop {
        attempt += 1;
        info!("visit: {}", url);
        match visit(url, &output, &options.visit).await {
            Ok(summary) => {
                info!(
                    "success: {} ({} resources, {}ms)",
                    url, summary.resources, summary.duration_ms
                );
                return Ok(retries);
            }
            Err(e) => {
                warn!("failure: {} (attempt {}/{}): {}", url, attempt, MAX_ATTEMPTS, e);
                clean_site_dir(&dir)?;
                if attempt >= MAX_ATTEMPTS {
                    return Err(e);
                }
                retries += 1;
            }
        }
    }
}

/// Remove a site's partial output so a retry starts from nothing.
fn clean_site_dir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
