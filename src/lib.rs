//! # websnap
//!
//! Idle-triggered page snapshots. Load a URL in headless Chrome, wait for
//! the network to go quiet, then write cookies, the observed resources, and
//! a screenshot to disk.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use websnap::{visit, Output, VisitOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> websnap::Result<()> {
//! let summary = visit(
//!     "https://example.com",
//!     &Output::Archive("data".into()),
//!     &VisitOptions::default(),
//! )
//! .await?;
//! println!("{} resources in {}ms", summary.resources, summary.duration_ms);
//! # Ok(())
//! # }
//! ```

pub mod batch;
mod browser;
mod capture;

pub use batch::{BatchOptions, BatchReport};
pub use browser::BrowserOptions;
pub use capture::{
    visit, Output, ResourceRecord, VisitOptions, VisitSummary, DEFAULT_QUIET_MS,
    DEFAULT_TIMEOUT_MS,
};

/// Result type for websnap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while visiting a page or running a batch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("page open failed: {0}")]
    PageLoad(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("batch worker failed: {0}")]
    Worker(String),
}
