//! The Idle-Triggered Snapshot Writer: load a page, wait for the network to
//! go quiet, flush state to disk exactly once.

mod idle;
mod record;

pub use record::ResourceRecord;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFinished, EventResponseReceived,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::browser::{BrowserHandle, BrowserOptions};
use crate::{Error, Result};
use record::{NetworkEvent, ResourceLog};

/// Default quiet period before the flush fires.
pub const DEFAULT_QUIET_MS: u64 = 1000;
/// Default overall navigation timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Where a visit writes its artifacts.
#[derive(Debug, Clone)]
pub enum Output {
    /// Full snapshot: `cookies.json`, `resources.json` and `capture.png`
    /// inside a directory (created if missing).
    Archive(PathBuf),
    /// Cookie jar only, written to the given file; each observed resource
    /// URL is echoed to stdout.
    CookieJar(PathBuf),
}

/// Options for a single visit.
#[derive(Debug, Clone)]
pub struct VisitOptions {
    /// Required network silence before the flush fires.
    pub quiet: Duration,
    /// Overall navigation timeout; expiry counts as a failed load.
    pub timeout: Duration,
    /// Browser launch options.
    pub browser: BrowserOptions,
}

impl Default for VisitOptions {
    fn default() -> Self {
        Self {
            quiet: Duration::from_millis(DEFAULT_QUIET_MS),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            browser: BrowserOptions::default(),
        }
    }
}

/// What a completed visit wrote.
#[derive(Debug)]
pub struct VisitSummary {
    /// Number of resource records observed.
    pub resources: usize,
    /// Number of cookies in the jar at flush time.
    pub cookies: usize,
    /// Wall-clock duration of the whole visit.
    pub duration_ms: u64,
}

/// Load `url`, wait for the network to go quiet, then flush state to
/// `output`. Launches a fresh browser so the cookie jar starts empty.
pub async fn visit(url: &str, output: &Output, options: &VisitOptions) -> Result<VisitSummary> {
    let start = Instant::now();
    let handle = BrowserHandle::launch(&options.browser).await?;
    let result = snapshot(&handle, url, output, options).await;
    let closed = handle.close().await;
    let (resources, cookies) = result?;
    closed?;

    Ok(VisitSummary {
        resources,
        cookies,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

async fn snapshot(
    handle: &BrowserHandle,
    url: &str,
    output: &Output,
    options: &VisitOptions,
) -> Result<(usize, usize)> {
    let page = handle.browser.new_page("about:blank").await?;
    page.execute(EnableParams::default()).await?;

    // Subscribe before navigating so resources fetched during the load are
    // already on the stream when the settle loop starts draining it.
    let responses = page
        .event_listener::<EventResponseReceived>()
        .await?
        .map(|ev| NetworkEvent::Response {
            request_id: ev.request_id.inner().clone(),
            record: ResourceRecord::from_response(&ev.response),
        });
    let finished = page
        .event_listener::<EventLoadingFinished>()
        .await?
        .map(|ev| NetworkEvent::Finished {
            request_id: ev.request_id.inner().clone(),
            size: ev.encoded_data_length.max(0.0) as u64,
        });
    let events = futures::stream::select(responses, finished);

    info!("visit: {}", url);
    match tokio::time::timeout(options.timeout, page.goto(url)).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => return Err(Error::PageLoad(e.to_string())),
        Err(_) => {
            return Err(Error::Timeout(format!(
                "no load outcome within {}ms",
                options.timeout.as_millis()
            )))
        }
    }

    let mut log = ResourceLog::new(matches!(output, Output::CookieJar(_)));
    idle::settle(events, options.quiet, &mut log).await;
    debug!(
        "network quiet for {}ms, flushing {} resources",
        options.quiet.as_millis(),
        log.len()
    );

    flush(&page, output, log).await
}

/// The one-shot flush: serialize the cookie jar and, for the archive
/// variant, the resource list and a viewport screenshot.
async fn flush(page: &Page, output: &Output, log: ResourceLog) -> Result<(usize, usize)> {
    let cookies = page.get_cookies().await?;
    let resources = log.into_records();

    match output {
        Output::Archive(dir) => {
            std::fs::create_dir_all(dir)?;
            write_json(&dir.join("cookies.json"), &cookies)?;
            write_json(&dir.join("resources.json"), &resources)?;

            let image = page
                .screenshot(
                    ScreenshotParams::builder()
                        .format(CaptureScreenshotFormat::Png)
                        .build(),
                )
                .await?;
            std::fs::write(dir.join("capture.png"), image)?;
            debug!("archive written to {}", dir.display());
        }
        Output::CookieJar(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            write_json(path, &cookies)?;
            debug!("cookie jar written to {}", path.display());
        }
    }

    Ok((resources.len(), cookies.len()))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, data)?;
    Ok(())
}
