//! Browser launch and teardown.

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{Error, Result};

/// Fixed viewport the page renders (and is screenshotted) at.
pub(crate) const VIEWPORT_WIDTH: u32 = 1024;
pub(crate) const VIEWPORT_HEIGHT: u32 = 768;

/// Browser launch options.
#[derive(Debug, Clone, Default)]
pub struct BrowserOptions {
    /// Run with a visible window instead of headless.
    pub headed: bool,
}

/// A launched browser plus the task pumping its CDP connection.
///
/// The handler stream must be polled for as long as the connection lives;
/// dropping it silently stalls every in-flight command.
pub(crate) struct BrowserHandle {
    pub browser: Browser,
    event_task: JoinHandle<()>,
}

impl BrowserHandle {
    pub async fn launch(options: &BrowserOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder().window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT);
        if options.headed {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(Error::Config)?;

        debug!("launching browser (headed: {})", options.headed);
        let (browser, mut handler) = Browser::launch(config).await?;
        let event_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        Ok(Self {
            browser,
            event_task,
        })
    }

    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        let _ = self.browser.wait().await;
        self.event_task.abort();
        Ok(())
    }
}
