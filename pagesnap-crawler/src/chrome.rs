//! Chromium renderer over the DevTools protocol.
//!
//! One headless browser is launched per seed. Tabs share it, so they share
//! the profile and cache of that browser but nothing across seeds.

use crate::config::CrawlConfig;
use crate::error::{CrawlError, Result};
use crate::links::PageSnapshot;
use crate::links::SNAPSHOT_SCRIPT;
use crate::renderer::{Renderer, Session, Tab};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetScriptExecutionDisabledParams;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, PrintToPdfParams};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// CSS pixels per inch, used to size PDF paper from the viewport.
const CSS_PIXELS_PER_INCH: f64 = 96.0;

/// Flags that keep a capture session from leaking state or traffic.
const PRIVACY_ARGS: &[&str] = &[
    "--incognito",
    "--no-experiments",
    "--no-pings",
    "--no-referrers",
    "--dns-prefetch-disable",
    "--disable-preconnect",
];

const HEADLESS_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--no-first-run",
    "--no-default-browser-check",
];

#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    config: Arc<CrawlConfig>,
}

impl ChromeRenderer {
    pub fn new(config: CrawlConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let viewport = &self.config.viewport;
        let mut builder = BrowserConfig::builder()
            .viewport(Viewport {
                width: viewport.width,
                height: viewport.height,
                device_scale_factor: Some(viewport.device_scale_factor),
                emulating_mobile: viewport.is_mobile,
                is_landscape: viewport.is_landscape,
                has_touch: viewport.has_touch,
            })
            .window_size(viewport.width, viewport.height);

        if let Some(ref executable) = self.config.chrome_executable {
            builder = builder.chrome_executable(executable);
        }

        for arg in PRIVACY_ARGS.iter().chain(HEADLESS_ARGS) {
            builder = builder.arg(*arg);
        }

        builder.build().map_err(CrawlError::Renderer)
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    type Session = ChromeSession;

    async fn launch(&self) -> Result<ChromeSession> {
        let config = self.browser_config()?;
        let (browser, mut handler) = Browser::launch(config).await?;
        info!(
            "Launched browser ({}x{} viewport)",
            self.config.viewport.width, self.config.viewport.height
        );

        let handler = tokio::spawn(async move {
            drive_handler(&mut handler).await;
        });

        Ok(ChromeSession {
            browser: Mutex::new(browser),
            handler,
        })
    }
}

/// Poll the CDP event stream until it ends. Errors are logged and skipped.
/// Returns the number of errors seen.
async fn drive_handler<S, T, E>(events: &mut S) -> usize
where
    S: futures::Stream<Item = std::result::Result<T, E>> + Unpin,
    E: std::fmt::Display,
{
    let mut errors = 0;
    while let Some(event) = events.next().await {
        if let Err(e) = event {
            debug!("Browser handler error: {}", e);
            errors += 1;
        }
    }
    errors
}

pub struct ChromeSession {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
}

#[async_trait]
impl Session for ChromeSession {
    type Tab = ChromeTab;

    async fn new_tab(&self) -> Result<ChromeTab> {
        let page = self.browser.lock().await.new_page("about:blank").await?;
        Ok(ChromeTab(page))
    }

    async fn close(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            warn!("Browser did not close cleanly: {}", e);
        }
        browser.wait().await?;
        self.handler.abort();
        debug!("Browser closed");
        Ok(())
    }
}

pub struct ChromeTab(Page);

#[async_trait]
impl Tab for ChromeTab {
    async fn set_user_agent(&self, user_agent: &str) -> Result<()> {
        self.0
            .execute(SetUserAgentOverrideParams::new(user_agent.to_string()))
            .await?;
        Ok(())
    }

    async fn set_javascript_enabled(&self, enabled: bool) -> Result<()> {
        self.0
            .execute(SetScriptExecutionDisabledParams::new(!enabled))
            .await?;
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<()> {
        self.0.goto(url).await?;
        Ok(())
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(full_page)
            .build();
        self.0.save_screenshot(params, path).await?;
        Ok(())
    }

    async fn pdf(&self, path: &Path, width: u32, height: u32) -> Result<()> {
        let params = PrintToPdfParams {
            paper_width: Some(f64::from(width) / CSS_PIXELS_PER_INCH),
            paper_height: Some(f64::from(height) / CSS_PIXELS_PER_INCH),
            print_background: Some(true),
            ..Default::default()
        };
        self.0.save_pdf(params, path).await?;
        Ok(())
    }

    async fn snapshot_links(&self) -> Result<PageSnapshot> {
        let params = EvaluateParams::builder()
            .expression(SNAPSHOT_SCRIPT)
            .return_by_value(true)
            .build()
            .map_err(CrawlError::Evaluation)?;

        self.0
            .evaluate_expression(params)
            .await?
            .into_value::<PageSnapshot>()
            .map_err(|e| CrawlError::Evaluation(e.to_string()))
    }

    async fn close(self) -> Result<()> {
        self.0.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handler_keeps_polling_after_errors() {
        let mut events = futures::stream::iter(vec![
            Ok(()),
            Err("malformed message"),
            Ok(()),
            Err("unknown event"),
            Ok(()),
        ]);

        let errors = drive_handler(&mut events).await;

        assert_eq!(errors, 2);
        assert!(events.next().await.is_none());
    }
}
