//! Seams towards the browser. The crawl engine only talks to these traits;
//! [`crate::chrome`] drives Chromium through them and the `testing` feature
//! provides an in-memory site.

use crate::error::Result;
use crate::links::PageSnapshot;
use async_trait::async_trait;
use std::path::Path;

/// Starts browser sessions. One session is launched per seed.
#[async_trait]
pub trait Renderer: Send + Sync {
    type Session: Session + 'static;

    async fn launch(&self) -> Result<Self::Session>;
}

/// A running browser shared by every tab of one seed crawl.
#[async_trait]
pub trait Session: Send + Sync {
    type Tab: Tab + 'static;

    async fn new_tab(&self) -> Result<Self::Tab>;

    async fn close(&self) -> Result<()>;
}

/// One page, owned by exactly one worker for its whole life.
#[async_trait]
pub trait Tab: Send + Sync {
    async fn set_user_agent(&self, user_agent: &str) -> Result<()>;

    async fn set_javascript_enabled(&self, enabled: bool) -> Result<()>;

    /// Navigate and wait for the load to finish.
    async fn goto(&self, url: &str) -> Result<()>;

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<()>;

    /// Paginated PDF sized to `width` x `height` CSS pixels.
    async fn pdf(&self, path: &Path, width: u32, height: u32) -> Result<()>;

    /// Run the link snapshot script in the page context.
    async fn snapshot_links(&self) -> Result<PageSnapshot>;

    async fn close(self) -> Result<()>;
}
