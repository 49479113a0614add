//! In-memory renderer for tests: a fixed map of pages, no browser.
//!
//! Every navigation, tab and session is recorded in a shared [`MockLog`].
//! Artifacts are written as small placeholder files so path handling is
//! exercised for real.

use crate::error::{CrawlError, Result};
use crate::links::{Element, PageSnapshot};
use crate::renderer::{Renderer, Session, Tab};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// The pages a [`MockRenderer`] can serve.
#[derive(Debug, Clone, Default)]
pub struct MockSite {
    pages: HashMap<String, PageSnapshot>,
    failing: HashSet<String>,
    delay: Option<Duration>,
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// A page whose anchors point at `links`, written as absolute hrefs.
    pub fn page(self, url: &str, links: &[&str]) -> Self {
        let elements = links.iter().map(|l| Element::anchor(l, l)).collect();
        self.snapshot(PageSnapshot::new(url, elements))
    }

    pub fn snapshot(mut self, snapshot: PageSnapshot) -> Self {
        self.pages.insert(snapshot.location.clone(), snapshot);
        self
    }

    /// Navigation to `url` fails.
    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    /// Every navigation sleeps this long first.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Default)]
pub struct MockLog {
    navigations: Mutex<Vec<String>>,
    user_agents: Mutex<Vec<String>>,
    javascript: Mutex<Vec<bool>>,
    pub sessions_launched: AtomicUsize,
    pub sessions_closed: AtomicUsize,
    pub tabs_opened: AtomicUsize,
    pub tabs_closed: AtomicUsize,
}

impl MockLog {
    /// Every URL navigated to, in order.
    pub fn navigations(&self) -> Vec<String> {
        lock(&self.navigations).clone()
    }

    pub fn user_agents(&self) -> Vec<String> {
        lock(&self.user_agents).clone()
    }

    pub fn javascript_settings(&self) -> Vec<bool> {
        lock(&self.javascript).clone()
    }

    pub fn tabs_opened(&self) -> usize {
        self.tabs_opened.load(Ordering::SeqCst)
    }

    pub fn tabs_closed(&self) -> usize {
        self.tabs_closed.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone)]
pub struct MockRenderer {
    site: Arc<MockSite>,
    log: Arc<MockLog>,
}

impl MockRenderer {
    pub fn new(site: MockSite) -> Self {
        Self {
            site: Arc::new(site),
            log: Arc::new(MockLog::default()),
        }
    }

    pub fn log(&self) -> Arc<MockLog> {
        self.log.clone()
    }

    /// A session without going through [`Renderer::launch`].
    pub fn session(&self) -> MockSession {
        self.log.sessions_launched.fetch_add(1, Ordering::SeqCst);
        MockSession {
            site: self.site.clone(),
            log: self.log.clone(),
        }
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    type Session = MockSession;

    async fn launch(&self) -> Result<MockSession> {
        Ok(self.session())
    }
}

#[derive(Debug)]
pub struct MockSession {
    site: Arc<MockSite>,
    log: Arc<MockLog>,
}

#[async_trait]
impl Session for MockSession {
    type Tab = MockTab;

    async fn new_tab(&self) -> Result<MockTab> {
        self.log.tabs_opened.fetch_add(1, Ordering::SeqCst);
        Ok(MockTab {
            site: self.site.clone(),
            log: self.log.clone(),
            current: Mutex::new(None),
        })
    }

    async fn close(&self) -> Result<()> {
        self.log.sessions_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockTab {
    site: Arc<MockSite>,
    log: Arc<MockLog>,
    current: Mutex<Option<String>>,
}

impl MockTab {
    fn current(&self) -> Result<String> {
        lock(&self.current)
            .clone()
            .ok_or_else(|| CrawlError::Renderer("no page loaded".to_string()))
    }
}

#[async_trait]
impl Tab for MockTab {
    async fn set_user_agent(&self, user_agent: &str) -> Result<()> {
        lock(&self.log.user_agents).push(user_agent.to_string());
        Ok(())
    }

    async fn set_javascript_enabled(&self, enabled: bool) -> Result<()> {
        lock(&self.log.javascript).push(enabled);
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<()> {
        if let Some(delay) = self.site.delay {
            tokio::time::sleep(delay).await;
        }
        lock(&self.log.navigations).push(url.to_string());

        if self.site.failing.contains(url) {
            return Err(CrawlError::Renderer(format!("net::ERR_CONNECTION_REFUSED at {}", url)));
        }

        *lock(&self.current) = Some(url.to_string());
        Ok(())
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<()> {
        let body = format!("png {} full_page={}", self.current()?, full_page);
        tokio::fs::write(path, body).await?;
        Ok(())
    }

    async fn pdf(&self, path: &Path, width: u32, height: u32) -> Result<()> {
        let body = format!("pdf {} {}x{}", self.current()?, width, height);
        tokio::fs::write(path, body).await?;
        Ok(())
    }

    async fn snapshot_links(&self) -> Result<PageSnapshot> {
        let current = self.current()?;
        Ok(self
            .site
            .pages
            .get(&current)
            .cloned()
            .unwrap_or_else(|| PageSnapshot::new(current, Vec::new())))
    }

    async fn close(self) -> Result<()> {
        self.log.tabs_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
