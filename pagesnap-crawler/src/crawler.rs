use crate::capture::capture_page;
use crate::config::{CrawlConfig, FailurePolicy};
use crate::error::{CrawlError, Result};
use crate::frontier::{Dispatch, Frontier};
use crate::links::LinkFilter;
use crate::path::PathMapper;
use crate::renderer::{Session, Tab};
use crate::result::{CrawlOutcome, PageResult};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
pub type ResultCallback = Arc<dyn Fn(PageResult) + Send + Sync>;

/// Pool of tabs crawling one seed at a time over a shared session.
pub struct Crawler<S: Session> {
    session: Arc<S>,
    config: Arc<CrawlConfig>,
    filter: Arc<LinkFilter>,
    mapper: PathMapper,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
}

/// Everything one worker task needs, cloned per spawn.
struct Worker<S: Session> {
    id: usize,
    session: Arc<S>,
    config: Arc<CrawlConfig>,
    filter: Arc<LinkFilter>,
    mapper: PathMapper,
    frontier: Arc<Frontier>,
    results: Arc<Mutex<Vec<PageResult>>>,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
}

impl<S: Session + 'static> Crawler<S> {
    /// Validates the configuration and compiles the link filter, so bad input
    /// fails here rather than inside a worker.
    pub fn new(session: Arc<S>, config: CrawlConfig) -> Result<Self> {
        config.validate()?;
        let filter = LinkFilter::new(config.filter.clone())?;
        let mapper = PathMapper::new(config.output_dir.clone());

        Ok(Self {
            session,
            config: Arc::new(config),
            filter: Arc::new(filter),
            mapper,
            progress_callback: None,
            result_callback: None,
        })
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawl one seed with `config.tabs` concurrent workers sharing a fresh
    /// frontier. Worker failures are isolated: the crawl itself only fails on
    /// an invalid seed.
    pub async fn crawl(&self, seed: &str) -> Result<CrawlOutcome> {
        let parsed = Url::parse(seed)
            .map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", seed, e)))?;
        let seed = parsed.to_string();

        info!("Starting crawl of {} with {} tabs", seed, self.config.tabs);

        let frontier = Arc::new(Frontier::new(
            seed.clone(),
            self.config.recursive,
            self.config.max_depth,
        ));
        let results = Arc::new(Mutex::new(Vec::new()));

        let mut worker_handles = Vec::with_capacity(self.config.tabs);
        for id in 0..self.config.tabs {
            let worker = Worker {
                id,
                session: self.session.clone(),
                config: self.config.clone(),
                filter: self.filter.clone(),
                mapper: self.mapper.clone(),
                frontier: frontier.clone(),
                results: results.clone(),
                progress_callback: self.progress_callback.clone(),
                result_callback: self.result_callback.clone(),
            };
            worker_handles.push(tokio::spawn(worker.run()));
        }

        let mut aborted_workers = 0;
        for handle in worker_handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Worker for {} stopped: {}", seed, e);
                    aborted_workers += 1;
                }
                Err(e) => {
                    warn!("Worker task for {} failed: {}", seed, e);
                    aborted_workers += 1;
                }
            }
        }

        let pages = std::mem::take(&mut *results.lock().await);
        info!(
            "Crawl of {} complete. Visited {} pages",
            seed,
            frontier.visited_count()
        );

        Ok(CrawlOutcome {
            pages,
            max_tier: frontier.current_depth(),
            aborted_workers,
        })
    }
}

impl<S: Session + 'static> Worker<S> {
    /// Own one tab for the whole loop and close it however the loop ends.
    async fn run(self) -> Result<()> {
        debug!("Worker {} started", self.id);
        let tab = self.session.new_tab().await?;

        let outcome = self.drain(&tab).await;

        if let Err(e) = tab.close().await {
            warn!("Worker {} could not close its tab: {}", self.id, e);
        }
        debug!("Worker {} finished", self.id);
        outcome
    }

    async fn drain(&self, tab: &S::Tab) -> Result<()> {
        if let Some(user_agent) = &self.config.user_agent {
            tab.set_user_agent(user_agent).await?;
        }
        if !self.config.javascript_enabled {
            tab.set_javascript_enabled(false).await?;
        }

        while let Some(dispatch) = self.frontier.next().await {
            if let Some(ref callback) = self.progress_callback {
                callback(self.id, dispatch.url.clone());
            }

            let started = Instant::now();
            match self.visit(tab, &dispatch).await {
                Ok(mut page) => {
                    page.elapsed = started.elapsed();
                    let links = page.links_found.clone();
                    self.record(page).await;
                    dispatch.complete(links);
                }
                Err(e) => {
                    warn!("[Worker {}] Failed to capture {}: {}", self.id, dispatch.url, e);
                    let page = PageResult::with_error(
                        dispatch.url.clone(),
                        dispatch.depth,
                        self.id,
                        e.to_string(),
                    );
                    self.record(page).await;
                    dispatch.complete(Vec::new());

                    if self.config.failure_policy == FailurePolicy::Abort {
                        return Err(e);
                    }
                }
            }
        }

        Ok(())
    }

    /// Load, capture and, while the depth gate is open, discover links.
    async fn visit(&self, tab: &S::Tab, dispatch: &Dispatch<'_>) -> Result<PageResult> {
        let url = dispatch.url.as_str();
        debug!("[Worker {}] Visiting {} (depth {})", self.id, url, dispatch.depth);

        tab.goto(url).await?;
        let base = self.mapper.path_for(url).await?;

        let mut page = PageResult::new(url.to_string(), dispatch.depth, self.id);
        page.artifacts = capture_page(tab, &base, &self.config).await?;

        if self.frontier.accepts_links() {
            let snapshot = tab.snapshot_links().await?;
            page.links_found = self.filter.apply(&snapshot);
            debug!(
                "[Worker {}] Found {} qualifying links on {}",
                self.id,
                page.links_found.len(),
                url
            );
        }

        Ok(page)
    }

    async fn record(&self, page: PageResult) {
        if let Some(ref callback) = self.result_callback {
            callback(page.clone());
        }
        self.results.lock().await.push(page);
    }
}
