use crate::report::SeedReport;
use chrono::Utc;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use pagesnap_crawler::renderer::{Renderer, Session};
use pagesnap_crawler::result::PageResult;
use pagesnap_crawler::{CrawlConfig, Crawler, LinkFilter, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};
use url::Url;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub seeds: Vec<String>,
    pub config: CrawlConfig,
    pub show_progress: bool,
}

/// Callback receiving every URL as it is dispatched
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Callback for reporting individual page results as they come in
pub type CrawlResultCallback = Arc<dyn Fn(PageResult) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Crawl every seed concurrently, each with its own browser session and
/// frontier. Configuration problems fail the whole run up front; anything that
/// goes wrong with a single seed is recorded in that seed's report.
pub async fn execute_crawl<R: Renderer>(
    renderer: &R,
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
    result_callback: Option<CrawlResultCallback>,
) -> Result<Vec<SeedReport>> {
    let CrawlOptions {
        seeds,
        config,
        show_progress,
    } = options;

    config.validate()?;
    LinkFilter::new(config.filter.clone())?;

    let progress_bar = if show_progress {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));

    let pb_clone = progress_bar.clone();
    let count_clone = processed_count.clone();
    let dispatch_callback: pagesnap_crawler::ProgressCallback =
        Arc::new(move |_worker_id: usize, url: String| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            match (&pb_clone, &progress_callback) {
                (Some(pb), Some(callback)) => {
                    pb.suspend(|| callback(url));
                    pb.set_message(format!("Capturing... {} pages processed", count));
                }
                (Some(pb), None) => {
                    pb.set_message(format!("Capturing... {} pages processed", count));
                    pb.tick();
                }
                (None, Some(callback)) => callback(url),
                (None, None) => {}
            }
        });

    let config = Arc::new(config);
    let crawls = seeds.iter().map(|seed| {
        crawl_seed(
            renderer,
            seed,
            config.clone(),
            dispatch_callback.clone(),
            result_callback.clone(),
        )
    });
    let reports = join_all(crawls).await;

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} pages processed", total));
    }

    Ok(reports)
}

async fn crawl_seed<R: Renderer>(
    renderer: &R,
    seed: &str,
    config: Arc<CrawlConfig>,
    progress_callback: pagesnap_crawler::ProgressCallback,
    result_callback: Option<CrawlResultCallback>,
) -> SeedReport {
    let mut report = SeedReport::new(seed);

    if let Err(e) = Url::parse(seed) {
        warn!("Skipping invalid seed {}: {}", seed, e);
        return report.failed(format!("Invalid URL: {}: {}", seed, e));
    }

    let session = match renderer.launch().await {
        Ok(session) => Arc::new(session),
        Err(e) => {
            warn!("Could not start a browser for {}: {}", seed, e);
            return report.failed(e.to_string());
        }
    };

    let outcome = match Crawler::new(session.clone(), (*config).clone()) {
        Ok(crawler) => {
            let mut crawler = crawler.with_progress_callback(progress_callback);
            if let Some(callback) = result_callback {
                crawler = crawler.with_result_callback(callback);
            }
            crawler.crawl(seed).await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = session.close().await {
        warn!("Browser for {} did not shut down cleanly: {}", seed, e);
    }

    match outcome {
        Ok(outcome) => {
            info!(
                "Seed {} finished: {} pages, {} artifacts",
                seed,
                outcome.pages.len(),
                outcome.artifact_count()
            );
            report.visited = outcome.pages.len();
            report.max_tier = outcome.max_tier;
            report.aborted_workers = outcome.aborted_workers;
            report.pages = outcome.pages;
            report.finished_at = Some(Utc::now());
            report
        }
        Err(e) => report.failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_url_path_keeps_nested_path() {
        assert_eq!(extract_url_path("https://a.test/x/y?q=1"), "/x/y");
    }

    #[test]
    fn test_extract_url_path_falls_back_to_input() {
        assert_eq!(extract_url_path("not a url"), "not a url");
    }
}
