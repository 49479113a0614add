// Crawl summaries for the console and for machines

use crate::crawl::extract_url_path;
use chrono::{DateTime, Utc};
use colored::Colorize;
use pagesnap_crawler::result::PageResult;
use serde::{Deserialize, Serialize};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Everything one seed's crawl produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedReport {
    pub seed: String,
    pub pages: Vec<PageResult>,
    pub visited: usize,
    pub max_tier: usize,
    pub aborted_workers: usize,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Set when the seed could not be crawled at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SeedReport {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            pages: Vec::new(),
            visited: 0,
            max_tier: 0,
            aborted_workers: 0,
            started_at: Utc::now(),
            finished_at: None,
            error: None,
        }
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn artifact_count(&self) -> usize {
        self.pages.iter().map(|p| p.artifacts.len()).sum()
    }

    pub fn link_count(&self) -> usize {
        self.pages.iter().map(|p| p.links_found.len()).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.pages.iter().filter(|p| !p.is_success()).count()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.failure_count() == 0
    }

    pub fn duration_secs(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_seconds())
    }
}

/// Generate a crawl report from seed reports
pub fn generate_crawl_report(reports: &[SeedReport]) -> String {
    let mut report = String::new();
    report.push_str(RULE);
    report.push_str("\n\n");
    report.push_str("# Summary:\n");

    let pages: usize = reports.iter().map(|r| r.pages.len()).sum();
    report.push_str(&format!("  Pages captured: {}\n", pages));

    let artifacts: usize = reports.iter().map(SeedReport::artifact_count).sum();
    report.push_str(&format!("  Artifacts written: {}\n", artifacts));

    let links: usize = reports.iter().map(SeedReport::link_count).sum();
    report.push_str(&format!("  Links discovered: {}\n", links));

    let failures: usize = reports.iter().map(SeedReport::failure_count).sum();
    let failed_seeds = reports.iter().filter(|r| r.error.is_some()).count();
    let failure_line = format!("  Failures: {} page(s), {} seed(s)", failures, failed_seeds);
    if failures + failed_seeds > 0 {
        report.push_str(&failure_line.red().to_string());
    } else {
        report.push_str(&failure_line);
    }
    report.push('\n');

    report.push('\n');
    report.push_str(RULE);
    report.push_str("\n\n");

    for seed in reports {
        report.push_str(&format!("## {}\n", seed.seed.bold()));

        if let Some(ref error) = seed.error {
            report.push_str(&format!("  {} {}\n\n", "✗".red(), error));
            continue;
        }

        report.push_str(&format!(
            "  {} pages, depth reached {}",
            seed.pages.len(),
            seed.max_tier
        ));
        if let Some(secs) = seed.duration_secs() {
            report.push_str(&format!(", {}s", secs));
        }
        report.push_str("\n\n");

        let mut pages: Vec<&PageResult> = seed.pages.iter().collect();
        pages.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.url.cmp(&b.url)));

        for page in pages {
            let path = extract_url_path(&page.url);
            let line = match page.error {
                None => format!(
                    "  {} {} {}",
                    "✓".green(),
                    path,
                    format!("[{}]", artifact_list(page)).bright_black()
                ),
                Some(ref error) => format!("  {} {} {}", "✗".red(), path, error.red()),
            };
            report.push_str(&line);
            report.push('\n');
        }
        report.push('\n');
    }

    report
}

fn artifact_list(page: &PageResult) -> String {
    page.artifacts
        .iter()
        .map(|a| a.path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn generate_json_report(reports: &[SeedReport]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(reports)
}

pub fn render_report(reports: &[SeedReport], format: ReportFormat) -> serde_json::Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_crawl_report(reports)),
        ReportFormat::Json => generate_json_report(reports),
    }
}
