use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Screenshot,
    Pdf,
}

impl ArtifactKind {
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Screenshot => "png",
            ArtifactKind::Pdf => "pdf",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, path: PathBuf) -> Self {
        Self { kind, path }
    }
}

/// Outcome of one dispatched URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub url: String,
    pub depth: usize,
    pub worker_id: usize,
    pub artifacts: Vec<Artifact>,
    pub links_found: Vec<String>,
    pub elapsed: Duration,
    pub error: Option<String>,
}

impl PageResult {
    pub fn new(url: String, depth: usize, worker_id: usize) -> Self {
        Self {
            url,
            depth,
            worker_id,
            artifacts: Vec::new(),
            links_found: Vec::new(),
            elapsed: Duration::from_secs(0),
            error: None,
        }
    }

    pub fn with_error(url: String, depth: usize, worker_id: usize, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(url, depth, worker_id)
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything one seed crawl produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlOutcome {
    pub pages: Vec<PageResult>,
    /// Deepest tier the depth tracker reached
    pub max_tier: usize,
    /// Workers that stopped on a failure instead of draining the frontier
    pub aborted_workers: usize,
}

impl CrawlOutcome {
    pub fn artifact_count(&self) -> usize {
        self.pages.iter().map(|p| p.artifacts.len()).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &PageResult> {
        self.pages.iter().filter(|p| !p.is_success())
    }
}
