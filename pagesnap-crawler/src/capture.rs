use crate::config::CrawlConfig;
use crate::error::Result;
use crate::path::append_extension;
use crate::renderer::Tab;
use crate::result::{Artifact, ArtifactKind};
use std::path::Path;
use tracing::debug;

/// Write every artifact the configuration asks for next to `base`, which is
/// the mapped path without extension. Screenshot and PDF share the base name.
pub async fn capture_page<T: Tab>(
    tab: &T,
    base: &Path,
    config: &CrawlConfig,
) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();

    if config.capture.screenshot {
        let path = append_extension(base, ArtifactKind::Screenshot.extension());
        tab.screenshot(&path, config.capture.full_page).await?;
        debug!("Saved screenshot {}", path.display());
        artifacts.push(Artifact::new(ArtifactKind::Screenshot, path));
    }

    if config.capture.pdf {
        let path = append_extension(base, ArtifactKind::Pdf.extension());
        tab.pdf(&path, config.viewport.width, config.viewport.height)
            .await?;
        debug!("Saved PDF {}", path.display());
        artifacts.push(Artifact::new(ArtifactKind::Pdf, path));
    }

    Ok(artifacts)
}
