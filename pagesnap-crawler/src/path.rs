//! URL to artifact path mapping.
//!
//! Every non-empty segment of a URL after its scheme (host, path segments,
//! trailing query) becomes one directory level, slugified to lowercase ASCII.
//! A segment with nothing left after slugifying keeps its level as `_`, and
//! slugs too long for a file name are cut and suffixed with a hash of the
//! whole slug.
//! URLs that yield fewer than two segments, such as a bare host, get a random
//! trailing token so that captures of different hosts do not overwrite each
//! other. Those paths are flagged as `ambiguous` since they cannot be
//! reproduced.

use crate::error::{CrawlError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;
use uuid::Uuid;

const RANDOM_TOKEN_LEN: usize = 12;

/// Longest slug kept as one path component, leaving room for an extension
/// under the usual 255 byte file name limit.
pub const MAX_SEGMENT_LEN: usize = 200;
const SEGMENT_HASH_LEN: usize = 16;
const EMPTY_SEGMENT: &str = "_";

/// Result of mapping a URL onto the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedPath {
    /// Slugified segments joined with the platform separator, no extension
    pub relative: PathBuf,
    /// True when a random token was appended (bare-host URLs)
    pub ambiguous: bool,
}

impl MappedPath {
    /// Path of an artifact with the given extension, e.g. `example-com/a/b.png`.
    pub fn with_extension(&self, extension: &str) -> PathBuf {
        append_extension(&self.relative, extension)
    }
}

/// Append `.{extension}` without touching anything that looks like an
/// existing extension in the last segment.
pub fn append_extension(base: &Path, extension: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Slugify one URL segment: lowercase ASCII alphanumerics, every run of other
/// characters collapsed into a single `-`, no leading or trailing `-`.
pub fn sanitize_segment(segment: &str) -> String {
    let mut slug = String::with_capacity(segment.len());
    let mut pending_separator = false;

    for ch in segment.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Directory level for one raw URL segment: the slug, `_` when the slug is
/// empty, or a truncated slug plus a stable hash when it is too long.
pub fn segment_token(segment: &str) -> String {
    let slug = sanitize_segment(segment);
    if slug.is_empty() {
        return EMPTY_SEGMENT.to_string();
    }
    if slug.len() <= MAX_SEGMENT_LEN {
        return slug;
    }

    let hash = blake3::hash(slug.as_bytes()).to_hex();
    // Slugs are ASCII, so any byte index is a char boundary
    let keep = MAX_SEGMENT_LEN - SEGMENT_HASH_LEN - 1;
    format!(
        "{}-{}",
        slug[..keep].trim_end_matches('-'),
        &hash.as_str()[..SEGMENT_HASH_LEN]
    )
}

/// Sanitized segments of a URL, scheme excluded.
pub fn url_segments(url: &str) -> Result<Vec<String>> {
    let parsed = Url::parse(url).map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", url, e)))?;

    Ok(parsed
        .as_str()
        .split('/')
        .skip(1)
        .filter(|segment| !segment.is_empty())
        .map(segment_token)
        .collect())
}

/// Map a URL to its relative artifact base path without touching the disk.
pub fn relative_path(url: &str) -> Result<MappedPath> {
    let mut segments = url_segments(url)?;
    let ambiguous = segments.len() < 2;

    if ambiguous {
        let token = Uuid::new_v4().simple().to_string();
        segments.push(token[..RANDOM_TOKEN_LEN].to_string());
    }

    Ok(MappedPath {
        relative: segments.iter().collect(),
        ambiguous,
    })
}

/// Maps URLs onto an output directory and prepares the directories for them.
#[derive(Debug, Clone)]
pub struct PathMapper {
    root: PathBuf,
}

impl PathMapper {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map `url` and make sure every parent directory of the artifact base
    /// exists. Returns the base path (output root included, no extension).
    pub async fn path_for(&self, url: &str) -> Result<PathBuf> {
        let mapped = relative_path(url)?;
        let base = self.root.join(&mapped.relative);

        if let Some(parent) = base.parent() {
            // create_dir_all tolerates directories created concurrently by siblings
            tokio::fs::create_dir_all(parent).await?;
        }

        if mapped.ambiguous {
            debug!("{} mapped to randomized path {}", url, base.display());
        }

        Ok(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_lowercases_and_collapses() {
        assert_eq!(sanitize_segment("Example.COM"), "example-com");
        assert_eq!(sanitize_segment("a--b__c"), "a-b-c");
        assert_eq!(sanitize_segment("..leading.and.trailing.."), "leading-and-trailing");
        assert_eq!(sanitize_segment("%%%"), "");
    }

    #[test]
    fn test_relative_path_for_nested_url() {
        let mapped = relative_path("https://example.com/a/b").unwrap();
        assert!(!mapped.ambiguous);
        assert_eq!(mapped.relative, PathBuf::from("example-com").join("a").join("b"));
        assert_eq!(
            mapped.with_extension("png"),
            PathBuf::from("example-com").join("a").join("b.png")
        );
    }

    #[test]
    fn test_relative_path_is_deterministic_with_two_segments() {
        let first = relative_path("https://example.com/docs").unwrap();
        let second = relative_path("https://example.com/docs").unwrap();
        assert!(!first.ambiguous);
        assert_eq!(first, second);
    }

    #[test]
    fn test_relative_path_keeps_query_in_last_segment() {
        let mapped = relative_path("https://example.com/search?q=Rust").unwrap();
        assert_eq!(
            mapped.relative,
            PathBuf::from("example-com").join("search-q-rust")
        );
    }

    #[test]
    fn test_distinct_urls_map_to_distinct_paths() {
        let urls = [
            "https://example.com/a/b",
            "https://example.com/a/c",
            "https://example.com/b/a",
            "https://example.org/a/b",
            "https://example.com/a/b/c",
            "http://sub.example.com/a",
        ];
        let paths: Vec<PathBuf> = urls
            .iter()
            .map(|u| relative_path(u).unwrap().relative)
            .collect();

        for (i, left) in paths.iter().enumerate() {
            for right in &paths[i + 1..] {
                assert_ne!(left, right);
            }
        }
    }

    #[test]
    fn test_empty_slug_keeps_its_level() {
        let dashed = relative_path("https://example.com/-/page").unwrap();
        let plain = relative_path("https://example.com/page").unwrap();

        assert_eq!(
            dashed.relative,
            PathBuf::from("example-com").join("_").join("page")
        );
        assert_ne!(dashed.relative, plain.relative);
    }

    #[test]
    fn test_long_query_fits_in_a_file_name() {
        let url = format!("https://example.com/search?q={}", "a".repeat(300));
        let mapped = relative_path(&url).unwrap();

        let last = mapped.relative.file_name().unwrap().to_string_lossy().to_string();
        assert!(last.len() <= MAX_SEGMENT_LEN);
        assert!(last.starts_with("search-q-aaaa"));
        assert!(mapped.with_extension("png").file_name().unwrap().len() < 255);
        // Same URL, same path
        assert_eq!(relative_path(&url).unwrap(), mapped);
    }

    #[test]
    fn test_long_segments_differing_at_the_end_stay_distinct() {
        let stem = "x".repeat(400);
        let first = segment_token(&format!("{}1", stem));
        let second = segment_token(&format!("{}2", stem));

        assert_ne!(first, second);
        assert!(first.len() <= MAX_SEGMENT_LEN);
        assert!(second.len() <= MAX_SEGMENT_LEN);
    }

    #[test]
    fn test_short_segment_token_is_the_slug() {
        assert_eq!(segment_token("Docs"), "docs");
        assert_eq!(segment_token("%%%"), "_");
    }

    #[tokio::test]
    async fn test_path_for_long_url_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mapper = PathMapper::new(dir.path());
        let url = format!("https://example.com/{}/search?q={}", "p".repeat(260), "a".repeat(300));

        let base = mapper.path_for(&url).await.unwrap();

        assert!(base.parent().unwrap().is_dir());
        std::fs::write(append_extension(&base, "png"), b"png").unwrap();
    }

    #[test]
    fn test_bare_host_gets_random_second_segment() {
        let mapped = relative_path("https://x.test/").unwrap();
        assert!(mapped.ambiguous);

        let components: Vec<_> = mapped.relative.components().collect();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].as_os_str(), "x-test");
        // Second component is random; only its shape is checked
        let token = components[1].as_os_str().to_string_lossy();
        assert_eq!(token.len(), RANDOM_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(matches!(
            relative_path("not a url"),
            Err(CrawlError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_append_extension_keeps_dots() {
        let base = PathBuf::from("host").join("v1.2");
        assert_eq!(append_extension(&base, "pdf"), PathBuf::from("host").join("v1.2.pdf"));
    }

    #[tokio::test]
    async fn test_path_for_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mapper = PathMapper::new(dir.path());

        let base = mapper.path_for("https://example.com/a/b").await.unwrap();

        assert_eq!(base, dir.path().join("example-com").join("a").join("b"));
        assert!(dir.path().join("example-com").join("a").is_dir());
        assert!(!base.exists());
    }

    #[tokio::test]
    async fn test_path_for_concurrent_overlapping_prefixes() {
        let dir = tempfile::tempdir().unwrap();
        let mapper = PathMapper::new(dir.path());

        let urls: Vec<String> = (0..16)
            .map(|i| format!("https://example.com/shared/deep/page{}/leaf", i))
            .collect();
        let results = futures::future::join_all(urls.iter().map(|u| mapper.path_for(u))).await;

        for result in results {
            assert!(result.unwrap().parent().unwrap().is_dir());
        }
    }
}
