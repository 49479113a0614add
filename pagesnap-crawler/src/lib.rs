pub mod capture;
#[cfg(feature = "chrome")]
pub mod chrome;
pub mod config;
pub mod crawler;
pub mod error;
pub mod frontier;
pub mod links;
pub mod path;
pub mod renderer;
pub mod result;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(feature = "chrome")]
pub use chrome::ChromeRenderer;
pub use config::{CaptureOptions, CrawlConfig, FailurePolicy, FilterOptions, ViewportOptions};
pub use crawler::{Crawler, ProgressCallback, ResultCallback};
pub use error::{CrawlError, Result};
pub use frontier::Frontier;
pub use links::LinkFilter;
pub use path::PathMapper;
pub use renderer::{Renderer, Session, Tab};
pub use result::{Artifact, ArtifactKind, CrawlOutcome, PageResult};
