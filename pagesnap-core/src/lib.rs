pub mod crawl;
pub mod report;

pub use crawl::{CrawlOptions, execute_crawl};
pub use report::{ReportFormat, SeedReport, generate_crawl_report};
