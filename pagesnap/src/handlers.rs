use anyhow::{Context, anyhow, bail};
use clap::ArgMatches;
use colored::Colorize;
use pagesnap_core::crawl::{CrawlOptions, CrawlProgressCallback, execute_crawl};
use pagesnap_core::report::{ReportFormat, render_report};
use pagesnap_crawler::{
    CaptureOptions, ChromeRenderer, CrawlConfig, FailurePolicy, FilterOptions, ViewportOptions,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_LOG_FILTER: &str = "warn,pagesnap=info,pagesnap_core=info,pagesnap_crawler=info";
const QUIET_LOG_FILTER: &str = "warn";

/// Install the global tracing subscriber. `RUST_LOG` wins over both defaults.
pub fn init_logging(quiet: bool) {
    let default = if quiet {
        QUIET_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// Helper functions for crawl handler

/// Load URLs from either a file or the positional URL arguments
pub fn load_urls_from_source(
    urls: &[Url],
    hosts_file: Option<&Path>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if !urls.is_empty() {
        Ok(urls.iter().map(|u| u.as_str().to_string()).collect())
    } else {
        Err("Either a URL or --hosts-file must be provided".to_string())
    }
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| parse_url_line(line.trim()))
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    // Lines like "example.com:8080" parse as a URL with scheme "example.com"
    if let Ok(url) = Url::parse(line)
        && url.has_host()
    {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("{}  Skipping invalid URL '{}'", "⚠".yellow(), line);
    None
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Map parsed command line arguments onto crawl options.
pub fn build_options(matches: &ArgMatches) -> anyhow::Result<CrawlOptions> {
    let urls: Vec<Url> = matches
        .get_many::<Url>("URL")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let hosts_file = matches.get_one::<String>("hosts-file").map(|p| expand_path(p));
    let seeds = load_urls_from_source(&urls, hosts_file.as_deref()).map_err(|e| anyhow!(e))?;

    let mut config = CrawlConfig::new()
        .with_tabs(*matches.get_one::<usize>("tabs").unwrap_or(&2))
        .with_capture(CaptureOptions {
            screenshot: matches.get_flag("screenshot"),
            full_page: matches.get_flag("full-page"),
            pdf: matches.get_flag("pdf"),
        })
        .with_viewport(ViewportOptions {
            width: *matches.get_one::<u32>("width").unwrap_or(&1920),
            height: *matches.get_one::<u32>("height").unwrap_or(&1080),
            device_scale_factor: *matches.get_one::<f64>("device-scale-factor").unwrap_or(&1.0),
            is_mobile: matches.get_flag("is-mobile"),
            has_touch: matches.get_flag("has-touch"),
            is_landscape: matches.get_flag("is-landscape"),
        })
        .with_filter(FilterOptions {
            same_origin: matches.get_flag("same-origin"),
            https_only: matches.get_flag("https-only"),
            relative_only: matches.get_flag("relative"),
            pattern: matches.get_one::<String>("pattern").cloned(),
        })
        .with_javascript(!matches.get_flag("disable-js"));

    if matches.get_flag("recursive") {
        config = config.with_recursion(*matches.get_one::<usize>("level").unwrap_or(&2));
    }
    if matches.get_flag("keep-going") {
        config = config.with_failure_policy(FailurePolicy::Continue);
    }
    if let Some(user_agent) = matches.get_one::<String>("user-agent") {
        config = config.with_user_agent(user_agent.clone());
    }
    if let Some(output_dir) = matches.get_one::<String>("output-dir") {
        config = config.with_output_dir(expand_path(output_dir));
    }
    if let Some(chrome) = matches.get_one::<String>("chrome") {
        config = config.with_chrome_executable(expand_path(chrome));
    }

    config.validate()?;

    Ok(CrawlOptions {
        seeds,
        config,
        show_progress: !matches.get_flag("quiet"),
    })
}

fn report_format(matches: &ArgMatches) -> ReportFormat {
    matches
        .get_one::<String>("report")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text)
}

fn print_plan(options: &CrawlOptions) {
    let config = &options.config;
    println!(
        "\n{} Capturing {} seed(s)",
        "→".blue().bold(),
        options.seeds.len().to_string().bright_white()
    );
    println!("Tabs per seed: {}", config.tabs);
    if config.recursive {
        println!("Depth: {}", config.max_depth);
    } else {
        println!("Depth: seed only");
    }
    println!("Output: {}\n", config.output_dir.display());
}

pub async fn handle_crawl(matches: &ArgMatches) -> anyhow::Result<()> {
    let quiet = matches.get_flag("quiet");
    let format = report_format(matches);
    let options = build_options(matches)?;
    debug!("Crawl configuration: {:?}", options.config);

    if options.config.capture.is_empty() && !quiet {
        eprintln!(
            "{}  Neither --screenshot nor --pdf given, pages are visited but nothing is saved",
            "⚠".yellow()
        );
    }
    if !quiet && format == ReportFormat::Text {
        print_plan(&options);
    }

    // Per-page lines go to stderr so a JSON report on stdout stays clean
    let progress_callback: Option<CrawlProgressCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|url: String| eprintln!("{}", url)))
    };

    let renderer = ChromeRenderer::new(options.config.clone());
    let reports = execute_crawl(&renderer, options, progress_callback, None)
        .await
        .context("Crawl could not start")?;

    if !(quiet && format == ReportFormat::Text) {
        let output = render_report(&reports, format)?;
        println!("{}", output);
    }

    let failed: Vec<&str> = reports
        .iter()
        .filter(|r| r.error.is_some())
        .map(|r| r.seed.as_str())
        .collect();
    if !failed.is_empty() {
        bail!("{} of {} seed(s) failed: {}", failed.len(), reports.len(), failed.join(", "));
    }

    Ok(())
}
