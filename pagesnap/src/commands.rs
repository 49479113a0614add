use crate::CLAP_STYLING;
use clap::{ArgAction, arg};
use url::Url;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("pagesnap")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("pagesnap")
        .about("Crawl pages with headless Chromium and capture screenshots and PDFs")
        .styles(CLAP_STYLING)
        // -h is the viewport height, help stays available as --help
        .disable_help_flag(true)
        .arg(
            arg!(--"help")
                .help("Print help")
                .action(ArgAction::Help),
        )
        .arg(
            arg!([URL] ...)
                .help("One or more seed URLs to capture")
                .value_parser(clap::value_parser!(Url))
                .required_unless_present("hosts-file")
                .conflicts_with("hosts-file"),
        )
        .arg(
            arg!(-H --"hosts-file" <PATH>)
                .required(false)
                .help("Path to a newline-delimited file of seed URLs")
                .conflicts_with("URL"),
        )
        .arg(arg!(-q --"quiet" "Suppress per-page output and the text report").required(false))
        .arg(
            arg!(-t --"tabs" <NUM_TABS>)
                .required(false)
                .help("Number of tabs crawling each seed concurrently")
                .value_parser(clap::value_parser!(usize))
                .default_value("2"),
        )
        .arg(arg!(-s --"screenshot" "Capture a PNG screenshot of every page").required(false))
        .arg(arg!(-p --"pdf" "Capture a PDF of every page").required(false))
        .arg(arg!(-f --"full-page" "Screenshot the whole scrollable page").required(false))
        .arg(arg!(-r --"recursive" "Follow links found on captured pages").required(false))
        .arg(
            arg!(-l --"level" <DEPTH>)
                .required(false)
                .help("Number of link tiers to capture when recursive, the seed included")
                .value_parser(clap::value_parser!(usize))
                .default_value("2"),
        )
        .arg(
            arg!(-w --"width" <PX>)
                .required(false)
                .help("Viewport width")
                .value_parser(clap::value_parser!(u32))
                .default_value("1920"),
        )
        .arg(
            arg!(-h --"height" <PX>)
                .required(false)
                .help("Viewport height")
                .value_parser(clap::value_parser!(u32))
                .default_value("1080"),
        )
        .arg(
            arg!(--"device-scale-factor" <FACTOR>)
                .required(false)
                .help("Device pixel ratio of the viewport")
                .value_parser(clap::value_parser!(f64))
                .default_value("1"),
        )
        .arg(arg!(--"is-mobile" "Emulate a mobile device").required(false))
        .arg(arg!(--"has-touch" "Emulate touch support").required(false))
        .arg(arg!(--"is-landscape" "Emulate landscape orientation").required(false))
        .arg(arg!(-L --"relative" "Only follow links written as relative references").required(false))
        .arg(arg!(--"https-only" "Only follow https links").required(false))
        .arg(arg!(--"same-origin" "Only follow links on the page's origin").required(false))
        .arg(
            arg!(--"pattern" <REGEX>)
                .required(false)
                .help(
                    "Only follow links matching this regular expression \
                     (Rust regex syntax: no lookaround or backreferences)",
                ),
        )
        .arg(arg!(--"disable-js" "Disable JavaScript in every tab").required(false))
        .arg(
            arg!(--"user-agent" <UA>)
                .required(false)
                .help("User agent string sent by every tab"),
        )
        .arg(
            arg!(-o --"output-dir" <DIR>)
                .required(false)
                .help("Directory the capture tree is written under")
                .default_value("."),
        )
        .arg(
            arg!(--"keep-going" "Keep crawling after a page fails instead of stopping that tab")
                .required(false),
        )
        .arg(
            arg!(--"chrome" <PATH>)
                .required(false)
                .help("Chrome or Chromium executable to launch"),
        )
        .arg(
            arg!(--"report" <FORMAT>)
                .required(false)
                .help("Report format: text, json")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
}
