use colored::Colorize;
use pagesnap::commands::command_argument_builder;
use pagesnap::handlers::{handle_crawl, init_logging};

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let matches = cmd.get_matches();

    init_logging(matches.get_flag("quiet"));

    if let Err(e) = handle_crawl(&matches).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
