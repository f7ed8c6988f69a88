use clap::ArgMatches;
use colored::Colorize;
use creeper_core::crawl::{CrawlOptions, execute_crawl, parse_headers};
use creeper_core::report::{CrawlSummary, OutputFormat, render, summarize, write_report};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Build crawl options from the `crawl` subcommand's arguments
pub fn crawl_options_from_args(args: &ArgMatches, quiet: bool) -> Result<CrawlOptions, String> {
    let url = args
        .get_one::<Url>("url")
        .ok_or_else(|| "--url must be provided".to_string())?;

    let headers = args
        .get_one::<String>("headers")
        .map(|raw| parse_headers(raw))
        .unwrap_or_else(HashMap::new);

    Ok(CrawlOptions {
        url: url.as_str().to_string(),
        max_depth: *args.get_one::<usize>("depth").unwrap_or(&3),
        workers: *args.get_one::<usize>("concurrency").unwrap_or(&10),
        timeout: Duration::from_secs(*args.get_one::<u64>("timeout").unwrap_or(&30)),
        requests_per_second: *args.get_one::<f64>("rate").unwrap_or(&10.0),
        headers,
        deadline: args.get_one::<u64>("deadline").map(|s| Duration::from_secs(*s)),
        show_progress_bars: !quiet,
    })
}

pub fn output_format_from_args(args: &ArgMatches) -> OutputFormat {
    args.get_one::<String>("output-format")
        .and_then(|f| OutputFormat::from_str(f))
        .unwrap_or(OutputFormat::Tree)
}

/// Logs go to stderr so rendered output on stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) {
    init_tracing();

    let options = match crawl_options_from_args(sub_matches, quiet) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };
    let format = output_format_from_args(sub_matches);
    let output_file = sub_matches.get_one::<PathBuf>("file");

    if !quiet {
        eprintln!("{} {}", "Crawling".bright_white().bold(), options.url);
        eprintln!(
            "Workers: {}  Max depth: {}  Rate: {}/s\n",
            options.workers, options.max_depth, options.requests_per_second
        );
    }

    let results = match execute_crawl(options, None).await {
        Ok(results) => results,
        Err(e) => {
            eprintln!("{} {:#}", "✗ Crawl failed:".red().bold(), e);
            std::process::exit(1);
        }
    };

    let rendered = match render(format, &results) {
        Ok(rendered) => rendered,
        Err(e) => {
            eprintln!("{} {}", "✗ Failed to render results:".red().bold(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = write_report(&rendered, output_file.map(PathBuf::as_path)) {
        eprintln!("{} {}", "✗ Failed to write output:".red().bold(), e);
        std::process::exit(1);
    }

    if !quiet {
        print_summary(&summarize(&results));
        if let Some(path) = output_file {
            eprintln!("{} Output saved to {}", "✓".green().bold(), path.display());
        }
    }
}

fn print_summary(summary: &CrawlSummary) {
    eprintln!("\n{} {} URLs", "✓ Crawl complete:".green().bold(), summary.total);

    let kinds: Vec<String> = summary
        .by_kind
        .iter()
        .map(|(kind, count)| format!("{} {}", count, kind))
        .collect();
    if !kinds.is_empty() {
        eprintln!("  {}", kinds.join(", ").bright_black());
    }

    for (class, count) in &summary.by_status_class {
        let label = format!("{}xx", class / 100);
        let label = match *class {
            200 => label.green(),
            300 => label.cyan(),
            400 => label.yellow(),
            500 => label.red(),
            _ => label.white(),
        };
        eprintln!("  {} {}", label, count);
    }
}
