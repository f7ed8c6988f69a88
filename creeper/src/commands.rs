use clap::{arg, command};
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("creeper")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("creeper")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl a single host, mining HTML, CSS and JavaScript for further links \
                within the same hostname.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The target URL to crawl")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Maximum crawl depth")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    arg!(-c --"concurrency" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async workers in the worker pool.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(-t --"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("30"),
                )
                .arg(
                    arg!(-r --"rate" <RPS>)
                        .required(false)
                        .help("Requests per second (values below 1 are raised to 1)")
                        .value_parser(clap::value_parser!(f64))
                        .default_value("10"),
                )
                .arg(
                    arg!(-o --"output-format" <FORMAT>)
                        .required(false)
                        .help("Output format: tree, json, csv")
                        .value_parser(["tree", "json", "csv"])
                        .default_value("tree"),
                )
                .arg(
                    arg!(-H --"headers" <HEADERS>)
                        .required(false)
                        .help("Custom headers as comma-separated key=value pairs"),
                )
                .arg(
                    arg!(--"deadline" <SECONDS>)
                        .required(false)
                        .help(
                            "Time budget for the whole crawl in seconds (default: the request \
                        timeout, 0 disables)",
                        )
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(-f --"file" <PATH>)
                        .required(false)
                        .help("Save output to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
}
