pub mod crawl;
pub mod report;

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
   ___ _ __ ___  ___ _ __   ___ _ __
  / __| '__/ _ \/ _ \ '_ \ / _ \ '__|
 | (__| | |  __/  __/ |_) |  __/ |
  \___|_|  \___|\___| .__/ \___|_|
                    |_|"#;
    eprintln!("{}", banner.bright_green().bold());
    eprintln!(
        "  {} {}\n",
        "content-aware web crawler".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}
