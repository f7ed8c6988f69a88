pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{crawl_options_from_args, output_format_from_args};

// Re-export crawl functionality from creeper-core
pub use creeper_core::crawl::{
    CrawlOptions, CrawlResultCallback, execute_crawl, extract_url_path, parse_headers,
};
