pub mod client;
pub mod crawler;
pub mod error;
pub mod frontier;
pub mod parser;
pub mod result;

pub use client::{Client, ClientConfig};
pub use crawler::{CrawlConfig, CrawlState, Crawler};
pub use error::ScanError;
pub use frontier::{Frontier, FrontierItem, VisitedSet};
pub use parser::Parser;
pub use result::{ContentKind, CrawlResult};
