// Rendering of crawl results: tree, JSON and CSV

use creeper_scanner::{ContentKind, CrawlResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Tree,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tree" | "text" => Some(OutputFormat::Tree),
            "json" => Some(OutputFormat::Json),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub total: usize,
    pub by_kind: BTreeMap<ContentKind, usize>,
    /// Keyed by the status class, e.g. 200 for every 2xx.
    pub by_status_class: BTreeMap<u16, usize>,
}

pub fn summarize(results: &[CrawlResult]) -> CrawlSummary {
    let mut summary = CrawlSummary {
        total: results.len(),
        ..CrawlSummary::default()
    };
    for result in results {
        *summary.by_kind.entry(result.kind).or_default() += 1;
        *summary
            .by_status_class
            .entry(result.status / 100 * 100)
            .or_default() += 1;
    }
    summary
}

pub fn render(format: OutputFormat, results: &[CrawlResult]) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Tree => Ok(render_tree(results)),
        OutputFormat::Json => render_json(results),
        OutputFormat::Csv => Ok(render_csv(results)),
    }
}

/// Group results by depth, indenting two spaces per level.
/// Arrival order is kept within a level.
pub fn render_tree(results: &[CrawlResult]) -> String {
    let mut by_depth: BTreeMap<usize, Vec<&CrawlResult>> = BTreeMap::new();
    for result in results {
        by_depth.entry(result.depth).or_default().push(result);
    }

    let mut report = String::new();
    for (depth, level) in by_depth {
        let prefix = "  ".repeat(depth);
        for result in level {
            report.push_str(&format!(
                "{}[{}] {} {}\n",
                prefix, result.status, result.kind, result.url
            ));
        }
    }
    report
}

pub fn render_json(results: &[CrawlResult]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(results)
}

pub fn render_csv(results: &[CrawlResult]) -> String {
    let mut report = String::from("URL,Depth,Status,Timestamp,Type\n");
    for result in results {
        report.push_str(&format!(
            "{},{},{},{},{}\n",
            escape_csv(&result.url),
            result.depth,
            result.status,
            result.timestamp.to_rfc3339(),
            result.kind
        ));
    }
    report
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn save_report(content: &str, path: &Path) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Write to `path` (with `~` expanded) or to stdout when no path is given.
pub fn write_report(content: &str, path: Option<&Path>) -> io::Result<()> {
    match path {
        Some(path) => {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
            save_report(content, Path::new(&expanded))
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()
        }
    }
}
