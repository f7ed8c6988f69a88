use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of a fetched resource, derived from its
/// `Content-Type` header. Drives which extractor runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Html,
    Css,
    Javascript,
    Image,
    Other,
}

impl ContentKind {
    /// Classify a `Content-Type` header value.
    ///
    /// The table is checked in order: `text/html`, `text/css`, anything
    /// mentioning `javascript`, then an `image/` prefix. Everything else,
    /// including an empty header, is `Other`.
    pub fn from_content_type(content_type: &str) -> Self {
        let content_type = content_type.trim().to_ascii_lowercase();

        if content_type.contains("text/html") {
            ContentKind::Html
        } else if content_type.contains("text/css") {
            ContentKind::Css
        } else if content_type.contains("javascript") {
            ContentKind::Javascript
        } else if content_type.starts_with("image/") {
            ContentKind::Image
        } else {
            ContentKind::Other
        }
    }

    /// Whether a 200 response of this kind is mined for further links.
    pub fn is_parseable(self) -> bool {
        match self {
            ContentKind::Html | ContentKind::Css | ContentKind::Javascript => true,
            ContentKind::Image | ContentKind::Other => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Html => "html",
            ContentKind::Css => "css",
            ContentKind::Javascript => "javascript",
            ContentKind::Image => "image",
            ContentKind::Other => "other",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record per unique URL that was actually fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub url: String,
    pub depth: usize,
    pub status: u16,
    pub timestamp: DateTime<Utc>,
    pub kind: ContentKind,
}

impl CrawlResult {
    /// Build a result stamped with the current time.
    pub fn new(url: String, depth: usize, status: u16, kind: ContentKind) -> Self {
        Self {
            url,
            depth,
            status,
            timestamp: Utc::now(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_html() {
        assert_eq!(
            ContentKind::from_content_type("text/html; charset=utf-8"),
            ContentKind::Html
        );
    }

    #[test]
    fn test_classify_css() {
        assert_eq!(ContentKind::from_content_type("text/css"), ContentKind::Css);
    }

    #[test]
    fn test_classify_javascript_variants() {
        assert_eq!(
            ContentKind::from_content_type("application/javascript"),
            ContentKind::Javascript
        );
        assert_eq!(
            ContentKind::from_content_type("text/javascript"),
            ContentKind::Javascript
        );
        assert_eq!(
            ContentKind::from_content_type("application/x-javascript"),
            ContentKind::Javascript
        );
    }

    #[test]
    fn test_classify_image_requires_prefix() {
        assert_eq!(ContentKind::from_content_type("image/png"), ContentKind::Image);
        assert_eq!(
            ContentKind::from_content_type("application/image/png"),
            ContentKind::Other
        );
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(ContentKind::from_content_type("Text/HTML"), ContentKind::Html);
    }

    #[test]
    fn test_classify_fallback() {
        assert_eq!(ContentKind::from_content_type(""), ContentKind::Other);
        assert_eq!(
            ContentKind::from_content_type("application/json"),
            ContentKind::Other
        );
    }

    #[test]
    fn test_parseable_kinds() {
        assert!(ContentKind::Html.is_parseable());
        assert!(ContentKind::Css.is_parseable());
        assert!(ContentKind::Javascript.is_parseable());
        assert!(!ContentKind::Image.is_parseable());
        assert!(!ContentKind::Other.is_parseable());
    }

    #[test]
    fn test_result_serializes_kind_lowercase() {
        let result = CrawlResult::new("https://x.test/".into(), 0, 200, ContentKind::Javascript);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["kind"], "javascript");
        assert_eq!(json["status"], 200);
        assert_eq!(json["depth"], 0);
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }
}
