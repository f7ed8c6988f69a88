//! Static link extraction for HTML, CSS and JavaScript bodies.
//!
//! Extraction returns raw attribute/literal values; [`Parser::normalize`]
//! turns them into absolute, fragment-free URLs against the parser's base.
//!
//! JavaScript support is a literal-string scan for a handful of request call
//! shapes. URLs built at runtime (concatenation, variables, template strings)
//! are never found.

use crate::error::{Result, ScanError};
use crate::result::ContentKind;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href], link[href], script[src], img[src], form[action]")
        .expect("link selector is valid") // Static selector, safe to panic
});

static CSS_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(['"]?([^'"()]+)['"]?\)"#).expect("CSS url() regex is valid")
});

static JS_URL_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r#"fetch\(['"]([^'"]+)['"]\)"#).expect("fetch regex is valid"),
        Regex::new(r#"\.open\(['"](?:GET|POST)['"],\s*['"]([^'"]+)['"]"#)
            .expect("xhr open regex is valid"),
        Regex::new(r#"\.get\(['"]([^'"]+)['"]"#).expect("get regex is valid"),
        Regex::new(r#"\.post\(['"]([^'"]+)['"]"#).expect("post regex is valid"),
    ]
});

#[derive(Debug, Clone)]
pub struct Parser {
    base_url: Url,
}

impl Parser {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        Ok(Self::with_base(base_url))
    }

    pub fn with_base(base_url: Url) -> Self {
        Self { base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Dispatch to the extractor for `kind`. Images and other bodies carry
    /// no links.
    pub fn extract(&self, kind: ContentKind, body: &str) -> Vec<String> {
        match kind {
            ContentKind::Html => self.extract_html(body),
            ContentKind::Css => self.extract_css(body),
            ContentKind::Javascript => self.extract_js(body),
            ContentKind::Image | ContentKind::Other => Vec::new(),
        }
    }

    /// Collect `href`/`src`/`action` values in document order.
    ///
    /// Only `a[href]`, `link[href]`, `script[src]`, `img[src]` and
    /// `form[action]` are consulted. Broken markup is parsed best-effort.
    pub fn extract_html(&self, body: &str) -> Vec<String> {
        let document = Html::parse_document(body);

        document
            .select(&LINK_SELECTOR)
            .filter_map(|element| {
                let attr = match element.value().name() {
                    "a" | "link" => "href",
                    "script" | "img" => "src",
                    "form" => "action",
                    _ => return None,
                };
                element
                    .value()
                    .attr(attr)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            })
            .collect()
    }

    pub fn extract_css(&self, body: &str) -> Vec<String> {
        CSS_URL_PATTERN
            .captures_iter(body)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    pub fn extract_js(&self, body: &str) -> Vec<String> {
        let mut urls = Vec::new();
        for pattern in JS_URL_PATTERNS.iter() {
            urls.extend(
                pattern
                    .captures_iter(body)
                    .filter_map(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string()),
            );
        }
        urls
    }

    /// Resolve `raw` to an absolute URL without a fragment.
    ///
    /// Returns an empty string for empty or unparsable input; callers skip
    /// empties. Protocol-relative input takes the base URL's scheme.
    pub fn normalize(&self, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }

        let candidate = if raw.starts_with("//") {
            format!("{}:{}", self.base_url.scheme(), raw)
        } else {
            raw.to_string()
        };

        let mut url = match Url::parse(&candidate) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => match self.base_url.join(&candidate) {
                Ok(url) => url,
                Err(_) => return String::new(),
            },
            Err(_) => return String::new(),
        };

        url.set_fragment(None);
        url.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser(base: &str) -> Parser {
        Parser::new(base).unwrap()
    }

    #[test]
    fn test_html_attribute_set_in_document_order() {
        let html = r#"<html><head>
            <link rel="stylesheet" href="/style.css">
            <script src="/app.js"></script>
        </head><body>
            <a href="/about">About</a>
            <img src="/logo.png" srcset="/logo-2x.png 2x">
            <form action="/search"></form>
            <iframe src="/frame"></iframe>
            <a>no href</a>
            <a href="">empty</a>
        </body></html>"#;

        let urls = parser("https://x.test/").extract_html(html);
        assert_eq!(
            urls,
            vec!["/style.css", "/app.js", "/about", "/logo.png", "/search"]
        );
    }

    #[test]
    fn test_html_malformed_markup_is_best_effort() {
        let html = r#"<div><a href="/one">one<p><a href='/two'>two</div></span><img src=/three"#;
        let urls = parser("https://x.test/").extract_html(html);
        assert!(urls.contains(&"/one".to_string()));
        assert!(urls.contains(&"/two".to_string()));
    }

    #[test]
    fn test_css_url_references() {
        let css = r#"body{background:url('img/a.png')} .b{background:url("b.gif")} .c{src:url(c.woff)}"#;
        let urls = parser("https://x.test/").extract_css(css);
        assert_eq!(urls, vec!["img/a.png", "b.gif", "c.woff"]);
    }

    #[test]
    fn test_css_scenario_resolves_against_stylesheet() {
        let p = parser("https://x.test/css/s.css");
        let urls = p.extract_css("body{background:url('img/a.png')}");
        assert_eq!(urls, vec!["img/a.png"]);
        assert_eq!(p.normalize(&urls[0]), "https://x.test/css/img/a.png");
    }

    #[test]
    fn test_js_literal_calls() {
        let js = r#"
            fetch("/api/list");
            xhr.open("POST", '/api/save');
            $.get("/api/items");
            axios.post('/api/create', body);
        "#;
        let urls = parser("https://x.test/").extract_js(js);
        assert_eq!(
            urls,
            vec!["/api/list", "/api/save", "/api/items", "/api/create"]
        );
    }

    #[test]
    fn test_js_dynamic_urls_are_not_detected() {
        let js = r#"fetch(apiUrl); fetch("/api/" + id); xhr.open("PUT", "/api/x");"#;
        let urls = parser("https://x.test/").extract_js(js);
        assert!(urls.is_empty());
    }

    #[test]
    fn test_js_scenario_normalizes() {
        let p = parser("https://x.test/");
        let urls = p.extract_js(r#"fetch("/api/list")"#);
        assert_eq!(p.normalize(&urls[0]), "https://x.test/api/list");
    }

    #[test]
    fn test_extract_dispatch_by_kind() {
        let p = parser("https://x.test/");
        assert_eq!(p.extract(ContentKind::Css, "a{b:url(x.png)}"), vec!["x.png"]);
        assert!(p.extract(ContentKind::Image, "url(x.png)").is_empty());
        assert!(p.extract(ContentKind::Other, "<a href='/x'>").is_empty());
    }

    #[test]
    fn test_normalize_relative_and_protocol_relative() {
        let p = parser("https://x.test/");
        assert_eq!(p.normalize("/about"), "https://x.test/about");
        assert_eq!(p.normalize("//cdn.test/app.js"), "https://cdn.test/app.js");
    }

    #[test]
    fn test_normalize_strips_fragment() {
        let p = parser("https://x.test/docs/");
        assert_eq!(p.normalize("page#section"), "https://x.test/docs/page");
        assert_eq!(
            p.normalize("https://x.test/a?q=1#top"),
            "https://x.test/a?q=1"
        );
        assert_eq!(p.normalize("#only-fragment"), "https://x.test/docs/");
    }

    #[test]
    fn test_normalize_empty_and_unparsable() {
        let p = parser("https://x.test/");
        assert_eq!(p.normalize(""), "");
        assert_eq!(p.normalize("http://[::1"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let p = parser("https://x.test/a/b/");
        for raw in [
            "../c",
            "./d?x=1#frag",
            "//other.test/path#f",
            "HTTPS://X.TEST/UPPER",
            "/with space",
            "https://x.test:443/port",
            "mailto:someone@x.test",
        ] {
            let once = p.normalize(raw);
            assert!(!once.contains('#'), "fragment left in {}", once);
            assert_eq!(p.normalize(&once), once, "not idempotent for {}", raw);
        }
    }
}
