use bp_core::{Candidate, Error, Result};
use scraper::{ElementRef, Html, Selector};
use url::Url;

pub const DEFAULT_LIMIT: usize = 3;

/// Attribute Livewire puts on every row of the blog listing.
pub const ARTICLE_MARKER: &str = "wire:key";
pub const ARTICLE_PREFIX: &str = "article-";

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Scraping(format!("Invalid selector {}: {:?}", css, e)))
}

/// Pulls candidate posts out of the listing page.
///
/// A container is any `div` whose marker attribute starts with the article
/// prefix and which holds at least one `a[href]`, even an empty one. The
/// first such anchor is the article link; an empty href resolves to the
/// listing URL itself. Containers are taken in document order until `limit`
/// candidates have been found.
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    base_url: Option<Url>,
    limit: usize,
    marker: String,
    prefix: String,
    container: Selector,
    link: Selector,
    image: Selector,
    heading: Selector,
}

impl ListingExtractor {
    /// `base_url` is the listing page address, used to resolve relative links.
    pub fn new(base_url: &str, limit: usize) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url).ok(),
            limit,
            marker: ARTICLE_MARKER.to_string(),
            prefix: ARTICLE_PREFIX.to_string(),
            container: selector("div")?,
            link: selector("a[href]")?,
            image: selector("img[src]")?,
            heading: selector("h3")?,
        })
    }

    pub fn with_marker(mut self, attribute: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.marker = attribute.into();
        self.prefix = prefix.into();
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn extract(&self, html: &str) -> Vec<Candidate> {
        let document = Html::parse_document(html);

        document
            .select(&self.container)
            .filter(|el| {
                el.value()
                    .attr(&self.marker)
                    .map_or(false, |key| key.starts_with(&self.prefix))
            })
            .filter_map(|el| self.candidate(el))
            .take(self.limit)
            .collect()
    }

    fn candidate(&self, container: ElementRef<'_>) -> Option<Candidate> {
        let href = container
            .select(&self.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)?;

        let image = container
            .select(&self.image)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .map(|src| self.resolve(src));

        let title = container.select(&self.heading).next().map(|h3| {
            h3.text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        });

        Some(Candidate {
            title,
            image,
            url: self.resolve(href),
        })
    }

    /// Absolute links are returned untouched; relative ones are joined onto the listing URL.
    fn resolve(&self, link: &str) -> String {
        if Url::parse(link).is_ok() {
            return link.to_string();
        }
        self.base_url
            .as_ref()
            .and_then(|base| base.join(link).ok())
            .map(|url| url.to_string())
            .unwrap_or_else(|| link.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://laravel-news.com/blog";

    fn row(key: &str, href: &str, title: Option<&str>, img: Option<&str>) -> String {
        format!(
            r#"<div wire:key="{key}">
                {img}
                <a href="{href}">{heading}</a>
                <p>Excerpt</p>
            </div>"#,
            key = key,
            href = href,
            img = img.map(|src| format!(r#"<img src="{}" alt="">"#, src)).unwrap_or_default(),
            heading = title.map(|t| format!("<h3>\n   {}\n  </h3>", t)).unwrap_or_default(),
        )
    }

    fn page(rows: &[String]) -> String {
        format!("<html><body><main>{}</main></body></html>", rows.join("\n"))
    }

    fn extractor() -> ListingExtractor {
        ListingExtractor::new(BASE, DEFAULT_LIMIT).unwrap()
    }

    #[test]
    fn test_extracts_title_image_and_url() {
        let html = page(&[row(
            "article-101",
            "https://laravel-news.com/queues-in-depth",
            Some("Queues in   Depth"),
            Some("https://picperf.io/queues.png"),
        )]);

        let candidates = extractor().extract(&html);
        assert_eq!(
            candidates,
            vec![Candidate {
                title: Some("Queues in Depth".to_string()),
                image: Some("https://picperf.io/queues.png".to_string()),
                url: "https://laravel-news.com/queues-in-depth".to_string(),
            }]
        );
    }

    #[test]
    fn test_stops_at_limit() {
        let rows: Vec<_> = (1..=5)
            .map(|i| row(&format!("article-{}", i), &format!("https://laravel-news.com/post-{}", i), Some("T"), None))
            .collect();

        let candidates = extractor().extract(&page(&rows));
        let urls: Vec<_> = candidates.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://laravel-news.com/post-1",
                "https://laravel-news.com/post-2",
                "https://laravel-news.com/post-3",
            ]
        );
    }

    #[test]
    fn test_skipped_containers_do_not_count() {
        let rows = vec![
            row("sponsor-1", "https://sponsor.example.com", Some("Ad"), None),
            "<div wire:key=\"article-2\"><h3>No link here</h3></div>".to_string(),
            row("article-3", "https://laravel-news.com/three", Some("Three"), None),
            "<div class=\"card\"><a href=\"https://laravel-news.com/unmarked\">x</a></div>".to_string(),
            row("article-4", "https://laravel-news.com/four", Some("Four"), None),
        ];

        let candidates = extractor().extract(&page(&rows));
        let urls: Vec<_> = candidates.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["https://laravel-news.com/three", "https://laravel-news.com/four"]);
    }

    #[test]
    fn test_no_matching_containers_is_empty() {
        let html = "<html><body><article><a href=\"/x\">x</a></article></body></html>";
        assert!(extractor().extract(html).is_empty());
        assert!(extractor().extract("").is_empty());
    }

    #[test]
    fn test_missing_heading_and_image_are_none() {
        let html = page(&[row("article-7", "https://laravel-news.com/seven", None, None)]);

        let candidates = extractor().extract(&html);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, None);
        assert_eq!(candidates[0].image, None);
        assert_eq!(candidates[0].url, "https://laravel-news.com/seven");
    }

    #[test]
    fn test_first_link_and_nested_heading_text() {
        let html = page(&[r#"<div wire:key="article-9">
                <a name="anchor-without-href">skip</a>
                <a href="https://laravel-news.com/first">one</a>
                <a href="https://laravel-news.com/second">two</a>
                <h3><span>Laravel</span> <em>12</em> released</h3>
                <h3>Second heading</h3>
            </div>"#
            .to_string()]);

        let candidates = extractor().extract(&html);
        assert_eq!(candidates[0].url, "https://laravel-news.com/first");
        assert_eq!(candidates[0].title.as_deref(), Some("Laravel 12 released"));
    }

    #[test]
    fn test_empty_href_still_counts_as_link() {
        let rows = vec![
            r#"<div wire:key="article-1"><a href="">Empty</a><h3>Empty link</h3></div>"#.to_string(),
            row("article-2", "https://laravel-news.com/two", Some("Two"), None),
        ];

        let candidates = extractor().extract(&page(&rows));
        let urls: Vec<_> = candidates.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec![BASE, "https://laravel-news.com/two"]);
        assert_eq!(candidates[0].title.as_deref(), Some("Empty link"));
    }

    #[test]
    fn test_relative_links_resolve_against_listing() {
        let html = page(&[row("article-1", "/relative-post", Some("Rel"), Some("/images/rel.png"))]);

        let candidates = extractor().extract(&html);
        assert_eq!(candidates[0].url, "https://laravel-news.com/relative-post");
        assert_eq!(candidates[0].image.as_deref(), Some("https://laravel-news.com/images/rel.png"));
    }

    #[test]
    fn test_custom_marker_and_limit() {
        let html = r#"
            <div data-row="post-1"><a href="https://example.com/1">1</a></div>
            <div data-row="post-2"><a href="https://example.com/2">2</a></div>
        "#;
        let extractor = ListingExtractor::new("https://example.com", 1)
            .unwrap()
            .with_marker("data-row", "post-");

        let candidates = extractor.extract(html);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://example.com/1");
        assert_eq!(extractor.limit(), 1);
    }
}
