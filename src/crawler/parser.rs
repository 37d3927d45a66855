//! HTML parser for wiki article pages
//!
//! This module turns a fetched article page into:
//! - The display title
//! - A typed heading/text event stream of the main content
//! - The full visible body text (for relevance scoring)
//! - The outgoing links of the main content
//! - The canonical URL and whether the page is a disambiguation page

use crate::crawler::fetcher::{FetchError, FetchErrorKind};
use crate::crawler::outline::HeadingEvent;
use crate::url::Link;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Candidate selectors for the main content container, most specific first
const CONTENT_ROOT_SELECTORS: &[&str] = &[
    "#mw-content-text .mw-parser-output",
    "div.mw-parser-output",
    "#mw-content-text",
];

/// Headings and text blocks that make up the outline stream
const BLOCK_SELECTOR: &str = "h2, h3, h4, h5, h6, p, li, dd";

/// Markers present only on disambiguation pages
const DISAMBIGUATION_SELECTOR: &str = "#disambigbox, .dmbox-disambig, .disambigbox, .mw-disambig";

/// Elements whose text never belongs to the outline
const HIDDEN_TAGS: &[&str] = &["style", "script", "noscript", "table", "figure"];

/// Classes whose text never belongs to the outline
const HIDDEN_CLASSES: &[&str] = &[
    "mw-editsection",
    "reference",
    "reflist",
    "mw-references-wrap",
    "navbox",
    "hatnote",
    "noprint",
    "thumb",
    "infobox",
    "metadata",
    "shortdescription",
    "toc",
];

/// Extracted information from an article page
#[derive(Debug, Clone)]
pub struct ParsedArticle {
    pub title: String,
    /// Target of `<link rel="canonical">`, if present
    pub canonical_url: Option<Url>,
    pub body_text: String,
    pub headings: Vec<HeadingEvent>,
    pub links: Vec<Link>,
    pub is_disambiguation: bool,
}

/// Parses an article page
///
/// # Errors
///
/// * `TitleMissing` - no usable title was found
/// * `EmptyContentRoot` - the page has no main content container
///
/// # Example
///
/// ```
/// use url::Url;
/// use wiki_outline::crawler::parse_article;
///
/// let html = r#"<html><body>
///   <h1 id="firstHeading"><span class="mw-page-title-main">Tort</span></h1>
///   <div class="mw-parser-output"><p>A civil wrong.</p></div>
/// </body></html>"#;
/// let page = Url::parse("https://en.wikipedia.org/wiki/Tort").unwrap();
/// let article = parse_article(html, &page).unwrap();
/// assert_eq!(article.title, "Tort");
/// assert_eq!(article.body_text, "A civil wrong.");
/// ```
pub fn parse_article(html: &str, page_url: &Url) -> Result<ParsedArticle, FetchError> {
    let document = Html::parse_document(html);

    let title = extract_title(&document).ok_or_else(|| {
        FetchError::new(FetchErrorKind::TitleMissing, format!("no title on {}", page_url))
    })?;

    let root = find_content_root(&document).ok_or_else(|| {
        FetchError::new(
            FetchErrorKind::EmptyContentRoot,
            format!("no content container on {}", page_url),
        )
    })?;

    let headings = extract_events(root);
    let body_text = headings
        .iter()
        .map(|event| match event {
            HeadingEvent::Heading { label, .. } => label.as_str(),
            HeadingEvent::Text(line) => line.as_str(),
        })
        .collect::<Vec<_>>()
        .join("\n");

    Ok(ParsedArticle {
        title,
        canonical_url: extract_canonical(&document, page_url),
        body_text,
        headings,
        links: extract_links(root),
        is_disambiguation: select_first(&document, DISAMBIGUATION_SELECTOR).is_some(),
    })
}

fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

/// Extracts the display title with fallbacks
fn extract_title(document: &Html) -> Option<String> {
    for css in ["span.mw-page-title-main", "h1#firstHeading"] {
        if let Some(title) = select_first(document, css)
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
        {
            return Some(title);
        }
    }

    // "<title>Tort - Wikipedia</title>"
    select_first(document, "title")
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .map(|t| match t.rsplit_once(" - ") {
            Some((head, _site)) => head.to_string(),
            None => t,
        })
        .filter(|t| !t.is_empty())
}

fn find_content_root(document: &Html) -> Option<ElementRef<'_>> {
    CONTENT_ROOT_SELECTORS
        .iter()
        .find_map(|css| select_first(document, css))
}

fn extract_canonical(document: &Html, page_url: &Url) -> Option<Url> {
    let href = select_first(document, "link[rel='canonical'][href]")?
        .value()
        .attr("href")?;
    page_url.join(href).ok()
}

/// Walks the content root in document order producing heading and text events
fn extract_events(root: ElementRef<'_>) -> Vec<HeadingEvent> {
    let Ok(selector) = Selector::parse(BLOCK_SELECTOR) else {
        return Vec::new();
    };

    let mut events = Vec::new();
    for element in root.select(&selector) {
        if is_hidden_or_nested(element) {
            continue;
        }

        let text = visible_text(element);
        if text.is_empty() {
            continue;
        }

        match heading_level(element) {
            Some(level) => events.push(HeadingEvent::heading(level, text)),
            None => events.push(HeadingEvent::text(text)),
        }
    }
    events
}

fn heading_level(element: ElementRef<'_>) -> Option<u8> {
    let name = element.value().name();
    name.strip_prefix('h')?.parse::<u8>().ok()
}

/// True if the block sits inside hidden chrome or inside another text block
fn is_hidden_or_nested(element: ElementRef<'_>) -> bool {
    if is_hidden(element) {
        return true;
    }
    element.ancestors().filter_map(ElementRef::wrap).any(|ancestor| {
        is_hidden(ancestor) || matches!(ancestor.value().name(), "p" | "li" | "dd")
    })
}

fn is_hidden(element: ElementRef<'_>) -> bool {
    let value = element.value();
    HIDDEN_TAGS.contains(&value.name()) || value.classes().any(|c| HIDDEN_CLASSES.contains(&c))
}

/// Text of `element` with hidden descendants (edit links, citation markers) removed
fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .take_while(|ancestor| ancestor.id() != element.id())
            .any(is_hidden);
        if !hidden {
            out.push_str(text);
        }
    }
    collapse_whitespace(&out)
}

fn extract_links(root: ElementRef<'_>) -> Vec<Link> {
    let Ok(selector) = Selector::parse("a") else {
        return Vec::new();
    };

    root.select(&selector)
        .map(|anchor| Link {
            href: anchor.value().attr("href").map(str::to_string),
            label: collapse_whitespace(&anchor.text().collect::<String>()),
        })
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://en.wikipedia.org/wiki/Contract_law").unwrap()
    }

    fn article(content: &str) -> String {
        format!(
            r#"<html><head><title>Contract law - Wikipedia</title>
            <link rel="canonical" href="https://en.wikipedia.org/wiki/Contract_law"></head>
            <body>
            <h1 id="firstHeading"><span class="mw-page-title-main">Contract law</span></h1>
            <div id="mw-content-text"><div class="mw-content-ltr mw-parser-output">{}</div></div>
            </body></html>"#,
            content
        )
    }

    #[test]
    fn test_extract_title_from_title_span() {
        let parsed = parse_article(&article("<p>x</p>"), &page_url()).unwrap();
        assert_eq!(parsed.title, "Contract law");
    }

    #[test]
    fn test_title_falls_back_to_document_title() {
        let html = r#"<html><head><title>Tort - Wikipedia</title></head>
            <body><div class="mw-parser-output"><p>x</p></div></body></html>"#;
        let parsed = parse_article(html, &page_url()).unwrap();
        assert_eq!(parsed.title, "Tort");
    }

    #[test]
    fn test_missing_title() {
        let html = r#"<html><body><div class="mw-parser-output"><p>x</p></div></body></html>"#;
        let err = parse_article(html, &page_url()).unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::TitleMissing);
    }

    #[test]
    fn test_missing_content_root() {
        let html = r#"<html><head><title>Tort</title></head><body><p>x</p></body></html>"#;
        let err = parse_article(html, &page_url()).unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::EmptyContentRoot);
    }

    #[test]
    fn test_heading_stream_in_document_order() {
        let html = article(
            r#"<p>Lead.</p>
            <div class="mw-heading mw-heading2"><h2 id="History">History</h2>
              <span class="mw-editsection">[<a href="/w/index.php?title=Contract_law&action=edit&section=1">edit</a>]</span></div>
            <p>Old times.</p>
            <h3><span class="mw-headline">Roman law</span><span class="mw-editsection">[edit]</span></h3>
            <ul><li>Stipulatio</li><li>Consensual contracts</li></ul>"#,
        );
        let parsed = parse_article(&html, &page_url()).unwrap();

        assert_eq!(
            parsed.headings,
            vec![
                HeadingEvent::text("Lead."),
                HeadingEvent::heading(2, "History"),
                HeadingEvent::text("Old times."),
                HeadingEvent::heading(3, "Roman law"),
                HeadingEvent::text("Stipulatio"),
                HeadingEvent::text("Consensual contracts"),
            ]
        );
    }

    #[test]
    fn test_citation_markers_removed() {
        let html = article(r##"<p>Offer and acceptance.<sup class="reference"><a href="#cite_note-1">[1]</a></sup></p>"##);
        let parsed = parse_article(&html, &page_url()).unwrap();
        assert_eq!(parsed.headings, vec![HeadingEvent::text("Offer and acceptance.")]);
    }

    #[test]
    fn test_tables_and_navboxes_skipped() {
        let html = article(
            r#"<table class="infobox"><tr><td><p>Infobox text</p></td></tr></table>
            <div class="navbox"><ul><li>Nav item</li></ul></div>
            <p>Body.</p>"#,
        );
        let parsed = parse_article(&html, &page_url()).unwrap();
        assert_eq!(parsed.headings, vec![HeadingEvent::text("Body.")]);
    }

    #[test]
    fn test_nested_list_items_are_folded_into_parent() {
        let html = article("<ul><li>Parent\n<ul><li>Child</li></ul></li></ul>");
        let parsed = parse_article(&html, &page_url()).unwrap();
        assert_eq!(parsed.headings, vec![HeadingEvent::text("Parent Child")]);
    }

    #[test]
    fn test_body_text_joins_events() {
        let html = article(r#"<p>Courts enforce.</p><h2>Statutes</h2><p>Law.</p>"#);
        let parsed = parse_article(&html, &page_url()).unwrap();
        assert_eq!(parsed.body_text, "Courts enforce.\nStatutes\nLaw.");
    }

    #[test]
    fn test_links_collected_from_content_root_only() {
        let html = r#"<html><head><title>X</title></head><body>
            <a href="/wiki/Outside">outside</a>
            <div class="mw-parser-output"><p><a href="/wiki/Tort">tort</a> and
            <a href="/wiki/Equity_(law)">equity</a><a name="anchor">no href</a></p></div>
            </body></html>"#;
        let parsed = parse_article(html, &page_url()).unwrap();

        assert_eq!(
            parsed.links,
            vec![
                Link::new("/wiki/Tort", "tort"),
                Link::new("/wiki/Equity_(law)", "equity"),
                Link {
                    href: None,
                    label: "no href".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_canonical_url() {
        let parsed = parse_article(&article("<p>x</p>"), &page_url()).unwrap();
        assert_eq!(
            parsed.canonical_url.map(|u| u.to_string()),
            Some("https://en.wikipedia.org/wiki/Contract_law".to_string())
        );
    }

    #[test]
    fn test_disambiguation_detected() {
        let html = article(r#"<div id="disambigbox">This disambiguation page lists articles.</div><ul><li>Law (band)</li></ul>"#);
        let parsed = parse_article(&html, &page_url()).unwrap();
        assert!(parsed.is_disambiguation);

        let plain = parse_article(&article("<p>x</p>"), &page_url()).unwrap();
        assert!(!plain.is_disambiguation);
    }
}
