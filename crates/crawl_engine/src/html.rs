use crawl_core::{clean_text, SoftFailureDetector};
use crawl_logging::crawl_debug;
use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{Html, Selector};

use crate::{
    decode_html, DateExtractor, Extracted, Extractor, LinkDiscovery, Resource, ResourceError,
};

/// Extracts title, main text, update date and links from HTML pages.
///
/// The soft-404 title check runs before the body is collected; the body check
/// runs on the cleaned text.
#[derive(Debug)]
pub struct HtmlExtractor {
    main: Option<Selector>,
    body: Option<Selector>,
    heading: Option<Selector>,
    title: Option<Selector>,
    detector: SoftFailureDetector,
    links: LinkDiscovery,
    dates: DateExtractor,
}

impl HtmlExtractor {
    pub fn new(detector: SoftFailureDetector, links: LinkDiscovery) -> Self {
        Self {
            main: Selector::parse("div#main, main, [role=main]").ok(),
            body: Selector::parse("body").ok(),
            heading: Selector::parse("h1").ok(),
            title: Selector::parse("title").ok(),
            detector,
            links,
            dates: DateExtractor::new(),
        }
    }

    fn page_title(&self, document: &Html) -> String {
        first_text(document, self.title.as_ref()).unwrap_or_default()
    }

    // Text of every main-content container, or of `body` when there is none.
    fn raw_content<'a>(&self, document: &'a Html) -> Vec<&'a str> {
        let mut raw = Vec::new();
        let mut matched = false;
        if let Some(main) = self.main.as_ref() {
            for element in document.select(main) {
                matched = true;
                collect_text(*element, &mut raw);
            }
        }
        if !matched {
            let root = self
                .body
                .as_ref()
                .and_then(|sel| document.select(sel).next())
                .unwrap_or_else(|| document.root_element());
            collect_text(*root, &mut raw);
        }
        raw
    }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, resource: &Resource<'_>) -> Result<Extracted, ResourceError> {
        let decoded = decode_html(resource.body, resource.content_type);
        if decoded.had_errors {
            crawl_debug!(
                "Replaced malformed {} bytes in {}",
                decoded.encoding_label,
                resource.target
            );
        }
        let document = Html::parse_document(&decoded.text);

        let page_title = self.page_title(&document);
        if let Some(reason) = self.detector.check_title(&page_title) {
            return Err(reason.into());
        }

        let text = clean_text(&self.raw_content(&document).join("\n"));
        if let Some(reason) = self.detector.check_body(&text) {
            return Err(reason.into());
        }

        let title = first_text(&document, self.heading.as_ref()).unwrap_or(page_title);

        Ok(Extracted {
            title,
            text,
            date_updated: self.dates.extract(&document),
            links: self.links.discover(&document, resource.base_url),
        })
    }
}

fn first_text(document: &Html, selector: Option<&Selector>) -> Option<String> {
    let element = document.select(selector?).next()?;
    let text = element.text().collect::<String>();
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn collect_text<'a>(node: NodeRef<'a, Node>, out: &mut Vec<&'a str>) {
    match node.value() {
        Node::Text(text) => out.push(text),
        Node::Element(element) => {
            if matches!(element.name(), "script" | "style" | "noscript" | "template") {
                return;
            }
            for child in node.children() {
                collect_text(child, out);
            }
        }
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}
