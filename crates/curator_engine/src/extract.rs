use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use curator_logging::curator_info;
use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::fetch::{FetchSettings, Fetcher, HttpFetcher};
use crate::types::{ContentMetadata, ExtractError, ExtractedContent, TypeMetadata};

/// Identifier recorded in document metadata by the generic HTML extractor.
pub const FALLBACK_EXTRACTOR_ID: &str = "fallback";

/// Elements whose text never belongs to the readable content.
const PRUNED_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];

/// Candidate containers for the main content, in priority order.
const CONTENT_SELECTORS: &[&str] = &["main", "article", r#"[role="main"]"#, ".content", "#content"];

/// Capability boundary for content extraction.
///
/// Format-specific extractors implement this and register with the
/// [`crate::ExtractorRegistry`]; failures propagate and are contained at the
/// orchestrator.
#[async_trait::async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Identifier stored in document metadata.
    fn id(&self) -> &'static str;

    async fn extract(
        &self,
        url: &str,
        metadata: &TypeMetadata,
    ) -> Result<ExtractedContent, ExtractError>;
}

/// Generic extractor applicable to arbitrary web pages.
///
/// Fetches the page, then resolves title, description and main content with
/// best-effort heuristics. Title and content must be non-empty after cleanup
/// or the extraction is rejected.
pub struct FallbackExtractor {
    fetcher: Box<dyn Fetcher>,
    success_count: AtomicU64,
}

impl FallbackExtractor {
    pub fn new(settings: FetchSettings) -> Self {
        Self::with_fetcher(Box::new(HttpFetcher::new(settings)))
    }

    pub fn with_fetcher(fetcher: Box<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            success_count: AtomicU64::new(0),
        }
    }

    /// Number of extractions that passed validation.
    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl ContentExtractor for FallbackExtractor {
    fn id(&self) -> &'static str {
        FALLBACK_EXTRACTOR_ID
    }

    async fn extract(
        &self,
        url: &str,
        metadata: &TypeMetadata,
    ) -> Result<ExtractedContent, ExtractError> {
        curator_info!("Extracting content from: {url}");
        let output = self.fetcher.fetch(url).await?;

        let (title, description, content) = parse_page(&output.body);

        if title.trim().is_empty() {
            return Err(ExtractError::EmptyField { field: "title" });
        }
        if content.trim().is_empty() {
            return Err(ExtractError::EmptyField { field: "content" });
        }

        let word_count = content.split_whitespace().count();
        let extracted = ExtractedContent {
            title,
            description,
            content,
            metadata: ContentMetadata {
                url: url.to_string(),
                domain: metadata.domain.clone(),
                extracted_at: Utc::now(),
                extractor: FALLBACK_EXTRACTOR_ID.to_string(),
                word_count,
            },
        };

        self.success_count.fetch_add(1, Ordering::Relaxed);
        curator_info!("Successfully extracted {word_count} words from: {url}");
        Ok(extracted)
    }
}

fn parse_page(html: &str) -> (String, String, String) {
    let doc = Html::parse_document(html);
    (
        resolve_title(&doc),
        resolve_description(&doc),
        resolve_content(&doc),
    )
}

fn select_first<'a>(doc: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    doc.select(&selector).next()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn meta_content<'a>(doc: &'a Html, selector: &str) -> Option<&'a str> {
    select_first(doc, selector)
        .and_then(|element| element.value().attr("content"))
        .map(str::trim)
        .filter(|content| !content.is_empty())
}

/// `<title>` text, then `og:title`, then the first `<h1>`, then "Untitled".
fn resolve_title(doc: &Html) -> String {
    if let Some(element) = select_first(doc, "title") {
        let text = element_text(element);
        if !text.is_empty() {
            return text;
        }
    }

    if let Some(content) = meta_content(doc, r#"meta[property="og:title"]"#) {
        return content.to_string();
    }

    if let Some(element) = select_first(doc, "h1") {
        let text = element_text(element);
        if !text.is_empty() {
            return text;
        }
    }

    "Untitled".to_string()
}

/// Description meta, then `og:description`, then the first paragraph
/// truncated to 200 characters.
fn resolve_description(doc: &Html) -> String {
    if let Some(content) = meta_content(doc, r#"meta[name="description"]"#) {
        return content.to_string();
    }

    if let Some(content) = meta_content(doc, r#"meta[property="og:description"]"#) {
        return content.to_string();
    }

    if let Some(element) = select_first(doc, "p") {
        let text = element_text(element);
        if !text.is_empty() {
            return truncate_chars(&text, 200);
        }
    }

    "No description available".to_string()
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(limit - 3).collect();
    truncated.push_str("...");
    truncated
}

/// Text of the first matching content container, pruned of
/// scripting/navigation elements and whitespace-normalized. Empty when the
/// document has no body at all.
fn resolve_content(doc: &Html) -> String {
    let container = CONTENT_SELECTORS
        .iter()
        .find_map(|selector| select_first(doc, selector))
        .or_else(|| select_first(doc, "body"));

    let Some(container) = container else {
        return String::new();
    };

    let mut raw = String::new();
    for child in container.children() {
        visit_node(child, &mut raw);
    }

    clean_text(&raw)
}

fn visit_node(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => {
            out.push_str(text);
            out.push('\n');
        }
        Node::Element(element) => {
            if PRUNED_TAGS.contains(&element.name()) {
                return;
            }
            for child in node.children() {
                visit_node(child, out);
            }
        }
        _ => {}
    }
}

/// Collapse runs of blank lines to a single blank line, trim every line and
/// trim the document.
fn clean_text(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut blank_run = 0usize;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !cleaned.is_empty() {
            cleaned.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        blank_run = 0;
        cleaned.push_str(line);
    }

    cleaned
}
