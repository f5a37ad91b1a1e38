//! Main-content recovery strategies, tried in a fixed order

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;

use super::segment::{char_len, normalize_text};

/// Elements whose text never counts as page content
const NON_CONTENT_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "header", "footer", "aside",
];

/// Elements rendered as their own paragraph when flattened to text
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "blockquote", "pre", "li", "ul", "ol",
    "table", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "figure", "figcaption", "dl", "dt", "dd",
];

static POSITIVE_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)article|body|content|entry|main|post|text|story").unwrap()
});
static NEGATIVE_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)comment|footer|header|nav|sidebar|sponsor|ad-|share|related|menu|promo|cookie")
        .unwrap()
});

/// One way of recovering the main prose of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractStrategy {
    /// Keep prose blocks anywhere on the page, dropping link-heavy ones
    Boilerplate,
    /// Isolate the highest-scoring article container
    Readability,
    /// Whole page minus non-content elements
    FullPage,
}

impl ExtractStrategy {
    /// Strategies in the order they are tried
    pub const CHAIN: [ExtractStrategy; 3] = [
        ExtractStrategy::Boilerplate,
        ExtractStrategy::Readability,
        ExtractStrategy::FullPage,
    ];

    /// Minimum normalized length for the output to be accepted
    pub fn min_chars(&self) -> usize {
        match self {
            ExtractStrategy::Boilerplate => 400,
            ExtractStrategy::Readability => 300,
            ExtractStrategy::FullPage => 200,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractStrategy::Boilerplate => "boilerplate",
            ExtractStrategy::Readability => "readability",
            ExtractStrategy::FullPage => "full_page",
        }
    }

    /// Run the strategy; `None` means no usable output
    pub fn attempt(&self, document: &Html) -> Option<String> {
        match self {
            ExtractStrategy::Boilerplate => boilerplate_text(document),
            ExtractStrategy::Readability => readability_text(document),
            ExtractStrategy::FullPage => full_page_text(document),
        }
    }

    /// Run and normalize, accepting only output above the length floor
    pub fn accept(&self, document: &Html) -> Option<String> {
        let text = normalize_text(&self.attempt(document)?);
        (char_len(&text) >= self.min_chars()).then_some(text)
    }
}

/// First accepted strategy output, normalized
pub fn extract_main_text(html: &str) -> Option<(ExtractStrategy, String)> {
    let document = Html::parse_document(html);
    ExtractStrategy::CHAIN
        .iter()
        .find_map(|strategy| strategy.accept(&document).map(|text| (*strategy, text)))
}

fn boilerplate_text(document: &Html) -> Option<String> {
    let blocks = Selector::parse("p, blockquote, pre").ok()?;
    let mut parts = Vec::new();

    for block in document.select(&blocks) {
        if in_non_content(&block) || nested_in_block(&block) {
            continue;
        }
        let text = element_text(block);
        let text = text.trim();
        if text.is_empty() || link_density(&block, char_len(text)) > 0.5 {
            continue;
        }
        parts.push(text.to_string());
    }

    (!parts.is_empty()).then(|| parts.join("\n\n"))
}

fn readability_text<'a>(document: &'a Html) -> Option<String> {
    let paragraphs = Selector::parse("p").ok()?;
    // Candidate slots in first-seen document order; ties keep the earliest.
    let mut slots: HashMap<_, usize> = HashMap::new();
    let mut candidates: Vec<(ElementRef<'a>, f64)> = Vec::new();
    let mut credit = |element: ElementRef<'a>, score: f64| {
        let slot = *slots.entry(element.id()).or_insert_with(|| {
            candidates.push((element, class_weight(&element)));
            candidates.len() - 1
        });
        candidates[slot].1 += score;
    };

    for p in document.select(&paragraphs) {
        if in_non_content(&p) {
            continue;
        }
        let text = p.text().collect::<String>();
        let len = char_len(text.trim());
        if len < 25 {
            continue;
        }
        let score = 1.0 + text.matches(',').count() as f64 + (len as f64 / 100.0).min(3.0);

        let Some(parent) = p.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        credit(parent, score);

        if let Some(grandparent) = parent.parent().and_then(ElementRef::wrap) {
            credit(grandparent, score / 2.0);
        }
    }

    let mut best: Option<(ElementRef, f64)> = None;
    for (candidate, raw) in candidates {
        let text_len = char_len(&candidate.text().collect::<String>());
        let score = raw * (1.0 - link_density(&candidate, text_len));
        if best.as_ref().map_or(true, |(_, s)| score > *s) {
            best = Some((candidate, score));
        }
    }

    best.map(|(element, _)| element_text(element))
}

fn full_page_text(document: &Html) -> Option<String> {
    let body = Selector::parse("body").ok()?;
    let root = document
        .select(&body)
        .next()
        .unwrap_or_else(|| document.root_element());
    Some(element_text(root))
}

/// Flatten an element to text, skipping non-content subtrees and putting
/// block-level elements on their own paragraph
pub(crate) fn element_text(element: ElementRef) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    out
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if NON_CONTENT_TAGS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = BLOCK_TAGS.contains(&name);
                if block {
                    out.push_str("\n\n");
                }
                collect_text(child_el, out);
                if block {
                    out.push_str("\n\n");
                }
            }
            _ => {}
        }
    }
}

fn in_non_content(element: &ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| NON_CONTENT_TAGS.contains(&a.value().name()))
}

fn nested_in_block(element: &ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| matches!(a.value().name(), "p" | "blockquote" | "pre"))
}

fn link_density(element: &ElementRef, text_len: usize) -> f64 {
    if text_len == 0 {
        return 0.0;
    }
    let Ok(links) = Selector::parse("a") else {
        return 0.0;
    };
    let link_len: usize = element
        .select(&links)
        .map(|a| char_len(a.text().collect::<String>().trim()))
        .sum();
    (link_len as f64 / text_len as f64).min(1.0)
}

fn class_weight(element: &ElementRef) -> f64 {
    let el = element.value();
    let hints = format!(
        "{} {}",
        el.attr("class").unwrap_or_default(),
        el.attr("id").unwrap_or_default()
    );
    let mut weight = match el.name() {
        "article" | "main" => 10.0,
        "section" | "div" => 5.0,
        _ => 0.0,
    };
    if POSITIVE_HINT.is_match(&hints) {
        weight += 25.0;
    }
    if NEGATIVE_HINT.is_match(&hints) {
        weight -= 25.0;
    }
    weight
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prose(seed: &str, sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("The {} report, section {}, describes how the river flooded the lower town.", seed, i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_boilerplate_keeps_prose_drops_chrome() {
        let html = format!(
            r#"<html><body>
                <nav><p>{nav}</p></nav>
                <article><p>{a}</p><p>{b}</p></article>
                <footer><p>Copyright notice that should never appear in extracted text at all.</p></footer>
                <script>var tracking = "ignored";</script>
            </body></html>"#,
            nav = prose("menu", 3),
            a = prose("first", 4),
            b = prose("second", 4),
        );

        let (strategy, text) = extract_main_text(&html).unwrap();
        assert_eq!(strategy, ExtractStrategy::Boilerplate);
        assert!(text.contains("first report"));
        assert!(text.contains("second report"));
        assert!(!text.contains("menu report"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("tracking"));
        assert!(text.contains("\n\n"));
    }

    #[test]
    fn test_boilerplate_skips_link_lists() {
        let html = format!(
            r#"<body><p><a href="/a">{links}</a></p><p>{body}</p></body>"#,
            links = prose("linked", 3),
            body = prose("body", 6),
        );
        let document = Html::parse_document(&html);
        let text = boilerplate_text(&document).unwrap();
        assert!(!text.contains("linked report"));
        assert!(text.contains("body report"));
    }

    #[test]
    fn test_readability_used_when_prose_is_short() {
        // Paragraphs too short for the first strategy's floor, but the
        // article container still clears the second one.
        let html = format!(
            r#"<body>
                <div class="sidebar"><p>Related: other stories, more links, and more</p></div>
                <div class="article-content">
                    <p>{}</p>
                    <span>{}</span>
                </div>
            </body>"#,
            prose("short", 2),
            prose("span", 3),
        );
        let (strategy, text) = extract_main_text(&html).unwrap();
        assert_eq!(strategy, ExtractStrategy::Readability);
        assert!(text.contains("span report"));
        assert!(!text.contains("Related:"));
    }

    #[test]
    fn test_readability_ties_pick_earliest_container() {
        let html = format!(
            "<body><section><p>{}</p></section><section><p>{}</p></section></body>",
            prose("alpha", 2),
            prose("omega", 2),
        );
        for _ in 0..20 {
            let document = Html::parse_document(&html);
            let text = readability_text(&document).unwrap();
            assert!(text.contains("alpha report"));
            assert!(!text.contains("omega report"));
        }
    }

    #[test]
    fn test_full_page_fallback() {
        let html = format!(
            "<body><header>Site title</header><div>{}</div></body>",
            prose("div only", 3)
        );
        let (strategy, text) = extract_main_text(&html).unwrap();
        assert_eq!(strategy, ExtractStrategy::FullPage);
        assert!(text.starts_with("The div only report"));
        assert!(!text.contains("Site title"));
    }

    #[test]
    fn test_nothing_accepted_for_tiny_page() {
        assert!(extract_main_text("<html><body><p>Hello</p></body></html>").is_none());
        assert!(extract_main_text("").is_none());
    }
}
