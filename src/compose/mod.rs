//! Bounded-length post composition
//!
//! The post is measured in bytes, so the limit also holds for characters.

use crate::models::{CitationMap, Source, Verdict};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Hard ceiling on the composed post
pub const MAX_POST_LEN: usize = 600;
/// Reason space never shrinks below this before the overflow guard
const MIN_REASON_ROOM: usize = 40;
const ELLIPSIS: char = '…';

static CITATION_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Render `Verdict: {label} — {reason} Source: {domain} {url}` within
/// [`MAX_POST_LEN`]. Total over every input combination.
pub fn compose(
    _claim: &str,
    verdict: Verdict,
    rationale: &str,
    sources: &[Source],
    citations: &CitationMap,
) -> String {
    let prefix = format!("Verdict: {} — ", verdict);
    let tail = match pick_source_url(sources, citations) {
        Some(url) => format!(" Source: {} {}", domain(url), url),
        None => String::new(),
    };

    let room = MAX_POST_LEN
        .saturating_sub(prefix.len() + tail.len() + 1)
        .max(MIN_REASON_ROOM);
    let reason = short_reason(rationale, room);
    let mut post = format!("{}{}{}", prefix, reason, tail);

    if post.len() > MAX_POST_LEN {
        let overflow = post.len() - MAX_POST_LEN;
        let reason = short_reason(&reason, reason.len().saturating_sub(overflow + 1));
        post = format!("{}{}{}", prefix, reason, tail);
    }

    // Only reachable when the tail alone overruns the budget.
    if post.len() > MAX_POST_LEN {
        post.truncate(floor_char_boundary(&post, MAX_POST_LEN));
    }
    post
}

/// URL to surface: first in-range supporting citation, then first in-range
/// contradicting one, then the first source with evidence, then the first
/// source
pub fn pick_source_url<'a>(sources: &'a [Source], citations: &CitationMap) -> Option<&'a Url> {
    let cited = |indices: &[usize]| indices.iter().find_map(|&i| sources.get(i));

    cited(&citations.support)
        .or_else(|| cited(&citations.contra))
        .or_else(|| sources.iter().find(|s| s.has_evidence()))
        .or_else(|| sources.first())
        .map(|s| &s.url)
}

/// Host without a leading `www.`, or `source` when there is none
pub fn domain(url: &Url) -> String {
    match url.host_str() {
        Some(host) if !host.is_empty() => host.strip_prefix("www.").unwrap_or(host).to_string(),
        _ => "source".to_string(),
    }
}

/// Strip citation markers, collapse whitespace, and fit into `limit` bytes
/// (ellipsis included)
pub fn short_reason(rationale: &str, limit: usize) -> String {
    let stripped = CITATION_MARKER.replace_all(rationale, "");
    let collapsed = WHITESPACE.replace_all(stripped.trim(), " ");

    if collapsed.len() <= limit {
        return collapsed.into_owned();
    }

    let ellipsis_len = ELLIPSIS.len_utf8();
    if limit < ellipsis_len {
        return String::new();
    }

    let cut = floor_char_boundary(&collapsed, limit - ellipsis_len);
    let mut out = collapsed[..cut].trim_end().to_string();
    out.push(ELLIPSIS);
    out
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    (0..=index).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}
