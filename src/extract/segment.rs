//! Text normalization and paragraph segmentation

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Paragraphs shorter than this are discarded
pub const MIN_PARAGRAPH_CHARS: usize = 160;
/// Paragraphs longer than this are regrouped by sentence
pub const LONG_PARAGRAPH_CHARS: usize = 1200;
/// Target size of a regrouped sentence buffer
pub const SENTENCE_GROUP_CHARS: usize = 400;
/// Maximum paragraphs emitted per page
pub const MAX_PARAGRAPHS: usize = 12;

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n|\r").unwrap());
static HORIZONTAL_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());
static EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").unwrap());

/// Normalize line endings and whitespace runs, then trim
pub fn normalize_text(text: &str) -> String {
    let text = LINE_BREAKS.replace_all(text, "\n");
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");
    let text = EXCESS_NEWLINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Split normalized text into deduplicated prose paragraphs.
///
/// Output holds at most [`MAX_PARAGRAPHS`] items, each at least
/// [`MIN_PARAGRAPH_CHARS`] long, in original order.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    for part in BLANK_LINE.split(text) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if char_len(part) > LONG_PARAGRAPH_CHARS {
            candidates.extend(group_sentences(&split_sentences(part)));
        } else {
            candidates.push(part.to_string());
        }
    }

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|p| char_len(p) >= MIN_PARAGRAPH_CHARS)
        .filter(|p| seen.insert(dedup_key(p)))
        .take(MAX_PARAGRAPHS)
        .collect()
}

/// Split after `.`, `!` or `?` when followed by whitespace and an ASCII
/// capital or digit. The separating whitespace is dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        if matches!(c, '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len() && chars[j].1.is_whitespace() {
                j += 1;
            }
            let boundary = j > i + 1
                && j < chars.len()
                && (chars[j].1.is_ascii_uppercase() || chars[j].1.is_ascii_digit());
            if boundary {
                sentences.push(&text[start..pos + c.len_utf8()]);
                start = chars[j].0;
                i = j;
                continue;
            }
        }
        i += 1;
    }

    sentences.push(&text[start..]);
    sentences
}

/// Greedily merge sentences into buffers of at least
/// [`SENTENCE_GROUP_CHARS`]; a short trailing buffer is kept.
pub fn group_sentences(sentences: &[&str]) -> Vec<String> {
    let mut groups = Vec::new();
    let mut current = String::new();

    for sentence in sentences {
        current = format!("{} {}", current, sentence).trim().to_string();
        if char_len(&current) >= SENTENCE_GROUP_CHARS {
            groups.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// Case-folded key with non-word runs collapsed to single spaces
pub fn dedup_key(paragraph: &str) -> String {
    NON_WORD
        .replace_all(paragraph, " ")
        .trim()
        .to_lowercase()
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}
