//! Cluster label generation.
//!
//! Labels come from the member filenames plus the head of each member's
//! diff: top-2 repeated bigrams when available, otherwise top-3 unigrams,
//! otherwise the first member's final path segment.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::ClusterItem;
use crate::types::truncate_chars;

/// Characters of diff text considered per member.
const DIFF_HEAD_CHARS: usize = 200;

const MIN_TOKEN_LEN: usize = 3;

static PATH_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/._\-\s]+").expect("static regex"));

static WORD_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W+").expect("static regex"));

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "is", "was", "are", "were", "be", "been", "has", "have", "had", "do", "does", "did",
    "will", "would", "could", "should", "may", "might", "must", "can", "this", "that", "these",
    "those", "it", "its", "as", "if", "not", "no", "nor", "so", "yet", "both", "either",
    "neither", "each", "few", "more", "most", "other", "some", "such", "than", "too", "very",
];

pub(super) fn generate_label(items: &[&ClusterItem]) -> String {
    let mut words: Vec<String> = Vec::new();

    for item in items {
        for token in PATH_SPLIT_RE.split(&item.filename) {
            push_token(&mut words, token);
        }

        let diff_head = truncate_chars(item.patch.as_deref().unwrap_or(""), DIFF_HEAD_CHARS);
        for token in WORD_SPLIT_RE.split(diff_head) {
            push_token(&mut words, token);
        }
    }

    let bigrams: Vec<String> = words
        .windows(2)
        .map(|pair| format!("{} {}", pair[0], pair[1]))
        .collect();

    if !bigrams.is_empty() {
        let top = most_common(&bigrams, 2);
        if let Some((_, count)) = top.first() {
            if *count > 1 {
                return top
                    .iter()
                    .map(|(bigram, _)| bigram.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
            }
        }
    }

    if !words.is_empty() {
        return most_common(&words, 3)
            .iter()
            .map(|(word, _)| word.as_str())
            .collect::<Vec<_>>()
            .join(" ");
    }

    match items.first() {
        Some(item) => final_path_segment(&item.filename),
        None => "unknown".to_string(),
    }
}

fn push_token(words: &mut Vec<String>, token: &str) {
    if token.len() < MIN_TOKEN_LEN || !token.chars().all(|c| c.is_alphabetic()) {
        return;
    }
    let lower = token.to_lowercase();
    if STOPWORDS.contains(&lower.as_str()) {
        return;
    }
    words.push(lower);
}

/// Top `n` items by frequency, ties broken by first occurrence.
pub(super) fn most_common(items: &[String], n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for item in items {
        let entry = counts.entry(item.as_str()).or_insert(0);
        if *entry == 0 {
            order.push(item.as_str());
        }
        *entry += 1;
    }

    let mut ranked: Vec<(String, usize)> = order
        .into_iter()
        .map(|item| (item.to_string(), counts[item]))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(n);
    ranked
}

pub(super) fn final_path_segment(filename: &str) -> String {
    let segment = filename.rsplit('/').next().unwrap_or(filename);
    if segment.is_empty() {
        "unknown".to_string()
    } else {
        segment.to_string()
    }
}
