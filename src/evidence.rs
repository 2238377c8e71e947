//! Answer-evidence extraction.
//!
//! Given a retrieved passage and the query that produced it, keeps only the
//! sentences that share a keyword with the query and emphasizes the matched
//! keywords, so a clinician can see at a glance why a chunk was cited.
//! When retrieval was purely semantic (no lexical overlap at all) the first
//! two sentences of the passage are shown instead.
//!
//! Keyword matching is ASCII case-insensitive; emphasis uses `**` markers,
//! which both the terminal client and markdown front-ends render as bold.

/// Sentence separator between kept sentences.
const JOINER: &str = " ... ";
/// Suffix appended to the no-match fallback excerpt.
const ELLIPSIS: &str = " ...";

/// Refine a passage against a query.
///
/// Pure function: identical inputs always produce identical output.
pub fn refine(passage: &str, query: &str) -> String {
    let keywords = query_keywords(query);
    let sentences = split_sentences(passage);

    let matching: Vec<String> = sentences
        .iter()
        .filter(|s| keywords.iter().any(|k| contains_ci(s, k)))
        .map(|s| emphasize(s, &keywords))
        .collect();

    if !matching.is_empty() {
        return matching.join(JOINER);
    }

    // No lexical overlap (or no usable keywords): show a short prefix.
    let prefix: Vec<&str> = sentences.iter().take(2).map(String::as_str).collect();
    format!("{}{}", prefix.join(" "), ELLIPSIS)
}

/// Whitespace-tokenize the query, discarding tokens of length <= 1.
fn query_keywords(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .filter(|t| t.chars().count() > 1)
        .map(|t| t.to_string())
        .collect()
}

/// Split a passage into trimmed, non-empty sentences. Boundaries are `.`,
/// `!`, or `?` followed by whitespace, and newline characters. A passage
/// with no boundary is a single sentence.
fn split_sentences(passage: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = passage.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            flush(&mut current, &mut sentences);
            continue;
        }
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            if let Some(next) = chars.peek() {
                if next.is_whitespace() {
                    flush(&mut current, &mut sentences);
                }
            }
        }
    }
    flush(&mut current, &mut sentences);

    sentences
}

fn flush(current: &mut String, sentences: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

/// ASCII case-insensitive substring test.
fn contains_ci(haystack: &str, needle: &str) -> bool {
    find_ci(haystack, needle, 0).is_some()
}

/// Find `needle` in `haystack` at or after byte offset `from`, comparing
/// bytes ASCII case-insensitively. Non-ASCII bytes must match exactly, so
/// a hit always lands on UTF-8 boundaries.
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let ned = needle.as_bytes();
    if ned.is_empty() || from + ned.len() > hay.len() {
        return None;
    }
    (from..=hay.len() - ned.len()).find(|&i| hay[i..i + ned.len()].eq_ignore_ascii_case(ned))
}

/// Wrap every occurrence of every keyword in `**` markers, preserving the
/// original casing of the matched text. All keywords are matched against
/// the unmarked sentence, so markers are never re-scanned and overlapping
/// keywords cannot nest; where matches overlap, the longest wins.
fn emphasize(sentence: &str, keywords: &[String]) -> String {
    let mut hits: Vec<(usize, usize)> = Vec::new();
    for keyword in keywords {
        let mut pos = 0;
        while let Some(hit) = find_ci(sentence, keyword, pos) {
            hits.push((hit, hit + keyword.len()));
            pos = hit + keyword.len();
        }
    }

    // Longest match first at any given start, then keep only ranges that
    // begin after the previously kept one ends.
    hits.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
    let mut kept: Vec<(usize, usize)> = Vec::new();
    for (start, end) in hits {
        if kept.last().map_or(true, |&(_, prev_end)| start >= prev_end) {
            kept.push((start, end));
        }
    }

    let mut out = String::with_capacity(sentence.len());
    let mut pos = 0;
    for (start, end) in kept {
        out.push_str(&sentence[pos..start]);
        out.push_str("**");
        out.push_str(&sentence[start..end]);
        out.push_str("**");
        pos = end;
    }
    out.push_str(&sentence[pos..]);
    out
}
