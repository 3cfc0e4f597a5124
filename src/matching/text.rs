//! Token pipeline shared by the semantic and resolution sub-scores:
//! lower-case, synonym folding, tokenization, suffix-stripping stemming.

use std::collections::{HashMap, HashSet};

/// Domain synonym table folding entities/tickers/agencies/assets/months/
/// polarity words onto a single canonical token before stemming.
fn synonym_table() -> &'static HashMap<&'static str, &'static str> {
    use std::sync::OnceLock;
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut m = HashMap::new();
        // Candidates / political figures
        m.insert("trump", "trump");
        m.insert("donald", "trump");
        m.insert("biden", "biden");
        m.insert("joe", "biden");
        m.insert("harris", "harris");
        m.insert("kamala", "harris");
        // Tickers / crypto assets
        m.insert("btc", "bitcoin");
        m.insert("xbt", "bitcoin");
        m.insert("eth", "ethereum");
        m.insert("ether", "ethereum");
        // Agencies
        m.insert("fed", "federalreserve");
        m.insert("fomc", "federalreserve");
        m.insert("federal", "federalreserve");
        m.insert("reserve", "federalreserve");
        m.insert("sec", "secagency");
        // Months
        for (full, abbr) in [
            ("january", "jan"),
            ("february", "feb"),
            ("march", "mar"),
            ("april", "apr"),
            ("june", "jun"),
            ("july", "jul"),
            ("august", "aug"),
            ("september", "sep"),
            ("october", "oct"),
            ("november", "nov"),
            ("december", "dec"),
        ] {
            m.insert(full, abbr);
        }
        // Polarity
        m.insert("win", "win");
        m.insert("wins", "win");
        m.insert("winning", "win");
        m.insert("lose", "lose");
        m.insert("loses", "lose");
        m.insert("losing", "lose");
        m
    })
}

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "of", "to", "in", "on", "by", "or", "and", "for", "is", "will", "be",
    "that", "this", "at", "as", "with", "do", "does",
];

/// Suffix-stripping stemmer in the Porter family: plural/gerund/past-tense
/// endings with a vowel-group guard against over-stripping short stems.
#[must_use]
pub fn stem(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    let has_vowel_before = |s: &str, cut: usize| -> bool {
        s[..cut].chars().any(|c| "aeiou".contains(c))
    };

    if let Some(stripped) = lower.strip_suffix("ies") {
        if stripped.len() >= 2 {
            return format!("{stripped}y");
        }
    }
    if let Some(stripped) = lower.strip_suffix("ing") {
        if stripped.len() >= 3 && has_vowel_before(&lower, stripped.len()) {
            return stripped.to_string();
        }
    }
    if let Some(stripped) = lower.strip_suffix("ed") {
        if stripped.len() >= 3 && has_vowel_before(&lower, stripped.len()) {
            return stripped.to_string();
        }
    }
    if let Some(stripped) = lower.strip_suffix("es") {
        if stripped.len() >= 3 {
            return stripped.to_string();
        }
    }
    if let Some(stripped) = lower.strip_suffix('s') {
        if stripped.len() >= 3 && !lower.ends_with("ss") {
            return stripped.to_string();
        }
    }
    lower
}

/// Full pipeline: lower-case, strip punctuation, fold synonyms, drop
/// stopwords, stem. Returns the ordered token sequence (duplicates kept,
/// since TF-IDF needs term frequency).
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let synonyms = synonym_table();
    text.to_ascii_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .filter(|w| !STOPWORDS.contains(w))
        .map(|w| {
            let folded = synonyms.get(w).copied().unwrap_or(w);
            stem(folded)
        })
        .collect()
}

/// Jaccard similarity of the token sets (duplicates collapsed).
#[must_use]
pub fn jaccard(a: &[String], b: &[String]) -> f64 {
    let set_a: HashSet<&String> = a.iter().collect();
    let set_b: HashSet<&String> = b.iter().collect();
    if set_a.is_empty() && set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn term_frequencies(tokens: &[String]) -> HashMap<&str, f64> {
    let mut counts: HashMap<&str, f64> = HashMap::new();
    for t in tokens {
        *counts.entry(t.as_str()).or_insert(0.0) += 1.0;
    }
    let norm = counts.values().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in counts.values_mut() {
            *v /= norm;
        }
    }
    counts
}

/// Cosine similarity of the two token sequences' (unweighted) term-frequency
/// vectors. There is no corpus here for true IDF, so this reduces to a
/// normalized TF cosine over the shared vocabulary of the pair — adequate
/// for pairwise question matching where there's no broader corpus to derive
/// document frequencies from.
#[must_use]
pub fn cosine_tf(a: &[String], b: &[String]) -> f64 {
    let freq_a = term_frequencies(a);
    let freq_b = term_frequencies(b);
    freq_a
        .iter()
        .map(|(term, weight)| weight * freq_b.get(term).copied().unwrap_or(0.0))
        .sum()
}

/// `0.4 * Jaccard + 0.6 * CosineTF` over the tokenized pair.
#[must_use]
pub fn semantic_similarity(a: &[String], b: &[String]) -> f64 {
    0.4 * jaccard(a, b) + 0.6 * cosine_tf(a, b)
}
