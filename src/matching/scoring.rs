//! The four sub-scores and `match_reason` composition for a candidate pair.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::domain::{Market, MatchScores};

use super::text::{self, semantic_similarity};

const DANGER_TERMS: &[&str] = &["not", "except", "only", "void", "cancel", "must", "exclude"];

const CATEGORY_GROUPS: &[&[&str]] = &[
    &["politics", "elections", "government"],
    &["crypto", "cryptocurrency", "digital-assets"],
    &["sports", "nba", "nfl", "soccer"],
    &["macro", "economy", "economics", "finance"],
    &["entertainment", "pop-culture", "awards"],
];

fn category_group(category: &str) -> Option<usize> {
    let lower = category.to_ascii_lowercase();
    CATEGORY_GROUPS
        .iter()
        .position(|group| group.contains(&lower.as_str()))
}

/// `1.0` exact match, `0.8` same broad cluster, `0.5` unknown/missing,
/// `0.3` otherwise.
#[must_use]
pub fn category_score(a: Option<&str>, b: Option<&str>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => 1.0,
        (Some(a), Some(b)) => match (category_group(a), category_group(b)) {
            (Some(ga), Some(gb)) if ga == gb => 0.8,
            (Some(_), Some(_)) => 0.3,
            _ => 0.5,
        },
        (None, None) => 0.5,
        _ => 0.5,
    }
}

/// Literal date artifacts pulled from free text: four-digit years, month
/// names, `m/d/y` patterns, quarter tags, and qualifiers (`by`, `before`,
/// `after`) that precede one.
#[must_use]
pub fn extract_date_artifacts(text: &str) -> HashSet<String> {
    const MONTHS: &[&str] = &[
        "january", "february", "march", "april", "may", "june", "july", "august", "september",
        "october", "november", "december", "jan", "feb", "mar", "apr", "jun", "jul", "aug",
        "sep", "oct", "nov", "dec",
    ];
    const QUALIFIERS: &[&str] = &["by", "before", "after"];

    let mut found = HashSet::new();
    let lower = text.to_ascii_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| c.is_whitespace())
        .collect();

    for (idx, raw) in words.iter().enumerate() {
        let word = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '/' && c != '-');
        if word.is_empty() {
            continue;
        }
        if word.len() == 4 && word.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(year) = word.parse::<u32>() {
                if (1900..=2100).contains(&year) {
                    found.insert(format!("year:{word}"));
                }
            }
        }
        if MONTHS.contains(&word) {
            found.insert(format!("month:{word}"));
        }
        if word.contains('/') && word.chars().any(|c| c.is_ascii_digit()) {
            found.insert(format!("mdy:{word}"));
        }
        if word.starts_with('q') && word.len() == 2 && word.chars().nth(1).is_some_and(|c| c.is_ascii_digit()) {
            found.insert(format!("quarter:{word}"));
        }
        if QUALIFIERS.contains(&word) {
            if let Some(next) = words.get(idx + 1) {
                found.insert(format!("qualifier:{word}-{next}"));
            }
        }
    }
    found
}

/// `|intersection|/max(|D1|,|D2|)` with the spec's edge-case table for
/// missing dates on one or both sides.
#[must_use]
pub fn date_score(a: &str, b: &str) -> f64 {
    let dates_a = extract_date_artifacts(a);
    let dates_b = extract_date_artifacts(b);
    match (dates_a.is_empty(), dates_b.is_empty()) {
        (true, true) => 0.5,
        (false, false) => {
            let intersection = dates_a.intersection(&dates_b).count();
            let denom = dates_a.len().max(dates_b.len());
            if intersection == 0 {
                0.1
            } else {
                intersection as f64 / denom as f64
            }
        }
        _ => 0.3,
    }
}

/// Result of scoring the resolution-rules text, carrying the optional
/// warning the matcher attaches to the `MarketMatch`.
pub struct ResolutionScore {
    pub score: f64,
    pub warning: Option<String>,
}

/// `max(0.2, overlap_ratio)` over the stemmed resolution-rules tokens, with
/// danger-term-count mismatch and missing-rules warnings.
#[must_use]
pub fn resolution_score(a: Option<&str>, b: Option<&str>) -> ResolutionScore {
    match (a, b) {
        (Some(a), Some(b)) => {
            let tokens_a = text::tokenize(a);
            let tokens_b = text::tokenize(b);
            let set_a: HashSet<&String> = tokens_a.iter().collect();
            let set_b: HashSet<&String> = tokens_b.iter().collect();
            let intersection = set_a.intersection(&set_b).count();
            let denom = set_a.len().max(set_b.len()).max(1);
            let overlap_ratio = intersection as f64 / denom as f64;
            let score = overlap_ratio.max(0.2);

            let danger_a = count_danger_terms(a);
            let danger_b = count_danger_terms(b);
            let warning = (danger_a != danger_b).then(|| {
                format!(
                    "resolution rules mention differing counts of exclusion/negation terms ({danger_a} vs {danger_b})"
                )
            });
            ResolutionScore { score, warning }
        }
        _ => ResolutionScore {
            score: 0.4,
            warning: Some("one side is missing resolution rules".to_string()),
        },
    }
}

fn count_danger_terms(text: &str) -> usize {
    let lower = text.to_ascii_lowercase();
    DANGER_TERMS
        .iter()
        .map(|term| lower.matches(term).count())
        .sum()
}

/// A fully-scored candidate pair, prior to the hard prefilter/threshold gate
/// applied by the matcher loop.
pub struct Candidate {
    pub scores: MatchScores,
    pub matched_terms: Vec<String>,
    pub resolution_warning: Option<String>,
    pub match_reason: String,
}

/// `true` when both markets have end dates more than 30 days apart — the
/// hard prefilter skipped before any scoring is attempted.
#[must_use]
pub fn fails_hard_prefilter(a: &Market, b: &Market) -> bool {
    match (a.end_date(), b.end_date()) {
        (Some(ea), Some(eb)) => (ea - eb).num_days().abs() > 30,
        _ => false,
    }
}

/// Score a candidate pair and build its human-readable reason string.
#[must_use]
pub fn score_pair(a: &Market, b: &Market) -> Candidate {
    let tokens_a = text::tokenize(a.question());
    let tokens_b = text::tokenize(b.question());
    let semantic = semantic_similarity(&tokens_a, &tokens_b);
    let date = date_score(a.question(), b.question());
    let category = category_score(a.category(), b.category());
    let resolution = resolution_score(a.resolution_rules(), b.resolution_rules());

    let scores = MatchScores::combine(semantic, date, category, resolution.score);

    let set_a: HashSet<&String> = tokens_a.iter().collect();
    let matched_terms: Vec<String> = set_a
        .intersection(&tokens_b.iter().collect())
        .take(5)
        .map(|s| s.to_string())
        .collect();

    let match_reason = compose_reason(semantic, date, category, resolution.score, &matched_terms);

    Candidate {
        scores,
        matched_terms,
        resolution_warning: resolution.warning,
        match_reason,
    }
}

fn band(value: f64) -> &'static str {
    if value >= 0.8 {
        "strong"
    } else if value >= 0.5 {
        "moderate"
    } else {
        "weak"
    }
}

fn compose_reason(semantic: f64, date: f64, category: f64, resolution: f64, terms: &[String]) -> String {
    let mut clauses = vec![
        format!("{} semantic overlap", band(semantic)),
        format!("{} date agreement", band(date)),
        format!("{} category match", band(category)),
        format!("{} resolution-rule overlap", band(resolution)),
    ];
    if !terms.is_empty() {
        clauses.push(format!("shared terms: {}", terms.join(", ")));
    }
    clauses.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarketId, Venue};
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn market(question: &str, end: Option<DateTime<Utc>>) -> Market {
        let mut m = Market::new(
            MarketId::new(Venue::Polymarket, "x"),
            question,
            vec!["Yes".into(), "No".into()],
            Decimal::new(1, 2),
            Decimal::ONE,
            Decimal::ZERO,
        );
        if let Some(end) = end {
            m.set_end_date(end);
        }
        m
    }

    #[test]
    fn category_score_exact_beats_cluster() {
        assert_eq!(category_score(Some("politics"), Some("politics")), 1.0);
        assert_eq!(category_score(Some("politics"), Some("elections")), 0.8);
        assert_eq!(category_score(Some("crypto"), Some("sports")), 0.3);
        assert_eq!(category_score(None, None), 0.5);
    }

    #[test]
    fn date_score_handles_missing_sides() {
        assert_eq!(date_score("no dates here", "also none"), 0.5);
        assert_eq!(date_score("by 2026", "also none"), 0.3);
        assert_eq!(date_score("by 2026", "by 2030"), 0.1);
        assert_eq!(date_score("in 2026", "in 2026"), 1.0);
    }

    #[test]
    fn resolution_score_floors_at_point_two() {
        let r = resolution_score(Some("completely unrelated text here"), Some("something else entirely"));
        assert!(r.score >= 0.2);
    }

    #[test]
    fn resolution_score_warns_on_missing_side() {
        let r = resolution_score(None, Some("resolves yes if true"));
        assert_eq!(r.score, 0.4);
        assert!(r.warning.is_some());
    }

    #[test]
    fn hard_prefilter_skips_distant_end_dates() {
        let now = Utc::now();
        let a = market("a", Some(now));
        let b = market("b", Some(now + Duration::days(45)));
        assert!(fails_hard_prefilter(&a, &b));

        let c = market("c", Some(now + Duration::days(10)));
        assert!(!fails_hard_prefilter(&a, &c));
    }

    #[test]
    fn score_pair_produces_overall_in_range() {
        let a = market("Will Donald Trump win the 2028 election?", None);
        let b = market("Will Trump win the presidential election in 2028?", None);
        let candidate = score_pair(&a, &b);
        assert!(candidate.scores.overall >= 0.0 && candidate.scores.overall <= 1.0);
        assert!(!candidate.match_reason.is_empty());
    }
}
