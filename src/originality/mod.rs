use std::collections::{HashMap, HashSet};

use serde::Serialize;

pub const LEXICAL_WEIGHT: f64 = 0.3;
pub const PERPLEXITY_WEIGHT: f64 = 0.3;
pub const CHAR_DIVERSITY_WEIGHT: f64 = 0.2;
pub const STRUCTURAL_VARIETY_WEIGHT: f64 = 0.2;

/// Composite scores above this are accepted as human-like; everything else
/// is routed through the rewrite pipeline.
pub const HUMAN_LIKE_THRESHOLD: f64 = 0.6;

/// Stand-in for a real language-model perplexity signal. A fixed neutral
/// value keeps the composite deterministic until a model is wired in.
const NEUTRAL_PERPLEXITY: f64 = 0.5;

#[derive(Debug, Clone, Serialize)]
pub struct OriginalityReport {
    pub lexical: f64,
    pub perplexity: f64,
    pub char_diversity: f64,
    pub structural_variety: f64,
    pub composite: f64,
    pub human_like: bool,
}

/// Scores a block of generated text on four lightweight statistics, each
/// normalized to roughly [0,1]. Pure function; empty and near-empty input
/// degrade to zero sub-scores rather than dividing by zero.
pub fn score_originality(text: &str) -> OriginalityReport {
    let lexical = lexical_weight_score(text);
    let perplexity = NEUTRAL_PERPLEXITY;
    let char_diversity = char_diversity_score(text);
    let structural_variety = structural_variety_score(text);

    let composite = LEXICAL_WEIGHT * lexical
        + PERPLEXITY_WEIGHT * perplexity
        + CHAR_DIVERSITY_WEIGHT * char_diversity
        + STRUCTURAL_VARIETY_WEIGHT * structural_variety;

    OriginalityReport {
        lexical,
        perplexity,
        char_diversity,
        structural_variety,
        composite,
        human_like: composite > HUMAN_LIKE_THRESHOLD,
    }
}

/// Single-document TF-IDF averaged over the distinct words. With only one
/// document the IDF degenerates to a near-constant factor, so this mostly
/// reflects how the word-frequency mass is spread across the vocabulary.
fn lexical_weight_score(text: &str) -> f64 {
    let words: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect();
    if words.is_empty() {
        return 0.0;
    }

    let total = words.len() as f64;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in &words {
        *counts.entry(word.as_str()).or_insert(0) += 1;
    }

    let sum: f64 = counts
        .values()
        .map(|&count| {
            let tf = count as f64 / total;
            let idf = 1.0 + (total / count as f64).ln();
            tf * idf
        })
        .sum();

    (sum / counts.len() as f64).clamp(0.0, 1.0)
}

/// Ratio of distinct characters to total characters.
fn char_diversity_score(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let distinct: HashSet<char> = text.chars().collect();
    distinct.len() as f64 / total as f64
}

/// Ratio of distinct sentence lengths (in words) to total sentence count.
/// Text where every sentence has the same shape scores low.
fn structural_variety_score(text: &str) -> f64 {
    let lengths: Vec<usize> = text
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .map(|sentence| sentence.split_whitespace().count())
        .collect();
    if lengths.is_empty() {
        return 0.0;
    }
    let distinct: HashSet<usize> = lengths.iter().copied().collect();
    distinct.len() as f64 / lengths.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_scores_zero_without_panicking() {
        let report = score_originality("");
        assert_eq!(report.lexical, 0.0);
        assert_eq!(report.char_diversity, 0.0);
        assert_eq!(report.structural_variety, 0.0);
        // Only the neutral perplexity stand-in contributes.
        assert!((report.composite - PERPLEXITY_WEIGHT * 0.5).abs() < 1e-9);
        assert!(!report.human_like);
    }

    #[test]
    fn whitespace_and_punctuation_only_text_scores_like_empty() {
        let report = score_originality("  ... !!! ??? ");
        assert_eq!(report.lexical, 0.0);
        assert_eq!(report.structural_variety, 0.0);
        assert!(!report.human_like);
    }

    #[test]
    fn scoring_is_deterministic() {
        let text = "The quick brown fox jumps. It rests. Then it runs far away again!";
        let first = score_originality(text);
        let second = score_originality(text);
        assert_eq!(first.composite, second.composite);
        assert_eq!(first.human_like, second.human_like);
    }

    #[test]
    fn more_sentence_variety_never_lowers_the_composite() {
        // Same word multiset and character set, different sentence shapes.
        let uniform = "aa bb. aa bb. aa bb.";
        let varied = "aa. aa bb. aa bb bb.";

        let uniform_report = score_originality(uniform);
        let varied_report = score_originality(varied);

        assert_eq!(uniform_report.lexical, varied_report.lexical);
        assert!(varied_report.structural_variety > uniform_report.structural_variety);
        assert!(varied_report.composite > uniform_report.composite);
    }

    #[test]
    fn structural_variety_counts_distinct_lengths() {
        assert_eq!(structural_variety_score("one two. three four. five six."), 1.0 / 3.0);
        assert_eq!(structural_variety_score("one. two three. four five six."), 1.0);
    }

    #[test]
    fn single_distinct_word_maximizes_lexical_weight() {
        // tf = 1 and the degenerate idf = 1, so the average hits the clamp.
        assert_eq!(lexical_weight_score("hello"), 1.0);
        let mixed = lexical_weight_score("alpha beta alpha gamma");
        assert!(mixed > 0.0 && mixed < 1.0);
    }

    #[test]
    fn dense_short_text_clears_the_threshold() {
        let report = score_originality("hello");
        assert!(report.composite > HUMAN_LIKE_THRESHOLD);
        assert!(report.human_like);
    }

    #[test]
    fn repetitive_text_is_routed_to_rewrite() {
        let text = "spam spam spam spam. spam spam spam spam. spam spam spam spam.";
        let report = score_originality(text);
        assert!(report.composite <= HUMAN_LIKE_THRESHOLD);
        assert!(!report.human_like);
    }
}
