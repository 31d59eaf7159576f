// src/matcher/fuzz.rs
//
// Weighted string similarity on a 0-100 scale. Combines the plain indel ratio with
// token-sort, token-set and partial variants so that reworded or re-punctuated
// question headers still land on the right column.

use rapidfuzz::fuzz;
use std::collections::BTreeSet;

const UNBASE_SCALE: f64 = 0.95;
const PARTIAL_SCALE: f64 = 0.90;
const LONG_PARTIAL_SCALE: f64 = 0.60;

/// Lower-case, replace everything that is not a letter or digit with a space, trim.
pub fn normalize(s: &str) -> String {
    s.chars()
        .flat_map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().collect::<Vec<_>>()
            } else {
                vec![' ']
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Indel similarity scaled to 0-100, rounded. Empty input scores 0.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    (fuzz::ratio(a.chars(), b.chars()) * 100.0).round()
}

/// Best ratio of the shorter string against every same-length window of the longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short_len = short.chars().count();
    let long_chars: Vec<char> = long.chars().collect();
    if short_len == long_chars.len() {
        return ratio(short, long);
    }

    let mut best = 0.0_f64;
    for window in long_chars.windows(short_len) {
        let score = fuzz::ratio(short.chars(), window.iter().copied()) * 100.0;
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best.round()
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn token_sort(a: &str, b: &str, partial: bool) -> f64 {
    let (a, b) = (sorted_tokens(a), sorted_tokens(b));
    if partial {
        partial_ratio(&a, &b)
    } else {
        ratio(&a, &b)
    }
}

fn token_set(a: &str, b: &str, partial: bool) -> f64 {
    let ta: BTreeSet<&str> = a.split_whitespace().collect();
    let tb: BTreeSet<&str> = b.split_whitespace().collect();
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let join = |set: Vec<&str>| set.join(" ");
    let sect = join(ta.intersection(&tb).copied().collect());
    let only_a = join(ta.difference(&tb).copied().collect());
    let only_b = join(tb.difference(&ta).copied().collect());

    let combined_a = format!("{} {}", sect, only_a).trim().to_string();
    let combined_b = format!("{} {}", sect, only_b).trim().to_string();

    let score = |x: &str, y: &str| {
        if partial {
            partial_ratio(x, y)
        } else {
            ratio(x, y)
        }
    };
    score(&sect, &combined_a)
        .max(score(&sect, &combined_b))
        .max(score(&combined_a, &combined_b))
}

/// Weighted ratio of two raw strings (normalized internally), 0-100.
pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    let (a, b) = (normalize(a), normalize(b));
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let base = ratio(&a, &b);
    let (len_a, len_b) = (a.chars().count() as f64, b.chars().count() as f64);
    let len_ratio = len_a.max(len_b) / len_a.min(len_b);

    if len_ratio < 1.5 {
        let sorted = token_sort(&a, &b, false) * UNBASE_SCALE;
        let set = token_set(&a, &b, false) * UNBASE_SCALE;
        return base.max(sorted).max(set).round();
    }

    let partial_scale = if len_ratio > 8.0 {
        LONG_PARTIAL_SCALE
    } else {
        PARTIAL_SCALE
    };
    let partial = partial_ratio(&a, &b) * partial_scale;
    let sorted = token_sort(&a, &b, true) * UNBASE_SCALE * partial_scale;
    let set = token_set(&a, &b, true) * UNBASE_SCALE * partial_scale;
    base.max(partial).max(sorted).max(set).round()
}

/// Best-scoring choice for `query`; ties keep the earliest choice.
pub fn extract_one<S: AsRef<str>>(query: &str, choices: &[S]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, choice) in choices.iter().enumerate() {
        let score = weighted_ratio(query, choice.as_ref());
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((idx, score));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization() {
        assert_eq!(
            normalize("  How mature is your CI/CD pipeline? "),
            "how mature is your ci cd pipeline"
        );
        assert_eq!(normalize("???"), "");
    }

    #[test]
    fn ratios_use_the_percent_scale() {
        assert_eq!(ratio("abc", "abd"), 67.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(partial_ratio("abd", "xxabcxx"), 67.0);
    }

    #[test]
    fn identical_after_normalization_scores_100() {
        assert_eq!(weighted_ratio("Deploy Frequency?", "deploy frequency"), 100.0);
    }

    #[test]
    fn reworded_question_scores_high() {
        let score = weighted_ratio(
            "How mature is your CI pipeline?",
            "How mature is your CI/CD pipeline?",
        );
        assert_eq!(score, 95.0);
    }

    #[test]
    fn reordered_tokens_are_tolerated() {
        let score = weighted_ratio("pipeline maturity of CI", "CI pipeline maturity of");
        assert!(score >= 95.0, "score was {}", score);
    }

    #[test]
    fn unrelated_strings_score_low() {
        assert!(weighted_ratio("How mature is your CI pipeline?", "Email") < 60.0);
        assert_eq!(weighted_ratio("", "Email"), 0.0);
        assert_eq!(weighted_ratio("!!", "Email"), 0.0);
    }

    #[test]
    fn partial_finds_embedded_text() {
        assert_eq!(partial_ratio("ci cd", "how mature is your ci cd pipeline"), 100.0);
    }

    #[test]
    fn extract_one_prefers_first_of_equal_scores() {
        let choices = ["Deploy frequency", "deploy frequency", "Email"];
        assert_eq!(extract_one("deploy frequency", &choices), Some((0, 100.0)));
        let none: [&str; 0] = [];
        assert_eq!(extract_one("anything", &none), None);
    }
}
