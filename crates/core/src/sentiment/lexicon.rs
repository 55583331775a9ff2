//! Word-level polarity scorer for short headlines.

const NEGATORS: &[&str] = &["not", "no", "never", "without", "isn't", "doesn't", "don't", "won't"];

/// Polarity in `[-1, 1]` per lower-cased word.
const LEXICON: &[(&str, f64)] = &[
    ("bearish", -0.6),
    ("beat", 0.3),
    ("beating", 0.3),
    ("beats", 0.3),
    ("bullish", 0.6),
    ("concern", -0.3),
    ("concerns", -0.3),
    ("crash", -0.7),
    ("decline", -0.4),
    ("declines", -0.4),
    ("downgrade", -0.5),
    ("fears", -0.4),
    ("gain", 0.4),
    ("gains", 0.4),
    ("good", 0.7),
    ("growth", 0.2),
    ("lawsuit", -0.5),
    ("loss", -0.5),
    ("losses", -0.5),
    ("miss", -0.4),
    ("misses", -0.4),
    ("new", 0.14),
    ("plunge", -0.6),
    ("poor", -0.4),
    ("record", 0.3),
    ("risk", -0.2),
    ("strong", 0.43),
    ("surge", 0.5),
    ("upgrade", 0.5),
    ("upgrades", 0.5),
    ("volatility", -0.3),
    ("weak", -0.38),
];

fn lookup(word: &str) -> Option<f64> {
    LEXICON
        .binary_search_by(|(w, _)| w.cmp(&word))
        .ok()
        .map(|i| LEXICON[i].1)
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

/// Mean polarity of the words found in the lexicon; a negator directly before a
/// word flips it and halves its weight. Text with no known words scores 0.
pub fn polarity(text: &str) -> f64 {
    let mut sum = 0.0;
    let mut hits = 0usize;
    let mut negate = false;

    for token in tokens(text) {
        if NEGATORS.contains(&token.as_str()) {
            negate = true;
            continue;
        }
        if let Some(mut p) = lookup(&token) {
            if negate {
                p *= -0.5;
            }
            sum += p;
            hits += 1;
        }
        negate = false;
    }

    if hits == 0 {
        0.0
    } else {
        sum / hits as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexicon_is_sorted_for_binary_search() {
        assert!(LEXICON.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn averages_known_words() {
        assert!((polarity("Strong growth") - (0.43 + 0.2) / 2.0).abs() < 1e-12);
        assert_eq!(polarity("Quarterly report published"), 0.0);
    }

    #[test]
    fn negation_flips_and_halves() {
        assert!((polarity("not bullish") + 0.3).abs() < 1e-12);
        // Negation only reaches the next word.
        assert!((polarity("not quite bullish") - 0.6).abs() < 1e-12);
    }

    #[test]
    fn ignores_case_and_punctuation() {
        assert_eq!(polarity("BULLISH!"), 0.6);
        assert_eq!(polarity("earnings, beating expectations"), 0.3);
    }
}
