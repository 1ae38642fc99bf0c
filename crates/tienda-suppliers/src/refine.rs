//! Search-phrase refinement for supplier search indexes.
//!
//! Supplier backends degrade sharply on long natural-language queries: one
//! to three concrete nouns outperform full sentences. The refiner
//! translates the storefront-language phrase, strips stop words and filler
//! adjectives, and caps the result at three keywords.

use crate::translate::{translate_or_original, Translator};

/// Words that carry no signal for a product search index: prepositions,
/// generic marketing adjectives, and superlatives.
const STOP_WORDS: &[&str] = &[
    "for", "with", "and", "the", "a", "an", "in", "on", "at", "by", "from", "to", "of", "is",
    "it", "that", "this", "was", "as", "are", "be", "or", "if", "but", "waterproof", "portable",
    "professional", "original", "official", "store", "best", "top", "new", "latest", "hot",
    "style", "good", "quality",
];

/// Maximum keywords kept; more tends to produce zero or vague results.
const MAX_KEYWORDS: usize = 3;

/// Turns a storefront-language search phrase into a compact keyword query
/// in the supplier's language.
///
/// Steps: translate (best-effort), lowercase, strip punctuation, tokenize,
/// drop stop words and tokens of length <= 3; when that filters everything
/// away, fall back to the unfiltered tokens of length > 2; keep the first
/// three tokens.
pub async fn refine_query(translator: &dyn Translator, phrase: &str, target_lang: &str) -> String {
    let translated = translate_or_original(translator, phrase, target_lang).await;
    let refined = refine_keywords(&translated);
    tracing::debug!(original = phrase, translated, refined, "refined supplier query");
    refined
}

/// Pure keyword-filtering step, separated from translation for testability.
#[must_use]
pub fn refine_keywords(phrase: &str) -> String {
    let lowered = phrase.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    let keywords: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| t.len() > 3 && !STOP_WORDS.contains(t))
        .collect();

    let selected = if keywords.is_empty() {
        tokens.into_iter().filter(|t| t.len() > 2).collect::<Vec<_>>()
    } else {
        keywords
    };

    selected
        .into_iter()
        .take(MAX_KEYWORDS)
        .collect::<Vec<_>>()
        .join(" ")
}
