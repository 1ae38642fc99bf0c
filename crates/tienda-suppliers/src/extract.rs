//! Supplier product-identifier extraction from free-text input.
//!
//! Admin import boxes receive anything: a bare numeric id, a pasted
//! marketplace or affiliate URL, or a plain search phrase. The cascade
//! below runs strict patterns before loose ones; the ordering is
//! load-bearing, since a loose pattern running first would misclassify
//! search phrases (or phone numbers) as identifiers.

use std::sync::LazyLock;

use regex::Regex;

/// `...-p-<digits>.html` pattern used by dropshipping/affiliate links,
/// e.g. `...-p-1999356345777045505.html`.
static P_HTML: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"p-(\d{10,})\.html").expect("static regex"));

/// Maximal digit runs; a run is standalone by construction (it cannot be
/// adjacent to further digits).
static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("static regex"));

/// Minimum digits for anything we are willing to call an identifier.
const MIN_ID_DIGITS: usize = 10;
/// Minimum digits for the loose free-text fallback. Stricter than
/// [`MIN_ID_DIGITS`] to avoid swallowing phone numbers and the like.
const MIN_STANDALONE_DIGITS: usize = 18;

/// Extracts a supplier product identifier from free-text input.
///
/// Priority order, first match wins:
/// 1. the whole trimmed input is numeric with >= 10 digits;
/// 2. the input is a URL carrying the id in a query parameter or as a
///    `<digits>.html` / bare-digits path segment (>= 10 digits);
/// 3. a `-p-<digits>.html` path pattern (>= 10 digits);
/// 4. a standalone run of >= 18 digits anywhere in the text;
/// 5. otherwise `None`; the caller treats the input as a search phrase.
#[must_use]
pub fn extract_external_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    // 1. Bare numeric identifier.
    if trimmed.len() >= MIN_ID_DIGITS && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Some(trimmed.to_owned());
    }

    // 2. Marketplace URL: query parameter or path segment.
    if let Ok(url) = reqwest::Url::parse(trimmed) {
        for (_, value) in url.query_pairs() {
            if is_numeric_id(&value) {
                return Some(value.into_owned());
            }
        }
        if let Some(segments) = url.path_segments() {
            for segment in segments {
                let candidate = segment.strip_suffix(".html").unwrap_or(segment);
                if is_numeric_id(candidate) {
                    return Some(candidate.to_owned());
                }
            }
        }
    }

    // 3. Affiliate-style `-p-<digits>.html` path.
    if let Some(captures) = P_HTML.captures(trimmed) {
        return Some(captures[1].to_owned());
    }

    // 4. Long standalone digit run in free text.
    DIGIT_RUN
        .find_iter(trimmed)
        .find(|m| m.as_str().len() >= MIN_STANDALONE_DIGITS)
        .map(|m| m.as_str().to_owned())
}

fn is_numeric_id(candidate: &str) -> bool {
    candidate.len() >= MIN_ID_DIGITS && candidate.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_numeric_id_is_accepted() {
        assert_eq!(
            extract_external_id("  1999356345777045505 ").as_deref(),
            Some("1999356345777045505")
        );
    }

    #[test]
    fn short_numbers_are_not_ids() {
        assert!(extract_external_id("123456789").is_none());
    }

    #[test]
    fn url_query_parameter_wins() {
        assert_eq!(
            extract_external_id(
                "https://cjdropshipping.com/product-detail.html?id=1999356345777045505"
            )
            .as_deref(),
            Some("1999356345777045505")
        );
    }

    #[test]
    fn url_path_segment_with_html_suffix() {
        assert_eq!(
            extract_external_id("https://x.com/item/1005010179828716.html").as_deref(),
            Some("1005010179828716")
        );
    }

    #[test]
    fn affiliate_p_html_pattern() {
        assert_eq!(
            extract_external_id(
                "check this out some-gadget-p-1999356345777045505.html via my link"
            )
            .as_deref(),
            Some("1999356345777045505")
        );
    }

    #[test]
    fn long_standalone_digit_run_in_free_text() {
        assert_eq!(
            extract_external_id("pid 199935634577704550512 looks interesting").as_deref(),
            Some("199935634577704550512")
        );
    }

    #[test]
    fn phone_number_length_runs_are_ignored_in_free_text() {
        // 11 digits embedded in prose: too short for the standalone rule.
        assert!(extract_external_id("call me at 56912345678 tomorrow").is_none());
    }

    #[test]
    fn search_phrase_is_not_an_identifier() {
        assert!(extract_external_id("nice blue watch").is_none());
        assert!(extract_external_id("reloj inteligente deportivo").is_none());
    }

    #[test]
    fn empty_input_is_not_an_identifier() {
        assert!(extract_external_id("   ").is_none());
    }

    #[test]
    fn url_without_id_is_not_an_identifier() {
        assert!(extract_external_id("https://cjdropshipping.com/categories/gadgets").is_none());
    }
}
