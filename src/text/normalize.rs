use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static QUANTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\d+\.?\d*\s*(ounces?|oz|milliliters?|millilitres?|ml|dashes|dash|drops?|cups?|teaspoons?|tsp|tablespoons?|tbsp)",
    )
    .expect("quantity pattern is valid")
});

static PUNCTUATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,\n\r*\-+()]").expect("punctuation pattern is valid"));

static WHITESPACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Canonical form of an ingredient list or a taste query: lower-cased, with
/// quantity/unit fragments and list punctuation stripped and whitespace collapsed.
pub fn normalize(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let lowered = input.to_lowercase();
    let without_quantities = QUANTITY_PATTERN.replace_all(&lowered, "");
    let without_punctuation = PUNCTUATION_PATTERN.replace_all(&without_quantities, " ");
    WHITESPACE_PATTERN
        .replace_all(&without_punctuation, " ")
        .trim()
        .to_string()
}

/// Distinct whitespace-delimited words of an already normalized string.
pub fn token_set(normalized: &str) -> BTreeSet<String> {
    normalized.split_whitespace().map(str::to_string).collect()
}

pub fn tokens(input: &str) -> BTreeSet<String> {
    token_set(&normalize(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_quantities_and_punctuation() {
        assert_eq!(
            normalize("Gin (2oz), Lime Juice (1oz)"),
            "gin lime juice"
        );
        assert_eq!(
            normalize("Bourbon 2 oz\nAngostura Bitters - 2 dashes\n* Sugar (1 tsp)"),
            "bourbon angostura bitters sugar"
        );
    }

    #[test]
    fn recognizes_full_unit_words_and_decimals() {
        assert_eq!(normalize("1.5 Ounces Rye + 30 ml Vermouth"), "rye vermouth");
        assert_eq!(normalize("2 tablespoons honey, 1 teaspoon salt"), "honey salt");
        assert_eq!(normalize("3 drops saline, 0.5 cups ice"), "saline ice");
    }

    #[test]
    fn keeps_bare_numbers_without_units() {
        assert_eq!(normalize("2 Lime Wedges"), "2 lime wedges");
    }

    #[test]
    fn empty_and_blank_inputs_normalize_to_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  ,\n () "), "");
        assert!(tokens("").is_empty());
    }

    #[test]
    fn tokens_are_distinct() {
        let set = tokens("Lime, lime juice, LIME");
        assert_eq!(set.len(), 2);
        assert!(set.contains("lime"));
        assert!(set.contains("juice"));
    }
}
