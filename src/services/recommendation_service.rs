use std::collections::BTreeSet;

use tracing::debug;

use crate::data::catalog::CatalogStore;
use crate::error::AppError;
use crate::models::cocktail::Cocktail;
use crate::models::recommendation::{NameMatch, Recommendation};
use crate::text;

pub const KEYWORD_WEIGHT: f64 = 0.7;
pub const TEXT_SIMILARITY_WEIGHT: f64 = 0.3;
/// Candidates must score strictly above this to be recommended.
pub const RELEVANCE_THRESHOLD: f64 = 0.1;
pub const DEFAULT_NAME_SIMILARITY_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub keyword: f64,
    pub text_similarity: f64,
    pub relevance_threshold: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            keyword: KEYWORD_WEIGHT,
            text_similarity: TEXT_SIMILARITY_WEIGHT,
            relevance_threshold: RELEVANCE_THRESHOLD,
        }
    }
}

/// Share of the query's distinct tokens that appear in the candidate.
///
/// The denominator is the query size: extra candidate ingredients cost
/// nothing, unmatched query words do. An empty query scores zero.
pub fn keyword_score(query: &BTreeSet<String>, candidate: &BTreeSet<String>) -> f64 {
    let common = query.intersection(candidate).count();
    common as f64 / query.len().max(1) as f64
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |text| text.trim().is_empty())
}

/// Ranks catalog entries against free-text taste or ingredient descriptions.
///
/// The catalog is read once per call, so results reflect whatever the store
/// holds at that moment.
pub struct RecommendationEngine<C> {
    catalog: C,
    weights: ScoringWeights,
}

impl<C: CatalogStore> RecommendationEngine<C> {
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            weights: ScoringWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn weights(&self) -> ScoringWeights {
        self.weights
    }

    pub fn recommend(&self, query: &str, top_n: usize) -> Result<Vec<Recommendation>, AppError> {
        if top_n == 0 {
            return Ok(Vec::new());
        }

        let cocktails = self.catalog.list_all_cocktails()?;
        if cocktails.is_empty() {
            return Ok(Vec::new());
        }

        let normalized_query = text::normalize(query);
        let query_tokens = text::token_set(&normalized_query);

        let mut scored: Vec<(f64, &Cocktail, BTreeSet<String>)> = Vec::new();
        let mut skipped = 0usize;

        for cocktail in &cocktails {
            if is_blank(Some(&cocktail.name)) || is_blank(cocktail.ingredients.as_deref()) {
                skipped += 1;
                continue;
            }

            let normalized_ingredients = text::normalize(cocktail.ingredients_text());
            let candidate_tokens = text::token_set(&normalized_ingredients);

            let keyword = keyword_score(&query_tokens, &candidate_tokens);
            let similarity = text::ratio(&normalized_query, &normalized_ingredients);
            let score =
                self.weights.keyword * keyword + self.weights.text_similarity * similarity;

            if score > self.weights.relevance_threshold {
                let matching = query_tokens
                    .intersection(&candidate_tokens)
                    .cloned()
                    .collect();
                scored.push((score, cocktail, matching));
            }
        }

        // Stable: equal scores keep catalog order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(top_n);

        debug!(
            query = %normalized_query,
            catalog = cocktails.len(),
            skipped,
            returned = scored.len(),
            "recommendation ranked"
        );

        Ok(scored
            .into_iter()
            .map(|(score, cocktail, matching_keywords)| Recommendation {
                cocktail: cocktail.info(),
                similarity_score: score,
                matching_keywords,
            })
            .collect())
    }

    /// Case-insensitive exact match first, then the first substring match in
    /// catalog order. A blank name is a substring of every name, so it yields
    /// the first record.
    pub fn find_by_exact_or_partial_name(&self, name: &str) -> Result<Option<Cocktail>, AppError> {
        let needle = name.trim().to_lowercase();
        let cocktails = self.catalog.list_all_cocktails()?;
        let lowered: Vec<String> = cocktails.iter().map(|c| c.name.to_lowercase()).collect();

        let position = lowered
            .iter()
            .position(|candidate| *candidate == needle)
            .or_else(|| lowered.iter().position(|candidate| candidate.contains(&needle)));

        Ok(position.map(|idx| cocktails[idx].clone()))
    }

    pub fn find_by_name_fuzzy(&self, query: &str, threshold: f64) -> Result<Vec<NameMatch>, AppError> {
        let needle = query.trim().to_lowercase();
        let cocktails = self.catalog.list_all_cocktails()?;

        let mut matches: Vec<NameMatch> = cocktails
            .iter()
            .filter(|cocktail| !cocktail.name.trim().is_empty())
            .filter_map(|cocktail| {
                let similarity = text::ratio(&needle, &cocktail.name.to_lowercase());
                (similarity >= threshold).then(|| NameMatch {
                    cocktail: cocktail.info(),
                    name_similarity: similarity,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.name_similarity.total_cmp(&a.name_similarity));
        Ok(matches)
    }
}
