use crate::error::AppError;
use crate::models::cocktail::CocktailInfo;
use crate::models::recommendation::{NameMatch, Recommendation};
use crate::services::recommendation_service::RecommendationEngine;
use crate::state::AppState;

/// Negative counts ask for nothing rather than failing.
pub fn recommend(
    state: &AppState,
    query: &str,
    top_n: i64,
) -> Result<Vec<Recommendation>, AppError> {
    let conn = state.conn();
    let top_n = usize::try_from(top_n).unwrap_or(0);
    RecommendationEngine::new(&*conn).recommend(query, top_n)
}

pub fn lookup(state: &AppState, name: &str) -> Result<Option<CocktailInfo>, AppError> {
    let conn = state.conn();
    Ok(RecommendationEngine::new(&*conn)
        .find_by_exact_or_partial_name(name)?
        .map(|cocktail| cocktail.info()))
}

pub fn fuzzy(state: &AppState, query: &str, threshold: f64) -> Result<Vec<NameMatch>, AppError> {
    let conn = state.conn();
    RecommendationEngine::new(&*conn).find_by_name_fuzzy(query, threshold)
}
