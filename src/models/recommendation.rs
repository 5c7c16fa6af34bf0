use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::cocktail::CocktailInfo;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub cocktail: CocktailInfo,
    pub similarity_score: f64,
    pub matching_keywords: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameMatch {
    #[serde(flatten)]
    pub cocktail: CocktailInfo,
    pub name_similarity: f64,
}
