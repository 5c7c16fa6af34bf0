use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::models::order::OrderEntry;

use super::stats::{gini, kurtosis, mean, median, percentile, population_std, skewness};
use super::{share, top_n, AnalysisInput, Season};

const TOP_INGREDIENTS: usize = 10;
const TOP_SHARE_COUNT: usize = 5;
const SPECIALTY_SHARE: f64 = 0.4;
const SPECIALTIES_PER_SEASON: usize = 5;
const STRONG_SEASONALITY_INDEX: f64 = 0.3;
const STRONG_SEASONALITY_MIN_USAGE: u64 = 5;

/// Drinks-weighted usage per ingredient name.
fn ingredient_usage<'a>(
    input: &AnalysisInput,
    orders: impl IntoIterator<Item = &'a OrderEntry>,
) -> BTreeMap<String, u64> {
    let mut usage: BTreeMap<String, u64> = BTreeMap::new();
    for order in orders {
        for ingredient in input.order_ingredients(order) {
            *usage.entry(ingredient).or_default() += u64::from(order.quantity);
        }
    }
    usage
}

fn ranked(usage: &BTreeMap<String, u64>) -> Vec<(String, u64)> {
    top_n(
        usage.iter().map(|(name, &n)| (name.clone(), n)).collect(),
        usage.len(),
    )
}

fn top_share(ranked: &[(String, u64)], n: usize, total: u64) -> f64 {
    let top: u64 = ranked.iter().take(n).map(|(_, usage)| usage).sum();
    share(top as f64, total as f64)
}

#[derive(Debug, Clone, Serialize)]
pub struct IngredientCount {
    pub ingredient: String,
    pub count: u64,
}

fn to_counts(items: impl IntoIterator<Item = (String, u64)>) -> Vec<IngredientCount> {
    items
        .into_iter()
        .map(|(ingredient, count)| IngredientCount { ingredient, count })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum IngredientCategory {
    Spirits,
    Liqueurs,
    Juices,
    Mixers,
    Garnish,
    Others,
}

impl IngredientCategory {
    pub const ALL: [IngredientCategory; 6] = [
        IngredientCategory::Spirits,
        IngredientCategory::Liqueurs,
        IngredientCategory::Juices,
        IngredientCategory::Mixers,
        IngredientCategory::Garnish,
        IngredientCategory::Others,
    ];

    fn keywords(self) -> &'static [&'static str] {
        match self {
            IngredientCategory::Spirits => &[
                "gin", "vodka", "rum", "whiskey", "tequila", "mezcal", "bourbon", "brandy",
            ],
            IngredientCategory::Liqueurs => &[
                "liqueur", "aperitivo", "amaretto", "cointreau", "triple sec", "vermouth",
            ],
            IngredientCategory::Juices => &["juice", "lemon", "lime", "orange", "cranberry", "pineapple"],
            IngredientCategory::Mixers => &["syrup", "bitters", "soda", "tonic", "ginger", "club soda"],
            IngredientCategory::Garnish => &["mint", "cherry", "olive", "twist", "salt", "sugar"],
            IngredientCategory::Others => &[],
        }
    }

    /// First category with a keyword contained in the name, checked in
    /// declaration order.
    pub fn classify(ingredient: &str) -> Self {
        let lowered = ingredient.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.keywords().iter().any(|kw| lowered.contains(kw)))
            .unwrap_or(IngredientCategory::Others)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngredientUsage {
    pub ingredient: String,
    pub usage: u64,
    pub share: f64,
    pub category: IngredientCategory,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryUsage {
    pub category: IngredientCategory,
    pub usage: u64,
    pub share: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopIngredientsReport {
    pub distinct_ingredients: usize,
    pub total_usage: u64,
    pub average_usage: f64,
    pub by_usage: Vec<IngredientUsage>,
    /// Ingredients appearing in the most menu recipes.
    pub by_menu_inclusion: Vec<IngredientCount>,
    pub categories: Vec<CategoryUsage>,
    pub top5_share: f64,
    pub lead_category: Option<IngredientCategory>,
}

pub fn top_ingredients(input: &AnalysisInput) -> TopIngredientsReport {
    let usage = ingredient_usage(input, input.orders());
    let total: u64 = usage.values().sum();
    let ranked = ranked(&usage);

    let mut menu_counts: BTreeMap<String, u64> = BTreeMap::new();
    for cocktail in input.menu() {
        for ingredient in super::ingredient_names(cocktail.ingredients_text()) {
            *menu_counts.entry(ingredient).or_default() += 1;
        }
    }

    let mut by_category: BTreeMap<IngredientCategory, u64> = BTreeMap::new();
    for (ingredient, &n) in &usage {
        *by_category.entry(IngredientCategory::classify(ingredient)).or_default() += n;
    }
    let categories: Vec<CategoryUsage> = IngredientCategory::ALL
        .into_iter()
        .map(|category| {
            let n = by_category.get(&category).copied().unwrap_or(0);
            CategoryUsage {
                category,
                usage: n,
                share: share(n as f64, total as f64),
            }
        })
        .collect();
    let lead_category = top_n(
        categories.iter().filter(|c| c.usage > 0).map(|c| (c.category, c.usage)).collect(),
        1,
    )
    .first()
    .map(|&(category, _)| category);

    TopIngredientsReport {
        distinct_ingredients: usage.len(),
        total_usage: total,
        average_usage: share(total as f64, usage.len() as f64),
        top5_share: top_share(&ranked, TOP_SHARE_COUNT, total),
        by_usage: ranked
            .iter()
            .take(TOP_INGREDIENTS)
            .map(|(ingredient, n)| IngredientUsage {
                ingredient: ingredient.clone(),
                usage: *n,
                share: share(*n as f64, total as f64),
                category: IngredientCategory::classify(ingredient),
            })
            .collect(),
        by_menu_inclusion: to_counts(top_n(menu_counts.into_iter().collect(), TOP_INGREDIENTS)),
        categories,
        lead_category,
    }
}

impl fmt::Display for TopIngredientsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ingredients used: {}", self.distinct_ingredients)?;
        writeln!(f, "Total usage: {}", self.total_usage)?;
        writeln!(f, "Average per ingredient: {:.1}", self.average_usage)?;
        writeln!(f, "Most used (by drinks ordered):")?;
        for (rank, i) in self.by_usage.iter().enumerate() {
            writeln!(
                f,
                "  {:>2}. {} {} ({:.1}%) [{:?}]",
                rank + 1,
                i.ingredient,
                i.usage,
                i.share * 100.0,
                i.category
            )?;
        }
        writeln!(f, "Most common on the menu:")?;
        for (rank, i) in self.by_menu_inclusion.iter().enumerate() {
            writeln!(f, "  {:>2}. {} in {} recipe(s)", rank + 1, i.ingredient, i.count)?;
        }
        writeln!(f, "By category:")?;
        for c in self.categories.iter().filter(|c| c.usage > 0) {
            writeln!(f, "  {:?}: {} ({:.1}%)", c.category, c.usage, c.share * 100.0)?;
        }
        writeln!(f, "Top 5 share of usage: {:.1}%", self.top5_share * 100.0)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageDistribution {
    pub count: usize,
    pub total: u64,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std: f64,
    pub min: u64,
    pub max: u64,
    pub q25: f64,
    pub q75: f64,
    pub iqr: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyBand {
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
}

impl FrequencyBand {
    pub const ALL: [FrequencyBand; 5] = [
        FrequencyBand::VeryHigh,
        FrequencyBand::High,
        FrequencyBand::Medium,
        FrequencyBand::Low,
        FrequencyBand::VeryLow,
    ];

    /// Band for a rank position given as a percentage from the top.
    pub fn for_rank_percentile(percentile: f64) -> Self {
        if percentile < 10.0 {
            FrequencyBand::VeryHigh
        } else if percentile < 25.0 {
            FrequencyBand::High
        } else if percentile < 75.0 {
            FrequencyBand::Medium
        } else if percentile < 90.0 {
            FrequencyBand::Low
        } else {
            FrequencyBand::VeryLow
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FrequencyBand::VeryHigh => "very high (top 10%)",
            FrequencyBand::High => "high (top 25%)",
            FrequencyBand::Medium => "medium (25-75%)",
            FrequencyBand::Low => "low (bottom 25%)",
            FrequencyBand::VeryLow => "very low (bottom 10%)",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BandMembers {
    pub band: FrequencyBand,
    pub ingredients: Vec<IngredientCount>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Concentration {
    pub top_10_percent: f64,
    pub top_20_percent: f64,
    pub top_50_percent: f64,
    pub gini: f64,
    pub herfindahl: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngredientFrequencyReport {
    pub distribution: UsageDistribution,
    pub bands: Vec<BandMembers>,
    pub concentration: Concentration,
    pub top5_share: f64,
}

fn concentration(ranked: &[(String, u64)], total: u64) -> Concentration {
    let n = ranked.len();
    if n == 0 || total == 0 {
        return Concentration::default();
    }
    let values: Vec<f64> = ranked.iter().map(|(_, u)| *u as f64).collect();
    Concentration {
        top_10_percent: top_share(ranked, (n / 10).max(1), total),
        top_20_percent: top_share(ranked, (n / 5).max(1), total),
        top_50_percent: top_share(ranked, (n / 2).max(1), total),
        gini: gini(&values),
        herfindahl: values.iter().map(|v| (v / total as f64).powi(2)).sum(),
    }
}

pub fn ingredient_frequency(input: &AnalysisInput) -> IngredientFrequencyReport {
    let usage = ingredient_usage(input, input.orders());
    let total: u64 = usage.values().sum();
    let ranked = ranked(&usage);
    let values: Vec<f64> = ranked.iter().map(|(_, u)| *u as f64).collect();

    let distribution = if values.is_empty() {
        UsageDistribution::default()
    } else {
        let q25 = percentile(&values, 25.0);
        let q75 = percentile(&values, 75.0);
        UsageDistribution {
            count: values.len(),
            total,
            mean: mean(&values),
            median: median(&values),
            std: population_std(&values),
            min: usage.values().copied().min().unwrap_or(0),
            max: usage.values().copied().max().unwrap_or(0),
            q25,
            q75,
            iqr: q75 - q25,
            skewness: skewness(&values),
            kurtosis: kurtosis(&values),
        }
    };

    let mut bands: Vec<BandMembers> = FrequencyBand::ALL
        .into_iter()
        .map(|band| BandMembers {
            band,
            ingredients: Vec::new(),
        })
        .collect();
    let count = ranked.len();
    for (rank, (ingredient, n)) in ranked.iter().enumerate() {
        let band = FrequencyBand::for_rank_percentile(rank as f64 / count as f64 * 100.0);
        if let Some(members) = bands.iter_mut().find(|m| m.band == band) {
            members.ingredients.push(IngredientCount {
                ingredient: ingredient.clone(),
                count: *n,
            });
        }
    }

    IngredientFrequencyReport {
        distribution,
        bands,
        concentration: concentration(&ranked, total),
        top5_share: top_share(&ranked, TOP_SHARE_COUNT, total),
    }
}

impl fmt::Display for IngredientFrequencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.distribution;
        writeln!(f, "Ingredients: {}  Total usage: {}", d.count, d.total)?;
        writeln!(
            f,
            "Mean {:.1}, median {:.1}, std {:.1}, min {}, max {}",
            d.mean, d.median, d.std, d.min, d.max
        )?;
        writeln!(f, "Q1 {:.1}, Q3 {:.1}, IQR {:.1}", d.q25, d.q75, d.iqr)?;
        writeln!(f, "Skewness {:.2}, kurtosis {:.2}", d.skewness, d.kurtosis)?;
        for members in self.bands.iter().filter(|m| !m.ingredients.is_empty()) {
            writeln!(f, "{}: {}", members.band.label(), members.ingredients.len())?;
            for i in members.ingredients.iter().take(3) {
                writeln!(f, "  {} ({})", i.ingredient, i.count)?;
            }
            if members.ingredients.len() > 3 {
                writeln!(f, "  ... {} more", members.ingredients.len() - 3)?;
            }
        }
        let c = &self.concentration;
        writeln!(
            f,
            "Top 10% / 20% / 50% of ingredients: {:.1}% / {:.1}% / {:.1}% of usage",
            c.top_10_percent * 100.0,
            c.top_20_percent * 100.0,
            c.top_50_percent * 100.0
        )?;
        writeln!(f, "Gini {:.3}, Herfindahl {:.3}", c.gini, c.herfindahl)?;
        writeln!(f, "Top 5 share of usage: {:.1}%", self.top5_share * 100.0)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Specialty {
    pub ingredient: String,
    /// This season's fraction of the ingredient's year-round usage.
    pub share: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeasonUsage {
    pub season: Season,
    pub total_usage: u64,
    pub ingredient_count: usize,
    pub average_usage_per_ingredient: f64,
    pub top_ingredients: Vec<IngredientCount>,
    pub specialties: Vec<Specialty>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngredientSeasonality {
    pub ingredient: String,
    pub total_usage: u64,
    /// Usage per season, spring through winter.
    pub seasonal_usage: [u64; 4],
    pub peak_season: Season,
    pub peak_share: f64,
    /// Population standard deviation of the four seasonal shares.
    pub seasonality_index: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeasonalTrendsReport {
    pub seasons: Vec<SeasonUsage>,
    /// Every ingredient, most seasonal first.
    pub ingredients: Vec<IngredientSeasonality>,
    pub strongly_seasonal: Vec<String>,
}

pub fn seasonal_trends(input: &AnalysisInput) -> SeasonalTrendsReport {
    let per_season: Vec<BTreeMap<String, u64>> = Season::ALL
        .iter()
        .map(|&season| {
            ingredient_usage(
                input,
                input
                    .orders()
                    .iter()
                    .filter(|order| Season::of(&order.timestamp) == season),
            )
        })
        .collect();

    let mut year_round: BTreeMap<&str, [u64; 4]> = BTreeMap::new();
    for (idx, usage) in per_season.iter().enumerate() {
        for (ingredient, &n) in usage {
            year_round.entry(ingredient.as_str()).or_default()[idx] += n;
        }
    }

    let seasons: Vec<SeasonUsage> = Season::ALL
        .iter()
        .zip(&per_season)
        .map(|(&season, usage)| {
            let total: u64 = usage.values().sum();
            let specialties: Vec<(String, f64)> = usage
                .iter()
                .filter_map(|(ingredient, &n)| {
                    let all: u64 = year_round.get(ingredient.as_str()).map_or(0, |u| u.iter().sum());
                    let ratio = share(n as f64, all as f64);
                    (ratio > SPECIALTY_SHARE).then(|| (ingredient.clone(), ratio))
                })
                .collect();
            SeasonUsage {
                season,
                total_usage: total,
                ingredient_count: usage.len(),
                average_usage_per_ingredient: share(total as f64, usage.len() as f64),
                top_ingredients: to_counts(ranked(usage).into_iter().take(TOP_INGREDIENTS)),
                specialties: top_n(specialties, SPECIALTIES_PER_SEASON)
                    .into_iter()
                    .map(|(ingredient, share)| Specialty { ingredient, share })
                    .collect(),
            }
        })
        .collect();

    let mut ingredients: Vec<IngredientSeasonality> = year_round
        .into_iter()
        .filter_map(|(ingredient, seasonal_usage)| {
            let total: u64 = seasonal_usage.iter().sum();
            if total == 0 {
                return None;
            }
            let shares: Vec<f64> = seasonal_usage
                .iter()
                .map(|&n| n as f64 / total as f64)
                .collect();
            let mut peak = 0;
            for (idx, value) in shares.iter().enumerate() {
                if *value > shares[peak] {
                    peak = idx;
                }
            }
            Some(IngredientSeasonality {
                ingredient: ingredient.to_string(),
                total_usage: total,
                seasonal_usage,
                peak_season: Season::ALL[peak],
                peak_share: shares[peak],
                seasonality_index: population_std(&shares),
            })
        })
        .collect();
    ingredients.sort_by(|a, b| b.seasonality_index.total_cmp(&a.seasonality_index));

    let strongly_seasonal = ingredients
        .iter()
        .filter(|i| {
            i.seasonality_index > STRONG_SEASONALITY_INDEX
                && i.total_usage > STRONG_SEASONALITY_MIN_USAGE
        })
        .take(TOP_SHARE_COUNT)
        .map(|i| i.ingredient.clone())
        .collect();

    SeasonalTrendsReport {
        seasons,
        ingredients,
        strongly_seasonal,
    }
}

impl fmt::Display for SeasonalTrendsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.seasons {
            writeln!(f, "{}:", s.season.name())?;
            writeln!(
                f,
                "  usage {}, {} ingredients, {:.1} per ingredient",
                s.total_usage, s.ingredient_count, s.average_usage_per_ingredient
            )?;
            if !s.top_ingredients.is_empty() {
                let top: Vec<String> = s
                    .top_ingredients
                    .iter()
                    .take(3)
                    .map(|i| format!("{} ({})", i.ingredient, i.count))
                    .collect();
                writeln!(f, "  top: {}", top.join(", "))?;
            }
            if !s.specialties.is_empty() {
                let specials: Vec<String> = s
                    .specialties
                    .iter()
                    .take(2)
                    .map(|sp| format!("{} ({:.1}%)", sp.ingredient, sp.share * 100.0))
                    .collect();
                writeln!(f, "  specialties: {}", specials.join(", "))?;
            }
        }
        if self.strongly_seasonal.is_empty() {
            writeln!(f, "No strongly seasonal ingredients")?;
        } else {
            writeln!(f, "Strongly seasonal:")?;
            for name in &self.strongly_seasonal {
                if let Some(i) = self.ingredients.iter().find(|i| &i.ingredient == name) {
                    writeln!(
                        f,
                        "  {} peaks in {} ({:.1}%), index {:.3}",
                        i.ingredient,
                        i.peak_season.name(),
                        i.peak_share * 100.0,
                        i.seasonality_index
                    )?;
                }
            }
        }
        Ok(())
    }
}
