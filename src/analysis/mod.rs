//! Offline sales analytics over the order log and the menu catalog.
//!
//! Reports are a closed set. Each [`Report`] maps statically to the function
//! that computes it, so there is no lookup by name at run time beyond parsing
//! the user's selection.

pub mod cocktails;
pub mod ingredients;
pub mod sales;
pub mod stats;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::models::cocktail::Cocktail;
use crate::models::order::OrderEntry;

/// Orders plus the menu they are priced and broken down against.
#[derive(Debug, Clone, Default)]
pub struct AnalysisInput {
    orders: Vec<OrderEntry>,
    menu: Vec<Cocktail>,
    by_name: HashMap<String, usize>,
}

impl AnalysisInput {
    /// When the menu repeats a name, the first record wins.
    pub fn new(orders: Vec<OrderEntry>, menu: Vec<Cocktail>) -> Self {
        let mut unique = Vec::with_capacity(menu.len());
        let mut by_name = HashMap::with_capacity(menu.len());
        for cocktail in menu {
            if by_name.contains_key(&cocktail.name) {
                continue;
            }
            by_name.insert(cocktail.name.clone(), unique.len());
            unique.push(cocktail);
        }
        Self {
            orders,
            menu: unique,
            by_name,
        }
    }

    pub fn orders(&self) -> &[OrderEntry] {
        &self.orders
    }

    pub fn menu(&self) -> &[Cocktail] {
        &self.menu
    }

    pub fn cocktail(&self, name: &str) -> Option<&Cocktail> {
        self.by_name.get(name).map(|&idx| &self.menu[idx])
    }

    /// Menu price of a cocktail; unknown or unpriced cocktails cost 0.
    pub fn unit_price(&self, name: &str) -> f64 {
        self.cocktail(name).map(Cocktail::unit_price).unwrap_or(0.0)
    }

    /// Ingredient names for an order, from the menu recipe when the cocktail
    /// is still listed, otherwise from the lines logged with the order.
    pub fn order_ingredients(&self, order: &OrderEntry) -> Vec<String> {
        match self
            .cocktail(&order.cocktail_name)
            .and_then(|c| c.ingredients.as_deref())
            .filter(|text| !text.trim().is_empty())
        {
            Some(text) => ingredient_names(text),
            None => order
                .ingredients
                .iter()
                .filter_map(|phrase| ingredient_name(phrase))
                .collect(),
        }
    }
}

/// The ingredient name of a phrase: the text before any `(` quantity note.
pub fn ingredient_name(phrase: &str) -> Option<String> {
    let name = phrase.split('(').next().unwrap_or("").trim();
    (!name.is_empty()).then(|| name.to_string())
}

pub fn ingredient_names(ingredients: &str) -> Vec<String> {
    ingredients.split(',').filter_map(ingredient_name).collect()
}

pub fn hour_of(ts: &NaiveDateTime) -> u32 {
    ts.hour()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    Low,
    Mid,
    High,
}

impl PriceTier {
    pub const ALL: [PriceTier; 3] = [PriceTier::Low, PriceTier::Mid, PriceTier::High];

    pub fn from_price(price: f64) -> Self {
        if price <= 10.0 {
            PriceTier::Low
        } else if price <= 15.0 {
            PriceTier::Mid
        } else {
            PriceTier::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriceTier::Low => "low ($0-10)",
            PriceTier::Mid => "mid ($10-15)",
            PriceTier::High => "high ($15+)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];

    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    pub fn of(ts: &NaiveDateTime) -> Self {
        Self::from_month(ts.month())
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        }
    }
}

/// Sorts `(key, value)` pairs by value descending; equal values keep their
/// incoming order. Truncates to `n`.
pub(crate) fn top_n<K, V: PartialOrd + Copy>(mut items: Vec<(K, V)>, n: usize) -> Vec<(K, V)> {
    items.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    items.truncate(n);
    items
}

pub(crate) fn share(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Report {
    HourlySales,
    PopularCocktails,
    PeakTime,
    TopIngredients,
    IngredientFrequency,
    SeasonalTrends,
    PricePreferences,
    SalesSummary,
}

type Runner = fn(&AnalysisInput) -> ReportOutput;

fn run_hourly_sales(input: &AnalysisInput) -> ReportOutput {
    ReportOutput::HourlySales(sales::hourly_sales(input))
}

fn run_popular_cocktails(input: &AnalysisInput) -> ReportOutput {
    ReportOutput::PopularCocktails(cocktails::popular_cocktails(input))
}

fn run_peak_time(input: &AnalysisInput) -> ReportOutput {
    ReportOutput::PeakTime(sales::peak_time(input))
}

fn run_top_ingredients(input: &AnalysisInput) -> ReportOutput {
    ReportOutput::TopIngredients(ingredients::top_ingredients(input))
}

fn run_ingredient_frequency(input: &AnalysisInput) -> ReportOutput {
    ReportOutput::IngredientFrequency(ingredients::ingredient_frequency(input))
}

fn run_seasonal_trends(input: &AnalysisInput) -> ReportOutput {
    ReportOutput::SeasonalTrends(ingredients::seasonal_trends(input))
}

fn run_price_preferences(input: &AnalysisInput) -> ReportOutput {
    ReportOutput::PricePreferences(cocktails::price_preferences(input))
}

fn run_sales_summary(input: &AnalysisInput) -> ReportOutput {
    ReportOutput::SalesSummary(sales::sales_summary(input))
}

impl Report {
    pub const ALL: [Report; 8] = [
        Report::HourlySales,
        Report::PopularCocktails,
        Report::PeakTime,
        Report::TopIngredients,
        Report::IngredientFrequency,
        Report::SeasonalTrends,
        Report::PricePreferences,
        Report::SalesSummary,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Report::HourlySales => "hourly-sales",
            Report::PopularCocktails => "popular-cocktails",
            Report::PeakTime => "peak-time",
            Report::TopIngredients => "top-ingredients",
            Report::IngredientFrequency => "ingredient-frequency",
            Report::SeasonalTrends => "seasonal-trends",
            Report::PricePreferences => "price-preferences",
            Report::SalesSummary => "sales-summary",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Report::HourlySales => "Hourly sales trend",
            Report::PopularCocktails => "Popular cocktails",
            Report::PeakTime => "Peak time analysis",
            Report::TopIngredients => "Top 10 ingredients",
            Report::IngredientFrequency => "Ingredient usage frequency",
            Report::SeasonalTrends => "Seasonal ingredient trends",
            Report::PricePreferences => "Price tier preferences",
            Report::SalesSummary => "Sales summary",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Report::HourlySales => "Sales volume and order count per hour of day, with the top 3 hours.",
            Report::PopularCocktails => "Best sellers by quantity, with revenue and price tier.",
            Report::PeakTime => "Hours at or above the 75th percentile of hourly volume.",
            Report::TopIngredients => "Most used ingredients by ordered quantity and by menu inclusion.",
            Report::IngredientFrequency => "Distribution and concentration of ingredient usage.",
            Report::SeasonalTrends => "Ingredient usage per season and each ingredient's seasonality.",
            Report::PricePreferences => "Volume and revenue split across low, mid and high price tiers.",
            Report::SalesSummary => "Revenue totals, daily averages, growth and weekday breakdown.",
        }
    }

    fn runner(self) -> Runner {
        match self {
            Report::HourlySales => run_hourly_sales,
            Report::PopularCocktails => run_popular_cocktails,
            Report::PeakTime => run_peak_time,
            Report::TopIngredients => run_top_ingredients,
            Report::IngredientFrequency => run_ingredient_frequency,
            Report::SeasonalTrends => run_seasonal_trends,
            Report::PricePreferences => run_price_preferences,
            Report::SalesSummary => run_sales_summary,
        }
    }

    pub fn run(self, input: &AnalysisInput) -> ReportOutput {
        (self.runner())(input)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Report {
    type Err = String;

    /// Accepts a report id (`peak-time`) or its 1-based position (`3`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        if let Ok(position) = wanted.parse::<usize>() {
            return position
                .checked_sub(1)
                .and_then(|idx| Report::ALL.get(idx).copied())
                .ok_or_else(|| format!("no report number {position} (1-{})", Report::ALL.len()));
        }
        Report::ALL
            .into_iter()
            .find(|report| report.id() == wanted)
            .ok_or_else(|| {
                let ids: Vec<&str> = Report::ALL.iter().map(|r| r.id()).collect();
                format!("unknown report '{s}', expected one of: {}", ids.join(", "))
            })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "report", rename_all = "kebab-case")]
pub enum ReportOutput {
    HourlySales(sales::HourlySalesReport),
    PopularCocktails(cocktails::PopularCocktailsReport),
    PeakTime(sales::PeakTimeReport),
    TopIngredients(ingredients::TopIngredientsReport),
    IngredientFrequency(ingredients::IngredientFrequencyReport),
    SeasonalTrends(ingredients::SeasonalTrendsReport),
    PricePreferences(cocktails::PricePreferencesReport),
    SalesSummary(sales::SalesSummaryReport),
}

impl ReportOutput {
    pub fn report(&self) -> Report {
        match self {
            ReportOutput::HourlySales(_) => Report::HourlySales,
            ReportOutput::PopularCocktails(_) => Report::PopularCocktails,
            ReportOutput::PeakTime(_) => Report::PeakTime,
            ReportOutput::TopIngredients(_) => Report::TopIngredients,
            ReportOutput::IngredientFrequency(_) => Report::IngredientFrequency,
            ReportOutput::SeasonalTrends(_) => Report::SeasonalTrends,
            ReportOutput::PricePreferences(_) => Report::PricePreferences,
            ReportOutput::SalesSummary(_) => Report::SalesSummary,
        }
    }
}

impl fmt::Display for ReportOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self.report().title();
        writeln!(f, "{title}")?;
        writeln!(f, "{}", "=".repeat(title.len()))?;
        match self {
            ReportOutput::HourlySales(r) => write!(f, "{r}"),
            ReportOutput::PopularCocktails(r) => write!(f, "{r}"),
            ReportOutput::PeakTime(r) => write!(f, "{r}"),
            ReportOutput::TopIngredients(r) => write!(f, "{r}"),
            ReportOutput::IngredientFrequency(r) => write!(f, "{r}"),
            ReportOutput::SeasonalTrends(r) => write!(f, "{r}"),
            ReportOutput::PricePreferences(r) => write!(f, "{r}"),
            ReportOutput::SalesSummary(r) => write!(f, "{r}"),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_ids_parse_back() {
        for report in Report::ALL {
            assert_eq!(report.id().parse::<Report>().unwrap(), report);
        }
        assert_eq!("3".parse::<Report>().unwrap(), Report::PeakTime);
        assert_eq!("Sales_Summary".parse::<Report>().unwrap(), Report::SalesSummary);
        assert!("0".parse::<Report>().is_err());
        assert!("9".parse::<Report>().is_err());
        assert!("weather".parse::<Report>().is_err());
    }

    #[test]
    fn every_report_runs_on_empty_input() {
        let input = AnalysisInput::default();
        for report in Report::ALL {
            let output = report.run(&input);
            assert_eq!(output.report(), report);
            assert!(output.to_string().starts_with(report.title()));
        }
    }

    #[test]
    fn menu_index_keeps_first_duplicate() {
        let input = AnalysisInput::new(
            Vec::new(),
            vec![
                Cocktail::new("Mojito", "Rum").with_price(9.0),
                Cocktail::new("Mojito", "Vodka").with_price(20.0),
            ],
        );
        assert_eq!(input.menu().len(), 1);
        assert_eq!(input.unit_price("Mojito"), 9.0);
        assert_eq!(input.unit_price("Zombie"), 0.0);
    }

    #[test]
    fn ingredient_names_drop_quantities() {
        assert_eq!(
            ingredient_names("Gin (2 oz), Lime Juice (1 oz), , Soda"),
            vec!["Gin", "Lime Juice", "Soda"]
        );
    }

    #[test]
    fn order_ingredients_fall_back_to_logged_lines() {
        let input = fixtures::input();
        let mut order = fixtures::order("2025-01-06 18:10:00", "Retired Special", 1);
        order.ingredients = vec!["Mezcal (2 oz)".to_string(), "Agave".to_string()];
        assert_eq!(input.order_ingredients(&order), vec!["Mezcal", "Agave"]);

        let mojito = &input.orders()[0];
        assert_eq!(input.order_ingredients(mojito)[0], "White Rum");
    }

    #[test]
    fn tiers_and_seasons() {
        assert_eq!(PriceTier::from_price(10.0), PriceTier::Low);
        assert_eq!(PriceTier::from_price(10.5), PriceTier::Mid);
        assert_eq!(PriceTier::from_price(15.01), PriceTier::High);
        assert_eq!(Season::from_month(12), Season::Winter);
        assert_eq!(Season::from_month(2), Season::Winter);
        assert_eq!(Season::from_month(3), Season::Spring);
        assert_eq!(Season::from_month(8), Season::Summer);
        assert_eq!(Season::from_month(11), Season::Autumn);
    }
}
