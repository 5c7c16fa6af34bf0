use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::stats::{correlation, mean, population_std};
use super::{hour_of, share, top_n, AnalysisInput, PriceTier, Season};

const TOP_COCKTAILS: usize = 10;
const PARETO_CUTOFF: f64 = 0.8;

#[derive(Debug, Clone, Serialize)]
pub struct CocktailSales {
    pub cocktail_name: String,
    pub quantity: u64,
    pub order_count: usize,
    pub unit_price: f64,
    pub revenue: f64,
    pub price_tier: PriceTier,
    pub average_order_size: f64,
    pub revenue_per_order: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TierSales {
    pub tier: PriceTier,
    pub cocktails: usize,
    pub quantity: u64,
    pub revenue: f64,
    pub order_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PopularCocktailsReport {
    /// Best sellers by quantity, at most ten.
    pub top: Vec<CocktailSales>,
    pub cocktails_sold: usize,
    pub total_quantity: u64,
    pub total_revenue: f64,
    pub average_unit_price: f64,
    /// How many best sellers together stay within 80% of all drinks sold.
    pub pareto_count: usize,
    pub best_seller: Option<String>,
    pub worst_seller: Option<String>,
    pub tiers: Vec<TierSales>,
}

fn cocktail_sales(input: &AnalysisInput) -> Vec<CocktailSales> {
    let mut grouped: BTreeMap<&str, (u64, usize)> = BTreeMap::new();
    for order in input.orders() {
        let entry = grouped.entry(order.cocktail_name.as_str()).or_default();
        entry.0 += u64::from(order.quantity);
        entry.1 += 1;
    }

    grouped
        .into_iter()
        .map(|(name, (quantity, order_count))| {
            let unit_price = input.unit_price(name);
            let revenue = quantity as f64 * unit_price;
            CocktailSales {
                cocktail_name: name.to_string(),
                quantity,
                order_count,
                unit_price,
                revenue,
                price_tier: PriceTier::from_price(unit_price),
                average_order_size: share(quantity as f64, order_count as f64),
                revenue_per_order: share(revenue, order_count as f64),
            }
        })
        .collect()
}

pub fn popular_cocktails(input: &AnalysisInput) -> PopularCocktailsReport {
    let sales = cocktail_sales(input);
    let total_quantity: u64 = sales.iter().map(|c| c.quantity).sum();
    let total_revenue: f64 = sales.iter().map(|c| c.revenue).sum();
    let prices: Vec<f64> = sales.iter().map(|c| c.unit_price).collect();

    let ranked: Vec<(usize, u64)> = top_n(
        sales.iter().enumerate().map(|(i, c)| (i, c.quantity)).collect(),
        sales.len(),
    );

    let mut cumulative = 0u64;
    let pareto_count = ranked
        .iter()
        .take_while(|(_, quantity)| {
            cumulative += quantity;
            share(cumulative as f64, total_quantity as f64) <= PARETO_CUTOFF
        })
        .count();

    let worst_seller = sales
        .iter()
        .fold(None::<&CocktailSales>, |worst, c| match worst {
            Some(w) if w.quantity <= c.quantity => Some(w),
            _ => Some(c),
        })
        .map(|c| c.cocktail_name.clone());

    let tiers = PriceTier::ALL
        .iter()
        .filter_map(|&tier| {
            let members: Vec<&CocktailSales> =
                sales.iter().filter(|c| c.price_tier == tier).collect();
            (!members.is_empty()).then(|| TierSales {
                tier,
                cocktails: members.len(),
                quantity: members.iter().map(|c| c.quantity).sum(),
                revenue: members.iter().map(|c| c.revenue).sum(),
                order_count: members.iter().map(|c| c.order_count).sum(),
            })
        })
        .collect();

    let top: Vec<CocktailSales> = ranked
        .iter()
        .take(TOP_COCKTAILS)
        .map(|&(idx, _)| sales[idx].clone())
        .collect();

    PopularCocktailsReport {
        best_seller: top.first().map(|c| c.cocktail_name.clone()),
        worst_seller,
        cocktails_sold: sales.len(),
        total_quantity,
        total_revenue,
        average_unit_price: mean(&prices),
        pareto_count,
        tiers,
        top,
    }
}

impl fmt::Display for PopularCocktailsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cocktails sold: {}", self.cocktails_sold)?;
        writeln!(f, "Drinks: {}  Revenue: ${:.2}", self.total_quantity, self.total_revenue)?;
        writeln!(f, "Average unit price: ${:.2}", self.average_unit_price)?;
        writeln!(
            f,
            "{} cocktail(s) cover up to 80% of drinks sold",
            self.pareto_count
        )?;
        if let (Some(best), Some(worst)) = (&self.best_seller, &self.worst_seller) {
            writeln!(f, "Best seller: {best}, slowest: {worst}")?;
        }
        for (rank, c) in self.top.iter().enumerate() {
            writeln!(
                f,
                "  {:>2}. {:<24} {:>4} drinks  {:>3} orders  ${:>8.2}  {}",
                rank + 1,
                c.cocktail_name,
                c.quantity,
                c.order_count,
                c.revenue,
                c.price_tier.label()
            )?;
        }
        for tier in &self.tiers {
            writeln!(
                f,
                "  {}: {} drinks, ${:.2}, {} orders",
                tier.tier.label(),
                tier.quantity,
                tier.revenue,
                tier.order_count
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TierPreference {
    pub tier: PriceTier,
    pub quantity: u64,
    pub quantity_share: f64,
    pub revenue: f64,
    pub revenue_share: f64,
    pub order_count: usize,
    /// Mean unit price across the tier's orders.
    pub average_unit_price: f64,
    pub average_order_size: f64,
    pub peak_hour: Option<u32>,
    pub peak_season: Option<Season>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PricePreferencesReport {
    pub tiers: Vec<TierPreference>,
    pub total_quantity: u64,
    pub total_revenue: f64,
    pub price_quantity_correlation: f64,
    /// Largest tier's share of all drinks.
    pub demand_concentration: f64,
    /// Population standard deviation of the tiers' average prices.
    pub price_dispersion: f64,
}

fn first_max<K: Copy + Ord>(counts: &BTreeMap<K, u64>, order: impl IntoIterator<Item = K>) -> Option<K> {
    let mut best: Option<(K, u64)> = None;
    for key in order {
        if let Some(&value) = counts.get(&key) {
            if best.map_or(true, |(_, current)| value > current) {
                best = Some((key, value));
            }
        }
    }
    best.map(|(key, _)| key)
}

pub fn price_preferences(input: &AnalysisInput) -> PricePreferencesReport {
    #[derive(Default)]
    struct Acc {
        quantity: u64,
        revenue: f64,
        orders: usize,
        price_sum: f64,
        by_hour: BTreeMap<u32, u64>,
        by_season: BTreeMap<Season, u64>,
    }

    let mut tiers: BTreeMap<PriceTier, Acc> = BTreeMap::new();
    for order in input.orders() {
        let price = input.unit_price(&order.cocktail_name);
        let quantity = u64::from(order.quantity);
        let acc = tiers.entry(PriceTier::from_price(price)).or_default();
        acc.quantity += quantity;
        acc.revenue += price * f64::from(order.quantity);
        acc.orders += 1;
        acc.price_sum += price;
        *acc.by_hour.entry(hour_of(&order.timestamp)).or_default() += quantity;
        *acc.by_season.entry(Season::of(&order.timestamp)).or_default() += quantity;
    }

    let total_quantity: u64 = tiers.values().map(|a| a.quantity).sum();
    let total_revenue: f64 = tiers.values().map(|a| a.revenue).sum();

    let tiers: Vec<TierPreference> = tiers
        .into_iter()
        .map(|(tier, acc)| TierPreference {
            tier,
            quantity: acc.quantity,
            quantity_share: share(acc.quantity as f64, total_quantity as f64),
            revenue: acc.revenue,
            revenue_share: share(acc.revenue, total_revenue),
            order_count: acc.orders,
            average_unit_price: share(acc.price_sum, acc.orders as f64),
            average_order_size: share(acc.quantity as f64, acc.orders as f64),
            peak_hour: first_max(&acc.by_hour, acc.by_hour.keys().copied()),
            peak_season: first_max(&acc.by_season, Season::ALL),
        })
        .collect();

    let prices: Vec<f64> = tiers.iter().map(|t| t.average_unit_price).collect();
    let quantities: Vec<f64> = tiers.iter().map(|t| t.quantity as f64).collect();
    let max_quantity = tiers.iter().map(|t| t.quantity).max().unwrap_or(0);

    PricePreferencesReport {
        price_quantity_correlation: correlation(&prices, &quantities),
        demand_concentration: share(max_quantity as f64, total_quantity as f64),
        price_dispersion: population_std(&prices),
        tiers,
        total_quantity,
        total_revenue,
    }
}

impl fmt::Display for PricePreferencesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Drinks: {}  Revenue: ${:.2}", self.total_quantity, self.total_revenue)?;
        for t in &self.tiers {
            writeln!(f, "{}:", t.tier.label())?;
            writeln!(
                f,
                "  {} drinks ({:.1}%), ${:.2} ({:.1}%), {} orders",
                t.quantity,
                t.quantity_share * 100.0,
                t.revenue,
                t.revenue_share * 100.0,
                t.order_count
            )?;
            writeln!(
                f,
                "  avg price ${:.2}, {:.1} drinks/order",
                t.average_unit_price, t.average_order_size
            )?;
            if let (Some(hour), Some(season)) = (t.peak_hour, t.peak_season) {
                writeln!(f, "  busiest at {hour:02}:00, strongest in {}", season.name())?;
            }
        }
        writeln!(
            f,
            "Price/quantity correlation: {:.3}",
            self.price_quantity_correlation
        )?;
        writeln!(f, "Demand concentration: {:.1}%", self.demand_concentration * 100.0)?;
        writeln!(f, "Price dispersion: ${:.2}", self.price_dispersion)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn popular_cocktails_rank_by_quantity() {
        let report = popular_cocktails(&fixtures::input());
        let names: Vec<&str> = report.top.iter().map(|c| c.cocktail_name.as_str()).collect();
        assert_eq!(names, vec!["Mojito", "Negroni", "Old Fashioned"]);

        let mojito = &report.top[0];
        assert_eq!(mojito.quantity, 9);
        assert_eq!(mojito.order_count, 3);
        assert!(close(mojito.revenue, 81.0));
        assert_eq!(mojito.price_tier, PriceTier::Low);

        assert_eq!(report.total_quantity, 13);
        assert!(close(report.total_revenue, 141.0));
        assert!(close(report.average_unit_price, 13.0));
        // 9/13 is within 80%, 11/13 is not
        assert_eq!(report.pareto_count, 1);
        assert_eq!(report.best_seller.as_deref(), Some("Mojito"));
        assert_eq!(report.worst_seller.as_deref(), Some("Negroni"));
        assert_eq!(report.tiers.len(), 3);
    }

    #[test]
    fn unknown_cocktails_price_at_zero() {
        let input = AnalysisInput::new(
            vec![fixtures::order("2025-02-01 19:00:00", "Retired Special", 2)],
            fixtures::menu(),
        );
        let report = popular_cocktails(&input);
        assert_eq!(report.top[0].unit_price, 0.0);
        assert_eq!(report.top[0].price_tier, PriceTier::Low);
    }

    #[test]
    fn price_preferences_split_by_tier() {
        let report = price_preferences(&fixtures::input());
        let tiers: Vec<PriceTier> = report.tiers.iter().map(|t| t.tier).collect();
        assert_eq!(tiers, vec![PriceTier::Low, PriceTier::Mid, PriceTier::High]);

        let low = &report.tiers[0];
        assert_eq!(low.quantity, 9);
        assert_eq!(low.order_count, 3);
        assert!(close(low.revenue_share, 81.0 / 141.0));
        assert_eq!(low.peak_hour, Some(20));
        assert_eq!(low.peak_season, Some(Season::Winter));

        let mid = &report.tiers[1];
        assert_eq!(mid.quantity, 2);
        // one Negroni in winter, one in summer: the earlier season in the
        // spring..winter order wins
        assert_eq!(mid.peak_season, Some(Season::Summer));

        assert!(close(report.demand_concentration, 9.0 / 13.0));
        assert!(report.price_quantity_correlation < 0.0);
    }

    #[test]
    fn empty_input_has_no_tiers() {
        let report = price_preferences(&AnalysisInput::default());
        assert!(report.tiers.is_empty());
        assert_eq!(report.demand_concentration, 0.0);
        assert!(popular_cocktails(&AnalysisInput::default()).top.is_empty());
    }
}
