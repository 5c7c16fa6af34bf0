use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::models::order::OrderEntry;

use super::stats::{mean, percentile, sample_std};
use super::{hour_of, share, top_n, AnalysisInput};

const PEAK_HOUR_COUNT: usize = 3;
const PEAK_PERCENTILE: f64 = 75.0;
const TOP_REVENUE_COCKTAILS: usize = 10;

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    quantity: u64,
    orders: usize,
    revenue: f64,
}

impl Tally {
    fn add(&mut self, quantity: u32, revenue: f64) {
        self.quantity += u64::from(quantity);
        self.orders += 1;
        self.revenue += revenue;
    }
}

fn tally_by<K: Ord>(input: &AnalysisInput, key: impl Fn(&OrderEntry) -> K) -> BTreeMap<K, Tally> {
    let mut tallies: BTreeMap<K, Tally> = BTreeMap::new();
    for order in input.orders() {
        let revenue = input.unit_price(&order.cocktail_name) * f64::from(order.quantity);
        tallies.entry(key(order)).or_default().add(order.quantity, revenue);
    }
    tallies
}

/// First key holding the largest (or smallest) value, in key order.
fn first_extreme<K: Copy>(items: &[(K, u64)], largest: bool) -> Option<K> {
    let mut best: Option<(K, u64)> = None;
    for &(key, value) in items {
        let better = match best {
            None => true,
            Some((_, current)) if largest => value > current,
            Some((_, current)) => value < current,
        };
        if better {
            best = Some((key, value));
        }
    }
    best.map(|(key, _)| key)
}

fn fmt_hours(hours: &[u32]) -> String {
    if hours.is_empty() {
        return "none".to_string();
    }
    hours
        .iter()
        .map(|h| format!("{h:02}:00"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Serialize)]
pub struct HourStat {
    pub hour: u32,
    pub quantity: u64,
    pub orders: usize,
    pub average_order_size: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HourlySalesReport {
    pub hours: Vec<HourStat>,
    pub peak_hours: Vec<u32>,
    pub busiest_hour: Option<u32>,
    pub quietest_hour: Option<u32>,
    pub total_quantity: u64,
    pub total_orders: usize,
    pub average_order_size: f64,
    /// Fraction of all drinks sold during the peak hours.
    pub peak_share: f64,
}

pub fn hourly_sales(input: &AnalysisInput) -> HourlySalesReport {
    let tallies = tally_by(input, |order| hour_of(&order.timestamp));

    let hours: Vec<HourStat> = tallies
        .iter()
        .map(|(&hour, tally)| HourStat {
            hour,
            quantity: tally.quantity,
            orders: tally.orders,
            average_order_size: share(tally.quantity as f64, tally.orders as f64),
        })
        .collect();

    let by_quantity: Vec<(u32, u64)> = hours.iter().map(|h| (h.hour, h.quantity)).collect();
    let peak_hours: Vec<u32> = top_n(by_quantity.clone(), PEAK_HOUR_COUNT)
        .into_iter()
        .map(|(hour, _)| hour)
        .collect();

    let total_quantity: u64 = hours.iter().map(|h| h.quantity).sum();
    let total_orders: usize = hours.iter().map(|h| h.orders).sum();
    let peak_quantity: u64 = hours
        .iter()
        .filter(|h| peak_hours.contains(&h.hour))
        .map(|h| h.quantity)
        .sum();

    HourlySalesReport {
        busiest_hour: first_extreme(&by_quantity, true),
        quietest_hour: first_extreme(&by_quantity, false),
        hours,
        peak_hours,
        total_quantity,
        total_orders,
        average_order_size: share(total_quantity as f64, total_orders as f64),
        peak_share: share(peak_quantity as f64, total_quantity as f64),
    }
}

impl fmt::Display for HourlySalesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total drinks: {} across {} orders", self.total_quantity, self.total_orders)?;
        writeln!(f, "Average order size: {:.1}", self.average_order_size)?;
        writeln!(f, "Peak hours (top {PEAK_HOUR_COUNT}): {}", fmt_hours(&self.peak_hours))?;
        writeln!(f, "Peak share of drinks: {:.1}%", self.peak_share * 100.0)?;
        if let (Some(busiest), Some(quietest)) = (self.busiest_hour, self.quietest_hour) {
            writeln!(f, "Busiest hour: {busiest:02}:00, quietest hour: {quietest:02}:00")?;
        }
        for h in &self.hours {
            let marker = if self.peak_hours.contains(&h.hour) { " *" } else { "" };
            writeln!(
                f,
                "  {:02}:00  {:>5} drinks  {:>4} orders  {:.1}/order{marker}",
                h.hour, h.quantity, h.orders, h.average_order_size
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PeakHourStat {
    pub hour: u32,
    pub total_quantity: u64,
    pub mean_quantity: f64,
    pub order_count: usize,
    pub is_peak: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeakTimeReport {
    pub hours: Vec<PeakHourStat>,
    /// 75th percentile of hourly drink totals.
    pub threshold: f64,
    pub peak_hours: Vec<u32>,
    pub busiest_hour: Option<u32>,
    pub quietest_hour: Option<u32>,
    pub average_orders_per_hour: f64,
    pub max_orders_in_hour: usize,
    pub peak_period_sales: u64,
}

pub fn peak_time(input: &AnalysisInput) -> PeakTimeReport {
    let tallies = tally_by(input, |order| hour_of(&order.timestamp));
    let totals: Vec<f64> = tallies.values().map(|t| t.quantity as f64).collect();
    let threshold = percentile(&totals, PEAK_PERCENTILE);

    let hours: Vec<PeakHourStat> = tallies
        .iter()
        .map(|(&hour, tally)| PeakHourStat {
            hour,
            total_quantity: tally.quantity,
            mean_quantity: share(tally.quantity as f64, tally.orders as f64),
            order_count: tally.orders,
            is_peak: tally.quantity as f64 >= threshold,
        })
        .collect();

    let peak_hours: Vec<u32> = hours.iter().filter(|h| h.is_peak).map(|h| h.hour).collect();
    let by_quantity: Vec<(u32, u64)> = hours.iter().map(|h| (h.hour, h.total_quantity)).collect();
    let order_counts: Vec<f64> = hours.iter().map(|h| h.order_count as f64).collect();

    PeakTimeReport {
        threshold,
        busiest_hour: first_extreme(&by_quantity, true),
        quietest_hour: first_extreme(&by_quantity, false),
        average_orders_per_hour: mean(&order_counts),
        max_orders_in_hour: hours.iter().map(|h| h.order_count).max().unwrap_or(0),
        peak_period_sales: hours.iter().filter(|h| h.is_peak).map(|h| h.total_quantity).sum(),
        peak_hours,
        hours,
    }
}

impl fmt::Display for PeakTimeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Peak threshold (p75 of hourly drinks): {:.2}", self.threshold)?;
        writeln!(f, "Peak hours: {}", fmt_hours(&self.peak_hours))?;
        writeln!(f, "Drinks sold in peak hours: {}", self.peak_period_sales)?;
        writeln!(f, "Average orders per active hour: {:.1}", self.average_orders_per_hour)?;
        writeln!(f, "Most orders in one hour: {}", self.max_orders_in_hour)?;
        if let (Some(busiest), Some(quietest)) = (self.busiest_hour, self.quietest_hour) {
            writeln!(f, "Busiest hour: {busiest:02}:00, quietest hour: {quietest:02}:00")?;
        }
        for h in &self.hours {
            writeln!(
                f,
                "  {:02}:00  {:>5} drinks  {:>4} orders  {:.2} avg{}",
                h.hour,
                h.total_quantity,
                h.order_count,
                h.mean_quantity,
                if h.is_peak { "  PEAK" } else { "" }
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DayRevenue {
    pub date: NaiveDate,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodSales {
    pub period: String,
    pub revenue: f64,
    pub quantity: u64,
    pub orders: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CocktailRevenue {
    pub cocktail_name: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesSummaryReport {
    pub total_orders: usize,
    pub total_quantity: u64,
    pub total_revenue: f64,
    pub average_order_value: f64,
    pub average_items_per_order: f64,
    pub unique_cocktails_sold: usize,
    pub operating_days: usize,
    pub average_daily_revenue: f64,
    pub average_daily_orders: f64,
    pub average_daily_quantity: f64,
    pub best_day: Option<DayRevenue>,
    /// Mean day-over-day revenue change in percent, across consecutive
    /// trading days.
    pub average_growth_rate: f64,
    /// Sample standard deviation of daily revenue.
    pub revenue_volatility: f64,
    pub peak_revenue_hours: Vec<u32>,
    pub weekdays: Vec<PeriodSales>,
    pub months: Vec<PeriodSales>,
    pub top_cocktails_by_revenue: Vec<CocktailRevenue>,
    /// `(drinks per order, number of orders)` sorted by order size.
    pub order_sizes: Vec<(u32, usize)>,
}

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn average_growth_rate(daily_revenue: &[f64]) -> f64 {
    let changes: Vec<f64> = daily_revenue
        .windows(2)
        .filter(|pair| pair[0] > 0.0)
        .map(|pair| (pair[1] - pair[0]) / pair[0] * 100.0)
        .collect();
    mean(&changes)
}

pub fn sales_summary(input: &AnalysisInput) -> SalesSummaryReport {
    let daily = tally_by(input, |order| order.timestamp.date());
    let hourly = tally_by(input, |order| hour_of(&order.timestamp));
    let weekday = tally_by(input, |order| order.timestamp.weekday().num_days_from_monday());
    let monthly = tally_by(input, |order| order.timestamp.month());
    let by_cocktail = tally_by(input, |order| order.cocktail_name.clone());

    let total_orders = input.orders().len();
    let total_quantity: u64 = daily.values().map(|t| t.quantity).sum();
    let total_revenue: f64 = daily.values().map(|t| t.revenue).sum();
    let operating_days = daily.len();
    let days = operating_days as f64;

    let daily_revenue: Vec<f64> = daily.values().map(|t| t.revenue).collect();
    let mut best_day: Option<DayRevenue> = None;
    for (&date, tally) in &daily {
        if best_day.as_ref().map_or(true, |best| tally.revenue > best.revenue) {
            best_day = Some(DayRevenue {
                date,
                revenue: tally.revenue,
            });
        }
    }

    let peak_revenue_hours = top_n(
        hourly.iter().map(|(&hour, t)| (hour, t.revenue)).collect(),
        PEAK_HOUR_COUNT,
    )
    .into_iter()
    .map(|(hour, _)| hour)
    .collect();

    let weekdays = WEEKDAYS
        .iter()
        .map(|&day| {
            let tally = weekday
                .get(&day.num_days_from_monday())
                .copied()
                .unwrap_or_default();
            PeriodSales {
                period: weekday_name(day).to_string(),
                revenue: tally.revenue,
                quantity: tally.quantity,
                orders: tally.orders,
            }
        })
        .collect();

    let months = monthly
        .iter()
        .map(|(&month, tally)| PeriodSales {
            period: format!("{month:02}"),
            revenue: tally.revenue,
            quantity: tally.quantity,
            orders: tally.orders,
        })
        .collect();

    let top_cocktails_by_revenue = top_n(
        by_cocktail
            .iter()
            .map(|(name, t)| (name.clone(), t.revenue))
            .collect(),
        TOP_REVENUE_COCKTAILS,
    )
    .into_iter()
    .map(|(cocktail_name, revenue)| CocktailRevenue {
        cocktail_name,
        revenue,
    })
    .collect();

    let mut sizes: BTreeMap<u32, usize> = BTreeMap::new();
    for order in input.orders() {
        *sizes.entry(order.quantity).or_default() += 1;
    }

    SalesSummaryReport {
        total_orders,
        total_quantity,
        total_revenue,
        average_order_value: share(total_revenue, total_orders as f64),
        average_items_per_order: share(total_quantity as f64, total_orders as f64),
        unique_cocktails_sold: by_cocktail.len(),
        operating_days,
        average_daily_revenue: share(total_revenue, days),
        average_daily_orders: share(total_orders as f64, days),
        average_daily_quantity: share(total_quantity as f64, days),
        best_day,
        average_growth_rate: average_growth_rate(&daily_revenue),
        revenue_volatility: sample_std(&daily_revenue),
        peak_revenue_hours,
        weekdays,
        months,
        top_cocktails_by_revenue,
        order_sizes: sizes.into_iter().collect(),
    }
}

impl fmt::Display for SalesSummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Revenue: ${:.2}", self.total_revenue)?;
        writeln!(f, "Orders: {}  Drinks: {}", self.total_orders, self.total_quantity)?;
        writeln!(
            f,
            "Average order: ${:.2}, {:.1} drinks",
            self.average_order_value, self.average_items_per_order
        )?;
        writeln!(f, "Cocktails sold: {}", self.unique_cocktails_sold)?;
        writeln!(f, "Operating days: {}", self.operating_days)?;
        writeln!(
            f,
            "Daily averages: ${:.2} revenue, {:.1} orders, {:.1} drinks",
            self.average_daily_revenue, self.average_daily_orders, self.average_daily_quantity
        )?;
        if let Some(best) = &self.best_day {
            writeln!(f, "Best day: {} (${:.2})", best.date, best.revenue)?;
        }
        writeln!(f, "Average daily growth: {:.1}%", self.average_growth_rate)?;
        writeln!(f, "Revenue volatility: ${:.2}", self.revenue_volatility)?;
        writeln!(f, "Peak revenue hours: {}", fmt_hours(&self.peak_revenue_hours))?;
        writeln!(f, "By weekday:")?;
        for day in &self.weekdays {
            writeln!(
                f,
                "  {:<9}  ${:>9.2}  {:>5} drinks  {:>4} orders",
                day.period, day.revenue, day.quantity, day.orders
            )?;
        }
        if !self.months.is_empty() {
            writeln!(f, "By month:")?;
            for month in &self.months {
                writeln!(
                    f,
                    "  {:<9}  ${:>9.2}  {:>5} drinks  {:>4} orders",
                    month.period, month.revenue, month.quantity, month.orders
                )?;
            }
        }
        if !self.top_cocktails_by_revenue.is_empty() {
            writeln!(f, "Top cocktails by revenue:")?;
            for (rank, c) in self.top_cocktails_by_revenue.iter().enumerate() {
                writeln!(f, "  {:>2}. {} ${:.2}", rank + 1, c.cocktail_name, c.revenue)?;
            }
        }
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
    fn hourly_sales_ranks_peak_hours() {
        let report = hourly_sales(&fixtures::input());
        let hours: Vec<u32> = report.hours.iter().map(|h| h.hour).collect();
        assert_eq!(hours, vec![18, 20, 21, 22]);
        // 20h: 1 + 3 + 4 = 8 drinks over 3 orders
        assert_eq!(report.hours[1].quantity, 8);
        assert_eq!(report.hours[1].orders, 3);
        assert_eq!(report.peak_hours, vec![20, 18, 21]);
        assert_eq!(report.busiest_hour, Some(20));
        assert_eq!(report.quietest_hour, Some(22));
        assert_eq!(report.total_quantity, 13);
        assert!(close(report.peak_share, 12.0 / 13.0));
    }

    #[test]
    fn peak_time_uses_p75_threshold() {
        let report = peak_time(&fixtures::input());
        // hourly totals 2, 8, 2, 1 -> sorted 1, 2, 2, 8 -> p75 = 2 + 0.25 * 6
        assert!(close(report.threshold, 3.5));
        assert_eq!(report.peak_hours, vec![20]);
        assert_eq!(report.peak_period_sales, 8);
        assert_eq!(report.max_orders_in_hour, 3);
        assert!(close(report.average_orders_per_hour, 1.5));
    }

    #[test]
    fn sales_summary_totals_and_growth() {
        let report = sales_summary(&fixtures::input());
        // day 1: 5 mojitos * 9 + 1 negroni * 14 = 59
        // day 2: 2 old fashioned * 16 = 32
        // day 3: 4 mojitos * 9 + 1 negroni * 14 = 50
        assert!(close(report.total_revenue, 141.0));
        assert_eq!(report.operating_days, 3);
        assert_eq!(report.total_orders, 6);
        assert!(close(report.average_daily_revenue, 47.0));

        let best = report.best_day.unwrap();
        assert_eq!(best.date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        assert!(close(best.revenue, 59.0));

        let expected_growth = ((32.0 - 59.0) / 59.0 * 100.0 + (50.0 - 32.0) / 32.0 * 100.0) / 2.0;
        assert!(close(report.average_growth_rate, expected_growth));
        assert!(close(report.revenue_volatility, sample_std(&[59.0, 32.0, 50.0])));

        assert_eq!(report.weekdays.len(), 7);
        // 2025-01-06 is a Monday
        assert!(close(report.weekdays[0].revenue, 59.0));
        assert_eq!(report.top_cocktails_by_revenue[0].cocktail_name, "Mojito");
        assert!(close(report.top_cocktails_by_revenue[0].revenue, 81.0));
        assert_eq!(report.order_sizes, vec![(1, 2), (2, 2), (3, 1), (4, 1)]);
    }

    #[test]
    fn empty_input_zeroes_metrics() {
        let input = AnalysisInput::default();
        let summary = sales_summary(&input);
        assert_eq!(summary.total_orders, 0);
        assert_eq!(summary.average_order_value, 0.0);
        assert!(summary.best_day.is_none());
        assert_eq!(summary.revenue_volatility, 0.0);

        let hourly = hourly_sales(&input);
        assert!(hourly.peak_hours.is_empty());
        assert_eq!(hourly.peak_share, 0.0);
        assert_eq!(peak_time(&input).threshold, 0.0);
    }

    #[test]
    fn growth_skips_zero_revenue_days() {
        assert!(close(average_growth_rate(&[0.0, 10.0, 20.0]), 100.0));
        assert_eq!(average_growth_rate(&[10.0]), 0.0);
    }
}
