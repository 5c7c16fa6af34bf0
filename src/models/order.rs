use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const ORDER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_order_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), ORDER_TIMESTAMP_FORMAT).ok()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEntry {
    pub timestamp: NaiveDateTime,
    pub cocktail_name: String,
    pub quantity: u32,
    pub request: Option<String>,
    pub ingredients: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub cocktail_name: String,
    pub quantity: u32,
}

impl std::str::FromStr for CartItem {
    type Err = String;

    /// Parses `name=qty`; a bare name means one drink.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, quantity) = match s.rsplit_once('=') {
            Some((name, qty)) => {
                let qty = qty
                    .trim()
                    .parse::<u32>()
                    .map_err(|e| format!("invalid quantity in '{s}': {e}"))?;
                (name, qty)
            }
            None => (s, 1),
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing cocktail name in '{s}'"));
        }
        Ok(Self {
            cocktail_name: name.to_string(),
            quantity,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedOrder {
    pub cocktail_name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckoutReport {
    pub placed: Vec<OrderEntry>,
    pub failed: Vec<FailedOrder>,
}

impl CheckoutReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cart_item_parses_name_and_quantity() {
        let item: CartItem = "Old Fashioned=3".parse().unwrap();
        assert_eq!(item.cocktail_name, "Old Fashioned");
        assert_eq!(item.quantity, 3);

        let item: CartItem = "Mojito".parse().unwrap();
        assert_eq!(item.quantity, 1);
    }

    #[test]
    fn cart_item_rejects_bad_input() {
        assert!("=2".parse::<CartItem>().is_err());
        assert!("Mojito=two".parse::<CartItem>().is_err());
    }

    #[test]
    fn timestamps_use_log_format() {
        let ts = parse_order_timestamp("2025-07-04 21:15:00").unwrap();
        assert_eq!(ts.format(ORDER_TIMESTAMP_FORMAT).to_string(), "2025-07-04 21:15:00");
        assert!(parse_order_timestamp("yesterday").is_none());
    }
}
