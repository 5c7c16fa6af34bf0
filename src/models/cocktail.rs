use serde::{Deserialize, Serialize};

pub const NOT_AVAILABLE: &str = "N/A";

/// One row of the menu catalog. `name` is the primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cocktail {
    pub name: String,
    pub ingredients: Option<String>,
    pub garnish: Option<String>,
    pub glassware: Option<String>,
    pub preparation: Option<String>,
    pub price: Option<f64>,
    pub note: Option<String>,
}

impl Cocktail {
    pub fn new(name: impl Into<String>, ingredients: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ingredients: Some(ingredients.into()),
            garnish: None,
            glassware: None,
            preparation: None,
            price: None,
            note: None,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Absent prices count as zero.
    pub fn unit_price(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }

    pub fn ingredients_text(&self) -> &str {
        self.ingredients.as_deref().unwrap_or("")
    }

    pub fn info(&self) -> CocktailInfo {
        CocktailInfo::from(self)
    }
}

/// Display form of a catalog row: every optional field resolved to text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocktailInfo {
    pub name: String,
    pub ingredients: String,
    pub garnish: String,
    pub glassware: String,
    pub preparation: String,
    pub price: String,
    pub note: String,
}

fn or_not_available(value: &Option<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) if p != 0.0 => format!("${p:.2}"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

impl From<&Cocktail> for CocktailInfo {
    fn from(cocktail: &Cocktail) -> Self {
        Self {
            name: cocktail.name.clone(),
            ingredients: cocktail.ingredients_text().to_string(),
            garnish: or_not_available(&cocktail.garnish),
            glassware: or_not_available(&cocktail.glassware),
            preparation: or_not_available(&cocktail.preparation),
            price: format_price(cocktail.price),
            note: or_not_available(&cocktail.note),
        }
    }
}

/// Partial update for a catalog row. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CocktailUpdate {
    pub ingredients: Option<String>,
    pub garnish: Option<String>,
    pub glassware: Option<String>,
    pub preparation: Option<String>,
    pub price: Option<f64>,
    pub note: Option<String>,
}

impl CocktailUpdate {
    pub fn is_empty(&self) -> bool {
        self.ingredients.is_none()
            && self.garnish.is_none()
            && self.glassware.is_none()
            && self.preparation.is_none()
            && self.price.is_none()
            && self.note.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_cocktails: i64,
    pub unique_cocktails: i64,
    pub has_ingredients: i64,
    pub has_garnish: i64,
    pub has_glassware: i64,
    pub has_preparation: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub average_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_fills_missing_fields_with_sentinel() {
        let mut cocktail = Cocktail::new("Negroni", "Gin, Campari, Sweet Vermouth");
        cocktail.garnish = Some("  ".to_string());
        cocktail.glassware = Some("Rocks".to_string());

        let info = cocktail.info();
        assert_eq!(info.garnish, "N/A");
        assert_eq!(info.glassware, "Rocks");
        assert_eq!(info.preparation, "N/A");
        assert_eq!(info.price, "N/A");
        assert_eq!(info.note, "N/A");
    }

    #[test]
    fn price_formats_as_dollars() {
        assert_eq!(format_price(Some(12.5)), "$12.50");
        assert_eq!(format_price(Some(0.0)), "N/A");
        assert_eq!(format_price(None), "N/A");
        assert_eq!(Cocktail::new("A", "B").unit_price(), 0.0);
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(CocktailUpdate::default().is_empty());
        let update = CocktailUpdate {
            price: Some(15.0),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
