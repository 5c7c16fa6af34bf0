use std::path::Path;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data::repository;
use crate::error::AppError;
use crate::models::cocktail::Cocktail;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct MenuRow {
    #[serde(rename = "Cocktail Name", default)]
    name: Option<String>,
    #[serde(rename = "Ingredients", default)]
    ingredients: Option<String>,
    #[serde(rename = "Garnish", default)]
    garnish: Option<String>,
    #[serde(rename = "Glassware", default)]
    glassware: Option<String>,
    #[serde(rename = "Preparation", default)]
    preparation: Option<String>,
    #[serde(rename = "Price", default)]
    price: Option<String>,
    #[serde(rename = "Notes", default)]
    note: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accepts `12`, `12.5` and `$1,200.00`.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|p| p.is_finite() && *p >= 0.0)
}

impl MenuRow {
    fn into_cocktail(self, line: u64) -> Option<Cocktail> {
        let name = non_blank(self.name)?;
        let price = match non_blank(self.price) {
            Some(raw) => match parse_price(&raw) {
                Some(price) => Some(price),
                None => {
                    warn!(line, name = %name, price = %raw, "unreadable price, storing none");
                    None
                }
            },
            None => None,
        };
        Some(Cocktail {
            name,
            ingredients: non_blank(self.ingredients),
            garnish: non_blank(self.garnish),
            glassware: non_blank(self.glassware),
            preparation: non_blank(self.preparation),
            price,
            note: non_blank(self.note),
        })
    }
}

/// Loads a menu CSV into the catalog. Rows are upserted, so a later row with
/// the same name replaces an earlier one. All-or-nothing.
pub fn import_menu_csv(conn: &Connection, path: &Path) -> Result<ImportSummary, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let tx = conn.unchecked_transaction()?;
    let mut summary = ImportSummary::default();

    for (idx, row) in reader.deserialize::<MenuRow>().enumerate() {
        // header is line 1
        let line = idx as u64 + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(line, error = %e, "unreadable menu row skipped");
                summary.skipped += 1;
                continue;
            }
        };
        match row.into_cocktail(line) {
            Some(cocktail) => {
                repository::upsert_cocktail(&tx, &cocktail)?;
                summary.imported += 1;
            }
            None => {
                warn!(line, "menu row without a cocktail name skipped");
                summary.skipped += 1;
            }
        }
    }

    tx.commit()?;
    info!(
        path = %path.display(),
        imported = summary.imported,
        skipped = summary.skipped,
        "menu imported"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::migrations::run_migrations;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_parse_price_variants() {
        assert_eq!(parse_price("12"), Some(12.0));
        assert_eq!(parse_price(" 12.5 "), Some(12.5));
        assert_eq!(parse_price("$1,200.00"), Some(1200.0));
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("market"), None);
        assert_eq!(parse_price("-3"), None);
    }

    #[test]
    fn test_import_trims_and_upserts() {
        let conn = setup_db();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menu.csv");
        std::fs::write(
            &path,
            " Cocktail Name ,Ingredients,Garnish,Glassware,Preparation,Price,Notes\n\
             Mojito,\"White Rum (2 oz), Lime, Mint\",Mint Sprig,Highball,Muddle,$11.00,\n\
             ,Gin,,,,,\n\
             Negroni,\"Gin, Campari, Sweet Vermouth\",  ,Rocks,Stir,12,Bitter\n\
             Mojito,\"White Rum, Lime, Mint, Soda\",,,,\"$1,200.00\",\n",
        )
        .unwrap();

        let summary = import_menu_csv(&conn, &path).unwrap();
        assert_eq!(summary, ImportSummary { imported: 3, skipped: 1 });

        let menu = repository::list_cocktails(&conn).unwrap();
        assert_eq!(menu.len(), 2);

        let mojito = repository::get_cocktail_by_name_ci(&conn, "mojito")
            .unwrap()
            .unwrap();
        assert_eq!(mojito.price, Some(1200.0));
        assert_eq!(mojito.garnish, None);

        let negroni = repository::get_cocktail_by_name_ci(&conn, "Negroni")
            .unwrap()
            .unwrap();
        assert_eq!(negroni.garnish, None);
        assert_eq!(negroni.glassware.as_deref(), Some("Rocks"));
        assert_eq!(negroni.note.as_deref(), Some("Bitter"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let conn = setup_db();
        let dir = tempfile::tempdir().unwrap();
        let err = import_menu_csv(&conn, &dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, AppError::Csv(_)));
    }
}
