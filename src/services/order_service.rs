use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::data::repository;
use crate::error::AppError;
use crate::models::order::{
    parse_order_timestamp, CartItem, CheckoutReport, FailedOrder, OrderEntry,
    ORDER_TIMESTAMP_FORMAT,
};

/// Marks an ingredient row that belongs to the order header above it.
pub const CONTINUATION_MARKER: &str = "--";

/// Splits a catalog ingredient list into its comma-separated phrases.
pub fn ingredient_phrases(ingredients: &str) -> Vec<String> {
    ingredients
        .split(',')
        .map(str::trim)
        .filter(|phrase| !phrase.is_empty())
        .map(str::to_string)
        .collect()
}

/// Append-only CSV log of completed orders.
///
/// Each order is a header row `timestamp,cocktail,quantity,request` followed
/// by one `-- <ingredient>` row per ingredient phrase.
#[derive(Debug, Clone)]
pub struct OrderLog {
    path: PathBuf,
}

impl OrderLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &OrderEntry) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);

        let timestamp = entry.timestamp.format(ORDER_TIMESTAMP_FORMAT).to_string();
        let quantity = entry.quantity.to_string();
        writer.write_record([
            timestamp.as_str(),
            entry.cocktail_name.as_str(),
            quantity.as_str(),
            entry.request.as_deref().unwrap_or(""),
        ])?;
        for ingredient in &entry.ingredients {
            writer.write_record([format!("{CONTINUATION_MARKER} {ingredient}")])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Reads every well-formed order. A missing log reads as no orders;
    /// rows that are neither headers nor continuations are skipped.
    pub fn read_all(&self) -> Result<Vec<OrderEntry>, AppError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "order log not found, treating as empty");
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?;

        let mut orders: Vec<OrderEntry> = Vec::new();
        let mut skipped = 0usize;
        let mut attach_to_last = false;

        for record in reader.records() {
            let record = match record {
                Ok(record) => record,
                Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
                Err(e) => {
                    debug!(error = %e, "unreadable order log row");
                    skipped += 1;
                    attach_to_last = false;
                    continue;
                }
            };
            let first = record.get(0).unwrap_or("").trim();

            if let Some(ingredient) = first.strip_prefix(CONTINUATION_MARKER) {
                if attach_to_last {
                    if let Some(order) = orders.last_mut() {
                        let ingredient = ingredient.trim();
                        if !ingredient.is_empty() {
                            order.ingredients.push(ingredient.to_string());
                        }
                    }
                }
                continue;
            }

            match parse_header(&record) {
                Some(order) => {
                    orders.push(order);
                    attach_to_last = true;
                }
                None => {
                    skipped += 1;
                    attach_to_last = false;
                }
            }
        }

        if skipped > 0 {
            debug!(skipped, "skipped non-order rows in order log");
        }
        Ok(orders)
    }
}

fn parse_header(record: &csv::StringRecord) -> Option<OrderEntry> {
    if record.len() < 3 {
        return None;
    }
    let timestamp = parse_order_timestamp(record.get(0)?)?;
    let cocktail_name = record.get(1)?.trim();
    if cocktail_name.is_empty() {
        return None;
    }
    let quantity: u32 = record.get(2)?.trim().parse().ok()?;
    let request = record
        .get(3)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    Some(OrderEntry {
        timestamp,
        cocktail_name: cocktail_name.to_string(),
        quantity,
        request,
        ingredients: Vec::new(),
    })
}

/// Records one order for a cocktail that exists on the menu and has a recipe.
pub fn place_order(
    conn: &Connection,
    log: &OrderLog,
    cocktail_name: &str,
    quantity: u32,
    request: Option<&str>,
    at: Option<NaiveDateTime>,
) -> Result<OrderEntry, AppError> {
    if quantity == 0 {
        return Err(AppError::InvalidInput(
            "quantity must be at least 1".to_string(),
        ));
    }

    let cocktail = repository::get_cocktail_by_name_ci(conn, cocktail_name)?
        .ok_or_else(|| AppError::NotFound(format!("cocktail '{}'", cocktail_name.trim())))?;
    let ingredients = repository::find_ingredients(conn, &cocktail.name)?.ok_or_else(|| {
        AppError::NotFound(format!("ingredients for cocktail '{}'", cocktail.name))
    })?;

    let entry = OrderEntry {
        timestamp: at.unwrap_or_else(|| Local::now().naive_local()),
        cocktail_name: cocktail.name,
        quantity,
        request: request
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string),
        ingredients: ingredient_phrases(&ingredients),
    };
    log.append(&entry)?;

    info!(
        cocktail = %entry.cocktail_name,
        quantity = entry.quantity,
        "order recorded"
    );
    Ok(entry)
}

/// Places every cart line; a failed line does not stop the others.
pub fn checkout(
    conn: &Connection,
    log: &OrderLog,
    cart: &[CartItem],
    request: Option<&str>,
) -> Result<CheckoutReport, AppError> {
    if cart.is_empty() {
        return Err(AppError::InvalidInput("cart is empty".to_string()));
    }

    let at = Local::now().naive_local();
    let mut report = CheckoutReport::default();

    for item in cart {
        match place_order(conn, log, &item.cocktail_name, item.quantity, request, Some(at)) {
            Ok(entry) => report.placed.push(entry),
            Err(e @ (AppError::NotFound(_) | AppError::InvalidInput(_))) => {
                let error = e.to_string();
                warn!(cocktail = %item.cocktail_name, %error, "cart line rejected");
                report.failed.push(FailedOrder {
                    cocktail_name: item.cocktail_name.clone(),
                    error,
                });
            }
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::migrations::run_migrations;
    use crate::models::cocktail::Cocktail;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let mut mojito = Cocktail::new("Mojito", "White Rum (2 oz), Lime, Mint, Soda Water");
        mojito.preparation = Some("Muddle, build, top".to_string());
        repository::insert_cocktail(&conn, &mojito).unwrap();
        repository::insert_cocktail(&conn, &Cocktail::new("Gimlet", "Gin, Lime Juice")).unwrap();
        let mut no_recipe = Cocktail::new("Mystery", "");
        no_recipe.ingredients = None;
        repository::insert_cocktail(&conn, &no_recipe).unwrap();
        conn
    }

    fn ts(value: &str) -> NaiveDateTime {
        parse_order_timestamp(value).unwrap()
    }

    #[test]
    fn test_place_order_writes_header_and_ingredient_lines() {
        let conn = setup_db();
        let dir = tempfile::tempdir().unwrap();
        let log = OrderLog::new(dir.path().join("data").join("orders.csv"));

        let entry = place_order(
            &conn,
            &log,
            "mojito",
            2,
            Some("less sugar, please"),
            Some(ts("2025-07-04 21:15:00")),
        )
        .unwrap();
        assert_eq!(entry.cocktail_name, "Mojito");

        let raw = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(
            lines,
            vec![
                "2025-07-04 21:15:00,Mojito,2,\"less sugar, please\"",
                "-- White Rum (2 oz)",
                "-- Lime",
                "-- Mint",
                "-- Soda Water",
            ]
        );
    }

    #[test]
    fn test_round_trip_through_log() {
        let conn = setup_db();
        let dir = tempfile::tempdir().unwrap();
        let log = OrderLog::new(dir.path().join("orders.csv"));

        place_order(&conn, &log, "Mojito", 1, None, Some(ts("2025-01-10 18:00:00"))).unwrap();
        place_order(&conn, &log, "Gimlet", 3, Some("extra lime"), Some(ts("2025-01-10 19:30:00")))
            .unwrap();

        let orders = log.read_all().unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].cocktail_name, "Mojito");
        assert_eq!(orders[0].ingredients.len(), 4);
        assert_eq!(orders[0].request, None);
        assert_eq!(orders[1].quantity, 3);
        assert_eq!(orders[1].ingredients, vec!["Gin", "Lime Juice"]);
        assert_eq!(orders[1].request.as_deref(), Some("extra lime"));
    }

    #[test]
    fn test_reader_skips_request_lines_and_legacy_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        std::fs::write(
            &path,
            "2025-03-01 20:00:00,Negroni,1\n\
             -- Gin\n\
             -- Campari\n\
             no ice please\n\
             -- stray ingredient\n\
             \n\
             2025-03-01 20:05:00,Negroni,Gin Campari Vermouth,Stir,\n\
             2025-03-01 21:00:00,Martini,2\n",
        )
        .unwrap();

        let orders = OrderLog::new(&path).read_all().unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].ingredients, vec!["Gin", "Campari"]);
        assert_eq!(orders[1].cocktail_name, "Martini");
        assert_eq!(orders[1].quantity, 2);
        assert!(orders[1].ingredients.is_empty());
    }

    #[test]
    fn test_reader_skips_undecodable_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        let mut bytes = b"2025-03-01 20:00:00,Negroni,1\n-- Gin\ngarbage ".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(b" row\n-- Campari\n2025-03-01 21:00:00,Martini,2\n");
        std::fs::write(&path, bytes).unwrap();

        let orders = OrderLog::new(&path).read_all().unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].ingredients, vec!["Gin"]);
        assert_eq!(orders[1].cocktail_name, "Martini");
    }

    #[test]
    fn test_missing_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = OrderLog::new(dir.path().join("absent.csv"));
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_place_order_rejects_unknown_and_recipe_less_cocktails() {
        let conn = setup_db();
        let dir = tempfile::tempdir().unwrap();
        let log = OrderLog::new(dir.path().join("orders.csv"));

        assert!(matches!(
            place_order(&conn, &log, "Zombie", 1, None, None),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            place_order(&conn, &log, "Mystery", 1, None, None),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            place_order(&conn, &log, "Mojito", 0, None, None),
            Err(AppError::InvalidInput(_))
        ));
        assert!(!log.path().exists());
    }

    #[test]
    fn test_checkout_reports_each_line() {
        let conn = setup_db();
        let dir = tempfile::tempdir().unwrap();
        let log = OrderLog::new(dir.path().join("orders.csv"));
        let cart = vec![
            CartItem {
                cocktail_name: "Mojito".to_string(),
                quantity: 2,
            },
            CartItem {
                cocktail_name: "Zombie".to_string(),
                quantity: 1,
            },
            CartItem {
                cocktail_name: "Gimlet".to_string(),
                quantity: 1,
            },
        ];

        let report = checkout(&conn, &log, &cart, None).unwrap();
        assert!(!report.is_success());
        assert_eq!(report.placed.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].cocktail_name, "Zombie");
        assert_eq!(report.placed[0].timestamp, report.placed[1].timestamp);
        assert_eq!(log.read_all().unwrap().len(), 2);

        assert!(matches!(
            checkout(&conn, &log, &[], None),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_ingredient_phrases_drop_blanks() {
        assert_eq!(
            ingredient_phrases("Gin, , Tonic ,"),
            vec!["Gin".to_string(), "Tonic".to_string()]
        );
    }
}
