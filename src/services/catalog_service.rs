use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use rusqlite::Connection;
use tracing::info;

use crate::data::repository;
use crate::error::AppError;
use crate::models::cocktail::{CatalogStats, Cocktail, CocktailInfo, CocktailUpdate, PriceStats};

fn validate_price(price: Option<f64>) -> Result<(), AppError> {
    match price {
        Some(p) if !p.is_finite() || p < 0.0 => Err(AppError::InvalidInput(format!(
            "price must be a non-negative amount, got {p}"
        ))),
        _ => Ok(()),
    }
}

pub fn list_menu(conn: &Connection) -> Result<Vec<CocktailInfo>, AppError> {
    Ok(repository::list_cocktails(conn)?
        .iter()
        .map(CocktailInfo::from)
        .collect())
}

pub fn get_cocktail(conn: &Connection, name: &str) -> Result<Cocktail, AppError> {
    repository::get_cocktail_by_name_ci(conn, name)?
        .ok_or_else(|| AppError::NotFound(format!("cocktail '{}'", name.trim())))
}

pub fn add_cocktail(conn: &Connection, cocktail: &Cocktail) -> Result<(), AppError> {
    if cocktail.name.trim().is_empty() {
        return Err(AppError::InvalidInput("cocktail name is required".to_string()));
    }
    validate_price(cocktail.price)?;

    match repository::insert_cocktail(conn, cocktail) {
        Ok(()) => {
            info!(name = %cocktail.name, "cocktail added");
            Ok(())
        }
        Err(e) if e.is_constraint_violation() => Err(AppError::Duplicate(format!(
            "cocktail '{}'",
            cocktail.name
        ))),
        Err(e) => Err(e),
    }
}

pub fn update_cocktail(
    conn: &Connection,
    name: &str,
    update: &CocktailUpdate,
) -> Result<(), AppError> {
    if update.is_empty() {
        return Err(AppError::InvalidInput(
            "no fields supplied for update".to_string(),
        ));
    }
    validate_price(update.price)?;

    let changed = repository::update_cocktail(conn, name, update)?;
    if changed == 0 {
        return Err(AppError::NotFound(format!("cocktail '{name}'")));
    }
    info!(name = %name, "cocktail updated");
    Ok(())
}

pub fn delete_cocktail(conn: &Connection, name: &str) -> Result<(), AppError> {
    if repository::delete_cocktail(conn, name)? == 0 {
        return Err(AppError::NotFound(format!("cocktail '{name}'")));
    }
    info!(name = %name, "cocktail deleted");
    Ok(())
}

pub fn statistics(conn: &Connection) -> Result<CatalogStats, AppError> {
    repository::catalog_stats(conn)
}

pub fn price_statistics(conn: &Connection) -> Result<PriceStats, AppError> {
    repository::price_stats(conn)
}

pub fn by_price_range(
    conn: &Connection,
    min_price: f64,
    max_price: f64,
) -> Result<Vec<CocktailInfo>, AppError> {
    if min_price > max_price {
        return Err(AppError::InvalidInput(format!(
            "min price {min_price} is above max price {max_price}"
        )));
    }
    Ok(repository::list_cocktails_by_price_range(conn, min_price, max_price)?
        .iter()
        .map(CocktailInfo::from)
        .collect())
}

/// Menu search box: name substring filter, with a fuzzy subsequence
/// fallback when nothing contains the keyword verbatim.
pub fn search_menu(conn: &Connection, keyword: &str) -> Result<Vec<CocktailInfo>, AppError> {
    let menu = repository::list_cocktails(conn)?;
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Ok(menu.iter().map(CocktailInfo::from).collect());
    }

    let needle = keyword.to_lowercase();
    let substring_hits: Vec<CocktailInfo> = menu
        .iter()
        .filter(|cocktail| cocktail.name.to_lowercase().contains(&needle))
        .map(CocktailInfo::from)
        .collect();
    if !substring_hits.is_empty() {
        return Ok(substring_hits);
    }

    let matcher = SkimMatcherV2::default();
    let mut fuzzy_hits: Vec<(i64, &Cocktail)> = menu
        .iter()
        .filter_map(|cocktail| {
            matcher
                .fuzzy_match(&cocktail.name, keyword)
                .map(|score| (score, cocktail))
        })
        .collect();
    fuzzy_hits.sort_by(|a, b| b.0.cmp(&a.0));

    Ok(fuzzy_hits
        .into_iter()
        .map(|(_, cocktail)| CocktailInfo::from(cocktail))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::migrations::run_migrations;

    fn setup_menu() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        for (name, ingredients, price) in [
            ("Margarita", "Tequila, Lime Juice, Triple Sec", 12.0),
            ("Frozen Margarita", "Tequila, Lime, Ice", 13.0),
            ("Mojito", "White Rum, Lime, Mint, Soda Water", 11.0),
            ("Old Fashioned", "Bourbon, Sugar, Angostura Bitters", 16.0),
        ] {
            add_cocktail(&conn, &Cocktail::new(name, ingredients).with_price(price)).unwrap();
        }
        conn
    }

    #[test]
    fn test_add_rejects_duplicates_and_bad_input() {
        let conn = setup_menu();
        let err = add_cocktail(&conn, &Cocktail::new("Mojito", "Rum")).unwrap_err();
        assert!(matches!(err, AppError::Duplicate(_)));

        let err = add_cocktail(&conn, &Cocktail::new("  ", "Rum")).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = add_cocktail(&conn, &Cocktail::new("Cheap", "Rum").with_price(-1.0)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_update_and_delete_report_missing_rows() {
        let conn = setup_menu();
        let update = CocktailUpdate {
            garnish: Some("Lime Wheel".to_string()),
            ..Default::default()
        };
        update_cocktail(&conn, "Margarita", &update).unwrap();
        assert_eq!(
            get_cocktail(&conn, "margarita").unwrap().garnish.as_deref(),
            Some("Lime Wheel")
        );

        assert!(matches!(
            update_cocktail(&conn, "Zombie", &update),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            update_cocktail(&conn, "Margarita", &CocktailUpdate::default()),
            Err(AppError::InvalidInput(_))
        ));

        delete_cocktail(&conn, "Mojito").unwrap();
        assert!(matches!(
            delete_cocktail(&conn, "Mojito"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_search_menu_filters_by_substring() {
        let conn = setup_menu();
        let hits = search_menu(&conn, "marg").unwrap();
        let names: Vec<&str> = hits.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Margarita", "Frozen Margarita"]);

        assert_eq!(search_menu(&conn, "").unwrap().len(), 4);
    }

    #[test]
    fn test_search_menu_falls_back_to_fuzzy() {
        let conn = setup_menu();
        let hits = search_menu(&conn, "oldfash").unwrap();
        assert_eq!(hits[0].name, "Old Fashioned");
        assert!(search_menu(&conn, "qqq").unwrap().is_empty());
    }

    #[test]
    fn test_price_range_validation() {
        let conn = setup_menu();
        let hits = by_price_range(&conn, 11.5, 13.0).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].price, "$12.00");
        assert!(matches!(
            by_price_range(&conn, 20.0, 10.0),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_list_menu_formats_display_fields() {
        let conn = setup_menu();
        let menu = list_menu(&conn).unwrap();
        assert_eq!(menu.len(), 4);
        assert_eq!(menu[0].garnish, "N/A");
        assert_eq!(menu[3].price, "$16.00");
        assert_eq!(statistics(&conn).unwrap().total_cocktails, 4);
        assert_eq!(price_statistics(&conn).unwrap().max_price, 16.0);
    }
}
