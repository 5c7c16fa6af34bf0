use std::path::Path;

use serde::Serialize;

use crate::error::AppError;
use crate::models::cocktail::{CatalogStats, Cocktail, CocktailInfo, CocktailUpdate, PriceStats};
use crate::services::catalog_service;
use crate::services::menu_import_service::{self, ImportSummary};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct MenuStats {
    pub catalog: CatalogStats,
    pub prices: PriceStats,
}

pub fn list_menu(state: &AppState) -> Result<Vec<CocktailInfo>, AppError> {
    let conn = state.conn();
    catalog_service::list_menu(&conn)
}

pub fn search_menu(state: &AppState, keyword: &str) -> Result<Vec<CocktailInfo>, AppError> {
    let conn = state.conn();
    catalog_service::search_menu(&conn, keyword)
}

pub fn show_cocktail(state: &AppState, name: &str) -> Result<CocktailInfo, AppError> {
    let conn = state.conn();
    Ok(catalog_service::get_cocktail(&conn, name)?.info())
}

pub fn add_cocktail(state: &AppState, cocktail: Cocktail) -> Result<CocktailInfo, AppError> {
    let conn = state.conn();
    catalog_service::add_cocktail(&conn, &cocktail)?;
    Ok(cocktail.info())
}

pub fn update_cocktail(
    state: &AppState,
    name: &str,
    update: &CocktailUpdate,
) -> Result<CocktailInfo, AppError> {
    let conn = state.conn();
    catalog_service::update_cocktail(&conn, name, update)?;
    Ok(catalog_service::get_cocktail(&conn, name)?.info())
}

pub fn delete_cocktail(state: &AppState, name: &str) -> Result<(), AppError> {
    let conn = state.conn();
    catalog_service::delete_cocktail(&conn, name)
}

pub fn menu_stats(state: &AppState) -> Result<MenuStats, AppError> {
    let conn = state.conn();
    Ok(MenuStats {
        catalog: catalog_service::statistics(&conn)?,
        prices: catalog_service::price_statistics(&conn)?,
    })
}

pub fn price_range(
    state: &AppState,
    min_price: f64,
    max_price: f64,
) -> Result<Vec<CocktailInfo>, AppError> {
    let conn = state.conn();
    catalog_service::by_price_range(&conn, min_price, max_price)
}

pub fn import_menu(state: &AppState, csv_path: &Path) -> Result<ImportSummary, AppError> {
    let conn = state.conn();
    menu_import_service::import_menu_csv(&conn, csv_path)
}
