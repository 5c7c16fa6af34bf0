use chrono::NaiveDateTime;

use crate::error::AppError;
use crate::models::order::{CartItem, CheckoutReport, OrderEntry};
use crate::services::order_service;
use crate::state::AppState;

pub fn place_order(
    state: &AppState,
    cocktail_name: &str,
    quantity: u32,
    request: Option<&str>,
    at: Option<NaiveDateTime>,
) -> Result<OrderEntry, AppError> {
    let conn = state.conn();
    order_service::place_order(&conn, &state.orders, cocktail_name, quantity, request, at)
}

pub fn checkout(
    state: &AppState,
    cart: &[CartItem],
    request: Option<&str>,
) -> Result<CheckoutReport, AppError> {
    let conn = state.conn();
    order_service::checkout(&conn, &state.orders, cart, request)
}

pub fn list_orders(state: &AppState) -> Result<Vec<OrderEntry>, AppError> {
    state.orders.read_all()
}
