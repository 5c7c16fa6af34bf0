use crate::error::AppError;
use crate::models::admin::Admin;
use crate::services::admin_service;
use crate::state::AppState;

pub fn add_admin(
    state: &AppState,
    name: &str,
    password: &str,
    role: Option<&str>,
) -> Result<Admin, AppError> {
    let conn = state.conn();
    admin_service::add_admin(&conn, name, password, role)
}

pub fn delete_admin(state: &AppState, name: &str) -> Result<(), AppError> {
    let conn = state.conn();
    admin_service::delete_admin(&conn, name)
}

pub fn list_admins(state: &AppState) -> Result<Vec<Admin>, AppError> {
    let conn = state.conn();
    admin_service::list_admins(&conn)
}

pub fn verify_admin(state: &AppState, name: &str, password: &str) -> Result<bool, AppError> {
    let conn = state.conn();
    admin_service::verify_admin(&conn, name, password)
}
