use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::Config;
use crate::data;
use crate::error::AppError;
use crate::services::order_service::OrderLog;

pub struct AppState {
    pub db: Mutex<Connection>,
    pub db_path: PathBuf,
    pub orders: OrderLog,
}

impl AppState {
    pub fn open(config: &Config) -> Result<Self, AppError> {
        let conn = data::open_database(&config.db_path)?;
        Ok(Self::with_connection(
            conn,
            config.db_path.clone(),
            OrderLog::new(&config.orders_path),
        ))
    }

    pub fn with_connection(conn: Connection, db_path: PathBuf, orders: OrderLog) -> Self {
        Self {
            db: Mutex::new(conn),
            db_path,
            orders,
        }
    }

    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_database_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::resolve_in(&dir.path().join("nested"), None, None);
        let state = AppState::open(&config).unwrap();

        assert!(config.db_path.exists());
        let tables: i64 = state
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'Cocktail'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
        assert_eq!(state.orders.path(), config.orders_path.as_path());
    }
}
