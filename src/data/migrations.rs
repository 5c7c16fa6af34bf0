use rusqlite::Connection;

use crate::error::AppError;

const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS Cocktail (
    name TEXT PRIMARY KEY,
    ingredients TEXT,
    garnish TEXT,
    glassware TEXT,
    preparation TEXT,
    price REAL,
    note TEXT
);

CREATE INDEX IF NOT EXISTS idx_cocktail_price ON Cocktail(price);

CREATE TABLE IF NOT EXISTS Admin (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    passwd TEXT NOT NULL,
    role TEXT DEFAULT 'root',
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
);
";

pub fn run_migrations(conn: &Connection) -> Result<(), AppError> {
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch(SCHEMA_V1)?;
    Ok(())
}
