use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::AppError;
use crate::models::admin::Admin;
use crate::models::cocktail::{CatalogStats, Cocktail, CocktailUpdate, PriceStats};

const COCKTAIL_COLUMNS: &str = "name, ingredients, garnish, glassware, preparation, price, note";

fn cocktail_from_row(row: &Row<'_>) -> rusqlite::Result<Cocktail> {
    Ok(Cocktail {
        name: row.get(0)?,
        ingredients: row.get(1)?,
        garnish: row.get(2)?,
        glassware: row.get(3)?,
        preparation: row.get(4)?,
        price: row.get(5)?,
        note: row.get(6)?,
    })
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn insert_cocktail(conn: &Connection, cocktail: &Cocktail) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO Cocktail (name, ingredients, garnish, glassware, preparation, price, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            cocktail.name,
            cocktail.ingredients,
            cocktail.garnish,
            cocktail.glassware,
            cocktail.preparation,
            cocktail.price,
            cocktail.note,
        ],
    )?;
    Ok(())
}

pub fn upsert_cocktail(conn: &Connection, cocktail: &Cocktail) -> Result<(), AppError> {
    conn.execute(
        "INSERT OR REPLACE INTO Cocktail (name, ingredients, garnish, glassware, preparation, price, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            cocktail.name,
            cocktail.ingredients,
            cocktail.garnish,
            cocktail.glassware,
            cocktail.preparation,
            cocktail.price,
            cocktail.note,
        ],
    )?;
    Ok(())
}

/// Applies only the supplied fields. Returns the number of rows changed.
pub fn update_cocktail(
    conn: &Connection,
    name: &str,
    update: &CocktailUpdate,
) -> Result<usize, AppError> {
    let mut assignments: Vec<&str> = Vec::new();
    let mut values: Vec<&dyn ToSql> = Vec::new();

    if let Some(ingredients) = &update.ingredients {
        assignments.push("ingredients = ?");
        values.push(ingredients);
    }
    if let Some(garnish) = &update.garnish {
        assignments.push("garnish = ?");
        values.push(garnish);
    }
    if let Some(glassware) = &update.glassware {
        assignments.push("glassware = ?");
        values.push(glassware);
    }
    if let Some(preparation) = &update.preparation {
        assignments.push("preparation = ?");
        values.push(preparation);
    }
    if let Some(price) = &update.price {
        assignments.push("price = ?");
        values.push(price);
    }
    if let Some(note) = &update.note {
        assignments.push("note = ?");
        values.push(note);
    }

    if assignments.is_empty() {
        return Ok(0);
    }

    let sql = format!(
        "UPDATE Cocktail SET {} WHERE name = ?",
        assignments.join(", ")
    );
    values.push(&name);
    let count = conn.execute(&sql, values.as_slice())?;
    Ok(count)
}

pub fn delete_cocktail(conn: &Connection, name: &str) -> Result<usize, AppError> {
    let count = conn.execute("DELETE FROM Cocktail WHERE name = ?1", params![name])?;
    Ok(count)
}

/// Every row with a name, in storage order.
pub fn list_cocktails(conn: &Connection) -> Result<Vec<Cocktail>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COCKTAIL_COLUMNS} FROM Cocktail WHERE name IS NOT NULL ORDER BY rowid"
    ))?;

    let cocktails = stmt
        .query_map([], cocktail_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(cocktails)
}

pub fn get_cocktail_by_name_ci(conn: &Connection, name: &str) -> Result<Option<Cocktail>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COCKTAIL_COLUMNS} FROM Cocktail WHERE LOWER(name) = LOWER(?1) LIMIT 1"
    ))?;

    let cocktail = stmt
        .query_row(params![name.trim()], cocktail_from_row)
        .optional()?;

    Ok(cocktail)
}

pub fn find_ingredients(conn: &Connection, name: &str) -> Result<Option<String>, AppError> {
    let ingredients: Option<Option<String>> = conn
        .query_row(
            "SELECT ingredients FROM Cocktail WHERE LOWER(name) = LOWER(?1) LIMIT 1",
            params![name.trim()],
            |row| row.get(0),
        )
        .optional()?;

    Ok(ingredients.flatten().filter(|text| !text.trim().is_empty()))
}

pub fn find_preparation(conn: &Connection, name: &str) -> Result<Option<String>, AppError> {
    let preparation: Option<Option<String>> = conn
        .query_row(
            "SELECT preparation FROM Cocktail WHERE LOWER(name) = LOWER(?1) LIMIT 1",
            params![name.trim()],
            |row| row.get(0),
        )
        .optional()?;

    Ok(preparation.flatten().filter(|text| !text.trim().is_empty()))
}

pub fn list_cocktails_by_price_range(
    conn: &Connection,
    min_price: f64,
    max_price: f64,
) -> Result<Vec<Cocktail>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COCKTAIL_COLUMNS} FROM Cocktail
         WHERE price >= ?1 AND price <= ?2
         ORDER BY price"
    ))?;

    let cocktails = stmt
        .query_map(params![min_price, max_price], cocktail_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(cocktails)
}

fn count(conn: &Connection, sql: &str) -> Result<i64, AppError> {
    Ok(conn.query_row(sql, [], |row| row.get(0))?)
}

pub fn catalog_stats(conn: &Connection) -> Result<CatalogStats, AppError> {
    Ok(CatalogStats {
        total_cocktails: count(conn, "SELECT COUNT(*) FROM Cocktail")?,
        unique_cocktails: count(conn, "SELECT COUNT(DISTINCT name) FROM Cocktail")?,
        has_ingredients: count(
            conn,
            "SELECT COUNT(*) FROM Cocktail WHERE ingredients IS NOT NULL AND ingredients != ''",
        )?,
        has_garnish: count(
            conn,
            "SELECT COUNT(*) FROM Cocktail WHERE garnish IS NOT NULL AND garnish != ''",
        )?,
        has_glassware: count(
            conn,
            "SELECT COUNT(*) FROM Cocktail WHERE glassware IS NOT NULL AND glassware != ''",
        )?,
        has_preparation: count(
            conn,
            "SELECT COUNT(*) FROM Cocktail WHERE preparation IS NOT NULL AND preparation != ''",
        )?,
    })
}

pub fn price_stats(conn: &Connection) -> Result<PriceStats, AppError> {
    let (avg, min, max): (Option<f64>, Option<f64>, Option<f64>) = conn.query_row(
        "SELECT AVG(price), MIN(price), MAX(price) FROM Cocktail WHERE price IS NOT NULL",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    Ok(PriceStats {
        average_price: avg.map(round_cents).unwrap_or(0.0),
        min_price: min.map(round_cents).unwrap_or(0.0),
        max_price: max.map(round_cents).unwrap_or(0.0),
    })
}

pub fn insert_admin(
    conn: &Connection,
    name: &str,
    password_digest: &str,
    role: &str,
    now: &str,
) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO Admin (name, passwd, role, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![name, password_digest, role, now, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn delete_admin(conn: &Connection, name: &str) -> Result<usize, AppError> {
    let count = conn.execute("DELETE FROM Admin WHERE name = ?1", params![name])?;
    Ok(count)
}

pub fn list_admins(conn: &Connection) -> Result<Vec<Admin>, AppError> {
    let mut stmt =
        conn.prepare("SELECT id, name, role, created_at, updated_at FROM Admin ORDER BY id")?;

    let admins = stmt
        .query_map([], |row| {
            Ok(Admin {
                id: row.get(0)?,
                name: row.get(1)?,
                role: row
                    .get::<_, Option<String>>(2)?
                    .unwrap_or_else(|| crate::models::admin::DEFAULT_ADMIN_ROLE.to_string()),
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(admins)
}

pub fn admin_exists_with_digest(
    conn: &Connection,
    name: &str,
    password_digest: &str,
) -> Result<bool, AppError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM Admin WHERE name = ?1 AND passwd = ?2",
            params![name, password_digest],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}
