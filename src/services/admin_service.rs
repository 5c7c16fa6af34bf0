use chrono::Local;
use rusqlite::Connection;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::data::repository;
use crate::error::AppError;
use crate::models::admin::{Admin, DEFAULT_ADMIN_ROLE};

const ADMIN_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Hex-encoded SHA-256 of the password. Plaintext never reaches the database.
pub fn password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub fn add_admin(
    conn: &Connection,
    name: &str,
    password: &str,
    role: Option<&str>,
) -> Result<Admin, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("admin name is required".to_string()));
    }
    if password.is_empty() {
        return Err(AppError::InvalidInput("password is required".to_string()));
    }
    let role = role
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_ADMIN_ROLE);

    let now = Local::now().format(ADMIN_TIMESTAMP_FORMAT).to_string();
    let id = match repository::insert_admin(conn, name, &password_digest(password), role, &now) {
        Ok(id) => id,
        Err(e) if e.is_constraint_violation() => {
            return Err(AppError::Duplicate(format!("admin '{name}'")));
        }
        Err(e) => return Err(e),
    };

    info!(admin = %name, role = %role, "admin added");
    Ok(Admin {
        id,
        name: name.to_string(),
        role: role.to_string(),
        created_at: Some(now.clone()),
        updated_at: Some(now),
    })
}

pub fn delete_admin(conn: &Connection, name: &str) -> Result<(), AppError> {
    if repository::delete_admin(conn, name.trim())? == 0 {
        return Err(AppError::NotFound(format!("admin '{}'", name.trim())));
    }
    info!(admin = %name.trim(), "admin deleted");
    Ok(())
}

pub fn list_admins(conn: &Connection) -> Result<Vec<Admin>, AppError> {
    repository::list_admins(conn)
}

pub fn verify_admin(conn: &Connection, name: &str, password: &str) -> Result<bool, AppError> {
    let ok = repository::admin_exists_with_digest(conn, name.trim(), &password_digest(password))?;
    if !ok {
        warn!(admin = %name.trim(), "admin credentials rejected");
    }
    Ok(ok)
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
    fn test_digest_is_sha256_hex() {
        assert_eq!(
            password_digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_add_verify_delete() {
        let conn = setup_db();
        let admin = add_admin(&conn, " alice ", "s3cret", None).unwrap();
        assert_eq!(admin.name, "alice");
        assert_eq!(admin.role, DEFAULT_ADMIN_ROLE);

        assert!(verify_admin(&conn, "alice", "s3cret").unwrap());
        assert!(!verify_admin(&conn, "alice", "wrong").unwrap());
        assert!(!verify_admin(&conn, "bob", "s3cret").unwrap());

        let stored: String = conn
            .query_row("SELECT passwd FROM Admin WHERE name = 'alice'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(stored, password_digest("s3cret"));

        delete_admin(&conn, "alice").unwrap();
        assert!(matches!(
            delete_admin(&conn, "alice"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_add_rejects_duplicates_and_blanks() {
        let conn = setup_db();
        add_admin(&conn, "alice", "pw", Some("manager")).unwrap();
        assert!(matches!(
            add_admin(&conn, "alice", "other", None),
            Err(AppError::Duplicate(_))
        ));
        assert!(matches!(
            add_admin(&conn, "", "pw", None),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            add_admin(&conn, "bob", "", None),
            Err(AppError::InvalidInput(_))
        ));

        let admins = list_admins(&conn).unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].role, "manager");
    }
}
