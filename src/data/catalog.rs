use rusqlite::Connection;

use crate::data::repository;
use crate::error::AppError;
use crate::models::cocktail::Cocktail;

/// Read access to the menu catalog, as seen by the recommendation engine.
///
/// Implementations return every record that has a name, in whatever order the
/// backing store keeps them. Failures are passed through untouched.
pub trait CatalogStore {
    fn list_all_cocktails(&self) -> Result<Vec<Cocktail>, AppError>;
}

impl CatalogStore for Connection {
    fn list_all_cocktails(&self) -> Result<Vec<Cocktail>, AppError> {
        repository::list_cocktails(self)
    }
}

impl CatalogStore for [Cocktail] {
    fn list_all_cocktails(&self) -> Result<Vec<Cocktail>, AppError> {
        Ok(self.to_vec())
    }
}

impl CatalogStore for Vec<Cocktail> {
    fn list_all_cocktails(&self) -> Result<Vec<Cocktail>, AppError> {
        self.as_slice().list_all_cocktails()
    }
}

impl<T: CatalogStore + ?Sized> CatalogStore for &T {
    fn list_all_cocktails(&self) -> Result<Vec<Cocktail>, AppError> {
        (**self).list_all_cocktails()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::migrations::run_migrations;

    #[test]
    fn connection_lists_stored_rows() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        repository::insert_cocktail(&conn, &Cocktail::new("Daiquiri", "Rum, Lime, Sugar"))
            .unwrap();

        let listed = (&conn).list_all_cocktails().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Daiquiri");
    }

    #[test]
    fn fixtures_list_in_order() {
        let fixtures = vec![Cocktail::new("B", "x"), Cocktail::new("A", "y")];
        let listed = fixtures.list_all_cocktails().unwrap();
        assert_eq!(listed, fixtures);
    }

    #[test]
    fn missing_table_surfaces_database_error() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn.list_all_cocktails().unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
