use std::path::{Path, PathBuf};

use directories::ProjectDirs;

pub const DB_FILE_NAME: &str = "ktail.db";
pub const ORDERS_FILE_NAME: &str = "orders.csv";
pub const DB_PATH_ENV: &str = "KTAIL_DB_PATH";
pub const ORDERS_PATH_ENV: &str = "KTAIL_ORDERS_PATH";

/// Where the catalog database and the order log live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub orders_path: PathBuf,
}

/// Platform data directory, or `./data` when no home directory can be found.
pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "ktail")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| Path::new("data").to_path_buf())
}

impl Config {
    /// Explicit paths win; anything left unset goes under `data_dir`.
    pub fn resolve_in(
        data_dir: &Path,
        db_path: Option<PathBuf>,
        orders_path: Option<PathBuf>,
    ) -> Self {
        Self {
            db_path: db_path.unwrap_or_else(|| data_dir.join(DB_FILE_NAME)),
            orders_path: orders_path.unwrap_or_else(|| data_dir.join(ORDERS_FILE_NAME)),
        }
    }

    pub fn resolve(db_path: Option<PathBuf>, orders_path: Option<PathBuf>) -> Self {
        Self::resolve_in(&default_data_dir(), db_path, orders_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_paths_win() {
        let config = Config::resolve_in(
            Path::new("/srv/bar"),
            Some(PathBuf::from("/tmp/menu.db")),
            None,
        );
        assert_eq!(config.db_path, PathBuf::from("/tmp/menu.db"));
        assert_eq!(config.orders_path, PathBuf::from("/srv/bar/orders.csv"));
    }

    #[test]
    fn defaults_share_a_directory() {
        let config = Config::resolve(None, None);
        assert_eq!(config.db_path.file_name().unwrap(), DB_FILE_NAME);
        assert_eq!(config.orders_path.file_name().unwrap(), ORDERS_FILE_NAME);
        assert_eq!(config.db_path.parent(), config.orders_path.parent());
    }
}
