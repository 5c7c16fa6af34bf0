use serde::{Deserialize, Serialize};

pub const DEFAULT_ADMIN_ROLE: &str = "root";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}
