pub mod admin_service;
pub mod catalog_service;
pub mod menu_import_service;
pub mod order_service;
pub mod recommendation_service;
