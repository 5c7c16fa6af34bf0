pub mod admin_commands;
pub mod analysis_commands;
pub mod menu_commands;
pub mod order_commands;
pub mod recommend_commands;
