pub mod admin;
pub mod cocktail;
pub mod order;
pub mod recommendation;
