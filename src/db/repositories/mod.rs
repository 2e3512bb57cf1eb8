pub mod recipe;
pub mod taxonomy;
pub mod token;
pub mod user;
