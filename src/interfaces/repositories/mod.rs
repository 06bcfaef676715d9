pub mod image;
pub mod sqlx_repo;
pub mod tier;
pub mod token;
pub mod user;
