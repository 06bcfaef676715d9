pub mod image;
pub mod tier;
pub mod token;
pub mod user;
