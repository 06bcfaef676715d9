pub mod entities;
pub mod formats;
pub mod use_cases;
