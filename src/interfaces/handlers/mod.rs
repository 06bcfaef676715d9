pub mod auth;
pub mod home;
pub mod images;
pub mod json_error;
pub mod system;
