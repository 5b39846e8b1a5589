pub mod admin;
pub mod profile;
pub mod reports;
pub mod system;
