pub mod analysis;
pub mod dashboard;
pub mod data;
pub mod extract;
pub mod files;
pub mod health;
pub mod query;
