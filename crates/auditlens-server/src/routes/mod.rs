pub mod analytics;
pub mod client;
pub mod health;
pub mod track;
