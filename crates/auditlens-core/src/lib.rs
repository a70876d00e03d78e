pub mod analytics;
pub mod config;
pub mod error;
pub mod event;
pub mod ingest;
pub mod numeric;
pub mod period;
pub mod principal;
pub mod visitor;
