pub mod app;
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod startup;

pub use app::{router, AppState};
