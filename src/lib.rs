pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod profile;
pub mod store;

pub use app::{router, AppState};
pub use config::AppConfig;
