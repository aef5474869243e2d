pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod feed;
pub mod models;
pub mod service;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use service::{reconcile, StocktakeService};
