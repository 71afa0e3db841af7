pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;
pub mod query;
pub mod repository;
pub mod storage;

pub use client::DataClient;
pub use config::Config;
pub use error::{ApiError, AppError, AppResult};
pub use query::{Direction, QueryResult};
