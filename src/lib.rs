// Core modules
pub mod api;
pub mod config;
pub mod context;
pub mod decision;
pub mod error;
pub mod exchange;
pub mod execution;
pub mod indicators;
pub mod market_data;
pub mod models;
pub mod news;
pub mod pipeline;
pub mod scheduler;

// Re-export commonly used types
pub use error::Error;
pub use models::*;
pub use pipeline::{BotSettings, TickReport, TradingBot, TradingSession};

// Error handling
pub type Result<T> = std::result::Result<T, Error>;
