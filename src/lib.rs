// Library interface for the adaptrs modules
// This allows integration tests to access the core functionality

pub mod config;
pub mod daily_state;
pub mod database;
pub mod delta;
pub mod error;
pub mod logging;
pub mod models;
pub mod zones;

// Re-export commonly used types for convenience
pub use daily_state::DailyStateUpdater;
pub use database::{Database, DAILY_STATE_WINDOW};
pub use delta::DeltaCalculator;
pub use error::{AdaptError, DatabaseError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::*;
pub use zones::Zone;
