pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod state;
pub mod topic;
pub mod tracing;

pub use config::ApiConfig;
pub use state::ApiState;
