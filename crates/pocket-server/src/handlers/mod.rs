//! HTTP request handlers for API endpoints.

pub mod feedback;
pub mod health;
pub mod history;
pub mod infer;
pub mod metrics;

pub use feedback::handle_feedback;
pub use health::handle_health;
pub use history::{handle_history, handle_sessions};
pub use infer::handle_infer;
pub use metrics::handle_metrics;
