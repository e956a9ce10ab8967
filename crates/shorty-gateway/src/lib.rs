//! HTTP gateway for the shorty URL shortener.
//!
//! Wires configuration, the selected storage backend and the code
//! generator into an axum router.

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;
pub mod telemetry;
pub mod validation;

pub use app::App;
pub use config::Config;
pub use state::AppState;
