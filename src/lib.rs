pub mod api;
pub mod app;
pub mod config;
pub mod errors;
pub mod filters;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod stats;
pub mod ui;
pub mod state;

pub use app::router;
pub use config::Config;
pub use state::AppState;
