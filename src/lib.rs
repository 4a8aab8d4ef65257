// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod answer;
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod deck;
pub mod difficulty;
pub mod history;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod ui;
