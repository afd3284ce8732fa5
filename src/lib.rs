//! Small study log. Study sessions (topic + hours) are kept in a remote table, the application
//! loads them on start, shows the running total and lets you register or delete sessions.
//!

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod store;
pub mod utils;
