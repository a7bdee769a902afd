pub mod api;
pub mod cli;
pub mod commands;
mod context;
pub mod daemon;
pub mod manager;
pub mod scheduler;
pub mod sources;

pub use context::AppContext;
