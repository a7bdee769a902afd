pub mod config;
pub mod download;
pub mod install;
pub mod serve;
pub mod status;
