//! zap2xml-manager: fetch Zap2it and ESPN+ listings, write XMLTV, and serve it.

pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use app::api::{
    ConfigInfo, ConfigUpdate, DownloadOverrides, DownloadResult, InstallOptions, InstallOutcome,
    ServeOptions, StatusReport,
};
pub use domain::{AppError, Settings};
