//! Construction of source clients from the current settings.

use std::sync::Arc;

use crate::domain::{AppError, Settings};
use crate::ports::{ListingsClient, SchedulePageClient};

/// Builds clients for each download, so URL, timeout and retry settings are
/// picked up as they change.
pub trait ClientFactory: Send + Sync {
    fn listings_client(&self, settings: &Settings) -> Result<Arc<dyn ListingsClient>, AppError>;

    fn schedule_client(&self, settings: &Settings)
    -> Result<Arc<dyn SchedulePageClient>, AppError>;
}
