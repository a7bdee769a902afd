//! Production client factory.

use std::sync::Arc;

use super::{HttpListingsClient, HttpSchedulePageClient};
use crate::domain::{AppError, Settings};
use crate::ports::{ClientFactory, ListingsClient, SchedulePageClient};

#[derive(Debug, Clone, Copy, Default)]
pub struct HttpClientFactory;

impl ClientFactory for HttpClientFactory {
    fn listings_client(&self, settings: &Settings) -> Result<Arc<dyn ListingsClient>, AppError> {
        Ok(Arc::new(HttpListingsClient::new(settings)?))
    }

    fn schedule_client(
        &self,
        settings: &Settings,
    ) -> Result<Arc<dyn SchedulePageClient>, AppError> {
        Ok(Arc::new(HttpSchedulePageClient::new(settings)?))
    }
}
