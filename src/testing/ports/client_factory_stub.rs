use std::sync::{Arc, Mutex};

use crate::domain::{AppError, Settings};
use crate::ports::{ClientFactory, ListingsClient, SchedulePageClient};

/// Hands out the same fakes for every download and records the settings
/// each client was built from.
pub struct FakeClientFactory {
    listings: Arc<dyn ListingsClient>,
    schedule: Arc<dyn SchedulePageClient>,
    pub built_with: Mutex<Vec<Settings>>,
}

impl FakeClientFactory {
    pub fn new(listings: Arc<dyn ListingsClient>, schedule: Arc<dyn SchedulePageClient>) -> Self {
        Self { listings, schedule, built_with: Mutex::new(Vec::new()) }
    }
}

impl ClientFactory for FakeClientFactory {
    fn listings_client(&self, settings: &Settings) -> Result<Arc<dyn ListingsClient>, AppError> {
        self.built_with.lock().unwrap().push(settings.clone());
        Ok(Arc::clone(&self.listings))
    }

    fn schedule_client(
        &self,
        settings: &Settings,
    ) -> Result<Arc<dyn SchedulePageClient>, AppError> {
        self.built_with.lock().unwrap().push(settings.clone());
        Ok(Arc::clone(&self.schedule))
    }
}
