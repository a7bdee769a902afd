use std::sync::Mutex;

use crate::domain::AppError;
use crate::ports::SchedulePageClient;

/// Serves a fixed schedule page, or fails once with a given error and then
/// with a generic network error.
pub struct FakeSchedulePage {
    page: Mutex<Result<String, AppError>>,
    pub calls: Mutex<usize>,
}

impl FakeSchedulePage {
    pub fn with_html(html: &str) -> Self {
        Self { page: Mutex::new(Ok(html.to_string())), calls: Mutex::new(0) }
    }

    pub fn failing(error: AppError) -> Self {
        Self { page: Mutex::new(Err(error)), calls: Mutex::new(0) }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl SchedulePageClient for FakeSchedulePage {
    fn fetch_schedule_page(&self) -> Result<String, AppError> {
        *self.calls.lock().unwrap() += 1;
        let mut page = self.page.lock().unwrap();
        match &mut *page {
            Ok(html) => Ok(html.clone()),
            Err(e) => Err(std::mem::replace(e, AppError::Network("page unavailable".into()))),
        }
    }
}
