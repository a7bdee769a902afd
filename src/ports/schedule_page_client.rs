//! ESPN+ schedule page client port.

use crate::domain::AppError;

pub trait SchedulePageClient: Send + Sync {
    /// Fetch the raw schedule page HTML.
    fn fetch_schedule_page(&self) -> Result<String, AppError>;
}
