use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ports::{RefreshControl, RefreshStatus};

/// Counts refresh requests and reports a fixed status.
#[derive(Default)]
pub struct FakeRefreshControl {
    pub refreshes: AtomicUsize,
}

impl FakeRefreshControl {
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl RefreshControl for FakeRefreshControl {
    fn status(&self) -> RefreshStatus {
        RefreshStatus {
            running: true,
            enabled: true,
            interval_hours: 12,
            last_refresh: None,
            next_refresh: None,
        }
    }

    fn refresh_now(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }
}
