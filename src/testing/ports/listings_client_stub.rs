use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::AppError;
use crate::domain::zap2it::GridResponse;
use crate::ports::{GridRequest, ListingsClient};

/// Replays queued grid results, then answers with an empty grid.
#[derive(Default)]
pub struct FakeListingsClient {
    responses: Mutex<VecDeque<Result<GridResponse, AppError>>>,
    requests: Mutex<Vec<GridRequest>>,
    panics: AtomicUsize,
}

impl FakeListingsClient {
    pub fn push(&self, response: Result<GridResponse, AppError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Make the next call panic instead of answering.
    pub fn panic_next(&self) {
        self.panics.fetch_add(1, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<GridRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ListingsClient for FakeListingsClient {
    fn fetch_grid(&self, request: &GridRequest) -> Result<GridResponse, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        let pending = self.panics.load(Ordering::SeqCst);
        if pending > 0 {
            self.panics.store(pending - 1, Ordering::SeqCst);
            panic!("grid client failure");
        }
        self.responses.lock().unwrap().pop_front().unwrap_or_else(|| Ok(GridResponse::default()))
    }
}
