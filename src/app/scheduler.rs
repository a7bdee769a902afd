//! Background auto-refresh.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Utc;
use log::{error, info, warn};

use crate::app::AppContext;
use crate::app::manager::EpgManager;
use crate::domain::{Settings, refresh};
use crate::ports::{ProgressSink, RefreshControl, RefreshStatus};

/// How often the loop checks whether a refresh is due.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

fn lock(settings: &Mutex<Settings>) -> MutexGuard<'_, Settings> {
    settings.lock().unwrap_or_else(|e| e.into_inner())
}

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

struct Shared {
    ctx: AppContext,
    settings: Arc<Mutex<Settings>>,
    sink: Arc<dyn ProgressSink>,
    refreshing: AtomicBool,
}

/// Refreshes the guide whenever `refresh_interval_hours` have passed since
/// the last successful download.
///
/// The effective settings are shared with the server; a successful refresh
/// records `last_refresh` in them.
pub struct Scheduler {
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
    check_interval: Duration,
}

impl Scheduler {
    pub fn new(
        ctx: AppContext,
        settings: Arc<Mutex<Settings>>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared { ctx, settings, sink, refreshing: AtomicBool::new(false) }),
            worker: Mutex::new(None),
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    pub fn settings(&self) -> Arc<Mutex<Settings>> {
        Arc::clone(&self.shared.settings)
    }

    /// Start the loop. Returns `false` when it was already running.
    pub fn start(&self) -> bool {
        let mut worker = self.worker.lock().unwrap_or_else(|e| e.into_inner());
        if worker.as_ref().is_some_and(|w| !w.handle.is_finished()) {
            info!("Scheduler already running");
            return false;
        }

        let (stop_tx, stop_rx) = mpsc::channel();
        let shared = Arc::clone(&self.shared);
        let interval = self.check_interval;
        let spawned = thread::Builder::new()
            .name("epg-scheduler".to_string())
            .spawn(move || shared.run(stop_rx, interval));

        match spawned {
            Ok(handle) => {
                info!(
                    "Scheduler started (refresh every {} hours)",
                    lock(&self.shared.settings).refresh_interval_hours
                );
                *worker = Some(Worker { stop_tx, handle });
                true
            }
            Err(e) => {
                error!("Could not start scheduler thread: {}", e);
                false
            }
        }
    }

    /// Signal the loop and wait up to five seconds for it to exit. A refresh
    /// still in flight is left to finish on its own.
    pub fn stop(&self) {
        let Some(worker) = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take() else {
            return;
        };
        let _ = worker.stop_tx.send(());

        let deadline = Instant::now() + STOP_TIMEOUT;
        while !worker.handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        if worker.handle.is_finished() {
            if worker.handle.join().is_err() {
                error!("Scheduler thread panicked");
            }
            info!("Scheduler stopped");
        } else {
            warn!("Scheduler still busy after {:?}; detaching", STOP_TIMEOUT);
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    /// Run a refresh on a new thread. Returns `None` when the thread could
    /// not be spawned.
    pub fn trigger_refresh(&self) -> Option<JoinHandle<bool>> {
        let shared = Arc::clone(&self.shared);
        thread::Builder::new()
            .name("epg-refresh".to_string())
            .spawn(move || shared.refresh())
            .map_err(|e| error!("Could not start refresh thread: {}", e))
            .ok()
    }

    pub fn status(&self) -> RefreshStatus {
        let settings = lock(&self.shared.settings);
        RefreshStatus {
            running: self.is_running(),
            enabled: settings.auto_refresh_enabled,
            interval_hours: settings.refresh_interval_hours,
            last_refresh: settings.last_refresh.clone(),
            next_refresh: refresh::next_refresh(&settings, Utc::now()).map(|t| t.to_rfc3339()),
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl RefreshControl for Scheduler {
    fn status(&self) -> RefreshStatus {
        Scheduler::status(self)
    }

    fn refresh_now(&self) {
        let _ = self.trigger_refresh();
    }
}

impl Shared {
    fn run(&self, stop: Receiver<()>, interval: Duration) {
        loop {
            let due = refresh::should_refresh(&lock(&self.settings), Utc::now());
            if due {
                self.refresh();
            }
            match stop.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    /// Download with the current effective settings. Returns whether a
    /// download succeeded; overlapping calls return `false` immediately.
    fn refresh(&self) -> bool {
        let Some(_guard) = RefreshGuard::acquire(&self.refreshing) else {
            info!("Refresh already in progress, skipping");
            return false;
        };

        info!("Starting scheduled EPG refresh...");
        let mut settings = lock(&self.settings).clone();
        let manager = EpgManager::new(self.ctx.clone(), Arc::clone(&self.sink));
        let succeeded = match manager.download(&mut settings) {
            Ok(result) => {
                info!("Scheduled refresh complete: {}", result.message);
                lock(&self.settings).last_refresh = settings.last_refresh;
                true
            }
            Err(e) => {
                error!("Scheduled refresh failed: {}", e);
                false
            }
        };

        succeeded
    }
}

/// Holds the overlap flag; releasing it on drop also covers a panicking
/// download.
struct RefreshGuard<'a>(&'a AtomicBool);

impl<'a> RefreshGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).ok()?;
        Some(Self(flag))
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::zap2it::GridResponse;
    use crate::testing::{
        FakeClientFactory, FakeListingsClient, FakeSchedulePage, MemoryConfigStore,
        RecordingProgress,
    };
    use tempfile::TempDir;

    const GRID: &str = r#"{"channels": [{"channelId": "7", "callSign": "KABC"}]}"#;

    struct Harness {
        _dir: TempDir,
        listings: Arc<FakeListingsClient>,
        store: Arc<MemoryConfigStore>,
        scheduler: Scheduler,
    }

    fn harness(auto_refresh: bool, last_refresh: Option<String>) -> Harness {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryConfigStore::new(dir.path()));
        let listings = Arc::new(FakeListingsClient::default());
        let page = Arc::new(FakeSchedulePage::with_html(""));
        let clients = Arc::new(FakeClientFactory::new(listings.clone(), page));
        let ctx = AppContext::new(store.clone(), clients);
        let settings = Settings {
            lineup_ids: vec!["USA-DITV501-X".into()],
            timespan_hours: 6,
            output_dir: dir.path().join("out"),
            auto_refresh_enabled: auto_refresh,
            refresh_interval_hours: 6,
            last_refresh,
            ..Settings::default()
        };
        let sink = Arc::new(RecordingProgress::default());
        let scheduler = Scheduler::new(ctx, Arc::new(Mutex::new(settings)), sink)
            .with_check_interval(Duration::from_millis(20));
        Harness { _dir: dir, listings, store, scheduler }
    }

    fn grid() -> GridResponse {
        serde_json::from_str(GRID).unwrap()
    }

    fn wait_for(condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn start_is_idempotent_and_stop_joins() {
        let h = harness(false, None);
        assert!(h.scheduler.start());
        assert!(!h.scheduler.start());
        assert!(h.scheduler.is_running());

        h.scheduler.stop();
        assert!(!h.scheduler.is_running());
        assert!(h.listings.requests().is_empty());
    }

    #[test]
    fn due_refresh_runs_once_and_records_time() {
        let h = harness(true, None);
        h.listings.push(Ok(grid()));
        h.scheduler.start();

        assert!(wait_for(|| lock(&h.scheduler.settings()).last_refresh.is_some()));
        thread::sleep(Duration::from_millis(100));
        h.scheduler.stop();

        assert_eq!(h.listings.requests().len(), 1);
        assert!(h.store.current().last_refresh.is_some());
        assert!(h.scheduler.settings().lock().unwrap().output_path().exists());
    }

    #[test]
    fn recent_refresh_is_not_repeated() {
        let h = harness(true, Some(Utc::now().to_rfc3339()));
        h.scheduler.start();
        thread::sleep(Duration::from_millis(100));
        h.scheduler.stop();
        assert!(h.listings.requests().is_empty());
    }

    #[test]
    fn trigger_refresh_runs_even_when_disabled() {
        let h = harness(false, None);
        h.listings.push(Ok(grid()));

        let handle = h.scheduler.trigger_refresh().unwrap();
        assert!(handle.join().unwrap());
        assert!(h.scheduler.settings().lock().unwrap().last_refresh.is_some());
    }

    #[test]
    fn overlapping_refreshes_are_skipped() {
        let h = harness(false, None);
        h.scheduler.shared.refreshing.store(true, Ordering::SeqCst);

        let handle = h.scheduler.trigger_refresh().unwrap();
        assert!(!handle.join().unwrap());
        assert!(h.listings.requests().is_empty());
    }

    #[test]
    fn panicking_refresh_releases_the_overlap_flag() {
        let h = harness(false, None);
        h.listings.panic_next();

        let first = h.scheduler.trigger_refresh().unwrap();
        assert!(first.join().is_err());
        assert!(!h.scheduler.shared.refreshing.load(Ordering::SeqCst));

        h.listings.push(Ok(grid()));
        let second = h.scheduler.trigger_refresh().unwrap();
        assert!(second.join().unwrap());
        assert_eq!(h.listings.requests().len(), 2);
    }

    #[test]
    fn status_reports_schedule() {
        let h = harness(true, Some("2025-01-01T00:00:00+00:00".into()));
        let status = h.scheduler.status();

        assert!(!status.running);
        assert!(status.enabled);
        assert_eq!(status.interval_hours, 6);
        assert_eq!(status.last_refresh.as_deref(), Some("2025-01-01T00:00:00+00:00"));
        assert_eq!(status.next_refresh.as_deref(), Some("2025-01-01T06:00:00+00:00"));

        let disabled = harness(false, None);
        assert_eq!(disabled.scheduler.status().next_refresh, None);
    }
}
