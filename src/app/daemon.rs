//! HTTP server plus scheduler, sharing one set of effective settings.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use log::info;

use crate::app::AppContext;
use crate::app::scheduler::Scheduler;
use crate::domain::{AppError, Settings};
use crate::ports::{ProgressSink, RefreshControl, RefreshStatus};
use crate::services::EpgServer;

pub struct Daemon {
    settings: Arc<Mutex<Settings>>,
    scheduler: Arc<Scheduler>,
    server: EpgServer,
    addr: SocketAddr,
}

impl Daemon {
    /// Bind the server, then start the scheduler when auto-refresh is on.
    pub fn start(
        ctx: &AppContext,
        settings: Settings,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<Self, AppError> {
        let auto_refresh = settings.auto_refresh_enabled;
        let settings = Arc::new(Mutex::new(settings));
        let scheduler = Arc::new(Scheduler::new(ctx.clone(), Arc::clone(&settings), sink));

        let refresh: Arc<dyn RefreshControl> = scheduler.clone();
        let mut server = EpgServer::new(Arc::clone(&settings), Some(refresh));
        let addr = server.start()?;

        if auto_refresh {
            scheduler.start();
        }

        Ok(Self { settings, scheduler, server, addr })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn settings(&self) -> Arc<Mutex<Settings>> {
        Arc::clone(&self.settings)
    }

    pub fn is_running(&self) -> bool {
        self.server.is_running()
    }

    pub fn refresh_now(&self) {
        info!("Triggering EPG refresh");
        self.scheduler.refresh_now();
    }

    pub fn refresh_status(&self) -> RefreshStatus {
        self.scheduler.status()
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.server.stop();
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        self.stop();
    }
}
