mod client_factory;
mod config_store;
mod listings_client;
mod progress;
mod refresh_control;
mod schedule_page_client;

pub use client_factory::ClientFactory;
pub use config_store::ConfigStore;
pub use listings_client::{GridRequest, ListingsClient};
pub use progress::{LogProgress, PrintProgress, ProgressSink};
pub use refresh_control::{RefreshControl, RefreshStatus};
pub use schedule_page_client::SchedulePageClient;
