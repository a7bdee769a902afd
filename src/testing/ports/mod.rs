mod client_factory_stub;
mod config_store_memory;
mod listings_client_stub;
mod progress_recorder;
mod refresh_control_stub;
mod schedule_page_stub;

pub use self::client_factory_stub::FakeClientFactory;
pub use self::config_store_memory::MemoryConfigStore;
pub use self::listings_client_stub::FakeListingsClient;
pub use self::progress_recorder::RecordingProgress;
pub use self::refresh_control_stub::FakeRefreshControl;
pub use self::schedule_page_stub::FakeSchedulePage;
