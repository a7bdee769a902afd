pub mod ports;

#[allow(unused_imports)]
pub use ports::FakeClientFactory;
#[allow(unused_imports)]
pub use ports::FakeListingsClient;
#[allow(unused_imports)]
pub use ports::FakeRefreshControl;
#[allow(unused_imports)]
pub use ports::FakeSchedulePage;
#[allow(unused_imports)]
pub use ports::MemoryConfigStore;
#[allow(unused_imports)]
pub use ports::RecordingProgress;
