mod atomic_write;
mod config_store_filesystem;
mod epg_server;
mod espn_client_http;
mod http_client_factory;
mod zap2it_client_http;

pub use atomic_write::atomic_write;
pub use config_store_filesystem::FilesystemConfigStore;
pub use epg_server::{EpgServer, XmlFile, list_xml_files, local_ip};
pub use espn_client_http::HttpSchedulePageClient;
pub use http_client_factory::HttpClientFactory;
pub use zap2it_client_http::HttpListingsClient;
