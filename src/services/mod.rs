pub mod cluster;
pub mod import;
pub mod monitoring;
pub mod universe_store;
pub mod yb_client;

pub use cluster::{ClusterClient, HostPort};
pub use import::UniverseImporter;
pub use monitoring::{FileScrapeConfigWriter, ScrapeConfigWriter};
pub use universe_store::{DbUniverseStore, UniverseStore};
pub use yb_client::YbHttpClient;
