// Wallmix - Library Entry Point

pub mod constants;
pub mod error;
pub mod models;
pub mod category;
pub mod config;
pub mod transport;
pub mod providers;
pub mod aggregator;
pub mod db;
pub mod storage;
pub mod collections;
pub mod state;

pub use aggregator::Aggregator;
pub use collections::CollectionStore;
pub use config::Config;
pub use error::{ProviderError, Result, WallmixError};
pub use models::{Collection, Provider, WallpaperRecord};
pub use state::{AppState, StateContainer, StateEvent};
