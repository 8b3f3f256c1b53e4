//! Video catalog service: merges the Marengo and Pegasus index listings of
//! Twelve Labs into one collection keyed by filename, plus the client-side
//! loader that overlays storage ids when the catalog is unreachable.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod fallback;
pub mod handlers;
pub mod loader;
pub mod models;
pub mod system_info;
pub mod twelvelabs;

pub use aggregate::{aggregate, Aggregation, SourceOutcome};
pub use config::Config;
pub use error::{ApiError, ConfigError, ListingError};
pub use models::{AppState, RawVideo, StorageFile, VideoCollection, VideoRecord};
