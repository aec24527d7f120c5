pub mod aggregator;
pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod pokemon;
pub mod roster;
pub mod scoring;
pub mod server;
pub mod source;
pub mod team;

pub use aggregator::{Aggregator, CollectionStatus, LoadOutcome, Page};
pub use app::AppContext;
pub use config::*;
pub use error::{AppError, FETCH_FAILED_MESSAGE, FetchError};
pub use pokemon::*;
pub use source::{HttpSource, PokemonSource, SourceCacheStats};
