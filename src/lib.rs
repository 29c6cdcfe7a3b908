//! Collects movies from the OMDb API, keeps the latest detail batch in a
//! single-slot cache and sifts it with declarative criteria.

pub mod cache;
pub mod collector;
pub mod filter;
pub mod loader;
pub mod media;
pub mod omdb;
pub mod settings;

pub use cache::{FileStore, KeyValueStore, MemoryStore, ResultCache, StoreError};
pub use collector::{dedupe_by_id, Collector, PAGE_SIZE};
pub use filter::{
    classify, genre_counts, group_by_age, AgeGroup, Criteria, SortOption, UnratedPlacement,
};
pub use loader::{fetch_details, select, DataSource, LoadedMovies, MovieLoader, Selection};
pub use media::{ApiError, MovieDetail, MovieId, MovieSummary, WatchLinks, NOT_AVAILABLE};
pub use omdb::{MovieApi, OmdbClient};
pub use settings::{AppSettings, Preset, SettingsError};
