use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::cache::{KeyValueStore, ResultCache};
use crate::collector::Collector;
use crate::filter::Criteria;
use crate::media::{MovieDetail, MovieSummary};
use crate::omdb::MovieApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Cache,
    Network,
}

#[derive(Debug, Clone)]
pub struct LoadedMovies {
    pub details: Vec<MovieDetail>,
    pub source: DataSource,
    /// Detail lookups issued; zero when served from cache.
    pub requested: usize,
    pub failed: usize,
    /// Whether this load replaced the cache entry.
    pub cache_updated: bool,
}

/// What the presentation layer gets after filtering.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Nothing was loaded at all.
    NoSourceData,
    /// Movies were loaded but none passed the criteria.
    NoMatches { loaded: usize },
    Matches(Vec<MovieDetail>),
}

impl Selection {
    pub fn movies(&self) -> &[MovieDetail] {
        match self {
            Selection::Matches(movies) => movies,
            _ => &[],
        }
    }

    pub fn empty_message(&self) -> Option<&'static str> {
        match self {
            Selection::NoSourceData => Some(
                "No movies could be loaded. Check your API key or wait for the daily request limit to reset.",
            ),
            Selection::NoMatches { .. } => {
                Some("No movies match your current filters. Adjust your criteria!")
            }
            Selection::Matches(_) => None,
        }
    }
}

pub fn select(details: &[MovieDetail], criteria: &Criteria) -> Selection {
    if details.is_empty() {
        return Selection::NoSourceData;
    }
    let matches = criteria.apply(details);
    if matches.is_empty() {
        Selection::NoMatches {
            loaded: details.len(),
        }
    } else {
        Selection::Matches(matches)
    }
}

/// Looks up every summary at once and waits for all of them to settle.
/// Failed lookups come back as `None` in the matching position.
pub async fn fetch_details(
    api: &dyn MovieApi,
    summaries: &[MovieSummary],
) -> Vec<Option<MovieDetail>> {
    join_all(summaries.iter().map(|m| api.fetch_detail(&m.id))).await
}

pub struct MovieLoader<S> {
    api: Arc<dyn MovieApi>,
    collector: Collector,
    cache: ResultCache<S>,
    max_details: usize,
}

impl<S> std::fmt::Debug for MovieLoader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovieLoader")
            .field("collector", &self.collector)
            .field("max_details", &self.max_details)
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStore> MovieLoader<S> {
    pub fn new(
        api: Arc<dyn MovieApi>,
        collector: Collector,
        cache: ResultCache<S>,
        max_details: usize,
    ) -> Self {
        Self {
            api,
            collector,
            cache,
            max_details,
        }
    }

    pub fn cache(&self) -> &ResultCache<S> {
        &self.cache
    }

    /// Serves the cached batch when there is a valid one, otherwise collects
    /// candidates, looks up their details and refreshes the cache.
    pub async fn load(&self) -> LoadedMovies {
        if let Some(details) = self.cache.load() {
            info!("Loaded movie details from local cache, skipping API calls");
            return LoadedMovies {
                details,
                source: DataSource::Cache,
                requested: 0,
                failed: 0,
                cache_updated: false,
            };
        }
        self.fetch().await
    }

    /// Drops the cached batch and loads from the network.
    pub async fn refresh(&self) -> LoadedMovies {
        self.cache.clear();
        self.fetch().await
    }

    async fn fetch(&self) -> LoadedMovies {
        let mut candidates = self.collector.collect(self.api.as_ref()).await;
        candidates.truncate(self.max_details);

        info!("Processing details for {} movies", candidates.len());
        let results = fetch_details(self.api.as_ref(), &candidates).await;

        let cache_updated = self.cache.store(&results);
        let requested = results.len();
        let details: Vec<MovieDetail> = results.into_iter().flatten().collect();
        let failed = requested - details.len();
        if failed > 0 {
            warn!("{} of {} detail lookups failed", failed, requested);
        }

        LoadedMovies {
            details,
            source: DataSource::Network,
            requested,
            failed,
            cache_updated,
        }
    }
}
