use std::collections::HashSet;

use tracing::{info, warn};

use crate::media::{ApiError, MovieSummary};
use crate::omdb::MovieApi;

/// Results the API returns for a full page.
pub const PAGE_SIZE: usize = 10;

/// Gathers candidate movies with broad searches across several terms.
///
/// Requests go out one at a time, term by term, page by page.
#[derive(Debug, Clone)]
pub struct Collector {
    terms: Vec<String>,
    max_pages_per_term: u32,
}

impl Collector {
    pub fn new(terms: Vec<String>, max_pages_per_term: u32) -> Self {
        Self {
            terms,
            max_pages_per_term,
        }
    }

    /// Never fails: any error only shortens the result.
    pub async fn collect(&self, api: &dyn MovieApi) -> Vec<MovieSummary> {
        let mut movies = Vec::new();
        let mut total_requests = 0u32;

        for term in &self.terms {
            let mut page = 1;
            while page <= self.max_pages_per_term {
                total_requests += 1;
                match api.search_page(term, page).await {
                    Ok(results) => {
                        let full_page = results.len() >= PAGE_SIZE;
                        movies.extend(results);
                        if !full_page {
                            break;
                        }
                        page += 1;
                    }
                    Err(ApiError::NotFound(_)) => break,
                    Err(e) => {
                        warn!("Search for term '{}' stopped at page {}: {}", term, page, e);
                        break;
                    }
                }
            }
        }

        let unique = dedupe_by_id(movies);
        info!(
            "Collected {} unique movie IDs from {} search requests",
            unique.len(),
            total_requests
        );
        unique
    }
}

/// Keeps the first occurrence of every identifier, in order.
pub fn dedupe_by_id(movies: Vec<MovieSummary>) -> Vec<MovieSummary> {
    let mut seen = HashSet::new();
    movies
        .into_iter()
        .filter(|m| seen.insert(m.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MovieDetail;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn summary(id: &str) -> MovieSummary {
        MovieSummary {
            id: id.to_string(),
            title: format!("Movie {}", id),
            year: String::from("1990"),
        }
    }

    fn page_of(prefix: &str, count: usize) -> Vec<MovieSummary> {
        (0..count).map(|i| summary(&format!("{}{}", prefix, i))).collect()
    }

    #[derive(Default)]
    struct ScriptedApi {
        pages: HashMap<(String, u32), Result<Vec<MovieSummary>, ApiError>>,
        calls: Mutex<Vec<(String, u32)>>,
    }

    impl ScriptedApi {
        fn with(mut self, term: &str, page: u32, result: Result<Vec<MovieSummary>, ApiError>) -> Self {
            self.pages.insert((term.to_string(), page), result);
            self
        }

        fn calls(&self) -> Vec<(String, u32)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MovieApi for ScriptedApi {
        async fn search_page(&self, term: &str, page: u32) -> Result<Vec<MovieSummary>, ApiError> {
            self.calls.lock().unwrap().push((term.to_string(), page));
            self.pages
                .get(&(term.to_string(), page))
                .cloned()
                .unwrap_or_else(|| Err(ApiError::NotFound(String::from("Movie not found!"))))
        }

        async fn lookup(&self, id: &str) -> Result<MovieDetail, ApiError> {
            Err(ApiError::NotFound(id.to_string()))
        }
    }

    #[tokio::test]
    async fn test_paginates_until_short_page() {
        let api = ScriptedApi::default()
            .with("the", 1, Ok(page_of("a", 10)))
            .with("the", 2, Ok(page_of("b", 10)))
            .with("the", 3, Ok(page_of("c", 4)));
        let collector = Collector::new(vec![String::from("the")], 10);

        let movies = collector.collect(&api).await;

        assert_eq!(movies.len(), 24);
        assert_eq!(api.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_respects_page_cap() {
        let api = ScriptedApi::default()
            .with("man", 1, Ok(page_of("a", 10)))
            .with("man", 2, Ok(page_of("b", 10)))
            .with("man", 3, Ok(page_of("c", 10)));
        let collector = Collector::new(vec![String::from("man")], 2);

        let movies = collector.collect(&api).await;

        assert_eq!(movies.len(), 20);
        assert_eq!(
            api.calls(),
            vec![(String::from("man"), 1), (String::from("man"), 2)]
        );
    }

    #[tokio::test]
    async fn test_zero_page_cap_sends_no_requests() {
        let api = ScriptedApi::default()
            .with("the", 1, Ok(page_of("a", 10)))
            .with("and", 1, Ok(page_of("b", 3)));
        let collector = Collector::new(vec![String::from("the"), String::from("and")], 0);

        let movies = collector.collect(&api).await;

        assert!(movies.is_empty());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_only_stops_that_term() {
        let api = ScriptedApi::default()
            .with("act", 1, Ok(page_of("a", 10)))
            .with("act", 2, Err(ApiError::Network(String::from("connection reset"))))
            .with("act", 3, Ok(page_of("never", 10)))
            .with("ing", 1, Ok(page_of("i", 3)));
        let collector = Collector::new(vec![String::from("act"), String::from("ing")], 10);

        let movies = collector.collect(&api).await;

        assert_eq!(movies.len(), 13);
        assert!(movies.iter().all(|m| !m.id.starts_with("never")));
        assert!(api.calls().contains(&(String::from("ing"), 1)));
    }

    #[tokio::test]
    async fn test_output_has_no_duplicates() {
        let api = ScriptedApi::default()
            .with("the", 1, Ok(page_of("x", 10)))
            .with("the", 2, Ok(page_of("y", 2)))
            .with("and", 1, Ok(page_of("x", 5)))
            .with("scream", 1, Ok(vec![summary("y1"), summary("z")]));
        let collector = Collector::new(
            vec![String::from("the"), String::from("and"), String::from("scream")],
            10,
        );

        let movies = collector.collect(&api).await;
        let ids: HashSet<_> = movies.iter().map(|m| m.id.clone()).collect();

        assert_eq!(ids.len(), movies.len());
        assert_eq!(movies.len(), 13);
        assert_eq!(movies.last().map(|m| m.id.as_str()), Some("z"));
    }

    #[test]
    fn test_dedupe_keeps_first_seen_order() {
        let mut later = summary("b");
        later.title = String::from("Later copy");
        let movies = vec![summary("b"), summary("a"), later, summary("c"), summary("a")];

        let unique = dedupe_by_id(movies);

        let ids: Vec<_> = unique.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(unique[0].title, "Movie b");
    }
}
