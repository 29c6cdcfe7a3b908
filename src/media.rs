use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel the API uses for fields it has no value for.
pub const NOT_AVAILABLE: &str = "N/A";

static LEADING_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)").expect("leading integer pattern"));

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)").expect("leading number pattern"));

pub type MovieId = String;

fn leading_integer<T: std::str::FromStr>(s: &str) -> Option<T> {
    LEADING_INTEGER
        .captures(s)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub(crate) fn url_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}

/// Minimal record returned by a search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieSummary {
    #[serde(rename = "imdbID")]
    pub id: MovieId,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Year", default)]
    pub year: String,
}

/// Full record returned by a per-identifier lookup.
///
/// Field names on the wire match the API response, so a cached batch is the
/// same JSON the API produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    #[serde(rename = "imdbID")]
    pub id: MovieId,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Year", default)]
    pub year: String,
    #[serde(rename = "Runtime", default)]
    pub runtime: String,
    #[serde(rename = "Genre", default)]
    pub genre: String,
    #[serde(rename = "Language", default)]
    pub language: String,
    #[serde(rename = "Rated", default)]
    pub rated: String,
    #[serde(rename = "imdbRating", default)]
    pub imdb_rating: String,
    #[serde(rename = "Plot", default)]
    pub plot: String,
    #[serde(rename = "Poster", default)]
    pub poster: String,
}

impl MovieDetail {
    pub fn year(&self) -> Option<i32> {
        leading_integer(&self.year)
    }

    pub fn runtime_minutes(&self) -> Option<u32> {
        leading_integer(&self.runtime)
    }

    /// Numeric audience rating, `None` when missing, `N/A` or unparsable.
    pub fn rating(&self) -> Option<f32> {
        LEADING_NUMBER
            .captures(&self.imdb_rating)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    pub fn poster_url(&self) -> Option<&str> {
        let poster = self.poster.trim();
        (!poster.is_empty() && poster != NOT_AVAILABLE).then_some(poster)
    }

    pub fn genres(&self) -> impl Iterator<Item = &str> {
        self.genre.split(',').map(str::trim).filter(|g| !g.is_empty())
    }

    pub fn display_rating(&self) -> &str {
        if self.imdb_rating.trim().is_empty() {
            NOT_AVAILABLE
        } else {
            &self.imdb_rating
        }
    }

    pub fn watch_links(&self) -> WatchLinks {
        let query = format!("{} {} full movie", self.title, self.year);
        WatchLinks {
            youtube: format!(
                "https://www.youtube.com/results?search_query={}",
                url_encode(&query)
            ),
            google: format!(
                "https://www.google.com/search?q={}",
                url_encode(&format!("{} free streaming", query))
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchLinks {
    pub youtube: String,
    pub google: String,
}

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Request limit reached")]
    RateLimit,
    #[error("Invalid API key")]
    Unauthorized,
}

#[cfg(test)]
pub(crate) fn sample_detail(id: &str, title: &str, year: &str, rating: &str) -> MovieDetail {
    MovieDetail {
        id: id.to_string(),
        title: title.to_string(),
        year: year.to_string(),
        runtime: String::from("90 min"),
        genre: String::from("Comedy, Family"),
        language: String::from("English"),
        rated: String::from("PG"),
        imdb_rating: rating.to_string(),
        plot: String::from("A dog learns to play basketball."),
        poster: String::from(NOT_AVAILABLE),
    }
}
