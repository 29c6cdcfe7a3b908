use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::media::MovieDetail;

/// Content ratings treated as safe for a family audience.
pub const FAMILY_RATINGS: [&str; 6] = ["G", "Approved", "TV-G", "U", "PG", "PG-13"];

/// Plot words that disqualify a movie from the family views.
pub const SENSITIVE_KEYWORDS: [&str; 16] = [
    "sex", "sexual", "affair", "cheating", "adult", "seduce", "gay", "lesbian", "pregnant",
    "nudity", "intimate", "erotic", "drugs", "violence", "terror", "horror",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    #[default]
    Alphabetical,
    RatingAscending,
    RatingDescending,
}

impl std::fmt::Display for SortOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOption::Alphabetical => write!(f, "A-Z"),
            SortOption::RatingAscending => write!(f, "Lowest rated"),
            SortOption::RatingDescending => write!(f, "Highest rated"),
        }
    }
}

/// Where movies without a numeric rating go when sorting by rating.
///
/// The default is `Last` for both directions. The old web page sorted
/// unrated titles as if they had an infinite rating, which put them first
/// when ordering from highest; choose `First` to get that back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnratedPlacement {
    First,
    #[default]
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeGroup {
    UnderSix,
    SixToEleven,
    TwelveAndUp,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 3] = [
        AgeGroup::UnderSix,
        AgeGroup::SixToEleven,
        AgeGroup::TwelveAndUp,
    ];

    /// Buckets a content rating. `None` for ratings outside the known set.
    pub fn from_rating(rating: &str) -> Option<Self> {
        match rating.trim().to_lowercase().as_str() {
            "g" | "u" | "tv-g" => Some(AgeGroup::UnderSix),
            "pg" | "approved" => Some(AgeGroup::SixToEleven),
            "pg-13" => Some(AgeGroup::TwelveAndUp),
            _ => None,
        }
    }
}

impl std::fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgeGroup::UnderSix => write!(f, "Below 6 years"),
            AgeGroup::SixToEleven => write!(f, "6-11 years"),
            AgeGroup::TwelveAndUp => write!(f, "12 years and up"),
        }
    }
}

pub fn has_sensitive_content(detail: &MovieDetail) -> bool {
    let plot = detail.plot.to_lowercase();
    SENSITIVE_KEYWORDS.iter().any(|k| plot.contains(k))
}

/// Age group of a movie, `None` when the rating is unknown or the plot trips
/// the keyword screen.
pub fn classify(detail: &MovieDetail) -> Option<AgeGroup> {
    if has_sensitive_content(detail) {
        return None;
    }
    AgeGroup::from_rating(&detail.rated)
}

/// Classifiable movies bucketed by age group, input order kept per bucket.
pub fn group_by_age(details: &[MovieDetail]) -> BTreeMap<AgeGroup, Vec<MovieDetail>> {
    let mut groups: BTreeMap<AgeGroup, Vec<MovieDetail>> = BTreeMap::new();
    for detail in details {
        if let Some(group) = classify(detail) {
            groups.entry(group).or_default().push(detail.clone());
        }
    }
    groups
}

pub fn genre_counts(details: &[MovieDetail]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for genre in details.iter().flat_map(|d| d.genres()) {
        *counts.entry(genre.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Declarative predicates combined with AND, plus a sort order.
///
/// Unset predicates match everything.
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub rating_ceiling: Option<f32>,
    pub allowed_ratings: Option<Vec<String>>,
    pub language: Option<String>,
    pub topic: Option<String>,
    pub genre: Option<String>,
    pub max_runtime: Option<u32>,
    pub exclude_sensitive: bool,
    pub sort_by: SortOption,
    pub unrated: UnratedPlacement,
}

impl Criteria {
    /// Everything, in title order.
    pub fn browse() -> Self {
        Self::default()
    }

    /// 1980 to 1999, rated at most 6.0 or not rated at all.
    pub fn worst_of_80s_and_90s() -> Self {
        Self {
            year_from: Some(1980),
            year_to: Some(1999),
            rating_ceiling: Some(6.0),
            ..Self::default()
        }
    }

    pub fn family_safe() -> Self {
        Self {
            allowed_ratings: Some(FAMILY_RATINGS.iter().map(|r| r.to_string()).collect()),
            exclude_sensitive: true,
            ..Self::default()
        }
    }

    pub fn with_year_range(mut self, from: i32, to: i32) -> Self {
        self.year_from = Some(from);
        self.year_to = Some(to);
        self
    }

    pub fn with_rating_ceiling(mut self, ceiling: f32) -> Self {
        self.rating_ceiling = Some(ceiling);
        self
    }

    pub fn with_allowed_ratings<I, S>(mut self, ratings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_ratings = Some(ratings.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_max_runtime(mut self, minutes: u32) -> Self {
        self.max_runtime = Some(minutes);
        self
    }

    pub fn with_sort(mut self, sort_by: SortOption, unrated: UnratedPlacement) -> Self {
        self.sort_by = sort_by;
        self.unrated = unrated;
        self
    }

    pub fn apply(&self, details: &[MovieDetail]) -> Vec<MovieDetail> {
        let mut filtered: Vec<MovieDetail> = details
            .iter()
            .filter(|detail| self.matches(detail))
            .cloned()
            .collect();
        self.sort(&mut filtered);
        filtered
    }

    pub fn matches(&self, detail: &MovieDetail) -> bool {
        self.matches_year_range(detail)
            && self.matches_rating(detail)
            && self.matches_allowed_rating(detail)
            && self.matches_language(detail)
            && self.matches_topic(detail)
            && self.matches_genre(detail)
            && self.matches_runtime(detail)
            && !(self.exclude_sensitive && has_sensitive_content(detail))
    }

    fn matches_year_range(&self, detail: &MovieDetail) -> bool {
        let (from, to) = self.normalized_year_range();
        if from.is_none() && to.is_none() {
            return true;
        }
        match detail.year() {
            None => false,
            Some(y) => from.is_none_or(|f| y >= f) && to.is_none_or(|t| y <= t),
        }
    }

    fn normalized_year_range(&self) -> (Option<i32>, Option<i32>) {
        match (self.year_from, self.year_to) {
            (Some(from), Some(to)) if from > to => (Some(to), Some(from)),
            (from, to) => (from, to),
        }
    }

    fn matches_rating(&self, detail: &MovieDetail) -> bool {
        match (self.rating_ceiling, detail.rating()) {
            (None, _) | (Some(_), None) => true,
            (Some(ceiling), Some(rating)) => rating <= ceiling,
        }
    }

    fn matches_allowed_rating(&self, detail: &MovieDetail) -> bool {
        match &self.allowed_ratings {
            None => true,
            Some(allowed) => {
                let rated = detail.rated.trim();
                allowed.iter().any(|r| r.eq_ignore_ascii_case(rated))
            }
        }
    }

    fn matches_language(&self, detail: &MovieDetail) -> bool {
        contains_ignore_case(&detail.language, self.language.as_deref())
    }

    fn matches_topic(&self, detail: &MovieDetail) -> bool {
        let topic = self.topic.as_deref();
        contains_ignore_case(&detail.title, topic) || contains_ignore_case(&detail.plot, topic)
    }

    fn matches_genre(&self, detail: &MovieDetail) -> bool {
        contains_ignore_case(&detail.genre, self.genre.as_deref())
    }

    fn matches_runtime(&self, detail: &MovieDetail) -> bool {
        match self.max_runtime {
            None => true,
            Some(max) => detail.runtime_minutes().is_some_and(|r| r <= max),
        }
    }

    pub fn sort(&self, details: &mut [MovieDetail]) {
        match self.sort_by {
            SortOption::Alphabetical => details.sort_by(compare_titles),
            SortOption::RatingAscending => {
                details.sort_by(|a, b| self.compare_ratings(a, b, false));
            }
            SortOption::RatingDescending => {
                details.sort_by(|a, b| self.compare_ratings(a, b, true));
            }
        }
    }

    fn compare_ratings(&self, a: &MovieDetail, b: &MovieDetail, descending: bool) -> Ordering {
        let unrated_first = self.unrated == UnratedPlacement::First;
        match (a.rating(), b.rating()) {
            (Some(x), Some(y)) => {
                let ordering = if descending {
                    y.partial_cmp(&x)
                } else {
                    x.partial_cmp(&y)
                };
                ordering
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| compare_titles(a, b))
            }
            (None, None) => compare_titles(a, b),
            (None, Some(_)) if unrated_first => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) if unrated_first => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim) {
        None | Some("") => true,
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}

fn compare_titles(a: &MovieDetail, b: &MovieDetail) -> Ordering {
    a.title
        .to_lowercase()
        .cmp(&b.title.to_lowercase())
        .then_with(|| a.title.cmp(&b.title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::sample_detail;

    fn rated(detail: MovieDetail, rated: &str) -> MovieDetail {
        MovieDetail {
            rated: rated.to_string(),
            ..detail
        }
    }

    fn titles(details: &[MovieDetail]) -> Vec<&str> {
        details.iter().map(|d| d.title.as_str()).collect()
    }

    #[test]
    fn test_allow_list_excludes_despite_matching_year_and_rating() {
        let detail = rated(sample_detail("tt1", "Slasher", "1985", "3.2"), "R");
        let criteria = Criteria::default()
            .with_year_range(1980, 1999)
            .with_rating_ceiling(5.0)
            .with_allowed_ratings(["G", "PG"]);

        assert!(criteria.apply(&[detail]).is_empty());
    }

    #[test]
    fn test_missing_rating_qualifies() {
        let detail = sample_detail("tt1", "Obscure", "1990", "N/A");
        let criteria = Criteria::worst_of_80s_and_90s();

        assert_eq!(criteria.apply(&[detail]).len(), 1);
    }

    #[test]
    fn test_unparsable_ratings_pass_any_ceiling() {
        let criteria = Criteria::default().with_rating_ceiling(0.0);
        for rating in ["N/A", "", "unrated", "-"] {
            let detail = sample_detail("tt1", "Any", "1990", rating);
            assert!(criteria.matches(&detail), "rating {:?} should pass", rating);
        }
        assert!(!criteria.matches(&sample_detail("tt2", "Rated", "1990", "0.1")));
    }

    #[test]
    fn test_rating_ceiling_is_inclusive() {
        let criteria = Criteria::default().with_rating_ceiling(6.0);

        assert!(criteria.matches(&sample_detail("tt1", "Edge", "1990", "6.0")));
        assert!(!criteria.matches(&sample_detail("tt2", "Over", "1990", "6.1")));
    }

    #[test]
    fn test_allow_list_is_case_insensitive() {
        let criteria = Criteria::family_safe();

        assert!(criteria.matches(&rated(sample_detail("tt1", "A", "1990", "5"), "pg-13")));
        assert!(criteria.matches(&rated(sample_detail("tt2", "B", "1990", "5"), "PG-13")));
        assert!(criteria.matches(&rated(sample_detail("tt3", "C", "1990", "5"), "approved")));
        assert!(!criteria.matches(&rated(sample_detail("tt4", "D", "1990", "5"), "R")));
    }

    #[test]
    fn test_year_range_bounds() {
        let criteria = Criteria::default().with_year_range(1999, 1980);

        assert!(criteria.matches(&sample_detail("tt1", "A", "1980", "5")));
        assert!(criteria.matches(&sample_detail("tt2", "B", "1999", "5")));
        assert!(!criteria.matches(&sample_detail("tt3", "C", "2000", "5")));
        assert!(!criteria.matches(&sample_detail("tt4", "D", "N/A", "5")));
    }

    #[test]
    fn test_language_topic_and_genre() {
        let mut detail = sample_detail("tt1", "Space Jam", "1996", "6.5");
        detail.language = String::from("English, Spanish");
        detail.plot = String::from("Basketball against aliens.");

        assert!(Criteria::default().with_language("spanish").matches(&detail));
        assert!(!Criteria::default().with_language("french").matches(&detail));
        assert!(Criteria::default().with_language("").matches(&detail));
        assert!(Criteria::default().with_topic("JAM").matches(&detail));
        assert!(Criteria::default().with_topic("aliens").matches(&detail));
        assert!(!Criteria::default().with_topic("pirates").matches(&detail));
        assert!(Criteria::default().with_genre("family").matches(&detail));
        assert!(!Criteria::default().with_genre("western").matches(&detail));
    }

    #[test]
    fn test_runtime_ceiling() {
        let short = sample_detail("tt1", "Short", "1990", "5");
        let mut unknown = sample_detail("tt2", "Unknown", "1990", "5");
        unknown.runtime = String::from("N/A");

        assert!(Criteria::default().with_max_runtime(90).matches(&short));
        assert!(!Criteria::default().with_max_runtime(89).matches(&short));
        assert!(!Criteria::default().with_max_runtime(500).matches(&unknown));
        assert!(Criteria::default().matches(&unknown));
    }

    #[test]
    fn test_sensitive_keywords_excluded() {
        let mut detail = sample_detail("tt1", "Night", "1990", "5");
        detail.plot = String::from("A tale of VIOLENCE in the suburbs.");

        assert!(has_sensitive_content(&detail));
        assert!(!Criteria::family_safe().matches(&detail));
        assert!(Criteria::browse().matches(&detail));
    }

    #[test]
    fn test_classify_age_groups() {
        let base = sample_detail("tt1", "A", "1990", "5");

        assert_eq!(classify(&rated(base.clone(), "TV-G")), Some(AgeGroup::UnderSix));
        assert_eq!(classify(&rated(base.clone(), "Approved")), Some(AgeGroup::SixToEleven));
        assert_eq!(classify(&rated(base.clone(), "PG-13")), Some(AgeGroup::TwelveAndUp));
        assert_eq!(classify(&rated(base.clone(), "R")), None);
        assert_eq!(classify(&rated(base.clone(), "")), None);

        let mut tripped = rated(base, "G");
        tripped.plot = String::from("An erotic thriller.");
        assert_eq!(classify(&tripped), None);
    }

    #[test]
    fn test_group_by_age_keeps_input_order() {
        let details = vec![
            rated(sample_detail("tt1", "Zed", "1990", "5"), "G"),
            rated(sample_detail("tt2", "Rough", "1990", "5"), "R"),
            rated(sample_detail("tt3", "Alpha", "1990", "5"), "U"),
            rated(sample_detail("tt4", "Teen", "1990", "5"), "PG-13"),
        ];

        let groups = group_by_age(&details);

        assert_eq!(titles(&groups[&AgeGroup::UnderSix]), vec!["Zed", "Alpha"]);
        assert_eq!(titles(&groups[&AgeGroup::TwelveAndUp]), vec!["Teen"]);
        assert!(!groups.contains_key(&AgeGroup::SixToEleven));
    }

    #[test]
    fn test_genre_counts() {
        let mut horror = sample_detail("tt2", "B", "1990", "5");
        horror.genre = String::from("Horror, Comedy");
        let details = vec![sample_detail("tt1", "A", "1990", "5"), horror];

        let counts = genre_counts(&details);

        assert_eq!(counts.get("Comedy"), Some(&2));
        assert_eq!(counts.get("Family"), Some(&1));
        assert_eq!(counts.get("Horror"), Some(&1));
    }

    #[test]
    fn test_sort_rating_ascending_pushes_unrated_last() {
        let details = vec![
            sample_detail("tt1", "B", "1990", "4.0"),
            sample_detail("tt2", "A", "1990", "N/A"),
        ];
        let criteria =
            Criteria::default().with_sort(SortOption::RatingAscending, UnratedPlacement::Last);

        assert_eq!(titles(&criteria.apply(&details)), vec!["B", "A"]);
    }

    #[test]
    fn test_unrated_default_is_last_in_both_directions() {
        let details = vec![
            sample_detail("tt1", "Unrated", "1990", "N/A"),
            sample_detail("tt2", "Low", "1990", "2.0"),
            sample_detail("tt3", "High", "1990", "8.5"),
        ];
        let descending = Criteria {
            sort_by: SortOption::RatingDescending,
            ..Criteria::default()
        };

        assert_eq!(UnratedPlacement::default(), UnratedPlacement::Last);
        assert_eq!(titles(&descending.apply(&details)), vec!["High", "Low", "Unrated"]);
    }

    #[test]
    fn test_sort_rating_descending_with_unrated_first() {
        let details = vec![
            sample_detail("tt1", "Low", "1990", "2.0"),
            sample_detail("tt2", "High", "1990", "8.5"),
            sample_detail("tt3", "Unrated", "1990", "N/A"),
            sample_detail("tt4", "Also High", "1990", "8.5"),
        ];
        let criteria =
            Criteria::default().with_sort(SortOption::RatingDescending, UnratedPlacement::First);

        assert_eq!(
            titles(&criteria.apply(&details)),
            vec!["Unrated", "Also High", "High", "Low"]
        );
    }

    #[test]
    fn test_default_sort_is_by_title() {
        let details = vec![
            sample_detail("tt1", "beta", "1990", "5"),
            sample_detail("tt2", "Alpha", "1990", "5"),
            sample_detail("tt3", "Gamma", "1990", "5"),
        ];

        assert_eq!(
            titles(&Criteria::browse().apply(&details)),
            vec!["Alpha", "beta", "Gamma"]
        );
    }
}
