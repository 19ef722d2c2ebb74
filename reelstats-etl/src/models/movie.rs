//! Flattened and normalized movie rows

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Separator used for multi-valued text columns
pub const PIPE: char = '|';

/// Ordered list of names stored as a single pipe-delimited text column
///
/// An empty list stores as the empty string; splitting the stored text on
/// [`PIPE`] gives back the held names in order. A [`PIPE`] inside a name is
/// replaced by [`PIPE_SUBSTITUTE`] on the way in so it cannot split a name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipeList(Vec<String>);

/// Stands in for [`PIPE`] inside a name
pub const PIPE_SUBSTITUTE: char = '/';

fn escape_name(name: String) -> String {
    if name.contains(PIPE) {
        name.replace(PIPE, &PIPE_SUBSTITUTE.to_string())
    } else {
        name
    }
}

impl PipeList {
    pub fn new(names: Vec<String>) -> Self {
        names.into_iter().collect()
    }

    /// Split stored text back into names
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        Self(text.split(PIPE).map(str::to_string).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for PipeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", PIPE)?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

impl FromIterator<String> for PipeList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().map(escape_name).collect())
    }
}

impl Serialize for PipeList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PipeList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse(&text))
    }
}

/// Franchise membership tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MovieType {
    Franchise,
    Standalone,
}

impl MovieType {
    /// "Franchise" iff a franchise (collection) name is present
    pub fn from_franchise(franchise: Option<&str>) -> Self {
        match franchise {
            Some(_) => MovieType::Franchise,
            None => MovieType::Standalone,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovieType::Franchise => "Franchise",
            MovieType::Standalone => "Standalone",
        }
    }
}

impl fmt::Display for MovieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the flattener: nested structures reduced, scalars still in
/// source units (whole currency units, release date as text)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatMovie {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub tagline: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub original_language: Option<String>,
    /// `belongs_to_collection.name`
    pub franchise: Option<String>,
    pub genres: Option<PipeList>,
    pub production_companies: Option<PipeList>,
    pub production_countries: Option<PipeList>,
    pub spoken_languages: Option<PipeList>,
    pub budget: Option<f64>,
    pub revenue: Option<f64>,
    pub runtime: Option<f64>,
    pub popularity: Option<f64>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<f64>,
    /// First `cast_limit` names in billing order
    pub cast: PipeList,
    /// Untruncated cast length
    pub cast_size: usize,
    pub director: Option<String>,
    pub crew_size: usize,
}

/// Metrics derived from a normalized row
///
/// Every field stays `None` until the matching derivation has run, and
/// stays `None` afterwards whenever an input is unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedMetrics {
    /// revenue − budget, in millions
    pub profit_musd: Option<f64>,
    /// profit / budget
    pub roi: Option<f64>,
    pub movie_type: Option<MovieType>,
    pub year: Option<i32>,
}

/// Canonical movie row
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecord {
    // Identification
    pub id: i64,
    pub title: String,
    pub tagline: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub genres: Option<PipeList>,
    pub franchise: Option<String>,
    pub original_language: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,

    // Financial
    pub budget_musd: Option<f64>,
    pub revenue_musd: Option<f64>,

    // Production
    pub production_companies: Option<PipeList>,
    pub production_countries: Option<PipeList>,
    pub spoken_languages: Option<PipeList>,
    pub runtime: Option<u32>,

    // Audience
    pub vote_count: u64,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,

    // Crew/Cast
    pub cast: PipeList,
    pub cast_size: usize,
    pub director: Option<String>,
    pub crew_size: usize,

    pub metrics: DerivedMetrics,
}

impl MovieRecord {
    /// Minimal row, used by tests and by callers building rows by hand
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            tagline: None,
            release_date: None,
            genres: None,
            franchise: None,
            original_language: None,
            overview: None,
            poster_path: None,
            budget_musd: None,
            revenue_musd: None,
            production_companies: None,
            production_countries: None,
            spoken_languages: None,
            runtime: None,
            vote_count: 0,
            vote_average: None,
            popularity: None,
            cast: PipeList::default(),
            cast_size: 0,
            director: None,
            crew_size: 0,
            metrics: DerivedMetrics::default(),
        }
    }

    /// First listed genre
    pub fn primary_genre(&self) -> Option<&str> {
        self.genres.as_ref().and_then(PipeList::first)
    }
}
