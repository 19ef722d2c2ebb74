//! Ranked and filtered queries over normalized rows
//!
//! Rows whose metric is unknown never take part in a ranking. Equal metric
//! values are ordered by ascending identifier in both directions, so results
//! are deterministic.
//!
//! Rankings on a rating metric ([`Metric::VoteAverage`], [`Metric::VoteCount`])
//! always exclude rows with fewer than [`RELIABLE_VOTE_THRESHOLD`] votes.
//! There is no way to switch that gate off.

use super::derive::{movie_type_of, year_of};
use crate::models::{MovieRecord, MovieType};
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

/// Minimum vote count before a rating is considered meaningful
pub const RELIABLE_VOTE_THRESHOLD: u64 = 10;

/// Numeric column a query ranks or aggregates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Budget,
    Revenue,
    Profit,
    Roi,
    VoteCount,
    VoteAverage,
    Popularity,
    Runtime,
}

impl Metric {
    /// Metric value for a row; `None` when unknown
    pub fn value(&self, movie: &MovieRecord) -> Option<f64> {
        match self {
            Metric::Budget => movie.budget_musd,
            Metric::Revenue => movie.revenue_musd,
            Metric::Profit => movie.metrics.profit_musd,
            Metric::Roi => movie.metrics.roi,
            Metric::VoteCount => Some(movie.vote_count as f64),
            Metric::VoteAverage => movie.vote_average,
            Metric::Popularity => movie.popularity,
            Metric::Runtime => movie.runtime.map(f64::from),
        }
    }

    /// Rating metrics are subject to the vote-count reliability gate
    pub fn is_rating(&self) -> bool {
        matches!(self, Metric::VoteCount | Metric::VoteAverage)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Budget => "budget_musd",
            Metric::Revenue => "revenue_musd",
            Metric::Profit => "profit_musd",
            Metric::Roi => "roi",
            Metric::VoteCount => "vote_count",
            Metric::VoteAverage => "vote_average",
            Metric::Popularity => "popularity",
            Metric::Runtime => "runtime",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Descending,
    Ascending,
}

/// Row predicate applied before ranking
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Budget known and at least this many millions
    MinBudgetMusd(f64),
    /// At least this many votes
    MinVoteCount(u64),
    /// Genre list contains this genre
    Genre(String),
    /// Stored cast list contains this name
    CastMember(String),
    Director(String),
    MovieType(MovieType),
    /// Release year within the inclusive bounds; unknown years never match
    YearRange { from: Option<i32>, to: Option<i32> },
}

impl Filter {
    pub fn matches(&self, movie: &MovieRecord) -> bool {
        match self {
            Filter::MinBudgetMusd(min) => movie.budget_musd.is_some_and(|b| b >= *min),
            Filter::MinVoteCount(min) => movie.vote_count >= *min,
            Filter::Genre(genre) => movie.genres.as_ref().is_some_and(|g| g.contains(genre)),
            Filter::CastMember(name) => movie.cast.contains(name),
            Filter::Director(name) => movie.director.as_deref() == Some(name.as_str()),
            Filter::MovieType(kind) => movie_type_of(movie) == *kind,
            Filter::YearRange { from, to } => year_of(movie).is_some_and(|year| {
                from.map_or(true, |f| year >= f) && to.map_or(true, |t| year <= t)
            }),
        }
    }
}

/// A row together with the metric value it was ranked on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked<'a> {
    pub movie: &'a MovieRecord,
    pub value: f64,
}

/// Every row passing `filters` with a known `metric`, sorted
pub fn rank_by<'a>(
    rows: &'a [MovieRecord],
    metric: Metric,
    filters: &[Filter],
    order: Order,
) -> Vec<Ranked<'a>> {
    let reliability = Filter::MinVoteCount(RELIABLE_VOTE_THRESHOLD);

    let mut ranked: Vec<Ranked<'a>> = rows
        .iter()
        .filter(|movie| !metric.is_rating() || reliability.matches(movie))
        .filter(|movie| filters.iter().all(|f| f.matches(movie)))
        .filter_map(|movie| metric.value(movie).map(|value| Ranked { movie, value }))
        .collect();

    ranked.sort_by(|a, b| compare(a, b, order));

    debug!(
        metric = %metric,
        ?order,
        candidates = ranked.len(),
        "Ranked rows"
    );
    ranked
}

fn compare(a: &Ranked<'_>, b: &Ranked<'_>, order: Order) -> Ordering {
    let by_value = match order {
        Order::Descending => b.value.total_cmp(&a.value),
        Order::Ascending => a.value.total_cmp(&b.value),
    };
    by_value.then_with(|| a.movie.id.cmp(&b.movie.id))
}

/// The `n` rows with the highest `metric`
pub fn top_n_by<'a>(
    rows: &'a [MovieRecord],
    metric: Metric,
    n: usize,
    filters: &[Filter],
) -> Vec<&'a MovieRecord> {
    rank_by(rows, metric, filters, Order::Descending)
        .into_iter()
        .take(n)
        .map(|r| r.movie)
        .collect()
}

/// The `n` rows with the lowest `metric`
pub fn bottom_n_by<'a>(
    rows: &'a [MovieRecord],
    metric: Metric,
    n: usize,
    filters: &[Filter],
) -> Vec<&'a MovieRecord> {
    rank_by(rows, metric, filters, Order::Ascending)
        .into_iter()
        .take(n)
        .map(|r| r.movie)
        .collect()
}

/// All rows matching `filters`, sorted on `metric`
pub fn search<'a>(
    rows: &'a [MovieRecord],
    filters: &[Filter],
    metric: Metric,
    order: Order,
) -> Vec<&'a MovieRecord> {
    rank_by(rows, metric, filters, order)
        .into_iter()
        .map(|r| r.movie)
        .collect()
}

pub fn most_voted(rows: &[MovieRecord], n: usize) -> Vec<&MovieRecord> {
    top_n_by(rows, Metric::VoteCount, n, &[])
}

pub fn least_voted(rows: &[MovieRecord], n: usize) -> Vec<&MovieRecord> {
    bottom_n_by(rows, Metric::VoteCount, n, &[])
}

pub fn highest_rated(rows: &[MovieRecord], n: usize) -> Vec<&MovieRecord> {
    top_n_by(rows, Metric::VoteAverage, n, &[])
}

pub fn lowest_rated(rows: &[MovieRecord], n: usize) -> Vec<&MovieRecord> {
    bottom_n_by(rows, Metric::VoteAverage, n, &[])
}
