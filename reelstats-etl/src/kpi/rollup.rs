//! Grouped aggregations
//!
//! Rows whose grouping key or metric is unknown are left out of the
//! affected aggregate; they are never counted as zero.

use super::derive::{movie_type_of, year_of};
use super::ranking::Metric;
use crate::models::{MovieRecord, MovieType};
use serde::Serialize;
use std::collections::BTreeMap;

/// Column rows are grouped on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// Every genre of a row (a row can land in several groups)
    Genre,
    /// First listed genre
    PrimaryGenre,
    Director,
    Franchise,
    MovieType,
    Year,
    Language,
}

impl GroupKey {
    fn keys(&self, movie: &MovieRecord) -> Vec<String> {
        match self {
            GroupKey::Genre => movie
                .genres
                .as_ref()
                .map(|g| g.iter().map(str::to_string).collect())
                .unwrap_or_default(),
            GroupKey::PrimaryGenre => movie.primary_genre().map(str::to_string).into_iter().collect(),
            GroupKey::Director => movie.director.clone().into_iter().collect(),
            GroupKey::Franchise => movie.franchise.clone().into_iter().collect(),
            GroupKey::MovieType => vec![movie_type_of(movie).to_string()],
            GroupKey::Year => year_of(movie).map(|y| y.to_string()).into_iter().collect(),
            GroupKey::Language => movie.original_language.clone().into_iter().collect(),
        }
    }
}

/// Aggregate applied to each group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Mean,
    Sum,
    Count,
    Median,
    Min,
    Max,
}

impl Aggregation {
    /// `None` for an empty input except `Count`
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return match self {
                Aggregation::Count => Some(0.0),
                _ => None,
            };
        }
        Some(match self {
            Aggregation::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Aggregation::Sum => values.iter().sum(),
            Aggregation::Count => values.len() as f64,
            Aggregation::Median => return median(values),
            Aggregation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    Aggregation::Mean.apply(values)
}

fn sum(values: &[f64]) -> Option<f64> {
    Aggregation::Sum.apply(values)
}

/// One group's aggregate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStat {
    pub key: String,
    pub value: f64,
    /// Rows contributing a known metric value
    pub count: usize,
}

/// Aggregate `metric` per group, sorted by key
pub fn group_stats(
    rows: &[MovieRecord],
    key: GroupKey,
    metric: Metric,
    agg: Aggregation,
) -> Vec<GroupStat> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for movie in rows {
        let Some(value) = metric.value(movie) else {
            continue;
        };
        for group in key.keys(movie) {
            groups.entry(group).or_default().push(value);
        }
    }

    groups
        .into_iter()
        .filter_map(|(key, values)| {
            agg.apply(&values).map(|value| GroupStat {
                key,
                value,
                count: values.len(),
            })
        })
        .collect()
}

/// Ordering used by [`best_directors`] and [`best_franchises`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollupRanking {
    #[default]
    MeanRevenue,
    TotalRevenue,
    MeanRating,
    MovieCount,
}

/// Per-director or per-franchise summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rollup {
    pub name: String,
    pub movie_count: usize,
    pub total_budget_musd: Option<f64>,
    pub mean_budget_musd: Option<f64>,
    pub total_revenue_musd: Option<f64>,
    pub mean_revenue_musd: Option<f64>,
    pub mean_rating: Option<f64>,
}

impl Rollup {
    fn ranking_value(&self, ranking: RollupRanking) -> Option<f64> {
        match ranking {
            RollupRanking::MeanRevenue => self.mean_revenue_musd,
            RollupRanking::TotalRevenue => self.total_revenue_musd,
            RollupRanking::MeanRating => self.mean_rating,
            RollupRanking::MovieCount => Some(self.movie_count as f64),
        }
    }
}

fn rollup_by<'a, F>(
    rows: &'a [MovieRecord],
    name_of: F,
    min_movies: usize,
    ranking: RollupRanking,
) -> Vec<Rollup>
where
    F: Fn(&'a MovieRecord) -> Option<&'a str>,
{
    let mut groups: BTreeMap<&str, Vec<&MovieRecord>> = BTreeMap::new();
    for movie in rows {
        if let Some(name) = name_of(movie) {
            groups.entry(name).or_default().push(movie);
        }
    }

    let mut rollups: Vec<Rollup> = groups
        .into_iter()
        .filter(|(_, movies)| movies.len() >= min_movies)
        .map(|(name, movies)| {
            let budgets: Vec<f64> = movies.iter().filter_map(|m| m.budget_musd).collect();
            let revenues: Vec<f64> = movies.iter().filter_map(|m| m.revenue_musd).collect();
            let ratings: Vec<f64> = movies.iter().filter_map(|m| m.vote_average).collect();
            Rollup {
                name: name.to_string(),
                movie_count: movies.len(),
                total_budget_musd: sum(&budgets),
                mean_budget_musd: mean(&budgets),
                total_revenue_musd: sum(&revenues),
                mean_revenue_musd: mean(&revenues),
                mean_rating: mean(&ratings),
            }
        })
        .collect();

    // Unknown ranking values sort last; equal values fall back to name
    rollups.sort_by(|a, b| {
        match (a.ranking_value(ranking), b.ranking_value(ranking)) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
        .then_with(|| a.name.cmp(&b.name))
    });
    rollups
}

/// Directors with at least `min_movies` credited rows, best first
pub fn best_directors(rows: &[MovieRecord], min_movies: usize, ranking: RollupRanking) -> Vec<Rollup> {
    rollup_by(rows, |m| m.director.as_deref(), min_movies, ranking)
}

/// Franchises with at least `min_movies` rows, best first
pub fn best_franchises(rows: &[MovieRecord], min_movies: usize, ranking: RollupRanking) -> Vec<Rollup> {
    rollup_by(rows, |m| m.franchise.as_deref(), min_movies, ranking)
}

/// Franchise vs standalone summary row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeComparison {
    pub movie_type: MovieType,
    pub movie_count: usize,
    pub mean_revenue_musd: Option<f64>,
    pub median_roi: Option<f64>,
    pub mean_budget_musd: Option<f64>,
    pub mean_popularity: Option<f64>,
    pub mean_rating: Option<f64>,
}

/// Compare franchise and standalone movies; types with no rows are omitted
pub fn compare_movie_types(rows: &[MovieRecord]) -> Vec<TypeComparison> {
    [MovieType::Franchise, MovieType::Standalone]
        .into_iter()
        .filter_map(|kind| {
            let movies: Vec<&MovieRecord> = rows.iter().filter(|m| movie_type_of(m) == kind).collect();
            if movies.is_empty() {
                return None;
            }
            let column = |metric: Metric| -> Vec<f64> {
                movies.iter().filter_map(|m| metric.value(m)).collect()
            };
            Some(TypeComparison {
                movie_type: kind,
                movie_count: movies.len(),
                mean_revenue_musd: mean(&column(Metric::Revenue)),
                median_roi: median(&column(Metric::Roi)),
                mean_budget_musd: mean(&column(Metric::Budget)),
                mean_popularity: mean(&column(Metric::Popularity)),
                mean_rating: mean(&column(Metric::VoteAverage)),
            })
        })
        .collect()
}
