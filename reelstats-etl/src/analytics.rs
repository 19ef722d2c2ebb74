//! Summary tables behind the analysis charts
//!
//! Builders are pure; [`crate::export`] writes the results as CSV.

use crate::kpi::derive::year_of;
use crate::kpi::{
    best_directors, best_franchises, compare_movie_types, group_stats, Aggregation, GroupKey,
    GroupStat, Metric, Rollup, RollupRanking, TypeComparison,
};
use crate::models::MovieRecord;
use serde::Serialize;
use std::collections::BTreeMap;

/// Mean ROI per primary genre, best first
pub fn roi_by_genre(rows: &[MovieRecord]) -> Vec<GroupStat> {
    let mut stats = group_stats(rows, GroupKey::PrimaryGenre, Metric::Roi, Aggregation::Mean);
    stats.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.key.cmp(&b.key)));
    stats
}

/// One release year of the revenue trend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearPoint {
    pub year: i32,
    pub mean_revenue_musd: f64,
    pub movie_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevenueTrend {
    /// Ascending by year
    pub points: Vec<YearPoint>,
    /// Mean over every row with a known year and revenue
    pub overall_mean_musd: Option<f64>,
}

/// Mean revenue per release year
pub fn yearly_revenue_trend(rows: &[MovieRecord]) -> RevenueTrend {
    let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for movie in rows {
        if let (Some(year), Some(revenue)) = (year_of(movie), movie.revenue_musd) {
            by_year.entry(year).or_default().push(revenue);
        }
    }

    let all: Vec<f64> = by_year.values().flatten().copied().collect();
    let points = by_year
        .into_iter()
        .filter_map(|(year, revenues)| {
            Aggregation::Mean.apply(&revenues).map(|mean| YearPoint {
                year,
                mean_revenue_musd: mean,
                movie_count: revenues.len(),
            })
        })
        .collect();

    RevenueTrend {
        points,
        overall_mean_musd: Aggregation::Mean.apply(&all),
    }
}

/// Franchise vs standalone table
pub fn movie_type_comparison(rows: &[MovieRecord]) -> Vec<TypeComparison> {
    compare_movie_types(rows)
}

/// One movie plotted on two metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub id: i64,
    pub title: String,
    pub x: f64,
    pub y: f64,
}

fn scatter(rows: &[MovieRecord], x: Metric, y: Metric) -> Vec<ScatterPoint> {
    rows.iter()
        .filter_map(|movie| {
            Some(ScatterPoint {
                id: movie.id,
                title: movie.title.clone(),
                x: x.value(movie)?,
                y: y.value(movie)?,
            })
        })
        .collect()
}

/// Budget (x) against revenue (y), both in millions
pub fn revenue_vs_budget(rows: &[MovieRecord]) -> Vec<ScatterPoint> {
    scatter(rows, Metric::Budget, Metric::Revenue)
}

/// Rating (x) against popularity (y)
pub fn popularity_vs_rating(rows: &[MovieRecord]) -> Vec<ScatterPoint> {
    scatter(rows, Metric::VoteAverage, Metric::Popularity)
}

/// Every table written alongside the movie export
#[derive(Debug, Clone, Default)]
pub struct AnalyticsSummary {
    pub roi_by_genre: Vec<GroupStat>,
    pub yearly_revenue: RevenueTrend,
    pub movie_types: Vec<TypeComparison>,
    pub best_directors: Vec<Rollup>,
    pub best_franchises: Vec<Rollup>,
    pub revenue_vs_budget: Vec<ScatterPoint>,
    pub popularity_vs_rating: Vec<ScatterPoint>,
}

/// Build every summary table; rollups include any director or franchise
/// with at least one row
pub fn summarize(rows: &[MovieRecord]) -> AnalyticsSummary {
    AnalyticsSummary {
        roi_by_genre: roi_by_genre(rows),
        yearly_revenue: yearly_revenue_trend(rows),
        movie_types: movie_type_comparison(rows),
        best_directors: best_directors(rows, 1, RollupRanking::default()),
        best_franchises: best_franchises(rows, 1, RollupRanking::default()),
        revenue_vs_budget: revenue_vs_budget(rows),
        popularity_vs_rating: popularity_vs_rating(rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::derive_metrics;
    use crate::models::PipeList;
    use chrono::NaiveDate;

    fn movie(id: i64, genres: &str, budget: Option<f64>, revenue: Option<f64>, year: Option<i32>) -> MovieRecord {
        let mut m = MovieRecord::new(id, format!("Movie {}", id));
        m.genres = Some(PipeList::parse(genres));
        m.budget_musd = budget;
        m.revenue_musd = revenue;
        m.release_date = year.and_then(|y| NaiveDate::from_ymd_opt(y, 6, 1));
        m
    }

    #[test]
    fn test_roi_by_genre_descending() {
        let rows = derive_metrics(vec![
            movie(1, "Action|Drama", Some(100.0), Some(200.0), None),
            movie(2, "Action", Some(100.0), Some(400.0), None),
            movie(3, "Horror", Some(10.0), Some(100.0), None),
            movie(4, "Drama", None, Some(100.0), None),
        ]);
        let stats = roi_by_genre(&rows);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].key, "Horror");
        assert_eq!(stats[0].value, 9.0);
        assert_eq!(stats[1].key, "Action");
        assert_eq!(stats[1].value, 2.0);
        assert_eq!(stats[1].count, 2);
    }

    #[test]
    fn test_yearly_revenue_trend() {
        let rows = derive_metrics(vec![
            movie(1, "Action", None, Some(100.0), Some(2019)),
            movie(2, "Action", None, Some(300.0), Some(2019)),
            movie(3, "Action", None, Some(50.0), Some(2015)),
            movie(4, "Action", None, Some(999.0), None),
            movie(5, "Action", None, None, Some(2012)),
        ]);
        let trend = yearly_revenue_trend(&rows);
        assert_eq!(
            trend.points,
            vec![
                YearPoint { year: 2015, mean_revenue_musd: 50.0, movie_count: 1 },
                YearPoint { year: 2019, mean_revenue_musd: 200.0, movie_count: 2 },
            ]
        );
        assert_eq!(trend.overall_mean_musd, Some(150.0));
    }

    #[test]
    fn test_scatter_points_need_both_values() {
        let mut rated = movie(1, "Drama", Some(10.0), Some(20.0), None);
        rated.vote_average = Some(7.5);
        rated.popularity = Some(33.0);
        let rows = vec![rated, movie(2, "Drama", None, Some(5.0), None)];

        let money = revenue_vs_budget(&rows);
        assert_eq!(money.len(), 1);
        assert_eq!((money[0].x, money[0].y), (10.0, 20.0));

        let audience = popularity_vs_rating(&rows);
        assert_eq!(audience.len(), 1);
        assert_eq!((audience[0].x, audience[0].y), (7.5, 33.0));
    }

    #[test]
    fn test_summary_of_no_rows_is_empty() {
        let summary = summarize(&[]);
        assert!(summary.roi_by_genre.is_empty());
        assert!(summary.yearly_revenue.points.is_empty());
        assert_eq!(summary.yearly_revenue.overall_mean_musd, None);
        assert!(summary.movie_types.is_empty());
        assert!(summary.best_directors.is_empty());
    }
}
