//! Artifact writers
//!
//! Presentation only: fixes the column order of the movie table and
//! persists every table as CSV (and the movie table additionally as JSON
//! Lines). Unknown values are empty CSV cells and JSON `null`; zero is
//! always written as `0`.
//!
//! Every CSV file starts with its header row, even when no rows follow.

use crate::analytics::{RevenueTrend, ScatterPoint};
use crate::fetcher::FetchFailure;
use crate::kpi::{GroupStat, KpiResult, Rollup, TypeComparison};
use crate::models::{MovieRecord, MovieType, PipeList, RawMovie};
use chrono::NaiveDate;
use reelstats_common::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

pub const RAW_JSONL: &str = "movies_raw.jsonl";
pub const MOVIES_CSV: &str = "movies_transformed.csv";
pub const MOVIES_JSONL: &str = "movies_transformed.jsonl";
pub const KPIS_CSV: &str = "movie_kpis.csv";
pub const ROI_BY_GENRE_CSV: &str = "roi_by_genre.csv";
pub const YEARLY_REVENUE_CSV: &str = "yearly_revenue.csv";
pub const MOVIE_TYPES_CSV: &str = "movie_type_comparison.csv";
pub const BEST_DIRECTORS_CSV: &str = "best_directors.csv";
pub const BEST_FRANCHISES_CSV: &str = "best_franchises.csv";
pub const REVENUE_VS_BUDGET_CSV: &str = "revenue_vs_budget.csv";
pub const POPULARITY_VS_RATING_CSV: &str = "popularity_vs_rating.csv";
pub const FAILURES_CSV: &str = "fetch_failures.csv";

/// Movie table columns, grouped as identification, financial, production,
/// audience, crew/cast
pub const MOVIE_COLUMNS: [&str; 26] = [
    "id",
    "title",
    "tagline",
    "release_date",
    "year",
    "genres",
    "belongs_to_collection",
    "movie_type",
    "original_language",
    "overview",
    "poster_path",
    "budget_musd",
    "revenue_musd",
    "profit_musd",
    "roi",
    "production_companies",
    "production_countries",
    "spoken_languages",
    "runtime",
    "vote_count",
    "vote_average",
    "popularity",
    "cast",
    "cast_size",
    "director",
    "crew_size",
];

/// One exported movie; field order is the column order
#[derive(Debug, Serialize)]
pub struct MovieRow<'a> {
    id: i64,
    title: &'a str,
    tagline: Option<&'a str>,
    release_date: Option<NaiveDate>,
    year: Option<i32>,
    genres: Option<&'a PipeList>,
    belongs_to_collection: Option<&'a str>,
    movie_type: Option<MovieType>,
    original_language: Option<&'a str>,
    overview: Option<&'a str>,
    poster_path: Option<&'a str>,
    budget_musd: Option<f64>,
    revenue_musd: Option<f64>,
    profit_musd: Option<f64>,
    roi: Option<f64>,
    production_companies: Option<&'a PipeList>,
    production_countries: Option<&'a PipeList>,
    spoken_languages: Option<&'a PipeList>,
    runtime: Option<u32>,
    vote_count: u64,
    vote_average: Option<f64>,
    popularity: Option<f64>,
    cast: &'a PipeList,
    cast_size: usize,
    director: Option<&'a str>,
    crew_size: usize,
}

impl<'a> From<&'a MovieRecord> for MovieRow<'a> {
    fn from(movie: &'a MovieRecord) -> Self {
        Self {
            id: movie.id,
            title: &movie.title,
            tagline: movie.tagline.as_deref(),
            release_date: movie.release_date,
            year: movie.metrics.year,
            genres: movie.genres.as_ref(),
            belongs_to_collection: movie.franchise.as_deref(),
            movie_type: movie.metrics.movie_type,
            original_language: movie.original_language.as_deref(),
            overview: movie.overview.as_deref(),
            poster_path: movie.poster_path.as_deref(),
            budget_musd: movie.budget_musd,
            revenue_musd: movie.revenue_musd,
            profit_musd: movie.metrics.profit_musd,
            roi: movie.metrics.roi,
            production_companies: movie.production_companies.as_ref(),
            production_countries: movie.production_countries.as_ref(),
            spoken_languages: movie.spoken_languages.as_ref(),
            runtime: movie.runtime,
            vote_count: movie.vote_count,
            vote_average: movie.vote_average,
            popularity: movie.popularity,
            cast: &movie.cast,
            cast_size: movie.cast_size,
            director: movie.director.as_deref(),
            crew_size: movie.crew_size,
        }
    }
}

/// Write `rows` under an explicit header row
fn write_csv<T, I>(path: &Path, headers: &[&str], rows: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(headers)?;

    let mut count = 0usize;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = count, "Wrote CSV");
    Ok(())
}

/// Write one JSON document per line
fn write_jsonl<T, I>(path: &Path, rows: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    for row in rows {
        serde_json::to_writer(&mut writer, &row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    debug!(path = %path.display(), "Wrote JSON Lines");
    Ok(())
}

/// Persist raw records exactly as received
pub fn write_raw_jsonl(path: &Path, records: &[RawMovie]) -> Result<()> {
    write_jsonl(path, records)
}

/// Load raw records saved by [`write_raw_jsonl`]
///
/// Blank lines are skipped; a line that is not a JSON object is an error
/// naming the line.
pub fn read_raw_jsonl(path: &Path) -> Result<Vec<RawMovie>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(&line)?;
        let record = RawMovie::from_value(value).ok_or_else(|| {
            Error::InvalidInput(format!(
                "{} line {}: expected a JSON object",
                path.display(),
                index + 1
            ))
        })?;
        records.push(record);
    }

    debug!(path = %path.display(), records = records.len(), "Loaded raw records");
    Ok(records)
}

pub fn write_movies_csv(path: &Path, rows: &[MovieRecord]) -> Result<()> {
    write_csv(path, &MOVIE_COLUMNS, rows.iter().map(MovieRow::from))
}

pub fn write_movies_jsonl(path: &Path, rows: &[MovieRecord]) -> Result<()> {
    write_jsonl(path, rows.iter().map(MovieRow::from))
}

pub fn write_kpis_csv(path: &Path, results: &[KpiResult]) -> Result<()> {
    write_csv(path, &["kpi", "movie", "value"], results)
}

/// `key_column` names the grouping column, `value_column` the aggregate
pub fn write_group_stats_csv(
    path: &Path,
    key_column: &str,
    value_column: &str,
    stats: &[GroupStat],
) -> Result<()> {
    write_csv(path, &[key_column, value_column, "movie_count"], stats)
}

#[derive(Serialize)]
struct YearRow {
    year: i32,
    mean_revenue_musd: f64,
    movie_count: usize,
    overall_mean_musd: Option<f64>,
}

/// Per-year means; every row repeats the overall mean for the reference line
pub fn write_yearly_revenue_csv(path: &Path, trend: &RevenueTrend) -> Result<()> {
    write_csv(
        path,
        &["year", "mean_revenue_musd", "movie_count", "overall_mean_musd"],
        trend.points.iter().map(|point| YearRow {
            year: point.year,
            mean_revenue_musd: point.mean_revenue_musd,
            movie_count: point.movie_count,
            overall_mean_musd: trend.overall_mean_musd,
        }),
    )
}

pub fn write_type_comparison_csv(path: &Path, rows: &[TypeComparison]) -> Result<()> {
    write_csv(
        path,
        &[
            "movie_type",
            "movie_count",
            "mean_revenue_musd",
            "median_roi",
            "mean_budget_musd",
            "mean_popularity",
            "mean_rating",
        ],
        rows,
    )
}

/// `name_column` is `director` or `franchise`
pub fn write_rollups_csv(path: &Path, name_column: &str, rollups: &[Rollup]) -> Result<()> {
    write_csv(
        path,
        &[
            name_column,
            "movie_count",
            "total_budget_musd",
            "mean_budget_musd",
            "total_revenue_musd",
            "mean_revenue_musd",
            "mean_rating",
        ],
        rollups,
    )
}

/// `x_column`/`y_column` name the plotted metrics
pub fn write_scatter_csv(path: &Path, x_column: &str, y_column: &str, points: &[ScatterPoint]) -> Result<()> {
    write_csv(path, &["id", "title", x_column, y_column], points)
}

#[derive(Serialize)]
struct FailureRow<'a> {
    id: i64,
    reason: &'a str,
}

pub fn write_failures_csv(path: &Path, failures: &[FetchFailure]) -> Result<()> {
    let reasons: Vec<(i64, String)> = failures
        .iter()
        .map(|failure| (failure.id, failure.reason.to_string()))
        .collect();
    write_csv(
        path,
        &["id", "reason"],
        reasons.iter().map(|(id, reason)| FailureRow { id: *id, reason }),
    )
}
