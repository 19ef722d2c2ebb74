//! Type normalizer: flat rows → canonical [`MovieRecord`]s
//!
//! - Budget and revenue are coerced to whole currency units and scaled to
//!   millions; zero means unknown and becomes `None`, never `0.0`
//! - Release dates are parsed into calendar dates; anything unparseable is `None`
//! - Rows without an identifier or title are dropped, duplicate
//!   identifiers keep their first occurrence

use crate::models::{DerivedMetrics, FlatMovie, MovieRecord};
use chrono::{DateTime, NaiveDate};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Currency units per million
pub const UNITS_PER_MILLION: f64 = 1_000_000.0;

/// Highest meaningful vote average
pub const MAX_VOTE_AVERAGE: f64 = 10.0;

/// Normalize a batch of flattened rows
pub fn normalize(flat: Vec<FlatMovie>) -> Vec<MovieRecord> {
    let input_rows = flat.len();
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(input_rows);

    for movie in flat {
        let Some(id) = movie.id else {
            warn!(title = ?movie.title, "Dropping row without identifier");
            continue;
        };

        let Some(title) = non_blank(movie.title.clone()) else {
            warn!(movie_id = id, "Dropping row without title");
            continue;
        };

        if !seen.insert(id) {
            warn!(movie_id = id, "Dropping duplicate identifier");
            continue;
        }

        records.push(normalize_row(id, title, movie));
    }

    info!(
        input_rows,
        output_rows = records.len(),
        "Normalization complete"
    );
    records
}

fn normalize_row(id: i64, title: String, movie: FlatMovie) -> MovieRecord {
    let release_date = parse_release_date(movie.release_date.as_deref());
    if release_date.is_none() && movie.release_date.is_some() {
        debug!(movie_id = id, raw = ?movie.release_date, "Unparseable release date");
    }

    MovieRecord {
        id,
        title,
        tagline: non_blank(movie.tagline),
        release_date,
        genres: movie.genres,
        franchise: non_blank(movie.franchise),
        original_language: non_blank(movie.original_language),
        overview: non_blank(movie.overview),
        poster_path: non_blank(movie.poster_path),
        budget_musd: to_millions(currency_units(movie.budget)),
        revenue_musd: to_millions(currency_units(movie.revenue)),
        production_companies: movie.production_companies,
        production_countries: movie.production_countries,
        spoken_languages: movie.spoken_languages,
        runtime: runtime_minutes(movie.runtime),
        vote_count: vote_count(movie.vote_count),
        vote_average: movie
            .vote_average
            .filter(|v| (0.0..=MAX_VOTE_AVERAGE).contains(v)),
        popularity: movie.popularity.filter(|v| *v >= 0.0),
        cast: movie.cast,
        cast_size: movie.cast_size,
        director: non_blank(movie.director),
        crew_size: movie.crew_size,
        metrics: DerivedMetrics::default(),
    }
}

/// Whole currency units; zero or negative amounts are unknown
pub fn currency_units(amount: Option<f64>) -> Option<i64> {
    amount
        .map(f64::round)
        .filter(|v| *v >= 1.0 && *v <= i64::MAX as f64)
        .map(|v| v as i64)
}

/// Currency units → millions
pub fn to_millions(units: Option<i64>) -> Option<f64> {
    units.map(|v| v as f64 / UNITS_PER_MILLION)
}

/// Parse `YYYY-MM-DD`, or take the date of an RFC 3339 timestamp
pub fn parse_release_date(text: Option<&str>) -> Option<NaiveDate> {
    let text = text.map(str::trim).filter(|t| !t.is_empty())?;

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

fn runtime_minutes(runtime: Option<f64>) -> Option<u32> {
    runtime
        .map(f64::round)
        .filter(|v| *v >= 0.0 && *v <= u32::MAX as f64)
        .map(|v| v as u32)
}

/// Missing or negative counts mean no reliable votes
fn vote_count(count: Option<f64>) -> u64 {
    count
        .map(f64::round)
        .filter(|v| *v >= 0.0)
        .map(|v| v as u64)
        .unwrap_or(0)
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PipeList;

    fn flat(id: i64, title: &str) -> FlatMovie {
        FlatMovie {
            id: Some(id),
            title: Some(title.to_string()),
            ..FlatMovie::default()
        }
    }

    #[test]
    fn test_zero_budget_is_unknown_not_zero() {
        let mut movie = flat(100, "Scenario");
        movie.budget = Some(0.0);
        movie.revenue = Some(50_000_000.0);

        let records = normalize(vec![movie]);
        assert_eq!(records[0].budget_musd, None);
        assert_eq!(records[0].revenue_musd, Some(50.0));
    }

    #[test]
    fn test_millions_scaling() {
        let mut movie = flat(299534, "Avengers: Endgame");
        movie.budget = Some(356_000_000.0);
        movie.revenue = Some(2_799_439_100.0);

        let record = &normalize(vec![movie])[0];
        assert_eq!(record.budget_musd, Some(356.0));
        assert!((record.revenue_musd.unwrap() - 2799.4391).abs() < 1e-9);
    }

    #[test]
    fn test_currency_units_rounds_and_rejects_non_positive() {
        assert_eq!(currency_units(Some(1_500_000.4)), Some(1_500_000));
        assert_eq!(currency_units(Some(0.0)), None);
        assert_eq!(currency_units(Some(-5.0)), None);
        assert_eq!(currency_units(None), None);
    }

    #[test]
    fn test_release_date_parsing() {
        assert_eq!(
            parse_release_date(Some("2019-04-24")),
            NaiveDate::from_ymd_opt(2019, 4, 24)
        );
        assert_eq!(
            parse_release_date(Some("2015-12-15T00:00:00Z")),
            NaiveDate::from_ymd_opt(2015, 12, 15)
        );
        assert_eq!(parse_release_date(Some("")), None);
        assert_eq!(parse_release_date(Some("soon")), None);
        assert_eq!(parse_release_date(Some("2019-02-30")), None);
        assert_eq!(parse_release_date(None), None);
    }

    #[test]
    fn test_rows_without_id_or_title_are_dropped() {
        let no_id = FlatMovie {
            title: Some("Orphan".to_string()),
            ..FlatMovie::default()
        };
        let no_title = FlatMovie {
            id: Some(5),
            ..FlatMovie::default()
        };
        let blank_title = flat(6, "   ");

        let records = normalize(vec![no_id, no_title, blank_title, flat(7, "Kept")]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 7);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let records = normalize(vec![flat(1, "First"), flat(2, "Other"), flat(1, "Second")]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "First");
        assert_eq!(records[1].id, 2);
    }

    #[test]
    fn test_audience_fields() {
        let mut movie = flat(1, "Votes");
        movie.vote_count = Some(-3.0);
        movie.vote_average = Some(11.0);
        movie.popularity = Some(-1.0);
        movie.runtime = Some(181.0);

        let record = &normalize(vec![movie])[0];
        assert_eq!(record.vote_count, 0);
        assert_eq!(record.vote_average, None);
        assert_eq!(record.popularity, None);
        assert_eq!(record.runtime, Some(181));

        let mut movie = flat(2, "Votes");
        movie.vote_count = Some(25_000.0);
        movie.vote_average = Some(8.3);
        let record = &normalize(vec![movie])[0];
        assert_eq!(record.vote_count, 25_000);
        assert_eq!(record.vote_average, Some(8.3));
    }

    #[test]
    fn test_blank_text_becomes_none_and_lists_pass_through() {
        let mut movie = flat(1, "Text");
        movie.tagline = Some(String::new());
        movie.genres = Some(PipeList::default());

        let record = &normalize(vec![movie])[0];
        assert_eq!(record.tagline, None);
        assert_eq!(record.genres, Some(PipeList::default()));
        assert_eq!(record.metrics, DerivedMetrics::default());
    }
}
