//! Derived columns: profit, ROI, movie type, release year
//!
//! Each function consumes the collection and returns the rebuilt one; no
//! earlier stage's output is touched.

use crate::models::{MovieRecord, MovieType};
use chrono::Datelike;

/// Profit and ROI for one row
///
/// Profit needs both amounts; ROI additionally needs a positive budget.
/// Both are `None` whenever budget is unknown, and a non-finite ratio is
/// never returned.
pub fn profit_and_roi(budget_musd: Option<f64>, revenue_musd: Option<f64>) -> (Option<f64>, Option<f64>) {
    let (Some(budget), Some(revenue)) = (budget_musd, revenue_musd) else {
        return (None, None);
    };
    if budget <= 0.0 {
        return (None, None);
    }

    let profit = revenue - budget;
    let roi = Some(profit / budget).filter(|r| r.is_finite());
    (Some(profit), roi)
}

/// Fill `profit_musd` and `roi`
pub fn compute_profit_and_roi(rows: Vec<MovieRecord>) -> Vec<MovieRecord> {
    rows.into_iter()
        .map(|mut movie| {
            let (profit, roi) = profit_and_roi(movie.budget_musd, movie.revenue_musd);
            movie.metrics.profit_musd = profit;
            movie.metrics.roi = roi;
            movie
        })
        .collect()
}

/// Fill `movie_type` from franchise presence
pub fn classify_type(rows: Vec<MovieRecord>) -> Vec<MovieRecord> {
    rows.into_iter()
        .map(|mut movie| {
            movie.metrics.movie_type = Some(MovieType::from_franchise(movie.franchise.as_deref()));
            movie
        })
        .collect()
}

/// Fill `year` from the release date
pub fn derive_year(rows: Vec<MovieRecord>) -> Vec<MovieRecord> {
    rows.into_iter()
        .map(|mut movie| {
            movie.metrics.year = movie.release_date.map(|d| d.year());
            movie
        })
        .collect()
}

/// Every derivation in order
pub fn derive_metrics(rows: Vec<MovieRecord>) -> Vec<MovieRecord> {
    derive_year(classify_type(compute_profit_and_roi(rows)))
}

/// Movie type of a row, computed on the fly if not yet derived
pub(crate) fn movie_type_of(movie: &MovieRecord) -> MovieType {
    movie
        .metrics
        .movie_type
        .unwrap_or_else(|| MovieType::from_franchise(movie.franchise.as_deref()))
}

/// Release year of a row, computed on the fly if not yet derived
pub(crate) fn year_of(movie: &MovieRecord) -> Option<i32> {
    movie.metrics.year.or_else(|| movie.release_date.map(|d| d.year()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_profit_and_roi_known_amounts() {
        let (profit, roi) = profit_and_roi(Some(356.0), Some(2799.44));
        assert!((profit.unwrap() - 2443.44).abs() < 1e-9);
        assert!((roi.unwrap() - 2443.44 / 356.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_budget_gives_nulls() {
        assert_eq!(profit_and_roi(None, Some(50.0)), (None, None));
        assert_eq!(profit_and_roi(Some(0.0), Some(50.0)), (None, None));
        assert_eq!(profit_and_roi(Some(10.0), None), (None, None));
    }

    #[test]
    fn test_loss_making_movie_has_negative_roi() {
        let (profit, roi) = profit_and_roi(Some(200.0), Some(50.0));
        assert_eq!(profit, Some(-150.0));
        assert_eq!(roi, Some(-0.75));
    }

    #[test]
    fn test_derive_metrics_fills_everything() {
        let mut franchise = MovieRecord::new(1, "Sequel");
        franchise.franchise = Some("Saga".to_string());
        franchise.budget_musd = Some(100.0);
        franchise.revenue_musd = Some(300.0);
        franchise.release_date = NaiveDate::from_ymd_opt(2018, 4, 25);

        let standalone = MovieRecord::new(2, "Original");

        let rows = derive_metrics(vec![franchise, standalone]);
        assert_eq!(rows[0].metrics.profit_musd, Some(200.0));
        assert_eq!(rows[0].metrics.roi, Some(2.0));
        assert_eq!(rows[0].metrics.movie_type, Some(MovieType::Franchise));
        assert_eq!(rows[0].metrics.year, Some(2018));

        assert_eq!(rows[1].metrics.profit_musd, None);
        assert_eq!(rows[1].metrics.roi, None);
        assert_eq!(rows[1].metrics.movie_type, Some(MovieType::Standalone));
        assert_eq!(rows[1].metrics.year, None);
    }

    #[test]
    fn test_fallbacks_before_derivation() {
        let mut movie = MovieRecord::new(3, "Raw");
        movie.franchise = Some("Saga".to_string());
        movie.release_date = NaiveDate::from_ymd_opt(2009, 12, 10);
        assert_eq!(movie_type_of(&movie), MovieType::Franchise);
        assert_eq!(year_of(&movie), Some(2009));
    }
}
