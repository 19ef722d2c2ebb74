//! Named KPI report written to `movie_kpis.csv`

use super::ranking::{rank_by, Filter, Metric, Order};
use crate::models::MovieRecord;
use serde::Serialize;
use tracing::{debug, info};

/// Budget floor (millions) for the ROI KPIs
pub const ROI_MIN_BUDGET_MUSD: f64 = 10.0;

/// One named best/worst query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpiDefinition {
    pub name: &'static str,
    pub metric: Metric,
    pub order: Order,
    pub min_budget_musd: Option<f64>,
}

impl KpiDefinition {
    const fn new(name: &'static str, metric: Metric, order: Order) -> Self {
        Self {
            name,
            metric,
            order,
            min_budget_musd: None,
        }
    }

    const fn with_min_budget(self, min: f64) -> Self {
        Self {
            min_budget_musd: Some(min),
            ..self
        }
    }
}

/// Report contents, in output order
pub const KPI_DEFINITIONS: [KpiDefinition; 10] = [
    KpiDefinition::new("Highest Revenue", Metric::Revenue, Order::Descending),
    KpiDefinition::new("Highest Budget", Metric::Budget, Order::Descending),
    KpiDefinition::new("Highest Profit", Metric::Profit, Order::Descending),
    KpiDefinition::new("Lowest Profit", Metric::Profit, Order::Ascending),
    KpiDefinition::new("Highest ROI (Budget ≥ 10M)", Metric::Roi, Order::Descending)
        .with_min_budget(ROI_MIN_BUDGET_MUSD),
    KpiDefinition::new("Lowest ROI (Budget ≥ 10M)", Metric::Roi, Order::Ascending)
        .with_min_budget(ROI_MIN_BUDGET_MUSD),
    KpiDefinition::new("Most Voted", Metric::VoteCount, Order::Descending),
    KpiDefinition::new("Highest Rated (Votes ≥ 10)", Metric::VoteAverage, Order::Descending),
    KpiDefinition::new("Lowest Rated (Votes ≥ 10)", Metric::VoteAverage, Order::Ascending),
    KpiDefinition::new("Most Popular", Metric::Popularity, Order::Descending),
];

/// One report line; `movie` and `value` are `None` when nothing qualified
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiResult {
    pub kpi: String,
    pub movie: Option<String>,
    pub value: Option<f64>,
}

/// Evaluate a single definition
pub fn compute_kpi(rows: &[MovieRecord], definition: &KpiDefinition) -> KpiResult {
    let filters: Vec<Filter> = definition
        .min_budget_musd
        .map(Filter::MinBudgetMusd)
        .into_iter()
        .collect();

    let best = rank_by(rows, definition.metric, &filters, definition.order)
        .into_iter()
        .next();

    match best {
        Some(ranked) => KpiResult {
            kpi: definition.name.to_string(),
            movie: Some(ranked.movie.title.clone()),
            value: Some(ranked.value),
        },
        None => {
            debug!(kpi = definition.name, "No qualifying movie");
            KpiResult {
                kpi: definition.name.to_string(),
                movie: None,
                value: None,
            }
        }
    }
}

/// Every KPI in [`KPI_DEFINITIONS`] order
pub fn compute_all_kpis(rows: &[MovieRecord]) -> Vec<KpiResult> {
    let results: Vec<KpiResult> = KPI_DEFINITIONS
        .iter()
        .map(|definition| compute_kpi(rows, definition))
        .collect();

    for result in &results {
        info!(
            kpi = %result.kpi,
            movie = result.movie.as_deref().unwrap_or("-"),
            value = ?result.value,
            "KPI"
        );
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::derive_metrics;

    fn movie(id: i64, title: &str, budget: Option<f64>, revenue: Option<f64>) -> MovieRecord {
        let mut m = MovieRecord::new(id, title);
        m.budget_musd = budget;
        m.revenue_musd = revenue;
        m
    }

    fn find<'a>(results: &'a [KpiResult], name: &str) -> &'a KpiResult {
        results.iter().find(|r| r.kpi == name).unwrap()
    }

    #[test]
    fn test_report_has_every_kpi_in_order() {
        let results = compute_all_kpis(&[]);
        let names: Vec<&str> = results.iter().map(|r| r.kpi.as_str()).collect();
        assert_eq!(names.len(), 10);
        assert_eq!(names[0], "Highest Revenue");
        assert_eq!(names[9], "Most Popular");
        assert!(results.iter().all(|r| r.movie.is_none() && r.value.is_none()));
    }

    #[test]
    fn test_roi_kpis_respect_budget_floor() {
        let rows = derive_metrics(vec![
            movie(1, "Micro Budget", Some(1.0), Some(100.0)),
            movie(2, "Blockbuster", Some(200.0), Some(1000.0)),
            movie(3, "Flop", Some(100.0), Some(50.0)),
        ]);
        let results = compute_all_kpis(&rows);

        let best = find(&results, "Highest ROI (Budget ≥ 10M)");
        assert_eq!(best.movie.as_deref(), Some("Blockbuster"));
        assert_eq!(best.value, Some(4.0));

        let worst = find(&results, "Lowest ROI (Budget ≥ 10M)");
        assert_eq!(worst.movie.as_deref(), Some("Flop"));
        assert_eq!(worst.value, Some(-0.5));

        let lowest_profit = find(&results, "Lowest Profit");
        assert_eq!(lowest_profit.movie.as_deref(), Some("Flop"));
        assert_eq!(lowest_profit.value, Some(-50.0));
    }

    #[test]
    fn test_rating_kpis_skip_unreliable_votes() {
        let mut obscure = movie(1, "Obscure", None, None);
        obscure.vote_average = Some(10.0);
        obscure.vote_count = 3;
        let mut known = movie(2, "Known", None, None);
        known.vote_average = Some(7.1);
        known.vote_count = 5000;

        let results = compute_all_kpis(&[obscure, known]);
        assert_eq!(find(&results, "Highest Rated (Votes ≥ 10)").movie.as_deref(), Some("Known"));
        assert_eq!(find(&results, "Lowest Rated (Votes ≥ 10)").movie.as_deref(), Some("Known"));
        assert_eq!(find(&results, "Most Voted").value, Some(5000.0));
        assert_eq!(find(&results, "Highest Budget").movie, None);
    }
}
