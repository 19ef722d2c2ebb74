//! KPI / aggregator
//!
//! Pure functions over the normalized collection: derived columns, ranked
//! queries, grouped rollups and the named KPI report.

pub mod derive;
pub mod ranking;
pub mod report;
pub mod rollup;

pub use derive::{classify_type, compute_profit_and_roi, derive_metrics, derive_year, profit_and_roi};
pub use ranking::{
    bottom_n_by, highest_rated, least_voted, lowest_rated, most_voted, rank_by, search, top_n_by,
    Filter, Metric, Order, Ranked, RELIABLE_VOTE_THRESHOLD,
};
pub use report::{compute_all_kpis, compute_kpi, KpiDefinition, KpiResult, KPI_DEFINITIONS};
pub use rollup::{
    best_directors, best_franchises, compare_movie_types, group_stats, Aggregation, GroupKey,
    GroupStat, Rollup, RollupRanking, TypeComparison,
};
