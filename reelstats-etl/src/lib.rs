//! reelstats-etl library interface
//!
//! Movie metadata ETL: fetch catalog records, flatten and normalize them,
//! derive KPIs and write the analysis artifacts.

pub mod analytics;
pub mod config;
pub mod export;
pub mod fetcher;
pub mod flatten;
pub mod kpi;
pub mod models;
pub mod normalize;
pub mod pipeline;

pub use crate::fetcher::{fetch_all, CatalogClient, FetchError, FetchFailure, FetchOutcome, TmdbClient};
pub use crate::pipeline::{transform, Pipeline, PipelineReport};
