//! Pipeline orchestration
//!
//! fetch (or load) → flatten → normalize → derive → export. Each stage
//! consumes the previous stage's collection and hands on a new one.

use crate::analytics::{self, AnalyticsSummary};
use crate::config::PipelineConfig;
use crate::export;
use crate::fetcher::{fetch_all, CatalogClient, FetchFailure, TmdbClient};
use crate::flatten::flatten_all;
use crate::kpi::{compute_all_kpis, derive_metrics};
use crate::models::{MovieRecord, RawMovie};
use crate::normalize::normalize;
use reelstats_common::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Raw records → derived movie rows
pub fn transform(raw: &[RawMovie], cast_limit: usize) -> Vec<MovieRecord> {
    derive_metrics(normalize(flatten_all(raw, cast_limit)))
}

/// What a run did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub requested: usize,
    pub fetched: usize,
    pub failed: usize,
    /// Rows that survived normalization
    pub rows: usize,
    /// Every file written, in write order
    pub artifacts: Vec<PathBuf>,
}

pub struct Pipeline {
    config: PipelineConfig,
    raw_input: Option<PathBuf>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            raw_input: None,
        }
    }

    /// Load raw records from a saved JSON Lines file instead of fetching
    pub fn with_raw_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.raw_input = Some(path.into());
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run against the configured catalog, or the raw input file if set
    pub async fn run(&self) -> Result<PipelineReport> {
        if let Some(path) = &self.raw_input {
            return self.run_from_file(path);
        }

        let api_key = self.config.require_api_key()?;
        let client = TmdbClient::new(&self.config.base_url, api_key, &self.config.api)
            .map_err(|e| Error::Internal(e.to_string()))?;
        self.run_with(&client).await
    }

    /// Fetch the configured ids through `client` and write every artifact
    pub async fn run_with<C>(&self, client: &C) -> Result<PipelineReport>
    where
        C: CatalogClient + ?Sized,
    {
        info!(
            ids = self.config.movie_ids.len(),
            base_url = %self.config.base_url,
            "Fetching movies"
        );
        let outcome = fetch_all(client, &self.config.movie_ids).await;

        let output_dir = self.prepare_output_dir()?;
        let raw_path = output_dir.join(export::RAW_JSONL);
        export::write_raw_jsonl(&raw_path, &outcome.records)?;

        let mut report = PipelineReport {
            requested: self.config.movie_ids.len(),
            fetched: outcome.records.len(),
            failed: outcome.failures.len(),
            rows: 0,
            artifacts: vec![raw_path],
        };

        let rows = transform(&outcome.records, self.config.cast_limit);
        report.rows = rows.len();
        report
            .artifacts
            .extend(self.write_artifacts(&output_dir, &rows, &outcome.failures)?);

        log_report(&report);
        Ok(report)
    }

    fn run_from_file(&self, path: &Path) -> Result<PipelineReport> {
        info!(path = %path.display(), "Loading raw records from file");
        let records = export::read_raw_jsonl(path)?;

        let output_dir = self.prepare_output_dir()?;
        let rows = transform(&records, self.config.cast_limit);

        let report = PipelineReport {
            requested: records.len(),
            fetched: records.len(),
            failed: 0,
            rows: rows.len(),
            artifacts: self.write_artifacts(&output_dir, &rows, &[])?,
        };

        log_report(&report);
        Ok(report)
    }

    fn prepare_output_dir(&self) -> Result<PathBuf> {
        let dir = self.config.output_dir.clone();
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::Config(format!("Cannot create output directory {}: {}", dir.display(), e))
        })?;
        Ok(dir)
    }

    fn write_artifacts(
        &self,
        dir: &Path,
        rows: &[MovieRecord],
        failures: &[FetchFailure],
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        let mut target = |name: &str| {
            let path = dir.join(name);
            written.push(path.clone());
            path
        };

        export::write_movies_csv(&target(export::MOVIES_CSV), rows)?;
        export::write_movies_jsonl(&target(export::MOVIES_JSONL), rows)?;
        export::write_kpis_csv(&target(export::KPIS_CSV), &compute_all_kpis(rows))?;

        let AnalyticsSummary {
            roi_by_genre,
            yearly_revenue,
            movie_types,
            best_directors,
            best_franchises,
            revenue_vs_budget,
            popularity_vs_rating,
        } = analytics::summarize(rows);

        export::write_group_stats_csv(
            &target(export::ROI_BY_GENRE_CSV),
            "primary_genre",
            "mean_roi",
            &roi_by_genre,
        )?;
        export::write_yearly_revenue_csv(&target(export::YEARLY_REVENUE_CSV), &yearly_revenue)?;
        export::write_type_comparison_csv(&target(export::MOVIE_TYPES_CSV), &movie_types)?;
        export::write_rollups_csv(&target(export::BEST_DIRECTORS_CSV), "director", &best_directors)?;
        export::write_rollups_csv(&target(export::BEST_FRANCHISES_CSV), "franchise", &best_franchises)?;
        export::write_scatter_csv(
            &target(export::REVENUE_VS_BUDGET_CSV),
            "budget_musd",
            "revenue_musd",
            &revenue_vs_budget,
        )?;
        export::write_scatter_csv(
            &target(export::POPULARITY_VS_RATING_CSV),
            "vote_average",
            "popularity",
            &popularity_vs_rating,
        )?;

        if !failures.is_empty() {
            export::write_failures_csv(&target(export::FAILURES_CSV), failures)?;
        }

        Ok(written)
    }
}

fn log_report(report: &PipelineReport) {
    if report.rows == 0 {
        warn!(requested = report.requested, "No movies survived the pipeline");
    }
    info!(
        requested = report.requested,
        fetched = report.fetched,
        failed = report.failed,
        rows = report.rows,
        artifacts = report.artifacts.len(),
        "Pipeline complete"
    );
}
