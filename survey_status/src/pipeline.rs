//! The four batch steps behind the command-line subcommands.
//!
//! Each step loads what it needs, runs the pure services over it and
//! returns the text to print plus any files it wrote.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use log::info;
use std::path::PathBuf;

use crate::config::SurveyConfig;
use crate::db::{load_exposures, CsvCacheRepository, ExposureSource};
use crate::models::{Exposure, Period, QualityPolicy};
use crate::parsing::csv_parser::{
    field_status_path, latest_field_status, parse_field_catalog, parse_field_status,
    parse_windows_csv, write_field_status,
};
use crate::services::field_status::{label_fields, FieldStatusTable};
use crate::services::obstime::{render_summary, summarize_observing_time};
use crate::services::progress::aggregate_progress;
use crate::services::report::render_report;
use crate::services::sky_map::{build_coverage_maps, CoverageCategory, CoverageMap, CoverageRequest};

/// Program drawn on its own set of coverage maps, with its title label.
pub const MC_PROGRAM: (&str, &str) = ("delve-mc", "MC");
pub const PROJECTION: &str = "car";

/// What a step prints and which files it produced.
#[derive(Debug, Default)]
pub struct StepOutput {
    pub report: String,
    pub artifacts: Vec<PathBuf>,
}

pub fn survey_exposures(config: &SurveyConfig, live: Option<&dyn ExposureSource>) -> Result<Vec<Exposure>> {
    let cache = CsvCacheRepository::new(config.paths.exposures.clone());
    let exposures = load_exposures(&cache, live, &config.query)
        .context("Failed to load exposures")?;
    Ok(exposures)
}

/// Most recent field-status file under the output directory.
pub fn current_field_status(config: &SurveyConfig, policy: &QualityPolicy) -> Result<FieldStatusTable> {
    let path = latest_field_status(&config.paths.output_dir, &config.paths.fields_prefix)?
        .ok_or_else(|| {
            anyhow!(
                "No {}-YYYYMMDD.csv.gz in {}; run make-fields first",
                config.paths.fields_prefix,
                config.paths.output_dir.display()
            )
        })?;
    info!("Reading field status from {}", path.display());
    parse_field_status(&path, policy)
}

/// Label every catalog field and write `{prefix}-{today}.csv.gz`.
pub fn run_make_fields(
    config: &SurveyConfig,
    live: Option<&dyn ExposureSource>,
    today: NaiveDate,
) -> Result<StepOutput> {
    let policy = config.policy()?;
    let exposures = survey_exposures(config, live)?;
    let fields = parse_field_catalog(&config.paths.targets)?;

    let table = label_fields(&fields, &exposures, &policy)?;
    let path = field_status_path(&config.paths.output_dir, &config.paths.fields_prefix, today);
    write_field_status(&path, &table)?;

    let observed = table.rows().iter().filter(|r| r.done.is_observed()).count();
    Ok(StepOutput {
        report: format!(
            "Labelled {} fields ({} observed) -> {}",
            table.len(),
            observed,
            path.display()
        ),
        artifacts: vec![path],
    })
}

/// Progress table per (program, band), as text or JSON.
pub fn run_progress(
    config: &SurveyConfig,
    live: Option<&dyn ExposureSource>,
    json: bool,
) -> Result<StepOutput> {
    let policy = config.policy()?;
    let exposures = survey_exposures(config, live)?;
    let table = current_field_status(config, &policy)?;

    let rows = aggregate_progress(&exposures, &table, &policy)?;
    let report = if json {
        serde_json::to_string_pretty(&rows).context("Failed to serialise progress rows")?
    } else {
        render_report(&rows)
    };
    Ok(StepOutput {
        report,
        artifacts: Vec::new(),
    })
}

/// Allocated, observed, good and effective time over the survey.
pub fn run_obstime(config: &SurveyConfig, live: Option<&dyn ExposureSource>) -> Result<StepOutput> {
    let policy = config.policy()?;
    let exposures = survey_exposures(config, live)?;
    let windows: Vec<Period> = match &config.paths.windows {
        Some(path) => parse_windows_csv(path)?,
        None => {
            info!("No observing windows configured; allocated time left empty");
            Vec::new()
        }
    };

    let summary = summarize_observing_time(
        &exposures,
        &windows,
        &config.semesters,
        &policy,
        &config.timing(),
    );

    #[cfg(feature = "plots")]
    let artifacts = crate::plotting::render_obstime_chart(&config.paths.output_dir, &summary)?;
    #[cfg(not(feature = "plots"))]
    let artifacts = Vec::new();

    Ok(StepOutput {
        report: render_summary(&summary),
        artifacts,
    })
}

/// Coverage maps for every category and band, then the MC-only set.
pub fn coverage_maps(config: &SurveyConfig, table: &FieldStatusTable) -> Vec<CoverageMap> {
    let mut maps = build_coverage_maps(
        table,
        &CoverageRequest {
            categories: &CoverageCategory::ALL,
            bands: &config.bands,
            program: None,
            projection: PROJECTION,
        },
    );
    maps.extend(build_coverage_maps(
        table,
        &CoverageRequest {
            categories: &CoverageCategory::ALL,
            bands: &config.bands,
            program: Some(MC_PROGRAM),
            projection: PROJECTION,
        },
    ));
    maps
}

pub fn run_skymap(config: &SurveyConfig) -> Result<StepOutput> {
    let policy = config.policy()?;
    let table = current_field_status(config, &policy)?;
    let maps = coverage_maps(config, &table);

    #[cfg(feature = "plots")]
    let artifacts = maps
        .iter()
        .map(|m| crate::plotting::render_coverage_map(&config.paths.output_dir, m))
        .collect::<Result<Vec<_>>>()?
        .concat();
    #[cfg(not(feature = "plots"))]
    let artifacts = Vec::new();

    let report = maps
        .iter()
        .map(|m| format!("{}: {} fields", m.title, m.field_count()))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(StepOutput { report, artifacts })
}
