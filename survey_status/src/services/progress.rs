//! Per (program, band) progress accounting.

use log::warn;
use serde::Serialize;
use std::collections::HashSet;

use crate::models::{Exposure, LabeledField, QualityPolicy};
use crate::services::field_status::FieldStatusTable;
use crate::services::classifier::{exposure_field_ids, is_good_exposure, validate_exposures};
use crate::services::error::StatusResult;

/// One line of the progress table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressRow {
    pub program: String,
    pub band: String,
    /// Counted (non-extra) fields.
    pub nfield: usize,
    /// Done through either the inherent or the observed path.
    pub ndone: usize,
    /// Done only through the inherent sentinel.
    pub nother: usize,
    pub nobserved: usize,
    pub ntodo: usize,
    pub nexp: usize,
    pub nbad: usize,
    pub ngood: usize,
    /// Requested exposure time, summed over all exposures.
    pub hours: qtty::Hours,
    /// Percentage of remaining work that has been observed.
    pub completion_fraction: f64,
}

/// `nobserved / (nobserved + ntodo) * 100`, defined as 100 when nothing is
/// left to do.
pub fn completion_fraction(nobserved: usize, ntodo: usize) -> f64 {
    let denominator = nobserved + ntodo;
    if denominator == 0 {
        100.0
    } else {
        nobserved as f64 / denominator as f64 * 100.0
    }
}

/// Aggregate exposures and labelled fields for every pair in the policy.
///
/// Rows follow the policy's declaration order. Extra fields are skipped.
pub fn aggregate_progress(
    exposures: &[Exposure],
    fields: &FieldStatusTable,
    policy: &QualityPolicy,
) -> StatusResult<Vec<ProgressRow>> {
    validate_exposures(exposures)?;
    exposure_field_ids(exposures)?;
    warn_unmatched_pairs(exposures, policy);

    let rows = policy
        .rows()
        .iter()
        .map(|limits| {
            let (program, band) = (limits.program.as_str(), limits.filter.as_str());

            let pair_fields: Vec<&LabeledField> = fields
                .counted()
                .filter(|f| f.field.program == program && f.field.filter == band)
                .collect();
            let ndone = pair_fields.iter().filter(|f| f.done.is_done()).count();
            let nobserved = pair_fields.iter().filter(|f| f.done.is_observed()).count();
            let ntodo = pair_fields.iter().filter(|f| f.is_todo()).count();

            let pair_exposures: Vec<&Exposure> = exposures
                .iter()
                .filter(|e| e.program == program && e.filter == band)
                .collect();
            let ngood = pair_exposures
                .iter()
                .filter(|e| is_good_exposure(e, policy))
                .count();
            // an empty pair reports +0.0 hours
            let hours = pair_exposures
                .iter()
                .map(|e| e.exptime_hours().value())
                .fold(0.0, |acc, h| acc + h);

            ProgressRow {
                program: program.to_string(),
                band: band.to_string(),
                nfield: pair_fields.len(),
                ndone,
                nother: ndone - nobserved,
                nobserved,
                ntodo,
                nexp: pair_exposures.len(),
                nbad: pair_exposures.len() - ngood,
                ngood,
                hours: qtty::Hours::new(hours),
                completion_fraction: completion_fraction(nobserved, ntodo),
            }
        })
        .collect();

    Ok(rows)
}

fn warn_unmatched_pairs(exposures: &[Exposure], policy: &QualityPolicy) {
    let unmatched: HashSet<(&str, &str)> = exposures
        .iter()
        .filter(|e| policy.lookup(&e.program, &e.filter).is_none())
        .map(|e| (e.program.as_str(), e.filter.as_str()))
        .collect();
    for (program, filter) in unmatched {
        warn!("No quality policy for ({program}, {filter}); exposures left out of the table");
    }
}
