//! Exposure and field classification.
//!
//! Each function is a pure map over rows: the result for one row depends
//! only on that row and the policy, never on its neighbours.

use chrono::NaiveDateTime;
use std::collections::HashMap;

use crate::models::{DoneFlags, Exposure, Field, FieldId, QualityPolicy};
use crate::services::error::{StatusError, StatusResult};

/// Whether a single exposure passes the data-quality thresholds for its
/// (program, filter). Exposures with no policy row are always accepted.
pub fn is_good_exposure(exposure: &Exposure, policy: &QualityPolicy) -> bool {
    match policy.lookup(&exposure.program, &exposure.filter) {
        Some(limits) => limits.accepts(exposure.qc_teff, exposure.qc_fwhm),
        None => true,
    }
}

/// Batch form of [`is_good_exposure`]; one flag per input row, same order.
pub fn select_good_exposures(exposures: &[Exposure], policy: &QualityPolicy) -> Vec<bool> {
    exposures
        .iter()
        .map(|e| is_good_exposure(e, policy))
        .collect()
}

/// Completion bits for a field given whether any good exposure matched it.
///
/// The inherent-done check and the observed check are independent and
/// combine with bitwise OR.
pub fn classify_field_completion(field: &Field, policy: &QualityPolicy, observed: bool) -> DoneFlags {
    let inherent = match policy.lookup(&field.program, &field.filter) {
        Some(limits) if limits.is_done_priority(field.priority) => DoneFlags::INHERENT,
        _ => DoneFlags::NONE,
    };
    let seen = if observed {
        DoneFlags::OBSERVED
    } else {
        DoneFlags::NONE
    };
    inherent | seen
}

/// Whether a field is a placeholder outside the counted program.
pub fn is_extra_field(field: &Field, policy: &QualityPolicy) -> bool {
    policy
        .lookup(&field.program, &field.filter)
        .is_some_and(|limits| limits.is_extra_priority(field.priority))
}

/// Field id for every exposure, failing on the first row whose object
/// name carries no identifier.
pub fn exposure_field_ids(exposures: &[Exposure]) -> StatusResult<Vec<FieldId>> {
    exposures
        .iter()
        .enumerate()
        .map(|(row, e)| {
            e.field_id().ok_or_else(|| StatusError::MalformedObject {
                row,
                object: e.object.clone(),
            })
        })
        .collect()
}

/// Reject rows whose quality metrics are negative but not the -1 sentinel.
pub fn validate_exposures(exposures: &[Exposure]) -> StatusResult<()> {
    for (row, e) in exposures.iter().enumerate() {
        if let Some((metric, value)) = e.invalid_metric() {
            return Err(StatusError::InvalidMetric { row, metric, value });
        }
    }
    Ok(())
}

/// Most recent good-exposure date per field id.
pub fn latest_good_exposures(
    exposures: &[Exposure],
    policy: &QualityPolicy,
) -> StatusResult<HashMap<FieldId, NaiveDateTime>> {
    let ids = exposure_field_ids(exposures)?;
    let good = select_good_exposures(exposures, policy);

    let mut latest: HashMap<FieldId, NaiveDateTime> = HashMap::new();
    for ((id, exposure), ok) in ids.into_iter().zip(exposures).zip(good) {
        if !ok {
            continue;
        }
        latest
            .entry(id)
            .and_modify(|d| {
                if exposure.date > *d {
                    *d = exposure.date;
                }
            })
            .or_insert(exposure.date);
    }
    Ok(latest)
}
