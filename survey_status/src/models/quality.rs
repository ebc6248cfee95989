//! Data-quality thresholds per (program, filter).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::services::error::{StatusError, StatusResult};

/// Thresholds and priority sentinels for one (program, filter) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub program: String,
    pub filter: String,
    /// Minimum effective-exposure-time fraction. Negative values never reject.
    pub teff_min: f64,
    /// Maximum acceptable seeing FWHM.
    pub fwhm_max: f64,
    /// Field priority meaning "already satisfied".
    #[serde(default)]
    pub done_priority: Option<i64>,
    /// Field priority meaning "outside the counted program".
    #[serde(default)]
    pub extra_priority: Option<i64>,
}

impl QualityThresholds {
    pub fn new(program: &str, filter: &str, teff_min: f64, fwhm_max: f64) -> Self {
        Self {
            program: program.to_string(),
            filter: filter.to_string(),
            teff_min,
            fwhm_max,
            done_priority: None,
            extra_priority: None,
        }
    }

    pub fn with_done_priority(mut self, priority: i64) -> Self {
        self.done_priority = Some(priority);
        self
    }

    pub fn with_extra_priority(mut self, priority: i64) -> Self {
        self.extra_priority = Some(priority);
        self
    }

    /// Pass/fail for a pair of quality metrics.
    ///
    /// A missing teff (`< 0`) is never rejected. The fwhm comparison is
    /// literal, so the `-1` sentinel only passes because `fwhm_max` is positive.
    pub fn accepts(&self, qc_teff: f64, qc_fwhm: f64) -> bool {
        let low_teff = qc_teff >= 0.0 && qc_teff < self.teff_min;
        let poor_seeing = qc_fwhm > self.fwhm_max;
        !(low_teff || poor_seeing)
    }

    pub fn is_done_priority(&self, priority: i64) -> bool {
        self.done_priority == Some(priority)
    }

    pub fn is_extra_priority(&self, priority: i64) -> bool {
        self.extra_priority == Some(priority)
    }
}

/// Immutable lookup table of [`QualityThresholds`].
///
/// Iteration follows declaration order, which is also the row order of the
/// progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityPolicy {
    rows: Vec<QualityThresholds>,
    index: PolicyIndex,
}

/// program -> filter -> position in the row list.
type PolicyIndex = HashMap<String, HashMap<String, usize>>;

/// Index rows by (program, filter), returning the first repeated pair if any.
fn build_index(rows: &[QualityThresholds]) -> (PolicyIndex, Option<&QualityThresholds>) {
    let mut index = PolicyIndex::new();
    let mut duplicate = None;
    for (i, row) in rows.iter().enumerate() {
        let by_filter = index.entry(row.program.clone()).or_default();
        if by_filter.contains_key(&row.filter) {
            duplicate.get_or_insert(row);
            continue;
        }
        by_filter.insert(row.filter.clone(), i);
    }
    (index, duplicate)
}

impl QualityPolicy {
    /// Build a policy, rejecting duplicate (program, filter) pairs.
    pub fn new(rows: Vec<QualityThresholds>) -> StatusResult<Self> {
        let (index, duplicate) = build_index(&rows);
        if let Some(row) = duplicate {
            return Err(StatusError::DuplicatePolicy {
                program: row.program.clone(),
                filter: row.filter.clone(),
            });
        }
        Ok(Self { rows, index })
    }

    /// The DELVE thresholds used when no configuration overrides them.
    pub fn delve() -> Self {
        let wide = |f| {
            QualityThresholds::new("delve-wide", f, 0.3, 1.5)
                .with_done_priority(-1)
                .with_extra_priority(4)
        };
        let mc = |f| {
            QualityThresholds::new("delve-mc", f, 0.2, 2.0)
                .with_done_priority(-1)
                .with_extra_priority(4)
        };
        let deep = |f| QualityThresholds::new("delve-deep", f, 0.0, 1.2);

        let rows = vec![
            wide("g"),
            wide("i"),
            mc("g"),
            mc("r"),
            mc("i"),
            deep("g"),
            deep("r"),
            deep("i"),
        ];
        let (index, duplicate) = build_index(&rows);
        debug_assert!(duplicate.is_none());
        Self { rows, index }
    }

    /// Left-join lookup; `None` means "no constraint".
    pub fn lookup(&self, program: &str, filter: &str) -> Option<&QualityThresholds> {
        let i = *self.index.get(program)?.get(filter)?;
        self.rows.get(i)
    }

    pub fn rows(&self) -> &[QualityThresholds] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self::delve()
    }
}
