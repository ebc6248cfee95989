//! Derived field-status table: which catalog fields are done, observed or
//! still to do.

use log::{debug, info};

use crate::models::time::format_timestamp;
use crate::models::{Exposure, Field, LabeledField, QualityPolicy};
use crate::services::classifier::{
    classify_field_completion, is_extra_field, latest_good_exposures, validate_exposures,
};
use crate::services::error::{StatusError, StatusResult};

/// Labelled field table whose rows are guaranteed to satisfy
/// "a dated field is done".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldStatusTable {
    rows: Vec<LabeledField>,
}

impl FieldStatusTable {
    /// Wrap labelled rows, failing with [`StatusError::Consistency`] on the
    /// first row that has a date but no done flag.
    pub fn new(rows: Vec<LabeledField>) -> StatusResult<Self> {
        check_consistency(&rows)?;
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[LabeledField] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows that count towards progress (extra fields removed).
    pub fn counted(&self) -> impl Iterator<Item = &LabeledField> {
        self.rows.iter().filter(|f| !f.extra)
    }
}

pub fn check_consistency(rows: &[LabeledField]) -> StatusResult<()> {
    for row in rows {
        if let Some(date) = &row.date {
            if !row.done.is_done() {
                return Err(StatusError::Consistency {
                    field_id: row.unique_id().to_string(),
                    date: format_timestamp(date),
                });
            }
        }
    }
    Ok(())
}

/// Label every catalog field from the exposure log.
///
/// Extra fields are labelled like any other and flagged, not dropped.
pub fn label_fields(
    fields: &[Field],
    exposures: &[Exposure],
    policy: &QualityPolicy,
) -> StatusResult<FieldStatusTable> {
    validate_exposures(exposures)?;
    let latest = latest_good_exposures(exposures, policy)?;
    debug!(
        "{} of {} exposures map to distinct good fields",
        latest.len(),
        exposures.len()
    );

    let rows: Vec<LabeledField> = fields
        .iter()
        .map(|field| {
            let date = latest.get(&field.id).copied();
            LabeledField {
                done: classify_field_completion(field, policy, date.is_some()),
                date,
                extra: is_extra_field(field, policy),
                field: field.clone(),
            }
        })
        .collect();

    let observed = rows.iter().filter(|r| r.done.is_observed()).count();
    info!(
        "Labelled {} fields: {} observed, {} extra",
        rows.len(),
        observed,
        rows.iter().filter(|r| r.extra).count()
    );

    FieldStatusTable::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exposure::test_support::exposure;
    use crate::models::{DoneFlags, QualityThresholds};
    use chrono::NaiveDate;

    fn field(hex: i64, tiling: i64, program: &str, filter: &str, priority: i64) -> Field {
        Field::from_catalog(hex, tiling, program, filter, priority, 10.0, -30.0)
    }

    fn policy() -> QualityPolicy {
        QualityPolicy::new(vec![QualityThresholds::new("wide", "g", 0.3, 1.5)
            .with_done_priority(-1)
            .with_extra_priority(4)])
        .unwrap()
    }

    #[test]
    fn test_label_fields_sets_bits() {
        let fields = vec![
            field(1, 1, "wide", "g", 1),
            field(2, 1, "wide", "g", -1),
            field(3, 1, "wide", "g", 1),
            field(4, 1, "wide", "g", 4),
        ];
        let exposures = vec![
            exposure("DELVE field: 1-01-g", "wide", "g", 0.5, 1.0),
            exposure("DELVE field: 3-01-g", "wide", "g", 0.1, 1.0),
        ];

        let table = label_fields(&fields, &exposures, &policy()).unwrap();
        let rows = table.rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].done, DoneFlags::OBSERVED);
        assert!(rows[0].date.is_some());
        assert_eq!(rows[1].done, DoneFlags::INHERENT);
        assert!(rows[1].date.is_none());
        assert_eq!(rows[2].done, DoneFlags::NONE);
        assert!(rows[3].extra);
        assert_eq!(table.counted().count(), 3);
    }

    #[test]
    fn test_label_fields_keeps_latest_good_date() {
        let fields = vec![field(7, 2, "wide", "g", 1)];
        let mut early = exposure("DELVE field: 7-02-g", "wide", "g", 0.5, 1.0);
        let mut late = early.clone();
        let mut later_bad = early.clone();
        early.date = NaiveDate::from_ymd_opt(2019, 3, 1).unwrap().and_hms_opt(1, 0, 0).unwrap();
        late.date = NaiveDate::from_ymd_opt(2019, 9, 1).unwrap().and_hms_opt(1, 0, 0).unwrap();
        later_bad.date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(1, 0, 0).unwrap();
        later_bad.qc_fwhm = 3.0;

        let table = label_fields(&fields, &[late.clone(), early, later_bad], &policy()).unwrap();
        assert_eq!(table.rows()[0].date, Some(late.date));
    }

    #[test]
    fn test_label_fields_rejects_malformed_object() {
        let fields = vec![field(1, 1, "wide", "g", 1)];
        let exposures = vec![exposure("DELVE field: ", "wide", "g", 0.5, 1.0)];
        let err = label_fields(&fields, &exposures, &policy()).unwrap_err();
        assert!(matches!(err, StatusError::MalformedObject { row: 0, .. }));
    }

    #[test]
    fn test_table_rejects_dated_field_without_done() {
        let row = LabeledField {
            field: field(9, 1, "wide", "g", 1),
            done: DoneFlags::NONE,
            date: NaiveDate::from_ymd_opt(2019, 3, 1).unwrap().and_hms_opt(0, 0, 0),
            extra: false,
        };
        let err = FieldStatusTable::new(vec![row]).unwrap_err();
        match err {
            StatusError::Consistency { field_id, .. } => assert_eq!(field_id, "9-01-g"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
