//! The fixed historical exposure query.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::Exposure;

/// Selection parameters for survey exposures. Besides these, the query
/// always requires `discard = False`, `delivered = True` and
/// `flavor = 'object'`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureQuery {
    pub propid: String,
    /// Exposures must be strictly longer than this (seconds).
    pub min_exptime: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub object_prefix: String,
}

impl Default for ExposureQuery {
    fn default() -> Self {
        Self {
            propid: "2019A-0305".to_string(),
            min_exptime: 89.0,
            start: NaiveDate::from_ymd_opt(2019, 2, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2020, 4, 1).unwrap_or_default(),
            object_prefix: "DELVE field: ".to_string(),
        }
    }
}

impl ExposureQuery {
    /// Parameterised SQL. Binds, in order: propid, min_exptime, object
    /// pattern, start, end.
    pub fn sql(&self) -> &'static str {
        "SELECT object, telra::float8 AS ra, teldec::float8 AS dec, \
         exptime::float8 AS exptime, filter, \
         to_char(date, 'YYYY/MM/DD HH24:MI:SS.MS') AS date, program, \
         COALESCE(qc_teff, -1)::float8 AS qc_teff, \
         COALESCE(qc_fwhm, -1)::float8 AS qc_fwhm \
         FROM exposure \
         WHERE propid = $1 AND exptime > $2 \
         AND discard = False AND delivered = True AND flavor = 'object' \
         AND object LIKE $3 \
         AND date BETWEEN $4 AND $5 \
         ORDER BY date"
    }

    /// LIKE pattern for the object column.
    pub fn object_pattern(&self) -> String {
        format!("{}%", self.object_prefix.replace('%', "\\%"))
    }

    /// In-memory equivalent of the SQL selection for the columns an
    /// [`Exposure`] carries (proposal id is not among them).
    pub fn matches(&self, exposure: &Exposure) -> bool {
        let start = self.start.and_time(NaiveTime::MIN);
        let end = self.end.and_time(NaiveTime::MIN);
        exposure.exptime > self.min_exptime
            && exposure.object.starts_with(&self.object_prefix)
            && exposure.date >= start
            && exposure.date <= end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exposure::test_support::exposure;

    #[test]
    fn test_default_selection() {
        let query = ExposureQuery::default();
        assert_eq!(query.propid, "2019A-0305");
        assert_eq!(query.object_pattern(), "DELVE field: %");
        assert!(query.sql().contains("ORDER BY date"));
    }

    #[test]
    fn test_matches_applies_exptime_and_prefix() {
        let query = ExposureQuery::default();
        let mut e = exposure("DELVE field: 1-01-g", "delve-wide", "g", 0.5, 1.0);
        assert!(query.matches(&e));

        e.exptime = 89.0;
        assert!(!query.matches(&e));

        let other = exposure("standard star", "delve-wide", "g", 0.5, 1.0);
        assert!(!query.matches(&other));
    }

    #[test]
    fn test_matches_applies_date_range() {
        let query = ExposureQuery::default();
        let mut e = exposure("DELVE field: 1-01-g", "delve-wide", "g", 0.5, 1.0);
        e.date = NaiveDate::from_ymd_opt(2018, 12, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(!query.matches(&e));
    }
}
