//! Timestamps and observing periods.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Format used when writing timestamps back to CSV.
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.3f";

const ACCEPTED_FORMATS: &[&str] = &[
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a UTC timestamp in any of the layouts the exposure database and
/// the window files use. Timezone offsets are normalised to UTC.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in ACCEPTED_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

pub fn format_timestamp(dt: &NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Time span used for observing nights, with `stop >= start`.
///
/// Membership is open at both ends: neither `start` nor `stop` lies inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
}

impl Period {
    /// Returns `None` if `stop` precedes `start`.
    pub fn new(start: NaiveDateTime, stop: NaiveDateTime) -> Option<Self> {
        (stop >= start).then_some(Self { start, stop })
    }

    pub fn duration_hours(&self) -> f64 {
        (self.stop - self.start).num_milliseconds() as f64 / 3_600_000.0
    }

    /// Strict containment on both ends, matching the night-window bookkeeping.
    pub fn strictly_contains(&self, t: &NaiveDateTime) -> bool {
        self.start < *t && *t < self.stop
    }
}

/// Named block of calendar time (e.g. a proposal semester).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Semester {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Semester {
    pub fn new(name: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            name: name.to_string(),
            start,
            end,
        }
    }

    pub fn period(&self) -> Period {
        Period {
            start: self.start.and_time(NaiveTime::MIN),
            stop: self.end.and_time(NaiveTime::MIN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_parse_database_format() {
        let dt = parse_timestamp("2019/03/01 03:04:05.250").unwrap();
        assert_eq!(dt, ymd_hms(2019, 3, 1, 3, 4, 5) + chrono::Duration::milliseconds(250));
    }

    #[test]
    fn test_parse_iso_and_date_only() {
        assert_eq!(
            parse_timestamp("2019-03-01T03:04:05").unwrap(),
            ymd_hms(2019, 3, 1, 3, 4, 5)
        );
        assert_eq!(
            parse_timestamp("2019-03-01").unwrap(),
            ymd_hms(2019, 3, 1, 0, 0, 0)
        );
        assert_eq!(
            parse_timestamp("2019-03-01T03:04:05+00:00").unwrap(),
            ymd_hms(2019, 3, 1, 3, 4, 5)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_format_roundtrip() {
        let dt = ymd_hms(2020, 1, 2, 23, 59, 1);
        assert_eq!(format_timestamp(&dt), "2020/01/02 23:59:01.000");
        assert_eq!(parse_timestamp(&format_timestamp(&dt)), Some(dt));
    }

    #[test]
    fn test_period() {
        let p = Period::new(ymd_hms(2019, 3, 1, 0, 0, 0), ymd_hms(2019, 3, 1, 6, 30, 0)).unwrap();
        assert!((p.duration_hours() - 6.5).abs() < 1e-12);
        assert!(!p.strictly_contains(&p.start));
        assert!(p.strictly_contains(&ymd_hms(2019, 3, 1, 1, 0, 0)));
        assert!(Period::new(p.stop, p.start).is_none());
    }

    #[test]
    fn test_period_excludes_both_endpoints() {
        let p = Period::new(ymd_hms(2019, 3, 1, 0, 0, 0), ymd_hms(2019, 3, 1, 6, 0, 0)).unwrap();
        assert!(!p.strictly_contains(&p.stop));
        assert!(!p.strictly_contains(&ymd_hms(2019, 3, 1, 6, 0, 1)));

        let instant = Period::new(p.start, p.start).unwrap();
        assert_eq!(instant.duration_hours(), 0.0);
        assert!(!instant.strictly_contains(&p.start));
    }
}
