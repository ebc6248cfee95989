//! Observing-time accounting: allocated versus used versus quality-passing
//! time over the survey date range.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{Exposure, Period, QualityPolicy, Semester};
use crate::services::classifier::select_good_exposures;

/// Knobs for time accounting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Readout and slew overhead charged to every exposure, seconds.
    pub overhead_seconds: f64,
    /// Nights below this used/allocated fraction are reported as lost.
    pub low_efficiency_fraction: f64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            overhead_seconds: 30.0,
            low_efficiency_fraction: 0.05,
        }
    }
}

/// Cumulative hours at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimePoint {
    pub date: NaiveDateTime,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NightUsage {
    pub window: Period,
    pub allocated_hours: f64,
    pub used_hours: f64,
}

impl NightUsage {
    pub fn fraction(&self) -> f64 {
        if self.allocated_hours > 0.0 {
            self.used_hours / self.allocated_hours
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemesterHours {
    pub name: String,
    /// Shutter-open time.
    pub hours: qtty::Hours,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservingTimeSummary {
    pub range: Option<Period>,
    /// Step curve of allocated night time.
    pub allocated: Vec<TimePoint>,
    /// Exposure time plus overhead, all exposures.
    pub observed: Vec<TimePoint>,
    /// Same as `observed` with bad exposures contributing nothing.
    pub good: Vec<TimePoint>,
    /// `qc_teff * exptime` for exposures with a positive teff.
    pub effective: Vec<TimePoint>,
    pub semesters: Vec<SemesterHours>,
    pub nights: Vec<NightUsage>,
    pub low_efficiency_nights: Vec<NightUsage>,
}

/// Span covered by the semesters, first start to last end.
pub fn survey_range(semesters: &[Semester]) -> Option<Period> {
    let first = semesters.first()?.period();
    let last = semesters.last()?.period();
    Period::new(first.start, last.stop)
}

/// Build the cumulative curves and per-night usage.
///
/// Exposures and windows outside the semester range are ignored. Without
/// semesters every exposure and window is used.
pub fn summarize_observing_time(
    exposures: &[Exposure],
    windows: &[Period],
    semesters: &[Semester],
    policy: &QualityPolicy,
    settings: &TimingSettings,
) -> ObservingTimeSummary {
    let range = survey_range(semesters);

    let mut in_range: Vec<Exposure> = exposures
        .iter()
        .filter(|e| range.map_or(true, |r| r.strictly_contains(&e.date)))
        .cloned()
        .collect();
    in_range.sort_by_key(|e| e.date);

    let windows: Vec<Period> = windows
        .iter()
        .filter(|w| range.map_or(true, |r| w.start > r.start && w.stop < r.stop))
        .copied()
        .collect();

    let good = select_good_exposures(&in_range, policy);

    let obs_hours = |e: &Exposure| (e.exptime + settings.overhead_seconds) / 3600.0;

    let observed = cumulative(&in_range, |e, _| obs_hours(e), &good);
    let good_curve = cumulative(&in_range, |e, ok| if ok { obs_hours(e) } else { 0.0 }, &good);
    let effective = cumulative(
        &in_range,
        |e, _| {
            if e.qc_teff > 0.0 {
                e.qc_teff * e.exptime / 3600.0
            } else {
                0.0
            }
        },
        &good,
    );

    let nights: Vec<NightUsage> = windows
        .iter()
        .map(|w| NightUsage {
            window: *w,
            allocated_hours: w.duration_hours(),
            used_hours: in_range
                .iter()
                .filter(|e| w.strictly_contains(&e.date))
                .map(obs_hours)
                .fold(0.0, |acc, h| acc + h),
        })
        .collect();
    let low_efficiency_nights = nights
        .iter()
        .filter(|n| n.fraction() < settings.low_efficiency_fraction)
        .cloned()
        .collect();

    let semesters = semesters
        .iter()
        .map(|s| {
            let p = s.period();
            let seconds = in_range
                .iter()
                .filter(|e| p.strictly_contains(&e.date))
                .map(|e| e.exptime)
                .fold(0.0, |acc, s| acc + s);
            SemesterHours {
                name: s.name.clone(),
                hours: qtty::Hours::new(seconds / 3600.0),
            }
        })
        .collect();

    ObservingTimeSummary {
        range,
        allocated: allocated_curve(&windows),
        observed,
        good: good_curve,
        effective,
        semesters,
        nights,
        low_efficiency_nights,
    }
}

/// Two points per window: flat before it, risen by its length after it.
pub fn allocated_curve(windows: &[Period]) -> Vec<TimePoint> {
    let mut total = 0.0;
    let mut points = Vec::with_capacity(windows.len() * 2);
    for w in windows {
        points.push(TimePoint {
            date: w.start,
            hours: total,
        });
        total += w.duration_hours();
        points.push(TimePoint {
            date: w.stop,
            hours: total,
        });
    }
    points
}

fn cumulative<F>(exposures: &[Exposure], hours: F, good: &[bool]) -> Vec<TimePoint>
where
    F: Fn(&Exposure, bool) -> f64,
{
    let mut total = 0.0;
    exposures
        .iter()
        .zip(good)
        .map(|(e, ok)| {
            total += hours(e, *ok);
            TimePoint {
                date: e.date,
                hours: total,
            }
        })
        .collect()
}

/// Human-readable per-semester hours and low-efficiency nights.
pub fn render_summary(summary: &ObservingTimeSummary) -> String {
    let mut lines: Vec<String> = summary
        .semesters
        .iter()
        .map(|s| format!("{}: {:.1}", s.name, s.hours.value()))
        .collect();
    if !summary.low_efficiency_nights.is_empty() {
        lines.push("Nights with little or no observing:".to_string());
        for n in &summary.low_efficiency_nights {
            lines.push(format!(
                "  {} -> {} ({:.1}/{:.1} h)",
                n.window.start.format("%Y/%m/%d %H:%M"),
                n.window.stop.format("%Y/%m/%d %H:%M"),
                n.used_hours,
                n.allocated_hours
            ));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exposure::test_support::exposure;
    use crate::models::QualityThresholds;
    use chrono::NaiveDate;

    fn at(m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn exposure_at(date: NaiveDateTime, teff: f64) -> Exposure {
        let mut e = exposure("DELVE field: 1-01-g", "wide", "g", teff, 1.0);
        e.date = date;
        e
    }

    fn policy() -> QualityPolicy {
        QualityPolicy::new(vec![QualityThresholds::new("wide", "g", 0.3, 1.5)]).unwrap()
    }

    fn semesters() -> Vec<Semester> {
        vec![
            Semester::new(
                "A",
                NaiveDate::from_ymd_opt(2019, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2019, 4, 1).unwrap(),
            ),
            Semester::new(
                "B",
                NaiveDate::from_ymd_opt(2019, 4, 1).unwrap(),
                NaiveDate::from_ymd_opt(2019, 6, 1).unwrap(),
            ),
        ]
    }

    #[test]
    fn test_allocated_curve_steps() {
        let windows = vec![
            Period::new(at(3, 1, 0), at(3, 1, 6)).unwrap(),
            Period::new(at(3, 2, 0), at(3, 2, 4)).unwrap(),
        ];
        let curve = allocated_curve(&windows);
        let hours: Vec<f64> = curve.iter().map(|p| p.hours).collect();
        assert_eq!(hours, vec![0.0, 6.0, 6.0, 10.0]);
    }

    #[test]
    fn test_cumulative_curves() {
        let exposures = vec![
            exposure_at(at(3, 1, 2), 0.5),
            exposure_at(at(3, 1, 1), 0.1),
            exposure_at(at(7, 1, 1), 0.5),
        ];
        let summary = summarize_observing_time(
            &exposures,
            &[],
            &semesters(),
            &policy(),
            &TimingSettings::default(),
        );

        // The July exposure is outside the range; the rest are date ordered
        assert_eq!(summary.observed.len(), 2);
        assert_eq!(summary.observed[0].date, at(3, 1, 1));
        let per_exposure = (90.0 + 30.0) / 3600.0;
        assert!((summary.observed[1].hours - 2.0 * per_exposure).abs() < 1e-12);
        assert!((summary.good[1].hours - per_exposure).abs() < 1e-12);
        let effective = (0.1 * 90.0 + 0.5 * 90.0) / 3600.0;
        assert!((summary.effective[1].hours - effective).abs() < 1e-12);
    }

    #[test]
    fn test_semester_hours_and_low_efficiency() {
        let exposures = vec![exposure_at(at(3, 1, 2), 0.5), exposure_at(at(4, 10, 2), 0.5)];
        let windows = vec![
            Period::new(at(3, 1, 0), at(3, 1, 8)).unwrap(),
            Period::new(at(3, 5, 0), at(3, 5, 8)).unwrap(),
        ];
        let summary = summarize_observing_time(
            &exposures,
            &windows,
            &semesters(),
            &policy(),
            &TimingSettings::default(),
        );

        assert_eq!(summary.semesters.len(), 2);
        assert!((summary.semesters[0].hours.value() - 0.025).abs() < 1e-12);
        assert!((summary.semesters[1].hours.value() - 0.025).abs() < 1e-12);

        assert_eq!(summary.nights.len(), 2);
        assert_eq!(summary.low_efficiency_nights.len(), 2);
        assert_eq!(summary.low_efficiency_nights[1].used_hours, 0.0);
        assert!(render_summary(&summary).contains("A: 0.0"));
    }

    #[test]
    fn test_no_semesters_uses_everything() {
        let exposures = vec![exposure_at(at(7, 1, 1), 0.5)];
        let summary = summarize_observing_time(
            &exposures,
            &[],
            &[],
            &policy(),
            &TimingSettings::default(),
        );
        assert!(summary.range.is_none());
        assert_eq!(summary.observed.len(), 1);
    }

    #[test]
    fn test_empty_semester_reports_positive_zero() {
        let exposures = vec![exposure_at(at(3, 1, 2), 0.5)];
        let windows = vec![Period::new(at(3, 3, 0), at(3, 3, 8)).unwrap()];
        let summary = summarize_observing_time(
            &exposures,
            &windows,
            &semesters(),
            &policy(),
            &TimingSettings::default(),
        );

        let idle = &summary.semesters[1];
        assert!(idle.hours.value().is_sign_positive());
        assert!(summary.nights[0].used_hours.is_sign_positive());

        let text = render_summary(&summary);
        assert!(text.contains("B: 0.0"), "{}", text);
        assert!(!text.contains("-0.0"), "{}", text);
    }
}
