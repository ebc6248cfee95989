//! Cumulative observing-time chart.

use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

use super::{render_both, DrawResult};
use crate::services::obstime::{ObservingTimeSummary, TimePoint};

const SIZE: (u32, u32) = (1200, 700);

/// Write `obstime.svg` and `obstime.png` into `dir`.
pub fn render_obstime_chart(dir: &Path, summary: &ObservingTimeSummary) -> Result<Vec<PathBuf>> {
    render_both(
        dir,
        "obstime",
        SIZE,
        |area| draw_obstime(area, summary),
        |area| draw_obstime(area, summary),
    )
}

fn curve_origin(summary: &ObservingTimeSummary) -> Option<NaiveDateTime> {
    summary.range.map(|r| r.start).or_else(|| {
        [&summary.allocated, &summary.observed]
            .iter()
            .filter_map(|c| c.first().map(|p| p.date))
            .min()
    })
}

fn to_days(points: &[TimePoint], origin: NaiveDateTime) -> Vec<(f64, f64)> {
    points
        .iter()
        .map(|p| {
            let days = (p.date - origin).num_seconds() as f64 / 86_400.0;
            (days, p.hours)
        })
        .collect()
}

fn draw_obstime<DB>(root: DrawingArea<DB, Shift>, summary: &ObservingTimeSummary) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let Some(origin) = curve_origin(summary) else {
        root.present()?;
        return Ok(());
    };

    let series = [
        ("Allocated", to_days(&summary.allocated, origin), BLACK),
        ("Observed", to_days(&summary.observed, origin), BLUE),
        ("Good", to_days(&summary.good, origin), GREEN),
        ("Effective", to_days(&summary.effective, origin), RED),
    ];

    let x_max = summary
        .range
        .map(|r| (r.stop - r.start).num_seconds() as f64 / 86_400.0)
        .or_else(|| {
            series
                .iter()
                .filter_map(|(_, pts, _)| pts.last().map(|p| p.0))
                .reduce(f64::max)
        })
        .unwrap_or(1.0)
        .max(1.0);
    let y_max = series
        .iter()
        .filter_map(|(_, pts, _)| pts.last().map(|p| p.1))
        .fold(1.0, f64::max)
        * 1.05;

    let mut chart = ChartBuilder::on(&root)
        .caption("Cumulative Observing Time", ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Time (hours)")
        .x_label_formatter(&|d| {
            (origin + Duration::seconds((*d * 86_400.0) as i64))
                .format("%Y-%m-%d")
                .to_string()
        })
        .draw()?;

    for (label, points, color) in series {
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
