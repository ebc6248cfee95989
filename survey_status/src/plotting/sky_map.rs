//! RA/Dec coverage maps, plate carrée with RA increasing to the left.

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

use super::{render_both, DrawResult};
use crate::services::sky_map::CoverageMap;

const SIZE: (u32, u32) = (1400, 700);
const DEC_RANGE: (f64, f64) = (-90.0, 40.0);

/// Write `{file_stem}.svg` and `{file_stem}.png` into `dir`.
pub fn render_coverage_map(dir: &Path, map: &CoverageMap) -> Result<Vec<PathBuf>> {
    render_both(
        dir,
        &map.file_stem,
        SIZE,
        |area| draw_coverage(area, map),
        |area| draw_coverage(area, map),
    )
}

/// Map RA onto an axis that grows to the left, centred on RA = 0.
fn flip_ra(ra: f64) -> f64 {
    let wrapped = if ra > 180.0 { ra - 360.0 } else { ra };
    -wrapped
}

fn draw_coverage<DB>(root: DrawingArea<DB, Shift>, map: &CoverageMap) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&map.title, ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-180.0..180.0, DEC_RANGE.0..DEC_RANGE.1)?;

    chart
        .configure_mesh()
        .x_desc("RA (deg)")
        .y_desc("Dec (deg)")
        .x_label_formatter(&|x| format!("{:.0}", (-*x).rem_euclid(360.0)))
        .draw()?;

    for layer in &map.layers {
        let (r, g, b) = layer.color;
        let color = RGBColor(r, g, b);
        chart
            .draw_series(
                layer
                    .points
                    .iter()
                    .map(|&(ra, dec)| Circle::new((flip_ra(ra), dec), 2, color.filled())),
            )?
            .label(format!("tiling {} ({})", layer.tiling, layer.points.len()))
            .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sky_map::{layer_color, CoverageLayer};
    use tempfile::tempdir;

    fn map(stem: &str, points: Vec<(f64, f64)>) -> CoverageMap {
        CoverageMap {
            title: "Observed Complete (g-band)".to_string(),
            band: "g".to_string(),
            file_stem: stem.to_string(),
            layers: vec![
                CoverageLayer {
                    tiling: 1,
                    color: layer_color("g", 1),
                    points,
                },
                CoverageLayer {
                    tiling: 2,
                    color: layer_color("g", 2),
                    points: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn test_coverage_map_writes_svg_and_png() {
        let dir = tempdir().unwrap();
        let coverage = map("observed_complete_car_g", vec![(10.0, -30.0), (350.0, -60.0)]);
        let paths = render_coverage_map(dir.path(), &coverage).unwrap();

        assert_eq!(
            paths,
            vec![
                dir.path().join("observed_complete_car_g.svg"),
                dir.path().join("observed_complete_car_g.png"),
            ]
        );
        for path in &paths {
            assert!(std::fs::metadata(path).unwrap().len() > 0, "{}", path.display());
        }
    }

    #[test]
    fn test_empty_coverage_map_still_renders() {
        let dir = tempdir().unwrap();
        let paths = render_coverage_map(dir.path(), &map("todo_car_r", Vec::new())).unwrap();
        assert!(paths.iter().all(|p| p.is_file()));
    }

    #[test]
    fn test_flip_ra_wraps_and_reverses() {
        assert_eq!(flip_ra(0.0), 0.0);
        assert_eq!(flip_ra(90.0), -90.0);
        assert_eq!(flip_ra(270.0), 90.0);
    }
}
