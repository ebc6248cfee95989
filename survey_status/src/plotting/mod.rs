//! Chart rendering with `plotters`.
//!
//! Every chart is written twice, as `{stem}.svg` and `{stem}.png`, by
//! running the same generic drawing routine over both backends.

pub mod obstime;
pub mod sky_map;

use anyhow::{anyhow, Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

pub use obstime::render_obstime_chart;
pub use sky_map::render_coverage_map;

pub(crate) type DrawResult = std::result::Result<(), Box<dyn Error>>;

/// Run `draw` against an SVG and a PNG backend, returning both paths.
pub(crate) fn render_both<F, G>(
    dir: &Path,
    stem: &str,
    size: (u32, u32),
    draw_svg: F,
    draw_png: G,
) -> Result<Vec<PathBuf>>
where
    F: FnOnce(DrawingArea<SVGBackend, Shift>) -> DrawResult,
    G: FnOnce(DrawingArea<BitMapBackend, Shift>) -> DrawResult,
{
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let svg = dir.join(format!("{}.svg", stem));
    draw_svg(SVGBackend::new(&svg, size).into_drawing_area())
        .map_err(|e| anyhow!("Failed to draw {}: {}", svg.display(), e))?;

    let png = dir.join(format!("{}.png", stem));
    draw_png(BitMapBackend::new(&png, size).into_drawing_area())
        .map_err(|e| anyhow!("Failed to draw {}: {}", png.display(), e))?;

    log::info!("Wrote {} and {}", svg.display(), png.display());
    Ok(vec![svg, png])
}
