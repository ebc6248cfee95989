use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use log::info;
use polars::prelude::*;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::models::time::{format_timestamp, parse_timestamp};
use crate::models::{
    DoneFlags, Exposure, Field, LabeledField, Period, QualityPolicy, MISSING_METRIC,
};
use crate::parsing::compression::{read_maybe_gzip, write_maybe_gzip};
use crate::services::classifier::is_extra_field;
use crate::services::field_status::FieldStatusTable;

/// Read a (possibly gzipped) CSV file into a DataFrame with lower-case column names.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let bytes = read_maybe_gzip(path)?;
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .with_context(|| format!("Failed to parse CSV {}", path.display()))?;

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_lowercase())
        .collect();
    df.set_column_names(names)
        .context("Failed to normalise column names")?;
    Ok(df)
}

/// Write a DataFrame as CSV, gzip-compressed when the path ends in `.gz`.
pub fn write_table(path: &Path, df: &mut DataFrame) -> Result<()> {
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(df)
        .context("Failed to serialise DataFrame as CSV")?;
    write_maybe_gzip(path, &buf)
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
    let present = column_names(df);
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !present.iter().any(|c| c == name))
        .collect();
    if !missing.is_empty() {
        bail!("Missing required columns: {}", missing.join(", "));
    }
    Ok(())
}

/// Cast columns that CSV type inference may have guessed wrong
/// (integers for floats, numbers for identifiers).
///
/// A cell that was present in the file but does not convert is an error
/// naming the column and row; only cells that were already empty stay null.
fn cast_columns(df: DataFrame, casts: &[(&str, DataType)]) -> Result<DataFrame> {
    let present = column_names(&df);
    let source = df.clone();
    let mut lazy_df = df.lazy();
    let mut cast_names = Vec::new();
    for (name, dtype) in casts {
        if present.iter().any(|c| c == name) {
            lazy_df = lazy_df.with_column(col(*name).cast(dtype.clone()));
            cast_names.push(*name);
        }
    }
    let cast = lazy_df
        .collect()
        .context("Failed to cast columns to expected types")?;
    for name in cast_names {
        check_lossless_cast(&source, &cast, name)?;
    }
    Ok(cast)
}

fn check_lossless_cast(source: &DataFrame, cast: &DataFrame, name: &str) -> Result<()> {
    let before = source.column(name)?;
    let after = cast.column(name)?;
    if before.null_count() == after.null_count() {
        return Ok(());
    }
    let was_null = before.is_null();
    let is_null = after.is_null();
    let lost = (&was_null)
        .into_iter()
        .zip(&is_null)
        .position(|(was, now)| was == Some(false) && now == Some(true));
    match lost {
        Some(row) => bail!("Invalid {} value {} at row {}", name, before.get(row)?, row),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Exposures
// ---------------------------------------------------------------------------

const EXPOSURE_COLUMNS: [&str; 5] = ["object", "program", "filter", "exptime", "date"];

/// Parse an exposure table (database dump or cache file).
pub fn parse_exposures_csv(path: &Path) -> Result<Vec<Exposure>> {
    let df = read_table(path)?;
    let exposures = dataframe_to_exposures(df)
        .with_context(|| format!("Invalid exposure table {}", path.display()))?;
    info!("Read {} exposures from {}", exposures.len(), path.display());
    Ok(exposures)
}

/// Convert a DataFrame to exposures. Empty quality-metric cells become the
/// -1 sentinel.
pub fn dataframe_to_exposures(df: DataFrame) -> Result<Vec<Exposure>> {
    require_columns(&df, &EXPOSURE_COLUMNS)?;
    let df = cast_columns(
        df,
        &[
            ("object", DataType::String),
            ("program", DataType::String),
            ("filter", DataType::String),
            ("date", DataType::String),
            ("exptime", DataType::Float64),
            ("qc_teff", DataType::Float64),
            ("qc_fwhm", DataType::Float64),
            ("ra", DataType::Float64),
            ("dec", DataType::Float64),
        ],
    )?;

    let objects = df.column("object")?.str()?;
    let programs = df.column("program")?.str()?;
    let filters = df.column("filter")?.str()?;
    let dates = df.column("date")?.str()?;
    let exptimes = df.column("exptime")?.f64()?;
    let teffs = df.column("qc_teff").ok().and_then(|c| c.f64().ok());
    let fwhms = df.column("qc_fwhm").ok().and_then(|c| c.f64().ok());
    let ras = df.column("ra").ok().and_then(|c| c.f64().ok());
    let decs = df.column("dec").ok().and_then(|c| c.f64().ok());

    let mut exposures = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let date_str = dates
            .get(i)
            .with_context(|| format!("Missing date at row {}", i))?;
        let date = parse_timestamp(date_str)
            .with_context(|| format!("Unparseable date '{}' at row {}", date_str, i))?;

        let exposure = Exposure {
            object: objects.get(i).unwrap_or_default().to_string(),
            program: programs
                .get(i)
                .with_context(|| format!("Missing program at row {}", i))?
                .to_string(),
            filter: filters
                .get(i)
                .with_context(|| format!("Missing filter at row {}", i))?
                .to_string(),
            exptime: exptimes
                .get(i)
                .with_context(|| format!("Missing exptime at row {}", i))?,
            date,
            qc_teff: teffs.and_then(|c| c.get(i)).unwrap_or(MISSING_METRIC),
            qc_fwhm: fwhms.and_then(|c| c.get(i)).unwrap_or(MISSING_METRIC),
            ra: ras.and_then(|c| c.get(i)),
            dec: decs.and_then(|c| c.get(i)),
        };
        if exposure.exptime < 0.0 {
            bail!("Negative exptime {} at row {}", exposure.exptime, i);
        }
        if let Some((metric, value)) = exposure.invalid_metric() {
            bail!("{} = {} at row {} is neither a measurement nor -1", metric, value, i);
        }
        exposures.push(exposure);
    }

    Ok(exposures)
}

pub fn exposures_to_dataframe(exposures: &[Exposure]) -> Result<DataFrame> {
    let df = df!(
        "object" => exposures.iter().map(|e| e.object.clone()).collect::<Vec<_>>(),
        "ra" => exposures.iter().map(|e| e.ra).collect::<Vec<_>>(),
        "dec" => exposures.iter().map(|e| e.dec).collect::<Vec<_>>(),
        "exptime" => exposures.iter().map(|e| e.exptime).collect::<Vec<_>>(),
        "filter" => exposures.iter().map(|e| e.filter.clone()).collect::<Vec<_>>(),
        "date" => exposures.iter().map(|e| format_timestamp(&e.date)).collect::<Vec<_>>(),
        "program" => exposures.iter().map(|e| e.program.clone()).collect::<Vec<_>>(),
        "qc_teff" => exposures.iter().map(|e| e.qc_teff).collect::<Vec<_>>(),
        "qc_fwhm" => exposures.iter().map(|e| e.qc_fwhm).collect::<Vec<_>>(),
    )?;
    Ok(df)
}

pub fn write_exposures_csv(path: &Path, exposures: &[Exposure]) -> Result<()> {
    let mut df = exposures_to_dataframe(exposures)?;
    write_table(path, &mut df)?;
    info!("Wrote {} exposures to {}", exposures.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Field catalog and field status
// ---------------------------------------------------------------------------

const FIELD_COLUMNS: [&str; 7] = ["hex", "tiling", "filter", "program", "priority", "ra", "dec"];

fn cast_field_columns(df: DataFrame) -> Result<DataFrame> {
    cast_columns(
        df,
        &[
            ("hex", DataType::Int64),
            ("tiling", DataType::Int64),
            ("priority", DataType::Int64),
            ("ra", DataType::Float64),
            ("dec", DataType::Float64),
            ("filter", DataType::String),
            ("program", DataType::String),
            ("done", DataType::Int64),
            ("date", DataType::String),
        ],
    )
}

/// Parse the planned-field catalog.
pub fn parse_field_catalog(path: &Path) -> Result<Vec<Field>> {
    let df = read_table(path)?;
    let fields = dataframe_to_fields(&cast_field_columns(df)?)
        .with_context(|| format!("Invalid field catalog {}", path.display()))?;
    info!("Read {} fields from {}", fields.len(), path.display());
    Ok(fields)
}

/// Convert a DataFrame whose field columns are already typed.
pub fn dataframe_to_fields(df: &DataFrame) -> Result<Vec<Field>> {
    require_columns(df, &FIELD_COLUMNS)?;
    let hexes = df.column("hex")?.i64()?;
    let tilings = df.column("tiling")?.i64()?;
    let filters = df.column("filter")?.str()?;
    let programs = df.column("program")?.str()?;
    let priorities = df.column("priority")?.i64()?;
    let ras = df.column("ra")?.f64()?;
    let decs = df.column("dec")?.f64()?;

    let mut fields = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let missing = |name: &str| format!("Missing {} at row {}", name, i);
        fields.push(Field::from_catalog(
            hexes.get(i).with_context(|| missing("hex"))?,
            tilings.get(i).with_context(|| missing("tiling"))?,
            programs.get(i).with_context(|| missing("program"))?,
            filters.get(i).with_context(|| missing("filter"))?,
            priorities.get(i).with_context(|| missing("priority"))?,
            ras.get(i).with_context(|| missing("ra"))?,
            decs.get(i).with_context(|| missing("dec"))?,
        ));
    }
    Ok(fields)
}

pub fn labeled_fields_to_dataframe(rows: &[LabeledField]) -> Result<DataFrame> {
    let df = df!(
        "hex" => rows.iter().map(|r| r.field.hex).collect::<Vec<_>>(),
        "ra" => rows.iter().map(|r| r.field.ra).collect::<Vec<_>>(),
        "dec" => rows.iter().map(|r| r.field.dec).collect::<Vec<_>>(),
        "filter" => rows.iter().map(|r| r.field.filter.clone()).collect::<Vec<_>>(),
        "tiling" => rows.iter().map(|r| r.field.tiling).collect::<Vec<_>>(),
        "priority" => rows.iter().map(|r| r.field.priority).collect::<Vec<_>>(),
        "program" => rows.iter().map(|r| r.field.program.clone()).collect::<Vec<_>>(),
        "done" => rows.iter().map(|r| r.done.bits() as i64).collect::<Vec<_>>(),
        "date" => rows.iter().map(|r| r.date.as_ref().map(format_timestamp)).collect::<Vec<_>>(),
    )?;
    Ok(df)
}

/// Write the derived field-status table, replacing any existing file.
pub fn write_field_status(path: &Path, table: &FieldStatusTable) -> Result<()> {
    let mut df = labeled_fields_to_dataframe(table.rows())?;
    write_table(path, &mut df)?;
    info!("Wrote {} fields to {}", table.len(), path.display());
    Ok(())
}

/// Read a field-status file back. Extra flags are recomputed from `policy`
/// and the consistency invariant is re-checked.
pub fn parse_field_status(path: &Path, policy: &QualityPolicy) -> Result<FieldStatusTable> {
    let df = cast_field_columns(read_table(path)?)?;
    require_columns(&df, &["done"])?;
    let fields = dataframe_to_fields(&df)
        .with_context(|| format!("Invalid field status file {}", path.display()))?;
    let done = df.column("done")?.i64()?;
    let dates = df.column("date").ok().and_then(|c| c.str().ok());

    let mut rows = Vec::with_capacity(fields.len());
    for (i, field) in fields.into_iter().enumerate() {
        let date = match dates.and_then(|c| c.get(i)).filter(|s| !s.trim().is_empty()) {
            Some(s) => Some(
                parse_timestamp(s)
                    .with_context(|| format!("Unparseable date '{}' at row {}", s, i))?,
            ),
            None => None,
        };
        let bits = done
            .get(i)
            .with_context(|| format!("Missing done at row {}", i))?;
        rows.push(LabeledField {
            done: DoneFlags::from_bits(bits),
            date,
            extra: is_extra_field(&field, policy),
            field,
        });
    }

    let table = FieldStatusTable::new(rows)?;
    info!("Read {} fields from {}", table.len(), path.display());
    Ok(table)
}

/// `{dir}/{prefix}-{YYYYMMDD}.csv.gz`
pub fn field_status_path(dir: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}-{}.csv.gz", prefix, date.format("%Y%m%d")))
}

/// Most recently generated field-status file in `dir`, if any.
pub fn latest_field_status(dir: &Path, prefix: &str) -> Result<Option<PathBuf>> {
    if !dir.exists() {
        return Ok(None);
    }
    let head = format!("{}-", prefix);
    let mut candidates: Vec<(String, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let stamp = name
            .strip_prefix(&head)
            .and_then(|rest| rest.strip_suffix(".csv.gz"));
        if let Some(stamp) = stamp {
            if NaiveDate::parse_from_str(stamp, "%Y%m%d").is_ok() {
                candidates.push((stamp.to_string(), entry.path()));
            }
        }
    }
    Ok(candidates.into_iter().max_by(|a, b| a.0.cmp(&b.0)).map(|(_, p)| p))
}

// ---------------------------------------------------------------------------
// Night windows
// ---------------------------------------------------------------------------

/// Parse allocated observing windows (`utc_start`, `utc_end`).
pub fn parse_windows_csv(path: &Path) -> Result<Vec<Period>> {
    let df = cast_columns(
        read_table(path)?,
        &[("utc_start", DataType::String), ("utc_end", DataType::String)],
    )?;
    require_columns(&df, &["utc_start", "utc_end"])
        .with_context(|| format!("Invalid window file {}", path.display()))?;
    let starts = df.column("utc_start")?.str()?;
    let ends = df.column("utc_end")?.str()?;

    let mut windows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let parse = |value: Option<&str>, name: &str| {
            value
                .and_then(parse_timestamp)
                .with_context(|| format!("Invalid {} at row {}", name, i))
        };
        let start = parse(starts.get(i), "utc_start")?;
        let stop = parse(ends.get(i), "utc_end")?;
        let window = Period::new(start, stop)
            .with_context(|| format!("Window at row {} ends before it starts", i))?;
        windows.push(window);
    }
    info!("Read {} observing windows from {}", windows.len(), path.display());
    Ok(windows)
}
