//! Sky-coverage partitions of the labelled field table.
//!
//! Fields are split by coverage category, band and tiling; each partition
//! becomes one coloured layer of a coverage map.

use serde::Serialize;

use crate::models::LabeledField;
use crate::services::field_status::FieldStatusTable;

/// Number of tilings planned per band.
pub const TILINGS: [i64; 3] = [1, 2, 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoverageCategory {
    /// Fields with at least one good survey exposure.
    ObservedComplete,
    /// Fields done through either path.
    AllComplete,
    /// Fields with nothing yet.
    ToDo,
}

impl CoverageCategory {
    pub const ALL: [CoverageCategory; 3] = [
        CoverageCategory::ObservedComplete,
        CoverageCategory::AllComplete,
        CoverageCategory::ToDo,
    ];

    pub fn title(self) -> &'static str {
        match self {
            CoverageCategory::ObservedComplete => "Observed Complete",
            CoverageCategory::AllComplete => "All Complete",
            CoverageCategory::ToDo => "ToDo",
        }
    }

    pub fn includes(self, field: &LabeledField) -> bool {
        match self {
            CoverageCategory::ObservedComplete => field.done.is_observed(),
            CoverageCategory::AllComplete => field.done.is_done(),
            CoverageCategory::ToDo => field.is_todo(),
        }
    }

    /// Completed maps draw tiling 1 first; to-do maps draw it last so the
    /// first pass stays visible on top.
    pub fn tiling_order(self) -> Vec<i64> {
        match self {
            CoverageCategory::ToDo => TILINGS.iter().rev().copied().collect(),
            _ => TILINGS.to_vec(),
        }
    }
}

/// RGB colour for a band/tiling layer; unknown combinations are grey.
pub fn layer_color(band: &str, tiling: i64) -> (u8, u8, u8) {
    match (band, tiling) {
        ("g", 1) => (144, 238, 144), // lightgreen
        ("g", 2) => (50, 205, 50),   // limegreen
        ("g", 3) => (0, 100, 0),     // darkgreen
        ("r", 1) => (255, 127, 80),  // coral
        ("r", 2) => (255, 0, 0),     // red
        ("r", 3) => (128, 0, 0),     // maroon
        ("i", 1) => (255, 215, 0),   // gold
        ("i", 2) => (218, 165, 32),  // goldenrod
        ("i", 3) => (210, 105, 30),  // chocolate
        _ => (128, 128, 128),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageLayer {
    pub tiling: i64,
    pub color: (u8, u8, u8),
    /// (ra, dec) in degrees.
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageMap {
    pub title: String,
    pub band: String,
    /// Output file name without extension.
    pub file_stem: String,
    pub layers: Vec<CoverageLayer>,
}

impl CoverageMap {
    pub fn field_count(&self) -> usize {
        self.layers.iter().map(|l| l.points.len()).sum()
    }
}

/// Selection of maps to build.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageRequest<'a> {
    pub categories: &'a [CoverageCategory],
    pub bands: &'a [String],
    /// Restrict to one program and prefix the title with this label.
    pub program: Option<(&'a str, &'a str)>,
    /// Projection tag embedded in file names.
    pub projection: &'a str,
}

/// Build one map per (category, band). Extra fields are never drawn.
pub fn build_coverage_maps(fields: &FieldStatusTable, request: &CoverageRequest<'_>) -> Vec<CoverageMap> {
    let mut maps = Vec::new();
    for &category in request.categories {
        let title = match request.program {
            Some((_, label)) => format!("{} {}", label, category.title()),
            None => category.title().to_string(),
        };
        for band in request.bands {
            let selected: Vec<&LabeledField> = fields
                .counted()
                .filter(|f| f.field.filter == *band && category.includes(f))
                .filter(|f| request.program.map_or(true, |(p, _)| f.field.program == p))
                .collect();

            let layers = category
                .tiling_order()
                .into_iter()
                .map(|tiling| CoverageLayer {
                    tiling,
                    color: layer_color(band, tiling),
                    points: selected
                        .iter()
                        .filter(|f| f.field.tiling == tiling)
                        .map(|f| (f.field.ra, f.field.dec))
                        .collect(),
                })
                .collect();

            maps.push(CoverageMap {
                title: format!("{} ({}-band)", title, band),
                band: band.clone(),
                file_stem: format!(
                    "{}_{}_{}",
                    title.to_lowercase().replace(' ', "_"),
                    request.projection,
                    band
                ),
                layers,
            });
        }
    }
    maps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DoneFlags, Field};

    fn labeled(hex: i64, tiling: i64, program: &str, filter: &str, done: DoneFlags) -> LabeledField {
        LabeledField {
            field: Field::from_catalog(hex, tiling, program, filter, 1, hex as f64, -40.0),
            done,
            date: None,
            extra: false,
        }
    }

    fn bands() -> Vec<String> {
        vec!["g".to_string(), "r".to_string()]
    }

    #[test]
    fn test_categories_partition_fields() {
        let fields = vec![
            labeled(1, 1, "delve-wide", "g", DoneFlags::OBSERVED),
            labeled(2, 2, "delve-wide", "g", DoneFlags::INHERENT),
            labeled(3, 3, "delve-wide", "g", DoneFlags::NONE),
            labeled(4, 1, "delve-wide", "r", DoneFlags::NONE),
        ];
        let bands = bands();
        let request = CoverageRequest {
            categories: &CoverageCategory::ALL,
            bands: &bands,
            program: None,
            projection: "car",
        };
        let maps = build_coverage_maps(&FieldStatusTable::new(fields).unwrap(), &request);
        assert_eq!(maps.len(), 6);

        let counts: Vec<usize> = maps.iter().map(CoverageMap::field_count).collect();
        // observed g, observed r, all g, all r, todo g, todo r
        assert_eq!(counts, vec![1, 0, 2, 0, 1, 1]);
        assert_eq!(maps[0].file_stem, "observed_complete_car_g");
        assert_eq!(maps[0].title, "Observed Complete (g-band)");
    }

    #[test]
    fn test_todo_reverses_tilings() {
        assert_eq!(CoverageCategory::ToDo.tiling_order(), vec![3, 2, 1]);
        assert_eq!(CoverageCategory::AllComplete.tiling_order(), vec![1, 2, 3]);
    }

    #[test]
    fn test_program_restriction_and_extras() {
        let mut extra = labeled(5, 1, "delve-mc", "g", DoneFlags::OBSERVED);
        extra.extra = true;
        let fields = vec![
            labeled(1, 1, "delve-mc", "g", DoneFlags::OBSERVED),
            labeled(2, 2, "delve-wide", "g", DoneFlags::OBSERVED),
            extra,
        ];
        let bands = vec!["g".to_string()];
        let request = CoverageRequest {
            categories: &[CoverageCategory::ObservedComplete],
            bands: &bands,
            program: Some(("delve-mc", "MC")),
            projection: "car",
        };
        let maps = build_coverage_maps(&FieldStatusTable::new(fields).unwrap(), &request);
        assert_eq!(maps.len(), 1);
        assert_eq!(maps[0].field_count(), 1);
        assert_eq!(maps[0].file_stem, "mc_observed_complete_car_g");
        assert_eq!(maps[0].layers[0].color, layer_color("g", 1));
    }
}
