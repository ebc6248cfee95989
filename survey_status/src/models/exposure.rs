use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::field::FieldId;

/// Value the exposure table reports for a quality metric that was never evaluated.
pub const MISSING_METRIC: f64 = -1.0;

/// A single telescope exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exposure {
    /// Free-text object name; the field id is the token after the last space.
    pub object: String,
    pub program: String,
    pub filter: String,
    /// Requested exposure duration in seconds.
    pub exptime: f64,
    pub date: NaiveDateTime,
    /// Effective exposure time fraction, or [`MISSING_METRIC`].
    pub qc_teff: f64,
    /// Seeing FWHM in arcsec, or [`MISSING_METRIC`].
    pub qc_fwhm: f64,
    pub ra: Option<f64>,
    pub dec: Option<f64>,
}

impl Exposure {
    /// Field identifier encoded in the object name.
    ///
    /// Returns `None` when the trailing token is empty (e.g. `"DELVE field: "`).
    pub fn field_id(&self) -> Option<FieldId> {
        let token = match self.object.rsplit_once(' ') {
            Some((_, tail)) => tail,
            None => self.object.as_str(),
        };
        if token.trim().is_empty() {
            None
        } else {
            Some(FieldId::new(token))
        }
    }

    pub fn exptime_hours(&self) -> qtty::Hours {
        qtty::Hours::new(self.exptime / 3600.0)
    }

    /// Returns the name of the first quality metric that is neither a
    /// measurement nor the missing sentinel.
    pub fn invalid_metric(&self) -> Option<(&'static str, f64)> {
        let valid = |v: f64| v >= 0.0 || v == MISSING_METRIC;
        if !valid(self.qc_teff) {
            Some(("qc_teff", self.qc_teff))
        } else if !valid(self.qc_fwhm) {
            Some(("qc_fwhm", self.qc_fwhm))
        } else {
            None
        }
    }
}
