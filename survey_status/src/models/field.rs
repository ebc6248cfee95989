//! Planned survey fields and their completion labels.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Unique field identifier, `{hex}-{tiling:02}-{filter}`.
///
/// This is the same token that terminates the `object` name of every
/// exposure taken on the field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(pub String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build the identifier from the catalog naming convention.
    pub fn from_parts(hex: i64, tiling: i64, filter: &str) -> Self {
        Self(format!("{}-{:02}-{}", hex, tiling, filter))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single planned pointing from the field catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub hex: i64,
    pub tiling: i64,
    pub program: String,
    pub filter: String,
    pub priority: i64,
    pub ra: f64,
    pub dec: f64,
}

impl Field {
    /// Build a catalog field, deriving its id from hex, tiling and filter.
    pub fn from_catalog(
        hex: i64,
        tiling: i64,
        program: &str,
        filter: &str,
        priority: i64,
        ra: f64,
        dec: f64,
    ) -> Self {
        Self {
            id: FieldId::from_parts(hex, tiling, filter),
            hex,
            tiling,
            program: program.to_string(),
            filter: filter.to_string(),
            priority,
            ra,
            dec,
        }
    }
}

/// Two-bit completion value stored in the `done` column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoneFlags(u8);

impl DoneFlags {
    pub const NONE: DoneFlags = DoneFlags(0);
    /// Priority equals the program's "done" sentinel.
    pub const INHERENT: DoneFlags = DoneFlags(0b01);
    /// At least one good exposure matches the field.
    pub const OBSERVED: DoneFlags = DoneFlags(0b10);

    /// Rebuild flags from a stored integer, keeping only the two known bits.
    pub fn from_bits(bits: i64) -> Self {
        Self((bits & 0b11) as u8)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: DoneFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Done through either path.
    pub fn is_done(self) -> bool {
        self.0 > 0
    }

    pub fn is_inherent(self) -> bool {
        self.contains(Self::INHERENT)
    }

    pub fn is_observed(self) -> bool {
        self.contains(Self::OBSERVED)
    }
}

impl BitOr for DoneFlags {
    type Output = DoneFlags;

    fn bitor(self, rhs: DoneFlags) -> DoneFlags {
        DoneFlags(self.0 | rhs.0)
    }
}

/// A catalog field together with its derived status columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledField {
    pub field: Field,
    pub done: DoneFlags,
    /// Most recent good exposure on this field.
    pub date: Option<NaiveDateTime>,
    /// Placeholder entry outside the counted program.
    pub extra: bool,
}

impl LabeledField {
    pub fn unique_id(&self) -> &FieldId {
        &self.field.id
    }

    pub fn is_todo(&self) -> bool {
        !self.done.is_done()
    }
}
