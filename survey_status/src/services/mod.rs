//! Classification and aggregation services.
//!
//! Everything here is a pure function of already-loaded tables plus an
//! immutable [`QualityPolicy`](crate::models::QualityPolicy). Loading and
//! persistence live in [`crate::parsing`] and [`crate::db`].

pub mod classifier;
pub mod error;
pub mod field_status;
pub mod obstime;
pub mod progress;
pub mod report;
pub mod sky_map;


pub use classifier::{
    classify_field_completion, is_extra_field, is_good_exposure, select_good_exposures,
};
pub use error::{StatusError, StatusResult};
pub use field_status::{label_fields, FieldStatusTable};
pub use progress::{aggregate_progress, completion_fraction, ProgressRow};
