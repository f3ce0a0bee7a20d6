//! Data-quality pipeline for extracted business records.
//!
//! Every function here is pure and never fails: malformed input degrades
//! to defaults (empty strings, zero scores) instead of erroring.
//!
//! - [`normalize_phone`] / [`normalize_url`]: canonical phone and URL forms
//! - [`check_completeness`]: weighted 0-100 field-completeness score
//! - [`find_duplicates`]: place-id and name+address duplicate groups
//! - [`normalize_record`]: per-record cleanup plus score
//! - [`generate_quality_report`]: batch statistics

mod completeness;
mod duplicates;
mod normalize;
mod report;

pub use completeness::{
    COMPLETE_THRESHOLD, ESSENTIAL_FIELDS, ESSENTIAL_WEIGHT, EXCELLENT_MIN, FAIR_MIN, GOOD_MIN,
    IMPORTANT_FIELDS, IMPORTANT_WEIGHT, OPTIONAL_FIELDS, OPTIONAL_WEIGHT, check_completeness,
};
pub use duplicates::find_duplicates;
pub use normalize::{normalize_phone, normalize_record, normalize_url, validate_url};
pub use report::{generate_normalized_report, generate_quality_report};
