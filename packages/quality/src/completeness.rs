//! Weighted field-completeness scoring.

use quarry_core::{BusinessRecord, Completeness, FieldSummary, RecordField, TierSummary};

/// Fields a usable listing cannot do without.
pub const ESSENTIAL_FIELDS: [RecordField; 6] = [
    RecordField::BusinessName,
    RecordField::Phone,
    RecordField::Website,
    RecordField::FullAddress,
    RecordField::City,
    RecordField::Rating,
];

/// Fields that matter but are not essential.
pub const IMPORTANT_FIELDS: [RecordField; 5] = [
    RecordField::StreetAddress,
    RecordField::PostalCode,
    RecordField::ProvinceState,
    RecordField::Categories,
    RecordField::Hours,
];

/// Nice-to-have fields.
pub const OPTIONAL_FIELDS: [RecordField; 5] = [
    RecordField::InternationalPhone,
    RecordField::GoogleMapsUrl,
    RecordField::PhotoUrl,
    RecordField::Latitude,
    RecordField::Longitude,
];

pub const ESSENTIAL_WEIGHT: f64 = 60.0;
pub const IMPORTANT_WEIGHT: f64 = 30.0;
pub const OPTIONAL_WEIGHT: f64 = 10.0;

/// Score at or above which a record counts as complete.
pub const COMPLETE_THRESHOLD: u8 = 80;

/// Lower bounds of the score distribution buckets.
pub const EXCELLENT_MIN: u8 = 90;
pub const GOOD_MIN: u8 = 70;
pub const FAIR_MIN: u8 = 50;

/// Score a record and list its empty fields.
///
/// Each tier contributes `filled / total * weight`; the sum is rounded to
/// the nearest integer.
pub fn check_completeness(record: &BusinessRecord) -> Completeness {
    let mut missing_fields = Vec::new();

    let essential = tally(record, &ESSENTIAL_FIELDS, &mut missing_fields);
    let important = tally(record, &IMPORTANT_FIELDS, &mut missing_fields);
    let optional = tally(record, &OPTIONAL_FIELDS, &mut missing_fields);

    let score = weighted(essential, ESSENTIAL_WEIGHT)
        + weighted(important, IMPORTANT_WEIGHT)
        + weighted(optional, OPTIONAL_WEIGHT);

    Completeness {
        score: score.round().clamp(0.0, 100.0) as u8,
        missing_fields,
        field_summary: FieldSummary {
            essential,
            important,
            optional,
        },
    }
}

fn tally(record: &BusinessRecord, fields: &[RecordField], missing: &mut Vec<RecordField>) -> TierSummary {
    let mut filled = 0;
    for &field in fields {
        if record.field(field).is_filled() {
            filled += 1;
        } else {
            missing.push(field);
        }
    }
    TierSummary {
        filled,
        total: fields.len(),
    }
}

fn weighted(tier: TierSummary, weight: f64) -> f64 {
    if tier.total == 0 {
        return 0.0;
    }
    tier.filled as f64 / tier.total as f64 * weight
}
