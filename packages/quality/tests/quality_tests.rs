#![allow(clippy::disallowed_methods)]

use proptest::prelude::*;
use quality::{
    COMPLETE_THRESHOLD, check_completeness, find_duplicates, generate_normalized_report,
    generate_quality_report, normalize_phone, normalize_record, normalize_url, validate_url,
};
use quarry_core::{BusinessRecord, RecordField};

fn full_record(place_id: &str, name: &str, address: &str) -> BusinessRecord {
    BusinessRecord {
        place_id: Some(place_id.to_string()),
        business_name: Some(name.to_string()),
        phone: Some("613-555-1234".to_string()),
        website: Some("example.com".to_string()),
        full_address: Some(address.to_string()),
        city: Some("Ottawa".to_string()),
        rating: Some(4.6),
        street_address: Some("1 Main St".to_string()),
        postal_code: Some("K1A 0B1".to_string()),
        province_state: Some("ON".to_string()),
        categories: Some("health, doctor".to_string()),
        hours: Some("Monday: 9 AM - 5 PM".to_string()),
        international_phone: Some("+1 613-555-1234".to_string()),
        google_maps_url: Some("https://maps.google.com/?cid=1".to_string()),
        photo_url: Some("https://example.com/p.jpg".to_string()),
        latitude: Some(45.42),
        longitude: Some(-75.69),
        ..Default::default()
    }
}

fn set_field(record: &mut BusinessRecord, field: RecordField) {
    let text = Some("x".to_string());
    match field {
        RecordField::BusinessName => record.business_name = text,
        RecordField::Phone => record.phone = text,
        RecordField::Website => record.website = text,
        RecordField::FullAddress => record.full_address = text,
        RecordField::City => record.city = text,
        RecordField::Rating => record.rating = Some(3.0),
        RecordField::StreetAddress => record.street_address = text,
        RecordField::PostalCode => record.postal_code = text,
        RecordField::ProvinceState => record.province_state = text,
        RecordField::Categories => record.categories = text,
        RecordField::Hours => record.hours = text,
        RecordField::InternationalPhone => record.international_phone = text,
        RecordField::GoogleMapsUrl => record.google_maps_url = text,
        RecordField::PhotoUrl => record.photo_url = text,
        RecordField::Latitude => record.latitude = Some(0.0),
        RecordField::Longitude => record.longitude = Some(0.0),
    }
}

#[test]
fn test_normalize_phone() {
    assert_eq!(normalize_phone("613-555-1234"), "+16135551234");
    assert_eq!(normalize_phone("(613) 555-1234"), "+16135551234");
    assert_eq!(normalize_phone("1-613-555-1234"), "+16135551234");
    assert_eq!(normalize_phone("+1 613 555 1234"), "+16135551234");
    assert_eq!(normalize_phone("+44 20 7946 0958"), "+442079460958");
    assert_eq!(normalize_phone("555"), "555");
    assert_eq!(normalize_phone("2-613-555-1234"), "2-613-555-1234");
    assert_eq!(normalize_phone(""), "");
}

#[test]
fn test_normalize_url() {
    assert_eq!(normalize_url("example.com"), "https://example.com");
    assert_eq!(normalize_url("http://example.com"), "https://example.com");
    assert_eq!(normalize_url("https://example.com"), "https://example.com");
    assert_eq!(normalize_url("  www.example.com/path "), "https://www.example.com/path");
    assert_eq!(normalize_url(""), "");
}

#[test]
fn test_validate_url() {
    assert!(validate_url("https://example.com"));
    assert!(validate_url("http://example.com/a?b=c"));
    assert!(!validate_url("example.com"));
    assert!(!validate_url("mailto:someone@example.com"));
    assert!(!validate_url(""));
}

proptest! {
    #[test]
    fn phone_normalization_is_idempotent(phone in "[+]?[0-9 ()-]{0,18}") {
        let once = normalize_phone(&phone);
        prop_assert_eq!(normalize_phone(&once), once);
    }

    #[test]
    fn phone_normalization_is_idempotent_on_any_text(phone in ".{0,24}") {
        let once = normalize_phone(&phone);
        prop_assert_eq!(normalize_phone(&once), once);
    }

    #[test]
    fn url_normalization_is_idempotent(url in "\\s*((https?:)?//)?[a-z0-9./-]{0,20}\\s*") {
        let once = normalize_url(&url);
        prop_assert_eq!(normalize_url(&once), once);
    }
}

#[test]
fn test_completeness_bounds() {
    let empty = check_completeness(&BusinessRecord::default());
    assert_eq!(empty.score, 0);
    assert_eq!(empty.missing_fields.len(), 16);
    assert_eq!(empty.missing_fields, RecordField::ALL.to_vec());
    assert_eq!(empty.field_summary.essential.total, 6);
    assert_eq!(empty.field_summary.important.total, 5);
    assert_eq!(empty.field_summary.optional.total, 5);

    let full = check_completeness(&full_record("p1", "Clinic", "1 Main St, Ottawa"));
    assert_eq!(full.score, 100);
    assert!(full.missing_fields.is_empty());
    assert_eq!(full.field_summary.essential.filled, 6);
}

#[test]
fn test_completeness_is_monotone() {
    let mut record = BusinessRecord::default();
    let mut previous = check_completeness(&record).score;

    for field in RecordField::ALL {
        set_field(&mut record, field);
        let score = check_completeness(&record).score;
        assert!(score >= previous, "{} lowered the score", field);
        previous = score;
    }

    assert_eq!(previous, 100);
}

#[test]
fn test_completeness_tier_weights() {
    // All essential fields only.
    let mut record = BusinessRecord::default();
    for field in quality::ESSENTIAL_FIELDS {
        set_field(&mut record, field);
    }
    assert_eq!(check_completeness(&record).score, 60);

    // One important field adds 6, one optional field adds 2.
    set_field(&mut record, RecordField::Hours);
    assert_eq!(check_completeness(&record).score, 66);
    set_field(&mut record, RecordField::Latitude);
    let completeness = check_completeness(&record);
    assert_eq!(completeness.score, 68);
    assert_eq!(completeness.missing_fields.first(), Some(&RecordField::StreetAddress));
    assert_eq!(completeness.missing_fields.last(), Some(&RecordField::Longitude));
}

#[test]
fn test_whitespace_fields_are_missing() {
    let record = BusinessRecord {
        business_name: Some("  ".to_string()),
        rating: Some(0.0),
        ..Default::default()
    };
    let completeness = check_completeness(&record);
    assert_eq!(completeness.score, 10);
    assert_eq!(completeness.missing_fields[0], RecordField::BusinessName);
}

#[test]
fn test_find_duplicates() {
    let a = full_record("p1", "Green Clinic", "1 Main St");
    let b = full_record("p1", "Green Clinic Downtown", "5 King St");
    let c = full_record("p2", " GREEN clinic ", "1 MAIN ST ");
    let d = full_record("p3", "Other", "9 Elm St");

    let groups = find_duplicates(&[a, b, c, d]);
    assert_eq!(groups.len(), 2);

    // Identifier pass first.
    assert_eq!(groups[0].ids(), ["p1", "p1"]);
    // Soft pass: a and c share name + address.
    assert_eq!(groups[1].ids(), ["p1", "p2"]);

    // Singletons never appear.
    assert!(groups.iter().all(|g| !g.contains("p3")));
}

#[test]
fn test_find_duplicates_is_symmetric() {
    let a = full_record("p1", "Clinic", "1 Main St");
    let b = full_record("p2", "clinic", "1 main st");

    let forward = find_duplicates(&[a.clone(), b.clone()]);
    let backward = find_duplicates(&[b, a]);

    assert_eq!(forward.len(), 1);
    assert_eq!(backward.len(), 1);
    assert!(forward[0].contains("p1") && forward[0].contains("p2"));
    assert!(backward[0].contains("p1") && backward[0].contains("p2"));
}

#[test]
fn test_find_duplicates_skips_malformed_records() {
    let mut nameless = BusinessRecord::default();
    nameless.full_address = Some("1 Main St".to_string());
    let no_id = BusinessRecord {
        business_name: Some("Clinic".to_string()),
        full_address: Some("1 Main St".to_string()),
        ..Default::default()
    };
    let with_id = full_record("p1", "Clinic", "1 Main St");

    let groups = find_duplicates(&[nameless, no_id, with_id]);
    assert!(groups.is_empty());
}

#[test]
fn test_identical_soft_group_is_not_repeated() {
    let a = full_record("p1", "Clinic", "1 Main St");
    let b = full_record("p1", "Clinic", "1 Main St");

    let groups = find_duplicates(&[a, b]);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].ids(), ["p1", "p1"]);
}

#[test]
fn test_normalize_record() {
    let mut raw = full_record("p1", "Clinic", "1 Main St");
    raw.website = Some("http://clinic.example".to_string());
    raw.international_phone = Some(String::new());
    raw.hours = None;

    let normalized = normalize_record(&raw);
    assert_eq!(normalized.record.phone.as_deref(), Some("+16135551234"));
    assert_eq!(normalized.record.website.as_deref(), Some("https://clinic.example"));
    assert_eq!(normalized.record.international_phone.as_deref(), Some(""));
    assert_eq!(
        normalized.missing_fields,
        vec![RecordField::Hours, RecordField::InternationalPhone]
    );
    assert_eq!(normalized.data_quality_score, 92);

    let json = serde_json::to_value(&normalized).unwrap();
    assert_eq!(json["data_quality_score"], 92);
    assert_eq!(json["place_id"], "p1");
    assert_eq!(json["missing_fields"][0], "hours");
}

#[test]
fn test_empty_report() {
    let report = generate_quality_report(&[]);
    assert_eq!(report.total_records, 0);
    assert_eq!(report.complete, 0);
    assert_eq!(report.duplicates, 0);
    assert_eq!(report.average_score, 0.0);
    assert!(report.missing_fields.is_empty());
    assert_eq!(report.score_distribution.total(), 0);
}

#[test]
fn test_quality_report() {
    let complete = full_record("p1", "Clinic", "1 Main St");
    let duplicate = full_record("p1", "Clinic Two", "2 Main St");
    let mut sparse = BusinessRecord::new("p2", "Sparse Co");
    sparse.city = Some("Ottawa".to_string());

    let report = generate_quality_report(&[complete, duplicate, sparse]);
    assert_eq!(report.total_records, 3);
    assert_eq!(report.complete, 2);
    assert_eq!(report.incomplete, 1);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.duplicate_records, 2);
    // (100 + 100 + 20) / 3
    assert_eq!(report.average_score, 73.3);
    assert_eq!(report.score_distribution.excellent, 2);
    assert_eq!(report.score_distribution.poor, 1);
    assert_eq!(report.missing_fields.get(&RecordField::Phone), Some(&1));
    assert_eq!(report.missing_fields.get(&RecordField::City), None);
    assert!(COMPLETE_THRESHOLD <= 100);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["totalRecords"], 3);
    assert_eq!(json["duplicateRecords"], 2);
    assert_eq!(json["missingFields"]["phone"], 1);
    assert_eq!(json["scoreDistribution"]["excellent"], 2);
}

#[test]
fn test_average_score_rounds_half_to_even() {
    let mut records = vec![BusinessRecord::default(); 7];
    let mut located = BusinessRecord::default();
    set_field(&mut located, RecordField::Latitude);
    records.push(located);

    // 2 / 8 = 0.25 lands on 0.2, not 0.3.
    let report = generate_quality_report(&records);
    assert_eq!(report.total_records, 8);
    assert_eq!(report.average_score, 0.2);
}

#[test]
fn test_normalized_report_matches_raw_report() {
    let records = vec![
        full_record("p1", "Clinic", "1 Main St"),
        BusinessRecord::new("p2", "Sparse Co"),
    ];
    let normalized: Vec<_> = records.iter().map(normalize_record).collect();

    assert_eq!(
        generate_normalized_report(&normalized),
        generate_quality_report(&records)
    );
}
