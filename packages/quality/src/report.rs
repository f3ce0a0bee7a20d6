//! Batch-level quality report.

use quarry_core::{BusinessRecord, NormalizedRecord, QualityReport, ScoreDistribution};

use crate::completeness::{COMPLETE_THRESHOLD, EXCELLENT_MIN, FAIR_MIN, GOOD_MIN, check_completeness};
use crate::duplicates::find_duplicates;

/// Build a quality report for a batch of raw records.
///
/// An empty batch yields the all-zero report.
pub fn generate_quality_report(records: &[BusinessRecord]) -> QualityReport {
    build_report(records.iter())
}

/// Build a quality report for records that were already normalized.
pub fn generate_normalized_report(records: &[NormalizedRecord]) -> QualityReport {
    build_report(records.iter().map(|n| &n.record))
}

fn build_report<'a, I>(records: I) -> QualityReport
where
    I: Iterator<Item = &'a BusinessRecord> + Clone,
{
    let mut report = QualityReport::empty();
    let mut total_score: u64 = 0;

    for record in records.clone() {
        let completeness = check_completeness(record);
        let score = completeness.score;

        report.total_records += 1;
        total_score += u64::from(score);

        if score >= COMPLETE_THRESHOLD {
            report.complete += 1;
        } else {
            report.incomplete += 1;
        }

        bucket(&mut report.score_distribution, score);

        for field in completeness.missing_fields {
            *report.missing_fields.entry(field).or_insert(0) += 1;
        }
    }

    if report.total_records == 0 {
        return report;
    }

    let groups = find_duplicates(records);
    report.duplicates = groups.len();
    report.duplicate_records = groups.iter().map(|g| g.len()).sum();
    report.average_score =
        (total_score as f64 / report.total_records as f64 * 10.0).round_ties_even() / 10.0;

    report
}

fn bucket(distribution: &mut ScoreDistribution, score: u8) {
    if score >= EXCELLENT_MIN {
        distribution.excellent += 1;
    } else if score >= GOOD_MIN {
        distribution.good += 1;
    } else if score >= FAIR_MIN {
        distribution.fair += 1;
    } else {
        distribution.poor += 1;
    }
}
