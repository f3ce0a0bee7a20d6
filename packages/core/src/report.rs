//! Data-quality result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::RecordField;

/// Place ids judged to refer to the same physical business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DuplicateGroup(pub Vec<String>);

impl DuplicateGroup {
    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, place_id: &str) -> bool {
        self.0.iter().any(|id| id == place_id)
    }
}

/// Filled/total count for one field tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSummary {
    pub filled: usize,
    pub total: usize,
}

/// Per-tier breakdown of a completeness check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub essential: TierSummary,
    pub important: TierSummary,
    pub optional: TierSummary,
}

/// Completeness of a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completeness {
    /// Weighted score, 0-100.
    pub score: u8,
    /// Empty fields in tier order (essential, important, optional).
    pub missing_fields: Vec<RecordField>,
    pub field_summary: FieldSummary,
}

/// Score histogram with four fixed buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDistribution {
    /// 90-100
    pub excellent: usize,
    /// 70-89
    pub good: usize,
    /// 50-69
    pub fair: usize,
    /// 0-49
    pub poor: usize,
}

impl ScoreDistribution {
    pub fn total(&self) -> usize {
        self.excellent + self.good + self.fair + self.poor
    }
}

/// Aggregate quality figures for a batch of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub total_records: usize,
    /// Records scoring at or above the completeness threshold.
    pub complete: usize,
    pub incomplete: usize,
    /// Number of duplicate groups.
    pub duplicates: usize,
    /// Sum of the duplicate group sizes.
    pub duplicate_records: usize,
    /// Mean score, one decimal place.
    pub average_score: f64,
    /// How often each scored field was empty across the batch.
    pub missing_fields: BTreeMap<RecordField, usize>,
    pub score_distribution: ScoreDistribution,
}

impl QualityReport {
    /// Report for an empty batch.
    pub fn empty() -> Self {
        Self::default()
    }
}
