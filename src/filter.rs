//! Record filtering and class-frequency accumulation.
//!
//! Two orthogonal decisions per record: the optional equality/prefix
//! predicates decide whether a record is *seen* at all (and counted), the
//! verdict toggles then decide whether a seen record is rendered.

use std::collections::HashMap;

use crate::config::CommandOptions;
use crate::record::PredictionRecord;
use anyhow::Result;

/// Write-accumulate frequency table.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    counts: HashMap<String, u64>,
}

impl Counter {
    pub fn add(&mut self, key: &str) {
        *self.counts.entry(key.to_string()).or_insert(0) += 1;
    }

    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

/// The four per-run frequency tables. Accumulated for every record that
/// passes the predicates; only read back for the end-of-run debug log.
#[derive(Debug, Clone, Default)]
pub struct Counters {
    pub stats: Counter,
    pub output_classes: Counter,
    pub predicted_classes: Counter,
    pub confusion: Counter,
}

impl Counters {
    pub fn observe(&mut self, actual: &str, predicted: &str) {
        self.output_classes.add(actual);
        self.predicted_classes.add(predicted);
        self.confusion.add(&format!("{actual}->{predicted}"));
        self.stats
            .add(if actual == predicted { "correct" } else { "failed" });
    }
}

/// The three optional predicates plus the verdict toggles.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    type_prefix: Option<String>,
    output_class: Option<String>,
    expected_class: Option<String>,
    correct_only: bool,
    failed_only: bool,
}

impl RecordFilter {
    pub fn from_options(options: &CommandOptions) -> Self {
        Self {
            type_prefix: options.filter_type_prefix.clone(),
            output_class: options.filter_output_class.clone(),
            expected_class: options.filter_expected_class.clone(),
            correct_only: options.correct_only,
            failed_only: options.failed_only,
        }
    }

    /// Apply the three optional predicates to a decoded record. An unset
    /// predicate always passes. Pure; applying it twice cannot change the
    /// answer.
    pub fn matches(&self, record: &PredictionRecord) -> Result<bool> {
        let type_string = record.str_field("type_string")?;
        let predicted = record.str_field("predicted_label")?;
        let actual = record.str_field("actual_label")?;

        Ok(self
            .type_prefix
            .as_deref()
            .map_or(true, |prefix| type_string.starts_with(prefix))
            && self
                .output_class
                .as_deref()
                .map_or(true, |class| predicted == class)
            && self
                .expected_class
                .as_deref()
                .map_or(true, |class| actual == class))
    }

    /// Verdict toggles: failed-only renders misses, correct-only renders
    /// hits, neither renders everything. The CLI rejects both together.
    pub fn should_render(&self, correct: bool) -> bool {
        debug_assert!(!(self.failed_only && self.correct_only));
        if self.failed_only {
            !correct
        } else if self.correct_only {
            correct
        } else {
            true
        }
    }
}
