//! Prediction record fields and per-iteration slicing.
//!
//! A `PredictionRecord` is the frozen model's output for one input example:
//! a name -> value map mixing scalars (labels, type string), token
//! sequences, knowledge-graph node tables and per-iteration attention
//! matrices. Field shape is declared up front by the `FieldValue` variant,
//! so slicing a record down to one decode iteration never has to probe.

use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

/// One field of a prediction record, tagged by shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Str(String),
    IntList(Vec<i64>),
    StrList(Vec<String>),
    FloatList(Vec<f32>),
    /// Matrix whose outer index is the decode iteration (attention taps).
    PerIteration(Vec<Vec<f32>>),
    /// Matrix not indexed by iteration (e.g. the adjacency matrix).
    FloatTable(Vec<Vec<f32>>),
    /// Knowledge-graph node rows; column 0 holds the node identity token.
    IntTable(Vec<Vec<i64>>),
}

impl FieldValue {
    /// Resolve this field for one decode iteration. `PerIteration` fields
    /// yield their row (clamped to the last row when the model ran fewer
    /// steps than requested); every other shape passes through whole.
    pub fn iteration_slice(&self, iteration: usize) -> FieldSlice<'_> {
        match self {
            FieldValue::PerIteration(rows) => {
                let idx = iteration.min(rows.len().saturating_sub(1));
                match rows.get(idx) {
                    Some(row) => FieldSlice::Vector(row),
                    None => FieldSlice::Whole(self),
                }
            }
            other => FieldSlice::Whole(other),
        }
    }
}

/// A field resolved for one decode iteration.
#[derive(Debug, Clone, Copy)]
pub enum FieldSlice<'a> {
    /// One iteration's worth of a per-iteration field.
    Vector(&'a [f32]),
    /// A field that is not per-iteration, passed through unsliced.
    Whole(&'a FieldValue),
}

/// One example's worth of model output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(flatten)]
    fields: BTreeMap<String, FieldValue>,
}

impl PredictionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.fields.get_mut(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// A decoded string field (`type_string`, `actual_label`, ...).
    pub fn str_field(&self, name: &str) -> Result<&str> {
        match self.get(name) {
            Some(FieldValue::Str(s)) => Ok(s),
            Some(other) => bail!("field {name} is not a string: {other:?}"),
            None => bail!("missing field {name}"),
        }
    }

    /// A decoded token sequence (`src` after decoding).
    pub fn str_list(&self, name: &str) -> Result<&[String]> {
        match self.get(name) {
            Some(FieldValue::StrList(tokens)) => Ok(tokens),
            Some(other) => bail!("field {name} is not a token list: {other:?}"),
            None => bail!("missing field {name}"),
        }
    }

    pub fn int_table(&self, name: &str) -> Result<&[Vec<i64>]> {
        match self.get(name) {
            Some(FieldValue::IntTable(rows)) => Ok(rows),
            Some(other) => bail!("field {name} is not an integer table: {other:?}"),
            None => bail!("missing field {name}"),
        }
    }

    pub fn float_table(&self, name: &str) -> Result<&[Vec<f32>]> {
        match self.get(name) {
            Some(FieldValue::FloatTable(rows)) => Ok(rows),
            Some(other) => bail!("field {name} is not a float table: {other:?}"),
            None => bail!("missing field {name}"),
        }
    }

    /// A non-negative scalar count (`kb_nodes_len`).
    pub fn usize_field(&self, name: &str) -> Result<usize> {
        match self.get(name) {
            Some(FieldValue::Int(v)) if *v >= 0 => Ok(*v as usize),
            Some(FieldValue::Int(v)) => bail!("field {name} is negative: {v}"),
            Some(other) => bail!("field {name} is not an integer: {other:?}"),
            None => bail!("missing field {name}"),
        }
    }

    /// One iteration's attention vector for a per-iteration tap.
    pub fn attn_row(&self, name: &str, iteration: usize) -> Result<&[f32]> {
        match self.get(name) {
            Some(FieldValue::PerIteration(rows)) => rows
                .get(iteration)
                .map(Vec::as_slice)
                .ok_or_else(|| anyhow!("field {name} has no row for iteration {iteration}")),
            Some(other) => bail!("field {name} is not per-iteration: {other:?}"),
            None => bail!("missing field {name}"),
        }
    }

    /// View of the whole record resolved for one decode iteration.
    pub fn iteration_slice(&self, iteration: usize) -> RecordSlice<'_> {
        RecordSlice {
            iteration,
            fields: self
                .fields
                .iter()
                .map(|(k, v)| (k.as_str(), v.iteration_slice(iteration)))
                .collect(),
        }
    }
}

/// A `PredictionRecord` resolved for one decode iteration.
#[derive(Debug, Clone)]
pub struct RecordSlice<'a> {
    iteration: usize,
    fields: BTreeMap<&'a str, FieldSlice<'a>>,
}

impl<'a> RecordSlice<'a> {
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn get(&self, name: &str) -> Option<FieldSlice<'a>> {
        self.fields.get(name).copied()
    }

    /// The iteration's vector for a per-iteration field.
    pub fn vector(&self, name: &str) -> Option<&'a [f32]> {
        match self.get(name)? {
            FieldSlice::Vector(row) => Some(row),
            FieldSlice::Whole(_) => None,
        }
    }

    /// A field that was passed through unsliced.
    pub fn whole(&self, name: &str) -> Option<&'a FieldValue> {
        match self.get(name)? {
            FieldSlice::Whole(value) => Some(value),
            FieldSlice::Vector(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_iteration_field_slices_to_row() {
        let field = FieldValue::PerIteration(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        match field.iteration_slice(1) {
            FieldSlice::Vector(row) => assert_eq!(row, &[0.0, 1.0]),
            FieldSlice::Whole(_) => panic!("expected a sliced row"),
        }
    }

    #[test]
    fn test_scalar_field_passes_through_whole() {
        let field = FieldValue::Str("station_adjacent".to_string());
        match field.iteration_slice(3) {
            FieldSlice::Whole(FieldValue::Str(s)) => assert_eq!(s, "station_adjacent"),
            other => panic!("expected whole pass-through, got {other:?}"),
        }
    }

    #[test]
    fn test_adjacency_table_is_never_sliced() {
        let field = FieldValue::FloatTable(vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
        assert!(matches!(field.iteration_slice(0), FieldSlice::Whole(_)));
    }

    #[test]
    fn test_out_of_range_iteration_clamps_to_last_row() {
        let field = FieldValue::PerIteration(vec![vec![0.5, 0.5]]);
        match field.iteration_slice(7) {
            FieldSlice::Vector(row) => assert_eq!(row, &[0.5, 0.5]),
            FieldSlice::Whole(_) => panic!("expected clamped row"),
        }
    }

    #[test]
    fn test_record_slice_accessors() {
        let mut record = PredictionRecord::new();
        record.insert(
            "mp_write_attn",
            FieldValue::PerIteration(vec![vec![1.0, 0.0]]),
        );
        record.insert("kb_nodes_len", FieldValue::Int(2));

        let slice = record.iteration_slice(0);
        assert_eq!(slice.iteration(), 0);
        assert_eq!(slice.vector("mp_write_attn"), Some(&[1.0, 0.0][..]));
        assert!(slice.vector("kb_nodes_len").is_none());
        assert_eq!(slice.whole("kb_nodes_len"), Some(&FieldValue::Int(2)));
        assert!(slice.get("missing").is_none());
    }

    #[test]
    fn test_str_field_errors() {
        let mut record = PredictionRecord::new();
        record.insert("actual_label", FieldValue::Int(4));

        let err = record.str_field("actual_label").unwrap_err();
        assert!(err.to_string().contains("not a string"));
        let err = record.str_field("predicted_label").unwrap_err();
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn test_record_json_round_trip() {
        let mut record = PredictionRecord::new();
        record.insert("predicted_label", FieldValue::Int(3));
        record.insert("src", FieldValue::IntList(vec![3, 1, 4]));
        record.insert(
            "mp_read0_attn",
            FieldValue::PerIteration(vec![vec![0.25, 0.75]]),
        );

        let json = serde_json::to_string(&record).unwrap();
        let back: PredictionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
