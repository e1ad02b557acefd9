//! Decode raw token-id fields into display strings, in place.
//!
//! Runs once per record, before filtering. Padding markers (`<space>`,
//! `<eos>`) are deliberately left in `src` here; the renderer replaces
//! them at print time.

use anyhow::{bail, Result};

use crate::record::{FieldValue, PredictionRecord};
use crate::vocab::Vocab;

/// Fields rewritten from token ids to strings.
const LABEL_FIELDS: [&str; 3] = ["type_string", "actual_label", "predicted_label"];

pub fn decode_record(record: &mut PredictionRecord, vocab: &Vocab) -> Result<()> {
    for name in LABEL_FIELDS {
        let Some(field) = record.get_mut(name) else {
            bail!("missing field {name}");
        };
        match field {
            FieldValue::Int(id) => {
                *field = FieldValue::Str(vocab.token_for(*id).to_string());
            }
            // Already decoded; decoding is idempotent.
            FieldValue::Str(_) => {}
            other => bail!("field {name} has unexpected shape: {other:?}"),
        }
    }

    let Some(src) = record.get_mut("src") else {
        bail!("missing field src");
    };
    match src {
        FieldValue::IntList(ids) => {
            let tokens = ids
                .iter()
                .map(|&id| vocab.token_for(id).to_string())
                .collect();
            *src = FieldValue::StrList(tokens);
        }
        FieldValue::StrList(_) => {}
        other => bail!("field src has unexpected shape: {other:?}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::UNK_TOKEN;

    fn sample_vocab() -> Vocab {
        Vocab::from_tokens(
            ["<unk>", "<space>", "<eos>", "A", "B", "station_adjacent"]
                .map(str::to_string)
                .to_vec(),
        )
    }

    fn raw_record() -> PredictionRecord {
        let mut record = PredictionRecord::new();
        record.insert("type_string", FieldValue::Int(5));
        record.insert("actual_label", FieldValue::Int(3));
        record.insert("predicted_label", FieldValue::Int(4));
        record.insert("src", FieldValue::IntList(vec![3, 1, 4, 2]));
        record
    }

    #[test]
    fn test_all_label_fields_become_strings() {
        let vocab = sample_vocab();
        let mut record = raw_record();
        decode_record(&mut record, &vocab).unwrap();

        assert_eq!(record.str_field("type_string").unwrap(), "station_adjacent");
        assert_eq!(record.str_field("actual_label").unwrap(), "A");
        assert_eq!(record.str_field("predicted_label").unwrap(), "B");
        assert_eq!(
            record.str_list("src").unwrap(),
            &["A", "<space>", "B", "<eos>"]
        );
    }

    #[test]
    fn test_unknown_ids_decode_to_placeholder() {
        let vocab = sample_vocab();
        let mut record = raw_record();
        record.insert("predicted_label", FieldValue::Int(999));
        record.insert("src", FieldValue::IntList(vec![0, -3]));
        decode_record(&mut record, &vocab).unwrap();

        assert_eq!(record.str_field("predicted_label").unwrap(), UNK_TOKEN);
        assert_eq!(record.str_list("src").unwrap(), &[UNK_TOKEN, UNK_TOKEN]);
    }

    #[test]
    fn test_decoding_twice_is_a_no_op() {
        let vocab = sample_vocab();
        let mut record = raw_record();
        decode_record(&mut record, &vocab).unwrap();
        let once = record.clone();
        decode_record(&mut record, &vocab).unwrap();
        assert_eq!(record, once);
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let vocab = sample_vocab();
        let mut record = raw_record();
        record.insert("src", FieldValue::IntList(vec![]));
        decode_record(&mut record, &vocab).unwrap();

        let mut incomplete = PredictionRecord::new();
        incomplete.insert("type_string", FieldValue::Int(5));
        assert!(decode_record(&mut incomplete, &vocab).is_err());
    }
}
