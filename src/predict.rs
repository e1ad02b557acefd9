//! The inspection pipeline: count pass, prediction stream, decode,
//! filter, count, render.

use std::io::Write;

use anyhow::Result;
use tracing::{debug, info};

use crate::config::{CommandOptions, RunConfig};
use crate::decode::decode_record;
use crate::estimator::{get_estimator, input_source, Split};
use crate::filter::{Counters, RecordFilter};
use crate::render::Reporter;
use crate::vocab::Vocab;

/// What one run did, for the caller and the end-of-run log.
#[derive(Debug)]
pub struct PredictionSummary {
    /// Raw records pulled from the prediction stream (bounded by `n`).
    pub inspected: usize,
    /// Records that passed the optional predicates (the "seen" count).
    pub matched: usize,
    /// Records actually rendered after the verdict toggles.
    pub rendered: usize,
    pub counters: Counters,
}

/// Run the full pipeline, rendering accepted records to `out`.
///
/// The `n` cutoff bounds records *inspected*, against the position in the
/// raw prediction stream; with aggressive filters fewer than `n` records
/// may be rendered.
pub fn predict<W: Write>(
    config: &RunConfig,
    options: &CommandOptions,
    out: W,
) -> Result<PredictionSummary> {
    options.validate()?;

    let estimator = get_estimator(config)?;
    let source = input_source(config, Split::Predict)?;

    // Dedicated scan purely for the count; the prediction stream below
    // re-opens the store from the start.
    let total = input_source(config, Split::Predict)?.count()?;
    info!("Config: {:?}", config);
    info!("Predicting on {total} input records");

    let predictions = estimator.predict(source)?;
    let vocab = Vocab::load_from_config(config)?;
    let filter = RecordFilter::from_options(options);
    let mut counters = Counters::default();
    let mut reporter = Reporter::new(config, &vocab, options, out);

    let mut inspected = 0;
    let mut matched = 0;
    let mut rendered = 0;

    for (position, record) in predictions.enumerate() {
        if position >= options.n {
            break;
        }
        inspected += 1;

        let mut record = record?;
        decode_record(&mut record, &vocab)?;

        if !filter.matches(&record)? {
            continue;
        }
        matched += 1;

        let actual = record.str_field("actual_label")?;
        let predicted = record.str_field("predicted_label")?;
        counters.observe(actual, predicted);

        let correct = actual == predicted;
        if filter.should_render(correct) {
            reporter.print_record(&record)?;
            rendered += 1;
        }
    }

    debug!("seen by actual label: {:?}", counters.output_classes);
    debug!("seen by predicted label: {:?}", counters.predicted_classes);
    debug!("confusion: {:?}", counters.confusion);
    debug!("verdicts: {:?}", counters.stats);

    Ok(PredictionSummary {
        inspected,
        matched,
        rendered,
        counters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldValue, PredictionRecord};
    use crate::records::RecordWriter;
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::path::PathBuf;

    // Vocab ids: 0 <unk>, 1 <space>, 2 <eos>, 3 A, 4 B, 5 york, 6 kings,
    // 7 angel, 8 station_adjacent.
    const VOCAB: &str = "<unk>\n<space>\n<eos>\nA\nB\nyork\nkings\nangel\nstation_adjacent\n";

    fn raw_record(predicted: i64, actual: i64) -> PredictionRecord {
        let mut record = PredictionRecord::new();
        record.insert("type_string", FieldValue::Int(8));
        record.insert("predicted_label", FieldValue::Int(predicted));
        record.insert("actual_label", FieldValue::Int(actual));
        record.insert("src", FieldValue::IntList(vec![3, 1, 4, 2]));
        record.insert(
            "kb_nodes",
            FieldValue::IntTable(vec![vec![5], vec![6], vec![7]]),
        );
        record.insert("kb_nodes_len", FieldValue::Int(3));
        record.insert(
            "kb_adjacency",
            FieldValue::FloatTable(vec![
                vec![0.0, 1.0, 0.0],
                vec![1.0, 0.0, 1.0],
                vec![0.0, 1.0, 0.0],
            ]),
        );
        record.insert(
            "mp_write_attn",
            FieldValue::PerIteration(vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]),
        );
        record.insert(
            "mp_read0_attn",
            FieldValue::PerIteration(vec![vec![0.5, 0.5, 0.0], vec![0.0, 0.0, 1.0]]),
        );
        record
    }

    fn write_run(dir: &Path, records: &[PredictionRecord]) -> RunConfig {
        let vocab_path = dir.join("vocab.txt");
        std::fs::write(&vocab_path, VOCAB).unwrap();

        let predict_input_path = dir.join("predict.records");
        let mut writer = RecordWriter::create(&predict_input_path).unwrap();
        for record in records {
            writer.write(record).unwrap();
        }
        writer.finish().unwrap();

        RunConfig {
            model_dir: dir.to_path_buf(),
            max_decode_iterations: 2,
            mp_read_heads: 1,
            query_sources: vec![],
            predict_input_path,
            vocab_path,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn test_cutoff_bounds_inspected_not_rendered() {
        colored::control::set_override(false);
        let dir = tempfile::tempdir().unwrap();
        let records: Vec<_> = (0..100).map(|_| raw_record(3, 3)).collect();
        let config = write_run(dir.path(), &records);

        let options = CommandOptions {
            n: 5,
            hide_details: true,
            // A predicate nothing matches: still five records inspected.
            filter_output_class: Some("never".to_string()),
            ..CommandOptions::default()
        };
        let summary = predict(&config, &options, Vec::new()).unwrap();
        assert_eq!(summary.inspected, 5);
        assert_eq!(summary.matched, 0);
        assert_eq!(summary.rendered, 0);
    }

    #[test]
    fn test_failed_only_renders_misses_but_counts_everything() {
        colored::control::set_override(false);
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            raw_record(3, 3),
            raw_record(4, 4),
            raw_record(3, 3),
            raw_record(3, 4),
            raw_record(4, 3),
        ];
        let config = write_run(dir.path(), &records);

        let options = CommandOptions {
            failed_only: true,
            hide_details: true,
            ..CommandOptions::default()
        };
        let mut out = Vec::new();
        let summary = predict(&config, &options, &mut out).unwrap();

        assert_eq!(summary.inspected, 5);
        assert_eq!(summary.matched, 5);
        assert_eq!(summary.rendered, 2);
        assert_eq!(summary.counters.output_classes.total(), 5);
        assert_eq!(summary.counters.stats.get("failed"), 2);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches('❌').count(), 2);
        assert_eq!(text.matches('✅').count(), 0);
    }

    #[test]
    fn test_conflicting_toggles_rejected_before_any_io() {
        let config = write_run(tempfile::tempdir().unwrap().path(), &[]);
        let options = CommandOptions {
            correct_only: true,
            failed_only: true,
            ..CommandOptions::default()
        };
        assert!(predict(&config, &options, Vec::new()).is_err());
    }

    #[test]
    fn test_missing_record_store_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_run(dir.path(), &[]);
        config.predict_input_path = PathBuf::from("/nonexistent/predict.records");
        let options = CommandOptions::default();
        assert!(predict(&config, &options, Vec::new()).is_err());
    }
}
