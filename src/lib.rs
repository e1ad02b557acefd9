// Pedantic clippy configuration for ML-adjacent reporting code:
#![allow(clippy::cast_precision_loss)] // usize→f32 intentional for weights
#![allow(clippy::cast_possible_truncation)] // u64 frame lengths fit memory
#![allow(clippy::cast_sign_loss)] // i64→usize after non-negative check
#![allow(clippy::module_name_repetitions)] // RecordFilter in filter.rs is fine
#![allow(clippy::missing_errors_doc)] // # Errors section for every Result fn
#![allow(clippy::must_use_candidate)] // #[must_use] on every pure fn is excessive

//! macgraph-predict: inspect a frozen MAC network's reasoning traces.
//!
//! Loads the configuration snapshot of a trained Memory-Attention-Control
//! run, streams its exported per-example prediction records, and
//! pretty-prints each record's per-step attention distributions over the
//! knowledge graph, with optional filtering by predicted/expected class.
//!
//! ## Architecture
//!
//! - `config`: frozen `config.yaml` loading and command-line options
//! - `record`: prediction-record fields and per-iteration slicing
//! - `records`: length-prefixed binary record store (count + stream passes)
//! - `vocab`: token id <-> surface-string table
//! - `estimator`: seam to the external inference engine
//! - `decode`: token-id fields -> display strings
//! - `filter`: optional predicates, verdict toggles, class counters
//! - `style`: attention-weight color palette and rules
//! - `mac`: per-iteration read-out of the MAC cell's query taps
//! - `render`: verdict line, per-head attention report, adjacency matrix
//! - `predict`: the pipeline loop

pub mod config;
pub mod decode;
pub mod estimator;
pub mod filter;
pub mod mac;
pub mod predict;
pub mod record;
pub mod records;
pub mod render;
pub mod style;
pub mod vocab;

pub use config::{git_model_version, resolve_model_dir, CommandOptions, RunConfig};
pub use decode::decode_record;
pub use estimator::{
    get_estimator, input_source, Estimator, ExportedPredictions, PredictionStream, Split,
};
pub use filter::{Counter, Counters, RecordFilter};
pub use mac::{MacComponent, ATTN_THRESHOLD};
pub use predict::{predict, PredictionSummary};
pub use record::{FieldSlice, FieldValue, PredictionRecord, RecordSlice};
pub use records::{RecordFile, RecordStream, RecordWriter};
pub use render::{adj_pretty, head_names, verdict_line, Reporter, ATTN_SUM_TOLERANCE};
pub use style::{color_text, color_vector, hr, hr_text, weight_color};
pub use vocab::{Vocab, UNK_ID, UNK_TOKEN};
