//! Frozen run configuration and command-line options.
//!
//! `config.yaml` is the configuration snapshot persisted at training time.
//! The only key this tool ever overrides is `model_dir`, so a trained run
//! survives its output directory being renamed or moved. Everything else
//! is immutable for the duration of the run and passed by reference into
//! every stage; there is no process-wide configuration state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// Keys this tool reads from the frozen snapshot. Everything else the
/// training run recorded is preserved opaquely in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub model_dir: PathBuf,
    pub max_decode_iterations: usize,
    pub mp_read_heads: usize,
    #[serde(default)]
    pub query_sources: Vec<String>,
    pub predict_input_path: PathBuf,
    pub vocab_path: PathBuf,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl RunConfig {
    /// Read `<model_dir>/config.yaml` and override the recorded model
    /// directory with the one we actually found the snapshot in.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let path = model_dir.join("config.yaml");
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading frozen config {}", path.display()))?;
        let mut config: RunConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing frozen config {}", path.display()))?;
        config.model_dir = model_dir.to_path_buf();
        Ok(config)
    }
}

/// Filters and limits supplied on the command line.
#[derive(Debug, Clone)]
pub struct CommandOptions {
    /// Maximum number of raw prediction records to inspect. Bounds records
    /// *inspected*, not records rendered.
    pub n: usize,
    pub filter_type_prefix: Option<String>,
    pub filter_output_class: Option<String>,
    pub filter_expected_class: Option<String>,
    pub correct_only: bool,
    pub failed_only: bool,
    pub hide_details: bool,
}

impl Default for CommandOptions {
    fn default() -> Self {
        Self {
            n: 20,
            filter_type_prefix: None,
            filter_output_class: None,
            filter_expected_class: None,
            correct_only: false,
            failed_only: false,
            hide_details: false,
        }
    }
}

impl CommandOptions {
    /// The two verdict toggles are contradictory together; reject instead
    /// of silently letting one win.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !(self.correct_only && self.failed_only),
            "--correct-only and --failed-only are mutually exclusive"
        );
        Ok(())
    }
}

/// The model directory: explicit when given, else `<prefix>/<dataset>/<version>`.
pub fn resolve_model_dir(
    model_dir: Option<&Path>,
    prefix: &Path,
    dataset: &str,
    version: &str,
) -> PathBuf {
    match model_dir {
        Some(dir) => dir.to_path_buf(),
        None => prefix.join(dataset).join(version),
    }
}

/// Default model version: the current source-control revision, or
/// "latest" when not running inside a checkout.
pub fn git_model_version() -> String {
    Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .filter(|hash| !hash.is_empty())
        .unwrap_or_else(|| "latest".to_string())
}
