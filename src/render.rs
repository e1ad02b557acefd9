//! Human-readable report for one prediction record.
//!
//! Layout per record: a one-line verdict, then (unless details are
//! hidden) one section per decode iteration with the cell's query taps
//! and each memory-pointer head's attention over the knowledge-graph
//! nodes, and finally the graph's adjacency matrix.

use std::io::Write;

use anyhow::{ensure, Result};
use colored::Colorize;

use crate::config::{CommandOptions, RunConfig};
use crate::mac::MacComponent;
use crate::record::PredictionRecord;
use crate::style::{color_text, hr, hr_text};
use crate::vocab::Vocab;

/// Tolerance for the sum-to-one attention invariant. A violation means
/// the exported taps do not match the model wiring, so it is fatal.
pub const ATTN_SUM_TOLERANCE: f32 = 0.01;

/// Memory-pointer head names: one write head plus the configured reads.
pub fn head_names(read_heads: usize) -> Vec<String> {
    let mut heads = vec!["mp_write".to_string()];
    heads.extend((0..read_heads).map(|head| format!("mp_read{head}")));
    heads
}

/// The one-line verdict: glyph, highlighted prediction (with the expected
/// label appended on a miss), and the source text with padding markers
/// replaced.
pub fn verdict_line(predicted: &str, actual: &str, src: &[String]) -> String {
    let text = src
        .join("")
        .replace("<space>", " ")
        .replace("<eos>", "");
    if predicted == actual {
        format!("✅  {}  -  {text}", predicted.on_truecolor(0, 95, 0))
    } else {
        format!(
            "❌  {}, expected {actual}  -  {text}",
            predicted.on_truecolor(95, 0, 0)
        )
    }
}

/// Display labels for the valid knowledge-graph nodes.
fn node_labels(record: &PredictionRecord, vocab: &Vocab) -> Result<Vec<String>> {
    let rows = record.int_table("kb_nodes")?;
    let len = record.usize_field("kb_nodes_len")?;
    Ok(rows.iter().take(len).map(|row| vocab.node_label(row)).collect())
}

/// Pretty-print the adjacency matrix over the valid nodes.
pub fn adj_pretty(record: &PredictionRecord, vocab: &Vocab) -> Result<String> {
    let nodes = node_labels(record, vocab)?;
    let adjacency = record.float_table("kb_adjacency")?;
    let width = nodes.iter().map(String::len).max().unwrap_or(1).max(1);

    let mut text = String::new();
    text.push_str(&" ".repeat(width + 1));
    for label in &nodes {
        text.push_str(&format!("{label:>width$} "));
    }
    text.push('\n');
    for (row_idx, label) in nodes.iter().enumerate() {
        text.push_str(&format!("{label:>width$} "));
        for col_idx in 0..nodes.len() {
            let edge = adjacency
                .get(row_idx)
                .and_then(|row| row.get(col_idx))
                .copied()
                .unwrap_or(0.0);
            let cell = if edge > 0.5 { "1" } else { "·" };
            text.push_str(&format!("{cell:>width$} "));
        }
        text.push('\n');
    }
    Ok(text)
}

/// Renders accepted records to a writer (stdout in the binary, a buffer
/// in tests).
pub struct Reporter<'a, W: Write> {
    config: &'a RunConfig,
    vocab: &'a Vocab,
    mac: MacComponent,
    hide_details: bool,
    out: W,
}

impl<'a, W: Write> Reporter<'a, W> {
    pub fn new(
        config: &'a RunConfig,
        vocab: &'a Vocab,
        options: &CommandOptions,
        out: W,
    ) -> Self {
        Self {
            config,
            vocab,
            mac: MacComponent::new(config),
            hide_details: options.hide_details,
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Render one decoded record.
    pub fn print_record(&mut self, record: &PredictionRecord) -> Result<()> {
        let predicted = record.str_field("predicted_label")?;
        let actual = record.str_field("actual_label")?;
        let src = record.str_list("src")?;
        writeln!(self.out, "{}", verdict_line(predicted, actual, src))?;

        if self.hide_details {
            return Ok(());
        }

        for iteration in 0..self.config.max_decode_iterations {
            hr_text(&mut self.out, &format!("Iteration {iteration}"))?;
            let slice = record.iteration_slice(iteration);
            self.mac.print_all(&slice, &mut self.out)?;
            self.print_heads(iteration, record)?;
        }

        hr(&mut self.out)?;
        writeln!(self.out, "Adjacency:\n{}", adj_pretty(record, self.vocab)?)?;
        Ok(())
    }

    /// Each memory-pointer head's attention over the valid nodes.
    fn print_heads(&mut self, iteration: usize, record: &PredictionRecord) -> Result<()> {
        let nodes = node_labels(record, self.vocab)?;
        for head in head_names(self.config.mp_read_heads) {
            let tap = format!("{head}_attn");
            let weights = record.attn_row(&tap, iteration)?;
            let sum: f32 = weights.iter().sum();
            ensure!(
                (sum - 1.0).abs() <= ATTN_SUM_TOLERANCE,
                "attention does not sum to 1.0 for {tap} at iteration {iteration} (sum={sum})"
            );
            writeln!(
                self.out,
                "{iteration}: {tap}: {}",
                color_text(&nodes, weights).join(", ")
            )?;
        }
        Ok(())
    }
}
