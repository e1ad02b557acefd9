//! Per-iteration state read-out for the MAC cell.
//!
//! The cell itself (control unit, memory-pointer heads, output unit) runs
//! inside the external inference engine; this component only knows how to
//! print the iteration-scoped taps the cell exports: the query-switch
//! attention over the configured query sources and, for every source the
//! switch actually selected, that source's own attention distribution.

use std::io::Write;

use anyhow::{ensure, Result};

use crate::config::RunConfig;
use crate::record::{FieldValue, RecordSlice};
use crate::render::ATTN_SUM_TOLERANCE;
use crate::style::{color_text, color_vector};

/// Switch weight below which a query source's breakdown is elided.
pub const ATTN_THRESHOLD: f32 = 0.2;

/// Print-side counterpart of the MAC cell.
#[derive(Debug, Clone)]
pub struct MacComponent {
    query_sources: Vec<String>,
    read_heads: usize,
}

impl MacComponent {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            query_sources: config.query_sources.clone(),
            read_heads: config.mp_read_heads,
        }
    }

    /// Print every iteration-scoped tap present in the slice.
    pub fn print_all<W: Write>(&self, slice: &RecordSlice<'_>, out: &mut W) -> Result<()> {
        let mut prefixes = vec!["mp_write_query".to_string()];
        prefixes.extend((0..self.read_heads).map(|head| format!("mp_read{head}_query")));
        for prefix in &prefixes {
            self.print_query(prefix, slice, out)?;
        }
        Ok(())
    }

    /// One query's switch attention plus the selected sources' breakdowns.
    fn print_query<W: Write>(
        &self,
        prefix: &str,
        slice: &RecordSlice<'_>,
        out: &mut W,
    ) -> Result<()> {
        let iteration = slice.iteration();
        let Some(switch) = slice.vector(&format!("{prefix}_switch_attn")) else {
            // This run's cell exports no such query; nothing to print.
            return Ok(());
        };

        writeln!(
            out,
            "{iteration}: {prefix}_switch: {}",
            color_text(&self.query_sources, switch).join(" ")
        )?;

        for (idx, source) in self.query_sources.iter().enumerate() {
            if switch.get(idx).copied().unwrap_or(0.0) <= ATTN_THRESHOLD {
                continue;
            }

            if source == "step_const" {
                let tap = format!("{prefix}_step_const_signal");
                if let Some(signal) = slice.vector(&tap) {
                    writeln!(out, "{iteration}: {tap}: {}", color_vector(signal))?;
                } else if let Some(value) = slice.whole(&tap) {
                    writeln!(out, "{iteration}: {tap}: {}", format_signal(value))?;
                }
                continue;
            }

            // What the source's attention ranges over.
            let db: Vec<String> = if source.starts_with("token") {
                match slice.whole("src") {
                    Some(FieldValue::StrList(tokens)) => tokens.clone(),
                    _ => continue,
                }
            } else if source.starts_with("prev_output") {
                (0..=iteration).map(|step| step.to_string()).collect()
            } else {
                continue;
            };

            let tap = format!("{prefix}_{source}_attn");
            let Some(scores) = slice.vector(&tap) else {
                continue;
            };
            let sum: f32 = scores.iter().sum();
            ensure!(
                (sum - 1.0).abs() <= ATTN_SUM_TOLERANCE,
                "attention does not sum to 1.0 for {tap} at iteration {iteration} (sum={sum})"
            );
            writeln!(
                out,
                "{iteration}: {tap}: {}",
                color_text(&db, scores).join(" ")
            )?;
            writeln!(
                out,
                "{iteration}: {tap}: {} Σ={sum:.3}",
                color_vector(scores)
            )?;
        }
        Ok(())
    }
}

fn format_signal(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(v) => format!("{v:.3}"),
        FieldValue::Int(v) => v.to_string(),
        FieldValue::FloatList(values) => color_vector(values),
        other => format!("{other:?}"),
    }
}
