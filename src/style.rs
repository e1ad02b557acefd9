//! Terminal styling for attention read-outs.
//!
//! Attention weights map onto a small fixed palette: the heavier the
//! weight, the more saturated the color. The exact palette is cosmetic;
//! the mapping is monotonic and deterministic.

use std::io::{self, Write};

use colored::{ColoredString, Colorize};

/// Palette thresholds, highest first. Index = saturation rank.
const PALETTE_STEPS: [f32; 4] = [0.67, 0.4, 0.2, 0.05];

/// Saturation rank for a weight: 0 = barely attended, 4 = dominant.
fn palette_rank(weight: f32) -> usize {
    PALETTE_STEPS
        .iter()
        .position(|&step| weight >= step)
        .map_or(0, |idx| PALETTE_STEPS.len() - idx)
}

/// Color one label by its attention weight.
pub fn weight_color(text: &str, weight: f32) -> ColoredString {
    match palette_rank(weight) {
        4 => text.red().bold(),
        3 => text.red(),
        2 => text.yellow(),
        1 => text.normal(),
        _ => text.dimmed(),
    }
}

/// Render each label colored by its paired weight.
pub fn color_text<S: AsRef<str>>(labels: &[S], weights: &[f32]) -> Vec<String> {
    labels
        .iter()
        .zip(weights)
        .map(|(label, &weight)| weight_color(label.as_ref(), weight).to_string())
        .collect()
}

/// Render a bare weight vector, each entry colored by its own magnitude.
pub fn color_vector(weights: &[f32]) -> String {
    weights
        .iter()
        .map(|&weight| weight_color(&format!("{weight:.2}"), weight).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Section rule with a title.
pub fn hr_text<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    writeln!(out, "--------- {text} ---------")
}

/// Plain section rule.
pub fn hr<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "-".repeat(40))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_rank_is_monotonic() {
        let mut previous = 0;
        for step in 0..=100 {
            let weight = step as f32 / 100.0;
            let rank = palette_rank(weight);
            assert!(rank >= previous, "rank regressed at weight {weight}");
            previous = rank;
        }
        assert_eq!(palette_rank(0.0), 0);
        assert_eq!(palette_rank(1.0), 4);
    }

    #[test]
    fn test_weight_color_is_deterministic() {
        colored::control::set_override(false);
        let a = weight_color("york", 0.8).to_string();
        let b = weight_color("york", 0.8).to_string();
        assert_eq!(a, b);
        assert_eq!(palette_rank(0.8), palette_rank(0.8));
    }

    #[test]
    fn test_color_text_pairs_labels_and_weights() {
        colored::control::set_override(false);
        let rendered = color_text(&["york", "kings", "angel"], &[0.9, 0.05, 0.05]);
        assert_eq!(rendered, vec!["york", "kings", "angel"]);
    }

    #[test]
    fn test_color_vector_formats_weights() {
        colored::control::set_override(false);
        assert_eq!(color_vector(&[0.25, 0.75]), "0.25 0.75");
    }
}
