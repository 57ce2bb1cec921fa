//! Rendering of classification results for stdout

use crate::cli::OutputFormat;
use emocheck_classifiers::classifier::ClassificationResult;
use std::fmt::Write;

/// Render `result` in the requested format, without a trailing newline
pub fn render(result: &ClassificationResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(result)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
    }
}

/// Blank line, the predicted label, then every label's probability in fixed order
pub fn render_text(result: &ClassificationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "Predicted: {}", result.label());
    out.push_str("Confidence:");
    for (emotion, probability) in result.prediction.distribution.iter() {
        let _ = write!(out, "\n  {}: {:.4}", emotion, probability);
    }
    out
}
