use eyre::Result;

use crate::AggregateResult;

/// Render the combined transcript as plain text
pub fn render_text(result: &AggregateResult) -> String {
    result.combined.clone()
}

/// Render the full result in the same shape the messaging endpoint sends
pub fn render_json(result: &AggregateResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}
