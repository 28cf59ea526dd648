// ============================================================
// FENCE STRIPPING
// ============================================================
// Pull the delimited block out of a generated reply that may be wrapped in
// prose and Markdown code fences

use tracing::debug;

use crate::domain::test_case::TableSchema;

const CSV_FENCE: &str = "```csv";
const FENCE: &str = "```";

/// Returns the delimited block of a generated reply, or an empty string when
/// the remaining text has no comma at all.
///
/// With a "```csv" opener only the text between it and the next fence is kept.
/// Without it, everything before the first bare fence is kept.
pub fn strip_markdown_fence(text: &str) -> String {
    let after_opener = match text.find(CSV_FENCE) {
        Some(pos) => &text[pos + CSV_FENCE.len()..],
        None => text,
    };

    let body = match after_opener.find(FENCE) {
        Some(pos) => &after_opener[..pos],
        None => after_opener,
    };

    let body = body.trim();
    if !body.contains(',') {
        debug!("No delimiter left after fence stripping");
        return String::new();
    }

    body.to_string()
}

/// Drops prose lines that come before the header row. The header row is the
/// first line mentioning every expected column name. When no such line
/// exists the block is returned unchanged and header validation decides.
pub fn extract_table_block(block: &str, schema: TableSchema) -> String {
    let lines: Vec<&str> = block.lines().collect();
    let header_at = lines
        .iter()
        .position(|line| schema.columns().iter().all(|col| line.contains(col)));

    match header_at {
        Some(0) | None => block.to_string(),
        Some(idx) => {
            debug!(skipped = idx, "Skipping prose before the table header");
            lines[idx..].join("\n")
        }
    }
}
