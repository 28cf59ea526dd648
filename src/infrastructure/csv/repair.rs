// ============================================================
// QUOTE REPAIR
// ============================================================
// Best-effort pass run before the strict filter. It never drops a line and
// does not promise the right field count afterwards.

use tracing::debug;

use super::csv_parser::CsvParser;

/// Re-quotes every line whose field count differs from `columns`: each field
/// not already starting with a double quote is wrapped in quotes, and the
/// fields are re-joined with commas. Lines that already have `columns` fields
/// are returned untouched.
pub fn requote_mismatched_rows(block: &str, columns: usize) -> String {
    let parser = CsvParser::lenient();
    let mut repaired = 0usize;

    let lines: Vec<String> = logical_lines(block.trim())
        .into_iter()
        .map(|line| {
            let fields = parser.split_line(&line);
            if fields.len() == columns {
                return line;
            }
            repaired += 1;
            fields
                .iter()
                .map(|field| {
                    let trimmed = field.trim();
                    if trimmed.starts_with('"') {
                        field.clone()
                    } else {
                        format!("\"{}\"", trimmed)
                    }
                })
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect();

    if repaired > 0 {
        debug!(repaired, columns, "Re-quoted rows with a mismatched field count");
    }

    lines.join("\n")
}

/// Splits on line breaks, except that a quoted field opened on one line and
/// closed on a later one keeps those lines together. A quote that is never
/// closed leaves the remaining lines split as-is.
fn logical_lines(block: &str) -> Vec<String> {
    let physical: Vec<&str> = block.split('\n').collect();
    let mut out = Vec::with_capacity(physical.len());
    let mut idx = 0;

    while idx < physical.len() {
        let mut quotes = physical[idx].matches('"').count();
        if quotes % 2 == 0 {
            out.push(physical[idx].to_string());
            idx += 1;
            continue;
        }

        let mut end = idx + 1;
        while end < physical.len() {
            quotes += physical[end].matches('"').count();
            if quotes % 2 == 0 {
                break;
            }
            end += 1;
        }

        if end < physical.len() {
            out.push(physical[idx..=end].join("\n"));
            idx = end + 1;
        } else {
            out.push(physical[idx].to_string());
            idx += 1;
        }
    }

    out
}
