// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Fence stripping, quote repair, strict filtering, loading and field
// normalization for generated CSV

mod csv_parser;
mod fields;
mod markdown;
mod repair;
mod validation;

pub use csv_parser::{filter_rows_strict, load_strict_table, load_table, write_rows, CsvParser};
pub use fields::{normalize_field, normalize_preconditions, normalize_steps, FieldKind};
pub use markdown::{extract_table_block, strip_markdown_fence};
pub use repair::requote_mismatched_rows;
pub use validation::validate_table;
