// ============================================================
// CSV PARSER
// ============================================================
// Quote-aware tokenization of generated CSV plus the two row filters:
// the strict (lossy) filter and the permissive table loader

use std::borrow::Cow;

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use tracing::{debug, warn};

use crate::domain::error::{AppError, Result};
use crate::domain::table::Table;

/// Tokenizer over comma-delimited, double-quoted text.
#[derive(Debug, Clone)]
pub struct CsvParser {
    /// Delimiter character (default: comma)
    delimiter: u8,

    /// Ignore spaces at the start of every field, the first one of a record
    /// included, so `a, "b,c"` keeps `b,c` together. Tabs are kept.
    skip_initial_space: bool,

    /// Accept `\"` inside a quoted field as an escaped quote
    backslash_escape: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            skip_initial_space: false,
            backslash_escape: false,
        }
    }
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip_initial_space(mut self, skip: bool) -> Self {
        self.skip_initial_space = skip;
        self
    }

    pub fn with_backslash_escape(mut self, enabled: bool) -> Self {
        self.backslash_escape = enabled;
        self
    }

    /// Tokenizer used by the strict filter and the quote-repair pass.
    pub fn lenient() -> Self {
        Self::new().with_skip_initial_space(true)
    }

    /// Tokenizer used by the permissive loader.
    pub fn permissive() -> Self {
        Self::new().with_backslash_escape(true)
    }

    /// Parse every record in `content`. A quoted field may span several lines.
    /// Blank lines produce no record.
    pub fn records(&self, content: &str) -> Vec<Vec<String>> {
        let prepared = self.prepare(content);
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(prepared.as_bytes());

        let mut records = Vec::new();
        for (index, result) in reader.records().enumerate() {
            match result {
                Ok(record) => records.push(record.iter().map(str::to_string).collect()),
                Err(err) => debug!(record = index, error = %err, "Skipping unreadable CSV record"),
            }
        }
        records
    }

    /// Fields of the first record in `line`; empty when the line is blank.
    pub fn split_line(&self, line: &str) -> Vec<String> {
        self.records(line).into_iter().next().unwrap_or_default()
    }

    /// Rewrites the input so the csv reader sees the dialect it supports:
    /// leading spaces of a field dropped, `\"` inside quotes turned into `""`.
    fn prepare<'a>(&self, content: &'a str) -> Cow<'a, str> {
        if !self.skip_initial_space && !self.backslash_escape {
            return Cow::Borrowed(content);
        }

        let delimiter = self.delimiter as char;
        let mut out = String::with_capacity(content.len());
        let mut in_quotes = false;
        let mut field_start = true;
        let mut chars = content.chars().peekable();

        while let Some(c) = chars.next() {
            if in_quotes {
                match c {
                    '\\' if self.backslash_escape && chars.peek() == Some(&'"') => {
                        chars.next();
                        out.push_str("\"\"");
                    }
                    '"' if chars.peek() == Some(&'"') => {
                        chars.next();
                        out.push_str("\"\"");
                    }
                    '"' => {
                        in_quotes = false;
                        out.push(c);
                    }
                    _ => out.push(c),
                }
                continue;
            }

            if field_start && self.skip_initial_space && c == ' ' {
                continue;
            }

            if c == delimiter {
                field_start = true;
            } else if c == '\n' || c == '\r' {
                field_start = true;
            } else if c == '"' && field_start {
                in_quotes = true;
                field_start = false;
            } else {
                field_start = false;
            }
            out.push(c);
        }

        Cow::Owned(out)
    }
}

/// Serialize rows with every field quoted and `\n` terminators.
pub fn write_all_quoted(rows: &[Vec<String>]) -> Result<String> {
    write_with_style(rows, QuoteStyle::Always)
}

/// Serialize rows quoting only the fields that need it.
pub fn write_rows(rows: &[Vec<String>]) -> Result<String> {
    write_with_style(rows, QuoteStyle::Necessary)
}

fn write_with_style(rows: &[Vec<String>], style: QuoteStyle) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(style)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush CSV writer: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV output is not UTF-8: {}", e)))
}

/// Keeps only records with exactly `columns` fields, flattens line breaks
/// inside fields and trims them.
///
/// Rows with any other field count are dropped, including rows that only miss
/// a trailing optional field. The generated text can be regenerated and a
/// human reviews the result, so a predictable lossy policy is preferred over
/// guessing where the missing field belongs.
fn strict_records(block: &str, columns: usize) -> Result<Vec<Vec<String>>> {
    let records = CsvParser::lenient().records(block.trim());
    let total = records.len();

    let kept: Vec<Vec<String>> = records
        .into_iter()
        .filter(|fields| fields.len() == columns)
        .map(|fields| {
            fields
                .into_iter()
                .map(|field| field.replace(['\r', '\n'], " ").trim().to_string())
                .collect()
        })
        .collect();

    if kept.is_empty() {
        warn!(records = total, columns, "Strict filter dropped every row");
        return Err(AppError::EmptyOrInvalidTable(format!(
            "no row with exactly {} columns",
            columns
        )));
    }

    if kept.len() < total {
        debug!(
            dropped = total - kept.len(),
            kept = kept.len(),
            columns,
            "Strict filter dropped rows with a mismatched field count"
        );
    }

    Ok(kept)
}

/// [`strict_records`] re-serialized force-quoted with `\n` terminators.
pub fn filter_rows_strict(block: &str, columns: usize) -> Result<String> {
    write_all_quoted(&strict_records(block, columns)?)
}

/// Builds a table from every record with exactly `columns` fields: the first
/// surviving record is the header, the rest are data rows in original order.
/// Accepts `\"` as an escaped quote.
pub fn load_table(block: &str, columns: usize) -> Result<Table> {
    table_from_records(CsvParser::permissive().records(block), columns)
}

/// Loads the output of [`filter_rows_strict`]. It is read back in the plain
/// dialect it was written in, so a field ending in a backslash keeps its
/// closing quote.
pub fn load_strict_table(filtered: &str, columns: usize) -> Result<Table> {
    table_from_records(CsvParser::new().records(filtered), columns)
}

fn table_from_records(records: Vec<Vec<String>>, columns: usize) -> Result<Table> {
    let total = records.len();
    let mut surviving = records
        .into_iter()
        .filter(|fields| fields.len() == columns);

    let header = surviving.next().ok_or_else(|| {
        AppError::EmptyOrInvalidTable(format!("CSV has no row with {} columns", columns))
    })?;
    let rows: Vec<Vec<String>> = surviving.collect();

    if rows.len() + 1 < total {
        warn!(
            dropped = total - rows.len() - 1,
            columns,
            "Loader skipped records with a mismatched field count"
        );
    }
    debug!(columns, rows = rows.len(), "Loaded table");
    Ok(Table::new(header, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_line_respects_quotes() {
        let fields = CsvParser::new().split_line("a,\"b,c\",d");
        assert_eq!(fields, vec!["a", "b,c", "d"]);
    }

    #[test]
    fn test_split_blank_line_is_empty() {
        assert!(CsvParser::new().split_line("").is_empty());
    }

    #[test]
    fn test_skip_initial_space_keeps_quoted_commas() {
        let plain = CsvParser::new().split_line("a, \"b,c\"");
        assert_eq!(plain.len(), 3);

        let lenient = CsvParser::lenient().split_line("a, \"b,c\"");
        assert_eq!(lenient, vec!["a", "b,c"]);
    }

    #[test]
    fn test_skip_initial_space_at_record_start() {
        let fields = CsvParser::lenient().split_line("  \"a,b\",c");
        assert_eq!(fields, vec!["a,b", "c"]);

        let records = CsvParser::lenient().records("x,y\n  \"1,2\", 3");
        assert_eq!(records[1], vec!["1,2", "3"]);
    }

    #[test]
    fn test_skip_initial_space_keeps_tabs() {
        let fields = CsvParser::lenient().split_line("a,\tb");
        assert_eq!(fields, vec!["a", "\tb"]);
    }

    #[test]
    fn test_backslash_escaped_quote() {
        let fields = CsvParser::permissive().split_line(r#""say \"hi\"",x"#);
        assert_eq!(fields, vec!["say \"hi\"", "x"]);
    }

    #[test]
    fn test_backslash_n_is_left_for_the_field_normalizer() {
        let fields = CsvParser::permissive().split_line(r#""1. Open\n2. Click",x"#);
        assert_eq!(fields[0], r"1. Open\n2. Click");
    }

    #[test]
    fn test_strict_filter_keeps_only_exact_counts() {
        let block = "A,B,C\n1,2,3\n4,5\n6,7,8,9\n\"x, y\",z,w";
        let out = filter_rows_strict(block, 3).unwrap();
        let rows = CsvParser::new().records(&out);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.len() == 3));
        assert_eq!(rows[2], vec!["x, y", "z", "w"]);
        assert!(out.starts_with("\"A\",\"B\",\"C\"\n"));
    }

    #[test]
    fn test_strict_filter_flattens_multiline_fields() {
        let block = "Title,Steps\n\"Login\",\"1. Open\n2. Submit \"";
        let out = filter_rows_strict(block, 2).unwrap();
        assert_eq!(out, "\"Title\",\"Steps\"\n\"Login\",\"1. Open 2. Submit\"\n");
    }

    #[test]
    fn test_strict_filter_fails_when_nothing_survives() {
        let err = filter_rows_strict("a,b\nc,d", 6).unwrap_err();
        assert!(matches!(err, AppError::EmptyOrInvalidTable(_)));
    }

    #[test]
    fn test_load_table_splits_header_and_data() {
        let block = "noise line\nT,P,S,E\nonly,two\nt1,p1,s1,e1\nextra,a,b,c,d\nt2,p2,s2,e2";
        let table = load_table(block, 4).unwrap();
        assert_eq!(table.header, vec!["T", "P", "S", "E"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], "t1");
        assert_eq!(table.rows[1][0], "t2");
    }

    #[test]
    fn test_strict_output_loads_field_ending_in_backslash() {
        let out = filter_rows_strict("T,P\n\"C:\\\",x\ny,z", 2).unwrap();
        let table = load_strict_table(&out, 2).unwrap();
        assert_eq!(table.rows, vec![vec!["C:\\", "x"], vec!["y", "z"]]);
    }

    #[test]
    fn test_load_table_without_matching_rows() {
        let err = load_table("a,b\nc", 4).unwrap_err();
        assert!(matches!(err, AppError::EmptyOrInvalidTable(_)));
    }
}
