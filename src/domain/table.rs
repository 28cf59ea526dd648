// ============================================================
// TABLE
// ============================================================
// Header + data rows produced by the CSV loader

use serde::{Deserialize, Serialize};

use super::test_case::{TableSchema, TestCaseRow};

/// A parsed table. Every row has the same number of fields as the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    /// Primary-schema table built from edited rows, in row order.
    pub fn from_cases(cases: &[TestCaseRow]) -> Self {
        let header = TableSchema::Primary
            .columns()
            .iter()
            .map(|c| c.to_string())
            .collect();
        let rows = cases
            .iter()
            .map(|case| case.fields().iter().map(|f| f.to_string()).collect())
            .collect();
        Self::new(header, rows)
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a header name, compared after trimming.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h.trim() == name)
    }

    /// Cell value by row index and column name, or an empty string when the
    /// column does not exist.
    pub fn cell<'a>(&'a self, row: usize, column: &str) -> &'a str {
        self.column_index(column)
            .and_then(|idx| self.rows.get(row).and_then(|r| r.get(idx)))
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            vec!["Title".into(), "Steps".into()],
            vec![vec!["Login".into(), "1. Open".into()]],
        )
    }

    #[test]
    fn test_cell_lookup() {
        let table = sample();
        assert_eq!(table.cell(0, "Title"), "Login");
        assert_eq!(table.cell(0, "Priority"), "");
        assert_eq!(table.cell(3, "Title"), "");
        assert_eq!(table.width(), 2);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_from_cases_uses_primary_header() {
        let case = TestCaseRow {
            title: "Login".into(),
            preconditions: "1. App".into(),
            steps: "1. Open".into(),
            expected_result: "Ok".into(),
            case_type: "Funcional".into(),
            priority: "Alta".into(),
            status: Default::default(),
        };
        let table = Table::from_cases(&[case]);
        assert_eq!(table.width(), 6);
        assert_eq!(table.cell(0, "Expected Result"), "Ok");
        assert_eq!(table.cell(0, "Priority"), "Alta");
    }
}
