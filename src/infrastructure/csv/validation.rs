use crate::domain::error::{AppError, Result};
use crate::domain::table::Table;
use crate::domain::test_case::{CaseType, Priority, TableSchema, COL_PRIORITY, COL_TYPE};

/// Strict validation: exact header, exact width, no blank cells and, for the
/// primary schema, `Type` / `Priority` drawn from their allowed sets.
/// Row numbers in messages are 1-based and count the header as row 1.
pub fn validate_table(table: &Table, schema: TableSchema) -> Result<()> {
    if !schema.matches_header(&table.header) {
        return Err(AppError::ValidationError(format!(
            "CSV columns do not match the required layout. Expected {:?}, received {:?}",
            schema.columns(),
            table.header
        )));
    }

    let type_idx = table.column_index(COL_TYPE);
    let priority_idx = table.column_index(COL_PRIORITY);
    let expected = table.width();

    for (offset, row) in table.rows.iter().enumerate() {
        let line = offset + 2;
        if row.len() != expected {
            return Err(AppError::ValidationError(format!(
                "Row {} has {} columns, expected {}",
                line,
                row.len(),
                expected
            )));
        }
        if row.iter().any(|cell| cell.trim().is_empty()) {
            return Err(AppError::ValidationError(format!(
                "Row {} has empty fields",
                line
            )));
        }
        if let Some(idx) = type_idx {
            if CaseType::parse(&row[idx]).is_none() {
                return Err(AppError::ValidationError(format!(
                    "Row {} has unknown Type '{}'",
                    line, row[idx]
                )));
            }
        }
        if let Some(idx) = priority_idx {
            if Priority::parse(&row[idx]).is_none() {
                return Err(AppError::ValidationError(format!(
                    "Row {} has unknown Priority '{}'",
                    line, row[idx]
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<String> {
        TableSchema::Primary
            .columns()
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    fn row(case_type: &str, priority: &str) -> Vec<String> {
        vec!["T".into(), "P".into(), "S".into(), "E".into(), case_type.into(), priority.into()]
    }

    #[test]
    fn test_valid_table_passes() {
        let table = Table::new(header(), vec![row("Funcional", "Alta"), row("Validación", "Baja")]);
        assert!(validate_table(&table, TableSchema::Primary).is_ok());
    }

    #[test]
    fn test_header_mismatch() {
        let mut head = header();
        head.swap(0, 1);
        let table = Table::new(head, vec![]);
        let err = validate_table(&table, TableSchema::Primary).unwrap_err();
        assert!(err.to_string().contains("do not match"));
    }

    #[test]
    fn test_empty_cell_reports_row_number() {
        let mut bad = row("Funcional", "Alta");
        bad[2] = "  ".into();
        let table = Table::new(header(), vec![row("Funcional", "Alta"), bad]);
        let err = validate_table(&table, TableSchema::Primary).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Row 3 has empty fields");
    }

    #[test]
    fn test_short_row_reports_width() {
        let mut short = row("Funcional", "Alta");
        short.pop();
        let table = Table::new(header(), vec![short]);
        let err = validate_table(&table, TableSchema::Primary).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Row 2 has 5 columns, expected 6"
        );
    }

    #[test]
    fn test_unknown_priority() {
        let table = Table::new(header(), vec![row("Funcional", "Urgente")]);
        let err = validate_table(&table, TableSchema::Primary).unwrap_err();
        assert!(err.to_string().contains("Priority 'Urgente'"));
    }

    #[test]
    fn test_suggestion_schema_ignores_type_and_priority() {
        let head: Vec<String> = TableSchema::Suggestion
            .columns()
            .iter()
            .map(|c| c.to_string())
            .collect();
        let table = Table::new(head, vec![vec!["T".into(), "P".into(), "S".into(), "E".into()]]);
        assert!(validate_table(&table, TableSchema::Suggestion).is_ok());
    }
}
