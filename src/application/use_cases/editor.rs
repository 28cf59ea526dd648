use crate::domain::error::{AppError, Result};
use crate::domain::session::WorkspaceSession;
use crate::domain::table::Table;
use crate::domain::test_case::{RowStatus, TableSchema, TestCaseRow};
use crate::infrastructure::csv::validate_table;
use tracing::debug;

/// Compares the edited rows with the originals position by position.
/// A row differing in any trimmed field, or with no original counterpart,
/// is `Modificado`; the rest are `Sin cambios`.
pub fn mark_changes(original: &[TestCaseRow], edited: Vec<TestCaseRow>) -> Vec<TestCaseRow> {
    edited
        .into_iter()
        .enumerate()
        .map(|(idx, mut row)| {
            let unchanged = original
                .get(idx)
                .map(|before| before.same_content(&row))
                .unwrap_or(false);
            row.status = if unchanged {
                RowStatus::Unchanged
            } else {
                RowStatus::Modified
            };
            row
        })
        .collect()
}

/// Replaces the editable rows with the user's edits, marking what changed.
pub fn save_edits(
    session: &mut WorkspaceSession,
    edited: Vec<TestCaseRow>,
) -> Result<Vec<TestCaseRow>> {
    let original = session
        .editable
        .as_deref()
        .ok_or_else(|| AppError::NotFound("No hay escenarios para editar".to_string()))?;

    let marked = mark_changes(original, edited);
    let modified = marked
        .iter()
        .filter(|row| row.status == RowStatus::Modified)
        .count();
    debug!(rows = marked.len(), modified, "Edits saved");

    session.editable = Some(marked.clone());
    Ok(marked)
}

/// Strict validation of the current rows against the primary schema.
pub fn validate_current(session: &WorkspaceSession) -> Result<usize> {
    let rows = session
        .editable
        .as_deref()
        .ok_or_else(|| AppError::NotFound("No hay escenarios generados".to_string()))?;
    validate_table(&Table::from_cases(rows), TableSchema::Primary)?;
    Ok(rows.len())
}
