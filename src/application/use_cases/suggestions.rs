use crate::application::use_cases::pipeline::TablePipeline;
use crate::application::use_cases::prompts::{
    improvement_tips_prompt, scenarios_context_csv, suggested_scenarios_prompt,
};
use crate::domain::error::{AppError, Result};
use crate::domain::session::{HistoryEntry, WorkspaceSession};
use crate::domain::test_case::TestCaseRow;
use crate::infrastructure::llm_clients::TextGenerator;
use crate::infrastructure::response::{clean_generated_text, split_list_items};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

pub const ORIGIN_SUGGESTIONS: &str = "Sugerencias";

pub struct SuggestionUseCase {
    generator: Arc<dyn TextGenerator + Send + Sync>,
}

impl SuggestionUseCase {
    pub fn new(generator: Arc<dyn TextGenerator + Send + Sync>) -> Self {
        Self { generator }
    }

    /// Advice on how to improve the functional text, one item per line.
    pub async fn improvement_tips(&self, session: &mut WorkspaceSession) -> Result<Vec<String>> {
        let input = session.combined_input();
        if input.is_empty() {
            return Err(AppError::ValidationError(
                "Ingresa el texto funcional primero".to_string(),
            ));
        }

        let reply = self.generator.generate(&improvement_tips_prompt(&input)).await?;
        let tips = split_list_items(&reply);
        session.improvement_tips = tips.clone();

        info!(tips = tips.len(), "Improvement tips generated");
        Ok(tips)
    }

    /// Complementary scenarios for the current table. They are kept apart
    /// until the user applies them.
    pub async fn suggest_scenarios(
        &self,
        session: &mut WorkspaceSession,
    ) -> Result<Vec<TestCaseRow>> {
        let current = match session.editable.as_deref() {
            Some(rows) if !rows.is_empty() => rows,
            _ => {
                return Err(AppError::ValidationError(
                    "No hay escenarios generados aún".to_string(),
                ))
            }
        };
        let context = scenarios_context_csv(current)?;

        let reply = self
            .generator
            .generate(&suggested_scenarios_prompt(&context))
            .await?;
        let raw = clean_generated_text(&reply);
        session.last_raw_response = Some(raw.clone());

        let suggestions = TablePipeline::parse_suggestions(&raw)?;
        session.suggestions = Some(suggestions.clone());

        info!(suggestions = suggestions.len(), "Scenario suggestions generated");
        Ok(suggestions)
    }
}

/// Appends the selected suggestions (by index) to the editable rows, skipping
/// titles that are already present. Returns the rows actually added.
pub fn apply_suggestions(
    session: &mut WorkspaceSession,
    selected: &[usize],
) -> Result<Vec<TestCaseRow>> {
    if selected.is_empty() {
        return Err(AppError::ValidationError(
            "Selecciona al menos una sugerencia".to_string(),
        ));
    }
    let suggestions = session
        .suggestions
        .as_ref()
        .ok_or_else(|| AppError::NotFound("No hay sugerencias generadas".to_string()))?;
    if let Some(bad) = selected.iter().find(|&&idx| idx >= suggestions.len()) {
        return Err(AppError::ValidationError(format!(
            "Sugerencia {} fuera de rango",
            bad
        )));
    }

    let current = session.editable.get_or_insert_with(Vec::new);
    let mut titles: HashSet<String> = current.iter().map(|r| r.title.trim().to_string()).collect();

    let mut added = Vec::new();
    for &idx in selected {
        let candidate = &suggestions[idx];
        if titles.insert(candidate.title.trim().to_string()) {
            added.push(candidate.clone());
        }
    }

    if added.is_empty() {
        info!("Selected suggestions were already applied");
        return Ok(added);
    }

    current.extend(added.iter().cloned());
    session.generated = true;
    session
        .history
        .push(HistoryEntry::new(ORIGIN_SUGGESTIONS, None, added.clone()));

    info!(added = added.len(), "Suggestions applied");
    Ok(added)
}
