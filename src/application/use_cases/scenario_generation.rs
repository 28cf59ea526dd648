use crate::application::use_cases::pipeline::TablePipeline;
use crate::application::use_cases::prompts::{refine_description_prompt, scenarios_prompt};
use crate::domain::error::{AppError, Result};
use crate::domain::session::{HistoryEntry, WorkspaceSession};
use crate::domain::test_case::TestCaseRow;
use crate::infrastructure::llm_clients::TextGenerator;
use crate::infrastructure::response::clean_generated_text;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const ORIGIN_INITIAL: &str = "Generación inicial";
pub const ORIGIN_INITIAL_WITH_ATTACHMENTS: &str = "Generación inicial (con adjuntos)";

pub struct ScenarioGenerationUseCase {
    generator: Arc<dyn TextGenerator + Send + Sync>,
    refine_attempts: u32,
    refine_retry_delay: Duration,
}

impl ScenarioGenerationUseCase {
    pub fn new(
        generator: Arc<dyn TextGenerator + Send + Sync>,
        refine_attempts: u32,
        refine_retry_delay: Duration,
    ) -> Self {
        Self {
            generator,
            refine_attempts: refine_attempts.max(1),
            refine_retry_delay,
        }
    }

    /// Restructures the functional text into Módulo / Función / Detalle.
    /// An empty reply is retried up to `refine_attempts` times.
    pub async fn refine_description(&self, functional_text: &str) -> Result<String> {
        let prompt = refine_description_prompt(functional_text);

        for attempt in 1..=self.refine_attempts {
            let reply = self.generator.generate(&prompt).await?;
            let refined = clean_generated_text(&reply);
            if !refined.is_empty() {
                return Ok(refined);
            }

            warn!(attempt, "Empty refined description");
            if attempt < self.refine_attempts {
                tokio::time::sleep(self.refine_retry_delay).await;
            }
        }

        Err(AppError::LLMError(format!(
            "No refined description after {} attempts",
            self.refine_attempts
        )))
    }

    /// Refines the session input, generates the primary table and stores it
    /// as the editable rows. On a bad table the raw reply stays in the
    /// session for diagnosis and the editable rows are cleared.
    pub async fn execute(&self, session: &mut WorkspaceSession) -> Result<Vec<TestCaseRow>> {
        let input = session.combined_input();
        if input.is_empty() {
            return Err(AppError::ValidationError(
                "Ingresa el texto funcional o adjunta archivos primero".to_string(),
            ));
        }
        let with_attachments = session.has_attachments();
        session.last_raw_response = None;

        let refined = self.refine_description(&input).await?;
        session.refined_description = refined.clone();

        let reply = self.generator.generate(&scenarios_prompt(&refined)).await?;
        let raw = clean_generated_text(&reply);
        session.last_raw_response = Some(raw.clone());

        let rows = match TablePipeline::parse_primary(&raw) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Generated table rejected");
                session.clear_generation();
                return Err(e);
            }
        };

        session.editable = Some(rows.clone());
        session.generated = true;
        let origin = if with_attachments {
            ORIGIN_INITIAL_WITH_ATTACHMENTS
        } else {
            ORIGIN_INITIAL
        };
        session
            .history
            .push(HistoryEntry::new(origin, Some(refined), rows.clone()));

        info!(rows = rows.len(), origin, "Scenarios generated");
        Ok(rows)
    }
}
