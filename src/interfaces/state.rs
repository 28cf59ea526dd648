use crate::application::use_cases::export::ExportUseCase;
use crate::application::use_cases::scenario_generation::ScenarioGenerationUseCase;
use crate::application::use_cases::suggestions::SuggestionUseCase;
use crate::domain::session::WorkspaceSession;
use crate::infrastructure::llm_clients::TextGenerator;
use crate::infrastructure::testrail::TestRailClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;

/// Everything a request needs: the use cases and the single workspace
/// session. The session lock is held for the whole request, remote calls
/// included, so requests touching it run one at a time.
pub struct AppState {
    pub scenario_generation_use_case: ScenarioGenerationUseCase,
    pub suggestion_use_case: SuggestionUseCase,
    pub export_use_case: ExportUseCase,
    pub attachments_max_chars: usize,
    pub session: AsyncMutex<WorkspaceSession>,
}

impl AppState {
    pub fn new(
        generator: Arc<dyn TextGenerator + Send + Sync>,
        testrail: Arc<TestRailClient>,
        refine_attempts: u32,
        refine_retry_delay: Duration,
        attachments_max_chars: usize,
    ) -> Self {
        Self {
            scenario_generation_use_case: ScenarioGenerationUseCase::new(
                generator.clone(),
                refine_attempts,
                refine_retry_delay,
            ),
            suggestion_use_case: SuggestionUseCase::new(generator),
            export_use_case: ExportUseCase::new(testrail),
            attachments_max_chars,
            session: AsyncMutex::new(WorkspaceSession::new()),
        }
    }
}
