use crate::domain::error::{AppError, Result};
use crate::domain::export::{
    ExportCase, ExportReport, RowFailure, TestRailProject, TestRailSection, TestRailSuite,
    UploadConfirmation,
};
use crate::domain::session::WorkspaceSession;
use crate::domain::test_case::TestCaseRow;
use crate::infrastructure::testrail::TestRailClient;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

const UNTITLED: &str = "Caso sin título";
const FALLBACK_ORACLE: &str = "Regla: validar mensaje y bloqueo en ausencia de dato requerido.";

static FIELD_MENTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(campo|nombre)\s*['“"]?([^'”"]+)['”"]?"#).unwrap()
});

static MANDATORY_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"obligatori|requerid").unwrap());

/// Short acceptance rule sent as `custom_case_oracle`. Never equal to the
/// expected result.
pub fn synthesize_oracle(title: &str, steps: &str, expected: &str) -> String {
    let expected = expected.trim();
    let expected_lower = expected.to_lowercase();

    let oracle = if MANDATORY_PATTERN.is_match(&expected_lower)
        || expected_lower.contains("no se envía")
    {
        let title_lower = title.trim().to_lowercase();
        let steps_lower = steps.trim().to_lowercase();
        let field = FIELD_MENTION_PATTERN
            .captures(&title_lower)
            .or_else(|| FIELD_MENTION_PATTERN.captures(&steps_lower))
            .and_then(|caps| caps.get(2))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "el campo requerido".to_string());
        format!(
            "Regla: si falta {}, el formulario debe bloquear el envío y mostrar validación.",
            field
        )
    } else {
        format!(
            "Regla: {} cumple condición de aceptación sin persistir datos inválidos.",
            title.trim()
        )
    };

    if oracle.trim().to_lowercase() == expected_lower {
        FALLBACK_ORACLE.to_string()
    } else {
        oracle
    }
}

fn or_default(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn to_export_case(row: &TestCaseRow) -> ExportCase {
    let title = or_default(&row.title, UNTITLED);
    let steps = row.steps.trim().to_string();
    let expected = row.expected_result.trim().to_string();
    let oracle = synthesize_oracle(&title, &steps, &expected);

    ExportCase {
        custom_preconds: row.preconditions.trim().to_string(),
        custom_type: or_default(&row.case_type, TestCaseRow::DEFAULT_TYPE),
        custom_priority: or_default(&row.priority, TestCaseRow::DEFAULT_PRIORITY),
        custom_case_oracle: oracle,
        custom_steps: steps,
        custom_expected: expected,
        title,
    }
}

/// Target picked by the user before the two-step upload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadTarget {
    #[validate(length(min = 1))]
    pub project: String,
    #[validate(length(min = 1))]
    pub suite: String,
    #[validate(length(min = 1))]
    pub section: String,
    #[validate(range(min = 1))]
    pub section_id: i64,
}

pub struct ExportUseCase {
    testrail: Arc<TestRailClient>,
}

impl ExportUseCase {
    pub fn new(testrail: Arc<TestRailClient>) -> Self {
        Self { testrail }
    }

    pub async fn list_projects(&self) -> Result<Vec<TestRailProject>> {
        self.testrail.get_projects().await
    }

    pub async fn list_suites(&self, project_id: i64) -> Result<Vec<TestRailSuite>> {
        self.testrail.get_suites(project_id).await
    }

    pub async fn list_sections(&self, project_id: i64, suite_id: i64) -> Result<Vec<TestRailSection>> {
        self.testrail.get_sections(project_id, suite_id).await
    }

    /// Uploads every row, one request each. A rejected row does not stop the
    /// others and accepted rows are never rolled back. Row numbers in the
    /// report are 1-based.
    pub async fn export(&self, section_id: i64, rows: &[TestCaseRow]) -> Result<ExportReport> {
        let mut report = ExportReport {
            uploaded: 0,
            total: rows.len(),
            failures: Vec::new(),
        };

        for (idx, row) in rows.iter().enumerate() {
            let case = to_export_case(row);
            match self.testrail.add_case(section_id, &case).await {
                Ok(()) => report.uploaded += 1,
                Err(e) => {
                    let detail = match e {
                        AppError::UpstreamHttp { status, body } => format!("{} - {}", status, body),
                        other => other.to_string(),
                    };
                    warn!(row = idx + 1, title = %case.title, %detail, "Case rejected");
                    report.failures.push(RowFailure {
                        row: idx + 1,
                        title: case.title,
                        detail,
                    });
                }
            }
        }

        info!(
            uploaded = report.uploaded,
            total = report.total,
            section_id,
            "Export finished"
        );

        if report.is_complete() {
            Ok(report)
        } else {
            Err(AppError::ExportPartialFailure(report))
        }
    }

    /// First step: remember the target and how many rows would go.
    pub fn prepare(
        &self,
        session: &mut WorkspaceSession,
        target: UploadTarget,
    ) -> Result<UploadConfirmation> {
        target
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        let total = match session.editable.as_deref() {
            Some(rows) if !rows.is_empty() => rows.len(),
            _ => {
                return Err(AppError::ValidationError(
                    "No hay escenarios para subir".to_string(),
                ))
            }
        };

        let confirmation = UploadConfirmation {
            project: target.project,
            suite: target.suite,
            section: target.section,
            section_id: target.section_id,
            total,
        };
        session.pending_upload = Some(confirmation.clone());
        Ok(confirmation)
    }

    /// Second step: upload the current rows to the prepared section. The
    /// pending confirmation is consumed whatever the outcome.
    pub async fn confirm(&self, session: &mut WorkspaceSession) -> Result<ExportReport> {
        let pending = session
            .pending_upload
            .take()
            .ok_or_else(|| AppError::NotFound("No hay una subida pendiente".to_string()))?;
        let rows = session.editable.clone().unwrap_or_default();

        self.export(pending.section_id, &rows).await
    }

    pub fn cancel(&self, session: &mut WorkspaceSession) -> bool {
        session.pending_upload.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm_config::TestRailConfig;
    use crate::domain::test_case::RowStatus;
    use crate::infrastructure::http_transport::fakes::ScriptedTransport;

    fn row(title: &str, expected: &str) -> TestCaseRow {
        TestCaseRow {
            title: title.to_string(),
            preconditions: "1. App".to_string(),
            steps: "1. Abrir".to_string(),
            expected_result: expected.to_string(),
            case_type: "Funcional".to_string(),
            priority: "Alta".to_string(),
            status: RowStatus::Pending,
        }
    }

    fn use_case(transport: Arc<ScriptedTransport>) -> ExportUseCase {
        let config = TestRailConfig {
            base_url: "https://acme.testrail.io".to_string(),
            user: "qa".to_string(),
            ..TestRailConfig::default()
        };
        ExportUseCase::new(Arc::new(TestRailClient::new(&config, "k".to_string(), transport)))
    }

    fn target() -> UploadTarget {
        UploadTarget {
            project: "Web".to_string(),
            suite: "Master".to_string(),
            section: "Login".to_string(),
            section_id: 12,
        }
    }

    #[test]
    fn test_oracle_for_mandatory_field() {
        let oracle = synthesize_oracle(
            "Validar campo usuario vacío",
            "1. Dejar vacío",
            "El sistema indica que el campo es obligatorio",
        );
        assert_eq!(
            oracle,
            "Regla: si falta usuario vacío, el formulario debe bloquear el envío y mostrar validación."
        );
    }

    #[test]
    fn test_oracle_default_field_name() {
        let oracle = synthesize_oracle("Registro incompleto", "1. Enviar", "El formulario no se envía");
        assert!(oracle.contains("si falta el campo requerido"));
    }

    #[test]
    fn test_oracle_general_rule() {
        assert_eq!(
            synthesize_oracle("Login válido", "1. Entrar", "Acceso concedido"),
            "Regla: Login válido cumple condición de aceptación sin persistir datos inválidos."
        );
    }

    #[test]
    fn test_oracle_never_repeats_expected() {
        let expected = "Regla: Login cumple condición de aceptación sin persistir datos inválidos.";
        assert_eq!(synthesize_oracle("Login", "", expected), FALLBACK_ORACLE);
    }

    #[test]
    fn test_export_case_defaults() {
        let mut blank = row("  ", "Ok");
        blank.case_type = String::new();
        blank.priority = " ".to_string();

        let case = to_export_case(&blank);
        assert_eq!(case.title, UNTITLED);
        assert_eq!(case.custom_type, "Funcional");
        assert_eq!(case.custom_priority, "Media");
    }

    #[tokio::test]
    async fn test_export_reports_partial_failure() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedTransport::reply(200, "{}"),
            ScriptedTransport::reply(400, "Field :custom_steps is required"),
            ScriptedTransport::reply(201, "{}"),
        ]));
        let rows = vec![row("A", "Ok"), row("B", "Ok"), row("C", "Ok")];

        let err = use_case(transport.clone()).export(12, &rows).await.unwrap_err();

        match err {
            AppError::ExportPartialFailure(report) => {
                assert_eq!(report.uploaded, 2);
                assert_eq!(report.total, 3);
                assert_eq!(report.failures.len(), 1);
                assert_eq!(report.failures[0].row, 2);
                assert_eq!(report.failures[0].title, "B");
                assert_eq!(report.failures[0].detail, "400 - Field :custom_steps is required");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_two_step_upload() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(200, "{}")]));
        let export = use_case(transport.clone());
        let mut session = WorkspaceSession::new();
        session.editable = Some(vec![row("A", "Ok")]);

        let confirmation = export.prepare(&mut session, target()).unwrap();
        assert_eq!(confirmation.total, 1);
        assert!(session.pending_upload.is_some());
        assert_eq!(transport.request_count(), 0);

        let report = export.confirm(&mut session).await.unwrap();
        assert!(report.is_complete());
        assert!(session.pending_upload.is_none());
        assert!(transport.requests.lock().unwrap()[0].url.ends_with("add_case/12"));
    }

    #[tokio::test]
    async fn test_confirm_without_prepare() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let mut session = WorkspaceSession::new();
        let err = use_case(transport).confirm(&mut session).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_prepare_requires_rows_and_cancel_clears() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let export = use_case(transport);
        let mut session = WorkspaceSession::new();

        assert!(export.prepare(&mut session, target()).is_err());

        session.editable = Some(vec![row("A", "Ok")]);
        export.prepare(&mut session, target()).unwrap();
        assert!(export.cancel(&mut session));
        assert!(!export.cancel(&mut session));
    }
}
