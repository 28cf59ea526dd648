use crate::application::use_cases::attachments::{consolidate_attachments, AttachmentInput};
use crate::application::use_cases::editor::{save_edits, validate_current};
use crate::application::use_cases::export::UploadTarget;
use crate::application::use_cases::pipeline::render_download_csv;
use crate::application::use_cases::suggestions::apply_suggestions;
use crate::domain::error::AppError;
use crate::domain::export::ExportReport;
use crate::domain::session::AttachmentMeta;
use crate::domain::test_case::TestCaseRow;
use crate::interfaces::state::AppState;
use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{
    delete, dev::Server, get, post, put, web, App, HttpResponse, HttpServer, Responder,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use validator::Validate;

const LOG_CAPACITY: usize = 100;
const DOWNLOAD_FILENAME: &str = "escenarios_QA.csv";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub app_state: Arc<AppState>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InputRequest {
    #[validate(length(max = 400000))]
    pub functional_text: String,
    #[serde(default)]
    pub use_attachments: Option<bool>,
}

#[derive(Deserialize, Validate)]
pub struct AttachmentsRequest {
    #[validate(length(min = 1), nested)]
    pub files: Vec<AttachmentInput>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentsResponse {
    pub text_chars: usize,
    pub attachments: Vec<AttachmentMeta>,
}

#[derive(Deserialize, Validate)]
pub struct EditRequest {
    #[validate(length(max = 1000))]
    pub rows: Vec<TestCaseRow>,
}

#[derive(Deserialize, Validate)]
pub struct ApplyRequest {
    #[validate(length(min = 1))]
    pub indices: Vec<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub valid: bool,
    pub rows: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub uploader_nonce: u64,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ExportReport>,
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::EmptyOrInvalidTable(_) | AppError::ValidationError(_) | AppError::ParseError(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AppError::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AppError::MalformedUpstreamResponse(_)
        | AppError::UpstreamHttp { .. }
        | AppError::LLMError(_)
        | AppError::IoError(_)
        | AppError::ExportPartialFailure(_) => StatusCode::BAD_GATEWAY,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Logs the failure and renders it. `raw_text` is the last generator reply,
/// attached only for errors caused by what the generator produced.
fn error_response(
    data: &HttpState,
    context: &str,
    err: AppError,
    raw_text: Option<String>,
) -> HttpResponse {
    add_log(&data.logs, "ERROR", "HttpApi", &format!("{}: {}", context, err));

    let raw_text = match err {
        AppError::EmptyOrInvalidTable(_)
        | AppError::ValidationError(_)
        | AppError::MalformedUpstreamResponse(_) => raw_text,
        _ => None,
    };
    let body = ErrorBody {
        error: err.to_string(),
        kind: err.kind(),
        raw_text,
        report: match &err {
            AppError::ExportPartialFailure(report) => Some(report.clone()),
            _ => None,
        },
    };

    HttpResponse::build(status_for(&err)).json(body)
}

fn invalid_request(data: &HttpState, context: &str, err: validator::ValidationErrors) -> HttpResponse {
    error_response(data, context, AppError::ValidationError(err.to_string()), None)
}

#[get("/session")]
async fn get_session(data: web::Data<HttpState>) -> impl Responder {
    let session = data.app_state.session.lock().await;
    HttpResponse::Ok().json(&*session)
}

#[put("/session/input")]
async fn update_input(data: web::Data<HttpState>, req: web::Json<InputRequest>) -> impl Responder {
    if let Err(e) = req.validate() {
        return invalid_request(&data, "Invalid input", e);
    }

    let mut session = data.app_state.session.lock().await;
    session.functional_text = req.req_data().functional_text.clone();
    if let Some(use_attachments) = req.use_attachments {
        session.use_attachments = use_attachments;
    }
    HttpResponse::Ok().json(&*session)
}

#[post("/session/attachments")]
async fn upload_attachments(
    data: web::Data<HttpState>,
    req: web::Json<AttachmentsRequest>,
) -> impl Responder {
    if let Err(e) = req.validate() {
        return invalid_request(&data, "Invalid attachments", e);
    }
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("Consolidating {} attachment(s)", req.files.len()),
    );

    let consolidated = consolidate_attachments(&req.files, data.app_state.attachments_max_chars);
    let mut session = data.app_state.session.lock().await;
    session.attachments_text = consolidated.text;
    session.attachments_meta = consolidated.meta;

    HttpResponse::Ok().json(AttachmentsResponse {
        text_chars: session.attachments_text.chars().count(),
        attachments: session.attachments_meta.clone(),
    })
}

#[post("/session/reset")]
async fn reset_session(data: web::Data<HttpState>) -> impl Responder {
    let mut session = data.app_state.session.lock().await;
    session.reset();
    add_log(&data.logs, "INFO", "HttpApi", "Workspace reset");
    HttpResponse::Ok().json(ResetResponse {
        uploader_nonce: session.uploader_nonce,
    })
}

#[post("/scenarios/generate")]
async fn generate_scenarios(data: web::Data<HttpState>) -> impl Responder {
    add_log(&data.logs, "INFO", "HttpApi", "Generating scenarios");

    let mut session = data.app_state.session.lock().await;
    match data
        .app_state
        .scenario_generation_use_case
        .execute(&mut session)
        .await
    {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => {
            let raw = session.last_raw_response.clone();
            error_response(&data, "Scenario generation failed", e, raw)
        }
    }
}

#[put("/scenarios")]
async fn edit_scenarios(data: web::Data<HttpState>, req: web::Json<EditRequest>) -> impl Responder {
    if let Err(e) = req.validate() {
        return invalid_request(&data, "Invalid edit", e);
    }

    let mut session = data.app_state.session.lock().await;
    match save_edits(&mut session, req.into_inner().rows) {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => error_response(&data, "Saving edits failed", e, None),
    }
}

#[post("/scenarios/validate")]
async fn validate_scenarios(data: web::Data<HttpState>) -> impl Responder {
    let session = data.app_state.session.lock().await;
    match validate_current(&session) {
        Ok(rows) => HttpResponse::Ok().json(ValidationResponse { valid: true, rows }),
        Err(e) => error_response(&data, "Validation failed", e, None),
    }
}

#[get("/scenarios/download")]
async fn download_scenarios(data: web::Data<HttpState>) -> impl Responder {
    let session = data.app_state.session.lock().await;
    let rows = match session.editable.as_deref() {
        Some(rows) => rows,
        None => {
            return error_response(
                &data,
                "Download failed",
                AppError::NotFound("No hay escenarios generados".to_string()),
                None,
            )
        }
    };

    match render_download_csv(rows) {
        Ok(csv) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", DOWNLOAD_FILENAME),
            ))
            .body(csv),
        Err(e) => error_response(&data, "Download failed", e, None),
    }
}

#[post("/suggestions/improvements")]
async fn improvement_tips(data: web::Data<HttpState>) -> impl Responder {
    let mut session = data.app_state.session.lock().await;
    match data
        .app_state
        .suggestion_use_case
        .improvement_tips(&mut session)
        .await
    {
        Ok(tips) => HttpResponse::Ok().json(tips),
        Err(e) => error_response(&data, "Improvement tips failed", e, None),
    }
}

#[post("/suggestions/scenarios")]
async fn suggest_scenarios(data: web::Data<HttpState>) -> impl Responder {
    let mut session = data.app_state.session.lock().await;
    match data
        .app_state
        .suggestion_use_case
        .suggest_scenarios(&mut session)
        .await
    {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => {
            let raw = session.last_raw_response.clone();
            error_response(&data, "Scenario suggestions failed", e, raw)
        }
    }
}

#[post("/suggestions/apply")]
async fn apply_selected(data: web::Data<HttpState>, req: web::Json<ApplyRequest>) -> impl Responder {
    if let Err(e) = req.validate() {
        return invalid_request(&data, "Invalid selection", e);
    }

    let mut session = data.app_state.session.lock().await;
    match apply_suggestions(&mut session, &req.indices) {
        Ok(added) => HttpResponse::Ok().json(added),
        Err(e) => error_response(&data, "Applying suggestions failed", e, None),
    }
}

#[get("/history")]
async fn get_history(data: web::Data<HttpState>) -> impl Responder {
    let session = data.app_state.session.lock().await;
    HttpResponse::Ok().json(&session.history)
}

#[delete("/history")]
async fn clear_history(data: web::Data<HttpState>) -> impl Responder {
    let mut session = data.app_state.session.lock().await;
    session.history.clear();
    HttpResponse::NoContent().finish()
}

#[get("/testrail/projects")]
async fn list_projects(data: web::Data<HttpState>) -> impl Responder {
    match data.app_state.export_use_case.list_projects().await {
        Ok(projects) => HttpResponse::Ok().json(projects),
        Err(e) => error_response(&data, "Failed to list projects", e, None),
    }
}

#[get("/testrail/projects/{project_id}/suites")]
async fn list_suites(data: web::Data<HttpState>, path: web::Path<i64>) -> impl Responder {
    match data
        .app_state
        .export_use_case
        .list_suites(path.into_inner())
        .await
    {
        Ok(suites) => HttpResponse::Ok().json(suites),
        Err(e) => error_response(&data, "Failed to list suites", e, None),
    }
}

#[get("/testrail/projects/{project_id}/suites/{suite_id}/sections")]
async fn list_sections(data: web::Data<HttpState>, path: web::Path<(i64, i64)>) -> impl Responder {
    let (project_id, suite_id) = path.into_inner();
    match data
        .app_state
        .export_use_case
        .list_sections(project_id, suite_id)
        .await
    {
        Ok(sections) => HttpResponse::Ok().json(sections),
        Err(e) => error_response(&data, "Failed to list sections", e, None),
    }
}

#[post("/export/prepare")]
async fn prepare_export(data: web::Data<HttpState>, req: web::Json<UploadTarget>) -> impl Responder {
    let mut session = data.app_state.session.lock().await;
    match data
        .app_state
        .export_use_case
        .prepare(&mut session, req.into_inner())
    {
        Ok(confirmation) => HttpResponse::Ok().json(confirmation),
        Err(e) => error_response(&data, "Export preparation failed", e, None),
    }
}

#[post("/export/confirm")]
async fn confirm_export(data: web::Data<HttpState>) -> impl Responder {
    add_log(&data.logs, "INFO", "HttpApi", "Uploading cases to TestRail");

    let mut session = data.app_state.session.lock().await;
    match data.app_state.export_use_case.confirm(&mut session).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => error_response(&data, "Export failed", e, None),
    }
}

#[post("/export/cancel")]
async fn cancel_export(data: web::Data<HttpState>) -> impl Responder {
    let mut session = data.app_state.session.lock().await;
    let cancelled = data.app_state.export_use_case.cancel(&mut session);
    HttpResponse::Ok().json(CancelResponse { cancelled })
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data.logs.lock().unwrap_or_else(PoisonError::into_inner);
    HttpResponse::Ok().json(&*logs)
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap_or_else(PoisonError::into_inner);
    logs.push(entry.clone());
    if logs.len() > LOG_CAPACITY {
        logs.remove(0);
    }
    entry
}

/// Records the entry in the ring and mirrors it to `tracing`.
pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    match level {
        "ERROR" => tracing::error!(source, "{}", message),
        "WARN" => tracing::warn!(source, "{}", message),
        _ => tracing::info!(source, "{}", message),
    }
    add_log_entry(logs, level, source, message);
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_session)
        .service(update_input)
        .service(upload_attachments)
        .service(reset_session)
        .service(generate_scenarios)
        .service(edit_scenarios)
        .service(validate_scenarios)
        .service(download_scenarios)
        .service(improvement_tips)
        .service(suggest_scenarios)
        .service(apply_selected)
        .service(get_history)
        .service(clear_history)
        .service(list_projects)
        .service(list_suites)
        .service(list_sections)
        .service(prepare_export)
        .service(confirm_export)
        .service(cancel_export)
        .service(get_logs);
}

pub fn start_server(
    app_state: Arc<AppState>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
    host: &str,
    port: u16,
) -> std::io::Result<Server> {
    let state = web::Data::new(HttpState { app_state, logs });

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Local tool, any origin

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .service(web::scope("/api").configure(routes))
    })
    .bind((host.to_string(), port))?
    .run();

    Ok(server)
}

// Helper trait to avoid move issues in handlers
trait RequestData<T> {
    fn req_data(&self) -> &T;
}

impl<T> RequestData<T> for web::Json<T> {
    fn req_data(&self) -> &T {
        &**self
    }
}
