use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::{AppConfig, ConfigService};
use crate::infrastructure::http_transport::{HttpTransport, ReqwestTransport};
use crate::infrastructure::llm_clients::GeminiClient;
use crate::infrastructure::testrail::TestRailClient;
use crate::interfaces::http::{add_log, start_server};
use crate::interfaces::state::AppState;

const GEMINI_PROVIDER: &str = "gemini";
const TESTRAIL_PROVIDER: &str = "testrail";

pub async fn run() -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = AppConfig::load()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    let config_service = ConfigService::new();

    let gemini_key = config_service
        .resolve_api_key(GEMINI_PROVIDER, config.gemini.api_key.as_deref())
        .unwrap_or_else(|| {
            warn!("No Gemini API key configured; generation requests will be rejected upstream");
            String::new()
        });
    let testrail_key = config_service
        .resolve_api_key(TESTRAIL_PROVIDER, config.testrail.api_key.as_deref())
        .unwrap_or_else(|| {
            warn!("No TestRail API key configured; export requests will be rejected upstream");
            String::new()
        });

    let gemini_transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(
        Duration::from_secs(config.gemini.timeout_secs),
    ));
    let testrail_transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(
        Duration::from_secs(config.testrail.timeout_secs),
    ));
    let gemini = Arc::new(GeminiClient::new(
        config.gemini.clone(),
        gemini_key,
        gemini_transport,
    ));
    let testrail = Arc::new(TestRailClient::new(
        &config.testrail,
        testrail_key,
        testrail_transport,
    ));

    let app_state = Arc::new(AppState::new(
        gemini,
        testrail,
        config.gemini.refine_attempts,
        Duration::from_millis(config.gemini.refine_retry_delay_ms),
        config.attachments.max_chars,
    ));

    let logs = Arc::new(Mutex::new(Vec::new()));
    add_log(
        &logs,
        "INFO",
        "App",
        &format!(
            "Starting casegen on {}:{} (model={})",
            config.server.host, config.server.port, config.gemini.model
        ),
    );
    info!(max_attempts = config.gemini.max_attempts, "Gemini retry budget");

    start_server(app_state, logs, &config.server.host, config.server.port)?.await
}
