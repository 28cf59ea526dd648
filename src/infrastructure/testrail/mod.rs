use crate::domain::error::{AppError, Result};
use crate::domain::export::{ExportCase, TestRailProject, TestRailSection, TestRailSuite};
use crate::domain::llm_config::TestRailConfig;
use crate::infrastructure::http_transport::{HttpTransport, OutboundRequest};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

/// TestRail API v2 over basic auth (`user:api_key`).
pub struct TestRailClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    user: String,
    api_key: String,
}

impl TestRailClient {
    pub fn new(config: &TestRailConfig, api_key: String, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user: config.user.clone(),
            api_key,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/index.php?/api/v2/{}", self.base_url, endpoint)
    }

    async fn get_json(&self, endpoint: &str) -> Result<serde_json::Value> {
        let request =
            OutboundRequest::get(self.url(endpoint)).basic_auth(&self.user, &self.api_key);
        let response = self.transport.execute(request).await?;

        if !response.is_success() {
            return Err(AppError::UpstreamHttp {
                status: response.status,
                body: response.body,
            });
        }

        serde_json::from_str(&response.body).map_err(|e| {
            AppError::ParseError(format!("TestRail returned invalid JSON for {}: {}", endpoint, e))
        })
    }

    pub async fn get_projects(&self) -> Result<Vec<TestRailProject>> {
        let value = self.get_json("get_projects").await?;
        unwrap_listing(value, "projects")
    }

    pub async fn get_suites(&self, project_id: i64) -> Result<Vec<TestRailSuite>> {
        let value = self.get_json(&format!("get_suites/{}", project_id)).await?;
        unwrap_listing(value, "suites")
    }

    pub async fn get_sections(&self, project_id: i64, suite_id: i64) -> Result<Vec<TestRailSection>> {
        let value = self
            .get_json(&format!("get_sections/{}&suite_id={}", project_id, suite_id))
            .await?;
        unwrap_listing(value, "sections")
    }

    /// Creates one case. TestRail answers 200 (sometimes 201) on success.
    pub async fn add_case(&self, section_id: i64, case: &ExportCase) -> Result<()> {
        let body = serde_json::to_value(case)
            .map_err(|e| AppError::Internal(format!("Failed to encode case: {}", e)))?;
        let request = OutboundRequest::post_json(self.url(&format!("add_case/{}", section_id)), body)
            .basic_auth(&self.user, &self.api_key);
        let response = self.transport.execute(request).await?;

        match response.status {
            200 | 201 => {
                debug!(section_id, title = %case.title, "Case uploaded");
                Ok(())
            }
            status => Err(AppError::UpstreamHttp {
                status,
                body: response.body,
            }),
        }
    }
}

/// Older instances return a bare array, newer ones wrap it as
/// `{"offset":..,"<key>":[..]}`.
fn unwrap_listing<T: DeserializeOwned>(value: serde_json::Value, key: &str) -> Result<Vec<T>> {
    let items = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut map) => map
            .remove(key)
            .ok_or_else(|| AppError::ParseError(format!("TestRail listing without '{}'", key)))?,
        other => {
            return Err(AppError::ParseError(format!(
                "Unexpected TestRail listing: {}",
                other
            )))
        }
    };

    serde_json::from_value(items)
        .map_err(|e| AppError::ParseError(format!("Invalid TestRail {}: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_transport::fakes::ScriptedTransport;
    use crate::infrastructure::http_transport::HttpMethod;

    fn client(transport: Arc<ScriptedTransport>) -> TestRailClient {
        let config = TestRailConfig {
            base_url: "https://acme.testrail.io/".to_string(),
            user: "qa@acme.test".to_string(),
            ..TestRailConfig::default()
        };
        TestRailClient::new(&config, "key".to_string(), transport)
    }

    fn case() -> ExportCase {
        ExportCase {
            title: "Login".to_string(),
            custom_preconds: String::new(),
            custom_steps: "1. Open".to_string(),
            custom_expected: "Ok".to_string(),
            custom_type: "Funcional".to_string(),
            custom_priority: "Alta".to_string(),
            custom_case_oracle: "Regla: Login".to_string(),
        }
    }

    #[tokio::test]
    async fn test_projects_from_bare_array() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            r#"[{"id":1,"name":"Web"},{"id":2,"name":"Mobile"}]"#,
        )]));
        let projects = client(transport.clone()).get_projects().await.unwrap();

        assert_eq!(projects.len(), 2);
        assert_eq!(projects[1].name, "Mobile");
        let requests = transport.requests.lock().unwrap();
        assert_eq!(
            requests[0].url,
            "https://acme.testrail.io/index.php?/api/v2/get_projects"
        );
        assert_eq!(
            requests[0].basic_auth,
            Some(("qa@acme.test".to_string(), "key".to_string()))
        );
    }

    #[tokio::test]
    async fn test_sections_from_paginated_envelope() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            r#"{"offset":0,"limit":250,"sections":[{"id":7,"name":"Login","parent_id":null}]}"#,
        )]));
        let sections = client(transport.clone()).get_sections(3, 9).await.unwrap();

        assert_eq!(sections[0].id, 7);
        assert_eq!(sections[0].parent_id, None);
        assert!(transport.requests.lock().unwrap()[0]
            .url
            .ends_with("get_sections/3&suite_id=9"));
    }

    #[tokio::test]
    async fn test_listing_error_status() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            401,
            "unauthorized",
        )]));
        let err = client(transport).get_suites(1).await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamHttp { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_add_case_accepts_200_and_201() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedTransport::reply(200, "{}"),
            ScriptedTransport::reply(201, "{}"),
            ScriptedTransport::reply(400, "Field :custom_case_oracle is required"),
        ]));
        let testrail = client(transport.clone());

        assert!(testrail.add_case(5, &case()).await.is_ok());
        assert!(testrail.add_case(5, &case()).await.is_ok());
        let err = testrail.add_case(5, &case()).await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamHttp { status: 400, .. }));

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert!(requests[0].url.ends_with("add_case/5"));
        assert_eq!(
            requests[0].body.as_ref().unwrap()["custom_case_oracle"],
            "Regla: Login"
        );
    }

    #[test]
    fn test_unwrap_listing_rejects_scalars() {
        let err = unwrap_listing::<TestRailSuite>(serde_json::json!("nope"), "suites").unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }
}
