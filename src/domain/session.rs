use serde::{Deserialize, Serialize};

use super::export::UploadConfirmation;
use super::test_case::TestCaseRow;

/// Metadata kept for every consolidated attachment, even when it had no text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentMeta {
    pub filename: String,
    pub fingerprint: String,
    pub ext: String,
    pub size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub origin: String,
    pub description: Option<String>,
    pub scenarios: Vec<TestCaseRow>,
}

impl HistoryEntry {
    pub fn new(origin: &str, description: Option<String>, scenarios: Vec<TestCaseRow>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now(),
            origin: origin.to_string(),
            description,
            scenarios,
        }
    }
}

/// Per-workspace state carried between requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSession {
    pub functional_text: String,
    pub attachments_text: String,
    pub attachments_meta: Vec<AttachmentMeta>,
    pub use_attachments: bool,
    pub refined_description: String,
    pub editable: Option<Vec<TestCaseRow>>,
    pub generated: bool,
    pub last_raw_response: Option<String>,
    pub improvement_tips: Vec<String>,
    pub suggestions: Option<Vec<TestCaseRow>>,
    pub pending_upload: Option<UploadConfirmation>,
    pub uploader_nonce: u64,
    pub history: Vec<HistoryEntry>,
}

impl Default for WorkspaceSession {
    fn default() -> Self {
        Self {
            functional_text: String::new(),
            attachments_text: String::new(),
            attachments_meta: Vec::new(),
            use_attachments: true,
            refined_description: String::new(),
            editable: None,
            generated: false,
            last_raw_response: None,
            improvement_tips: Vec::new(),
            suggestions: None,
            pending_upload: None,
            uploader_nonce: 0,
            history: Vec::new(),
        }
    }
}

impl WorkspaceSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the working inputs and outputs. History survives; the uploader
    /// nonce is bumped so the client drops any half-selected file.
    pub fn reset(&mut self) {
        self.functional_text.clear();
        self.attachments_text.clear();
        self.attachments_meta.clear();
        self.use_attachments = true;
        self.refined_description.clear();
        self.editable = None;
        self.generated = false;
        self.last_raw_response = None;
        self.improvement_tips.clear();
        self.suggestions = None;
        self.pending_upload = None;
        self.uploader_nonce += 1;
    }

    /// Text sent to the generator: functional text plus attachments when enabled.
    pub fn combined_input(&self) -> String {
        let extra = if self.use_attachments {
            self.attachments_text.trim()
        } else {
            ""
        };
        let base = self.functional_text.trim();
        match (base.is_empty(), extra.is_empty()) {
            (_, true) => base.to_string(),
            (true, false) => extra.to_string(),
            (false, false) => format!("{}\n\n{}", base, extra),
        }
    }

    pub fn has_attachments(&self) -> bool {
        self.use_attachments && !self.attachments_text.trim().is_empty()
    }

    pub fn clear_generation(&mut self) {
        self.editable = None;
        self.generated = false;
    }
}
