use serde::{Deserialize, Serialize};

/// Payload accepted by TestRail `add_case`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportCase {
    pub title: String,
    pub custom_preconds: String,
    pub custom_steps: String,
    pub custom_expected: String,
    pub custom_type: String,
    pub custom_priority: String,
    pub custom_case_oracle: String,
}

/// A row the export target did not accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    /// 0-based position in the exported table.
    pub row: usize,
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    pub uploaded: usize,
    pub total: usize,
    pub failures: Vec<RowFailure>,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.uploaded == self.total
    }
}

/// Summary the operator must confirm before an upload starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfirmation {
    pub project: String,
    pub suite: String,
    pub section: String,
    pub section_id: i64,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRailProject {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRailSuite {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRailSection {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}
