use serde::{Deserialize, Serialize};
use std::fmt;

pub const COL_TITLE: &str = "Title";
pub const COL_PRECONDITIONS: &str = "Preconditions";
pub const COL_STEPS: &str = "Steps";
pub const COL_EXPECTED: &str = "Expected Result";
pub const COL_TYPE: &str = "Type";
pub const COL_PRIORITY: &str = "Priority";

const PRIMARY_COLUMNS: [&str; 6] = [
    COL_TITLE,
    COL_PRECONDITIONS,
    COL_STEPS,
    COL_EXPECTED,
    COL_TYPE,
    COL_PRIORITY,
];

/// Column layout expected from the generator for a given operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableSchema {
    /// Scenario generation: Title, Preconditions, Steps, Expected Result, Type, Priority.
    Primary,
    /// Supplementary suggestions: the first four primary columns.
    Suggestion,
}

impl TableSchema {
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            TableSchema::Primary => &PRIMARY_COLUMNS,
            TableSchema::Suggestion => &PRIMARY_COLUMNS[..4],
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns().len()
    }

    /// Exact, order-sensitive header comparison after trimming each name.
    pub fn matches_header(&self, header: &[String]) -> bool {
        header.len() == self.column_count()
            && header
                .iter()
                .zip(self.columns())
                .all(|(got, expected)| got.trim() == *expected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseType {
    Funcional,
    #[serde(rename = "Validación")]
    Validacion,
    Seguridad,
    Usabilidad,
}

impl CaseType {
    pub const ALL: [CaseType; 4] = [
        CaseType::Funcional,
        CaseType::Validacion,
        CaseType::Seguridad,
        CaseType::Usabilidad,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseType::Funcional => "Funcional",
            CaseType::Validacion => "Validación",
            CaseType::Seguridad => "Seguridad",
            CaseType::Usabilidad => "Usabilidad",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        Self::ALL.into_iter().find(|kind| kind.as_str() == trimmed)
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Alta,
    Media,
    Baja,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Alta, Priority::Media, Priority::Baja];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Alta => "Alta",
            Priority::Media => "Media",
            Priority::Baja => "Baja",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        Self::ALL.into_iter().find(|p| p.as_str() == trimmed)
    }

    /// Higher is more urgent. Unknown priorities sort last.
    pub fn rank_of(value: &str) -> u8 {
        match Self::parse(value) {
            Some(Priority::Alta) => 3,
            Some(Priority::Media) => 2,
            Some(Priority::Baja) => 1,
            None => 0,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review state of a row in the editable grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RowStatus {
    #[default]
    #[serde(rename = "Pendiente")]
    Pending,
    #[serde(rename = "Modificado")]
    Modified,
    #[serde(rename = "Sin cambios")]
    Unchanged,
}

/// One editable test case. Type and priority stay free text because the
/// operator may edit them; strict validation checks them before export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseRow {
    pub title: String,
    pub preconditions: String,
    pub steps: String,
    pub expected_result: String,
    pub case_type: String,
    pub priority: String,
    #[serde(default)]
    pub status: RowStatus,
}

impl TestCaseRow {
    pub const DEFAULT_TYPE: &'static str = "Funcional";
    pub const DEFAULT_PRIORITY: &'static str = "Media";

    /// Fields in primary column order.
    pub fn fields(&self) -> [&str; 6] {
        [
            &self.title,
            &self.preconditions,
            &self.steps,
            &self.expected_result,
            &self.case_type,
            &self.priority,
        ]
    }

    /// True when every editable field matches after trimming. Status is ignored.
    pub fn same_content(&self, other: &TestCaseRow) -> bool {
        self.fields()
            .iter()
            .zip(other.fields().iter())
            .all(|(a, b)| a.trim() == b.trim())
    }
}
