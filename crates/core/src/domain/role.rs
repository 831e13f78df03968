use serde::{Deserialize, Serialize};

use crate::domain::posting::JobPosting;

/// Canonical role dictionary entry (`job_roles`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDefinition {
    pub name: String,
    #[serde(default)]
    pub alternate_roles: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub job_titles_to_apply_for: Vec<String>,
}

impl RoleDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alternate_roles: Vec::new(),
            keywords: Vec::new(),
            job_titles_to_apply_for: Vec::new(),
        }
    }

    pub fn with_alternates<I, S>(mut self, alternates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternate_roles = alternates.into_iter().map(Into::into).collect();
        self
    }
}

/// Splits a comma-separated column into trimmed, non-empty entries.
pub fn split_csv_column(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleCount {
    pub role: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleGroup {
    pub role: String,
    pub count: u32,
    pub postings: Vec<JobPosting>,
}
