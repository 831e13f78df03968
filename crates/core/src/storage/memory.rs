use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::aggregate::ReportWindows;
use crate::domain::posting::{company_key, JobPosting};
use crate::domain::role::RoleDefinition;
use crate::storage::{sort_newest_posted, CompanyVolume, JobStore, ListingFilter};

/// In-memory snapshot of postings, scanned on every call.
#[derive(Debug, Clone, Default)]
pub struct MemoryJobStore {
    postings: Vec<JobPosting>,
    roles: Vec<RoleDefinition>,
}

/// On-disk fixture layout: `{"postings": [...], "roles": [...]}`.
#[derive(Debug, Deserialize)]
struct Fixture {
    postings: Vec<JobPosting>,
    #[serde(default)]
    roles: Vec<RoleDefinition>,
}

impl MemoryJobStore {
    pub fn new(postings: Vec<JobPosting>) -> Self {
        Self {
            postings,
            roles: Vec::new(),
        }
    }

    pub fn with_roles(mut self, roles: Vec<RoleDefinition>) -> Self {
        self.roles = roles;
        self
    }

    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let fixture: Fixture =
            serde_json::from_str(raw).context("fixture is not a valid postings document")?;
        for p in &fixture.postings {
            anyhow::ensure!(
                !p.company.trim().is_empty(),
                "posting {} has an empty company",
                p.id
            );
        }
        Ok(Self::new(fixture.postings).with_roles(fixture.roles))
    }

    pub fn from_fixture(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("fixture {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    fn company_matches(posting: &JobPosting, company: Option<&str>) -> bool {
        company
            .map(|c| posting.company_key() == company_key(c))
            .unwrap_or(true)
    }
}

#[async_trait::async_trait]
impl JobStore for MemoryJobStore {
    fn store_name(&self) -> &'static str {
        "memory"
    }

    async fn latest_upload_date(&self) -> anyhow::Result<Option<NaiveDate>> {
        Ok(self.postings.iter().map(JobPosting::upload_date).max())
    }

    async fn count_uploaded_on(&self, date: NaiveDate) -> anyhow::Result<u64> {
        Ok(self
            .postings
            .iter()
            .filter(|p| p.upload_date() == date)
            .count() as u64)
    }

    async fn postings_for_windows(
        &self,
        windows: &ReportWindows,
        company: Option<&str>,
    ) -> anyhow::Result<Vec<JobPosting>> {
        Ok(self
            .postings
            .iter()
            .filter(|p| Self::company_matches(p, company))
            .filter(|p| windows.classify_upload(p.upload_date()).is_some() || windows.is_fresh(p))
            .cloned()
            .collect())
    }

    async fn postings_uploaded_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        company: Option<&str>,
    ) -> anyhow::Result<Vec<JobPosting>> {
        Ok(self
            .postings
            .iter()
            .filter(|p| Self::company_matches(p, company))
            .filter(|p| (start..=end).contains(&p.upload_date()))
            .cloned()
            .collect())
    }

    async fn postings_uploaded_on(
        &self,
        date: NaiveDate,
        filter: &ListingFilter,
    ) -> anyhow::Result<Vec<JobPosting>> {
        let mut out: Vec<JobPosting> = self
            .postings
            .iter()
            .filter(|p| p.upload_date() == date && filter.matches(p))
            .cloned()
            .collect();
        sort_newest_posted(&mut out);
        Ok(out)
    }

    async fn company_volumes(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        limit: usize,
    ) -> anyhow::Result<Vec<CompanyVolume>> {
        let mut by_key: BTreeMap<String, CompanyVolume> = BTreeMap::new();
        for p in self
            .postings
            .iter()
            .filter(|p| (start..=end).contains(&p.upload_date()))
        {
            let entry = by_key.entry(p.company_key()).or_insert_with(|| CompanyVolume {
                company: p.company.trim().to_string(),
                jobs: 0,
            });
            entry.jobs += 1;
        }

        let mut out: Vec<CompanyVolume> = by_key.into_values().collect();
        out.sort_by(|a, b| {
            b.jobs
                .cmp(&a.jobs)
                .then_with(|| a.company.to_lowercase().cmp(&b.company.to_lowercase()))
        });
        out.truncate(limit);
        Ok(out)
    }

    async fn role_definitions(&self) -> anyhow::Result<Vec<RoleDefinition>> {
        Ok(self.roles.clone())
    }
}

#[cfg(test)]
pub(crate) fn posting(id: i64, company: &str, title: &str, day: NaiveDate) -> JobPosting {
    let at = crate::aggregate::windows::start_of_day(day) + chrono::Duration::hours(12);
    JobPosting::new(id, company, title, at)
}

#[cfg(test)]
pub(crate) fn posting_at(
    id: i64,
    company: &str,
    title: &str,
    uploaded_at: chrono::DateTime<chrono::Utc>,
    posted_at: Option<chrono::DateTime<chrono::Utc>>,
) -> JobPosting {
    JobPosting {
        posted_at,
        ..JobPosting::new(id, company, title, uploaded_at)
    }
}
