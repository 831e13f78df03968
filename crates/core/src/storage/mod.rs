pub mod memory;
pub mod postgres;

use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::ReportWindows;
use crate::domain::posting::JobPosting;
use crate::domain::role::RoleDefinition;

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}

/// Case-insensitive substring filters for listing views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub role: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
}

impl ListingFilter {
    pub fn matches(&self, posting: &JobPosting) -> bool {
        contains_ci(Some(&posting.title), self.role.as_deref())
            && contains_ci(Some(&posting.company), self.company.as_deref())
            && contains_ci(posting.location.as_deref(), self.location.as_deref())
    }
}

fn contains_ci(haystack: Option<&str>, needle: Option<&str>) -> bool {
    match needle.map(str::trim).filter(|n| !n.is_empty()) {
        None => true,
        Some(n) => haystack
            .map(|h| h.to_lowercase().contains(&n.to_lowercase()))
            .unwrap_or(false),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyVolume {
    pub company: String,
    pub jobs: u32,
}

/// Read-only access to job postings.
///
/// Implementations may serve concurrent requests; every call is an independent read over
/// whatever snapshot the backing store holds at that moment.
#[async_trait::async_trait]
pub trait JobStore: Send + Sync {
    fn store_name(&self) -> &'static str;

    /// Most recent UTC upload date with at least one posting.
    async fn latest_upload_date(&self) -> anyhow::Result<Option<NaiveDate>>;

    /// Number of postings uploaded on `date`.
    async fn count_uploaded_on(&self, date: NaiveDate) -> anyhow::Result<u64>;

    /// Every posting relevant to `windows`: uploaded within the 14d range or posted inside
    /// the 24h freshness window. `company` narrows to one company (case-insensitive).
    async fn postings_for_windows(
        &self,
        windows: &ReportWindows,
        company: Option<&str>,
    ) -> anyhow::Result<Vec<JobPosting>>;

    /// Postings uploaded within `[start, end]` (inclusive UTC dates).
    async fn postings_uploaded_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        company: Option<&str>,
    ) -> anyhow::Result<Vec<JobPosting>>;

    /// Postings uploaded on `date`, filtered, newest posted first.
    async fn postings_uploaded_on(
        &self,
        date: NaiveDate,
        filter: &ListingFilter,
    ) -> anyhow::Result<Vec<JobPosting>>;

    /// Companies with postings uploaded within `[start, end]`, by count descending.
    async fn company_volumes(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        limit: usize,
    ) -> anyhow::Result<Vec<CompanyVolume>>;

    async fn role_definitions(&self) -> anyhow::Result<Vec<RoleDefinition>>;
}

/// Orders postings newest-posted first; rows without a posted time sort last.
pub(crate) fn sort_newest_posted(postings: &mut [JobPosting]) {
    postings.sort_by(|a, b| b.posted_at.cmp(&a.posted_at).then_with(|| a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn listing_filter_is_case_insensitive_substring() {
        let mut p = JobPosting::new(
            1,
            "Globex Corporation",
            "Senior Backend Engineer",
            Utc.with_ymd_and_hms(2026, 1, 31, 9, 0, 0).unwrap(),
        );
        p.location = Some("Austin, TX".to_string());

        assert!(ListingFilter::default().matches(&p));
        let f = ListingFilter {
            role: Some("backend".to_string()),
            company: Some("GLOBEX".to_string()),
            location: Some("tx".to_string()),
        };
        assert!(f.matches(&p));

        let f = ListingFilter {
            location: Some("Remote".to_string()),
            ..ListingFilter::default()
        };
        assert!(!f.matches(&p));

        p.location = None;
        let f = ListingFilter {
            location: Some("Austin".to_string()),
            ..ListingFilter::default()
        };
        assert!(!f.matches(&p));
    }
}
