use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single job posting as stored in `job_postings`. Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: i64,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Employer's original publish time. Only used for the 24h freshness signal.
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
    /// Ingestion time. All 7d / 14d windows are partitioned on this.
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub years_exp_required: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub work_type: Option<String>,
    /// Canonical role, when the row was tagged upstream.
    #[serde(default)]
    pub role: Option<String>,
}

impl JobPosting {
    pub fn new(
        id: i64,
        company: impl Into<String>,
        title: impl Into<String>,
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            company: company.into(),
            location: None,
            posted_at: Some(uploaded_at),
            uploaded_at,
            years_exp_required: None,
            experience_level: None,
            industry: None,
            url: None,
            salary: None,
            work_type: None,
            role: None,
        }
    }

    pub fn upload_date(&self) -> NaiveDate {
        self.uploaded_at.date_naive()
    }

    /// Posted timestamp, falling back to the upload timestamp for rows that lack one.
    pub fn freshness_instant(&self) -> DateTime<Utc> {
        self.posted_at.unwrap_or(self.uploaded_at)
    }

    pub fn company_key(&self) -> String {
        company_key(&self.company)
    }
}

/// Case-insensitive grouping key for company names.
pub fn company_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Listing projection returned to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingView {
    pub id: i64,
    pub job_title: String,
    pub company_name: String,
    pub location: Option<String>,
    pub posted_date: Option<DateTime<Utc>>,
    pub experience_required: Option<String>,
    pub job_url: Option<String>,
    pub salary: Option<String>,
    pub work_type: Option<String>,
    pub experience_level: Option<String>,
}

impl From<&JobPosting> for ListingView {
    fn from(p: &JobPosting) -> Self {
        Self {
            id: p.id,
            job_title: p.title.clone(),
            company_name: p.company.clone(),
            location: p.location.clone(),
            posted_date: p.posted_at,
            experience_required: p.years_exp_required.clone(),
            job_url: p.url.clone(),
            salary: p.salary.clone(),
            work_type: p.work_type.clone(),
            experience_level: p.experience_level.clone(),
        }
    }
}
