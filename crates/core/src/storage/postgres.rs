use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Instant;

use crate::aggregate::ReportWindows;
use crate::domain::metrics::clamp_count;
use crate::domain::posting::JobPosting;
use crate::domain::role::{split_csv_column, RoleDefinition};
use crate::storage::{CompanyVolume, JobStore, ListingFilter};

const POSTING_COLUMNS: &str = "id, title, company, location, posted_at, uploaded_at, \
     years_exp_required, experience_level, industry, url, salary, work_type, role";

const UPLOAD_DATE: &str = "(uploaded_at AT TIME ZONE 'UTC')::date";

#[derive(Debug, sqlx::FromRow)]
struct PostingRow {
    id: i64,
    title: String,
    company: String,
    location: Option<String>,
    posted_at: Option<DateTime<Utc>>,
    uploaded_at: DateTime<Utc>,
    years_exp_required: Option<String>,
    experience_level: Option<String>,
    industry: Option<String>,
    url: Option<String>,
    salary: Option<String>,
    work_type: Option<String>,
    role: Option<String>,
}

impl From<PostingRow> for JobPosting {
    fn from(r: PostingRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            company: r.company,
            location: r.location,
            posted_at: r.posted_at,
            uploaded_at: r.uploaded_at,
            years_exp_required: r.years_exp_required,
            experience_level: r.experience_level,
            industry: r.industry,
            url: r.url,
            salary: r.salary,
            work_type: r.work_type,
            role: r.role,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_postings(
        &self,
        mut qb: QueryBuilder<'_, Postgres>,
        label: &'static str,
    ) -> anyhow::Result<Vec<JobPosting>> {
        let t0 = Instant::now();
        let rows: Vec<PostingRow> = qb
            .build_query_as()
            .persistent(false)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("{label} query failed"))?;

        tracing::debug!(
            query = label,
            rows = rows.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "job_postings fetched"
        );
        Ok(rows.into_iter().map(JobPosting::from).collect())
    }
}

fn select_postings<'a>() -> QueryBuilder<'a, Postgres> {
    QueryBuilder::new(format!("SELECT {POSTING_COLUMNS} FROM job_postings WHERE TRUE"))
}

fn push_company_eq(qb: &mut QueryBuilder<'_, Postgres>, company: Option<&str>) {
    if let Some(company) = company {
        qb.push(" AND lower(company) = lower(")
            .push_bind(company.trim().to_string())
            .push(")");
    }
}

fn push_ilike(qb: &mut QueryBuilder<'_, Postgres>, column: &str, needle: Option<&str>) {
    if let Some(needle) = needle.map(str::trim).filter(|n| !n.is_empty()) {
        qb.push(format!(" AND {column} ILIKE "))
            .push_bind(like_pattern(needle));
    }
}

/// `%needle%` with LIKE metacharacters escaped.
fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

#[async_trait::async_trait]
impl JobStore for PgJobStore {
    fn store_name(&self) -> &'static str {
        "postgres"
    }

    async fn latest_upload_date(&self) -> anyhow::Result<Option<NaiveDate>> {
        let row: (Option<NaiveDate>,) = sqlx::query_as(&format!(
            "SELECT MAX({UPLOAD_DATE}) FROM job_postings"
        ))
        .persistent(false)
        .fetch_one(&self.pool)
        .await
        .context("latest upload date query failed")?;
        Ok(row.0)
    }

    async fn count_uploaded_on(&self, date: NaiveDate) -> anyhow::Result<u64> {
        let row: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM job_postings WHERE {UPLOAD_DATE} = $1"
        ))
        .persistent(false)
        .bind(date)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("count uploads on {date} failed"))?;
        Ok(clamp_count(row.0) as u64)
    }

    async fn postings_for_windows(
        &self,
        windows: &ReportWindows,
        company: Option<&str>,
    ) -> anyhow::Result<Vec<JobPosting>> {
        let mut qb = select_postings();
        qb.push(format!(" AND (({UPLOAD_DATE} BETWEEN "))
            .push_bind(windows.fortnight_start)
            .push(" AND ")
            .push_bind(windows.reference_date)
            .push(") OR (COALESCE(posted_at, uploaded_at) >= ")
            .push_bind(windows.fresh_start)
            .push(" AND COALESCE(posted_at, uploaded_at) <= ")
            .push_bind(windows.fresh_end)
            .push("))");
        push_company_eq(&mut qb, company);
        self.fetch_postings(qb, "postings_for_windows").await
    }

    async fn postings_uploaded_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        company: Option<&str>,
    ) -> anyhow::Result<Vec<JobPosting>> {
        let mut qb = select_postings();
        qb.push(format!(" AND {UPLOAD_DATE} BETWEEN "))
            .push_bind(start)
            .push(" AND ")
            .push_bind(end);
        push_company_eq(&mut qb, company);
        self.fetch_postings(qb, "postings_uploaded_between").await
    }

    async fn postings_uploaded_on(
        &self,
        date: NaiveDate,
        filter: &ListingFilter,
    ) -> anyhow::Result<Vec<JobPosting>> {
        let mut qb = select_postings();
        qb.push(format!(" AND {UPLOAD_DATE} = ")).push_bind(date);
        push_ilike(&mut qb, "title", filter.role.as_deref());
        push_ilike(&mut qb, "company", filter.company.as_deref());
        push_ilike(&mut qb, "location", filter.location.as_deref());
        qb.push(" ORDER BY posted_at DESC NULLS LAST, id ASC");
        self.fetch_postings(qb, "postings_uploaded_on").await
    }

    async fn company_volumes(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        limit: usize,
    ) -> anyhow::Result<Vec<CompanyVolume>> {
        let rows = sqlx::query_as::<_, (String, i64)>(&format!(
            "SELECT MIN(company), COUNT(*) AS jobs \
             FROM job_postings \
             WHERE {UPLOAD_DATE} BETWEEN $1 AND $2 \
             GROUP BY lower(company) \
             ORDER BY jobs DESC, lower(company) ASC \
             LIMIT $3"
        ))
        .persistent(false)
        .bind(start)
        .bind(end)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("company volumes query failed")?;

        Ok(rows
            .into_iter()
            .map(|(company, jobs)| CompanyVolume {
                company,
                jobs: clamp_count(jobs),
            })
            .collect())
    }

    async fn role_definitions(&self) -> anyhow::Result<Vec<RoleDefinition>> {
        let rows = sqlx::query_as::<_, (String, Option<String>, Option<String>, Option<String>)>(
            "SELECT name, alternate_roles, keywords, job_titles_to_apply_for \
             FROM job_roles \
             ORDER BY id ASC",
        )
        .persistent(false)
        .fetch_all(&self.pool)
        .await
        .context("job_roles query failed")?;

        Ok(rows
            .into_iter()
            .map(|(name, alternates, keywords, titles)| RoleDefinition {
                name,
                alternate_roles: split_csv_column(alternates.as_deref()),
                keywords: split_csv_column(keywords.as_deref()),
                job_titles_to_apply_for: split_csv_column(titles.as_deref()),
            })
            .collect())
    }
}
