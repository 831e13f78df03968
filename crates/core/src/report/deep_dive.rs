use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::aggregate::{Aggregator, DailyCount, ReportWindows};
use crate::domain::metrics::{CompanyCounts, CompanyMetrics, Momentum, Trend};
use crate::domain::posting::JobPosting;
use crate::insights::{
    deep_dive_signals, location_distribution, seniority_by_title, LocationCount, RoleSeniority,
};
use crate::roles::TitleResolver;
use crate::storage::JobStore;

/// A company must have postings uploaded within this many days to be reported on.
pub const LOOKBACK_DAYS: i64 = 30;
const SENIORITY_MIN_POSTINGS: u32 = 2;
const SENIORITY_TITLES: usize = 5;
const TOP_LOCATIONS: usize = 10;
const DEFAULT_INDUSTRY: &str = "Technology";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepDiveMetadata {
    pub name: String,
    pub industry: String,
    /// Hiring score.
    pub score: u8,
    pub intent_score: u8,
    pub momentum: Momentum,
    pub trend: Trend,
    pub jobs_24h: u32,
    pub jobs_7d: u32,
    pub total_jobs: u32,
    pub dominant_role: Option<String>,
    pub growth_percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDeepDive {
    pub metadata: DeepDiveMetadata,
    pub hiring_trend: Vec<DailyCount>,
    pub seniority_distribution: Vec<RoleSeniority>,
    pub location_distribution: Vec<LocationCount>,
    pub intent_signals: Vec<String>,
}

/// Full profile of one company, matched case-insensitively.
///
/// Returns `None` when the company has no postings uploaded in the trailing
/// [`LOOKBACK_DAYS`]. Volume is normalised against the busiest company of the same week.
pub async fn company_deep_dive(
    store: &dyn JobStore,
    windows: &ReportWindows,
    company: &str,
) -> anyhow::Result<Option<CompanyDeepDive>> {
    let t0 = Instant::now();
    let date = windows.reference_date;

    let recent = store
        .postings_uploaded_between(windows.lookback_start(LOOKBACK_DAYS), date, Some(company))
        .await?;
    if recent.is_empty() {
        tracing::info!(%date, company, "no recent postings for company");
        return Ok(None);
    }

    let windowed = store.postings_for_windows(windows, Some(company)).await?;
    let agg = Aggregator::new(windows, &TitleResolver);
    let week: Vec<&JobPosting> = windowed.iter().filter(|p| windows.in_week(p)).collect();

    let (dominant_role, dominant_role_count) = match agg.dominant_role(week.iter().copied()) {
        Some((role, count)) => (Some(role), count),
        None => (None, 0),
    };
    let name = agg
        .company_counts(&recent)
        .into_iter()
        .next()
        .map(|c| c.company)
        .unwrap_or_else(|| company.trim().to_string());

    let industry_max = store
        .company_volumes(windows.week_start, date, 1)
        .await?
        .first()
        .map(|v| v.jobs)
        .unwrap_or(0)
        .max(1);

    let counts = CompanyCounts {
        company: name.clone(),
        counts: agg.window_counts(&windowed),
        dominant_role,
        dominant_role_count,
    };
    let metrics = CompanyMetrics::score(&counts, industry_max);

    let week_owned: Vec<JobPosting> = week.into_iter().cloned().collect();

    tracing::info!(
        %date,
        company = %name,
        recent = recent.len(),
        industry_max,
        elapsed_ms = t0.elapsed().as_millis(),
        "deep dive built"
    );

    Ok(Some(CompanyDeepDive {
        metadata: DeepDiveMetadata {
            name,
            industry: most_common_industry(&recent).unwrap_or_else(|| DEFAULT_INDUSTRY.to_string()),
            score: metrics.hiring_score,
            intent_score: metrics.intent_score,
            momentum: metrics.momentum,
            trend: metrics.trend,
            jobs_24h: metrics.jobs_24h,
            jobs_7d: metrics.jobs_7d,
            total_jobs: recent.len() as u32,
            dominant_role: metrics.dominant_role.clone(),
            growth_percentage: metrics.growth_percentage,
        },
        hiring_trend: agg.daily_counts(&recent),
        seniority_distribution: seniority_by_title(
            &week_owned,
            SENIORITY_MIN_POSTINGS,
            SENIORITY_TITLES,
        ),
        location_distribution: location_distribution(&week_owned, TOP_LOCATIONS),
        intent_signals: deep_dive_signals(&metrics),
    }))
}

fn most_common_industry(postings: &[JobPosting]) -> Option<String> {
    let mut by_industry: BTreeMap<&str, u32> = BTreeMap::new();
    for industry in postings
        .iter()
        .filter_map(|p| p.industry.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        *by_industry.entry(industry).or_insert(0) += 1;
    }
    let mut best: Option<(&str, u32)> = None;
    for (industry, count) in by_industry {
        match best {
            Some((_, n)) if count <= n => {}
            _ => best = Some((industry, count)),
        }
    }
    best.map(|(industry, _)| industry.to_string())
}
