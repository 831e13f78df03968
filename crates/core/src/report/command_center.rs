use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;

use crate::aggregate::{score_batch, top_by_volume, Aggregator, DailyCount, ReportWindows};
use crate::domain::metrics::CompanyMetrics;
use crate::roles::TitleResolver;
use crate::scoring::week_over_week_growth;
use crate::storage::{JobStore, ListingFilter};

pub const TOP_COMPANIES: usize = 10;
/// Intent score at which a top company counts as high intent on the overview.
pub const OVERVIEW_HIGH_INTENT: u8 = 70;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandCenterStats {
    pub total_active_jobs: u64,
    pub unique_companies: u64,
    pub high_intent_companies_count: u32,
    pub jobs_posted_today: u64,
    pub wow_growth: f64,
    /// Upload day the counts above describe; differs from the request date after a fallback.
    pub stats_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandCenter {
    pub stats: CommandCenterStats,
    pub global_trend: Vec<DailyCount>,
    pub top_hiring_companies: Vec<CompanyMetrics>,
}

/// Overview for the whole market.
///
/// Day stats fall back to the latest upload day with data when the reference date has none;
/// the trend, growth and top companies always use the requested windows.
pub async fn command_center(
    store: &dyn JobStore,
    windows: &ReportWindows,
) -> anyhow::Result<CommandCenter> {
    let t0 = Instant::now();
    let date = windows.reference_date;

    let stats_date = if store.count_uploaded_on(date).await? > 0 {
        date
    } else {
        match store.latest_upload_date().await? {
            Some(latest) => {
                tracing::info!(%date, %latest, "no uploads on requested date; using latest");
                latest
            }
            None => date,
        }
    };
    let stats_windows = windows.rebased(stats_date);
    let day = store
        .postings_uploaded_on(stats_date, &ListingFilter::default())
        .await?;
    let unique_companies = day
        .iter()
        .map(|p| p.company_key())
        .collect::<HashSet<_>>()
        .len() as u64;
    let jobs_posted_today = day.iter().filter(|p| stats_windows.is_fresh(p)).count() as u64;

    let postings = store.postings_for_windows(windows, None).await?;
    let agg = Aggregator::new(windows, &TitleResolver);
    let counts = agg.company_counts(&postings);

    let (jobs_current, jobs_previous) = counts.iter().fold((0u64, 0u64), |(cur, prev), c| {
        (
            cur + c.counts.jobs_7d as u64,
            prev + c.counts.jobs_prev_7d as u64,
        )
    });

    let top_hiring_companies = score_batch(&top_by_volume(counts, TOP_COMPANIES));
    let high_intent_companies_count = top_hiring_companies
        .iter()
        .filter(|m| m.intent_score >= OVERVIEW_HIGH_INTENT)
        .count() as u32;

    tracing::info!(
        %date,
        %stats_date,
        postings = postings.len(),
        elapsed_ms = t0.elapsed().as_millis(),
        "command center built"
    );

    Ok(CommandCenter {
        stats: CommandCenterStats {
            total_active_jobs: day.len() as u64,
            unique_companies,
            high_intent_companies_count,
            jobs_posted_today,
            wow_growth: week_over_week_growth(jobs_current, jobs_previous),
            stats_date,
        },
        global_trend: agg.daily_counts(&postings),
        top_hiring_companies,
    })
}
