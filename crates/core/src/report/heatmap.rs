use chrono::NaiveDate;
use serde::Serialize;
use std::time::Instant;

use crate::aggregate::{industry_max_7d, top_by_volume, Aggregator, ReportWindows};
use crate::domain::metrics::CompanyMetrics;
use crate::roles::TitleResolver;
use crate::storage::JobStore;

pub const MAX_HEATMAP_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapMetadata {
    pub date: NaiveDate,
    pub total_companies: usize,
    pub industry_max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub companies: Vec<CompanyMetrics>,
    pub metadata: HeatmapMetadata,
}

/// The `limit` busiest companies of the week, scored against each other and listed by
/// hiring score.
pub async fn company_heatmap(
    store: &dyn JobStore,
    windows: &ReportWindows,
    limit: usize,
) -> anyhow::Result<Heatmap> {
    anyhow::ensure!(
        (1..=MAX_HEATMAP_LIMIT).contains(&limit),
        "limit must be between 1 and {MAX_HEATMAP_LIMIT} (got {limit})"
    );
    let t0 = Instant::now();

    let postings = store.postings_for_windows(windows, None).await?;
    let agg = Aggregator::new(windows, &TitleResolver);
    let batch = top_by_volume(agg.company_counts(&postings), limit);

    let industry_max = industry_max_7d(&batch);
    let mut companies: Vec<CompanyMetrics> = batch
        .iter()
        .map(|c| CompanyMetrics::score(c, industry_max))
        .collect();
    companies.sort_by(|a, b| b.hiring_score.cmp(&a.hiring_score));

    tracing::info!(
        date = %windows.reference_date,
        limit,
        companies = companies.len(),
        industry_max,
        elapsed_ms = t0.elapsed().as_millis(),
        "heatmap built"
    );

    Ok(Heatmap {
        metadata: HeatmapMetadata {
            date: windows.reference_date,
            total_companies: companies.len(),
            industry_max,
        },
        companies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixture;
    use crate::storage::memory::{posting, MemoryJobStore};

    #[tokio::test]
    async fn ranks_active_companies_by_hiring_score() {
        let store = fixture::store();
        let h = company_heatmap(&store, &fixture::windows(), 50).await.unwrap();

        let names: Vec<&str> = h.companies.iter().map(|m| m.company.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Globex"]);
        assert_eq!(
            h.metadata,
            HeatmapMetadata {
                date: fixture::reference(),
                total_companies: 2,
                industry_max: 6,
            }
        );
        assert_eq!(h.companies[0].hiring_score, 12);
        assert_eq!(h.companies[1].hiring_score, 4);
    }

    #[tokio::test]
    async fn limit_truncates_before_normalising() {
        let mut postings = fixture::postings();
        for i in 0..20 {
            postings.push(posting(500 + i, "Hooli", "SRE", fixture::days_ago(1)));
        }
        let store = MemoryJobStore::new(postings);

        let h = company_heatmap(&store, &fixture::windows(), 2).await.unwrap();
        let names: Vec<&str> = h.companies.iter().map(|m| m.company.as_str()).collect();
        assert_eq!(names, vec!["Hooli", "Acme"]);
        assert_eq!(h.metadata.industry_max, 20);
        assert_eq!(h.companies[0].intent_score, 78);
    }

    #[tokio::test]
    async fn rejects_out_of_range_limits() {
        let store = fixture::store();
        assert!(company_heatmap(&store, &fixture::windows(), 0).await.is_err());
        assert!(company_heatmap(&store, &fixture::windows(), MAX_HEATMAP_LIMIT + 1)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn empty_store_has_unit_industry_max() {
        let store = MemoryJobStore::default();
        let h = company_heatmap(&store, &fixture::windows(), 10).await.unwrap();
        assert!(h.companies.is_empty());
        assert_eq!(h.metadata.industry_max, 1);

        let v = serde_json::to_value(&h).unwrap();
        assert_eq!(v["metadata"]["totalCompanies"], 0);
        assert_eq!(v["metadata"]["industryMax"], 1);
    }
}
