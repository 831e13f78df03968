use chrono::NaiveDate;
use serde::Serialize;

use crate::listings::{group_by_role, group_by_title, paginate, GroupedListings, ListingPage, PageRequest};
use crate::roles::DictionaryResolver;
use crate::storage::{JobStore, ListingFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    ByTitle,
    Paged(PageRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JobListings {
    Grouped(GroupedListings),
    Paged(ListingPage),
}

/// Postings uploaded on `date`, either grouped by raw title or as one page of a flat list.
pub async fn job_listings(
    store: &dyn JobStore,
    date: NaiveDate,
    filter: &ListingFilter,
    mode: ListingMode,
) -> anyhow::Result<JobListings> {
    let postings = store.postings_uploaded_on(date, filter).await?;
    tracing::debug!(%date, postings = postings.len(), ?mode, "job listings");

    Ok(match mode {
        ListingMode::ByTitle => JobListings::Grouped(group_by_title(&postings)),
        ListingMode::Paged(req) => JobListings::Paged(paginate(&postings, req)),
    })
}

/// Postings uploaded on `date`, grouped by canonical role from the role dictionary.
pub async fn normalized_listings(
    store: &dyn JobStore,
    date: NaiveDate,
    filter: &ListingFilter,
) -> anyhow::Result<GroupedListings> {
    let definitions = store.role_definitions().await?;
    let resolver = DictionaryResolver::new(&definitions);
    if resolver.is_empty() {
        tracing::warn!("role dictionary is empty; grouping by raw title");
    }

    let postings = store.postings_uploaded_on(date, filter).await?;
    Ok(group_by_role(&postings, &resolver))
}
