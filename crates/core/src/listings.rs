//! Listing views over one upload day: grouped by title, grouped by canonical role, or paged.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::HashMap;

use crate::domain::posting::{JobPosting, ListingView};
use crate::roles::RoleResolver;

/// Jobs returned per title group; `count` still reports the full group size.
pub const MAX_JOBS_PER_GROUP: usize = 100;
pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const MAX_PAGE_LIMIT: u32 = 500;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingGroup {
    pub count: u32,
    pub jobs: Vec<ListingView>,
}

/// Groups keyed by title or role, serialised as a JSON object in ranking order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedListings(pub Vec<(String, ListingGroup)>);

impl GroupedListings {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ListingGroup> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, g)| g)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for GroupedListings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, group) in &self.0 {
            map.serialize_entry(key, group)?;
        }
        map.end()
    }
}

/// Expects `postings` newest posted first, as the store returns them.
fn group_by<F>(postings: &[JobPosting], cap: Option<usize>, key_of: F) -> GroupedListings
where
    F: Fn(&JobPosting) -> String,
{
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, ListingGroup> = HashMap::new();

    for p in postings {
        let key = key_of(p);
        let group = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            ListingGroup {
                count: 0,
                jobs: Vec::new(),
            }
        });
        group.count += 1;
        if cap.map_or(true, |cap| group.jobs.len() < cap) {
            group.jobs.push(ListingView::from(p));
        }
    }

    let mut out: Vec<(String, ListingGroup)> = order
        .into_iter()
        .filter_map(|key| groups.remove(&key).map(|g| (key, g)))
        .collect();
    out.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(&b.0)));
    GroupedListings(out)
}

/// Groups by the raw job title, capping each group's job list.
pub fn group_by_title(postings: &[JobPosting]) -> GroupedListings {
    group_by(postings, Some(MAX_JOBS_PER_GROUP), |p| p.title.clone())
}

/// Groups by canonical role, every job included.
pub fn group_by_role(postings: &[JobPosting], resolver: &dyn RoleResolver) -> GroupedListings {
    group_by(postings, None, |p| resolver.role_for(p))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> anyhow::Result<Self> {
        anyhow::ensure!(page >= 1, "page must be >= 1 (got {page})");
        anyhow::ensure!(
            (1..=MAX_PAGE_LIMIT).contains(&limit),
            "limit must be between 1 and {MAX_PAGE_LIMIT} (got {limit})"
        );
        Ok(Self { page, limit })
    }

    fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingPage {
    pub jobs: Vec<ListingView>,
    pub pagination: Pagination,
}

pub fn paginate(postings: &[JobPosting], req: PageRequest) -> ListingPage {
    let total = postings.len() as u64;
    let jobs = postings
        .iter()
        .skip(req.offset())
        .take(req.limit as usize)
        .map(ListingView::from)
        .collect();

    ListingPage {
        jobs,
        pagination: Pagination {
            page: req.page,
            limit: req.limit,
            total,
            total_pages: total.div_ceil(req.limit as u64),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::role::RoleDefinition;
    use crate::roles::DictionaryResolver;
    use chrono::{Duration, TimeZone, Utc};

    fn postings(titles: &[&str]) -> Vec<JobPosting> {
        let base = Utc.with_ymd_and_hms(2026, 1, 31, 23, 0, 0).unwrap();
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let mut p = JobPosting::new(i as i64 + 1, "Acme", *t, base);
                p.posted_at = Some(base - Duration::minutes(i as i64));
                p
            })
            .collect()
    }

    #[test]
    fn groups_by_title_largest_first() {
        let ps = postings(&["Nurse", "Engineer", "Nurse", "Analyst", "Engineer", "Nurse"]);
        let grouped = group_by_title(&ps);
        let keys: Vec<&str> = grouped.keys().collect();
        assert_eq!(keys, vec!["Nurse", "Engineer", "Analyst"]);
        let nurse = grouped.get("Nurse").unwrap();
        assert_eq!(nurse.count, 3);
        let ids: Vec<i64> = nurse.jobs.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![1, 3, 6]);
    }

    #[test]
    fn title_groups_cap_jobs_but_not_count() {
        let titles = vec!["Engineer"; 130];
        let grouped = group_by_title(&postings(&titles));
        let g = grouped.get("Engineer").unwrap();
        assert_eq!(g.count, 130);
        assert_eq!(g.jobs.len(), MAX_JOBS_PER_GROUP);
    }

    #[test]
    fn groups_by_canonical_role() {
        let resolver = DictionaryResolver::new(&[
            RoleDefinition::new("Software Engineer").with_alternates(["SWE", "Developer"]),
            RoleDefinition::new("Data Analyst"),
        ]);
        let ps = postings(&[
            "Senior Software Engineer",
            "Backend Developer",
            "Data Analyst II",
            "Barista",
        ]);
        let grouped = group_by_role(&ps, &resolver);
        assert_eq!(grouped.get("Software Engineer").unwrap().count, 2);
        assert_eq!(grouped.get("Data Analyst").unwrap().count, 1);
        assert_eq!(grouped.get("Barista").unwrap().count, 1);
        assert_eq!(grouped.keys().next(), Some("Software Engineer"));
    }

    #[test]
    fn grouped_json_is_an_object_in_rank_order() {
        let grouped = group_by_title(&postings(&["B", "A", "A"]));
        let raw = serde_json::to_string(&grouped).unwrap();
        assert!(raw.starts_with(r#"{"A":{"count":2"#));
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["B"]["jobs"][0]["job_title"], "B");
    }

    #[test]
    fn paginates_with_totals() {
        let ps = postings(&["x"; 7]);
        let page = paginate(&ps, PageRequest::new(2, 3).unwrap());
        let ids: Vec<i64> = page.jobs.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![4, 5, 6]);
        assert_eq!(
            page.pagination,
            Pagination { page: 2, limit: 3, total: 7, total_pages: 3 }
        );

        let past_end = paginate(&ps, PageRequest::new(9, 3).unwrap());
        assert!(past_end.jobs.is_empty());
        assert_eq!(past_end.pagination.total, 7);

        let empty = paginate(&[], PageRequest::default());
        assert_eq!(empty.pagination.total_pages, 0);
    }

    #[test]
    fn rejects_out_of_range_page_requests() {
        assert!(PageRequest::new(0, 10).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert!(PageRequest::new(1, MAX_PAGE_LIMIT + 1).is_err());
        assert!(PageRequest::new(1, MAX_PAGE_LIMIT).is_ok());
    }
}
