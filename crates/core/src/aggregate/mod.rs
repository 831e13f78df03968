//! Turns postings into the per-company window counts the scorer consumes.

pub mod windows;

pub use windows::{FreshnessAnchor, ReportWindows, UploadWindow};

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::metrics::{CompanyCounts, CompanyMetrics, WindowCounts};
use crate::domain::posting::JobPosting;
use crate::domain::role::{RoleCount, RoleGroup};
use crate::roles::RoleResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub jobs: u32,
}

pub struct Aggregator<'a> {
    windows: &'a ReportWindows,
    resolver: &'a dyn RoleResolver,
}

#[derive(Default)]
struct CompanyBucket<'p> {
    spellings: BTreeMap<&'p str, u32>,
    counts: WindowCounts,
    week: Vec<&'p JobPosting>,
}

impl<'a> Aggregator<'a> {
    pub fn new(windows: &'a ReportWindows, resolver: &'a dyn RoleResolver) -> Self {
        Self { windows, resolver }
    }

    pub fn windows(&self) -> &ReportWindows {
        self.windows
    }

    /// Window counts over an arbitrary set of postings (typically one company's).
    pub fn window_counts<'p, I>(&self, postings: I) -> WindowCounts
    where
        I: IntoIterator<Item = &'p JobPosting>,
    {
        let mut counts = WindowCounts::default();
        for p in postings {
            self.tally(p, &mut counts);
        }
        counts
    }

    fn tally(&self, posting: &JobPosting, counts: &mut WindowCounts) {
        match self.windows.classify_upload(posting.upload_date()) {
            Some(UploadWindow::Week) => counts.jobs_7d += 1,
            Some(UploadWindow::PreviousWeek) => counts.jobs_prev_7d += 1,
            None => {}
        }
        if self.windows.is_fresh(posting) {
            counts.jobs_24h += 1;
        }
    }

    /// Groups postings by case-insensitive company name.
    ///
    /// Companies are returned by `jobs_7d` descending, then by display name. Companies
    /// whose postings all fall outside every window come back with zero counts.
    pub fn company_counts(&self, postings: &[JobPosting]) -> Vec<CompanyCounts> {
        let mut buckets: BTreeMap<String, CompanyBucket<'_>> = BTreeMap::new();

        for p in postings {
            let name = p.company.trim();
            if name.is_empty() {
                continue;
            }
            let bucket = buckets.entry(p.company_key()).or_default();
            *bucket.spellings.entry(name).or_insert(0) += 1;
            self.tally(p, &mut bucket.counts);
            if self.windows.in_week(p) {
                bucket.week.push(p);
            }
        }

        let mut out: Vec<CompanyCounts> = buckets
            .into_values()
            .map(|bucket| {
                let (dominant_role, dominant_role_count) =
                    match self.dominant_role(bucket.week.iter().copied()) {
                        Some((role, count)) => (Some(role), count),
                        None => (None, 0),
                    };
                CompanyCounts {
                    company: display_name(&bucket.spellings),
                    counts: bucket.counts,
                    dominant_role,
                    dominant_role_count,
                }
            })
            .collect();

        out.sort_by(|a, b| {
            b.counts
                .jobs_7d
                .cmp(&a.counts.jobs_7d)
                .then_with(|| a.company.cmp(&b.company))
        });
        out
    }

    /// Most frequent role among the given postings. Ties go to the alphabetically first role.
    pub fn dominant_role<'p, I>(&self, postings: I) -> Option<(String, u32)>
    where
        I: IntoIterator<Item = &'p JobPosting>,
    {
        let mut by_role: BTreeMap<String, u32> = BTreeMap::new();
        for p in postings {
            *by_role.entry(self.resolver.role_for(p)).or_insert(0) += 1;
        }

        let mut best: Option<(String, u32)> = None;
        for (role, count) in by_role {
            match &best {
                Some((_, best_count)) if count <= *best_count => {}
                _ => best = Some((role, count)),
            }
        }
        best
    }

    /// `{role, count}` pairs ordered by role name; ranking by count is left to the caller.
    pub fn role_counts(&self, postings: &[JobPosting]) -> Vec<RoleCount> {
        let mut by_role: BTreeMap<String, u32> = BTreeMap::new();
        for p in postings {
            *by_role.entry(self.resolver.role_for(p)).or_insert(0) += 1;
        }
        by_role
            .into_iter()
            .map(|(role, count)| RoleCount { role, count })
            .collect()
    }

    /// Groups postings by resolved role, largest group first (ties by role name).
    pub fn role_groups(&self, postings: Vec<JobPosting>) -> Vec<RoleGroup> {
        let mut by_role: BTreeMap<String, Vec<JobPosting>> = BTreeMap::new();
        for p in postings {
            by_role.entry(self.resolver.role_for(&p)).or_default().push(p);
        }

        let mut groups: Vec<RoleGroup> = by_role
            .into_iter()
            .map(|(role, postings)| RoleGroup {
                count: postings.len() as u32,
                role,
                postings,
            })
            .collect();
        groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.role.cmp(&b.role)));
        groups
    }

    /// One point per day of the 7d window, zero-filled.
    pub fn daily_counts(&self, postings: &[JobPosting]) -> Vec<DailyCount> {
        let mut by_day: BTreeMap<NaiveDate, u32> = self
            .windows
            .week_days()
            .into_iter()
            .map(|d| (d, 0))
            .collect();
        for p in postings {
            if let Some(n) = by_day.get_mut(&p.upload_date()) {
                *n += 1;
            }
        }
        by_day
            .into_iter()
            .map(|(date, jobs)| DailyCount { date, jobs })
            .collect()
    }
}

fn display_name(spellings: &BTreeMap<&str, u32>) -> String {
    let mut best: Option<(&str, u32)> = None;
    for (&name, &count) in spellings {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((name, count)),
        }
    }
    best.map(|(name, _)| name.to_string()).unwrap_or_default()
}

/// Normalisation ceiling for a batch: the largest `jobs_7d`, never below 1.
pub fn industry_max_7d(batch: &[CompanyCounts]) -> u32 {
    batch
        .iter()
        .map(|c| c.counts.jobs_7d)
        .max()
        .unwrap_or(0)
        .max(1)
}

/// Scores every company against the same batch maximum.
pub fn score_batch(batch: &[CompanyCounts]) -> Vec<CompanyMetrics> {
    let max = industry_max_7d(batch);
    batch
        .iter()
        .map(|c| CompanyMetrics::score(c, max))
        .collect()
}

/// Companies active in the 7d window, busiest first, capped at `limit`.
pub fn top_by_volume(mut counts: Vec<CompanyCounts>, limit: usize) -> Vec<CompanyCounts> {
    counts.retain(|c| c.counts.jobs_7d > 0);
    counts.sort_by(|a, b| {
        b.counts
            .jobs_7d
            .cmp(&a.counts.jobs_7d)
            .then_with(|| a.company.cmp(&b.company))
    });
    counts.truncate(limit);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::TitleResolver;
    use crate::storage::memory::{posting, posting_at};
    use chrono::{Duration, TimeZone, Utc};

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
    }

    fn windows() -> ReportWindows {
        let now = Utc.with_ymd_and_hms(2026, 2, 3, 10, 0, 0).unwrap();
        ReportWindows::new(reference(), now, FreshnessAnchor::ReferenceDate)
    }

    fn days_ago(n: i64) -> NaiveDate {
        reference() - Duration::days(n)
    }

    fn acme_snapshot() -> Vec<JobPosting> {
        let mut out = Vec::new();
        let mut id = 0;
        let mut push = |company: &str, title: &str, day: NaiveDate| {
            id += 1;
            out.push(posting(id, company, title, day));
        };
        // 10 on the reference date (fresh), 30 more across the rest of the 7d window.
        for i in 0..10 {
            push("Acme", if i < 7 { "Engineer" } else { "Designer" }, days_ago(0));
        }
        for i in 0..30 {
            let title = if i < 18 { "Engineer" } else { "Recruiter" };
            push(if i % 2 == 0 { "ACME" } else { "Acme" }, title, days_ago(1 + (i % 7)));
        }
        // 30 in the previous week.
        for i in 0..30 {
            push("Acme", "Engineer", days_ago(8 + (i % 7)));
        }
        // Out of range on both sides.
        push("Acme", "Engineer", days_ago(15));
        push("Acme", "Engineer", reference() + Duration::days(1));
        out
    }

    #[test]
    fn reference_scenario_counts_and_scores() {
        let w = windows();
        let agg = Aggregator::new(&w, &TitleResolver);
        let counts = agg.company_counts(&acme_snapshot());

        assert_eq!(counts.len(), 1);
        let acme = &counts[0];
        assert_eq!(acme.company, "Acme");
        assert_eq!(acme.counts, WindowCounts::new(10, 40, 30));
        assert_eq!(acme.dominant_role.as_deref(), Some("Engineer"));
        assert_eq!(acme.dominant_role_count, 25);

        let m = CompanyMetrics::score(acme, 100);
        assert_eq!(m.hiring_score, 80);
        assert_eq!(m.intent_score, 41);
    }

    #[test]
    fn fourteen_day_window_is_sum_of_halves() {
        let w = windows();
        let agg = Aggregator::new(&w, &TitleResolver);
        let mut postings = acme_snapshot();
        for i in 0..40 {
            postings.push(posting(1000 + i, "Globex", "Analyst", days_ago(i % 20)));
        }
        for c in agg.company_counts(&postings) {
            let in_range = postings
                .iter()
                .filter(|p| p.company_key() == c.company.to_lowercase())
                .filter(|p| w.classify_upload(p.upload_date()).is_some())
                .count() as u32;
            assert_eq!(c.counts.jobs_14d(), c.counts.jobs_7d + c.counts.jobs_prev_7d);
            assert_eq!(c.counts.jobs_14d(), in_range);
        }
    }

    #[test]
    fn aggregation_is_idempotent() {
        let w = windows();
        let agg = Aggregator::new(&w, &TitleResolver);
        let postings = acme_snapshot();
        let first = score_batch(&agg.company_counts(&postings));
        let second = score_batch(&agg.company_counts(&postings));
        assert_eq!(first, second);
    }

    #[test]
    fn empty_snapshot_yields_no_companies_and_zero_counts() {
        let w = windows();
        let agg = Aggregator::new(&w, &TitleResolver);
        assert!(agg.company_counts(&[]).is_empty());
        assert_eq!(agg.window_counts(std::iter::empty()), WindowCounts::default());
        assert_eq!(industry_max_7d(&[]), 1);
        let trend = agg.daily_counts(&[]);
        assert_eq!(trend.len(), 8);
        assert!(trend.iter().all(|d| d.jobs == 0));
    }

    #[test]
    fn dominant_role_ties_break_alphabetically() {
        let w = windows();
        let agg = Aggregator::new(&w, &TitleResolver);
        let postings = vec![
            posting(1, "Initech", "Tester", days_ago(1)),
            posting(2, "Initech", "Analyst", days_ago(2)),
            posting(3, "Initech", "Tester", days_ago(3)),
            posting(4, "Initech", "Analyst", days_ago(4)),
            // Previous-week postings never decide the dominant role.
            posting(5, "Initech", "Zookeeper", days_ago(9)),
            posting(6, "Initech", "Zookeeper", days_ago(10)),
            posting(7, "Initech", "Zookeeper", days_ago(11)),
        ];
        let counts = agg.company_counts(&postings);
        assert_eq!(counts[0].dominant_role.as_deref(), Some("Analyst"));
        assert_eq!(counts[0].dominant_role_count, 2);
    }

    #[test]
    fn company_without_week_postings_has_no_dominant_role() {
        let w = windows();
        let agg = Aggregator::new(&w, &TitleResolver);
        let postings = vec![posting(1, "Umbrella", "Chemist", days_ago(12))];
        let counts = agg.company_counts(&postings);
        assert_eq!(counts[0].counts, WindowCounts::new(0, 0, 1));
        assert!(counts[0].dominant_role.is_none());
        assert!(top_by_volume(counts, 10).is_empty());
    }

    #[test]
    fn freshness_uses_posted_timestamp() {
        let w = windows();
        let agg = Aggregator::new(&w, &TitleResolver);
        let uploaded = Utc.with_ymd_and_hms(2026, 1, 31, 8, 0, 0).unwrap();
        let stale = Utc.with_ymd_and_hms(2026, 1, 20, 8, 0, 0).unwrap();
        let postings = vec![
            posting_at(1, "Hooli", "SRE", uploaded, Some(uploaded)),
            posting_at(2, "Hooli", "SRE", uploaded, Some(stale)),
            posting_at(3, "Hooli", "SRE", uploaded, None),
        ];
        let c = agg.window_counts(&postings);
        assert_eq!(c.jobs_7d, 3);
        assert_eq!(c.jobs_24h, 2);
    }

    #[test]
    fn wall_clock_freshness_ignores_reference_date() {
        let now = Utc.with_ymd_and_hms(2026, 2, 3, 10, 0, 0).unwrap();
        let w = ReportWindows::new(reference(), now, FreshnessAnchor::WallClock);
        let agg = Aggregator::new(&w, &TitleResolver);
        let uploaded = Utc.with_ymd_and_hms(2026, 1, 31, 8, 0, 0).unwrap();
        let postings = vec![
            posting_at(1, "Hooli", "SRE", uploaded, Some(uploaded)),
            posting_at(2, "Hooli", "SRE", uploaded, Some(now - Duration::hours(2))),
        ];
        let c = agg.window_counts(&postings);
        assert_eq!(c.jobs_24h, 1);
    }

    #[test]
    fn batch_scores_share_one_industry_max() {
        let batch = vec![
            CompanyCounts {
                company: "Big".to_string(),
                counts: WindowCounts::new(0, 80, 80),
                dominant_role: None,
                dominant_role_count: 0,
            },
            CompanyCounts {
                company: "Small".to_string(),
                counts: WindowCounts::new(0, 20, 20),
                dominant_role: None,
                dominant_role_count: 0,
            },
        ];
        assert_eq!(industry_max_7d(&batch), 80);
        let scored = score_batch(&batch);
        // volume 100 / 25, momentum pct 0 -> 20 for both
        assert_eq!(scored[0].intent_score, 46);
        assert_eq!(scored[1].intent_score, 16);

        // Scoring the small company alone makes it the maximum.
        let alone = score_batch(&batch[1..]);
        assert_eq!(alone[0].intent_score, 46);
    }

    #[test]
    fn top_by_volume_orders_and_truncates() {
        let make = |name: &str, jobs_7d: u32| CompanyCounts {
            company: name.to_string(),
            counts: WindowCounts::new(0, jobs_7d, 0),
            dominant_role: None,
            dominant_role_count: 0,
        };
        let top = top_by_volume(
            vec![make("b", 5), make("a", 5), make("c", 9), make("d", 0)],
            2,
        );
        let names: Vec<_> = top.iter().map(|c| c.company.as_str()).collect();
        assert_eq!(names, vec!["c", "a"]);
    }

    #[test]
    fn role_groups_and_counts() {
        let w = windows();
        let agg = Aggregator::new(&w, &TitleResolver);
        let postings = vec![
            posting(1, "Acme", "Engineer", days_ago(0)),
            posting(2, "Acme", "Designer", days_ago(0)),
            posting(3, "Globex", "Engineer", days_ago(1)),
        ];
        let counts = agg.role_counts(&postings);
        assert_eq!(
            counts,
            vec![
                RoleCount { role: "Designer".to_string(), count: 1 },
                RoleCount { role: "Engineer".to_string(), count: 2 },
            ]
        );
        let groups = agg.role_groups(postings);
        assert_eq!(groups[0].role, "Engineer");
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].postings.len(), 2);
    }

    #[test]
    fn daily_counts_fill_the_week() {
        let w = windows();
        let agg = Aggregator::new(&w, &TitleResolver);
        let postings = vec![
            posting(1, "Acme", "Engineer", days_ago(0)),
            posting(2, "Acme", "Engineer", days_ago(0)),
            posting(3, "Acme", "Engineer", days_ago(7)),
            posting(4, "Acme", "Engineer", days_ago(8)),
        ];
        let trend = agg.daily_counts(&postings);
        assert_eq!(trend.first().map(|d| (d.date, d.jobs)), Some((days_ago(7), 1)));
        assert_eq!(trend.last().map(|d| (d.date, d.jobs)), Some((reference(), 2)));
        assert_eq!(trend.iter().map(|d| d.jobs).sum::<u32>(), 3);
    }
}
