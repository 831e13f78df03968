use serde::Serialize;

use crate::aggregate::windows::{ReportWindows, UploadWindow};
use crate::domain::posting::JobPosting;
use crate::domain::role::RoleDefinition;

/// Demand for one dictionary role over the 7d window.
///
/// A posting counts towards every role whose name or alternate name it contains, so these
/// totals can sum to more than the number of postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDemand {
    pub role_name: String,
    pub alternate_roles: Vec<String>,
    pub keywords: Vec<String>,
    pub job_titles_to_apply_for: Vec<String>,
    pub total_jobs: u32,
    pub jobs_today: u32,
    pub jobs_7d: u32,
}

pub fn role_demand(
    definitions: &[RoleDefinition],
    postings: &[JobPosting],
    windows: &ReportWindows,
) -> Vec<RoleDemand> {
    let week: Vec<(String, bool)> = postings
        .iter()
        .filter(|p| windows.classify_upload(p.upload_date()) == Some(UploadWindow::Week))
        .map(|p| {
            (
                p.title.to_lowercase(),
                p.upload_date() == windows.reference_date,
            )
        })
        .collect();

    let mut out: Vec<RoleDemand> = definitions
        .iter()
        .map(|def| {
            let needles: Vec<String> = std::iter::once(def.name.as_str())
                .chain(def.alternate_roles.iter().map(String::as_str))
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();

            let mut jobs_7d = 0u32;
            let mut jobs_today = 0u32;
            for (title, today) in &week {
                if needles.iter().any(|n| title.contains(n.as_str())) {
                    jobs_7d += 1;
                    if *today {
                        jobs_today += 1;
                    }
                }
            }

            RoleDemand {
                role_name: def.name.clone(),
                alternate_roles: def.alternate_roles.clone(),
                keywords: def.keywords.clone(),
                job_titles_to_apply_for: def.job_titles_to_apply_for.clone(),
                total_jobs: jobs_7d,
                jobs_today,
                jobs_7d,
            }
        })
        .collect();

    out.sort_by(|a, b| {
        b.jobs_7d
            .cmp(&a.jobs_7d)
            .then_with(|| a.role_name.cmp(&b.role_name))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::windows::FreshnessAnchor;
    use crate::storage::memory::posting;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn counts_name_and_alternate_matches_in_week() {
        let d = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 31, 18, 0, 0).unwrap();
        let windows = ReportWindows::new(d, now, FreshnessAnchor::ReferenceDate);

        let postings = vec![
            posting(1, "Acme", "Senior Data Engineer", d),
            posting(2, "Acme", "ML Researcher", d - chrono::Duration::days(3)),
            posting(3, "Globex", "Data Engineer", d - chrono::Duration::days(10)),
            posting(4, "Globex", "Accountant", d),
        ];
        let defs = vec![
            RoleDefinition::new("Data Engineer"),
            RoleDefinition::new("Data Scientist").with_alternates(["ML"]),
            RoleDefinition::new("Designer"),
        ];

        let demand = role_demand(&defs, &postings, &windows);
        assert_eq!(demand.len(), 3);
        assert_eq!(demand[0].role_name, "Data Engineer");
        assert_eq!(demand[0].jobs_7d, 1);
        assert_eq!(demand[0].jobs_today, 1);
        assert_eq!(demand[1].role_name, "Data Scientist");
        assert_eq!(demand[1].jobs_7d, 1);
        assert_eq!(demand[1].jobs_today, 0);
        assert_eq!(demand[2].role_name, "Designer");
        assert_eq!(demand[2].jobs_7d, 0);
    }
}
