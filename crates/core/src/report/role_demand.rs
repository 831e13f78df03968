use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::ReportWindows;
use crate::roles::demand::{role_demand, RoleDemand};
use crate::storage::JobStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDemandMetadata {
    pub date: NaiveDate,
    pub total_roles: usize,
    pub active_roles: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDemandReport {
    pub roles: Vec<RoleDemand>,
    pub metadata: RoleDemandMetadata,
}

pub async fn role_demand_report(
    store: &dyn JobStore,
    windows: &ReportWindows,
) -> anyhow::Result<RoleDemandReport> {
    let definitions = store.role_definitions().await?;
    let postings = store
        .postings_uploaded_between(windows.week_start, windows.reference_date, None)
        .await?;

    let roles = role_demand(&definitions, &postings, windows);
    let active_roles = roles.iter().filter(|r| r.jobs_7d > 0).count();
    tracing::debug!(
        date = %windows.reference_date,
        roles = roles.len(),
        active_roles,
        "role demand built"
    );

    Ok(RoleDemandReport {
        metadata: RoleDemandMetadata {
            date: windows.reference_date,
            total_roles: roles.len(),
            active_roles,
        },
        roles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::role::RoleDefinition;
    use crate::report::fixture;
    use crate::storage::memory::MemoryJobStore;

    #[tokio::test]
    async fn counts_week_and_today_per_role() {
        let store = fixture::store();
        let report = role_demand_report(&store, &fixture::windows()).await.unwrap();

        let summary: Vec<(&str, u32, u32)> = report
            .roles
            .iter()
            .map(|r| (r.role_name.as_str(), r.jobs_7d, r.jobs_today))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Software Engineer", 5, 3),
                ("Nurse", 2, 0),
                ("Data Analyst", 1, 0),
            ]
        );
        assert_eq!(report.metadata.total_roles, 3);
        assert_eq!(report.metadata.active_roles, 3);
    }

    #[tokio::test]
    async fn inactive_roles_are_listed_but_not_active() {
        let store = MemoryJobStore::new(fixture::postings())
            .with_roles(vec![RoleDefinition::new("Pilot")]);
        let report = role_demand_report(&store, &fixture::windows()).await.unwrap();
        assert_eq!(report.roles.len(), 1);
        assert_eq!(report.roles[0].jobs_7d, 0);
        assert_eq!(report.metadata.active_roles, 0);

        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["metadata"]["totalRoles"], 1);
        assert_eq!(v["roles"][0]["roleName"], "Pilot");
    }
}
