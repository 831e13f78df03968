//! Mapping free-text job titles onto canonical role names.

pub mod demand;

use crate::domain::posting::JobPosting;
use crate::domain::role::RoleDefinition;

pub trait RoleResolver: Send + Sync {
    /// Canonical role for a title, if the resolver recognises one.
    fn resolve(&self, title: &str) -> Option<String>;

    fn resolve_or_title(&self, title: &str) -> String {
        self.resolve(title)
            .unwrap_or_else(|| title.trim().to_string())
    }

    /// Role for a posting: upstream tag first, then `resolve`, then the raw title.
    fn role_for(&self, posting: &JobPosting) -> String {
        if let Some(role) = posting.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            return role.to_string();
        }
        self.resolve_or_title(&posting.title)
    }
}

/// Uses the pre-tagged role or the raw title as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleResolver;

impl RoleResolver for TitleResolver {
    fn resolve(&self, _title: &str) -> Option<String> {
        None
    }
}

/// Substring matcher over the role dictionary.
///
/// Longest role name contained in the title wins; failing that, the longest alternate name.
#[derive(Debug, Clone, Default)]
pub struct DictionaryResolver {
    names: Vec<Needle>,
    alternates: Vec<Needle>,
}

#[derive(Debug, Clone)]
struct Needle {
    lowered: String,
    role: String,
}

impl DictionaryResolver {
    pub fn new(definitions: &[RoleDefinition]) -> Self {
        let mut names = Vec::with_capacity(definitions.len());
        let mut alternates = Vec::new();

        for def in definitions {
            let name = def.name.trim();
            if name.is_empty() {
                continue;
            }
            names.push(Needle {
                lowered: name.to_lowercase(),
                role: name.to_string(),
            });
            for alt in &def.alternate_roles {
                let alt = alt.trim();
                if alt.is_empty() {
                    continue;
                }
                alternates.push(Needle {
                    lowered: alt.to_lowercase(),
                    role: name.to_string(),
                });
            }
        }

        // Longest first; equal lengths keep dictionary order.
        names.sort_by(|a, b| b.lowered.len().cmp(&a.lowered.len()));
        alternates.sort_by(|a, b| b.lowered.len().cmp(&a.lowered.len()));

        Self { names, alternates }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl RoleResolver for DictionaryResolver {
    fn resolve(&self, title: &str) -> Option<String> {
        let title = title.to_lowercase();
        self.names
            .iter()
            .chain(self.alternates.iter())
            .find(|n| title.contains(&n.lowered))
            .map(|n| n.role.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn dictionary() -> DictionaryResolver {
        DictionaryResolver::new(&[
            RoleDefinition::new("Engineer"),
            RoleDefinition::new("Software Engineer").with_alternates(["SWE", "Developer"]),
            RoleDefinition::new("Data Scientist").with_alternates(["ML Engineer", "Machine Learning"]),
        ])
    }

    #[test]
    fn longest_role_name_wins() {
        let r = dictionary();
        assert_eq!(
            r.resolve("Senior Software Engineer, Payments").as_deref(),
            Some("Software Engineer")
        );
        assert_eq!(r.resolve("Site Reliability Engineer").as_deref(), Some("Engineer"));
    }

    #[test]
    fn names_take_priority_over_alternates() {
        let r = dictionary();
        // "ML Engineer" is a longer alternate, but a role name match comes first.
        assert_eq!(r.resolve("Staff ML Engineer").as_deref(), Some("Engineer"));
        assert_eq!(
            r.resolve("Machine Learning Researcher").as_deref(),
            Some("Data Scientist")
        );
        assert_eq!(r.resolve("swe intern").as_deref(), Some("Software Engineer"));
    }

    #[test]
    fn falls_back_to_raw_title() {
        let r = dictionary();
        let posting = JobPosting::new(
            1,
            "Acme",
            " Head of Sales ",
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        );
        assert_eq!(r.role_for(&posting), "Head of Sales");
        assert_eq!(TitleResolver.role_for(&posting), "Head of Sales");

        let tagged = JobPosting {
            role: Some("Sales".to_string()),
            ..posting
        };
        assert_eq!(r.role_for(&tagged), "Sales");
    }
}
