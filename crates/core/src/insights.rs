//! Human-readable signals and simple distributions layered on top of the scores.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::metrics::{CompanyMetrics, Momentum};
use crate::domain::posting::JobPosting;

pub const HIGH_INTENT_THRESHOLD: u8 = 80;
const MIN_HIGH_INTENT_COMPANIES: usize = 5;
const UNKNOWN_LOCATION: &str = "Unknown";

pub fn generate_insights(m: &CompanyMetrics) -> Vec<String> {
    let mut out = Vec::new();

    if m.intent_score >= HIGH_INTENT_THRESHOLD {
        out.push(format!(
            "{} shows HIGH hiring intent (score: {})",
            m.company, m.intent_score
        ));
    }

    if m.momentum == Momentum::Strong {
        let sign = if m.growth_percentage > 0 { "+" } else { "" };
        out.push(format!(
            "Strong hiring momentum - {sign}{}% growth",
            m.growth_percentage
        ));
    }

    if m.jobs_24h > 10 {
        out.push(format!(
            "{} roles posted in last 24h - active hiring window",
            m.jobs_24h
        ));
    }

    if let Some(role) = &m.dominant_role {
        out.push(format!("Primary focus: {role}"));
    }

    out
}

/// Signals shown on the single-company view.
pub fn deep_dive_signals(m: &CompanyMetrics) -> Vec<String> {
    let mut out = Vec::new();
    if m.jobs_24h > 5 {
        out.push(format!(
            "{} roles posted in last 24h - active hiring window",
            m.jobs_24h
        ));
    }
    if m.hiring_score >= HIGH_INTENT_THRESHOLD {
        out.push(format!(
            "High hiring intent detected (score: {})",
            m.hiring_score
        ));
    }
    if m.momentum == Momentum::Strong {
        out.push("Strong hiring momentum - aggressive expansion".to_string());
    }
    if let Some(role) = &m.dominant_role {
        out.push(format!("Massive focus on {role}"));
    }
    out
}

/// Top 20% by intent score, never fewer than five companies (or all of them).
pub fn high_intent_companies(metrics: &[CompanyMetrics]) -> Vec<CompanyMetrics> {
    let mut sorted = metrics.to_vec();
    sorted.sort_by(|a, b| b.intent_score.cmp(&a.intent_score));
    let top = MIN_HIGH_INTENT_COMPANIES.max(sorted.len().div_ceil(5));
    sorted.truncate(top);
    sorted
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeniorityBand {
    Junior,
    Mid,
    Senior,
}

impl SeniorityBand {
    /// First matching band wins: junior, then mid, then senior.
    pub fn classify(years_exp_required: Option<&str>, experience_level: Option<&str>) -> Option<Self> {
        let years = years_exp_required.unwrap_or("").trim().to_lowercase();
        let level = experience_level.unwrap_or("").trim().to_lowercase();

        if years.contains("0-4") || years == "0" || level.contains("entry") {
            Some(Self::Junior)
        } else if years.contains("5-7") || level.contains("mid") {
            Some(Self::Mid)
        } else if years.contains('8') || years.contains("11") || level.contains("senior") {
            Some(Self::Senior)
        } else {
            None
        }
    }

    pub fn of(posting: &JobPosting) -> Option<Self> {
        Self::classify(
            posting.years_exp_required.as_deref(),
            posting.experience_level.as_deref(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeniorityMix {
    pub junior: u32,
    pub mid: u32,
    pub senior: u32,
}

impl SeniorityMix {
    pub fn add(&mut self, band: Option<SeniorityBand>) {
        match band {
            Some(SeniorityBand::Junior) => self.junior += 1,
            Some(SeniorityBand::Mid) => self.mid += 1,
            Some(SeniorityBand::Senior) => self.senior += 1,
            None => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleSeniority {
    pub role: String,
    #[serde(flatten)]
    pub mix: SeniorityMix,
}

/// Seniority split for the busiest titles having more than `min_count` postings.
pub fn seniority_by_title(postings: &[JobPosting], min_count: u32, limit: usize) -> Vec<RoleSeniority> {
    let mut by_title: BTreeMap<&str, (u32, SeniorityMix)> = BTreeMap::new();
    for p in postings {
        let entry = by_title.entry(p.title.trim()).or_default();
        entry.0 += 1;
        entry.1.add(SeniorityBand::of(p));
    }

    let mut rows: Vec<(u32, RoleSeniority)> = by_title
        .into_iter()
        .filter(|(_, (count, _))| *count > min_count)
        .map(|(title, (count, mix))| {
            (
                count,
                RoleSeniority {
                    role: title.to_string(),
                    mix,
                },
            )
        })
        .collect();
    rows.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.role.cmp(&b.1.role)));
    rows.into_iter().take(limit).map(|(_, r)| r).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationCount {
    pub location: String,
    pub count: u32,
}

/// Reduces "City, ST" style locations to their last component.
pub fn location_region(location: Option<&str>) -> String {
    let Some(location) = location.map(str::trim).filter(|s| !s.is_empty()) else {
        return UNKNOWN_LOCATION.to_string();
    };
    let parts: Vec<&str> = location.split(", ").collect();
    if parts.len() >= 2 {
        parts[parts.len() - 1].trim().to_string()
    } else {
        location.to_string()
    }
}

pub fn location_distribution(postings: &[JobPosting], limit: usize) -> Vec<LocationCount> {
    let mut by_region: BTreeMap<String, u32> = BTreeMap::new();
    for p in postings {
        *by_region.entry(location_region(p.location.as_deref())).or_insert(0) += 1;
    }
    let mut out: Vec<LocationCount> = by_region
        .into_iter()
        .map(|(location, count)| LocationCount { location, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.location.cmp(&b.location)));
    out.truncate(limit);
    out
}
