use serde::{Deserialize, Serialize};
use std::fmt;

use crate::scoring;

/// Posting counts for one company over the three report windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCounts {
    pub jobs_24h: u32,
    pub jobs_7d: u32,
    pub jobs_prev_7d: u32,
}

impl WindowCounts {
    pub fn new(jobs_24h: u32, jobs_7d: u32, jobs_prev_7d: u32) -> Self {
        Self {
            jobs_24h,
            jobs_7d,
            jobs_prev_7d,
        }
    }

    /// Builds counts from raw store values, clamping negatives to zero.
    pub fn from_raw(jobs_24h: i64, jobs_7d: i64, jobs_prev_7d: i64) -> Self {
        Self {
            jobs_24h: clamp_count(jobs_24h),
            jobs_7d: clamp_count(jobs_7d),
            jobs_prev_7d: clamp_count(jobs_prev_7d),
        }
    }

    /// The 14d window is the union of the disjoint 7d and previous-7d windows.
    pub fn jobs_14d(&self) -> u32 {
        self.jobs_7d.saturating_add(self.jobs_prev_7d)
    }
}

pub fn clamp_count(raw: i64) -> u32 {
    raw.clamp(0, u32::MAX as i64) as u32
}

/// Aggregated input for scoring one company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyCounts {
    pub company: String,
    pub counts: WindowCounts,
    pub dominant_role: Option<String>,
    pub dominant_role_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Momentum {
    Strong,
    Moderate,
    Weak,
}

impl Momentum {
    pub fn as_str(&self) -> &'static str {
        match self {
            Momentum::Strong => "strong",
            Momentum::Moderate => "moderate",
            Momentum::Weak => "weak",
        }
    }
}

impl fmt::Display for Momentum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-company hiring metrics. Recomputed per request, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyMetrics {
    pub company: String,
    pub jobs_24h: u32,
    pub jobs_7d: u32,
    pub jobs_prev_7d: u32,
    pub jobs_14d: u32,
    pub hiring_score: u8,
    pub intent_score: u8,
    pub momentum: Momentum,
    pub trend: Trend,
    #[serde(serialize_with = "serialize_dominant_role")]
    pub dominant_role: Option<String>,
    pub growth_percentage: i64,
}

impl CompanyMetrics {
    /// Scores one company. `industry_max_7d` must come from the same batch snapshot
    /// as every other company scored alongside it.
    pub fn score(input: &CompanyCounts, industry_max_7d: u32) -> Self {
        let c = input.counts;
        let jobs_14d = c.jobs_14d();

        let intent = scoring::IntentInputs {
            jobs_7d: c.jobs_7d,
            jobs_prev_7d: c.jobs_prev_7d,
            jobs_24h: c.jobs_24h,
            dominant_role_count: input.dominant_role_count,
            total_jobs: c.jobs_7d,
            industry_max_7d,
        };

        Self {
            company: input.company.clone(),
            jobs_24h: c.jobs_24h,
            jobs_7d: c.jobs_7d,
            jobs_prev_7d: c.jobs_prev_7d,
            jobs_14d,
            hiring_score: scoring::hiring_score(c.jobs_7d),
            intent_score: scoring::intent_score(&intent),
            momentum: scoring::momentum(c.jobs_24h, c.jobs_7d, jobs_14d),
            trend: scoring::trend(c.jobs_7d, c.jobs_prev_7d),
            dominant_role: input.dominant_role.clone(),
            growth_percentage: scoring::growth_percentage(c.jobs_7d, c.jobs_prev_7d),
        }
    }
}

pub const NO_ROLE: &str = "N/A";

fn serialize_dominant_role<S>(role: &Option<String>, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(role.as_deref().unwrap_or(NO_ROLE))
}
