//! Pure scoring functions over window counts.
//!
//! Nothing in here performs I/O or keeps state; identical inputs always give identical
//! scores. Zero denominators resolve to the neutral values documented on each function.

use crate::domain::metrics::{Momentum, Trend};

pub const VOLUME_WEIGHT: f64 = 0.4;
pub const MOMENTUM_WEIGHT: f64 = 0.3;
pub const CONCENTRATION_WEIGHT: f64 = 0.2;
pub const FRESHNESS_WEIGHT: f64 = 0.1;

/// Weekly volume at which the hiring score saturates.
const HIRING_SCORE_SATURATION: f64 = 50.0;

/// Week-over-week momentum range mapped onto 0..=100.
const MOMENTUM_PCT_MIN: f64 = -50.0;
const MOMENTUM_PCT_MAX: f64 = 200.0;

const TREND_BAND_PCT: f64 = 15.0;

/// Linear min-max normalisation clamped to `[0, 100]`. A degenerate range yields 50.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return 50.0;
    }
    (((value - min) / (max - min)) * 100.0).clamp(0.0, 100.0)
}

/// Rounds half-way cases towards positive infinity.
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Volume-only score: 50 postings in the 7d window or more is 100.
pub fn hiring_score(jobs_7d: u32) -> u8 {
    let raw = (jobs_7d as f64 / HIRING_SCORE_SATURATION) * 100.0;
    round_half_up(raw.min(100.0)) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentInputs {
    pub jobs_7d: u32,
    pub jobs_prev_7d: u32,
    pub jobs_24h: u32,
    pub dominant_role_count: u32,
    pub total_jobs: u32,
    /// Largest `jobs_7d` in the batch being scored together.
    pub industry_max_7d: u32,
}

impl Default for IntentInputs {
    fn default() -> Self {
        Self {
            jobs_7d: 0,
            jobs_prev_7d: 0,
            jobs_24h: 0,
            dominant_role_count: 0,
            total_jobs: 0,
            industry_max_7d: 100,
        }
    }
}

/// The four normalised intent components, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntentBreakdown {
    pub volume: f64,
    pub momentum: f64,
    pub concentration: f64,
    pub freshness: f64,
}

impl IntentBreakdown {
    pub fn compute(inputs: &IntentInputs) -> Self {
        let jobs_7d = inputs.jobs_7d as f64;
        let jobs_prev_7d = inputs.jobs_prev_7d as f64;

        let volume = normalize(jobs_7d, 0.0, inputs.industry_max_7d as f64);

        let momentum_pct = if inputs.jobs_prev_7d > 0 {
            ((jobs_7d - jobs_prev_7d) / jobs_prev_7d) * 100.0
        } else if inputs.jobs_7d > 0 {
            100.0
        } else {
            0.0
        };
        let momentum = normalize(momentum_pct, MOMENTUM_PCT_MIN, MOMENTUM_PCT_MAX);

        let concentration_pct = if inputs.total_jobs > 0 {
            (inputs.dominant_role_count as f64 / inputs.total_jobs as f64) * 100.0
        } else {
            0.0
        };
        let concentration = normalize(concentration_pct, 0.0, 100.0);

        let freshness_pct = if inputs.jobs_7d > 0 {
            (inputs.jobs_24h as f64 / jobs_7d) * 100.0
        } else {
            0.0
        };
        let freshness = normalize(freshness_pct, 0.0, 100.0);

        Self {
            volume,
            momentum,
            concentration,
            freshness,
        }
    }

    pub fn weighted_sum(&self) -> f64 {
        self.volume * VOLUME_WEIGHT
            + self.momentum * MOMENTUM_WEIGHT
            + self.concentration * CONCENTRATION_WEIGHT
            + self.freshness * FRESHNESS_WEIGHT
    }

    pub fn score(&self) -> u8 {
        round_half_up(self.weighted_sum()).clamp(0.0, 100.0) as u8
    }
}

/// Composite 0..=100 hiring intent (volume 40%, momentum 30%, concentration 20%, freshness 10%).
pub fn intent_score(inputs: &IntentInputs) -> u8 {
    IntentBreakdown::compute(inputs).score()
}

/// Classifies whether the last day is accelerating against the weekly and biweekly rates.
///
/// Boundary values fall outside both `strong` and `weak` because the comparisons are strict.
pub fn momentum(jobs_24h: u32, jobs_7d: u32, jobs_14d: u32) -> Momentum {
    let recent_rate = jobs_24h as f64 * 7.0;
    let weekly_rate = jobs_7d as f64;
    let biweekly_rate = jobs_14d as f64 / 2.0;

    if recent_rate > weekly_rate * 1.3 && weekly_rate > biweekly_rate * 1.2 {
        return Momentum::Strong;
    }

    if recent_rate < weekly_rate * 0.7 || weekly_rate < biweekly_rate * 0.8 {
        return Momentum::Weak;
    }

    Momentum::Moderate
}

/// Week-over-week direction with a ±15% stable band.
pub fn trend(current: u32, previous: u32) -> Trend {
    let change_pct = ((current as f64 - previous as f64) / (previous.max(1) as f64)) * 100.0;

    if change_pct > TREND_BAND_PCT {
        Trend::Up
    } else if change_pct < -TREND_BAND_PCT {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Rounded week-over-week percent change. No baseline means 100 (any activity) or 0.
pub fn growth_percentage(current: u32, previous: u32) -> i64 {
    if previous == 0 {
        return if current > 0 { 100 } else { 0 };
    }
    let pct = ((current as f64 - previous as f64) / previous as f64) * 100.0;
    round_half_up(pct) as i64
}

/// Headline growth figure with one decimal place.
pub fn week_over_week_growth(current: u64, previous: u64) -> f64 {
    if previous == 0 {
        return if current > 0 { 100.0 } else { 0.0 };
    }
    let pct = ((current as f64 - previous as f64) / previous as f64) * 100.0;
    round_half_up(pct * 10.0) / 10.0
}
