use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::str::FromStr;

use crate::domain::posting::JobPosting;

/// What the "last 24 hours" freshness window is measured from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FreshnessAnchor {
    /// The 24 hours of the reference date itself (UTC).
    #[default]
    ReferenceDate,
    /// The 24 hours before the request's wall-clock time, regardless of the reference date.
    WallClock,
}

impl FromStr for FreshnessAnchor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "reference_date" => Ok(Self::ReferenceDate),
            "wall_clock" => Ok(Self::WallClock),
            other => anyhow::bail!("expected reference_date or wall_clock (got {other})"),
        }
    }
}

/// Which upload-date window a posting falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadWindow {
    /// `[D-7, D]`
    Week,
    /// `[D-14, D-7)`
    PreviousWeek,
}

/// All window bounds for one request, derived once from the reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindows {
    pub reference_date: NaiveDate,
    pub week_start: NaiveDate,
    pub fortnight_start: NaiveDate,
    pub fresh_start: DateTime<Utc>,
    pub fresh_end: DateTime<Utc>,
    pub anchor: FreshnessAnchor,
}

impl ReportWindows {
    pub fn new(reference_date: NaiveDate, now: DateTime<Utc>, anchor: FreshnessAnchor) -> Self {
        let (fresh_start, fresh_end) = match anchor {
            FreshnessAnchor::ReferenceDate => {
                let start = start_of_day(reference_date);
                (start, start + Duration::hours(24))
            }
            FreshnessAnchor::WallClock => (now - Duration::hours(24), now),
        };

        Self {
            reference_date,
            week_start: reference_date - Duration::days(7),
            fortnight_start: reference_date - Duration::days(14),
            fresh_start,
            fresh_end,
            anchor,
        }
    }

    /// The same windows moved to another reference date. A wall-clock freshness window stays put.
    pub fn rebased(&self, reference_date: NaiveDate) -> Self {
        Self::new(reference_date, self.fresh_end, self.anchor)
    }

    pub fn classify_upload(&self, upload_date: NaiveDate) -> Option<UploadWindow> {
        if upload_date > self.reference_date || upload_date < self.fortnight_start {
            None
        } else if upload_date >= self.week_start {
            Some(UploadWindow::Week)
        } else {
            Some(UploadWindow::PreviousWeek)
        }
    }

    pub fn in_week(&self, posting: &JobPosting) -> bool {
        self.classify_upload(posting.upload_date()) == Some(UploadWindow::Week)
    }

    pub fn is_fresh(&self, posting: &JobPosting) -> bool {
        let at = posting.freshness_instant();
        match self.anchor {
            FreshnessAnchor::ReferenceDate => at >= self.fresh_start && at < self.fresh_end,
            FreshnessAnchor::WallClock => at >= self.fresh_start && at <= self.fresh_end,
        }
    }

    /// Calendar days of the 7d window, oldest first.
    pub fn week_days(&self) -> Vec<NaiveDate> {
        self.week_start
            .iter_days()
            .take_while(|d| *d <= self.reference_date)
            .collect()
    }

    pub fn lookback_start(&self, days: i64) -> NaiveDate {
        self.reference_date - Duration::days(days)
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
