//! Move-date availability for the date picker.
//!
//! Weekends are never offered, and the first few business days after the
//! starting date are held back as "short fuse" days that movers cannot be
//! scheduled on. All comparisons are at calendar-day granularity.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

/// Length of the window, in days, checked for unavailable dates.
pub const DAYS_TO_CHECK: u64 = 90;

/// Number of leading weekdays blocked as short-fuse days.
pub const SHORT_FUSE_TOTAL_DAYS: usize = 5;

/// Pounds of household goods movers can pack in one day.
pub const POUNDS_PACKED_PER_DAY: i64 = 5000;

/// Lists the unavailable move dates in the window starting at `start`
/// (inclusive): every weekend day, plus the first
/// [`SHORT_FUSE_TOTAL_DAYS`] weekdays.
pub fn unavailable_move_dates(start: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut short_fuse_found = 0;

    for day in window(start, DAYS_TO_CHECK) {
        if is_weekend(day) {
            dates.push(day);
        } else if short_fuse_found < SHORT_FUSE_TOTAL_DAYS {
            dates.push(day);
            short_fuse_found += 1;
        }
    }

    dates
}

/// Days needed to pack `entitlement_pounds`, rounded up to whole days.
pub fn pack_days(entitlement_pounds: i64) -> i64 {
    if entitlement_pounds <= 0 {
        return 0;
    }
    entitlement_pounds / POUNDS_PACKED_PER_DAY
        + i64::from(entitlement_pounds % POUNDS_PACKED_PER_DAY != 0)
}

fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

fn window(
    start: NaiveDate,
    days: u64,
) -> impl Iterator<Item = NaiveDate> {
    (0..days).filter_map(move |offset| start.checked_add_days(Days::new(offset)))
}

/// The dates a move may be scheduled on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableMoveDates {
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub available: BTreeSet<NaiveDate>,
}

impl AvailableMoveDates {
    pub fn new(
        min_date: NaiveDate,
        max_date: NaiveDate,
        available: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        Self {
            min_date,
            max_date,
            available: available.into_iter().collect(),
        }
    }

    /// Builds the availability for the standard window starting at `start`
    /// by removing `unavailable` from every day in it.
    pub fn from_unavailable(
        start: NaiveDate,
        unavailable: &[NaiveDate],
    ) -> Self {
        let blocked: BTreeSet<_> = unavailable.iter().copied().collect();
        let days: Vec<_> = window(start, DAYS_TO_CHECK).collect();
        let max_date = days.last().copied().unwrap_or(start);

        Self {
            min_date: start,
            max_date,
            available: days.into_iter().filter(|d| !blocked.contains(d)).collect(),
        }
    }

    /// A day is selectable when it lies within `[min_date, max_date]` and is
    /// one of the available days.
    pub fn is_day_selectable(
        &self,
        day: NaiveDate,
    ) -> bool {
        day >= self.min_date && day <= self.max_date && self.available.contains(&day)
    }

    /// Same as [`Self::is_day_selectable`], ignoring the time of day.
    pub fn is_moment_selectable(
        &self,
        moment: NaiveDateTime,
    ) -> bool {
        self.is_day_selectable(moment.date())
    }

    /// First selectable day, used to open the picker on a sensible month.
    pub fn first_available(&self) -> Option<NaiveDate> {
        self.available
            .range(self.min_date..=self.max_date)
            .next()
            .copied()
    }
}

/// Picker callback: every day is disabled until availability has loaded.
pub fn is_day_disabled(
    availability: Option<&AvailableMoveDates>,
    day: NaiveDate,
) -> bool {
    availability.is_none_or(|dates| !dates.is_day_selectable(day))
}
