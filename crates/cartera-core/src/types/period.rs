//! Reporting windows.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// First instant of a calendar day.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Last representable instant of a calendar day, one nanosecond before the
/// next midnight.
#[must_use]
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::nanoseconds(1)
}

/// A Monday 00:00:00 to Sunday 23:59:59.999999999 window.
///
/// Both bounds are inclusive and consecutive weeks leave no gap. Weeks are the unit of delinquency evaluation.
///
/// # Example
///
/// ```rust
/// use cartera_core::types::WeekRange;
/// use chrono::NaiveDate;
///
/// let week = WeekRange::for_date(NaiveDate::from_ymd_opt(2024, 12, 11).unwrap());
/// assert_eq!(week.monday(), NaiveDate::from_ymd_opt(2024, 12, 9).unwrap());
/// assert_eq!(week.sunday(), NaiveDate::from_ymd_opt(2024, 12, 15).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeekRange {
    /// Monday 00:00:00.
    pub start: DateTime<Utc>,
    /// Sunday 23:59:59.999999999.
    pub end: DateTime<Utc>,
}

impl WeekRange {
    /// The week containing `date`.
    #[must_use]
    pub fn for_date(date: NaiveDate) -> Self {
        let offset = i64::from(date.weekday().num_days_from_monday());
        let monday = date - Duration::days(offset);
        Self {
            start: start_of_day(monday),
            end: end_of_day(monday + Duration::days(6)),
        }
    }

    /// The week containing `instant`.
    #[must_use]
    pub fn containing(instant: DateTime<Utc>) -> Self {
        Self::for_date(instant.date_naive())
    }

    /// The week before this one.
    #[must_use]
    pub fn previous(&self) -> Self {
        Self::for_date(self.monday() - Duration::days(7))
    }

    /// The week after this one.
    #[must_use]
    pub fn next(&self) -> Self {
        Self::for_date(self.monday() + Duration::days(7))
    }

    /// Monday of this week.
    #[must_use]
    pub fn monday(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Sunday of this week.
    #[must_use]
    pub fn sunday(&self) -> NaiveDate {
        self.end.date_naive()
    }

    /// Inclusive on both ends.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    /// Every week whose Monday falls in the given month.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` for an impossible year/month.
    pub fn weeks_in_month(year: i32, month: u32) -> CoreResult<Vec<WeekRange>> {
        let range = DateRange::month(year, month)?;
        let first = range.start.date_naive();
        let last = range.end.date_naive();

        let offset = (7 - i64::from(first.weekday().num_days_from_monday())) % 7;
        let mut monday = first + Duration::days(offset);
        let mut weeks = Vec::new();
        while monday <= last {
            weeks.push(WeekRange::for_date(monday));
            monday += Duration::days(7);
        }
        Ok(weeks)
    }

    /// The week as a closed date range.
    #[must_use]
    pub fn as_range(&self) -> DateRange {
        DateRange {
            start: self.start,
            end: self.end,
        }
    }
}

impl fmt::Display for WeekRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.monday(), self.sunday())
    }
}

/// A closed `[start, end]` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First instant included.
    pub start: DateTime<Utc>,
    /// Last instant included.
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDateRange` when the bounds are inverted.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> CoreResult<Self> {
        if start > end {
            return Err(CoreError::InvalidDateRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// From the start of `first` to the end of `last`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDateRange` when `first > last`.
    pub fn from_dates(first: NaiveDate, last: NaiveDate) -> CoreResult<Self> {
        Self::new(start_of_day(first), end_of_day(last))
    }

    /// A single calendar day.
    #[must_use]
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: start_of_day(date),
            end: end_of_day(date),
        }
    }

    /// A calendar month.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` for an impossible year/month.
    pub fn month(year: i32, month: u32) -> CoreResult<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| CoreError::invalid_date(format!("{year}-{month:02}")))?;
        let next_first = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| CoreError::invalid_date(format!("{year}-{month:02}")))?;
        Ok(Self {
            start: start_of_day(first),
            end: start_of_day(next_first) - Duration::nanoseconds(1),
        })
    }

    /// Inclusive on both ends.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    /// Same as `contains`, tolerating a missing instant.
    #[must_use]
    pub fn contains_opt(&self, instant: Option<DateTime<Utc>>) -> bool {
        instant.is_some_and(|i| self.contains(i))
    }
}

impl From<WeekRange> for DateRange {
    fn from(week: WeekRange) -> Self {
        week.as_range()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}
