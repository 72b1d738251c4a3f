//! Day-of-week and time-of-day window matching.
//!
//! Days are numbered 0 (Monday) through 6 (Sunday). A window whose start is
//! after its end wraps: days across the weekend, times across midnight. For
//! a time window that crosses midnight, the part after midnight belongs to
//! the day the window opened.

use chrono::{Datelike, NaiveDateTime, NaiveTime};

/// Last valid day index.
pub const MAX_DAY: i16 = 6;

/// Monday-based day index of a local timestamp.
pub fn day_index(local: &NaiveDateTime) -> i16 {
    local.weekday().num_days_from_monday() as i16
}

/// Whether `day` lies within `[start, end]`, wrapping when `start > end`.
/// A missing bound is open (start of week / end of week).
pub fn day_in_window(start: Option<i16>, end: Option<i16>, day: i16) -> bool {
    let (start, end) = match (start, end) {
        (None, None) => return true,
        (start, end) => (start.unwrap_or(0), end.unwrap_or(MAX_DAY)),
    };
    if start <= end {
        start <= day && day <= end
    } else {
        day >= start || day <= end
    }
}

/// Where an instant falls in a time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMatch {
    /// Outside the window.
    Outside,
    /// Inside, on the day the window opened.
    SameDay,
    /// Inside, after midnight of a window that opened the previous day.
    Carryover,
}

/// Match a time against `[start, end)`. Equal bounds cover the whole day.
/// A missing start is midnight; a missing end is the end of the day.
pub fn time_in_window(start: Option<NaiveTime>, end: Option<NaiveTime>, time: NaiveTime) -> TimeMatch {
    let start = start.unwrap_or(NaiveTime::MIN);
    let Some(end) = end else {
        return if time >= start {
            TimeMatch::SameDay
        } else {
            TimeMatch::Outside
        };
    };

    if start < end {
        if start <= time && time < end {
            TimeMatch::SameDay
        } else {
            TimeMatch::Outside
        }
    } else if start > end {
        if time >= start {
            TimeMatch::SameDay
        } else if time < end {
            TimeMatch::Carryover
        } else {
            TimeMatch::Outside
        }
    } else {
        TimeMatch::SameDay
    }
}

/// Combined day and time check for a local timestamp.
pub fn window_contains(
    day_start: Option<i16>,
    day_end: Option<i16>,
    time_start: Option<NaiveTime>,
    time_end: Option<NaiveTime>,
    local: &NaiveDateTime,
) -> bool {
    let today = day_index(local);
    let opening_day = match time_in_window(time_start, time_end, local.time()) {
        TimeMatch::Outside => return false,
        TimeMatch::SameDay => today,
        TimeMatch::Carryover => (today + MAX_DAY) % (MAX_DAY + 1),
    };
    day_in_window(day_start, day_end, opening_day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        // 2024-03-04 is a Monday.
        NaiveDate::from_ymd_opt(2024, 3, 4 + day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_day_window_plain_and_wrapping() {
        assert!(day_in_window(Some(0), Some(4), 2));
        assert!(!day_in_window(Some(0), Some(4), 5));
        // Friday through Monday.
        assert!(day_in_window(Some(4), Some(0), 6));
        assert!(day_in_window(Some(4), Some(0), 0));
        assert!(!day_in_window(Some(4), Some(0), 2));
        assert!(day_in_window(None, None, 3));
        assert!(day_in_window(Some(5), None, 6));
    }

    #[test]
    fn test_time_window_end_is_exclusive() {
        assert_eq!(time_in_window(Some(t(10, 0)), Some(t(18, 0)), t(10, 0)), TimeMatch::SameDay);
        assert_eq!(time_in_window(Some(t(10, 0)), Some(t(18, 0)), t(18, 0)), TimeMatch::Outside);
    }

    #[test]
    fn test_time_window_wraps_midnight() {
        let (start, end) = (Some(t(22, 0)), Some(t(2, 0)));
        assert_eq!(time_in_window(start, end, t(23, 30)), TimeMatch::SameDay);
        assert_eq!(time_in_window(start, end, t(1, 0)), TimeMatch::Carryover);
        assert_eq!(time_in_window(start, end, t(2, 0)), TimeMatch::Outside);
        assert_eq!(time_in_window(start, end, t(12, 0)), TimeMatch::Outside);
    }

    #[test]
    fn test_carryover_belongs_to_opening_day() {
        // Friday night window 22:00-02:00.
        let (ds, de, ts, te) = (Some(4), Some(4), Some(t(22, 0)), Some(t(2, 0)));
        assert!(window_contains(ds, de, ts, te, &at(4, 23, 0)));
        assert!(window_contains(ds, de, ts, te, &at(5, 1, 0)));
        assert!(!window_contains(ds, de, ts, te, &at(4, 1, 0)));
    }

    #[test]
    fn test_sunday_carryover_wraps_to_monday_index() {
        // Sunday-only window 23:00-01:00, checked early Monday.
        assert!(window_contains(Some(6), Some(6), Some(t(23, 0)), Some(t(1, 0)), &at(0, 0, 30)));
    }
}
