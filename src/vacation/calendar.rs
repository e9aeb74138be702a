//! Calendar arithmetic shared by the accrual and request paths.

use chrono::{Datelike, NaiveDate, Utc};

/// The current UTC calendar date.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Whole years between `hire_date` and `today`.
///
/// The plain year difference is decremented when `today`'s (month, day)
/// precedes the hire date's (month, day), so an anniversary only counts once
/// it has actually been reached. A hire date in the future yields 0.
pub fn tenure_years(hire_date: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - hire_date.year();
    if (today.month(), today.day()) < (hire_date.month(), hire_date.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

/// Calendar days elapsed since `hire_date`, never negative.
pub fn days_since(hire_date: NaiveDate, today: NaiveDate) -> i64 {
    (today - hire_date).num_days().max(0)
}

/// Number of vacation days consumed by the inclusive range `[start, end]`.
///
/// Sundays are rest days and are not counted. An inverted range counts 0.
///
/// ```
/// use chrono::NaiveDate;
/// use hr_vacations::vacation::calendar::requested_days;
///
/// // Monday 2024-03-04 through Sunday 2024-03-10
/// let start = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
/// assert_eq!(requested_days(start, end), 6);
/// ```
pub fn requested_days(start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        return 0;
    }
    let total = (end - start).num_days() + 1;
    // Every full week holds one Sunday; the leftover days reach a Sunday
    // only if they run past the end of the start's week.
    let offset = i64::from(start.weekday().num_days_from_monday());
    let rest = total % 7;
    let sundays = total / 7 + i64::from(offset + rest > 6);
    u32::try_from(total - sundays).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_tenure_counts_reached_anniversary() {
        assert_eq!(tenure_years(date("2020-06-15"), date("2024-06-15")), 4);
    }

    #[test]
    fn test_tenure_before_anniversary_is_decremented() {
        assert_eq!(tenure_years(date("2020-06-15"), date("2024-06-14")), 3);
    }

    #[test]
    fn test_tenure_future_hire_date_is_zero() {
        assert_eq!(tenure_years(date("2025-01-01"), date("2024-06-14")), 0);
    }

    #[test]
    fn test_tenure_leap_day_hire() {
        // Feb 29 anniversary is reached on Mar 1 in common years
        assert_eq!(tenure_years(date("2020-02-29"), date("2021-02-28")), 0);
        assert_eq!(tenure_years(date("2020-02-29"), date("2021-03-01")), 1);
    }

    #[test]
    fn test_week_excludes_single_sunday() {
        assert_eq!(requested_days(date("2024-03-04"), date("2024-03-10")), 6);
    }

    #[test]
    fn test_single_weekday() {
        assert_eq!(requested_days(date("2024-03-06"), date("2024-03-06")), 1);
    }

    #[test]
    fn test_single_sunday_counts_zero() {
        assert_eq!(requested_days(date("2024-03-10"), date("2024-03-10")), 0);
    }

    #[test]
    fn test_two_weeks_excludes_two_sundays() {
        // Saturday 2024-03-02 .. Friday 2024-03-15: 14 days, Sundays 3rd and 10th
        assert_eq!(requested_days(date("2024-03-02"), date("2024-03-15")), 12);
    }

    #[test]
    fn test_range_ending_on_sunday_from_each_weekday() {
        // Mon 2024-03-04 .. Sun 2024-03-10; the only Sunday is the last day
        for (start, expected) in [(4, 6), (5, 5), (6, 4), (7, 3), (8, 2), (9, 1), (10, 0)] {
            let start = NaiveDate::from_ymd_opt(2024, 3, start).unwrap();
            assert_eq!(requested_days(start, date("2024-03-10")), expected, "{start}");
        }
    }

    #[test]
    fn test_far_future_end_is_counted_without_walking() {
        // 2024-03-04 (Mon) .. 9999-12-31 (Fri)
        let start = date("2024-03-04");
        let end = date("9999-12-31");
        let total = (end - start).num_days() + 1;
        let expected = total - total / 7;
        assert_eq!(i64::from(requested_days(start, end)), expected);
    }

    #[test]
    fn test_inverted_range_is_zero() {
        assert_eq!(requested_days(date("2024-03-10"), date("2024-03-04")), 0);
    }

    #[test]
    fn test_days_since_clamps_future() {
        assert_eq!(days_since(date("2024-03-10"), date("2024-03-04")), 0);
        assert_eq!(days_since(date("2024-03-04"), date("2024-03-10")), 6);
    }
}
