use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Datelike, NaiveDate, Weekday};

/// Produces the ordered sequence of active exam dates in `[start, end]`.
///
/// A date is excluded if it is a Sunday while `skip_sundays` is set, or if it
/// appears in the holiday set; either condition alone excludes it. A start
/// date after the end date yields an empty sequence, not an error.
pub fn exam_dates(
    start: NaiveDate,
    end: NaiveDate,
    skip_sundays: bool,
    holidays: &HashSet<NaiveDate>,
) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut cur = start;
    while cur <= end {
        let sunday = cur.weekday() == Weekday::Sun;
        if !(skip_sundays && sunday) && !holidays.contains(&cur) {
            dates.push(cur);
        }
        match cur.succ_opt() {
            Some(next) => cur = next,
            None => break,
        }
    }
    dates
}

/// Numbers the weeks of an exam period: active dates are grouped by ISO
/// (year, week), groups are ordered chronologically, and numbered from 1.
/// The week number keys the week-scoped block overrides.
pub fn week_numbers(dates: &[NaiveDate]) -> HashMap<NaiveDate, u32> {
    let week_keys: BTreeSet<(i32, u32)> = dates
        .iter()
        .map(|d| (d.iso_week().year(), d.iso_week().week()))
        .collect();

    let index: HashMap<(i32, u32), u32> = week_keys
        .into_iter()
        .zip(1u32..)
        .map(|(key, n)| (key, n))
        .collect();

    dates
        .iter()
        .map(|&d| (d, index[&(d.iso_week().year(), d.iso_week().week())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn skips_sundays_when_flagged() {
        // 2024-01-01 is a Monday, 2024-01-07 a Sunday.
        let dates = exam_dates(date("2024-01-01"), date("2024-01-07"), true, &HashSet::new());
        assert_eq!(dates.len(), 6);
        assert_eq!(dates.first(), Some(&date("2024-01-01")));
        assert_eq!(dates.last(), Some(&date("2024-01-06")));
        assert!(dates.iter().all(|d| d.weekday() != Weekday::Sun));
    }

    #[test]
    fn keeps_sundays_when_not_flagged() {
        let dates = exam_dates(date("2024-01-01"), date("2024-01-07"), false, &HashSet::new());
        assert_eq!(dates.len(), 7);
    }

    #[test]
    fn holidays_are_excluded_independently() {
        let holidays: HashSet<NaiveDate> = [date("2024-01-03"), date("2024-01-07")].into();
        // Jan 7 is both a Sunday and a holiday; with the flag off it is
        // still excluded by the holiday set.
        let dates = exam_dates(date("2024-01-01"), date("2024-01-07"), false, &holidays);
        assert_eq!(dates.len(), 5);
        assert!(!dates.contains(&date("2024-01-03")));
        assert!(!dates.contains(&date("2024-01-07")));
    }

    #[test]
    fn reversed_range_is_empty() {
        let dates = exam_dates(date("2024-01-10"), date("2024-01-01"), true, &HashSet::new());
        assert!(dates.is_empty());
    }

    #[test]
    fn output_is_sorted_and_unique() {
        let dates = exam_dates(date("2024-01-01"), date("2024-02-15"), true, &HashSet::new());
        let mut sorted = dates.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(dates, sorted);
    }

    #[test]
    fn week_numbers_follow_iso_weeks() {
        let dates = exam_dates(date("2024-01-01"), date("2024-01-13"), true, &HashSet::new());
        let weeks = week_numbers(&dates);
        // Jan 1-6 fall in ISO week 1, Jan 8-13 in ISO week 2.
        assert_eq!(weeks[&date("2024-01-01")], 1);
        assert_eq!(weeks[&date("2024-01-06")], 1);
        assert_eq!(weeks[&date("2024-01-08")], 2);
        assert_eq!(weeks[&date("2024-01-13")], 2);
    }

    #[test]
    fn week_numbers_are_period_relative() {
        // A period starting mid-year still numbers its first week as 1.
        let dates = exam_dates(date("2024-06-10"), date("2024-06-22"), true, &HashSet::new());
        let weeks = week_numbers(&dates);
        assert_eq!(weeks[&date("2024-06-10")], 1);
        assert_eq!(weeks[&date("2024-06-17")], 2);
    }
}
