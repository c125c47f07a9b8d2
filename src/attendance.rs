use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::schedule::{Schedule, Session};

/// Who actually turned up on one exam date. Names not listed as present for
/// a session they were assigned to are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub morning_present: Vec<String>,
    pub evening_present: Vec<String>,
}

impl AttendanceRecord {
    fn present(&self, session: Session) -> &[String] {
        match session {
            Session::Morning => &self.morning_present,
            Session::Evening => &self.evening_present,
        }
    }

    fn present_mut(&mut self, session: Session) -> &mut Vec<String> {
        match session {
            Session::Morning => &mut self.morning_present,
            Session::Evening => &mut self.evening_present,
        }
    }
}

/// Attendance marks for the whole exam period, keyed by date. Only dates
/// that have been marked contribute to the absentee projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceBook {
    pub days: BTreeMap<NaiveDate, AttendanceRecord>,
}

impl AttendanceBook {
    /// Records the present list for one (date, session), replacing any
    /// earlier mark for that slot.
    pub fn mark(&mut self, date: NaiveDate, session: Session, present: Vec<String>) {
        *self.days.entry(date).or_default().present_mut(session) = present;
    }

    pub fn is_present(&self, date: NaiveDate, session: Session, name: &str) -> bool {
        self.days
            .get(&date)
            .map(|record| record.present(session).iter().any(|n| n == name))
            .unwrap_or(false)
    }

    /// Builds the absentee projection against a schedule: every supervisor
    /// assigned to a marked slot but not present there, with the slots they
    /// missed in chronological order.
    pub fn absentees(&self, schedule: &Schedule) -> BTreeMap<String, Vec<(NaiveDate, Session)>> {
        let mut map: BTreeMap<String, Vec<(NaiveDate, Session)>> = BTreeMap::new();
        for (&date, record) in &self.days {
            for session in Session::ALL {
                let present = record.present(session);
                let mut seen = Vec::new();
                for name in schedule.assigned(date, session) {
                    // A name repeated within one slot is one absence.
                    if seen.contains(name) {
                        continue;
                    }
                    seen.push(name.clone());
                    if !present.iter().any(|p| p == name) {
                        map.entry(name.clone()).or_default().push((date, session));
                    }
                }
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ScheduleEntry;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn schedule() -> Schedule {
        Schedule::new(vec![
            ScheduleEntry {
                date: date("2024-01-01"),
                session: Session::Morning,
                assigned: vec!["A".into(), "B".into(), "C".into()],
            },
            ScheduleEntry {
                date: date("2024-01-01"),
                session: Session::Evening,
                assigned: vec!["B".into(), "C".into()],
            },
            ScheduleEntry {
                date: date("2024-01-02"),
                session: Session::Morning,
                assigned: vec!["A".into(), "A".into()],
            },
        ])
    }

    #[test]
    fn absentees_cover_only_marked_dates() {
        let mut book = AttendanceBook::default();
        book.mark(date("2024-01-01"), Session::Morning, vec!["A".into(), "C".into()]);
        book.mark(date("2024-01-01"), Session::Evening, vec!["B".into(), "C".into()]);

        let absentees = book.absentees(&schedule());
        // B missed the morning; Jan 2 is unmarked and contributes nothing.
        assert_eq!(absentees.len(), 1);
        assert_eq!(absentees["B"], vec![(date("2024-01-01"), Session::Morning)]);
    }

    #[test]
    fn unmarked_session_counts_all_assigned_as_absent() {
        let mut book = AttendanceBook::default();
        book.mark(date("2024-01-02"), Session::Morning, vec![]);

        let absentees = book.absentees(&schedule());
        // A was assigned twice to that slot but is absent once.
        assert_eq!(absentees["A"], vec![(date("2024-01-02"), Session::Morning)]);
    }

    #[test]
    fn remarking_replaces_the_previous_list() {
        let mut book = AttendanceBook::default();
        book.mark(date("2024-01-01"), Session::Morning, vec!["A".into()]);
        book.mark(date("2024-01-01"), Session::Morning, vec!["A".into(), "B".into(), "C".into()]);
        book.mark(date("2024-01-01"), Session::Evening, vec!["B".into(), "C".into()]);
        assert!(book.is_present(date("2024-01-01"), Session::Morning, "B"));
        assert!(book.absentees(&schedule()).is_empty());
    }
}
