use std::fs;
use std::path::Path;

use csv::WriterBuilder;

use crate::attendance::AttendanceBook;
use crate::schedule::{Schedule, Session};

/// Schedule as CSV, one row per (date, session), names joined with "; ".
pub fn schedule_csv(schedule: &Schedule) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut wtr = WriterBuilder::new().from_writer(Vec::new());
    wtr.write_record(["Date", "Session", "Assigned"])?;
    for entry in &schedule.entries {
        wtr.write_record([
            entry.date.format("%Y-%m-%d").to_string(),
            entry.session.to_string(),
            entry.assigned.join("; "),
        ])?;
    }
    Ok(wtr.into_inner()?)
}

/// Schedule in the horizontal tick layout: one row per supervisor, two
/// columns (Morning/Evening) per exam date.
pub fn horizontal_csv(schedule: &Schedule) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let dates = schedule.dates();

    let mut header = vec!["Sr. No.".to_string(), "Name of Supervisor".to_string()];
    for date in &dates {
        header.push(format!("{} Morning", date.format("%Y-%m-%d")));
        header.push(format!("{} Evening", date.format("%Y-%m-%d")));
    }

    let mut wtr = WriterBuilder::new().from_writer(Vec::new());
    wtr.write_record(&header)?;
    for (sr_no, name) in schedule.supervisors().iter().enumerate() {
        let mut row = vec![(sr_no + 1).to_string(), name.clone()];
        for &date in &dates {
            for session in Session::ALL {
                row.push(if schedule.tick(name, date, session) {
                    "\u{2713}".to_string()
                } else {
                    String::new()
                });
            }
        }
        wtr.write_record(&row)?;
    }
    Ok(wtr.into_inner()?)
}

/// Attendance as CSV: one row per (date, session, assigned supervisor) with
/// a Present flag. Unmarked dates are omitted.
pub fn attendance_csv(
    schedule: &Schedule,
    book: &AttendanceBook,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut wtr = WriterBuilder::new().from_writer(Vec::new());
    wtr.write_record(["Date", "Session", "Name", "Present"])?;
    for &date in book.days.keys() {
        for session in Session::ALL {
            for name in schedule.assigned(date, session) {
                wtr.write_record([
                    date.format("%Y-%m-%d").to_string(),
                    session.to_string(),
                    name.clone(),
                    book.is_present(date, session, name).to_string(),
                ])?;
            }
        }
    }
    Ok(wtr.into_inner()?)
}

/// Persists a generated schedule as JSON so the web server can restore it
/// after a restart.
pub fn save_schedule_json<P: AsRef<Path>>(
    schedule: &Schedule,
    path: P,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(schedule)?;
    fs::write(path, json)?;
    Ok(())
}

/// Loads a persisted schedule, returning `None` when the file is missing or
/// unreadable (a stale or corrupt state file is not fatal).
pub fn load_schedule_json<P: AsRef<Path>>(path: P) -> Option<Schedule> {
    let data = fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ScheduleEntry;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn schedule() -> Schedule {
        Schedule::new(vec![
            ScheduleEntry {
                date: date("2024-01-01"),
                session: Session::Morning,
                assigned: vec!["A".into(), "B".into()],
            },
            ScheduleEntry {
                date: date("2024-01-01"),
                session: Session::Evening,
                assigned: vec!["B".into()],
            },
        ])
    }

    #[test]
    fn schedule_csv_has_one_row_per_session() {
        let bytes = schedule_csv(&schedule()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "2024-01-01,Morning,A; B");
        assert_eq!(lines[2], "2024-01-01,Evening,B");
    }

    #[test]
    fn horizontal_csv_ticks_assignments() {
        let bytes = horizontal_csv(&schedule()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("2024-01-01 Morning"));
        // A: morning only. B: both sessions.
        assert_eq!(lines[1], "1,A,\u{2713},");
        assert_eq!(lines[2], "2,B,\u{2713},\u{2713}");
    }

    #[test]
    fn attendance_csv_flags_absences() {
        let mut book = AttendanceBook::default();
        book.mark(date("2024-01-01"), Session::Morning, vec!["A".into()]);
        let bytes = attendance_csv(&schedule(), &book).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("2024-01-01,Morning,A,true"));
        assert!(text.contains("2024-01-01,Morning,B,false"));
    }

    #[test]
    fn schedule_json_round_trips() {
        let path = std::env::temp_dir().join("duty-allotment-test-schedule.json");
        let original = schedule();
        save_schedule_json(&original, &path).unwrap();
        let restored = load_schedule_json(&path).unwrap();
        assert_eq!(original, restored);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_state_file_loads_as_none() {
        assert!(load_schedule_json("/nonexistent/schedule.json").is_none());
    }
}
