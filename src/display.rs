use std::fs::File;
use std::io::Write;

use chrono::NaiveDate;

use crate::schedule::{Schedule, Session};

/// Prints a schedule in a readable format, one date per section.
pub fn print_schedule(schedule: &Schedule) {
    if schedule.is_empty() {
        println!("No duties to display (empty schedule).");
        return;
    }

    println!("Total exam days: {}", schedule.dates().len());
    for (date, (morning, evening)) in schedule.by_date() {
        println!("\n=== {} ===", date.format("%A, %Y-%m-%d"));
        println!("  Morning ({}): {}", Session::Morning.hours(), morning.join(", "));
        println!("  Evening ({}): {}", Session::Evening.hours(), evening.join(", "));
    }

    println!("\nDuty totals:");
    for (name, load) in schedule.workload() {
        println!(
            "  {} - morning: {}, evening: {}, total: {}",
            name,
            load.morning,
            load.evening,
            load.total()
        );
    }
}

/// Writes the whole schedule to a text file, one line per session.
pub fn write_schedule_to_file(
    schedule: &Schedule,
    filename: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = File::create(filename)?;

    writeln!(file, "** Supervision Duty Schedule **")?;
    for (date, (morning, evening)) in schedule.by_date() {
        writeln!(file, "{}", date.format("%Y-%m-%d (%A)"))?;
        writeln!(file, "  Morning: {}", morning.join(", "))?;
        writeln!(file, "  Evening: {}", evening.join(", "))?;
    }

    Ok(())
}

/// Renders a per-supervisor duty sheet as plain text: the duty-row table
/// with tick marks, in the layout of the printed allotment sheet.
pub fn duty_sheet_text(schedule: &Schedule, supervisor: &str) -> String {
    let mut out = String::new();
    out.push_str("DUTY ALLOTMENT SHEET\n\n");
    out.push_str(&format!("To,\nThe Invigilator/Supervisor,\n\n{}\n\n", supervisor));
    out.push_str("Following is the schedule of your supervision duties:\n\n");
    out.push_str(&format!(
        "{:<8}{:<14}{:<36}{}\n",
        "Sr. No.",
        "Date",
        format!("Morning ({})", Session::Morning.hours()),
        format!("Evening ({})", Session::Evening.hours()),
    ));

    let rows = schedule.duty_rows(supervisor);
    if rows.is_empty() {
        out.push_str("(no duties assigned)\n");
        return out;
    }
    for row in rows {
        out.push_str(&format!(
            "{:<8}{:<14}{:<36}{}\n",
            row.sr_no,
            row.date.format("%Y-%m-%d"),
            if row.morning { "\u{2713}" } else { "" },
            if row.evening { "\u{2713}" } else { "" },
        ));
    }
    out.push_str("\nKindly acknowledge the receipt of the duty allotment.\n");
    out
}

/// Renders an absence memo as plain text, listing the missed slots.
pub fn absence_memo_text(supervisor: &str, absences: &[(NaiveDate, Session)]) -> String {
    let mut out = String::new();
    out.push_str("MEMO\n\n");
    out.push_str(&format!("To,\n{}\n\n", supervisor));
    out.push_str(
        "You were absent from the following invigilation duties assigned to you. \
         You are requested to submit a written explanation to the examination cell:\n\n",
    );
    for (date, session) in absences {
        out.push_str(&format!("  - {} ({})\n", date.format("%Y-%m-%d"), session));
    }
    out
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
    fn duty_sheet_lists_only_own_duties() {
        let sheet = duty_sheet_text(&schedule(), "A");
        assert!(sheet.contains("A"));
        assert!(sheet.contains("2024-01-01"));
        assert!(sheet.contains('\u{2713}'));

        let sheet = duty_sheet_text(&schedule(), "Nobody");
        assert!(sheet.contains("(no duties assigned)"));
    }

    #[test]
    fn memo_lists_missed_slots() {
        let memo = absence_memo_text("B", &[(date("2024-01-01"), Session::Evening)]);
        assert!(memo.contains("2024-01-01 (Evening)"));
    }
}
