use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One of the two daily exam sessions. This is a closed set: sessions are
/// never added or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Session {
    Morning,
    Evening,
}

impl Session {
    /// Allocation order within a date: Morning is always processed first.
    pub const ALL: [Session; 2] = [Session::Morning, Session::Evening];

    pub fn as_str(self) -> &'static str {
        match self {
            Session::Morning => "Morning",
            Session::Evening => "Evening",
        }
    }

    /// Wall-clock span shown on duty sheets.
    pub fn hours(self) -> &'static str {
        match self {
            Session::Morning => "10.00 a.m. to 01.00 p.m.",
            Session::Evening => "02.00 p.m. to 05.00 p.m.",
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Session {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Ok(Session::Morning),
            "evening" => Ok(Session::Evening),
            other => Err(format!("unknown session '{}', expected Morning or Evening", other)),
        }
    }
}

/// Supervisors assigned to a single (date, session) slot.
///
/// `assigned` keeps assignment order and may contain the same name more than
/// once when the roster is smaller than the required headcount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub date: NaiveDate,
    pub session: Session,
    pub assigned: Vec<String>,
}

/// One row of a per-supervisor duty table: serial number, date, and a tick
/// for each session the supervisor is assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyRow {
    pub sr_no: usize,
    pub date: NaiveDate,
    pub morning: bool,
    pub evening: bool,
}

/// Cumulative duty counts for one supervisor over a whole schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub morning: u32,
    pub evening: u32,
}

impl Workload {
    pub fn total(self) -> u32 {
        self.morning + self.evening
    }
}

/// A generated duty schedule: one entry per (date, session) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub entries: Vec<ScheduleEntry>,
}

impl Schedule {
    pub fn new(entries: Vec<ScheduleEntry>) -> Self {
        Schedule { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unique exam dates in chronological order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.entries.iter().map(|e| e.date).collect();
        dates.sort();
        dates.dedup();
        dates
    }

    /// Assigned supervisors for a slot, empty if the slot does not exist.
    pub fn assigned(&self, date: NaiveDate, session: Session) -> &[String] {
        self.entries
            .iter()
            .find(|e| e.date == date && e.session == session)
            .map(|e| e.assigned.as_slice())
            .unwrap_or(&[])
    }

    /// The outbound shape consumed by rendering and export collaborators:
    /// date -> (morning assigned, evening assigned).
    pub fn by_date(&self) -> BTreeMap<NaiveDate, (Vec<String>, Vec<String>)> {
        let mut map: BTreeMap<NaiveDate, (Vec<String>, Vec<String>)> = BTreeMap::new();
        for entry in &self.entries {
            let slot = map.entry(entry.date).or_default();
            match entry.session {
                Session::Morning => slot.0 = entry.assigned.clone(),
                Session::Evening => slot.1 = entry.assigned.clone(),
            }
        }
        map
    }

    /// All supervisor names appearing anywhere in the schedule, sorted.
    pub fn supervisors(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .flat_map(|e| e.assigned.iter().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Whether a supervisor is assigned to the given slot.
    pub fn tick(&self, name: &str, date: NaiveDate, session: Session) -> bool {
        self.assigned(date, session).iter().any(|n| n == name)
    }

    /// Per-supervisor duty table: only dates where the supervisor appears in
    /// at least one session, numbered from 1.
    pub fn duty_rows(&self, name: &str) -> Vec<DutyRow> {
        let mut rows = Vec::new();
        let mut sr_no = 1;
        for date in self.dates() {
            let morning = self.tick(name, date, Session::Morning);
            let evening = self.tick(name, date, Session::Evening);
            if morning || evening {
                rows.push(DutyRow { sr_no, date, morning, evening });
                sr_no += 1;
            }
        }
        rows
    }

    /// Duty counts per supervisor. A name repeated within one slot counts
    /// once per occurrence.
    pub fn workload(&self) -> BTreeMap<String, Workload> {
        let mut map: BTreeMap<String, Workload> = BTreeMap::new();
        for entry in &self.entries {
            for name in &entry.assigned {
                let w = map.entry(name.clone()).or_default();
                match entry.session {
                    Session::Morning => w.morning += 1,
                    Session::Evening => w.evening += 1,
                }
            }
        }
        map
    }
}
