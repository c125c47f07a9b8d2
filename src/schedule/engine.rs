use chrono::NaiveDate;

use super::calendar::week_numbers;
use super::config::BlockConfig;
use super::error::{ScheduleError, ScheduleResult};
use super::types::{Schedule, ScheduleEntry, Session};

/// Supervisors needed for one session. Business rule carried over unchanged
/// from the paper process: one extra supervisor when a single block is
/// scheduled, two extras otherwise.
pub fn required_count(blocks: u32) -> usize {
    let extras = if blocks == 1 { 1 } else { 2 };
    (blocks + extras) as usize
}

/// Morning/evening duty tallies for one allocation run, indexed by roster
/// position. Scoped to a single `generate_schedule` call; concurrent runs
/// each get their own counters.
struct LoadCounters {
    morning: Vec<u32>,
    evening: Vec<u32>,
}

impl LoadCounters {
    fn new(roster_len: usize) -> Self {
        LoadCounters {
            morning: vec![0; roster_len],
            evening: vec![0; roster_len],
        }
    }

    /// Picks the least-loaded supervisor for a session and tallies the duty.
    ///
    /// The selection key is (own-session count, total count); the first-seen
    /// minimum wins, so ties break by roster order. Counters are updated
    /// before returning, so later picks within the same slot see this one.
    fn pick(&mut self, session: Session) -> usize {
        let (own, other) = match session {
            Session::Morning => (&self.morning, &self.evening),
            Session::Evening => (&self.evening, &self.morning),
        };

        let mut best = 0;
        for i in 1..own.len() {
            let key = (own[i], own[i] + other[i]);
            let best_key = (own[best], own[best] + other[best]);
            if key < best_key {
                best = i;
            }
        }

        match session {
            Session::Morning => self.morning[best] += 1,
            Session::Evening => self.evening[best] += 1,
        }
        best
    }
}

/// Allocates supervisors to every (date, session) slot.
///
/// Dates are processed chronologically with Morning before Evening, and each
/// slot takes `blocks + extras` greedy least-loaded picks. When the roster is
/// smaller than a slot's headcount the same supervisor is picked repeatedly,
/// so one assigned list can contain duplicates.
///
/// The block configuration is resolved twice per slot: a sizing pass first,
/// which also rejects an invalid configuration before any assignment happens,
/// then again while assigning.
pub fn generate_schedule(
    dates: &[NaiveDate],
    config: &BlockConfig,
    roster: &[String],
) -> ScheduleResult<Schedule> {
    if roster.is_empty() {
        return Err(ScheduleError::EmptyRoster);
    }

    let weeks = week_numbers(dates);
    let week_of = |date: NaiveDate| weeks.get(&date).copied().unwrap_or(1);

    let mut demand = 0usize;
    for &date in dates {
        for session in Session::ALL {
            let blocks = config.resolve(date, week_of(date), session)?;
            demand += required_count(blocks);
        }
    }
    tracing::debug!(
        dates = dates.len(),
        supervisors = roster.len(),
        duties = demand,
        "allocating duties"
    );

    let mut counters = LoadCounters::new(roster.len());
    let mut entries = Vec::with_capacity(dates.len() * 2);
    for &date in dates {
        for session in Session::ALL {
            let blocks = config.resolve(date, week_of(date), session)?;
            let count = required_count(blocks);
            let mut assigned = Vec::with_capacity(count);
            for _ in 0..count {
                let idx = counters.pick(session);
                assigned.push(roster[idx].clone());
            }
            entries.push(ScheduleEntry { date, session, assigned });
        }
    }

    Ok(Schedule::new(entries))
}
