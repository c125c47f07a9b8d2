use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};

use super::error::{ScheduleError, ScheduleResult};
use super::types::Session;

/// Per-session block counts for a day-granularity override. A `None` session
/// falls through to the next configuration layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayBlocks {
    pub morning: Option<u32>,
    pub evening: Option<u32>,
}

impl DayBlocks {
    pub fn both(morning: u32, evening: u32) -> Self {
        DayBlocks {
            morning: Some(morning),
            evening: Some(evening),
        }
    }

    pub fn get(&self, session: Session) -> Option<u32> {
        match session {
            Session::Morning => self.morning,
            Session::Evening => self.evening,
        }
    }
}

/// Layered block-count configuration.
///
/// Keys are structured (date, weekday, week number) rather than composed
/// strings, so resolution never depends on map iteration order. Layers from
/// highest to lowest priority:
///
/// 1. `date_session_blocks` — a single (date, session) slot
/// 2. `date_blocks` — one date, both sessions
/// 3. `week_weekday_blocks` — a weekday within one period week
/// 4. `weekday_blocks` — a weekday in every week
/// 5. `session_defaults` — all mornings / all evenings
/// 6. `default_blocks` — everything else
#[derive(Debug, Clone, PartialEq)]
pub struct BlockConfig {
    pub default_blocks: u32,
    pub session_defaults: DayBlocks,
    pub weekday_blocks: HashMap<Weekday, DayBlocks>,
    pub week_weekday_blocks: HashMap<(u32, Weekday), DayBlocks>,
    pub date_blocks: HashMap<NaiveDate, u32>,
    pub date_session_blocks: HashMap<(NaiveDate, Session), u32>,
}

impl Default for BlockConfig {
    fn default() -> Self {
        BlockConfig::with_default(2)
    }
}

impl BlockConfig {
    /// A configuration with only the global default set.
    pub fn with_default(default_blocks: u32) -> Self {
        BlockConfig {
            default_blocks,
            session_defaults: DayBlocks::default(),
            weekday_blocks: HashMap::new(),
            week_weekday_blocks: HashMap::new(),
            date_blocks: HashMap::new(),
            date_session_blocks: HashMap::new(),
        }
    }

    /// Resolves the block count for one (date, session) slot. `week` is the
    /// period-relative week number of `date` (see `calendar::week_numbers`).
    ///
    /// Pure and deterministic: the same inputs always resolve to the same
    /// value, and the engine relies on that when it resolves each slot twice
    /// (once to size demand, once while assigning). A resolved count of zero
    /// is a configuration error.
    pub fn resolve(&self, date: NaiveDate, week: u32, session: Session) -> ScheduleResult<u32> {
        let weekday = date.weekday();
        let blocks = if let Some(&b) = self.date_session_blocks.get(&(date, session)) {
            b
        } else if let Some(&b) = self.date_blocks.get(&date) {
            b
        } else if let Some(b) = self
            .week_weekday_blocks
            .get(&(week, weekday))
            .and_then(|d| d.get(session))
        {
            b
        } else if let Some(b) = self.weekday_blocks.get(&weekday).and_then(|d| d.get(session)) {
            b
        } else if let Some(b) = self.session_defaults.get(session) {
            b
        } else {
            self.default_blocks
        };

        if blocks == 0 {
            return Err(ScheduleError::InvalidBlocks { date, session, blocks });
        }
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    // 2024-01-01 is a Monday in week 1 of its period.
    const WEEK: u32 = 1;

    #[test]
    fn global_default_applies_when_nothing_else_matches() {
        let config = BlockConfig::with_default(3);
        assert_eq!(config.resolve(date("2024-01-01"), WEEK, Session::Morning), Ok(3));
        assert_eq!(config.resolve(date("2024-01-01"), WEEK, Session::Evening), Ok(3));
    }

    #[test]
    fn session_default_beats_global_default() {
        let mut config = BlockConfig::with_default(2);
        config.session_defaults.morning = Some(4);
        assert_eq!(config.resolve(date("2024-01-01"), WEEK, Session::Morning), Ok(4));
        assert_eq!(config.resolve(date("2024-01-01"), WEEK, Session::Evening), Ok(2));
    }

    #[test]
    fn weekday_override_beats_session_default() {
        let mut config = BlockConfig::with_default(2);
        config.session_defaults.morning = Some(4);
        config.weekday_blocks.insert(Weekday::Mon, DayBlocks::both(5, 6));
        assert_eq!(config.resolve(date("2024-01-01"), WEEK, Session::Morning), Ok(5));
        assert_eq!(config.resolve(date("2024-01-01"), WEEK, Session::Evening), Ok(6));
        // A Tuesday is untouched by the Monday override.
        assert_eq!(config.resolve(date("2024-01-02"), WEEK, Session::Morning), Ok(4));
    }

    #[test]
    fn week_scoped_weekday_beats_plain_weekday() {
        let mut config = BlockConfig::default();
        config.weekday_blocks.insert(Weekday::Mon, DayBlocks::both(3, 3));
        config
            .week_weekday_blocks
            .insert((2, Weekday::Mon), DayBlocks::both(7, 7));
        // Week 1 Monday: plain weekday override.
        assert_eq!(config.resolve(date("2024-01-01"), 1, Session::Morning), Ok(3));
        // Week 2 Monday: week-scoped override wins.
        assert_eq!(config.resolve(date("2024-01-08"), 2, Session::Morning), Ok(7));
    }

    #[test]
    fn week_scoped_entry_falls_through_for_missing_session() {
        let mut config = BlockConfig::default();
        config.weekday_blocks.insert(Weekday::Mon, DayBlocks::both(3, 3));
        config.week_weekday_blocks.insert(
            (1, Weekday::Mon),
            DayBlocks { morning: Some(9), evening: None },
        );
        assert_eq!(config.resolve(date("2024-01-01"), 1, Session::Morning), Ok(9));
        assert_eq!(config.resolve(date("2024-01-01"), 1, Session::Evening), Ok(3));
    }

    #[test]
    fn date_override_beats_all_day_defaults() {
        let mut config = BlockConfig::default();
        config.weekday_blocks.insert(Weekday::Mon, DayBlocks::both(3, 3));
        config
            .week_weekday_blocks
            .insert((1, Weekday::Mon), DayBlocks::both(4, 4));
        config.date_blocks.insert(date("2024-01-01"), 8);
        assert_eq!(config.resolve(date("2024-01-01"), 1, Session::Morning), Ok(8));
        assert_eq!(config.resolve(date("2024-01-01"), 1, Session::Evening), Ok(8));
    }

    #[test]
    fn date_session_override_wins_over_everything() {
        let mut config = BlockConfig::default();
        config.weekday_blocks.insert(Weekday::Mon, DayBlocks::both(3, 3));
        config.date_blocks.insert(date("2024-01-01"), 8);
        config
            .date_session_blocks
            .insert((date("2024-01-01"), Session::Morning), 1);
        assert_eq!(config.resolve(date("2024-01-01"), 1, Session::Morning), Ok(1));
        // The per-date override still covers the other session.
        assert_eq!(config.resolve(date("2024-01-01"), 1, Session::Evening), Ok(8));
    }

    #[test]
    fn zero_blocks_is_a_configuration_error() {
        let mut config = BlockConfig::default();
        config.date_blocks.insert(date("2024-01-01"), 0);
        assert_eq!(
            config.resolve(date("2024-01-01"), 1, Session::Morning),
            Err(ScheduleError::InvalidBlocks {
                date: date("2024-01-01"),
                session: Session::Morning,
                blocks: 0,
            })
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let mut config = BlockConfig::default();
        config.weekday_blocks.insert(Weekday::Tue, DayBlocks::both(5, 2));
        config.date_blocks.insert(date("2024-01-02"), 6);
        let first = config.resolve(date("2024-01-02"), 1, Session::Evening);
        let second = config.resolve(date("2024-01-02"), 1, Session::Evening);
        assert_eq!(first, second);
        assert_eq!(first, Ok(6));
    }
}
