use chrono::NaiveDate;
use thiserror::Error;

use super::types::Session;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("no supervisors available: the roster is empty")]
    EmptyRoster,

    #[error("invalid block count {blocks} for {date} {session}: blocks must be a positive integer")]
    InvalidBlocks {
        date: NaiveDate,
        session: Session,
        blocks: u32,
    },
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
