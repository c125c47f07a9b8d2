pub mod calendar;
pub mod config;
pub mod engine;
pub mod error;
pub mod types;

pub use calendar::{exam_dates, week_numbers};
pub use config::{BlockConfig, DayBlocks};
pub use engine::{generate_schedule, required_count};
pub use error::{ScheduleError, ScheduleResult};
pub use types::{DutyRow, Schedule, ScheduleEntry, Session, Workload};
