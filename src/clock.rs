//! Wall-clock access, injectable so cache and scheduler logic can be tested
//! without waiting on real time.

use crate::models::CalendarDay;
use chrono::{DateTime, Local};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// The current local calendar day.
    fn today(&self) -> CalendarDay {
        CalendarDay::of(&self.now())
    }
}

/// The real local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}
