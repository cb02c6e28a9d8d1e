use std::fmt::{Debug, Formatter};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::quantity::time::Hours;

#[derive(Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct Interval {
    /// Inclusive.
    pub start: DateTime<Utc>,

    /// Exclusive.
    pub end: DateTime<Utc>,
}

impl Debug for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl Interval {
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn duration(self) -> TimeDelta {
        self.end - self.start
    }

    #[must_use]
    pub fn hours(self) -> Hours {
        Hours::from(self.duration())
    }

    #[must_use]
    pub fn start_in<Tz: TimeZone>(self, time_zone: &Tz) -> DateTime<Tz> {
        self.start.with_timezone(time_zone)
    }

    /// Chain the ordered timestamps into back-to-back intervals.
    ///
    /// Each interval ends where the next one starts, so that gaps and daylight-saving
    /// transitions keep their actual elapsed time. The last interval lasts `last_duration`.
    pub fn chain(
        timestamps: impl IntoIterator<Item = DateTime<Utc>>,
        last_duration: TimeDelta,
    ) -> Vec<Self> {
        let mut timestamps = timestamps.into_iter().peekable();
        let mut intervals = Vec::with_capacity(timestamps.size_hint().0);
        while let Some(start) = timestamps.next() {
            let end = timestamps.peek().copied().unwrap_or(start + last_duration);
            intervals.push(Self::new(start, end));
        }
        intervals
    }
}
