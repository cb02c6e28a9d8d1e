use serde::{Deserialize, Serialize};

use crate::{
    core::interval::Interval,
    quantity::{energy::WattHours, power::Watts},
};

/// Average power over an interval.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PowerSample {
    pub interval: Interval,
    pub power: Watts,
}

impl PowerSample {
    pub const fn new(interval: Interval, power: Watts) -> Self {
        Self { interval, power }
    }

    pub fn energy(&self) -> WattHours {
        self.power * self.interval.hours()
    }
}
