use derive_more::{Add, AddAssign, Sub};
use serde::{Deserialize, Serialize};

use crate::quantity::Zero;

/// Generic bidirectional energy flow.
#[must_use]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Add, Sub, AddAssign, Serialize, Deserialize)]
pub struct Flow<T> {
    /// Importing from the grid or charging the battery.
    pub import: T,

    /// Exporting to the grid or discharging the battery.
    pub export: T,
}

impl<T: Zero> Zero for Flow<T> {
    const ZERO: Self = Self { import: T::ZERO, export: T::ZERO };
}
