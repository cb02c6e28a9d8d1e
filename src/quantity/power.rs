use crate::quantity::{energy::WattHours, time::Hours};

quantity!(Watts, suffix: "W", precision: 0);

implement_mul!(Watts, Hours, WattHours);
