//! Battery and grid.

use clap::Parser;

use crate::{
    core::battery::BatteryParameters,
    prelude::*,
    quantity::{energy::WattHours, power::Watts},
};

#[must_use]
#[derive(Parser)]
pub struct BatteryArgs {
    /// Usable capacity, zero for no battery.
    #[clap(
        long = "battery-capacity-watt-hours",
        env = "BATTERY_CAPACITY_WATT_HOURS",
        default_value = "10000"
    )]
    pub capacity: WattHours,

    #[clap(
        long = "battery-charging-efficiency",
        env = "BATTERY_CHARGING_EFFICIENCY",
        default_value = "0.95"
    )]
    pub charging_efficiency: f64,

    #[clap(
        long = "battery-discharging-efficiency",
        env = "BATTERY_DISCHARGING_EFFICIENCY",
        default_value = "0.95"
    )]
    pub discharging_efficiency: f64,

    /// Residual energy at the start of the simulation.
    #[clap(
        long = "battery-initial-watt-hours",
        env = "BATTERY_INITIAL_WATT_HOURS",
        default_value = "0"
    )]
    pub initial_state_of_charge: WattHours,

    /// Maximum grid import power, unlimited by default.
    #[clap(long = "grid-import-limit-watts", env = "GRID_IMPORT_LIMIT_WATTS")]
    pub grid_import_limit: Option<Watts>,
}

impl BatteryArgs {
    pub fn parameters(&self) -> Result<BatteryParameters> {
        Ok(BatteryParameters::builder()
            .capacity(self.capacity)
            .charging_efficiency(self.charging_efficiency)
            .discharging_efficiency(self.discharging_efficiency)
            .build()?)
    }
}
