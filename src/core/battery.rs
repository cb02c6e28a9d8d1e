use bon::bon;
use serde::{Deserialize, Serialize};

use crate::{
    error::SimulationError,
    quantity::{Zero, energy::WattHours},
};

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatteryParameters {
    pub capacity: WattHours,

    /// Charging efficiency, `(0, 1]`.
    pub charging_efficiency: f64,

    /// Discharging efficiency, `(0, 1]`.
    pub discharging_efficiency: f64,
}

#[bon]
impl BatteryParameters {
    #[builder]
    pub fn new(
        capacity: WattHours,
        charging_efficiency: f64,
        discharging_efficiency: f64,
    ) -> Result<Self, SimulationError> {
        if !capacity.is_finite() || capacity < WattHours::ZERO {
            return Err(SimulationError::invalid_configuration(format!(
                "battery capacity must be a non-negative number, got {capacity}"
            )));
        }
        for (name, efficiency) in
            [("charging", charging_efficiency), ("discharging", discharging_efficiency)]
        {
            if !(efficiency > 0.0 && efficiency <= 1.0) {
                return Err(SimulationError::invalid_configuration(format!(
                    "{name} efficiency must be within (0, 1], got {efficiency}"
                )));
            }
        }
        Ok(Self { capacity, charging_efficiency, discharging_efficiency })
    }
}

impl BatteryParameters {
    /// Zero-capacity battery: PV serves the load directly and the grid covers the rest.
    pub const ABSENT: Self =
        Self { capacity: WattHours::ZERO, charging_efficiency: 1.0, discharging_efficiency: 1.0 };
}

/// Energy moved through the battery terminals during a single step.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    /// Change of the residual energy.
    pub internal: WattHours,

    /// Energy at the terminals: taken from the PV when charging, delivered to the load when discharging.
    pub external: WattHours,
}

impl Transfer {
    /// Conversion losses.
    pub fn losses(self) -> WattHours {
        (self.external - self.internal).abs()
    }
}

/// Battery owned by a single dispatch run.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct BatteryState {
    parameters: BatteryParameters,
    state_of_charge: WattHours,
}

impl BatteryState {
    pub fn new(
        parameters: BatteryParameters,
        initial_state_of_charge: WattHours,
    ) -> Result<Self, SimulationError> {
        if !initial_state_of_charge.is_finite()
            || initial_state_of_charge < WattHours::ZERO
            || initial_state_of_charge > parameters.capacity
        {
            return Err(SimulationError::invalid_configuration(format!(
                "initial state-of-charge must be within [0, {}], got {initial_state_of_charge}",
                parameters.capacity,
            )));
        }
        Ok(Self { parameters, state_of_charge: initial_state_of_charge })
    }

    #[must_use]
    pub const fn state_of_charge(&self) -> WattHours {
        self.state_of_charge
    }

    /// Store as much of the surplus as the remaining capacity allows.
    pub fn charge(&mut self, surplus: WattHours) -> Transfer {
        let headroom = self.parameters.capacity - self.state_of_charge;
        let stored = (surplus * self.parameters.charging_efficiency)
            .min(headroom)
            .max(WattHours::ZERO);
        self.apply(stored);
        Transfer { internal: stored, external: stored / self.parameters.charging_efficiency }
    }

    /// Deliver as much of the deficit as the residual energy allows.
    pub fn discharge(&mut self, deficit: WattHours) -> Transfer {
        let delivered = (self.state_of_charge * self.parameters.discharging_efficiency)
            .min(deficit)
            .max(WattHours::ZERO);
        let drained = delivered / self.parameters.discharging_efficiency;
        self.apply(-drained);
        Transfer { internal: drained, external: delivered }
    }

    /// Apply the residual energy change and clamp to the capacity.
    fn apply(&mut self, change: WattHours) {
        self.state_of_charge =
            (self.state_of_charge + change).clamp(WattHours::ZERO, self.parameters.capacity);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn parameters(capacity: f64, efficiency: f64) -> BatteryParameters {
        BatteryParameters::builder()
            .capacity(WattHours(capacity))
            .charging_efficiency(efficiency)
            .discharging_efficiency(efficiency)
            .build()
            .unwrap()
    }

    #[test]
    fn rejects_invalid_parameters() {
        for (capacity, charging, discharging) in [
            (-1.0, 0.9, 0.9),
            (f64::NAN, 0.9, 0.9),
            (1000.0, 0.0, 0.9),
            (1000.0, 0.9, 1.1),
            (1000.0, f64::NAN, 0.9),
        ] {
            let result = BatteryParameters::builder()
                .capacity(WattHours(capacity))
                .charging_efficiency(charging)
                .discharging_efficiency(discharging)
                .build();
            assert!(
                matches!(result, Err(SimulationError::InvalidConfiguration(_))),
                "{capacity} {charging} {discharging}",
            );
        }
    }

    #[test]
    fn rejects_initial_state_of_charge_out_of_bounds() {
        let result = BatteryState::new(parameters(1000.0, 0.9), WattHours(1000.1));
        assert!(matches!(result, Err(SimulationError::InvalidConfiguration(_))));
        let result = BatteryState::new(parameters(1000.0, 0.9), WattHours(-0.1));
        assert!(matches!(result, Err(SimulationError::InvalidConfiguration(_))));
    }

    #[test]
    fn charge_with_losses() {
        let mut battery = BatteryState::new(parameters(1000.0, 0.9), WattHours::ZERO).unwrap();
        let transfer = battery.charge(WattHours(300.0));
        assert_abs_diff_eq!(transfer.internal.0, 270.0, epsilon = 1e-9);
        assert_abs_diff_eq!(transfer.external.0, 300.0, epsilon = 1e-9);
        assert_abs_diff_eq!(transfer.losses().0, 30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(battery.state_of_charge().0, 270.0, epsilon = 1e-9);
    }

    #[test]
    fn charge_overflow() {
        let mut battery = BatteryState::new(parameters(1000.0, 0.5), WattHours(900.0)).unwrap();
        let transfer = battery.charge(WattHours(1000.0));
        assert_abs_diff_eq!(transfer.internal.0, 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(transfer.external.0, 200.0, epsilon = 1e-9);
        assert_eq!(battery.state_of_charge(), WattHours(1000.0));
    }

    #[test]
    fn discharge_underflow() {
        let mut battery = BatteryState::new(parameters(1000.0, 0.5), WattHours(100.0)).unwrap();
        let transfer = battery.discharge(WattHours(1000.0));
        assert_abs_diff_eq!(transfer.external.0, 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(transfer.internal.0, 100.0, epsilon = 1e-9);
        assert_eq!(battery.state_of_charge(), WattHours::ZERO);
    }

    #[test]
    fn absent_battery_is_inert() {
        let mut battery = BatteryState::new(BatteryParameters::ABSENT, WattHours::ZERO).unwrap();
        assert_eq!(battery.charge(WattHours(500.0)).external, WattHours::ZERO);
        assert_eq!(battery.discharge(WattHours(500.0)).external, WattHours::ZERO);
        assert_eq!(battery.state_of_charge(), WattHours::ZERO);
    }
}
