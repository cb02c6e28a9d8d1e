use std::time::Instant;

use bon::Builder;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        battery::{BatteryParameters, BatteryState},
        flow::Flow,
        interval::Interval,
        sample::PowerSample,
    },
    error::SimulationError,
    prelude::*,
    quantity::{Zero, energy::WattHours, power::Watts},
};

/// Outcome of a single dispatch step.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub interval: Interval,

    /// Total PV energy produced during the step.
    pub pv_production: WattHours,

    /// Load demand during the step.
    pub load: WattHours,

    /// PV energy consumed by the load directly.
    pub pv_direct: WattHours,

    /// Import is the energy stored in the battery, export is the energy the battery delivered to the load.
    pub battery: Flow<WattHours>,

    /// Battery conversion losses.
    pub losses: WattHours,

    pub grid_import: WattHours,

    /// Load left unserved because of the grid import limit.
    pub unserved: WattHours,

    /// Surplus PV energy neither consumed nor stored.
    pub curtailed: WattHours,

    /// Residual energy at the end of the step.
    pub state_of_charge: WattHours,
}

/// Time-stepped allocation of PV energy among the load, the battery and the grid.
#[must_use]
#[derive(Copy, Clone, Debug, Builder)]
pub struct EnergyDispatcher {
    battery: BatteryParameters,

    #[builder(default = WattHours::ZERO)]
    initial_state_of_charge: WattHours,

    /// Maximum grid import power, unlimited when [`None`].
    grid_import_limit: Option<Watts>,
}

impl EnergyDispatcher {
    /// Dispatch the PV production against the load, step by step.
    ///
    /// The whole input is validated before the first step runs, and each step uses
    /// its own actual duration.
    #[instrument(skip_all, fields(n_steps = pv.len()))]
    pub fn dispatch(
        &self,
        pv: &[PowerSample],
        load: &[PowerSample],
    ) -> Result<Vec<DispatchResult>, SimulationError> {
        self.validate(pv, load)?;
        let mut battery = BatteryState::new(self.battery, self.initial_state_of_charge)?;

        let start_time = Instant::now();
        let results: Vec<_> = pv
            .iter()
            .zip(load)
            .map(|(pv, load)| self.step(&mut battery, pv, load))
            .collect();
        debug!(
            elapsed = ?start_time.elapsed(),
            final_state_of_charge = ?battery.state_of_charge(),
            "dispatched",
        );
        Ok(results)
    }

    fn validate(&self, pv: &[PowerSample], load: &[PowerSample]) -> Result<(), SimulationError> {
        if let Some(limit) = self.grid_import_limit
            && (!limit.is_finite() || limit < Watts::ZERO)
        {
            return Err(SimulationError::invalid_configuration(format!(
                "grid import limit must be a non-negative number, got {limit}"
            )));
        }
        if pv.len() != load.len() {
            return Err(SimulationError::input_mismatch(format!(
                "PV series has {} samples, but the load series has {}",
                pv.len(),
                load.len(),
            )));
        }
        for (index, (pv, load)) in pv.iter().zip(load).enumerate() {
            if pv.interval != load.interval {
                return Err(SimulationError::input_mismatch(format!(
                    "sample #{index} is misaligned: PV covers {:?}, load covers {:?}",
                    pv.interval, load.interval,
                )));
            }
            for (name, power) in [("PV", pv.power), ("load", load.power)] {
                if !(power.is_finite() && power >= Watts::ZERO) {
                    return Err(SimulationError::invalid_configuration(format!(
                        "sample #{index} has an invalid {name} power: {power}"
                    )));
                }
            }
            if pv.interval.duration() <= TimeDelta::zero() {
                return Err(SimulationError::invalid_configuration(format!(
                    "sample #{index} has a non-positive duration: {:?}",
                    pv.interval,
                )));
            }
        }
        Ok(())
    }

    fn step(
        &self,
        battery: &mut BatteryState,
        pv: &PowerSample,
        load: &PowerSample,
    ) -> DispatchResult {
        let interval = pv.interval;
        let pv_production = pv.energy();
        let load = load.energy();

        let mut result = DispatchResult {
            interval,
            pv_production,
            load,
            pv_direct: pv_production.min(load),
            battery: Flow::ZERO,
            losses: WattHours::ZERO,
            grid_import: WattHours::ZERO,
            unserved: WattHours::ZERO,
            curtailed: WattHours::ZERO,
            state_of_charge: WattHours::ZERO,
        };

        if pv_production >= load {
            let surplus = pv_production - load;
            let transfer = battery.charge(surplus);
            result.battery.import = transfer.internal;
            result.losses = transfer.losses();

            // Whatever the battery could not take is discarded:
            result.curtailed = (surplus - transfer.external).max(WattHours::ZERO);
        } else {
            let deficit = load - pv_production;
            let transfer = battery.discharge(deficit);
            result.battery.export = transfer.external;
            result.losses = transfer.losses();

            let remaining = (deficit - transfer.external).max(WattHours::ZERO);
            result.grid_import =
                self.grid_import_limit.map_or(remaining, |limit| remaining.min(limit * interval.hours()));
            result.unserved = remaining - result.grid_import;
        }

        result.state_of_charge = battery.state_of_charge();
        trace!(
            start = ?interval.start,
            ?pv_production,
            ?load,
            grid_import = ?result.grid_import,
            state_of_charge = ?result.state_of_charge,
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;

    const EPSILON: f64 = 1e-9;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn series(step: TimeDelta, powers: &[f64]) -> Vec<PowerSample> {
        let timestamps = (0..powers.len()).map(|index| start() + step * index as i32);
        Interval::chain(timestamps, step)
            .into_iter()
            .zip(powers)
            .map(|(interval, power)| PowerSample::new(interval, Watts(*power)))
            .collect()
    }

    fn battery(capacity: f64, charging: f64, discharging: f64) -> BatteryParameters {
        BatteryParameters::builder()
            .capacity(WattHours(capacity))
            .charging_efficiency(charging)
            .discharging_efficiency(discharging)
            .build()
            .unwrap()
    }

    /// Sinusoidal PV production against a wobbly load, a few days long.
    fn daily_cycle(n_steps: usize) -> (Vec<PowerSample>, Vec<PowerSample>) {
        let pv: Vec<f64> = (0..n_steps)
            .map(|index| {
                let hour = (index % 24) as f64;
                (1800.0 * (std::f64::consts::PI * (hour - 6.0) / 12.0).sin()).max(0.0)
            })
            .collect();
        let load: Vec<f64> =
            (0..n_steps).map(|index| 400.0 + 300.0 * ((index as f64) * 0.7).sin().abs()).collect();
        (series(TimeDelta::hours(1), &pv), series(TimeDelta::hours(1), &load))
    }

    #[test]
    fn worked_scenario() {
        let dispatcher =
            EnergyDispatcher::builder().battery(battery(1000.0, 0.9, 0.9)).build();
        let results = dispatcher
            .dispatch(
                &series(TimeDelta::hours(1), &[500.0, 0.0, 0.0]),
                &series(TimeDelta::hours(1), &[200.0, 200.0, 200.0]),
            )
            .unwrap();
        assert_eq!(results.len(), 3);

        assert_abs_diff_eq!(results[0].pv_direct.0, 200.0, epsilon = EPSILON);
        assert_abs_diff_eq!(results[0].battery.import.0, 270.0, epsilon = EPSILON);
        assert_abs_diff_eq!(results[0].state_of_charge.0, 270.0, epsilon = EPSILON);
        assert_abs_diff_eq!(results[0].curtailed.0, 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(results[0].grid_import.0, 0.0, epsilon = EPSILON);

        assert_abs_diff_eq!(results[1].battery.export.0, 200.0, epsilon = EPSILON);
        assert_abs_diff_eq!(results[1].state_of_charge.0, 270.0 - 200.0 / 0.9, epsilon = EPSILON);
        assert_abs_diff_eq!(results[1].grid_import.0, 0.0, epsilon = EPSILON);

        let remaining = 270.0 - 200.0 / 0.9;
        assert_abs_diff_eq!(results[2].battery.export.0, remaining * 0.9, epsilon = EPSILON);
        assert_abs_diff_eq!(results[2].state_of_charge.0, 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(results[2].grid_import.0, 200.0 - remaining * 0.9, epsilon = EPSILON);
        assert_abs_diff_eq!(results[2].grid_import.0, 157.0, epsilon = 0.1);
    }

    #[test]
    fn state_of_charge_stays_within_capacity() {
        let (pv, load) = daily_cycle(24 * 7);
        for capacity in [0.0, 500.0, 2000.0, 10000.0] {
            let dispatcher = EnergyDispatcher::builder()
                .battery(battery(capacity, 0.95, 0.9))
                .initial_state_of_charge(WattHours(capacity / 2.0))
                .build();
            for result in dispatcher.dispatch(&pv, &load).unwrap() {
                assert!(result.state_of_charge >= WattHours::ZERO);
                assert!(result.state_of_charge <= WattHours(capacity));
            }
        }
    }

    #[test]
    fn energy_is_conserved() {
        let (pv, load) = daily_cycle(24 * 7);
        let parameters = battery(3000.0, 0.95, 0.9);
        let dispatcher = EnergyDispatcher::builder().battery(parameters).build();
        let mut previous_state_of_charge = WattHours::ZERO;
        for result in dispatcher.dispatch(&pv, &load).unwrap() {
            // Load side:
            let served = result.pv_direct + result.battery.export + result.grid_import;
            assert_abs_diff_eq!(served.0, result.load.0, epsilon = EPSILON);

            // PV side:
            let charged_from_pv = result.battery.import / parameters.charging_efficiency;
            assert_abs_diff_eq!(
                (result.pv_direct + charged_from_pv + result.curtailed).0,
                result.pv_production.0,
                epsilon = EPSILON,
            );

            // Battery side:
            let drained = result.battery.export / parameters.discharging_efficiency;
            assert_abs_diff_eq!(
                (previous_state_of_charge + result.battery.import - drained).0,
                result.state_of_charge.0,
                epsilon = EPSILON,
            );
            previous_state_of_charge = result.state_of_charge;
        }
    }

    #[test]
    fn zero_capacity_degrades_to_pv_then_grid() {
        let dispatcher = EnergyDispatcher::builder().battery(battery(0.0, 0.9, 0.9)).build();
        let results = dispatcher
            .dispatch(
                &series(TimeDelta::hours(1), &[500.0, 100.0]),
                &series(TimeDelta::hours(1), &[200.0, 300.0]),
            )
            .unwrap();
        for result in &results {
            assert_eq!(result.battery, Flow::ZERO);
            assert_eq!(result.losses, WattHours::ZERO);
            assert_eq!(result.state_of_charge, WattHours::ZERO);
        }
        assert_eq!(results[0].curtailed, WattHours(300.0));
        assert_eq!(results[0].grid_import, WattHours::ZERO);
        assert_eq!(results[1].pv_direct, WattHours(100.0));
        assert_eq!(results[1].grid_import, WattHours(200.0));
    }

    #[test]
    fn surplus_exactly_fills_battery() {
        let dispatcher = EnergyDispatcher::builder().battery(battery(900.0, 0.9, 0.9)).build();
        let results = dispatcher
            .dispatch(
                &series(TimeDelta::hours(1), &[1200.0]),
                &series(TimeDelta::hours(1), &[200.0]),
            )
            .unwrap();
        assert_abs_diff_eq!(results[0].state_of_charge.0, 900.0, epsilon = EPSILON);
        assert_abs_diff_eq!(results[0].curtailed.0, 0.0, epsilon = EPSILON);
    }

    #[test]
    fn uses_actual_step_duration() {
        let timestamps = [start(), start() + TimeDelta::hours(1), start() + TimeDelta::hours(3)];
        let intervals = Interval::chain(timestamps, TimeDelta::hours(1));
        let pv: Vec<_> =
            intervals.iter().map(|interval| PowerSample::new(*interval, Watts::ZERO)).collect();
        let load: Vec<_> =
            intervals.iter().map(|interval| PowerSample::new(*interval, Watts(100.0))).collect();
        let results = EnergyDispatcher::builder()
            .battery(BatteryParameters::ABSENT)
            .build()
            .dispatch(&pv, &load)
            .unwrap();
        assert_eq!(results[0].grid_import, WattHours(100.0));
        assert_eq!(results[1].grid_import, WattHours(200.0));
        assert_eq!(results[2].grid_import, WattHours(100.0));
    }

    #[test]
    fn grid_limit_leaves_load_unserved() {
        let results = EnergyDispatcher::builder()
            .battery(BatteryParameters::ABSENT)
            .grid_import_limit(Watts(150.0))
            .build()
            .dispatch(
                &series(TimeDelta::minutes(30), &[0.0, 0.0]),
                &series(TimeDelta::minutes(30), &[100.0, 400.0]),
            )
            .unwrap();
        assert_eq!(results[0].grid_import, WattHours(50.0));
        assert_eq!(results[0].unserved, WattHours::ZERO);
        assert_eq!(results[1].grid_import, WattHours(75.0));
        assert_eq!(results[1].unserved, WattHours(125.0));
    }

    #[test]
    fn rejects_unequal_lengths() {
        let result = EnergyDispatcher::builder()
            .battery(BatteryParameters::ABSENT)
            .build()
            .dispatch(
                &series(TimeDelta::hours(1), &[1.0, 2.0]),
                &series(TimeDelta::hours(1), &[1.0]),
            );
        assert!(matches!(result, Err(SimulationError::InputMismatch(_))));
    }

    #[test]
    fn rejects_misaligned_timestamps() {
        let pv = series(TimeDelta::hours(1), &[1.0, 2.0]);
        let load = series(TimeDelta::minutes(30), &[1.0, 2.0]);
        let result =
            EnergyDispatcher::builder().battery(BatteryParameters::ABSENT).build().dispatch(&pv, &load);
        assert!(matches!(result, Err(SimulationError::InputMismatch(_))));
    }

    #[test]
    fn rejects_non_positive_duration() {
        let interval = Interval::new(start(), start());
        let samples = [PowerSample::new(interval, Watts(1.0))];
        let result = EnergyDispatcher::builder()
            .battery(BatteryParameters::ABSENT)
            .build()
            .dispatch(&samples, &samples);
        assert!(matches!(result, Err(SimulationError::InvalidConfiguration(_))));
    }

    #[test]
    fn rejects_invalid_power() {
        let dispatcher = EnergyDispatcher::builder().battery(battery(1000.0, 0.9, 0.9)).build();
        for (pv, load) in [(f64::NAN, 200.0), (-100.0, 0.0), (100.0, f64::INFINITY), (0.0, -1.0)] {
            let result = dispatcher.dispatch(
                &series(TimeDelta::hours(1), &[100.0, pv]),
                &series(TimeDelta::hours(1), &[100.0, load]),
            );
            assert!(
                matches!(result, Err(SimulationError::InvalidConfiguration(_))),
                "PV {pv}, load {load}",
            );
        }
    }

    #[test]
    fn rejects_invalid_initial_state_of_charge() {
        let result = EnergyDispatcher::builder()
            .battery(battery(100.0, 0.9, 0.9))
            .initial_state_of_charge(WattHours(200.0))
            .build()
            .dispatch(&[], &[]);
        assert!(matches!(result, Err(SimulationError::InvalidConfiguration(_))));
    }

    #[test]
    fn rejects_negative_grid_limit() {
        let result = EnergyDispatcher::builder()
            .battery(BatteryParameters::ABSENT)
            .grid_import_limit(Watts(-1.0))
            .build()
            .dispatch(&[], &[]);
        assert!(matches!(result, Err(SimulationError::InvalidConfiguration(_))));
    }
}
