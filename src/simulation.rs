//! The whole pipeline: weather, PV yield, load, dispatch.

use bon::Builder;
use chrono_tz::Tz;
use serde::Serialize;

use crate::{
    core::{
        battery::BatteryParameters,
        dispatcher::{DispatchResult, EnergyDispatcher},
    },
    error::SimulationError,
    load::LoadProfile,
    prelude::*,
    pv::{PowerSample, PvSystem, PvYieldModel},
    quantity::{Zero, energy::WattHours, power::Watts},
    report::ReportAggregator,
    weather::{WeatherRequest, WeatherSample, WeatherSource},
};

/// Immutable simulation inputs.
#[must_use]
#[derive(Clone, Debug, Builder)]
pub struct Scenario {
    pub weather: WeatherRequest,

    pub system: PvSystem,

    #[builder(default)]
    pub load: LoadProfile,

    #[builder(default = BatteryParameters::ABSENT)]
    pub battery: BatteryParameters,

    #[builder(default = WattHours::ZERO)]
    pub initial_state_of_charge: WattHours,

    /// Unlimited when [`None`].
    pub grid_import_limit: Option<Watts>,

    /// Time zone of the load profile hours and the report periods.
    #[builder(default = Tz::UTC)]
    pub time_zone: Tz,
}

/// Every series of a run, step by step.
#[must_use]
#[derive(Serialize)]
pub struct Outcome {
    pub weather: Vec<WeatherSample>,
    pub power: Vec<PowerSample>,
    pub load: Vec<PowerSample>,
    pub dispatch: Vec<DispatchResult>,
}

impl Scenario {
    /// Fetch the weather and simulate.
    #[instrument(skip_all, fields(source = %source.id()))]
    pub async fn run(&self, source: &dyn WeatherSource) -> Result<Outcome> {
        let weather = source.fetch(&self.weather).await.context("failed to fetch the weather")?;
        Ok(self.run_on(weather)?)
    }

    /// Simulate on the already fetched weather series.
    pub fn run_on(&self, weather: Vec<WeatherSample>) -> Result<Outcome, SimulationError> {
        let power = PvYieldModel::new(&self.system, self.weather.location)
            .run(&weather, self.weather.resolution);
        let load = self.load.series(&power, &self.time_zone);
        let dispatch = EnergyDispatcher::builder()
            .battery(self.battery)
            .initial_state_of_charge(self.initial_state_of_charge)
            .maybe_grid_import_limit(self.grid_import_limit)
            .build()
            .dispatch(&power, &load)?;
        info!(
            n_steps = dispatch.len(),
            pv_production = ?dispatch.iter().map(|result| result.pv_production).sum::<WattHours>(),
            grid_import = ?dispatch.iter().map(|result| result.grid_import).sum::<WattHours>(),
            "simulated",
        );
        Ok(Outcome { weather, power, load, dispatch })
    }
}

impl Outcome {
    pub fn report(&self, scenario: &Scenario) -> ReportAggregator<'_, Tz> {
        ReportAggregator::new(&self.dispatch, scenario.time_zone, scenario.battery.capacity)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{NaiveDate, TimeDelta};

    use super::*;
    use crate::{
        pv::tower::TowerGeometry,
        solar::Location,
        weather::clear_sky::ClearSky,
    };

    fn scenario(resolution: TimeDelta) -> Scenario {
        let weather = WeatherRequest::builder()
            .location(Location { latitude: 40.0, longitude: -80.0, elevation: 300.0 })
            .start(NaiveDate::from_ymd_opt(2024, 1, 30).unwrap())
            .end(NaiveDate::from_ymd_opt(2024, 2, 2).unwrap())
            .resolution(resolution)
            .build()
            .unwrap();
        let system = PvSystem::builder()
            .arrays(TowerGeometry::default().facets().unwrap())
            .build()
            .unwrap();
        let battery = BatteryParameters::builder()
            .capacity(WattHours(10_000.0))
            .charging_efficiency(0.95)
            .discharging_efficiency(0.95)
            .build()
            .unwrap();
        Scenario::builder()
            .weather(weather)
            .system(system)
            .battery(battery)
            .time_zone(chrono_tz::America::New_York)
            .build()
    }

    #[tokio::test]
    async fn clear_sky_tower() -> Result {
        let scenario = scenario(TimeDelta::hours(1));
        let outcome = scenario.run(&ClearSky::builder().build()).await?;
        assert_eq!(outcome.weather.len(), 4 * 24);
        assert_eq!(outcome.power.len(), outcome.dispatch.len());
        assert_eq!(outcome.load.len(), outcome.dispatch.len());

        let report = outcome.report(&scenario);
        let total = report.total();
        assert!(total.pv_production > WattHours::ZERO);
        assert_abs_diff_eq!(total.load.0, 1000.0 * 96.0, epsilon = 1e-6);
        assert_abs_diff_eq!(
            (total.pv_direct + total.discharged + total.grid_import).0,
            total.load.0,
            epsilon = 1e-6,
        );
        assert!(total.peak_pv_power <= scenario.system.dc_capacity());
        assert_eq!(report.monthly().count(), 2);
        Ok(())
    }

    #[test]
    fn resolution_keeps_the_energy() -> Result {
        let hourly = scenario(TimeDelta::hours(1));
        let half_hourly = scenario(TimeDelta::minutes(30));
        let clear_sky = ClearSky::builder().build();
        let weather = |scenario: &Scenario| {
            let mut samples = Vec::new();
            let mut timestamp = scenario.weather.start_time();
            while timestamp < scenario.weather.end_time() {
                samples.push(clear_sky.sample_at(&scenario.weather.location, timestamp));
                timestamp += TimeDelta::hours(1);
            }
            scenario.weather.prepare(samples)
        };
        let hourly_load = hourly.run_on(weather(&hourly)?)?.report(&hourly).total().load;
        let half_hourly_load =
            half_hourly.run_on(weather(&half_hourly)?)?.report(&half_hourly).total().load;
        assert_abs_diff_eq!(hourly_load.0, half_hourly_load.0, epsilon = 1e-6);
        Ok(())
    }

    #[tokio::test]
    async fn outcome_exports_every_series() -> Result {
        let scenario = scenario(TimeDelta::hours(1));
        let outcome = scenario.run(&ClearSky::builder().build()).await?;
        let exported = serde_json::to_value(&outcome)?;
        for key in ["weather", "power", "load", "dispatch"] {
            assert_eq!(exported[key].as_array().map(Vec::len), Some(96), "{key}");
        }
        Ok(())
    }

    #[test]
    fn rejects_out_of_range_state_of_charge() {
        let scenario = Scenario { initial_state_of_charge: WattHours(20_000.0), ..scenario(TimeDelta::hours(1)) };
        let clear_sky = ClearSky::builder().build();
        let weather = vec![clear_sky.sample_at(&scenario.weather.location, scenario.weather.start_time())];
        assert!(matches!(
            scenario.run_on(weather),
            Err(SimulationError::InvalidConfiguration(_)),
        ));
    }
}
