//! Calendar reports over the dispatch results.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Datelike, TimeDelta, TimeZone, Timelike};
use itertools::Itertools;
use serde::Serialize;

use crate::{
    core::{dispatcher::DispatchResult, interval::Interval},
    quantity::{Zero, energy::WattHours, power::Watts, temperature::Celsius, time::Hours},
    weather::WeatherSample,
};

/// Calendar period in the report time zone.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub enum Period {
    Month { year: i32, month: u32 },
    Year { year: i32 },
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Month { year, month } => write!(f, "{year}-{month:02}"),
            Self::Year { year } => write!(f, "{year}"),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Granularity {
    Month,
    Year,
}

impl Granularity {
    fn period_of<Tz: TimeZone>(self, timestamp: &DateTime<Tz>) -> Period {
        match self {
            Self::Month => Period::Month { year: timestamp.year(), month: timestamp.month() },
            Self::Year => Period::Year { year: timestamp.year() },
        }
    }
}

/// Energy totals and ratios over a period.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct Summary {
    pub pv_production: WattHours,
    pub load: WattHours,
    pub pv_direct: WattHours,

    /// Energy stored in the battery.
    pub charged: WattHours,

    /// Energy the battery delivered to the load.
    pub discharged: WattHours,

    pub losses: WattHours,
    pub grid_import: WattHours,
    pub unserved: WattHours,
    pub curtailed: WattHours,

    /// Highest average PV power of a single step.
    pub peak_pv_power: Watts,

    /// Covered time.
    pub hours: Hours,

    /// Covered local calendar days.
    pub n_days: usize,

    /// Equivalent full charges.
    pub battery_cycles: f64,
}

impl Summary {
    fn over<Tz: TimeZone>(
        results: &[DispatchResult],
        time_zone: &Tz,
        battery_capacity: WattHours,
    ) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.pv_production += result.pv_production;
            summary.load += result.load;
            summary.pv_direct += result.pv_direct;
            summary.charged += result.battery.import;
            summary.discharged += result.battery.export;
            summary.losses += result.losses;
            summary.grid_import += result.grid_import;
            summary.unserved += result.unserved;
            summary.curtailed += result.curtailed;
            summary.hours += result.interval.hours();
            summary.peak_pv_power =
                summary.peak_pv_power.max(result.pv_production / result.interval.hours());
        }
        summary.n_days = results
            .iter()
            .map(|result| result.interval.start_in(time_zone).date_naive())
            .dedup()
            .count();
        if battery_capacity > WattHours::ZERO {
            summary.battery_cycles = summary.charged / battery_capacity;
        }
        summary
    }

    /// Share of the load covered without the grid.
    #[must_use]
    pub fn self_sufficiency(&self) -> Option<f64> {
        (self.load > WattHours::ZERO)
            .then(|| (self.pv_direct + self.discharged) / self.load)
    }

    /// Share of the PV production used on site, directly or through the battery.
    #[must_use]
    pub fn self_consumption(&self) -> Option<f64> {
        (self.pv_production > WattHours::ZERO)
            .then(|| (self.pv_production - self.curtailed) / self.pv_production)
    }

    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn average_daily_pv_production(&self) -> Option<WattHours> {
        (self.n_days != 0).then(|| self.pv_production / self.n_days as f64)
    }
}

/// Consecutive runs of results falling into the same period.
#[derive(Clone)]
struct Chunks<'a, Tz: TimeZone> {
    results: &'a [DispatchResult],
    time_zone: Tz,
    granularity: Granularity,
}

impl<'a, Tz: TimeZone> Iterator for Chunks<'a, Tz> {
    type Item = (Period, &'a [DispatchResult]);

    fn next(&mut self) -> Option<Self::Item> {
        let period_of =
            |result: &DispatchResult| self.granularity.period_of(&result.interval.start_in(&self.time_zone));
        let period = period_of(self.results.first()?);
        let length = self
            .results
            .iter()
            .position(|result| period_of(result) != period)
            .unwrap_or(self.results.len());
        let (chunk, rest) = self.results.split_at(length);
        self.results = rest;
        Some((period, chunk))
    }
}

/// Pure reduction of the dispatch results into calendar summaries.
#[must_use]
pub struct ReportAggregator<'a, Tz: TimeZone> {
    results: &'a [DispatchResult],
    time_zone: Tz,
    battery_capacity: WattHours,
}

impl<'a, Tz: TimeZone> ReportAggregator<'a, Tz> {
    pub const fn new(
        results: &'a [DispatchResult],
        time_zone: Tz,
        battery_capacity: WattHours,
    ) -> Self {
        Self { results, time_zone, battery_capacity }
    }

    fn chunks(&self, granularity: Granularity) -> Chunks<'a, Tz> {
        Chunks { results: self.results, time_zone: self.time_zone.clone(), granularity }
    }

    fn summaries(
        &self,
        granularity: Granularity,
    ) -> impl Iterator<Item = (Period, Summary)> + Clone {
        self.chunks(granularity).map(move |(period, chunk)| {
            (period, Summary::over(chunk, &self.time_zone, self.battery_capacity))
        })
    }

    /// Lazily summarize each calendar month.
    pub fn monthly(&self) -> impl Iterator<Item = (Period, Summary)> + Clone {
        self.summaries(Granularity::Month)
    }

    /// Lazily summarize each calendar year.
    pub fn annual(&self) -> impl Iterator<Item = (Period, Summary)> + Clone {
        self.summaries(Granularity::Year)
    }

    /// Summarize the whole run.
    pub fn total(&self) -> Summary {
        Summary::over(self.results, &self.time_zone, self.battery_capacity)
    }

    /// Average PV power per local hour of day, for each month.
    pub fn hourly_profiles(&self) -> Vec<(Period, [Option<Watts>; 24])> {
        self.chunks(Granularity::Month)
            .map(|(period, chunk)| {
                let profile = chunk
                    .iter()
                    .map(|result| {
                        (
                            result.interval.start_in(&self.time_zone),
                            result.pv_production / result.interval.hours(),
                        )
                    })
                    .average_hourly();
                (period, profile)
            })
            .collect()
    }
}

impl<T> AverageHourly for T where T: ?Sized {}

pub trait AverageHourly {
    /// Average the values by the hour of their timestamps.
    fn average_hourly<K, V>(self) -> [Option<V>; 24]
    where
        Self: Sized + Iterator<Item = (K, V)>,
        K: Timelike,
        V: Copy + std::ops::Add<V, Output = V> + std::ops::Div<f64, Output = V>,
    {
        let mut sums: [Option<V>; 24] = [None; 24];
        let mut weights = [0_u32; 24];
        for (timestamp, value) in self {
            let hour = timestamp.hour() as usize;
            weights[hour] += 1;
            sums[hour] = Some(sums[hour].map_or(value, |sum| sum + value));
        }
        std::array::from_fn(|hour| sums[hour].map(|sum| sum / f64::from(weights[hour])))
    }
}

/// Monthly weather statistics.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct WeatherSummary {
    /// Global horizontal irradiation, kWh/m².
    pub irradiation: f64,

    pub mean_temperature: Celsius,
    pub min_temperature: Celsius,
    pub max_temperature: Celsius,
    pub n_samples: usize,
}

/// Summarize the ordered weather series per local calendar month.
pub fn weather_monthly<Tz: TimeZone>(
    samples: &[WeatherSample],
    resolution: TimeDelta,
    time_zone: &Tz,
) -> Vec<(Period, WeatherSummary)> {
    let intervals = Interval::chain(samples.iter().map(|sample| sample.timestamp), resolution);
    samples
        .iter()
        .zip(intervals)
        .chunk_by(|(sample, _)| Granularity::Month.period_of(&sample.timestamp.with_timezone(time_zone)))
        .into_iter()
        .filter_map(|(period, group)| {
            let group: Vec<_> = group.collect();
            let (min_temperature, max_temperature) =
                group.iter().map(|(sample, _)| sample.temperature).minmax().into_option()?;
            #[expect(clippy::cast_precision_loss)]
            let mean_temperature = group.iter().map(|(sample, _)| sample.temperature).sum::<Celsius>()
                / group.len() as f64;
            let irradiation = group
                .iter()
                .map(|(sample, interval)| sample.ghi.0 * interval.hours().0)
                .sum::<f64>()
                / 1000.0;
            Some((
                period,
                WeatherSummary {
                    irradiation,
                    mean_temperature,
                    min_temperature,
                    max_temperature,
                    n_samples: group.len(),
                },
            ))
        })
        .collect()
}
