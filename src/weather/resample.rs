use chrono::{DateTime, TimeDelta, Utc};
use itertools::Itertools;

use crate::{
    quantity::{irradiance::WattsPerSquareMeter, speed::MetersPerSecond, temperature::Celsius},
    weather::WeatherSample,
};

impl WeatherSample {
    /// Linear interpolation between `self` and `other` at the timestamp in between.
    fn interpolate(&self, other: &Self, timestamp: DateTime<Utc>) -> Self {
        let weight = (timestamp - self.timestamp).as_seconds_f64()
            / (other.timestamp - self.timestamp).as_seconds_f64();
        Self {
            timestamp,
            ghi: self.ghi + (other.ghi - self.ghi) * weight,
            dni: self.dni + (other.dni - self.dni) * weight,
            dhi: self.dhi + (other.dhi - self.dhi) * weight,
            temperature: self.temperature + (other.temperature - self.temperature) * weight,
            wind_speed: self.wind_speed + (other.wind_speed - self.wind_speed) * weight,
        }
    }

    /// Average of the non-empty group, stamped with the given timestamp.
    fn mean(timestamp: DateTime<Utc>, samples: &[Self]) -> Self {
        #[expect(clippy::cast_precision_loss)]
        let n = samples.len() as f64;
        Self {
            timestamp,
            ghi: samples.iter().map(|sample| sample.ghi).sum::<WattsPerSquareMeter>() / n,
            dni: samples.iter().map(|sample| sample.dni).sum::<WattsPerSquareMeter>() / n,
            dhi: samples.iter().map(|sample| sample.dhi).sum::<WattsPerSquareMeter>() / n,
            temperature: samples.iter().map(|sample| sample.temperature).sum::<Celsius>() / n,
            wind_speed: samples.iter().map(|sample| sample.wind_speed).sum::<MetersPerSecond>()
                / n,
        }
    }
}

/// Split every gap of up to an hour between the ordered samples into `step`s.
///
/// A sample followed by a longer gap, as well as the last sample, is held for the rest of its hour
/// (but not beyond `until`), and the rest of the gap stays open.
pub fn interpolate(
    samples: &[WeatherSample],
    step: TimeDelta,
    until: DateTime<Utc>,
) -> Vec<WeatherSample> {
    let mut resampled = Vec::new();
    for (left, right) in samples.iter().tuple_windows() {
        if right.timestamp - left.timestamp > TimeDelta::hours(1) {
            hold(&mut resampled, left, step, until);
            continue;
        }
        let mut timestamp = left.timestamp;
        while timestamp < right.timestamp {
            resampled.push(left.interpolate(right, timestamp));
            timestamp += step;
        }
    }
    if let Some(last) = samples.last() {
        hold(&mut resampled, last, step, until);
    }
    resampled
}

fn hold(
    resampled: &mut Vec<WeatherSample>,
    sample: &WeatherSample,
    step: TimeDelta,
    until: DateTime<Utc>,
) {
    let until = until.min(sample.timestamp + TimeDelta::hours(1));
    let mut timestamp = sample.timestamp;
    while timestamp < until {
        resampled.push(WeatherSample { timestamp, ..*sample });
        timestamp += step;
    }
}

/// Average the ordered samples over the consecutive `step`s counted from the `origin`.
pub fn average(
    samples: &[WeatherSample],
    step: TimeDelta,
    origin: DateTime<Utc>,
) -> Vec<WeatherSample> {
    let step_seconds = step.num_seconds();
    samples
        .iter()
        .chunk_by(|sample| (sample.timestamp - origin).num_seconds().div_euclid(step_seconds))
        .into_iter()
        .map(|(index, group)| {
            let group: Vec<_> = group.copied().collect();
            WeatherSample::mean(origin + TimeDelta::seconds(index * step_seconds), &group)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    use super::*;
    use crate::weather::tests::sample;

    fn midnight() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn interpolate_half_hourly() {
        let samples = [sample(midnight(), 0.0), sample(midnight() + TimeDelta::hours(1), 100.0)];
        let resampled =
            interpolate(&samples, TimeDelta::minutes(30), midnight() + TimeDelta::days(1));
        let ghi: Vec<_> = resampled.iter().map(|sample| sample.ghi.0).collect();
        assert_eq!(ghi, [0.0, 50.0, 100.0, 100.0]);
        assert_eq!(resampled[1].timestamp, midnight() + TimeDelta::minutes(30));
        assert_eq!(resampled[3].timestamp, midnight() + TimeDelta::minutes(90));
    }

    #[test]
    fn interpolate_leaves_long_gaps_open() {
        let samples = [sample(midnight(), 100.0), sample(midnight() + TimeDelta::hours(5), 500.0)];
        let resampled =
            interpolate(&samples, TimeDelta::minutes(30), midnight() + TimeDelta::days(1));
        let timestamps: Vec<_> = resampled.iter().map(|sample| sample.timestamp).collect();
        assert_eq!(
            timestamps,
            [
                midnight(),
                midnight() + TimeDelta::minutes(30),
                midnight() + TimeDelta::hours(5),
                midnight() + TimeDelta::minutes(330),
            ],
        );
        let ghi: Vec<_> = resampled.iter().map(|sample| sample.ghi.0).collect();
        assert_eq!(ghi, [100.0, 100.0, 500.0, 500.0]);
    }

    #[test]
    fn interpolate_stops_at_period_end() {
        let samples = [sample(midnight(), 10.0)];
        let resampled =
            interpolate(&samples, TimeDelta::minutes(15), midnight() + TimeDelta::minutes(30));
        assert_eq!(resampled.len(), 2);
    }

    #[test]
    fn average_two_hourly() {
        let samples: Vec<_> = (0..5)
            .map(|hour| sample(midnight() + TimeDelta::hours(hour), 10.0 * hour as f64))
            .collect();
        let resampled = average(&samples, TimeDelta::hours(2), midnight());
        assert_eq!(resampled.len(), 3);
        assert_eq!(resampled[1].timestamp, midnight() + TimeDelta::hours(2));
        assert_abs_diff_eq!(resampled[0].ghi.0, 5.0);
        assert_abs_diff_eq!(resampled[1].ghi.0, 25.0);
        assert_abs_diff_eq!(resampled[2].ghi.0, 40.0);
        assert_abs_diff_eq!(resampled[2].temperature.0, 20.0);
    }
}
