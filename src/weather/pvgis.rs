//! [PVGIS](https://joint-research-centre.ec.europa.eu/photovoltaic-geographical-information-system-pvgis_en) client.

use std::{ops::RangeInclusive, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize, de, de::DeserializeOwned};
use serde_with::serde_as;

use crate::{
    error::SimulationError,
    prelude::*,
    quantity::{
        Zero,
        angle::Degrees,
        irradiance::WattsPerSquareMeter,
        speed::MetersPerSecond,
        temperature::Celsius,
    },
    solar::SOLAR_CONSTANT,
    weather::{WeatherRequest, WeatherSample, WeatherSource},
};

pub const DEFAULT_BASE_URL: &str = "https://re.jrc.ec.europa.eu/api/v5_2";

/// PVGIS dataset to query.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Dataset {
    /// Typical meteorological year, re-stamped onto the requested years.
    Tmy,

    /// Actual hourly irradiance of the requested years.
    Series,
}

pub struct Pvgis {
    client: Client,
    base_url: String,
    dataset: Dataset,
}

impl Pvgis {
    pub fn try_new(base_url: impl Into<String>, dataset: Dataset) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("failed to build the HTTP client")?;
        Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_owned(), dataset })
    }

    async fn get<Q: Serialize + Sync, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &Q,
    ) -> Result<R> {
        let url = format!("{}/{endpoint}?{}", self.base_url, serde_qs::to_string(query)?);
        debug!(url, "requesting…");
        let response = self.client.get(&url).send().await.context("failed to call PVGIS")?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map_or_else(|_| status.to_string(), |response| response.message);
            return Err(SimulationError::upstream_data_unavailable(format!(
                "PVGIS responded with {status}: {message}"
            ))
            .into());
        }
        response.json::<R>().await.context("failed to deserialize the PVGIS response")
    }
}

#[async_trait]
impl WeatherSource for Pvgis {
    fn id(&self) -> String {
        format!("pvgis-{:?}@{}", self.dataset, self.base_url)
    }

    #[instrument(skip_all, fields(dataset = ?self.dataset))]
    async fn fetch_raw(&self, request: &WeatherRequest) -> Result<Vec<WeatherSample>> {
        let latitude = request.location.latitude;
        let longitude = request.location.longitude;
        match self.dataset {
            Dataset::Tmy => {
                let query = TmyQuery { latitude, longitude, output_format: "json" };
                let response: TmyResponse = self.get("tmy", &query).await?;
                Ok(response.restamp(request.years()))
            }
            Dataset::Series => {
                let query = SeriesQuery {
                    latitude,
                    longitude,
                    start_year: *request.years().start(),
                    end_year: *request.years().end(),
                    angle: 0.0,
                    components: 1,
                    output_format: "json",
                };
                let response: SeriesResponse = self.get("seriescalc", &query).await?;
                Ok(response.into_samples())
            }
        }
    }
}

#[derive(Serialize)]
struct TmyQuery {
    #[serde(rename = "lat")]
    latitude: f64,

    #[serde(rename = "lon")]
    longitude: f64,

    #[serde(rename = "outputformat")]
    output_format: &'static str,
}

#[derive(Serialize)]
struct SeriesQuery {
    #[serde(rename = "lat")]
    latitude: f64,

    #[serde(rename = "lon")]
    longitude: f64,

    #[serde(rename = "startyear")]
    start_year: i32,

    #[serde(rename = "endyear")]
    end_year: i32,

    /// Horizontal plane.
    angle: f64,

    /// Split the irradiance into the beam, diffuse and reflected components.
    components: u8,

    #[serde(rename = "outputformat")]
    output_format: &'static str,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Deserialize)]
struct TmyResponse {
    outputs: TmyOutputs,
}

/// Malformed records are skipped, an empty result surfaces later as missing data.
#[serde_as]
#[derive(Deserialize)]
struct TmyOutputs {
    #[serde_as(as = "serde_with::VecSkipError<_>")]
    tmy_hourly: Vec<TmyRecord>,
}

#[derive(Deserialize)]
struct TmyRecord {
    #[serde(rename = "time(UTC)", deserialize_with = "deserialize_timestamp")]
    timestamp: NaiveDateTime,

    #[serde(rename = "T2m")]
    temperature: Celsius,

    #[serde(rename = "G(h)")]
    ghi: WattsPerSquareMeter,

    #[serde(rename = "Gb(n)")]
    dni: WattsPerSquareMeter,

    #[serde(rename = "Gd(h)")]
    dhi: WattsPerSquareMeter,

    #[serde(rename = "WS10m")]
    wind_speed: MetersPerSecond,
}

impl TmyRecord {
    const fn sample_at(&self, timestamp: DateTime<Utc>) -> WeatherSample {
        WeatherSample {
            timestamp,
            ghi: self.ghi,
            dni: self.dni,
            dhi: self.dhi,
            temperature: self.temperature,
            wind_speed: self.wind_speed,
        }
    }
}

impl TmyResponse {
    /// Move the typical year onto each of the years.
    ///
    /// The typical year has no February 29, leap years repeat February 28 instead.
    fn restamp(&self, years: RangeInclusive<i32>) -> Vec<WeatherSample> {
        let records = &self.outputs.tmy_hourly;
        years
            .flat_map(move |year| {
                records.iter().flat_map(move |record| {
                    let (month, day, time) =
                        (record.timestamp.month(), record.timestamp.day(), record.timestamp.time());
                    let restamped = NaiveDate::from_ymd_opt(year, month, day);
                    let leap_day = if (month, day) == (2, 28) {
                        NaiveDate::from_ymd_opt(year, 2, 29)
                    } else {
                        None
                    };
                    [restamped, leap_day]
                        .into_iter()
                        .flatten()
                        .map(move |date| record.sample_at(date.and_time(time).and_utc()))
                })
            })
            .collect()
    }
}

#[derive(Deserialize)]
struct SeriesResponse {
    outputs: SeriesOutputs,
}

#[serde_as]
#[derive(Deserialize)]
struct SeriesOutputs {
    #[serde_as(as = "serde_with::VecSkipError<_>")]
    hourly: Vec<SeriesRecord>,
}

#[derive(Deserialize)]
struct SeriesRecord {
    #[serde(rename = "time", deserialize_with = "deserialize_timestamp")]
    timestamp: NaiveDateTime,

    /// Beam irradiance on the horizontal plane.
    #[serde(rename = "Gb(i)")]
    beam: WattsPerSquareMeter,

    /// Diffuse irradiance on the horizontal plane.
    #[serde(rename = "Gd(i)")]
    diffuse: WattsPerSquareMeter,

    /// Sun height.
    #[serde(rename = "H_sun")]
    sun_height: Degrees,

    #[serde(rename = "T2m")]
    temperature: Celsius,

    #[serde(rename = "WS10m")]
    wind_speed: MetersPerSecond,
}

impl SeriesResponse {
    fn into_samples(self) -> Vec<WeatherSample> {
        self.outputs
            .hourly
            .into_iter()
            .map(|record| {
                let dni = if record.sun_height > Degrees(0.0) {
                    (record.beam / record.sun_height.sin()).min(SOLAR_CONSTANT)
                } else {
                    WattsPerSquareMeter::ZERO
                };
                WeatherSample {
                    timestamp: record.timestamp.and_utc(),
                    ghi: record.beam + record.diffuse,
                    dni,
                    dhi: record.diffuse,
                    temperature: record.temperature,
                    wind_speed: record.wind_speed,
                }
            })
            .collect()
    }
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let string = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(&string, "%Y%m%d:%H%M")
        .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(&string), &"`YYYYMMDD:HHMM`"))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{NaiveDate, TimeDelta, TimeZone};

    use super::*;
    use crate::solar::Location;

    const TMY: &str = r#"{
        "inputs": {"location": {"latitude": 45.0, "longitude": 7.5, "elevation": 250.0}},
        "outputs": {
            "months_selected": [{"month": 1, "year": 2012}, {"month": 2, "year": 2009}],
            "tmy_hourly": [
                {"time(UTC)": "20120101:0000", "T2m": -1.5, "RH": 90.0, "G(h)": 0.0, "Gb(n)": 0.0, "Gd(h)": 0.0, "IR(h)": 250.0, "WS10m": 1.2, "WD10m": 200.0, "SP": 98000.0},
                {"time(UTC)": "20120101:1200", "T2m": 4.0, "RH": 60.0, "G(h)": 310.0, "Gb(n)": 520.0, "Gd(h)": 95.0, "IR(h)": 260.0, "WS10m": 2.5, "WD10m": 180.0, "SP": 98100.0},
                {"time(UTC)": "20090228:1200", "T2m": 6.0, "RH": 55.0, "G(h)": 400.0, "Gb(n)": 600.0, "Gd(h)": 110.0, "IR(h)": 270.0, "WS10m": 3.0, "WD10m": 170.0, "SP": 98200.0}
            ]
        },
        "meta": {}
    }"#;

    const SERIES: &str = r#"{
        "inputs": {},
        "outputs": {
            "hourly": [
                {"time": "20200601:0010", "Gb(i)": 0.0, "Gd(i)": 0.0, "Gr(i)": 0.0, "H_sun": -10.0, "T2m": 14.2, "WS10m": 0.8, "Int": 0.0},
                {"time": "20200601:1110", "Gb(i)": 600.0, "Gd(i)": 150.0, "Gr(i)": 0.0, "H_sun": 30.0, "T2m": 24.9, "WS10m": 2.1, "Int": 0.0}
            ]
        },
        "meta": {}
    }"#;

    #[test]
    fn parse_tmy_ok() -> Result {
        let response: TmyResponse = serde_json::from_str(TMY)?;
        let samples = response.restamp(2023..=2024);

        // Two years times three records, plus the leap day in 2024:
        assert_eq!(samples.len(), 7);

        let noon = &samples[1];
        assert_eq!(noon.timestamp, Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap());
        assert_eq!(noon.ghi, WattsPerSquareMeter(310.0));
        assert_eq!(noon.dni, WattsPerSquareMeter(520.0));
        assert_eq!(noon.dhi, WattsPerSquareMeter(95.0));
        assert_eq!(noon.temperature, Celsius(4.0));
        assert_eq!(noon.wind_speed, MetersPerSecond(2.5));

        let leap_day = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        let filled = samples.iter().find(|sample| sample.timestamp == leap_day).unwrap();
        assert_eq!(filled.ghi, WattsPerSquareMeter(400.0));
        assert!(
            !samples
                .iter()
                .any(|sample| sample.timestamp == Utc.with_ymd_and_hms(2023, 3, 1, 12, 0, 0).unwrap())
        );
        Ok(())
    }

    #[test]
    fn parse_series_ok() -> Result {
        let response: SeriesResponse = serde_json::from_str(SERIES)?;
        let samples = response.into_samples();
        assert_eq!(samples.len(), 2);

        assert_eq!(samples[0].dni, WattsPerSquareMeter::ZERO);
        assert_eq!(
            samples[0].timestamp,
            Utc.with_ymd_and_hms(2020, 6, 1, 0, 10, 0).unwrap(),
        );

        assert_abs_diff_eq!(samples[1].ghi.0, 750.0);
        assert_abs_diff_eq!(samples[1].dhi.0, 150.0);
        assert_abs_diff_eq!(samples[1].dni.0, 1200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(samples[1].temperature.0, 24.9);
        Ok(())
    }

    #[test]
    fn skips_malformed_records() -> Result {
        let json = r#"{"outputs": {"hourly": [
            {"time": "2020-06-01 00:10", "Gb(i)": 0.0, "Gd(i)": 0.0, "H_sun": 0.0, "T2m": 0.0, "WS10m": 0.0},
            {"time": "20200601:0110", "Gb(i)": 0.0, "Gd(i)": 0.0, "H_sun": 0.0, "T2m": 0.0},
            {"time": "20200601:0210", "Gb(i)": 0.0, "Gd(i)": 5.0, "H_sun": 1.0, "T2m": 9.0, "WS10m": 1.0}
        ]}}"#;
        let samples = serde_json::from_str::<SeriesResponse>(json)?.into_samples();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].dhi, WattsPerSquareMeter(5.0));
        Ok(())
    }

    #[test]
    fn rejects_missing_outputs() {
        assert!(serde_json::from_str::<TmyResponse>(r#"{"message": "oops"}"#).is_err());
    }

    #[test]
    fn query_string_ok() -> Result {
        let query = SeriesQuery {
            latitude: 45.0,
            longitude: 7.5,
            start_year: 2020,
            end_year: 2021,
            angle: 0.0,
            components: 1,
            output_format: "json",
        };
        let query = serde_qs::to_string(&query)?;
        assert!(query.starts_with("lat=45"), "{query}");
        assert!(query.contains("&lon=7.5&startyear=2020&endyear=2021&angle=0"), "{query}");
        assert!(query.ends_with("&components=1&outputformat=json"), "{query}");
        Ok(())
    }

    #[tokio::test]
    #[ignore = "online test"]
    async fn fetch_tmy_ok() -> Result {
        let request = WeatherRequest::builder()
            .location(Location { latitude: 40.0, longitude: -80.0, elevation: 0.0 })
            .start(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
            .end(NaiveDate::from_ymd_opt(2024, 6, 2).unwrap())
            .build()?;
        let samples = Pvgis::try_new(DEFAULT_BASE_URL, Dataset::Tmy)?.fetch(&request).await?;
        assert_eq!(samples.len(), 48);
        assert_eq!(samples[1].timestamp - samples[0].timestamp, TimeDelta::hours(1));
        Ok(())
    }

    #[tokio::test]
    #[ignore = "online test"]
    async fn fetch_in_the_ocean_fails() -> Result {
        let request = WeatherRequest::builder()
            .location(Location { latitude: 0.0, longitude: -30.0, elevation: 0.0 })
            .start(NaiveDate::from_ymd_opt(2020, 6, 1).unwrap())
            .end(NaiveDate::from_ymd_opt(2020, 6, 1).unwrap())
            .build()?;
        let error =
            Pvgis::try_new(DEFAULT_BASE_URL, Dataset::Series)?.fetch(&request).await.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SimulationError>(),
            Some(SimulationError::UpstreamDataUnavailable(_)),
        ));
        Ok(())
    }
}
