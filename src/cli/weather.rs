//! Weather source selection.

use std::path::PathBuf;

use clap::Parser;

use crate::{
    prelude::*,
    weather::{
        WeatherSource,
        cache::CachedSource,
        clear_sky::ClearSky,
        pvgis::{self, Dataset, Pvgis},
    },
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum WeatherKind {
    /// PVGIS typical meteorological year.
    PvgisTmy,

    /// PVGIS hourly series of the actual years.
    PvgisSeries,

    /// Cloudless sky, no network access.
    ClearSky,
}

#[must_use]
#[derive(Parser)]
pub struct WeatherSourceArgs {
    #[clap(long = "weather", env = "WEATHER", default_value = "pvgis-tmy")]
    pub kind: WeatherKind,

    #[clap(long, env = "PVGIS_BASE_URL", default_value = pvgis::DEFAULT_BASE_URL)]
    pub pvgis_base_url: String,

    /// Keep the fetched weather in this directory and reuse it on the next runs.
    #[clap(long, env = "WEATHER_CACHE_DIR")]
    pub weather_cache_dir: Option<PathBuf>,

    /// Atmospheric turbidity of the clear-sky model.
    #[clap(long, env = "LINKE_TURBIDITY", default_value = "3")]
    pub linke_turbidity: f64,
}

impl WeatherSourceArgs {
    pub fn build(&self) -> Result<Box<dyn WeatherSource>> {
        let source: Box<dyn WeatherSource> = match self.kind {
            WeatherKind::PvgisTmy => Box::new(Pvgis::try_new(&self.pvgis_base_url, Dataset::Tmy)?),
            WeatherKind::PvgisSeries => {
                Box::new(Pvgis::try_new(&self.pvgis_base_url, Dataset::Series)?)
            }
            WeatherKind::ClearSky => {
                ensure!(
                    self.linke_turbidity.is_finite() && self.linke_turbidity >= 1.0,
                    "Linke turbidity must be at least 1, got {}",
                    self.linke_turbidity,
                );
                Box::new(ClearSky::builder().linke_turbidity(self.linke_turbidity).build())
            }
        };
        Ok(match &self.weather_cache_dir {
            Some(directory) => Box::new(CachedSource::new(source, directory)),
            None => source,
        })
    }
}
