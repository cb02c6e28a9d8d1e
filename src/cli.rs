mod battery;
mod load;
mod site;
mod system;
mod weather;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use self::system::TowerArgs;
use crate::{
    cli::{
        battery::BatteryArgs,
        load::LoadArgs,
        site::SiteArgs,
        system::SystemArgs,
        weather::WeatherSourceArgs,
    },
    prelude::*,
    simulation::Scenario,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: fetch the weather, simulate the tower, and print the reports.
    #[clap(name = "simulate")]
    Simulate(Box<SimulateArgs>),

    /// Fetch the weather only and print the monthly statistics.
    #[clap(name = "weather")]
    Weather(Box<WeatherArgs>),

    /// Print the tower geometry and capacity.
    #[clap(name = "tower")]
    Tower(TowerArgs),
}

#[must_use]
#[derive(Parser)]
pub struct SimulateArgs {
    #[clap(flatten)]
    pub site: SiteArgs,

    #[clap(flatten)]
    pub weather: WeatherSourceArgs,

    #[clap(flatten)]
    pub system: SystemArgs,

    #[clap(flatten)]
    pub battery: BatteryArgs,

    #[clap(flatten)]
    pub load: LoadArgs,

    /// Also print the average PV power per hour of day for each month.
    #[clap(long, env = "HOURLY_PROFILE")]
    pub hourly_profile: bool,

    /// Write the weather, PV power, load and dispatch series into this JSON file.
    #[clap(long, env = "OUTPUT")]
    pub output: Option<PathBuf>,
}

impl SimulateArgs {
    pub fn scenario(&self) -> Result<Scenario> {
        Ok(Scenario::builder()
            .weather(self.site.request()?)
            .system(self.system.build()?)
            .load(self.load.profile()?)
            .battery(self.battery.parameters()?)
            .initial_state_of_charge(self.battery.initial_state_of_charge)
            .maybe_grid_import_limit(self.battery.grid_import_limit)
            .time_zone(self.site.time_zone)
            .build())
    }
}

#[must_use]
#[derive(Parser)]
pub struct WeatherArgs {
    #[clap(flatten)]
    pub site: SiteArgs,

    #[clap(flatten)]
    pub weather: WeatherSourceArgs,
}
