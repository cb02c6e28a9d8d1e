use std::path::PathBuf;

use clap::Parser;

use crate::{load::LoadProfile, prelude::*, quantity::power::Watts};

#[must_use]
#[derive(Parser)]
pub struct LoadArgs {
    /// Constant household load.
    #[clap(long = "load-watts", env = "LOAD_WATTS", default_value = "1000")]
    pub power: Watts,

    /// TOML file with `hourly_load_watts`: 24 values starting at midnight. Overrides the constant load.
    #[clap(long = "load-profile", env = "LOAD_PROFILE")]
    pub profile: Option<PathBuf>,
}

impl LoadArgs {
    pub fn profile(&self) -> Result<LoadProfile> {
        match &self.profile {
            Some(path) => LoadProfile::read_from(path),
            None => Ok(LoadProfile::constant(self.power)?),
        }
    }
}
