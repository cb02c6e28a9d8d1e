#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod cli;
mod core;
mod error;
mod fmt;
mod load;
mod prelude;
mod pv;
mod quantity;
mod report;
mod simulation;
mod solar;
mod tables;
mod weather;

use std::{
    fs::File,
    io::{BufWriter, Write},
};

use clap::{Parser, crate_version};

use crate::{
    cli::{Args, Command, SimulateArgs, WeatherArgs},
    prelude::*,
    report::weather_monthly,
    tables::{
        build_hourly_profile_table,
        build_summary_table,
        build_tower_table,
        build_weather_table,
    },
};

#[tokio::main]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    match Args::parse().command {
        Command::Simulate(args) => {
            simulate(&args).await?;
        }
        Command::Weather(args) => {
            fetch_weather(&args).await?;
        }
        Command::Tower(args) => {
            let tower = args.geometry();
            tower.validate()?;
            println!("{}", build_tower_table(&tower));
        }
    }

    info!("done!");
    Ok(())
}

#[instrument(skip_all)]
async fn simulate(args: &SimulateArgs) -> Result {
    let scenario = args.scenario()?;
    let source = args.weather.build()?;
    let outcome = scenario.run(&*source).await?;
    let report = outcome.report(&scenario);

    println!("{}", build_summary_table(report.monthly(), None));
    println!("{}", build_summary_table(report.annual(), Some(&report.total())));
    if args.hourly_profile {
        println!("{}", build_hourly_profile_table(&report.hourly_profiles()));
    }

    if let Some(path) = &args.output {
        let file = File::create(path)
            .with_context(|| format!("failed to create `{}`", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &outcome)
            .context("failed to write the simulation outcome")?;
        writer.flush()?;
        info!(path = %path.display(), n_steps = outcome.dispatch.len(), "exported");
    }
    Ok(())
}

#[instrument(skip_all)]
async fn fetch_weather(args: &WeatherArgs) -> Result {
    let request = args.site.request()?;
    let samples = args.weather.build()?.fetch(&request).await?;
    let summaries = weather_monthly(&samples, request.resolution, &args.site.time_zone);
    println!("{}", build_weather_table(&summaries));
    Ok(())
}
