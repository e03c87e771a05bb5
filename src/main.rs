use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::process::ExitCode;

use satpass::config::Config;
use satpass::predict::batch::{predict_catalog, PairReport};
use satpass::predict::{PassSequencer, TleLoader};

#[derive(Parser)]
#[command(name = "satpass")]
#[command(about = "Satellite pass prediction for ground observers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file and its TLE folder
    Validate {
        #[arg(short, long)]
        config: String,
    },
    /// Predict passes for every satellite over every active observer
    Predict {
        #[arg(short, long)]
        config: String,
        /// Window start (RFC3339), defaults to now
        #[arg(long, value_parser = parse_start)]
        start: Option<DateTime<Utc>>,
        /// Override every observer's window length
        #[arg(long)]
        hours: Option<u32>,
        /// Only predict this satellite
        #[arg(long)]
        norad: Option<u32>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => validate(&config),
        Commands::Predict {
            config,
            start,
            hours,
            norad,
            json,
        } => predict(&config, start, hours, norad, json),
    }
}

fn parse_start(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

fn load(path: &str) -> Result<(Config, TleLoader), String> {
    let config = Config::from_file(path).map_err(|e| format!("Error reading config: {}", e))?;
    let mut loader = TleLoader::new(config.tle_folder.clone());
    loader
        .load_all()
        .map_err(|e| format!("Error loading TLEs: {}", e))?;
    Ok((config, loader))
}

fn validate(path: &str) -> ExitCode {
    let (config, loader) = match load(path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let plans = match config.observer_plans() {
        Ok(plans) => plans,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut valid = true;
    for plan in &plans {
        if let Err(e) = plan.location.validate() {
            eprintln!("  {}: {}", plan.location.name, e);
            valid = false;
        }
    }

    println!(
        "Config is {} ({} satellites, {} active observers)",
        if valid { "valid" } else { "invalid" },
        loader.len(),
        plans.len()
    );
    for sat in loader.satellites() {
        println!("  {} {}", sat.norad_id, sat.display_name());
    }

    if valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn predict(
    path: &str,
    start: Option<DateTime<Utc>>,
    hours: Option<u32>,
    norad: Option<u32>,
    json: bool,
) -> ExitCode {
    let (config, loader) = match load(path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut plans = match config.observer_plans() {
        Ok(plans) => plans,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(hours) = hours {
        for plan in &mut plans {
            plan.window_hours = hours;
        }
    }

    let satellites: Vec<_> = match norad {
        Some(id) => match loader.get(id) {
            Some(sat) => vec![sat],
            None => {
                eprintln!("NORAD {} not found in {}", id, config.tle_folder.display());
                return ExitCode::FAILURE;
            }
        },
        None => loader.satellites().collect(),
    };

    let start = start.unwrap_or_else(Utc::now);
    let sequencer = PassSequencer::new(config.sequencer());
    let reports = predict_catalog(
        &sequencer,
        &config.propagator(),
        satellites,
        &plans,
        start,
    );

    if json {
        match serde_json::to_string_pretty(&reports) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error serializing passes: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_table(&reports, &config.time_format);
    }

    ExitCode::SUCCESS
}

fn print_table(reports: &[PairReport], time_format: &str) {
    for report in reports {
        println!(
            "NORAD {} over {}: {} passes ({}, {} skipped)",
            report.norad_id,
            report.observer,
            report.trajectories.len(),
            report.reason,
            report.skipped
        );
        for t in &report.trajectories {
            println!(
                "  rise {} az {:6.2}  max {} alt {:5.2}  set {} az {:6.2}",
                t.rise_time.format(time_format),
                t.rise_azimuth_deg,
                t.culmination_time.format(time_format),
                t.culmination_altitude_deg,
                t.set_time.format(time_format),
                t.set_azimuth_deg
            );
        }
    }
}
