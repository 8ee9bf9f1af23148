//! `airview` - terminal front end
//!
//! One-shot air quality checks, forecasts, data source credits and backend
//! health, plus an interactive session that reads commands from stdin.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use airview::display::{
    format_accuracy, format_alert, format_attributions, format_forecast, render_state,
};
use airview::{
    AirQualityClient, AirViewConfig, Command, Coordinates, DataFetcher, LocationParser,
    LocationQuery, Phase, ViewController,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Command-line arguments for airview
#[derive(Parser, Debug)]
#[command(name = "airview")]
#[command(about = "Current air quality, nearby areas and forecasts")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to <config dir>/airview/config.toml)
    #[arg(short, long, global = true, env = "AIRVIEW_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging for airview
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the backend base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Look up current air quality once
    Check {
        /// City name
        #[arg(long, conflicts_with_all = ["lat", "lon", "locate"])]
        city: Option<String>,

        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Use the configured current position
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        locate: bool,
    },
    /// Predicted AQI for a position
    Forecast {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Horizon in hours (24 or 48)
        #[arg(long, default_value_t = 24)]
        hours: u32,
    },
    /// List the data sources behind the readings
    Sources {
        /// Print the citation text instead of the source list
        #[arg(long)]
        citation: bool,
    },
    /// Check that the backend is up
    Health,
    /// Read searches and commands from stdin
    Interactive,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config =
        AirViewConfig::load_from_path(args.config.clone()).context("Failed to load configuration")?;
    if let Some(base_url) = &args.base_url {
        config.api.base_url = base_url.trim_end_matches('/').to_string();
        config.validate()?;
    }

    airview::logging::init(&config.logging, args.verbose)
        .context("Failed to initialize logging")?;
    debug!(base_url = %config.api.base_url, "Configuration loaded");

    let client = AirQualityClient::new(&config.api)?;

    match args.command {
        Mode::Check {
            city,
            lat,
            lon,
            locate,
        } => {
            let command = match (city, lat.zip(lon), locate) {
                (Some(city), _, _) => Command::Search(city),
                (None, Some((lat, lon)), _) => Command::SearchCoordinates(lat, lon),
                (None, None, true) => Command::Locate,
                (None, None, false) => {
                    anyhow::bail!("Specify --city, --lat/--lon or --locate");
                }
            };
            run_check(client, &config, command).await
        }
        Mode::Forecast { lat, lon, hours } => {
            let coordinates = Coordinates::new(lat, lon)?;
            match client.forecast(coordinates, hours).await {
                Ok(forecast) => {
                    print!("{}", format_forecast(&forecast));
                    match client.accuracy().await {
                        Ok(accuracy) => print!("{}", format_accuracy(&accuracy)),
                        Err(e) => debug!("Model accuracy unavailable: {}", e),
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("Error: {}", e.user_message());
                    debug!("Forecast failed: {}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Mode::Sources { citation } => {
            let result = if citation {
                client.citation().await
            } else {
                client.attributions().await.map(|s| format_attributions(&s))
            };
            match result {
                Ok(text) => {
                    print!("{text}");
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("Error: {}", e.user_message());
                    debug!("Source lookup failed: {}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Mode::Health => match client.health().await {
            Ok(health) if health.is_healthy() => {
                println!("Backend at {} is {}", client.base_url(), health.status);
                Ok(ExitCode::SUCCESS)
            }
            Ok(health) => {
                println!("Backend at {} reports {}", client.base_url(), health.status);
                Ok(ExitCode::FAILURE)
            }
            Err(e) => {
                eprintln!("Error: {}", e.user_message());
                Ok(ExitCode::FAILURE)
            }
        },
        Mode::Interactive => run_interactive(client, &config).await,
    }
}

fn build_controller(client: AirQualityClient, config: &AirViewConfig) -> ViewController {
    let fetcher = DataFetcher::new(Arc::new(client), config.search.nearby_radius_km);
    ViewController::from_config(fetcher, config)
}

async fn run_check(
    client: AirQualityClient,
    config: &AirViewConfig,
    command: Command,
) -> Result<ExitCode> {
    let mut controller = build_controller(client, config);
    controller.handle_command(command);
    let alerts = controller.settle().await;

    let state = controller.state();
    print!("{}", render_state(state));
    for alert in &alerts {
        println!("{}", format_alert(alert));
    }

    Ok(if state.phase == Phase::Error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn run_interactive(client: AirQualityClient, config: &AirViewConfig) -> Result<ExitCode> {
    let controller = build_controller(client, config);
    let (tx, rx) = mpsc::channel(32);

    println!("Type a city to search. Commands: :refresh :locate :retry :dismiss :quit");

    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let Some(command) = parse_line(&line) else {
                continue;
            };
            let quit = command == Command::Quit;
            if tx.send(command).await.is_err() || quit {
                break;
            }
        }
        Ok::<_, std::io::Error>(())
    });

    let mut last_render = String::new();
    let final_state = controller
        .run(rx, |state, alert| {
            if let Some(alert) = alert {
                println!("{}", format_alert(alert));
            }
            let rendered = render_state(state);
            if rendered != last_render {
                print!("{rendered}");
                last_render = rendered;
            }
        })
        .await;

    reader
        .await
        .context("Input reader task failed")?
        .context("Failed to read from stdin")?;

    info!(phase = ?final_state.phase, "Interactive session ended");
    Ok(ExitCode::SUCCESS)
}

/// Map one input line to a command; blank lines are ignored
fn parse_line(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let command = match line {
        ":refresh" | ":r" => Command::Refresh,
        ":locate" | ":l" => Command::Locate,
        ":retry" => Command::Retry,
        ":dismiss" | ":d" => Command::Dismiss,
        ":quit" | ":q" => Command::Quit,
        _ => match line.strip_prefix(":search ") {
            Some(city) => Command::Search(city.to_string()),
            // A coordinate pair searches right away, anything else is typing
            None => match LocationParser::parse(line) {
                Ok(LocationQuery::Coordinates { coordinates, .. }) => {
                    Command::SearchCoordinates(coordinates.latitude, coordinates.longitude)
                }
                _ => Command::Input(line.to_string()),
            },
        },
    };
    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("  "), None);
        assert_eq!(parse_line(":refresh"), Some(Command::Refresh));
        assert_eq!(parse_line(":q"), Some(Command::Quit));
        assert_eq!(
            parse_line(":search Boston"),
            Some(Command::Search("Boston".to_string()))
        );
        assert_eq!(
            parse_line("New York"),
            Some(Command::Input("New York".to_string()))
        );
        assert_eq!(
            parse_line("34.05, -118.24"),
            Some(Command::SearchCoordinates(34.05, -118.24))
        );
    }

    #[test]
    fn test_args_parse_check_coordinates() {
        let args = Args::try_parse_from(["airview", "check", "--lat", "34.05", "--lon", "-118.24"])
            .unwrap();
        match args.command {
            Mode::Check { lat, lon, .. } => {
                assert_eq!(lat, Some(34.05));
                assert_eq!(lon, Some(-118.24));
            }
            other => panic!("unexpected mode {other:?}"),
        }
    }

    #[test]
    fn test_args_parse_sources_citation() {
        let args = Args::try_parse_from(["airview", "sources", "--citation"]).unwrap();
        assert!(matches!(args.command, Mode::Sources { citation: true }));
    }

    #[test]
    fn test_args_reject_city_with_coordinates() {
        let result = Args::try_parse_from([
            "airview", "check", "--city", "Boston", "--lat", "1", "--lon", "2",
        ]);
        assert!(result.is_err());
    }
}
