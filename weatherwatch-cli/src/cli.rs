use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use inquire::{CustomType, Text};
use tracing::info;
use weatherwatch_core::{
    LogNotifier, PollerConfig, SpeedUnit, TempUnit, WeatherPoller, WeatherRecord,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherwatch", version, about = "Watch the weather and report when it changes")]
pub struct Cli {
    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

/// Per-invocation overrides applied on top of the saved config.
#[derive(Debug, Args)]
pub struct Overrides {
    /// OpenWeatherMap API key.
    #[arg(long, global = true, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Latitude of the observed location.
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude of the observed location.
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Refresh interval in minutes (minimum 10).
    #[arg(long, global = true)]
    pub refresh: Option<u32>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively edit and save the configuration.
    Configure,

    /// Fetch the current weather once and print it.
    Show {
        #[arg(long, value_enum, default_value_t = TempArg::Celsius)]
        temp_unit: TempArg,

        #[arg(long, value_enum, default_value_t = SpeedArg::Metric)]
        speed_unit: SpeedArg,

        /// Print the snapshot as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Poll until interrupted, logging every category change.
    Watch {
        /// Seconds to wait before printing the first snapshot.
        #[arg(long, default_value_t = 3)]
        probe_delay_secs: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TempArg {
    Kelvin,
    Celsius,
    Fahrenheit,
}

impl From<TempArg> for TempUnit {
    fn from(value: TempArg) -> Self {
        match value {
            TempArg::Kelvin => TempUnit::Kelvin,
            TempArg::Celsius => TempUnit::Celsius,
            TempArg::Fahrenheit => TempUnit::Fahrenheit,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SpeedArg {
    Metric,
    Imperial,
}

impl From<SpeedArg> for SpeedUnit {
    fn from(value: SpeedArg) -> Self {
        match value {
            SpeedArg::Metric => SpeedUnit::Metric,
            SpeedArg::Imperial => SpeedUnit::Imperial,
        }
    }
}

impl Overrides {
    fn apply(&self, mut config: PollerConfig) -> PollerConfig {
        if let Some(key) = &self.api_key {
            config.api_key = key.clone();
        }
        if let Some(lat) = self.lat {
            config.latitude = lat;
        }
        if let Some(lon) = self.lon {
            config.longitude = lon;
        }
        if let Some(refresh) = self.refresh {
            config.refresh_minutes = refresh;
        }
        config
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { temp_unit, speed_unit, json } => {
                let poller = build_poller(&self.overrides)?;
                poller.check_weather().await.context("Failed to fetch current weather")?;

                let record = poller
                    .current()
                    .context("No weather data available after a successful check")?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&*record)?);
                } else {
                    print_summary(&record, temp_unit.into(), speed_unit.into());
                }
                Ok(())
            }
            Command::Watch { probe_delay_secs } => {
                let poller = build_poller(&self.overrides)?;
                poller.subscribe(LogNotifier);

                let handle = poller.start();

                let probe = poller.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_secs(probe_delay_secs)).await;
                    match probe.current() {
                        Some(record) => println!("{record}"),
                        None => println!("No weather data available yet"),
                    }
                });

                tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
                info!("Interrupted, shutting down");
                handle.stop().await;
                Ok(())
            }
        }
    }
}

fn build_poller(overrides: &Overrides) -> anyhow::Result<WeatherPoller> {
    let config = overrides.apply(PollerConfig::load()?);
    WeatherPoller::from_config(config).context("Failed to set up weather poller")
}

fn configure() -> anyhow::Result<()> {
    let mut config = PollerConfig::load()?;
    let current_key = config.api_key.clone();

    config.api_key = Text::new("OpenWeatherMap API key:")
        .with_default(&current_key)
        .with_help_message("Leave empty to use the built-in development key")
        .prompt()?;

    config.refresh_minutes = CustomType::<u32>::new("Refresh interval (minutes):")
        .with_default(config.refresh_minutes)
        .with_error_message("Please enter a whole number of minutes")
        .prompt()?;

    config.latitude = CustomType::<f64>::new("Latitude:")
        .with_default(config.latitude)
        .prompt()?;

    config.longitude = CustomType::<f64>::new("Longitude:")
        .with_default(config.longitude)
        .prompt()?;

    config.save()?;
    println!("Saved configuration to {}", PollerConfig::config_file_path()?.display());
    Ok(())
}

fn print_summary(record: &WeatherRecord, temp: TempUnit, speed: SpeedUnit) {
    let name = if record.location_name().is_empty() {
        format!("{:.2}, {:.2}", record.latitude(), record.longitude())
    } else {
        record.location_name().to_string()
    };

    println!("{name}: {} ({})", record.category(), record.description());
    println!(
        "Temperature: {:.1}{sym} (min {:.1}{sym}, max {:.1}{sym})",
        record.temp_in(temp),
        record.temp_min_in(temp),
        record.temp_max_in(temp),
        sym = temp.symbol(),
    );
    println!("Humidity: {}%  Pressure: {} hPa", record.humidity(), record.pressure());
    println!(
        "Wind: {:.1} {} from {}°",
        record.wind_speed_in(speed),
        speed.symbol(),
        record.wind_deg()
    );
    if record.rain_3h() > 0.0 || record.snow_3h() > 0.0 {
        println!("Rain (3h): {} mm  Snow (3h): {} mm", record.rain_3h(), record.snow_3h());
    }

    let fmt_time = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    };
    println!(
        "Observed: {}  Sunrise: {}  Sunset: {}",
        fmt_time(record.observed_at_utc()),
        fmt_time(record.sunrise_utc()),
        fmt_time(record.sunset_utc()),
    );
}
