use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Offset used for Kelvin <-> Celsius conversion.
const KELVIN_OFFSET: f64 = 273.0;
const MPS_TO_MPH: f64 = 2.2369;

/// Unit selector for temperature accessors. Stored values are always Kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TempUnit {
    #[default]
    Kelvin,
    Celsius,
    Fahrenheit,
}

impl TempUnit {
    pub fn from_kelvin(self, kelvin: f64) -> f64 {
        match self {
            TempUnit::Kelvin => kelvin,
            TempUnit::Celsius => kelvin - KELVIN_OFFSET,
            TempUnit::Fahrenheit => 1.8 * (kelvin - KELVIN_OFFSET) + 32.0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TempUnit::Kelvin => "K",
            TempUnit::Celsius => "°C",
            TempUnit::Fahrenheit => "°F",
        }
    }
}

/// Unit selector for wind speed. Stored values are always m/s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedUnit {
    #[default]
    Metric,
    Imperial,
}

impl SpeedUnit {
    pub fn from_mps(self, mps: f64) -> f64 {
        match self {
            SpeedUnit::Metric => mps,
            SpeedUnit::Imperial => mps * MPS_TO_MPH,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            SpeedUnit::Metric => "m/s",
            SpeedUnit::Imperial => "mph",
        }
    }
}

/// One parsed observation from the current-weather endpoint.
///
/// Instances are only produced by [`crate::parser::parse`] and never mutated;
/// a new poll replaces the whole snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherRecord {
    pub(crate) longitude: f64,
    pub(crate) latitude: f64,
    pub(crate) condition_id: String,
    pub(crate) category: String,
    pub(crate) description: String,
    pub(crate) temp_k: f64,
    pub(crate) pressure: f64,
    pub(crate) humidity: f64,
    pub(crate) temp_min_k: f64,
    pub(crate) temp_max_k: f64,
    pub(crate) sea_level_pressure: f64,
    pub(crate) ground_level_pressure: f64,
    pub(crate) visibility: f64,
    pub(crate) wind_speed_mps: f64,
    pub(crate) wind_deg: f64,
    pub(crate) clouds_pct: f64,
    pub(crate) rain_3h: f64,
    pub(crate) snow_3h: f64,
    pub(crate) observed_at: i64,
    pub(crate) sunrise: i64,
    pub(crate) sunset: i64,
    pub(crate) location_id: String,
    pub(crate) location_name: String,
}

impl WeatherRecord {
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Provider condition code, e.g. "500" for light rain.
    pub fn condition_id(&self) -> &str {
        &self.condition_id
    }

    /// Coarse group ("Rain", "Clear", ...). This is the change-detection key.
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Current temperature in Kelvin.
    pub fn temp(&self) -> f64 {
        self.temp_k
    }

    pub fn temp_in(&self, unit: TempUnit) -> f64 {
        unit.from_kelvin(self.temp_k)
    }

    pub fn temp_min(&self) -> f64 {
        self.temp_min_k
    }

    pub fn temp_min_in(&self, unit: TempUnit) -> f64 {
        unit.from_kelvin(self.temp_min_k)
    }

    pub fn temp_max(&self) -> f64 {
        self.temp_max_k
    }

    pub fn temp_max_in(&self, unit: TempUnit) -> f64 {
        unit.from_kelvin(self.temp_max_k)
    }

    /// Atmospheric pressure in hPa.
    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    pub fn sea_level_pressure(&self) -> f64 {
        self.sea_level_pressure
    }

    pub fn ground_level_pressure(&self) -> f64 {
        self.ground_level_pressure
    }

    /// Relative humidity in percent.
    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    /// Visibility in meters.
    pub fn visibility(&self) -> f64 {
        self.visibility
    }

    /// Wind speed in m/s.
    pub fn wind_speed(&self) -> f64 {
        self.wind_speed_mps
    }

    pub fn wind_speed_in(&self, unit: SpeedUnit) -> f64 {
        unit.from_mps(self.wind_speed_mps)
    }

    /// Meteorological wind direction in degrees.
    pub fn wind_deg(&self) -> f64 {
        self.wind_deg
    }

    pub fn clouds(&self) -> f64 {
        self.clouds_pct
    }

    pub fn rain_3h(&self) -> f64 {
        self.rain_3h
    }

    pub fn snow_3h(&self) -> f64 {
        self.snow_3h
    }

    /// Time of data calculation, Unix seconds UTC.
    pub fn observed_at(&self) -> i64 {
        self.observed_at
    }

    pub fn sunrise(&self) -> i64 {
        self.sunrise
    }

    pub fn sunset(&self) -> i64 {
        self.sunset
    }

    pub fn observed_at_utc(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.observed_at)
    }

    pub fn sunrise_utc(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.sunrise)
    }

    pub fn sunset_utc(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.sunset)
    }

    pub fn location_id(&self) -> &str {
        &self.location_id
    }

    pub fn location_name(&self) -> &str {
        &self.location_name
    }
}

/// Diagnostic dump, one `key: value` per line in a fixed order.
impl fmt::Display for WeatherRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "longitude: {}", self.longitude)?;
        writeln!(f, "latitude: {}", self.latitude)?;
        writeln!(f, "condition_id: {}", self.condition_id)?;
        writeln!(f, "category: {}", self.category)?;
        writeln!(f, "description: {}", self.description)?;
        writeln!(f, "temp_kelvin: {}", self.temp_k)?;
        writeln!(f, "pressure: {}", self.pressure)?;
        writeln!(f, "humidity: {}", self.humidity)?;
        writeln!(f, "temp_min_kelvin: {}", self.temp_min_k)?;
        writeln!(f, "temp_max_kelvin: {}", self.temp_max_k)?;
        writeln!(f, "sea_level_pressure: {}", self.sea_level_pressure)?;
        writeln!(f, "ground_level_pressure: {}", self.ground_level_pressure)?;
        writeln!(f, "visibility: {}", self.visibility)?;
        writeln!(f, "wind_speed_mps: {}", self.wind_speed_mps)?;
        writeln!(f, "wind_deg: {}", self.wind_deg)?;
        writeln!(f, "clouds: {}", self.clouds_pct)?;
        writeln!(f, "rain_3h: {}", self.rain_3h)?;
        writeln!(f, "snow_3h: {}", self.snow_3h)?;
        writeln!(f, "observed_at: {}", self.observed_at)?;
        writeln!(f, "sunrise: {}", self.sunrise)?;
        writeln!(f, "sunset: {}", self.sunset)?;
        writeln!(f, "location_id: {}", self.location_id)?;
        writeln!(f, "location_name: {}", self.location_name)
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}
