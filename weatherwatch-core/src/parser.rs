//! Current-weather response parsing.
//!
//! Maps the OpenWeatherMap `/data/2.5/weather` JSON body onto a
//! [`WeatherRecord`]. `coord`, a non-empty `weather` array and `main` are
//! required; every other block is optional and defaults to zero.

use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

use crate::{error::WeatherError, model::WeatherRecord};

#[derive(Debug, Deserialize)]
struct OwCoord {
    lon: f64,
    lat: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default, deserialize_with = "string_or_number")]
    id: String,
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    pressure: f64,
    humidity: f64,
    temp_min: f64,
    temp_max: f64,
    #[serde(default)]
    sea_level: f64,
    #[serde(default)]
    grnd_level: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    #[serde(default)]
    all: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwVolume {
    #[serde(rename = "3h", default)]
    three_hours: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default)]
    sunrise: i64,
    #[serde(default)]
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    coord: Option<OwCoord>,
    weather: Option<Vec<OwWeather>>,
    main: Option<OwMain>,
    #[serde(default)]
    visibility: f64,
    wind: Option<OwWind>,
    clouds: Option<OwClouds>,
    rain: Option<OwVolume>,
    snow: Option<OwVolume>,
    #[serde(default)]
    dt: i64,
    sys: Option<OwSys>,
    #[serde(default, deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    name: String,
}

/// Parse a raw current-weather body into a fresh [`WeatherRecord`].
///
/// Missing `rain`/`snow` blocks are not an error; they read as 0.
pub fn parse(raw: &str) -> Result<WeatherRecord, WeatherError> {
    let parsed: OwCurrentResponse = serde_json::from_str(raw)
        .map_err(|e| WeatherError::MalformedResponse(format!("invalid weather JSON: {e}")))?;

    let coord = parsed.coord.ok_or_else(|| missing("coord"))?;
    let condition = parsed
        .weather
        .and_then(|w| w.into_iter().next())
        .ok_or_else(|| missing("weather[0]"))?;
    let main = parsed.main.ok_or_else(|| missing("main"))?;

    let wind = parsed.wind.unwrap_or_default();
    let sys = parsed.sys.unwrap_or_default();

    Ok(WeatherRecord {
        longitude: coord.lon,
        latitude: coord.lat,
        condition_id: condition.id,
        category: condition.main,
        description: condition.description,
        temp_k: main.temp,
        pressure: main.pressure,
        humidity: main.humidity,
        temp_min_k: main.temp_min,
        temp_max_k: main.temp_max,
        sea_level_pressure: main.sea_level,
        ground_level_pressure: main.grnd_level,
        visibility: parsed.visibility,
        wind_speed_mps: wind.speed,
        wind_deg: wind.deg,
        clouds_pct: parsed.clouds.unwrap_or_default().all,
        rain_3h: parsed.rain.unwrap_or_default().three_hours,
        snow_3h: parsed.snow.unwrap_or_default().three_hours,
        observed_at: parsed.dt,
        sunrise: sys.sunrise,
        // Read from `sys`, where the API actually reports it.
        sunset: sys.sunset,
        location_id: parsed.id,
        location_name: parsed.name,
    })
}

fn missing(field: &str) -> WeatherError {
    WeatherError::MalformedResponse(format!("response is missing required `{field}`"))
}

/// Ids arrive as numbers from the API but are kept as opaque strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{SpeedUnit, TempUnit};

    pub(crate) fn sample_body(category: &str) -> String {
        serde_json::json!({
            "coord": { "lon": 139.01, "lat": 35.02 },
            "weather": [
                { "id": 500, "main": category, "description": "light rain", "icon": "10n" }
            ],
            "base": "stations",
            "main": {
                "temp": 285.514,
                "pressure": 1013.75,
                "humidity": 100,
                "temp_min": 284.0,
                "temp_max": 287.5,
                "sea_level": 1023.22,
                "grnd_level": 1013.75
            },
            "visibility": 10000,
            "wind": { "speed": 5.52, "deg": 311 },
            "clouds": { "all": 92 },
            "rain": { "3h": 0.2 },
            "dt": 1485792967,
            "sys": { "message": 0.0025, "country": "JP", "sunrise": 1485726240, "sunset": 1485763863 },
            "id": 1907296,
            "name": "Tawarano",
            "cod": 200
        })
        .to_string()
    }

    #[test]
    fn parses_full_response() {
        let r = parse(&sample_body("Rain")).expect("valid body");

        assert_eq!(r.longitude(), 139.01);
        assert_eq!(r.latitude(), 35.02);
        assert_eq!(r.condition_id(), "500");
        assert_eq!(r.category(), "Rain");
        assert_eq!(r.description(), "light rain");
        assert_eq!(r.temp(), 285.514);
        assert_eq!(r.pressure(), 1013.75);
        assert_eq!(r.humidity(), 100.0);
        assert_eq!(r.temp_min(), 284.0);
        assert_eq!(r.temp_max(), 287.5);
        assert_eq!(r.sea_level_pressure(), 1023.22);
        assert_eq!(r.ground_level_pressure(), 1013.75);
        assert_eq!(r.visibility(), 10000.0);
        assert_eq!(r.wind_speed(), 5.52);
        assert_eq!(r.wind_deg(), 311.0);
        assert_eq!(r.clouds(), 92.0);
        assert_eq!(r.rain_3h(), 0.2);
        assert_eq!(r.snow_3h(), 0.0);
        assert_eq!(r.observed_at(), 1485792967);
        assert_eq!(r.sunrise(), 1485726240);
        assert_eq!(r.sunset(), 1485763863);
        assert_eq!(r.location_id(), "1907296");
        assert_eq!(r.location_name(), "Tawarano");
    }

    #[test]
    fn temperature_accessors_follow_source_value() {
        let r = parse(&sample_body("Rain")).expect("valid body");
        let k = r.temp_in(TempUnit::Kelvin);

        assert_eq!(k, 285.514);
        assert_eq!(r.temp_in(TempUnit::Celsius), k - 273.0);
        assert_eq!(r.temp_in(TempUnit::Fahrenheit), 1.8 * (k - 273.0) + 32.0);
        assert!((r.wind_speed_in(SpeedUnit::Imperial) - 5.52 * 2.2369).abs() < 1e-9);
    }

    #[test]
    fn parsing_is_idempotent() {
        let body = sample_body("Clouds");
        assert_eq!(parse(&body).expect("first"), parse(&body).expect("second"));
    }

    #[test]
    fn missing_precipitation_defaults_to_zero() {
        let body = r#"{
            "coord": { "lon": 1.0, "lat": 2.0 },
            "weather": [{ "id": 800, "main": "Clear", "description": "clear sky" }],
            "main": { "temp": 280.0, "pressure": 1000, "humidity": 40, "temp_min": 279.0, "temp_max": 281.0 }
        }"#;

        let r = parse(body).expect("precipitation is optional");
        assert_eq!(r.rain_3h(), 0.0);
        assert_eq!(r.snow_3h(), 0.0);
        assert_eq!(r.sea_level_pressure(), 0.0);
        assert_eq!(r.location_name(), "");
    }

    #[test]
    fn null_precipitation_block_defaults_to_zero() {
        let body = r#"{
            "coord": { "lon": 1.0, "lat": 2.0 },
            "weather": [{ "id": "601", "main": "Snow" }],
            "main": { "temp": 270.0, "pressure": 1000, "humidity": 90, "temp_min": 269.0, "temp_max": 271.0 },
            "rain": null,
            "snow": { "3h": 4.5 }
        }"#;

        let r = parse(body).expect("null block is tolerated");
        assert_eq!(r.rain_3h(), 0.0);
        assert_eq!(r.snow_3h(), 4.5);
        assert_eq!(r.condition_id(), "601");
    }

    #[test]
    fn missing_main_block_is_malformed() {
        let body = r#"{
            "coord": { "lon": 1.0, "lat": 2.0 },
            "weather": [{ "id": 800, "main": "Clear" }]
        }"#;

        let err = parse(body).unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("main"));
    }

    #[test]
    fn missing_coord_is_malformed() {
        let body = r#"{
            "weather": [{ "id": 800, "main": "Clear" }],
            "main": { "temp": 280.0, "pressure": 1000, "humidity": 40, "temp_min": 279.0, "temp_max": 281.0 }
        }"#;

        assert!(parse(body).unwrap_err().to_string().contains("coord"));
    }

    #[test]
    fn empty_weather_array_is_malformed() {
        let body = r#"{
            "coord": { "lon": 1.0, "lat": 2.0 },
            "weather": [],
            "main": { "temp": 280.0, "pressure": 1000, "humidity": 40, "temp_min": 279.0, "temp_max": 281.0 }
        }"#;

        assert!(parse(body).unwrap_err().to_string().contains("weather[0]"));
    }

    #[test]
    fn missing_numeric_main_field_is_malformed() {
        let body = r#"{
            "coord": { "lon": 1.0, "lat": 2.0 },
            "weather": [{ "id": 800, "main": "Clear" }],
            "main": { "pressure": 1000, "humidity": 40, "temp_min": 279.0, "temp_max": 281.0 }
        }"#;

        assert!(parse(body).unwrap_err().is_malformed());
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(parse("<html>502 Bad Gateway</html>").unwrap_err().is_malformed());
        assert!(parse("").unwrap_err().is_malformed());
        assert!(parse("[1, 2, 3]").unwrap_err().is_malformed());
    }
}
