use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::{config::PollerConfig, error::WeatherError};

use super::{WeatherSource, truncate_body};

/// Fetches `/data/2.5/weather` for a fixed location.
#[derive(Debug, Clone)]
pub struct OpenWeatherSource {
    api_key: String,
    base_url: String,
    latitude: f64,
    longitude: f64,
    http: Client,
}

impl OpenWeatherSource {
    /// Build a source from an already validated config.
    ///
    /// The HTTP client carries the configured fetch timeout.
    pub fn new(config: &PollerConfig) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(config.fetch_timeout())
            .build()
            .map_err(|e| WeatherError::TransportFailure(e.to_string()))?;

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            latitude: config.latitude,
            longitude: config.longitude,
            http,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/data/2.5/weather", self.base_url)
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherSource {
    #[instrument(skip(self), fields(lat = %self.latitude, lon = %self.longitude))]
    async fn fetch_current(&self) -> Result<String, WeatherError> {
        let url = self.endpoint();
        debug!(url = %url, "Fetching current weather");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", self.latitude.to_string()),
                ("lon", self.longitude.to_string()),
                ("APPID", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| {
                WeatherError::TransportFailure(format!(
                    "Failed to send request to OpenWeather: {}",
                    e.without_url()
                ))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            WeatherError::TransportFailure(format!(
                "Failed to read OpenWeather response body: {}",
                e.without_url()
            ))
        })?;

        if !status.is_success() {
            return Err(WeatherError::TransportFailure(format!(
                "OpenWeather request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        Ok(body)
    }
}
