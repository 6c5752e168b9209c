use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::WeatherError;

pub mod openweather;

pub use openweather::OpenWeatherSource;

/// Where a poll gets its raw response body from.
///
/// Implementations only do transport; parsing belongs to [`crate::parser`].
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch_current(&self) -> Result<String, WeatherError>;
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_body_is_kept() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn long_body_is_cut_on_char_boundary() {
        let body = "é".repeat(300);
        let cut = truncate_body(&body);

        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
    }
}
