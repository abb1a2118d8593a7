use crate::{Config, WeatherReport, WeatherRequest, provider::weatherapi::WeatherApiProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod weatherapi;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(&self, request: &WeatherRequest) -> anyhow::Result<WeatherReport>;
}

/// Construct the WeatherAPI.com client from config.
///
/// The returned client serves both weather reports and location search.
pub fn provider_from_config(config: &Config) -> anyhow::Result<WeatherApiProvider> {
    let api_key = config.api_key()?;
    WeatherApiProvider::with_base_url(api_key, &config.base_url, config.timeout())
}
