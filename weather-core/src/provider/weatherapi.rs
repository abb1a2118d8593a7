use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::{
    error::SearchError,
    geocode::{Geocoder, MIN_SEARCH_LEN},
    model::{CurrentConditions, ForecastDay, Place, WeatherReport, WeatherRequest},
};

use super::WeatherProvider;

/// The API serves at most this many forecast days.
const MAX_FORECAST_DAYS: u8 = 14;

/// Client for WeatherAPI.com: location search plus current/forecast weather.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: Url,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, crate::config::DEFAULT_BASE_URL, Duration::from_secs(10))
    }

    /// Point the client at another host, e.g. a mock server in tests.
    pub fn with_base_url(api_key: String, base_url: &str, timeout: Duration) -> Result<Self> {
        // One trailing slash so `join` appends to the path instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .with_context(|| format!("Invalid WeatherAPI base URL '{base_url}'"))?;

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("weather-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { api_key, base_url, http })
    }

    fn endpoint(&self, name: &str) -> Url {
        // `name` is a fixed relative path, joining cannot fail.
        self.base_url.join(name).unwrap_or_else(|_| self.base_url.clone())
    }

    async fn fetch_forecast(&self, request: &WeatherRequest) -> Result<WeatherReport> {
        let days = request.days.clamp(1, MAX_FORECAST_DAYS).to_string();
        let q = request.location.query_value();

        tracing::debug!(q = %q, days = %days, "fetching forecast");

        let res = self
            .http
            .get(self.endpoint("forecast.json"))
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", q.as_str()),
                ("days", days.as_str()),
                ("aqi", "no"),
                ("alerts", "no"),
            ])
            .send()
            .await
            .context("Failed to send request to WeatherAPI.com (forecast)")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read WeatherAPI forecast response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "WeatherAPI forecast request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: WaForecastResponse =
            serde_json::from_str(&body).context("Failed to parse WeatherAPI forecast JSON")?;

        let observation_time = parsed
            .current
            .last_updated_epoch
            .or(parsed.location.localtime_epoch)
            .and_then(unix_to_utc)
            .unwrap_or_else(Utc::now);

        let location_name = if parsed.location.region.trim().is_empty() {
            format!("{}, {}", parsed.location.name, parsed.location.country)
        } else {
            format!(
                "{}, {}, {}",
                parsed.location.name, parsed.location.region, parsed.location.country
            )
        };

        let forecast = parsed
            .forecast
            .map(|f| f.forecastday)
            .unwrap_or_default()
            .into_iter()
            .map(|d| ForecastDay {
                date: d.date,
                max_c: d.day.maxtemp_c,
                min_c: d.day.mintemp_c,
                condition: d.day.condition.text,
                chance_of_rain_pct: d.day.daily_chance_of_rain,
            })
            .collect();

        Ok(WeatherReport {
            provider: "weatherapi".to_string(),
            location_name,
            local_time: parsed.location.localtime,
            current: CurrentConditions {
                temperature_c: parsed.current.temp_c,
                feels_like_c: parsed.current.feelslike_c,
                condition: parsed.current.condition.text,
                humidity_pct: parsed.current.humidity,
                wind_kph: parsed.current.wind_kph,
                observation_time,
            },
            forecast,
        })
    }
}

#[async_trait]
impl Geocoder for WeatherApiProvider {
    async fn search(&self, text: &str) -> Result<Vec<Place>, SearchError> {
        let query = text.trim();
        if query.chars().count() < MIN_SEARCH_LEN {
            return Err(SearchError::InvalidInput(format!(
                "Search query must be at least {MIN_SEARCH_LEN} characters long"
            )));
        }

        tracing::debug!(query, "searching locations");

        let res = self
            .http
            .get(self.endpoint("search.json"))
            .query(&[("key", self.api_key.as_str()), ("q", query)])
            .send()
            .await?;

        match res.status() {
            StatusCode::UNAUTHORIZED => {
                return Err(SearchError::Api(
                    "Invalid API key. Please check your WeatherAPI credentials.".into(),
                ));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(SearchError::Api(
                    "API rate limit exceeded. Please try again later.".into(),
                ));
            }
            status if !status.is_success() => {
                return Err(SearchError::Api(format!(
                    "Location search failed with status {status}"
                )));
            }
            _ => {}
        }

        let body = res.text().await?;
        let places = parse_search_body(&body);

        if places.is_empty() {
            return Err(SearchError::NoResults(format!("No locations found for \"{text}\"")));
        }

        tracing::debug!(query, count = places.len(), "location search returned");
        Ok(places)
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherReport> {
        self.fetch_forecast(request).await
    }
}

/// Anything other than a JSON array of location records maps to no places.
/// Records that don't fit the expected shape are skipped.
fn parse_search_body(body: &str) -> Vec<Place> {
    let Ok(serde_json::Value::Array(items)) = serde_json::from_str::<serde_json::Value>(body)
    else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|v| serde_json::from_value::<WaSearchRecord>(v).ok())
        .filter_map(WaSearchRecord::into_place)
        .collect()
}

/// WeatherAPI sends coordinates as numbers, some proxies re-encode them as strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WaCoord {
    Number(f64),
    Text(String),
}

impl WaCoord {
    fn value(&self) -> Option<f64> {
        match self {
            WaCoord::Number(n) => Some(*n),
            WaCoord::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WaSearchRecord {
    name: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    country: Option<String>,
    lat: WaCoord,
    lon: WaCoord,
}

impl WaSearchRecord {
    fn into_place(self) -> Option<Place> {
        let lat = self.lat.value()?;
        let lon = self.lon.value()?;
        Some(Place::new(
            self.name,
            self.region.unwrap_or_default(),
            self.country.unwrap_or_default(),
            lat,
            lon,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    #[serde(default)]
    region: String,
    country: String,
    localtime: Option<String>,
    localtime_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    feelslike_c: f64,
    humidity: u8,
    wind_kph: f64,
    condition: WaCondition,
    last_updated_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    maxtemp_c: f64,
    mintemp_c: f64,
    #[serde(default)]
    daily_chance_of_rain: u8,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: WaLocation,
    current: WaCurrent,
    forecast: Option<WaForecast>,
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
