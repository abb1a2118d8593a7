use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A geocoded place candidate.
///
/// Built once from a provider record and never mutated afterwards; the
/// fields are private so `id` and `display` always agree with the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    id: String,
    name: String,
    region: String,
    country: String,
    lat: f64,
    lon: f64,
    display: String,
}

impl Place {
    pub fn new(
        name: impl Into<String>,
        region: impl Into<String>,
        country: impl Into<String>,
        lat: f64,
        lon: f64,
    ) -> Self {
        let name = name.into();
        let region = region.into();
        let country = country.into();

        let display = if region.trim().is_empty() {
            format!("{name}, {country}")
        } else {
            format!("{name}, {region}, {country}")
        };

        Self { id: place_id(lat, lon), name, region, country, lat, lon, display }
    }

    /// Identifier derived from the coordinates. Two places at the same
    /// coordinates share an id.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// `"{name}, {region}, {country}"`, or `"{name}, {country}"` without a region.
    pub fn display(&self) -> &str {
        &self.display
    }
}

impl std::fmt::Display for Place {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display)
    }
}

/// Coordinates are fixed to four decimals so `"51.52"` and `51.5200001`
/// from the provider end up with the same id.
pub fn place_id(lat: f64, lon: f64) -> String {
    // Adding 0.0 turns -0.0 into 0.0, so tiny negatives don't print a sign.
    let fixed = |v: f64| (v * 1e4).round() / 1e4 + 0.0;
    format!("{:.4}-{:.4}", fixed(lat), fixed(lon))
}

/// Where to fetch weather for.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Coordinates { lat: f64, lon: f64 },
    /// Let the provider resolve the caller's position from its IP address.
    Auto,
}

impl Location {
    pub fn query_value(&self) -> String {
        match self {
            Location::Coordinates { lat, lon } => format!("{lat},{lon}"),
            Location::Auto => "auto:ip".to_string(),
        }
    }
}

impl From<&Place> for Location {
    fn from(place: &Place) -> Self {
        Location::Coordinates { lat: place.lat(), lon: place.lon() }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherRequest {
    pub location: Location,
    pub days: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub condition: String,
    pub humidity_pct: u8,
    pub wind_kph: f64,
    pub observation_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub max_c: f64,
    pub min_c: f64,
    pub condition: String,
    pub chance_of_rain_pct: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    pub provider: String,
    pub location_name: String,
    pub local_time: Option<String>,
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastDay>,
}
