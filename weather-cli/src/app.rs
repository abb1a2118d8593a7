use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use weather_core::{
    Config, FileStore, Geocoder, Location, Place, SavedLocations, SearchController,
    TemperatureUnit, WeatherApiProvider, WeatherProvider, WeatherReport, WeatherRequest,
    provider_from_config,
};

/// Everything a command needs: config, the API client and the local store.
pub struct App {
    pub config: Config,
    pub provider: Arc<WeatherApiProvider>,
    pub store: FileStore,
}

impl App {
    pub fn load() -> Result<Self> {
        let config = Config::load()?;
        let provider = Arc::new(provider_from_config(&config)?);
        let store = FileStore::open_default().context("Failed to open local store")?;
        Ok(Self { config, provider, store })
    }

    pub fn controller(&self) -> SearchController {
        let geocoder: Arc<dyn Geocoder> = self.provider.clone();
        SearchController::new(geocoder, self.config.search_settings())
    }

    pub fn saved(&self) -> Result<SavedLocations> {
        SavedLocations::load(&self.store)
    }

    pub fn unit(&self) -> Result<TemperatureUnit> {
        TemperatureUnit::load(&self.store)
    }

    /// Manual search that keeps only the best match.
    pub async fn best_match(&self, query: &str) -> Result<Place> {
        let mut controller = self.controller();
        let places = controller.manual_search(query).await?;
        places
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No locations found for \"{query}\""))
    }

    pub async fn weather(&self, location: Location, days: Option<u8>) -> Result<WeatherReport> {
        let request = WeatherRequest {
            location,
            days: days.unwrap_or(self.config.forecast_days),
        };
        self.provider.get_weather(&request).await
    }

    /// Flip `place` in the saved list and persist it. Returns whether it is saved now.
    pub fn toggle_saved(&mut self, place: &Place) -> Result<bool> {
        let mut saved = self.saved()?;
        let now_saved = saved.toggle(place);
        saved.save(&mut self.store)?;
        Ok(now_saved)
    }
}
