use anyhow::Result;

use crate::storage::{KeyValueStore, USE_CELSIUS_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Stored as a boolean "use Celsius" flag. Missing or unreadable means Celsius.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self> {
        let use_celsius = store
            .get(USE_CELSIUS_KEY)?
            .and_then(|raw| serde_json::from_str::<bool>(&raw).ok())
            .unwrap_or(true);

        Ok(if use_celsius { Self::Celsius } else { Self::Fahrenheit })
    }

    pub fn save(self, store: &mut dyn KeyValueStore) -> Result<()> {
        store.set(USE_CELSIUS_KEY, (self == Self::Celsius).to_string())
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }

    pub fn convert(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    /// Rounded temperature with its unit symbol, e.g. `"21°C"`.
    pub fn format(self, celsius: f64) -> String {
        format!("{:.0}{}", self.convert(celsius), self.symbol())
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Celsius => f.write_str("Celsius"),
            Self::Fahrenheit => f.write_str("Fahrenheit"),
        }
    }
}
