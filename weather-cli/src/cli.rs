use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use weather_core::{Config, FileStore, KeyValueStore, Location, SavedLocations, TemperatureUnit};

use crate::{app::App, interactive, output};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the WeatherAPI.com API key.
    Configure,

    /// Search for locations matching a query.
    Search {
        query: String,
    },

    /// Best-effort location suggestions; prints nothing when there are none.
    Suggest {
        query: String,
    },

    /// Show current weather and forecast.
    ///
    /// Without a query or --saved, the location is guessed from your IP address.
    Show {
        /// Address or location name; the best match is used.
        query: Option<String>,

        /// Use the N-th saved location (1-based) instead of searching.
        #[arg(long, conflicts_with = "query")]
        saved: Option<usize>,

        /// Number of forecast days (1-14).
        #[arg(long)]
        days: Option<u8>,
    },

    /// Manage saved locations.
    Saved {
        #[command(subcommand)]
        action: SavedCommand,
    },

    /// Show the temperature unit, or switch it with --toggle.
    Units {
        #[arg(long)]
        toggle: bool,
    },

    /// Search as you type, then pick a place to see its weather.
    Interactive,
}

#[derive(Debug, Subcommand)]
pub enum SavedCommand {
    /// List saved locations.
    List,

    /// Save the best match for a query, or remove it if already saved.
    Toggle {
        query: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Search { query } => {
                let app = App::load()?;
                let mut controller = app.controller();
                let places = controller.manual_search(&query).await?;
                output::print_places(&places, &app.saved()?);
                Ok(())
            }
            Command::Suggest { query } => {
                let app = App::load()?;
                let places = app.controller().suggest_now(&query).await;
                for place in &places {
                    println!("{}", place.display());
                }
                Ok(())
            }
            Command::Show { query, saved, days } => {
                let app = App::load()?;
                let location = match (query, saved) {
                    (Some(query), _) => Location::from(&app.best_match(&query).await?),
                    (None, Some(index)) => {
                        let saved = app.saved()?;
                        let place = index
                            .checked_sub(1)
                            .and_then(|i| saved.get(i))
                            .ok_or_else(|| {
                                anyhow!("No saved location #{index} ({} saved)", saved.len())
                            })?;
                        Location::from(place)
                    }
                    (None, None) => Location::Auto,
                };

                let report = app.weather(location, days).await?;
                output::print_report(&report, app.unit()?);
                Ok(())
            }
            Command::Saved { action } => match action {
                SavedCommand::List => {
                    // Listing is local only, no API key required.
                    let store = FileStore::open_default()?;
                    for line in saved_listing(&store)? {
                        println!("{line}");
                    }
                    Ok(())
                }
                SavedCommand::Toggle { query } => {
                    let mut app = App::load()?;
                    let place = app.best_match(&query).await?;
                    if app.toggle_saved(&place)? {
                        println!("Saved {}", place.display());
                    } else {
                        println!("Removed {}", place.display());
                    }
                    Ok(())
                }
            },
            Command::Units { toggle } => {
                // Unit preference doesn't need an API key.
                let mut store = FileStore::open_default()?;
                let mut unit = TemperatureUnit::load(&store)?;
                if toggle {
                    unit = unit.toggled();
                    unit.save(&mut store)?;
                }
                println!("Temperature unit: {unit} ({})", unit.symbol());
                Ok(())
            }
            Command::Interactive => {
                let mut app = App::load()?;
                interactive::run(&mut app).await
            }
        }
    }
}

fn saved_listing(store: &dyn KeyValueStore) -> anyhow::Result<Vec<String>> {
    let saved = SavedLocations::load(store)?;
    if saved.is_empty() {
        return Ok(vec![
            "No saved locations yet. Add one with `weather saved toggle <query>`.".to_string(),
        ]);
    }

    Ok(output::place_lines(saved.places(), &saved))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("WeatherAPI.com API key:")
        .without_confirmation()
        .with_help_message("Get a free key at https://www.weatherapi.com/")
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }

    config.set_api_key(api_key);
    config.save()?;

    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}
