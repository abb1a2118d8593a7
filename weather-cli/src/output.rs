use weather_core::{Place, SavedLocations, TemperatureUnit, WeatherReport};

pub fn place_line(place: &Place, saved: &SavedLocations) -> String {
    let marker = if saved.contains(place.id()) { "★" } else { " " };
    format!("{marker} {}  ({:.2}, {:.2})", place.display(), place.lat(), place.lon())
}

pub fn place_lines(places: &[Place], saved: &SavedLocations) -> Vec<String> {
    places
        .iter()
        .enumerate()
        .map(|(i, place)| format!("{:>2}. {}", i + 1, place_line(place, saved)))
        .collect()
}

pub fn print_places(places: &[Place], saved: &SavedLocations) {
    if places.is_empty() {
        println!("No locations found.");
        return;
    }

    for line in place_lines(places, saved) {
        println!("{line}");
    }
}

pub fn print_report(report: &WeatherReport, unit: TemperatureUnit) {
    let current = &report.current;

    println!("{}", report.location_name);
    if let Some(local_time) = &report.local_time {
        println!("Local time: {local_time}");
    }
    println!();
    println!(
        "  {}  {} (feels like {})",
        current.condition,
        unit.format(current.temperature_c),
        unit.format(current.feels_like_c),
    );
    println!("  Humidity {}%  Wind {:.0} km/h", current.humidity_pct, current.wind_kph);
    let age = chrono::Utc::now().signed_duration_since(current.observation_time);
    println!(
        "  Updated {} ({} min ago)",
        current.observation_time.format("%Y-%m-%d %H:%M UTC"),
        age.num_minutes().max(0),
    );

    if report.forecast.is_empty() {
        return;
    }

    println!();
    for day in &report.forecast {
        println!(
            "  {}  {:>5} / {:<5}  {:>3}% rain  {}",
            day.date.format("%a %d %b"),
            unit.format(day.max_c),
            unit.format(day.min_c),
            day.chance_of_rain_pct,
            day.condition,
        );
    }
}
