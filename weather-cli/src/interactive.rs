//! Prompt loop: type a place, pick a suggestion, see its weather.

use std::time::Duration;

use anyhow::{Context, Result};
use inquire::{Confirm, Select, Text};
use weather_core::{Location, Place, SearchState};

use crate::{app::App, output};

pub async fn run(app: &mut App) -> Result<()> {
    let mut controller = app.controller();
    let mut updates = controller.subscribe();
    let min_len = controller.settings().min_query_len;
    let wait = controller.settings().debounce + app.config.timeout();

    loop {
        let Some(input) = prompt_text("Location (Esc to quit):").await? else {
            break;
        };

        if input.trim().is_empty() {
            controller.clear();
            break;
        }

        controller.set_query(input.clone());

        let mut places = if input.trim().chars().count() >= min_len {
            wait_for_suggestions(&mut updates, &input, wait).await.results
        } else {
            Vec::new()
        };

        // Nothing suggested: ask the API directly so the user sees why.
        if places.is_empty() {
            match controller.manual_search(&input).await {
                Ok(found) => places = found,
                Err(err) => {
                    eprintln!("{err}");
                    continue;
                }
            }
        }

        let saved = app.saved()?;
        let options: Vec<String> = places.iter().map(|p| output::place_line(p, &saved)).collect();
        let Some(index) = prompt_select("Pick a location:", options).await? else {
            continue;
        };
        let place = places[index].clone();

        match app.weather(Location::from(&place), None).await {
            Ok(report) => output::print_report(&report, app.unit()?),
            Err(err) => {
                eprintln!("{err:#}");
                continue;
            }
        }

        offer_toggle(app, &place, saved.contains(place.id())).await?;
        controller.clear();
    }

    Ok(())
}

async fn wait_for_suggestions(
    updates: &mut tokio::sync::watch::Receiver<SearchState>,
    query: &str,
    wait: Duration,
) -> SearchState {
    let settled = tokio::time::timeout(
        wait,
        updates.wait_for(|s| s.debounced_query == query && !s.loading),
    )
    .await;

    match settled {
        Ok(Ok(state)) => state.clone(),
        _ => {
            tracing::debug!(query, "no suggestions before timeout");
            SearchState::default()
        }
    }
}

async fn offer_toggle(app: &mut App, place: &Place, is_saved: bool) -> Result<()> {
    let question = if is_saved {
        format!("Remove {} from saved locations?", place.name())
    } else {
        format!("Save {}?", place.name())
    };

    if prompt_confirm(question).await? {
        let now_saved = app.toggle_saved(place)?;
        println!("{} {}", if now_saved { "Saved" } else { "Removed" }, place.display());
    }
    Ok(())
}

// inquire blocks the thread; keep it off the runtime so debounce timers keep ticking.

async fn prompt_text(message: &'static str) -> Result<Option<String>> {
    tokio::task::spawn_blocking(move || Text::new(message).prompt_skippable())
        .await
        .context("Prompt task failed")?
        .context("Failed to read input")
}

async fn prompt_select(message: &'static str, options: Vec<String>) -> Result<Option<usize>> {
    let picked = tokio::task::spawn_blocking(move || {
        match Select::new(message, options).raw_prompt() {
            Ok(option) => Ok(Some(option)),
            Err(inquire::InquireError::OperationCanceled) => Ok(None),
            Err(err) => Err(err),
        }
    })
    .await
    .context("Prompt task failed")?
    .context("Failed to read selection")?;
    Ok(picked.map(|o| o.index))
}

async fn prompt_confirm(message: String) -> Result<bool> {
    let answer = tokio::task::spawn_blocking(move || {
        Confirm::new(&message).with_default(false).prompt_skippable()
    })
    .await
    .context("Prompt task failed")?
    .context("Failed to read answer")?;
    Ok(answer.unwrap_or(false))
}
