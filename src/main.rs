//! lwai-tui - a terminal chat client for the LW AI data agent
//!
//! Ask questions in plain language, browse the tables that come back and
//! export them as PDF or CSV.

mod action;
mod app;
mod component;
mod components;
mod config;
mod logging;
mod model;
mod services;
mod tui;

use crate::action::Action;
use crate::app::App;
use crate::component::Component;
use crate::config::Config;
use crate::services::api::ApiClient;
use crate::tui::{Tui, DEFAULT_TICK_RATE};
use anyhow::{Context, Result};
use crossterm::event::Event;

fn main() -> Result<()> {
    // Logging is optional; the UI still runs when the log dir is unavailable
    let _log_guard = Config::logs_dir().and_then(|dir| match logging::init_logging(&dir) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e}");
            None
        }
    });
    let config = Config::load_or_init();
    tracing::info!(api = %config.api_base_url, "starting");

    let client = ApiClient::new(&config.api_base_url, config.request_timeout())
        .context("Could not build the HTTP client")?;

    let mut tui = Tui::new()?.with_tick_rate(DEFAULT_TICK_RATE);
    tui.enter()?;

    let mut app = App::new(config, client);
    let result = app.init().and_then(|_| run_app(&mut tui, &mut app));

    tui.exit()?;

    if let Err(err) = result {
        tracing::error!(error = ?err, "fatal error");
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }

    tracing::info!("exiting");
    Ok(())
}

/// Draw, wait for input, dispatch; a Tick is sent whenever no input arrives
fn run_app(tui: &mut Tui, app: &mut App) -> Result<()> {
    while !app.should_quit {
        tui.draw(|frame| {
            if let Err(e) = app.draw(frame, frame.area()) {
                tracing::error!(error = %e, "draw failed");
            }
        })?;

        let action = match tui.next_event()? {
            Some(Event::Key(key)) => app.handle_key_event(key)?,
            Some(Event::Resize(w, h)) => Some(Action::Resize(w, h)),
            Some(_) => None,
            None => Some(Action::Tick),
        };

        // An update may return a follow-up action
        let mut current_action = action;
        while let Some(a) = current_action {
            if a != Action::Tick {
                tracing::trace!(action = %a, "update");
            }
            current_action = app.update(a)?;
        }
    }

    Ok(())
}
