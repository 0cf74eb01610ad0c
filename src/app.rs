use std::sync::Arc;

use anyhow::{Context, Result};

use crate::client;
use crate::config;
use crate::prefs::{self, Preferences, PrefsPort};
use crate::storage;
use crate::ui;

pub fn run() -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    let config_path = config::default_path();
    let display_path = friendly_path(config_path.as_ref());

    let mut startup_notes: Vec<String> = Vec::new();

    // A broken state database degrades to defaults rather than blocking
    // startup; preferences just stop persisting for the session.
    let theme_dark = prefs::initial_dark_mode(None, &cfg.ui.theme);
    let (prefs_port, prefs): (Option<Arc<dyn PrefsPort>>, Preferences) =
        match storage::Store::open(storage::Options::default()) {
            Ok(store) => {
                let store: Arc<dyn PrefsPort> = Arc::new(store);
                let prefs = match Preferences::load(store.as_ref(), &cfg.ui.theme) {
                    Ok(prefs) => prefs,
                    Err(err) => {
                        startup_notes.push(format!("Using default preferences: {err}"));
                        Preferences {
                            dark_mode: theme_dark,
                            ..Preferences::default()
                        }
                    }
                };
                (Some(store), prefs)
            }
            Err(err) => {
                startup_notes.push(format!("Preferences will not persist: {err}"));
                (
                    None,
                    Preferences {
                        dark_mode: theme_dark,
                        ..Preferences::default()
                    },
                )
            }
        };

    let user_agent = if cfg.feed.user_agent.trim().is_empty() {
        format!("exz-tui/{}", crate::VERSION)
    } else {
        cfg.feed.user_agent.clone()
    };

    let client = match client::Client::new(client::ClientConfig {
        endpoint: cfg.feed.endpoint.clone(),
        user_agent,
        timeout: Some(cfg.feed.timeout),
        http_client: None,
    }) {
        Ok(client) => Some(Arc::new(client)),
        Err(err) => {
            startup_notes.push(format!("Feed client unavailable: {err}"));
            None
        }
    };

    let status_message = if startup_notes.is_empty() {
        "Press j/k to navigate, Enter to view a link, q to quit.".to_string()
    } else {
        startup_notes.join(" ")
    };

    let fetch_on_start = client.is_some();
    let options = ui::Options {
        status_message,
        client,
        prefs,
        prefs_port,
        config_path: display_path,
        fetch_on_start,
    };

    let mut model = ui::Model::new(options);
    model.run()
}

fn friendly_path(path: Option<&std::path::PathBuf>) -> String {
    if let Some(path) = path {
        if let Some(home) = dirs::home_dir() {
            if let Ok(stripped) = path.strip_prefix(&home) {
                let mut display = String::from("~");
                if !stripped.as_os_str().is_empty() {
                    display.push_str(&format!("/{}", stripped.display()));
                }
                return display;
            }
        }
        path.display().to_string()
    } else {
        "~/.config/exz-tui/config.yaml".to_string()
    }
}
