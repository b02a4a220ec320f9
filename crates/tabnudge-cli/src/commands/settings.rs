use clap::{ArgAction, Subcommand};
use serde_json::json;
use tabnudge_core::popup::{describe_durations, save_settings, site_status};
use tabnudge_core::storage::settings::load_tab_durations;
use tabnudge_core::{Config, KvStore, LocalStore, Settings};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show stored settings and the last classified site
    Get,
    /// Turn testing mode on or off
    SetTesting {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },
    /// Set the suggestion frequency in minutes
    SetFrequency {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        minutes: u32,
    },
    /// Show accumulated foreground time per tab
    Durations {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every stored key
    Clear,
}

fn open_store() -> Result<LocalStore, Box<dyn std::error::Error>> {
    let path = Config::load_or_default().store_path()?;
    Ok(LocalStore::open(path)?)
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store()?;

    match action {
        SettingsAction::Get => {
            let settings = Settings::load(&store)?;
            let site = site_status(&store, None)?;
            super::print_json(&json!({ "settings": settings, "site": site }))?;
        }
        SettingsAction::SetTesting { enabled } => {
            let current = Settings::load(&store)?;
            let saved = save_settings(&store, current.suggestion_frequency_minutes, enabled)?;
            super::print_json(&saved)?;
        }
        SettingsAction::SetFrequency { minutes } => {
            let current = Settings::load(&store)?;
            let saved = save_settings(&store, minutes, current.in_testing_mode)?;
            super::print_json(&saved)?;
        }
        SettingsAction::Durations { json } => {
            let ledger = load_tab_durations(&store)?;
            if json {
                super::print_json(&ledger.to_value())?;
            } else if ledger.is_empty() {
                println!("No tab data yet");
            } else {
                for line in describe_durations(&ledger) {
                    println!("{line}");
                }
            }
        }
        SettingsAction::Clear => {
            store.clear()?;
            println!("settings cleared");
        }
    }
    Ok(())
}
