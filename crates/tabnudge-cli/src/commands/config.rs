use std::time::Duration;

use clap::Subcommand;
use tabnudge_core::{Config, LocalStore, Settings};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "timing.dismiss_ms", "api.user_id")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Show the delays a page will see, in the stored mode unless overridden
    Timing {
        /// Use testing-mode delays regardless of the stored setting
        #[arg(long)]
        testing: bool,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            super::print_json(&config)?;
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
        ConfigAction::Timing { testing } => {
            let config = Config::load()?;
            let store = LocalStore::open(config.store_path()?)?;
            let testing = testing || Settings::load(&store)?.in_testing_mode;
            for line in describe_timing(&config, testing) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn describe_timing(config: &Config, testing: bool) -> Vec<String> {
    let timing = &config.timing;
    let (min, max) = timing.next_range_ms(testing);
    vec![
        format!("mode: {}", if testing { "testing" } else { "normal" }),
        format!("first suggestion after: {:?}", timing.suggestion_delay(testing)),
        format!("banner dismissed after: {:?}", timing.dismiss_after(testing)),
        format!(
            "next suggestion within: {:?} to {:?}",
            Duration::from_millis(min),
            Duration::from_millis(max)
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_lines_follow_mode() {
        let config = Config::default();
        let normal = describe_timing(&config, false);
        assert_eq!(normal[0], "mode: normal");
        assert_eq!(normal[1], "first suggestion after: 120s");
        assert_eq!(normal[3], "next suggestion within: 300s to 600s");

        let testing = describe_timing(&config, true);
        assert_eq!(testing[0], "mode: testing");
        assert_eq!(testing[2], "banner dismissed after: 5s");
        assert_eq!(testing[3], "next suggestion within: 5s to 10s");
    }
}
