use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::session::Query;

#[derive(Parser)]
#[command(name = "tabnudge", version, about = "TabNudge CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify URLs as productive, unproductive or neutral
    Classify {
        /// URLs to classify
        #[arg(required = true)]
        urls: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Stored settings shared with the running contexts
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Run a scripted browsing session against a simulated browser
    Simulate {
        /// Path to the TOML script
        script: std::path::PathBuf,
        /// Time acceleration factor
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },
    /// Locked-in / brain-rot sessions on the session service
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
        /// Print the raw service response as JSON
        #[arg(long, global = true)]
        json: bool,
    },
    /// Visited URL logging on the session service
    Url {
        #[command(subcommand)]
        action: commands::session::UrlAction,
        /// Print the raw service response as JSON
        #[arg(long, global = true)]
        json: bool,
    },
    /// Session history of the configured user
    History {
        /// Print the raw service response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Session statistics of the configured user
    Stats {
        /// Print the raw service response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Locked-in sessions of the configured user
    LockedIn {
        /// Print the raw service response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Session service health check
    Health {
        /// Print the raw service response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Focus tracker control
    Focus {
        #[command(subcommand)]
        action: commands::focus::FocusAction,
        /// Print the raw service response as JSON
        #[arg(long, global = true)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TABNUDGE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Classify { urls, json } => commands::classify::run(&urls, json),
        Commands::Config { action } => commands::config::run(action),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Simulate { script, speed } => commands::simulate::run(&script, speed),
        Commands::Session { action, json } => commands::session::run(action, json),
        Commands::Url { action, json } => commands::session::run_url(action, json),
        Commands::History { json } => commands::session::run_query(Query::History, json),
        Commands::Stats { json } => commands::session::run_query(Query::Stats, json),
        Commands::LockedIn { json } => commands::session::run_query(Query::LockedIn, json),
        Commands::Health { json } => commands::session::run_query(Query::Health, json),
        Commands::Focus { action, json } => commands::focus::run(action, json),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
