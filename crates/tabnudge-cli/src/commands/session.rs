use chrono::Utc;
use clap::Subcommand;
use tabnudge_core::integrations::{BrainrotTrigger, SessionApiClient};
use tabnudge_core::Config;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a session
    Start {
        /// Mark the session as locked-in
        #[arg(long)]
        locked_in: bool,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// End the current (or given) session
    End {
        #[arg(long)]
        session_id: Option<String>,
    },
    /// Toggle between locked-in and brain-rot
    Toggle {
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Ask the service to start eye tracking
    EyeTracking,
    /// Report a brain-rot trigger
    Brainrot {
        #[arg(long)]
        look_away_count: Option<u32>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum UrlAction {
    /// Record a visited URL
    Submit { url: String },
    /// Ask the service to categorize a URL
    Categorize { url: String },
}

#[derive(Debug, Clone, Copy)]
pub enum Query {
    History,
    Stats,
    LockedIn,
    Health,
}

fn client() -> Result<SessionApiClient, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    Ok(SessionApiClient::from_config(&config.api)?)
}

pub fn run(action: SessionAction, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let client = client()?;
    let response = super::block_on(async {
        match action {
            SessionAction::Start { locked_in, notes } => {
                client.start_session(locked_in, &notes).await
            }
            SessionAction::End { session_id } => client.end_session(session_id.as_deref()).await,
            SessionAction::Toggle { notes } => client.toggle_session(&notes).await,
            SessionAction::EyeTracking => client.start_eye_tracking().await,
            SessionAction::Brainrot {
                look_away_count,
                notes,
            } => {
                let trigger = BrainrotTrigger {
                    user_id: client.user_id().to_string(),
                    timestamp: Some(Utc::now()),
                    look_away_count,
                    notes,
                };
                client.trigger_brainrot(&trigger).await
            }
        }
    })?;
    super::report(response, json)
}

pub fn run_url(action: UrlAction, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let client = client()?;
    let response = super::block_on(async {
        match action {
            UrlAction::Submit { url } => client.submit_url(&url).await,
            UrlAction::Categorize { url } => client.categorize_url(&url).await,
        }
    })?;
    super::report(response, json)
}

pub fn run_query(query: Query, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let client = client()?;
    let response = super::block_on(async {
        match query {
            Query::History => client.history().await,
            Query::Stats => client.stats().await,
            Query::LockedIn => client.locked_in_sessions().await,
            Query::Health => client.health().await,
        }
    })?;
    super::report(response, json)
}
