use clap::Subcommand;
use tabnudge_core::integrations::FocusTrackerClient;
use tabnudge_core::Config;

#[derive(Subcommand)]
pub enum FocusAction {
    /// Start tracking
    Start {
        /// Stop automatically after this many seconds
        #[arg(long)]
        duration: Option<u64>,
    },
    /// Stop tracking
    Stop,
    /// Current tracker status
    Status,
    /// Look-away statistics
    Stats,
    /// Clear a tracker error state
    ResetError,
}

pub fn run(action: FocusAction, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let client = FocusTrackerClient::from_config(&config.api)?;
    let response = super::block_on(async {
        match action {
            FocusAction::Start { duration } => client.start(duration).await,
            FocusAction::Stop => client.stop().await,
            FocusAction::Status => client.status().await,
            FocusAction::Stats => client.stats().await,
            FocusAction::ResetError => client.reset_error().await,
        }
    })?;
    super::report(response, json)
}
