use std::sync::Arc;

use serenity::all::GatewayIntents;
use serenity::Client;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use ratekeeper::bot::events::TrackerEventAdapter;
use ratekeeper::bot::Handler;
use ratekeeper::config::Config;
use ratekeeper::error::AppError;
use ratekeeper::store::JsonStore;
use ratekeeper::tracker::{PollingTracker, Tracker};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Arc::new(Config::from_env()?);
    let store = Arc::new(JsonStore::open(&config.data_file)?);

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let tracker: Arc<dyn Tracker> =
        Arc::new(PollingTracker::new(store.clone(), config.clone(), events_tx));

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::MESSAGE_CONTENT;

    let handler = Handler::new(config.clone(), store, tracker.clone());
    let mut client = Client::builder(&config.discord_bot_token, intents)
        .event_handler(handler)
        .await?;

    // The adapter needs the gateway's HTTP client, which only exists once
    // the client is built; wiring it here closes the tracker-to-Discord loop.
    let adapter = TrackerEventAdapter::new(client.http.clone(), config, tracker);
    tokio::spawn(adapter.run(events_rx));

    tokio::select! {
        result = client.start() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }
    Ok(())
}
