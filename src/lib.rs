// Declare the modules
pub mod api;
pub mod commands;
pub mod config;
pub mod models;
pub mod prompts;
pub mod state;
pub mod store;

#[cfg(test)]
mod test_helpers;

pub use api::{ChatApi, DeltaStream, HttpApiClient};
pub use config::ApiConfig;
pub use models::{ChatState, ChatStatePatch, Conversation, Message, RawMessage, Role, Source};
pub use state::AppState;
pub use store::{Store, Subscription};

use anyhow::{Context, Result};
use std::sync::Arc;

const USAGE: &str = "usage: docchat [DOCUMENT_ID]";

/// Loads the conversations of a document (or opens a document-less
/// conversation) against the configured backend and prints the state.
pub fn run() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let document_id = match std::env::args().nth(1) {
        Some(arg) => Some(
            arg.parse::<i64>()
                .context(format!("Invalid document id '{}'. {}", arg, USAGE))?,
        ),
        None => None,
    };

    let config = ApiConfig::from_env();
    let api: Arc<dyn ChatApi> = Arc::new(HttpApiClient::from_config(config)?);
    let app_state = AppState::new(api);

    let subscription = app_state.store.subscribe(|state: &ChatState| {
        log::info!(
            "State changed: {} conversation(s), active {:?}",
            state.conversations.len(),
            state.active_conversation_id
        );
    });

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    runtime.block_on(async {
        match document_id {
            Some(id) => commands::fetch_conversations(&app_state, id).await,
            None => commands::create_open_conversation(&app_state).await.map(|_| ()),
        }
    })?;
    subscription.unsubscribe();

    let rendered = serde_json::to_string_pretty(&app_state.snapshot())
        .context("Failed to serialize chat state")?;
    println!("{}", rendered);
    Ok(())
}
