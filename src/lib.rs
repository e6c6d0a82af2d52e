pub mod app;
pub mod commands;
pub mod core;
pub mod shared;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::core::clipboard::{ClipboardWriter, SystemClipboard};
use crate::core::features::translator::{GeminiClient, TranslatorService};
use crate::core::session::SessionController;
use crate::core::speech::{SpeechEngine, SystemSpeech};
use crate::core::storage::open_default_store;
use crate::shared::error::AppResult;
use crate::shared::settings::AppSettings;

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Wire settings, capabilities and the session together and run the
/// terminal front end until the user quits.
pub async fn run() -> AppResult<()> {
    init_tracing();

    let settings = AppSettings::load().await;
    if settings.api.gemini_api_key.is_none() {
        tracing::warn!("No Gemini API key found; translations will fail until GEMINI_API_KEY is set");
    }

    let generator = GeminiClient::new(&settings.api)?;
    let translator = TranslatorService::new(Arc::new(generator), settings.api.model.clone());

    let clipboard = SystemClipboard::probe().map(|c| Box::new(c) as Box<dyn ClipboardWriter>);
    let speech = if settings.speech.enabled {
        SystemSpeech::probe().map(|s| Box::new(s) as Box<dyn SpeechEngine>)
    } else {
        None
    };

    let session = SessionController::new(
        translator,
        open_default_store(),
        settings.history.storage_key.clone(),
        settings.history.max_items,
    )
    .with_clipboard(clipboard)
    .with_speech(speech);

    info!(model = %settings.api.model, "ThaiFlow ready");
    app::App::new(session).run().await
}
