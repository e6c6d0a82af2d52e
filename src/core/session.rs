//! Session controller
//!
//! Owns everything the widget shows: the two panes, the loading flag, the
//! error line and the history. State only changes through the operations
//! below; rendering code gets a shared reference via [`SessionController::state`].

use tracing::{debug, info, warn};
use unicode_segmentation::UnicodeSegmentation;

use crate::core::clipboard::ClipboardWriter;
use crate::core::features::translator::TranslatorService;
use crate::core::history::History;
use crate::core::speech::{select_voice, SpeechEngine, Utterance};
use crate::core::storage::KeyValueStore;
use crate::shared::error::{AppResult, CONNECTION_INTERRUPTED};
use crate::shared::types::{Pane, TranslationRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub input_text: String,
    pub output_text: String,
    pub is_loading: bool,
    /// User-facing error message of the last translation, if it failed
    pub error: Option<String>,
    pub history: History,
}

/// A translation that has been started but not finished.
///
/// Only [`SessionController::begin_translation`] creates one, so holding it
/// means the controller is in the translating state.
#[derive(Debug)]
#[must_use = "a pending translation must be finished or the session stays loading"]
pub struct PendingTranslation {
    source: String,
}

impl PendingTranslation {
    pub fn source(&self) -> &str {
        &self.source
    }
}

pub struct SessionController {
    state: SessionState,
    translator: TranslatorService,
    store: Box<dyn KeyValueStore>,
    storage_key: String,
    clipboard: Option<Box<dyn ClipboardWriter>>,
    speech: Option<Box<dyn SpeechEngine>>,
}

impl SessionController {
    /// Create a controller and restore the persisted history.
    pub fn new(
        translator: TranslatorService,
        store: Box<dyn KeyValueStore>,
        storage_key: impl Into<String>,
        max_items: usize,
    ) -> Self {
        let storage_key = storage_key.into();
        let history = History::load(store.as_ref(), &storage_key, max_items);
        info!(entries = history.len(), "Session started");

        Self {
            state: SessionState {
                input_text: String::new(),
                output_text: String::new(),
                is_loading: false,
                error: None,
                history,
            },
            translator,
            store,
            storage_key,
            clipboard: None,
            speech: None,
        }
    }

    /// Attach a clipboard; `None` leaves copy actions as no-ops
    pub fn with_clipboard(mut self, clipboard: Option<Box<dyn ClipboardWriter>>) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// Attach a speech engine; `None` leaves speak actions as no-ops
    pub fn with_speech(mut self, speech: Option<Box<dyn SpeechEngine>>) -> Self {
        self.speech = speech;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.state.history
    }

    pub fn has_clipboard(&self) -> bool {
        self.clipboard.is_some()
    }

    pub fn has_speech(&self) -> bool {
        self.speech.is_some()
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.state.input_text = text.into();
    }

    /// Length of the input as the user sees it (grapheme clusters)
    pub fn input_char_count(&self) -> usize {
        self.state.input_text.graphemes(true).count()
    }

    /// Enter the translating state.
    ///
    /// Returns `None`, leaving the state untouched, when the input is blank
    /// or a translation is already in flight.
    pub fn begin_translation(&mut self) -> Option<PendingTranslation> {
        if self.state.is_loading || self.state.input_text.trim().is_empty() {
            return None;
        }

        self.state.is_loading = true;
        self.state.error = None;
        self.state.output_text.clear();

        Some(PendingTranslation {
            source: self.state.input_text.clone(),
        })
    }

    /// Leave the translating state with the client's result.
    pub fn finish_translation(&mut self, pending: PendingTranslation, result: AppResult<String>) {
        self.state.is_loading = false;

        match result {
            Ok(translated) => {
                self.state.output_text = translated.clone();
                let evicted = self
                    .state
                    .history
                    .push(TranslationRecord::new(pending.source, translated));
                if !evicted.is_empty() {
                    debug!(count = evicted.len(), "Evicted oldest history entries");
                }
                self.persist_history();
            }
            Err(e) => {
                debug!(error = %e, "Translation failed");
                self.state.error = Some(CONNECTION_INTERRUPTED.to_string());
            }
        }
    }

    /// Run a started translation through the client and finish it.
    pub async fn run_translation(&mut self, pending: PendingTranslation) {
        let result = self.translator.translate(pending.source()).await;
        self.finish_translation(pending, result);
    }

    /// Translate the current input. No-op when the input is blank or a
    /// translation is already running.
    pub async fn translate_now(&mut self) {
        if let Some(pending) = self.begin_translation() {
            self.run_translation(pending).await;
        }
    }

    /// Clear both panes and the error. History is kept.
    pub fn clear_all(&mut self) {
        self.state.input_text.clear();
        self.state.output_text.clear();
        self.state.error = None;
    }

    /// Remove one history entry. Unknown ids are ignored.
    pub fn delete_history_item(&mut self, id: &str) {
        if self.state.history.remove(id).is_some() {
            self.persist_history();
        }
    }

    /// Put a past translation back into the panes without re-translating.
    pub fn load_from_history(&mut self, record: &TranslationRecord) {
        self.state.input_text = record.original.clone();
        self.state.output_text = record.translated.clone();
    }

    /// Copy a pane to the clipboard. Returns whether anything was copied;
    /// failures are logged only.
    pub fn copy(&mut self, pane: Pane) -> bool {
        let text = self.pane_text(pane).to_owned();
        if text.is_empty() {
            return false;
        }
        let Some(clipboard) = self.clipboard.as_mut() else {
            return false;
        };

        match clipboard.write_text(&text) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to copy");
                false
            }
        }
    }

    /// Read a pane aloud in its language. Returns whether speech started.
    pub fn speak(&mut self, pane: Pane) -> bool {
        let text = self.pane_text(pane).to_owned();
        if text.is_empty() {
            return false;
        }
        let Some(speech) = self.speech.as_mut() else {
            return false;
        };

        let tag = pane.speech_tag();
        let utterance = Utterance {
            text,
            lang: tag.to_string(),
            rate: pane.speech_rate(),
            voice: select_voice(speech.voices(), tag).cloned(),
        };

        match speech.speak(&utterance) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to speak");
                false
            }
        }
    }

    fn pane_text(&self, pane: Pane) -> &str {
        match pane {
            Pane::Input => &self.state.input_text,
            Pane::Output => &self.state.output_text,
        }
    }

    fn persist_history(&self) {
        if let Err(e) = self.state.history.save(self.store.as_ref(), &self.storage_key) {
            warn!(error = %e, "Failed to save history");
        }
    }
}
