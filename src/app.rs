//! Terminal front end
//!
//! Reads commands from stdin and renders the session to stdout after each
//! one. Logging goes to stderr so it never interleaves with the panes.

use std::borrow::Cow;
use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::commands::{Command, HistoryRef, HELP, PASTE_END};
use crate::core::session::{SessionController, SessionState};
use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{Pane, TranslationRecord};

const PREVIEW_CHARS: usize = 40;

pub struct App<W = io::Stdout> {
    session: SessionController,
    out: W,
    /// Lines collected since `/paste`, until the end marker
    paste: Option<Vec<String>>,
}

impl App {
    pub fn new(session: SessionController) -> Self {
        Self::with_output(session, io::stdout())
    }
}

impl<W: Write> App<W> {
    pub fn with_output(session: SessionController, out: W) -> Self {
        Self {
            session,
            out,
            paste: None,
        }
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub async fn run(mut self) -> AppResult<()> {
        debug!(
            clipboard = self.session.has_clipboard(),
            speech = self.session.has_speech(),
            "Capabilities probed"
        );
        writeln!(self.out, "ThaiFlow - English to Thai\n{}", HELP)?;
        self.render()?;

        self.run_with(BufReader::new(tokio::io::stdin())).await?;

        info!("Session ended");
        Ok(())
    }

    /// Handle lines from `reader` until it ends or the user quits.
    ///
    /// Lines are decoded lossily so stray bytes only garble that line.
    pub async fn run_with<R: AsyncBufRead + Unpin>(&mut self, mut reader: R) -> AppResult<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                return Ok(());
            }
            let line = String::from_utf8_lossy(&buf);
            if let Cow::Owned(_) = line {
                warn!("Input line was not valid UTF-8, invalid bytes replaced");
            }
            if !self.handle_line(line.trim_end_matches(['\r', '\n'])).await? {
                return Ok(());
            }
        }
    }

    /// Returns `false` once the user asked to quit.
    async fn handle_line(&mut self, line: &str) -> AppResult<bool> {
        if let Some(lines) = self.paste.as_mut() {
            if line.trim() != PASTE_END {
                lines.push(line.to_string());
                return Ok(true);
            }
            let text = lines.join("\n");
            self.paste = None;
            self.session.set_input(text);
            self.render()?;
            return Ok(true);
        }

        match Command::parse(line) {
            Ok(Command::Quit) => return Ok(false),
            Ok(command) => self.dispatch(command).await?,
            Err(e) => writeln!(self.out, "{}", e)?,
        }
        Ok(true)
    }

    async fn dispatch(&mut self, command: Command) -> AppResult<()> {
        match command {
            Command::Input(text) => self.session.set_input(text),
            Command::Paste => {
                self.paste = Some(Vec::new());
                writeln!(self.out, "Paste text, then a line with only '{}' to finish", PASTE_END)?;
                return Ok(());
            }
            Command::Translate => {
                if let Some(pending) = self.session.begin_translation() {
                    self.render()?;
                    self.session.run_translation(pending).await;
                }
            }
            Command::Clear => self.session.clear_all(),
            Command::History => {
                render_history(&mut self.out, self.session.state())?;
                return Ok(());
            }
            Command::Load(reference) => match self.resolve(&reference) {
                Ok(record) => self.session.load_from_history(&record),
                Err(e) => writeln!(self.out, "{}", e)?,
            },
            Command::Delete(reference) => match self.resolve(&reference) {
                Ok(record) => self.session.delete_history_item(&record.id),
                Err(e) => writeln!(self.out, "{}", e)?,
            },
            Command::Copy(pane) => {
                if self.session.copy(pane) {
                    writeln!(self.out, "Copied {} text", pane.label())?;
                }
                return Ok(());
            }
            Command::Speak(pane) => {
                self.session.speak(pane);
                return Ok(());
            }
            Command::Help => {
                writeln!(self.out, "{}", HELP)?;
                return Ok(());
            }
            Command::Quit => return Ok(()),
        }
        self.render()
    }

    fn resolve(&self, reference: &HistoryRef) -> AppResult<TranslationRecord> {
        let history = self.session.history();
        let found = match reference {
            HistoryRef::Index(n) => n.checked_sub(1).and_then(|i| history.get(i)),
            HistoryRef::Id(id) => history.find(id),
        };
        found
            .cloned()
            .ok_or_else(|| AppError::Validation("No such history entry".to_string()))
    }

    fn render(&mut self) -> AppResult<()> {
        render(&mut self.out, self.session.state(), self.session.input_char_count())?;
        Ok(())
    }
}

fn render(out: &mut impl Write, state: &SessionState, char_count: usize) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "── {} ── {} chars", Pane::Input.label(), char_count)?;
    writeln!(out, "{}", state.input_text)?;
    writeln!(out, "── {}", Pane::Output.label())?;
    if state.is_loading {
        writeln!(out, "Translating...")?;
    } else if state.output_text.is_empty() {
        writeln!(out, "(Translation appears here)")?;
    } else {
        writeln!(out, "{}", state.output_text)?;
    }
    if let Some(error) = &state.error {
        writeln!(out, "! {}", error)?;
    }
    if !state.history.is_empty() {
        render_history(out, state)?;
    }
    Ok(())
}

fn render_history(out: &mut impl Write, state: &SessionState) -> io::Result<()> {
    if state.history.is_empty() {
        return writeln!(out, "No recent translations");
    }
    writeln!(out, "── Recent History")?;
    for (i, record) in state.history.items().iter().enumerate() {
        writeln!(
            out,
            "{:>2}. {}  →  {}  [{}]",
            i + 1,
            TranslationRecord::preview(&record.original, PREVIEW_CHARS),
            TranslationRecord::preview(&record.translated, PREVIEW_CHARS),
            record.created_at.with_timezone(&chrono::Local).format("%H:%M"),
        )?;
    }
    Ok(())
}
