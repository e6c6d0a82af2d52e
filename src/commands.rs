//! Terminal commands
//!
//! Every line the user types maps to one [`Command`]. Plain text replaces the
//! input pane; lines starting with `/` are actions and `//` escapes a
//! leading slash.

use crate::shared::error::{AppError, AppResult};
use crate::shared::types::Pane;

/// Line that ends `/paste` mode
pub const PASTE_END: &str = ".";

pub const HELP: &str = "\
Type English text to set the input, then press Enter on an empty line to translate.
Start a line with // to enter text that begins with /.
  /paste             enter multi-line text, finish with a line containing only .
  /translate         translate the current input
  /clear             clear input, output and error
  /history           show recent translations
  /load <n|id>       load a history entry into the panes
  /delete <n|id>     delete a history entry
  /copy in|out       copy the English or Thai text
  /speak in|out      read the English or Thai text aloud
  /help              show this help
  /quit              exit";

/// A history entry addressed by its 1-based position or by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryRef {
    Index(usize),
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Input(String),
    Paste,
    Translate,
    Clear,
    History,
    Load(HistoryRef),
    Delete(HistoryRef),
    Copy(Pane),
    Speak(Pane),
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> AppResult<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Command::Translate);
        }

        let Some(rest) = trimmed.strip_prefix('/') else {
            return Ok(Command::Input(line.trim_end_matches(['\r', '\n']).to_string()));
        };
        if rest.starts_with('/') {
            return Ok(Command::Input(rest.to_string()));
        }

        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

        match (name.as_str(), arg) {
            ("paste" | "p", None) => Ok(Command::Paste),
            ("translate" | "t", None) => Ok(Command::Translate),
            ("clear" | "c", None) => Ok(Command::Clear),
            ("history" | "h", None) => Ok(Command::History),
            ("load" | "l", Some(arg)) => Ok(Command::Load(parse_history_ref(arg))),
            ("delete" | "d", Some(arg)) => Ok(Command::Delete(parse_history_ref(arg))),
            ("copy", Some(arg)) => Ok(Command::Copy(parse_pane(arg)?)),
            ("speak", Some(arg)) => Ok(Command::Speak(parse_pane(arg)?)),
            ("help" | "?", None) => Ok(Command::Help),
            ("quit" | "q" | "exit", None) => Ok(Command::Quit),
            ("load" | "l" | "delete" | "d", None) => {
                Err(AppError::Validation(format!("/{} needs a history number or id", name)))
            }
            ("copy" | "speak", None) => Err(AppError::Validation(format!("/{} needs 'in' or 'out'", name))),
            _ => Err(AppError::Validation(format!("Unknown command: /{}", name))),
        }
    }
}

fn parse_history_ref(arg: &str) -> HistoryRef {
    match arg.parse::<usize>() {
        Ok(n) => HistoryRef::Index(n),
        Err(_) => HistoryRef::Id(arg.to_string()),
    }
}

fn parse_pane(arg: &str) -> AppResult<Pane> {
    match arg.to_ascii_lowercase().as_str() {
        "in" | "input" | "en" => Ok(Pane::Input),
        "out" | "output" | "th" => Ok(Pane::Output),
        other => Err(AppError::Validation(format!("Unknown pane '{}', use 'in' or 'out'", other))),
    }
}
