//! Speech capability
//!
//! Reads a pane aloud through the platform speech command: `say` on macOS,
//! `espeak-ng` elsewhere. Only one utterance plays at a time; starting a new
//! one kills the previous child process. The text is piped to the
//! command's stdin.

use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::shared::error::{AppError, AppResult};

/// Words per minute both engines use at rate 1.0
const BASE_WORDS_PER_MINUTE: f32 = 175.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    /// Value passed to the engine's voice flag
    pub id: String,
    pub name: String,
    /// Language as reported by the engine, e.g. `th_TH` or `th`
    pub language: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// BCP-47 tag such as `th-TH`
    pub lang: String,
    pub rate: f32,
    pub voice: Option<Voice>,
}

pub trait SpeechEngine: Send {
    fn voices(&self) -> &[Voice];
    /// Speak `utterance`, cancelling whatever is still playing
    fn speak(&mut self, utterance: &Utterance) -> AppResult<()>;
    fn cancel(&mut self);
}

/// Pick the first voice whose language matches the primary subtag of `tag`
/// (`th-TH` matches `th_TH`, `th` and `th-th`).
pub fn select_voice<'a>(voices: &'a [Voice], tag: &str) -> Option<&'a Voice> {
    let primary = primary_subtag(tag);
    if primary.is_empty() {
        return None;
    }
    voices.iter().find(|voice| {
        let lang = voice.language.to_ascii_lowercase();
        lang == primary
            || lang
                .strip_prefix(primary.as_str())
                .is_some_and(|rest| rest.starts_with(['-', '_']))
    })
}

fn primary_subtag(tag: &str) -> String {
    tag.split(['-', '_']).next().unwrap_or_default().to_ascii_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Say,
    Espeak,
}

impl Backend {
    fn program(self) -> &'static str {
        match self {
            Backend::Say => "say",
            Backend::Espeak => "espeak-ng",
        }
    }

    fn list_voices_args(self) -> &'static [&'static str] {
        match self {
            Backend::Say => &["-v", "?"],
            Backend::Espeak => &["--voices"],
        }
    }

    fn parse_voices(self, listing: &str) -> Vec<Voice> {
        match self {
            Backend::Say => parse_say_voices(listing),
            Backend::Espeak => parse_espeak_voices(listing),
        }
    }

    /// Engine flags for `utterance`. The text itself is written to the
    /// child's stdin so it can never be read as an option.
    fn speak_args(self, utterance: &Utterance) -> Vec<String> {
        let wpm = (BASE_WORDS_PER_MINUTE * utterance.rate).round() as u32;
        let mut args = Vec::new();
        match self {
            Backend::Say => {
                // say reads the message from stdin when none is given
                args.extend(["-r".to_string(), wpm.to_string()]);
                if let Some(voice) = &utterance.voice {
                    args.extend(["-v".to_string(), voice.id.clone()]);
                }
            }
            Backend::Espeak => {
                args.extend(["-s".to_string(), wpm.to_string()]);
                // espeak-ng voices are selected by language code
                let voice = utterance
                    .voice
                    .as_ref()
                    .map(|v| v.id.clone())
                    .unwrap_or_else(|| primary_subtag(&utterance.lang));
                args.extend(["-v".to_string(), voice, "--stdin".to_string()]);
            }
        }
        args
    }
}

fn say_voice_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<name>\S.*?)\s+(?P<lang>[a-z]{2,3}[_-][A-Za-z0-9]+)\s+#")
            .expect("Invalid say voice regex")
    })
}

fn espeak_voice_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*\d+\s+(?P<lang>\S+)\s+\S+\s+(?P<name>\S+)")
            .expect("Invalid espeak voice regex")
    })
}

/// Parse `say -v ?` output: `Kanya               th_TH    # ...`
fn parse_say_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .filter_map(|line| say_voice_line().captures(line))
        .map(|caps| Voice {
            id: caps["name"].to_string(),
            name: caps["name"].to_string(),
            language: caps["lang"].to_string(),
        })
        .collect()
}

/// Parse `espeak-ng --voices` output: ` 5  th  --/M  Thai  sit/th`
fn parse_espeak_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .filter_map(|line| espeak_voice_line().captures(line))
        .map(|caps| Voice {
            id: caps["lang"].to_string(),
            name: caps["name"].to_string(),
            language: caps["lang"].to_string(),
        })
        .collect()
}

/// Speech through a platform text-to-speech command
pub struct SystemSpeech {
    backend: Backend,
    voices: Vec<Voice>,
    current: Option<Child>,
}

impl SystemSpeech {
    /// Look for a usable speech command and list its voices.
    pub fn probe() -> Option<Self> {
        [Backend::Say, Backend::Espeak]
            .into_iter()
            .find_map(|backend| {
                let output = Command::new(backend.program())
                    .args(backend.list_voices_args())
                    .stdin(Stdio::null())
                    .stderr(Stdio::null())
                    .output()
                    .ok()?;
                if !output.status.success() {
                    return None;
                }
                let voices = backend.parse_voices(&String::from_utf8_lossy(&output.stdout));
                debug!(program = backend.program(), voices = voices.len(), "Speech engine found");
                Some(Self {
                    backend,
                    voices,
                    current: None,
                })
            })
    }
}

impl SpeechEngine for SystemSpeech {
    fn voices(&self) -> &[Voice] {
        &self.voices
    }

    fn speak(&mut self, utterance: &Utterance) -> AppResult<()> {
        self.cancel();

        let mut child = Command::new(self.backend.program())
            .args(self.backend.speak_args(utterance))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AppError::Speech(format!("Failed to start {}: {}", self.backend.program(), e)))?;

        // Dropping the handle closes stdin, which ends the message
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(utterance.text.as_bytes()),
            None => Ok(()),
        };
        self.current = Some(child);
        written.map_err(|e| {
            self.cancel();
            AppError::Speech(format!("Failed to send text to {}: {}", self.backend.program(), e))
        })
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.current.take() {
            // Already finished is fine; kill only errors in that case
            if let Ok(None) = child.try_wait() {
                if let Err(e) = child.kill() {
                    warn!(error = %e, "Failed to stop speech");
                }
            }
            let _ = child.wait();
        }
    }
}

impl Drop for SystemSpeech {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(id: &str, language: &str) -> Voice {
        Voice {
            id: id.to_string(),
            name: id.to_string(),
            language: language.to_string(),
        }
    }

    #[test]
    fn select_voice_matches_primary_subtag() {
        let voices = vec![voice("Alex", "en_US"), voice("Kanya", "th_TH")];
        assert_eq!(select_voice(&voices, "th-TH").map(|v| v.id.as_str()), Some("Kanya"));
        assert_eq!(select_voice(&voices, "en-US").map(|v| v.id.as_str()), Some("Alex"));
    }

    #[test]
    fn select_voice_does_not_match_partial_codes() {
        // "tha" style prefixes must not match "th"
        let voices = vec![voice("Other", "thx_XX")];
        assert_eq!(select_voice(&voices, "th-TH"), None);
        assert_eq!(select_voice(&[], "th-TH"), None);
    }

    #[test]
    fn parses_say_listing() {
        let listing = "Alex                en_US    # Most people recognize me by my voice.\n\
                       Eddy (English (US)) en_US    # Hello! My name is Eddy.\n\
                       Kanya               th_TH    # สวัสดีค่ะ ดิฉันชื่อKanya\n";
        let voices = parse_say_voices(listing);
        assert_eq!(voices.len(), 3);
        assert_eq!(voices[1].name, "Eddy (English (US))");
        assert_eq!(voices[2], voice("Kanya", "th_TH"));
    }

    #[test]
    fn parses_espeak_listing() {
        let listing = "Pty Language       Age/Gender VoiceName          File                 Other Languages\n \
                       5  af              --/M      Afrikaans          gmw/af\n \
                       5  th              --/M      Thai               sit/th\n";
        let voices = parse_espeak_voices(listing);
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[1].id, "th");
        assert_eq!(voices[1].name, "Thai");
    }

    #[test]
    fn speak_args_apply_rate_and_voice() {
        let utterance = Utterance {
            text: "สวัสดี".to_string(),
            lang: "th-TH".to_string(),
            rate: 0.8,
            voice: Some(voice("Kanya", "th_TH")),
        };
        assert_eq!(Backend::Say.speak_args(&utterance), vec!["-r", "140", "-v", "Kanya"]);

        let fallback = Utterance { voice: None, rate: 1.0, ..utterance };
        assert_eq!(
            Backend::Espeak.speak_args(&fallback),
            vec!["-s", "175", "-v", "th", "--stdin"]
        );
    }

    #[test]
    fn text_starting_with_a_dash_never_reaches_argv() {
        for text in ["-w/tmp/out.wav", "-o/tmp/out.aiff", "-5 degrees"] {
            let utterance = Utterance {
                text: text.to_string(),
                lang: "en-US".to_string(),
                rate: 1.0,
                voice: None,
            };
            for backend in [Backend::Say, Backend::Espeak] {
                let args = backend.speak_args(&utterance);
                assert!(
                    args.iter().all(|arg| !arg.contains(text)),
                    "{backend:?} passed {text:?} as an argument: {args:?}"
                );
            }
        }
    }
}
