//! Text-to-speech playback through an external speech command

use std::process::{Child, Command, Stdio};

use log::{debug, info, warn};

use crate::settings::SpeechSettings;

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to signal speech process: {0}")]
    Signal(std::io::Error),

    #[error("pausing speech is not supported on this platform")]
    Unsupported,

    #[error("nothing to read")]
    EmptyText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Speaking,
    Paused,
}

/// The speech engine behind [`Playback`]
pub trait Speaker {
    fn start(&mut self, text: &str) -> Result<(), SpeechError>;
    fn pause(&mut self) -> Result<(), SpeechError>;
    fn resume(&mut self) -> Result<(), SpeechError>;
    fn stop(&mut self);
    /// Whether the last utterance is still going (paused counts as going)
    fn is_active(&mut self) -> bool;
}

#[cfg(target_os = "macos")]
const DEFAULT_PROGRAM: &str = "say";
#[cfg(not(target_os = "macos"))]
const DEFAULT_PROGRAM: &str = "espeak";

/// Runs `say` / `espeak` (or a configured command) as a child process
pub struct CommandSpeaker {
    program: String,
    voice: Option<String>,
    rate: Option<u32>,
    child: Option<Child>,
}

impl CommandSpeaker {
    pub fn from_settings(settings: &SpeechSettings) -> Self {
        Self {
            program: settings
                .program
                .clone()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PROGRAM.to_string()),
            voice: settings.voice.clone(),
            rate: settings.rate,
            child: None,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for one utterance; `say` and `espeak` spell the rate flag differently
    pub fn arguments(&self, text: &str) -> Vec<String> {
        let is_say = self.program.rsplit('/').next() == Some("say");
        let mut args = Vec::new();
        if let Some(voice) = &self.voice {
            args.push("-v".to_string());
            args.push(voice.clone());
        }
        if let Some(rate) = self.rate {
            args.push(if is_say { "-r" } else { "-s" }.to_string());
            args.push(rate.to_string());
        }
        args.push("--".to_string());
        args.push(text.to_string());
        args
    }

    fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: libc::c_int) -> Result<(), SpeechError> {
    let result = unsafe { libc::kill(pid as libc::pid_t, signal) };
    if result != 0 {
        return Err(SpeechError::Signal(std::io::Error::last_os_error()));
    }
    Ok(())
}

impl Speaker for CommandSpeaker {
    fn start(&mut self, text: &str) -> Result<(), SpeechError> {
        self.stop();
        let child = Command::new(&self.program)
            .args(self.arguments(text))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SpeechError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        debug!("Speech process {} started", child.id());
        self.child = Some(child);
        Ok(())
    }

    #[cfg(unix)]
    fn pause(&mut self) -> Result<(), SpeechError> {
        match self.pid() {
            Some(pid) => send_signal(pid, libc::SIGSTOP),
            None => Ok(()),
        }
    }

    #[cfg(unix)]
    fn resume(&mut self) -> Result<(), SpeechError> {
        match self.pid() {
            Some(pid) => send_signal(pid, libc::SIGCONT),
            None => Ok(()),
        }
    }

    #[cfg(not(unix))]
    fn pause(&mut self) -> Result<(), SpeechError> {
        Err(SpeechError::Unsupported)
    }

    #[cfg(not(unix))]
    fn resume(&mut self) -> Result<(), SpeechError> {
        Err(SpeechError::Unsupported)
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!("Speech process already gone: {e}");
            }
            let _ = child.wait();
        }
    }

    fn is_active(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(Some(_)) => {
                self.child = None;
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!("Cannot query speech process: {e}");
                false
            }
        }
    }
}

impl Drop for CommandSpeaker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Idle / Speaking / Paused state machine over a [`Speaker`]
pub struct Playback {
    speaker: Box<dyn Speaker>,
    state: PlaybackState,
}

impl Playback {
    pub fn new(speaker: Box<dyn Speaker>) -> Self {
        Self {
            speaker,
            state: PlaybackState::Idle,
        }
    }

    /// Current state, noticing utterances that finished on their own
    pub fn state(&mut self) -> PlaybackState {
        if self.state == PlaybackState::Speaking && !self.speaker.is_active() {
            self.state = PlaybackState::Idle;
        }
        self.state
    }

    /// Start reading `text`, replacing whatever was being read
    pub fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SpeechError::EmptyText);
        }
        self.speaker.stop();
        self.state = PlaybackState::Idle;
        self.speaker.start(text)?;
        self.state = PlaybackState::Speaking;
        info!("Speaking {} chars", text.chars().count());
        Ok(())
    }

    /// Returns false when there is nothing to pause
    pub fn pause(&mut self) -> Result<bool, SpeechError> {
        if self.state() != PlaybackState::Speaking {
            return Ok(false);
        }
        self.speaker.pause()?;
        self.state = PlaybackState::Paused;
        Ok(true)
    }

    /// Returns false unless paused
    pub fn resume(&mut self) -> Result<bool, SpeechError> {
        if self.state != PlaybackState::Paused {
            return Ok(false);
        }
        self.speaker.resume()?;
        self.state = PlaybackState::Speaking;
        Ok(true)
    }

    pub fn stop(&mut self) {
        if self.state != PlaybackState::Idle {
            debug!("Stopping speech");
        }
        self.speaker.stop();
        self.state = PlaybackState::Idle;
    }
}
