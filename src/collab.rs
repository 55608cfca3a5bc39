//! Services the session machine calls out to: persistence, telemetry, speech.
//!
//! Failures from any of these are reported back as `Err` and contained by the
//! caller; none of them may interrupt a practice session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::Result;
use crate::types::{Difficulty, SessionState, WordLog};

/// Final outcome of a finished session, handed to the [`SessionStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub seed: u64,
    pub difficulty: Difficulty,
    pub total_score: u32,
    pub total_words: usize,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub max_streak: u32,
    pub total_mistakes: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub word_logs: Vec<WordLog>,
}

impl SessionRecord {
    pub fn from_state(state: &SessionState, ended_at: DateTime<Utc>) -> Self {
        Self {
            seed: state.seed,
            difficulty: state.difficulty,
            total_score: state.score,
            total_words: state.items.len(),
            correct_count: state.correct_count,
            wrong_count: state.wrong_count,
            max_streak: state.max_streak,
            total_mistakes: state.total_mistakes,
            started_at: state.started_at,
            ended_at,
            word_logs: state.word_logs.clone(),
        }
    }
}

pub trait SessionStore {
    fn persist_session(&mut self, record: &SessionRecord) -> Result<()>;
}

pub trait Telemetry {
    fn record_event(&mut self, name: &str, payload: Value) -> Result<()>;
}

pub trait Speech {
    fn speak(&mut self, text: &str) -> Result<()>;
}

pub struct Collaborators {
    pub store: Box<dyn SessionStore>,
    pub telemetry: Box<dyn Telemetry>,
    pub speech: Box<dyn Speech>,
}

impl Collaborators {
    pub fn new(
        store: impl SessionStore + 'static,
        telemetry: impl Telemetry + 'static,
        speech: impl Speech + 'static,
    ) -> Self {
        Self {
            store: Box::new(store),
            telemetry: Box::new(telemetry),
            speech: Box::new(speech),
        }
    }
}

/// Appends each record to a JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonSessionStore {
    path: PathBuf,
}

impl JsonSessionStore {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> Result<Vec<SessionRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

impl SessionStore for JsonSessionStore {
    fn persist_session(&mut self, record: &SessionRecord) -> Result<()> {
        let mut history = self.load()?;
        history.push(record.clone());

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        serde_json::to_writer_pretty(file, &history)?;

        info!(
            path = %self.path.display(),
            sessions = history.len(),
            "Saved session history"
        );
        Ok(())
    }
}

/// Forwards events to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn record_event(&mut self, name: &str, payload: Value) -> Result<()> {
        info!(event = name, payload = %payload, "Practice event");
        Ok(())
    }
}

/// No audio output in the terminal; the phrase is only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSpeech;

impl Speech for SilentSpeech {
    fn speak(&mut self, text: &str) -> Result<()> {
        debug!(text, "Speak");
        Ok(())
    }
}
