//! Spelling drills: seeded blank selection, tiered scoring and the practice
//! session state machine that sequences them.

pub mod app;
pub mod collab;
pub mod config;
pub mod drill;
pub mod error;
pub mod report;
pub mod rng;
pub mod scoring;
pub mod session;
pub mod timer;
pub mod types;
pub mod words;

pub use collab::{Collaborators, SessionRecord, SessionStore, Speech, Telemetry};
pub use drill::{generate, plan_session, SessionPlan};
pub use error::{DrillError, Result};
pub use rng::DrillRng;
pub use scoring::score;
pub use session::{InputOutcome, ItemResult, KeyInput, SessionMachine};
pub use types::{
    CharClass, Difficulty, DrillItem, MistakeDetail, ScoreBreakdown, SessionPhase, SessionState, WordLog,
};
pub use words::{load_word_entries, WordEntry, WordGroup};
