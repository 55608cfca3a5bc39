//! Practice session state machine.
//!
//! ```text
//! Presenting(i) -> AwaitingInput(i) -> ItemComplete(i) -> (pause) -> Presenting(i+1)
//!                                                                  \-> SessionComplete
//! ```
//!
//! Every transition runs to completion on the caller's thread. The pause
//! after `ItemComplete` is not owned here: the caller schedules it (see
//! [`crate::timer::PauseTimer`]) and calls [`SessionMachine::advance`] when
//! it fires. Keystrokes arriving during the pause are ignored.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::collab::{Collaborators, SessionRecord};
use crate::drill::SessionPlan;
use crate::error::{DrillError, Result};
use crate::scoring;
use crate::timer::AdvanceSignal;
use crate::types::{
    CharClass, DrillItem, MistakeDetail, ScoreBreakdown, SessionPhase, SessionState, WordLog,
};

/// Mistakes on one item beyond which the streak resets.
pub const STREAK_MISTAKE_TOLERANCE: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    /// No state change.
    Ignored,
    Retreated { input_index: usize },
    Accepted { input_index: usize },
    Mistake(MistakeDetail),
    Completed(ItemResult),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemResult {
    pub item_index: usize,
    pub breakdown: ScoreBreakdown,
    pub was_perfect: bool,
    pub streak: u32,
    pub score: u32,
}

pub struct SessionMachine {
    state: SessionState,
    phase: SessionPhase,
    collaborators: Collaborators,
    persisted: bool,
}

impl SessionMachine {
    pub fn start(plan: SessionPlan, collaborators: Collaborators, now: DateTime<Utc>) -> Result<Self> {
        if plan.items.is_empty() {
            return Err(DrillError::NoWords);
        }

        let mut machine = Self {
            state: SessionState::new(plan.seed, plan.difficulty, plan.items, now),
            phase: SessionPhase::Presenting,
            collaborators,
            persisted: false,
        };

        info!(
            seed = machine.state.seed,
            difficulty = %machine.state.difficulty,
            word_count = machine.state.items.len(),
            "Practice session started"
        );
        machine.emit(
            "session_start",
            json!({
                "seed": machine.state.seed,
                "difficulty": machine.state.difficulty,
                "wordCount": machine.state.items.len(),
            }),
        );
        machine.present();
        Ok(machine)
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_item(&self) -> Option<&DrillItem> {
        match self.phase {
            SessionPhase::SessionComplete => None,
            _ => self.state.current_item(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::SessionComplete
    }

    pub fn handle_key(&mut self, key: KeyInput, now: DateTime<Utc>) -> InputOutcome {
        if self.phase != SessionPhase::AwaitingInput {
            return InputOutcome::Ignored;
        }

        match key {
            KeyInput::Backspace => {
                if self.state.current_input_index == 0 {
                    return InputOutcome::Ignored;
                }
                self.state.current_input_index -= 1;
                let input_index = self.state.current_input_index;
                self.emit_key("Backspace", true, None);
                InputOutcome::Retreated { input_index }
            }
            KeyInput::Char(c) if !c.is_ascii_alphabetic() => InputOutcome::Ignored,
            KeyInput::Char(c) => self.handle_letter(c, now),
        }
    }

    fn handle_letter(&mut self, c: char, now: DateTime<Utc>) -> InputOutcome {
        let position = self.state.current_input_index;
        let expected = match self.state.current_item().and_then(|item| item.expected_char(position)) {
            Some(ch) => ch,
            // over-input
            None => return InputOutcome::Ignored,
        };

        if c.to_lowercase().eq(expected.to_lowercase()) {
            self.state.current_input_index += 1;
            self.emit_key(&c.to_string(), true, Some(expected));

            let blanks = self.state.current_item().map_or(0, DrillItem::blank_count);
            if self.state.current_input_index >= blanks {
                InputOutcome::Completed(self.complete_item(now))
            } else {
                InputOutcome::Accepted {
                    input_index: self.state.current_input_index,
                }
            }
        } else {
            let detail = MistakeDetail {
                position,
                expected,
                actual: c,
                char_class: CharClass::of(expected),
            };
            self.state.record_mistake(detail.clone());
            self.emit_key(&c.to_string(), false, Some(expected));
            debug!(
                position,
                %expected,
                actual = %c,
                mistakes = self.state.current_mistakes,
                "Wrong letter"
            );
            InputOutcome::Mistake(detail)
        }
    }

    fn complete_item(&mut self, now: DateTime<Utc>) -> ItemResult {
        self.phase = SessionPhase::ItemComplete;

        let item_index = self.state.current_index;
        let mistakes = self.state.current_mistakes;
        let streak_before = self.state.streak;
        let elapsed_secs =
            ((now - self.state.current_word_start_time).num_milliseconds() as f64 / 1000.0).max(0.0);

        let breakdown = match self.state.current_item() {
            Some(item) => scoring::score(item, elapsed_secs, mistakes, streak_before),
            None => ScoreBreakdown {
                total: 0,
                base: 0,
                time_bonus: 0,
                streak_bonus: 0,
                streak_multiplier: 1.0,
                penalty: 0,
            },
        };
        self.state.score += breakdown.total;

        if mistakes <= STREAK_MISTAKE_TOLERANCE {
            self.state.streak += 1;
            self.state.max_streak = self.state.max_streak.max(self.state.streak);
        } else {
            self.state.streak = 0;
        }

        let was_perfect = mistakes == 0;
        if was_perfect {
            self.state.correct_count += 1;
        } else {
            self.state.wrong_count += 1;
        }

        let missed: Vec<usize> = self.state.current_item_mistakes.iter().map(|m| m.position).collect();
        let log = self.state.current_item().map(|item| WordLog {
            word_id: item.word.id,
            en: item.word.en.clone(),
            target_token: item.target_token.clone(),
            started_at: self.state.current_word_start_time,
            ended_at: now,
            duration_secs: elapsed_secs,
            mistakes_count: mistakes,
            mistake_details: self.state.current_item_mistakes.clone(),
            perfect_positions: (0..item.blank_count()).filter(|p| !missed.contains(p)).collect(),
            streak_before_this_word: streak_before,
            score_earned: breakdown.total,
            breakdown,
        });
        if let Some(log) = log {
            self.state.word_logs.push(log);
        }

        info!(
            item_index,
            elapsed_secs,
            mistakes,
            earned = breakdown.total,
            total_score = self.state.score,
            streak = self.state.streak,
            perfect = was_perfect,
            "Word completed"
        );
        self.emit(
            "word_complete",
            json!({
                "itemIndex": item_index,
                "timeSec": elapsed_secs,
                "mistakes": mistakes,
                "score": breakdown.total,
                "totalScore": self.state.score,
                "perfect": was_perfect,
                "streak": self.state.streak,
            }),
        );

        ItemResult {
            item_index,
            breakdown,
            was_perfect,
            streak: self.state.streak,
            score: self.state.score,
        }
    }

    /// Moves past a completed item. No-op in any other phase.
    pub fn advance(&mut self, now: DateTime<Utc>) -> SessionPhase {
        if self.phase != SessionPhase::ItemComplete {
            return self.phase;
        }

        self.state.reset_item(now);
        self.state.current_index += 1;

        if self.state.current_index < self.state.items.len() {
            self.phase = SessionPhase::Presenting;
            self.present();
        } else {
            self.finish(now);
        }
        self.phase
    }

    /// Advances only if the signal belongs to the item currently completed.
    pub fn on_advance_signal(&mut self, signal: AdvanceSignal, now: DateTime<Utc>) -> SessionPhase {
        if self.phase == SessionPhase::ItemComplete && signal.item_index == self.state.current_index {
            self.advance(now)
        } else {
            debug!(signal = signal.item_index, current = self.state.current_index, "Stale advance signal");
            self.phase
        }
    }

    /// Drops the session without persisting anything.
    pub fn abandon(mut self) -> SessionState {
        if !self.is_complete() {
            info!(
                item_index = self.state.current_index,
                score = self.state.score,
                "Practice session abandoned"
            );
            self.emit(
                "session_abandoned",
                json!({ "itemIndex": self.state.current_index, "score": self.state.score }),
            );
        }
        self.state
    }

    fn present(&mut self) {
        let Some(en) = self.state.current_item().map(|item| item.word.en.clone()) else {
            return;
        };
        self.emit(
            "word_presented",
            json!({ "itemIndex": self.state.current_index, "word": en }),
        );
        if let Err(e) = self.collaborators.speech.speak(&en) {
            warn!(error = %e, "Speech failed");
        }
        self.phase = SessionPhase::AwaitingInput;
    }

    fn finish(&mut self, now: DateTime<Utc>) {
        self.phase = SessionPhase::SessionComplete;
        if self.persisted {
            return;
        }
        self.persisted = true;

        let record = SessionRecord::from_state(&self.state, now);
        info!(
            total_score = record.total_score,
            total_words = record.total_words,
            correct = record.correct_count,
            wrong = record.wrong_count,
            max_streak = record.max_streak,
            "Practice session complete"
        );
        self.emit(
            "session_complete",
            json!({
                "totalScore": record.total_score,
                "totalWords": record.total_words,
                "correctCount": record.correct_count,
                "wrongCount": record.wrong_count,
                "maxStreak": record.max_streak,
            }),
        );
        if let Err(e) = self.collaborators.store.persist_session(&record) {
            warn!(error = %e, "Failed to persist session");
        }
    }

    fn emit_key(&mut self, key: &str, correct: bool, expected: Option<char>) {
        let word_id = self.state.current_item().map(|i| i.word.id);
        self.emit(
            "key_input",
            json!({
                "key": key,
                "correct": correct,
                "wordId": word_id,
                "position": self.state.current_input_index,
                "expected": expected.map(String::from),
            }),
        );
    }

    fn emit(&mut self, name: &str, payload: Value) {
        if let Err(e) = self.collaborators.telemetry.record_event(name, payload) {
            warn!(event = name, error = %e, "Telemetry failed");
        }
    }
}
