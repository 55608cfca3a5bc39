use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DrillError;
use crate::words::WordEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Standard,
    Challenge,
}

impl Difficulty {
    /// Letters of the target token that must stay visible.
    pub fn min_visible(self) -> usize {
        match self {
            Difficulty::Standard => 2,
            Difficulty::Challenge => 1,
        }
    }

    /// Standard drills never hide the first letter.
    pub fn keeps_first_letter(self) -> bool {
        self == Difficulty::Standard
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Standard => write!(f, "standard"),
            Difficulty::Challenge => write!(f, "challenge"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = DrillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Difficulty::Standard),
            "challenge" => Ok(Difficulty::Challenge),
            other => Err(DrillError::InvalidInput(format!("unknown difficulty '{}'", other))),
        }
    }
}

/// A word entry with one token partially masked for fill-in practice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillItem {
    #[serde(flatten)]
    pub word: WordEntry,
    pub target_token_index: usize,
    pub target_token: String,
    /// Ascending, unique char positions inside `target_token`.
    pub blank_indices: Vec<usize>,
    pub display_text: String,
}

impl DrillItem {
    /// Expected character for the `position`-th blank.
    pub fn expected_char(&self, position: usize) -> Option<char> {
        let idx = *self.blank_indices.get(position)?;
        self.target_token.chars().nth(idx)
    }

    pub fn target_len(&self) -> usize {
        self.target_token.chars().count()
    }

    pub fn blank_count(&self) -> usize {
        self.blank_indices.len()
    }

    pub fn is_phrase(&self) -> bool {
        self.word.en.contains(' ')
    }

    /// Display text with the first `filled` blanks replaced by the answer.
    pub fn render_progress(&self, filled: usize) -> String {
        let revealed: Vec<usize> = self.blank_indices.iter().take(filled).copied().collect();
        self.word
            .en
            .split(' ')
            .enumerate()
            .map(|(i, token)| {
                if i != self.target_token_index {
                    return token.to_string();
                }
                token
                    .chars()
                    .enumerate()
                    .map(|(ci, c)| {
                        if self.blank_indices.contains(&ci) && !revealed.contains(&ci) {
                            '_'
                        } else {
                            c
                        }
                    })
                    .collect()
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total: u32,
    pub base: u32,
    pub time_bonus: u32,
    pub streak_bonus: u32,
    pub streak_multiplier: f64,
    pub penalty: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharClass {
    Vowel,
    Consonant,
    Other,
}

impl CharClass {
    pub fn of(c: char) -> Self {
        match c.to_ascii_lowercase() {
            'a' | 'e' | 'i' | 'o' | 'u' => CharClass::Vowel,
            c if c.is_ascii_alphabetic() => CharClass::Consonant,
            _ => CharClass::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MistakeDetail {
    /// Index into `blank_indices`.
    pub position: usize,
    pub expected: char,
    pub actual: char,
    pub char_class: CharClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordLog {
    pub word_id: u32,
    pub en: String,
    pub target_token: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub mistakes_count: u32,
    pub mistake_details: Vec<MistakeDetail>,
    /// Blank positions answered without any miss.
    pub perfect_positions: Vec<usize>,
    pub streak_before_this_word: u32,
    pub score_earned: u32,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Presenting,
    AwaitingInput,
    ItemComplete,
    SessionComplete,
}

/// Mutable state of one practice run. Owned by a single `SessionMachine`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub seed: u64,
    pub difficulty: Difficulty,
    pub items: Vec<DrillItem>,
    pub current_index: usize,
    pub score: u32,
    pub streak: u32,
    pub max_streak: u32,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub current_mistakes: u32,
    pub total_mistakes: u32,
    pub current_input_index: usize,
    pub started_at: DateTime<Utc>,
    pub current_word_start_time: DateTime<Utc>,
    pub current_item_mistakes: Vec<MistakeDetail>,
    pub word_logs: Vec<WordLog>,
}

impl SessionState {
    pub fn new(seed: u64, difficulty: Difficulty, items: Vec<DrillItem>, now: DateTime<Utc>) -> Self {
        Self {
            seed,
            difficulty,
            items,
            current_index: 0,
            score: 0,
            streak: 0,
            max_streak: 0,
            correct_count: 0,
            wrong_count: 0,
            current_mistakes: 0,
            total_mistakes: 0,
            current_input_index: 0,
            started_at: now,
            current_word_start_time: now,
            current_item_mistakes: Vec::new(),
            word_logs: Vec::new(),
        }
    }

    pub fn current_item(&self) -> Option<&DrillItem> {
        self.items.get(self.current_index)
    }

    pub fn record_mistake(&mut self, detail: MistakeDetail) {
        self.current_mistakes += 1;
        self.total_mistakes += 1;
        self.current_item_mistakes.push(detail);
    }

    pub fn reset_item(&mut self, now: DateTime<Utc>) {
        self.current_input_index = 0;
        self.current_mistakes = 0;
        self.current_item_mistakes.clear();
        self.current_word_start_time = now;
    }
}
