use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use crate::error::{DrillError, Result};
use crate::types::Difficulty;
use crate::words::WordGroup;

pub const HISTORY_FILE: &str = "spelling_history.json";
pub const DEFAULT_PAUSE_MS: u64 = 800;

#[derive(Debug, Clone, PartialEq)]
pub struct PracticeConfig {
    pub groups: Vec<WordGroup>,
    pub difficulty: Difficulty,
    /// `None` draws a fresh seed per run.
    pub seed: Option<u64>,
    pub show_cn: bool,
    pub shuffle: bool,
    pub feedback_pause: Duration,
    pub history_path: PathBuf,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            groups: WordGroup::ALL.to_vec(),
            difficulty: Difficulty::Standard,
            seed: None,
            show_cn: true,
            shuffle: true,
            feedback_pause: Duration::from_millis(DEFAULT_PAUSE_MS),
            history_path: PathBuf::from(HISTORY_FILE),
        }
    }
}

impl PracticeConfig {
    pub fn session_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| rand::thread_rng().gen())
    }

    /// Arguments exclude the program name.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cfg = Self::default();
        let mut groups: Vec<WordGroup> = Vec::new();
        let mut args = args.into_iter().map(Into::<String>::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--seed" => {
                    let value = next_value(&mut args, "--seed")?;
                    cfg.seed = Some(parse_number(&value, "--seed")?);
                }
                "--pause-ms" => {
                    let value = next_value(&mut args, "--pause-ms")?;
                    cfg.feedback_pause = Duration::from_millis(parse_number(&value, "--pause-ms")?);
                }
                "--history" => {
                    cfg.history_path = PathBuf::from(next_value(&mut args, "--history")?);
                }
                "--no-cn" => cfg.show_cn = false,
                "--ordered" => cfg.shuffle = false,
                other => {
                    if let Some(group) = parse_group(other) {
                        if !groups.contains(&group) {
                            groups.push(group);
                        }
                    } else if let Some(difficulty) = parse_difficulty(other) {
                        cfg.difficulty = difficulty;
                    } else {
                        warn!("Ignoring unknown argument '{}'", other);
                    }
                }
            }
        }

        if !groups.is_empty() {
            cfg.groups = groups;
        }
        info!(
            groups = ?cfg.groups,
            difficulty = %cfg.difficulty,
            seed = ?cfg.seed,
            "Practice configuration"
        );
        Ok(cfg)
    }
}

pub fn parse_difficulty(arg: &str) -> Option<Difficulty> {
    let arg = arg.trim_start_matches('-').to_lowercase();

    match arg.as_str() {
        "s" | "st" | "std" | "stand" | "standard" => Some(Difficulty::Standard),
        "c" | "ch" | "chal" | "challenge" => Some(Difficulty::Challenge),
        _ => None,
    }
}

fn parse_group(arg: &str) -> Option<WordGroup> {
    let arg = arg.strip_prefix("--")?;
    arg.parse().ok()
}

fn next_value<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| DrillError::InvalidInput(format!("{} expects a value", flag)))
}

fn parse_number(value: &str, flag: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| DrillError::InvalidInput(format!("{} expects a number, got '{}'", flag, value)))
}
