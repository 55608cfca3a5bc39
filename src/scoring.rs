use tracing::debug;

use crate::types::{DrillItem, ScoreBreakdown};

const PENALTY_PER_MISTAKE: u32 = 5;
const TIME_BONUS_SHARE: f64 = 0.2;
/// Mistakes tolerated while still earning the streak multiplier.
pub const MULTIPLIER_MISTAKE_TOLERANCE: u32 = 1;

/// Reference completion time in seconds.
pub fn par_time(blanks: usize, token_len: usize) -> f64 {
    1.5 * blanks as f64 + 0.2 * token_len as f64 + 1.0
}

/// Highest tier reached by `effective_streak` wins.
pub fn streak_multiplier(effective_streak: u32) -> f64 {
    match effective_streak {
        s if s >= 10 => 2.0,
        s if s >= 6 => 1.5,
        s if s >= 3 => 1.2,
        _ => 1.0,
    }
}

pub fn score(item: &DrillItem, elapsed_secs: f64, mistakes: u32, prior_streak: u32) -> ScoreBreakdown {
    let len = item.target_len();
    let blanks = item.blank_count();
    let elapsed = elapsed_secs.max(0.0);

    let base = (10.0 * blanks as f64 + len as f64).max(10.0).round();
    let penalty = PENALTY_PER_MISTAKE.saturating_mul(mistakes);

    let par = par_time(blanks, len);
    let time_bonus = if mistakes == 0 && elapsed < par {
        let ratio = ((par - elapsed) / par).min(1.0);
        (base * TIME_BONUS_SHARE * ratio).round()
    } else {
        0.0
    };

    let multiplier = if mistakes <= MULTIPLIER_MISTAKE_TOLERANCE {
        streak_multiplier(prior_streak.saturating_add(1))
    } else {
        1.0
    };

    let boosted = (base + time_bonus) * multiplier;
    let total = (boosted.round() - penalty as f64).max(0.0);
    let streak_bonus = ((base + time_bonus) * (multiplier - 1.0)).round();

    debug!(
        word_id = item.word.id,
        base,
        time_bonus,
        multiplier,
        penalty,
        total,
        phrase = item.is_phrase(),
        elapsed,
        "Scored drill item"
    );

    ScoreBreakdown {
        total: total as u32,
        base: base as u32,
        time_bonus: time_bonus as u32,
        streak_bonus: streak_bonus as u32,
        streak_multiplier: multiplier,
        penalty,
    }
}
