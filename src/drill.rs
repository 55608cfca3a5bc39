//! Drill item generation.
//!
//! Given a word and a seeded [`DrillRng`], picks the target token (longest
//! token, ties broken by the RNG) and the character positions to hide.
//! The RNG call order is part of the contract: printed sheets and online
//! sessions built from the same seed must agree letter for letter.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DrillError, Result};
use crate::rng::DrillRng;
use crate::types::{Difficulty, DrillItem};
use crate::words::WordEntry;

/// Fisher-Yates shuffle, last index down to 1, partner drawn from `[0, i]`.
pub fn shuffle<T>(items: &mut [T], rng: &mut DrillRng) {
    for i in (1..items.len()).rev() {
        let j = rng.next_index(i + 1);
        items.swap(i, j);
    }
}

pub fn generate(word: &WordEntry, rng: &mut DrillRng, difficulty: Difficulty) -> Result<DrillItem> {
    let tokens: Vec<&str> = word.en.split(' ').collect();

    let max_len = tokens.iter().map(|t| t.chars().count()).max().unwrap_or(0);
    if max_len == 0 {
        return Err(DrillError::EmptyWord { id: word.id });
    }
    let ties: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.chars().count() == max_len)
        .map(|(i, _)| i)
        .collect();

    // Always drawn, even without a tie.
    let target_token_index = ties[rng.next_index(ties.len())];
    let target_token = tokens[target_token_index];
    let len = max_len;

    let max_blanks = len.saturating_sub(difficulty.min_visible()).max(1);
    let blank_count = (2 + rng.next_index(2)).min(max_blanks);

    // Only letters can be typed back, so hyphens and apostrophes stay visible.
    let start = if difficulty.keeps_first_letter() { 1 } else { 0 };
    let mut pool: Vec<usize> = target_token
        .chars()
        .enumerate()
        .skip(start)
        .filter(|(_, c)| c.is_ascii_alphabetic())
        .map(|(i, _)| i)
        .collect();
    if pool.is_empty() {
        return Err(DrillError::NoBlankablePosition {
            id: word.id,
            token: target_token.to_string(),
        });
    }
    shuffle(&mut pool, rng);

    let mut blank_indices: Vec<usize> = pool.into_iter().take(blank_count).collect();
    blank_indices.sort_unstable();

    let masked: String = target_token
        .chars()
        .enumerate()
        .map(|(i, c)| if blank_indices.contains(&i) { '_' } else { c })
        .collect();
    let display_text = tokens
        .iter()
        .enumerate()
        .map(|(i, t)| if i == target_token_index { masked.as_str() } else { *t })
        .collect::<Vec<&str>>()
        .join(" ");

    debug!(
        word_id = word.id,
        token = target_token,
        blank_count = blank_indices.len(),
        %difficulty,
        "Generated drill item"
    );

    Ok(DrillItem {
        word: word.clone(),
        target_token_index,
        target_token: target_token.to_string(),
        blank_indices,
        display_text,
    })
}

/// Items for one run, reproducible from `seed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPlan {
    pub seed: u64,
    pub difficulty: Difficulty,
    pub items: Vec<DrillItem>,
}

/// Shuffles (optionally) and generates every word from one RNG seeded with `seed`.
pub fn plan_session(
    words: &[WordEntry],
    difficulty: Difficulty,
    seed: u64,
    shuffle_words: bool,
) -> Result<SessionPlan> {
    if words.is_empty() {
        return Err(DrillError::NoWords);
    }

    let mut rng = DrillRng::new(seed);
    let mut ordered = words.to_vec();
    if shuffle_words {
        shuffle(&mut ordered, &mut rng);
    }

    let items = ordered
        .iter()
        .map(|w| generate(w, &mut rng, difficulty))
        .collect::<Result<Vec<_>>>()?;

    Ok(SessionPlan {
        seed,
        difficulty,
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::words::{load_word_entries, WordGroup};

    fn word(id: u32, en: &str) -> WordEntry {
        WordEntry {
            id,
            group: WordGroup::Ket,
            en: en.to_string(),
            cn: String::new(),
        }
    }

    fn check_invariants(item: &DrillItem, difficulty: Difficulty) {
        let len = item.target_len();
        let upper = len.saturating_sub(difficulty.min_visible()).max(1);
        assert!(!item.blank_indices.is_empty());
        assert!(item.blank_indices.len() <= upper, "{:?}", item);
        assert!(item.blank_indices.windows(2).all(|w| w[0] < w[1]));
        assert!(item.blank_indices.iter().all(|&i| i < len));
        if difficulty == Difficulty::Standard {
            assert!(!item.blank_indices.contains(&0));
        }
    }

    #[test]
    fn blanks_respect_invariants_across_seeds() {
        let words = load_word_entries();
        for seed in 0..200_u64 {
            let mut rng = DrillRng::new(seed * 7919);
            for w in &words {
                for difficulty in [Difficulty::Standard, Difficulty::Challenge] {
                    let item = generate(w, &mut rng, difficulty).unwrap();
                    check_invariants(&item, difficulty);
                }
            }
        }
    }

    #[test]
    fn same_seed_same_item() {
        let w = word(1, "practice the piano");
        let a = generate(&w, &mut DrillRng::new(99), Difficulty::Challenge).unwrap();
        let b = generate(&w, &mut DrillRng::new(99), Difficulty::Challenge).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn longest_token_is_target() {
        let w = word(2, "take out the trash");
        let item = generate(&w, &mut DrillRng::new(5), Difficulty::Standard).unwrap();
        assert_eq!(item.target_token, "trash");
        assert_eq!(item.target_token_index, 3);
    }

    #[test]
    fn ties_pick_among_longest_only() {
        let w = word(3, "get dressed to eat cereal");
        let mut seen = std::collections::HashSet::new();
        for seed in 0..100 {
            let item = generate(&w, &mut DrillRng::new(seed), Difficulty::Standard).unwrap();
            assert_eq!(item.target_len(), 7);
            seen.insert(item.target_token);
        }
        assert_eq!(seen.len(), 1);

        let tie = word(4, "red hot sun");
        let mut picked = std::collections::HashSet::new();
        for seed in 0..200 {
            let item = generate(&tie, &mut DrillRng::new(seed), Difficulty::Challenge).unwrap();
            picked.insert(item.target_token_index);
        }
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn display_text_masks_only_target() {
        let w = word(5, "police officer");
        let item = generate(&w, &mut DrillRng::new(11), Difficulty::Standard).unwrap();
        let tokens: Vec<&str> = item.display_text.split(' ').collect();
        assert_eq!(tokens[0], "police");
        let masked: Vec<char> = tokens[1].chars().collect();
        for (i, c) in "officer".chars().enumerate() {
            if item.blank_indices.contains(&i) {
                assert_eq!(masked[i], '_');
            } else {
                assert_eq!(masked[i], c);
            }
        }
    }

    #[test]
    fn two_letter_challenge_gets_one_blank() {
        let w = word(6, "go");
        for seed in 0..50 {
            let item = generate(&w, &mut DrillRng::new(seed), Difficulty::Challenge).unwrap();
            assert_eq!(item.blank_indices.len(), 1);
        }
    }

    #[test]
    fn empty_word_fails_fast() {
        let err = generate(&word(7, ""), &mut DrillRng::new(1), Difficulty::Standard).unwrap_err();
        assert!(matches!(err, DrillError::EmptyWord { id: 7 }));
    }

    #[test]
    fn single_letter_standard_has_nothing_to_blank() {
        let err = generate(&word(8, "a"), &mut DrillRng::new(1), Difficulty::Standard).unwrap_err();
        assert!(matches!(err, DrillError::NoBlankablePosition { id: 8, .. }));
        let item = generate(&word(8, "a"), &mut DrillRng::new(1), Difficulty::Challenge).unwrap();
        assert_eq!(item.blank_indices, vec![0]);
    }

    #[test]
    fn punctuation_is_never_blanked() {
        let w = word(9, "t-shirt");
        for seed in 0..200 {
            for difficulty in [Difficulty::Standard, Difficulty::Challenge] {
                let item = generate(&w, &mut DrillRng::new(seed), difficulty).unwrap();
                assert!(!item.blank_indices.contains(&1), "{:?}", item);
                assert!((0..item.blank_count())
                    .all(|p| item.expected_char(p).is_some_and(|c| c.is_ascii_alphabetic())));
            }
        }
        let err = generate(&word(10, "a-"), &mut DrillRng::new(1), Difficulty::Standard).unwrap_err();
        assert!(matches!(err, DrillError::NoBlankablePosition { id: 10, .. }));
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut values: Vec<u32> = (0..20).collect();
        shuffle(&mut values, &mut DrillRng::new(123));
        let mut sorted = values.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<u32>>());
    }

    #[test]
    fn plan_is_reproducible_from_seed() {
        let words = load_word_entries();
        let a = plan_session(&words, Difficulty::Standard, 1_700_000_000_000, true).unwrap();
        let b = plan_session(&words, Difficulty::Standard, 1_700_000_000_000, true).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.items.len(), words.len());
    }

    #[test]
    fn unshuffled_plan_keeps_catalog_order() {
        let words = load_word_entries();
        let plan = plan_session(&words, Difficulty::Challenge, 4, false).unwrap();
        let ids: Vec<u32> = plan.items.iter().map(|i| i.word.id).collect();
        assert_eq!(ids, (1..=30).collect::<Vec<u32>>());
    }

    #[test]
    fn empty_plan_is_rejected() {
        assert!(matches!(
            plan_session(&[], Difficulty::Standard, 1, true),
            Err(DrillError::NoWords)
        ));
    }
}
