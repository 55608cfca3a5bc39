use std::collections::HashMap;

use crate::types::{CharClass, WordLog};

/// Summary of one finished session, built from its word logs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionReport {
    pub words: usize,
    pub perfect_words: usize,
    pub total_mistakes: u32,
    pub total_secs: f64,
    pub avg_secs: f64,
    /// `(expected, actual)` -> occurrences.
    pub confused_pairs: HashMap<(char, char), u32>,
    pub class_errors: HashMap<CharClass, u32>,
    pub slowest_word: Option<String>,
}

impl SessionReport {
    pub fn from_logs(logs: &[WordLog]) -> Self {
        let mut report = SessionReport {
            words: logs.len(),
            ..Default::default()
        };

        let mut slowest: Option<&WordLog> = None;
        for log in logs {
            report.total_secs += log.duration_secs;
            report.total_mistakes += log.mistakes_count;
            if log.mistakes_count == 0 {
                report.perfect_words += 1;
            }
            for m in &log.mistake_details {
                let expected = m.expected.to_ascii_lowercase();
                let actual = m.actual.to_ascii_lowercase();
                *report.confused_pairs.entry((expected, actual)).or_insert(0) += 1;
                *report.class_errors.entry(m.char_class).or_insert(0) += 1;
            }
            if slowest.map_or(true, |s| log.duration_secs > s.duration_secs) {
                slowest = Some(log);
            }
        }

        if !logs.is_empty() {
            report.avg_secs = report.total_secs / logs.len() as f64;
        }
        report.slowest_word = slowest.map(|l| l.en.clone());
        report
    }

    pub fn perfect_rate(&self) -> f64 {
        if self.words == 0 {
            return 0.0;
        }
        self.perfect_words as f64 / self.words as f64
    }

    /// Most frequent confusions first, ties by expected letter.
    pub fn top_confusions(&self, n: usize) -> Vec<((char, char), u32)> {
        let mut pairs: Vec<((char, char), u32)> =
            self.confused_pairs.iter().map(|(k, v)| (*k, *v)).collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        pairs.truncate(n);
        pairs
    }
}
