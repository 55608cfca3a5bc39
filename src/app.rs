use std::time::Duration;

use crate::collab::Collaborators;
use crate::config::PracticeConfig;
use crate::drill::SessionPlan;
use crate::error::Result;
use crate::report::SessionReport;
use crate::session::{InputOutcome, ItemResult, KeyInput, SessionMachine};
use crate::timer::{AdvanceSignal, PauseTimer};
use crate::types::{CharClass, SessionPhase};
use chrono::Utc;
use ratatui::layout::Alignment;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

/// Terminal front end around one [`SessionMachine`].
pub struct App {
    pub machine: SessionMachine,
    pub should_quit: bool,
    timer: PauseTimer,
    signals: UnboundedReceiver<AdvanceSignal>,
    feedback_pause: Duration,
    show_cn: bool,
    feedback: Option<ItemResult>,
    last_mistake: bool,
    report: Option<SessionReport>,
}

impl App {
    pub fn new(config: &PracticeConfig, plan: SessionPlan, collaborators: Collaborators) -> Result<Self> {
        let machine = SessionMachine::start(plan, collaborators, Utc::now())?;
        let (timer, signals) = PauseTimer::new();
        Ok(Self {
            machine,
            should_quit: false,
            timer,
            signals,
            feedback_pause: config.feedback_pause,
            show_cn: config.show_cn,
            feedback: None,
            last_mistake: false,
            report: None,
        })
    }

    /// Requires a tokio runtime context: completing an item spawns the pause timer.
    pub fn handle_key(&mut self, key: KeyInput) {
        match self.machine.handle_key(key, Utc::now()) {
            InputOutcome::Completed(result) => {
                self.timer.schedule(result.item_index, self.feedback_pause);
                self.feedback = Some(result);
                self.last_mistake = false;
            }
            InputOutcome::Mistake(_) => self.last_mistake = true,
            InputOutcome::Accepted { .. } | InputOutcome::Retreated { .. } => self.last_mistake = false,
            InputOutcome::Ignored => {}
        }
    }

    /// Applies any pause timers that fired since the last tick.
    pub fn on_tick(&mut self) {
        while let Ok(signal) = self.signals.try_recv() {
            let phase = self.machine.on_advance_signal(signal, Utc::now());
            self.feedback = None;
            if phase == SessionPhase::SessionComplete && self.report.is_none() {
                self.report = Some(SessionReport::from_logs(&self.machine.state().word_logs));
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.machine.is_complete()
    }

    pub fn report(&self) -> Option<&SessionReport> {
        self.report.as_ref()
    }

    pub fn quit(&mut self) {
        self.timer.cancel();
        self.should_quit = true;
        debug!(complete = self.is_finished(), "Quit requested");
    }

    pub fn render(&self, f: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(10), // Score / streak
                Constraint::Percentage(40), // Current word or results
                Constraint::Percentage(20), // Feedback
                Constraint::Percentage(20), // Progress
                Constraint::Percentage(10), // Help
            ])
            .split(f.area());

        self.render_status(f, main_chunks[0]);
        match &self.report {
            Some(report) => self.render_results(f, main_chunks[1], report),
            None => self.render_word(f, main_chunks[1]),
        }
        self.render_feedback(f, main_chunks[2]);
        self.render_progress(f, main_chunks[3]);
        self.render_help(f, main_chunks[4]);
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        let state = self.machine.state();
        let streak_style = if state.streak > 1 {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let line = Line::from(vec![
            Span::raw("Score: "),
            Span::styled(state.score.to_string(), Style::default().fg(Color::Cyan)),
            Span::raw("   Streak: "),
            Span::styled(state.streak.to_string(), streak_style),
            Span::raw(format!("   Seed: {}", state.seed % 1_000_000)),
        ]);
        f.render_widget(
            Paragraph::new(line)
                .block(Block::default().borders(Borders::ALL))
                .alignment(Alignment::Center),
            area,
        );
    }

    fn render_word(&self, f: &mut Frame, area: Rect) {
        let state = self.machine.state();
        let mut lines = Vec::new();

        if let Some(item) = self.machine.current_item() {
            let filled = match self.machine.phase() {
                SessionPhase::ItemComplete => item.blank_count(),
                _ => state.current_input_index,
            };
            let word_color = if self.last_mistake { Color::Red } else { Color::Cyan };
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                item.render_progress(filled),
                Style::default().fg(word_color).add_modifier(Modifier::BOLD),
            )));
            if self.show_cn {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    item.word.cn.clone(),
                    Style::default().fg(Color::Gray),
                )));
            }
        }

        f.render_widget(
            Paragraph::new(lines)
                .block(Block::default().title("Spell the missing letters").borders(Borders::ALL))
                .alignment(Alignment::Center),
            area,
        );
    }

    fn render_results(&self, f: &mut Frame, area: Rect, report: &SessionReport) {
        let state = self.machine.state();
        let mut text = vec![
            Line::from(Span::styled(
                format!("Final score: {}", state.score),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!(
                "Perfect: {}  Missed: {}  Best streak: {}",
                state.correct_count, state.wrong_count, state.max_streak
            )),
            Line::from(format!(
                "Accuracy: {:.0}%  Avg time: {:.1}s",
                report.perfect_rate() * 100.0,
                report.avg_secs
            )),
        ];

        let vowels = report.class_errors.get(&CharClass::Vowel).copied().unwrap_or(0);
        let consonants = report.class_errors.get(&CharClass::Consonant).copied().unwrap_or(0);
        text.push(Line::from(format!("Vowel slips: {}  Consonant slips: {}", vowels, consonants)));

        let confusions: Vec<String> = report
            .top_confusions(5)
            .into_iter()
            .map(|((expected, actual), n)| format!("{}→{} ×{}", expected, actual, n))
            .collect();
        if !confusions.is_empty() {
            text.push(Line::from(format!("Mix-ups: {}", confusions.join(", "))));
        }
        if let Some(word) = &report.slowest_word {
            text.push(Line::from(format!("Slowest: {}", word)));
        }

        f.render_widget(
            Paragraph::new(text)
                .block(Block::default().title("Session complete").borders(Borders::ALL))
                .alignment(Alignment::Center),
            area,
        );
    }

    fn render_feedback(&self, f: &mut Frame, area: Rect) {
        let line = match &self.feedback {
            Some(result) => {
                let b = &result.breakdown;
                let mut spans = vec![Span::styled(
                    format!("+{}", b.total),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )];
                if b.time_bonus > 0 {
                    spans.push(Span::raw(format!("  speed +{}", b.time_bonus)));
                }
                if b.streak_multiplier > 1.0 {
                    spans.push(Span::styled(
                        format!("  combo x{:.1}", b.streak_multiplier),
                        Style::default().fg(Color::Yellow),
                    ));
                }
                if b.penalty > 0 {
                    spans.push(Span::styled(
                        format!("  -{}", b.penalty),
                        Style::default().fg(Color::Red),
                    ));
                }
                Line::from(spans)
            }
            None => Line::from(""),
        };
        f.render_widget(
            Paragraph::new(line)
                .block(Block::default().borders(Borders::ALL))
                .alignment(Alignment::Center),
            area,
        );
    }

    fn render_progress(&self, f: &mut Frame, area: Rect) {
        let state = self.machine.state();
        let total = state.items.len().max(1);
        let done = state.word_logs.len();
        let gauge = Gauge::default()
            .block(Block::default().title("Progress").borders(Borders::ALL))
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(done as f64 / total as f64)
            .label(format!("{}/{}", done, state.items.len()));
        f.render_widget(gauge, area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let help_text = if self.report.is_some() {
            "Enter or ESC to quit"
        } else {
            "ESC to quit | Type the missing letters | Backspace to step back"
        };
        f.render_widget(
            Paragraph::new(Line::from(help_text)).block(Block::default().borders(Borders::ALL)),
            area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{SilentSpeech, TracingTelemetry, SessionStore, SessionRecord};
    use crate::drill::plan_session;
    use crate::types::Difficulty;
    use crate::words::{filter_by_groups, load_word_entries, WordGroup};

    struct NullStore;

    impl SessionStore for NullStore {
        fn persist_session(&mut self, _record: &SessionRecord) -> Result<()> {
            Ok(())
        }
    }

    fn app(pause_ms: u64) -> App {
        let words = filter_by_groups(&load_word_entries(), &[WordGroup::Culture]);
        let plan = plan_session(&words[..2], Difficulty::Standard, 77, false).unwrap();
        let config = PracticeConfig {
            feedback_pause: Duration::from_millis(pause_ms),
            ..PracticeConfig::default()
        };
        App::new(&config, plan, Collaborators::new(NullStore, TracingTelemetry, SilentSpeech)).unwrap()
    }

    fn answer_current(app: &mut App) {
        let item = app.machine.current_item().unwrap().clone();
        for pos in 0..item.blank_count() {
            app.handle_key(KeyInput::Char(item.expected_char(pos).unwrap()));
        }
    }

    #[tokio::test]
    async fn pause_then_advance_then_report() {
        let mut app = app(10);
        answer_current(&mut app);
        assert_eq!(app.machine.phase(), SessionPhase::ItemComplete);
        assert!(app.feedback.is_some());

        tokio::time::sleep(Duration::from_millis(60)).await;
        app.on_tick();
        assert_eq!(app.machine.phase(), SessionPhase::AwaitingInput);
        assert!(app.feedback.is_none());

        answer_current(&mut app);
        tokio::time::sleep(Duration::from_millis(60)).await;
        app.on_tick();
        assert!(app.is_finished());
        let report = app.report().unwrap();
        assert_eq!(report.words, 2);
        assert_eq!(report.perfect_words, 2);
    }

    #[tokio::test]
    async fn quitting_cancels_pending_advance() {
        let mut app = app(20);
        answer_current(&mut app);
        app.quit();
        tokio::time::sleep(Duration::from_millis(60)).await;
        app.on_tick();
        assert!(app.should_quit);
        assert_eq!(app.machine.phase(), SessionPhase::ItemComplete);
    }
}
