use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use spelling_practice::app::App;
use spelling_practice::collab::{Collaborators, JsonSessionStore, SilentSpeech, TracingTelemetry};
use spelling_practice::config::PracticeConfig;
use spelling_practice::drill::plan_session;
use spelling_practice::error::{DrillError, Result};
use spelling_practice::session::KeyInput;
use spelling_practice::words::{filter_by_groups, load_word_entries};
use std::env;
use std::{
    io,
    time::{Duration, Instant},
};

use tracing::{debug, error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

fn setup_logging() -> Result<()> {
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "spelling_practice.log");

    // RUST_LOG wins; otherwise debug builds log at debug, release at info.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .try_init()
        .map_err(|e| DrillError::Terminal(e.to_string()))?;

    info!("Logging system initialized");
    debug!("Debug logging {}", if cfg!(debug_assertions) { "enabled" } else { "disabled" });

    Ok(())
}

fn main() -> Result<()> {
    setup_logging()?;
    info!("Starting spelling practice");

    let config = PracticeConfig::from_args(env::args().skip(1))?;
    let words = filter_by_groups(&load_word_entries(), &config.groups);
    let plan = plan_session(&words, config.difficulty, config.session_seed(), config.shuffle)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()?;
    let _guard = runtime.enter();

    let collaborators = Collaborators::new(
        JsonSessionStore::with_path(&config.history_path),
        TracingTelemetry,
        SilentSpeech,
    );
    let mut app = App::new(&config, plan, collaborators)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(50);
    let res = run_app(&mut terminal, &mut app, tick_rate);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if !app.is_finished() {
        let state = app.machine.abandon();
        info!(score = state.score, done = state.word_logs.len(), "Session left unfinished");
    }

    if let Err(err) = res {
        error!("Application error: {}", err);
        println!("Error: {}", err);
    }

    info!("Application terminated");
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| app.render(f))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                let modified = key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER);
                if key.kind == KeyEventKind::Press && !modified {
                    match key.code {
                        KeyCode::Char(c) => app.handle_key(KeyInput::Char(c)),
                        KeyCode::Backspace => app.handle_key(KeyInput::Backspace),
                        KeyCode::Enter if app.is_finished() => app.quit(),
                        KeyCode::Esc => app.quit(),
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
