mod app;
mod form;
mod list;
mod render;
mod stopwatch;
#[cfg(test)]
mod testing;

use crate::store::Store;
use anyhow::Result;
use app::App;
use chrono::Utc;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};
use tracing::info;

pub use form::{format_local, parse_local};
pub use stopwatch::format_duration;

/// Runs the interactive session until the user quits.
pub fn run<S: Store>(store: S, tick_rate: Duration) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(store, Utc::now());
    info!(tick_ms = tick_rate.as_millis() as u64, "tui started");
    let result = event_loop(&mut app, &mut terminal, tick_rate);
    teardown_terminal(&mut terminal)?;
    info!("tui stopped");
    result
}

fn event_loop<S: Store>(
    app: &mut App<S>,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();
    loop {
        app.refresh_all(Utc::now());
        terminal.draw(|f| render::draw(f, app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key, Utc::now()) {
                    break;
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            app.on_tick(Utc::now());
            last_tick = Instant::now();
        }
    }
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
