use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::rc::Rc;
use std::time::Duration;

use crate::backend::LocalBackend;
use crate::ui::app::{App, InputMode, Screen};
use crate::ui::budget_form::SubmitOutcome;
use crate::ui::commands;
use crate::ui::screens::dashboard::HEADER_HEIGHT;

pub(crate) fn as_tui(backend: Rc<LocalBackend>, tick_rate: Duration) -> Result<()> {
    let mut app = App::new(backend.clone(), backend);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;

    let result = run_app(&mut terminal, &mut app, tick_rate);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        tracing::error!(error = ?e, "terminal loop failed");
        eprintln!("Error: {e:?}");
    }

    result
}

/// Single-threaded loop: drain the session and live query streams, draw,
/// then wait up to one tick for input.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    while app.running {
        app.tick();

        terminal.draw(|f| {
            // title + status + command bars, dashboard header, list borders
            let list_height = f.area().height.saturating_sub(3 + HEADER_HEIGHT + 2) as usize;
            app.visible_rows = list_height.max(1);
            crate::ui::render::render(f, app);
        })?;

        if !event::poll(tick_rate)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.show_help {
                app.show_help = false;
                continue;
            }
            match app.input_mode() {
                InputMode::Normal => handle_normal_input(key, app),
                InputMode::Command => handle_command_input(key, app)?,
                InputMode::Form if app.screen == Screen::Login => handle_login_input(key, app),
                InputMode::Form => handle_budget_form_input(key, app),
            }
        }
    }
    Ok(())
}

fn is_quit(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
}

// ── Input handlers ───────────────────────────────────────────

fn handle_normal_input(key: KeyEvent, app: &mut App) {
    if is_quit(&key) {
        app.running = false;
        return;
    }

    match key.code {
        KeyCode::Char(':') => {
            app.command_active = true;
            app.command_input.clear();
        }
        KeyCode::Char('j') | KeyCode::Down => app.dashboard.move_down(app.visible_rows),
        KeyCode::Char('k') | KeyCode::Up => app.dashboard.move_up(),
        KeyCode::Char('g') | KeyCode::Home => app.dashboard.goto_top(),
        KeyCode::Char('G') | KeyCode::End => app.dashboard.goto_bottom(app.visible_rows),
        KeyCode::Char('a') => app.open_budget_form(),
        KeyCode::Char('O') => app.sign_out(),
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Esc => app.status_message.clear(),
        _ => {}
    }
}

fn handle_command_input(key: KeyEvent, app: &mut App) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.command_active = false;
            app.command_input.clear();
            commands::handle_command(&input, app)?;
        }
        KeyCode::Esc => {
            app.command_active = false;
            app.command_input.clear();
        }
        KeyCode::Backspace => {
            app.command_input.pop();
            if app.command_input.is_empty() {
                app.command_active = false;
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_input.clear();
            app.command_active = false;
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let trimmed = app.command_input.trim_end();
            if let Some(pos) = trimmed.rfind(' ') {
                app.command_input.truncate(pos + 1);
            } else {
                app.command_input.clear();
                app.command_active = false;
            }
        }
        KeyCode::Char(c) => {
            app.command_input.push(c);
        }
        _ => {}
    }
    Ok(())
}

fn handle_login_input(key: KeyEvent, app: &mut App) {
    if is_quit(&key) {
        app.running = false;
        return;
    }

    match key.code {
        KeyCode::Enter => app.submit_login(),
        KeyCode::Tab | KeyCode::BackTab => app.login.next_field(),
        KeyCode::Backspace => app.login.pop_char(),
        KeyCode::Char(c) => app.login.push_char(c),
        _ => {}
    }
}

fn handle_budget_form_input(key: KeyEvent, app: &mut App) {
    if is_quit(&key) {
        app.running = false;
        return;
    }

    match key.code {
        KeyCode::Enter => {
            if app.submit_budget_form() == SubmitOutcome::Busy {
                app.set_status("A budget is already being added");
            }
        }
        KeyCode::Esc => {
            app.dashboard.form.cancel();
        }
        KeyCode::Tab | KeyCode::BackTab => app.dashboard.form.next_field(),
        KeyCode::Backspace => app.dashboard.form.pop_char(),
        KeyCode::Char(c) => app.dashboard.form.push_char(c),
        _ => {}
    }
}
