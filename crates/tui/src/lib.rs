//! Terminal live playground for HTML, CSS and JavaScript
//!
//! Provides a split-pane terminal interface with:
//! - Three editor panels, one per language, with syntax highlighting
//! - Dividers that can be dragged with the mouse or nudged from the keyboard
//! - A preview rebuilt shortly after typing stops, written to a sandboxed page

pub mod app;
pub mod keys;
pub mod ui;

use crossterm::{
    event::{
        DisableBracketedPaste, DisableFocusChange, DisableMouseCapture, EnableBracketedPaste,
        EnableFocusChange, EnableMouseCapture,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, stdout};
use std::time::Instant;

/// Run the playground until the user quits, then save what is pending
pub fn run(app: app::App) -> Result<(), String> {
    // Setup terminal
    enable_raw_mode().map_err(|e| format!("Failed to enable raw mode: {}", e))?;
    let mut stdout = stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange,
        EnableBracketedPaste
    )
    .map_err(|e| format!("Failed to enter alternate screen: {}", e))?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal =
        Terminal::new(backend).map_err(|e| format!("Failed to create terminal: {}", e))?;

    let mut app = app;
    let result = run_app(&mut terminal, &mut app);
    let saved = app.shutdown();

    // Restore terminal
    let _ = disable_raw_mode();
    let _ = execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableMouseCapture,
        DisableFocusChange,
        LeaveAlternateScreen
    );
    let _ = terminal.show_cursor();

    result.map_err(|e| format!("Application error: {}", e))?;
    saved
}

/// Internal run loop (specialized for CrosstermBackend)
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut app::App,
) -> io::Result<()> {
    use crossterm::event;

    loop {
        terminal.draw(|frame| app.render(frame))?;

        // Wake up in time for the next debounced write or preview
        if event::poll(app.poll_timeout(Instant::now()))? {
            let event = event::read()?;
            app.handle_event(event, Instant::now());
        }

        app.tick(Instant::now());

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
