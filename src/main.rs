use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use printable_map::app::App;
use printable_map::config::Args;
use printable_map::fragment::{History, SessionHistory};
use printable_map::map::Viewport;
use printable_map::printable::PrintableMap;
use printable_map::{report, ui};
use ratatui::DefaultTerminal;
use std::time::Duration;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .format_timestamp(None)
        .init();

    if args.print {
        return print_report(&args);
    }

    // Fetch before taking over the screen so load errors print normally
    let (width, height) = crossterm::terminal::size()?;
    let history = SessionHistory::new(args.view.as_deref());
    let mut app = App::new(width as usize, height as usize, history);
    app.load(&args.source())?;

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &mut app);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result?;
    println!("#{}", app.fragment());
    Ok(())
}

/// Non-interactive mode: fit, filter once, print the sheet
fn print_report(args: &Args) -> Result<()> {
    let mut viewport = Viewport::world(args.width, args.height);
    let mut history = SessionHistory::new(args.view.as_deref());
    let mut map = PrintableMap::<()>::new(None);

    map.load_file(&args.source(), &mut viewport, &history)?;
    map.move_end(&viewport, &mut history);
    report::write_report(&mut std::io::stdout().lock(), &map, history.hash())?;
    Ok(())
}

/// Handle mouse events for panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Scroll wheel zooms towards the mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, &*app))?;

        // ~60fps; an idle poll means the view has settled
        if !event::poll(Duration::from_millis(16))? {
            app.settle();
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                // Pan with hjkl or arrow keys
                KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                // Zoom
                KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                // List selection
                KeyCode::Tab => app.select_next(),
                KeyCode::BackTab => app.select_previous(),

                // Toggles
                KeyCode::Char('n') | KeyCode::Char('N') => app.toggle_numbers(),
                KeyCode::Char('g') | KeyCode::Char('G') => app.toggle_graticule(),
                KeyCode::Char('L') => app.toggle_legend(),

                KeyCode::Char('r') | KeyCode::Char('0') => app.refit(),

                _ => {}
            },
            Event::Mouse(mouse) => handle_mouse(app, mouse),
            Event::Resize(width, height) => app.resize(width as usize, height as usize),
            _ => {}
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
