mod shared;
mod tui;
mod audio_api;
mod audio;
mod middle;
mod pipeline;
mod wave;

use std::path::{Path, PathBuf};
use std::time::Instant;
use crossterm::{event, terminal};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use audio_api::AudioCommand;
use middle::Middle;
use pipeline::persistence;
use pipeline::project::SessionState;
use shared::InputEvent;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let project_dir: PathBuf = match args.next() {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let seed = args.next().map(PathBuf::from);

    init_logging(&project_dir);

    let config = persistence::load_config(&project_dir);
    let session = persistence::load_session(&project_dir)
        .unwrap_or_else(|| SessionState::for_config(&config));
    log::info!(
        "loop: {} samples at {} Hz, amplitude {}",
        config.buffer_len(),
        config.sample_rate,
        config.amplitude
    );

    let mut middle = Middle::new(config.clone(), session, &project_dir);
    if let Some(path) = &seed {
        middle.load_seed(path);
    }

    let audio = audio::start_audio(config.sample_rate);
    middle.set_audio_live(audio.device_rate().is_some());
    audio.publish(middle.samples());
    middle.take_dirty();
    audio.send(AudioCommand::SetPlaying(middle.is_playing()));

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope
    crossterm::execute!(
        std::io::stdout(),
        terminal::EnterAlternateScreen,
        event::EnableMouseCapture
    )?;

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = std::time::Duration::from_millis(16); // ~60fps
    let mut last_tick = Instant::now();
    let mut tui_state = tui::mode::TuiState::default();

    loop {
        let ds = middle.display_state();
        let playhead = audio.playhead();
        term.draw(|frame| {
            let area = frame.area();
            tui::view::render(frame, area, &ds, middle.samples(), playhead, &mut tui_state);
        })?;

        let events = tui::input::poll_input(tick_rate, &mut tui_state)?;
        for event in events {
            if event == InputEvent::Quit {
                save_on_quit(&project_dir, &middle.session);
                return Ok(());
            }
            for cmd in middle.handle_input(event) {
                audio.send(cmd);
            }
        }

        // edits reach the audio thread as a whole new snapshot
        if middle.take_dirty() {
            audio.publish(middle.samples());
        }

        let elapsed = last_tick.elapsed().as_secs_f64();
        last_tick = Instant::now();
        middle.tick(elapsed);
    }
}

// The terminal belongs to the TUI, so logs go to a file under the project dir
fn init_logging(project_dir: &Path) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    let path = persistence::log_file_path(project_dir);
    let file = path
        .parent()
        .map(std::fs::create_dir_all)
        .transpose()
        .and_then(|_| std::fs::OpenOptions::new().create(true).append(true).open(&path));
    match file {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("cannot open log file {}: {e}, logging to stderr", path.display());
            builder.target(env_logger::Target::Stderr);
        }
    }
    builder.init();
}

fn save_on_quit(project_dir: &Path, session: &SessionState) {
    match persistence::save_session(project_dir, session) {
        Ok(()) => log::info!("session saved"),
        Err(e) => log::error!("failed to save session: {e:#}"),
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(
            std::io::stdout(),
            event::DisableMouseCapture,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}
