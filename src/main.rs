use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::{Hide, Show},
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
        KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::fs::File;
use std::io::{BufWriter, Stdout, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

mod color;
mod config;
mod geometry;
mod pointer;
mod scene;
mod surface;

use config::Config;
use pointer::PointerTracker;
use scene::{Cue, Scene};
use surface::terminal::TerminalSurface;

const FIXED_DT: f32 = 1.0 / 60.0;

/// Ember particles, circuit traces and click bursts rendered in the terminal.
///
/// Move the mouse to push embers away. Click, Space or Enter fires a burst.
/// Press 'q', ESC, or Ctrl+C to exit.
#[derive(Parser, Debug)]
#[command(name = "circuitglow", version)]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for a reproducible animation
    #[arg(long)]
    seed: Option<u64>,

    /// Background color as hex, e.g. 1a1b26
    #[arg(long, value_name = "RRGGBB", value_parser = hex_color)]
    bg_color: Option<String>,

    /// Logical units per terminal pixel
    #[arg(long)]
    scale: Option<f32>,

    /// Maximum number of live burst particles
    #[arg(long)]
    burst_cap: Option<usize>,

    /// Write logs to this file (filtered by RUST_LOG, default info)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Ring the terminal bell on every burst
    #[arg(long)]
    bell: bool,
}

fn hex_color(s: &str) -> Result<String, String> {
    color::parse_hex_color(s)
        .map(|_| s.trim_start_matches('#').to_string())
        .ok_or_else(|| format!("invalid hex color '{s}', expected RRGGBB (e.g. 1a1b26)"))
}

fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path).with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => {
            let (config, err) = Config::load_or_default(path);
            if let Some(err) = err {
                log::warn!("{}: {err}; using defaults", path.display());
            }
            config
        }
        None => Config::default(),
    };

    if let Some(bg) = &cli.bg_color {
        config.display.bg_color = bg.clone();
    }
    if let Some(scale) = cli.scale {
        config.display.scale = scale;
    }
    if let Some(cap) = cli.burst_cap {
        config.burst.cap = Some(cap);
    }
    if cli.bell {
        config.display.bell = true;
    }

    for warning in config.validate() {
        log::warn!("config: {warning}");
    }
    config.display.reset_unusable();
    config
}

/// Raw mode plus alternate screen, restored when dropped.
struct TerminalGuard {
    out: BufWriter<Stdout>,
}

impl TerminalGuard {
    fn acquire() -> Result<Self> {
        terminal::enable_raw_mode().context("cannot enable raw mode")?;
        let mut guard = Self {
            out: BufWriter::with_capacity(1024 * 64, stdout()),
        };
        execute!(
            guard.out,
            EnterAlternateScreen,
            Hide,
            Clear(ClearType::All),
            EnableMouseCapture,
            EnableFocusChange
        )
        .context("cannot switch to the alternate screen")?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(
            self.out,
            DisableFocusChange,
            DisableMouseCapture,
            Show,
            LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

fn is_quit(code: KeyCode, modifiers: KeyModifiers) -> bool {
    code == KeyCode::Char('q')
        || code == KeyCode::Esc
        || (code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL))
}

fn handle_cues(scene: &mut Scene, bell: bool, out: &mut impl Write) -> std::io::Result<()> {
    for cue in scene.drain_cues() {
        match cue {
            Cue::Burst { spawned, live, .. } => {
                log::debug!("cue: burst spawned={spawned} live={live}");
                if bell && spawned > 0 {
                    out.write_all(b"\x07")?;
                }
            }
        }
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli);
    let rng = match cli.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };

    let mut term = TerminalGuard::acquire().context("failed to acquire the terminal")?;
    let (cols, rows) = terminal::size().context("failed to query the terminal size")?;

    let mut surface = TerminalSurface::new(cols, rows, config.display.scale, config.display.background());
    let mut scene = Scene::initialize(&config, surface.viewport(), rng);
    let mut pointer = PointerTracker::new(config.display.pointer_timeout);

    let mut last_frame = Instant::now();
    let mut accumulator = 0.0f32;

    while scene.is_running() {
        if event::poll(Duration::from_millis(1))? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if is_quit(key.code, key.modifiers) {
                        scene.stop();
                        break;
                    }
                    if matches!(key.code, KeyCode::Char(' ') | KeyCode::Enter) {
                        scene.trigger();
                    }
                }
                Event::Resize(cols, rows) => {
                    surface.resize(cols, rows);
                    scene.resize(surface.viewport());
                    execute!(term.out, Clear(ClearType::All))?;
                }
                Event::Mouse(MouseEvent { kind, column, row, .. }) => match kind {
                    MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                        pointer.seen(surface.cell_to_logical(column, row));
                    }
                    MouseEventKind::Down(MouseButton::Left) => {
                        pointer.seen(surface.cell_to_logical(column, row));
                        scene.trigger();
                    }
                    _ => {}
                },
                Event::FocusLost => pointer.lost(),
                _ => {}
            }
        }

        handle_cues(&mut scene, config.display.bell, &mut term.out)?;

        let now = Instant::now();
        let elapsed = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        if pointer.advance(elapsed) {
            log::debug!("pointer idle, treating it as absent");
        }
        scene.set_pointer(pointer.current());

        accumulator += elapsed;
        if accumulator > FIXED_DT * 3.0 {
            accumulator = FIXED_DT * 3.0;
        }

        while accumulator >= FIXED_DT {
            scene.frame(&mut surface);
            accumulator -= FIXED_DT;
        }

        surface.present(&mut term.out)?;
    }

    log::info!(
        "exiting after {} frames: particles={} emitters={} bursts={}",
        scene.context().tick,
        scene.particle_count(),
        scene.emitter_count(),
        scene.burst_count()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    run(&cli).inspect_err(|e| log::error!("fatal: {e:#}"))
}
