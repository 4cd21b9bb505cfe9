use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind},
    execute,
    terminal::{self as term, Clear, ClearType},
};
use std::fs::File;
use std::io::{BufWriter, stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{Level, info};

mod canvas;
mod color;
mod config;
mod decompose;
mod effects;
mod error;
mod scene;
mod surface;
mod terminal;
mod text;

use canvas::Canvas;
use color::Rgb;
use config::{Preset, SceneConfig};
use error::Result;
use scene::{Scene, SceneEvent};
use terminal::{Presenter, TerminalGuard};
use text::{BlockFont, FontRasterizer, TextRasterizer};

#[derive(Parser)]
#[command(name = "skyburst")]
#[command(about = "Fireworks, stars and flowers in your terminal; shaped fireworks spell out your text")]
#[command(after_help = "Keys: t/Enter launch text, i edit text, click to launch, q/Esc/Ctrl+C quit")]
struct Cli {
    /// Built-in look
    #[arg(long, value_enum, default_value_t = Preset::Classic)]
    preset: Preset,

    /// TOML scene file, replaces the preset
    #[arg(long)]
    config: Option<PathBuf>,

    /// Text spelled by shaped fireworks
    #[arg(long)]
    text: Option<String>,

    /// TrueType/OpenType font for shaped text (built-in block font otherwise)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Background colour as hex (e.g. --bg-color 1a1b26)
    #[arg(long, value_parser = parse_color)]
    bg_color: Option<Rgb>,

    /// Per-tick chance of an ambient firework
    #[arg(long)]
    spawn_chance: Option<f32>,

    /// Seed for a reproducible show
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file (stdout is the display)
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: Level,
}

fn parse_color(raw: &str) -> std::result::Result<Rgb, String> {
    Rgb::from_hex(raw).ok_or_else(|| format!("invalid hex color `{raw}`, expected RRGGBB"))
}

fn init_logging(cli: &Cli) -> Result<()> {
    let Some(path) = &cli.log_file else {
        return Ok(());
    };
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

// Preset or file, then command-line overrides, then validation.
fn build_config(cli: &Cli) -> Result<SceneConfig> {
    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::preset(cli.preset),
    };
    if let Some(text) = &cli.text {
        config.text.input = text.clone();
    }
    if let Some(bg) = cli.bg_color {
        config.background = bg;
    }
    if let Some(chance) = cli.spawn_chance {
        config.fireworks.spawn_probability = chance;
    }
    config.validate()?;
    Ok(config)
}

#[derive(Default)]
struct Input {
    editing: Option<String>,
}

impl Input {
    // Returns false when the user asked to quit.
    fn on_key(&mut self, key: KeyEvent, scene: &mut Scene) -> bool {
        if key.kind != KeyEventKind::Press {
            return true;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }

        if let Some(buf) = &mut self.editing {
            match key.code {
                KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                    buf.push(c)
                }
                KeyCode::Backspace => {
                    buf.pop();
                }
                KeyCode::Enter => {
                    let text = std::mem::take(buf);
                    self.editing = None;
                    scene.push_event(SceneEvent::SetText(text));
                    scene.push_event(SceneEvent::LaunchText { at: None });
                }
                KeyCode::Esc => self.editing = None,
                _ => {}
            }
            return true;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char('i') => self.editing = Some(scene.text_input().to_string()),
            KeyCode::Char('t') | KeyCode::Enter => scene.push_event(SceneEvent::LaunchText { at: None }),
            _ => {}
        }
        true
    }

    fn status(&self) -> Option<String> {
        self.editing.as_ref().map(|buf| format!(" text> {buf}_"))
    }
}

fn run(config: SceneConfig, rasterizer: Box<dyn TextRasterizer>, rng: fastrand::Rng) -> Result<()> {
    let mut stdout = BufWriter::with_capacity(1024 * 64, stdout());
    let _guard = TerminalGuard::enter(&mut stdout)?;

    let (cols, rows) = term::size()?;
    let mut canvas = Canvas::new(cols as usize, rows as usize * 2);
    let mut presenter = Presenter::new(cols as usize, rows as usize);
    let mut scene = Scene::new(canvas.columns() as f32, canvas.rows() as f32, config, rasterizer, rng);
    let mut input = Input::default();

    const FRAME: Duration = Duration::from_micros(16_667);
    let start = Instant::now();
    let mut next_frame = start;

    loop {
        let timeout = next_frame.saturating_duration_since(Instant::now());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if !input.on_key(key, &mut scene) {
                        break;
                    }
                }
                Event::Mouse(mouse) => {
                    let (x, y) = (mouse.column as f32, mouse.row as f32 * 2.0);
                    match mouse.kind {
                        MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                            scene.push_event(SceneEvent::PointerMoved { x, y })
                        }
                        MouseEventKind::Down(MouseButton::Left) => {
                            scene.push_event(SceneEvent::PointerMoved { x, y });
                            scene.push_event(SceneEvent::Click { x, y });
                        }
                        _ => {}
                    }
                }
                Event::Resize(cols, rows) => {
                    canvas.resize(cols as usize, rows as usize * 2);
                    presenter = Presenter::new(cols as usize, rows as usize);
                    scene.push_event(SceneEvent::Resize {
                        width: canvas.columns() as f32,
                        height: canvas.rows() as f32,
                    });
                    execute!(stdout, Clear(ClearType::All))?;
                }
                _ => {}
            }
            if Instant::now() < next_frame {
                continue;
            }
        }

        let now = Instant::now();
        let timestamp_ms = now.duration_since(start).as_secs_f64() * 1000.0;
        if scene.frame(timestamp_ms, &mut canvas) {
            presenter.present(&canvas, input.status().as_deref(), &mut stdout)?;
        }

        next_frame += FRAME;
        if next_frame < now {
            next_frame = now + FRAME;
        }
    }

    info!(frames = scene.frames(), "exiting");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = build_config(&cli)?;
    let rasterizer: Box<dyn TextRasterizer> = match &cli.font {
        Some(path) => Box::new(FontRasterizer::from_path(path)?),
        None => Box::new(BlockFont),
    };
    let rng = cli.seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
    info!(preset = ?cli.preset, config = ?cli.config, seed = ?cli.seed, "starting");

    run(config, rasterizer, rng)
}
