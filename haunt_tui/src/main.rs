use anyhow::{Context, Result};
use clap::Parser;
use haunt_core::{
    Direction, ItemKind, Position,
    config::GameConfig,
    entity::{Player, Pursuer},
    event::{Cue, Presenter},
    game::{Command, GameLoop, LoopEvent},
    level::{Building, Level, Tile, load_building_from_string},
    session::GameSession,
};
use ratatui::{
    crossterm::{
        self,
        event::{self, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    collections::VecDeque,
    fs::File,
    io::{self, Stdout},
    mem,
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// How often the loop wakes up to advance the timers when no key is pressed.
const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// How long the jump scare stays on screen.
const SCARE_DURATION: Duration = Duration::from_millis(500);
/// Radius, in cells, that stays visible with the flashlight off.
const DARK_RADIUS: usize = 1;
const MESSAGE_HISTORY: usize = 6;

#[derive(Parser, Debug)]
#[command(version, about = "Find the key, open the door, and stay away from the ghost.", long_about = None)]
struct Args {
    /// Map file to load instead of the built-in house
    #[arg(short, long, value_name = "MAP_FILE")]
    map: Option<PathBuf>,

    /// JSON file with game tunables
    #[arg(short, long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Seed for note and scare rolls
    #[arg(short, long)]
    seed: Option<u64>,

    /// Where to write the log
    #[arg(long, value_name = "LOG_FILE", default_value = "haunt.log")]
    log_file: PathBuf,
}

/// Front-end state fed by the game loop.
#[derive(Debug, Default)]
struct TuiPresenter {
    messages: VecDeque<String>,
    inventory: Vec<ItemKind>,
    scare_until: Option<Instant>,
    needs_redraw: bool,
}

impl TuiPresenter {
    fn push_message(&mut self, message: String) {
        if self.messages.len() == MESSAGE_HISTORY {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    fn scaring(&self) -> bool {
        self.scare_until.is_some()
    }

    /// Returns whether the screen should be redrawn, clearing the request.
    /// An expired scare also asks for a redraw.
    fn take_redraw(&mut self) -> bool {
        if let Some(until) = self.scare_until {
            if Instant::now() >= until {
                self.scare_until = None;
                self.needs_redraw = true;
            }
        }
        mem::take(&mut self.needs_redraw)
    }
}

impl Presenter for TuiPresenter {
    fn render_frame(&mut self, _level: &Level, _player: &Player, _pursuer: &Pursuer) {
        // Drawing happens in the terminal loop, which reads the session directly.
        self.needs_redraw = true;
    }

    fn notify(&mut self, message: &str) {
        info!(message, "notify");
        for line in message.lines().filter(|l| !l.is_empty()) {
            self.push_message(line.to_string());
        }
    }

    fn play_cue(&mut self, cue: Cue) {
        info!(?cue, "cue");
        match cue {
            Cue::GhostAwakens => self.push_message("You hear whispers...".to_string()),
            Cue::Scare => self.scare_until = Some(Instant::now() + SCARE_DURATION),
        }
        self.needs_redraw = true;
    }

    fn update_inventory_display(&mut self, items: &[ItemKind]) {
        self.inventory = items.to_vec();
    }
}

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Game(LoopEvent),
    Quit,
}

/// Maps physical keys to actions, once, at the input boundary.
fn key_action(code: KeyCode) -> Option<KeyAction> {
    let movement = |d| Some(KeyAction::Game(LoopEvent::Input(Command::Move(d))));
    match code {
        KeyCode::Up | KeyCode::Char('w') => movement(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') => movement(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') => movement(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') => movement(Direction::Right),
        KeyCode::Char('f') => Some(KeyAction::Game(LoopEvent::Input(
            Command::ToggleFlashlight,
        ))),
        KeyCode::Char('>') => Some(KeyAction::Game(LoopEvent::AdvanceLevel)),
        KeyCode::Char('q') | KeyCode::Esc => Some(KeyAction::Quit),
        _ => None,
    }
}

struct App {
    game: GameLoop<TuiPresenter>,
    /// Flag to control the main loop.
    should_quit: bool,
}

impl App {
    fn new(building: Building, config: GameConfig) -> Result<Self> {
        let session = GameSession::new(building, config).context("invalid game setup")?;
        let mut game = GameLoop::new(session, TuiPresenter::default());
        game.start();
        Ok(App {
            game,
            should_quit: false,
        })
    }

    fn handle_key(&mut self, code: KeyCode) {
        match key_action(code) {
            Some(KeyAction::Game(event)) => {
                self.game.dispatch(event);
            }
            Some(KeyAction::Quit) => self.quit(),
            None => {}
        }
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GameConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let building = match &args.map {
        Some(path) => {
            let map_string = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read map file {}", path.display()))?;
            load_building_from_string(&map_string)
                .with_context(|| format!("Failed to load map file {}", path.display()))?
        }
        None => Building::builtin()?,
    };
    info!(floors = building.floor_count(), ?config, "starting game");

    let mut app = App::new(building, config)?;

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;

    result
}

/// Sends tracing output to a file; the terminal belongs to the UI.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_config(path: &Path) -> Result<GameConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop: redraw when asked, handle at most one event, then feed
/// the elapsed wall-clock time to the game timers.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let mut last_tick = Instant::now();
    let mut force_redraw = true;

    loop {
        if app.game.presenter_mut().take_redraw() || force_redraw {
            terminal.draw(|f| ui(f, app))?;
            force_redraw = false;
        }

        if crossterm::event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key.code),
                Event::Resize(_, _) => force_redraw = true,
                _ => {}
            }
        }

        let now = Instant::now();
        app.game.advance_time(now.duration_since(last_tick));
        last_tick = now;

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Min(9),    // Area for the map
            Constraint::Length(3), // Area for inventory
            Constraint::Length(MESSAGE_HISTORY as u16 + 2),
            Constraint::Length(2), // Area for status/help
        ])
        .split(frame.area());

    let session = app.game.session();
    let presenter = app.game.presenter();

    if presenter.scaring() {
        render_scare(frame, main_layout[0]);
    } else {
        render_map(
            frame,
            main_layout[0],
            session.level(),
            session.current_level(),
            session.player(),
            session.pursuer(),
        );
    }
    render_inventory(frame, main_layout[1], &presenter.inventory);
    render_messages(frame, main_layout[2], &presenter.messages);

    let flashlight = if session.player().flashlight { "on" } else { "off" };
    let help_text = Paragraph::new(format!(
        "Floor {}  Flashlight {}  |  arrows/wasd move, f flashlight, > ascend, q quit",
        session.current_level(),
        flashlight
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[3]);
}

fn render_scare(frame: &mut Frame, area: Rect) {
    let scare = Paragraph::new(Line::from(Span::styled(
        "AHHH!",
        Style::default().fg(Color::Red).bold(),
    )))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(scare, area);
}

/// Renders the collected items.
fn render_inventory(frame: &mut Frame, area: Rect, items: &[ItemKind]) {
    let names: Vec<Span> = items
        .iter()
        .map(|item| match item {
            ItemKind::Key => Span::styled(item.name(), Style::default().fg(Color::Yellow)),
        })
        .collect();
    let inventory_widget = Paragraph::new(Line::from(names))
        .block(Block::default().borders(Borders::ALL).title("Inventory"));
    frame.render_widget(inventory_widget, area);
}

fn render_messages(frame: &mut Frame, area: Rect, messages: &VecDeque<String>) {
    let items: Vec<ListItem> = messages
        .iter()
        .map(|m| ListItem::new(m.as_str()))
        .collect();
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Messages"));
    frame.render_widget(list, area);
}

/// Renders the current floor onto the frame.
fn render_map(
    frame: &mut Frame,
    area: Rect,
    level: &Level,
    level_index: usize,
    player: &Player,
    pursuer: &Pursuer,
) {
    let ghost_visible = pursuer.active && pursuer.level == level_index;
    let mut lines: Vec<Line> = Vec::with_capacity(level.height());

    for (y, row) in level.tiles().rows().enumerate() {
        let mut spans: Vec<Span> = Vec::with_capacity(row.len());
        for (x, tile) in row.iter().enumerate() {
            let pos = Position::new(x, y);
            if pos == player.position {
                spans.push(Span::styled("@", Style::default().fg(Color::Cyan).bold()));
                continue;
            }
            if ghost_visible && pos == pursuer.position {
                spans.push(Span::styled("G", Style::default().fg(Color::Red).bold()));
                continue;
            }
            if !player.flashlight && !within(pos, player.position, DARK_RADIUS) {
                spans.push(Span::raw(" "));
                continue;
            }
            let span = match tile {
                Tile::Empty => Span::raw("."),
                Tile::Wall => Span::styled("#", Style::default().fg(Color::DarkGray)),
                Tile::Door { locked: true } => {
                    Span::styled("|", Style::default().fg(Color::LightRed))
                }
                Tile::Door { locked: false } => Span::raw("+"),
                Tile::Item(ItemKind::Key) => {
                    Span::styled("k", Style::default().fg(Color::Yellow))
                }
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Haunt").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(map_paragraph, area);
}

fn within(a: Position, b: Position, radius: usize) -> bool {
    a.x.abs_diff(b.x) <= radius && a.y.abs_diff(b.y) <= radius
}
