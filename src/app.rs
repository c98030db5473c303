//! App: terminal init, main loop, tick and key handling.

use crate::GameConfig;
use crate::game::{GameState, Outcome, RandomSource};
use crate::input::{Action, key_to_action};
use crate::scheduler::TickScheduler;
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::{debug, info};

/// Upper bound on how long one loop iteration blocks on input (~60 FPS redraw).
const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    Paused,
    GameOver,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    state: GameState,
    scheduler: TickScheduler,
    /// Rows to flash after a clear; emptied when the effect finishes.
    flash_rows: Vec<i32>,
    /// TachyonFX fade for cleared rows (created by the renderer on first draw).
    row_flash: Option<Effect>,
    /// Last time the row flash was processed (for delta).
    row_flash_process_time: Option<Instant>,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let state = GameState::new(
            config.width,
            config.height,
            theme.catalog(),
            RandomSource::from_seed(config.seed),
        );
        let scheduler = TickScheduler::new(config.period, Instant::now());
        Self {
            config,
            theme,
            state,
            scheduler,
            flash_rows: Vec::new(),
            row_flash: None,
            row_flash_process_time: None,
        }
    }

    pub fn score(&self) -> u32 {
        self.state.score()
    }

    pub fn screen(&self) -> Screen {
        if self.state.is_game_over() {
            Screen::GameOver
        } else if self.scheduler.is_running() {
            Screen::Playing
        } else {
            Screen::Paused
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            cursor::Show,
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        with_restore(
            || {
                execute!(std::io::stdout(), EnterAlternateScreen)?;
                let mut terminal =
                    DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(std::io::stdout()))?;
                terminal.hide_cursor()?;
                self.run_loop(&mut terminal)
            },
            || {
                execute!(std::io::stdout(), Show, LeaveAlternateScreen)?;
                disable_raw_mode()?;
                Ok(())
            },
        )
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        // A fresh scheduler so time spent setting up the terminal is not counted.
        self.scheduler = TickScheduler::new(self.config.period, Instant::now());
        loop {
            let now = Instant::now();
            let screen = self.screen();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    &crate::ui::View {
                        title: &self.config.title,
                        block_len: self.config.block_len,
                        theme: &self.theme,
                        state: &self.state,
                        screen,
                        period: self.scheduler.period(),
                        flash_rows: &self.flash_rows,
                    },
                    &mut self.row_flash,
                    &mut self.row_flash_process_time,
                    now,
                )
            })?;

            if self.row_flash.as_ref().is_some_and(Effect::done) {
                self.clear_flash();
            }

            let timeout = self
                .scheduler
                .time_until_due(Instant::now())
                .map_or(FRAME, |d| d.min(FRAME));
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        // Only presses; repeats and releases would double-step the piece.
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if !self.handle_action(key_to_action(key), Instant::now()) {
                            info!(score = self.state.score(), "quit");
                            return Ok(());
                        }
                    }
                }
            }

            if self.scheduler.poll(Instant::now()) {
                let outcome = self.state.tick();
                self.after_outcome(&outcome);
            }
        }
    }

    /// Apply one input action. Returns false when the player quits.
    pub fn handle_action(&mut self, action: Action, now: Instant) -> bool {
        let screen = self.screen();
        let outcome = match (screen, action) {
            (_, Action::Quit) => return false,
            (_, Action::None) => return true,
            (Screen::GameOver, Action::Restart) => {
                self.state.restart();
                self.clear_flash();
                self.scheduler.resume(now);
                return true;
            }
            (Screen::Playing | Screen::Paused, Action::Pause) => {
                let running = self.scheduler.toggle(now);
                info!(paused = !running, "pause toggled");
                return true;
            }
            (Screen::Playing, Action::MoveLeft) => self.state.move_left(),
            (Screen::Playing, Action::MoveRight) => self.state.move_right(),
            (Screen::Playing, Action::MoveDown) => self.state.move_down(),
            (Screen::Playing, Action::RotateCw) => self.state.rotate_cw(),
            (Screen::Playing, Action::RotateCcw) => self.state.rotate_ccw(),
            (Screen::Playing, Action::HardDrop) => self.state.hard_drop(),
            _ => return true,
        };
        debug!(?action, ?outcome, "input");
        self.after_outcome(&outcome);
        true
    }

    fn after_outcome(&mut self, outcome: &Outcome) {
        let Outcome::Landed { game_over, .. } = outcome else {
            return;
        };
        debug!(
            next = ?self.state.current_piece(),
            settled = self.state.playfield.len(),
            "landed"
        );
        let cleared = self.state.take_cleared_rows();
        if !cleared.is_empty() {
            // Restart the flash so it covers every row cleared so far.
            self.flash_rows.extend(cleared);
            self.row_flash = None;
            self.row_flash_process_time = None;
        }
        if *game_over {
            self.scheduler.pause();
            info!(score = self.state.score(), "game over");
        }
    }

    fn clear_flash(&mut self) {
        self.flash_rows.clear();
        self.row_flash = None;
        self.row_flash_process_time = None;
    }
}

/// Run `body`, then `restore` no matter how `body` ended. A `body` error takes precedence.
fn with_restore<T>(
    body: impl FnOnce() -> Result<T>,
    restore: impl FnOnce() -> Result<()>,
) -> Result<T> {
    let result = body();
    let restored = restore();
    let value = result?;
    restored?;
    Ok(value)
}
