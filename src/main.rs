//! Blocktris: a small Tetris-style falling-block game in the terminal.

mod app;
mod game;
mod input;
mod piece;
mod playfield;
mod scheduler;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;

/// Smallest board that still holds a whole 4x4 piece mask at the spawn column.
pub const MIN_BOARD_CELLS: u16 = 4;

/// Validated settings the game and the shell run with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub title: String,
    pub width: u16,
    pub height: u16,
    pub block_len: u16,
    pub period: Duration,
    pub seed: Option<u64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("board must be at least {min}x{min} cells, got {width}x{height}")]
    BoardTooSmall { width: u16, height: u16, min: u16 },
    #[error("board of {width}x{height} cells at block length {block_len} does not fit a terminal")]
    BoardTooLarge {
        width: u16,
        height: u16,
        block_len: u16,
    },
    #[error("block length must be 1..=4 columns, got {0}")]
    BlockLen(u16),
    #[error("tick period must be at least 1 ms")]
    ZeroPeriod,
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        if args.width < MIN_BOARD_CELLS || args.height < MIN_BOARD_CELLS {
            return Err(ConfigError::BoardTooSmall {
                width: args.width,
                height: args.height,
                min: MIN_BOARD_CELLS,
            });
        }
        if !(1..=4).contains(&args.block_len) {
            return Err(ConfigError::BlockLen(args.block_len));
        }
        // Board plus border and sidebar must be addressable in u16 terminal columns and rows.
        let cols =
            u32::from(args.width) * u32::from(args.block_len) + 2 + u32::from(ui::SIDEBAR_WIDTH);
        let rows = u32::from(args.height) + 2;
        if cols > u32::from(u16::MAX) || rows > u32::from(u16::MAX) {
            return Err(ConfigError::BoardTooLarge {
                width: args.width,
                height: args.height,
                block_len: args.block_len,
            });
        }
        if args.period_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(Self {
            title: args.title.clone(),
            width: args.width,
            height: args.height,
            block_len: args.block_len,
            period: Duration::from_millis(args.period_ms),
            seed: args.seed,
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path, args.log_level)?;
    }
    let config = GameConfig::from_args(&args)?;
    let theme = match theme::Theme::load(args.theme.as_deref(), args.palette) {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "theme not loaded, using classic colours");
            let mut t = theme::Theme::classic();
            t.apply_palette(args.palette);
            t
        }
    };
    info!(?config, "starting");
    let mut app = App::new(config, theme);
    app.run()?;
    info!(score = app.score(), "exited");
    Ok(())
}

/// Logs go to a file: the terminal belongs to the UI.
fn init_logging(path: &Path, level: LogLevel) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_max_level(LevelFilter::from(level))
        .init();
    Ok(())
}

/// Tetris-style falling-block game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blocktris",
    version,
    about = "Tetris-style falling-block game in the terminal. Fill rows to clear them.",
    long_about = "Blocktris drops one of four block shapes at a time onto the board. \
        Steer and turn it while it falls; a full row disappears and scores a point.\n\n\
        CONTROLS:\n  Left/Right or h/l  Move      Up or k   Rotate CW    u  Rotate CCW\n  \
        Down or j          Move down Space     Hard drop    P  Pause\n  \
        R                  Restart after game over          Q / Esc  Quit"
)]
pub struct Args {
    /// Title shown on the board border.
    #[arg(long, default_value = "Tetris")]
    pub title: String,

    /// Board width in cells.
    #[arg(long, default_value = "24", value_name = "COLS")]
    pub width: u16,

    /// Board height in cells.
    #[arg(long, default_value = "32", value_name = "ROWS")]
    pub height: u16,

    /// Terminal columns per cell (1..=4).
    #[arg(long, default_value = "2", value_name = "N")]
    pub block_len: u16,

    /// Tick period in milliseconds: how often the piece falls one row.
    #[arg(long, default_value = "100", value_name = "MS")]
    pub period_ms: u64,

    /// Seed for piece selection; random when omitted.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]="value").
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Piece colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Write logs to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for --log-file.
    #[arg(long, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("blocktris").chain(extra.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let config = GameConfig::from_args(&parse(&[])).unwrap();
        assert_eq!(config.title, "Tetris");
        assert_eq!((config.width, config.height), (24, 32));
        assert_eq!(config.block_len, 2);
        assert_eq!(config.period, Duration::from_millis(100));
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_overrides() {
        let args = parse(&[
            "--title", "Blocks", "--width", "10", "--height", "20", "--period-ms", "250",
            "--seed", "9", "--palette", "contrast",
        ]);
        assert_eq!(args.palette, Palette::HighContrast);
        let config = GameConfig::from_args(&args).unwrap();
        assert_eq!(config.title, "Blocks");
        assert_eq!((config.width, config.height), (10, 20));
        assert_eq!(config.period, Duration::from_millis(250));
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn test_rejects_small_board() {
        let err = GameConfig::from_args(&parse(&["--width", "3"])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::BoardTooSmall {
                width: 3,
                height: 32,
                min: 4
            }
        );
    }

    #[test]
    fn test_rejects_board_wider_than_a_terminal() {
        let err = GameConfig::from_args(&parse(&["--width", "20000", "--block-len", "4"])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::BoardTooLarge {
                width: 20000,
                height: 32,
                block_len: 4
            }
        );
        assert!(matches!(
            GameConfig::from_args(&parse(&["--height", "65535"])),
            Err(ConfigError::BoardTooLarge { .. })
        ));
        // 16000 * 4 + 2 + 24 still fits.
        assert!(GameConfig::from_args(&parse(&["--width", "16000", "--block-len", "4"])).is_ok());
    }

    #[test]
    fn test_rejects_bad_block_len_and_period() {
        assert_eq!(
            GameConfig::from_args(&parse(&["--block-len", "0"])).unwrap_err(),
            ConfigError::BlockLen(0)
        );
        assert_eq!(
            GameConfig::from_args(&parse(&["--period-ms", "0"])).unwrap_err(),
            ConfigError::ZeroPeriod
        );
    }
}
