//! Layout and drawing: board, falling piece, sidebar, pause and game-over overlays, row flash.

use crate::app::Screen;
use crate::game::GameState;
use crate::piece::Block as PieceBlock;
use crate::playfield::Cell;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

pub const SIDEBAR_WIDTH: u16 = 24;

/// Duration of the cleared-row flash (TachyonFX fade back to the board colours).
const ROW_FLASH_MS: u32 = 300;

/// Everything the renderer reads. Never mutated here.
pub struct View<'a, S> {
    pub title: &'a str,
    pub block_len: u16,
    pub theme: &'a Theme,
    pub state: &'a GameState<S>,
    pub screen: Screen,
    pub period: Duration,
    pub flash_rows: &'a [i32],
}

/// Board size in terminal cells, border included.
fn board_outer_size<S>(view: &View<'_, S>) -> (u16, u16) {
    let pf = &view.state.playfield;
    let w = (pf.width as u16).saturating_mul(view.block_len);
    let h = pf.height as u16;
    (w.saturating_add(2), h.saturating_add(2))
}

/// Board and sidebar rects centred in `area`, or `None` if they do not fit.
fn game_rects<S>(view: &View<'_, S>, area: Rect) -> Option<(Rect, Rect)> {
    let (bw, bh) = board_outer_size(view);
    let total_w = bw.saturating_add(SIDEBAR_WIDTH);
    if area.width < total_w || area.height < bh {
        return None;
    }
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(bw),
            Constraint::Length(SIDEBAR_WIDTH),
            Constraint::Fill(1),
        ])
        .split(area);
    let centre = |r: Rect| {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(bh),
                Constraint::Fill(1),
            ])
            .split(r)[1]
    };
    Some((centre(horiz[1]), centre(horiz[2])))
}

/// Draw the current screen. When rows were just cleared, creates or advances the
/// row flash in `row_flash` / `row_flash_process_time`.
pub fn draw<S>(
    frame: &mut Frame,
    view: &View<'_, S>,
    row_flash: &mut Option<Effect>,
    row_flash_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let area = frame.area();
    let Some((board_area, sidebar_area)) = game_rects(view, area) else {
        draw_too_small(frame, view, area);
        return;
    };

    let board_inner = draw_board(frame, view, board_area);
    draw_sidebar(frame, view, sidebar_area);

    if !view.flash_rows.is_empty() {
        apply_row_flash(
            frame,
            view,
            board_inner,
            row_flash,
            row_flash_process_time,
            now,
        );
    }

    match view.screen {
        Screen::Playing => {}
        Screen::Paused => draw_pause_overlay(frame, view.theme, board_area),
        Screen::GameOver => draw_game_over(frame, view, board_area),
    }
}

fn draw_too_small<S>(frame: &mut Frame, view: &View<'_, S>, area: Rect) {
    let (bw, bh) = board_outer_size(view);
    let lines = vec![
        Line::from(Span::styled(
            " Terminal too small ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(format!(
            " need {}x{}, have {}x{} ",
            bw.saturating_add(SIDEBAR_WIDTH),
            bh,
            area.width,
            area.height
        )),
        Line::from(" Q — Quit "),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(area, frame.buffer_mut());
}

/// Border, empty board, landscape, then the falling piece on top. Returns the inner rect.
fn draw_board<S>(frame: &mut Frame, view: &View<'_, S>, area: Rect) -> Rect {
    let theme = view.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .style(Style::default().bg(theme.bg))
        .title(Span::styled(
            format!(" {} ", view.title),
            Style::default().fg(theme.title),
        ));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let state = view.state;
    let buf = frame.buffer_mut();
    for (cell, b) in state.playfield.landscape() {
        draw_cell(buf, inner, view.block_len, cell, b);
    }
    let piece_block = state.catalog.block(state.piece.shape);
    for cell in state.piece.cells() {
        if state.playfield.in_bounds(cell) {
            draw_cell(buf, inner, view.block_len, cell, piece_block);
        }
    }
    inner
}

/// One grid cell: pen brackets on the fill colour, `block_len` columns wide.
fn draw_cell(buf: &mut Buffer, board: Rect, block_len: u16, cell: Cell, block: PieceBlock) {
    let x0 = board.x + cell.x as u16 * block_len;
    let y = board.y + cell.y as u16;
    if y >= board.y + board.height {
        return;
    }
    let style = Style::default().fg(block.pen).bg(block.fill);
    for dx in 0..block_len {
        let x = x0 + dx;
        if x >= board.x + board.width {
            break;
        }
        let symbol = match (block_len, dx) {
            (1, _) => "▪",
            (_, 0) => "[",
            (n, d) if d == n - 1 => "]",
            _ => " ",
        };
        buf[(x, y)].set_symbol(symbol).set_style(style);
    }
}

/// Buffer positions covered by the given board rows.
fn row_positions(board: Rect, rows: &[i32]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &row in rows {
        let y = board.y + row as u16;
        if y >= board.y + board.height {
            continue;
        }
        for x in board.x..board.x + board.width {
            set.insert((x, y));
        }
    }
    set
}

/// Create or advance the cleared-row flash: the rows start in the title colour and fade
/// back to whatever is drawn there now.
fn apply_row_flash<S>(
    frame: &mut Frame,
    view: &View<'_, S>,
    board: Rect,
    row_flash: &mut Option<Effect>,
    row_flash_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = row_flash_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *row_flash_process_time = Some(now);

    if row_flash.is_none() {
        let rows = row_positions(board, view.flash_rows);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            rows.contains(&(pos.x, pos.y))
        }));
        let flash = view.theme.title;
        let effect = fx::fade_from(flash, flash, (ROW_FLASH_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board);
        *row_flash = Some(effect);
    }

    if let Some(effect) = row_flash {
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_sidebar<S>(frame: &mut Frame, view: &View<'_, S>, area: Rect) {
    let theme = view.theme;
    let title_style = Style::default()
        .fg(theme.title)
        .add_modifier(Modifier::BOLD);
    let fg_style = Style::default().fg(theme.main_fg);
    let hint_style = Style::default().fg(theme.inactive_fg);
    let state = view.state;

    let status = match view.screen {
        Screen::Playing => "Running",
        Screen::Paused => "Paused",
        Screen::GameOver => "Game over",
    };
    let stat = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, fg_style),
        ])
    };
    let mut lines = vec![
        stat("Score: ", state.score().to_string()),
        stat(
            "Board: ",
            format!("{}x{}", state.playfield.width, state.playfield.height),
        ),
        stat("Tick: ", format!("{} ms", view.period.as_millis())),
        stat("State: ", status.to_string()),
        Line::from(""),
    ];
    for hint in [
        "←/→ h/l  Move",
        "↑ k      Rotate",
        "u        Rotate back",
        "↓ j      Down",
        "Space    Drop",
        "P        Pause",
        "R        Restart",
        "Q/Esc    Quit",
    ] {
        lines.push(Line::from(Span::styled(hint, hint_style)));
    }

    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .style(Style::default().bg(theme.bg)),
        )
        .render(area, frame.buffer_mut());
}

/// Small centred popup inside `area`.
fn popup_rect(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = popup_rect(area, 24, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(Span::styled(
            " P — Resume  Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .style(Style::default().bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_game_over<S>(frame: &mut Frame, view: &View<'_, S>, area: Rect) {
    let theme = view.theme;
    let popup = popup_rect(area, 24, 7);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", view.state.score()),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            " R — Restart  Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .style(Style::default().bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}
