//! Terminal rendering of session views.
//!
//! The session only produces a [`View`]; this module owns colours, cursor
//! movement and raw mode.

use crate::session::{
    View, CURSOR_MARKER, ERROR_HINT, ERROR_LABEL, LOADING_TEXT, PROMPT_LABEL, RESULT_HINT,
    RESULT_LABEL,
};
use anyhow::{Context, Result};
use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::style::{Color, Print, Stylize};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::queue;
use std::io::Write;
use tracing::warn;
use unicode_width::UnicodeWidthStr;

const INPUT_COLOR: Color = Color::Rgb { r: 0xFF, g: 0x75, b: 0xB7 };
const SUCCESS_COLOR: Color = Color::Rgb { r: 0x04, g: 0xB5, b: 0x75 };
const ERROR_COLOR: Color = Color::Rgb { r: 0xFF, g: 0x00, b: 0x00 };

/// Used when the terminal size cannot be queried.
const FALLBACK_WIDTH: u16 = 80;

/// Anything that can put a view on screen.
pub trait Renderer {
    fn draw(&mut self, view: &View<'_>) -> Result<()>;
}

/// One screen line: the text as typed and the same text with colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub plain: String,
    pub styled: String,
}

impl Line {
    fn new(plain: String, styled: String) -> Self {
        Self { plain, styled }
    }

    fn unstyled(text: &str) -> Self {
        Self::new(text.to_string(), text.to_string())
    }

    /// Terminal rows this line occupies at the given width.
    pub fn rows(&self, width: u16) -> u16 {
        let width = usize::from(width.max(1));
        let rows = self.plain.width().div_ceil(width).max(1);
        u16::try_from(rows).unwrap_or(u16::MAX)
    }
}

/// Splits a message into printable lines.
///
/// Tabs become spaces and other control characters are dropped, so every
/// character printed advances the cursor by its display width.
fn message_lines(message: &str) -> Vec<String> {
    message
        .split('\n')
        .map(|part| {
            part.chars()
                .filter_map(|c| match c {
                    '\t' => Some(' '),
                    c if c.is_control() => None,
                    c => Some(c),
                })
                .collect()
        })
        .collect()
}

/// Lines for a view, without line terminators.
pub fn styled_lines(view: &View<'_>) -> Vec<Line> {
    match *view {
        View::Prompt { input, show_cursor } => {
            let mut plain = format!("{}{}", PROMPT_LABEL, input);
            let mut styled = format!("{}{}", PROMPT_LABEL, input.with(INPUT_COLOR));
            if show_cursor {
                plain.push_str(CURSOR_MARKER);
                styled.push_str(&CURSOR_MARKER.with(INPUT_COLOR).to_string());
            }
            vec![Line::new(plain, styled)]
        }
        View::Loading => vec![Line::new(
            LOADING_TEXT.to_string(),
            LOADING_TEXT.with(SUCCESS_COLOR).to_string(),
        )],
        View::Generated(command) => {
            let mut lines: Vec<Line> = message_lines(command)
                .into_iter()
                .enumerate()
                .map(|(i, part)| {
                    let label = if i == 0 { RESULT_LABEL } else { "" };
                    let styled = format!("{}{}", label, part.as_str().with(SUCCESS_COLOR).bold());
                    Line::new(format!("{}{}", label, part), styled)
                })
                .collect();
            lines.push(Line::unstyled(RESULT_HINT));
            lines
        }
        View::Failed(message) => {
            let mut lines: Vec<Line> = message_lines(message)
                .into_iter()
                .enumerate()
                .map(|(i, part)| {
                    let label = if i == 0 { ERROR_LABEL } else { "" };
                    let plain = format!("{}{}", label, part);
                    let styled = plain.as_str().with(ERROR_COLOR).to_string();
                    Line::new(plain, styled)
                })
                .collect();
            lines.push(Line::unstyled(ERROR_HINT));
            lines
        }
    }
}

/// Inline renderer redrawing a block of lines in place.
pub struct TerminalUi<W: Write> {
    out: W,
    /// Rows covered by the last frame, counting soft wraps.
    drawn_rows: u16,
    /// Fixed width; `None` queries the terminal on every frame.
    width: Option<u16>,
}

impl<W: Write> TerminalUi<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            drawn_rows: 0,
            width: None,
        }
    }

    /// Creates a renderer for a fixed terminal width (for testing).
    pub fn with_width(out: W, width: u16) -> Self {
        Self {
            out,
            drawn_rows: 0,
            width: Some(width),
        }
    }

    fn width(&self) -> u16 {
        self.width
            .or_else(|| terminal::size().ok().map(|(columns, _)| columns))
            .filter(|columns| *columns > 0)
            .unwrap_or(FALLBACK_WIDTH)
    }

    /// Erases whatever was drawn last.
    pub fn clear(&mut self) -> Result<()> {
        self.queue_clear()?;
        self.drawn_rows = 0;
        self.out.flush()?;
        Ok(())
    }

    fn queue_clear(&mut self) -> Result<()> {
        // The cursor sits on the last row of the previous frame
        if self.drawn_rows > 1 {
            queue!(self.out, MoveUp(self.drawn_rows - 1))?;
        }
        queue!(self.out, MoveToColumn(0), Clear(ClearType::FromCursorDown))?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TerminalUi<W> {
    fn draw(&mut self, view: &View<'_>) -> Result<()> {
        self.queue_clear()?;

        let width = self.width();
        let lines = styled_lines(view);
        let mut rows: u16 = 0;
        for (i, line) in lines.iter().enumerate() {
            // Raw mode does not translate \n into a carriage return
            if i > 0 {
                queue!(self.out, Print("\r\n"))?;
            }
            queue!(self.out, Print(&line.styled))?;
            rows = rows.saturating_add(line.rows(width));
        }
        self.drawn_rows = rows;

        self.out.flush()?;
        Ok(())
    }
}

/// Keeps the terminal in raw mode for as long as it lives.
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enable() -> Result<Self> {
        terminal::enable_raw_mode().context("Failed to enable raw mode")?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("Failed to disable raw mode: {}", e);
        }
    }
}
