use crate::canvas::Canvas;
use crossterm::{
    cursor::{Hide, Show},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, Write};

const UNSET: (u8, u8, u8) = (255, 255, 255);

// Turns the canvas into 24-bit ANSI output, two pixels per cell.
pub struct Presenter {
    output_buf: Vec<u8>,
}

impl Presenter {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self { output_buf: Vec::with_capacity(columns * rows * 25) }
    }

    pub fn present<W: Write>(&mut self, canvas: &Canvas, status: Option<&str>, out: &mut W) -> io::Result<()> {
        self.output_buf.clear();
        self.output_buf.extend_from_slice(b"\x1b[H");

        let (width, height) = (canvas.columns(), canvas.rows());
        let mut prev_top = UNSET;
        let mut prev_bot = UNSET;

        for y in (0..height).step_by(2) {
            for x in 0..width {
                let top = canvas.pixel(x, y);
                let bot = canvas.pixel(x, y + 1);
                let (top, bot) = ((top.0, top.1, top.2), (bot.0, bot.1, bot.2));

                if top != prev_top {
                    write!(self.output_buf, "\x1b[48;2;{};{};{}m", top.0, top.1, top.2)?;
                    prev_top = top;
                }
                if bot != prev_bot {
                    write!(self.output_buf, "\x1b[38;2;{};{};{}m", bot.0, bot.1, bot.2)?;
                    prev_bot = bot;
                }
                self.output_buf.extend_from_slice("▄".as_bytes());
            }
            self.output_buf.extend_from_slice(b"\x1b[0m");
            prev_top = UNSET;
            prev_bot = UNSET;
            if y + 2 < height {
                self.output_buf.extend_from_slice(b"\r\n");
            }
        }

        if let Some(status) = status {
            let row = height.div_ceil(2).max(1);
            let line: String = status.chars().take(width).collect();
            write!(self.output_buf, "\x1b[{row};1H\x1b[0m\x1b[7m{line:<width$}\x1b[0m")?;
        }

        out.write_all(&self.output_buf)?;
        out.flush()
    }
}

pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter<W: Write>(out: &mut W) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let guard = TerminalGuard;
        execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All), EnableMouseCapture)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen, DisableMouseCapture);
        let _ = terminal::disable_raw_mode();
    }
}
