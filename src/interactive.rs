//! Interactive terminal mode.
//!
//! Raw-mode, cursor-driven play: the board is drawn once, players take
//! turns moving a cursor over it with the arrow keys. Space attempts an
//! ordinary move, `g` a golden move, `c` forfeits the turn, Ctrl-D ends the
//! game. Players with no free fields and no golden move are skipped; the
//! game ends when nobody can act. All UI state lives in the [`Ui`] context
//! struct so nothing about the terminal is process-wide.

use std::io::{self, Write};

use anyhow::{Context, Result, anyhow};
use termion::event::Key;
use termion::input::TermRead;
use termion::raw::IntoRawMode;
use termion::{clear, color, cursor};

use crate::game::Game;
use crate::render::digit_count;

/// Outcome of one player's turn.
enum Turn {
    Played,
    Skipped,
    Quit,
}

/// Interactive session context: the game plus cursor and layout caches.
struct Ui<W: Write> {
    game: Game,
    out: W,
    /// Cursor position in board coordinates.
    cur_x: u32,
    cur_y: u32,
    /// Rendered width of one cell column, separator included.
    cell_width: u16,
}

/// Runs the interactive mode until the game ends or input is lost.
///
/// A board that does not fit the terminal is reported and the game never
/// starts. Losing the input stream mid-game is an error; the caller turns
/// it into exit code 1.
pub fn run(game: Game) -> Result<()> {
    let (cols, rows) = termion::terminal_size().context("query terminal size")?;
    let cell_width = if game.players() <= 9 {
        1
    } else {
        digit_count(game.players()) as u16 + 1
    };
    let board_cols = u64::from(game.width()) * u64::from(cell_width);
    if board_cols > u64::from(cols) || u64::from(game.height()) + 1 >= u64::from(rows) {
        println!("Board does not fit the terminal.");
        return Ok(());
    }
    let out = io::stdout()
        .into_raw_mode()
        .context("switch terminal to raw mode")?;
    let cur_y = game.height() - 1;
    let ui = Ui {
        game,
        out,
        cur_x: 0,
        cur_y,
        cell_width,
    };
    ui.run_game()
}

impl<W: Write> Ui<W> {
    fn run_game(mut self) -> Result<()> {
        let mut keys = io::stdin().keys();
        self.draw_board()?;
        'game: while self.someone_can_act() {
            for player in 1..=self.game.players() {
                if self.game.free_fields(player) == 0 && !self.game.golden_possible(player) {
                    continue;
                }
                if let Turn::Quit = self.take_turn(player, &mut keys)? {
                    break 'game;
                }
                if !self.someone_can_act() {
                    break 'game;
                }
            }
        }
        self.finish()
    }

    /// Lets `player` act: the key loop runs until a move lands, the turn is
    /// forfeited, or the game is ended.
    fn take_turn(
        &mut self,
        player: u32,
        keys: &mut termion::input::Keys<io::Stdin>,
    ) -> Result<Turn> {
        self.draw_status(player)?;
        self.place_cursor()?;
        loop {
            let key = keys
                .next()
                .ok_or_else(|| anyhow!("input stream closed"))?
                .context("read key")?;
            match key {
                Key::Left => self.cur_x = self.cur_x.saturating_sub(1),
                Key::Right => {
                    if self.cur_x + 1 < self.game.width() {
                        self.cur_x += 1;
                    }
                }
                Key::Up => {
                    if self.cur_y + 1 < self.game.height() {
                        self.cur_y += 1;
                    }
                }
                Key::Down => self.cur_y = self.cur_y.saturating_sub(1),
                Key::Char(' ') => {
                    if self.game.make_move(player, self.cur_x, self.cur_y) {
                        self.draw_board()?;
                        return Ok(Turn::Played);
                    }
                }
                Key::Char('g' | 'G') => {
                    if self.game.golden_move(player, self.cur_x, self.cur_y) {
                        self.draw_board()?;
                        return Ok(Turn::Played);
                    }
                }
                Key::Char('c' | 'C') => return Ok(Turn::Skipped),
                Key::Ctrl('d') => return Ok(Turn::Quit),
                _ => {}
            }
            self.place_cursor()?;
        }
    }

    fn someone_can_act(&mut self) -> bool {
        (1..=self.game.players())
            .any(|p| self.game.free_fields(p) > 0 || self.game.golden_possible(p))
    }

    fn draw_board(&mut self) -> Result<()> {
        let board = self
            .game
            .board()
            .ok_or_else(|| anyhow!("board rendering failed"))?;
        write!(self.out, "{}", clear::All)?;
        for (row, line) in board.lines().enumerate() {
            write!(self.out, "{}{}", cursor::Goto(1, row as u16 + 1), line)?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn draw_status(&mut self, player: u32) -> Result<()> {
        let row = self.game.height() as u16 + 1;
        write!(
            self.out,
            "{}{}PLAYER {} Busy fields: {} Free fields: {}",
            cursor::Goto(1, row),
            clear::CurrentLine,
            player,
            self.game.busy_fields(player),
            self.game.free_fields(player),
        )?;
        if self.game.golden_possible(player) {
            write!(
                self.out,
                "{} Golden move possible{}",
                color::Fg(color::Yellow),
                color::Fg(color::Reset),
            )?;
        } else {
            write!(
                self.out,
                "{} Golden move not possible{}",
                color::Fg(color::Red),
                color::Fg(color::Reset),
            )?;
        }
        self.out.flush()?;
        Ok(())
    }

    /// Puts the terminal cursor over the board cell the logical cursor
    /// points at. The board is drawn flipped, so row 1 is y = height - 1.
    fn place_cursor(&mut self) -> Result<()> {
        let col = self.cur_x as u16 * self.cell_width + 1;
        let row = (self.game.height() - self.cur_y) as u16;
        write!(self.out, "{}", cursor::Goto(col, row))?;
        self.out.flush()?;
        Ok(())
    }

    /// Final screen: the board and each player's score.
    fn finish(mut self) -> Result<()> {
        let board = self
            .game
            .board()
            .ok_or_else(|| anyhow!("board rendering failed"))?;
        write!(self.out, "{}{}", clear::All, cursor::Goto(1, 1))?;
        for line in board.lines() {
            write!(self.out, "{}\r\n", line)?;
        }
        for player in 1..=self.game.players() {
            write!(
                self.out,
                "{}PLAYER {} {}Fields: {}{}{}\r\n",
                color::Fg(color::Cyan),
                player,
                color::Fg(color::Reset),
                color::Fg(color::Green),
                self.game.busy_fields(player),
                color::Fg(color::Reset),
            )?;
        }
        self.out.flush()?;
        Ok(())
    }
}
