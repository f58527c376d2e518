//! Text protocol: initialization framing and batch mode.
//!
//! The driver reads physical lines from its input. The first significant
//! line must select a mode:
//!
//! - `B width height players areas` — batch mode; acknowledged with
//!   `OK <line>` on stdout
//! - `I width height players areas` — interactive mode; no acknowledgment
//!
//! Batch mode then executes one command per line:
//!
//! - `m player x y` — ordinary move, prints `1` or `0`
//! - `g player x y` — golden move, prints `1` or `0`
//! - `b player` — occupied-cell count
//! - `f player` — free-cell count
//! - `q player` — golden move still possible, prints `1` or `0`
//! - `p` — the rendered board
//!
//! Blank lines and lines starting with `#` are skipped everywhere. Every
//! other malformed line — unknown command byte, wrong argument count,
//! non-digit or out-of-range numerals, a final line with no terminating
//! newline — yields `ERROR <line>` on stderr, where `<line>` counts every
//! physical line from the start of the input.

use std::io::{self, BufRead, Write};

use crate::game::Game;

/// Token separators within a line; the newline split happens first.
const SEPARATORS: &[char] = &[' ', '\t', '\x0B', '\x0C', '\r'];

/// How the session ended.
pub enum Session {
    /// Input exhausted: either batch mode ran to EOF, or no mode line was
    /// ever accepted.
    Finished,
    /// An `I` line was accepted; the caller owns the game and the terminal.
    Interactive(Game),
}

/// Classification of one initialization line.
#[derive(Debug, PartialEq, Eq)]
enum InitLine {
    Skip,
    Malformed,
    Start { interactive: bool, params: [u32; 4] },
}

/// Classification of one batch line.
#[derive(Debug, PartialEq, Eq)]
enum BatchLine {
    Skip,
    Malformed,
    Cmd(Command),
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Move { player: u32, x: u32, y: u32 },
    GoldenMove { player: u32, x: u32, y: u32 },
    BusyFields { player: u32 },
    FreeFields { player: u32 },
    GoldenPossible { player: u32 },
    Board,
}

/// Runs the initialization scan and, for a `B` line, batch mode to EOF.
///
/// Interactive mode needs the real terminal, so an accepted `I` line hands
/// the game back to the caller instead.
pub fn run_session<R, O, E>(mut input: R, mut out: O, mut err: E) -> io::Result<Session>
where
    R: BufRead,
    O: Write,
    E: Write,
{
    let mut line_no: u32 = 0;
    let mut buf = Vec::new();
    loop {
        let Some(terminated) = read_raw_line(&mut input, &mut buf)? else {
            return Ok(Session::Finished);
        };
        line_no += 1;
        let line = String::from_utf8_lossy(&buf);
        match parse_init_line(&line, terminated) {
            InitLine::Skip => {}
            InitLine::Malformed => print_error(&mut err, line_no)?,
            InitLine::Start {
                interactive,
                params: [width, height, players, areas],
            } => match Game::new(width, height, players, areas) {
                Err(_) => print_error(&mut err, line_no)?,
                Ok(mut game) => {
                    if interactive {
                        return Ok(Session::Interactive(game));
                    }
                    writeln!(out, "OK {}", line_no)?;
                    out.flush()?;
                    run_batch(&mut game, &mut input, &mut out, &mut err, line_no)?;
                    return Ok(Session::Finished);
                }
            },
        }
    }
}

/// Executes batch commands until EOF. `start_line` is the line number of
/// the `B` line; numbering continues from it.
fn run_batch<R, O, E>(
    game: &mut Game,
    input: &mut R,
    out: &mut O,
    err: &mut E,
    start_line: u32,
) -> io::Result<()>
where
    R: BufRead,
    O: Write,
    E: Write,
{
    let mut line_no = start_line;
    let mut buf = Vec::new();
    while let Some(terminated) = read_raw_line(input, &mut buf)? {
        line_no += 1;
        let line = String::from_utf8_lossy(&buf);
        match parse_batch_line(&line, terminated) {
            BatchLine::Skip => {}
            BatchLine::Malformed => print_error(err, line_no)?,
            BatchLine::Cmd(cmd) => execute(game, cmd, line_no, out, err)?,
        }
    }
    out.flush()?;
    err.flush()
}

fn execute<O, E>(
    game: &mut Game,
    cmd: Command,
    line_no: u32,
    out: &mut O,
    err: &mut E,
) -> io::Result<()>
where
    O: Write,
    E: Write,
{
    match cmd {
        Command::Move { player, x, y } => {
            writeln!(out, "{}", u8::from(game.make_move(player, x, y)))
        }
        Command::GoldenMove { player, x, y } => {
            writeln!(out, "{}", u8::from(game.golden_move(player, x, y)))
        }
        Command::BusyFields { player } => writeln!(out, "{}", game.busy_fields(player)),
        Command::FreeFields { player } => writeln!(out, "{}", game.free_fields(player)),
        Command::GoldenPossible { player } => {
            writeln!(out, "{}", u8::from(game.golden_possible(player)))
        }
        Command::Board => match game.board() {
            Some(board) => out.write_all(board.as_bytes()),
            None => print_error(err, line_no),
        },
    }
}

/// Reads one physical line into `buf`, stripping the terminator.
///
/// Returns `None` at EOF with no bytes read, otherwise whether the line was
/// newline-terminated — an unterminated final line is a protocol error for
/// everything but blanks and comments.
fn read_raw_line<R: BufRead>(input: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<bool>> {
    buf.clear();
    if input.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    let terminated = buf.last() == Some(&b'\n');
    if terminated {
        buf.pop();
    }
    Ok(Some(terminated))
}

fn print_error<E: Write>(err: &mut E, line_no: u32) -> io::Result<()> {
    writeln!(err, "ERROR {}", line_no)?;
    err.flush()
}

/// Validates a decimal protocol token: ASCII digits only, value at most
/// 2^32 - 1. Leading zeros are accepted, signs are not.
fn parse_field(token: &str) -> Option<u32> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u64 = token.parse().ok()?;
    u32::try_from(value).ok()
}

fn parse_init_line(line: &str, terminated: bool) -> InitLine {
    if line.is_empty() {
        return InitLine::Skip;
    }
    if !terminated {
        return InitLine::Malformed;
    }
    if line.starts_with('#') {
        return InitLine::Skip;
    }
    let interactive = match line.as_bytes()[0] {
        b'B' => false,
        b'I' => true,
        _ => return InitLine::Malformed,
    };
    let mut tokens = line.split(SEPARATORS).filter(|t| !t.is_empty());
    // The mode letter must stand alone as the first token.
    match tokens.next() {
        Some(mode) if mode.len() == 1 => {}
        _ => return InitLine::Malformed,
    }
    let mut params = [0u32; 4];
    for slot in &mut params {
        match tokens.next().and_then(parse_field) {
            Some(value) if value > 0 => *slot = value,
            _ => return InitLine::Malformed,
        }
    }
    if tokens.next().is_some() {
        return InitLine::Malformed;
    }
    InitLine::Start {
        interactive,
        params,
    }
}

fn parse_batch_line(line: &str, terminated: bool) -> BatchLine {
    if line.is_empty() || line.starts_with('#') {
        return BatchLine::Skip;
    }
    if !terminated {
        return BatchLine::Malformed;
    }
    let letter = line.as_bytes()[0];
    if !matches!(letter, b'm' | b'g' | b'b' | b'f' | b'q' | b'p') {
        return BatchLine::Malformed;
    }
    let mut tokens = line.split(SEPARATORS).filter(|t| !t.is_empty());
    match tokens.next() {
        Some(cmd) if cmd.len() == 1 && cmd.as_bytes()[0] == letter => {}
        _ => return BatchLine::Malformed,
    }
    let argc = match letter {
        b'm' | b'g' => 3,
        b'p' => 0,
        _ => 1,
    };
    let mut args = [0u32; 3];
    for slot in &mut args[..argc] {
        match tokens.next().and_then(parse_field) {
            Some(value) => *slot = value,
            None => return BatchLine::Malformed,
        }
    }
    if tokens.next().is_some() {
        return BatchLine::Malformed;
    }
    let [a, b, c] = args;
    BatchLine::Cmd(match letter {
        b'm' => Command::Move { player: a, x: b, y: c },
        b'g' => Command::GoldenMove { player: a, x: b, y: c },
        b'b' => Command::BusyFields { player: a },
        b'f' => Command::FreeFields { player: a },
        b'q' => Command::GoldenPossible { player: a },
        _ => Command::Board,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_digits_only() {
        assert_eq!(parse_field("0"), Some(0));
        assert_eq!(parse_field("42"), Some(42));
        assert_eq!(parse_field("007"), Some(7));
        assert_eq!(parse_field("4294967295"), Some(u32::MAX));
        assert_eq!(parse_field("4294967296"), None);
        assert_eq!(parse_field("99999999999999999999"), None);
        assert_eq!(parse_field(""), None);
        assert_eq!(parse_field("+3"), None);
        assert_eq!(parse_field("-3"), None);
        assert_eq!(parse_field("12a"), None);
    }

    #[test]
    fn test_init_line_modes() {
        assert_eq!(
            parse_init_line("B 4 2 2 3", true),
            InitLine::Start {
                interactive: false,
                params: [4, 2, 2, 3]
            }
        );
        assert_eq!(
            parse_init_line("I 1 1 1 1", true),
            InitLine::Start {
                interactive: true,
                params: [1, 1, 1, 1]
            }
        );
    }

    #[test]
    fn test_init_line_separators() {
        assert_eq!(
            parse_init_line("B\t10  20\r 3\x0b4", true),
            InitLine::Start {
                interactive: false,
                params: [10, 20, 3, 4]
            }
        );
    }

    #[test]
    fn test_init_line_skips_blank_and_comment() {
        assert_eq!(parse_init_line("", true), InitLine::Skip);
        assert_eq!(parse_init_line("# B 1 1 1 1", true), InitLine::Skip);
    }

    #[test]
    fn test_init_line_malformed() {
        assert_eq!(parse_init_line("B 0 2 2 2", true), InitLine::Malformed);
        assert_eq!(parse_init_line("B 2 2 2", true), InitLine::Malformed);
        assert_eq!(parse_init_line("B 2 2 2 2 2", true), InitLine::Malformed);
        assert_eq!(parse_init_line("b 2 2 2 2", true), InitLine::Malformed);
        assert_eq!(parse_init_line(" B 2 2 2 2", true), InitLine::Malformed);
        assert_eq!(parse_init_line("Bx 2 2 2 2", true), InitLine::Malformed);
        assert_eq!(parse_init_line("B 2 2 2 x", true), InitLine::Malformed);
        assert_eq!(parse_init_line("B 4294967296 2 2 2", true), InitLine::Malformed);
        // A final line without its newline is malformed, comments included.
        assert_eq!(parse_init_line("B 2 2 2 2", false), InitLine::Malformed);
        assert_eq!(parse_init_line("# note", false), InitLine::Malformed);
    }

    #[test]
    fn test_batch_line_commands() {
        assert_eq!(
            parse_batch_line("m 1 2 3", true),
            BatchLine::Cmd(Command::Move { player: 1, x: 2, y: 3 })
        );
        assert_eq!(
            parse_batch_line("g 2 0 0", true),
            BatchLine::Cmd(Command::GoldenMove { player: 2, x: 0, y: 0 })
        );
        assert_eq!(
            parse_batch_line("b 7", true),
            BatchLine::Cmd(Command::BusyFields { player: 7 })
        );
        assert_eq!(
            parse_batch_line("f 1", true),
            BatchLine::Cmd(Command::FreeFields { player: 1 })
        );
        assert_eq!(
            parse_batch_line("q 1", true),
            BatchLine::Cmd(Command::GoldenPossible { player: 1 })
        );
        assert_eq!(parse_batch_line("p", true), BatchLine::Cmd(Command::Board));
        assert_eq!(parse_batch_line("p ", true), BatchLine::Cmd(Command::Board));
    }

    #[test]
    fn test_batch_line_skips_blank_and_comment() {
        assert_eq!(parse_batch_line("", true), BatchLine::Skip);
        assert_eq!(parse_batch_line("# m 1 1 1", true), BatchLine::Skip);
        // Comments are skipped even on an unterminated final line.
        assert_eq!(parse_batch_line("# note", false), BatchLine::Skip);
    }

    #[test]
    fn test_batch_line_malformed() {
        assert_eq!(parse_batch_line("x 1 1 1", true), BatchLine::Malformed);
        assert_eq!(parse_batch_line("m 1 1", true), BatchLine::Malformed);
        assert_eq!(parse_batch_line("m 1 1 1 1", true), BatchLine::Malformed);
        assert_eq!(parse_batch_line("p 1", true), BatchLine::Malformed);
        assert_eq!(parse_batch_line("b", true), BatchLine::Malformed);
        assert_eq!(parse_batch_line("mm 1 1 1", true), BatchLine::Malformed);
        assert_eq!(parse_batch_line(" m 1 1 1", true), BatchLine::Malformed);
        assert_eq!(parse_batch_line("m 1 1 -1", true), BatchLine::Malformed);
        assert_eq!(parse_batch_line("m 1 1 1", false), BatchLine::Malformed);
        assert_eq!(parse_batch_line("B 1 1 1 1", true), BatchLine::Malformed);
    }

    #[test]
    fn test_session_acknowledges_batch_mode() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let session = run_session("B 3 3 2 2\n".as_bytes(), &mut out, &mut err).unwrap();
        assert!(matches!(session, Session::Finished));
        assert_eq!(String::from_utf8(out).unwrap(), "OK 1\n");
        assert!(err.is_empty());
    }

    #[test]
    fn test_session_interactive_returns_game() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let session = run_session("I 5 4 3 2\n".as_bytes(), &mut out, &mut err).unwrap();
        let Session::Interactive(game) = session else {
            panic!("expected an interactive session");
        };
        assert_eq!(game.width(), 5);
        assert_eq!(game.height(), 4);
        assert_eq!(game.players(), 3);
        assert!(out.is_empty());
        assert!(err.is_empty());
    }

    #[test]
    fn test_session_reports_bad_init_lines() {
        let input = "nonsense\nB 0 1 1 1\n\n# fine\nB 2 2 1 1\nm 1 0 0\n";
        let mut out = Vec::new();
        let mut err = Vec::new();
        run_session(input.as_bytes(), &mut out, &mut err).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "OK 5\n1\n");
        assert_eq!(String::from_utf8(err).unwrap(), "ERROR 1\nERROR 2\n");
    }

    #[test]
    fn test_session_eof_without_mode_line() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let session = run_session("# only comments\n\n".as_bytes(), &mut out, &mut err).unwrap();
        assert!(matches!(session, Session::Finished));
        assert!(out.is_empty());
        assert!(err.is_empty());
    }
}
