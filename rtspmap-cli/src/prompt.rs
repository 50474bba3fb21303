//! Interactive prompts: plain lines, credentials, and no-echo passwords.

use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;

/// Camera login used for snapshot and stream URLs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Read one line without its terminator. `None` at end of input.
pub fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}

/// Write `prompt`, then read one line.
pub fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> io::Result<Option<String>> {
    write!(output, "{prompt}")?;
    output.flush()?;
    read_line(input)
}

/// Ask for a username; an empty answer means the camera needs no login.
///
/// The password is only requested when a username was given, through
/// `read_password` so the caller decides how it is read.
pub fn prompt_credentials<R, W, F>(
    input: &mut R,
    output: &mut W,
    read_password: F,
) -> io::Result<Option<Credentials>>
where
    R: BufRead,
    W: Write,
    F: FnOnce(&mut R, &mut W) -> io::Result<String>,
{
    writeln!(output, "\nAuthentication (press ENTER if none is required)")?;
    let username = ask(input, output, "Username: ")?.unwrap_or_default();
    let username = username.trim();
    if username.is_empty() {
        return Ok(None);
    }

    let password = read_password(input, output)?;
    Ok(Some(Credentials {
        username: username.to_string(),
        password,
    }))
}

/// Read a password without echo. Falls back to a plain line read when stdin
/// is not a terminal.
pub fn read_password<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<String> {
    write!(output, "Password: ")?;
    output.flush()?;

    if !io::stdin().is_terminal() {
        return Ok(read_line(input)?.unwrap_or_default());
    }

    let password = {
        let _raw = RawModeGuard::enable()?;
        read_password_raw()?
    };
    writeln!(output)?;
    Ok(password)
}

fn read_password_raw() -> io::Result<String> {
    let mut password = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind == KeyEventKind::Release {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(password),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(io::Error::new(
                    io::ErrorKind::Interrupted,
                    "password entry interrupted",
                ));
            }
            KeyCode::Char(c) => password.push(c),
            KeyCode::Backspace => {
                password.pop();
            }
            _ => {}
        }
    }
}

/// Restores cooked mode on drop, including on early return.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
