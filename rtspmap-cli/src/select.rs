use std::io::{self, BufRead, Write};

use rtspmap_types::StreamHit;
use thiserror::Error;

use crate::prompt;

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("no streams to choose from")]
    NoStreams,
    #[error("input closed before a stream was selected")]
    InputClosed,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Numbered listing, one `[i] host:port/path` line per hit.
pub fn render_hits(hits: &[StreamHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| format!("[{i}] {hit}\n"))
        .collect()
}

/// Accepts only a plain non-negative decimal index below `len`.
fn parse_choice(line: &str, len: usize) -> Option<usize> {
    let line = line.trim();
    if line.is_empty() || !line.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    line.parse::<usize>().ok().filter(|&i| i < len)
}

/// List `hits` and read indices until a valid one is entered.
pub fn choose_stream<'a, R: BufRead, W: Write>(
    hits: &'a [StreamHit],
    input: &mut R,
    output: &mut W,
) -> Result<&'a StreamHit, SelectError> {
    if hits.is_empty() {
        return Err(SelectError::NoStreams);
    }

    write!(output, "\nStreams found:\n\n{}", render_hits(hits))?;
    loop {
        let Some(line) = prompt::ask(input, output, "\nSelect stream: ")? else {
            return Err(SelectError::InputClosed);
        };
        match parse_choice(&line, hits.len()) {
            Some(index) => return Ok(&hits[index]),
            None => writeln!(output, "enter a number between 0 and {}", hits.len() - 1)?,
        }
    }
}
