//! Recover structured messages from esbuild's terminal log output.
//!
//! With `--color=false` esbuild writes diagnostics to stderr as blocks:
//!
//! ```text
//! ✘ [ERROR] Expected "(" but found ";"
//!
//!     <stdin>:1:9:
//!       1 │ function (;
//!         ╵          ^
//!
//!   A note attached to the error.
//!
//! 1 error
//! ```
//!
//! A header line (`✘ [ERROR]`, `X [ERROR]` on terminals without Unicode, or
//! `▲ [WARNING]`) opens a message. Inside the block, a 4-space-indented
//! `file:line:col:` line is a location, `N │ text` is the offending source
//! line, and 2-space-indented text is a note (later locations attach to the
//! most recent note). Any other unindented line (the `1 error` summary)
//! closes the block.

use crate::message::{Location, Message, Note};

/// Messages recovered from one esbuild run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub errors: Vec<Message>,
    pub warnings: Vec<Message>,
}

#[derive(Debug, Clone, Copy)]
enum Severity {
    Error,
    Warning,
}

/// Parse esbuild's stderr into errors and warnings.
///
/// Lines outside any message block are ignored, so unrelated output (a
/// panic trace, a shell warning) yields no messages rather than garbage.
pub fn parse(stderr: &str) -> Diagnostics {
    let mut out = Diagnostics::default();
    let mut current: Option<(Severity, Message)> = None;

    for line in stderr.lines() {
        if let Some((severity, text)) = parse_header(line) {
            push(&mut out, current.take());
            current = Some((severity, header_message(text)));
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some((_, message)) = current.as_mut() else {
            continue;
        };

        if !line.starts_with(' ') {
            push(&mut out, current.take());
            continue;
        }

        if let Some(location) = parse_location(trimmed) {
            match message.notes.last_mut() {
                Some(note) if note.location.is_none() => note.location = Some(location),
                Some(_) => {}
                None if message.location.is_none() => message.location = Some(location),
                None => {}
            }
        } else if let Some(text) = parse_source_line(trimmed) {
            let target = match message.notes.last_mut() {
                Some(note) => note.location.as_mut(),
                None => message.location.as_mut(),
            };
            if let Some(location) = target {
                if location.line_text.is_empty() {
                    location.line_text = text.to_string();
                }
            }
        } else if is_note_line(line) {
            message.notes.push(Note {
                text: trimmed.to_string(),
                location: None,
            });
        }
    }

    push(&mut out, current);
    out
}

fn push(out: &mut Diagnostics, finished: Option<(Severity, Message)>) {
    match finished {
        Some((Severity::Error, message)) => out.errors.push(message),
        Some((Severity::Warning, message)) => out.warnings.push(message),
        None => {}
    }
}

fn parse_header(line: &str) -> Option<(Severity, &str)> {
    if let Some(rest) = line
        .strip_prefix("✘ [ERROR] ")
        .or_else(|| line.strip_prefix("X [ERROR] "))
    {
        return Some((Severity::Error, rest));
    }
    line.strip_prefix("▲ [WARNING] ")
        .map(|rest| (Severity::Warning, rest))
}

/// Split `[plugin name] text [message-id]` into its parts.
fn header_message(text: &str) -> Message {
    let mut message = Message::default();
    let mut text = text.trim();

    if let Some(rest) = text.strip_prefix("[plugin ") {
        if let Some((name, after)) = rest.split_once("] ") {
            message.plugin_name = name.to_string();
            text = after;
        }
    }

    if let Some(body) = text.strip_suffix(']') {
        if let Some((before, id)) = body.rsplit_once(" [") {
            let is_id = !id.is_empty()
                && id
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
            if is_id {
                message.id = id.to_string();
                text = before;
            }
        }
    }

    message.text = text.to_string();
    message
}

/// `path/to/file.ts:12:4:` → location. The path itself may contain colons.
fn parse_location(trimmed: &str) -> Option<Location> {
    let body = trimmed.strip_suffix(':')?;
    let mut parts = body.rsplitn(3, ':');
    let column = parts.next()?.parse::<u32>().ok()?;
    let line = parts.next()?.parse::<u32>().ok()?;
    let file = parts.next().filter(|f| !f.is_empty())?;
    Some(Location::new(file, line, column))
}

/// `12 │ const x = 1` → `const x = 1`.
fn parse_source_line(trimmed: &str) -> Option<&str> {
    let (number, text) = trimmed.split_once('│')?;
    let number = number.trim();
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(text.strip_prefix(' ').unwrap_or(text))
}

/// Notes sit at exactly two spaces of indentation; locations and source
/// excerpts are indented further.
fn is_note_line(line: &str) -> bool {
    line.starts_with("  ") && !line[2..].starts_with(' ')
}
