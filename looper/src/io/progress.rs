//! Append-only progress log.
//!
//! The controller never parses this file. It exists for two readers: the
//! operator, and the next provider invocation, which receives a bounded
//! tail of it as prompt context.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

/// Create or reset the progress log with a dated header.
pub fn init_progress(path: &Path) -> Result<()> {
    let header = format!(
        "# Progress Log\nStarted: {}\n---\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(path, header).with_context(|| format!("write progress log {}", path.display()))
}

/// Append a free-text note, creating the file if needed. A trailing newline
/// is added when the note lacks one.
pub fn append_note(path: &Path, note: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open progress log {}", path.display()))?;
    file.write_all(note.as_bytes())
        .with_context(|| format!("append to progress log {}", path.display()))?;
    if !note.ends_with('\n') {
        file.write_all(b"\n")
            .with_context(|| format!("append to progress log {}", path.display()))?;
    }
    Ok(())
}

/// Read at most `max_bytes` from the end of the log for prompt context.
///
/// Returns `None` when the log is missing or effectively empty. A cut that
/// lands inside a multi-byte character is handled by lossy decoding.
pub fn read_tail(path: &Path, max_bytes: usize) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path).with_context(|| format!("read progress log {}", path.display()))?;
    let start = bytes.len().saturating_sub(max_bytes);
    let tail = String::from_utf8_lossy(&bytes[start..])
        .trim()
        .to_string();
    if tail.is_empty() {
        return Ok(None);
    }
    Ok(Some(tail))
}

/// Bounded suffix of a string, cut on a char boundary. Used to keep gate
/// logs from flooding the progress notes.
pub fn tail_str(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut start = text.len() - max_bytes;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_dated_header() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("progress.txt");

        init_progress(&path).expect("init");
        let contents = fs::read_to_string(&path).expect("read");
        assert!(contents.starts_with("# Progress Log\nStarted: "));
        assert!(contents.ends_with("---\n"));
    }

    #[test]
    fn append_creates_file_and_terminates_lines() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("progress.txt");

        append_note(&path, "first").expect("append");
        append_note(&path, "second\n").expect("append");
        let contents = fs::read_to_string(&path).expect("read");
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn tail_is_bounded_and_missing_file_is_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("progress.txt");
        assert!(read_tail(&path, 10).expect("tail").is_none());

        append_note(&path, "0123456789abcdef").expect("append");
        let tail = read_tail(&path, 6).expect("tail").expect("some");
        assert_eq!(tail, "abcdef");
    }

    #[test]
    fn tail_str_respects_char_boundaries() {
        let text = "héllo";
        // A cut inside the two-byte 'é' moves forward to the next boundary.
        assert_eq!(tail_str(text, 5), "éllo");
        assert_eq!(tail_str(text, 4), "llo");
        assert_eq!(tail_str(text, 100), text);
    }
}
