//! Terminal output: listings, streamed replies and confirmations.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use hey_application::ConvoEntry;

/// When set, final replies are written to this file instead of stdout.
pub const OUT_ENV: &str = "HEY_OUT";

/// Where replies go.
#[derive(Debug, Clone, Default)]
pub struct Output {
    redirect: Option<PathBuf>,
}

impl Output {
    pub fn from_env() -> Self {
        Self {
            redirect: std::env::var_os(OUT_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Whether streamed deltas should be echoed to the terminal.
    pub fn streams_to_terminal(&self) -> bool {
        self.redirect.is_none()
    }

    /// Emits a finished reply. After streaming only the trailing newline is
    /// printed, the text is already on screen.
    pub fn reply(&self, text: &str, streamed: bool) -> Result<()> {
        match &self.redirect {
            Some(path) => fs::write(path, text)
                .with_context(|| format!("Failed to write {}", path.display())),
            None if streamed => {
                println!();
                Ok(())
            }
            None => {
                println!("{text}");
                Ok(())
            }
        }
    }
}

/// Prints one streamed fragment immediately.
pub fn print_delta(delta: &str) {
    let mut stdout = io::stdout().lock();
    let _ = stdout.write_all(delta.as_bytes());
    let _ = stdout.flush();
}

/// `i: title`, plus ` @transcript` when `files` is set.
pub fn entry_line(index: usize, entry: &ConvoEntry, files: bool) -> String {
    let mut line = format!("{index}: {}", entry.display_title());
    if files && let Some(path) = &entry.transcript {
        line.push_str(&format!(" @{}", path.display()));
    }
    line
}

/// Prints a listing with the active conversation in bold.
pub fn print_entries(entries: &[ConvoEntry], files: bool) {
    for (index, entry) in entries.iter().enumerate() {
        let line = entry_line(index, entry, files);
        if entry.active {
            println!("{}", line.bold());
        } else {
            println!("{line}");
        }
    }
}

/// Prints a list of names with `current` in bold.
pub fn print_names(names: &[String], current: &str) {
    for (index, name) in names.iter().enumerate() {
        let line = format!("{index}: {name}");
        if name == current {
            println!("{}", line.bold());
        } else {
            println!("{line}");
        }
    }
}

/// Asks a y/n question on stdin. Anything but `y`/`yes` declines.
pub fn confirm(question: &str) -> bool {
    print!("{question} [y/N] ");
    let _ = io::stdout().flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    is_yes(&answer)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(title: Option<&str>, transcript: Option<&str>) -> ConvoEntry {
        ConvoEntry {
            id: "Ab12Cd34".to_string(),
            title: title.map(str::to_string),
            transcript: transcript.map(PathBuf::from),
            active: false,
            pinned: false,
        }
    }

    #[test]
    fn test_entry_line() {
        let e = entry(Some("Rust lifetimes"), Some("/p/rust_lifetimes.md"));
        assert_eq!(entry_line(0, &e, false), "0: Rust lifetimes");
        assert_eq!(
            entry_line(3, &e, true),
            "3: Rust lifetimes @/p/rust_lifetimes.md"
        );
    }

    #[test]
    fn test_blank_entry_line() {
        let e = entry(None, None);
        assert_eq!(entry_line(1, &e, true), "1: <BLANK>");
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
    }

    #[test]
    fn test_redirected_reply_goes_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.txt");
        let output = Output {
            redirect: Some(path.clone()),
        };
        assert!(!output.streams_to_terminal());
        output.reply("answer", false).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "answer");
    }
}
