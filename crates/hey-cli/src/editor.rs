//! Prompt entry through an external editor.

use std::fs;
use std::process::Command;

use anyhow::{Context, Result, bail};

/// Opens `initial` in `editor` and returns the saved text, trimmed.
/// Returns `None` when the result is empty.
///
/// The editor command is split on whitespace, so `code --wait` works.
pub fn edit(editor: &str, initial: &str) -> Result<Option<String>> {
    let file = tempfile::Builder::new()
        .prefix("hey_")
        .suffix(".md")
        .tempfile()
        .context("Failed to create prompt file")?;
    fs::write(file.path(), initial).context("Failed to write prompt file")?;

    let mut parts = editor.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("No editor configured");
    };
    let status = Command::new(program)
        .args(parts)
        .arg(file.path())
        .status()
        .with_context(|| format!("Failed to launch editor '{editor}'"))?;
    if !status.success() {
        bail!("Editor exited with {status}");
    }

    let text = fs::read_to_string(file.path()).context("Failed to read prompt file")?;
    Ok(non_empty(&text))
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
