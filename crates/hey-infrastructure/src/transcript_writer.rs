//! Transcript files: choosing a free path and rewriting the contents.

use hey_core::context::Context;
use hey_core::error::{HeyError, Result};
use hey_core::slug::SLUG_SEPARATOR;
use hey_core::transcript;
use std::fs;
use std::path::{Path, PathBuf};

/// First unused path for `slug` in `dir`: `{slug}.md`, then `{slug}_0.md`,
/// `{slug}_1.md`, ... A trailing separator on the slug is not doubled at the
/// join; separators inside the slug are kept.
pub fn mk_prompt_path(dir: &Path, slug: &str) -> PathBuf {
    let plain = dir.join(format!("{slug}.md"));
    if !plain.exists() {
        return plain;
    }

    let stem = slug.strip_suffix(SLUG_SEPARATOR).unwrap_or(slug);
    (0u64..)
        .map(|n| dir.join(format!("{stem}{SLUG_SEPARATOR}{n}.md")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(plain)
}

/// Rewrites the whole transcript for `context` at its assigned path.
///
/// Does nothing when the conversation has no transcript path or no messages.
pub fn write_transcript(context: &Context) -> Result<()> {
    let Some(path) = context.transcript_path() else {
        return Ok(());
    };
    if context.messages().is_empty() {
        return Ok(());
    }

    let body = transcript::render(context.title(), context.start_date(), context.messages());
    fs::write(path, body).map_err(|e| {
        HeyError::io(format!(
            "Failed to write transcript {}: {}",
            path.display(),
            e
        ))
    })?;
    tracing::debug!("Wrote transcript {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hey_core::context::ContextField;
    use tempfile::TempDir;

    fn context_with_turn(path: &Path) -> Context {
        let mut json = serde_json::json!({
            "messages": [
                {"role": "user", "content": "what is rust"},
                {"role": "assistant", "content": "a language"}
            ]
        });
        json["md_file"] = serde_json::Value::String(path.display().to_string());
        let mut ctx = Context::from_json(&json.to_string()).unwrap();
        ctx.apply(ContextField::Title("About rust".into())).unwrap();
        ctx
    }

    #[test]
    fn test_mk_prompt_path_free_slug() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(
            mk_prompt_path(temp_dir.path(), "x"),
            temp_dir.path().join("x.md")
        );
    }

    #[test]
    fn test_mk_prompt_path_skips_taken_suffixes() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("x.md"), "").unwrap();
        fs::write(temp_dir.path().join("x_0.md"), "").unwrap();
        assert_eq!(
            mk_prompt_path(temp_dir.path(), "x"),
            temp_dir.path().join("x_1.md")
        );
    }

    #[test]
    fn test_mk_prompt_path_collapses_double_separator() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("x_.md"), "").unwrap();
        assert_eq!(
            mk_prompt_path(temp_dir.path(), "x_"),
            temp_dir.path().join("x_0.md")
        );
    }

    #[test]
    fn test_mk_prompt_path_keeps_inner_separators() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a__b.md"), "").unwrap();
        assert_eq!(
            mk_prompt_path(temp_dir.path(), "a__b"),
            temp_dir.path().join("a__b_0.md")
        );
    }

    #[test]
    fn test_write_transcript_full_replace() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("about_rust.md");
        fs::write(&path, "stale content that must vanish").unwrap();

        let ctx = context_with_turn(&path);
        write_transcript(&ctx).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        assert!(first.starts_with("# About rust\n\n"));
        assert!(first.contains("### User\nwhat is rust\n\n"));
        assert!(first.contains("### Assistant\na language\n\n"));
        assert!(!first.contains("stale"));

        // rewriting the same state yields the same file
        write_transcript(&ctx).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn test_write_transcript_without_path_is_noop() {
        let mut ctx = Context::new();
        ctx.apply(ContextField::Title("t".into())).unwrap();
        write_transcript(&ctx).unwrap();
    }
}
