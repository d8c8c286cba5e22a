//! JSON-file based ContextRepository implementation.

use hey_core::context::{Context, ContextRepository, context_file_name, convo_id_from_file_name};
use hey_core::error::{HeyError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::paths::HeyPaths;
use crate::storage::AtomicJsonFile;

/// Stores each conversation as `.hey_context.{convo}.json` in the prompts
/// directory. The directory listing is the list of conversations.
#[derive(Debug, Clone)]
pub struct JsonContextRepository {
    paths: HeyPaths,
}

impl JsonContextRepository {
    pub fn new(paths: HeyPaths) -> Self {
        Self { paths }
    }

    fn file(&self, convo: &str) -> AtomicJsonFile {
        AtomicJsonFile::new(self.paths.context_file(convo))
    }
}

impl ContextRepository for JsonContextRepository {
    fn find_by_id(&self, convo: &str) -> Result<Option<Context>> {
        let file = self.file(convo);
        let Some(json) = file.load()? else {
            return Ok(None);
        };

        Context::from_json(&json).map(Some).map_err(|e| match e {
            HeyError::Serialization { format, message } => HeyError::Serialization {
                format,
                message: format!("{}: {}", file.path().display(), message),
            },
            other => other,
        })
    }

    fn save(&self, convo: &str, context: &Context) -> Result<()> {
        self.file(convo).save(&context.to_json()?)
    }

    fn delete(&self, convo: &str) -> Result<()> {
        self.file(convo).remove()
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        let dir = self.paths.prompts_dir();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(HeyError::io(format!(
                    "Failed to read {}: {}",
                    dir.display(),
                    e
                )));
            }
        };

        let mut found: Vec<(SystemTime, String)> = Vec::new();
        for entry in entries {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(id) = convo_id_from_file_name(&name.to_string_lossy()) else {
                continue;
            };
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            found.push((modified, id));
        }

        // Most recently modified first
        found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        Ok(found.into_iter().map(|(_, id)| id).collect())
    }

    fn archive(&self, convo: &str) -> Result<()> {
        let source = self.paths.context_file(convo);
        if !source.exists() {
            return Err(HeyError::not_found("conversation", convo));
        }
        let archive_dir = self.paths.archive_dir();
        fs::create_dir_all(&archive_dir)?;

        let target = free_archive_target(&archive_dir, convo);
        fs::rename(&source, &target)?;
        tracing::info!("Archived {} to {}", convo, target.display());
        Ok(())
    }

    fn location(&self, convo: &str) -> PathBuf {
        self.paths.context_file(convo)
    }
}

/// First unused archive name for `convo`: the plain file name, then
/// `{convo}_0`, `{convo}_1`, ... An earlier archived record is never replaced.
fn free_archive_target(archive_dir: &Path, convo: &str) -> PathBuf {
    let plain = archive_dir.join(context_file_name(convo));
    if !plain.exists() {
        return plain;
    }
    (0u32..)
        .map(|n| archive_dir.join(context_file_name(&format!("{convo}_{n}"))))
        .find(|candidate| !candidate.exists())
        .unwrap_or(plain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hey_core::context::ContextField;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn setup() -> (TempDir, JsonContextRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonContextRepository::new(HeyPaths::new(temp_dir.path()));
        (temp_dir, repo)
    }

    fn touch(path: &std::path::Path, secs_ago: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(secs_ago))
            .unwrap();
    }

    #[test]
    fn test_save_and_find() {
        let (_temp_dir, repo) = setup();
        let mut ctx = Context::new();
        ctx.apply(ContextField::Title("Hello".into())).unwrap();
        repo.save("main", &ctx).unwrap();

        let loaded = repo.find_by_id("main").unwrap().unwrap();
        assert_eq!(loaded, ctx);
    }

    #[test]
    fn test_find_missing_returns_none() {
        let (_temp_dir, repo) = setup();
        assert!(repo.find_by_id("nope").unwrap().is_none());
    }

    #[test]
    fn test_malformed_file_is_hard_failure() {
        let (temp_dir, repo) = setup();
        fs::write(temp_dir.path().join(".hey_context.bad.json"), "{oops").unwrap();
        let err = repo.find_by_id("bad").unwrap_err();
        assert!(matches!(err, HeyError::Serialization { .. }));
    }

    #[test]
    fn test_list_ids_newest_first_ignores_other_files() {
        let (temp_dir, repo) = setup();
        repo.save("old", &Context::new()).unwrap();
        repo.save("new", &Context::new()).unwrap();
        repo.save("mid", &Context::new()).unwrap();
        fs::write(temp_dir.path().join("notes.md"), "x").unwrap();
        fs::write(temp_dir.path().join(".hey_config.json"), "{}").unwrap();
        fs::create_dir(temp_dir.path().join("archive")).unwrap();

        touch(&repo.location("old"), 300);
        touch(&repo.location("mid"), 200);
        touch(&repo.location("new"), 100);

        assert_eq!(repo.list_ids().unwrap(), vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_list_ids_missing_dir_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonContextRepository::new(HeyPaths::new(temp_dir.path().join("absent")));
        assert!(repo.list_ids().unwrap().is_empty());
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, repo) = setup();
        repo.save("main", &Context::new()).unwrap();
        repo.delete("main").unwrap();
        assert!(repo.find_by_id("main").unwrap().is_none());
        // deleting again is fine
        repo.delete("main").unwrap();
    }

    #[test]
    fn test_archive_moves_record() {
        let (temp_dir, repo) = setup();
        repo.save("abc", &Context::new()).unwrap();
        repo.archive("abc").unwrap();

        assert!(!repo.location("abc").exists());
        assert!(
            temp_dir
                .path()
                .join("archive/.hey_context.abc.json")
                .exists()
        );
        assert!(repo.list_ids().unwrap().is_empty());
    }

    #[test]
    fn test_archive_same_id_twice_keeps_both_records() {
        let (temp_dir, repo) = setup();
        let mut first = Context::new();
        first
            .apply(ContextField::Title("precious".into()))
            .unwrap();
        repo.save("main", &first).unwrap();
        repo.archive("main").unwrap();

        repo.save("main", &Context::new()).unwrap();
        repo.archive("main").unwrap();
        repo.save("main", &Context::new()).unwrap();
        repo.archive("main").unwrap();

        let archive = temp_dir.path().join("archive");
        let kept = fs::read_to_string(archive.join(".hey_context.main.json")).unwrap();
        assert!(kept.contains("precious"));
        assert!(archive.join(".hey_context.main_0.json").exists());
        assert!(archive.join(".hey_context.main_1.json").exists());
    }

    #[test]
    fn test_archive_missing_is_not_found() {
        let (_temp_dir, repo) = setup();
        assert!(repo.archive("ghost").unwrap_err().is_not_found());
    }
}
