//! Layout of the prompts directory.
//!
//! Everything hey persists lives in one flat directory:
//!
//! ```text
//! ~/.prompts/                      # prompts dir (--dir, HEY_PROMPTS_DIR)
//! ├── .hey_config.json             # registry
//! ├── .hey_context.main.json       # one record per conversation
//! ├── .hey_context.Ab12Cd34.json
//! ├── some_title.md                # one transcript per conversation
//! └── archive/                     # archived conversation records
//! ```

use hey_core::context::context_file_name;
use hey_core::error::{HeyError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the default prompts directory.
pub const PROMPTS_DIR_ENV: &str = "HEY_PROMPTS_DIR";

/// Directory name under the home directory used when nothing else is given.
pub const DEFAULT_PROMPTS_DIR_NAME: &str = ".prompts";

pub const REGISTRY_FILE_NAME: &str = ".hey_config.json";
pub const ARCHIVE_DIR_NAME: &str = "archive";

/// Resolved file locations for one prompts directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeyPaths {
    prompts_dir: PathBuf,
}

impl HeyPaths {
    pub fn new(prompts_dir: impl Into<PathBuf>) -> Self {
        Self {
            prompts_dir: prompts_dir.into(),
        }
    }

    /// Picks the prompts directory: explicit flag, then `HEY_PROMPTS_DIR`,
    /// then `~/.prompts`.
    pub fn resolve(flag: Option<PathBuf>) -> Result<Self> {
        let env = std::env::var_os(PROMPTS_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::resolve_from(flag, env, dirs::home_dir())
    }

    fn resolve_from(
        flag: Option<PathBuf>,
        env: Option<PathBuf>,
        home: Option<PathBuf>,
    ) -> Result<Self> {
        if let Some(dir) = flag.or(env) {
            return Ok(Self::new(dir));
        }
        let home = home.ok_or_else(|| HeyError::config("Cannot find home directory"))?;
        Ok(Self::new(home.join(DEFAULT_PROMPTS_DIR_NAME)))
    }

    /// Creates the prompts directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.prompts_dir).map_err(|e| {
            HeyError::io(format!(
                "Failed to create {}: {}",
                self.prompts_dir.display(),
                e
            ))
        })
    }

    pub fn prompts_dir(&self) -> &Path {
        &self.prompts_dir
    }

    pub fn registry_file(&self) -> PathBuf {
        self.prompts_dir.join(REGISTRY_FILE_NAME)
    }

    pub fn context_file(&self, convo: &str) -> PathBuf {
        self.prompts_dir.join(context_file_name(convo))
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.prompts_dir.join(ARCHIVE_DIR_NAME)
    }
}
