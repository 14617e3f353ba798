//! File-based storage backend.

use crate::core::Conversation;
use crate::error::Result;
use crate::storage::traits::StateRepository;
use crate::storage::{CONVERSATIONS_KEY, IDENTITY_KEY};
use std::fs;
use std::path::{Path, PathBuf};

/// File-based storage backend with atomic writes.
#[derive(Debug)]
pub struct FileBackend {
    base_dir: PathBuf,
}

impl FileBackend {
    /// Create a new file backend.
    ///
    /// Creates the base directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Directory holding the state files.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn conversations_path(&self) -> PathBuf {
        self.base_dir.join(format!("{CONVERSATIONS_KEY}.json"))
    }

    fn identity_path(&self) -> PathBuf {
        self.base_dir.join(IDENTITY_KEY)
    }

    /// Write through a temp file and rename, so a crash never leaves a half file.
    fn write_atomic(path: &Path, contents: &str) -> Result<()> {
        let temp = path.with_extension("tmp");
        fs::write(&temp, contents)?;
        fs::rename(&temp, path)?;
        Ok(())
    }
}

impl StateRepository for FileBackend {
    fn load_conversations(&self) -> Result<Option<Vec<Conversation>>> {
        let path = self.conversations_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        let conversations: Vec<Conversation> = serde_json::from_str(&contents)?;
        Ok(Some(conversations))
    }

    fn save_conversations(&self, conversations: &[Conversation]) -> Result<()> {
        let contents = serde_json::to_string_pretty(conversations)?;
        Self::write_atomic(&self.conversations_path(), &contents)
    }

    fn load_identity(&self) -> Result<Option<String>> {
        let path = self.identity_path();
        if !path.exists() {
            return Ok(None);
        }
        let token = fs::read_to_string(&path)?.trim().to_string();
        Ok((!token.is_empty()).then_some(token))
    }

    fn save_identity(&self, token: &str) -> Result<()> {
        Self::write_atomic(&self.identity_path(), token)
    }
}
