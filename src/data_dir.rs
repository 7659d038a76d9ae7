use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DATA_DIR_ENV_VAR: &str = "CLAIMMATCH_DATA_DIR";

#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Resolve the data directory from, in order of priority:
    /// 1. An explicit path (from --data-dir)
    /// 2. The CLAIMMATCH_DATA_DIR environment variable
    /// 3. The XDG data directory (~/.local/share/claimmatch/)
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let root = if let Some(path) = explicit {
            path.to_path_buf()
        } else if let Ok(val) = std::env::var(DATA_DIR_ENV_VAR) {
            PathBuf::from(val)
        } else {
            xdg::BaseDirectories::with_prefix("claimmatch")
                .get_data_home()
                .ok_or_else(|| {
                    Error::Config(
                        "could not determine XDG data home directory".into(),
                    )
                })?
        };

        std::fs::create_dir_all(&root)
            .map_err(|_| Error::DataDir(root.clone()))?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a path from the config file against the data directory.
    /// Absolute paths are returned unchanged.
    pub fn join(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn google_dir(&self) -> PathBuf {
        self.root.join("google")
    }

    pub fn newsguard_dir(&self) -> PathBuf {
        self.root.join("newsguard")
    }

    pub fn misc_json_dir(&self) -> PathBuf {
        self.root.join("misc_json")
    }

    pub fn tweet_dir(&self) -> PathBuf {
        self.root.join("tweets")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    pub fn secret_file(&self) -> PathBuf {
        self.root.join("secret.json")
    }
}
