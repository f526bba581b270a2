/// Player preferences that outlive a session (currently: the mute flag).
///
/// Stored as `prefs.toml` in the first writable of:
///   1. the executable's directory (portable installs)
///   2. `~/.local/share/salsa-run`
///   3. the current working directory
///
/// Game progress is never persisted.

use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PREFS_FILE: &str = "prefs.toml";

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("preferences file is malformed: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not encode preferences: {0}")]
    Encode(#[from] toml::ser::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefs {
    #[serde(default)]
    pub muted: bool,
}

#[derive(Clone, Debug)]
pub struct PrefsStore {
    path: PathBuf,
}

impl PrefsStore {
    pub fn locate() -> Self {
        PrefsStore { path: prefs_dir().join(PREFS_FILE) }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        PrefsStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is not an error: it means defaults.
    pub fn load(&self) -> Result<Prefs, PrefsError> {
        if !self.path.exists() {
            return Ok(Prefs::default());
        }
        let text = std::fs::read_to_string(&self.path)
            .map_err(|source| PrefsError::Read { path: self.path.clone(), source })?;
        Ok(toml::from_str(&text)?)
    }

    pub fn save(&self, prefs: &Prefs) -> Result<(), PrefsError> {
        let text = toml::to_string(prefs)?;
        std::fs::write(&self.path, text)
            .map_err(|source| PrefsError::Write { path: self.path.clone(), source })
    }

    pub fn load_or_default(&self) -> Prefs {
        self.load().unwrap_or_else(|e| {
            warn!("{e}; using default preferences");
            Prefs::default()
        })
    }
}

fn prefs_dir() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let probe = parent.join(".write_test_salsa_run");
            if std::fs::write(&probe, "").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return parent.to_path_buf();
            }
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/salsa-run");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
