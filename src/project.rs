//! Layout of a Candy Machine project directory:
//!
//! ```text
//! <project>/
//!   assets/        0.png, 0.json, 1.png, 1.json, ...
//!   config.json    Candy Machine configuration
//!   keypair.json   keypair paying for the deployment
//! ```
//!
//! The directory name doubles as the Candy Machine cache name.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HerbsError, ResourceProblem, Result};

pub const ASSETS_DIR: &str = "assets";
pub const CONFIG_FILE: &str = "config.json";
pub const KEYPAIR_FILE: &str = "keypair.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    root: PathBuf,
    name: String,
}

impl Project {
    /// Resolves `path` to an absolute project root. The root must be an existing directory.
    pub fn open(path: &Path) -> Result<Self> {
        require_dir(path)?;
        let root = fs::canonicalize(path).map_err(|err| HerbsError::io(path, err))?;
        let name = root
            .file_name()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .ok_or_else(|| HerbsError::resource(&root, ResourceProblem::NotADirectory))?;
        Ok(Project { root, name })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join(ASSETS_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn keypair_path(&self) -> PathBuf {
        self.root.join(KEYPAIR_FILE)
    }
}

pub(crate) fn require_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(HerbsError::resource(path, ResourceProblem::Missing));
    }
    if !path.is_dir() {
        return Err(HerbsError::resource(path, ResourceProblem::NotADirectory));
    }
    Ok(())
}

pub(crate) fn require_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(HerbsError::resource(path, ResourceProblem::Missing));
    }
    if !path.is_file() {
        return Err(HerbsError::resource(path, ResourceProblem::NotAFile));
    }
    Ok(())
}

pub(crate) fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| HerbsError::io(path, err))
}
