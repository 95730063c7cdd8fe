//! End-to-end verification of a project directory before deployment.
//!
//! Stages run in a fixed order and stop at the first failure:
//! project root, assets (through the Candy Machine CLI), metadata files,
//! keypair, configuration. Nothing in the project is modified.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;

use crate::candy_machine::CandyMachine;
use crate::error::{HerbsError, ResourceProblem, Result, VerifyStage};
use crate::project::{Project, read_to_string, require_dir, require_file};
use crate::schema::{Configuration, Keypair, Metadata};
use crate::tool::ToolRunner;

pub fn verify_project<R: ToolRunner>(path: &Path, candy_machine: &CandyMachine<R>) -> Result<()> {
    let project = Project::open(path).map_err(|e| e.at_stage(VerifyStage::Project))?;

    let assets = project.assets_dir();
    verify_assets(&assets, candy_machine).map_err(|e| e.at_stage(VerifyStage::Assets))?;

    let count = verify_metadata(&assets).map_err(|e| e.at_stage(VerifyStage::Metadata))?;
    info!(count, "Metadata files validated");

    verify_keypair(&project.keypair_path()).map_err(|e| e.at_stage(VerifyStage::Keypair))?;
    verify_configuration(&project.config_path())
        .map_err(|e| e.at_stage(VerifyStage::Configuration))?;

    info!(project = project.name(), "Everything passed verification");
    Ok(())
}

/// `assets` must be a non-empty directory the Candy Machine CLI is happy with.
pub fn verify_assets<R: ToolRunner>(assets: &Path, candy_machine: &CandyMachine<R>) -> Result<()> {
    require_dir(assets)?;

    let mut entries = fs::read_dir(assets).map_err(|err| HerbsError::io(assets, err))?;
    if entries.next().is_none() {
        return Err(HerbsError::resource(assets, ResourceProblem::EmptyDirectory));
    }

    candy_machine.verify_assets(assets)
}

/// Validates every `*.json` file directly inside `assets`, in file-name order.
/// Returns how many were checked.
pub fn verify_metadata(assets: &Path) -> Result<usize> {
    let files = metadata_files(assets)?;
    for path in &files {
        load_metadata(path)?;
    }
    Ok(files.len())
}

/// The `*.json` files directly inside `assets`, sorted by file name.
pub fn metadata_files(assets: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(assets)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(assets).to_path_buf();
            HerbsError::io(path, err.into())
        })?;
        let path = entry.into_path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
            files.push(path);
        }
    }
    Ok(files)
}

pub fn load_metadata(path: &Path) -> Result<Metadata> {
    let text = read_to_string(path)?;
    Metadata::from_json(&text).map_err(|source| HerbsError::Schema {
        path: path.to_path_buf(),
        source,
    })
}

pub fn verify_keypair(path: &Path) -> Result<Keypair> {
    require_file(path)?;
    if path.extension().and_then(|s| s.to_str()) != Some("json") {
        return Err(HerbsError::resource(path, ResourceProblem::NotJson));
    }

    let text = read_to_string(path)?;
    Keypair::from_json(&text).map_err(|source| HerbsError::Schema {
        path: path.to_path_buf(),
        source,
    })
}

pub fn verify_configuration(path: &Path) -> Result<Configuration> {
    require_file(path)?;

    let text = read_to_string(path)?;
    Configuration::from_json(&text).map_err(|source| HerbsError::Schema {
        path: path.to_path_buf(),
        source,
    })
}
