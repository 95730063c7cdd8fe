use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use std::fs;

/// Default location of the settings file, relative to the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = "herbs.yaml";

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {:?}", path))?;
        let settings: Settings = serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse settings file {:?}", path))?;
        Ok(settings)
    }

    /// Like [`Settings::load`], but a missing file means defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Settings::default());
        }
        Self::load(path)
    }
}


#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub candy_machine: CandyMachineSettings,
    pub spl_token: SplTokenSettings,
    pub rarible: RaribleSettings,
    pub logs: LogSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CandyMachineSettings {
    /// Program and leading arguments of the Candy Machine v2 CLI.
    pub command: Vec<String>,
    /// Git tag checked out by `herbs setup`.
    pub version: String,
    pub repo_url: String,
    pub install_dir: PathBuf,
}

impl Default for CandyMachineSettings {
    fn default() -> Self {
        CandyMachineSettings {
            command: vec![
                "ts-node".to_string(),
                "./dependency/metaplex/js/packages/cli/src/candy-machine-v2-cli.ts".to_string(),
            ],
            version: "v1.2.0".to_string(),
            repo_url: "https://github.com/metaplex-foundation/metaplex.git".to_string(),
            install_dir: PathBuf::from("./dependency/metaplex"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SplTokenSettings {
    pub command: Vec<String>,
}

impl Default for SplTokenSettings {
    fn default() -> Self {
        SplTokenSettings {
            command: vec!["spl-token".to_string()],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RaribleSettings {
    /// Base URL of the Rarible multichain API per network name.
    pub endpoints: BTreeMap<String, String>,
    pub page_size: u32,
}

impl Default for RaribleSettings {
    fn default() -> Self {
        let endpoints = [
            ("mainnet", "https://api.rarible.org/v0.1"),
            ("devnet", "https://testnet-api.rarible.org/v0.1"),
        ]
        .into_iter()
        .map(|(env, url)| (env.to_string(), url.to_string()))
        .collect();

        RaribleSettings {
            endpoints,
            page_size: 100,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub directory: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            directory: PathBuf::from("logs"),
        }
    }
}
