//! Wrapper around the Metaplex Candy Machine v2 CLI.

use std::path::Path;

use tracing::info;

use crate::config::CandyMachineSettings;
use crate::error::{HerbsError, Result};
use crate::interrupt::Interrupt;
use crate::project::Project;
use crate::tool::{Invocation, ToolCommand, ToolOutput, ToolRunner, run_checked};

/// Name used for the CLI in logs and errors.
pub const TOOL_NAME: &str = "candy-machine";
/// `upload` prints the collection mint on a line containing this.
pub const MINT_ADDRESS_MARKER: &str = "Collection mint address";

pub struct CandyMachine<R> {
    runner: R,
    command: ToolCommand,
}

impl<R: ToolRunner> CandyMachine<R> {
    pub fn new(runner: R, settings: &CandyMachineSettings) -> Self {
        Self::with_command(runner, ToolCommand::new(TOOL_NAME, &settings.command))
    }

    pub fn with_command(runner: R, command: ToolCommand) -> Self {
        CandyMachine { runner, command }
    }

    fn run(&self, operation: &str, args: Vec<String>) -> Result<ToolOutput> {
        let mut full = vec![operation.to_string()];
        full.extend(args);
        run_checked(
            &self.runner,
            &self.command.name,
            operation,
            &self.command.invocation(full),
        )
    }

    /// Lets the CLI check the images and JSON files under `assets`.
    pub fn verify_assets(&self, assets: &Path) -> Result<()> {
        self.run("verify_assets", vec![path_arg(assets)])?;
        Ok(())
    }

    /// Uploads assets and metadata to the configured storage and deploys the
    /// Candy Machine. Returns the collection mint address.
    pub fn upload(&self, project: &Project, env: &str) -> Result<String> {
        let output = self.run(
            "upload",
            vec![
                "-e".to_string(),
                env.to_string(),
                "-k".to_string(),
                path_arg(&project.keypair_path()),
                "-cp".to_string(),
                path_arg(&project.config_path()),
                "-c".to_string(),
                project.name().to_string(),
                path_arg(&project.assets_dir()),
            ],
        )?;

        extract_mint_address(&output.stdout).ok_or_else(|| HerbsError::UnexpectedOutput {
            tool: self.command.name.clone(),
            reason: format!("no '{MINT_ADDRESS_MARKER}' line in upload output"),
        })
    }

    pub fn verify_upload(&self, project: &Project, env: &str) -> Result<()> {
        self.run("verify_upload", self.project_args(project, env))?;
        Ok(())
    }

    /// Sets `mint_address` as the collection of every uploaded NFT. Works off
    /// the CLI's `.cache` for the project, not the assets folder.
    pub fn set_collection(&self, mint_address: &str, project: &Project, env: &str) -> Result<()> {
        let mut args = self.project_args(project, env);
        args.extend(["-m".to_string(), mint_address.to_string()]);
        self.run("set_collection", args)?;
        Ok(())
    }

    /// upload, verify_upload, set_collection. A failure or an interrupt
    /// midway leaves the earlier steps committed.
    pub fn deploy(&self, project: &Project, env: &str, interrupt: &Interrupt) -> Result<String> {
        let mint_address = self.upload(project, env)?;
        info!(%mint_address, "The collection mint address is: {mint_address}");
        interrupt.check("upload")?;

        self.verify_upload(project, env)?;
        info!("Upload verification completed successfully");
        interrupt.check("verify_upload")?;

        self.set_collection(&mint_address, project, env)?;
        info!("Collection set for all the NFTs");

        Ok(mint_address)
    }

    pub fn mint(&self, project: &Project, count: u32, env: &str) -> Result<()> {
        let mut args = self.project_args(project, env);
        args.extend(["--number".to_string(), count.to_string()]);
        self.run("mint_multiple_tokens", args)?;
        info!(count, "{count} NFTs successfully minted");
        Ok(())
    }

    pub fn sign_all(&self, project: &Project, env: &str) -> Result<()> {
        self.run("sign_all", self.project_args(project, env))?;
        info!("All NFTs signed successfully");
        Ok(())
    }

    /// Withdraws the rent of a Candy Machine back to its owner. The Candy
    /// Machine cannot be updated afterwards.
    pub fn withdraw_rent(&self, candy_machine: &str, keypair: &Path, env: &str) -> Result<()> {
        self.run(
            "withdraw",
            vec![
                candy_machine.to_string(),
                "-e".to_string(),
                env.to_string(),
                "-k".to_string(),
                path_arg(keypair),
            ],
        )?;
        info!(candy_machine, "Withdrawn rent successfully from CM {candy_machine}");
        Ok(())
    }

    fn project_args(&self, project: &Project, env: &str) -> Vec<String> {
        vec![
            "-e".to_string(),
            env.to_string(),
            "-k".to_string(),
            path_arg(&project.keypair_path()),
            "-c".to_string(),
            project.name().to_string(),
        ]
    }
}

/// Clones the Candy Machine CLI at the configured tag and installs its
/// JavaScript toolchain. Returns `false` when the install dir already exists.
pub fn install<R: ToolRunner>(runner: &R, settings: &CandyMachineSettings) -> Result<bool> {
    if settings.install_dir.exists() {
        info!(dir = ?settings.install_dir, "Candy Machine CLI already installed");
        return Ok(false);
    }

    let install_dir = path_arg(&settings.install_dir);
    let steps = [
        (
            "git",
            "clone",
            Invocation::new(
                "git",
                [
                    "clone",
                    "-b",
                    settings.version.as_str(),
                    settings.repo_url.as_str(),
                    install_dir.as_str(),
                ],
            ),
        ),
        (
            "yarn",
            "install",
            Invocation::new(
                "yarn",
                ["install".to_string(), "--cwd".to_string(), format!("{install_dir}/js")],
            ),
        ),
        (
            "yarn",
            "global add",
            Invocation::new("yarn", ["global", "add", "ts-node", "typescript"]),
        ),
    ];

    for (tool, operation, invocation) in &steps {
        info!(command = %invocation, "installing");
        run_checked(runner, tool, operation, invocation)?;
    }

    info!("Please check that ts-node is available in your PATH variable");
    Ok(true)
}

/// Text after the first `:` of the first line carrying [`MINT_ADDRESS_MARKER`].
pub fn extract_mint_address(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .filter(|line| line.contains(MINT_ADDRESS_MARKER))
        .find_map(|line| line.split_once(':'))
        .map(|(_, address)| address.trim().to_string())
        .filter(|address| !address.is_empty())
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
