use herbs::candy_machine::{self, CandyMachine};
use herbs::config::{DEFAULT_SETTINGS_PATH, Settings};
use herbs::interrupt::Interrupt;
use herbs::logging::LogSession;
use herbs::project::Project;
use herbs::purge::purge_all;
use herbs::rarible::RaribleClient;
use herbs::spl_token::SplToken;
use herbs::tool::SystemRunner;
use herbs::transfer::transfer_collection;
use herbs::verify::verify_project;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

const DEFAULT_ENV: &str = "devnet";
/// Exit status after Ctrl-C, as shells report it.
const INTERRUPTED: u8 = 130;

/// Candy Machine project automation: verify, deploy and mint NFT
/// collections, then transfer or purge the resulting SPL tokens.
///
/// A project directory holds `assets/`, `config.json` and `keypair.json`.
#[derive(Parser, Debug)]
#[command(name = "herbs", version, about)]
struct Cli {
    /// Tool settings (commands, API endpoints, log directory).
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_PATH)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify project layout, assets, metadata, keypair and configuration.
    Verify { project: PathBuf },
    /// Download and install the Candy Machine CLI.
    Setup,
    /// Upload assets, deploy the Candy Machine and set the collection.
    Deploy {
        project: PathBuf,
        #[arg(long, default_value = DEFAULT_ENV)]
        env: String,
        /// Deploy without verifying the project first.
        #[arg(long)]
        skip_verify: bool,
    },
    /// Mint tokens from the project's Candy Machine.
    Mint {
        project: PathBuf,
        #[arg(long, short, default_value_t = 1)]
        number: u32,
        #[arg(long, default_value = DEFAULT_ENV)]
        env: String,
    },
    /// Sign every NFT minted by the project's Candy Machine.
    SignAll {
        project: PathBuf,
        #[arg(long, default_value = DEFAULT_ENV)]
        env: String,
    },
    /// Withdraw the rent of a Candy Machine; it cannot be updated afterwards.
    WithdrawRent {
        candy_machine: String,
        keypair: PathBuf,
        #[arg(long, default_value = DEFAULT_ENV)]
        env: String,
    },
    /// Transfer NFTs of a collection to the wallets listed in a CSV file
    /// (`address,quantity`).
    Transfer {
        wallet: String,
        collection_id: String,
        csv: PathBuf,
        #[arg(long, default_value = DEFAULT_ENV)]
        env: String,
    },
    /// Burn every SPL token of the configured wallet and close the accounts.
    Purge,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load_or_default(&cli.settings) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("❌ {:#}", err);
            return ExitCode::FAILURE;
        }
    };

    let session = match LogSession::start("herbs", &settings.logs.directory) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("❌ {:#}", err);
            return ExitCode::FAILURE;
        }
    };

    let interrupt = Interrupt::install().unwrap_or_else(|err| {
        warn!("Ctrl-C handler not installed: {err}");
        Interrupt::new()
    });

    let outcome = run(cli.command, &settings, &interrupt);

    if interrupt.is_set() {
        warn!("Interrupt received, closing now..");
    }
    if let Err(err) = &outcome {
        error!("An unexpected error occurred: {err}");
    }
    let status = exit_status(&outcome, interrupt.is_set());

    match session.finish() {
        Ok(path) => eprintln!("Log saved to {}", path.display()),
        Err(err) => eprintln!("❌ {:#}", err),
    }
    ExitCode::from(status)
}

/// An interrupted run reports 130 whatever else happened, since a child
/// killed by the same Ctrl-C surfaces as an ordinary failure.
fn exit_status<T>(outcome: &Result<T>, interrupted: bool) -> u8 {
    match outcome {
        _ if interrupted => INTERRUPTED,
        Ok(_) => 0,
        Err(_) => 1,
    }
}

fn run(command: Commands, settings: &Settings, interrupt: &Interrupt) -> Result<()> {
    let runner = SystemRunner;
    let cm = CandyMachine::new(runner, &settings.candy_machine);

    match command {
        Commands::Verify { project } => {
            verify_project(&project, &cm)?;
        }
        Commands::Setup => {
            candy_machine::install(&runner, &settings.candy_machine)?;
        }
        Commands::Deploy {
            project,
            env,
            skip_verify,
        } => {
            if !skip_verify {
                verify_project(&project, &cm)?;
            }
            let project = Project::open(&project)?;
            cm.deploy(&project, &env, interrupt)?;
        }
        Commands::Mint {
            project,
            number,
            env,
        } => {
            cm.mint(&Project::open(&project)?, number, &env)?;
        }
        Commands::SignAll { project, env } => {
            cm.sign_all(&Project::open(&project)?, &env)?;
        }
        Commands::WithdrawRent {
            candy_machine,
            keypair,
            env,
        } => {
            cm.withdraw_rent(&candy_machine, &keypair, &env)?;
        }
        Commands::Transfer {
            wallet,
            collection_id,
            csv,
            env,
        } => {
            let api = RaribleClient::new(&settings.rarible, &env)?;
            let spl = SplToken::new(runner, &settings.spl_token);
            let report = transfer_collection(&api, &spl, &wallet, &collection_id, &csv, interrupt)?;
            info!(
                succeeded = report.succeeded(),
                failed = report.failed(),
                "Transfers finished"
            );
        }
        Commands::Purge => {
            let spl = SplToken::new(runner, &settings.spl_token);
            let report = purge_all(&spl, interrupt)?;
            info!(
                purged = report.purged(),
                failed = report.failed(),
                "Purge finished"
            );
        }
    }

    Ok(())
}
