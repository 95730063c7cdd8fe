//! Wrapper around the Solana `spl-token` CLI. The keypair in use is the one
//! set globally with `solana config set --keypair`.

use serde::Deserialize;

use crate::config::SplTokenSettings;
use crate::error::{HerbsError, Result};
use crate::tool::{ToolCommand, ToolOutput, ToolRunner, run_checked};

pub const TOOL_NAME: &str = "spl-token";

/// One entry of `spl-token accounts -v --output json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAccount {
    /// The token account holding the balance.
    pub address: String,
    pub mint: String,
    pub token_amount: TokenAmount,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
    /// Raw amount in base units, as printed by the CLI.
    pub amount: String,
    #[serde(default)]
    pub decimals: Option<u8>,
    #[serde(default)]
    pub ui_amount_string: Option<String>,
}

#[derive(Deserialize)]
struct AccountsReport {
    accounts: Vec<TokenAccount>,
}

pub struct SplToken<R> {
    runner: R,
    command: ToolCommand,
}

impl<R: ToolRunner> SplToken<R> {
    pub fn new(runner: R, settings: &SplTokenSettings) -> Self {
        Self::with_command(runner, ToolCommand::new(TOOL_NAME, &settings.command))
    }

    pub fn with_command(runner: R, command: ToolCommand) -> Self {
        SplToken { runner, command }
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

    /// Sends one unit of `token` to `destination`, creating and funding the
    /// recipient's token account when needed.
    pub fn transfer(&self, token: &str, destination: &str) -> Result<()> {
        self.run(
            "transfer",
            vec![
                token.to_string(),
                "1".to_string(),
                destination.to_string(),
                "--allow-unfunded-recipient".to_string(),
                "--fund-recipient".to_string(),
            ],
        )?;
        Ok(())
    }

    /// Token accounts owned by the configured wallet.
    pub fn accounts(&self) -> Result<Vec<TokenAccount>> {
        let output = self.run(
            "accounts",
            vec!["-v".to_string(), "--output".to_string(), "json".to_string()],
        )?;
        parse_accounts(&output.stdout).map_err(|err| HerbsError::UnexpectedOutput {
            tool: self.command.name.clone(),
            reason: format!("accounts listing is not valid JSON: {err}"),
        })
    }

    pub fn burn(&self, account: &str, amount: &str) -> Result<()> {
        self.run("burn", vec![account.to_string(), amount.to_string()])?;
        Ok(())
    }

    /// Closes the token account of `mint`, reclaiming its rent.
    pub fn close(&self, mint: &str) -> Result<()> {
        self.run("close", vec![mint.to_string()])?;
        Ok(())
    }
}

pub fn parse_accounts(json: &str) -> serde_json::Result<Vec<TokenAccount>> {
    let report: AccountsReport = serde_json::from_str(json)?;
    Ok(report.accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ScriptedRunner;

    const LISTING: &str = r#"{
        "accounts": [
            {
                "address": "AccA",
                "mint": "MintA",
                "tokenAmount": { "amount": "1", "decimals": 0, "uiAmount": 1.0, "uiAmountString": "1" },
                "delegatedAmount": null
            },
            {
                "address": "AccB",
                "mint": "MintB",
                "tokenAmount": { "amount": "3" }
            }
        ]
    }"#;

    fn spl(runner: &ScriptedRunner) -> SplToken<&ScriptedRunner> {
        SplToken::new(runner, &SplTokenSettings::default())
    }

    #[test]
    fn parses_accounts_listing() {
        let accounts = parse_accounts(LISTING).unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].address, "AccA");
        assert_eq!(accounts[0].token_amount.decimals, Some(0));
        assert_eq!(accounts[1].token_amount.amount, "3");
    }

    #[test]
    fn accounts_runs_verbose_json_listing() {
        let runner = ScriptedRunner::new().respond("accounts", ToolOutput::ok(LISTING));
        let accounts = spl(&runner).accounts().unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(runner.command_lines(), ["spl-token accounts -v --output json"]);
    }

    #[test]
    fn garbage_listing_is_unexpected_output() {
        let runner = ScriptedRunner::new().respond("accounts", ToolOutput::ok("Error: RPC"));
        let err = spl(&runner).accounts().unwrap_err();
        assert!(matches!(err, HerbsError::UnexpectedOutput { .. }));
    }

    #[test]
    fn transfer_burn_and_close_command_lines() {
        let runner = ScriptedRunner::new();
        let spl = spl(&runner);
        spl.transfer("Tok1", "Dest1").unwrap();
        spl.burn("AccA", "1").unwrap();
        spl.close("MintA").unwrap();
        assert_eq!(
            runner.command_lines(),
            [
                "spl-token transfer Tok1 1 Dest1 --allow-unfunded-recipient --fund-recipient",
                "spl-token burn AccA 1",
                "spl-token close MintA",
            ]
        );
    }
}
