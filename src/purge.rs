//! Burns every SPL token held by the configured wallet and closes the
//! emptied accounts to reclaim their rent.

use tracing::{info, warn};

use crate::error::Result;
use crate::interrupt::Interrupt;
use crate::spl_token::SplToken;
use crate::tool::ToolRunner;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeRecord {
    pub account: String,
    pub burned: bool,
    pub closed: bool,
}

impl PurgeRecord {
    pub fn purged(&self) -> bool {
        self.burned && self.closed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub records: Vec<PurgeRecord>,
    pub interrupted: bool,
}

impl PurgeReport {
    pub fn purged(&self) -> usize {
        self.records.iter().filter(|r| r.purged()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.purged()
    }
}

/// Listing failures abort the run. Per-account failures are logged and the
/// next account is tried; close is attempted even when burn failed.
pub fn purge_all<R: ToolRunner>(spl: &SplToken<R>, interrupt: &Interrupt) -> Result<PurgeReport> {
    let accounts = spl.accounts()?;
    info!(count = accounts.len(), "SPL token accounts to purge");

    let mut report = PurgeReport::default();
    for account in &accounts {
        if interrupt.is_set() {
            report.interrupted = true;
            break;
        }

        let burned = spl
            .burn(&account.address, &account.token_amount.amount)
            .inspect_err(|err| warn!(account = %account.address, "burn failed: {err}"))
            .is_ok();
        let closed = spl
            .close(&account.mint)
            .inspect_err(|err| warn!(mint = %account.mint, "close failed: {err}"))
            .is_ok();

        let record = PurgeRecord {
            account: account.address.clone(),
            burned,
            closed,
        };
        if record.purged() {
            info!("Successfully purged token {}", account.address);
        } else {
            warn!("Error during purge of token {}", account.address);
        }
        report.records.push(record);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SplTokenSettings;
    use crate::error::HerbsError;
    use crate::logging::CapturedLog;
    use crate::tool::{ScriptedRunner, ToolOutput};

    const LISTING: &str = r#"{"accounts": [
        {"address": "AccA", "mint": "MintA", "tokenAmount": {"amount": "1"}},
        {"address": "AccB", "mint": "MintB", "tokenAmount": {"amount": "2"}}
    ]}"#;

    #[test]
    fn burns_then_closes_each_account() {
        let runner = ScriptedRunner::new().respond("accounts", ToolOutput::ok(LISTING));
        let spl = SplToken::new(&runner, &SplTokenSettings::default());

        let report = purge_all(&spl, &Interrupt::new()).unwrap();
        assert_eq!(report.purged(), 2);
        assert_eq!(
            runner.command_lines()[1..],
            [
                "spl-token burn AccA 1",
                "spl-token close MintA",
                "spl-token burn AccB 2",
                "spl-token close MintB",
            ]
        );
    }

    #[test]
    fn one_failed_burn_does_not_stop_the_batch() {
        let runner = ScriptedRunner::new()
            .respond("accounts", ToolOutput::ok(LISTING))
            .respond("burn AccA", ToolOutput::failed(1, "insufficient funds"));
        let spl = SplToken::new(&runner, &SplTokenSettings::default());

        let log = CapturedLog::new();
        let report = tracing::subscriber::with_default(log.subscriber(), || {
            purge_all(&spl, &Interrupt::new()).unwrap()
        });

        assert_eq!(report.failed(), 1);
        assert_eq!(report.purged(), 1);
        assert!(!report.records[0].burned);
        assert!(report.records[0].closed);
        assert_eq!(runner.calls().len(), 5);
        assert!(log.contents().contains("Error during purge of token AccA"));
        assert!(log.contents().contains("Successfully purged token AccB"));
    }

    #[test]
    fn failed_listing_aborts() {
        let runner = ScriptedRunner::new().respond("accounts", ToolOutput::failed(1, ""));
        let spl = SplToken::new(&runner, &SplTokenSettings::default());
        let err = purge_all(&spl, &Interrupt::new()).unwrap_err();
        assert!(matches!(err, HerbsError::ExternalTool { .. }));
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn interrupt_stops_before_next_account() {
        let runner = ScriptedRunner::new().respond("accounts", ToolOutput::ok(LISTING));
        let spl = SplToken::new(&runner, &SplTokenSettings::default());
        let interrupt = Interrupt::new();
        interrupt.trigger();

        let report = purge_all(&spl, &interrupt).unwrap();
        assert!(report.interrupted);
        assert!(report.records.is_empty());
        assert_eq!(runner.calls().len(), 1);
    }
}
