use std::cell::Cell;
use std::fs;
use std::path::PathBuf;

use herbs::config::SplTokenSettings;
use herbs::error::{HerbsError, Result};
use herbs::interrupt::Interrupt;
use herbs::logging::CapturedLog;
use herbs::rarible::{ItemsApi, ItemsPage, OwnedToken};
use herbs::spl_token::SplToken;
use herbs::tool::{ScriptedRunner, SystemRunner, ToolCommand, ToolOutput};
use herbs::transfer::transfer_collection;
use serde_json::json;
use tempfile::TempDir;

const WALLET: &str = "Wallet111";
const COLLECTION: &str = "Herbs111";

fn token(address: &str, collection: &str) -> OwnedToken {
    serde_json::from_value(json!({
        "id": format!("SOLANA:{address}"),
        "collection": format!("SOLANA:{collection}"),
        "blockchain": "SOLANA",
        "meta": { "name": format!("Herb {address}") },
        "mintedAt": "2022-03-01T10:00:00Z",
        "lastUpdatedAt": "2022-03-01T10:00:00Z",
        "deleted": false,
        "supply": "1",
        "sellers": 0,
        "totalStock": "1",
        "lazySupply": "0"
    }))
    .unwrap()
}

/// Serves the wallet's holdings split over two pages.
struct Holdings {
    pages: Vec<ItemsPage>,
    requests: Cell<usize>,
}

impl Holdings {
    fn new(tokens: Vec<OwnedToken>) -> Self {
        let split = tokens.len() / 2;
        let mut first = tokens;
        let second = first.split_off(split);
        Holdings {
            pages: vec![
                ItemsPage {
                    items: first,
                    continuation: Some("page-2".to_string()),
                },
                ItemsPage {
                    items: second,
                    continuation: None,
                },
            ],
            requests: Cell::new(0),
        }
    }
}

impl ItemsApi for Holdings {
    fn items_by_owner(&self, owner: &str, continuation: Option<&str>) -> Result<ItemsPage> {
        assert_eq!(owner, format!("SOLANA:{WALLET}"));
        self.requests.set(self.requests.get() + 1);
        let index = usize::from(continuation == Some("page-2"));
        Ok(self.pages[index].clone())
    }
}

fn holdings() -> Holdings {
    Holdings::new(vec![
        token("T1", COLLECTION),
        token("Other1", "Weeds111"),
        token("T2", COLLECTION),
        token("T3", COLLECTION),
    ])
}

fn transfer_list(rows: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transfers.csv");
    fs::write(&path, format!("address,quantity\n{rows}")).unwrap();
    (dir, path)
}

fn spl(runner: &ScriptedRunner) -> SplToken<&ScriptedRunner> {
    SplToken::new(runner, &SplTokenSettings::default())
}

fn transfer_targets(runner: &ScriptedRunner) -> Vec<(String, String)> {
    runner
        .calls()
        .iter()
        .filter(|call| call.args.first().map(String::as_str) == Some("transfer"))
        .map(|call| (call.args[1].clone(), call.args[3].clone()))
        .collect()
}

#[test]
fn tokens_go_out_last_first_in_list_order() {
    let (_dir, csv) = transfer_list("Addr1,2\nAddr2,1\n");
    let runner = ScriptedRunner::new();
    let api = holdings();

    let log = CapturedLog::new();
    let report = tracing::subscriber::with_default(log.subscriber(), || {
        transfer_collection(&api, &spl(&runner), WALLET, COLLECTION, &csv, &Interrupt::new())
    })
    .unwrap();

    assert_eq!(api.requests.get(), 2);
    assert_eq!(report.succeeded(), 3);
    assert!(!report.interrupted);
    assert_eq!(
        transfer_targets(&runner),
        [
            ("T3".to_string(), "Addr1".to_string()),
            ("T2".to_string(), "Addr1".to_string()),
            ("T1".to_string(), "Addr2".to_string()),
        ]
    );
    assert_eq!(
        runner.command_lines()[0],
        "spl-token transfer T3 1 Addr1 --allow-unfunded-recipient --fund-recipient"
    );
    assert!(log.contents().contains("SPL transfer T1 to Addr2 completed"));
}

#[test]
fn demand_above_supply_sends_nothing() {
    let (_dir, csv) = transfer_list("Addr1,2\nAddr2,2\n");
    let runner = ScriptedRunner::new();

    let err = transfer_collection(
        &holdings(),
        &spl(&runner),
        WALLET,
        COLLECTION,
        &csv,
        &Interrupt::new(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        HerbsError::DemandExceedsSupply {
            requested: 4,
            owned: 3
        }
    ));
    assert!(runner.calls().is_empty());
}

#[test]
fn failed_transfer_is_logged_and_the_batch_continues() {
    let (_dir, csv) = transfer_list("Addr1,2\nAddr2,1\n");
    let runner = ScriptedRunner::new()
        .respond("transfer T2", ToolOutput::failed(1, "account frozen"));

    let log = CapturedLog::new();
    let report = tracing::subscriber::with_default(log.subscriber(), || {
        transfer_collection(
            &holdings(),
            &spl(&runner),
            WALLET,
            COLLECTION,
            &csv,
            &Interrupt::new(),
        )
    })
    .unwrap();

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.records[1].token, "T2");
    assert!(report.records[1].error.as_deref().unwrap().contains("account frozen"));
    assert_eq!(transfer_targets(&runner).len(), 3);
    assert!(log.contents().contains("SPL transfer T2 to Addr1 failed"));
}

#[test]
fn interrupt_stops_the_batch() {
    let (_dir, csv) = transfer_list("Addr1,1\n");
    let runner = ScriptedRunner::new();
    let interrupt = Interrupt::new();
    interrupt.trigger();

    let report = transfer_collection(
        &holdings(),
        &spl(&runner),
        WALLET,
        COLLECTION,
        &csv,
        &interrupt,
    )
    .unwrap();
    assert!(report.interrupted);
    assert!(report.records.is_empty());
    assert!(runner.calls().is_empty());
}

#[test]
fn missing_transfer_list_is_checked_before_any_request() {
    let dir = tempfile::tempdir().unwrap();
    let api = holdings();
    let runner = ScriptedRunner::new();

    let err = transfer_collection(
        &api,
        &spl(&runner),
        WALLET,
        COLLECTION,
        &dir.path().join("mock.csv"),
        &Interrupt::new(),
    )
    .unwrap_err();

    assert!(matches!(err, HerbsError::Resource { .. }));
    assert_eq!(api.requests.get(), 0);
}

#[test]
fn unlaunchable_spl_token_aborts_the_batch() {
    let (_dir, csv) = transfer_list("Addr1,2\nAddr2,1\n");
    let spl = SplToken::with_command(
        SystemRunner,
        ToolCommand::new("spl-token", &["herbs-missing-spl-token".to_string()]),
    );

    let log = CapturedLog::new();
    let result = tracing::subscriber::with_default(log.subscriber(), || {
        transfer_collection(&holdings(), &spl, WALLET, COLLECTION, &csv, &Interrupt::new())
    });

    match result {
        Err(HerbsError::ToolUnavailable { tool, operation, .. }) => {
            assert_eq!(tool, "spl-token");
            assert_eq!(operation, "transfer");
        }
        other => panic!("expected the batch to abort, got: {other:?}"),
    }
    assert!(!log.contents().contains("completed"));
    assert!(!log.contents().contains("failed:"));
}
