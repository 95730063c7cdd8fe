//! Bulk transfer of one collection's NFTs to a list of wallets.
//!
//! The list is a CSV file with an `address,quantity` header. Each row asks
//! for `quantity` tokens of the collection to be sent to `address`.

use std::fs::File;
use std::io;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{HerbsError, Result};
use crate::interrupt::Interrupt;
use crate::project::require_file;
use crate::rarible::{ItemsApi, OwnedToken, owned_by_collection};
use crate::spl_token::SplToken;
use crate::tool::ToolRunner;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferInstruction {
    /// Destination wallet, passed to `spl-token` as is.
    pub address: String,
    pub quantity: u64,
}

#[derive(Deserialize)]
struct TransferRow {
    address: String,
    quantity: String,
}

pub fn read_transfer_list(path: &Path) -> Result<Vec<TransferInstruction>> {
    require_file(path)?;
    let file = File::open(path).map_err(|err| HerbsError::io(path, err))?;
    parse_transfer_list(file)
}

/// Parses the whole list or nothing: the first bad row fails the parse.
/// Row numbers in errors count data rows from 1.
pub fn parse_transfer_list<Rd: io::Read>(reader: Rd) -> Result<Vec<TransferInstruction>> {
    let mut rows = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut instructions = Vec::new();
    for (index, record) in rows.deserialize::<TransferRow>().enumerate() {
        let row = index + 1;
        let record = record.map_err(|err| HerbsError::TransferList {
            row,
            reason: err.to_string(),
        })?;

        let quantity = record
            .quantity
            .parse::<u64>()
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| HerbsError::TransferList {
                row,
                reason: format!("quantity '{}' is not a positive integer", record.quantity),
            })?;

        instructions.push(TransferInstruction {
            address: record.address,
            quantity,
        });
    }
    Ok(instructions)
}

pub fn total_quantity(instructions: &[TransferInstruction]) -> u64 {
    instructions
        .iter()
        .fold(0u64, |acc, t| acc.saturating_add(t.quantity))
}

/// Fails unless `owned` tokens cover every requested transfer. Returns the total requested.
pub fn ensure_supply(instructions: &[TransferInstruction], owned: usize) -> Result<u64> {
    let requested = total_quantity(instructions);
    if requested > owned as u64 {
        return Err(HerbsError::DemandExceedsSupply { requested, owned });
    }
    Ok(requested)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub token: String,
    pub destination: String,
    /// `None` when the transfer went through.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferReport {
    pub records: Vec<TransferRecord>,
    /// Set when Ctrl-C stopped the batch before the end.
    pub interrupted: bool,
}

impl TransferReport {
    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }
}

/// Sends tokens one at a time, taking them from the end of `owned`.
///
/// Supply is checked before the first transfer. A failed transfer is logged
/// and recorded, and the batch moves on; transfers already sent stay sent.
/// When `spl-token` cannot be launched at all the batch aborts.
pub fn execute_transfers<R: ToolRunner>(
    spl: &SplToken<R>,
    instructions: &[TransferInstruction],
    mut owned: Vec<OwnedToken>,
    interrupt: &Interrupt,
) -> Result<TransferReport> {
    let available = owned.len();
    let requested = ensure_supply(instructions, available)?;
    info!(requested, available, "SPL token transfer log");

    let mut report = TransferReport::default();
    for instruction in instructions {
        for _ in 0..instruction.quantity {
            if interrupt.is_set() {
                report.interrupted = true;
                return Ok(report);
            }

            let token = owned.pop().ok_or(HerbsError::DemandExceedsSupply {
                requested,
                owned: available,
            })?;
            let address = token.token_address();

            let error = match spl.transfer(address, &instruction.address) {
                Ok(()) => {
                    info!("SPL transfer {} to {} completed", address, instruction.address);
                    None
                }
                Err(err @ HerbsError::ToolUnavailable { .. }) => return Err(err),
                Err(err) => {
                    warn!("SPL transfer {} to {} failed: {}", address, instruction.address, err);
                    Some(err.to_string())
                }
            };

            report.records.push(TransferRecord {
                token: address.to_string(),
                destination: instruction.address.clone(),
                error,
            });
        }
    }
    Ok(report)
}

/// The whole transfer run: holdings of `wallet` in `collection_id`, the
/// list at `csv_path`, then the transfers.
pub fn transfer_collection<A, R>(
    api: &A,
    spl: &SplToken<R>,
    wallet: &str,
    collection_id: &str,
    csv_path: &Path,
    interrupt: &Interrupt,
) -> Result<TransferReport>
where
    A: ItemsApi + ?Sized,
    R: ToolRunner,
{
    require_file(csv_path)?;

    let owned = owned_by_collection(api, wallet, collection_id)?;
    let instructions = read_transfer_list(csv_path)?;

    info!("Presale and transfers to be made (n. {})", instructions.len());
    for instruction in &instructions {
        info!("\t{} -> {}", instruction.address, instruction.quantity);
    }

    execute_transfers(spl, &instructions, owned, interrupt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Vec<TransferInstruction>> {
        parse_transfer_list(text.as_bytes())
    }

    #[test]
    fn parses_rows_in_order() {
        let list = parse("address,quantity\nAddr1,2\n Addr2 , 1 \n").unwrap();
        assert_eq!(
            list,
            [
                TransferInstruction {
                    address: "Addr1".into(),
                    quantity: 2
                },
                TransferInstruction {
                    address: "Addr2".into(),
                    quantity: 1
                },
            ]
        );
    }

    #[test]
    fn header_only_is_an_empty_list() {
        assert!(parse("address,quantity\n").unwrap().is_empty());
    }

    #[test]
    fn zero_quantity_fails_the_whole_list() {
        let err = parse("address,quantity\nAddr1,2\nAddr2,0\n").unwrap_err();
        assert!(matches!(err, HerbsError::TransferList { row: 2, .. }));
    }

    #[test]
    fn non_integer_quantities_are_rejected() {
        for bad in ["-1", "1.5", "two", ""] {
            let text = format!("address,quantity\nAddr1,{bad}\n");
            assert!(parse(&text).is_err(), "accepted quantity {bad:?}");
        }
    }

    #[test]
    fn missing_column_is_rejected() {
        assert!(parse("address\nAddr1\n").is_err());
        assert!(parse("wallet,quantity\nAddr1,1\n").is_err());
    }

    #[test]
    fn supply_check() {
        let list = parse("address,quantity\nA,2\nB,2\n").unwrap();
        assert_eq!(ensure_supply(&list, 4).unwrap(), 4);
        let err = ensure_supply(&list, 3).unwrap_err();
        assert!(matches!(
            err,
            HerbsError::DemandExceedsSupply {
                requested: 4,
                owned: 3
            }
        ));
    }

    #[test]
    fn missing_file_is_a_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_transfer_list(&dir.path().join("mock.csv")).unwrap_err();
        assert!(matches!(err, HerbsError::Resource { .. }));
    }
}
