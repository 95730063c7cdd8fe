//! Data-shape contracts for the files a Candy Machine project is made of.
//!
//! Every validator is all-or-nothing: a document either yields a fully
//! validated value or a [`SchemaError`] naming the first offending field.

pub mod configuration;
pub mod keypair;
pub mod metadata;

pub use configuration::{Configuration, StorageProvider};
pub use keypair::Keypair;
pub use metadata::Metadata;

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Decoded length of a Solana public key.
pub const PUBLIC_KEY_LEN: usize = 32;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("malformed {document}: {source}")]
    Malformed {
        document: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {document} field '{field}': {reason}")]
    Invalid {
        document: &'static str,
        field: String,
        reason: String,
    },
}

impl SchemaError {
    pub(crate) fn invalid(
        document: &'static str,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        SchemaError::Invalid {
            document,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field, when the document parsed but broke an invariant.
    pub fn field(&self) -> Option<&str> {
        match self {
            SchemaError::Invalid { field, .. } => Some(field),
            SchemaError::Malformed { .. } => None,
        }
    }
}

pub(crate) fn parse<T: DeserializeOwned>(
    document: &'static str,
    text: &str,
) -> Result<T, SchemaError> {
    serde_json::from_str(text).map_err(|source| SchemaError::Malformed { document, source })
}

pub(crate) fn from_value<T: DeserializeOwned>(
    document: &'static str,
    value: serde_json::Value,
) -> Result<T, SchemaError> {
    serde_json::from_value(value).map_err(|source| SchemaError::Malformed { document, source })
}

/// Checks that `value` is a base-58 string decoding to a 32-byte public key.
pub fn check_solana_address(
    document: &'static str,
    field: &str,
    value: &str,
) -> Result<(), SchemaError> {
    let decoded = bs58::decode(value).into_vec().map_err(|err| {
        SchemaError::invalid(document, field, format!("not a base-58 string: {err}"))
    })?;

    if decoded.len() != PUBLIC_KEY_LEN {
        return Err(SchemaError::invalid(
            document,
            field,
            "the provided value isn't a valid Solana address",
        ));
    }
    Ok(())
}

/// Character-count bounds, inclusive on both ends.
pub(crate) fn check_length(
    document: &'static str,
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), SchemaError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(SchemaError::invalid(
            document,
            field,
            format!("length {len} is outside {min}..={max}"),
        ));
    }
    Ok(())
}
