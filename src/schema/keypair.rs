use std::fmt;

use super::SchemaError;

const DOCUMENT: &str = "keypair";

/// Number of bytes in a Solana keypair file (secret + public half).
pub const KEYPAIR_LEN: usize = 64;

/// The signing keypair a project deploys and pays fees with.
pub struct Keypair {
    bytes: [u8; KEYPAIR_LEN],
}

impl Keypair {
    /// Parses the JSON array stored in `keypair.json`.
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let values: Vec<i64> = super::parse(DOCUMENT, text)?;
        Self::from_values(&values)
    }

    pub fn from_values(values: &[i64]) -> Result<Self, SchemaError> {
        if let Some((index, value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !(1..=255).contains(*v))
        {
            return Err(SchemaError::invalid(
                DOCUMENT,
                format!("bytes[{index}]"),
                format!("{value} is outside 1..=255"),
            ));
        }

        if values.len() != KEYPAIR_LEN {
            return Err(SchemaError::invalid(
                DOCUMENT,
                "bytes",
                format!(
                    "invalid or wrong keypair length: expected {KEYPAIR_LEN}, found {}",
                    values.len()
                ),
            ));
        }

        let mut bytes = [0u8; KEYPAIR_LEN];
        for (slot, value) in bytes.iter_mut().zip(values) {
            *slot = *value as u8;
        }
        Ok(Keypair { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; KEYPAIR_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair([redacted; {KEYPAIR_LEN}])")
    }
}
