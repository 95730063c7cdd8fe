use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SchemaError;

const DOCUMENT: &str = "metadata";

pub const NAME_MAX_LEN: usize = 32;
pub const SYMBOL_MAX_LEN: usize = 10;
pub const IMAGE_MAX_LEN: usize = 200;
pub const MAX_CREATORS: usize = 4;
/// Creator shares are percentages and must add up to this.
pub const TOTAL_SHARE: u64 = 100;

/// Per-asset NFT descriptor, the `N.json` next to each `N.png`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub symbol: String,
    pub description: String,
    /// Royalties on secondary sales, in basis points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_fee_basis_points: Option<u32>,
    pub image: String,
    pub attributes: Vec<Attribute>,
    pub properties: Properties,
    pub collection: Collection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: AttributeValue,
}

/// Trait values may be text or numbers, nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Integer(v) => write!(f, "{v}"),
            AttributeValue::Real(v) => write!(f, "{v}"),
            AttributeValue::Text(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Properties {
    pub creators: Vec<Creator>,
    pub files: Vec<File>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creator {
    pub address: String,
    /// Percentage of royalties, 10 means 10%.
    pub share: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub uri: String,
    #[serde(rename = "type")]
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    pub family: String,
}

impl Metadata {
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let metadata: Metadata = super::parse(DOCUMENT, text)?;
        metadata.validate()?;
        Ok(metadata)
    }

    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        let metadata: Metadata = super::from_value(DOCUMENT, value)?;
        metadata.validate()?;
        Ok(metadata)
    }

    fn validate(&self) -> Result<(), SchemaError> {
        super::check_length(DOCUMENT, "name", &self.name, 1, NAME_MAX_LEN)?;
        super::check_length(DOCUMENT, "symbol", &self.symbol, 1, SYMBOL_MAX_LEN)?;
        super::check_length(DOCUMENT, "image", &self.image, 0, IMAGE_MAX_LEN)?;

        if self.seller_fee_basis_points == Some(0) {
            return Err(SchemaError::invalid(
                DOCUMENT,
                "seller_fee_basis_points",
                "must be positive",
            ));
        }

        self.validate_creators()
    }

    fn validate_creators(&self) -> Result<(), SchemaError> {
        let creators = &self.properties.creators;

        for (index, creator) in creators.iter().enumerate() {
            if creator.share == 0 {
                return Err(SchemaError::invalid(
                    DOCUMENT,
                    format!("properties.creators[{index}].share"),
                    "must be positive",
                ));
            }
            super::check_solana_address(
                DOCUMENT,
                &format!("properties.creators[{index}].address"),
                &creator.address,
            )?;
        }

        if creators.len() > MAX_CREATORS {
            return Err(SchemaError::invalid(
                DOCUMENT,
                "properties.creators",
                format!("too many creators specified (max {MAX_CREATORS})"),
            ));
        }

        let total: u64 = creators.iter().map(|c| u64::from(c.share)).sum();
        if total != TOTAL_SHARE {
            return Err(SchemaError::invalid(
                DOCUMENT,
                "properties.creators",
                format!("creator shares add up to {total}, expected {TOTAL_SHARE}"),
            ));
        }
        Ok(())
    }
}
