//! Wallet holdings through the Rarible multichain API.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info};

use crate::config::RaribleSettings;
use crate::error::{HerbsError, Result};

/// Chain prefix of owner and collection identifiers.
pub const CHAIN_PREFIX: &str = "SOLANA";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Blockchain {
    Ethereum,
    Solana,
    Polygon,
    Tezos,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenMeta {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// An NFT held by a wallet, as returned by `items/byOwner`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedToken {
    /// `<BLOCKCHAIN>:<token address>`
    pub id: String,
    /// `<BLOCKCHAIN>:<collection id>`
    #[serde(default)]
    pub collection: Option<String>,
    pub blockchain: Blockchain,
    #[serde(default)]
    pub meta: Option<TokenMeta>,
    pub minted_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub deleted: bool,
    #[serde(deserialize_with = "count")]
    pub supply: u64,
    #[serde(deserialize_with = "count")]
    pub sellers: u64,
    #[serde(deserialize_with = "count")]
    pub total_stock: u64,
    #[serde(deserialize_with = "count")]
    pub lazy_supply: u64,
}

impl OwnedToken {
    /// The on-chain token address, i.e. the id without its chain prefix.
    pub fn token_address(&self) -> &str {
        self.id.rsplit(':').next().unwrap_or(&self.id)
    }

    pub fn name(&self) -> &str {
        self.meta.as_ref().map_or("<unnamed>", |meta| meta.name.as_str())
    }
}

/// Counters come back either as JSON numbers or as numeric strings.
fn count<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(text) => text.parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemsPage {
    pub items: Vec<OwnedToken>,
    /// Cursor for the next page; absent on the last one.
    #[serde(default)]
    pub continuation: Option<String>,
}

pub trait ItemsApi {
    /// Fetches one page of items owned by `owner` (`SOLANA:<wallet>`).
    fn items_by_owner(&self, owner: &str, continuation: Option<&str>) -> Result<ItemsPage>;
}

pub struct RaribleClient {
    base_url: String,
    page_size: u32,
    http: reqwest::blocking::Client,
}

impl RaribleClient {
    /// Fails with [`HerbsError::UnsupportedEnvironment`] when `env` has no
    /// configured endpoint; no request is made in that case.
    pub fn new(settings: &RaribleSettings, env: &str) -> Result<Self> {
        let base_url = settings
            .endpoints
            .get(env)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| HerbsError::UnsupportedEnvironment(env.to_string()))?;

        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(RaribleClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size: settings.page_size,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ItemsApi for RaribleClient {
    fn items_by_owner(&self, owner: &str, continuation: Option<&str>) -> Result<ItemsPage> {
        let url = format!("{}/items/byOwner", self.base_url);
        let mut query = vec![
            ("owner", owner.to_string()),
            ("size", self.page_size.to_string()),
        ];
        if let Some(cursor) = continuation {
            query.push(("continuation", cursor.to_string()));
        }

        debug!(%url, ?continuation, "fetching owned items");
        let page = self
            .http
            .get(&url)
            .query(&query)
            .send()?
            .error_for_status()?
            .json::<ItemsPage>()?;
        Ok(page)
    }
}

/// Every NFT owned by `wallet`, following continuation cursors until the
/// server stops sending one.
pub fn get_by_owner<A: ItemsApi + ?Sized>(api: &A, wallet: &str) -> Result<Vec<OwnedToken>> {
    let owner = format!("{CHAIN_PREFIX}:{wallet}");
    let mut tokens = Vec::new();
    let mut continuation: Option<String> = None;

    loop {
        let page = api.items_by_owner(&owner, continuation.as_deref())?;
        tokens.extend(page.items);
        match page.continuation {
            Some(next) => continuation = Some(next),
            None => return Ok(tokens),
        }
    }
}

/// The NFTs of `wallet` belonging to `collection_id`, in API order.
pub fn owned_by_collection<A: ItemsApi + ?Sized>(
    api: &A,
    wallet: &str,
    collection_id: &str,
) -> Result<Vec<OwnedToken>> {
    let tag = format!("{CHAIN_PREFIX}:{collection_id}");
    let owned: Vec<OwnedToken> = get_by_owner(api, wallet)?
        .into_iter()
        .filter(|token| token.collection.as_deref() == Some(tag.as_str()))
        .collect();

    info!(count = owned.len(), "Owned NFTs from the specified collection (n. {})", owned.len());
    for token in &owned {
        info!("\t{} -> {}", token.id, token.name());
    }
    Ok(owned)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use serde_json::json;

    pub fn token(address: &str, collection: Option<&str>) -> OwnedToken {
        serde_json::from_value(json!({
            "id": format!("SOLANA:{address}"),
            "collection": collection.map(|c| format!("SOLANA:{c}")),
            "blockchain": "SOLANA",
            "meta": { "name": format!("Herb {address}"), "description": "", "tags": [], "genres": [] },
            "mintedAt": "2022-03-01T10:00:00Z",
            "lastUpdatedAt": "2022-03-02T10:00:00Z",
            "deleted": false,
            "supply": "1",
            "sellers": 0,
            "totalStock": "1",
            "lazySupply": "0"
        }))
        .unwrap()
    }
}
