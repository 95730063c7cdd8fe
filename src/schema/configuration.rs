use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::SchemaError;

const DOCUMENT: &str = "configuration";

/// `goLiveDate` layout, minus the trailing zone name.
const GO_LIVE_FORMAT: &str = "%d %b %Y %H:%M:%S";
/// Zone names accepted after the timestamp; both mean UTC.
const GO_LIVE_ZONES: [&str; 2] = ["UTC", "GMT"];

/// Decentralized storage provider the Candy Machine CLI uploads to, together
/// with the credentials that provider needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "storage")]
pub enum StorageProvider {
    #[serde(rename = "aws")]
    Aws {
        #[serde(rename = "awsS3Bucket")]
        bucket: String,
    },
    #[serde(rename = "ipfs")]
    Ipfs {
        #[serde(rename = "ipfsInfuraProjectId")]
        project_id: String,
        #[serde(rename = "ipfsInfuraSecret")]
        secret: String,
    },
    #[serde(rename = "pinata")]
    Pinata {
        #[serde(rename = "pinataJwt")]
        jwt: String,
        #[serde(rename = "pinataGateway")]
        gateway: Url,
    },
    #[serde(rename = "arweave")]
    Arweave {
        #[serde(rename = "arweaveJwk")]
        jwk_path: String,
    },
    #[serde(rename = "arweave-bundle")]
    ArweaveBundle {
        #[serde(rename = "arweaveJwk")]
        jwk_path: String,
    },
    #[serde(rename = "nft-storage")]
    NftStorage {
        #[serde(rename = "nftStorageKey")]
        api_key: String,
    },
    #[serde(rename = "arweave-sol")]
    ArweaveSol,
}

impl StorageProvider {
    /// The value of the `storage` key for this provider.
    pub fn name(&self) -> &'static str {
        match self {
            StorageProvider::Aws { .. } => "aws",
            StorageProvider::Ipfs { .. } => "ipfs",
            StorageProvider::Pinata { .. } => "pinata",
            StorageProvider::Arweave { .. } => "arweave",
            StorageProvider::ArweaveBundle { .. } => "arweave-bundle",
            StorageProvider::NftStorage { .. } => "nft-storage",
            StorageProvider::ArweaveSol => "arweave-sol",
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfiguration {
    number: u64,
    price: f64,
    sol_treasury_account: String,
    #[serde(default)]
    spl_token: Option<String>,
    #[serde(default)]
    spl_token_account: Option<String>,
    #[serde(flatten)]
    storage: StorageProvider,
    go_live_date: String,
    #[serde(default)]
    no_mutable: bool,
    #[serde(default)]
    no_retain_authority: bool,
    #[serde(default)]
    gatekeeper: Option<Value>,
    #[serde(default)]
    end_settings: Option<Value>,
    #[serde(default)]
    hidden_settings: Option<Value>,
    #[serde(default)]
    whitelist_mint_settings: Option<Value>,
}

/// A validated Candy Machine v2 `config.json`.
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Maximum number of tokens that can be minted.
    pub number: u64,
    /// Unit price of each token.
    pub price: f64,
    /// Account receiving the proceeds.
    pub sol_treasury_account: String,
    pub spl_token: Option<String>,
    pub spl_token_account: Option<String>,
    pub storage: StorageProvider,
    /// Start of the public sale.
    pub go_live: DateTime<Utc>,
    /// Disables later updates of the on-chain metadata.
    pub no_mutable: bool,
    pub no_retain_authority: bool,
    pub gatekeeper: Option<Value>,
    pub end_settings: Option<Value>,
    pub hidden_settings: Option<Value>,
    pub whitelist_mint_settings: Option<Value>,
}

impl Configuration {
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let raw: RawConfiguration = super::parse(DOCUMENT, text)?;
        Self::validate(raw)
    }

    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        let raw: RawConfiguration = super::from_value(DOCUMENT, value)?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfiguration) -> Result<Self, SchemaError> {
        if raw.number == 0 {
            return Err(SchemaError::invalid(DOCUMENT, "number", "must be positive"));
        }
        if !(raw.price.is_finite() && raw.price > 0.0) {
            return Err(SchemaError::invalid(DOCUMENT, "price", "must be positive"));
        }
        super::check_solana_address(DOCUMENT, "solTreasuryAccount", &raw.sol_treasury_account)?;
        let go_live = parse_go_live_date(&raw.go_live_date)?;

        Ok(Configuration {
            number: raw.number,
            price: raw.price,
            sol_treasury_account: raw.sol_treasury_account,
            spl_token: raw.spl_token,
            spl_token_account: raw.spl_token_account,
            storage: raw.storage,
            go_live,
            no_mutable: raw.no_mutable,
            no_retain_authority: raw.no_retain_authority,
            gatekeeper: raw.gatekeeper,
            end_settings: raw.end_settings,
            hidden_settings: raw.hidden_settings,
            whitelist_mint_settings: raw.whitelist_mint_settings,
        })
    }
}

/// Parses dates such as `25 Dec 2021 00:00:00 GMT`.
pub fn parse_go_live_date(value: &str) -> Result<DateTime<Utc>, SchemaError> {
    let invalid = |reason: String| SchemaError::invalid(DOCUMENT, "goLiveDate", reason);

    let (stamp, zone) = value
        .trim()
        .rsplit_once(' ')
        .ok_or_else(|| invalid(format!("'{value}' has no time zone")))?;

    if !GO_LIVE_ZONES.iter().any(|z| z.eq_ignore_ascii_case(zone)) {
        return Err(invalid(format!("unsupported time zone '{zone}'")));
    }

    let naive = NaiveDateTime::parse_from_str(stamp.trim_end(), GO_LIVE_FORMAT)
        .map_err(|err| invalid(format!("invalid date '{value}': {err}")))?;
    Ok(naive.and_utc())
}
