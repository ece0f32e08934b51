use anyhow::Result;
use chrono::Utc;
use log::{debug, error};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{config::Config, sign::sign};

const PAGE_SIZE: usize = 50;

pub struct BybitClient {
    api_key: String,
    secret: String,
    endpoint: String,
    recv_window: i64,
    client: Client,
}

impl BybitClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent("bybit-balances/0.1")
            .timeout(cfg.timeout)
            .build()?;
        Ok(BybitClient {
            api_key: cfg.credentials.api_key.clone(),
            secret: cfg.credentials.api_secret.clone(),
            endpoint: cfg.credentials.endpoint.clone(),
            recv_window: cfg.recv_window,
            client,
        })
    }

    /// Signed GET with the five X-BAPI-* headers, returns the raw body.
    async fn signed_get(&self, path: &str, query: &str) -> Result<String> {
        let timestamp = Utc::now().timestamp_millis();
        let signature = sign(timestamp, &self.api_key, self.recv_window, query, &self.secret);

        let url = if query.is_empty() {
            format!("{}{}", self.endpoint, path)
        } else {
            format!("{}{}?{}", self.endpoint, path, query)
        };
        debug!("GET {url}");

        let body = self
            .client
            .get(&url)
            .header("X-BAPI-API-KEY", &self.api_key)
            .header("X-BAPI-TIMESTAMP", timestamp.to_string())
            .header("X-BAPI-RECV-WINDOW", self.recv_window.to_string())
            .header("X-BAPI-SIGN", signature)
            .header("X-BAPI-SIGN-TYPE", "2")
            .send()
            .await?
            .text()
            .await?;
        Ok(body)
    }

    /// USDT wallet balance of the main account.
    pub async fn wallet_balance(&self, account_type: &str) -> Result<Vec<CoinBalance>> {
        let query = format!("accountType={account_type}&coin=USDT");
        let body = self.signed_get("/v5/account/wallet-balance", &query).await?;
        let result = parse_envelope::<WalletBalanceResult>(&body)?;
        Ok(result.list.into_iter().flat_map(|account| account.coin).collect())
    }

    /// USDT balance via the asset-transfer endpoint, for the main account or,
    /// with a member id, for one sub-account.
    pub async fn account_coins_balance(&self, account_type: &str, member_id: Option<&str>) -> Result<Vec<CoinBalance>> {
        let mut query = format!("accountType={account_type}&coin=USDT");
        if let Some(id) = member_id {
            query.push_str("&memberId=");
            query.push_str(id);
        }
        let body = self
            .signed_get("/v5/asset/transfer/query-account-coins-balance", &query)
            .await?;
        let result = parse_envelope::<CoinsBalanceResult>(&body)?;
        Ok(result.balance)
    }

    /// Lists all sub-members, walking pages of 50 until a short page arrives.
    pub async fn sub_members(&self) -> Result<Vec<SubMember>> {
        let mut members = Vec::new();
        let mut page = 1u32;
        loop {
            let query = format!("limit={PAGE_SIZE}&page={page}");
            let body = self.signed_get("/v5/user/query-sub-members", &query).await?;
            let result = parse_envelope::<SubMembersResult>(&body)?;
            if collect_page(&mut members, result.sub_members) {
                break;
            }
            page += 1;
        }
        Ok(members)
    }
}

/// Appends one page of sub-members, returns true when it was the last page
/// (shorter than the page size).
fn collect_page(members: &mut Vec<SubMember>, page: Vec<SubMember>) -> bool {
    let last = page.len() < PAGE_SIZE;
    members.extend(page);
    last
}

/// Parses the Bybit response envelope and unwraps its result payload.
/// Both malformed bodies and non-zero retCode are logged with the raw body.
///
/// retCode is checked before the result payload is deserialized: error
/// responses carry an empty `result` object that would not match the
/// payload type.
fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T> {
    let envelope: ApiEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            error!("Failed to parse Bybit response: {e}");
            error!("Raw body: {body}");
            return Err(anyhow::format_err!("Invalid JSON response: {e}"));
        }
    };
    if envelope.ret_code != 0 {
        error!("Bybit error {}: {}", envelope.ret_code, envelope.ret_msg);
        error!("Raw body: {body}");
        return Err(anyhow::format_err!(
            "Bybit error {}: {}",
            envelope.ret_code,
            envelope.ret_msg
        ));
    }
    let result = envelope
        .result
        .ok_or_else(|| anyhow::format_err!("Empty result in Bybit response"))?;
    match serde_json::from_value(result) {
        Ok(result) => Ok(result),
        Err(e) => {
            error!("Failed to parse Bybit result: {e}");
            error!("Raw body: {body}");
            Err(anyhow::format_err!("Invalid JSON response: {e}"))
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEnvelope {
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    result: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CoinBalance {
    pub coin: String,
    pub wallet_balance: String,
    // wallet-balance reports availableToWithdraw, the transfer endpoint
    // reports transferBalance
    #[serde(default, alias = "availableToWithdraw", alias = "transferBalance")]
    pub available_balance: String,
}

impl CoinBalance {
    /// Entries at zero (or unparseable) are suppressed from the report.
    pub fn has_funds(&self) -> bool {
        self.wallet_balance.parse::<f64>().unwrap_or(0.0) > 0.0
    }
}

#[derive(Deserialize, Debug)]
struct WalletBalanceResult {
    list: Vec<WalletAccount>,
}

#[derive(Deserialize, Debug)]
struct WalletAccount {
    coin: Vec<CoinBalance>,
}

#[derive(Deserialize, Debug)]
struct CoinsBalanceResult {
    balance: Vec<CoinBalance>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubMembersResult {
    sub_members: Vec<SubMember>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SubMember {
    pub uid: String,
    #[serde(default)]
    pub username: String,
}


// eof
