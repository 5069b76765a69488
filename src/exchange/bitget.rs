use crate::error::Error;
use crate::exchange::{Exchange, OrderRequest};
use crate::indicators::coerce_f64;
use crate::market_data::Granularity;
use crate::models::OrderAck;
use crate::Result;
use base64::Engine;
use governor::{Quota, RateLimiter};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::num::NonZeroU32;
use std::sync::Arc;

// Bitget USDT-M futures, v1 REST
// Docs: https://bitgetlimited.github.io/apidoc/en/mix
pub const BITGET_API_BASE: &str = "https://api.bitget.com";
const SUCCESS_CODE: &str = "00000";
const RATE_LIMIT_RPS: u32 = 10;

const SERVER_TIME_PATH: &str = "/api/spot/v1/public/time";
const CANDLES_PATH: &str = "/api/mix/v1/market/candles";
const ACCOUNTS_PATH: &str = "/api/mix/v1/account/accounts";
const SET_LEVERAGE_PATH: &str = "/api/mix/v1/account/setLeverage";
const PLACE_ORDER_PATH: &str = "/api/mix/v1/order/placeOrder";

type HmacSha256 = Hmac<Sha256>;

type BitgetRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// API credentials for signed endpoints
#[derive(Clone)]
pub struct BitgetCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: String,
}

impl std::fmt::Debug for BitgetCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitgetCredentials")
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

/// Compute `ACCESS-SIGN` for a request
///
/// The prehash string is `timestamp + METHOD + request_path + body`, where
/// `request_path` includes the query string for GET requests.
pub fn sign_request(
    secret: &str,
    timestamp: &str,
    method: &str,
    request_path: &str,
    body: &str,
) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Exchange(format!("hmac init: {}", e)))?;
    mac.update(timestamp.as_bytes());
    mac.update(method.as_bytes());
    mac.update(request_path.as_bytes());
    mac.update(body.as_bytes());
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SetLeverageBody<'a> {
    symbol: &'a str,
    margin_coin: &'a str,
    leverage: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaceOrderBody<'a> {
    symbol: &'a str,
    margin_coin: &'a str,
    size: String,
    side: &'a str,
    order_type: &'a str,
    client_oid: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceOrderData {
    order_id: String,
    #[serde(default)]
    client_oid: Option<String>,
}

/// Client for the Bitget futures REST API
///
/// No request timeout and no retries: every call is a single attempt.
#[derive(Clone)]
pub struct BitgetClient {
    client: Client,
    base_url: String,
    credentials: BitgetCredentials,
    rate_limiter: Arc<BitgetRateLimiter>,
}

impl BitgetClient {
    pub fn new(credentials: BitgetCredentials) -> Self {
        Self::with_base_url(credentials, BITGET_API_BASE)
    }

    pub fn with_base_url(credentials: BitgetCredentials, base_url: impl Into<String>) -> Self {
        let rps = NonZeroU32::new(RATE_LIMIT_RPS).unwrap_or(NonZeroU32::MIN);

        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(rps))),
        }
    }

    /// Send a request and unwrap the `{code, msg, data}` envelope
    ///
    /// Returns the full response body after checking that `code` is `00000`.
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<String>,
        signed: bool,
    ) -> Result<serde_json::Value> {
        self.rate_limiter.until_ready().await;

        let request_path = if query.is_empty() {
            path.to_string()
        } else {
            let query_string = query
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            format!("{}?{}", path, query_string)
        };
        let url = format!("{}{}", self.base_url, request_path);
        let body = body.unwrap_or_default();

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header("Content-Type", "application/json")
            .header("locale", "en-US");

        if signed {
            let timestamp = chrono::Utc::now().timestamp_millis().to_string();
            let signature = sign_request(
                &self.credentials.api_secret,
                &timestamp,
                method.as_str(),
                &request_path,
                &body,
            )?;
            builder = builder
                .header("ACCESS-KEY", &self.credentials.api_key)
                .header("ACCESS-SIGN", signature)
                .header("ACCESS-TIMESTAMP", timestamp)
                .header("ACCESS-PASSPHRASE", &self.credentials.passphrase);
        }

        if !body.is_empty() {
            builder = builder.body(body);
        }

        tracing::debug!("Bitget {} {}", method, request_path);

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Error::Exchange(format!(
                "{} {} returned {}: {}",
                method, request_path, status, text
            )));
        }

        let value: serde_json::Value = serde_json::from_str(&text)?;
        check_envelope(value)
    }
}

/// Reject responses whose `code` is not the success code
fn check_envelope(value: serde_json::Value) -> Result<serde_json::Value> {
    if let Some(code) = value.get("code") {
        let code = match code {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if code != SUCCESS_CODE {
            let msg = value
                .get("msg")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            return Err(Error::Exchange(format!("code {}: {}", code, msg)));
        }
    }
    Ok(value)
}

/// Payload of a response: `data` for enveloped responses, the body otherwise
fn into_data(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(mut map) if map.contains_key("code") => {
            map.remove("data").unwrap_or(serde_json::Value::Null)
        }
        other => other,
    }
}

impl Exchange for BitgetClient {
    async fn server_time(&self) -> Result<i64> {
        let response = self
            .request(Method::GET, SERVER_TIME_PATH, &[], None, false)
            .await?;
        let data = into_data(response);

        coerce_f64(&data)
            .map(|ms| ms as i64)
            .ok_or_else(|| Error::Data(format!("unexpected server time payload: {}", data)))
    }

    async fn candles(
        &self,
        symbol: &str,
        granularity: Granularity,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Vec<serde_json::Value>>> {
        let query = [
            ("symbol", symbol.to_string()),
            ("granularity", granularity.as_str().to_string()),
            ("startTime", start_ms.to_string()),
            ("endTime", end_ms.to_string()),
        ];
        let response = self
            .request(Method::GET, CANDLES_PATH, &query, None, false)
            .await?;

        match into_data(response) {
            serde_json::Value::Null => Ok(Vec::new()),
            data => Ok(serde_json::from_value(data)?),
        }
    }

    async fn accounts(&self, product_type: &str) -> Result<serde_json::Value> {
        let query = [("productType", product_type.to_string())];
        self.request(Method::GET, ACCOUNTS_PATH, &query, None, true)
            .await
    }

    async fn set_leverage(&self, symbol: &str, margin_coin: &str, leverage: u32) -> Result<()> {
        let body = serde_json::to_string(&SetLeverageBody {
            symbol,
            margin_coin,
            leverage: leverage.to_string(),
        })?;
        self.request(Method::POST, SET_LEVERAGE_PATH, &[], Some(body), true)
            .await?;
        Ok(())
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck> {
        let client_oid = uuid::Uuid::new_v4().simple().to_string();
        let body = serde_json::to_string(&PlaceOrderBody {
            symbol: &order.symbol,
            margin_coin: &order.margin_coin,
            size: order.size.normalize().to_string(),
            side: order.side.as_str(),
            order_type: "market",
            client_oid: &client_oid,
        })?;

        let response = self
            .request(Method::POST, PLACE_ORDER_PATH, &[], Some(body), true)
            .await?;
        let data: PlaceOrderData = serde_json::from_value(into_data(response))?;

        Ok(OrderAck {
            order_id: data.order_id,
            client_oid: data.client_oid.unwrap_or(client_oid),
        })
    }
}
