use super::exchange::{ExchangeClient, OrderFill};
use super::rate_limiter::FixedWindowRateLimiter;
use crate::error::ExchangeError;
use crate::models::{Candle, OrderType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// API key pair for signed endpoints
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"***")
            .field("secret_key", &"***")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    order_id: u64,
    #[serde(default)]
    fills: Vec<FillResponse>,
}

#[derive(Debug, Deserialize)]
struct FillResponse {
    price: String,
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    price: String,
}

/// Binance spot REST client
///
/// Cloneable; all clones share the same HTTP pool and rate limiter, so the
/// request budget is shared with every other holder of the limiter.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
    rate_limiter: Arc<FixedWindowRateLimiter>,
}

impl BinanceClient {
    pub fn new(
        base_url: impl Into<String>,
        credentials: Option<Credentials>,
        rate_limiter: Arc<FixedWindowRateLimiter>,
        timeout: Duration,
    ) -> Result<Self, ExchangeError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            rate_limiter,
        })
    }

    fn sign(&self, query: &str) -> Result<(String, &str), ExchangeError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| ExchangeError::Auth("no API credentials configured".to_string()))?;

        let mut mac = HmacSha256::new_from_slice(credentials.secret_key.as_bytes())
            .map_err(|e| ExchangeError::Auth(e.to_string()))?;
        mac.update(query.as_bytes());

        Ok((
            hex::encode(mac.finalize().into_bytes()),
            credentials.api_key.as_str(),
        ))
    }

    /// Send one rate-limited request and decode the JSON body
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &str,
        api_key: Option<&str>,
    ) -> Result<T, ExchangeError> {
        self.rate_limiter.acquire().await;

        let url = if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query)
        };

        let mut request = self.client.request(method, &url);
        if let Some(key) = api_key {
            request = request.header("X-MBX-APIKEY", key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), path, "Exchange request failed: {}", body);
            return Err(ExchangeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn parse_price(raw: &str) -> Result<f64, ExchangeError> {
    raw.parse::<f64>()
        .map_err(|e| ExchangeError::Parse(format!("invalid price '{}': {}", raw, e)))
}

fn kline_number(row: &[Value], idx: usize) -> Result<f64, ExchangeError> {
    match row.get(idx) {
        Some(Value::String(s)) => parse_price(s),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| ExchangeError::Parse(format!("kline field {} out of range", idx))),
        _ => Err(ExchangeError::Parse(format!("kline field {} missing", idx))),
    }
}

fn parse_kline(row: &[Value]) -> Result<Candle, ExchangeError> {
    let open_time = row
        .first()
        .and_then(Value::as_i64)
        .ok_or_else(|| ExchangeError::Parse("kline open time missing".to_string()))?;
    let timestamp = DateTime::<Utc>::from_timestamp_millis(open_time)
        .ok_or_else(|| ExchangeError::Parse(format!("invalid kline time {}", open_time)))?;

    Ok(Candle::new(
        timestamp,
        kline_number(row, 1)?,
        kline_number(row, 2)?,
        kline_number(row, 3)?,
        kline_number(row, 4)?,
        kline_number(row, 5)?,
    ))
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn place_market_order(
        &self,
        symbol: &str,
        side: OrderType,
        quantity: f64,
    ) -> Result<OrderFill, ExchangeError> {
        let params = format!(
            "symbol={}&side={}&type=MARKET&quantity={}&newOrderRespType=FULL&timestamp={}",
            symbol.to_uppercase(),
            side.side(),
            quantity,
            Utc::now().timestamp_millis()
        );
        let (signature, api_key) = self.sign(&params)?;
        let query = format!("{}&signature={}", params, signature);

        tracing::info!(symbol, side = side.side(), quantity, "Placing market order");

        let response: OrderResponse = self
            .request(Method::POST, "/api/v3/order", &query, Some(api_key))
            .await?;

        let fill = response
            .fills
            .first()
            .ok_or_else(|| ExchangeError::Parse("order response has no fills".to_string()))?;

        Ok(OrderFill {
            order_id: response.order_id.to_string(),
            price: parse_price(&fill.price)?,
        })
    }

    async fn ticker_price(&self, symbol: &str) -> Result<f64, ExchangeError> {
        let query = format!("symbol={}", symbol.to_uppercase());
        let response: TickerResponse = self
            .request(Method::GET, "/api/v3/ticker/price", &query, None)
            .await?;
        parse_price(&response.price)
    }

    async fn ping(&self) -> Result<(), ExchangeError> {
        let _: Value = self.request(Method::GET, "/api/v3/ping", "", None).await?;
        Ok(())
    }

    async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, ExchangeError> {
        let query = format!(
            "symbol={}&interval={}&limit={}",
            symbol.to_uppercase(),
            interval,
            limit
        );
        let rows: Vec<Vec<Value>> = self
            .request(Method::GET, "/api/v3/klines", &query, None)
            .await?;

        let candles = rows
            .iter()
            .map(|row| parse_kline(row))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(symbol, interval, count = candles.len(), "Fetched klines");
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::num::NonZeroU32;

    fn limiter() -> Arc<FixedWindowRateLimiter> {
        Arc::new(FixedWindowRateLimiter::new(
            NonZeroU32::new(100).unwrap(),
            Duration::from_secs(60),
        ))
    }

    fn client(url: &str, limiter: Arc<FixedWindowRateLimiter>) -> BinanceClient {
        let credentials = Credentials {
            api_key: "test-key".to_string(),
            secret_key: "test-secret".to_string(),
        };
        BinanceClient::new(url, Some(credentials), limiter, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_ticker_price_consumes_permit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3/ticker/price")
            .match_query(Matcher::UrlEncoded("symbol".into(), "BTCUSDT".into()))
            .with_status(200)
            .with_body(r#"{"symbol":"BTCUSDT","price":"42000.50"}"#)
            .create_async()
            .await;

        let limiter = limiter();
        let client = client(&server.url(), limiter.clone());

        let price = client.ticker_price("btcusdt").await.unwrap();
        assert_eq!(price, 42000.5);
        assert_eq!(limiter.status().used, 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_market_order_is_signed_and_parsed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v3/order")
            .match_header("X-MBX-APIKEY", "test-key")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("symbol".into(), "BTCUSDT".into()),
                Matcher::UrlEncoded("side".into(), "BUY".into()),
                Matcher::UrlEncoded("type".into(), "MARKET".into()),
                Matcher::Regex("signature=[0-9a-f]{64}".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"orderId":987654,"fills":[{"price":"41999.10","qty":"0.01"}]}"#)
            .create_async()
            .await;

        let client = client(&server.url(), limiter());
        let fill = client
            .place_market_order("BTCUSDT", OrderType::MarketBuy, 0.01)
            .await
            .unwrap();

        assert_eq!(fill.order_id, "987654");
        assert_eq!(fill.price, 41999.1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_error_is_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v3/order")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"code":-2010,"msg":"Account has insufficient balance"}"#)
            .create_async()
            .await;

        let client = client(&server.url(), limiter());
        let err = client
            .place_market_order("BTCUSDT", OrderType::MarketSell, 1.0)
            .await
            .unwrap_err();

        match err {
            ExchangeError::Status { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("insufficient balance"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_fills_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v3/order")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"orderId":1,"fills":[]}"#)
            .create_async()
            .await;

        let client = client(&server.url(), limiter());
        let err = client
            .place_market_order("BTCUSDT", OrderType::MarketBuy, 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Parse(_)));
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v3/ticker/price")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let client = client(&server.url(), limiter());
        let err = client.ticker_price("BTCUSDT").await.unwrap_err();
        assert!(matches!(err, ExchangeError::Parse(_)));
    }

    #[tokio::test]
    async fn test_order_without_credentials_fails_before_request() {
        let limiter = limiter();
        let client = BinanceClient::new(
            "http://127.0.0.1:9",
            None,
            limiter.clone(),
            Duration::from_secs(1),
        )
        .unwrap();

        let err = client
            .place_market_order("BTCUSDT", OrderType::MarketBuy, 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Auth(_)));
        assert_eq!(limiter.status().used, 0);
    }

    #[tokio::test]
    async fn test_ping() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v3/ping")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = client(&server.url(), limiter());
        assert!(client.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_klines_parsed_oldest_first() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v3/klines")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("symbol".into(), "BTCUSDT".into()),
                Matcher::UrlEncoded("interval".into(), "1h".into()),
                Matcher::UrlEncoded("limit".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"[
                    [1704067200000,"100.0","110.0","95.0","105.0","12.5",1704070799999,"0",1,"0","0","0"],
                    [1704070800000,"105.0","112.0","101.0","111.0","8.0",1704074399999,"0",1,"0","0","0"]
                ]"#,
            )
            .create_async()
            .await;

        let client = client(&server.url(), limiter());
        let candles = client.klines("BTCUSDT", "1h", 2).await.unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open, 100.0);
        assert_eq!(candles[0].volume, 12.5);
        assert_eq!(candles[1].close, 111.0);
        assert!(candles[0].timestamp < candles[1].timestamp);
        assert_eq!(candles[1].rsi, None);
    }
}
