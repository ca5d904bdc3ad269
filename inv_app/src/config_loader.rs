use std::path::Path;

use config::Config;
use config::ConfigError;
use config::File;
use config::FileFormat;
use inv_http::ftx;
use inv_ratelimit::exchanges;
use inv_ratelimit::RateLimitRule;
use inv_ratelimit::RateLimitScope;
use inv_security::SecretKeyAlgorithm;
use inv_security::SignatureEncoding;
use inv_ws::bitstamp;
use serde::Deserialize;

/// One venue: endpoints, signing, rate limits and push channels
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VenueConfigFile {
    pub venue: String,
    pub rest_url: String,
    pub websocket_url: Option<String>,
    pub auth_headers: Option<AuthHeadersConfig>,
    pub signing: Option<SigningConfig>,
    /// Longest wait for rate limit permits; absent means wait for the next window
    pub quota_timeout_ms: Option<u64>,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    pub push: Option<PushConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthHeadersConfig {
    pub key: String,
    pub signature: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SigningConfig {
    pub algorithm: SecretKeyAlgorithm,
    pub encoding: SignatureEncoding,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleConfig {
    pub name: String,
    pub scope: RateLimitScope,
    pub max_permits: u32,
    pub reset_period_ms: u64,
}

impl From<&RateLimitRule> for RuleConfig {
    fn from(rule: &RateLimitRule) -> Self {
        Self {
            name: rule.name().to_string(),
            scope: rule.scope(),
            max_permits: rule.max_permits(),
            reset_period_ms: rule.reset_period().as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushConfig {
    #[serde(default = "default_event_field")]
    pub event_field: String,
    #[serde(default = "default_channel_field")]
    pub channel_field: String,
    pub confirmation_prefix: Option<String>,
    /// Shape name used to decode confirmations
    #[serde(default = "default_confirmation_shape")]
    pub confirmation_shape: String,
    /// Evaluated in file order; the first match wins
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
    /// Channel names subscribed on connect
    #[serde(default)]
    pub subscriptions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    pub event: String,
    #[serde(default)]
    pub event_match: EventMatchKind,
    pub prefix: String,
    pub shape: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventMatchKind {
    #[default]
    Exact,
    Prefix,
}

fn default_event_field() -> String {
    "event".to_string()
}

fn default_channel_field() -> String {
    "channel".to_string()
}

fn default_confirmation_shape() -> String {
    "confirmation".to_string()
}

impl VenueConfigFile {
    /// Built-in preset by venue name
    pub fn preset(venue: &str) -> Option<Self> {
        match venue {
            "bitstamp" => Some(Self::bitstamp()),
            "ftx" => Some(Self::ftx()),
            _ => None,
        }
    }

    pub fn ftx() -> Self {
        let headers = ftx::auth_headers();
        Self {
            venue: "ftx".to_string(),
            rest_url: ftx::MAIN_NET_REST_URL.to_string(),
            websocket_url: Some(ftx::MAIN_NET_WEBSOCKET_URL.to_string()),
            auth_headers: Some(AuthHeadersConfig { key: headers.key, signature: headers.signature, timestamp: headers.timestamp }),
            signing: Some(SigningConfig { algorithm: SecretKeyAlgorithm::HmacSha256, encoding: SignatureEncoding::HexLower }),
            quota_timeout_ms: None,
            rules: exchanges::ftx::rules().iter().map(RuleConfig::from).collect(),
            push: None,
        }
    }

    pub fn bitstamp() -> Self {
        let channel = |name: &str, event: &str, event_match: EventMatchKind, prefix: &str, shape: &str| ChannelConfig {
            name: name.to_string(),
            event: event.to_string(),
            event_match,
            prefix: prefix.to_string(),
            shape: shape.to_string(),
        };

        Self {
            venue: "bitstamp".to_string(),
            rest_url: "https://www.bitstamp.net".to_string(),
            websocket_url: Some(bitstamp::MAIN_NET_WEBSOCKET_URL.to_string()),
            auth_headers: None,
            signing: None,
            quota_timeout_ms: None,
            rules: exchanges::bitstamp::rules().iter().map(RuleConfig::from).collect(),
            push: Some(PushConfig {
                event_field: default_event_field(),
                channel_field: default_channel_field(),
                confirmation_prefix: Some(bitstamp::CONFIRMATION_PREFIX.to_string()),
                confirmation_shape: default_confirmation_shape(),
                channels: vec![
                    channel(bitstamp::LIVE_TRADES, bitstamp::TRADE_EVENT, EventMatchKind::Exact, bitstamp::LIVE_TRADES_PREFIX, "trade"),
                    channel(bitstamp::LIVE_ORDERS, bitstamp::ORDER_EVENT_PREFIX, EventMatchKind::Prefix, bitstamp::LIVE_ORDERS_PREFIX, "order"),
                    channel(
                        bitstamp::DIFF_ORDER_BOOK,
                        bitstamp::DATA_EVENT,
                        EventMatchKind::Exact,
                        bitstamp::DIFF_ORDER_BOOK_PREFIX,
                        "order_book_diff",
                    ),
                ],
                subscriptions: vec![bitstamp::live_trades_channel("btcusd")],
            }),
        }
    }
}

pub fn load_venue_config<P: AsRef<Path>>(path: P) -> Result<VenueConfigFile, ConfigError> {
    let config = Config::builder().add_source(File::from(path.as_ref())).build()?;

    config.try_deserialize()
}

/// Parse a venue config from TOML text
pub fn parse_venue_config(toml: &str) -> Result<VenueConfigFile, ConfigError> {
    let config = Config::builder().add_source(File::from_str(toml, FileFormat::Toml)).build()?;

    config.try_deserialize()
}

/// Load a venue config with fallback to a built-in preset
pub fn load_venue_config_or(path: &str, fallback: impl FnOnce() -> VenueConfigFile) -> VenueConfigFile {
    match load_venue_config(path) {
        Ok(config) => {
            tracing::info!("Loaded {} venue config from {path}", config.venue);
            config
        }
        Err(err) => {
            let preset = fallback();
            tracing::warn!("Failed to load venue config from {}: {}. Using {} preset.", path, err, preset.venue);
            preset
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BITSTAMP_TOML: &str = r#"
venue = "bitstamp"
rest_url = "https://www.bitstamp.net"
websocket_url = "wss://ws.bitstamp.net"
quota_timeout_ms = 2500

[[rules]]
name = "ip_rest_request_rule"
scope = "ip"
max_permits = 8000
reset_period_ms = 600000

[push]
confirmation_prefix = "bts:"
subscriptions = ["live_trades_btcusd"]

[[push.channels]]
name = "live_trades"
event = "trade"
prefix = "live_trades_"
shape = "trade"

[[push.channels]]
name = "live_orders"
event = "order_"
event_match = "prefix"
prefix = "live_orders_"
shape = "order"
"#;

    #[test]
    fn test_parse_bitstamp_file() {
        let config = parse_venue_config(BITSTAMP_TOML).unwrap();

        assert_eq!(config.venue, "bitstamp");
        assert_eq!(config.quota_timeout_ms, Some(2500));
        assert_eq!(
            config.rules,
            vec![RuleConfig { name: "ip_rest_request_rule".into(), scope: RateLimitScope::Ip, max_permits: 8000, reset_period_ms: 600_000 }]
        );

        let push = config.push.unwrap();
        assert_eq!(push.event_field, "event");
        assert_eq!(push.confirmation_shape, "confirmation");
        assert_eq!(push.channels[0].event_match, EventMatchKind::Exact);
        assert_eq!(push.channels[1].event_match, EventMatchKind::Prefix);
    }

    #[test]
    fn test_parse_signing_section() {
        let config = parse_venue_config(
            r#"
venue = "ftx"
rest_url = "https://ftx.com"

[auth_headers]
key = "FTX-KEY"
signature = "FTX-SIGN"
timestamp = "FTX-TS"

[signing]
algorithm = "hmac_sha256"
encoding = "hex_lower"
"#,
        )
        .unwrap();

        assert_eq!(config.signing, Some(SigningConfig { algorithm: SecretKeyAlgorithm::HmacSha256, encoding: SignatureEncoding::HexLower }));
        assert_eq!(config.auth_headers.map(|headers| headers.signature), Some("FTX-SIGN".to_string()));
        assert!(config.rules.is_empty());
        assert!(config.push.is_none());
    }

    #[test]
    fn test_missing_file_falls_back_to_preset() {
        let config = load_venue_config_or("does/not/exist.toml", VenueConfigFile::ftx);
        assert_eq!(config, VenueConfigFile::ftx());
    }

    #[test]
    fn test_presets() {
        let ftx = VenueConfigFile::preset("ftx").unwrap();
        assert_eq!(ftx.rules[0].max_permits, 30);
        assert_eq!(ftx.rules[0].reset_period_ms, 1000);

        let bitstamp = VenueConfigFile::preset("bitstamp").unwrap();
        assert_eq!(bitstamp.push.map(|push| push.channels.len()), Some(3));
        assert!(VenueConfigFile::preset("kraken").is_none());
    }
}
