//! Bitstamp push channels.
//!
//! Every Bitstamp frame carries `event`, `channel` and `data`. Events starting
//! with `bts:` acknowledge requests (subscribe, unsubscribe, reconnect); the
//! market channels are told apart by event name and channel prefix.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::classifier::ChannelDescriptor;
use crate::classifier::Decoder;
use crate::classifier::DescriptorTable;
use crate::classifier::EventMatch;

pub const MAIN_NET_WEBSOCKET_URL: &str = "wss://ws.bitstamp.net";

pub const CONFIRMATION_PREFIX: &str = "bts:";

pub const LIVE_TRADES: &str = "live_trades";
pub const LIVE_TRADES_PREFIX: &str = "live_trades_";
pub const TRADE_EVENT: &str = "trade";

pub const LIVE_ORDERS: &str = "live_orders";
pub const LIVE_ORDERS_PREFIX: &str = "live_orders_";
pub const ORDER_EVENT_PREFIX: &str = "order_";

pub const DIFF_ORDER_BOOK: &str = "diff_order_book";
pub const DIFF_ORDER_BOOK_PREFIX: &str = "diff_order_book_";
pub const DATA_EVENT: &str = "data";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestConfirmation {
    pub event: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeData {
    pub id: u64,
    pub timestamp: String,
    pub amount: f64,
    pub amount_str: String,
    pub price: f64,
    pub price_str: String,
    /// 0 buy, 1 sell
    #[serde(rename = "type")]
    pub side: u8,
    pub microtimestamp: String,
    pub buy_order_id: u64,
    pub sell_order_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeMessage {
    pub event: String,
    pub channel: String,
    pub data: TradeData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderData {
    pub id: u64,
    pub id_str: String,
    /// 0 buy, 1 sell
    pub order_type: u8,
    pub datetime: String,
    pub microtimestamp: String,
    pub amount: f64,
    pub amount_str: String,
    pub price: f64,
    pub price_str: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderMessage {
    pub event: String,
    pub channel: String,
    pub data: OrderData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookDiffData {
    pub timestamp: String,
    pub microtimestamp: String,
    /// `[price, amount]` pairs; amount `"0"` removes the level
    pub bids: Vec<[String; 2]>,
    pub asks: Vec<[String; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookDiffMessage {
    pub event: String,
    pub channel: String,
    pub data: OrderBookDiffData,
}

/// Any classified Bitstamp push frame
///
/// Serializes to the venue's wire form, so a serialized message classifies
/// back to the same value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BitstampMessage {
    RequestConfirmation(RequestConfirmation),
    Trade(TradeMessage),
    Order(OrderMessage),
    OrderBookDiff(OrderBookDiffMessage),
}

impl BitstampMessage {
    pub fn event(&self) -> &str {
        match self {
            BitstampMessage::RequestConfirmation(message) => &message.event,
            BitstampMessage::Trade(message) => &message.event,
            BitstampMessage::Order(message) => &message.event,
            BitstampMessage::OrderBookDiff(message) => &message.event,
        }
    }

    pub fn channel(&self) -> &str {
        match self {
            BitstampMessage::RequestConfirmation(message) => &message.channel,
            BitstampMessage::Trade(message) => &message.channel,
            BitstampMessage::Order(message) => &message.channel,
            BitstampMessage::OrderBookDiff(message) => &message.channel,
        }
    }
}

pub fn decode_confirmation(value: Value) -> Result<BitstampMessage, serde_json::Error> {
    serde_json::from_value(value).map(BitstampMessage::RequestConfirmation)
}

pub fn decode_trade(value: Value) -> Result<BitstampMessage, serde_json::Error> {
    serde_json::from_value(value).map(BitstampMessage::Trade)
}

pub fn decode_order(value: Value) -> Result<BitstampMessage, serde_json::Error> {
    serde_json::from_value(value).map(BitstampMessage::Order)
}

pub fn decode_order_book_diff(value: Value) -> Result<BitstampMessage, serde_json::Error> {
    serde_json::from_value(value).map(BitstampMessage::OrderBookDiff)
}

/// Decoder for a shape name used in venue config files
pub fn decoder_for_shape(shape: &str) -> Option<Decoder<BitstampMessage>> {
    match shape {
        "confirmation" => Some(decode_confirmation),
        "trade" => Some(decode_trade),
        "order" => Some(decode_order),
        "order_book_diff" => Some(decode_order_book_diff),
        _ => None,
    }
}

/// Live trades, live orders and diff order book, in that order
pub fn descriptor_table() -> DescriptorTable<BitstampMessage> {
    DescriptorTable::builder()
        .confirmation(CONFIRMATION_PREFIX, decode_confirmation)
        .channel(ChannelDescriptor::new(LIVE_TRADES, EventMatch::exact(TRADE_EVENT), LIVE_TRADES_PREFIX, decode_trade))
        .channel(ChannelDescriptor::new(LIVE_ORDERS, EventMatch::prefix(ORDER_EVENT_PREFIX), LIVE_ORDERS_PREFIX, decode_order))
        .channel(ChannelDescriptor::new(DIFF_ORDER_BOOK, EventMatch::exact(DATA_EVENT), DIFF_ORDER_BOOK_PREFIX, decode_order_book_diff))
        .build()
}

pub fn live_trades_channel(pair: &str) -> String {
    format!("{LIVE_TRADES_PREFIX}{}", pair.to_lowercase())
}

pub fn live_orders_channel(pair: &str) -> String {
    format!("{LIVE_ORDERS_PREFIX}{}", pair.to_lowercase())
}

pub fn diff_order_book_channel(pair: &str) -> String {
    format!("{DIFF_ORDER_BOOK_PREFIX}{}", pair.to_lowercase())
}

pub fn subscribe_frame(channel: &str) -> Value {
    serde_json::json!({ "event": "bts:subscribe", "data": { "channel": channel } })
}

pub fn unsubscribe_frame(channel: &str) -> Value {
    serde_json::json!({ "event": "bts:unsubscribe", "data": { "channel": channel } })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::classifier::Route;
    use crate::error::ClassifyError;
    use crate::error::RejectReason;

    const TRADE: &str = r#"{"data":{"id":371562811,"timestamp":"1728914302","amount":0.0125,"amount_str":"0.01250000","price":62841,"price_str":"62841","type":0,"microtimestamp":"1728914302473000","buy_order_id":1796401231654913,"sell_order_id":1796401229254657},"channel":"live_trades_btcusd","event":"trade"}"#;

    #[test]
    fn test_request_reconnect_is_confirmation() {
        let classified = classify(&descriptor_table(), r#"{"event":"bts:request_reconnect","channel":"x"}"#).unwrap();

        assert_eq!(classified.route, Route::Confirmation);
        assert_eq!(
            classified.message,
            BitstampMessage::RequestConfirmation(RequestConfirmation { event: "bts:request_reconnect".into(), channel: "x".into(), data: Value::Null })
        );
    }

    #[test]
    fn test_trade_on_trades_channel() {
        let classified = classify(&descriptor_table(), TRADE).unwrap();
        match classified.message {
            BitstampMessage::Trade(trade) => {
                assert_eq!(trade.channel, "live_trades_btcusd");
                assert_eq!(trade.data.id, 371562811);
                assert_eq!(trade.data.price_str, "62841");
            }
            other => panic!("expected trade, got {other:?}"),
        }
    }

    #[test]
    fn test_trade_on_orders_channel_is_rejected() {
        let result = classify(&descriptor_table(), r#"{"event":"trade","channel":"live_orders_btcusd","data":{}}"#);
        assert!(matches!(
            result,
            Err(ClassifyError::Rejected { reason: RejectReason::NoDescriptorMatched { ref event, ref channel }, .. })
                if event == "trade" && channel == "live_orders_btcusd"
        ));
    }

    #[test]
    fn test_order_events_match_by_prefix() {
        let text = r#"{"data":{"id":1796402021093376,"id_str":"1796402021093376","order_type":1,"datetime":"1728914495","microtimestamp":"1728914495217000","amount":0.5,"amount_str":"0.50000000","price":62900,"price_str":"62900"},"channel":"live_orders_btcusd","event":"order_deleted"}"#;
        let classified = classify(&descriptor_table(), text).unwrap();

        assert_eq!(classified.route, Route::Channel(1));
        assert_eq!(classified.message.event(), "order_deleted");
    }

    #[test]
    fn test_diff_order_book() {
        let text = r#"{"data":{"timestamp":"1728914495","microtimestamp":"1728914495217000","bids":[["62890","0.2"]],"asks":[["62900","0"]]},"channel":"diff_order_book_btcusd","event":"data"}"#;
        let classified = classify(&descriptor_table(), text).unwrap();

        match classified.message {
            BitstampMessage::OrderBookDiff(diff) => assert_eq!(diff.data.asks, vec![["62900".to_string(), "0".to_string()]]),
            other => panic!("expected order book diff, got {other:?}"),
        }
    }

    #[test]
    fn test_serialized_message_classifies_back() {
        let table = descriptor_table();
        let original = classify(&table, TRADE).unwrap().message;

        let text = serde_json::to_string(&original).unwrap();
        assert_eq!(classify(&table, &text).unwrap().message, original);

        let confirmation = BitstampMessage::RequestConfirmation(RequestConfirmation {
            event: "bts:subscription_succeeded".into(),
            channel: live_trades_channel("BTCUSD"),
            data: serde_json::json!({}),
        });
        let text = serde_json::to_string(&confirmation).unwrap();
        assert_eq!(classify(&table, &text).unwrap().message, confirmation);
    }

    #[test]
    fn test_order_and_book_diff_classify_back() {
        let table = descriptor_table();

        let order = BitstampMessage::Order(OrderMessage {
            event: "order_created".into(),
            channel: live_orders_channel("btcusd"),
            data: OrderData {
                id: 1796402021093376,
                id_str: "1796402021093376".into(),
                order_type: 0,
                datetime: "1728914495".into(),
                microtimestamp: "1728914495217000".into(),
                amount: 0.5,
                amount_str: "0.50000000".into(),
                price: 62900.0,
                price_str: "62900".into(),
            },
        });
        let text = serde_json::to_string(&order).unwrap();
        let classified = classify(&table, &text).unwrap();
        assert_eq!(classified.route, Route::Channel(1));
        assert_eq!(classified.message, order);

        let diff = BitstampMessage::OrderBookDiff(OrderBookDiffMessage {
            event: DATA_EVENT.into(),
            channel: diff_order_book_channel("btcusd"),
            data: OrderBookDiffData {
                timestamp: "1728914495".into(),
                microtimestamp: "1728914495217000".into(),
                bids: vec![["62890".into(), "0.2".into()]],
                asks: vec![["62900".into(), "0".into()], ["62910".into(), "1.5".into()]],
            },
        });
        let text = serde_json::to_string(&diff).unwrap();
        let classified = classify(&table, &text).unwrap();
        assert_eq!(classified.route, Route::Channel(2));
        assert_eq!(classified.message, diff);
    }

    #[test]
    fn test_shape_names() {
        assert!(decoder_for_shape("trade").is_some());
        assert!(decoder_for_shape("order_book_diff").is_some());
        assert!(decoder_for_shape("ticker").is_none());
    }

    #[test]
    fn test_frames() {
        assert_eq!(live_orders_channel("ETHUSD"), "live_orders_ethusd");
        assert_eq!(
            subscribe_frame(&diff_order_book_channel("btcusd")),
            serde_json::json!({"event": "bts:subscribe", "data": {"channel": "diff_order_book_btcusd"}})
        );
        assert_eq!(unsubscribe_frame("live_trades_btcusd")["event"], "bts:unsubscribe");
    }
}
