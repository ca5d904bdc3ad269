use std::fmt;
use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;

use crate::error::ClassifyError;
use crate::error::RejectReason;

/// Route name reported for request confirmations
pub const CONFIRMATION_ROUTE: &str = "confirmation";

/// Turns a matched JSON object into a typed message
pub type Decoder<M> = fn(Value) -> Result<M, serde_json::Error>;

/// How a descriptor tests the event discriminant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventMatch {
    Exact(String),
    Prefix(String),
}

impl EventMatch {
    pub fn exact(value: impl Into<String>) -> Self {
        EventMatch::Exact(value.into())
    }

    pub fn prefix(value: impl Into<String>) -> Self {
        EventMatch::Prefix(value.into())
    }

    pub fn matches(&self, event: &str) -> bool {
        match self {
            EventMatch::Exact(expected) => event == expected,
            EventMatch::Prefix(prefix) => event.starts_with(prefix.as_str()),
        }
    }
}

/// One push channel: which payloads it claims and how to decode them
pub struct ChannelDescriptor<M> {
    name: Arc<str>,
    event: EventMatch,
    channel_prefix: Arc<str>,
    decode: Decoder<M>,
}

impl<M> ChannelDescriptor<M> {
    pub fn new(name: impl Into<Arc<str>>, event: EventMatch, channel_prefix: impl Into<Arc<str>>, decode: Decoder<M>) -> Self {
        Self { name: name.into(), event, channel_prefix: channel_prefix.into(), decode }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn event(&self) -> &EventMatch {
        &self.event
    }

    pub fn channel_prefix(&self) -> &str {
        &self.channel_prefix
    }

    pub fn matches(&self, event: &str, channel: &str) -> bool {
        self.event.matches(event) && channel.starts_with(&*self.channel_prefix)
    }
}

impl<M> Clone for ChannelDescriptor<M> {
    fn clone(&self) -> Self {
        Self { name: Arc::clone(&self.name), event: self.event.clone(), channel_prefix: Arc::clone(&self.channel_prefix), decode: self.decode }
    }
}

impl<M> fmt::Debug for ChannelDescriptor<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelDescriptor")
            .field("name", &self.name)
            .field("event", &self.event)
            .field("channel_prefix", &self.channel_prefix)
            .finish()
    }
}

struct Confirmation<M> {
    prefix: Arc<str>,
    decode: Decoder<M>,
}

/// Which entry of a table claimed a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Confirmation,
    /// Index into the table's channels, in registration order
    Channel(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classified<M> {
    pub route: Route,
    pub message: M,
}

/// Ordered, read-only set of channel descriptors for one venue
///
/// Evaluation order is registration order; when two descriptors would both
/// claim a payload the first one registered wins.
pub struct DescriptorTable<M> {
    event_field: Arc<str>,
    channel_field: Arc<str>,
    confirmation: Option<Confirmation<M>>,
    channels: Vec<ChannelDescriptor<M>>,
}

impl<M> DescriptorTable<M> {
    pub fn builder() -> DescriptorTableBuilder<M> {
        DescriptorTableBuilder::new()
    }

    pub fn event_field(&self) -> &str {
        &self.event_field
    }

    pub fn channel_field(&self) -> &str {
        &self.channel_field
    }

    pub fn confirmation_prefix(&self) -> Option<&str> {
        self.confirmation.as_ref().map(|confirmation| &*confirmation.prefix)
    }

    pub fn channels(&self) -> &[ChannelDescriptor<M>] {
        &self.channels
    }

    pub fn route_name(&self, route: Route) -> &str {
        match route {
            Route::Confirmation => CONFIRMATION_ROUTE,
            Route::Channel(index) => self.channels.get(index).map_or("", |descriptor| descriptor.name()),
        }
    }

    fn resolve(&self, object: &Map<String, Value>) -> Result<Route, RejectReason> {
        let event = discriminant(object, &self.event_field)?;

        if let Some(confirmation) = &self.confirmation {
            if event.starts_with(&*confirmation.prefix) {
                return Ok(Route::Confirmation);
            }
        }

        let channel = discriminant(object, &self.channel_field)?;

        self.channels
            .iter()
            .position(|descriptor| descriptor.matches(event, channel))
            .map(Route::Channel)
            .ok_or_else(|| RejectReason::NoDescriptorMatched { event: event.to_string(), channel: channel.to_string() })
    }

    fn decoder(&self, route: Route) -> Option<Decoder<M>> {
        match route {
            Route::Confirmation => self.confirmation.as_ref().map(|confirmation| confirmation.decode),
            Route::Channel(index) => self.channels.get(index).map(|descriptor| descriptor.decode),
        }
    }
}

impl<M> Clone for DescriptorTable<M> {
    fn clone(&self) -> Self {
        Self {
            event_field: Arc::clone(&self.event_field),
            channel_field: Arc::clone(&self.channel_field),
            confirmation: self.confirmation.as_ref().map(|confirmation| Confirmation { prefix: Arc::clone(&confirmation.prefix), decode: confirmation.decode }),
            channels: self.channels.clone(),
        }
    }
}

impl<M> fmt::Debug for DescriptorTable<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorTable")
            .field("event_field", &self.event_field)
            .field("channel_field", &self.channel_field)
            .field("confirmation_prefix", &self.confirmation_prefix())
            .field("channels", &self.channels)
            .finish()
    }
}

pub struct DescriptorTableBuilder<M> {
    event_field: Arc<str>,
    channel_field: Arc<str>,
    confirmation: Option<Confirmation<M>>,
    channels: Vec<ChannelDescriptor<M>>,
}

impl<M> Default for DescriptorTableBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> DescriptorTableBuilder<M> {
    pub fn new() -> Self {
        Self { event_field: Arc::from("event"), channel_field: Arc::from("channel"), confirmation: None, channels: Vec::new() }
    }

    pub fn event_field(mut self, field: impl Into<Arc<str>>) -> Self {
        self.event_field = field.into();
        self
    }

    pub fn channel_field(mut self, field: impl Into<Arc<str>>) -> Self {
        self.channel_field = field.into();
        self
    }

    /// Events starting with `prefix` are confirmations, whatever their channel
    pub fn confirmation(mut self, prefix: impl Into<Arc<str>>, decode: Decoder<M>) -> Self {
        self.confirmation = Some(Confirmation { prefix: prefix.into(), decode });
        self
    }

    pub fn channel(mut self, descriptor: ChannelDescriptor<M>) -> Self {
        self.channels.push(descriptor);
        self
    }

    pub fn build(self) -> DescriptorTable<M> {
        DescriptorTable { event_field: self.event_field, channel_field: self.channel_field, confirmation: self.confirmation, channels: self.channels }
    }
}

/// Classify one push payload against `table`
///
/// Pure: the same table and text always give the same result. A payload that
/// no descriptor claims is `Rejected`; a claimed payload that does not fit its
/// shape is `Deserialization`.
pub fn classify<M>(table: &DescriptorTable<M>, text: &str) -> Result<Classified<M>, ClassifyError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| ClassifyError::rejected(RejectReason::InvalidJson(err.to_string()), text))?;

    let route = match &value {
        Value::Object(object) => table.resolve(object).map_err(|reason| ClassifyError::rejected(reason, text))?,
        _ => return Err(ClassifyError::rejected(RejectReason::NotAnObject, text)),
    };

    let decode = table
        .decoder(route)
        .ok_or_else(|| ClassifyError::rejected(RejectReason::NoDescriptorMatched { event: String::new(), channel: String::new() }, text))?;

    match decode(value) {
        Ok(message) => Ok(Classified { route, message }),
        Err(source) => Err(ClassifyError::Deserialization { route: Arc::from(table.route_name(route)), source }),
    }
}

fn discriminant<'a>(object: &'a Map<String, Value>, field: &Arc<str>) -> Result<&'a str, RejectReason> {
    object.get(&**field).and_then(Value::as_str).ok_or_else(|| RejectReason::MissingDiscriminant(Arc::clone(field)))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Probe {
        Ack { event: String },
        Tick { channel: String, data: u32 },
    }

    fn ack(value: Value) -> Result<Probe, serde_json::Error> {
        let event = serde_json::from_value::<Map<String, Value>>(value)?
            .get("event")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(Probe::Ack { event })
    }

    fn tick(value: Value) -> Result<Probe, serde_json::Error> {
        #[derive(Deserialize)]
        struct Raw {
            channel: String,
            data: u32,
        }
        let raw: Raw = serde_json::from_value(value)?;
        Ok(Probe::Tick { channel: raw.channel, data: raw.data })
    }

    fn table() -> DescriptorTable<Probe> {
        DescriptorTable::builder()
            .confirmation("sys:", ack)
            .channel(ChannelDescriptor::new("ticks_wide", EventMatch::exact("tick"), "ticks_", tick))
            .channel(ChannelDescriptor::new("ticks_narrow", EventMatch::exact("tick"), "ticks_btc", tick))
            .channel(ChannelDescriptor::new("updates", EventMatch::prefix("update_"), "upd_", tick))
            .build()
    }

    fn reason(result: Result<Classified<Probe>, ClassifyError>) -> RejectReason {
        match result {
            Err(ClassifyError::Rejected { reason, .. }) => reason,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_first_registered_wins() {
        let classified = classify(&table(), r#"{"event":"tick","channel":"ticks_btcusd","data":1}"#).unwrap();
        assert_eq!(classified.route, Route::Channel(0));
        assert_eq!(table().route_name(classified.route), "ticks_wide");
    }

    #[test]
    fn test_event_prefix_match() {
        let classified = classify(&table(), r#"{"event":"update_created","channel":"upd_x","data":7}"#).unwrap();
        assert_eq!(classified.route, Route::Channel(2));
        assert_eq!(classified.message, Probe::Tick { channel: "upd_x".into(), data: 7 });
    }

    #[test]
    fn test_confirmation_ignores_channel() {
        let with_channel = classify(&table(), r#"{"event":"sys:subscribed","channel":"anything"}"#).unwrap();
        let without_channel = classify(&table(), r#"{"event":"sys:pong"}"#).unwrap();

        assert_eq!(with_channel.route, Route::Confirmation);
        assert_eq!(without_channel.message, Probe::Ack { event: "sys:pong".into() });
    }

    #[test]
    fn test_rejections() {
        let table = table();
        assert!(matches!(reason(classify(&table, "not json")), RejectReason::InvalidJson(_)));
        assert_eq!(reason(classify(&table, "[1,2]")), RejectReason::NotAnObject);
        assert_eq!(reason(classify(&table, r#"{"channel":"ticks_a"}"#)), RejectReason::MissingDiscriminant(Arc::from("event")));
        assert_eq!(reason(classify(&table, r#"{"event":"tick"}"#)), RejectReason::MissingDiscriminant(Arc::from("channel")));
        assert_eq!(
            reason(classify(&table, r#"{"event":"tick","channel":"other"}"#)),
            RejectReason::NoDescriptorMatched { event: "tick".into(), channel: "other".into() }
        );
    }

    #[test]
    fn test_non_string_discriminant_is_absent() {
        assert_eq!(
            reason(classify(&table(), r#"{"event":5,"channel":"ticks_a"}"#)),
            RejectReason::MissingDiscriminant(Arc::from("event"))
        );
    }

    #[test]
    fn test_deserialization_is_not_rejection() {
        let err = classify(&table(), r#"{"event":"tick","channel":"ticks_a","data":"oops"}"#).unwrap_err();
        assert!(!err.is_rejected());
        assert!(matches!(err, ClassifyError::Deserialization { ref route, .. } if &**route == "ticks_wide"));
    }

    #[test]
    fn test_custom_field_names() {
        let table = DescriptorTable::builder()
            .event_field("e")
            .channel_field("topic")
            .channel(ChannelDescriptor::new("ticks", EventMatch::exact("tick"), "ticks_", |value| {
                let data = value.get("data").and_then(Value::as_u64).unwrap_or_default() as u32;
                Ok(Probe::Tick { channel: "ticks".into(), data })
            }))
            .build();

        let classified = classify(&table, r#"{"e":"tick","topic":"ticks_eth","data":3}"#).unwrap();
        assert_eq!(classified.message, Probe::Tick { channel: "ticks".into(), data: 3 });
        assert!(classify(&table, r#"{"event":"tick","channel":"ticks_eth"}"#).is_err());
    }

    #[test]
    fn test_empty_table_rejects_everything() {
        let table: DescriptorTable<Probe> = DescriptorTable::builder().build();
        assert!(classify(&table, r#"{"event":"tick","channel":"ticks_a","data":1}"#).unwrap_err().is_rejected());
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn classification_is_deterministic(event in "[a-z_:]{0,12}", channel in "[a-z_]{0,12}", data in any::<u32>()) {
                let table = table();
                let text = serde_json::json!({ "event": event, "channel": channel, "data": data }).to_string();

                let first = format!("{:?}", classify(&table, &text));
                let second = format!("{:?}", classify(&table, &text));
                prop_assert_eq!(first, second);
            }
        }
    }
}
