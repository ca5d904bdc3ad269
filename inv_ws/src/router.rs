use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crossbeam_channel::Sender;
use crossbeam_channel::TrySendError;

use crate::classifier::classify;
use crate::classifier::Classified;
use crate::classifier::DescriptorTable;
use crate::classifier::Route;
use crate::error::ClassifyError;
use crate::error::RejectReason;
use crate::error::Result;
use crate::error::SessionError;

/// A payload the router could not deliver as a typed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushFailure {
    Rejected { reason: RejectReason, payload: String },
    Deserialization { route: Arc<str>, message: String, payload: String },
}

impl PushFailure {
    fn new(error: &ClassifyError, text: &str) -> Self {
        match error {
            ClassifyError::Rejected { reason, payload } => PushFailure::Rejected { reason: reason.clone(), payload: payload.clone() },
            ClassifyError::Deserialization { route, source } => {
                PushFailure::Deserialization { route: Arc::clone(route), message: source.to_string(), payload: text.to_string() }
            }
        }
    }
}

/// Router counters at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub routed: u64,
    pub rejected: u64,
    pub failed: u64,
    /// Classified but no consumer registered for the route
    pub unconsumed: u64,
    /// Consumer queue full or disconnected
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct Counters {
    routed: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
    unconsumed: AtomicU64,
    dropped: AtomicU64,
}

/// Classifies push frames and forwards them to per-channel consumers
///
/// Consumers are bounded or unbounded crossbeam senders; a message routed to
/// several consumers is cloned for each. Frames that fail classification are
/// logged, counted and, when a rejection sender is registered, forwarded as a
/// [`PushFailure`]. The router itself holds no state besides its counters.
pub struct PushRouter<M> {
    table: DescriptorTable<M>,
    confirmation_consumers: Vec<Sender<M>>,
    channel_consumers: Vec<Vec<Sender<M>>>,
    rejections: Option<Sender<PushFailure>>,
    counters: Counters,
}

impl<M: Clone> PushRouter<M> {
    pub fn builder(table: DescriptorTable<M>) -> PushRouterBuilder<M> {
        PushRouterBuilder { table, confirmation: Vec::new(), channels: Vec::new(), rejections: None }
    }

    pub fn table(&self) -> &DescriptorTable<M> {
        &self.table
    }

    /// Classify one text frame and forward the result
    pub fn on_text(&self, text: &str) -> std::result::Result<Route, ClassifyError> {
        match classify(&self.table, text) {
            Ok(Classified { route, message }) => {
                self.counters.routed.fetch_add(1, Ordering::Relaxed);
                self.dispatch(route, message);
                Ok(route)
            }
            Err(err) => {
                if err.is_rejected() {
                    self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.counters.failed.fetch_add(1, Ordering::Relaxed);
                }
                tracing::warn!("{err}");

                if let Some(rejections) = &self.rejections {
                    if rejections.try_send(PushFailure::new(&err, text)).is_err() {
                        tracing::error!("Rejection queue unavailable, dropping failure report");
                    }
                }
                Err(err)
            }
        }
    }

    pub fn stats(&self) -> RouterStats {
        RouterStats {
            routed: self.counters.routed.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            unconsumed: self.counters.unconsumed.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }

    fn dispatch(&self, route: Route, message: M) {
        let consumers = match route {
            Route::Confirmation => self.confirmation_consumers.as_slice(),
            Route::Channel(index) => self.channel_consumers.get(index).map_or(&[][..], Vec::as_slice),
        };

        let Some((last, rest)) = consumers.split_last() else {
            self.counters.unconsumed.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("No consumer for {}", self.table.route_name(route));
            return;
        };

        for consumer in rest {
            self.forward(route, consumer, message.clone());
        }
        self.forward(route, last, message);
    }

    fn forward(&self, route: Route, consumer: &Sender<M>, message: M) {
        match consumer.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::error!("Consumer queue full for {}, dropping message", self.table.route_name(route));
            }
            Err(TrySendError::Disconnected(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Consumer for {} disconnected", self.table.route_name(route));
            }
        }
    }
}

pub struct PushRouterBuilder<M> {
    table: DescriptorTable<M>,
    confirmation: Vec<Sender<M>>,
    channels: Vec<(String, Sender<M>)>,
    rejections: Option<Sender<PushFailure>>,
}

impl<M> PushRouterBuilder<M> {
    pub fn on_confirmation(mut self, consumer: Sender<M>) -> Self {
        self.confirmation.push(consumer);
        self
    }

    /// Consume every descriptor registered under `name`
    pub fn on_channel(mut self, name: impl Into<String>, consumer: Sender<M>) -> Self {
        self.channels.push((name.into(), consumer));
        self
    }

    pub fn on_rejection(mut self, consumer: Sender<PushFailure>) -> Self {
        self.rejections = Some(consumer);
        self
    }

    pub fn build(self) -> Result<PushRouter<M>> {
        let mut channel_consumers: Vec<Vec<Sender<M>>> = vec![Vec::new(); self.table.channels().len()];

        for (name, consumer) in self.channels {
            let mut found = false;
            for (index, descriptor) in self.table.channels().iter().enumerate() {
                if descriptor.name() == name {
                    channel_consumers[index].push(consumer.clone());
                    found = true;
                }
            }
            if !found {
                return Err(SessionError::UnknownChannel(name));
            }
        }

        Ok(PushRouter {
            table: self.table,
            confirmation_consumers: self.confirmation,
            channel_consumers,
            rejections: self.rejections,
            counters: Counters::default(),
        })
    }
}
